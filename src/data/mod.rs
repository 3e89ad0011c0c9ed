pub mod constants;
pub mod plan;
pub mod preset;
pub mod scenario;
pub mod validate;
