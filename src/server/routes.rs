use crate::config::PlannerConfig;
use crate::data::preset::PresetStore;
use crate::server::api;

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }

    fn json_ok(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

const PRESETS_PREFIX: &str = "/api/presets/";

pub fn route_request(
    method: &str,
    path: &str,
    body: &str,
    store: &mut dyn PresetStore,
    config: &PlannerConfig,
) -> HttpResponse {
    let path = path.split('?').next().unwrap_or(path);
    match (method, path) {
        ("GET", "/api/health") => match api::health_payload() {
            Ok(payload) => HttpResponse::json_ok(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("POST", "/api/strategies") => api_response(api::strategies_payload(body, config)),
        ("POST", "/api/validate") => api_response(api::validate_payload(body, config)),
        ("GET", "/api/presets") => api_response(api::presets_list_payload(store)),
        ("POST", "/api/presets") => api_response(api::preset_post_payload(store, body)),
        (method, path) if path.starts_with(PRESETS_PREFIX) => {
            let name = percent_decode(path.trim_start_matches(PRESETS_PREFIX));
            if name.is_empty() || name.contains('/') {
                return error_response(404, "Not Found", "Route not found");
            }
            match method {
                "GET" => api_response(api::preset_get_payload(store, &name)),
                "DELETE" => api_response(api::preset_delete_payload(store, &name)),
                _ => error_response(405, "Method Not Allowed", "Method not allowed"),
            }
        }
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

fn api_response(result: Result<String, api::ApiError>) -> HttpResponse {
    match result {
        Ok(payload) => HttpResponse::json_ok(payload),
        Err(err) => {
            let (status_code, status_text) = err.status();
            error_response(status_code, status_text, &err.to_string())
        }
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

/// `%XX` escapes and `+` as space. Malformed escapes are kept verbatim.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
