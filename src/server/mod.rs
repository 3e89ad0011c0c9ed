use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::data::preset::PresetStore;

pub mod api;
pub mod routes;

const MAX_REQUEST_BYTES: usize = 1 << 20;

/// Serve the JSON API until the listener fails. Requests are handled one at a
/// time on the calling thread.
pub fn run_server(
    bind_addr: &str,
    store: &mut dyn PresetStore,
    config: &PlannerConfig,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    info!(event = "server_listening", addr = %bind_addr, "pitwall server listening on http://{bind_addr}");

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&mut stream, store, config) {
                    warn!(error = %err, "request error");
                }
            }
            Err(err) => warn!(error = %err, "connection failed"),
        }
    }

    Ok(())
}

fn handle_connection(
    stream: &mut TcpStream,
    store: &mut dyn PresetStore,
    config: &PlannerConfig,
) -> std::io::Result<()> {
    let Some(raw) = read_request(stream)? else {
        return Ok(());
    };

    let (head, body) = split_request(&raw);
    let request_line = head.lines().next().unwrap_or_default();
    let mut request_parts = request_line.split_whitespace();
    let method = request_parts.next().unwrap_or("GET");
    let path = request_parts.next().unwrap_or("/");

    let response = routes::route_request(method, path, &body, store, config);
    info!(method, path, status = response.status_code, "request");
    stream.write_all(response.to_http_string().as_bytes())?;
    stream.flush()?;
    Ok(())
}

/// Read headers, then keep reading until `Content-Length` bytes of body have
/// arrived. `None` when the peer closed without sending anything.
fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<Vec<u8>>> {
    let mut raw = Vec::new();
    let mut buffer = [0_u8; 16_384];
    loop {
        let bytes_read = stream.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        raw.extend_from_slice(&buffer[..bytes_read]);
        if raw.len() >= MAX_REQUEST_BYTES {
            break;
        }
        if let Some(header_end) = find_header_end(&raw) {
            let expected = content_length(&raw[..header_end]).unwrap_or(0);
            if raw.len() >= header_end + expected {
                break;
            }
        }
    }
    Ok(if raw.is_empty() { None } else { Some(raw) })
}

/// Headers and body as text. The body is everything after the first blank
/// line, cut to `Content-Length` when the header is present.
fn split_request(raw: &[u8]) -> (String, String) {
    let Some(header_end) = find_header_end(raw) else {
        return (String::from_utf8_lossy(raw).into_owned(), String::new());
    };
    let (head, rest) = raw.split_at(header_end);
    let body = match content_length(head) {
        Some(length) => &rest[..length.min(rest.len())],
        None => rest,
    };
    (
        String::from_utf8_lossy(head).into_owned(),
        String::from_utf8_lossy(body).into_owned(),
    )
}

/// Index just past the blank line that ends the headers.
fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|index| index + 4)
}

fn content_length(headers: &[u8]) -> Option<usize> {
    String::from_utf8_lossy(headers).lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}
