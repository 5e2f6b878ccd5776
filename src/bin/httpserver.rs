//! Reference HTTP server
//!
//! Serves canned HTML responses for a few fixed paths and a chunked
//! transfer-encoded stream for `/stream`:
//!
//! - `/yourproblem` — 400 Bad Request
//! - `/myproblem` — 500 Internal Server Error
//! - `/stream` — chunked body, one line per chunk
//! - anything else — 200 OK
//!
//! Usage: `httpserver [ADDR] [tcp|udp]` (defaults: `127.0.0.1:42069`, tcp).
//! Logging is controlled through `RUST_LOG`.

use httpwire::{
    default_headers, Protocol, Request, ResponseWriter, Server, ServerOptions, Status,
};

const RESPONSE_400: &str = r#"<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>"#;

const RESPONSE_500: &str = r#"<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>"#;

const RESPONSE_200: &str = r#"<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>"#;

fn handler(writer: &mut ResponseWriter<'_>, request: &Request) {
    match request.target() {
        "/yourproblem" => write_canned(writer, Status::BAD_REQUEST, RESPONSE_400),
        "/myproblem" => write_canned(writer, Status::INTERNAL_SERVER_ERROR, RESPONSE_500),
        "/stream" => write_stream(writer),
        _ => write_canned(writer, Status::OK, RESPONSE_200),
    }
}

fn write_canned(writer: &mut ResponseWriter<'_>, status: Status, body: &str) {
    if let Err(e) = writer.write_status_line(status) {
        log::error!("error writing status line: {}", e);
        return;
    }
    if let Err(e) = writer.write_headers(&default_headers(body.len())) {
        log::error!("error writing headers: {}", e);
        return;
    }
    if let Err(e) = writer.write_body(body.as_bytes()) {
        log::error!("error writing body: {}", e);
    }
}

fn write_stream(writer: &mut ResponseWriter<'_>) {
    let mut headers = default_headers(0);
    headers.remove("Content-Length");
    headers.set("Transfer-Encoding", "chunked");
    headers.set("Content-Type", "text/plain");

    if let Err(e) = writer.write_status_line(Status::OK) {
        log::error!("error writing status line: {}", e);
        return;
    }
    if let Err(e) = writer.write_headers(&headers) {
        log::error!("error writing headers: {}", e);
        return;
    }

    for i in 1..=20 {
        let line = format!("data line {}\n", i);
        if let Err(e) = writer.write_chunked_body(line.as_bytes()) {
            log::error!("error writing chunk: {}", e);
            return;
        }
    }
    if let Err(e) = writer.write_chunked_body_done() {
        log::error!("error terminating chunked body: {}", e);
    }
}

fn main() {
    env_logger::init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:42069".to_string());
    let protocol = match std::env::args().nth(2).as_deref() {
        None | Some("tcp") => Protocol::Tcp,
        Some("udp") => Protocol::Udp,
        Some(other) => {
            eprintln!("unknown protocol {:?}, expected tcp or udp", other);
            std::process::exit(2);
        }
    };

    let server = match Server::bind(ServerOptions::default().addr(addr).protocol(protocol)) {
        Ok(server) => server,
        Err(e) => {
            log::error!("failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    match server.local_addr() {
        Ok(addr) => log::info!("listening on {}", addr),
        Err(e) => log::warn!("listening address unavailable: {}", e),
    }

    if let Err(e) = server.serve(handler) {
        log::error!("server error: {}", e);
        std::process::exit(1);
    }
}
