//! Integration tests for the HTTP toolkit
//!
//! These tests drive the full stack end-to-end: listener, parser, handler,
//! and writer over real sockets.

use httpwire::{
    default_headers, HttpClient, Protocol, Request, ResponseWriter, Server, ServerOptions, Status,
};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::thread;
use std::time::Duration;

fn spawn_server<H: httpwire::Handler>(options: ServerOptions, handler: H) -> SocketAddr {
    let server = Server::bind(options).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.serve(handler));
    addr
}

fn echo_handler(writer: &mut ResponseWriter<'_>, request: &Request) {
    let body = format!(
        "{} {} host={}",
        request.method(),
        request.target(),
        request.headers().get("host").unwrap_or("-"),
    )
    .into_bytes();

    writer.write_status_line(Status::OK).unwrap();
    writer.write_headers(&default_headers(body.len())).unwrap();
    writer.write_body(&body).unwrap();
}

#[test]
fn test_request_response_cycle() {
    let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"), echo_handler);

    let mut client = HttpClient::connect(addr).unwrap();
    let response = client.get("/test").unwrap();

    assert_eq!(response.status().code(), 200);
    assert_eq!(response.headers().get("content-type"), Some("text/html"));
    assert_eq!(response.headers().get("connection"), Some("close"));
    assert_eq!(response.body(), b"GET /test host=localhost");
}

#[test]
fn test_post_request_body_reaches_handler() {
    fn body_length_handler(writer: &mut ResponseWriter<'_>, request: &Request) {
        let body = format!("received {} bytes", request.body().len()).into_bytes();
        writer.write_status_line(Status::OK).unwrap();
        writer.write_headers(&default_headers(body.len())).unwrap();
        writer.write_body(&body).unwrap();
    }

    let addr = spawn_server(
        ServerOptions::default().addr("127.0.0.1:0"),
        body_length_handler,
    );

    let mut client = HttpClient::connect(addr).unwrap();
    let response = client.post("/data", b"some test data".to_vec()).unwrap();

    assert_eq!(response.status().code(), 200);
    assert_eq!(response.body(), b"received 14 bytes");
}

#[test]
fn test_large_response_body() {
    let payload = "Hello World".repeat(1000);
    let expected = payload.clone();

    let handler = move |writer: &mut ResponseWriter<'_>, _request: &Request| {
        writer.write_status_line(Status::OK).unwrap();
        writer
            .write_headers(&default_headers(payload.len()))
            .unwrap();
        writer.write_body(payload.as_bytes()).unwrap();
    };

    let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"), handler);

    let mut client = HttpClient::connect(addr).unwrap();
    let response = client.get("/big").unwrap();
    assert_eq!(response.body(), expected.as_bytes());
}

#[test]
fn test_duplicate_request_headers_coalesce() {
    fn trace_handler(writer: &mut ResponseWriter<'_>, request: &Request) {
        let body = request
            .headers()
            .get("x-trace")
            .unwrap_or("-")
            .as_bytes()
            .to_vec();
        writer.write_status_line(Status::OK).unwrap();
        writer.write_headers(&default_headers(body.len())).unwrap();
        writer.write_body(&body).unwrap();
    }

    let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"), trace_handler);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: x\r\nX-Trace: a\r\nX-Trace: b\r\n\r\n")
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    assert!(response.ends_with("a,b"));
}

#[test]
fn test_chunked_response_wire_format() {
    fn chunked_handler(writer: &mut ResponseWriter<'_>, _request: &Request) {
        let mut headers = httpwire::Headers::new();
        headers.set("Transfer-Encoding", "chunked");

        writer.write_status_line(Status::OK).unwrap();
        writer.write_headers(&headers).unwrap();
        writer.write_chunked_body(b"hello").unwrap();
        writer.write_chunked_body(b"world").unwrap();
        writer.write_chunked_body_done().unwrap();
    }

    let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"), chunked_handler);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .write_all(b"GET /stream HTTP/1.1\r\nHost: x\r\n\r\n")
        .unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();

    assert_eq!(
        response,
        &b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n5\r\nworld\r\n0\r\n\r\n"[..]
    );
}

#[test]
fn test_malformed_request_gets_no_response() {
    let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"), echo_handler);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"get / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    assert!(response.is_empty());
}

#[test]
fn test_udp_request_response_turn() {
    let addr = spawn_server(
        ServerOptions::default()
            .addr("127.0.0.1:0")
            .protocol(Protocol::Udp),
        echo_handler,
    );

    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    socket
        .send_to(b"GET /dgram HTTP/1.1\r\nHost: u\r\n\r\n", addr)
        .unwrap();

    let mut buf = [0u8; 2048];
    let (n, _) = socket.recv_from(&mut buf).unwrap();
    let response = String::from_utf8_lossy(&buf[..n]);

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("GET /dgram host=u"));
}

#[test]
fn test_request_split_across_many_writes() {
    let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"), echo_handler);

    let mut stream = TcpStream::connect(addr).unwrap();
    let request = b"GET /slow HTTP/1.1\r\nHost: trickle\r\n\r\n";
    for chunk in request.chunks(3) {
        stream.write_all(chunk).unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(2));
    }

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("GET /slow host=trickle"));
}
