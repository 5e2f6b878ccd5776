//! Connection-serving harness
//!
//! One connection carries one request-response exchange: the harness parses
//! a request off the stream, hands a [`ResponseWriter`] bound to the same
//! stream to the user handler, and closes the connection when the handler
//! returns. Parse failures are logged and the connection is dropped without
//! a response.
//!
//! TCP connections are each served on their own thread; in UDP mode every
//! datagram is treated as one complete message and answered with a single
//! response datagram.

use super::transport::{TcpTransport, TimedStream, DEFAULT_TIMEOUT};
use super::{parser::read_message, Error, Request, Result, ResponseWriter};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

/// Transport protocol to serve over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerOptions {
    addr: String,
    protocol: Protocol,
    timeout: Option<Duration>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            addr: "127.0.0.1:42069".to_string(),
            protocol: Protocol::Tcp,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ServerOptions {
    /// Set the listen address
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Set the transport protocol
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the per-operation I/O timeout for accepted connections
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Request handler invoked once per connection
///
/// The handler must emit a complete response (status line, headers, body or
/// chunked body) before returning, and may be invoked concurrently from
/// multiple connection threads. The writer and request are only valid for
/// the duration of the call.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, writer: &mut ResponseWriter<'_>, request: &Request);
}

impl<F> Handler for F
where
    F: Fn(&mut ResponseWriter<'_>, &Request) + Send + Sync + 'static,
{
    fn handle(&self, writer: &mut ResponseWriter<'_>, request: &Request) {
        self(writer, request)
    }
}

enum Listener {
    Tcp(TcpListener),
    Udp(UdpSocket),
}

/// HTTP server bound to a local address
pub struct Server {
    listener: Listener,
    timeout: Option<Duration>,
}

impl Server {
    /// Bind the listening socket described by `options`
    pub fn bind(options: ServerOptions) -> Result<Server> {
        let listener = match options.protocol {
            Protocol::Tcp => Listener::Tcp(TcpListener::bind(&options.addr)?),
            Protocol::Udp => Listener::Udp(UdpSocket::bind(&options.addr)?),
        };
        Ok(Server {
            listener,
            timeout: options.timeout,
        })
    }

    /// Get the bound local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let addr = match &self.listener {
            Listener::Tcp(listener) => listener.local_addr()?,
            Listener::Udp(socket) => socket.local_addr()?,
        };
        Ok(addr)
    }

    /// Serve connections until the listener fails, blocking the caller.
    ///
    /// Each accepted TCP connection runs on its own thread with no state
    /// shared between connections.
    pub fn serve<H: Handler>(self, handler: H) -> Result<()> {
        let handler = Arc::new(handler);
        match self.listener {
            Listener::Tcp(listener) => {
                log::info!("serving HTTP on {}", listener.local_addr()?);
                for stream in listener.incoming() {
                    match stream {
                        Ok(stream) => {
                            let handler = Arc::clone(&handler);
                            let timeout = self.timeout;
                            thread::spawn(move || {
                                handle_connection(stream, timeout, handler)
                            });
                        }
                        Err(e) => log::error!("accept failed: {}", e),
                    }
                }
                Ok(())
            }
            Listener::Udp(socket) => serve_udp(socket, handler),
        }
    }
}

fn handle_connection<H: Handler>(
    stream: TcpStream,
    timeout: Option<Duration>,
    handler: Arc<H>,
) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    log::debug!("accepted connection from {}", peer);

    let mut stream = TimedStream::from_tcp(stream);
    stream.set_timeout(timeout);

    if let Err(e) = serve_one(&mut stream, handler.as_ref()) {
        log::error!("connection from {}: {}", peer, e);
    }
    if let Err(e) = stream.close() {
        log::debug!("error closing connection to {}: {}", peer, e);
    }
}

fn serve_one<H: Handler>(
    stream: &mut TimedStream<TcpTransport>,
    handler: &H,
) -> Result<()> {
    let request = read_message(stream)?
        .into_request()
        .ok_or_else(|| Error::Parse("status line where a request was expected".to_string()))?;

    log::debug!("{} {}", request.method(), request.target());

    let mut writer = ResponseWriter::new(stream);
    handler.handle(&mut writer, &request);
    Ok(())
}

fn serve_udp<H: Handler>(socket: UdpSocket, handler: Arc<H>) -> Result<()> {
    log::info!("serving HTTP over UDP on {}", socket.local_addr()?);
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (n, peer) = socket.recv_from(&mut buf)?;

        // One datagram is one complete message.
        let mut datagram = &buf[..n];
        let message = match read_message(&mut datagram) {
            Ok(message) => message,
            Err(e) => {
                log::error!("failed to parse datagram from {}: {}", peer, e);
                continue;
            }
        };
        let request = match message.into_request() {
            Some(request) => request,
            None => {
                log::error!(
                    "response datagram from {} where a request was expected",
                    peer
                );
                continue;
            }
        };

        log::debug!("{} {} (udp)", request.method(), request.target());

        let mut out = Vec::new();
        let mut writer = ResponseWriter::new(&mut out);
        handler.handle(&mut writer, &request);

        if let Err(e) = socket.send_to(&out, peer) {
            log::error!("failed to send response to {}: {}", peer, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::default_headers;
    use crate::Status;
    use std::io::{Read, Write};
    use std::time::Duration;

    fn ok_handler(writer: &mut ResponseWriter<'_>, request: &Request) {
        let body = format!("you asked for {}", request.target()).into_bytes();
        writer.write_status_line(Status::OK).unwrap();
        writer.write_headers(&default_headers(body.len())).unwrap();
        writer.write_body(&body).unwrap();
    }

    fn spawn_server(options: ServerOptions) -> SocketAddr {
        let server = Server::bind(options).unwrap();
        let addr = server.local_addr().unwrap();
        thread::spawn(move || server.serve(ok_handler));
        addr
    }

    #[test]
    fn test_serve_one_tcp_connection() {
        let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"));

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        let response = String::from_utf8(response).unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("connection: close\r\n"));
        assert!(response.ends_with("you asked for /hello"));
    }

    #[test]
    fn test_concurrent_connections() {
        let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                thread::spawn(move || {
                    let mut stream = TcpStream::connect(addr).unwrap();
                    let request = format!("GET /{} HTTP/1.1\r\nHost: x\r\n\r\n", i);
                    stream.write_all(request.as_bytes()).unwrap();

                    let mut response = String::new();
                    stream.read_to_string(&mut response).unwrap();
                    assert!(response.ends_with(&format!("you asked for /{}", i)));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_parse_error_drops_connection() {
        let addr = spawn_server(ServerOptions::default().addr("127.0.0.1:0"));

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"definitely not http\r\n\r\n").unwrap();

        // The harness logs the parse error and closes without responding.
        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn test_udp_datagram_turn() {
        let addr = spawn_server(
            ServerOptions::default()
                .addr("127.0.0.1:0")
                .protocol(Protocol::Udp),
        );

        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        socket
            .send_to(b"GET /dgram HTTP/1.1\r\nHost: x\r\n\r\n", addr)
            .unwrap();

        let mut buf = [0u8; 2048];
        let (n, _) = socket.recv_from(&mut buf).unwrap();
        let response = String::from_utf8_lossy(&buf[..n]);

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("you asked for /dgram"));
    }
}
