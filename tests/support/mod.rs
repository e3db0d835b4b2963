#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Parsed HTTP response from a raw socket exchange.
pub struct Response {
    pub status: u16,
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        let lower = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k == &lower)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Issue one HTTP request over a fresh TCP connection and read to EOF
/// (the servers always answer Connection: close).
pub fn http_request(port: u16, method: &str, target: &str, host: &str, user_agent: &str) -> Response {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(20)))
        .expect("read timeout");
    stream
        .set_write_timeout(Some(Duration::from_secs(20)))
        .expect("write timeout");

    let req = format!(
        "{method} {target} HTTP/1.1\r\nHost: {host}\r\nUser-Agent: {user_agent}\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(req.as_bytes()).expect("write request");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).expect("read response");
    parse_response(&raw)
}

pub fn http_get(port: u16, target: &str, user_agent: &str) -> Response {
    http_request(port, "GET", target, "127.0.0.1", user_agent)
}

fn parse_response(raw: &[u8]) -> Response {
    let header_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| p + 4)
        .expect("response header terminator");
    let header_str = String::from_utf8_lossy(&raw[..header_end - 4]).into_owned();
    let mut lines = header_str.lines();
    let status_line = lines.next().unwrap_or_default().to_string();
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let headers = lines
        .filter_map(|l| {
            l.split_once(':')
                .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        })
        .collect();
    Response {
        status,
        status_line,
        headers,
        body: raw[header_end..].to_vec(),
    }
}

/// Minimal presentation-origin stand-in for worker passthrough tests.
/// Answers every request with 200 and a body echoing the request target,
/// so tests can assert the path and query survived the proxy verbatim.
pub struct StubOrigin {
    pub port: u16,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl StubOrigin {
    pub fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.handle.join();
    }
}

pub fn spawn_origin_stub() -> StubOrigin {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind stub origin");
    let port = listener.local_addr().expect("stub addr").port();
    listener.set_nonblocking(true).expect("nonblocking");
    let running = Arc::new(AtomicBool::new(true));
    let running_cl = running.clone();

    let handle = std::thread::spawn(move || loop {
        if !running_cl.load(Ordering::SeqCst) {
            break;
        }
        let (mut stream, _addr) = match listener.accept() {
            Ok(pair) => pair,
            Err(_) => {
                std::thread::sleep(Duration::from_millis(20));
                continue;
            }
        };
        let _ = stream.set_nonblocking(false);
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

        // Read just the head; the stub never needs a request body.
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut tmp) {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
            }
        }
        let head = String::from_utf8_lossy(&buf);
        let request_line = head.lines().next().unwrap_or_default();
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or("");
        let target = parts.next().unwrap_or("");

        let body = format!("origin saw {method} {target}");
        let resp = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = stream.write_all(resp.as_bytes());
        let _ = stream.flush();
    });

    StubOrigin {
        port,
        running,
        handle,
    }
}
