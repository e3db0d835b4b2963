/*!
Edge routing: one contract, two deployment shapes.

`route` is the shared decision core. Both surfaces — the query-rewritten
function handler ([`function`]) and the reverse-proxy worker ([`worker`]) —
consume it, so a shared link behaves identically regardless of which
deployment serves it. The decision is a pure function of the token and the
User-Agent header; requests never coordinate with each other.

Error statuses are normalized across shapes: missing token is 400, decode
failure on the automated path is 500 with the body formatted as a Lua line
comment so a client that blindly executes the response runs nothing.
*/
pub mod function;
pub(crate) mod http;
pub mod worker;

use std::io::{self, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::classify::{classify, ClientClass};
use crate::payload::decode_payload;

/// Fixed client-error body when no token was supplied.
pub const ERR_MISSING_TOKEN: &str = "Missing data parameter";

/// Decode-failure body, harmless if executed as a script.
pub const ERR_INVALID_PAYLOAD: &str = "-- error: invalid payload";

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// No token supplied: client error, fixed short message.
    MissingToken,
    /// Automated client, decode ok: serve the literal code as text/plain.
    ServeRaw(String),
    /// Generic client: redirect to the presentation surface, token attached.
    /// No decode happens on this path server-side.
    RedirectToViewer(String),
    /// Automated client, malformed token or record without usable code.
    DecodeError,
}

/// The shared routing contract. A record whose `code` is empty counts as a
/// decode failure, matching the original handler's truthiness check.
pub fn route(token: Option<&str>, user_agent: &str) -> RouteDecision {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return RouteDecision::MissingToken,
    };
    match classify(user_agent) {
        ClientClass::TrustedAutomated => match decode_payload(token) {
            Some(p) if !p.code.is_empty() => RouteDecision::ServeRaw(p.code),
            _ => RouteDecision::DecodeError,
        },
        ClientClass::Generic => RouteDecision::RedirectToViewer(token.to_string()),
    }
}

// Response helpers shared by both shapes.

pub(crate) fn respond_plain<W: Write>(w: &mut W, status: &str, body: &[u8]) {
    respond_with_content_type(w, status, "text/plain; charset=utf-8", body);
}

pub(crate) fn respond_with_content_type<W: Write>(
    w: &mut W,
    status: &str,
    content_type: &str,
    body: &[u8],
) {
    let header = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = w.write_all(header.as_bytes());
    let _ = w.write_all(body);
    let _ = w.flush();
}

/// 200 raw-code response for the automated path.
pub(crate) fn respond_raw_code<W: Write>(w: &mut W, code: &str) {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nCache-Control: no-cache\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        code.len()
    );
    let _ = w.write_all(header.as_bytes());
    let _ = w.write_all(code.as_bytes());
    let _ = w.flush();
}

/// Method-preserving, non-cacheable redirect for the generic path.
pub(crate) fn respond_redirect<W: Write>(w: &mut W, location: &str) {
    let header = format!(
        "HTTP/1.1 307 Temporary Redirect\r\nLocation: {location}\r\nCache-Control: no-store\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    );
    let _ = w.write_all(header.as_bytes());
    let _ = w.flush();
}

/// A running routing surface: bound URL plus stop/join plumbing for tests
/// and the CLI foreground mode.
pub struct ServerHandle {
    pub url: String,
    pub port: u16,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Signal the accept loop to stop and wait for it to finish.
    pub fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.handle.join();
    }

    /// Block until the accept loop exits (foreground serving).
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Bind a TCP listener and spawn the accept loop: nonblocking accept with
/// backoff, one thread per connection, stop flag polled between accepts.
/// Port 0 binds an ephemeral port.
pub(crate) fn start_listener<F>(
    bind_host: &str,
    port: u16,
    verbose: bool,
    label: &'static str,
    handler: F,
) -> io::Result<ServerHandle>
where
    F: Fn(&mut TcpStream) + Send + Sync + 'static,
{
    let listener = TcpListener::bind((bind_host, port))
        .map_err(|e| io::Error::new(e.kind(), format!("{label} bind failed: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| io::Error::new(e.kind(), format!("{label} addr failed: {e}")))?;
    let port = addr.port();
    let _ = listener.set_nonblocking(true);

    let running = Arc::new(AtomicBool::new(true));
    let running_cl = running.clone();
    let handler = Arc::new(handler);
    let bind_host_owned = bind_host.to_string();

    let handle = std::thread::spawn(move || {
        if verbose {
            eprintln!("rawgate: {label} listening on {bind_host_owned}:{port}");
        }
        loop {
            if !running_cl.load(Ordering::SeqCst) {
                break;
            }
            let (stream, _addr) = match listener.accept() {
                Ok(pair) => pair,
                Err(e) => {
                    if e.kind() != io::ErrorKind::WouldBlock && verbose {
                        eprintln!("rawgate: accept error: {e}");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                    continue;
                }
            };
            let _ = stream.set_nonblocking(false);
            let _ = stream.set_read_timeout(Some(Duration::from_secs(30)));
            let _ = stream.set_write_timeout(Some(Duration::from_secs(30)));
            let h = handler.clone();
            std::thread::spawn(move || {
                let mut s = stream;
                h(&mut s);
            });
        }
        if verbose {
            eprintln!("rawgate: {label} stopped");
        }
    });

    Ok(ServerHandle {
        url: format!("http://127.0.0.1:{port}"),
        port,
        running,
        handle,
    })
}

/// One-line request log in verbose mode.
pub(crate) fn log_request(verbose: bool, label: &str, method: &str, path: &str, outcome: &str) {
    if verbose {
        eprintln!("rawgate: {label}: {method} {path} -> {outcome}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::create;

    const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/126.0";

    #[test]
    fn test_route_missing_token() {
        assert_eq!(route(None, "RobloxApp/0.1"), RouteDecision::MissingToken);
        assert_eq!(route(Some(""), BROWSER_UA), RouteDecision::MissingToken);
    }

    #[test]
    fn test_route_automated_serves_raw() {
        let token = create("print(1)", None).expect("token");
        assert_eq!(
            route(Some(&token), "RobloxApp/0.628"),
            RouteDecision::ServeRaw("print(1)".to_string())
        );
    }

    #[test]
    fn test_route_automated_ignores_password() {
        let token = create("print(1)", Some("secret")).expect("token");
        assert_eq!(
            route(Some(&token), "Roblox/WinInet"),
            RouteDecision::ServeRaw("print(1)".to_string())
        );
    }

    #[test]
    fn test_route_generic_redirects_without_decoding() {
        let token = "not-even-a-valid-token";
        assert_eq!(
            route(Some(token), BROWSER_UA),
            RouteDecision::RedirectToViewer(token.to_string())
        );
    }

    #[test]
    fn test_route_automated_decode_failure() {
        assert_eq!(
            route(Some("!!bad!!"), "RobloxStudio/1.0"),
            RouteDecision::DecodeError
        );
    }
}
