/*!
Function-shape deployment: the request handler behind the hosting layer's
rewrite rule.

Shared links use the clean path form `/api/raw/<token>`; the hosting rewrite
turns that into `/api/raw?data=<token>` before the handler runs. Running
standalone, this server folds the rewrite in: both forms are accepted.
Generic clients are bounced back to the presentation surface with the token
attached; automated clients get the decoded script as plain text.
*/
use std::net::TcpStream;

use super::http::{read_http_request, HttpRequest};
use super::{
    log_request, respond_plain, respond_raw_code, respond_redirect, route, start_listener,
    RouteDecision, ServerHandle, ERR_INVALID_PAYLOAD, ERR_MISSING_TOKEN,
};
use crate::compose::ROUTER_PATH_PREFIX;
use crate::errors::ServeError;

#[derive(Debug, Clone)]
pub struct FunctionConfig {
    pub bind_host: String,
    /// 0 binds an ephemeral port (tests).
    pub port: u16,
    /// Presentation origin for redirects. When unset, derived per-request
    /// from X-Forwarded-Proto and Host like the original handler.
    pub origin: Option<String>,
    pub verbose: bool,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        FunctionConfig {
            bind_host: "127.0.0.1".to_string(),
            port: 0,
            origin: None,
            verbose: false,
        }
    }
}

/// Start the function-shape router. Returns a handle carrying the bound URL.
pub fn function_start(cfg: FunctionConfig) -> Result<ServerHandle, ServeError> {
    let bind_host = cfg.bind_host.clone();
    let port = cfg.port;
    let verbose = cfg.verbose;
    start_listener(&bind_host, port, verbose, "function router", move |stream| {
        handle_connection(&cfg, stream)
    })
    .map_err(ServeError::Io)
}

/// Token from either the rewritten path form or the query form.
fn extract_token(req: &HttpRequest) -> Option<String> {
    let path_prefix = format!("{ROUTER_PATH_PREFIX}/");
    if let Some(rest) = req.path.strip_prefix(&path_prefix) {
        let token = rest.trim_end_matches('/');
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }
    req.query_param("data").map(|s| s.to_string())
}

/// Presentation origin for the redirect target: configured value first,
/// else derived from the forwarding headers.
fn presentation_origin(cfg: &FunctionConfig, req: &HttpRequest) -> String {
    if let Some(o) = cfg.origin.as_deref() {
        return o.trim_end_matches('/').to_string();
    }
    let proto = req.header("x-forwarded-proto").unwrap_or("http");
    let host = req.header("host").unwrap_or("localhost");
    format!("{proto}://{host}")
}

fn handle_connection(cfg: &FunctionConfig, stream: &mut TcpStream) {
    let req = match read_http_request(stream) {
        Ok(r) => r,
        Err(_) => {
            respond_plain(stream, "400 Bad Request", b"malformed request");
            return;
        }
    };

    // Only the router path is served by this shape.
    if req.path != ROUTER_PATH_PREFIX && !req.path.starts_with(&format!("{ROUTER_PATH_PREFIX}/"))
    {
        log_request(cfg.verbose, "function", &req.method, &req.path, "404");
        respond_plain(stream, "404 Not Found", b"not found");
        return;
    }

    let token = extract_token(&req);
    match route(token.as_deref(), req.user_agent()) {
        RouteDecision::MissingToken => {
            log_request(cfg.verbose, "function", &req.method, &req.path, "400 missing token");
            respond_plain(stream, "400 Bad Request", ERR_MISSING_TOKEN.as_bytes());
        }
        RouteDecision::ServeRaw(code) => {
            log_request(cfg.verbose, "function", &req.method, &req.path, "200 raw");
            respond_raw_code(stream, &code);
        }
        RouteDecision::DecodeError => {
            log_request(cfg.verbose, "function", &req.method, &req.path, "500 decode error");
            respond_plain(
                stream,
                "500 Internal Server Error",
                ERR_INVALID_PAYLOAD.as_bytes(),
            );
        }
        RouteDecision::RedirectToViewer(token) => {
            let origin = presentation_origin(cfg, &req);
            let location = format!("{origin}/?data={token}");
            log_request(cfg.verbose, "function", &req.method, &req.path, "307 redirect");
            respond_redirect(stream, &location);
        }
    }
}
