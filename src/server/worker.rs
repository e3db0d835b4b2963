/*!
Worker-shape deployment: a reverse proxy in front of the separately hosted
presentation origin.

All generic traffic — page loads, asset fetches, viewer URLs carrying
`?data=` — is forwarded to the origin untouched, query string preserved
byte-for-byte; the viewer sees the token and runs the password gate
client-side. Only automated-client requests are intercepted and decoded
here, with the same classification substrings and the same decode and
error-format rules as the function shape.
*/
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use super::http::{read_http_request, HttpRequest};
use super::{
    log_request, respond_plain, respond_raw_code, respond_with_content_type, route,
    start_listener, RouteDecision, ServerHandle, ERR_INVALID_PAYLOAD, ERR_MISSING_TOKEN,
};
use crate::classify::classify;
use crate::errors::ServeError;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub bind_host: String,
    /// 0 binds an ephemeral port (tests).
    pub port: u16,
    /// Presentation origin the proxy fronts, e.g. "http://127.0.0.1:8788".
    pub upstream: String,
    pub verbose: bool,
}

/// Start the worker-shape proxy. Fails early on an unparsable upstream URL.
pub fn worker_start(cfg: WorkerConfig) -> Result<ServerHandle, ServeError> {
    let upstream = url::Url::parse(&cfg.upstream).map_err(|e| {
        ServeError::Message(format!("invalid upstream url {:?}: {e}", cfg.upstream))
    })?;
    if !matches!(upstream.scheme(), "http" | "https") {
        return Err(ServeError::Message(format!(
            "upstream url must be http(s): {upstream}"
        )));
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| ServeError::Message(format!("proxy client build failed: {e}")))?;
    let client = Arc::new(client);

    let bind_host = cfg.bind_host.clone();
    let port = cfg.port;
    let verbose = cfg.verbose;
    start_listener(&bind_host, port, verbose, "worker proxy", move |stream| {
        handle_connection(&cfg, &client, stream)
    })
    .map_err(ServeError::Io)
}

fn handle_connection(
    cfg: &WorkerConfig,
    client: &reqwest::blocking::Client,
    stream: &mut TcpStream,
) {
    let req = match read_http_request(stream) {
        Ok(r) => r,
        Err(_) => {
            respond_plain(stream, "400 Bad Request", b"malformed request");
            return;
        }
    };

    if !classify(req.user_agent()).is_automated() {
        forward_to_origin(cfg, client, &req, stream);
        return;
    }

    // Automated client: intercept and serve decoded content locally.
    let token = req.query_param("data");
    match route(token, req.user_agent()) {
        RouteDecision::ServeRaw(code) => {
            log_request(cfg.verbose, "worker", &req.method, &req.path, "200 raw");
            respond_raw_code(stream, &code);
        }
        RouteDecision::DecodeError => {
            log_request(cfg.verbose, "worker", &req.method, &req.path, "500 decode error");
            respond_plain(
                stream,
                "500 Internal Server Error",
                ERR_INVALID_PAYLOAD.as_bytes(),
            );
        }
        RouteDecision::MissingToken => {
            log_request(cfg.verbose, "worker", &req.method, &req.path, "400 missing token");
            respond_plain(stream, "400 Bad Request", ERR_MISSING_TOKEN.as_bytes());
        }
        // Unreachable: an automated User-Agent never classifies generic.
        RouteDecision::RedirectToViewer(_) => {
            forward_to_origin(cfg, client, &req, stream);
        }
    }
}

/// Relay the request to the presentation origin and stream the answer back:
/// method, path and query preserved; status, content type and body relayed.
fn forward_to_origin(
    cfg: &WorkerConfig,
    client: &reqwest::blocking::Client,
    req: &HttpRequest,
    stream: &mut TcpStream,
) {
    let mut target = format!("{}{}", cfg.upstream.trim_end_matches('/'), req.path);
    if let Some(qs) = req.raw_query() {
        target.push('?');
        target.push_str(qs);
    }

    let method = reqwest::Method::from_bytes(req.method.as_bytes())
        .unwrap_or(reqwest::Method::GET);
    let mut outbound = client.request(method, &target);
    if !req.user_agent().is_empty() {
        outbound = outbound.header(reqwest::header::USER_AGENT, req.user_agent());
    }
    if let Some(ct) = req.header("content-type") {
        outbound = outbound.header(reqwest::header::CONTENT_TYPE, ct);
    }
    if !req.body.is_empty() {
        outbound = outbound.body(req.body.clone());
    }

    let resp = match outbound.send() {
        Ok(r) => r,
        Err(e) => {
            log_request(
                cfg.verbose,
                "worker",
                &req.method,
                &req.path,
                "502 upstream unreachable",
            );
            respond_plain(
                stream,
                "502 Bad Gateway",
                format!("upstream fetch failed: {e}").as_bytes(),
            );
            return;
        }
    };

    let status = resp.status();
    let status_line = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let body = resp.bytes().map(|b| b.to_vec()).unwrap_or_default();

    log_request(
        cfg.verbose,
        "worker",
        &req.method,
        &req.path,
        &format!("{} passthrough", status.as_u16()),
    );
    respond_with_content_type(stream, status_line.trim_end(), &content_type, &body);
}
