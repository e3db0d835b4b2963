/*!
HTTP helpers for the routing surfaces: tolerant request parsing.

Minimal request model and utilities to parse a single HTTP request from a
Read stream, with compatibility for both CRLFCRLF and LFLF header termination
and a 64 KiB header cap. Bodies are read best-effort up to Content-Length
(capped); the routing surfaces only ever inspect the request line, headers
and query string.
*/
use std::collections::HashMap;
use std::io::{self, Read};

/// Simple case-insensitive header map (keys lowercased)
pub(crate) type HeaderMap = HashMap<String, String>;

/// Parsed HTTP request (path kept verbatim, headers normalized)
#[derive(Debug, Clone)]
pub(crate) struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    raw_query: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or("")
    }

    /// First value for a query key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Raw query string rebuilt from the request target, preserved for
    /// byte-for-byte forwarding.
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }
}

fn find_crlfcrlf(buf: &[u8]) -> Option<usize> {
    if buf.len() < 4 {
        return None;
    }
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Find end of HTTP headers, accepting either CRLF-CRLF or LF-LF separators.
/// Returns the index just after the header terminator when found.
pub(crate) fn find_header_end(buf: &[u8]) -> Option<usize> {
    if let Some(pos) = find_crlfcrlf(buf) {
        return Some(pos + 4);
    }
    buf.windows(2).position(|w| w == b"\n\n").map(|pos| pos + 2)
}

/// Parse a single HTTP request from a reader with a 64 KiB header cap.
pub(crate) fn read_http_request<R: Read>(reader: &mut R) -> io::Result<HttpRequest> {
    const HDR_CAP: usize = 64 * 1024;
    const BODY_CAP: usize = 1024 * 1024;
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    let mut header_end: Option<usize> = None;

    while header_end.is_none() && buf.len() < HDR_CAP {
        let n = reader.read(&mut tmp)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
        header_end = find_header_end(&buf);
    }
    let header_end = match header_end {
        Some(e) => e,
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "malformed request: no header terminator",
            ))
        }
    };

    let header_bytes = if header_end >= 4 && &buf[header_end - 4..header_end] == b"\r\n\r\n" {
        &buf[..header_end - 4]
    } else {
        &buf[..header_end - 2]
    };
    let header_str = String::from_utf8_lossy(header_bytes).into_owned();
    let mut lines = header_str.lines();
    let request_line = lines.next().unwrap_or_default().trim().to_string();
    let (method, path, raw_query, query) = parse_request_line(&request_line);
    let headers = parse_headers(lines);

    // Best-effort body up to Content-Length (capped); no chunked support,
    // the routing surfaces never read a meaningful body.
    let mut body: Vec<u8> = buf[header_end..].to_vec();
    let content_len: usize = headers
        .get("content-length")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
        .min(BODY_CAP);
    while body.len() < content_len {
        let want = (content_len - body.len()).min(8 * 1024);
        let mut chunk = vec![0u8; want];
        let got = reader.read(&mut chunk).unwrap_or(0);
        if got == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..got]);
    }
    if body.len() > BODY_CAP {
        body.truncate(BODY_CAP);
    }

    Ok(HttpRequest {
        method,
        path,
        query,
        headers,
        body,
        raw_query,
    })
}

fn parse_headers<'a, I: Iterator<Item = &'a str>>(lines: I) -> HeaderMap {
    let mut map = HeaderMap::new();
    for line in lines {
        if let Some((k, v)) = line.split_once(':') {
            map.insert(k.trim().to_ascii_lowercase(), v.trim().to_string());
        }
    }
    map
}

fn parse_request_line(
    request_line: &str,
) -> (String, String, Option<String>, Vec<(String, String)>) {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_ascii_uppercase();
    let target = parts.next().unwrap_or("/");
    match target.split_once('?') {
        Some((path, qs)) => (
            method,
            path.to_string(),
            Some(qs.to_string()),
            parse_query_string(qs),
        ),
        None => (method, target.to_string(), None, Vec::new()),
    }
}

/// Query-string parser with percent-decoding ('+' -> space, %XX -> byte;
/// invalid sequences preserved literally, best-effort).
pub(crate) fn parse_query_string(s: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for pair in s.split('&') {
        if pair.is_empty() {
            continue;
        }
        let mut it = pair.splitn(2, '=');
        let k = it.next().unwrap_or_default();
        let v = it.next().unwrap_or_default();
        out.push((percent_decode(k), percent_decode(v)));
    }
    out
}

fn percent_decode(s: &str) -> String {
    let plus_mapped = s.replace('+', " ");
    match urlencoding::decode(&plus_mapped) {
        Ok(d) => d.into_owned(),
        Err(_) => plus_mapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &[u8]) -> HttpRequest {
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        read_http_request(&mut cursor).expect("parse")
    }

    #[test]
    fn test_parse_get_with_query() {
        let req = parse(b"GET /api/raw?data=abc-_123 HTTP/1.1\r\nHost: x\r\nUser-Agent: RobloxApp/0.1\r\n\r\n");
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/api/raw");
        assert_eq!(req.query_param("data"), Some("abc-_123"));
        assert_eq!(req.user_agent(), "RobloxApp/0.1");
        assert_eq!(req.raw_query(), Some("data=abc-_123"));
    }

    #[test]
    fn test_parse_lf_only_headers() {
        let req = parse(b"GET /api/raw/tok HTTP/1.1\nHost: x\n\n");
        assert_eq!(req.path, "/api/raw/tok");
        assert!(req.query.is_empty());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = parse(b"GET / HTTP/1.1\r\nX-Forwarded-Proto: https\r\n\r\n");
        assert_eq!(req.header("x-forwarded-proto"), Some("https"));
        assert_eq!(req.header("X-Forwarded-Proto"), Some("https"));
    }

    #[test]
    fn test_query_percent_decoding() {
        let pairs = parse_query_string("a=1%202&b=x+y&c");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1 2".to_string()),
                ("b".to_string(), "x y".to_string()),
                ("c".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_body_read_to_content_length() {
        let req = parse(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");
        assert_eq!(req.body, b"hello");
    }

    #[test]
    fn test_missing_terminator_is_invalid_data() {
        let mut cursor = std::io::Cursor::new(b"GET / HTTP/1.1\r\nHost: x".to_vec());
        let err = read_http_request(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
