/*!
Payload codec: the URL token IS the record.

A payload is serialized to JSON, then base64url-encoded with no padding so the
result survives a round trip through URL path segments, query parameters and
redirects. There is no server-side store and no separate identifier: anyone
holding a token holds the full plaintext record, password included. That is
the product contract, not an accident; the password gate only withholds
rendering on the browser path.

Decode must behave identically in every caller (CLI viewer, function-shape
router, worker-shape proxy). It is a pure function of the token string and
never consults external state.
*/
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The unit of sharing. `password: None` means no gate was requested at
/// creation time. `timestamp` is creation time in epoch milliseconds; it is
/// stored but not enforced as an expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub timestamp: u64,
}

impl Payload {
    /// Build a payload stamped with the current time.
    pub fn new(code: String, password: Option<String>) -> Payload {
        Payload {
            code,
            password,
            timestamp: epoch_millis(),
        }
    }
}

/// Current time as epoch milliseconds (0 if the clock is before the epoch).
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

/// Serialize a payload into a URL-safe token: JSON, then base64 with
/// `+` -> `-`, `/` -> `_` and trailing `=` stripped. The output contains only
/// characters valid in a URL path segment.
pub fn encode_payload(payload: &Payload) -> String {
    // Serializing this struct cannot fail; fall back to an empty token rather
    // than panicking if it somehow does.
    let json = serde_json::to_string(payload).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

/// Reverse of [`encode_payload`]. Returns `None` for anything that is not a
/// well-formed token: empty input, malformed base64, non-UTF-8 bytes, or an
/// unparsable record. Never panics.
///
/// Tolerates one `?data=` query prefix (tokens carried over verbatim from a
/// redirect) and stray `=` padding appended by intermediaries.
///
/// Legacy compatibility: the first-generation encoder percent-encoded the
/// JSON before base64 (a `btoa` Latin-1 workaround). If the decoded text does
/// not parse directly, one percent-decode pass is attempted before giving up.
pub fn decode_payload(token: &str) -> Option<Payload> {
    let token = token.strip_prefix("?data=").unwrap_or(token);
    let token = token.trim_end_matches('=');
    if token.is_empty() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(token.as_bytes()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    match serde_json::from_str::<Payload>(&text) {
        Ok(p) => Some(p),
        Err(_) => {
            let unescaped = urlencoding::decode(&text).ok()?;
            serde_json::from_str(&unescaped).ok()
        }
    }
}

/// Decode from either a bare token or a full shared link / viewer URL.
/// Accepts `<origin>/api/raw/<token>`, `<origin>/?data=<token>`, and the raw
/// token itself.
pub fn payload_from_link(input: &str) -> Option<Payload> {
    if let Ok(parsed) = url::Url::parse(input) {
        if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "data") {
            return decode_payload(&v);
        }
        if let Some(seg) = parsed.path_segments().and_then(|s| s.last()) {
            if !seg.is_empty() {
                return decode_payload(seg);
            }
        }
        return None;
    }
    decode_payload(input)
}
