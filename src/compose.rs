/*!
Composer: turn pasted script text into a shareable token and link.
Encode-only; the composer never decodes.
*/
use crate::payload::{encode_payload, Payload};

/// Path convention of the routing surface. The hosting layer rewrites
/// `/api/raw/<token>` into `?data=<token>` before the handler sees it.
pub const ROUTER_PATH_PREFIX: &str = "/api/raw";

/// Build the payload for pasted input. Returns `None` (a no-op, not an
/// error) when the code is empty or whitespace-only. An empty or
/// whitespace-only password means "no gate requested".
pub fn create_payload(code: &str, password: Option<&str>) -> Option<Payload> {
    if code.trim().is_empty() {
        return None;
    }
    let password = password
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string());
    Some(Payload::new(code.to_string(), password))
}

/// Create a shareable token from pasted input; `None` when rejected.
pub fn create(code: &str, password: Option<&str>) -> Option<String> {
    create_payload(code, password).map(|p| encode_payload(&p))
}

/// `<origin>/api/raw/<token>`, tolerant of a trailing slash on the origin.
pub fn share_link(origin: &str, token: &str) -> String {
    format!(
        "{}{}/{}",
        origin.trim_end_matches('/'),
        ROUTER_PATH_PREFIX,
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::decode_payload;

    #[test]
    fn test_create_rejects_blank_code() {
        assert_eq!(create("", None), None);
        assert_eq!(create("   \n\t ", Some("pw")), None);
    }

    #[test]
    fn test_blank_password_means_no_gate() {
        let token = create("print(1)", Some("   ")).expect("token");
        let p = decode_payload(&token).expect("decodes");
        assert_eq!(p.password, None);
    }

    #[test]
    fn test_create_preserves_code_verbatim() {
        let code = "  print(1)\n"; // leading/trailing whitespace is content
        let token = create(code, Some("pw")).expect("token");
        let p = decode_payload(&token).expect("decodes");
        assert_eq!(p.code, code);
        assert_eq!(p.password.as_deref(), Some("pw"));
        assert!(p.timestamp > 0);
    }

    #[test]
    fn test_share_link_shape() {
        assert_eq!(
            share_link("https://example.com", "abc"),
            "https://example.com/api/raw/abc"
        );
        assert_eq!(
            share_link("https://example.com/", "abc"),
            "https://example.com/api/raw/abc"
        );
    }
}
