/*!
Request-class detection from the User-Agent header.

Trust-on-claim: the header is attacker-controlled and trivially spoofable.
Any caller presenting an automated-client marker receives the decoded
plaintext with no password check, regardless of whether a password was set.
This asymmetry is the stated threat model (keep scripts out of casual browser
viewing; the game engine is the legitimate consumer) and must not be
silently strengthened or weakened.
*/

/// Case-sensitive substrings identifying the automated client family.
/// One unified set for every deployment shape; drift here is a bug.
pub const AUTOMATED_UA_MARKERS: [&str; 3] = ["Roblox", "RobloxApp", "RobloxStudio"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientClass {
    /// Claims to be the automated game-engine client; served raw plaintext.
    TrustedAutomated,
    /// Everything else (browsers, curl, bots); routed to the gated viewer.
    Generic,
}

impl ClientClass {
    pub fn is_automated(self) -> bool {
        self == ClientClass::TrustedAutomated
    }
}

/// Pure function of the header text: identical headers always classify
/// identically. An absent header classifies as `Generic`.
pub fn classify(user_agent: &str) -> ClientClass {
    if AUTOMATED_UA_MARKERS.iter().any(|m| user_agent.contains(m)) {
        ClientClass::TrustedAutomated
    } else {
        ClientClass::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_automated_markers_match() {
        assert_eq!(classify("RobloxApp/0.628"), ClientClass::TrustedAutomated);
        assert_eq!(
            classify("RobloxStudio/WinInet"),
            ClientClass::TrustedAutomated
        );
        assert_eq!(classify("Roblox/WinInet"), ClientClass::TrustedAutomated);
    }

    #[test]
    fn test_generic_clients() {
        assert_eq!(
            classify("Mozilla/5.0 (X11; Linux x86_64) Firefox/126.0"),
            ClientClass::Generic
        );
        assert_eq!(classify("curl/8.5.0"), ClientClass::Generic);
        assert_eq!(classify(""), ClientClass::Generic);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert_eq!(classify("robloxapp/0.628"), ClientClass::Generic);
    }

    #[test]
    fn test_deterministic() {
        let ua = "RobloxApp/0.628 (GlobalDist; RobloxDirectDownload)";
        assert_eq!(classify(ua), classify(ua));
    }
}
