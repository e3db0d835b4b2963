//! Viewer-side flow: shared link -> decoded payload -> disclosure gate.

use rawgate::classify::{classify, ClientClass};
use rawgate::compose::{create, share_link};
use rawgate::gate::{DisclosureGate, GateState, REJECTION_MESSAGE};
use rawgate::payload::payload_from_link;

const BROWSER_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Safari/605.1.15";

#[test]
fn password_gate_locks_unlocks_and_rejects() {
    let token = create("x", Some("secret")).expect("token");
    let link = share_link("https://example.com", &token);
    let payload = payload_from_link(&link).expect("decodes from link");

    let mut gate = DisclosureGate::new(payload, classify(BROWSER_UA));
    assert_eq!(gate.state(), GateState::Locked);
    assert_eq!(gate.code(), None);

    assert_eq!(gate.submit("wrong"), GateState::Locked);
    assert_eq!(gate.rejection(), Some(REJECTION_MESSAGE));

    assert_eq!(gate.submit("secret"), GateState::Unlocked);
    assert_eq!(gate.code(), Some("x"));
    assert_eq!(gate.rejection(), None);
}

#[test]
fn no_password_payload_opens_for_browsers() {
    let token = create("print(1)", None).expect("token");
    let payload = payload_from_link(&token).expect("decodes");
    let gate = DisclosureGate::new(payload, ClientClass::Generic);
    assert!(gate.is_unlocked());
}

#[test]
fn automated_environment_skips_the_gate_entirely() {
    let token = create("print(1)", Some("secret")).expect("token");
    let payload = payload_from_link(&token).expect("decodes");
    let gate = DisclosureGate::new(payload, classify("RobloxStudio/WinHttp"));
    assert!(gate.is_unlocked());
    assert_eq!(gate.code(), Some("print(1)"));
}

#[test]
fn simulated_environment_toggle_unlocks_for_testing() {
    let token = create("print(1)", Some("secret")).expect("token");
    let payload = payload_from_link(&token).expect("decodes");
    let gate = DisclosureGate::new_with_override(payload, ClientClass::Generic, true);
    assert!(gate.is_unlocked());
}

#[test]
fn viewer_url_from_redirect_feeds_the_gate() {
    // A browser following the router's redirect lands on /?data=<token>
    let token = create("return 7", Some("pw")).expect("token");
    let viewer_url = format!("https://viewer.example/?data={token}");
    let payload = payload_from_link(&viewer_url).expect("decodes");

    let mut gate = DisclosureGate::new(payload, ClientClass::Generic);
    assert_eq!(gate.state(), GateState::Locked);
    assert_eq!(gate.submit("pw"), GateState::Unlocked);
    assert_eq!(gate.code(), Some("return 7"));
}
