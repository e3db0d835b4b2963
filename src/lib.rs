/*!
rawgate: tokenized raw-script links.

Paste a script, optionally protect it with a password, and get one URL. The
automated game-engine client fetching it receives the raw script body as
plain text; a browser is redirected to a password-gated viewer. The entire
record lives inside the URL token; there is no backend store.

Library layout:
- [`payload`] — the `{code, password?, timestamp}` record and its URL-safe codec
- [`classify`] — trusted-automated vs. generic client detection (User-Agent)
- [`server`] — the routing contract and its two deployment shapes
  (query-rewritten function and reverse-proxy worker)
- [`gate`] — the viewer-side password gate state machine
- [`compose`] — token/link creation
*/
use std::env;

pub mod classify;
pub mod color;
pub mod compose;
pub mod errors;
pub mod gate;
pub mod payload;
pub mod server;

pub use classify::{classify, ClientClass};
pub use compose::{create, share_link};
pub use gate::{DisclosureGate, GateState};
pub use payload::{decode_payload, encode_payload, Payload};

/// True when the named env var is set to "1".
pub fn env_flag(name: &str) -> bool {
    env::var(name).ok().as_deref() == Some("1")
}

/// The named env var when set and non-blank.
pub fn env_nonempty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Verbose logging toggle shared by CLI flag and RAWGATE_VERBOSE=1.
pub fn verbose_enabled(flag: bool) -> bool {
    flag || env_flag("RAWGATE_VERBOSE")
}
