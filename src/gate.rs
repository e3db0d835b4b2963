/*!
Disclosure gate: the viewer-side decision of whether to render a decoded
payload or demand the password first.

Two states, computed once when a payload is presented and then driven only by
password submissions. This is a deterrent, not a security boundary: the token
in the URL already carries the plaintext, password included.
*/
use crate::classify::ClientClass;
use crate::payload::Payload;

/// Fixed rejection message surfaced on a password mismatch.
pub const REJECTION_MESSAGE: &str = "Access Denied: Invalid Password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Unlocked,
}

/// State machine guarding the rendering of one presented payload.
///
/// Initial state:
/// - automated client class (or simulated override) -> `Unlocked`
/// - no password set at creation time -> `Unlocked`
/// - otherwise -> `Locked`
///
/// `Unlocked` is terminal for the lifetime of the presentation; there is no
/// re-lock, no lockout and no backoff.
#[derive(Debug)]
pub struct DisclosureGate {
    payload: Payload,
    state: GateState,
    rejection: Option<&'static str>,
}

impl DisclosureGate {
    pub fn new(payload: Payload, class: ClientClass) -> DisclosureGate {
        DisclosureGate::new_with_override(payload, class, false)
    }

    /// `simulate_automated` mirrors the viewer's testing toggle that forces
    /// the automated-environment path without a matching User-Agent.
    pub fn new_with_override(
        payload: Payload,
        class: ClientClass,
        simulate_automated: bool,
    ) -> DisclosureGate {
        let unlocked =
            class.is_automated() || simulate_automated || payload.password.is_none();
        DisclosureGate {
            payload,
            state: if unlocked {
                GateState::Unlocked
            } else {
                GateState::Locked
            },
            rejection: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// Present a password. Exact, case-sensitive equality; no trimming, no
    /// hashing. On mismatch the gate stays `Locked`, records the fixed
    /// rejection message, and the caller is expected to clear its input.
    pub fn submit(&mut self, input: &str) -> GateState {
        if self.state == GateState::Unlocked {
            return self.state;
        }
        match self.payload.password.as_deref() {
            Some(expected) if input == expected => {
                self.state = GateState::Unlocked;
                self.rejection = None;
            }
            _ => {
                self.rejection = Some(REJECTION_MESSAGE);
            }
        }
        self.state
    }

    /// Rejection message from the most recent failed submission, if any.
    pub fn rejection(&self) -> Option<&'static str> {
        self.rejection
    }

    /// The script body, disclosed only once unlocked.
    pub fn code(&self) -> Option<&str> {
        match self.state {
            GateState::Unlocked => Some(&self.payload.code),
            GateState::Locked => None,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}
