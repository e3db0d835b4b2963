//! Error mapping guide:
//! - Map io::ErrorKind::NotFound to exit code 127; all others to 1.
//! - Library decode paths return Option/Result and never panic; ServeError
//!   carries the user-visible string for the CLI surface.
use std::io;

/// Map an io::Error to a process exit code:
/// - 127 for NotFound (missing input file)
/// - 1 for all other errors
pub fn exit_code_for_io_error(e: &io::Error) -> u8 {
    if e.kind() == io::ErrorKind::NotFound {
        127
    } else {
        1
    }
}

/// Lightweight error enum for the serving surfaces (bind failures, bad
/// configuration) without changing user-visible messages.
#[derive(Debug)]
pub enum ServeError {
    Io(std::io::Error),
    Message(String),
}

impl From<std::io::Error> for ServeError {
    fn from(e: std::io::Error) -> Self {
        ServeError::Io(e)
    }
}

/// Convert ServeError to exit code (parity with io::Error mapping).
pub fn exit_code_for_serve_error(e: &ServeError) -> u8 {
    match e {
        ServeError::Io(ioe) => exit_code_for_io_error(ioe),
        ServeError::Message(_) => 1,
    }
}

/// Render a user-facing string for ServeError.
pub fn display_for_serve_error(e: &ServeError) -> String {
    match e {
        ServeError::Io(ioe) => ioe.to_string(),
        ServeError::Message(s) => s.clone(),
    }
}
