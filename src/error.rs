//! Error type for the pandoc-bridge library.
//!
//! Every failure of a conversion maps to one [`PandocError`] variant, so a
//! caller can tell "pandoc is not installed" ([`PandocError::Spawn`]) apart
//! from "pandoc rejected the input" ([`PandocError::NonZeroExit`]) and from
//! "pandoc succeeded but complained" ([`PandocError::Diagnostic`]).
//!
//! Nothing is retried here; callers apply their own retry policy.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pandoc-bridge library.
#[derive(Debug, Error)]
pub enum PandocError {
    // ── Process errors ────────────────────────────────────────────────────
    /// The binary could not be started (missing, not executable, …).
    #[error(
        "Failed to start pandoc at '{path}': {source}\n\
Install it with `pandoc-bridge install`, or point PANDOC_BIN at an existing pandoc."
    )]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// pandoc exited with a non-zero status.
    #[error("pandoc exited with code {code}{}", detail_suffix(.stderr))]
    NonZeroExit { code: i32, stderr: String },

    /// pandoc exited with status 0 but wrote to its diagnostic channel.
    ///
    /// The message is exactly the diagnostic text.
    #[error("{0}")]
    Diagnostic(String),

    /// pandoc was killed before it could report an exit code.
    #[error("pandoc was terminated by a signal{}", detail_suffix(.stderr))]
    Terminated { stderr: String },

    /// `pandoc --version` output did not contain a version number.
    #[error("Unrecognised `pandoc --version` output: {output:?}")]
    UnknownVersion { output: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Writing to or reading from pandoc's pipes failed.
    #[error("I/O error talking to pandoc: {0}")]
    Io(#[from] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PandocError {
    /// Exit code reported by pandoc, if the error came from one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            PandocError::NonZeroExit { code, .. } => Some(*code),
            PandocError::Diagnostic(_) => Some(0),
            _ => None,
        }
    }

    /// Text pandoc wrote to stderr, if any was captured.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            PandocError::NonZeroExit { stderr, .. } | PandocError::Terminated { stderr } => {
                Some(stderr.as_str())
            }
            PandocError::Diagnostic(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// `": {stderr}"` when there is diagnostic text, `"."` otherwise.
fn detail_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        ".".to_string()
    } else {
        format!(": {stderr}")
    }
}
