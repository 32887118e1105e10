//! # pandoc-bridge
//!
//! Drive a locally cached [pandoc](https://pandoc.org) binary from Rust.
//!
//! ## Why a subprocess bridge?
//!
//! pandoc already converts between dozens of markup formats; re-implementing
//! any of that would be pointless. What callers actually need is the plumbing
//! around it: a binary that is guaranteed to be there (see the `pandoc-auto`
//! crate), and a way to push text in and get text or files out without
//! deadlocking on pipes or losing pandoc's diagnostics.
//!
//! ## Architecture
//!
//! ```text
//! pandoc-auto  ──►  <cache>/.pandoc-local/pandoc   (fetched once, setup step)
//!                              │
//! Pandoc::convert ─── spawn ───┘
//!   │  stdin  ◄── source text
//!   │  stdout ──► output text
//!   └  stderr ──► diagnostics (any output here is treated as failure)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pandoc_bridge::{InputFormat, OutputFormat, Pandoc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pandoc = Pandoc::default();
//!     let html = pandoc
//!         .convert("# Heading", InputFormat::Markdown, OutputFormat::Html, &[])
//!         .await?;
//!     assert_eq!(html, "<h1 id=\"heading\">Heading</h1>\n");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pandoc-bridge` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pandoc-bridge = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PandocConfig, PandocConfigBuilder};
pub use convert::Pandoc;
pub use error::PandocError;
pub use format::{InputFormat, OutputFormat, UnknownFormat};
pub use stream::{PandocProcess, ProcessOutput};

pub use pandoc_auto;
