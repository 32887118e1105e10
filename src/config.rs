//! Configuration for the pandoc subprocess bridge.
//!
//! [`PandocConfig`] says which binaries to run and how to run them. Both
//! binary paths default to the `pandoc-auto` cache root; each one can be
//! overridden on its own through [`PandocConfigBuilder`].
//!
//! # Design choice: explicit root, no global
//! The cache location is a plain value carried by the config rather than a
//! process-wide constant, so two clients in one process can point at two
//! different pandoc installs.

use crate::error::PandocError;
use std::path::{Path, PathBuf};

/// Environment variable naming an existing pandoc binary to use by default.
pub const PANDOC_BIN_ENV: &str = "PANDOC_BIN";

/// Configuration for a [`crate::Pandoc`] client.
///
/// # Example
/// ```rust
/// use pandoc_bridge::PandocConfig;
///
/// let config = PandocConfig::builder()
///     .pandoc_bin("/usr/local/bin/pandoc")
///     .build()
///     .unwrap();
/// assert_eq!(config.pandoc_bin.to_str(), Some("/usr/local/bin/pandoc"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PandocConfig {
    /// Main pandoc binary. Default: `$PANDOC_BIN`, else `<cache root>/pandoc`.
    pub pandoc_bin: PathBuf,

    /// Companion citation processor. Default: `<cache root>/pandoc-citeproc`.
    ///
    /// pandoc ≥ 2.11 ships citeproc built in and no longer needs this; it is
    /// only used by [`crate::Pandoc::citeproc_filter_args`].
    pub citeproc_bin: PathBuf,

    /// Working directory for spawned processes. Default: inherit.
    ///
    /// Relative input/output paths given to file-mode conversions resolve
    /// against this directory.
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables for spawned processes.
    pub env: Vec<(String, String)>,
}

impl Default for PandocConfig {
    fn default() -> Self {
        let root = pandoc_auto::default_root();
        let mut config = Self::from_root(&root);
        if let Ok(bin) = std::env::var(PANDOC_BIN_ENV) {
            if !bin.is_empty() {
                config.pandoc_bin = PathBuf::from(bin);
            }
        }
        config
    }
}

impl PandocConfig {
    /// Create a new builder for `PandocConfig`.
    pub fn builder() -> PandocConfigBuilder {
        PandocConfigBuilder::default()
    }

    /// Both binaries taken from the flat cache directory `root`.
    pub fn from_root(root: &Path) -> Self {
        Self {
            pandoc_bin: pandoc_auto::pandoc_path(root),
            citeproc_bin: pandoc_auto::citeproc_path(root),
            working_dir: None,
            env: Vec::new(),
        }
    }
}

/// Builder for [`PandocConfig`].
///
/// Unset fields fall back to [`PandocConfig::default`], independently per
/// field.
#[derive(Debug, Default)]
pub struct PandocConfigBuilder {
    root: Option<PathBuf>,
    pandoc_bin: Option<PathBuf>,
    citeproc_bin: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl PandocConfigBuilder {
    /// Take defaults from this cache root instead of the `pandoc-auto` one.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn pandoc_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.pandoc_bin = Some(path.into());
        self
    }

    pub fn citeproc_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.citeproc_bin = Some(path.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PandocConfig, PandocError> {
        let base = match self.root {
            Some(ref root) => PandocConfig::from_root(root),
            None => PandocConfig::default(),
        };

        let config = PandocConfig {
            pandoc_bin: self.pandoc_bin.unwrap_or(base.pandoc_bin),
            citeproc_bin: self.citeproc_bin.unwrap_or(base.citeproc_bin),
            working_dir: self.working_dir,
            env: self.env,
        };

        if config.pandoc_bin.as_os_str().is_empty() {
            return Err(PandocError::InvalidConfig(
                "pandoc binary path must not be empty".into(),
            ));
        }
        if config.citeproc_bin.as_os_str().is_empty() {
            return Err(PandocError::InvalidConfig(
                "pandoc-citeproc binary path must not be empty".into(),
            ));
        }
        if let Some(ref dir) = config.working_dir {
            if !dir.is_dir() {
                return Err(PandocError::InvalidConfig(format!(
                    "working directory '{}' does not exist",
                    dir.display()
                )));
            }
        }
        if config.env.iter().any(|(k, _)| k.is_empty() || k.contains('=')) {
            return Err(PandocError::InvalidConfig(
                "environment variable names must be non-empty and contain no '='".into(),
            ));
        }

        Ok(config)
    }
}
