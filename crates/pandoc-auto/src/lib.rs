//! # pandoc-auto
//!
//! Auto-download and cache [pandoc](https://pandoc.org) release binaries, so
//! that users of `pandoc-bridge` no longer need to install pandoc themselves.
//!
//! ## How it works
//!
//! On a call to [`ensure_binaries`]:
//!
//! 1. Maps the running OS/arch to a release platform key (`linux`, `macOS`,
//!    `windows-x86_64`, `windows-i386`).
//! 2. With a pinned version, runs `<root>/pandoc --version`; a match means
//!    nothing else happens.
//! 3. Otherwise fetches the release descriptor from the GitHub API and picks
//!    the `.zip` / `.tar.gz` asset for the platform.
//! 4. Downloads the archive into `<root>/<tag>/` (temp file + rename), extracts
//!    it into a per-call scratch directory, and copies `pandoc` /
//!    `pandoc-citeproc` into the flat `<root>/` (again temp file + rename).
//!
//! Concurrent first fetches into one root are safe: each caller extracts into
//! its own tree and every file that lands in a shared location is renamed
//! into place whole. `cleanup` removes the shared `<root>/<tag>/` directory
//! and should not be combined with concurrent callers.
//!
//! Subsequent calls with the same pinned version skip the network entirely.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pandoc_auto::{ensure_binaries, FetchOptions, FetchOutcome};
//!
//! let options = FetchOptions::default().with_cleanup(true);
//! let outcome = ensure_binaries(&options, Some(&|received, total| {
//!     if let Some(t) = total {
//!         eprint!("\rDownloading pandoc: {}/{} bytes", received, t);
//!     }
//! })).expect("fetch failed");
//!
//! if let FetchOutcome::NoMatchingAsset { tag } = outcome {
//!     eprintln!("release {tag} has no archive for this platform");
//! }
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PANDOC_AUTO_CACHE_DIR` — override the default cache root.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

mod archive;
mod platform;
mod release;
mod version;

pub use archive::{collect_binaries, extract_archive, ArchiveKind};
pub use platform::{binary_file_name, current_platform_key, platform_key, BINARY_NAMES};
pub use release::{fetch_release, select_asset, Asset, ReleaseDescriptor};
pub use version::{installed_version, parse_version, versions_match};

// ── Public constants ─────────────────────────────────────────────────────────

/// The pandoc release tag installed when no other version is requested.
pub const PANDOC_VERSION: &str = "3.1.11";

/// GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// `owner/repo` that publishes the pandoc releases.
pub const DEFAULT_REPO: &str = "jgm/pandoc";

/// Directory name of the flat binary cache.
pub const LOCAL_DIR_NAME: &str = ".pandoc-local";

/// Main binary stem.
pub const PANDOC_BIN: &str = "pandoc";

/// Companion citation-processor binary stem (absent from pandoc ≥ 2.11 archives).
pub const CITEPROC_BIN: &str = "pandoc-citeproc";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pandoc-auto operations.
#[derive(Error, Debug)]
pub enum PandocAutoError {
    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error for '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure talking to the release host.
    #[error("Network error: {0}")]
    Network(String),

    /// The release host answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// The release descriptor could not be decoded.
    #[error("Invalid release metadata from {url}: {reason}")]
    Metadata { url: String, reason: String },

    /// zip or gzip/tar extraction failed.
    #[error("Archive extraction failed for '{path}': {reason}")]
    Extract { path: PathBuf, reason: String },

    /// Local file I/O failed while writing the cache.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Options / outcome ────────────────────────────────────────────────────────

/// Inputs for [`ensure_binaries`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Flat cache root; binaries land directly in here.
    pub root: PathBuf,
    /// Pinned release tag. `None` means "latest release" and disables the
    /// installed-version short-circuit.
    pub version: Option<String>,
    /// GitHub API base, e.g. `https://api.github.com`.
    pub api_base: String,
    /// `owner/repo` publishing the releases.
    pub repo: String,
    /// Remove `<root>/<tag>/` (archive + extraction tree) after copying.
    pub cleanup: bool,
    /// Timeout applied to each HTTP request.
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            root: default_root(),
            version: Some(PANDOC_VERSION.to_string()),
            api_base: DEFAULT_API_BASE.to_string(),
            repo: DEFAULT_REPO.to_string(),
            cleanup: false,
            timeout: Duration::from_secs(300),
        }
    }
}

impl FetchOptions {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Track the latest release instead of a pinned tag.
    pub fn latest(mut self) -> Self {
        self.version = None;
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// What [`ensure_binaries`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The pinned version was already installed; no network access happened.
    AlreadyInstalled { version: String },
    /// Binaries were (re)installed from release `tag`.
    Installed { tag: String, binaries: Vec<PathBuf> },
    /// Release `tag` has no archive for this platform; nothing was installed.
    NoMatchingAsset { tag: String },
}

impl FetchOutcome {
    /// `true` unless no asset matched the platform.
    pub fn has_binaries(&self) -> bool {
        !matches!(self, FetchOutcome::NoMatchingAsset { .. })
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the default flat cache root.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/pandoc-auto/.pandoc-local/`
/// - **Linux**: `~/.cache/pandoc-auto/.pandoc-local/`
/// - **Windows**: `%LOCALAPPDATA%\pandoc-auto\.pandoc-local\`
///
/// Override by setting `PANDOC_AUTO_CACHE_DIR` (used as the root verbatim).
pub fn default_root() -> PathBuf {
    if let Ok(override_dir) = std::env::var("PANDOC_AUTO_CACHE_DIR") {
        if !override_dir.is_empty() {
            return PathBuf::from(override_dir);
        }
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pandoc-auto").join(LOCAL_DIR_NAME)
}

/// Path of the main binary inside `root`.
pub fn pandoc_path(root: &Path) -> PathBuf {
    root.join(binary_file_name(PANDOC_BIN))
}

/// Path of the citation-processor binary inside `root`.
pub fn citeproc_path(root: &Path) -> PathBuf {
    root.join(binary_file_name(CITEPROC_BIN))
}

/// Returns `true` if the main binary exists in `root`.
pub fn is_pandoc_cached(root: &Path) -> bool {
    pandoc_path(root).is_file()
}

/// Returns the on-disk path to the main binary, or `None` if not cached.
pub fn cached_pandoc_path(root: &Path) -> Option<PathBuf> {
    let p = pandoc_path(root);
    p.is_file().then_some(p)
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Ensures the pandoc binaries for `options.version` are present in
/// `options.root`.
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` during the
/// archive download. Pass `None` to suppress progress callbacks.
///
/// Blocking: call from a sync context, `spawn_blocking`, or `block_in_place`.
pub fn ensure_binaries(
    options: &FetchOptions,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<FetchOutcome, PandocAutoError> {
    // 1. Pinned version already installed.
    if let Some(ref pinned) = options.version {
        if let Some(found) = installed_version(&pandoc_path(&options.root)) {
            if versions_match(&found, pinned) {
                debug!("pandoc {} already installed in {}", found, options.root.display());
                return Ok(FetchOutcome::AlreadyInstalled { version: found });
            }
            info!("Installed pandoc {} does not match pinned {}", found, pinned);
        }
    }

    let client = http_client(options)?;

    // 2. Release metadata.
    let release = fetch_release(&client, &options.api_base, &options.repo, options.version.as_deref())?;
    info!("Resolved pandoc release {}", release.tag_name);

    // 3. Asset for this platform.
    let platform = current_platform_key();
    let Some(asset) = select_asset(&release.assets, platform, std::env::consts::ARCH) else {
        warn!(
            "Release {} has no .zip/.tar.gz asset for platform '{}'",
            release.tag_name, platform
        );
        return Ok(FetchOutcome::NoMatchingAsset {
            tag: release.tag_name,
        });
    };

    let download_dir = options.root.join(&release.tag_name);
    std::fs::create_dir_all(&download_dir).map_err(|source| PandocAutoError::CacheDir {
        path: download_dir.clone(),
        source,
    })?;

    // 4. Download unless the archive is already there.
    let archive_path = download_dir.join(&asset.name);
    if archive_path.exists() {
        debug!("Archive already present: {}", archive_path.display());
    } else {
        info!("Downloading {} ({} bytes)", asset.name, asset.size);
        archive::download_to(&client, &asset.browser_download_url, &archive_path, on_progress)?;
    }

    // 5. Extract into a private scratch tree, then flatten.
    let scratch = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(&download_dir)
        .map_err(|source| PandocAutoError::Io {
            path: download_dir.clone(),
            source,
        })?;
    extract_archive(&archive_path, scratch.path())?;
    let binaries = collect_binaries(scratch.path(), &options.root)?;
    drop(scratch);
    info!(
        "Installed {} binar{} from {}",
        binaries.len(),
        if binaries.len() == 1 { "y" } else { "ies" },
        release.tag_name
    );

    // 6. Optional cleanup.
    if options.cleanup {
        std::fs::remove_dir_all(&download_dir).map_err(|source| PandocAutoError::Io {
            path: download_dir.clone(),
            source,
        })?;
        debug!("Removed {}", download_dir.display());
    }

    Ok(FetchOutcome::Installed {
        tag: release.tag_name,
        binaries,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn http_client(options: &FetchOptions) -> Result<reqwest::blocking::Client, PandocAutoError> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("pandoc-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(options.timeout)
        .build()
        .map_err(|e| PandocAutoError::Network(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
