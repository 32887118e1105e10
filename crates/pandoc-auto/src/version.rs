//! Reading the version an installed pandoc binary reports about itself.

use std::path::Path;
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"pandoc(?:\.exe)?\s+v?(\d+\.\d+\.\d+(?:\.\d+)*)")
        .expect("version regex is valid")
});

/// Extracts `<major>.<minor>.<patch>[.<build>]` following the program name in
/// `pandoc --version` output.
pub fn parse_version(output: &str) -> Option<String> {
    VERSION_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Compares two version tags, ignoring a leading `v` and surrounding blanks.
pub fn versions_match(a: &str, b: &str) -> bool {
    let norm = |s: &str| s.trim().trim_start_matches('v').to_string();
    norm(a) == norm(b)
}

/// Runs `<bin> --version` and parses the result.
///
/// Any failure (missing file, spawn error, non-zero exit, unparsable output)
/// yields `None`.
pub fn installed_version(bin: &Path) -> Option<String> {
    if !bin.is_file() {
        return None;
    }

    let output = match Command::new(bin)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
    {
        Ok(o) => o,
        Err(e) => {
            debug!("Could not run {} --version: {}", bin.display(), e);
            return None;
        }
    };

    if !output.status.success() {
        debug!("{} --version exited with {}", bin.display(), output.status);
        return None;
    }

    let version = parse_version(&String::from_utf8_lossy(&output.stdout));
    if version.is_none() {
        debug!("Unrecognised version output from {}", bin.display());
    }
    version
}
