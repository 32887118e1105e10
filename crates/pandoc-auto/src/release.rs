//! GitHub release metadata and platform asset selection.

use serde::Deserialize;
use tracing::debug;

use crate::platform::arch_hints;
use crate::PandocAutoError;

/// One versioned build of pandoc as described by the release host.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

impl Asset {
    /// `true` for `.zip` and `.tar.gz` names.
    pub fn is_archive(&self) -> bool {
        self.name.ends_with(".zip") || self.name.ends_with(".tar.gz")
    }
}

/// Fetches the descriptor of release `version`, or of the latest release
/// when `version` is `None`.
pub fn fetch_release(
    client: &reqwest::blocking::Client,
    api_base: &str,
    repo: &str,
    version: Option<&str>,
) -> Result<ReleaseDescriptor, PandocAutoError> {
    let url = match version {
        Some(tag) => format!("{api_base}/repos/{repo}/releases/tags/{tag}"),
        None => format!("{api_base}/repos/{repo}/releases/latest"),
    };
    debug!("GET {}", url);

    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .map_err(|e| PandocAutoError::Network(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PandocAutoError::Http {
            status: response.status().as_u16(),
            url,
        });
    }

    let body = response
        .text()
        .map_err(|e| PandocAutoError::Network(format!("GET {url}: {e}")))?;

    serde_json::from_str(&body).map_err(|e| PandocAutoError::Metadata {
        url,
        reason: e.to_string(),
    })
}

/// Picks the archive asset for `platform`.
///
/// Candidates are assets whose name contains `platform` and ends in `.zip`
/// or `.tar.gz`. When several remain (e.g. `linux-amd64` and `linux-arm64`),
/// one naming `arch` wins; otherwise the first candidate is used.
pub fn select_asset<'a>(assets: &'a [Asset], platform: &str, arch: &str) -> Option<&'a Asset> {
    let candidates: Vec<&Asset> = assets
        .iter()
        .filter(|a| a.name.contains(platform) && a.is_archive())
        .collect();

    let hints = arch_hints(arch);
    candidates
        .iter()
        .find(|a| hints.iter().any(|h| a.name.contains(h)))
        .or_else(|| candidates.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> Asset {
        Asset {
            name: name.to_string(),
            browser_download_url: format!("https://example.invalid/{name}"),
            size: 0,
        }
    }

    fn sample() -> Vec<Asset> {
        vec![
            asset("pandoc-x.y-linux-amd64.tar.gz"),
            asset("pandoc-x.y-macOS.zip"),
            asset("pandoc-x.y-windows-x86_64.zip"),
        ]
    }

    #[test]
    fn selects_linux_tarball() {
        let assets = sample();
        let picked = select_asset(&assets, "linux", "x86_64").unwrap();
        assert_eq!(picked.name, "pandoc-x.y-linux-amd64.tar.gz");
    }

    #[test]
    fn selects_mac_and_windows_zips() {
        let assets = sample();
        assert_eq!(select_asset(&assets, "macOS", "aarch64").unwrap().name, "pandoc-x.y-macOS.zip");
        assert_eq!(
            select_asset(&assets, "windows-x86_64", "x86_64").unwrap().name,
            "pandoc-x.y-windows-x86_64.zip"
        );
    }

    #[test]
    fn ignores_non_archive_assets() {
        let assets = vec![asset("pandoc-x.y-macOS.pkg"), asset("pandoc-x.y-windows-x86_64.msi")];
        assert!(select_asset(&assets, "macOS", "x86_64").is_none());
        assert!(select_asset(&assets, "windows-x86_64", "x86_64").is_none());
    }

    #[test]
    fn prefers_matching_arch() {
        let assets = vec![
            asset("pandoc-x.y-linux-arm64.tar.gz"),
            asset("pandoc-x.y-linux-amd64.tar.gz"),
        ];
        assert_eq!(select_asset(&assets, "linux", "x86_64").unwrap().name, "pandoc-x.y-linux-amd64.tar.gz");
        assert_eq!(select_asset(&assets, "linux", "aarch64").unwrap().name, "pandoc-x.y-linux-arm64.tar.gz");
        assert_eq!(select_asset(&assets, "linux", "riscv64").unwrap().name, "pandoc-x.y-linux-arm64.tar.gz");
    }

    #[test]
    fn descriptor_deserializes_github_shape() {
        let json = r#"{
            "tag_name": "3.1.11",
            "name": "pandoc 3.1.11",
            "assets": [
                {"name": "pandoc-3.1.11-linux-amd64.tar.gz",
                 "browser_download_url": "https://github.com/jgm/pandoc/releases/download/3.1.11/pandoc-3.1.11-linux-amd64.tar.gz",
                 "size": 31000000,
                 "content_type": "application/gzip"}
            ]
        }"#;
        let release: ReleaseDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "3.1.11");
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].size, 31_000_000);
    }
}
