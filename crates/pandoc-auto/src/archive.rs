//! Archive download, extraction, and binary flattening.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::platform::{binary_file_name, BINARY_NAMES};
use crate::PandocAutoError;

/// Container format, decided purely by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// `.zip` → [`ArchiveKind::Zip`], anything else → [`ArchiveKind::TarGz`].
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".zip") {
            ArchiveKind::Zip
        } else {
            ArchiveKind::TarGz
        }
    }
}

/// Streams `url` into `dest`, calling `on_progress` after every chunk.
///
/// The body is written to a temporary file next to `dest` and renamed into
/// place once complete, so `dest` never holds a partial download.
pub(crate) fn download_to(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<(), PandocAutoError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PandocAutoError::Network(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PandocAutoError::Http {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    let total = response.content_length();
    let io_err = |source| PandocAutoError::Io {
        path: dest.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(io_err)?;

    let mut chunk = vec![0u8; 64 * 1024]; // 64 KiB
    let mut downloaded: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                tmp.write_all(&chunk[..n]).map_err(io_err)?;
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(PandocAutoError::Network(format!("Read error for {url}: {e}")));
            }
        }
    }

    if let Some(expected) = total {
        if downloaded != expected {
            return Err(PandocAutoError::Network(format!(
                "Truncated download for {url}: {downloaded}/{expected} bytes"
            )));
        }
    }

    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(dest).map_err(|e| io_err(e.error))?;
    debug!("Downloaded {} bytes to {}", downloaded, dest.display());

    Ok(())
}

/// Unpacks `archive` into `dest_dir`, choosing the format by extension.
pub fn extract_archive(archive: &Path, dest_dir: &Path) -> Result<(), PandocAutoError> {
    let extract_err = |reason: String| PandocAutoError::Extract {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive).map_err(|e| extract_err(e.to_string()))?;

    match ArchiveKind::from_path(archive) {
        ArchiveKind::Zip => {
            let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_err(e.to_string()))?;
            zip.extract(dest_dir).map_err(|e| extract_err(e.to_string()))?;
        }
        ArchiveKind::TarGz => {
            let gz = flate2::read::GzDecoder::new(file);
            let mut tar = tar::Archive::new(gz);
            tar.set_preserve_permissions(true);
            tar.unpack(dest_dir).map_err(|e| extract_err(e.to_string()))?;
        }
    }

    debug!("Extracted {} into {}", archive.display(), dest_dir.display());
    Ok(())
}

/// Copies every `pandoc` / `pandoc-citeproc` file found under `search_dir`
/// into `root`, dropping the archive's directory structure.
///
/// Each copy goes through a uniquely named temporary file in `root` and is
/// renamed over the previous binary, so a running `pandoc` is never
/// overwritten in place and concurrent callers never share a staging file.
pub fn collect_binaries(search_dir: &Path, root: &Path) -> Result<Vec<PathBuf>, PandocAutoError> {
    let wanted: Vec<String> = BINARY_NAMES.iter().map(|s| binary_file_name(s)).collect();
    let mut copied = Vec::new();

    for entry in WalkDir::new(search_dir).follow_links(false) {
        let entry = entry.map_err(|e| PandocAutoError::Extract {
            path: search_dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if !wanted.contains(&name) {
            continue;
        }

        let target = root.join(&name);
        let io_err = |source| PandocAutoError::Io {
            path: target.clone(),
            source,
        };

        let mut staging = tempfile::Builder::new()
            .prefix(&format!(".{name}-"))
            .suffix(".tmp")
            .tempfile_in(root)
            .map_err(io_err)?;
        let mut src = File::open(entry.path()).map_err(io_err)?;
        std::io::copy(&mut src, staging.as_file_mut()).map_err(io_err)?;
        let permissions = src.metadata().map_err(io_err)?.permissions();
        staging.as_file().set_permissions(permissions).map_err(io_err)?;
        staging.as_file().sync_all().map_err(io_err)?;
        staging.persist(&target).map_err(|e| io_err(e.error))?;
        debug!("Copied {} -> {}", entry.path().display(), target.display());
        copied.push(target);
    }

    copied.sort();
    copied.dedup();
    Ok(copied)
}
