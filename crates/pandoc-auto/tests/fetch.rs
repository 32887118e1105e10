//! Fetcher tests against a local mock release host.
//!
//! [`mockito`] stands in for both the GitHub API and the asset download
//! endpoint, so the full metadata → download → extract → flatten path runs
//! without touching the network.

use std::path::Path;
use std::sync::Mutex;

use flate2::write::GzEncoder;
use flate2::Compression;
use pandoc_auto::{
    current_platform_key, ensure_binaries, pandoc_path, FetchOptions, FetchOutcome, PandocAutoError,
};

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// A gzipped tarball laid out like a pandoc release, whose `pandoc` is a
/// shell script reporting `version`.
fn release_tarball(version: &str) -> Vec<u8> {
    let script = format!("#!/bin/sh\necho 'pandoc {version}'\n");
    let gz = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(gz);

    let mut header = tar::Header::new_gnu();
    header.set_size(script.len() as u64);
    header.set_mode(0o755);
    builder
        .append_data(&mut header, format!("pandoc-{version}/bin/pandoc"), script.as_bytes())
        .unwrap();

    let mut readme = tar::Header::new_gnu();
    readme.set_size(5);
    readme.set_mode(0o644);
    builder
        .append_data(&mut readme, format!("pandoc-{version}/README"), &b"hello"[..])
        .unwrap();

    builder.into_inner().unwrap().finish().unwrap()
}

/// A zip laid out like the macOS / Windows releases, with an executable
/// `pandoc` script.
fn release_zip(version: &str) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let script = format!("#!/bin/sh\necho 'pandoc {version}'\n");
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let exec = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o755);

    writer
        .start_file(format!("pandoc-{version}/bin/pandoc"), exec)
        .unwrap();
    writer.write_all(script.as_bytes()).unwrap();
    writer
        .start_file(format!("pandoc-{version}/README"), SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"hello").unwrap();

    writer.finish().unwrap().into_inner()
}

fn asset_name(version: &str) -> String {
    format!("pandoc-{version}-{}-amd64.tar.gz", current_platform_key())
}

fn release_json(server_url: &str, version: &str, asset: &str) -> String {
    serde_json::json!({
        "tag_name": version,
        "assets": [
            {
                "name": asset,
                "browser_download_url": format!("{server_url}/download/{asset}"),
                "size": 1234
            }
        ]
    })
    .to_string()
}

/// Held by tests that write an executable and then run it; a concurrent
/// fork can otherwise make `exec` fail with ETXTBSY.
static SERIAL: Mutex<()> = Mutex::new(());

fn options(server_url: &str, root: &Path) -> FetchOptions {
    FetchOptions::default()
        .with_api_base(server_url)
        .with_root(root)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn pinned_fetch_is_idempotent() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();
    let version = "9.9.9";
    let asset = asset_name(version);

    let meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/tags/9.9.9")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(release_json(&server.url(), version, &asset))
        .expect(1)
        .create();
    let download = server
        .mock("GET", format!("/download/{asset}").as_str())
        .with_status(200)
        .with_body(release_tarball(version))
        .expect(1)
        .create();

    let opts = options(&server.url(), root.path()).with_version(version);

    let first = ensure_binaries(&opts, None).expect("first fetch");
    match first {
        FetchOutcome::Installed { ref tag, ref binaries } => {
            assert_eq!(tag, version);
            assert_eq!(binaries, &vec![pandoc_path(root.path())]);
        }
        other => panic!("expected Installed, got {other:?}"),
    }
    let installed = std::fs::read(pandoc_path(root.path())).unwrap();

    let second = ensure_binaries(&opts, None).expect("second fetch");
    assert_eq!(
        second,
        FetchOutcome::AlreadyInstalled {
            version: version.to_string()
        }
    );
    assert_eq!(std::fs::read(pandoc_path(root.path())).unwrap(), installed);

    meta.assert();
    download.assert();
}

#[cfg(unix)]
#[test]
fn version_mismatch_triggers_refetch() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();

    // Pre-populate the cache with an older pandoc.
    std::fs::write(pandoc_path(root.path()), "#!/bin/sh\necho 'pandoc 1.0.0'\n").unwrap();
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            pandoc_path(root.path()),
            std::fs::Permissions::from_mode(0o755),
        )
        .unwrap();
    }

    let asset = asset_name("2.0.0");
    let meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/tags/2.0.0")
        .with_status(200)
        .with_body(release_json(&server.url(), "2.0.0", &asset))
        .expect(1)
        .create();
    let download = server
        .mock("GET", format!("/download/{asset}").as_str())
        .with_status(200)
        .with_body(release_tarball("2.0.0"))
        .expect(1)
        .create();

    let opts = options(&server.url(), root.path()).with_version("2.0.0");
    let outcome = ensure_binaries(&opts, None).unwrap();
    assert!(matches!(outcome, FetchOutcome::Installed { .. }));
    assert_eq!(
        pandoc_auto::installed_version(&pandoc_path(root.path())).as_deref(),
        Some("2.0.0")
    );

    meta.assert();
    download.assert();
}

#[test]
fn missing_platform_asset_is_reported() {
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();

    let meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/latest")
        .with_status(200)
        .with_body(release_json(&server.url(), "9.9.9", "pandoc-9.9.9-plan9.tar.gz"))
        .expect(1)
        .create();

    let opts = options(&server.url(), root.path()).latest();
    let outcome = ensure_binaries(&opts, None).unwrap();

    assert_eq!(
        outcome,
        FetchOutcome::NoMatchingAsset {
            tag: "9.9.9".to_string()
        }
    );
    assert!(!outcome.has_binaries());
    assert!(!pandoc_path(root.path()).exists());
    meta.assert();
}

#[test]
fn http_error_on_metadata_is_fatal() {
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();

    let _meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/tags/0.0.1")
        .with_status(404)
        .create();

    let opts = options(&server.url(), root.path()).with_version("0.0.1");
    let err = ensure_binaries(&opts, None).unwrap_err();
    assert!(
        matches!(err, PandocAutoError::Http { status: 404, .. }),
        "got: {err}"
    );
}

#[test]
fn malformed_metadata_is_reported() {
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();

    let _meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/latest")
        .with_status(200)
        .with_body("{ not json")
        .create();

    let opts = options(&server.url(), root.path()).latest();
    let err = ensure_binaries(&opts, None).unwrap_err();
    assert!(matches!(err, PandocAutoError::Metadata { .. }), "got: {err}");
}

#[test]
fn failed_download_leaves_no_archive() {
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();
    let asset = asset_name("9.9.9");

    let _meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/latest")
        .with_status(200)
        .with_body(release_json(&server.url(), "9.9.9", &asset))
        .create();
    let _download = server
        .mock("GET", format!("/download/{asset}").as_str())
        .with_status(500)
        .create();

    let opts = options(&server.url(), root.path()).latest();
    let err = ensure_binaries(&opts, None).unwrap_err();
    assert!(matches!(err, PandocAutoError::Http { status: 500, .. }), "got: {err}");

    let version_dir = root.path().join("9.9.9");
    let leftovers: Vec<_> = std::fs::read_dir(&version_dir).unwrap().collect();
    assert!(leftovers.is_empty(), "partial files left behind: {leftovers:?}");
}

#[cfg(unix)]
#[test]
fn cleanup_removes_version_directory_and_reports_progress() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();
    let asset = asset_name("9.9.9");
    let body = release_tarball("9.9.9");
    let body_len = body.len() as u64;

    let _meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/latest")
        .with_status(200)
        .with_body(release_json(&server.url(), "9.9.9", &asset))
        .create();
    let _download = server
        .mock("GET", format!("/download/{asset}").as_str())
        .with_status(200)
        .with_body(body)
        .create();

    let last = std::cell::Cell::new(0u64);
    let opts = options(&server.url(), root.path()).latest().with_cleanup(true);
    let outcome = ensure_binaries(&opts, Some(&|received, _total| last.set(received))).unwrap();

    assert!(matches!(outcome, FetchOutcome::Installed { .. }));
    assert_eq!(last.get(), body_len);
    assert!(pandoc_path(root.path()).is_file());
    assert!(!root.path().join("9.9.9").exists());
}

#[cfg(unix)]
#[test]
fn zip_release_installs_runnable_binary() {
    use std::os::unix::fs::PermissionsExt;

    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();
    let asset = format!("pandoc-9.9.9-{}.zip", current_platform_key());

    let _meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/tags/9.9.9")
        .with_status(200)
        .with_body(release_json(&server.url(), "9.9.9", &asset))
        .create();
    let download = server
        .mock("GET", format!("/download/{asset}").as_str())
        .with_status(200)
        .with_body(release_zip("9.9.9"))
        .expect(1)
        .create();

    let opts = options(&server.url(), root.path()).with_version("9.9.9");
    let outcome = ensure_binaries(&opts, None).unwrap();
    assert!(matches!(outcome, FetchOutcome::Installed { .. }), "got {outcome:?}");

    let bin = pandoc_path(root.path());
    let mode = std::fs::metadata(&bin).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111, "exec bits lost: {mode:o}");
    assert_eq!(pandoc_auto::installed_version(&bin).as_deref(), Some("9.9.9"));
    download.assert();
}

#[cfg(unix)]
#[test]
fn present_archive_skips_download() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let mut server = mockito::Server::new();
    let root = tempfile::tempdir().unwrap();
    let asset = asset_name("9.9.9");

    let version_dir = root.path().join("9.9.9");
    std::fs::create_dir_all(&version_dir).unwrap();
    std::fs::write(version_dir.join(&asset), release_tarball("9.9.9")).unwrap();

    let _meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/latest")
        .with_status(200)
        .with_body(release_json(&server.url(), "9.9.9", &asset))
        .create();
    let download = server
        .mock("GET", format!("/download/{asset}").as_str())
        .with_status(200)
        .expect(0)
        .create();

    let opts = options(&server.url(), root.path()).latest();
    let outcome = ensure_binaries(&opts, None).unwrap();

    assert_eq!(
        outcome,
        FetchOutcome::Installed {
            tag: "9.9.9".to_string(),
            binaries: vec![pandoc_path(root.path())],
        }
    );
    download.assert();
}

#[cfg(unix)]
#[test]
fn concurrent_first_fetches_share_one_root() {
    use std::sync::{Arc, Barrier};

    const CALLERS: usize = 8;
    const ROUNDS: usize = 5;

    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let mut server = mockito::Server::new();
    let asset = asset_name("9.9.9");

    let _meta = server
        .mock("GET", "/repos/jgm/pandoc/releases/latest")
        .with_status(200)
        .with_body(release_json(&server.url(), "9.9.9", &asset))
        .create();
    let _download = server
        .mock("GET", format!("/download/{asset}").as_str())
        .with_status(200)
        .with_body(release_tarball("9.9.9"))
        .create();

    for round in 0..ROUNDS {
        let root = tempfile::tempdir().unwrap();
        let opts = options(&server.url(), root.path()).latest();
        let barrier = Arc::new(Barrier::new(CALLERS));

        let outcomes: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    let barrier = Arc::clone(&barrier);
                    let opts = &opts;
                    s.spawn(move || {
                        barrier.wait();
                        ensure_binaries(opts, None)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for outcome in outcomes {
            let outcome = outcome.unwrap_or_else(|e| panic!("round {round}: {e}"));
            assert!(matches!(outcome, FetchOutcome::Installed { .. }), "round {round}: {outcome:?}");
        }

        let installed = std::fs::read_to_string(pandoc_path(root.path())).unwrap();
        assert_eq!(installed, "#!/bin/sh\necho 'pandoc 9.9.9'\n");

        // No staging or scratch files survive in the flat root.
        let stray: Vec<_> = std::fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(stray.is_empty(), "round {round}: leftover staging files {stray:?}");
        let scratch: Vec<_> = std::fs::read_dir(root.path().join("9.9.9"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().starts_with(".extract-"))
            .collect();
        assert!(scratch.is_empty(), "round {round}: leftover scratch dirs {scratch:?}");
    }
}
