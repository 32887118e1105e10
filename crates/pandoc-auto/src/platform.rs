//! Platform identifiers used in pandoc release asset names.

/// Binary stems copied out of a release archive.
pub const BINARY_NAMES: [&str; 2] = [crate::PANDOC_BIN, crate::CITEPROC_BIN];

/// Maps an OS name (as in [`std::env::consts::OS`]) and architecture to the
/// substring pandoc uses in its release asset names.
///
/// Unknown operating systems fall back to `linux`.
pub fn platform_key(os: &str, arch: &str) -> &'static str {
    match os {
        "windows" => {
            if arch == "x86_64" {
                "windows-x86_64"
            } else {
                "windows-i386"
            }
        }
        "macos" => "macOS",
        _ => "linux",
    }
}

/// [`platform_key`] for the running process.
pub fn current_platform_key() -> &'static str {
    platform_key(std::env::consts::OS, std::env::consts::ARCH)
}

/// Alternative spellings of `arch` that show up in asset names.
pub(crate) fn arch_hints(arch: &str) -> &'static [&'static str] {
    match arch {
        "x86_64" => &["amd64", "x86_64"],
        "aarch64" => &["arm64", "aarch64"],
        "x86" => &["i386", "i686"],
        _ => &[],
    }
}

/// On-disk file name for a binary stem (`pandoc` → `pandoc.exe` on Windows).
pub fn binary_file_name(stem: &str) -> String {
    format!("{stem}{}", std::env::consts::EXE_SUFFIX)
}
