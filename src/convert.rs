//! Conversion entry points.
//!
//! Every method spawns one independent pandoc process; a [`Pandoc`] holds
//! nothing but its [`PandocConfig`], so it can be cloned freely and used
//! from many tasks at once.
//!
//! | Method | Source | Destination | argv |
//! |--------|--------|-------------|------|
//! | [`Pandoc::convert`] | text → stdin | stdout → `String` | `-f F -t T …` |
//! | [`Pandoc::convert_to_file`] | text → stdin | file | `-f F -t T -o OUT …` |
//! | [`Pandoc::convert_from_file`] | file | file | `IN -t T -o OUT …` |

use crate::config::PandocConfig;
use crate::error::PandocError;
use crate::stream::{PandocProcess, ProcessOutput};
use std::ffi::OsString;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Client for a local pandoc binary.
///
/// # Example
/// ```rust,no_run
/// use pandoc_bridge::{InputFormat, OutputFormat, Pandoc, PandocConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pandoc = Pandoc::new(PandocConfig::builder().pandoc_bin("/usr/bin/pandoc").build()?);
/// pandoc
///     .convert_to_file("# Title", InputFormat::Markdown, OutputFormat::Html, "out.html", &["--standalone"])
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pandoc {
    config: PandocConfig,
}

impl Pandoc {
    pub fn new(config: PandocConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PandocConfig {
        &self.config
    }

    /// Start pandoc with `-f <from> -t <to> [extra_args…]` and hand back the
    /// running process without touching its pipes.
    ///
    /// # Errors
    /// [`PandocError::Spawn`] when the binary cannot be started.
    pub fn stream(
        &self,
        from: impl AsRef<str>,
        to: impl AsRef<str>,
        extra_args: &[&str],
    ) -> Result<PandocProcess, PandocError> {
        let mut args = direction_args(from.as_ref(), to.as_ref());
        args.extend(extra_args.iter().map(OsString::from));
        PandocProcess::spawn(&self.config, args)
    }

    /// Convert `src` from one format to another and return pandoc's stdout.
    ///
    /// # Errors
    /// - [`PandocError::Spawn`] — binary missing or not executable
    /// - [`PandocError::NonZeroExit`] — pandoc failed
    /// - [`PandocError::Diagnostic`] — pandoc exited 0 but wrote to stderr
    pub async fn convert(
        &self,
        src: &str,
        from: impl AsRef<str>,
        to: impl AsRef<str>,
        extra_args: &[&str],
    ) -> Result<String, PandocError> {
        let extra = extra_args.iter().map(OsString::from).collect();
        self.pipe(src, from.as_ref(), to.as_ref(), extra).await
    }

    /// `src` on stdin, `-f <from> -t <to> [extra…]` on the command line.
    async fn pipe(
        &self,
        src: &str,
        from: &str,
        to: &str,
        extra: Vec<OsString>,
    ) -> Result<String, PandocError> {
        let start = Instant::now();
        debug!("Converting {} bytes {} → {}", src.len(), from, to);

        let mut args = direction_args(from, to);
        args.extend(extra);
        let output = PandocProcess::spawn(&self.config, args)?
            .finish(Some(src.as_bytes()))
            .await?;

        let result = output.into_result();
        if result.is_ok() {
            info!(
                "Converted {} → {} in {}ms",
                from,
                to,
                start.elapsed().as_millis()
            );
        }
        result
    }

    /// Like [`Pandoc::convert`], but pandoc writes the result to
    /// `output_path` (`-o`).
    ///
    /// Returns whatever pandoc still printed on stdout, normally an empty
    /// string. The file itself is not inspected.
    pub async fn convert_to_file(
        &self,
        src: &str,
        from: impl AsRef<str>,
        to: impl AsRef<str>,
        output_path: impl AsRef<Path>,
        extra_args: &[&str],
    ) -> Result<String, PandocError> {
        let mut args = vec![OsString::from("-o"), output_path.as_ref().as_os_str().to_owned()];
        args.extend(extra_args.iter().map(OsString::from));
        self.pipe(src, from.as_ref(), to.as_ref(), args).await
    }

    /// Convert the file at `input_path` into `output_path`.
    ///
    /// No `-f` is passed: pandoc infers the input format from the file
    /// extension. Nothing is written to stdin.
    pub async fn convert_from_file(
        &self,
        input_path: impl AsRef<Path>,
        to: impl AsRef<str>,
        output_path: impl AsRef<Path>,
        extra_args: &[&str],
    ) -> Result<String, PandocError> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        let start = Instant::now();

        let mut args = vec![
            input_path.as_os_str().to_owned(),
            OsString::from("-t"),
            OsString::from(to.as_ref()),
            OsString::from("-o"),
            output_path.as_os_str().to_owned(),
        ];
        args.extend(extra_args.iter().map(OsString::from));

        let result = self.run(args, None).await?.into_result();
        if result.is_ok() {
            info!(
                "Converted {} → {} in {}ms",
                input_path.display(),
                output_path.display(),
                start.elapsed().as_millis()
            );
        }
        result
    }

    /// Blocking wrapper around [`Pandoc::convert`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn convert_sync(
        &self,
        src: &str,
        from: impl AsRef<str>,
        to: impl AsRef<str>,
        extra_args: &[&str],
    ) -> Result<String, PandocError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PandocError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert(src, from, to, extra_args))
    }

    /// Version reported by `pandoc --version`, e.g. `"3.1.11"`.
    pub async fn version(&self) -> Result<String, PandocError> {
        let stdout = self
            .run(vec![OsString::from("--version")], None)
            .await?
            .into_result()?;
        pandoc_auto::parse_version(&stdout).ok_or(PandocError::UnknownVersion { output: stdout })
    }

    /// `--filter <citeproc_bin>` for pandoc versions that still need the
    /// external citation processor. Append to `extra_args` as needed.
    pub fn citeproc_filter_args(&self) -> Vec<String> {
        vec![
            "--filter".to_string(),
            self.config.citeproc_bin.to_string_lossy().into_owned(),
        ]
    }

    async fn run(&self, args: Vec<OsString>, input: Option<&[u8]>) -> Result<ProcessOutput, PandocError> {
        PandocProcess::spawn(&self.config, args)?.finish(input).await
    }
}

/// `-f <from> -t <to>`
fn direction_args(from: &str, to: &str) -> Vec<OsString> {
    ["-f", from, "-t", to].into_iter().map(OsString::from).collect()
}
