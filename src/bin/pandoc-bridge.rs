//! CLI binary for pandoc-bridge.
//!
//! A thin shim over the library crate: `install` drives `pandoc-auto`,
//! `convert` maps flags onto [`Pandoc`] calls and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pandoc_bridge::pandoc_auto::{self, FetchOptions, FetchOutcome};
use pandoc_bridge::{InputFormat, OutputFormat, Pandoc, PandocConfig};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

const AFTER_HELP: &str = r#"EXAMPLES:
  # Fetch the pinned pandoc release into the default cache
  pandoc-bridge install

  # Fetch the newest release into a project-local directory
  pandoc-bridge install --version latest --cache-dir ./.pandoc-local --cleanup

  # stdin → stdout
  echo '# Heading' | pandoc-bridge convert -f markdown -t html

  # Text in, file out (pandoc writes the file)
  pandoc-bridge convert -f markdown -t docx -o report.docx < report.md

  # File in, file out (input format inferred from the extension)
  pandoc-bridge convert -t html -i notes.md -o notes.html -- --standalone --toc

  # List known format tokens
  pandoc-bridge formats --json

ENVIRONMENT VARIABLES:
  PANDOC_BIN                 Path to an existing pandoc — skips the cache
  PANDOC_AUTO_CACHE_DIR      Override the default cache root
  PANDOC_BRIDGE_CACHE_DIR    Cache root for `install` and binary lookup
  PANDOC_BRIDGE_VERSION      Release to install (`latest` for newest)
  RUST_LOG                   tracing filter, e.g. `pandoc_bridge=debug`

SETUP:
  1. Install:   pandoc-bridge install
  2. Convert:   pandoc-bridge convert -f markdown -t html -i README.md

  pandoc is downloaded from the jgm/pandoc GitHub releases and flattened into
  ~/.cache/pandoc-auto/.pandoc-local/. Subsequent installs of the same pinned
  version do not touch the network.
"#;

/// Drive a locally cached pandoc binary.
#[derive(Parser, Debug)]
#[command(
    name = "pandoc-bridge",
    version,
    about = "Fetch a pandoc binary and convert documents with it",
    long_about = "Fetch a platform-appropriate pandoc release into a local cache, then \
convert documents with it over pipes or files. pandoc's own diagnostics are surfaced verbatim.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Cache root holding the flattened binaries.
    #[arg(long, global = true, env = "PANDOC_BRIDGE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PANDOC_BRIDGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PANDOC_BRIDGE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download pandoc for this platform into the cache.
    Install(InstallArgs),
    /// Convert a document.
    Convert(ConvertArgs),
    /// Print the version of the configured pandoc binary.
    Version,
    /// List the format tokens pandoc-bridge knows about.
    Formats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct InstallArgs {
    /// Release to install, e.g. 3.1.11, or `latest`.
    #[arg(long, env = "PANDOC_BRIDGE_VERSION", default_value = pandoc_auto::PANDOC_VERSION)]
    version: String,

    /// Remove the versioned download directory after flattening.
    #[arg(long, env = "PANDOC_BRIDGE_CLEANUP")]
    cleanup: bool,

    /// GitHub API base URL.
    #[arg(long, env = "PANDOC_BRIDGE_API_BASE", default_value = pandoc_auto::DEFAULT_API_BASE, hide = true)]
    api_base: String,

    /// HTTP timeout in seconds.
    #[arg(long, env = "PANDOC_BRIDGE_DOWNLOAD_TIMEOUT", default_value_t = 300)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "PANDOC_BRIDGE_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input format (`-f`). Optional when both -i and -o are given.
    #[arg(short, long)]
    from: Option<String>,

    /// Output format (`-t`).
    #[arg(short, long)]
    to: String,

    /// Read from this file instead of stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Let pandoc write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra arguments passed to pandoc verbatim (after `--`).
    #[arg(last = true)]
    extra: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let root = cli.cache_dir.clone().unwrap_or_else(pandoc_auto::default_root);

    match cli.command {
        Command::Install(ref args) => install(&cli, args, root).await,
        Command::Convert(ref args) => convert(args, client(&cli, &root)?).await,
        Command::Version => {
            let pandoc = client(&cli, &root)?;
            let version = pandoc
                .version()
                .await
                .with_context(|| format!("Failed to query {}", pandoc.config().pandoc_bin.display()))?;
            println!("{version}");
            if !cli.quiet {
                eprintln!("{}", dim(&pandoc.config().pandoc_bin.display().to_string()));
            }
            Ok(())
        }
        Command::Formats { json } => formats(json),
    }
}

/// Build the client: `--cache-dir` wins over the library default, and
/// `PANDOC_BIN` still wins over both for the main binary.
fn client(cli: &Cli, root: &std::path::Path) -> Result<Pandoc> {
    let mut builder = PandocConfig::builder();
    if cli.cache_dir.is_some() {
        builder = builder.root(root);
        if let Ok(bin) = std::env::var(pandoc_bridge::config::PANDOC_BIN_ENV) {
            if !bin.is_empty() {
                builder = builder.pandoc_bin(bin);
            }
        }
    }
    let config = builder.build().context("Invalid configuration")?;
    Ok(Pandoc::new(config))
}

// ── install ──────────────────────────────────────────────────────────────────

async fn install(cli: &Cli, args: &InstallArgs, root: PathBuf) -> Result<()> {
    let mut options = FetchOptions::default()
        .with_root(&root)
        .with_api_base(&args.api_base)
        .with_cleanup(args.cleanup)
        .with_timeout(Duration::from_secs(args.download_timeout));
    options = if args.version.eq_ignore_ascii_case("latest") {
        options.latest()
    } else {
        options.with_version(&args.version)
    };

    let result = if cli.quiet || args.no_progress {
        tokio::task::block_in_place(|| pandoc_auto::ensure_binaries(&options, None))
    } else {
        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        dl_bar.set_prefix("pandoc");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        // block_in_place keeps the borrowed callback valid without a 'static
        // bound while the blocking download runs.
        let result = tokio::task::block_in_place(|| {
            pandoc_auto::ensure_binaries(
                &options,
                Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }),
            )
        });
        dl_bar.finish_and_clear();
        result
    };
    let outcome =
        result.with_context(|| format!("Failed to install pandoc into {}", root.display()))?;

    match outcome {
        FetchOutcome::AlreadyInstalled { version } => {
            if !cli.quiet {
                eprintln!(
                    "{} pandoc {} already installed  {}",
                    green("✔"),
                    bold(&version),
                    dim(&root.display().to_string())
                );
            }
        }
        FetchOutcome::Installed { tag, binaries } => {
            if !cli.quiet {
                eprintln!("{} installed pandoc {}", green("✔"), bold(&tag));
                for b in &binaries {
                    eprintln!("  {}", dim(&b.display().to_string()));
                }
            }
        }
        FetchOutcome::NoMatchingAsset { tag } => {
            anyhow::bail!(
                "release {} has no archive for platform '{}'",
                tag,
                pandoc_auto::current_platform_key()
            );
        }
    }
    Ok(())
}

// ── convert ──────────────────────────────────────────────────────────────────

async fn convert(args: &ConvertArgs, pandoc: Pandoc) -> Result<()> {
    let extra: Vec<&str> = args.extra.iter().map(String::as_str).collect();

    if let (Some(input), Some(output)) = (&args.input, &args.output) {
        let mut extra_with_from = Vec::with_capacity(extra.len() + 2);
        if let Some(ref from) = args.from {
            extra_with_from.extend(["-f", from.as_str()]);
        }
        extra_with_from.extend_from_slice(&extra);

        let stdout = pandoc
            .convert_from_file(input, &args.to, output, &extra_with_from)
            .await
            .with_context(|| format!("Failed to convert {}", input.display()))?;
        return emit(&stdout);
    }

    let from = args
        .from
        .as_deref()
        .context("--from is required unless both --input and --output are given")?;
    warn_unknown_tokens(from, &args.to);

    let src = match args.input {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let stdout = match args.output {
        Some(ref output) => pandoc
            .convert_to_file(&src, from, &args.to, output, &extra)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?,
        None => pandoc
            .convert(&src, from, &args.to, &extra)
            .await
            .context("Conversion failed")?,
    };
    emit(&stdout)
}

fn emit(stdout: &str) -> Result<()> {
    let out = io::stdout();
    let mut handle = out.lock();
    handle
        .write_all(stdout.as_bytes())
        .context("Failed to write to stdout")?;
    handle.flush().context("Failed to write to stdout")
}

/// Tokens outside the known lists are still passed through; pandoc decides.
fn warn_unknown_tokens(from: &str, to: &str) {
    let base = |t: &str| t.split(['+', '-']).next().unwrap_or(t).to_string();
    if base(from).parse::<InputFormat>().is_err() {
        tracing::warn!("'{}' is not a known input format; passing it through", from);
    }
    if base(to).parse::<OutputFormat>().is_err() {
        tracing::warn!("'{}' is not a known output format; passing it through", to);
    }
}

// ── formats ──────────────────────────────────────────────────────────────────

fn formats(json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "input": InputFormat::ALL,
            "output": OutputFormat::ALL,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialize formats")?
        );
        return Ok(());
    }

    println!("{}", bold("Input formats (-f):"));
    for f in InputFormat::ALL {
        println!("  {f}");
    }
    println!("{}", bold("Output formats (-t):"));
    for f in OutputFormat::ALL {
        if f.is_binary() {
            println!("  {f}  {}", dim("(needs -o)"));
        } else {
            println!("  {f}");
        }
    }
    Ok(())
}
