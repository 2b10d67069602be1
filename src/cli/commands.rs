//! CLI parser and the download command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::{style, Term};

use pirsa_dl::config::{load_settings, Settings};
use pirsa_dl::error::DownloadError;
use pirsa_dl::identifier::Identifier;
use pirsa_dl::services::download::{NoProgress, ProgressObserver};
use pirsa_dl::services::Orchestrator;
use pirsa_dl::utils::format_size;

use super::progress::{progress_println, DownloadProgress};

/// Exit status for failures that are not download errors (bad config, setup).
const SETUP_FAILURE_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "pirsa-dl")]
#[command(about = "Download videos and whole collections from the PIRSA seminar archive")]
#[command(version)]
pub struct Cli {
    /// Video ID (8 digits, e.g. 20200101) or collection ID (C + 5 digits, e.g. C00042)
    id: Identifier,

    /// Directory that receives files and collection directories
    #[arg(short, long, env = "PIRSA_DL_OUTPUT_DIR", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Concurrent downloads within a collection
    #[arg(short, long, env = "PIRSA_DL_JOBS", value_name = "N")]
    jobs: Option<usize>,

    /// Skip videos that fail instead of aborting the collection
    #[arg(short, long)]
    keep_going: bool,

    /// Retries for network failures
    #[arg(short, long, env = "PIRSA_DL_RETRIES", value_name = "N")]
    retries: Option<u32>,

    /// Read timeout in seconds
    #[arg(long, env = "PIRSA_DL_TIMEOUT", value_name = "SECS")]
    timeout: Option<u64>,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, env = "PIRSA_DL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flags win over everything loaded from config files.
    fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref dir) = self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(jobs) = self.jobs {
            settings.jobs = jobs.max(1);
        }
        if self.keep_going {
            settings.keep_going = true;
        }
        if let Some(retries) = self.retries {
            settings.retries = retries;
        }
        if let Some(secs) = self.timeout {
            settings.read_timeout = Duration::from_secs(secs);
        }
    }
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    verbose_requested(std::env::args().skip(1))
}

/// `--verbose`, `-v`, or `v` inside a cluster of boolean short flags (`-kv`).
fn verbose_requested(args: impl IntoIterator<Item = String>) -> bool {
    args.into_iter().any(|arg| {
        if arg == "--verbose" {
            return true;
        }
        match arg.strip_prefix('-') {
            Some(flags) if !flags.starts_with('-') && !flags.is_empty() => {
                flags.contains('v') && flags.chars().all(|c| c == 'v' || c == 'k')
            }
            _ => false,
        }
    })
}

/// Process exit status for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<DownloadError>()
        .map(DownloadError::exit_code)
        .unwrap_or(SETUP_FAILURE_EXIT)
}

/// Parse arguments and run the download.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())
        .await
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;
    cli.apply_to_settings(&mut settings);

    let orchestrator =
        Orchestrator::from_settings(&settings).context("Failed to set up downloader")?;

    let show_progress = !cli.no_progress && Term::stderr().is_term();
    let progress = show_progress.then(|| DownloadProgress::new(settings.jobs));
    let observer: &dyn ProgressObserver = match progress {
        Some(ref progress) => progress,
        None => &NoProgress,
    };

    tracing::info!(
        "Downloading {} into {}",
        cli.id,
        settings.output_dir.display()
    );

    let outcome = tokio::select! {
        result = orchestrator.run(&cli.id, observer) => result,
        Ok(()) = tokio::signal::ctrl_c() => Err(DownloadError::Cancelled),
    };

    if let Some(ref progress) = progress {
        progress.finish();
    }

    match outcome {
        Ok(report) => {
            progress_println(&format!(
                "{} Downloaded {} video{} ({}) to {}",
                style("✓").green(),
                style(report.summary.downloaded).cyan(),
                if report.summary.downloaded == 1 { "" } else { "s" },
                format_size(report.summary.bytes),
                style(report.directory.display()).bold()
            ));
            Ok(())
        }
        Err(DownloadError::Cancelled) => {
            eprintln!(
                "{} Interrupted; unfinished downloads may have left .part files behind",
                style("!").yellow()
            );
            Err(DownloadError::Cancelled.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_invalid_identifier_is_a_usage_error() {
        let err = Cli::try_parse_from(["pirsa-dl", "C1234"])
            .err()
            .expect("malformed ID must be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "pirsa-dl", "C00042", "-o", "/tmp/talks", "-j", "0", "-k", "-r", "3", "--timeout",
            "5",
        ])
        .unwrap();
        assert!(matches!(cli.id, Identifier::Collection(_)));

        let mut settings = Settings::default();
        cli.apply_to_settings(&mut settings);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/talks"));
        assert_eq!(settings.jobs, 1);
        assert!(settings.keep_going);
        assert_eq!(settings.retries, 3);
        assert_eq!(settings.read_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_verbose_detection() {
        let args = |list: &[&str]| list.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        assert!(verbose_requested(args(&["C00042", "-v"])));
        assert!(verbose_requested(args(&["--verbose", "C00042"])));
        assert!(verbose_requested(args(&["-kv", "C00042"])));
        assert!(verbose_requested(args(&["-vk", "C00042"])));
        assert!(!verbose_requested(args(&["-k", "C00042"])));
        // Values glued to short options are not flag clusters
        assert!(!verbose_requested(args(&["-o", "-videos", "C00042"])));
        assert!(!verbose_requested(args(&["-ovideos", "C00042"])));
    }

    #[test]
    fn test_exit_code_sees_through_context() {
        let err = anyhow::Error::from(DownloadError::parse("u", "m")).context("while running");
        assert_eq!(exit_code(&err), 4);
        assert_eq!(exit_code(&anyhow::anyhow!("bad config")), 2);
    }
}
