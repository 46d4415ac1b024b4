//! Run subcommand implementation.
//!
//! Handles `landrec run`: one browser session against the records portal,
//! from login to the final results table.

use crate::cli::OutputFormat;
use crate::config::{AppSettings, ProfileManager, SearchProfile, DEFAULT_PROFILE};
use crate::download::DownloadWatcher;
use crate::error::{CliError, CliResult};
use crate::extract::{AddressExtractor, OpenAiClient, TesseractCli};
use crate::harvest::Harvester;
use crate::output;
use crate::portal::{Credentials, PortalConfig, PortalSession};
use crate::results::DEFAULT_CSV_NAME;
use crate::storage::{SessionRecord, SessionStore};
use crate::types::SearchWindow;
use crate::webdriver::{BrowserOptions, Wait, WebDriverClient};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Search the portal and extract an address from every result.
#[derive(Parser, Debug)]
pub struct RunCommand {
    /// Saved search profile to use
    #[arg(short = 'P', long, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Override the profile's look-back window in days
    #[arg(long, value_name = "DAYS")]
    pub lookback_days: Option<u32>,

    /// Override the party name query
    #[arg(long, value_name = "QUERY")]
    pub name: Option<String>,

    /// Override the court locality
    #[arg(long)]
    pub locality: Option<String>,

    /// Directory the browser downloads into
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// URL of the WebDriver server
    #[arg(long, value_name = "URL")]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Extra browser command-line switch (repeatable)
    #[arg(long = "chrome-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub chrome_args: Vec<String>,

    /// Portal account email
    #[arg(long, env = "LANDREC_EMAIL", hide_env_values = true)]
    pub email: Option<String>,

    /// Portal account password
    #[arg(long, env = "LANDREC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Also write the deduplicated results as CSV
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CSV_NAME
    )]
    pub csv: Option<PathBuf>,

    /// Don't save the session to history
    #[arg(long)]
    pub no_save: bool,
}

impl RunCommand {
    /// Execute the run command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let profile = self.resolve_profile()?;
        let window = SearchWindow::lookback_from_today(profile.lookback_days);
        let credentials = self.credentials()?;

        // Fail on a missing key before a browser is started.
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let llm = OpenAiClient::new(api_key, &settings.openai_model)?
            .with_base_url(&settings.openai_base_url);
        let ocr = TesseractCli::new(&settings.ocr_language, settings.ocr_dpi);

        let download_dir = match &self.download_dir {
            Some(dir) => dir.clone(),
            None => settings.resolved_download_dir()?,
        };
        fs::create_dir_all(&download_dir)?;
        let download_dir = fs::canonicalize(&download_dir)?;

        let interactive = !quiet && self.output == OutputFormat::Plain;
        if interactive {
            output::print_session_header(&profile, window);
        }

        let webdriver_url = self
            .webdriver_url
            .as_deref()
            .unwrap_or(&settings.webdriver_url);
        let options = BrowserOptions::new(&download_dir)
            .headless(settings.headless && !self.headful)
            .with_args(self.chrome_args.iter().cloned());
        tracing::info!(server = webdriver_url, dir = %download_dir.display(), "starting browser");
        let driver = WebDriverClient::connect(webdriver_url, &options).await?;

        let portal_config = PortalConfig::new(&settings.portal_base_url, credentials)
            .with_wait(Wait::new(Duration::from_secs(settings.element_timeout_secs)));
        let portal = PortalSession::new(driver, portal_config);
        let watcher = DownloadWatcher::new(&download_dir)
            .with_timeout(Duration::from_secs(settings.download_timeout_secs));

        let mut harvester = Harvester::new(portal, watcher, AddressExtractor::new(ocr, llm));
        if interactive {
            harvester = harvester.with_progress();
        }

        let ctrl_c = tokio::spawn(handle_interrupts(
            tokio::signal::ctrl_c,
            harvester.stop_handle(),
            || std::process::exit(130),
        ));

        let record = SessionRecord::new(&profile, window);
        let outcome = harvester
            .run(&profile, window, |row| {
                if interactive {
                    output::print_row(row);
                }
            })
            .await;
        ctrl_c.abort();

        let record = record.finalize(outcome?);

        if settings.auto_save_sessions && !self.no_save {
            SessionStore::new()?.save(&record)?;
            if interactive {
                output::print_info(&format!("Session saved as {}", record.id.short()));
            }
        }

        if let Some(path) = &self.csv {
            fs::write(path, record.results.to_csv()?)?;
            if !quiet {
                output::print_success(&format!("Results written to {}", path.display()));
            }
        }

        if record.stopped_early && !quiet {
            output::print_warning(&format!(
                "Session stopped early after {} of {} rows",
                record.rows_processed + record.rows_failed,
                record.rows_seen
            ));
        }

        output::print_results(&record, self.output)?;

        Ok(())
    }

    /// The named profile with command-line overrides applied.
    fn resolve_profile(&self) -> CliResult<SearchProfile> {
        let manager = ProfileManager::new()?;
        let mut profile = manager.require(&self.profile)?.clone();

        if let Some(days) = self.lookback_days {
            profile.lookback_days = days;
        }
        if let Some(name) = &self.name {
            profile.name_query = name.clone();
        }
        if let Some(locality) = &self.locality {
            profile.locality = locality.clone();
        }

        profile.validate()?;
        Ok(profile)
    }

    fn credentials(&self) -> CliResult<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok(Credentials::new(email, password))
            }
            _ => Err(CliError::Other(
                "portal credentials required: pass --email/--password or set \
                 LANDREC_EMAIL and LANDREC_PASSWORD"
                    .to_string(),
            )),
        }
    }
}

/// The first interrupt sets `stop` so the current row can finish; a second
/// one calls `abort`.
async fn handle_interrupts<S, F, A>(mut interrupt: S, stop: Arc<AtomicBool>, abort: A)
where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
    A: FnOnce(),
{
    if interrupt().await.is_err() {
        return;
    }
    tracing::warn!("interrupt received, finishing current row (interrupt again to abort)");
    stop.store(true, Ordering::SeqCst);

    if interrupt().await.is_ok() {
        tracing::error!("second interrupt received, aborting");
        abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use std::pin::Pin;
    use std::sync::atomic::AtomicUsize;

    fn parse(args: &[&str]) -> RunCommand {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Run(cmd) => cmd,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let cmd = parse(&["landrec", "run", "--email", "a@b.c", "--password", "pw"]);
        assert_eq!(cmd.profile, DEFAULT_PROFILE);
        assert_eq!(cmd.output, OutputFormat::Plain);
        assert!(cmd.csv.is_none());
        assert!(!cmd.headful);
        assert!(cmd.credentials().is_ok());
    }

    #[test]
    fn test_csv_flag_without_path_uses_default_name() {
        let cmd = parse(&["landrec", "run", "--csv"]);
        assert_eq!(cmd.csv, Some(PathBuf::from(DEFAULT_CSV_NAME)));

        let cmd = parse(&["landrec", "run", "--csv", "out.csv", "-o", "json"]);
        assert_eq!(cmd.csv, Some(PathBuf::from("out.csv")));
        assert_eq!(cmd.output, OutputFormat::Json);
    }

    #[test]
    fn test_chrome_args_accept_switches() {
        let cmd = parse(&[
            "landrec",
            "run",
            "--chrome-arg",
            "--window-size=1280,800",
            "--chrome-arg=--lang=en-US",
        ]);
        assert_eq!(cmd.chrome_args, vec!["--window-size=1280,800", "--lang=en-US"]);
    }

    type Interrupt = Pin<Box<dyn Future<Output = io::Result<()>> + Send>>;

    /// An interrupt source that fires `times` times and then never again.
    fn interrupts(times: usize) -> impl FnMut() -> Interrupt {
        let fired = Arc::new(AtomicUsize::new(0));
        move || {
            let n = fired.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n >= times {
                    std::future::pending::<()>().await;
                }
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_first_interrupt_only_stops() {
        let stop = Arc::new(AtomicBool::new(false));
        let aborted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&aborted);

        let watcher = handle_interrupts(interrupts(1), Arc::clone(&stop), move || {
            flag.store(true, Ordering::SeqCst)
        });
        let finished = tokio::time::timeout(Duration::from_millis(50), watcher).await;

        assert!(finished.is_err());
        assert!(stop.load(Ordering::SeqCst));
        assert!(!aborted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_second_interrupt_aborts() {
        let stop = Arc::new(AtomicBool::new(false));
        let aborted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&aborted);

        handle_interrupts(interrupts(2), Arc::clone(&stop), move || {
            flag.store(true, Ordering::SeqCst)
        })
        .await;

        assert!(stop.load(Ordering::SeqCst));
        assert!(aborted.load(Ordering::SeqCst));
    }

    #[test]
    fn test_missing_password_is_rejected() {
        let mut cmd = parse(&["landrec", "run", "--email", "a@b.c", "--password", "pw"]);
        cmd.password = None;
        assert!(matches!(cmd.credentials(), Err(CliError::Other(_))));
    }
}
