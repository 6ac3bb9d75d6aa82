//! W3C Community Activity
//!
//! A command-line view of GitHub and mailing-list activity for W3C groups.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use w3c_activity::analysis::{
    Aggregator, CacheManager, DynamicGroups, FileStore, GroupResolver, HttpSource, MemoryStore,
    SessionStore, StaticGroups,
};
use w3c_activity::app::{draw_ui, App, PageState, TextPresenter};
use w3c_activity::config::{Config, Strategy};
use w3c_activity::utils::clock::{Clock, SystemClock};

/// Output format for the rendered page
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "w3c-activity")]
#[command(version)]
#[command(about = "GitHub and mailing-list activity for W3C community groups", long_about = None)]
struct Cli {
    /// Group resolution strategy (static or dynamic)
    #[arg(long, default_value = "dynamic")]
    strategy: Strategy,

    /// Organization ranked by dynamic resolution
    #[arg(long, env = "W3C_ACTIVITY_ORG", default_value = "w3c")]
    org: String,

    /// GitHub token; raises the API rate limit
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Number of groups kept by dynamic resolution
    #[arg(long, default_value_t = 8)]
    top: usize,

    /// Maximum mailing posts shown
    #[arg(long, default_value_t = 20)]
    mailing_limit: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout: u64,

    /// Skip contributor profile lookups
    #[arg(long)]
    no_locations: bool,

    /// Ignore the cached view model
    #[arg(long)]
    refresh: bool,

    /// Cache session identifier (defaults to the parent process id)
    #[arg(long)]
    session: Option<String>,

    /// Keep the cache in memory only
    #[arg(long)]
    no_cache_file: bool,

    /// Clear the session cache and exit
    #[arg(long)]
    clear_cache: bool,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            org: self.org.clone(),
            strategy: self.strategy,
            github_token: self.token.clone(),
            top_groups: self.top,
            mailing_limit: self.mailing_limit,
            fetch_timeout: Duration::from_secs(self.timeout),
            resolve_locations: !self.no_locations,
            ..Config::default()
        }
    }

    fn session_store(&self) -> Result<Box<dyn SessionStore>> {
        if self.no_cache_file {
            return Ok(Box::new(MemoryStore::new()));
        }
        let session = self
            .session
            .clone()
            .unwrap_or_else(default_session);
        let store = FileStore::for_session(&session).context("failed to locate cache directory")?;
        tracing::debug!(dir = %store.dir().display(), "using session cache");
        Ok(Box::new(store))
    }
}

#[cfg(unix)]
fn default_session() -> String {
    std::os::unix::process::parent_id().to_string()
}

#[cfg(not(unix))]
fn default_session() -> String {
    "default".to_string()
}

/// Initialize tracing subscriber; output goes to stderr so stdout stays clean
fn init_tracing(verbose: bool) {
    let default = if verbose { "w3c_activity=debug" } else { "w3c_activity=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config();
    let cache = CacheManager::new(cli.session_store()?);
    if cli.clear_cache {
        cache.clear().context("failed to clear cache")?;
        tracing::info!("session cache cleared");
        return Ok(());
    }

    let source = Arc::new(HttpSource::new(&config).context("failed to build HTTP client")?);
    let resolver: Box<dyn GroupResolver> = match config.strategy {
        Strategy::Static => Box::new(StaticGroups),
        Strategy::Dynamic => Box::new(DynamicGroups::new(
            source.clone(),
            config.org.clone(),
            config.top_groups,
        )),
    };

    let mut app = App::new(resolver, Aggregator::new(source, config), cache);
    app.refresh = cli.refresh;
    let state = app.load().await;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => {
            let mut presenter = TextPresenter::new(&mut out);
            draw_ui(&mut presenter, &state, SystemClock.now())?;
        }
        OutputFormat::Json => match &state {
            PageState::Ready { view, .. } => serde_json::to_writer_pretty(&mut out, view)?,
            PageState::Failed(errors) => {
                let errors: Vec<_> = errors
                    .iter()
                    .map(|e| serde_json::json!({ "section": e.section.to_string(), "message": e.message }))
                    .collect();
                serde_json::to_writer_pretty(&mut out, &errors)?
            }
        },
    }
    writeln!(out)?;

    if matches!(state, PageState::Failed(_)) {
        std::process::exit(1);
    }
    Ok(())
}
