//! `safc` — the SAFC review store binary.
//!
//! Reads `safc.toml` (or the path given with `--config`) plus `SAFC_*`
//! environment variables, opens the SQLite store, and runs one command.
//!
//! # Usage
//!
//! ```
//! safc serve
//! safc crawl --start 1 --end 13098
//! safc crawl --prefetch --workers 8
//! safc import RateMySupervisor.json
//! safc status
//! safc verify cba0415143b305c0      # reads the OTP from stdin
//! ```

mod settings;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use chrono::{Days, Local};
use clap::{Parser, Subcommand};
use safc_api::{
  AppState,
  AuthConfig,
  PostLimiter,
  limit::LIMIT_WINDOW,
  status::RECENT_DAYS,
};
use safc_core::{ContentId, store::ReviewStore};
use safc_dialog::Controller;
use safc_ingest::{CrawlMode, Crawler, HttpFetcher, Ingestor, JsonPageParser, import_file};
use safc_store_sqlite::SqliteStore;
use serde::Serialize;
use settings::Settings;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Units on pi-review.com as of the last full crawl.
const DEFAULT_CRAWL_END: u64 = 13098;

#[derive(Parser)]
#[command(author, version, about = "Student Anti-Fraud Center review store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "safc.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API and the dialog transport over HTTP.
  Serve,

  /// Crawl a range of review-site units into the store.
  Crawl {
    /// First unit (inclusive).
    #[arg(long, default_value_t = 1)]
    start:    u64,
    /// Last unit (exclusive).
    #[arg(long, default_value_t = DEFAULT_CRAWL_END)]
    end:      u64,
    /// Override the configured worker count.
    #[arg(long)]
    workers:  Option<usize>,
    /// Only download pages into the cache.
    #[arg(long)]
    prefetch: bool,
  },

  /// Import a historical JSON dump.
  Import {
    path: PathBuf,
  },

  /// Print store statistics.
  Status,

  /// Check an OTP (read from stdin) against a review's signature.
  Verify {
    review_id: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  if let Some(parent) = settings.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  let store = Arc::new(store);
  let ingestor = Ingestor::new(store.clone(), settings.category_rules.clone());

  match cli.command {
    Command::Serve => serve(&settings, store, ingestor).await,
    Command::Crawl { start, end, workers, prefetch } => {
      let fetcher = HttpFetcher::new(settings.crawl.url_template.clone())
        .context("failed to build HTTP client")?;
      let crawler = Crawler::new(ingestor, fetcher, JsonPageParser, settings.crawl_settings(workers));
      let mode = if prefetch { CrawlMode::Prefetch } else { CrawlMode::Full };
      let report = crawler.run(start..end, mode).await.context("crawl failed")?;
      print_json(&report)
    }
    Command::Import { path } => {
      let report = import_file(&ingestor, &path, &settings.import)
        .await
        .with_context(|| format!("failed to import {}", path.display()))?;
      print_json(&report)
    }
    Command::Status => {
      let today = Local::now().date_naive();
      let since = today.checked_sub_days(Days::new(RECENT_DAYS)).unwrap_or(today);
      let stats = store.stats(since).await.context("failed to read statistics")?;
      print_json(&stats)
    }
    Command::Verify { review_id } => {
      let id = ContentId::parse(&review_id).context("invalid review id")?;
      let otp = otp_from_stdin()?;
      match store.verify_authorship(&id, &otp).await? {
        Some(true) => println!("verified: {id} was published with this OTP"),
        Some(false) => println!("not verified: the OTP does not match {id}"),
        None => anyhow::bail!("no review with id {id}"),
      }
      Ok(())
    }
  }
}

async fn serve(
  settings: &Settings,
  store: Arc<SqliteStore>,
  ingestor: Ingestor<SqliteStore>,
) -> anyhow::Result<()> {
  if settings.transport_token.is_empty() {
    tracing::warn!("transport_token is empty; dialog sessions are disabled");
  }

  let dialog = Arc::new(Controller::new(Arc::new(ingestor)).with_session_ttl(settings.session_ttl()));
  spawn_session_reaper(dialog.clone());

  let state = AppState {
    store,
    dialog,
    auth: Arc::new(AuthConfig { transport_token: settings.transport_token.clone() }),
    limiter: Arc::new(PostLimiter::new(settings.max_posts_per_day, LIMIT_WINDOW)),
  };

  let app = Router::new()
    .nest("/api", safc_api::api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = settings.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// Drop idle dialog sessions even when no request arrives to sweep them.
fn spawn_session_reaper(dialog: Arc<Controller<SqliteStore>>) {
  let period = (dialog.session_ttl() / 4).max(std::time::Duration::from_secs(1));
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(period);
    loop {
      ticker.tick().await;
      dialog.evict_idle().await;
    }
  });
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Read the publisher OTP from stdin so it stays out of shell history.
fn otp_from_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("OTP: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
