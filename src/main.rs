use anyhow::{Context, Result};
use clap::Parser;
use forage_viewer::{
    cache::{DatasetCache, SystemClock},
    config::{Config, CredentialSource},
    server::{self, AppState},
    source::{GoogleSheetsClient, SheetsAuth},
    version,
};
use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Serve the mouse foraging dashboard.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// YAML config file; env vars override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overriding config and FORAGE_LISTEN_ADDR
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(addr) = args.listen {
        cfg.listen_addr = addr;
    }

    let credential = CredentialSource::resolve(&cfg, |k| env::var(k).ok())?;
    let auth = SheetsAuth::from_credential(credential).context("loading Sheets credential")?;
    let source = GoogleSheetsClient::from_config(&cfg, auth)?;
    info!(spreadsheet = %source.spreadsheet_id(), "using spreadsheet");

    let state = Arc::new(AppState {
        cache: DatasetCache::new(source, SystemClock, cfg.columns.clone(), cfg.ttl()),
        build_id: version::build_id(),
    });

    // warm the cache; a failure here is retried on the first page load
    if let Err(e) = state.cache.get_or_fetch(false).await {
        warn!(error = %e, "initial fetch failed");
    }

    info!(addr = %cfg.listen_addr, build = %state.build_id, "dashboard listening");
    warp::serve(server::routes(state)).run(cfg.listen_addr).await;

    Ok(())
}
