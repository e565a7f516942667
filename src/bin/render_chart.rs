use anyhow::{Context, Result};
use clap::Parser;
use forage_viewer::{
    cache::{DatasetCache, SystemClock},
    config::{Config, CredentialSource},
    projection::{project, ViewMode},
    render::{render, SvgChart},
    source::{GoogleSheetsClient, SheetsAuth},
};
use std::{collections::BTreeSet, env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Fetch the sheet once and write a chart to an SVG file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mouse to include; repeat for several. Defaults to every mouse.
    #[arg(long = "mouse")]
    mice: Vec<String>,

    /// `series` or `average`
    #[arg(long, default_value = "series")]
    mode: ViewMode,

    #[arg(long, default_value = "foraging.svg")]
    out: PathBuf,

    /// Print the mice in the sheet and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;
    let credential = CredentialSource::resolve(&cfg, |k| env::var(k).ok())?;
    let source = GoogleSheetsClient::from_config(&cfg, SheetsAuth::from_credential(credential)?)?;

    let cache = DatasetCache::new(source, SystemClock, cfg.columns.clone(), cfg.ttl());
    let read = cache.get_or_fetch(false).await?;
    let dataset = &read.entry.dataset;

    if args.list {
        for mouse in dataset.entities() {
            println!("{}", mouse);
        }
        return Ok(());
    }

    let selected: BTreeSet<String> = if args.mice.is_empty() {
        dataset.entities().iter().cloned().collect()
    } else {
        args.mice.iter().map(|m| m.trim().to_string()).collect()
    };
    let projection = project(dataset, &read.entry.palette, &selected, args.mode);
    let svg = render(&projection, &mut SvgChart::new(dataset.periods()))?;
    std::fs::write(&args.out, svg)
        .with_context(|| format!("writing chart to {}", args.out.display()))?;
    info!(
        out = %args.out.display(),
        mice = selected.len(),
        mode = %args.mode,
        "chart written"
    );
    Ok(())
}
