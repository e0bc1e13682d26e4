//! Geobooker Ads — banner delivery host for the local-business directory.
//!
//! Wires the campaign source, rotation controller, and attribution recorder
//! together and runs a single banner instance until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use geobooker_attribution::{AttributionRecorder, LoggingTransport};
use geobooker_core::config::AppConfig;
use geobooker_core::types::{Campaign, ViewerContext};
use geobooker_delivery::banner::BannerHost;
use geobooker_delivery::rotation::Stimulus;
use geobooker_delivery::source::{CampaignSource, InMemoryCampaignSource};

#[derive(Parser, Debug)]
#[command(name = "geobooker-ads")]
#[command(about = "Geobooker ad delivery banner host")]
#[command(version)]
struct Cli {
    /// Viewer country code from the session geolocation step
    #[arg(long, env = "GEOBOOKER__VIEWER__COUNTRY")]
    country: Option<String>,

    /// Viewer city from the session geolocation step
    #[arg(long, env = "GEOBOOKER__VIEWER__CITY")]
    city: Option<String>,

    /// Viewport width in pixels, for device classification
    #[arg(long, default_value_t = 1280)]
    viewport_width: u32,

    /// JSON file of campaigns to seed the in-memory source
    #[arg(long)]
    campaigns: Option<PathBuf>,

    /// Rotation interval override in milliseconds
    #[arg(long)]
    rotation_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geobooker_ads=info,geobooker_delivery=info,geobooker_attribution=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(ms) = cli.rotation_ms {
        config.rotation.interval_ms = ms;
    }

    let viewer = ViewerContext {
        country: cli.country,
        city: cli.city,
    };

    info!(
        country = viewer.country_label(),
        city = viewer.city_label(),
        rotation_ms = config.rotation.interval_ms,
        "Geobooker ad host starting"
    );

    let source = Arc::new(InMemoryCampaignSource::new());
    if let Some(path) = cli.campaigns {
        let raw = std::fs::read_to_string(&path)?;
        let campaigns: Vec<Campaign> = serde_json::from_str(&raw)?;
        info!(
            count = campaigns.len(),
            file = %path.display(),
            "campaign source seeded"
        );
        source.seed(campaigns);
    }

    let recorder = AttributionRecorder::new(
        Arc::new(LoggingTransport),
        viewer.clone(),
        &config.recorder,
    );

    let host = BannerHost::new(
        config.rotation.clone(),
        &config.impression,
        &config.refresh,
        source.clone() as Arc<dyn CampaignSource>,
        recorder,
        viewer,
        cli.viewport_width,
    );

    let (stimuli, receiver) = mpsc::channel(32);
    // The demo banner is on screen from the start.
    stimuli.send(Stimulus::VisibilityChanged(true)).await?;

    let banner = tokio::spawn(host.run(receiver));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    drop(stimuli);
    banner.abort();

    Ok(())
}
