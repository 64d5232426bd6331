//! EONET aggregator: binary entrypoint.
//! Runs one pipeline against the configured API and logs snapshots and progress as they
//! arrive.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use eonet_aggregator::eonet::HttpTransport;
use eonet_aggregator::telemetry::Telemetry;
use eonet_aggregator::{EonetConfig, Pipeline, PipelineRun, Snapshot};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("eonet=info,pipeline=info,display=info,warn"));

    let json = std::env::var("EONET_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn render_snapshot(snapshot: &Snapshot) {
    for category in snapshot {
        info!(target: "display", "{} {}", category.name, category.events.len());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = EonetConfig::load_default().context("loading eonet config")?;
    info!(
        base_url = %cfg.base_url,
        lookback_days = cfg.lookback_days,
        max_concurrent = cfg.max_concurrent,
        "eonet config loaded"
    );

    let telemetry = if std::env::var("EONET_METRICS").ok().as_deref() == Some("1") {
        Some(Telemetry::install()?)
    } else {
        None
    };

    let transport = Arc::new(HttpTransport::new(&cfg).context("building http client")?);
    let pipeline = Pipeline::from_config(&cfg, transport);
    let PipelineRun {
        mut snapshots,
        mut progress,
        handle,
    } = pipeline.run();

    let hide_delay = Duration::from_millis(cfg.progress_hide_delay_ms);

    let display = async {
        let mut last: Option<Snapshot> = None;
        let mut first = true;
        while let Some(snapshot) = snapshots.recv().await {
            if first {
                info!(target: "display", categories = snapshot.len(), "category list received");
                first = false;
            }
            render_snapshot(&snapshot);
            last = Some(snapshot);
        }
        last
    };

    let indicator = async {
        while let Some(p) = progress.recv().await {
            info!(target: "display", progress = %format!("{:.0}%", p * 100.0), "progress");
            if p >= 1.0 {
                tokio::time::sleep(hide_delay).await;
                info!(target: "display", "progress indicator hidden");
            }
        }
    };

    let (last, ()) = tokio::join!(display, indicator);
    handle.await.context("pipeline task")?;

    if let Some(snapshot) = last {
        let with_events = snapshot.iter().filter(|c| !c.events.is_empty()).count();
        let events: usize = snapshot.iter().map(|c| c.events.len()).sum();
        info!(
            categories = snapshot.len(),
            with_events, events, "final snapshot"
        );
    }

    if let Some(t) = telemetry {
        println!("{}", t.render());
    }

    Ok(())
}
