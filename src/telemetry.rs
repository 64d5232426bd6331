// src/telemetry.rs
use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Telemetry {
    pub handle: PrometheusHandle,
}

impl Telemetry {
    /// Install the global Prometheus recorder. Only one recorder may be installed per process.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Prometheus exposition text of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// One-time metrics registration (so series carry descriptions in the exposition).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("eonet_requests_total", "EONET requests issued, by content kind.");
        describe_counter!(
            "eonet_request_errors_total",
            "EONET requests that failed, by error kind."
        );
        describe_histogram!("eonet_request_ms", "EONET request latency in milliseconds.");
        describe_counter!(
            "eonet_events_decoded_total",
            "Events decoded from EONET responses."
        );
        describe_counter!(
            "eonet_fail_soft_total",
            "Failures replaced by empty results."
        );
        describe_gauge!(
            "pipeline_inflight",
            "Category event fetches currently in flight."
        );
        describe_counter!(
            "pipeline_completions_total",
            "Category event fetches folded into the snapshot."
        );
        describe_gauge!("pipeline_progress", "Fraction of categories completed.");
    });
}
