// src/pipeline/mod.rs
//! Fetch → fan-out → fold → report.
//!
//! A run publishes two streams: snapshots (the bare category list first, then one
//! enriched list per completed category) and progress (one value per completion,
//! ending at 1.0). Both close when the run is over.

pub mod aggregator;
pub mod progress;
pub mod scheduler;

use std::sync::Arc;

use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::EonetConfig;
use crate::eonet::{CategorySource, Eonet, EventFetcher, Transport};

pub use aggregator::{filtered_events, Aggregator, Snapshot};
pub use progress::progress;
pub use scheduler::{schedule_all, CategoryEvents};

pub struct PipelineRun {
    pub snapshots: mpsc::UnboundedReceiver<Snapshot>,
    pub progress: mpsc::UnboundedReceiver<f32>,
    pub handle: JoinHandle<()>,
}

/// Everything a run emitted, in emission order.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub snapshots: Vec<Snapshot>,
    pub progress: Vec<f32>,
}

impl RunOutcome {
    pub fn final_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}

impl PipelineRun {
    /// Drain both streams until the run ends.
    pub async fn collect(self) -> RunOutcome {
        let PipelineRun {
            mut snapshots,
            mut progress,
            handle,
        } = self;

        let mut out = RunOutcome::default();
        while let Some(s) = snapshots.recv().await {
            out.snapshots.push(s);
        }
        while let Some(p) = progress.recv().await {
            out.progress.push(p);
        }
        if let Err(e) = handle.await {
            tracing::warn!(target: "pipeline", error = ?e, "pipeline task ended abnormally");
        }
        out
    }
}

#[derive(Clone)]
pub struct Pipeline {
    source: Arc<CategorySource>,
    fetcher: EventFetcher,
    lookback_days: u32,
    max_concurrent: usize,
}

impl Pipeline {
    pub fn new(
        source: Arc<CategorySource>,
        fetcher: EventFetcher,
        lookback_days: u32,
        max_concurrent: usize,
    ) -> Self {
        Self {
            source,
            fetcher,
            lookback_days,
            max_concurrent,
        }
    }

    pub fn from_config(cfg: &EonetConfig, transport: Arc<dyn Transport>) -> Self {
        let client = Eonet::new(cfg.base_url.clone(), transport);
        let source = Arc::new(CategorySource::new(
            client.clone(),
            cfg.categories_endpoint.clone(),
        ));
        let fetcher = EventFetcher::new(client, cfg.events_endpoint.clone());
        Self::new(source, fetcher, cfg.lookback_days, cfg.max_concurrent)
    }

    pub fn source(&self) -> &Arc<CategorySource> {
        &self.source
    }

    /// Start a run on the current runtime.
    ///
    /// Dropping the snapshot receiver cancels the run: no new category fetches are
    /// admitted after the next completion. Dropping only the progress receiver does not.
    pub fn run(&self) -> PipelineRun {
        crate::telemetry::ensure_metrics_described();

        let (snap_tx, snapshots) = mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let this = self.clone();

        let handle = tokio::spawn(async move {
            let categories = this.source.categories().await;
            let total = categories.len();

            if snap_tx.send(categories.to_vec()).is_err() {
                return;
            }
            if total == 0 {
                gauge!("pipeline_progress").set(1.0);
                let _ = progress_tx.send(progress(0, 0));
                tracing::info!(target: "pipeline", "no categories, run complete");
                return;
            }

            let mut aggregator = Aggregator::new(categories.to_vec());
            let mut completed = schedule_all(
                this.fetcher.clone(),
                categories.to_vec(),
                this.lookback_days,
                this.max_concurrent,
            );

            loop {
                // Returning drops `completed`, which closes admissions in the scheduler.
                let batch = tokio::select! {
                    biased;
                    _ = snap_tx.closed() => {
                        tracing::debug!(target: "pipeline", "snapshot consumer gone, stopping");
                        return;
                    }
                    next = completed.recv() => match next {
                        Some(batch) => batch,
                        None => break,
                    },
                };

                let (completions, snapshot) = aggregator.fold(&batch.events);
                let p = progress(completions, total);

                counter!("pipeline_completions_total").increment(1);
                gauge!("pipeline_progress").set(p as f64);
                tracing::debug!(
                    target: "pipeline",
                    category = %batch.category_id,
                    events = batch.events.len(),
                    completions,
                    total,
                    "category folded"
                );

                let _ = progress_tx.send(p);
                if snap_tx.send(snapshot).is_err() {
                    tracing::debug!(target: "pipeline", completions, "snapshot consumer gone, stopping");
                    return;
                }
            }

            tracing::info!(
                target: "pipeline",
                categories = total,
                events = aggregator.snapshot().iter().map(|c| c.events.len()).sum::<usize>(),
                "run complete"
            );
        });

        PipelineRun {
            snapshots,
            progress: progress_rx,
            handle,
        }
    }
}
