// src/eonet/categories.rs
use std::sync::Arc;

use metrics::counter;
use tokio::sync::OnceCell;

use crate::eonet::transport::{ContentKind, Eonet, Query};
use crate::eonet::types::Category;

/// Fetches the category list once and hands the same result to every caller.
///
/// Callers arriving while the fetch is in flight wait for it instead of starting a
/// second one. A failed fetch resolves to an empty list, which is cached like any
/// other result.
pub struct CategorySource {
    client: Eonet,
    endpoint: String,
    cell: OnceCell<Arc<Vec<Category>>>,
}

impl CategorySource {
    pub fn new(client: Eonet, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            cell: OnceCell::new(),
        }
    }

    /// Categories sorted ascending by display name.
    pub async fn categories(&self) -> Arc<Vec<Category>> {
        self.cell
            .get_or_init(|| async { Arc::new(self.fetch_sorted().await) })
            .await
            .clone()
    }

    /// True once the fetch has resolved (successfully or not).
    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }

    async fn fetch_sorted(&self) -> Vec<Category> {
        match self
            .client
            .request::<Vec<Category>>(&self.endpoint, &Query::new(), ContentKind::Categories)
            .await
        {
            Ok(mut categories) => {
                categories.sort_by(|a, b| a.name.cmp(&b.name));
                tracing::info!(target: "eonet", count = categories.len(), "categories fetched");
                categories
            }
            Err(e) => {
                tracing::warn!(
                    target: "eonet",
                    kind = e.kind(),
                    transport = e.is_transport(),
                    error = %e,
                    "category fetch failed, continuing with none"
                );
                counter!("eonet_fail_soft_total", "stage" => "categories").increment(1);
                Vec::new()
            }
        }
    }
}
