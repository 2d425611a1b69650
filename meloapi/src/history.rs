//! History accessor
//!
//! The history list is public: no session is required and no token is sent.

use crate::api::MeloApi;
use crate::fetched::Fetched;
use crate::models::wire::HistoryListWire;
use crate::models::HistoryEntry;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HistoryAccessor {
    api: Arc<MeloApi>,
}

impl HistoryAccessor {
    pub fn new(api: Arc<MeloApi>) -> Self {
        Self { api }
    }

    /// Fetch the history list in backend order
    pub async fn list(&self) -> Fetched<Vec<HistoryEntry>> {
        let result = self
            .api
            .get::<HistoryListWire>("/history/list", &[], None)
            .await
            .map(|list| {
                list.history_list
                    .into_iter()
                    .map(HistoryEntry::from)
                    .collect::<Vec<_>>()
            });
        if let Ok(list) = &result {
            debug!("Fetched {} history entries", list.len());
        }
        Fetched::recover("list history", result, None)
    }
}
