//! History page controller
//!
//! A load fetches the public history list, sorts it, numbers the rows and
//! publishes them. It then enriches every row whose result names a user with
//! that user's display name and preferred track, one lookup per row, applying
//! each answer as it arrives.
//!
//! Each load is a generation with its own cancellation token. Starting a load
//! cancels the previous one: its list, if it has not been published yet, is
//! dropped, and its pending enrichments are abandoned. A late answer from a
//! superseded generation is never applied.

use crate::config_ext::{HistoryOrder, ViewConfigExt};
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use meloapi::{Fetched, HistoryEntry, MeloClient, UserKey, UserSettings};
use meloconfig::Config;
use melosession::{Subscription, ValueCell};
use std::cmp::Reverse;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One rendered history row
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    /// 1-based position after sorting
    pub index: usize,
    pub entry: HistoryEntry,
    /// Display name of the user the result belongs to, once resolved
    pub username: Option<String>,
    /// That user's preferred track, once resolved
    pub preferred_music_id: Option<String>,
}

impl HistoryRow {
    fn new(index: usize, entry: HistoryEntry) -> Self {
        Self {
            index,
            entry,
            username: None,
            preferred_music_id: None,
        }
    }

    fn apply(&mut self, settings: UserSettings) {
        self.username = Some(settings.username).filter(|s| !s.is_empty());
        self.preferred_music_id = Some(settings.preferred_music_id).filter(|s| !s.is_empty());
    }
}

/// What the history page shows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryState {
    /// Load that produced (or is producing) this state
    pub generation: u64,
    pub is_loading: bool,
    pub rows: Vec<HistoryRow>,
    /// False when the rows come from a failed fetch
    pub is_fresh: bool,
}

#[derive(Debug, Default)]
struct LoadHandle {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Debug, Clone)]
pub struct HistoryView {
    client: MeloClient,
    order: HistoryOrder,
    state: ValueCell<HistoryState>,
    current: Arc<Mutex<LoadHandle>>,
}

impl HistoryView {
    pub fn new(client: MeloClient, order: HistoryOrder) -> Self {
        Self {
            client,
            order,
            state: ValueCell::new(HistoryState::default()),
            current: Arc::new(Mutex::new(LoadHandle::default())),
        }
    }

    pub fn from_config(client: MeloClient, config: &Config) -> Self {
        Self::new(client, config.get_history_order())
    }

    pub fn order(&self) -> HistoryOrder {
        self.order
    }

    pub fn state(&self) -> HistoryState {
        self.state.get()
    }

    pub fn observe(&self) -> Subscription<HistoryState> {
        self.state.subscribe()
    }

    /// Load the list and enrich it; returns the state once this load settles
    ///
    /// If a newer load starts meanwhile, this one stops early and returns
    /// whatever the newer load has published so far.
    pub async fn load(&self) -> HistoryState {
        let (generation, token) = self.begin();

        let fetched = self.client.history().list().await;
        if token.is_cancelled() {
            debug!(generation, "History load superseded before the list arrived");
            return self.state.get();
        }

        let is_fresh = fetched.is_fresh();
        let mut entries = fetched.into_value_or_default();
        sort_entries(&mut entries, self.order);
        let rows: Vec<HistoryRow> = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| HistoryRow::new(i + 1, entry))
            .collect();

        let lookups: Vec<(usize, String)> = rows
            .iter()
            .filter_map(|row| row.entry.subject_id().map(|id| (row.index, id.to_string())))
            .collect();

        let published = self.publish(generation, |state| {
            state.rows = rows;
            state.is_fresh = is_fresh;
            state.is_loading = false;
        });
        if !published {
            return self.state.get();
        }
        info!(generation, rows = self.state.get().rows.len(), "History list loaded");

        self.enrich(generation, &token, lookups).await;
        self.state.get()
    }

    /// Start a new generation, cancelling the previous one
    fn begin(&self) -> (u64, CancellationToken) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel.cancel();
        current.generation += 1;
        current.cancel = CancellationToken::new();
        let generation = current.generation;
        self.state.update(|state| {
            state.generation = generation;
            state.is_loading = true;
        });
        debug!(generation, "History load started");
        (generation, current.cancel.clone())
    }

    /// Apply `f` if `generation` is still the current one
    fn publish(&self, generation: u64, f: impl FnOnce(&mut HistoryState)) -> bool {
        let mut applied = false;
        self.state.update(|state| {
            if state.generation == generation {
                f(state);
                applied = true;
            }
        });
        if !applied {
            debug!(generation, "Discarding result of a superseded history load");
        }
        applied
    }

    async fn enrich(&self, generation: u64, token: &CancellationToken, lookups: Vec<(usize, String)>) {
        if lookups.is_empty() {
            return;
        }
        debug!(generation, count = lookups.len(), "Enriching history rows");

        let mut pending: FuturesUnordered<_> = lookups
            .into_iter()
            .map(|(index, subject)| {
                let users = self.client.users().clone();
                async move {
                    let fetched = users.settings_for(&UserKey::Id(subject)).await;
                    (index, fetched)
                }
            })
            .collect();

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "History load superseded, dropping enrichment");
                    break;
                }
                next = pending.next() => match next {
                    Some((index, Fetched::Fresh(settings))) => {
                        self.publish(generation, |state| {
                            if let Some(row) = state.rows.iter_mut().find(|r| r.index == index) {
                                row.apply(settings);
                            }
                        });
                    }
                    // already logged by the accessor; the row stays as is
                    Some((_, Fetched::Fallback { .. })) => {}
                    None => break,
                }
            }
        }
    }
}

/// Parse a backend timestamp
///
/// Accepts RFC 3339, RFC 2822 and naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Sort entries for display
///
/// `LastModified`: newest first, unparseable timestamps last, ties by storage
/// key descending. `StorageKey`: storage key descending.
pub fn sort_entries(entries: &mut [HistoryEntry], order: HistoryOrder) {
    match order {
        HistoryOrder::LastModified => entries.sort_by_cached_key(|e| {
            (
                Reverse(parse_timestamp(&e.last_modified)),
                Reverse(e.storage_key.clone()),
            )
        }),
        HistoryOrder::StorageKey => {
            entries.sort_by(|a, b| b.storage_key.cmp(&a.storage_key));
        }
    }
}
