//! Extension adding view settings to meloconfig

use anyhow::Result;
use meloconfig::Config;
use meloplayer::DEFAULT_VOLUME;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Sort order of the history page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryOrder {
    /// Most recent first
    #[default]
    LastModified,
    /// Storage key, descending
    StorageKey,
}

impl fmt::Display for HistoryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistoryOrder::LastModified => "last_modified",
            HistoryOrder::StorageKey => "storage_key",
        })
    }
}

impl FromStr for HistoryOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last_modified" | "lastmodified" | "date" => Ok(HistoryOrder::LastModified),
            "storage_key" | "s3_key" | "key" => Ok(HistoryOrder::StorageKey),
            other => Err(format!("unknown history order '{}'", other)),
        }
    }
}

/// Extension trait for view settings in `meloconfig::Config`
pub trait ViewConfigExt {
    /// Initial player volume (`player.default_volume`), clamped to `[0, 1]`
    fn get_default_volume(&self) -> f64;

    fn set_default_volume(&self, volume: f64) -> Result<()>;

    /// History sort order (`history.order`)
    fn get_history_order(&self) -> HistoryOrder;

    fn set_history_order(&self, order: HistoryOrder) -> Result<()>;
}

impl ViewConfigExt for Config {
    fn get_default_volume(&self) -> f64 {
        let volume = self.get_f64(&["player", "default_volume"], DEFAULT_VOLUME);
        if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            DEFAULT_VOLUME
        }
    }

    fn set_default_volume(&self, volume: f64) -> Result<()> {
        self.set_f64(&["player", "default_volume"], volume.clamp(0.0, 1.0))
    }

    fn get_history_order(&self) -> HistoryOrder {
        let raw = self.get_string(&["history", "order"], "last_modified");
        raw.parse().unwrap_or_else(|e| {
            warn!("{}, using last_modified", e);
            HistoryOrder::LastModified
        })
    }

    fn set_history_order(&self, order: HistoryOrder) -> Result<()> {
        self.set_string(&["history", "order"], order.to_string())
    }
}
