//! Media element seam
//!
//! The player drives an audio element through `MediaElement` and is driven
//! back by the element's events (`Player::on_loaded_metadata`,
//! `Player::on_time_update`). Backends implement the trait; `DetachedElement`
//! is a headless implementation that only records the commands it receives.

use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Commands understood by an audio element
pub trait MediaElement: Send {
    /// Replace the source; playback of the previous source stops
    fn set_source(&mut self, url: &str) -> Result<()>;

    /// Start resolving metadata for the current source
    fn load(&mut self) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Move the playback position (seconds)
    fn seek(&mut self, position_seconds: f64) -> Result<()>;

    /// Set the output volume in `[0, 1]`
    fn set_volume(&mut self, volume: f64) -> Result<()>;
}

/// A command received by a `DetachedElement`
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCommand {
    SetSource(String),
    Load,
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
}

/// Headless media element
///
/// Nothing is played; commands are appended to a shared log. Clones share
/// the log, so a caller can keep one handle while the player owns another.
#[derive(Debug, Clone, Default)]
pub struct DetachedElement {
    log: Arc<Mutex<Vec<MediaCommand>>>,
}

impl DetachedElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far, oldest first
    pub fn commands(&self) -> Vec<MediaCommand> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    fn record(&self, command: MediaCommand) -> Result<()> {
        if let Ok(mut log) = self.log.lock() {
            log.push(command);
        }
        Ok(())
    }
}

impl MediaElement for DetachedElement {
    fn set_source(&mut self, url: &str) -> Result<()> {
        self.record(MediaCommand::SetSource(url.to_string()))
    }

    fn load(&mut self) -> Result<()> {
        self.record(MediaCommand::Load)
    }

    fn play(&mut self) -> Result<()> {
        self.record(MediaCommand::Play)
    }

    fn pause(&mut self) -> Result<()> {
        self.record(MediaCommand::Pause)
    }

    fn seek(&mut self, position_seconds: f64) -> Result<()> {
        self.record(MediaCommand::Seek(position_seconds))
    }

    fn set_volume(&mut self, volume: f64) -> Result<()> {
        self.record(MediaCommand::SetVolume(volume))
    }
}
