//! Playback state machine
//!
//! ```text
//! Idle --load(url)--> Loading --metadata--> Playing <--toggle--> Paused
//!                        ^                     |                   |
//!                        +------load(url)------+-------------------+
//! ```
//!
//! Seeking and volume changes never change the phase. Time updates only move
//! `current_time_seconds` and may be replayed freely.

use crate::element::MediaElement;
use crate::error::{PlayerError, Result};
use crate::state::{PlaybackPhase, PlaybackState};
use tracing::{debug, warn};

/// Volume applied when the player is created without an explicit one
pub const DEFAULT_VOLUME: f64 = 0.2;

pub struct Player {
    element: Box<dyn MediaElement>,
    phase: PlaybackPhase,
    state: PlaybackState,
    title: Option<String>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Bind a player to `element` and apply the initial volume
    pub fn new(element: impl MediaElement + 'static, volume: f64) -> Result<Self> {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            DEFAULT_VOLUME
        };
        let mut element: Box<dyn MediaElement> = Box::new(element);
        element.set_volume(volume)?;
        Ok(Self {
            element,
            phase: PlaybackPhase::Idle,
            state: PlaybackState::new(volume),
            title: None,
        })
    }

    pub fn with_default_volume(element: impl MediaElement + 'static) -> Result<Self> {
        Self::new(element, DEFAULT_VOLUME)
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Load a new source and start resolving its metadata
    ///
    /// A missing or empty URL is ignored and leaves the player untouched.
    /// Returns whether a source was loaded.
    pub fn load(&mut self, url: Option<&str>, title: Option<&str>) -> Result<bool> {
        let url = match url.map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => {
                debug!("No media URL, keeping the current source");
                return Ok(false);
            }
        };

        self.element.set_source(url)?;
        self.element.load()?;

        debug!(url, from = %self.phase, "Loading media");
        self.phase = PlaybackPhase::Loading;
        self.title = title.map(str::to_string);
        self.state.media_ref = Some(url.to_string());
        self.state.is_playing = false;
        self.state.duration_seconds = 0.0;
        self.state.current_time_seconds = 0.0;
        Ok(true)
    }

    /// Metadata of the current source is available: rewind and start playing
    ///
    /// Ignored unless a load is pending.
    pub fn on_loaded_metadata(&mut self, duration_seconds: f64) -> Result<()> {
        if self.phase != PlaybackPhase::Loading {
            debug!(phase = %self.phase, "Metadata event without pending load, ignored");
            return Ok(());
        }

        self.element.play()?;

        self.state.duration_seconds = sanitize_seconds(duration_seconds);
        self.state.current_time_seconds = 0.0;
        self.state.is_playing = true;
        self.phase = PlaybackPhase::Playing;
        debug!(duration = self.state.duration_seconds, "Playback started");
        Ok(())
    }

    /// Position reported by the element
    ///
    /// Applying the same position twice is the same as applying it once.
    /// Invalid positions are dropped.
    pub fn on_time_update(&mut self, position_seconds: f64) {
        if !position_seconds.is_finite() || position_seconds < 0.0 {
            warn!(position_seconds, "Dropping invalid time update");
            return;
        }
        if self.phase == PlaybackPhase::Idle {
            return;
        }
        self.state.current_time_seconds = self.clamp_position(position_seconds);
    }

    /// Switch between playing and paused
    ///
    /// Does nothing while idle or loading.
    pub fn toggle_play_pause(&mut self) -> Result<PlaybackPhase> {
        match self.phase {
            PlaybackPhase::Playing => {
                self.element.pause()?;
                self.phase = PlaybackPhase::Paused;
                self.state.is_playing = false;
            }
            PlaybackPhase::Paused => {
                self.element.play()?;
                self.phase = PlaybackPhase::Playing;
                self.state.is_playing = true;
            }
            PlaybackPhase::Idle | PlaybackPhase::Loading => {
                debug!(phase = %self.phase, "Nothing to toggle");
            }
        }
        Ok(self.phase)
    }

    /// Move to `position_seconds`, clamped to the known duration
    pub fn seek(&mut self, position_seconds: f64) -> Result<f64> {
        if self.phase == PlaybackPhase::Idle {
            return Err(PlayerError::InvalidSource("no media loaded".to_string()));
        }
        if !position_seconds.is_finite() {
            return Ok(self.state.current_time_seconds);
        }
        let position = self.clamp_position(position_seconds.max(0.0));
        self.element.seek(position)?;
        self.state.current_time_seconds = position;
        Ok(position)
    }

    /// Set the volume, clamped to `[0, 1]`; NaN is ignored
    pub fn set_volume(&mut self, volume: f64) -> Result<f64> {
        if volume.is_nan() {
            return Ok(self.state.volume);
        }
        let volume = volume.clamp(0.0, 1.0);
        self.element.set_volume(volume)?;
        self.state.volume = volume;
        Ok(volume)
    }

    fn clamp_position(&self, position: f64) -> f64 {
        if self.state.duration_seconds > 0.0 {
            position.min(self.state.duration_seconds)
        } else {
            position
        }
    }
}

fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// Formats a position in seconds as MM:SS, or H:MM:SS past one hour
pub fn format_position(seconds: f64) -> String {
    let total = sanitize_seconds(seconds).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{DetachedElement, MediaCommand};

    /// Element whose `load` always fails
    struct RejectingElement;

    impl MediaElement for RejectingElement {
        fn set_source(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }
        fn load(&mut self) -> Result<()> {
            Err(PlayerError::Element {
                operation: "load".into(),
                message: "unsupported format".into(),
            })
        }
        fn play(&mut self) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self) -> Result<()> {
            Ok(())
        }
        fn seek(&mut self, _position_seconds: f64) -> Result<()> {
            Ok(())
        }
        fn set_volume(&mut self, _volume: f64) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rejected_load_keeps_player_idle() {
        let mut player = Player::with_default_volume(RejectingElement).unwrap();
        let err = player.load(Some("https://bucket/a.flac"), Some("A")).unwrap_err();
        assert!(matches!(err, PlayerError::Element { ref operation, .. } if operation == "load"));
        assert_eq!(player.phase(), PlaybackPhase::Idle);
        assert_eq!(player.state().media_ref, None);
        assert_eq!(player.title(), None);
    }

    fn player() -> (Player, DetachedElement) {
        let element = DetachedElement::new();
        let player = Player::with_default_volume(element.clone()).unwrap();
        element.clear();
        (player, element)
    }

    fn playing(duration: f64) -> (Player, DetachedElement) {
        let (mut player, element) = player();
        player.load(Some("https://bucket/a.mp3"), Some("A")).unwrap();
        player.on_loaded_metadata(duration).unwrap();
        element.clear();
        (player, element)
    }

    #[test]
    fn test_new_applies_default_volume() {
        let element = DetachedElement::new();
        let player = Player::with_default_volume(element.clone()).unwrap();
        assert_eq!(player.state().volume, 0.2);
        assert_eq!(player.phase(), PlaybackPhase::Idle);
        assert_eq!(element.commands(), vec![MediaCommand::SetVolume(0.2)]);
    }

    #[test]
    fn test_load_without_url_is_ignored() {
        let (mut player, element) = player();
        assert!(!player.load(None, None).unwrap());
        assert!(!player.load(Some("  "), None).unwrap());
        assert_eq!(player.phase(), PlaybackPhase::Idle);
        assert!(element.commands().is_empty());
    }

    #[test]
    fn test_load_then_metadata_autoplays_from_start() {
        let (mut player, element) = player();
        assert!(player.load(Some("https://bucket/a.mp3"), Some("A")).unwrap());
        assert_eq!(player.phase(), PlaybackPhase::Loading);
        assert!(!player.state().is_playing);

        player.on_loaded_metadata(180.0).unwrap();
        assert_eq!(player.phase(), PlaybackPhase::Playing);
        assert!(player.state().is_playing);
        assert_eq!(player.state().duration_seconds, 180.0);
        assert_eq!(player.state().current_time_seconds, 0.0);
        assert_eq!(player.title(), Some("A"));
        assert_eq!(
            element.commands(),
            vec![
                MediaCommand::SetSource("https://bucket/a.mp3".into()),
                MediaCommand::Load,
                MediaCommand::Play,
            ]
        );
    }

    #[test]
    fn test_metadata_without_pending_load_is_ignored() {
        let (mut player, element) = player();
        player.on_loaded_metadata(10.0).unwrap();
        assert_eq!(player.phase(), PlaybackPhase::Idle);
        assert!(element.commands().is_empty());

        let (mut player, element) = playing(60.0);
        player.toggle_play_pause().unwrap();
        element.clear();
        player.on_loaded_metadata(99.0).unwrap();
        assert_eq!(player.phase(), PlaybackPhase::Paused);
        assert_eq!(player.state().duration_seconds, 60.0);
        assert!(element.commands().is_empty());
    }

    #[test]
    fn test_time_update_is_idempotent() {
        let (mut player, _) = playing(120.0);
        player.on_time_update(42.5);
        let once = player.state().clone();
        player.on_time_update(42.5);
        assert_eq!(player.state(), &once);
        assert_eq!(player.state().current_time_seconds, 42.5);
    }

    #[test]
    fn test_time_update_drops_invalid_positions() {
        let (mut player, _) = playing(120.0);
        player.on_time_update(10.0);
        player.on_time_update(f64::NAN);
        player.on_time_update(-1.0);
        assert_eq!(player.state().current_time_seconds, 10.0);
    }

    #[test]
    fn test_toggle_play_pause() {
        let (mut player, element) = playing(120.0);
        assert_eq!(player.toggle_play_pause().unwrap(), PlaybackPhase::Paused);
        assert!(!player.state().is_playing);
        assert_eq!(player.toggle_play_pause().unwrap(), PlaybackPhase::Playing);
        assert!(player.state().is_playing);
        assert_eq!(element.commands(), vec![MediaCommand::Pause, MediaCommand::Play]);
    }

    #[test]
    fn test_toggle_while_loading_does_nothing() {
        let (mut player, element) = player();
        player.load(Some("https://bucket/a.mp3"), None).unwrap();
        element.clear();
        assert_eq!(player.toggle_play_pause().unwrap(), PlaybackPhase::Loading);
        assert!(element.commands().is_empty());
    }

    #[test]
    fn test_seek_keeps_phase_and_clamps() {
        let (mut player, element) = playing(100.0);
        assert_eq!(player.seek(30.0).unwrap(), 30.0);
        assert_eq!(player.phase(), PlaybackPhase::Playing);
        assert_eq!(player.seek(500.0).unwrap(), 100.0);
        assert_eq!(player.seek(-5.0).unwrap(), 0.0);
        assert_eq!(
            element.commands(),
            vec![
                MediaCommand::Seek(30.0),
                MediaCommand::Seek(100.0),
                MediaCommand::Seek(0.0),
            ]
        );

        player.toggle_play_pause().unwrap();
        player.seek(50.0).unwrap();
        assert_eq!(player.phase(), PlaybackPhase::Paused);
        assert_eq!(player.state().current_time_seconds, 50.0);
    }

    #[test]
    fn test_seek_while_idle_fails() {
        let (mut player, _) = player();
        assert!(matches!(player.seek(1.0), Err(PlayerError::InvalidSource(_))));
    }

    #[test]
    fn test_volume_clamps_and_ignores_nan() {
        let (mut player, _) = playing(100.0);
        assert_eq!(player.set_volume(0.7).unwrap(), 0.7);
        assert_eq!(player.set_volume(3.0).unwrap(), 1.0);
        assert_eq!(player.set_volume(-1.0).unwrap(), 0.0);
        assert_eq!(player.set_volume(f64::NAN).unwrap(), 0.0);
        assert_eq!(player.phase(), PlaybackPhase::Playing);
    }

    #[test]
    fn test_reload_resets_position() {
        let (mut player, _) = playing(100.0);
        player.on_time_update(50.0);
        player.load(Some("https://bucket/b.mp3"), Some("B")).unwrap();
        assert_eq!(player.phase(), PlaybackPhase::Loading);
        assert_eq!(player.state().current_time_seconds, 0.0);
        assert_eq!(player.state().duration_seconds, 0.0);
        assert_eq!(player.state().media_ref.as_deref(), Some("https://bucket/b.mp3"));
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0.0), "00:00");
        assert_eq!(format_position(61.9), "01:01");
        assert_eq!(format_position(3661.0), "1:01:01");
        assert_eq!(format_position(f64::NAN), "00:00");
    }
}
