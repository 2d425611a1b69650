//! # meloplayer - Playback for the Melo client
//!
//! A `Player` owns one media element and the `PlaybackState` derived from it.
//! Commands (`load`, `toggle_play_pause`, `seek`, `set_volume`) go to the
//! element; element events (`on_loaded_metadata`, `on_time_update`) come back
//! into the player.
//!
//! ```rust
//! use meloplayer::{DetachedElement, PlaybackPhase, Player};
//!
//! let mut player = Player::with_default_volume(DetachedElement::new()).unwrap();
//! player.load(Some("https://bucket/track.mp3"), Some("Track")).unwrap();
//! player.on_loaded_metadata(120.0).unwrap();
//! assert_eq!(player.phase(), PlaybackPhase::Playing);
//! ```

pub mod element;
pub mod error;
pub mod player;
pub mod state;

pub use element::{DetachedElement, MediaCommand, MediaElement};
pub use error::{PlayerError, Result};
pub use player::{format_position, Player, DEFAULT_VOLUME};
pub use state::{PlaybackPhase, PlaybackState};
