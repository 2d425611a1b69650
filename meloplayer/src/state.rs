/// Where the player is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// No source loaded
    #[default]
    Idle,
    /// Source set, waiting for metadata
    Loading,
    Playing,
    Paused,
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Loading => "loading",
            PlaybackPhase::Playing => "playing",
            PlaybackPhase::Paused => "paused",
        })
    }
}

/// Snapshot of the player
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// URL of the loaded source
    pub media_ref: Option<String>,
    pub is_playing: bool,
    /// 0 until metadata is known
    pub duration_seconds: f64,
    pub current_time_seconds: f64,
    /// Always within `[0, 1]`
    pub volume: f64,
}

impl PlaybackState {
    pub(crate) fn new(volume: f64) -> Self {
        Self {
            media_ref: None,
            is_playing: false,
            duration_seconds: 0.0,
            current_time_seconds: 0.0,
            volume,
        }
    }
}
