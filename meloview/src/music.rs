//! Music library page controller

use crate::config_ext::ViewConfigExt;
use crate::upload::music_upload_from_path;
use anyhow::Result;
use meloapi::{Fetched, MeloClient, Music, MusicUpload, UserSettings};
use meloconfig::Config;
use meloplayer::{DetachedElement, Player, PlayerError};
use melosession::{Subscription, ValueCell};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// What the music page shows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MusicState {
    pub is_loading: bool,
    pub tracks: Vec<Music>,
    /// Track the user marked as preferred; empty until known
    pub preferred_music_id: String,
    pub now_playing: Option<Music>,
}

impl MusicState {
    pub fn is_preferred(&self, music: &Music) -> bool {
        !self.preferred_music_id.is_empty() && self.preferred_music_id == music.id
    }
}

#[derive(Debug, Clone)]
pub struct MusicView {
    client: MeloClient,
    state: ValueCell<MusicState>,
    player: Arc<Mutex<Player>>,
}

impl MusicView {
    pub fn new(client: MeloClient, player: Player) -> Self {
        let preferred = client.users().cached_settings().preferred_music_id;
        Self {
            client,
            state: ValueCell::new(MusicState {
                preferred_music_id: preferred,
                ..MusicState::default()
            }),
            player: Arc::new(Mutex::new(player)),
        }
    }

    /// View with a headless player at the configured volume
    pub fn from_config(client: MeloClient, config: &Config) -> std::result::Result<Self, PlayerError> {
        let player = Player::new(DetachedElement::new(), config.get_default_volume())?;
        Ok(Self::new(client, player))
    }

    pub fn state(&self) -> MusicState {
        self.state.get()
    }

    pub fn observe(&self) -> Subscription<MusicState> {
        self.state.subscribe()
    }

    /// Run `f` on the player, e.g. to forward media element events
    pub fn with_player<R>(&self, f: impl FnOnce(&mut Player) -> R) -> R {
        let mut player = self.player.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut player)
    }

    /// Reload the track list
    ///
    /// A failed fetch empties the list.
    pub async fn load(&self) -> Fetched<Vec<Music>> {
        self.state.update(|state| state.is_loading = true);
        let fetched = self.client.music().list().await;
        let tracks = fetched.value().cloned().unwrap_or_default();
        debug!(count = tracks.len(), fresh = fetched.is_fresh(), "Music list loaded");
        self.state.update(|state| {
            state.tracks = tracks;
            state.is_loading = false;
        });
        fetched
    }

    /// Upload a track and reload the list on success
    pub async fn upload(&self, upload: &MusicUpload) -> Fetched<Music> {
        self.state.update(|state| state.is_loading = true);
        let fetched = self.client.music().upload(upload).await;
        self.settle(fetched.is_fresh()).await;
        fetched
    }

    /// Upload a local file; its name gives the title and extension
    pub async fn upload_file(&self, path: &Path) -> Result<Fetched<Music>> {
        let upload = music_upload_from_path(path).await?;
        Ok(self.upload(&upload).await)
    }

    /// Delete a track and reload the list on success
    pub async fn delete(&self, music_id: &str) -> Fetched<Music> {
        self.state.update(|state| state.is_loading = true);
        let fetched = self.client.music().delete(music_id).await;
        self.settle(fetched.is_fresh()).await;
        fetched
    }

    /// Mark a track as the user's preferred one
    pub async fn set_preferred(&self, music_id: &str) -> Fetched<UserSettings> {
        let fetched = self.client.users().update_preferred_music(music_id).await;
        if let Fetched::Fresh(settings) = &fetched {
            info!(music_id, "Preferred music set");
            follow(&self.state, settings);
        }
        fetched
    }

    /// Keep `preferred_music_id` in sync with the published user settings
    ///
    /// Settings without a preferred track are skipped. The task ends when
    /// the client's settings cache goes away.
    pub fn spawn_preferred_tracking(&self) -> JoinHandle<()> {
        let mut settings = self.client.users().observe_settings();
        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(published) = settings.next().await {
                follow(&state, &published);
            }
        })
    }

    /// Load a track into the player
    ///
    /// Tracks without a pre-signed URL leave the player untouched. Returns
    /// whether the player received a new source.
    pub fn play(&self, music: &Music) -> std::result::Result<bool, PlayerError> {
        let loaded = self.with_player(|player| {
            player.load(music.presigned_url.as_deref(), Some(music.title.as_str()))
        })?;
        if loaded {
            info!(music_id = %music.id, title = %music.title, "Playing");
            self.state.update(|state| state.now_playing = Some(music.clone()));
        } else {
            debug!(music_id = %music.id, "Track has no URL, nothing to play");
        }
        Ok(loaded)
    }

    async fn settle(&self, succeeded: bool) {
        if succeeded {
            self.load().await;
        } else {
            self.state.update(|state| state.is_loading = false);
        }
    }
}

fn follow(state: &ValueCell<MusicState>, settings: &UserSettings) {
    if settings.preferred_music_id.is_empty() {
        return;
    }
    state.update(|state| {
        state.preferred_music_id = settings.preferred_music_id.clone();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn music(id: &str, preferred: &str) -> (Music, MusicState) {
        let music = Music {
            id: id.into(),
            title: "T".into(),
            storage_key: "t.mp3".into(),
            presigned_url: None,
        };
        let state = MusicState {
            preferred_music_id: preferred.into(),
            ..MusicState::default()
        };
        (music, state)
    }

    #[test]
    fn test_is_preferred() {
        let (m, state) = music("1", "1");
        assert!(state.is_preferred(&m));
        let (m, state) = music("1", "2");
        assert!(!state.is_preferred(&m));
        let (m, state) = music("", "");
        assert!(!state.is_preferred(&m));
    }
}
