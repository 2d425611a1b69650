//! Music library accessor
//!
//! All operations require a signed-in session with an id token.

use crate::accessor::Accessor;
use crate::error::ApiError;
use crate::fetched::Fetched;
use crate::models::wire::{MusicListWire, MusicWire};
use crate::models::{Music, MusicUpload};
use melosession::Requirement;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct MusicAccessor {
    accessor: Accessor,
}

impl MusicAccessor {
    pub fn new(accessor: Accessor) -> Self {
        Self { accessor }
    }

    /// List the signed-in user's tracks
    pub async fn list(&self) -> Fetched<Vec<Music>> {
        let result = self
            .accessor
            .gated(Requirement::IdToken, |api, state| async move {
                let list: MusicListWire = api.get("/music/list", &[], state.id_token()).await?;
                Ok::<_, ApiError>(list.music_list.into_iter().map(Music::from).collect::<Vec<_>>())
            })
            .await;
        if let Ok(list) = &result {
            debug!("Fetched {} tracks", list.len());
        }
        Fetched::recover("list music", result, None)
    }

    pub async fn get(&self, music_id: &str) -> Fetched<Music> {
        let result = self
            .accessor
            .gated(Requirement::IdToken, |api, state| async move {
                let music: MusicWire = api
                    .get("/music", &[("music_id", music_id)], state.id_token())
                    .await?;
                Ok::<_, ApiError>(Music::from(music))
            })
            .await;
        Fetched::recover("get music", result, None)
    }

    /// Upload a track; the body is sent as given
    pub async fn upload(&self, upload: &MusicUpload) -> Fetched<Music> {
        let result = self
            .accessor
            .gated(Requirement::IdToken, |api, state| async move {
                let music: MusicWire = api.post("/music", upload, state.id_token()).await?;
                Ok::<_, ApiError>(Music::from(music))
            })
            .await;
        if let Ok(music) = &result {
            info!(music_id = %music.id, title = %music.title, "Music uploaded");
        }
        Fetched::recover("upload music", result, None)
    }

    /// Delete a track; the backend answers with the deleted record
    pub async fn delete(&self, music_id: &str) -> Fetched<Music> {
        let result = self
            .accessor
            .gated(Requirement::IdToken, |api, state| async move {
                let music: MusicWire = api
                    .delete("/music", &[("music_id", music_id)], state.id_token())
                    .await?;
                Ok::<_, ApiError>(Music::from(music))
            })
            .await;
        if result.is_ok() {
            info!(music_id, "Music deleted");
        }
        Fetched::recover("delete music", result, None)
    }
}
