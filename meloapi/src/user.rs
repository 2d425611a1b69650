//! User settings and headshot accessor
//!
//! The signed-in user's settings and headshot are published to single-slot
//! caches (`ValueCell`): every successful fetch or update overwrites the slot
//! and every subscriber sees the new value. Lookups of other users go straight
//! to the backend and never touch the caches.

use crate::accessor::Accessor;
use crate::error::ApiError;
use crate::fetched::Fetched;
use crate::models::wire::{HeadshotUploadWire, HeadshotWire, UserSettingsWire};
use crate::models::{Headshot, UserSettings};
use melosession::{AuthState, Requirement, Subscription, ValueCell};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Which credential identifies the signed-in user in user endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityKey {
    /// `?user_id=<subject>`
    #[default]
    Subject,
    /// `?username=<username>`
    Username,
}

impl IdentityKey {
    /// Credential the gate waits for
    pub fn requirement(self) -> Requirement {
        match self {
            IdentityKey::Subject => Requirement::Subject,
            IdentityKey::Username => Requirement::Username,
        }
    }

    /// Key of the signed-in user, if the session carries the credential
    pub fn user_key(self, state: &AuthState) -> Option<UserKey> {
        match self {
            IdentityKey::Subject => state.subject().map(|s| UserKey::Id(s.to_string())),
            IdentityKey::Username => state.username().map(|u| UserKey::Username(u.to_string())),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentityKey::Subject => "subject",
            IdentityKey::Username => "username",
        })
    }
}

impl FromStr for IdentityKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subject" | "sub" | "user_id" => Ok(IdentityKey::Subject),
            "username" => Ok(IdentityKey::Username),
            other => Err(format!("unknown identity key '{}'", other)),
        }
    }
}

/// Identifies a user in a query string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserKey {
    Id(String),
    Username(String),
}

impl UserKey {
    fn query(&self) -> (&'static str, &str) {
        match self {
            UserKey::Id(id) => ("user_id", id.as_str()),
            UserKey::Username(name) => ("username", name.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserAccessor {
    accessor: Accessor,
    identity_key: IdentityKey,
    settings: ValueCell<UserSettings>,
    headshot: ValueCell<Option<Headshot>>,
}

impl UserAccessor {
    pub fn new(accessor: Accessor, identity_key: IdentityKey) -> Self {
        Self {
            accessor,
            identity_key,
            settings: ValueCell::new(UserSettings::default()),
            headshot: ValueCell::new(None),
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        self.identity_key
    }

    /// Last settings published for the signed-in user (empty until the first fetch)
    pub fn cached_settings(&self) -> UserSettings {
        self.settings.get()
    }

    pub fn observe_settings(&self) -> Subscription<UserSettings> {
        self.settings.subscribe()
    }

    pub fn cached_headshot(&self) -> Option<Headshot> {
        self.headshot.get()
    }

    pub fn observe_headshot(&self) -> Subscription<Option<Headshot>> {
        self.headshot.subscribe()
    }

    /// Fetch the signed-in user's settings and publish them
    pub async fn settings(&self) -> Fetched<UserSettings> {
        let identity_key = self.identity_key;
        let result = self
            .accessor
            .gated(identity_key.requirement(), |api, state| async move {
                let key = identity_key
                    .user_key(&state)
                    .ok_or(ApiError::SessionClosed)?;
                let (name, value) = key.query();
                let wire: UserSettingsWire = api
                    .get("/user/settings", &[(name, value)], state.id_token())
                    .await?;
                Ok::<_, ApiError>(UserSettings::from(wire))
            })
            .await;
        if let Ok(settings) = &result {
            debug!(username = %settings.username, "Publishing user settings");
            self.settings.set(settings.clone());
        }
        Fetched::recover("get user settings", result, Some(self.settings.get()))
    }

    /// Fetch another user's settings
    ///
    /// Public lookup: no gate, the bearer token is sent when one is present.
    /// The result is not published.
    pub async fn settings_for(&self, key: &UserKey) -> Fetched<UserSettings> {
        let bearer = self.accessor.current_bearer();
        let (name, value) = key.query();
        let result = self
            .accessor
            .api()
            .get::<UserSettingsWire>("/user/settings", &[(name, value)], bearer.as_deref())
            .await
            .map(UserSettings::from);
        Fetched::recover("get user settings by key", result, None)
    }

    /// Replace the signed-in user's settings
    ///
    /// On failure the fallback is the cached value from before the call.
    pub async fn update_settings(&self, settings: &UserSettings) -> Fetched<UserSettings> {
        let before = self.settings.get();
        let body = UserSettingsWire::from(settings.clone());
        let result = self
            .accessor
            .gated(Requirement::IdToken, |api, state| async move {
                let wire: UserSettingsWire =
                    api.put("/user/settings", &body, state.id_token()).await?;
                Ok::<_, ApiError>(UserSettings::from(wire))
            })
            .await;
        if let Ok(updated) = &result {
            info!(username = %updated.username, "User settings updated");
            self.settings.set(updated.clone());
        }
        Fetched::recover("update user settings", result, Some(before))
    }

    /// Set the preferred track, keeping the other cached settings
    pub async fn update_preferred_music(&self, music_id: &str) -> Fetched<UserSettings> {
        let settings = UserSettings {
            preferred_music_id: music_id.to_string(),
            ..self.settings.get()
        };
        self.update_settings(&settings).await
    }

    /// Fetch the signed-in user's headshot and publish it
    pub async fn headshot(&self) -> Fetched<Headshot> {
        let identity_key = self.identity_key;
        let result = self
            .accessor
            .gated(identity_key.requirement(), |api, state| async move {
                let key = identity_key
                    .user_key(&state)
                    .ok_or(ApiError::SessionClosed)?;
                let (name, value) = key.query();
                let wire: HeadshotWire = api
                    .get("/user/image", &[(name, value)], state.id_token())
                    .await?;
                Ok::<_, ApiError>(Headshot::from(wire))
            })
            .await;
        if let Ok(headshot) = &result {
            self.headshot.set(Some(headshot.clone()));
        }
        Fetched::recover("get headshot", result, self.headshot.get())
    }

    /// Upload a new headshot (base64 image) and publish the resulting URL
    pub async fn upload_headshot(&self, image_base64: &str) -> Fetched<Headshot> {
        let body = HeadshotUploadWire {
            image: image_base64.to_string(),
        };
        let result = self
            .accessor
            .gated(Requirement::IdToken, |api, state| async move {
                let wire: HeadshotWire = api.post("/user/image", &body, state.id_token()).await?;
                Ok::<_, ApiError>(Headshot::from(wire))
            })
            .await;
        if let Ok(headshot) = &result {
            info!(url = %headshot.image_url, "Headshot uploaded");
            self.headshot.set(Some(headshot.clone()));
        }
        Fetched::recover("upload headshot", result, self.headshot.get())
    }
}
