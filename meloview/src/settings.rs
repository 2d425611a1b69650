//! Account settings page controller
//!
//! Settings and headshot load independently, each with its own loading flag;
//! the page is loading while either one is.

use crate::upload::encode_file;
use anyhow::Result;
use meloapi::{Fetched, Headshot, MeloClient, UserSettings};
use melosession::{Subscription, ValueCell};
use std::path::Path;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsState {
    pub is_loading_settings: bool,
    pub is_loading_headshot: bool,
    /// Form content: last loaded or saved settings
    pub settings: UserSettings,
    pub headshot_url: Option<String>,
}

impl SettingsState {
    pub fn is_loading(&self) -> bool {
        self.is_loading_settings || self.is_loading_headshot
    }
}

#[derive(Debug, Clone)]
pub struct SettingsView {
    client: MeloClient,
    state: ValueCell<SettingsState>,
}

impl SettingsView {
    pub fn new(client: MeloClient) -> Self {
        Self {
            client,
            state: ValueCell::new(SettingsState::default()),
        }
    }

    pub fn state(&self) -> SettingsState {
        self.state.get()
    }

    pub fn observe(&self) -> Subscription<SettingsState> {
        self.state.subscribe()
    }

    /// Load settings and headshot concurrently
    pub async fn load(&self) -> (Fetched<UserSettings>, Fetched<Headshot>) {
        tokio::join!(self.load_settings(), self.load_headshot())
    }

    pub async fn load_settings(&self) -> Fetched<UserSettings> {
        self.state.update(|state| state.is_loading_settings = true);
        let fetched = self.client.users().settings().await;
        let loaded = fetched.value().cloned();
        self.state.update(|state| {
            if let Some(settings) = loaded {
                state.settings = settings;
            }
            state.is_loading_settings = false;
        });
        fetched
    }

    pub async fn load_headshot(&self) -> Fetched<Headshot> {
        self.state.update(|state| state.is_loading_headshot = true);
        let fetched = self.client.users().headshot().await;
        let url = fetched.value().map(|h| h.image_url.clone());
        self.state.update(|state| {
            if url.is_some() {
                state.headshot_url = url;
            }
            state.is_loading_headshot = false;
        });
        fetched
    }

    /// Save the settings form
    ///
    /// On failure the form shows the settings as they were before the call.
    pub async fn submit_settings(&self, settings: &UserSettings) -> Fetched<UserSettings> {
        self.state.update(|state| state.is_loading_settings = true);
        let fetched = self.client.users().update_settings(settings).await;
        let saved = fetched.value().cloned();
        self.state.update(|state| {
            if let Some(saved) = saved {
                state.settings = saved;
            }
            state.is_loading_settings = false;
        });
        if fetched.is_fresh() {
            info!("Settings saved");
        }
        fetched
    }

    /// Upload a base64 encoded headshot
    pub async fn submit_headshot(&self, image_base64: &str) -> Fetched<Headshot> {
        self.state.update(|state| state.is_loading_headshot = true);
        let fetched = self.client.users().upload_headshot(image_base64).await;
        let url = fetched.value().map(|h| h.image_url.clone());
        self.state.update(|state| {
            if url.is_some() {
                state.headshot_url = url;
            }
            state.is_loading_headshot = false;
        });
        fetched
    }

    pub async fn submit_headshot_file(&self, path: &Path) -> Result<Fetched<Headshot>> {
        let image = encode_file(path).await?;
        Ok(self.submit_headshot(&image).await)
    }

    /// Reload the page every time a user signs in
    ///
    /// Fires on the first authenticated snapshot and again whenever the
    /// signed-in subject changes. Runs until the handle is aborted.
    pub fn spawn_auto_reload(&self) -> JoinHandle<()> {
        let mut session = self.client.session().observe();
        let view = self.clone();
        tokio::spawn(async move {
            let mut loaded_for: Option<String> = None;
            while let Some(state) = session.next().await {
                if !state.is_authenticated {
                    loaded_for = None;
                    continue;
                }
                let subject = state.subject().map(str::to_string);
                if loaded_for.is_some() && loaded_for == subject {
                    continue;
                }
                debug!(subject = ?subject, "Session authenticated, reloading settings");
                loaded_for = subject;
                view.load().await;
            }
        })
    }
}
