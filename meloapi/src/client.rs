//! High-level client bundling the resource accessors
//!
//! A `MeloClient` is built once, from an API handle and the process session,
//! and cloned into every view that needs it. Clones share the HTTP connection
//! pool and the published user caches.

use crate::accessor::Accessor;
use crate::api::MeloApi;
use crate::config_ext::ApiConfigExt;
use crate::error::Result;
use crate::history::HistoryAccessor;
use crate::music::MusicAccessor;
use crate::user::{IdentityKey, UserAccessor};
use meloconfig::Config;
use melosession::{AuthState, Requirement, SessionContext};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct MeloClient {
    session: Arc<SessionContext>,
    music: MusicAccessor,
    users: UserAccessor,
    history: HistoryAccessor,
}

impl MeloClient {
    pub fn new(api: MeloApi, session: Arc<SessionContext>, identity_key: IdentityKey) -> Self {
        let api = Arc::new(api);
        let accessor = Accessor::new(api.clone(), session.clone());
        Self {
            session,
            music: MusicAccessor::new(accessor.clone()),
            users: UserAccessor::new(accessor, identity_key),
            history: HistoryAccessor::new(api),
        }
    }

    /// Build a client from the `api.*` configuration keys
    pub fn from_config(config: &Config, session: Arc<SessionContext>) -> Result<Self> {
        let base_url = config.get_api_base_url();
        let identity_key = config.get_identity_key();
        info!(%base_url, %identity_key, "Creating Melo client");
        let api = MeloApi::with_timeout(base_url, config.get_api_timeout())?;
        Ok(Self::new(api, session, identity_key))
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn music(&self) -> &MusicAccessor {
        &self.music
    }

    pub fn users(&self) -> &UserAccessor {
        &self.users
    }

    pub fn history(&self) -> &HistoryAccessor {
        &self.history
    }

    /// First credential that gated calls would wait for and `state` lacks
    ///
    /// `None` means every gated call can run right away.
    pub fn missing_requirement(&self, state: &AuthState) -> Option<Requirement> {
        [Requirement::IdToken, self.users.identity_key().requirement()]
            .into_iter()
            .find(|requirement| !requirement.is_satisfied_by(state))
    }
}
