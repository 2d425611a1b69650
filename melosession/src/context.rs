//! Session context: the single source of truth for authentication
//!
//! One `SessionContext` is created per process and handed (as an
//! `Arc<SessionContext>`) to every accessor and view that needs it. It owns
//! the `AuthState` cell and the durable store; `login`/`logout` are its only
//! writers.

use crate::cell::{Subscription, ValueCell};
use crate::error::{Result, SessionError};
use crate::state::{AuthState, Identity, Requirement};
use crate::config_ext::SessionConfigExt;
use crate::store::{FileSessionStore, SessionStore};
use meloconfig::Config;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SessionContext {
    state: ValueCell<AuthState>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Create a context in the initial (loading) state
    ///
    /// Nothing is read from the store until [`restore`](Self::restore) runs.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            state: ValueCell::new(AuthState::initial()),
            store,
        }
    }

    /// Create a shared context and restore the persisted session in the background
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(store: Arc<dyn SessionStore>) -> Arc<Self> {
        let ctx = Arc::new(Self::new(store));
        let restoring = ctx.clone();
        tokio::spawn(async move {
            restoring.restore().await;
        });
        ctx
    }

    /// Shared context backed by the session file named in the configuration
    ///
    /// The persisted session is restored in the background, see
    /// [`start`](Self::start).
    pub fn from_config(config: &Config) -> Arc<Self> {
        let path = config.get_session_file();
        debug!(path = %path.display(), "Using session file");
        Self::start(Arc::new(FileSessionStore::new(path)))
    }

    /// Wait until the session has left the loading state
    pub async fn settled(&self) -> Result<AuthState> {
        self.state
            .wait_for(|state| !state.is_loading)
            .await
            .ok_or(SessionError::Closed)
    }

    /// Read the persisted identity and leave the loading state
    ///
    /// Has no effect once the state has left loading (a login or logout
    /// already happened). A storage failure is logged and treated as "no
    /// persisted session".
    pub async fn restore(&self) -> AuthState {
        let restored = match self.store.load().await {
            Ok(Some(identity)) => {
                info!(subject = %identity.subject, "Restored persisted session");
                AuthState::signed_in(identity)
            }
            Ok(None) => AuthState::signed_out(),
            Err(e) => {
                warn!("Failed to read persisted session: {}", e);
                AuthState::signed_out()
            }
        };

        let applied = self.state.update(|state| {
            if state.is_loading {
                *state = restored;
            }
        });
        if !applied {
            debug!("Session already settled, restore ignored");
        }
        self.state.get()
    }

    /// Synchronous snapshot
    pub fn current(&self) -> AuthState {
        self.state.get()
    }

    /// Subscribe to session changes, starting with the current snapshot
    pub fn observe(&self) -> Subscription<AuthState> {
        self.state.subscribe()
    }

    /// Sign in: persist the identity, then publish the authenticated state
    pub async fn login(&self, identity: Identity) {
        info!(subject = %identity.subject, "Logging in");
        if let Err(e) = self.store.save(&identity).await {
            warn!("Failed to persist session: {}", e);
        }
        self.state.set(AuthState::signed_in(identity));
    }

    /// Sign out: clear durable storage, then publish the signed-out state
    pub async fn logout(&self) {
        info!("Logging out");
        if let Err(e) = self.store.clear().await {
            warn!("Failed to clear persisted session: {}", e);
        }
        self.state.set(AuthState::signed_out());
    }

    /// Suspend until the session satisfies `requirement`
    ///
    /// Resolves at once if it already does. There is no timeout: a session
    /// that never satisfies the requirement keeps the caller suspended.
    pub async fn ready(&self, requirement: Requirement) -> Result<AuthState> {
        let current = self.state.get();
        if requirement.is_satisfied_by(&current) {
            return Ok(current);
        }
        debug!(?requirement, "Waiting for session");
        self.state
            .wait_for(|state| requirement.is_satisfied_by(state))
            .await
            .ok_or(SessionError::Closed)
    }
}
