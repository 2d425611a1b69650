//! Shared plumbing for the resource accessors
//!
//! Every accessor follows the same pipeline:
//! wait for the session (`ready`), send the request, reshape the response,
//! publish it to the resource cache when there is one, return it. `Accessor`
//! owns the first two steps so each resource only writes the last ones.

use crate::api::MeloApi;
use crate::error::{ApiError, Result};
use melosession::{AuthState, Requirement, SessionContext};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Accessor {
    api: Arc<MeloApi>,
    session: Arc<SessionContext>,
}

impl Accessor {
    pub fn new(api: Arc<MeloApi>, session: Arc<SessionContext>) -> Self {
        Self { api, session }
    }

    pub fn api(&self) -> &Arc<MeloApi> {
        &self.api
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Suspend until `requirement` holds, then run `op` with the snapshot that satisfied it
    ///
    /// The request is sent exactly once, after the gate opens.
    pub async fn gated<T, F, Fut>(&self, requirement: Requirement, op: F) -> Result<T>
    where
        F: FnOnce(Arc<MeloApi>, AuthState) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let state = self
            .session
            .ready(requirement)
            .await
            .map_err(|_| ApiError::SessionClosed)?;
        op(self.api.clone(), state).await
    }

    /// Bearer token of the current session, without waiting
    ///
    /// Used by public endpoints that accept but do not require a token.
    pub fn current_bearer(&self) -> Option<String> {
        self.session.current().id_token().map(str::to_string)
    }
}
