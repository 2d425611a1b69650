//! Low-level access to the Melo REST API
//!
//! `MeloApi` knows the base URL, sends one request per call, attaches the
//! bearer token it is given and unwraps the `{ "data": ... }` envelope. It
//! knows nothing about sessions: gating happens one layer up, in the
//! accessors.

use crate::error::{ApiError, Result};
use crate::models::wire::Envelope;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for API requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("melo/", env!("CARGO_PKG_VERSION"));

/// Low-level HTTP client for the backend
#[derive(Debug, Clone)]
pub struct MeloApi {
    client: Client,
    base_url: String,
}

impl MeloApi {
    /// Create a client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Self::with_client(client, base_url)
    }

    /// Create a client around an existing `reqwest::Client`
    ///
    /// Useful for sharing connection pools or proxy settings.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        // reject garbage early rather than on the first request
        url::Url::parse(&base_url)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<T> {
        self.request::<T, ()>(Method::GET, endpoint, query, bearer, None)
            .await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T> {
        self.request(Method::POST, endpoint, &[], bearer, Some(body))
            .await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T> {
        self.request(Method::PUT, endpoint, &[], bearer, Some(body))
            .await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<T> {
        self.request::<T, ()>(Method::DELETE, endpoint, query, bearer, None)
            .await
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
        body: Option<&B>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        debug!(%method, %url, params = query.len(), authenticated = bearer.is_some(), "Sending request");

        let mut request = self
            .client
            .request(method, &url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::unwrap_envelope(response).await
    }

    /// Check the status and unwrap the data envelope
    async fn unwrap_envelope<T: DeserializeOwned>(response: Response) -> Result<T> {
        let code = response.status().as_u16();
        debug!(status = code, "Received response");

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = code, body = %body, "Backend rejected request");
            return Err(ApiError::from_status_code(code, body));
        }

        let body = response.bytes().await?;
        match serde_json::from_slice::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope.data),
            Err(e) => {
                warn!(error = %e, "Response does not match the expected shape");
                Err(ApiError::JsonParse(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_creation_trims_trailing_slash() {
        let api = MeloApi::new("https://api.example.org/prod/").unwrap();
        assert_eq!(api.base_url(), "https://api.example.org/prod");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = MeloApi::new("not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }
}
