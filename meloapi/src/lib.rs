//! # meloapi - REST client for the Melo backend
//!
//! Thin, typed access to the music library backend:
//!
//! - `MeloApi`: low-level HTTP client (base URL, bearer header, `data` envelope)
//! - `models`: internal types and their `wire` JSON shapes, with conversions
//!   in both directions
//! - `MusicAccessor`, `UserAccessor`, `HistoryAccessor`: one per resource;
//!   authenticated operations wait on the session before sending anything
//! - `Fetched<T>`: what accessors return instead of an error
//! - `MeloClient`: the accessors bundled together
//!
//! ## Example
//!
//! ```rust,no_run
//! use meloapi::{MeloApi, MeloClient, IdentityKey};
//! use melosession::{Identity, MemorySessionStore, SessionContext};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = SessionContext::start(Arc::new(MemorySessionStore::new()));
//!     let client = MeloClient::new(
//!         MeloApi::new("https://api.example.org")?,
//!         session.clone(),
//!         IdentityKey::Subject,
//!     );
//!
//!     session.login(Identity::new("sub-1").with_id_token("token")).await;
//!
//!     let tracks = client.music().list().await;
//!     for music in tracks.into_value_or_default() {
//!         println!("{} ({})", music.title, music.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Accessors never return `Err`. A failed call is logged and comes back as
//! `Fetched::Fallback`, carrying the last value the client knew (for the
//! published user caches) or nothing:
//!
//! ```rust,ignore
//! match client.users().update_settings(&settings).await {
//!     Fetched::Fresh(saved) => println!("saved {}", saved.username),
//!     Fetched::Fallback { last_known, reason } => eprintln!("kept {:?}: {}", last_known, reason),
//! }
//! ```

pub mod accessor;
pub mod api;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod fetched;
pub mod history;
pub mod models;
pub mod music;
pub mod user;

pub use accessor::Accessor;
pub use api::MeloApi;
pub use client::MeloClient;
pub use config_ext::ApiConfigExt;
pub use error::{ApiError, ErrorKind, Result};
pub use fetched::Fetched;
pub use history::HistoryAccessor;
pub use models::{Headshot, HistoryEntry, Music, MusicUpload, UserSettings};
pub use music::MusicAccessor;
pub use user::{IdentityKey, UserAccessor, UserKey};
