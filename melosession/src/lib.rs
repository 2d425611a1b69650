//! # melosession - Session state for the Melo client
//!
//! Holds the authentication snapshot (`AuthState`) that gates every
//! authenticated remote call, and the subscribable `ValueCell` it is built on.
//!
//! - `SessionContext`: single writer (`login`/`logout`), many readers
//!   (`current`, `observe`, `ready`)
//! - `SessionStore`: durable storage of the signed-in identity
//! - `ValueCell`: latest-value broadcast cell, reused by the API caches
//!
//! ```rust,no_run
//! use melosession::{Identity, MemorySessionStore, Requirement, SessionContext};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let session = SessionContext::start(Arc::new(MemorySessionStore::new()));
//! session.login(Identity::new("sub-123").with_id_token("token")).await;
//! let state = session.ready(Requirement::IdToken).await.unwrap();
//! assert!(state.is_authenticated);
//! # }
//! ```

pub mod cell;
pub mod config_ext;
pub mod context;
pub mod error;
pub mod state;
pub mod store;

pub use cell::{Subscription, ValueCell};
pub use config_ext::SessionConfigExt;
pub use context::SessionContext;
pub use error::{Result, SessionError};
pub use state::{AuthState, Identity, Requirement};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, STORAGE_KEY};
