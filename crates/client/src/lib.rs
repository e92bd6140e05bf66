//! feedme Client - async access to the feedme REST backend.
//!
//! # Architecture
//!
//! - [`SessionManager`] owns the logged-in session (watch channel) and
//!   writes it through to a [`SessionStore`]
//! - [`ApiClient`] sends requests over a [`Transport`], caching reads in a
//!   `moka` [`QueryCache`] invalidated by tag
//! - [`FallbackChain`] retries mutations over a second transport with a
//!   shared outcome classifier
//! - [`TrackingWorkflow`] runs order stage changes and deletions on top,
//!   reporting through a [`Notifier`]
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use feedme_client::{ApiClient, ClientConfig, FileSessionStore, SessionManager, TracingNotifier, TrackingWorkflow};
//!
//! let config = ClientConfig::from_env()?;
//! let session = SessionManager::rehydrate(FileSessionStore::new(&config.session_file));
//! let client = ApiClient::new(config, session)?;
//! let workflow = TrackingWorkflow::new(client.clone(), Arc::new(TracingNotifier));
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod jwt;
pub mod notify;
pub mod session;
pub mod tracking;
pub mod transport;

pub use cache::{CacheKey, QueryCache, Tag};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use envelope::Envelope;
pub use error::ApiError;
pub use notify::{Notification, NotificationKind, Notifier, RecordingNotifier, TracingNotifier};
pub use session::{
    AuthContext, AuthError, FileSessionStore, MemorySessionStore, SessionError, SessionManager,
    SessionStore,
};
pub use tracking::{DeleteOutcome, StageChange, TrackingWorkflow, WorkflowError};
pub use transport::{
    ApiRequest, ChainOutcome, FallbackChain, FallbackError, OutcomePolicy, Transport,
};
