//! Command implementations.

use std::io::{self, StdoutLock};
use std::sync::Arc;

use feedme_client::{
    ApiClient, ApiError, AuthError, ClientConfig, ConfigError, FileSessionStore, SessionManager,
    TracingNotifier, TrackingWorkflow, WorkflowError,
};
use feedme_core::EmailError;
use thiserror::Error;

pub mod auth;
pub mod blogs;
pub mod meals;
pub mod newsletter;
pub mod orders;
pub mod reviews;
pub mod stats;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Shared state for one CLI invocation.
pub struct Context {
    pub client: ApiClient,
    pub workflow: TrackingWorkflow,
}

impl Context {
    /// Build the client from the environment, restoring any stored session.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_env() -> Result<Self, CommandError> {
        let config = ClientConfig::from_env()?;
        let session = SessionManager::rehydrate(FileSessionStore::new(&config.session_file));
        let client = ApiClient::new(config, session)?;
        let workflow = TrackingWorkflow::new(client.clone(), Arc::new(TracingNotifier));
        Ok(Self { client, workflow })
    }
}

/// Locked stdout for command output; logs go to stderr.
pub fn out() -> StdoutLock<'static> {
    io::stdout().lock()
}

/// Format an optional timestamp as a date.
pub fn date_or_dash(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string())
}
