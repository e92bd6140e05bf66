//! The session manager: the single owner of the logged-in session.
//!
//! State lives in a `tokio::sync::watch` channel. [`SessionManager::current`]
//! reads it and [`SessionManager::subscribe`] hands out receivers that see
//! every login and logout. Persistence sits behind the manager as a
//! write-through [`SessionStore`]; the in-memory value is authoritative, the
//! store is only read once at startup by [`SessionManager::rehydrate`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use feedme_core::{BearerToken, Session, User, UserId, UserRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::jwt;

// =============================================================================
// Errors
// =============================================================================

/// Why an operation needing a logged-in user cannot proceed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required: not logged in")]
    NotLoggedIn,
    #[error("Authentication required: session has no user id")]
    MissingUserId,
    #[error("Authentication required: session has no token")]
    MissingToken,
    #[error("Authentication required: session expired")]
    Expired,
    #[error("Access denied: requires {required} role (current: {actual})")]
    RoleMismatch { required: UserRole, actual: UserRole },
}

/// Failure persisting or loading the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to persist session at {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Stored session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// =============================================================================
// Stores
// =============================================================================

/// On-disk shape of a persisted session.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    user: User,
}

/// Persistence behind the session manager.
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the stored copy cannot be read or parsed.
    fn load(&self) -> Result<Option<Session>, SessionError>;

    /// Persist `session`, replacing any previous copy.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Persist` on I/O failure.
    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove the persisted copy.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Persist` on I/O failure.
    fn clear(&self) -> Result<(), SessionError>;
}

/// JSON file store. `token` holds the bearer string, `user` the user record.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Persist {
            path: self.path.clone(),
            source,
        }
    }
}

/// Write `contents` readable by the owner only, since the file holds the
/// bearer token.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let mut file = options.open(path)?;
        // `mode` only applies when the file is created
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file.write_all(contents)
    }
    #[cfg(not(unix))]
    {
        options.open(path)?.write_all(contents)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.persist_error(e)),
        };
        let stored: StoredSession = serde_json::from_str(&raw)?;
        Ok(Some(Session::new(
            stored.user,
            BearerToken::new(&stored.token),
        )))
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.persist_error(e))?;
        }
        let stored = StoredSession {
            token: session.token.raw().to_owned(),
            user: session.user.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        write_private(&self.path, json.as_bytes()).map_err(|e| self.persist_error(e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.persist_error(e)),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    /// What a restart would rehydrate.
    #[must_use]
    pub fn stored(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.stored())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// Manager
// =============================================================================

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub role: UserRole,
    pub token: BearerToken,
}

/// Owner of the current session.
///
/// Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    state: watch::Sender<Option<Session>>,
    store: Box<dyn SessionStore>,
}

impl SessionManager {
    /// A logged-out manager over `store`. The store is not read.
    #[must_use]
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self::with_state(store, None)
    }

    /// Restore the persisted session at startup.
    ///
    /// An unreadable or corrupt store starts logged out.
    #[must_use]
    pub fn rehydrate(store: impl SessionStore + 'static) -> Self {
        let session = match store.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable stored session");
                None
            }
        };
        if let Some(session) = &session {
            debug!(user_id = %session.user.id, "Rehydrated session");
        }
        Self::with_state(store, session)
    }

    fn with_state(store: impl SessionStore + 'static, session: Option<Session>) -> Self {
        let (state, _) = watch::channel(session);
        Self {
            inner: Arc::new(SessionManagerInner {
                state,
                store: Box::new(store),
            }),
        }
    }

    /// The current session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner.state.borrow().clone()
    }

    /// Whether a session is present.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    /// Observe session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.state.subscribe()
    }

    /// Replace the session and write it through to the store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if persisting fails. The in-memory session is
    /// replaced regardless.
    pub fn login(&self, session: Session) -> Result<(), SessionError> {
        info!(
            user_id = %session.user.id,
            role = %session.user.role,
            token = %session.token.preview(),
            "Session started"
        );
        self.inner.state.send_replace(Some(session.clone()));
        self.inner.store.save(&session)
    }

    /// Clear the session and the store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if clearing the store fails. The in-memory
    /// session is cleared regardless.
    pub fn logout(&self) -> Result<(), SessionError> {
        if self.inner.state.send_replace(None).is_some() {
            info!("Session ended");
        }
        self.inner.store.clear()
    }

    /// The caller's identity, or why there is none.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` when logged out, when the session lacks a user id
    /// or token, or when the token's `exp` claim has passed.
    pub fn require_auth(&self) -> Result<AuthContext, AuthError> {
        let session = self.current().ok_or(AuthError::NotLoggedIn)?;
        if session.user.id.is_empty() {
            return Err(AuthError::MissingUserId);
        }
        if session.token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let claims = jwt::decode(session.token.raw());
        if claims.as_ref().is_some_and(|c| c.is_expired_at(Utc::now())) {
            return Err(AuthError::Expired);
        }
        let role = claims
            .and_then(|c| c.role)
            .unwrap_or(session.user.role);
        Ok(AuthContext {
            user_id: session.user.id,
            role,
            token: session.token,
        })
    }

    /// Like [`Self::require_auth`], also checking the role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RoleMismatch` when authenticated with another role.
    pub fn require_role(&self, required: UserRole) -> Result<AuthContext, AuthError> {
        let ctx = self.require_auth()?;
        if ctx.role == required {
            Ok(ctx)
        } else {
            Err(AuthError::RoleMismatch {
                required,
                actual: ctx.role,
            })
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::jwt::tests::token_with;

    fn session(id: &str, role: UserRole, token: &str) -> Session {
        Session::new(User::new(id, "cook@feedme.test", role), BearerToken::new(token))
    }

    fn temp_path(name: &str) -> PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        std::env::temp_dir()
            .join(format!("feedme-{name}-{}-{nanos}", std::process::id()))
            .join("session.json")
    }

    #[test]
    fn test_require_auth_reasons() {
        let manager = SessionManager::new(MemorySessionStore::new());
        assert_eq!(manager.require_auth(), Err(AuthError::NotLoggedIn));

        manager.login(session("", UserRole::Provider, "tok")).unwrap();
        assert_eq!(manager.require_auth(), Err(AuthError::MissingUserId));

        manager.login(session("p-1", UserRole::Provider, "")).unwrap();
        assert_eq!(manager.require_auth(), Err(AuthError::MissingToken));

        manager.login(session("p-1", UserRole::Provider, "tok")).unwrap();
        let ctx = manager.require_auth().unwrap();
        assert_eq!(ctx.user_id.as_str(), "p-1");
        assert_eq!(ctx.token.header_value(), "Bearer tok");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let manager = SessionManager::new(MemorySessionStore::new());
        let expired = token_with(&serde_json::json!({"id": "p-1", "exp": 1_000}));
        manager.login(session("p-1", UserRole::Provider, &expired)).unwrap();
        assert_eq!(manager.require_auth(), Err(AuthError::Expired));
    }

    #[test]
    fn test_role_comes_from_token_when_present() {
        let manager = SessionManager::new(MemorySessionStore::new());
        let admin_token = token_with(&serde_json::json!({"id": "u-1", "role": "admin"}));
        manager.login(session("u-1", UserRole::Customer, &admin_token)).unwrap();
        assert!(manager.require_role(UserRole::Admin).is_ok());
        assert_eq!(
            manager.require_role(UserRole::Provider),
            Err(AuthError::RoleMismatch {
                required: UserRole::Provider,
                actual: UserRole::Admin
            })
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_login_and_logout() {
        let manager = SessionManager::new(MemorySessionStore::new());
        let mut rx = manager.subscribe();

        manager.login(session("c-1", UserRole::Customer, "tok")).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        manager.logout().unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = temp_path("roundtrip");
        let store = FileSessionStore::new(&path);
        assert!(store.load().unwrap().is_none());

        let manager = SessionManager::rehydrate(store.clone());
        assert!(!manager.is_logged_in());
        manager.login(session("p-7", UserRole::Provider, "Bearer abc")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], "abc");
        assert_eq!(raw["user"]["_id"], "p-7");

        let restarted = SessionManager::rehydrate(FileSessionStore::new(&path));
        assert_eq!(restarted.current(), manager.current());

        restarted.logout().unwrap();
        assert!(!path.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("perms");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionStore::new(&path);
        store.save(&session("p-1", UserRole::Provider, "tok")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().unwrap().user.id.as_str(), "p-1");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_starts_logged_out() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(matches!(store.load(), Err(SessionError::Corrupt(_))));
        let manager = SessionManager::rehydrate(store);
        assert!(manager.current().is_none());
    }
}
