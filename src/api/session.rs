//! Sign-in, session persistence and restore

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::api::client::ApiClient;
use crate::errors::ApiError;

const MIN_PASSWORD_LEN: usize = 4;
const FIELD_REQUIRED: &str = "Field required";

/// An authenticated session, passed explicitly to whatever needs credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub user: Option<Value>,
}

impl Session {
    pub fn new(token: String, user: Option<Value>) -> Self {
        Self { token, user }
    }

    /// Employee id of the signed-in user, when the server sent one
    pub fn user_id(&self) -> Option<String> {
        let user = self.user.as_ref()?;
        ["_id", "id"]
            .iter()
            .find_map(|key| user.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }

    pub fn username(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        user.get("user")
            .or_else(|| user.get("name"))
            .and_then(Value::as_str)
    }
}

/// Session file on disk
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file means "signed out"
    pub fn load(&self) -> Result<Option<Session>, ApiError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Session>(&text) {
            Ok(session) if !session.token.is_empty() => Ok(Some(session)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), ApiError> {
        let text = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, text)?;
        debug!("Session persisted to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ApiError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Per-field sign-in problems, as shown next to the inputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginErrors {
    pub username: Option<String>,
    pub password: Option<String>,
    pub general: Option<String>,
}

impl LoginErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.general.is_none()
    }

    fn general(message: &str) -> Self {
        Self {
            general: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl fmt::Display for LoginErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(general) = &self.general {
            parts.push(general.clone());
        }
        if let Some(username) = &self.username {
            parts.push(format!("username: {}", username));
        }
        if let Some(password) = &self.password {
            parts.push(format!("password: {}", password));
        }
        if parts.is_empty() {
            parts.push("Sign-in failed".to_string());
        }
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("{0}")]
    Rejected(LoginErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Client-side checks; any error here means no request is sent
pub fn validate_credentials(username: &str, password: &str) -> LoginErrors {
    let mut errors = LoginErrors::default();
    if username.trim().is_empty() {
        errors.username = Some(FIELD_REQUIRED.to_string());
    }
    if password.is_empty() {
        errors.password = Some(FIELD_REQUIRED.to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.password = Some("Password too short".to_string());
    }
    errors
}

/// Map a server rejection message onto the field it concerns
pub fn classify_rejection(message: &str, password_len: usize) -> LoginErrors {
    let lower = message.to_lowercase();
    let mentions_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    let missing = mentions_any(&["required", "empty", "missing"]);

    let mut errors = LoginErrors::default();
    if lower.contains("user") && missing {
        errors.username = Some(FIELD_REQUIRED.to_string());
    } else if lower.contains("password") && missing {
        errors.password = Some(FIELD_REQUIRED.to_string());
    } else if mentions_any(&["invalid", "wrong", "incorrect"]) {
        errors.general = Some("Incorrect username or password".to_string());
    } else if mentions_any(&["disabled", "inactive"]) {
        errors.general = Some("Account disabled".to_string());
    } else if lower.contains("too short") && password_len < 8 {
        errors.password = Some("Password too short".to_string());
    } else {
        errors.general = Some(message.to_string());
    }
    errors
}

/// Drives sign-in against `/api/auth/*`
///
/// At most one login request is in flight: starting another aborts the
/// previous one, and so does dropping the authenticator.
pub struct Authenticator {
    client: ApiClient,
    store: SessionStore,
    in_flight: Option<AbortHandle>,
}

impl Authenticator {
    pub fn new(client: ApiClient, store: SessionStore) -> Self {
        Self {
            client,
            store,
            in_flight: None,
        }
    }

    /// Client carrying the current session's credentials
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Abort an in-flight login; returns whether there was one
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<Session, LoginError> {
        let errors = validate_credentials(username, password);
        if !errors.is_empty() {
            return Err(LoginError::Rejected(errors));
        }

        if self.cancel() {
            debug!("Aborted previous login request");
        }

        info!("Signing in as {}", username.trim());
        let client = self.client.clone();
        let body = json!({ "user": username.trim(), "password": password });
        let handle = tokio::spawn(async move { client.post(&["auth", "login"], &body).await });
        self.in_flight = Some(handle.abort_handle());

        let joined = handle.await;
        self.in_flight = None;
        let response = match joined {
            Ok(response) => response?,
            Err(e) if e.is_cancelled() => return Err(ApiError::Cancelled.into()),
            Err(e) => return Err(ApiError::Config(format!("Login task failed: {}", e)).into()),
        };

        if !response.is_success() {
            let message = response
                .body
                .find_str(&["message", "error"])
                .unwrap_or_else(|| "Invalid credentials".to_string());
            warn!("Login rejected ({}): {}", response.status, message);
            return Err(LoginError::Rejected(classify_rejection(&message, password.chars().count())));
        }

        let token = response
            .body
            .find_str(&["token", "data.token"])
            .ok_or_else(|| LoginError::Rejected(LoginErrors::general("Server did not return a session token")))?;
        let user = response.body.json().and_then(|v| {
            v.get("user")
                .or_else(|| v.get("data").and_then(|d| d.get("user")))
                .cloned()
        });

        let session = Session::new(token, user);
        self.store.save(&session)?;
        self.client.set_bearer(Some(session.token.clone()));
        info!("Signed in");
        Ok(session)
    }

    /// Re-validate a stored session with `/api/auth/me`
    ///
    /// A session the server rejects is removed from disk.
    pub async fn restore(&mut self) -> Result<Option<Session>, ApiError> {
        let Some(stored) = self.store.load()? else {
            return Ok(None);
        };

        self.client.set_bearer(Some(stored.token.clone()));
        match self.client.get(&["auth", "me"]).await {
            Ok(body) => {
                let user = body.json().map(|v| {
                    v.get("user")
                        .or_else(|| v.get("data"))
                        .unwrap_or(v)
                        .clone()
                });
                let session = Session::new(stored.token, user.or(stored.user));
                self.store.save(&session)?;
                Ok(Some(session))
            }
            Err(ApiError::Status { status, message }) => {
                warn!("Stored session rejected ({}): {}", status, message);
                self.client.set_bearer(None);
                self.store.clear()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn logout(&mut self) -> Result<(), ApiError> {
        self.cancel();
        self.store.clear()?;
        self.client.set_bearer(None);
        info!("Signed out");
        Ok(())
    }
}

impl Drop for Authenticator {
    fn drop(&mut self) {
        self.cancel();
    }
}
