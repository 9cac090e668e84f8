#![warn(missing_docs)]
//! # shellbridge-session
//!
//! ## Purpose
//! Holds the client-side authentication token and classifies unauthorized
//! failures for `shellbridge`.
//!
//! ## Responsibilities
//! - Own the single session slot keyed by [`SESSION_SLOT_KEY`].
//! - Answer "is a session present" queries for the request pipeline.
//! - Recognize the `401: ... Unauthorized` message convention.
//!
//! ## Data flow
//! Login flow -> [`SessionStore::set_token`] -> [`TokenSlot`] backend.
//! Request pipeline -> [`SessionStore::get_token`] -> authorization header.
//! Failed request -> [`SessionStore::invalidate_if_unauthorized`].
//!
//! ## Ownership and lifetimes
//! Tokens are owned `String`s copied out of the slot; nothing borrows slot
//! storage. The store is a cheap `Clone` handle over one shared slot.
//!
//! ## Error model
//! Slot write failures surface as [`SessionError`]. Read failures are logged
//! and treated as "no session".
//!
//! ## Security and privacy notes
//! Token values are never logged.
//!
//! ## Example
//! ```rust
//! use shellbridge_session::SessionStore;
//!
//! let store = SessionStore::in_memory();
//! store.set_token("abc").unwrap();
//! assert!(store.has_session());
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;
use serde_json::{Map, Value};
use shellbridge_core::NormalizedError;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fixed key of the persisted session slot.
pub const SESSION_SLOT_KEY: &str = "auth_token";

static UNAUTHORIZED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^401: .*Unauthorized").expect("static pattern compiles"));

/// Storage backend for the single session slot.
pub trait TokenSlot: Send + Sync {
    /// Reads the slot value.
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Overwrites the slot value.
    fn store(&self, token: &str) -> Result<(), SessionError>;

    /// Empties the slot.
    fn remove(&self) -> Result<(), SessionError>;
}

/// Process-scoped slot.
#[derive(Debug, Default)]
pub struct MemorySlot {
    value: RwLock<Option<String>>,
}

impl MemorySlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let value = self
            .value
            .read()
            .map_err(|_| SessionError::Storage("memory slot lock poisoned".to_string()))?;
        Ok(value.clone())
    }

    fn store(&self, token: &str) -> Result<(), SessionError> {
        let mut value = self
            .value
            .write()
            .map_err(|_| SessionError::Storage("memory slot lock poisoned".to_string()))?;
        *value = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        let mut value = self
            .value
            .write()
            .map_err(|_| SessionError::Storage("memory slot lock poisoned".to_string()))?;
        *value = None;
        Ok(())
    }
}

/// Slot persisted as a small JSON object on disk.
///
/// Only [`SESSION_SLOT_KEY`] is read or written; other keys in the file are
/// preserved.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Creates a slot backed by `path`. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> Result<Map<String, Value>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(SessionError::Storage(error.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(object)) => Ok(object),
            Ok(_) => Err(SessionError::Corrupt("expected a JSON object".to_string())),
            Err(error) => Err(SessionError::Corrupt(error.to_string())),
        }
    }

    /// Like [`FileSlot::read_object`], but an undecodable file counts as an
    /// empty object so writers can always replace it. The flag reports
    /// whether the file was discarded.
    fn read_object_for_write(&self) -> Result<(Map<String, Value>, bool), SessionError> {
        match self.read_object() {
            Ok(object) => Ok((object, false)),
            Err(SessionError::Corrupt(reason)) => {
                warn!(%reason, "session file unreadable; overwriting");
                Ok((Map::new(), true))
            }
            Err(error) => Err(error),
        }
    }

    fn write_object(&self, object: Map<String, Value>) -> Result<(), SessionError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|error| SessionError::Storage(error.to_string()))?;

        let encoded = serde_json::to_vec_pretty(&Value::Object(object))?;
        // Readers see the old file or the new one, never a partial write.
        let mut staged = NamedTempFile::new_in(parent)
            .map_err(|error| SessionError::Storage(error.to_string()))?;
        staged
            .write_all(&encoded)
            .map_err(|error| SessionError::Storage(error.to_string()))?;
        staged
            .persist(&self.path)
            .map_err(|error| SessionError::Storage(error.error.to_string()))?;
        Ok(())
    }
}

impl TokenSlot for FileSlot {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let object = self.read_object()?;
        Ok(object
            .get(SESSION_SLOT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn store(&self, token: &str) -> Result<(), SessionError> {
        let (mut object, _) = self.read_object_for_write()?;
        object.insert(SESSION_SLOT_KEY.to_string(), Value::String(token.to_string()));
        self.write_object(object)
    }

    fn remove(&self) -> Result<(), SessionError> {
        let (mut object, discarded) = self.read_object_for_write()?;
        if object.remove(SESSION_SLOT_KEY).is_none() && !discarded {
            return Ok(());
        }
        self.write_object(object)
    }
}

/// Handle over the current session slot.
///
/// Writes are last-write-wins; no coordination between writers.
#[derive(Clone)]
pub struct SessionStore {
    slot: Arc<dyn TokenSlot>,
}

impl SessionStore {
    /// Creates a store over the given slot backend.
    pub fn new(slot: Arc<dyn TokenSlot>) -> Self {
        Self { slot }
    }

    /// Creates a store over a fresh [`MemorySlot`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySlot::new()))
    }

    /// Returns the stored token. Blank tokens and read failures are absent.
    pub fn get_token(&self) -> Option<String> {
        match self.slot.load() {
            Ok(token) => token.filter(|value| !value.trim().is_empty()),
            Err(error) => {
                warn!(%error, "session slot unreadable; treating as signed out");
                None
            }
        }
    }

    /// Returns `true` iff [`SessionStore::get_token`] is present.
    pub fn has_session(&self) -> bool {
        self.get_token().is_some()
    }

    /// Stores a new token, replacing any previous one.
    ///
    /// The token is stored as given; surrounding whitespace only matters
    /// for the blank check.
    ///
    /// # Errors
    /// Returns [`SessionError::EmptyToken`] for blank input and
    /// [`SessionError::Storage`] when the slot cannot be written.
    pub fn set_token(&self, token: impl AsRef<str>) -> Result<(), SessionError> {
        let token = token.as_ref();
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        self.slot.store(token)?;
        info!("session established");
        Ok(())
    }

    /// Clears the session slot.
    ///
    /// # Errors
    /// Returns [`SessionError::Storage`] when the slot cannot be written.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.slot.remove()?;
        info!("session cleared");
        Ok(())
    }

    /// Clears the session when `error` is classified as unauthorized.
    ///
    /// Returns `true` when the session was cleared.
    pub fn invalidate_if_unauthorized(&self, error: &NormalizedError) -> bool {
        if !is_unauthorized_error(&error.to_string()) {
            return false;
        }
        debug!(status = ?error.status_code(), "unauthorized response; clearing session");
        if let Err(clear_error) = self.clear() {
            warn!(error = %clear_error, "failed to clear session after unauthorized response");
            return false;
        }
        true
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("has_session", &self.has_session())
            .finish()
    }
}

/// Returns `true` when `message` follows the `401: ... Unauthorized`
/// convention.
pub fn is_unauthorized_error(message: &str) -> bool {
    UNAUTHORIZED_PATTERN.is_match(message)
}

/// Errors produced by session slot operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Token was blank.
    #[error("session token must be non-empty")]
    EmptyToken,
    /// Slot backend failure.
    #[error("session storage failure: {0}")]
    Storage(String),
    /// Persisted slot contents could not be decoded.
    #[error("session file is corrupt: {0}")]
    Corrupt(String),
    /// Slot contents could not be encoded.
    #[error("session slot codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
