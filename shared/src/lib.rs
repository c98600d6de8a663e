// lib.rs - Prodigy Hub shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod model;
pub mod onboarding;
pub mod persistence;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod timer;
pub mod view;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::{Event, ValidationError};
pub use model::{AppState, Goal, Model, Note, NoteId, Priority, Theme, Todo, TodoFilter, TodoId, User};
pub use store::AppStateStore;
pub use view::ViewModel;

pub const STORAGE_KEY: &str = "prodigyAppState";
pub const LEGACY_NOTE_KEY: &str = "notes";
pub const LEGACY_TODOS_KEY: &str = "todos";

pub const FOCUS_SESSION_SECS: u32 = 1500;
pub const FOCUS_SESSION_MINUTES: u32 = 25;
pub const BREAK_SECS: u32 = 300;
pub const TICK_INTERVAL_MS: u64 = 1000;

pub const UNTITLED: &str = "Untitled";
pub const NOTE_PREVIEW_LENGTH: usize = 150;
pub const OVERVIEW_LIMIT: usize = 5;

/// Runtime configuration. Lives in the [`Model`] but is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage_key: String,
    pub session_secs: u32,
    pub break_secs: u32,
    /// When false a completed session resets straight to idle.
    pub breaks_enabled: bool,
    pub tick_interval_ms: u64,
    pub migrate_legacy: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            session_secs: FOCUS_SESSION_SECS,
            break_secs: BREAK_SECS,
            breaks_enabled: false,
            tick_interval_ms: TICK_INTERVAL_MS,
            migrate_legacy: true,
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    #[must_use]
    pub fn with_breaks(mut self, enabled: bool) -> Self {
        self.breaks_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_legacy_migration(mut self, enabled: bool) -> Self {
        self.migrate_legacy = enabled;
        self
    }

    /// Minutes credited per completed session, rounded down.
    pub fn session_minutes(&self) -> u32 {
        self.session_secs / 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
    Deserialization,
    InvalidState,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Text for the transient notice shown to the user.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Validation | ErrorKind::NotFound => self.message.clone(),
            ErrorKind::Storage => "Unable to save data locally.".into(),
            ErrorKind::Deserialization => "Saved data could not be read. Starting fresh.".into(),
            ErrorKind::InvalidState => "That action isn't available right now.".into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        Self::new(ErrorKind::Validation, e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Explicit timestamp unit: milliseconds since the Unix epoch.
///
/// Serialized as an integer. Older saved states wrote ISO-8601 strings, so
/// deserialization accepts RFC 3339 text as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    #[must_use]
    pub fn now() -> Self {
        Self(get_current_time_ms())
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Parses an RFC 3339 timestamp such as `2024-01-01T00:00:00.000Z`.
    pub fn parse_rfc3339(text: &str) -> Result<Self, String> {
        let parsed = chrono::DateTime::parse_from_rfc3339(text.trim())
            .map_err(|e| format!("invalid timestamp '{text}': {e}"))?;
        u64::try_from(parsed.timestamp_millis())
            .map(Self)
            .map_err(|_| format!("timestamp before epoch: '{text}'"))
    }
}

impl Serialize for UnixTimeMs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Millis(u64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for UnixTimeMs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawTime::deserialize(deserializer)? {
            RawTime::Millis(ms) => Ok(Self(ms)),
            RawTime::Float(ms) if ms.is_finite() && ms >= 0.0 => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                Ok(Self(ms as u64))
            }
            RawTime::Float(ms) => Err(serde::de::Error::custom(format!(
                "invalid timestamp: {ms}"
            ))),
            RawTime::Text(text) => Self::parse_rfc3339(&text).map_err(serde::de::Error::custom),
        }
    }
}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
