//! Canonical storage format: one key, the whole [`AppState`] as JSON.
//!
//! Loading shallow-merges the stored top-level fields over the defaults, so a
//! blob written by an older build that lacks a field still loads. Anything
//! that fails to parse counts as "no saved state".

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{AppState, Priority, Todo, TodoId};
use crate::UnixTimeMs;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("saved state is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Nothing stored under the key.
    Fresh,
    Restored,
    /// Something was stored but could not be read; defaults were used.
    Corrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub state: AppState,
    pub source: LoadSource,
    /// The stored `completedTasks` disagreed with the todo list and was reset.
    pub counter_repaired: bool,
}

pub fn encode(state: &AppState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(state)?)
}

/// Parses a stored blob and merges it over [`AppState::default`].
pub fn decode(raw: &str) -> Result<AppState, PersistenceError> {
    let Value::Object(stored) = serde_json::from_str::<Value>(raw)? else {
        return Err(PersistenceError::NotAnObject);
    };

    let mut merged = match serde_json::to_value(AppState::default())? {
        Value::Object(defaults) => defaults,
        _ => Map::new(),
    };
    for (key, value) in stored {
        merged.insert(key, value);
    }

    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Never fails: a missing or unreadable blob yields the first-run state.
pub fn load_or_default(raw: Option<&str>) -> LoadOutcome {
    let Some(raw) = raw else {
        return LoadOutcome {
            state: AppState::default(),
            source: LoadSource::Fresh,
            counter_repaired: false,
        };
    };

    match decode(raw) {
        Ok(mut state) => {
            let counter_repaired = state.reconcile_completed_tasks();
            if counter_repaired {
                warn!(
                    completed_tasks = state.completed_tasks,
                    "completedTasks drifted from the todo list; reconciled"
                );
            }
            LoadOutcome {
                state,
                source: LoadSource::Restored,
                counter_repaired,
            }
        }
        Err(e) => {
            warn!(error = %e, "saved state unreadable; starting from defaults");
            LoadOutcome {
                state: AppState::default(),
                source: LoadSource::Corrupt,
                counter_repaired: false,
            }
        }
    }
}

// --- Legacy formats ---

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum LegacyTodo {
    Text(String),
    Record {
        text: String,
        #[serde(default)]
        completed: bool,
    },
}

fn legacy_note_text(raw: &str) -> String {
    serde_json::from_str::<String>(raw)
        .unwrap_or_else(|_| raw.to_string())
        .trim()
        .to_string()
}

fn legacy_todo_items(raw: &str) -> Vec<(String, bool)> {
    match serde_json::from_str::<Vec<LegacyTodo>>(raw) {
        Ok(items) => items
            .into_iter()
            .map(|item| match item {
                LegacyTodo::Text(text) => (text, false),
                LegacyTodo::Record { text, completed } => (text, completed),
            })
            .collect(),
        Err(_) => raw.lines().map(|line| (line.to_string(), false)).collect(),
    }
}

/// Builds a canonical state from the older free-text note and todo-list keys.
/// Returns `None` when neither holds anything worth importing.
pub fn migrate_legacy(note: Option<&str>, todos: Option<&str>, now: UnixTimeMs) -> Option<AppState> {
    let mut state = AppState::default();

    if let Some(text) = note.map(legacy_note_text).filter(|t| !t.is_empty()) {
        // Title left blank so it becomes "Untitled".
        if let Err(e) = state.save_note(None, "", &text, now) {
            warn!(error = %e, "legacy note skipped");
        }
    }

    let items = todos.map(legacy_todo_items).unwrap_or_default();
    for (text, completed) in items {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        state.todos.push(Todo {
            id: TodoId::generate(),
            text: text.to_string(),
            completed,
            priority: Priority::Medium,
            date: now,
        });
    }
    state.reconcile_completed_tasks();

    if state.notes.is_empty() && state.todos.is_empty() {
        return None;
    }
    info!(
        notes = state.notes.len(),
        todos = state.todos.len(),
        "migrated legacy storage keys"
    );
    Some(state)
}
