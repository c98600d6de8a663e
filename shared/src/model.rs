use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::event::ValidationError;
use crate::onboarding::OnboardingWizard;
use crate::timer::FocusTimer;
use crate::{AppConfig, UnixTimeMs, UNTITLED};

// --- Typed IDs ---

/// Wire form of an id. Older revisions used `Date.now()` integers.
#[doc(hidden)]
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Int(i64),
    Float(f64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            #[allow(clippy::cast_possible_truncation)]
            RawId::Float(f) if f.fract() == 0.0 && f.is_finite() => (f as i64).to_string(),
            RawId::Float(f) => f.to_string(),
        }
    }
}

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
        #[serde(from = "RawId")]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<RawId> for $name {
            fn from(raw: RawId) -> Self {
                Self(raw.into_string())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(NoteId);
typed_id!(TodoId);

// --- Domain enums replacing stringly-typed fields ---

/// Goals travel as their lowercase tag. Tags we don't know are kept verbatim so
/// a newer shell's choice survives a save.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Goal {
    Career,
    Health,
    Learning,
    Personal,
    Creativity,
    Other(String),
}

impl Goal {
    pub const ALL: [Goal; 5] = [
        Goal::Career,
        Goal::Health,
        Goal::Learning,
        Goal::Personal,
        Goal::Creativity,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Goal::Career => "career",
            Goal::Health => "health",
            Goal::Learning => "learning",
            Goal::Personal => "personal",
            Goal::Creativity => "creativity",
            Goal::Other(tag) => tag,
        }
    }

    /// `None` for a blank tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        let known = Self::ALL.into_iter().find(|g| g.as_str() == tag);
        Some(known.unwrap_or_else(|| Goal::Other(tag.to_string())))
    }
}

impl From<String> for Goal {
    fn from(tag: String) -> Self {
        Goal::from_tag(&tag).unwrap_or(Goal::Other(tag))
    }
}

impl From<Goal> for String {
    fn from(goal: Goal) -> Self {
        match goal {
            Goal::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// `user.goal` is written as a plain tag; `""` means nothing chosen yet.
mod goal_tag {
    use super::Goal;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(goal: &Option<Goal>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(goal.as_ref().map_or("", Goal::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Goal>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(Goal::from_tag))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Active => !todo.completed,
            TodoFilter::Completed => todo.completed,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Main-app sections. Exactly one is active at a time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Notes,
    Todo,
    Focus,
    Settings,
}

// --- Persisted records ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct User {
    pub name: String,
    #[serde(with = "goal_tag")]
    pub goal: Option<Goal>,
    pub onboarded: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub date: UnixTimeMs,
}

impl Note {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    pub date: UnixTimeMs,
}

/// Outcome of [`AppState::save_note`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteSaved {
    Created(NoteId),
    Updated(NoteId),
    /// The note being edited was deleted in the meantime; nothing changed.
    Missing,
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}

/// The single serializable record holding all user data and preferences.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub user: User,
    pub notes: Vec<Note>,
    pub todos: Vec<Todo>,
    #[serde(deserialize_with = "lenient_count")]
    pub completed_tasks: u32,
    pub focus_sessions: u32,
    pub total_focus_minutes: u32,
    pub current_filter: TodoFilter,
    pub theme: Theme,
}

impl AppState {
    // --- Todos ---

    /// Adds a todo at the front of the list.
    pub fn add_todo(
        &mut self,
        text: &str,
        priority: Priority,
        now: UnixTimeMs,
    ) -> Result<TodoId, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyTaskText);
        }
        let id = self.fresh_todo_id();
        self.todos.insert(
            0,
            Todo {
                id: id.clone(),
                text: text.to_string(),
                completed: false,
                priority,
                date: now,
            },
        );
        Ok(id)
    }

    /// Flips `completed` and moves the counter with it. Returns the new flag,
    /// or `None` when no todo has that id.
    pub fn toggle_todo(&mut self, id: &TodoId) -> Option<bool> {
        let todo = self.todos.iter_mut().find(|t| &t.id == id)?;
        todo.completed = !todo.completed;
        if todo.completed {
            self.completed_tasks = self.completed_tasks.saturating_add(1);
        } else {
            self.completed_tasks = self.completed_tasks.saturating_sub(1);
        }
        Some(todo.completed)
    }

    /// Removes a todo; a completed one takes its count with it.
    pub fn delete_todo(&mut self, id: &TodoId) -> Option<Todo> {
        let index = self.todos.iter().position(|t| &t.id == id)?;
        let removed = self.todos.remove(index);
        if removed.completed {
            self.completed_tasks = self.completed_tasks.saturating_sub(1);
        }
        Some(removed)
    }

    pub fn filtered_todos(&self, filter: TodoFilter) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(move |t| filter.matches(t))
    }

    pub fn find_todo(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    /// Derived from the todo list; this is what the dashboard shows.
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    pub fn active_count(&self) -> usize {
        self.todos.len() - self.completed_count()
    }

    /// Resets `completed_tasks` to the derived count. Returns true if it had drifted.
    pub fn reconcile_completed_tasks(&mut self) -> bool {
        let derived = u32::try_from(self.completed_count()).unwrap_or(u32::MAX);
        if derived == self.completed_tasks {
            return false;
        }
        self.completed_tasks = derived;
        true
    }

    fn fresh_todo_id(&self) -> TodoId {
        loop {
            let id = TodoId::generate();
            if self.find_todo(&id).is_none() {
                return id;
            }
        }
    }

    // --- Notes ---

    /// Creates a note (most recent first) or overwrites the one being edited.
    pub fn save_note(
        &mut self,
        editing: Option<&NoteId>,
        title: &str,
        content: &str,
        now: UnixTimeMs,
    ) -> Result<NoteSaved, ValidationError> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() && content.is_empty() {
            return Err(ValidationError::EmptyNote);
        }

        if let Some(id) = editing {
            let Some(note) = self.notes.iter_mut().find(|n| &n.id == id) else {
                return Ok(NoteSaved::Missing);
            };
            note.title = title.to_string();
            note.content = content.to_string();
            note.date = now;
            return Ok(NoteSaved::Updated(id.clone()));
        }

        let id = self.fresh_note_id();
        let title = if title.is_empty() { UNTITLED } else { title };
        self.notes.insert(
            0,
            Note {
                id: id.clone(),
                title: title.to_string(),
                content: content.to_string(),
                date: now,
            },
        );
        Ok(NoteSaved::Created(id))
    }

    pub fn delete_note(&mut self, id: &NoteId) -> Option<Note> {
        let index = self.notes.iter().position(|n| &n.id == id)?;
        Some(self.notes.remove(index))
    }

    pub fn find_note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }

    fn fresh_note_id(&self) -> NoteId {
        loop {
            let id = NoteId::generate();
            if self.find_note(&id).is_none() {
                return id;
            }
        }
    }

    // --- Focus, theme, user ---

    pub fn record_focus_session(&mut self, minutes: u32) {
        self.focus_sessions = self.focus_sessions.saturating_add(1);
        self.total_focus_minutes = self.total_focus_minutes.saturating_add(minutes);
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn rename_user(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.user.name = name.to_string();
        Ok(())
    }

    /// Commits the whole onboarding result in one step.
    pub fn complete_onboarding(&mut self, name: &str, goal: Goal) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.user = User {
            name: name.to_string(),
            goal: Some(goal),
            onboarded: true,
        };
        Ok(())
    }
}

// --- Runtime-only state ---

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NoteEditor {
    /// `None` while composing a new note.
    pub editing: Option<NoteId>,
    pub title: String,
    pub content: String,
}

/// A destructive action waiting on the user's answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Confirmation {
    DeleteNote(NoteId),
    DeleteTodo(TodoId),
    ResetAll,
    /// Second prompt of the two-step reset.
    ResetAllFinal,
}

impl Confirmation {
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Confirmation::DeleteNote(_) => "Delete this note?",
            Confirmation::DeleteTodo(_) => "Delete this task?",
            Confirmation::ResetAll => {
                "Are you sure you want to reset all data? This cannot be undone."
            }
            Confirmation::ResetAllFinal => "Really? This will delete everything!",
        }
    }
}

/// In-memory model. Only `state` is persisted; everything else resets on load.
#[derive(Clone, Debug)]
pub struct Model {
    pub state: AppState,
    pub config: AppConfig,

    pub onboarding: OnboardingWizard,
    pub timer: FocusTimer,
    pub note_editor: Option<NoteEditor>,
    pub pending_confirmation: Option<Confirmation>,

    pub active_view: View,
    pub sidebar_open: bool,
    pub active_toast: Option<String>,

    /// Stamped at the start of every update.
    pub now: UnixTimeMs,
    pub is_loaded: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        let timer = FocusTimer::new(config.session_secs, config.break_secs)
            .with_breaks(config.breaks_enabled);
        Self {
            state: AppState::default(),
            config,
            onboarding: OnboardingWizard::default(),
            timer,
            note_editor: None,
            pending_confirmation: None,
            active_view: View::Dashboard,
            sidebar_open: false,
            active_toast: None,
            now: UnixTimeMs::default(),
            is_loaded: false,
        }
    }

    pub fn update_timestamp(&mut self) {
        self.now = UnixTimeMs::now();
    }

    pub fn set_toast(&mut self, message: impl Into<String>) {
        self.active_toast = Some(message.into());
    }

    /// Swaps in a new configuration and rebuilds the timer from it.
    pub fn apply_config(&mut self, config: AppConfig) {
        self.timer = FocusTimer::new(config.session_secs, config.break_secs)
            .with_breaks(config.breaks_enabled);
        self.config = config;
    }

    /// Back to a first-run model, keeping only the configuration.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
        self.is_loaded = true;
    }
}
