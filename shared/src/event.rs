use serde::{Deserialize, Serialize};

use crate::capabilities::KvResult;
use crate::model::{Goal, NoteId, Priority, TodoFilter, TodoId, View};
use crate::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your name")]
    EmptyName,
    #[error("Please select a goal")]
    NoGoalSelected,
    #[error("Please enter a task")]
    EmptyTaskText,
    #[error("Please add a title or content")]
    EmptyNote,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Lifecycle
    /// Sent once by the shell before `AppStarted`.
    Configured(Box<AppConfig>),
    AppStarted,
    StateLoaded(Box<KvResult>),
    LegacyStateLoaded(Box<KvResult>),

    // Onboarding
    OnboardingNext,
    OnboardingBack,
    OnboardingNameChanged(String),
    GoalSelected(Goal),
    OnboardingCompleted,

    // Navigation & theme
    ViewSelected(View),
    SidebarToggled,
    SidebarClosed,
    ThemeToggled,

    // Todos
    AddTodo { text: String, priority: Priority },
    ToggleTodo { id: TodoId },
    DeleteTodoRequested { id: TodoId },
    FilterChanged(TodoFilter),

    // Notes
    NewNoteRequested,
    EditNoteRequested { id: NoteId },
    SaveNote { title: String, content: String },
    NoteEditorClosed,
    DeleteNoteRequested { id: NoteId },

    // Focus timer
    TimerToggled,
    TimerReset,
    TimerTicked,

    // Quick actions
    QuickAddTask,
    QuickAddNote,
    StartFocusSession,

    // Settings
    UserNameEdited(String),
    ResetRequested,

    // Shell responses
    ConfirmationResolved { accepted: bool },
    ToastDismissed,
    StorageWritten(Box<KvResult>),
}

impl Event {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Event::Configured(_) => "configured",
            Event::AppStarted => "app_started",
            Event::StateLoaded(_) => "state_loaded",
            Event::LegacyStateLoaded(_) => "legacy_state_loaded",
            Event::OnboardingNext => "onboarding_next",
            Event::OnboardingBack => "onboarding_back",
            Event::OnboardingNameChanged(_) => "onboarding_name_changed",
            Event::GoalSelected(_) => "goal_selected",
            Event::OnboardingCompleted => "onboarding_completed",
            Event::ViewSelected(_) => "view_selected",
            Event::SidebarToggled => "sidebar_toggled",
            Event::SidebarClosed => "sidebar_closed",
            Event::ThemeToggled => "theme_toggled",
            Event::AddTodo { .. } => "add_todo",
            Event::ToggleTodo { .. } => "toggle_todo",
            Event::DeleteTodoRequested { .. } => "delete_todo_requested",
            Event::FilterChanged(_) => "filter_changed",
            Event::NewNoteRequested => "new_note_requested",
            Event::EditNoteRequested { .. } => "edit_note_requested",
            Event::SaveNote { .. } => "save_note",
            Event::NoteEditorClosed => "note_editor_closed",
            Event::DeleteNoteRequested { .. } => "delete_note_requested",
            Event::TimerToggled => "timer_toggled",
            Event::TimerReset => "timer_reset",
            Event::TimerTicked => "timer_ticked",
            Event::QuickAddTask => "quick_add_task",
            Event::QuickAddNote => "quick_add_note",
            Event::StartFocusSession => "start_focus_session",
            Event::UserNameEdited(_) => "user_name_edited",
            Event::ResetRequested => "reset_requested",
            Event::ConfirmationResolved { .. } => "confirmation_resolved",
            Event::ToastDismissed => "toast_dismissed",
            Event::StorageWritten(_) => "storage_written",
        }
    }

    /// Events that originate from a person rather than the shell or a timer.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Event::Configured(_)
                | Event::AppStarted
                | Event::StateLoaded(_)
                | Event::LegacyStateLoaded(_)
                | Event::TimerTicked
                | Event::StorageWritten(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_match_notices() {
        assert_eq!(ValidationError::EmptyName.to_string(), "Please enter your name");
        assert_eq!(ValidationError::NoGoalSelected.to_string(), "Please select a goal");
        assert_eq!(ValidationError::EmptyNote.to_string(), "Please add a title or content");
    }

    #[test]
    fn ticks_are_not_user_actions() {
        assert!(!Event::TimerTicked.is_user_initiated());
        assert!(Event::TimerToggled.is_user_initiated());
        assert_eq!(Event::TimerTicked.name(), "timer_ticked");
    }

    #[test]
    fn event_size_is_reasonable() {
        // Ensure boxing keeps the enum small.
        let size = std::mem::size_of::<Event>();
        assert!(
            size <= 64,
            "Event enum is {} bytes; box more variants",
            size
        );
    }
}
