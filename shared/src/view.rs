//! Read-side projection of the [`Model`] for the view layer.

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::model::{Goal, Model, NoteId, Priority, Theme, TodoFilter, TodoId, View};
use crate::onboarding::OnboardingStep;
use crate::timer::{TimerSegment, TimerStatus};
use crate::{NOTE_PREVIEW_LENGTH, OVERVIEW_LIMIT};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Screen {
    Onboarding(OnboardingView),
    Main,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OnboardingView {
    pub step: OnboardingStep,
    pub step_number: u8,
    pub progress_percent: u8,
    pub name: String,
    pub selected_goal: Option<Goal>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct HeaderView {
    pub greeting: String,
    pub date_text: String,
    pub avatar: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OverviewList {
    pub items: Vec<String>,
    /// Shown instead of the list when it is empty.
    pub placeholder: Option<String>,
}

impl OverviewList {
    fn new(items: Vec<String>, placeholder: &str) -> Self {
        let placeholder = items.is_empty().then(|| placeholder.to_string());
        Self { items, placeholder }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DashboardView {
    pub completed_count: usize,
    pub notes_count: usize,
    pub focus_sessions: u32,
    pub active_todos: OverviewList,
    pub recent_notes: OverviewList,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgesView {
    pub notes: usize,
    pub active_todos: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NoteCardView {
    pub id: NoteId,
    pub title: String,
    pub preview: String,
    pub date_ms: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NoteEditorView {
    pub heading: String,
    pub title: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TodoItemView {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TimerView {
    pub status: TimerStatus,
    pub display: String,
    pub progress: f32,
    pub button_label: String,
    pub label: String,
    pub sessions: u32,
    pub total_minutes: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    /// False until the saved state has been read; shells show a splash.
    pub loaded: bool,
    pub screen: Screen,
    pub theme: Theme,
    pub active_view: View,
    pub sidebar_open: bool,
    pub header: HeaderView,
    pub dashboard: DashboardView,
    pub badges: BadgesView,
    pub notes: Vec<NoteCardView>,
    pub note_editor: Option<NoteEditorView>,
    pub todo_filter: TodoFilter,
    pub todos: Vec<TodoItemView>,
    pub timer: TimerView,
    pub settings_user_name: String,
    pub toast: Option<String>,
    pub confirmation: Option<String>,
}

impl ViewModel {
    pub fn build(model: &Model) -> Self {
        let state = &model.state;

        let screen = if state.user.onboarded {
            Screen::Main
        } else {
            let wizard = &model.onboarding;
            Screen::Onboarding(OnboardingView {
                step: wizard.step(),
                step_number: wizard.step().number(),
                progress_percent: wizard.progress_percent(),
                name: wizard.name().to_string(),
                selected_goal: wizard.selected_goal().cloned(),
            })
        };

        let dashboard = DashboardView {
            completed_count: state.completed_count(),
            notes_count: state.notes.len(),
            focus_sessions: state.focus_sessions,
            active_todos: OverviewList::new(
                state
                    .filtered_todos(TodoFilter::Active)
                    .take(OVERVIEW_LIMIT)
                    .map(|t| t.text.clone())
                    .collect(),
                "No active tasks",
            ),
            recent_notes: OverviewList::new(
                state
                    .notes
                    .iter()
                    .take(OVERVIEW_LIMIT)
                    .map(|n| n.display_title().to_string())
                    .collect(),
                "No notes yet",
            ),
        };

        let notes = state
            .notes
            .iter()
            .map(|n| NoteCardView {
                id: n.id.clone(),
                title: n.display_title().to_string(),
                preview: truncate_preview(&n.content, NOTE_PREVIEW_LENGTH),
                date_ms: n.date.as_millis(),
            })
            .collect();

        let note_editor = model.note_editor.as_ref().map(|editor| NoteEditorView {
            heading: if editor.editing.is_some() {
                "Edit Note".to_string()
            } else {
                "New Note".to_string()
            },
            title: editor.title.clone(),
            content: editor.content.clone(),
        });

        let todos = state
            .filtered_todos(state.current_filter)
            .map(|t| TodoItemView {
                id: t.id.clone(),
                text: t.text.clone(),
                completed: t.completed,
                priority: t.priority,
            })
            .collect();

        Self {
            loaded: model.is_loaded,
            screen,
            theme: state.theme,
            active_view: model.active_view,
            sidebar_open: model.sidebar_open,
            header: header_view(&state.user.name, model.now.as_millis()),
            dashboard,
            badges: BadgesView {
                notes: state.notes.len(),
                active_todos: state.active_count(),
            },
            notes,
            note_editor,
            todo_filter: state.current_filter,
            todos,
            timer: timer_view(model),
            settings_user_name: state.user.name.clone(),
            toast: model.active_toast.clone(),
            confirmation: model
                .pending_confirmation
                .as_ref()
                .map(|c| c.prompt().to_string()),
        }
    }
}

fn timer_view(model: &Model) -> TimerView {
    let timer = &model.timer;
    let button_label = match timer.status() {
        TimerStatus::Idle => "Start Focus",
        TimerStatus::Running => "Pause",
        TimerStatus::Paused => "Resume",
    };
    let label = match timer.segment() {
        TimerSegment::Focus => "Focus Time",
        TimerSegment::Break => "Break Time",
    };
    TimerView {
        status: timer.status(),
        display: timer.display(),
        progress: timer.progress(),
        button_label: button_label.to_string(),
        label: label.to_string(),
        sessions: model.state.focus_sessions,
        total_minutes: model.state.total_focus_minutes,
    }
}

fn header_view(name: &str, now_ms: u64) -> HeaderView {
    let local = i64::try_from(now_ms)
        .ok()
        .and_then(|ms| chrono::Local.timestamp_millis_opt(ms).single());

    let (greeting, date_text) = match local {
        Some(dt) => (greeting_for_hour(dt.hour()), long_date(&dt)),
        None => (greeting_for_hour(0), String::new()),
    };

    HeaderView {
        greeting: format!("{greeting}, {name}"),
        date_text,
        avatar: avatar_initial(name),
    }
}

pub fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        12..=17 => "Good Afternoon",
        18.. => "Good Evening",
        _ => "Good Morning",
    }
}

/// For example "Wednesday, October 14, 2026".
pub fn long_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%A, %B %-d, %Y").to_string()
}

pub fn avatar_initial(name: &str) -> String {
    name.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
}

/// First `max` characters, with "..." when anything was cut.
pub fn truncate_preview(content: &str, max: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Cosmetic count-up for dashboard numbers. Yields one value per frame and
/// always ends exactly on the target.
#[derive(Debug, Clone)]
pub struct CounterAnimation {
    from: i64,
    to: i64,
    frames: u32,
    frame: u32,
}

impl CounterAnimation {
    pub fn new(from: u32, to: u32, frames: u32) -> Self {
        Self {
            from: i64::from(from),
            to: i64::from(to),
            frames: frames.max(1),
            frame: 0,
        }
    }
}

impl Iterator for CounterAnimation {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.frame >= self.frames {
            return None;
        }
        self.frame += 1;
        let delta = (self.to - self.from) * i64::from(self.frame) / i64::from(self.frames);
        u32::try_from(self.from + delta).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Confirmation, NoteEditor, Priority};
    use crate::UnixTimeMs;
    use chrono::Utc;

    #[test]
    fn greeting_boundaries() {
        assert_eq!(greeting_for_hour(0), "Good Morning");
        assert_eq!(greeting_for_hour(11), "Good Morning");
        assert_eq!(greeting_for_hour(12), "Good Afternoon");
        assert_eq!(greeting_for_hour(17), "Good Afternoon");
        assert_eq!(greeting_for_hour(18), "Good Evening");
        assert_eq!(greeting_for_hour(23), "Good Evening");
    }

    #[test]
    fn long_date_format() {
        let dt = Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap();
        assert_eq!(long_date(&dt), "Wednesday, October 14, 2026");
    }

    #[test]
    fn avatar_is_uppercased_first_char() {
        assert_eq!(avatar_initial("alex"), "A");
        assert_eq!(avatar_initial(""), "");
    }

    #[test]
    fn preview_truncation() {
        assert_eq!(truncate_preview("short", 150), "short");
        let long = "x".repeat(151);
        let preview = truncate_preview(&long, 150);
        assert_eq!(preview.len(), 153);
        assert!(preview.ends_with("..."));
        assert_eq!(truncate_preview(&"y".repeat(150), 150).len(), 150);
    }

    #[test]
    fn counter_animation_lands_on_target() {
        let values: Vec<u32> = CounterAnimation::new(0, 10, 4).collect();
        assert_eq!(values, vec![2, 5, 7, 10]);
        let down: Vec<u32> = CounterAnimation::new(5, 1, 2).collect();
        assert_eq!(down, vec![3, 1]);
        assert_eq!(CounterAnimation::new(3, 3, 0).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn first_run_shows_onboarding() {
        let vm = ViewModel::build(&Model::new());
        let Screen::Onboarding(onboarding) = vm.screen else {
            panic!("expected onboarding");
        };
        assert_eq!(onboarding.step_number, 1);
        assert_eq!(vm.dashboard.active_todos.placeholder.as_deref(), Some("No active tasks"));
        assert_eq!(vm.dashboard.recent_notes.placeholder.as_deref(), Some("No notes yet"));
        assert_eq!(vm.timer.display, "25:00");
        assert_eq!(vm.timer.button_label, "Start Focus");
        assert_eq!(vm.timer.label, "Focus Time");
    }

    #[test]
    fn main_screen_projection() {
        let mut model = Model::new();
        model.state.complete_onboarding("sam", Goal::Health).unwrap();
        let now = UnixTimeMs(1_000);
        for i in 0..7 {
            model.state.add_todo(&format!("task {i}"), Priority::Low, now).unwrap();
        }
        let first = model.state.todos[0].id.clone();
        model.state.toggle_todo(&first);
        model.state.save_note(None, "", "body", now).unwrap();
        model.state.current_filter = TodoFilter::Completed;
        model.note_editor = Some(NoteEditor::default());
        model.pending_confirmation = Some(Confirmation::ResetAll);

        let vm = ViewModel::build(&model);
        assert_eq!(vm.screen, Screen::Main);
        assert_eq!(vm.header.greeting.split(", ").nth(1), Some("sam"));
        assert_eq!(vm.header.avatar, "S");
        assert_eq!(vm.dashboard.completed_count, 1);
        assert_eq!(vm.dashboard.active_todos.items.len(), 5);
        assert_eq!(vm.dashboard.active_todos.items[0], "task 5");
        assert_eq!(vm.dashboard.recent_notes.items, vec!["Untitled"]);
        assert_eq!(vm.badges, BadgesView { notes: 1, active_todos: 6 });
        assert_eq!(vm.todos.len(), 1);
        assert_eq!(vm.todos[0].text, "task 6");
        assert_eq!(vm.note_editor.unwrap().heading, "New Note");
        assert_eq!(
            vm.confirmation.as_deref(),
            Some("Are you sure you want to reset all data? This cannot be undone.")
        );
    }
}
