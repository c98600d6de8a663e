use tracing::{debug, error, info, warn};

use crate::capabilities::{Capabilities, KvOutput, KvResult};
use crate::event::Event;
use crate::model::{Confirmation, Model, NoteEditor, NoteSaved, View};
use crate::onboarding::{OnboardingError, OnboardingWizard};
use crate::persistence::{self, LoadSource};
use crate::timer::{TickOutcome, TimerStatus};
use crate::view::ViewModel;
use crate::{AppError, ErrorKind, LEGACY_NOTE_KEY, LEGACY_TODOS_KEY};

#[derive(Default)]
pub struct App;

fn written(result: KvResult) -> Event {
    Event::StorageWritten(Box::new(result))
}

impl App {
    fn persist(model: &Model, caps: &Capabilities) {
        match persistence::encode(&model.state) {
            Ok(serialized) => {
                debug!(bytes = serialized.len(), "persisting app state");
                caps.kv.set(model.config.storage_key.clone(), serialized, written);
            }
            Err(e) => error!(error = %e, "failed to serialize app state"),
        }
    }

    fn notify_error(model: &mut Model, err: impl Into<AppError>) {
        let err = err.into();
        debug!(code = err.code(), message = %err.message, "rejected");
        model.set_toast(err.user_facing_message());
    }

    fn notify_onboarding_error(model: &mut Model, err: OnboardingError) {
        match err {
            OnboardingError::Validation(e) => Self::notify_error(model, e),
            other => debug!(error = %other, "onboarding transition ignored"),
        }
    }

    fn finish_loading(model: &mut Model) {
        model.onboarding = OnboardingWizard::default();
        model.is_loaded = true;
        info!(
            onboarded = model.state.user.onboarded,
            notes = model.state.notes.len(),
            todos = model.state.todos.len(),
            "app state loaded"
        );
    }

    fn handle_state_loaded(result: KvResult, model: &mut Model, caps: &Capabilities) {
        match result {
            Ok(KvOutput::Value(Some(raw))) => {
                let outcome = persistence::load_or_default(Some(&raw));
                model.state = outcome.state;
                if outcome.source == LoadSource::Restored && outcome.counter_repaired {
                    Self::persist(model, caps);
                }
            }
            Ok(KvOutput::Value(None)) if model.config.migrate_legacy => {
                caps.kv.get_many(
                    vec![LEGACY_NOTE_KEY.to_string(), LEGACY_TODOS_KEY.to_string()],
                    |r| Event::LegacyStateLoaded(Box::new(r)),
                );
                return;
            }
            Ok(KvOutput::Value(None)) => {
                model.state = persistence::load_or_default(None).state;
            }
            Ok(other) => {
                warn!(output = ?other, "unexpected storage output on load; using defaults");
                model.state = persistence::load_or_default(None).state;
            }
            Err(e) => {
                error!(error = %e, "failed to read saved state; using defaults");
                model.state = persistence::load_or_default(None).state;
            }
        }
        Self::finish_loading(model);
    }

    fn handle_legacy_loaded(result: KvResult, model: &mut Model, caps: &Capabilities) {
        model.state = persistence::load_or_default(None).state;

        match result {
            Ok(KvOutput::Values(values)) => {
                let note = values.first().and_then(Option::as_deref);
                let todos = values.get(1).and_then(Option::as_deref);
                if let Some(state) = persistence::migrate_legacy(note, todos, model.now) {
                    model.state = state;
                    Self::persist(model, caps);
                    caps.kv.delete(LEGACY_NOTE_KEY, written);
                    caps.kv.delete(LEGACY_TODOS_KEY, written);
                }
            }
            Ok(other) => warn!(output = ?other, "unexpected storage output for legacy keys"),
            Err(e) => warn!(error = %e, "failed to read legacy keys"),
        }
        Self::finish_loading(model);
    }

    fn handle_confirmation(accepted: bool, model: &mut Model, caps: &Capabilities) {
        let Some(pending) = model.pending_confirmation.take() else {
            debug!("confirmation resolved with nothing pending");
            return;
        };
        if !accepted {
            debug!(prompt = pending.prompt(), "confirmation declined");
            return;
        }

        match pending {
            Confirmation::DeleteNote(id) => {
                if model.state.delete_note(&id).is_some() {
                    if model
                        .note_editor
                        .as_ref()
                        .is_some_and(|e| e.editing.as_ref() == Some(&id))
                    {
                        model.note_editor = None;
                    }
                    debug!(%id, "note deleted");
                    Self::persist(model, caps);
                    model.set_toast("Note deleted");
                }
            }
            Confirmation::DeleteTodo(id) => {
                if model.state.delete_todo(&id).is_some() {
                    debug!(%id, "todo deleted");
                    Self::persist(model, caps);
                    model.set_toast("Task deleted");
                }
            }
            Confirmation::ResetAll => {
                model.pending_confirmation = Some(Confirmation::ResetAllFinal);
            }
            Confirmation::ResetAllFinal => {
                info!("resetting all data");
                caps.timer.cancel();
                caps.kv.clear(written);
                model.reset();
            }
        }
    }

    fn handle_save_note(title: String, content: String, model: &mut Model, caps: &Capabilities) {
        let editing = model.note_editor.as_ref().and_then(|e| e.editing.clone());

        match model.state.save_note(editing.as_ref(), &title, &content, model.now) {
            Ok(NoteSaved::Created(id)) => {
                debug!(%id, "note created");
                model.note_editor = None;
                Self::persist(model, caps);
                model.set_toast("Note created!");
            }
            Ok(NoteSaved::Updated(id)) => {
                debug!(%id, "note updated");
                model.note_editor = None;
                Self::persist(model, caps);
                model.set_toast("Note updated!");
            }
            Ok(NoteSaved::Missing) => {
                warn!("note being edited no longer exists");
                model.note_editor = None;
            }
            Err(e) => {
                let editor = model.note_editor.get_or_insert_with(NoteEditor::default);
                editor.title = title;
                editor.content = content;
                Self::notify_error(model, e);
            }
        }
    }

    fn start_timer(model: &mut Model, caps: &Capabilities) {
        match model.timer.start() {
            Ok(()) => {
                caps.timer.start(model.config.tick_interval_ms);
                model.set_toast("Timer started!");
            }
            Err(e) => debug!(error = %e, "timer start ignored"),
        }
    }

    fn handle_tick(model: &mut Model, caps: &Capabilities) -> bool {
        match model.timer.tick() {
            TickOutcome::Ignored => {
                // A tick raced a pause or reset; make sure the shell stops.
                debug!("stale tick");
                caps.timer.cancel();
                false
            }
            TickOutcome::Counting { .. } => true,
            TickOutcome::SessionCompleted => {
                let minutes = model.config.session_minutes();
                model.state.record_focus_session(minutes);
                info!(
                    sessions = model.state.focus_sessions,
                    total_minutes = model.state.total_focus_minutes,
                    "focus session completed"
                );
                if !model.timer.is_running() {
                    caps.timer.cancel();
                }
                Self::persist(model, caps);
                model.set_toast("Focus session complete! 🎉 Great work!");
                true
            }
            TickOutcome::BreakCompleted => {
                info!("break completed");
                caps.timer.cancel();
                true
            }
        }
    }

}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        model.update_timestamp();

        let event_name = event.name();
        if event.is_user_initiated() {
            debug!(event = event_name, "user action");
        }

        let onboarding_event = matches!(
            event,
            Event::OnboardingNext
                | Event::OnboardingBack
                | Event::OnboardingNameChanged(_)
                | Event::GoalSelected(_)
                | Event::OnboardingCompleted
        );
        if onboarding_event && model.state.user.onboarded {
            debug!(event = event_name, "already onboarded; ignored");
            return;
        }

        match event {
            Event::Configured(config) => {
                debug!(storage_key = %config.storage_key, breaks = config.breaks_enabled, "configured");
                model.apply_config(*config);
            }

            Event::AppStarted => {
                caps.kv
                    .get(model.config.storage_key.clone(), |r| Event::StateLoaded(Box::new(r)));
                return;
            }

            Event::StateLoaded(result) => Self::handle_state_loaded(*result, model, caps),

            Event::LegacyStateLoaded(result) => Self::handle_legacy_loaded(*result, model, caps),

            // --- Onboarding ---
            Event::OnboardingNext => {
                if let Err(e) = model.onboarding.next() {
                    Self::notify_onboarding_error(model, e);
                }
            }

            Event::OnboardingBack => {
                if let Err(e) = model.onboarding.back() {
                    Self::notify_onboarding_error(model, e);
                }
            }

            Event::OnboardingNameChanged(name) => model.onboarding.set_name(name),

            Event::GoalSelected(goal) => model.onboarding.select_goal(goal),

            Event::OnboardingCompleted => match model.onboarding.complete() {
                Ok((name, goal)) => match model.state.complete_onboarding(&name, goal) {
                    Ok(()) => {
                        info!(goal = ?model.state.user.goal, "onboarding completed");
                        model.active_view = View::Dashboard;
                        Self::persist(model, caps);
                    }
                    Err(e) => Self::notify_error(model, e),
                },
                Err(e) => Self::notify_onboarding_error(model, e),
            },

            // --- Navigation & theme ---
            Event::ViewSelected(view) => {
                model.active_view = view;
                model.sidebar_open = false;
            }

            Event::SidebarToggled => model.sidebar_open = !model.sidebar_open,

            Event::SidebarClosed => model.sidebar_open = false,

            Event::ThemeToggled => {
                let theme = model.state.toggle_theme();
                debug!(?theme, "theme toggled");
                Self::persist(model, caps);
            }

            // --- Todos ---
            Event::AddTodo { text, priority } => {
                match model.state.add_todo(&text, priority, model.now) {
                    Ok(id) => {
                        debug!(%id, priority = priority.as_str(), "todo added");
                        Self::persist(model, caps);
                        model.set_toast("Task added!");
                    }
                    Err(e) => Self::notify_error(model, e),
                }
            }

            Event::ToggleTodo { id } => match model.state.toggle_todo(&id) {
                Some(completed) => {
                    debug!(%id, completed, "todo toggled");
                    Self::persist(model, caps);
                    if completed {
                        model.set_toast("Task completed! 🎉");
                    }
                }
                None => {
                    debug!(%id, "toggle for unknown todo");
                    return;
                }
            },

            Event::DeleteTodoRequested { id } => {
                if model.state.find_todo(&id).is_none() {
                    debug!(%id, "delete for unknown todo");
                    return;
                }
                model.pending_confirmation = Some(Confirmation::DeleteTodo(id));
            }

            Event::FilterChanged(filter) => model.state.current_filter = filter,

            // --- Notes ---
            Event::NewNoteRequested => model.note_editor = Some(NoteEditor::default()),

            Event::EditNoteRequested { id } => {
                let Some(note) = model.state.find_note(&id) else {
                    debug!(%id, "edit for unknown note");
                    return;
                };
                model.note_editor = Some(NoteEditor {
                    editing: Some(id.clone()),
                    title: note.title.clone(),
                    content: note.content.clone(),
                });
            }

            Event::SaveNote { title, content } => Self::handle_save_note(title, content, model, caps),

            Event::NoteEditorClosed => model.note_editor = None,

            Event::DeleteNoteRequested { id } => {
                if model.state.find_note(&id).is_none() {
                    debug!(%id, "delete for unknown note");
                    return;
                }
                model.pending_confirmation = Some(Confirmation::DeleteNote(id));
            }

            // --- Focus timer ---
            Event::TimerToggled => match model.timer.toggle() {
                TimerStatus::Running => {
                    debug!(remaining_secs = model.timer.remaining_secs(), "timer started");
                    caps.timer.start(model.config.tick_interval_ms);
                    model.set_toast("Timer started!");
                }
                TimerStatus::Paused | TimerStatus::Idle => {
                    debug!(remaining_secs = model.timer.remaining_secs(), "timer paused");
                    caps.timer.cancel();
                    model.set_toast("Timer paused");
                }
            },

            Event::TimerReset => {
                debug!("timer reset");
                model.timer.reset();
                caps.timer.cancel();
                model.set_toast("Timer reset");
            }

            Event::TimerTicked => {
                if !Self::handle_tick(model, caps) {
                    return;
                }
            }

            // --- Quick actions ---
            Event::QuickAddTask => {
                model.active_view = View::Todo;
                model.sidebar_open = false;
            }

            Event::QuickAddNote => {
                model.active_view = View::Notes;
                model.sidebar_open = false;
                model.note_editor = Some(NoteEditor::default());
            }

            Event::StartFocusSession => {
                model.active_view = View::Focus;
                model.sidebar_open = false;
                if !model.timer.is_running() {
                    Self::start_timer(model, caps);
                }
            }

            // --- Settings ---
            Event::UserNameEdited(name) => match model.state.rename_user(&name) {
                Ok(()) => {
                    Self::persist(model, caps);
                    model.set_toast("Name updated!");
                }
                Err(e) => {
                    debug!(error = %e, "name edit ignored");
                    return;
                }
            },

            Event::ResetRequested => model.pending_confirmation = Some(Confirmation::ResetAll),

            // --- Shell responses ---
            Event::ConfirmationResolved { accepted } => {
                Self::handle_confirmation(accepted, model, caps);
            }

            Event::ToastDismissed => model.active_toast = None,

            Event::StorageWritten(result) => match *result {
                Ok(output) => {
                    debug!(?output, "storage write acknowledged");
                    return;
                }
                Err(e) => {
                    error!(error = %e, "storage write failed");
                    Self::notify_error(model, AppError::new(ErrorKind::Storage, e.to_string()));
                }
            },
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::build(model)
    }
}
