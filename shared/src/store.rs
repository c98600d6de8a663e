//! Synchronous shell around the crux [`Core`].
//!
//! Key-value requests run immediately against the backing [`KvStorage`] and
//! are resolved until the core settles. Renders notify subscribers; timer
//! requests are handed back to the caller, which owns the tick source.

use std::collections::VecDeque;

use crux_core::Core;
use tracing::{instrument, trace, warn};

use crate::app::App;
use crate::capabilities::{Capabilities, execute, Effect, KvStorage, TimerOperation};
use crate::event::Event;
use crate::model::AppState;
use crate::persistence;
use crate::view::ViewModel;
use crate::AppConfig;

type Subscriber = Box<dyn Fn(&ViewModel)>;

/// What a dispatch left for the shell to act on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settled {
    pub rendered: bool,
    pub timer: Vec<TimerOperation>,
}

pub struct AppStateStore<S: KvStorage> {
    core: Core<Effect, App>,
    storage: S,
    storage_key: String,
    subscribers: Vec<Subscriber>,
}

impl<S: KvStorage> AppStateStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, AppConfig::default())
    }

    pub fn with_config(storage: S, config: AppConfig) -> Self {
        let mut store = Self {
            core: Core::new::<Capabilities>(),
            storage,
            storage_key: config.storage_key.clone(),
            subscribers: Vec::new(),
        };
        store.dispatch(Event::Configured(Box::new(config)));
        store
    }

    /// Reads saved state (or migrates legacy keys) and renders.
    pub fn load(&mut self) -> Settled {
        self.dispatch(Event::AppStarted)
    }

    /// Runs `event` and resolves every storage request it leads to.
    /// Multiple render requests collapse into one.
    #[instrument(skip_all, fields(event = event.name()))]
    pub fn dispatch(&mut self, event: Event) -> Settled {
        let mut pending: VecDeque<Effect> = self.core.process_event(event).into();
        let mut settled = Settled::default();

        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::KeyValue(mut request) => {
                    let result = execute(&mut self.storage, &request.operation);
                    trace!(operation = ?request.operation, ok = result.is_ok(), "kv executed");
                    pending.extend(self.core.resolve(&mut request, result));
                }
                Effect::Render(_) => settled.rendered = true,
                Effect::Timer(request) => settled.timer.push(request.operation),
            }
        }

        if settled.rendered {
            let view = self.view();
            for subscriber in &self.subscribers {
                subscriber(&view);
            }
        }
        settled
    }

    pub fn subscribe(&mut self, callback: impl Fn(&ViewModel) + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    pub fn view(&self) -> ViewModel {
        self.core.view()
    }

    /// The state as it currently sits in storage, decoded.
    pub fn saved_state(&self) -> Option<AppState> {
        let raw = match self.storage.get(&self.storage_key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "saved state unreadable");
                return None;
            }
        };
        match persistence::decode(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "saved state does not decode");
                None
            }
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::MemoryStorage;
    use crate::model::{Goal, Priority, Theme};
    use crate::view::Screen;
    use std::cell::Cell;
    use std::rc::Rc;

    fn onboarded_store() -> AppStateStore<MemoryStorage> {
        let mut store = AppStateStore::new(MemoryStorage::new());
        store.load();
        store.dispatch(Event::OnboardingNext);
        store.dispatch(Event::OnboardingNameChanged("Alex".into()));
        store.dispatch(Event::OnboardingNext);
        store.dispatch(Event::GoalSelected(Goal::Creativity));
        store.dispatch(Event::OnboardingCompleted);
        store
    }

    #[test]
    fn fresh_storage_shows_onboarding() {
        let mut store = AppStateStore::new(MemoryStorage::new());
        assert!(!store.view().loaded);
        let settled = store.load();
        assert!(settled.rendered);
        assert!(store.view().loaded);
        assert!(matches!(store.view().screen, Screen::Onboarding(_)));
        assert!(store.storage().is_empty());
        assert_eq!(store.saved_state(), None);
    }

    #[test]
    fn mutations_write_through() {
        let mut store = onboarded_store();
        store.dispatch(Event::AddTodo { text: "Write tests".into(), priority: Priority::High });

        let saved = store.saved_state().unwrap();
        assert_eq!(saved.todos[0].text, "Write tests");
        assert_eq!(saved.user.goal, Some(Goal::Creativity));
        assert_eq!(store.view().todos[0].text, "Write tests");
    }

    #[test]
    fn subscribers_see_each_settled_view() {
        let mut store = onboarded_store();
        let renders = Rc::new(Cell::new(0));
        let seen = Rc::clone(&renders);
        store.subscribe(move |vm| {
            assert_eq!(vm.screen, Screen::Main);
            seen.set(seen.get() + 1);
        });

        store.dispatch(Event::ThemeToggled);
        store.dispatch(Event::SidebarToggled);
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn write_failures_are_reported_not_fatal() {
        let mut store = onboarded_store();
        store.storage_mut().set_fail_writes(true);
        store.dispatch(Event::ThemeToggled);
        let view = store.view();
        assert_eq!(view.toast.as_deref(), Some("Unable to save data locally."));
        assert_eq!(view.theme, Theme::Light);
        assert_eq!(store.saved_state().unwrap().theme, Theme::Dark);
    }

    #[test]
    fn timer_requests_are_returned_to_the_caller() {
        let mut store = onboarded_store();
        let settled = store.dispatch(Event::TimerToggled);
        assert_eq!(settled.timer, vec![TimerOperation::Start { interval_ms: 1000 }]);
        let settled = store.dispatch(Event::TimerToggled);
        assert_eq!(settled.timer, vec![TimerOperation::Cancel]);
    }

    #[test]
    fn config_reaches_the_core() {
        let config = AppConfig::default().with_storage_key("hub-test");
        let mut store = AppStateStore::with_config(MemoryStorage::new(), config);
        store.load();
        store.dispatch(Event::ThemeToggled);
        assert!(store.storage().raw("hub-test").is_some());
        assert!(store.storage().raw(crate::STORAGE_KEY).is_none());
        assert_eq!(store.saved_state().unwrap().theme, Theme::Light);
    }
}
