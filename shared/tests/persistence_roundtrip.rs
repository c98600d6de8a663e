use proptest::prelude::*;

use prodigy_shared::capabilities::{KvStorage, MemoryStorage};
use prodigy_shared::persistence::{decode, encode};
use prodigy_shared::{
    AppConfig, AppState, AppStateStore, Event, Goal, Note, NoteId, Priority, Theme, Todo,
    TodoFilter, TodoId, UnixTimeMs, User, LEGACY_NOTE_KEY, LEGACY_TODOS_KEY, STORAGE_KEY,
};

fn goal() -> impl Strategy<Value = Option<Goal>> {
    prop_oneof![
        prop::sample::select(Goal::ALL.to_vec()).prop_map(Some),
        "[a-z]{3,10}".prop_map(|tag| Goal::from_tag(&tag)),
        Just(None),
    ]
}

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

fn filter() -> impl Strategy<Value = TodoFilter> {
    prop_oneof![Just(TodoFilter::All), Just(TodoFilter::Active), Just(TodoFilter::Completed)]
}

fn note() -> impl Strategy<Value = Note> {
    ("[a-z0-9]{1,12}", ".{0,20}", ".{0,40}", any::<u64>()).prop_map(|(id, title, content, ms)| {
        Note {
            id: NoteId::new(id),
            title,
            content,
            date: UnixTimeMs(ms),
        }
    })
}

fn todo() -> impl Strategy<Value = Todo> {
    ("[a-z0-9]{1,12}", "[a-z ]{1,20}", any::<bool>(), priority(), any::<u64>()).prop_map(
        |(id, text, completed, priority, ms)| Todo {
            id: TodoId::new(id),
            text,
            completed,
            priority,
            date: UnixTimeMs(ms),
        },
    )
}

fn app_state() -> impl Strategy<Value = AppState> {
    (
        (".{0,16}", goal(), any::<bool>()),
        prop::collection::vec(note(), 0..6),
        prop::collection::vec(todo(), 0..8),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        filter(),
        any::<bool>(),
    )
        .prop_map(
            |((name, goal, onboarded), notes, todos, completed, sessions, minutes, filter, light)| {
                AppState {
                    user: User { name, goal, onboarded },
                    notes,
                    todos,
                    completed_tasks: completed,
                    focus_sessions: sessions,
                    total_focus_minutes: minutes,
                    current_filter: filter,
                    theme: if light { Theme::Light } else { Theme::Dark },
                }
            },
        )
}

proptest! {
    #[test]
    fn saved_state_reads_back_identically(state in app_state()) {
        let decoded = decode(&encode(&state).unwrap()).unwrap();
        prop_assert_eq!(decoded, state);
    }
}

fn onboard<S: KvStorage>(store: &mut AppStateStore<S>) {
    for event in [
        Event::OnboardingNext,
        Event::OnboardingNameChanged("Alex".into()),
        Event::OnboardingNext,
        Event::GoalSelected(Goal::Career),
        Event::OnboardingCompleted,
    ] {
        store.dispatch(event);
    }
}

#[test]
fn reload_restores_persisted_fields_only() {
    let mut store = AppStateStore::new(MemoryStorage::new());
    store.load();
    onboard(&mut store);
    store.dispatch(Event::AddTodo { text: "Ship it".into(), priority: Priority::High });
    store.dispatch(Event::SaveNote { title: "Plan".into(), content: "steps".into() });
    store.dispatch(Event::ThemeToggled);
    store.dispatch(Event::TimerToggled);
    store.dispatch(Event::TimerTicked);
    store.dispatch(Event::ViewSelected(prodigy_shared::model::View::Settings));
    let before = store.saved_state().unwrap();
    let view_before = store.view();

    let mut reloaded = AppStateStore::new(store.into_storage());
    reloaded.load();

    assert_eq!(reloaded.saved_state().unwrap(), before);
    let view = reloaded.view();
    assert_eq!(view.todos, view_before.todos);
    assert_eq!(view.notes, view_before.notes);
    assert_eq!(view.theme, view_before.theme);
    assert_eq!(view.timer.display, "25:00");
    assert_eq!(view.timer.status, prodigy_shared::timer::TimerStatus::Idle);
    assert_eq!(view.active_view, prodigy_shared::model::View::Dashboard);
    assert!(view.note_editor.is_none());
}

#[test]
fn corrupt_blob_loads_defaults() {
    let storage = MemoryStorage::new().with_entry(STORAGE_KEY, "{definitely not json");
    let mut store = AppStateStore::new(storage);
    store.load();
    let view = store.view();
    assert!(view.loaded);
    assert!(matches!(view.screen, prodigy_shared::view::Screen::Onboarding(_)));
    assert!(view.todos.is_empty());
    assert!(view.notes.is_empty());
    assert_eq!(view.theme, AppState::default().theme);
}

#[test]
fn legacy_keys_are_migrated_once() {
    let storage = MemoryStorage::new()
        .with_entry(LEGACY_NOTE_KEY, "shopping ideas")
        .with_entry(LEGACY_TODOS_KEY, r#"["call mom", {"text": "pay rent", "completed": true}]"#);
    let mut store = AppStateStore::new(storage);
    store.load();

    let saved = store.saved_state().unwrap();
    assert_eq!(saved.notes.len(), 1);
    assert_eq!(saved.notes[0].title, "Untitled");
    assert_eq!(saved.todos.len(), 2);
    assert_eq!(saved.completed_tasks, 1);
    assert_eq!(store.view().dashboard.completed_count, 1);

    let storage = store.storage();
    assert!(storage.raw(STORAGE_KEY).is_some());
    assert!(storage.raw(LEGACY_NOTE_KEY).is_none());
    assert!(storage.raw(LEGACY_TODOS_KEY).is_none());
}

#[test]
fn legacy_migration_can_be_disabled() {
    let storage = MemoryStorage::new().with_entry(LEGACY_NOTE_KEY, "old text");
    let config = AppConfig::default().with_legacy_migration(false);
    let mut store = AppStateStore::with_config(storage, config);
    store.load();

    assert!(store.view().notes.is_empty());
    assert_eq!(store.saved_state(), None);
    assert_eq!(store.storage().raw(LEGACY_NOTE_KEY), Some("old text"));
}

#[test]
fn reset_clears_storage_and_returns_to_onboarding() {
    let mut store = AppStateStore::new(MemoryStorage::new());
    store.load();
    onboard(&mut store);
    store.dispatch(Event::AddTodo { text: "x".into(), priority: Priority::Medium });
    assert!(store.storage().raw(STORAGE_KEY).is_some());

    store.dispatch(Event::ResetRequested);
    store.dispatch(Event::ConfirmationResolved { accepted: true });
    assert_eq!(
        store.view().confirmation.as_deref(),
        Some("Really? This will delete everything!")
    );
    store.dispatch(Event::ConfirmationResolved { accepted: true });

    assert!(store.storage().is_empty());
    assert_eq!(store.saved_state(), None);
    assert!(matches!(
        store.view().screen,
        prodigy_shared::view::Screen::Onboarding(_)
    ));
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_backed_store_survives_reopen() {
    use prodigy_shared::capabilities::SqliteStorage;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prodigy.db");

    {
        let mut store = AppStateStore::new(SqliteStorage::new(&path).unwrap());
        store.load();
        onboard(&mut store);
        store.dispatch(Event::AddTodo { text: "persist me".into(), priority: Priority::Low });
    }

    let mut store = AppStateStore::new(SqliteStorage::new(&path).unwrap());
    store.load();
    assert_eq!(store.view().screen, prodigy_shared::view::Screen::Main);
    assert_eq!(store.view().todos[0].text, "persist me");
}
