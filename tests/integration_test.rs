// Integration tests for user-dashboard

use std::time::{Duration, Instant};

use user_dashboard::api::memory::{InMemoryApi, sample_users};
use user_dashboard::api::worker::{ApiWorker, Dispatch};
use user_dashboard::api::{DeleteResponse, UserApi};
use user_dashboard::app::AppState;
use user_dashboard::app::mutation::{self, DeleteOutcome};
use user_dashboard::error::{ApiError, ApiResult, Field};
use user_dashboard::model::{Department, User, UserId, UserInput};
use user_dashboard::pager::ItemsPerPage;

/// Backend where every call fails the same way.
struct FailingApi {
    calls: usize,
}

impl FailingApi {
    fn error() -> ApiError {
        ApiError::server(503, "service unavailable")
    }
}

impl UserApi for FailingApi {
    fn list_users(&mut self, _limit: usize, _offset: usize) -> ApiResult<Vec<User>> {
        self.calls += 1;
        Err(Self::error())
    }
    fn get_user(&mut self, _id: UserId) -> ApiResult<User> {
        self.calls += 1;
        Err(Self::error())
    }
    fn create_user(&mut self, _input: &UserInput) -> ApiResult<User> {
        self.calls += 1;
        Err(Self::error())
    }
    fn update_user(&mut self, _id: UserId, _input: &UserInput) -> ApiResult<User> {
        self.calls += 1;
        Err(Self::error())
    }
    fn delete_user(&mut self, _id: UserId) -> ApiResult<DeleteResponse> {
        self.calls += 1;
        Err(Self::error())
    }
}

/// Wraps the in-memory backend and records every call it sees.
#[derive(Default)]
struct RecordingApi {
    inner: InMemoryApi,
    calls: Vec<String>,
    inputs: Vec<UserInput>,
}

impl UserApi for RecordingApi {
    fn list_users(&mut self, limit: usize, offset: usize) -> ApiResult<Vec<User>> {
        self.calls.push(format!("list {limit} {offset}"));
        self.inner.list_users(limit, offset)
    }
    fn get_user(&mut self, id: UserId) -> ApiResult<User> {
        self.calls.push(format!("get {id}"));
        self.inner.get_user(id)
    }
    fn create_user(&mut self, input: &UserInput) -> ApiResult<User> {
        self.calls.push("create".into());
        self.inputs.push(input.clone());
        self.inner.create_user(input)
    }
    fn update_user(&mut self, id: UserId, input: &UserInput) -> ApiResult<User> {
        self.calls.push(format!("update {id}"));
        self.inputs.push(input.clone());
        self.inner.update_user(id, input)
    }
    fn delete_user(&mut self, id: UserId) -> ApiResult<DeleteResponse> {
        self.calls.push(format!("delete {id}"));
        self.inner.delete_user(id)
    }
}

fn many_users(n: u64) -> Vec<User> {
    (1..=n)
        .map(|id| User {
            id,
            first_name: format!("User{id:03}"),
            last_name: "Sample".into(),
            email: format!("user{id}@example.com"),
            department: Department::ALL[(id as usize) % Department::ALL.len()],
        })
        .collect()
}

// 1) Invalid create never reaches the backend and leaves the store alone
#[test]
fn create_with_bad_email_is_rejected_before_the_api() {
    let mut app = AppState::with_records(sample_users());
    let mut api = FailingApi { calls: 0 };
    let input = UserInput::new("A", "B", "bad-email", Some(Department::HR));

    let err = mutation::create(&mut app, &mut api, &input).unwrap_err();
    match err {
        ApiError::Validation(errors) => {
            assert!(errors.get(Field::Email).is_some());
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert_eq!(api.calls, 0);
    assert_eq!(app.store.len(), 5);
    assert!(app.notification.is_some());
}

// 2) Delete removes the record, recomputes the view and resets to page 1
#[test]
fn delete_drops_record_and_resets_page() {
    let users = many_users(23);
    let mut api = InMemoryApi::new(users.clone());
    let mut app = AppState::with_records(users);
    app.set_items_per_page(ItemsPerPage::Ten);
    app.last_page();
    assert_eq!(app.current_page, 3);
    let before = app.visible().len();

    let outcome = mutation::delete(&mut app, &mut api, 3, |_| true).unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(!app.store.contains(3));
    assert_eq!(app.visible().len(), before - 1);
    assert_eq!(app.current_page, 1);
    assert_eq!(app.total_pages(), 3);
}

#[test]
fn declined_delete_makes_no_call() {
    let mut app = AppState::with_records(sample_users());
    let mut api = FailingApi { calls: 0 };
    let outcome = mutation::delete(&mut app, &mut api, 3, |_| false).unwrap();
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(api.calls, 0);
    assert!(app.store.contains(3));
}

// 3) Changing the page size always returns to page 1
#[test]
fn page_size_change_resets_current_page() {
    let mut app = AppState::with_records(many_users(60));
    app.go_to_page(4);
    assert_eq!(app.current_page, 4);
    app.set_items_per_page(ItemsPerPage::TwentyFive);
    assert_eq!(app.current_page, 1);
    assert_eq!(app.total_pages(), 3);
}

// 4) Backend failures leave the store exactly as it was
#[test]
fn failed_mutations_do_not_touch_the_store() {
    let mut app = AppState::with_records(sample_users());
    let snapshot = app.store.records().to_vec();
    let mut api = FailingApi { calls: 0 };
    let good = UserInput::new("Nora", "Quinn", "nora@example.com", Some(Department::Sales));

    assert!(mutation::create(&mut app, &mut api, &good).is_err());
    assert!(mutation::update(&mut app, &mut api, 2, &good).is_err());
    assert!(mutation::delete(&mut app, &mut api, 2, |_| true).is_err());

    assert_eq!(api.calls, 3);
    assert_eq!(app.store.records(), snapshot.as_slice());
    let note = app.notification.as_ref().unwrap();
    assert!(note.message.starts_with("Failed to delete user"));
}

#[test]
fn failed_initial_load_leaves_an_empty_working_view() {
    let mut app = AppState::default();
    let mut api = FailingApi { calls: 0 };
    assert!(mutation::load(&mut app, &mut api).is_err());
    assert!(app.store.is_empty());
    assert_eq!(app.total_pages(), 1);
    assert!(app.page_items().is_empty());
    assert!(app.load_error.is_some());

    // a retry against a healthy backend recovers
    let mut healthy = InMemoryApi::with_sample_data();
    assert_eq!(mutation::load(&mut app, &mut healthy).unwrap(), 5);
    assert!(app.load_error.is_none());
}

// 5) Create then update round through the in-memory backend
#[test]
fn create_appends_and_update_keeps_position() {
    let mut app = AppState::default();
    let mut api = InMemoryApi::with_sample_data();
    mutation::load(&mut app, &mut api).unwrap();

    let created = mutation::create(
        &mut app,
        &mut api,
        &UserInput::new(" Nora ", "Quinn", "nora@example.com", Some(Department::Sales)),
    )
    .unwrap();
    assert_eq!(created.id, 6);
    assert_eq!(created.first_name, "Nora");
    assert_eq!(app.store.records().last().map(|u| u.id), Some(6));

    app.next_page();
    let page = app.current_page;
    let updated = mutation::update(
        &mut app,
        &mut api,
        1,
        &UserInput::new("Johnny", "Doe", "johnny@example.com", Some(Department::Finance)),
    )
    .unwrap();
    assert_eq!(updated.department, Department::Finance);
    assert_eq!(app.store.records()[0].first_name, "Johnny");
    assert_eq!(app.current_page, page);
    assert_eq!(api.users()[0].email, "johnny@example.com");
}

#[test]
fn coordinator_sends_trimmed_input_and_uses_fetch_limit() {
    let mut app = AppState::default();
    app.settings.fetch_limit = 3;
    let mut api = RecordingApi {
        inner: InMemoryApi::with_sample_data(),
        ..RecordingApi::default()
    };
    assert_eq!(mutation::load(&mut app, &mut api).unwrap(), 3);

    let input = UserInput::new("  Nora", "Quinn  ", " nora@example.com ", Some(Department::HR));
    mutation::create(&mut app, &mut api, &input).unwrap();
    assert_eq!(api.inputs[0].first_name, "Nora");
    assert_eq!(api.inputs[0].email, "nora@example.com");

    // a missing record surfaces as NotFound and the store keeps its rows
    let err = mutation::update(&mut app, &mut api, 42, &input).unwrap_err();
    assert_eq!(err, ApiError::not_found(42));
    assert_eq!(app.store.len(), 4);
    assert_eq!(api.calls, vec!["list 3 0", "create", "update 42"]);
}

// 6) The worker thread delivers completions to the event loop side
#[test]
fn worker_completions_reconcile_the_store() {
    let api = InMemoryApi::with_sample_data().with_latency(Duration::from_millis(5));
    let mut worker = ApiWorker::spawn(Box::new(api)).unwrap();
    let mut app = AppState::default();

    mutation::start_load(&mut app, &mut worker);
    let deadline = Instant::now() + Duration::from_secs(5);
    while app.store.is_empty() && Instant::now() < deadline {
        for completion in worker.poll() {
            let _ = mutation::apply_completion(&mut app, completion);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(app.store.len(), 5);
    assert!(!app.loading);
    assert_eq!(worker.in_flight(), 0);
}

// 7) Config files are created on first start and read back
#[test]
fn config_files_roundtrip_and_init() {
    use user_dashboard::app::config::{Settings, Theme};
    use user_dashboard::app::keymap::Keymap;

    let dir = tempfile::tempdir().unwrap();

    let settings_path = dir.path().join("nested").join("settings.conf");
    let defaults = Settings::load_or_init(&settings_path);
    assert!(settings_path.exists());
    assert_eq!(defaults, Settings::default());

    let custom = Settings {
        items_per_page: ItemsPerPage::Fifty,
        fetch_limit: 30,
        latency_ms: 0,
        notification_secs: 5,
    };
    custom.write_file(&settings_path).unwrap();
    assert_eq!(Settings::load_or_init(&settings_path), custom);

    let theme_path = dir.path().join("theme.conf");
    let t = Theme {
        border: ratatui::style::Color::Rgb(1, 2, 3),
        highlight_bg: ratatui::style::Color::Reset,
        ..Theme::mocha()
    };
    t.write_file(&theme_path).unwrap();
    assert_eq!(Theme::from_file(&theme_path).unwrap(), t);

    let keys_path = dir.path().join("keybinds.conf");
    let _ = Keymap::load_or_init(&keys_path);
    assert!(keys_path.exists());

    let app = AppState::new(custom, t, Keymap::default());
    assert_eq!(app.items_per_page, ItemsPerPage::Fifty);
}
