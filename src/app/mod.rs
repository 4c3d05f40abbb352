//! Session state and the transitions the UI drives.
//!
//! `AppState` is owned by the event loop. The record store lives here, as do
//! the search term, filters and paging position the view is derived from.
//! Every transition that can change which rows are visible ends with
//! [`AppState::refresh_view`].

pub mod config;
pub mod keymap;
pub mod mutation;
pub mod update;

use std::time::{Duration, Instant};

use crate::api::worker::RequestId;
use crate::error::ValidationErrors;
use crate::model::{User, UserId, UserInput};
use crate::pager::{ItemsPerPage, paginate, total_pages};
use crate::query::{Filters, SortField, derive};
use crate::store::RecordStore;

use config::{Settings, Theme};
use keymap::Keymap;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Whether a form creates a new user or edits an existing one.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(UserId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormStatus {
    /// Waiting for the record to edit.
    Loading,
    Editing,
    /// Waiting for the create/update call.
    Submitting,
}

/// Create/edit form.
#[derive(Clone, Debug)]
pub struct UserForm {
    pub mode: FormMode,
    pub input: UserInput,
    /// 0..=3 are the fields, 4 is the submit button.
    pub focus: usize,
    pub errors: ValidationErrors,
    pub status: FormStatus,
    pub request: Option<RequestId>,
    /// Last failure reported by the backend.
    pub server_error: Option<String>,
}

impl UserForm {
    pub const SUBMIT: usize = 4;

    /// Empty form for a new user.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            input: UserInput::default(),
            focus: 0,
            errors: ValidationErrors::new(),
            status: FormStatus::Editing,
            request: None,
            server_error: None,
        }
    }

    /// Edit form that still needs the record fetched.
    pub fn edit(id: UserId, request: RequestId) -> Self {
        Self {
            mode: FormMode::Edit(id),
            status: FormStatus::Loading,
            request: Some(request),
            ..Self::create()
        }
    }

    /// True while a fetch or save is outstanding.
    pub fn is_busy(&self) -> bool {
        self.status != FormStatus::Editing
    }
}

/// Filter/sort dialog editing a draft that replaces the live filters on apply.
#[derive(Clone, Debug)]
pub struct FilterForm {
    pub draft: Filters,
    /// 0..=2 text fields, 3 department, 4 sort field, 5 sort order, 6 apply, 7 reset.
    pub focus: usize,
}

impl FilterForm {
    pub const APPLY: usize = 6;
    pub const RESET: usize = 7;
    pub const LAST: usize = 7;

    /// Draft seeded from the filters currently applied.
    pub fn new(current: &Filters) -> Self {
        Self {
            draft: current.clone(),
            focus: 0,
        }
    }
}

/// Modal dialog states.
#[derive(Clone, Debug)]
pub enum ModalState {
    UserForm(UserForm),
    FilterMenu(FilterForm),
    /// Yes/No gate before a delete; `yes` is the highlighted choice.
    DeleteConfirm { id: UserId, label: String, yes: bool },
    Help { scroll: u16 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient message in the status bar.
#[derive(Clone, Debug)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub shown_at: Instant,
}

pub struct AppState {
    pub started_at: Instant,
    pub store: RecordStore,
    pub search_term: String,
    pub filters: Filters,
    /// 1-based.
    pub current_page: usize,
    pub items_per_page: ItemsPerPage,
    /// Index of the highlighted row within the current page.
    pub selected_row: usize,
    pub input_mode: InputMode,
    pub modal: Option<ModalState>,
    pub theme: Theme,
    pub keymap: Keymap,
    pub settings: Settings,
    pub show_keybinds: bool,
    pub notification: Option<Notification>,
    /// Set when the last list fetch failed; cleared by a successful one.
    pub load_error: Option<String>,
    pub loading: bool,
    pub in_flight: usize,
}

impl AppState {
    /// Empty session using the given config.
    pub fn new(settings: Settings, theme: Theme, keymap: Keymap) -> Self {
        Self {
            started_at: Instant::now(),
            store: RecordStore::new(),
            search_term: String::new(),
            filters: Filters::default(),
            current_page: 1,
            items_per_page: settings.items_per_page,
            selected_row: 0,
            input_mode: InputMode::Normal,
            modal: None,
            theme,
            keymap,
            settings,
            show_keybinds: false,
            notification: None,
            load_error: None,
            loading: false,
            in_flight: 0,
        }
    }

    /// State preloaded with `records` and default settings.
    pub fn with_records(records: Vec<User>) -> Self {
        let mut app = Self::default();
        app.store = RecordStore::from_records(records);
        app.refresh_view();
        app
    }

    /// The filtered, sorted sequence the table pages through.
    pub fn visible(&self) -> Vec<&User> {
        derive(self.store.records(), &self.search_term, &self.filters)
    }

    /// Page count of the visible set, never less than 1.
    pub fn total_pages(&self) -> usize {
        total_pages(self.visible().len(), self.items_per_page.get())
    }

    /// Rows on the current page.
    pub fn page_items(&self) -> Vec<&User> {
        let visible = self.visible();
        paginate(&visible, self.items_per_page.get(), self.current_page)
            .items
            .to_vec()
    }

    /// Record under the cursor on the current page.
    pub fn selected_user(&self) -> Option<&User> {
        self.page_items().get(self.selected_row).copied()
    }

    /// Re-derive the view and pull page and selection back into range.
    pub fn refresh_view(&mut self) {
        let visible_len = self.visible().len();
        let pages = total_pages(visible_len, self.items_per_page.get());
        self.current_page = self.current_page.clamp(1, pages);
        let size = self.items_per_page.get();
        let on_page = visible_len
            .saturating_sub((self.current_page - 1) * size)
            .min(size);
        self.selected_row = self.selected_row.min(on_page.saturating_sub(1));
        tracing::debug!(
            visible = visible_len,
            page = self.current_page,
            pages,
            "view re-derived"
        );
    }

    fn reset_to_first_page(&mut self) {
        self.current_page = 1;
        self.selected_row = 0;
        self.refresh_view();
    }

    /// Replace the search term and go back to page 1.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.reset_to_first_page();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_term.push(c);
        self.reset_to_first_page();
    }

    pub fn pop_search_char(&mut self) {
        self.search_term.pop();
        self.reset_to_first_page();
    }

    /// Replace the filters wholesale.
    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
        self.reset_to_first_page();
    }

    /// Restore default filters and sort.
    pub fn reset_filters(&mut self) {
        self.set_filters(Filters::default());
    }

    /// Drop search term and filters in one go.
    pub fn clear_search_and_filters(&mut self) {
        self.search_term.clear();
        self.filters = Filters::default();
        self.reset_to_first_page();
    }

    /// Sort by `field`; choosing the active field flips the order instead.
    pub fn set_sort(&mut self, field: SortField) {
        if self.filters.sort_by == field {
            self.filters.sort_order = self.filters.sort_order.toggled();
        } else {
            self.filters.sort_by = field;
        }
        self.reset_to_first_page();
    }

    /// Sort by the next column.
    pub fn cycle_sort_field(&mut self) {
        self.filters.sort_by = self.filters.sort_by.next();
        self.reset_to_first_page();
    }

    pub fn toggle_sort_order(&mut self) {
        self.filters.sort_order = self.filters.sort_order.toggled();
        self.reset_to_first_page();
    }

    /// Change rows per page and go back to page 1.
    pub fn set_items_per_page(&mut self, size: ItemsPerPage) {
        self.items_per_page = size;
        self.reset_to_first_page();
    }

    pub fn cycle_items_per_page(&mut self) {
        self.set_items_per_page(self.items_per_page.next());
    }

    /// Jump to `page`, clamped to the valid range.
    pub fn go_to_page(&mut self, page: usize) {
        let pages = self.total_pages();
        let target = page.clamp(1, pages);
        if target != self.current_page {
            self.current_page = target;
            self.selected_row = 0;
        }
        self.refresh_view();
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.current_page.saturating_sub(1));
    }

    pub fn first_page(&mut self) {
        self.go_to_page(1);
    }

    pub fn last_page(&mut self) {
        self.go_to_page(self.total_pages());
    }

    /// Move the cursor up one row.
    pub fn move_up(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let on_page = self.page_items().len();
        if self.selected_row + 1 < on_page {
            self.selected_row += 1;
        }
    }

    /// Show a success message in the status bar.
    pub fn notify_success(&mut self, message: impl Into<String>) {
        self.notify(NotificationKind::Success, message.into());
    }

    /// Show an error message in the status bar.
    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notify(NotificationKind::Error, message.into());
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        self.notification = Some(Notification {
            kind,
            message,
            shown_at: Instant::now(),
        });
    }

    /// Drop the notification once it has been visible long enough.
    pub fn expire_notification(&mut self, now: Instant) {
        let ttl = Duration::from_secs(self.settings.notification_secs);
        if let Some(n) = &self.notification
            && now.saturating_duration_since(n.shown_at) >= ttl
        {
            self.notification = None;
        }
    }

    /// Open `modal` and switch to modal input.
    pub fn open_modal(&mut self, modal: ModalState) {
        self.modal = Some(modal);
        self.input_mode = InputMode::Modal;
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default(), Theme::default(), Keymap::default())
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
