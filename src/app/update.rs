//! Event loop and key handling.

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::keymap::KeyAction;
use super::mutation::{self, Applied};
use super::{AppState, FilterForm, FormMode, FormStatus, InputMode, ModalState, UserForm};
use crate::api::worker::{ApiRequest, Completion, Dispatch};
use crate::error::{ApiError, Field};
use crate::model::{Department, UserInput};
use crate::ui;
use crate::validate::validate_field;

/// Whether the loop should keep going after a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Drive the TUI until the user quits.
pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut AppState,
    dispatch: &mut dyn Dispatch,
) -> Result<()> {
    mutation::start_load(app, dispatch);

    loop {
        drain_completions(app, dispatch);
        app.expire_notification(Instant::now());

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && handle_key(app, key, dispatch) == Flow::Quit
        {
            break;
        }
    }

    tracing::info!(uptime = ?app.started_at.elapsed(), "exiting");
    Ok(())
}

/// Apply every completion the dispatcher has for us.
pub fn drain_completions(app: &mut AppState, dispatch: &mut dyn Dispatch) {
    for completion in dispatch.poll() {
        handle_completion(app, completion);
    }
    app.in_flight = dispatch.in_flight();
}

/// Reconcile a completion, then update the form waiting on it, if still open.
pub fn handle_completion(app: &mut AppState, completion: Completion) {
    let id = completion.id;
    let request = completion.request.clone();
    let outcome = mutation::apply_completion(app, completion);

    let mut close = false;
    if let Some(ModalState::UserForm(form)) = app.modal.as_mut()
        && form.request == Some(id)
    {
        form.request = None;
        form.status = FormStatus::Editing;
        match (&request, outcome) {
            (ApiRequest::Get(_), Ok(Applied::Fetched(user))) => {
                form.input = UserInput::from(&user);
            }
            (ApiRequest::Get(_), Err(_)) => close = true,
            (_, Ok(_)) => close = true,
            (_, Err(ApiError::Validation(errors))) => {
                form.errors = errors;
            }
            (_, Err(e)) => form.server_error = Some(e.to_string()),
        }
    }
    if close {
        app.close_modal();
    }
}

/// Route a key press according to the current input mode.
pub fn handle_key(app: &mut AppState, key: KeyEvent, dispatch: &mut dyn Dispatch) -> Flow {
    match app.input_mode {
        InputMode::Normal => match app.keymap.resolve(&key) {
            Some(action) => handle_action(app, action, dispatch),
            None => Flow::Continue,
        },
        InputMode::Search => {
            handle_search_key(app, key.code);
            Flow::Continue
        }
        InputMode::Modal => {
            handle_modal_key(app, key.code, dispatch);
            Flow::Continue
        }
    }
}

/// Perform a bound action from the main view.
pub fn handle_action(app: &mut AppState, action: KeyAction, dispatch: &mut dyn Dispatch) -> Flow {
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::StartSearch => app.input_mode = InputMode::Search,
        KeyAction::OpenFilterMenu => {
            let form = FilterForm::new(&app.filters);
            app.open_modal(ModalState::FilterMenu(form));
        }
        KeyAction::NewUser => app.open_modal(ModalState::UserForm(UserForm::create())),
        KeyAction::EditSelection => {
            if let Some(id) = app.selected_user().map(|u| u.id) {
                let request = dispatch.submit(ApiRequest::Get(id));
                app.in_flight = dispatch.in_flight();
                app.open_modal(ModalState::UserForm(UserForm::edit(id, request)));
            }
        }
        KeyAction::DeleteSelection => {
            if let Some(user) = app.selected_user() {
                let modal = ModalState::DeleteConfirm {
                    id: user.id,
                    label: user.full_name(),
                    yes: false,
                };
                app.open_modal(modal);
            }
        }
        KeyAction::MoveUp => app.move_up(),
        KeyAction::MoveDown => app.move_down(),
        KeyAction::PrevPage => app.prev_page(),
        KeyAction::NextPage => app.next_page(),
        KeyAction::FirstPage => app.first_page(),
        KeyAction::LastPage => app.last_page(),
        KeyAction::CycleSortField => app.cycle_sort_field(),
        KeyAction::ToggleSortOrder => app.toggle_sort_order(),
        KeyAction::CyclePageSize => app.cycle_items_per_page(),
        KeyAction::ClearFilters => app.clear_search_and_filters(),
        KeyAction::Reload => {
            mutation::start_load(app, dispatch);
        }
        KeyAction::OpenHelp => app.open_modal(ModalState::Help { scroll: 0 }),
        KeyAction::ToggleKeybindsPane => app.show_keybinds = !app.show_keybinds,
        KeyAction::Ignore => {}
    }
    Flow::Continue
}

fn handle_search_key(app: &mut AppState, code: KeyCode) {
    match code {
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.set_search_term("");
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

fn handle_modal_key(app: &mut AppState, code: KeyCode, dispatch: &mut dyn Dispatch) {
    let Some(modal) = app.modal.take() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    let next = match modal {
        ModalState::UserForm(form) => user_form_key(app, form, code, dispatch),
        ModalState::FilterMenu(form) => filter_form_key(app, form, code),
        ModalState::DeleteConfirm { id, label, yes } => match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                Some(ModalState::DeleteConfirm { id, label, yes: !yes })
            }
            KeyCode::Char('y') => {
                dispatch.submit(ApiRequest::Delete(id));
                None
            }
            KeyCode::Enter => {
                if yes {
                    dispatch.submit(ApiRequest::Delete(id));
                }
                None
            }
            KeyCode::Esc | KeyCode::Char('n') => None,
            _ => Some(ModalState::DeleteConfirm { id, label, yes }),
        },
        ModalState::Help { scroll } => match code {
            KeyCode::Up | KeyCode::Char('k') => Some(ModalState::Help { scroll: scroll.saturating_sub(1) }),
            KeyCode::Down | KeyCode::Char('j') => Some(ModalState::Help { scroll: scroll.saturating_add(1) }),
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('q') => None,
            _ => Some(ModalState::Help { scroll }),
        },
    };
    app.in_flight = dispatch.in_flight();
    match next {
        Some(m) => app.open_modal(m),
        None => app.close_modal(),
    }
}

/// Step through departments with an empty slot between the ends.
pub fn cycle_department(current: Option<Department>, forward: bool) -> Option<Department> {
    match (current, forward) {
        (None, true) => Some(Department::Engineering),
        (None, false) => Some(Department::Finance),
        (Some(Department::Finance), true) | (Some(Department::Engineering), false) => None,
        (Some(d), true) => Some(d.next()),
        (Some(d), false) => Some(d.prev()),
    }
}

fn input_text_mut(input: &mut UserInput, field: Field) -> Option<&mut String> {
    match field {
        Field::FirstName => Some(&mut input.first_name),
        Field::LastName => Some(&mut input.last_name),
        Field::Email => Some(&mut input.email),
        Field::Department => None,
    }
}

fn revalidate(form: &mut UserForm, field: Field) {
    form.errors.remove(field);
    if let Some(msg) = validate_field(&form.input, field) {
        form.errors.add(field, msg);
    }
}

fn user_form_key(
    app: &mut AppState,
    mut form: UserForm,
    code: KeyCode,
    dispatch: &mut dyn Dispatch,
) -> Option<ModalState> {
    if code == KeyCode::Esc {
        // an in-flight request still completes; only the form goes away
        return None;
    }
    if form.is_busy() {
        return Some(ModalState::UserForm(form));
    }
    let slots = UserForm::SUBMIT + 1;
    match code {
        KeyCode::Tab | KeyCode::Down => form.focus = (form.focus + 1) % slots,
        KeyCode::BackTab | KeyCode::Up => form.focus = (form.focus + slots - 1) % slots,
        KeyCode::Enter if form.focus == UserForm::SUBMIT => {
            let prepared = match form.mode {
                FormMode::Create => mutation::prepare_create(&form.input),
                FormMode::Edit(id) => mutation::prepare_update(id, &form.input),
            };
            match prepared {
                Ok(request) => {
                    form.errors = Default::default();
                    form.server_error = None;
                    form.request = Some(dispatch.submit(request));
                    form.status = FormStatus::Submitting;
                }
                Err(errors) => {
                    if let Some((first, _)) = errors.iter().next() {
                        form.focus = Field::ALL.iter().position(|f| *f == first).unwrap_or(0);
                    }
                    form.errors = errors;
                    app.notify_error("Please fix the highlighted fields");
                }
            }
        }
        KeyCode::Enter => form.focus += 1,
        _ => {
            if let Some(&field) = Field::ALL.get(form.focus) {
                edit_field(&mut form, field, code);
            }
        }
    }
    Some(ModalState::UserForm(form))
}

fn edit_field(form: &mut UserForm, field: Field, code: KeyCode) {
    if field == Field::Department {
        let forward = match code {
            KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('l') => true,
            KeyCode::Left | KeyCode::Char('h') => false,
            _ => return,
        };
        form.input.department = cycle_department(form.input.department, forward);
    } else if let Some(text) = input_text_mut(&mut form.input, field) {
        match code {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => return,
        }
    }
    revalidate(form, field);
}

fn filter_form_key(app: &mut AppState, mut form: FilterForm, code: KeyCode) -> Option<ModalState> {
    let slots = FilterForm::LAST + 1;
    match code {
        KeyCode::Esc => return None,
        KeyCode::Tab | KeyCode::Down => form.focus = (form.focus + 1) % slots,
        KeyCode::BackTab | KeyCode::Up => form.focus = (form.focus + slots - 1) % slots,
        KeyCode::Enter => match form.focus {
            FilterForm::APPLY => {
                app.set_filters(form.draft);
                return None;
            }
            FilterForm::RESET => {
                app.reset_filters();
                return None;
            }
            _ => form.focus += 1,
        },
        _ => {
            let draft = &mut form.draft;
            let text = match form.focus {
                0 => Some(&mut draft.first_name),
                1 => Some(&mut draft.last_name),
                2 => Some(&mut draft.email),
                _ => None,
            };
            match (form.focus, text, code) {
                (_, Some(t), KeyCode::Char(c)) => t.push(c),
                (_, Some(t), KeyCode::Backspace) => {
                    t.pop();
                }
                (3, None, KeyCode::Right | KeyCode::Char(' ')) => {
                    draft.department = cycle_department(draft.department, true);
                }
                (3, None, KeyCode::Left) => {
                    draft.department = cycle_department(draft.department, false);
                }
                (4, None, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                    draft.sort_by = draft.sort_by.next();
                }
                (5, None, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                    draft.sort_order = draft.sort_order.toggled();
                }
                _ => {}
            }
        }
    }
    Some(ModalState::FilterMenu(form))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{InMemoryApi, sample_users};
    use crate::api::worker::InlineDispatcher;
    use crate::app::NotificationKind;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut AppState, d: &mut dyn Dispatch, s: &str) {
        for c in s.chars() {
            handle_key(app, key(KeyCode::Char(c)), d);
        }
    }

    fn setup() -> (AppState, InlineDispatcher<InMemoryApi>) {
        (
            AppState::with_records(sample_users()),
            InlineDispatcher::new(InMemoryApi::with_sample_data()),
        )
    }

    #[test]
    fn typing_in_search_filters_live() {
        let (mut app, mut d) = setup();
        handle_key(&mut app, key(KeyCode::Char('/')), &mut d);
        assert_eq!(app.input_mode, InputMode::Search);
        type_text(&mut app, &mut d, "jane");
        assert_eq!(app.visible().len(), 1);
        handle_key(&mut app, key(KeyCode::Esc), &mut d);
        assert_eq!(app.visible().len(), 5);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn create_form_submits_and_closes_on_completion() {
        let (mut app, mut d) = setup();
        handle_key(&mut app, key(KeyCode::Char('n')), &mut d);
        type_text(&mut app, &mut d, "Nora");
        handle_key(&mut app, key(KeyCode::Tab), &mut d);
        type_text(&mut app, &mut d, "Quinn");
        handle_key(&mut app, key(KeyCode::Tab), &mut d);
        type_text(&mut app, &mut d, "nora@example.com");
        handle_key(&mut app, key(KeyCode::Tab), &mut d);
        handle_key(&mut app, key(KeyCode::Right), &mut d);
        handle_key(&mut app, key(KeyCode::Tab), &mut d);
        handle_key(&mut app, key(KeyCode::Enter), &mut d);
        assert!(matches!(&app.modal, Some(ModalState::UserForm(f)) if f.status == FormStatus::Submitting));

        drain_completions(&mut app, &mut d);
        assert!(app.modal.is_none());
        assert_eq!(app.store.len(), 6);
        assert_eq!(app.store.get(6).map(|u| u.department), Some(Department::Engineering));
    }

    #[test]
    fn invalid_form_stays_open_without_api_call() {
        let (mut app, mut d) = setup();
        handle_key(&mut app, key(KeyCode::Char('n')), &mut d);
        for _ in 0..4 {
            handle_key(&mut app, key(KeyCode::Tab), &mut d);
        }
        handle_key(&mut app, key(KeyCode::Enter), &mut d);
        let Some(ModalState::UserForm(form)) = &app.modal else { panic!("form closed") };
        assert_eq!(form.errors.len(), 4);
        assert_eq!(form.focus, 0);
        assert_eq!(d.in_flight(), 0);
    }

    #[test]
    fn edit_form_loads_record_then_updates_in_place() {
        let (mut app, mut d) = setup();
        // default order is by first name: David, Jane, John, ...
        handle_key(&mut app, key(KeyCode::Down), &mut d);
        handle_key(&mut app, key(KeyCode::Enter), &mut d);
        assert!(matches!(&app.modal, Some(ModalState::UserForm(f)) if f.status == FormStatus::Loading));
        drain_completions(&mut app, &mut d);
        let Some(ModalState::UserForm(form)) = &app.modal else { panic!("form closed") };
        assert_eq!(form.input.first_name, "Jane");

        handle_key(&mut app, key(KeyCode::Backspace), &mut d);
        type_text(&mut app, &mut d, "et");
        for _ in 0..4 {
            handle_key(&mut app, key(KeyCode::Tab), &mut d);
        }
        handle_key(&mut app, key(KeyCode::Enter), &mut d);
        drain_completions(&mut app, &mut d);
        assert!(app.modal.is_none());
        assert_eq!(app.store.get(2).map(|u| u.first_name.as_str()), Some("Janet"));
    }

    #[test]
    fn delete_needs_a_yes() {
        let (mut app, mut d) = setup();
        handle_key(&mut app, key(KeyCode::Char('d')), &mut d);
        handle_key(&mut app, key(KeyCode::Enter), &mut d);
        drain_completions(&mut app, &mut d);
        assert_eq!(app.store.len(), 5);

        handle_key(&mut app, key(KeyCode::Char('d')), &mut d);
        handle_key(&mut app, key(KeyCode::Left), &mut d);
        handle_key(&mut app, key(KeyCode::Enter), &mut d);
        drain_completions(&mut app, &mut d);
        assert_eq!(app.store.len(), 4);
        // first row by first name was David (id 5)
        assert!(!app.store.contains(5));
    }

    #[test]
    fn failed_delete_is_reported_in_the_status_bar() {
        let mut app = AppState::with_records(sample_users());
        let mut d = InlineDispatcher::new(InMemoryApi::new(Vec::new()));
        handle_key(&mut app, key(KeyCode::Char('d')), &mut d);
        handle_key(&mut app, key(KeyCode::Left), &mut d);
        handle_key(&mut app, key(KeyCode::Enter), &mut d);
        drain_completions(&mut app, &mut d);

        assert!(app.modal.is_none());
        assert!(app.store.contains(5));
        let note = app.notification.as_ref().unwrap();
        assert_eq!(note.kind, NotificationKind::Error);
    }

    #[test]
    fn filter_menu_applies_department_and_sort() {
        let (mut app, mut d) = setup();
        handle_key(&mut app, key(KeyCode::Char('f')), &mut d);
        for _ in 0..3 {
            handle_key(&mut app, key(KeyCode::Tab), &mut d);
        }
        // None -> Engineering -> Marketing -> Sales
        for _ in 0..3 {
            handle_key(&mut app, key(KeyCode::Right), &mut d);
        }
        for _ in 0..3 {
            handle_key(&mut app, key(KeyCode::Tab), &mut d);
        }
        handle_key(&mut app, key(KeyCode::Enter), &mut d);
        assert!(app.modal.is_none());
        assert_eq!(app.filters.department, Some(Department::Sales));
        assert_eq!(app.visible().len(), 1);
    }

    #[test]
    fn reload_failure_is_survivable() {
        struct Down;
        impl crate::api::UserApi for Down {
            fn list_users(&mut self, _: usize, _: usize) -> crate::error::ApiResult<Vec<crate::model::User>> {
                Err(ApiError::network("offline"))
            }
            fn get_user(&mut self, id: u64) -> crate::error::ApiResult<crate::model::User> {
                Err(ApiError::not_found(id))
            }
            fn create_user(&mut self, _: &UserInput) -> crate::error::ApiResult<crate::model::User> {
                Err(ApiError::network("offline"))
            }
            fn update_user(&mut self, id: u64, _: &UserInput) -> crate::error::ApiResult<crate::model::User> {
                Err(ApiError::not_found(id))
            }
            fn delete_user(&mut self, id: u64) -> crate::error::ApiResult<crate::api::DeleteResponse> {
                Err(ApiError::not_found(id))
            }
        }
        let mut app = AppState::with_records(sample_users());
        let mut d = InlineDispatcher::new(Down);
        handle_key(&mut app, key(KeyCode::Char('r')), &mut d);
        drain_completions(&mut app, &mut d);
        assert!(app.store.is_empty());
        assert!(app.load_error.is_some());
        assert!(!app.loading);
        assert!(app.page_items().is_empty());
    }

    #[test]
    fn department_cycle_wraps_through_empty() {
        assert_eq!(cycle_department(Some(Department::Finance), true), None);
        assert_eq!(cycle_department(None, false), Some(Department::Finance));
        assert_eq!(cycle_department(Some(Department::Sales), false), Some(Department::Marketing));
    }
}
