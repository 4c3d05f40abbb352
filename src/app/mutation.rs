//! Mutation coordinator: load, create, update and delete.
//!
//! Each operation runs validate, then the API call, then reconcile. The record
//! store is only touched once the call has succeeded; a failure leaves the
//! store and the derived view exactly as they were and becomes a
//! notification. Create, delete and load go back to page 1; update keeps the
//! current page.
//!
//! Two ways in:
//! - `prepare_*` + [`apply_completion`] split an operation around an
//!   asynchronous [`Dispatch`], which is what the event loop uses;
//! - [`load`], [`create`], [`update`], [`delete`] run the whole thing against a
//!   `UserApi` on the calling thread.

use tracing::{info, warn};

use super::AppState;
use crate::api::UserApi;
use crate::api::worker::{ApiReply, ApiRequest, Completion, Dispatch, RequestId, execute};
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::model::{User, UserId, UserInput};
use crate::validate::validate_user_input;

/// What a successful completion changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    Loaded(usize),
    Fetched(User),
    Created(User),
    Updated(User),
    Deleted(UserId),
}

/// Result of a delete that went through the confirmation gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// List request for the first `fetch_limit` users.
pub fn prepare_load(app: &AppState) -> ApiRequest {
    ApiRequest::List {
        limit: app.settings.fetch_limit,
        offset: 0,
    }
}

/// Validate `input` and build the create request.
pub fn prepare_create(input: &UserInput) -> Result<ApiRequest, ValidationErrors> {
    let input = input.normalized();
    validate_user_input(&input)?;
    Ok(ApiRequest::Create(input))
}

/// Validate `input` and build the update request for `id`.
pub fn prepare_update(id: UserId, input: &UserInput) -> Result<ApiRequest, ValidationErrors> {
    let input = input.normalized();
    validate_user_input(&input)?;
    Ok(ApiRequest::Update(id, input))
}

/// Submit a (re)load of the user list.
pub fn start_load(app: &mut AppState, dispatch: &mut dyn Dispatch) -> RequestId {
    app.loading = true;
    let id = dispatch.submit(prepare_load(app));
    app.in_flight = dispatch.in_flight();
    id
}

/// Fold a finished request into the session.
pub fn apply_completion(app: &mut AppState, completion: Completion) -> ApiResult<Applied> {
    apply_result(app, &completion.request, completion.result)
}

/// Reconcile the store with the outcome of `request`.
pub fn apply_result(
    app: &mut AppState,
    request: &ApiRequest,
    result: ApiResult<ApiReply>,
) -> ApiResult<Applied> {
    let outcome = match result {
        Ok(reply) => reconcile(app, request, reply),
        Err(err) => Err(err),
    };
    match &outcome {
        Ok(applied) => on_success(app, applied),
        Err(err) => on_failure(app, request, err),
    }
    outcome
}

fn unexpected(request: &ApiRequest) -> ApiError {
    ApiError::server(502, format!("unexpected reply to {}", request.describe()))
}

fn reconcile(app: &mut AppState, request: &ApiRequest, reply: ApiReply) -> ApiResult<Applied> {
    match (request, reply) {
        (ApiRequest::List { .. }, ApiReply::Users(users)) => {
            app.store.replace_all(users);
            Ok(Applied::Loaded(app.store.len()))
        }
        (ApiRequest::Get(_), ApiReply::User(user)) => Ok(Applied::Fetched(user)),
        (ApiRequest::Create(_), ApiReply::User(user)) => {
            if !app.store.insert(user.clone()) {
                warn!(id = user.id, "created user reused an existing id; replaced it");
            }
            Ok(Applied::Created(user))
        }
        (ApiRequest::Update(id, _), ApiReply::User(user)) => {
            // the id we asked for is authoritative
            let user = User { id: *id, ..user };
            if !app.store.replace(&user) {
                warn!(id, "updated user is no longer in the store; ignoring");
            }
            Ok(Applied::Updated(user))
        }
        (ApiRequest::Delete(id), ApiReply::Deleted(resp)) => {
            if !resp.success {
                return Err(ApiError::server(500, format!("delete of user {id} was not acknowledged")));
            }
            if app.store.remove(*id).is_none() {
                warn!(id, "deleted user was not in the store");
            }
            Ok(Applied::Deleted(*id))
        }
        _ => Err(unexpected(request)),
    }
}

fn on_success(app: &mut AppState, applied: &Applied) {
    match applied {
        Applied::Loaded(n) => {
            info!(count = n, "users loaded");
            app.loading = false;
            app.load_error = None;
            app.current_page = 1;
            app.selected_row = 0;
        }
        Applied::Fetched(_) => {}
        Applied::Created(user) => {
            info!(id = user.id, "user created");
            app.current_page = 1;
            app.selected_row = 0;
            app.notify_success(format!("User {} created successfully!", user.full_name()));
        }
        Applied::Updated(user) => {
            info!(id = user.id, "user updated");
            app.notify_success(format!("User {} updated successfully!", user.full_name()));
        }
        Applied::Deleted(id) => {
            info!(id, "user deleted");
            app.current_page = 1;
            app.selected_row = 0;
            app.notify_success("User deleted successfully!");
        }
    }
    app.refresh_view();
}

fn on_failure(app: &mut AppState, request: &ApiRequest, err: &ApiError) {
    warn!(request = %request.describe(), error = %err, "request failed");
    let message = match request {
        ApiRequest::List { .. } => {
            // an empty table beats a crashed one
            app.loading = false;
            app.store.clear();
            app.load_error = Some(err.to_string());
            app.refresh_view();
            format!("Failed to fetch users: {err}")
        }
        ApiRequest::Get(_) => format!("Failed to fetch user: {err}"),
        ApiRequest::Create(_) => format!("Failed to create user: {err}"),
        ApiRequest::Update(..) => format!("Failed to update user: {err}"),
        ApiRequest::Delete(_) => format!("Failed to delete user: {err}"),
    };
    app.notify_error(message);
}

/// Fetch the list and replace the store with it.
pub fn load(app: &mut AppState, api: &mut dyn UserApi) -> ApiResult<usize> {
    let request = prepare_load(app);
    app.loading = true;
    let result = execute(api, &request);
    match apply_result(app, &request, result)? {
        Applied::Loaded(n) => Ok(n),
        _ => Err(unexpected(&request)),
    }
}

/// Validate, create through `api`, then append to the store.
pub fn create(app: &mut AppState, api: &mut dyn UserApi, input: &UserInput) -> ApiResult<User> {
    let request = match prepare_create(input) {
        Ok(r) => r,
        Err(errors) => return Err(reject(app, errors)),
    };
    match apply_result(app, &request, execute(api, &request))? {
        Applied::Created(user) => Ok(user),
        _ => Err(unexpected(&request)),
    }
}

/// Validate, update through `api`, then replace the record in place.
pub fn update(
    app: &mut AppState,
    api: &mut dyn UserApi,
    id: UserId,
    input: &UserInput,
) -> ApiResult<User> {
    let request = match prepare_update(id, input) {
        Ok(r) => r,
        Err(errors) => return Err(reject(app, errors)),
    };
    match apply_result(app, &request, execute(api, &request))? {
        Applied::Updated(user) => Ok(user),
        _ => Err(unexpected(&request)),
    }
}

/// Ask `confirm`, then delete through `api` and drop the record.
///
/// A declined confirmation makes no API call.
pub fn delete(
    app: &mut AppState,
    api: &mut dyn UserApi,
    id: UserId,
    confirm: impl FnOnce(UserId) -> bool,
) -> ApiResult<DeleteOutcome> {
    if !confirm(id) {
        return Ok(DeleteOutcome::Cancelled);
    }
    let request = ApiRequest::Delete(id);
    match apply_result(app, &request, execute(api, &request))? {
        Applied::Deleted(_) => Ok(DeleteOutcome::Deleted),
        _ => Err(unexpected(&request)),
    }
}

fn reject(app: &mut AppState, errors: ValidationErrors) -> ApiError {
    app.notify_error(format!("Please fix the form: {errors}"));
    ApiError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DeleteResponse;
    use crate::api::memory::{InMemoryApi, sample_users};
    use crate::model::Department;

    fn app() -> AppState {
        AppState::with_records(sample_users())
    }

    #[test]
    fn update_keeps_page_and_replaces_in_place() {
        let mut api = InMemoryApi::with_sample_data();
        let mut app = app();
        app.set_items_per_page(crate::pager::ItemsPerPage::Ten);
        let input = UserInput::new("Janet", "Smith", "janet@example.com", Some(Department::Sales));
        let user = update(&mut app, &mut api, 2, &input).unwrap();
        assert_eq!(user.id, 2);
        assert_eq!(app.store.records()[1].first_name, "Janet");
        assert_eq!(app.store.len(), 5);
    }

    #[test]
    fn mismatched_reply_is_rejected_without_mutation() {
        let mut app = app();
        let request = ApiRequest::Delete(1);
        let result = Ok(ApiReply::Deleted(DeleteResponse { success: false }));
        assert!(apply_result(&mut app, &request, result).is_err());
        assert!(app.store.contains(1));

        let wrong = Ok(ApiReply::Users(Vec::new()));
        assert!(apply_result(&mut app, &ApiRequest::Get(1), wrong).is_err());
        assert_eq!(app.store.len(), 5);
    }

    #[test]
    fn stale_update_for_removed_record_is_ignored() {
        let mut app = app();
        app.store.remove(3);
        let user = User {
            id: 3,
            first_name: "Mike".into(),
            last_name: "Johnson".into(),
            email: "mike@example.com".into(),
            department: Department::Sales,
        };
        let input = UserInput::from(&user);
        let applied = apply_result(&mut app, &ApiRequest::Update(3, input), Ok(ApiReply::User(user)));
        assert!(applied.is_ok());
        assert!(!app.store.contains(3));
    }

    #[test]
    fn load_failure_empties_store_and_sets_banner() {
        let mut app = app();
        let err = apply_result(
            &mut app,
            &ApiRequest::List { limit: 100, offset: 0 },
            Err(ApiError::network("connection refused")),
        );
        assert!(err.is_err());
        assert!(app.store.is_empty());
        assert_eq!(app.total_pages(), 1);
        assert!(app.page_items().is_empty());
        assert!(app.load_error.as_deref().unwrap().contains("connection refused"));
    }
}
