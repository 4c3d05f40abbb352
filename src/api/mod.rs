//! The user API capability the dashboard talks to.
//!
//! Any backend (the in-memory simulation here, an HTTP client, a database
//! service) plugs in by implementing [`UserApi`]. The rest of the crate never
//! knows which one it has.

pub mod memory;
pub mod worker;

use crate::error::ApiResult;
use crate::model::{User, UserId, UserInput};

/// Outcome of a delete call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Remote user service: list, get, create, update, delete.
pub trait UserApi: Send {
    /// Fetch up to `limit` users starting at `offset`.
    fn list_users(&mut self, limit: usize, offset: usize) -> ApiResult<Vec<User>>;

    /// Fetch one user. Fails with `NotFound` when `id` is unknown.
    fn get_user(&mut self, id: UserId) -> ApiResult<User>;

    /// Create a user; the backend assigns the id.
    fn create_user(&mut self, input: &UserInput) -> ApiResult<User>;

    /// Replace the editable fields of user `id`.
    fn update_user(&mut self, id: UserId, input: &UserInput) -> ApiResult<User>;

    fn delete_user(&mut self, id: UserId) -> ApiResult<DeleteResponse>;
}

impl<A: UserApi + ?Sized> UserApi for Box<A> {
    fn list_users(&mut self, limit: usize, offset: usize) -> ApiResult<Vec<User>> {
        (**self).list_users(limit, offset)
    }

    fn get_user(&mut self, id: UserId) -> ApiResult<User> {
        (**self).get_user(id)
    }

    fn create_user(&mut self, input: &UserInput) -> ApiResult<User> {
        (**self).create_user(input)
    }

    fn update_user(&mut self, id: UserId, input: &UserInput) -> ApiResult<User> {
        (**self).update_user(id, input)
    }

    fn delete_user(&mut self, id: UserId) -> ApiResult<DeleteResponse> {
        (**self).delete_user(id)
    }
}
