//! In-memory simulated backend.
//!
//! Keeps its own list of users, hands out ids as `max + 1`, and can be slowed
//! down to mimic network latency. Seeds either from the built-in sample list
//! or from a JSON file (a bare array of users, or a `{ "users": [...] }`
//! envelope whose entries may carry `company.department`).

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use super::{DeleteResponse, UserApi};
use crate::error::{ApiError, ApiResult};
use crate::model::{Department, User, UserId, UserInput};
use crate::validate::validate_user_input;

pub struct InMemoryApi {
    users: Vec<User>,
    latency: Duration,
}

impl InMemoryApi {
    /// Backend seeded with `users`; new ids continue after the largest one.
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            latency: Duration::ZERO,
        }
    }

    /// Backend seeded with the five sample users.
    pub fn with_sample_data() -> Self {
        Self::new(sample_users())
    }

    /// Load seed users from a JSON file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read seed file {}", path.display()))?;
        let users = parse_seed(&raw).with_context(|| format!("parse seed file {}", path.display()))?;
        tracing::info!(count = users.len(), path = %path.display(), "loaded seed users");
        Ok(Self::new(users))
    }

    /// Sleep this long before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Current contents, in insertion order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }

    fn next_id(&self) -> UserId {
        self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1
    }

    fn position(&self, id: UserId) -> ApiResult<usize> {
        self.users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| ApiError::not_found(id))
    }
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::with_sample_data()
    }
}

impl UserApi for InMemoryApi {
    fn list_users(&mut self, limit: usize, offset: usize) -> ApiResult<Vec<User>> {
        self.simulate_latency();
        Ok(self.users.iter().skip(offset).take(limit).cloned().collect())
    }

    fn get_user(&mut self, id: UserId) -> ApiResult<User> {
        self.simulate_latency();
        let idx = self.position(id)?;
        Ok(self.users[idx].clone())
    }

    fn create_user(&mut self, input: &UserInput) -> ApiResult<User> {
        self.simulate_latency();
        let input = input.normalized();
        validate_user_input(&input)?;
        let user = User::from_input(self.next_id(), &input).ok_or_else(|| {
            ApiError::server(500, "validated input lost its department")
        })?;
        self.users.push(user.clone());
        Ok(user)
    }

    fn update_user(&mut self, id: UserId, input: &UserInput) -> ApiResult<User> {
        self.simulate_latency();
        let idx = self.position(id)?;
        let input = input.normalized();
        validate_user_input(&input)?;
        let user = User::from_input(id, &input).ok_or_else(|| {
            ApiError::server(500, "validated input lost its department")
        })?;
        self.users[idx] = user.clone();
        Ok(user)
    }

    fn delete_user(&mut self, id: UserId) -> ApiResult<DeleteResponse> {
        self.simulate_latency();
        let idx = self.position(id)?;
        self.users.remove(idx);
        Ok(DeleteResponse { success: true })
    }
}

/// The five users the dashboard starts with when no seed file is given.
pub fn sample_users() -> Vec<User> {
    let rows = [
        (1, "John", "Doe", "john.doe@example.com", Department::Engineering),
        (2, "Jane", "Smith", "jane.smith@example.com", Department::Marketing),
        (3, "Mike", "Johnson", "mike.johnson@example.com", Department::Sales),
        (4, "Sarah", "Wilson", "sarah.wilson@example.com", Department::HR),
        (5, "David", "Brown", "david.brown@example.com", Department::Finance),
    ];
    rows.into_iter()
        .map(|(id, first, last, email, department)| User {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            department,
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedFile {
    Envelope { users: Vec<SeedUser> },
    List(Vec<SeedUser>),
}

#[derive(Deserialize)]
struct SeedCompany {
    department: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedUser {
    id: UserId,
    first_name: String,
    last_name: String,
    email: String,
    department: Option<String>,
    company: Option<SeedCompany>,
}

/// Parse seed JSON, skipping entries whose department is missing or unknown.
pub fn parse_seed(raw: &str) -> serde_json::Result<Vec<User>> {
    let entries = match serde_json::from_str::<SeedFile>(raw)? {
        SeedFile::Envelope { users } | SeedFile::List(users) => users,
    };
    let users = entries
        .into_iter()
        .filter_map(|e| {
            let dept_name = e
                .department
                .or_else(|| e.company.and_then(|c| c.department))
                .unwrap_or_default();
            match dept_name.parse::<Department>() {
                Ok(department) => Some(User {
                    id: e.id,
                    first_name: e.first_name,
                    last_name: e.last_name,
                    email: e.email,
                    department,
                }),
                Err(err) => {
                    tracing::warn!(id = e.id, %err, "skipping seed user");
                    None
                }
            }
        })
        .collect();
    Ok(users)
}
