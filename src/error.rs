//! Error taxonomy shared by the API layer and the mutation coordinator.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::UserId;

/// Editable user fields, used to key validation messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Department,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::FirstName, Field::LastName, Field::Email, Field::Department];

    /// Label shown next to the field in forms.
    pub fn label(self) -> &'static str {
        match self {
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Email => "Email",
            Field::Department => "Department",
        }
    }
}

/// One message per failing field.
#[derive(Error, Clone, Debug, Default, PartialEq, Eq)]
#[error("{}", join_messages(.errors))]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field` unless one is already present.
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Forget the message for `field`, if any.
    pub fn remove(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    /// Message recorded for `field`.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn join_messages(errors: &BTreeMap<Field, String>) -> String {
    errors.values().map(String::as_str).collect::<Vec<_>>().join("; ")
}

/// Failures reported by a [`crate::api::UserApi`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("user {id} not found")]
    NotFound { id: UserId },

    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    /// No user with this id.
    pub fn not_found(id: UserId) -> Self {
        Self::NotFound { id }
    }

    /// Transport-level failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Non-success answer from the server.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errs = ValidationErrors::new();
        errs.add(Field::Email, "Email is required");
        errs.add(Field::Email, "Please enter a valid email address");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.get(Field::Email), Some("Email is required"));
    }

    #[test]
    fn validation_errors_display_joins_messages_in_field_order() {
        let mut errs = ValidationErrors::new();
        errs.add(Field::Email, "Email is required");
        errs.add(Field::FirstName, "First name is required");
        assert_eq!(errs.to_string(), "First name is required; Email is required");
        assert_eq!(
            ApiError::from(errs).to_string(),
            "validation failed: First name is required; Email is required"
        );
    }

    #[test]
    fn api_error_messages_carry_context() {
        assert_eq!(ApiError::not_found(3).to_string(), "user 3 not found");
        assert_eq!(
            ApiError::server(503, "unavailable").to_string(),
            "server error (503): unavailable"
        );
    }
}
