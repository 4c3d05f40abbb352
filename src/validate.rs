//! Input validation for create and update.
//!
//! The rule set is the strict one: names are 2-50 characters of letters,
//! spaces, hyphens and apostrophes; emails must have a `local@domain.tld`
//! shape, a conventional character set, and at most 100 characters.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Field, ValidationErrors};
use crate::model::UserInput;

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 100;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("email shape regex: {e}"))
});

static EMAIL_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .unwrap_or_else(|e| panic!("email format regex: {e}"))
});

static NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z\s'-]+$").unwrap_or_else(|e| panic!("name regex: {e}"))
});

/// Basic `local@domain.tld` shape check.
pub fn is_email_shaped(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

fn check_name(errors: &mut ValidationErrors, field: Field, value: &str) {
    let label = field.label();
    let v = value.trim();
    let len = v.chars().count();
    if v.is_empty() {
        errors.add(field, format!("{label} is required"));
    } else if len < NAME_MIN_LEN {
        errors.add(field, format!("{label} must be at least {NAME_MIN_LEN} characters long"));
    } else if len > NAME_MAX_LEN {
        errors.add(field, format!("{label} must be less than {NAME_MAX_LEN} characters"));
    } else if !NAME_CHARS.is_match(v) {
        errors.add(
            field,
            format!("{label} can only contain letters, spaces, hyphens, and apostrophes"),
        );
    }
}

fn check_email(errors: &mut ValidationErrors, value: &str) {
    let v = value.trim();
    if v.is_empty() {
        errors.add(Field::Email, "Email is required");
    } else if !is_email_shaped(v) {
        errors.add(Field::Email, "Please enter a valid email address");
    } else if v.chars().count() > EMAIL_MAX_LEN {
        errors.add(Field::Email, format!("Email must be less than {EMAIL_MAX_LEN} characters"));
    } else if !EMAIL_STRICT.is_match(v) {
        errors.add(
            Field::Email,
            "Please enter a valid email format (e.g., user@example.com)",
        );
    }
}

/// Validate a single field, for inline feedback while typing.
pub fn validate_field(input: &UserInput, field: Field) -> Option<String> {
    let mut errors = ValidationErrors::new();
    match field {
        Field::FirstName => check_name(&mut errors, field, &input.first_name),
        Field::LastName => check_name(&mut errors, field, &input.last_name),
        Field::Email => check_email(&mut errors, &input.email),
        Field::Department => {
            if input.department.is_none() {
                errors.add(Field::Department, "Department is required");
            }
        }
    }
    errors.get(field).map(str::to_string)
}

/// Validate all fields of `input`.
pub fn validate_user_input(input: &UserInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for field in Field::ALL {
        if let Some(msg) = validate_field(input, field) {
            errors.add(field, msg);
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Department;

    fn input(first: &str, last: &str, email: &str, dept: Option<Department>) -> UserInput {
        UserInput::new(first, last, email, dept)
    }

    #[test]
    fn accepts_well_formed_input() {
        let ok = input("Mary-Jane", "O'Neil", "mj.oneil@example.com", Some(Department::Sales));
        assert!(validate_user_input(&ok).is_ok());
    }

    #[test]
    fn rejects_bad_email_shape() {
        let bad = input("Anna", "Berg", "bad-email", Some(Department::HR));
        let errs = validate_user_input(&bad).unwrap_err();
        assert_eq!(errs.get(Field::Email), Some("Please enter a valid email address"));
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn rejects_missing_fields_with_one_message_each() {
        let errs = validate_user_input(&UserInput::default()).unwrap_err();
        assert_eq!(errs.len(), 4);
        assert_eq!(errs.get(Field::Department), Some("Department is required"));
        assert_eq!(errs.get(Field::FirstName), Some("First name is required"));
    }

    #[test]
    fn enforces_name_length_and_charset() {
        let short = input("A", "Smith", "a@b.co", Some(Department::HR));
        assert_eq!(
            validate_field(&short, Field::FirstName).as_deref(),
            Some("First name must be at least 2 characters long")
        );
        let digits = input("R2D2", "Smith", "a@b.co", Some(Department::HR));
        assert!(validate_field(&digits, Field::FirstName).unwrap().contains("only contain"));
        let long = input(&"a".repeat(51), "Smith", "a@b.co", Some(Department::HR));
        assert!(validate_field(&long, Field::FirstName).unwrap().contains("less than 50"));
    }

    #[test]
    fn email_length_and_strict_format() {
        let long_local = format!("{}@example.com", "a".repeat(95));
        let long = input("Anna", "Berg", &long_local, Some(Department::HR));
        assert!(validate_field(&long, Field::Email).unwrap().contains("less than 100"));

        let odd = input("Anna", "Berg", "anna@example.c", Some(Department::HR));
        assert!(validate_field(&odd, Field::Email).unwrap().contains("valid email format"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let padded = input("  Anna ", " Berg", " anna@example.com ", Some(Department::HR));
        assert!(validate_user_input(&padded).is_ok());
    }
}
