//! User records and the input shape used to create or edit them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type UserId = u64;

/// Departments a user can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Department {
    Engineering,
    Marketing,
    Sales,
    HR,
    Finance,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Department::Engineering,
        Department::Marketing,
        Department::Sales,
        Department::HR,
        Department::Finance,
    ];

    /// Display name, also used for search and sort.
    pub fn as_str(self) -> &'static str {
        match self {
            Department::Engineering => "Engineering",
            Department::Marketing => "Marketing",
            Department::Sales => "Sales",
            Department::HR => "HR",
            Department::Finance => "Finance",
        }
    }

    /// Next department in declaration order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous department, wrapping around.
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a department name matches none of the known departments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown department '{0}'")]
pub struct UnknownDepartment(pub String);

impl FromStr for Department {
    type Err = UnknownDepartment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "engineering" => Ok(Department::Engineering),
            "marketing" => Ok(Department::Marketing),
            "sales" => Ok(Department::Sales),
            "hr" | "human resources" => Ok(Department::HR),
            "finance" => Ok(Department::Finance),
            _ => Err(UnknownDepartment(s.to_string())),
        }
    }
}

/// A user record as held by the record store and returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Department,
}

impl User {
    /// Build a record from an id and validated input.
    ///
    /// Returns `None` when the input has no department.
    pub fn from_input(id: UserId, input: &UserInput) -> Option<Self> {
        Some(Self {
            id,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            department: input.department?,
        })
    }

    /// `first last`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Overwrite the four editable fields, keeping `id`.
    pub fn apply(&mut self, other: &User) {
        self.first_name = other.first_name.clone();
        self.last_name = other.last_name.clone();
        self.email = other.email.clone();
        self.department = other.department;
    }
}

/// Editable fields of a user, as typed into a form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Option<Department>,
}

impl UserInput {
    /// Build an input; fields are normalized before use.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        department: Option<Department>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            department,
        }
    }

    /// Copy with every text field trimmed.
    pub fn normalized(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            department: self.department,
        }
    }
}

impl From<&User> for UserInput {
    fn from(u: &User) -> Self {
        Self {
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            department: Some(u.department),
        }
    }
}

/// Head count overall and per department.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepartmentStats {
    pub total: usize,
    pub per_department: Vec<(Department, usize)>,
}

impl DepartmentStats {
    /// Count users per department.
    pub fn from_users<'a>(users: impl IntoIterator<Item = &'a User>) -> Self {
        let mut counts = [0usize; Department::ALL.len()];
        let mut total = 0;
        for u in users {
            total += 1;
            if let Some(idx) = Department::ALL.iter().position(|d| *d == u.department) {
                counts[idx] += 1;
            }
        }
        let per_department = Department::ALL
            .iter()
            .zip(counts)
            .filter(|(_, n)| *n > 0)
            .map(|(d, n)| (*d, n))
            .collect();
        Self {
            total,
            per_department,
        }
    }

    /// Users in `dept`.
    pub fn count(&self, dept: Department) -> usize {
        self.per_department
            .iter()
            .find(|(d, _)| *d == dept)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}
