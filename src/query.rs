//! Search, per-field filters and sorting over the record store.
//!
//! [`derive`] is a pure function of its inputs: it never touches the records,
//! only returns borrowed views of the ones that survive, in display order.

use std::cmp::Ordering;
use std::fmt;

use crate::model::{Department, User};

/// Column a result set can be ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    Id,
    #[default]
    FirstName,
    LastName,
    Email,
    Department,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Id,
        SortField::FirstName,
        SortField::LastName,
        SortField::Email,
        SortField::Department,
    ];

    /// Key used in config and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::FirstName => "firstName",
            SortField::LastName => "lastName",
            SortField::Email => "email",
            SortField::Department => "department",
        }
    }

    /// Column heading.
    pub fn label(self) -> &'static str {
        match self {
            SortField::Id => "ID",
            SortField::FirstName => "First name",
            SortField::LastName => "Last name",
            SortField::Email => "Email",
            SortField::Department => "Department",
        }
    }

    /// Parse a key as written by [`SortField::as_str`], ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Next column, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Ordinal comparison of this field's values.
    pub fn compare(self, a: &User, b: &User) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::FirstName => a.first_name.cmp(&b.first_name),
            SortField::LastName => a.last_name.cmp(&b.last_name),
            SortField::Email => a.email.cmp(&b.email),
            SortField::Department => a.department.as_str().cmp(b.department.as_str()),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Orient an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// The other direction.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Asc),
            "desc" | "descending" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    /// Arrow shown next to the sorted column.
    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

/// Per-field filter criteria plus the sort key. Replaced wholesale on apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Option<Department>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Filters {
    /// True when no field filter would restrict the set. Sort is ignored.
    pub fn is_unrestricted(&self) -> bool {
        self.first_name.trim().is_empty()
            && self.last_name.trim().is_empty()
            && self.email.trim().is_empty()
            && self.department.is_none()
    }

    /// Short human summary of the active field filters, e.g. `dept=Sales`.
    pub fn summary(&self) -> Vec<String> {
        let mut chips = Vec::new();
        if !self.first_name.trim().is_empty() {
            chips.push(format!("first~{}", self.first_name.trim()));
        }
        if !self.last_name.trim().is_empty() {
            chips.push(format!("last~{}", self.last_name.trim()));
        }
        if !self.email.trim().is_empty() {
            chips.push(format!("email~{}", self.email.trim()));
        }
        if let Some(d) = self.department {
            chips.push(format!("dept={d}"));
        }
        chips
    }

    fn matches(&self, user: &User) -> bool {
        contains_ci(&user.first_name, &self.first_name)
            && contains_ci(&user.last_name, &self.last_name)
            && contains_ci(&user.email, &self.email)
            && self.department.is_none_or(|d| d == user.department)
    }
}

/// Case-insensitive substring test. An empty (or blank) needle matches.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_search(user: &User, term_lower: &str) -> bool {
    user.first_name.to_lowercase().contains(term_lower)
        || user.last_name.to_lowercase().contains(term_lower)
        || user.email.to_lowercase().contains(term_lower)
        || user.department.as_str().to_lowercase().contains(term_lower)
}

/// Search, then filter, then stable-sort `records`.
///
/// A blank term skips the search step. Any other term is matched as typed,
/// surrounding whitespace included.
pub fn derive<'a>(records: &'a [User], search_term: &str, filters: &Filters) -> Vec<&'a User> {
    let skip_search = search_term.trim().is_empty();
    let term = search_term.to_lowercase();
    let mut out: Vec<&User> = records
        .iter()
        .filter(|u| skip_search || matches_search(u, &term))
        .filter(|u| filters.matches(u))
        .collect();
    // sort_by is stable; equal keys keep their input order
    out.sort_by(|a, b| filters.sort_order.apply(filters.sort_by.compare(a, b)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(id: u64, first: &str, last: &str, dept: Department) -> User {
        User {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
            department: dept,
        }
    }

    fn sample() -> Vec<User> {
        vec![
            mk(1, "John", "Doe", Department::Engineering),
            mk(2, "Jane", "Smith", Department::Marketing),
            mk(3, "Mike", "Johnson", Department::Sales),
            mk(4, "Sarah", "Wilson", Department::HR),
            mk(5, "David", "Brown", Department::Finance),
        ]
    }

    fn ids(users: &[&User]) -> Vec<u64> {
        users.iter().map(|u| u.id).collect()
    }

    #[test]
    fn blank_search_keeps_everything_sorted_by_first_name() {
        let users = sample();
        let out = derive(&users, "   ", &Filters::default());
        assert_eq!(ids(&out), vec![5, 2, 1, 3, 4]);
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let users = sample();
        assert_eq!(ids(&derive(&users, "JOHN", &Filters::default())), vec![1, 3]);
        assert_eq!(ids(&derive(&users, "market", &Filters::default())), vec![2]);
        assert_eq!(ids(&derive(&users, "nobody", &Filters::default())), Vec::<u64>::new());
        assert_eq!(ids(&derive(&users, "sarah.wilson@", &Filters::default())), vec![4]);
    }

    #[test]
    fn padded_search_term_is_matched_as_typed() {
        let users = sample();
        assert_eq!(ids(&derive(&users, "john ", &Filters::default())), Vec::<u64>::new());
        assert_eq!(ids(&derive(&users, " doe", &Filters::default())), Vec::<u64>::new());
        assert_eq!(ids(&derive(&users, "john", &Filters::default())), vec![1, 3]);
    }

    #[test]
    fn field_filters_and_together_with_search() {
        let users = sample();
        let filters = Filters {
            last_name: "o".into(),
            ..Filters::default()
        };
        // Doe, Johnson, Wilson, Brown
        assert_eq!(ids(&derive(&users, "", &filters)), vec![5, 1, 3, 4]);
        assert_eq!(ids(&derive(&users, "j", &filters)), vec![1, 3]);
    }

    #[test]
    fn department_filter_is_exact() {
        let users = sample();
        let filters = Filters {
            department: Some(Department::HR),
            ..Filters::default()
        };
        assert_eq!(ids(&derive(&users, "", &filters)), vec![4]);
    }

    #[test]
    fn descending_reverses_the_relation() {
        let users = sample();
        let filters = Filters {
            sort_by: SortField::Id,
            sort_order: SortOrder::Desc,
            ..Filters::default()
        };
        assert_eq!(ids(&derive(&users, "", &filters)), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn sort_is_ordinal_not_collated() {
        let users = vec![
            mk(1, "alice", "X", Department::HR),
            mk(2, "Bob", "Y", Department::HR),
        ];
        // uppercase sorts before lowercase in ordinal comparison
        assert_eq!(ids(&derive(&users, "", &Filters::default())), vec![2, 1]);
    }

    #[test]
    fn equal_keys_keep_input_order_in_both_directions() {
        let users = vec![
            mk(1, "Zed", "A", Department::Sales),
            mk(2, "Amy", "B", Department::HR),
            mk(3, "Kim", "C", Department::Sales),
            mk(4, "Bea", "D", Department::Sales),
        ];
        let asc = Filters {
            sort_by: SortField::Department,
            ..Filters::default()
        };
        assert_eq!(ids(&derive(&users, "", &asc)), vec![2, 1, 3, 4]);
        let desc = Filters {
            sort_order: SortOrder::Desc,
            ..asc
        };
        assert_eq!(ids(&derive(&users, "", &desc)), vec![1, 3, 4, 2]);
    }

    #[test]
    fn sort_field_parse_and_cycle() {
        assert_eq!(SortField::parse("LASTNAME"), Some(SortField::LastName));
        assert_eq!(SortField::parse("nope"), None);
        assert_eq!(SortField::Department.next(), SortField::Id);
        assert_eq!(SortOrder::parse("Descending"), Some(SortOrder::Desc));
    }
}
