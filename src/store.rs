//! The record store: the session's authoritative list of users.
//!
//! Only the mutation coordinator changes it, and only after the matching API
//! call has succeeded. Everything else reads it.

use crate::model::{DepartmentStats, User, UserId};

#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    records: Vec<User>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list, dropping later duplicates of an id.
    pub fn from_records(records: Vec<User>) -> Self {
        let mut store = Self::new();
        store.replace_all(records);
        store
    }

    /// All records in store order.
    pub fn records(&self) -> &[User] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record with `id`, if present.
    pub fn get(&self, id: UserId) -> Option<&User> {
        self.records.iter().find(|u| u.id == id)
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.get(id).is_some()
    }

    /// Swap in a freshly fetched list.
    pub fn replace_all(&mut self, records: Vec<User>) {
        self.records.clear();
        for user in records {
            if self.contains(user.id) {
                tracing::warn!(id = user.id, "duplicate id in fetched list; keeping first");
                continue;
            }
            self.records.push(user);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Append a new record. An existing record with the same id is replaced in
    /// place instead, so ids stay unique.
    ///
    /// Returns `true` when the record was appended.
    pub fn insert(&mut self, user: User) -> bool {
        match self.records.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user;
                false
            }
            None => {
                self.records.push(user);
                true
            }
        }
    }

    /// Overwrite the editable fields of the record with `user.id`.
    ///
    /// Returns `false` when no such record exists.
    pub fn replace(&mut self, user: &User) -> bool {
        match self.records.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                existing.apply(user);
                true
            }
            None => false,
        }
    }

    /// Remove the record with `id`. Returns the removed record, if any.
    pub fn remove(&mut self, id: UserId) -> Option<User> {
        let idx = self.records.iter().position(|u| u.id == id)?;
        Some(self.records.remove(idx))
    }

    /// Per-department counts.
    pub fn stats(&self) -> DepartmentStats {
        DepartmentStats::from_users(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Department;

    fn user(id: UserId, first: &str) -> User {
        User {
            id,
            first_name: first.into(),
            last_name: "Doe".into(),
            email: format!("{}@example.com", first.to_lowercase()),
            department: Department::Engineering,
        }
    }

    #[test]
    fn replace_all_drops_duplicate_ids() {
        let store = RecordStore::from_records(vec![user(1, "John"), user(1, "Jack"), user(2, "Jane")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().first_name, "John");
    }

    #[test]
    fn insert_with_existing_id_replaces_in_place() {
        let mut store = RecordStore::from_records(vec![user(1, "John"), user(2, "Jane")]);
        assert!(!store.insert(user(1, "Johnny")));
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].first_name, "Johnny");
        assert!(store.insert(user(3, "Mike")));
        assert_eq!(store.records()[2].id, 3);
    }

    #[test]
    fn replace_keeps_position_and_id() {
        let mut store = RecordStore::from_records(vec![user(1, "John"), user(2, "Jane")]);
        let mut edited = user(2, "Janet");
        edited.department = Department::Sales;
        assert!(store.replace(&edited));
        assert_eq!(store.records()[1].first_name, "Janet");
        assert_eq!(store.records()[1].department, Department::Sales);
        assert!(!store.replace(&user(9, "Ghost")));
    }

    #[test]
    fn remove_missing_id_is_a_no_op() {
        let mut store = RecordStore::from_records(vec![user(1, "John")]);
        assert!(store.remove(5).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(1).map(|u| u.id), Some(1));
        assert!(store.is_empty());
    }
}
