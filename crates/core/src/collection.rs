//! Arena-style record collection keyed by generated id.
//!
//! Records keep insertion order (the order they were recorded in), and a
//! secondary index maps ids to positions. Relationships between collections are
//! explicit id fields; a collection never owns records of another.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone)]
pub struct Collection<T: Entity> {
    records: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a collection from persisted records, rejecting duplicate ids.
    pub fn from_records(records: Vec<T>) -> DomainResult<Self> {
        let mut collection = Self::new();
        for record in records {
            collection.insert(record)?;
        }
        Ok(collection)
    }

    pub fn insert(&mut self, record: T) -> DomainResult<&T> {
        let id = *record.id();
        if self.index.contains_key(&id) {
            return Err(DomainError::conflict(format!("{} {id} already exists", T::KIND)));
        }
        self.index.insert(id, self.records.len());
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// Like `get`, but a missing id is a `NotFound` error.
    pub fn require(&self, id: &T::Id) -> DomainResult<&T> {
        self.get(id)
            .ok_or_else(|| DomainError::not_found(format!("{} {id}", T::KIND)))
    }

    pub fn require_mut(&mut self, id: &T::Id) -> DomainResult<&mut T> {
        match self.index.get(id) {
            Some(&pos) => Ok(&mut self.records[pos]),
            None => Err(DomainError::not_found(format!("{} {id}", T::KIND))),
        }
    }

    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let pos = self.index.remove(id)?;
        let removed = self.records.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::MovementId;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: MovementId,
        text: String,
    }

    impl Entity for Note {
        type Id = MovementId;
        const KIND: &'static str = "note";

        fn id(&self) -> &Self::Id {
            &self.id
        }
    }

    fn note(text: &str) -> Note {
        Note {
            id: MovementId::new(),
            text: text.to_string(),
        }
    }

    #[test]
    fn remove_keeps_index_consistent() {
        let mut c = Collection::new();
        let a = note("a");
        let b = note("b");
        let d = note("d");
        c.insert(a.clone()).unwrap();
        c.insert(b.clone()).unwrap();
        c.insert(d.clone()).unwrap();

        assert_eq!(c.remove(&a.id), Some(a));
        assert_eq!(c.get(&b.id).unwrap().text, "b");
        assert_eq!(c.get(&d.id).unwrap().text, "d");
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn duplicate_insert_is_a_conflict() {
        let mut c = Collection::new();
        let a = note("a");
        c.insert(a.clone()).unwrap();
        assert!(matches!(c.insert(a), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn require_reports_kind_and_id() {
        let c: Collection<Note> = Collection::new();
        let id = MovementId::new();
        assert_eq!(c.require(&id).unwrap_err(), DomainError::NotFound(format!("note {id}")));
    }

    #[test]
    fn from_records_keeps_order_and_rejects_duplicates() {
        let first = note("first");
        let c = Collection::from_records(vec![first.clone(), note("second")]).unwrap();
        let texts: Vec<_> = c.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);

        let err = Collection::from_records(vec![first.clone(), first]).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
