//! A small identity map with snapshot-based change detection.
//!
//! Attaching an entity stores a pristine copy next to the working copy. Saving
//! compares the two and writes only the columns that differ. Keeping these
//! snapshots is exactly the overhead the change tracking demo measures.

use crate::models::{Customer, CustomerGraph, Person};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Deref, DerefMut};

/// An entity whose persisted columns can be compared against a snapshot.
pub trait Trackable: Clone {
    type Column: Copy + Eq + Debug;

    /// Columns whose value in `self` differs from `original`.
    fn changed_columns(&self, original: &Self) -> Vec<Self::Column>;
}

/// A working copy plus the snapshot it was loaded as.
#[derive(Debug, Clone)]
pub struct Tracked<T: Trackable> {
    original: T,
    current: T,
}

impl<T: Trackable> Tracked<T> {
    pub fn new(entity: T) -> Self {
        Self {
            original: entity.clone(),
            current: entity,
        }
    }

    pub fn original(&self) -> &T {
        &self.original
    }

    pub fn changes(&self) -> Vec<T::Column> {
        self.current.changed_columns(&self.original)
    }

    pub fn is_modified(&self) -> bool {
        !self.changes().is_empty()
    }

    /// Marks the working copy as persisted.
    pub fn accept_changes(&mut self) {
        self.original = self.current.clone();
    }
}

impl<T: Trackable> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.current
    }
}

impl<T: Trackable> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.current
    }
}

/// Tracked entities keyed by primary key, in the order they were attached.
#[derive(Debug, Clone)]
pub struct ChangeTracker<K, T: Trackable> {
    index: HashMap<K, usize>,
    entries: Vec<Tracked<T>>,
}

impl<K: Eq + Hash, T: Trackable> ChangeTracker<K, T> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Attaches an entity under `key`.
    ///
    /// If the key is already tracked the existing entry wins and `entity` is
    /// dropped, so one key never has two working copies.
    pub fn attach(&mut self, key: K, entity: T) -> &mut Tracked<T> {
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                self.entries.push(Tracked::new(entity));
                let position = self.entries.len() - 1;
                self.index.insert(key, position);
                position
            }
        };
        &mut self.entries[position]
    }

    pub fn get(&self, key: &K) -> Option<&Tracked<T>> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut Tracked<T>> {
        self.index.get(key).map(|&position| &mut self.entries[position])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tracked<T>> {
        self.entries.iter()
    }

    /// Entries whose working copy differs from their snapshot.
    pub fn modified(&self) -> impl Iterator<Item = &Tracked<T>> {
        self.entries.iter().filter(|entry| entry.is_modified())
    }
}

impl<K: Eq + Hash, T: Trackable> Default for ChangeTracker<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonColumn {
    PersonType,
    Title,
    FirstName,
    MiddleName,
    LastName,
    ModifiedDate,
}

impl Trackable for Person {
    type Column = PersonColumn;

    fn changed_columns(&self, original: &Self) -> Vec<PersonColumn> {
        let mut changed = Vec::new();
        if self.person_type != original.person_type {
            changed.push(PersonColumn::PersonType);
        }
        if self.title != original.title {
            changed.push(PersonColumn::Title);
        }
        if self.first_name != original.first_name {
            changed.push(PersonColumn::FirstName);
        }
        if self.middle_name != original.middle_name {
            changed.push(PersonColumn::MiddleName);
        }
        if self.last_name != original.last_name {
            changed.push(PersonColumn::LastName);
        }
        if self.modified_date != original.modified_date {
            changed.push(PersonColumn::ModifiedDate);
        }
        changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerColumn {
    PersonId,
    StoreId,
    TerritoryId,
    AccountNumber,
    ModifiedDate,
}

impl Trackable for Customer {
    type Column = CustomerColumn;

    fn changed_columns(&self, original: &Self) -> Vec<CustomerColumn> {
        let mut changed = Vec::new();
        if self.person_id != original.person_id {
            changed.push(CustomerColumn::PersonId);
        }
        if self.store_id != original.store_id {
            changed.push(CustomerColumn::StoreId);
        }
        if self.territory_id != original.territory_id {
            changed.push(CustomerColumn::TerritoryId);
        }
        if self.account_number != original.account_number {
            changed.push(CustomerColumn::AccountNumber);
        }
        if self.modified_date != original.modified_date {
            changed.push(CustomerColumn::ModifiedDate);
        }
        changed
    }
}

// Only the root customer's own columns are persisted from a graph.
impl Trackable for CustomerGraph {
    type Column = CustomerColumn;

    fn changed_columns(&self, original: &Self) -> Vec<CustomerColumn> {
        self.customer.changed_columns(&original.customer)
    }
}
