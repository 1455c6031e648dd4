// libs/shared/database/src/memory.rs
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use tracing::debug;

use shared_models::StoreError;

/// A value that can be kept in an [`InMemoryStore`], keyed by its own identifier.
pub trait Record: Clone {
    type Id: Clone + Eq + Hash + Display;

    fn record_id(&self) -> &Self::Id;
}

/// Id-keyed arena that remembers insertion order.
///
/// Iteration always walks records in the order they were first inserted;
/// `replace` keeps a record's original position.
#[derive(Debug, Clone)]
pub struct InMemoryStore<T: Record> {
    records: HashMap<T::Id, T>,
    order: Vec<T::Id>,
}

impl<T: Record> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn insert(&mut self, record: T) -> Result<(), StoreError> {
        let id = record.record_id().clone();
        if self.records.contains_key(&id) {
            return Err(StoreError::DuplicateKey(id.to_string()));
        }

        debug!("Inserting record {}", id);
        self.order.push(id.clone());
        self.records.insert(id, record);
        Ok(())
    }

    pub fn get(&self, id: &T::Id) -> Result<&T, StoreError> {
        self.records
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn replace(&mut self, record: T) -> Result<(), StoreError> {
        let id = record.record_id().clone();
        match self.records.get_mut(&id) {
            Some(slot) => {
                debug!("Replacing record {}", id);
                *slot = record;
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    pub fn remove(&mut self, id: &T::Id) -> Result<T, StoreError> {
        let removed = self
            .records
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.order.retain(|existing| existing != id);
        debug!("Removed record {}", id);
        Ok(removed)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Walks the records currently stored, oldest insertion first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(move |id| self.records.get(id))
    }
}
