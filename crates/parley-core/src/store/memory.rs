//! In-memory document store.
//!
//! Stands in for the database when it cannot be reached at startup, and backs
//! the service tests. Documents live in a map keyed by `session_id`; each one
//! remembers its insertion sequence so unsorted scans and "first match" come
//! back in insertion order, like SQLite's rowid order.
//!
//! Every operation runs under one `std::sync::Mutex` and never awaits while
//! holding it, so each call is atomic with respect to the others.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use parley_types::document::{
    compare_values, document_key, Document, Filter, FindQuery, SortDirection, Update,
};
use parley_types::error::StoreError;

use super::DocumentStore;

#[derive(Default)]
struct MemoryState {
    next_seq: u64,
    documents: HashMap<String, StoredDocument>,
}

struct StoredDocument {
    seq: u64,
    document: Document,
}

impl MemoryState {
    /// Keys of matching documents in insertion order.
    fn matching_keys(&self, filter: &Filter) -> Vec<String> {
        let mut matches: Vec<(&String, &StoredDocument)> = self
            .documents
            .iter()
            .filter(|(_, stored)| filter.matches(&stored.document))
            .collect();
        matches.sort_by_key(|(_, stored)| stored.seq);
        matches.into_iter().map(|(key, _)| key.clone()).collect()
    }

    fn first_match(&self, filter: &Filter) -> Option<String> {
        self.documents
            .iter()
            .filter(|(_, stored)| filter.matches(&stored.document))
            .min_by_key(|(_, stored)| stored.seq)
            .map(|(key, _)| key.clone())
    }
}

/// `DocumentStore` held entirely in process memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<MemoryState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Operations validate before mutating, so a panic elsewhere cannot leave
    // a half-applied write behind; recover the guard instead of failing.
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let state = self.lock();
        Ok(state
            .first_match(filter)
            .and_then(|key| state.documents.get(&key))
            .map(|stored| stored.document.clone()))
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        let key = document_key(&document)?.to_string();
        let mut state = self.lock();
        if state.documents.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.documents.insert(key, StoredDocument { seq, document });
        Ok(())
    }

    async fn update_one(&self, filter: &Filter, update: &Update) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let Some(key) = state.first_match(filter) else {
            return Ok(false);
        };

        let Some(stored) = state.documents.get(&key) else {
            return Ok(false);
        };
        let seq = stored.seq;
        let mut document = stored.document.clone();
        update.apply(&mut document)?;

        let new_key = document_key(&document)?.to_string();
        if new_key != key && state.documents.contains_key(&new_key) {
            return Err(StoreError::DuplicateKey(new_key));
        }
        state.documents.remove(&key);
        state.documents.insert(new_key, StoredDocument { seq, document });
        Ok(true)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<bool, StoreError> {
        let mut state = self.lock();
        match state.first_match(filter) {
            Some(key) => Ok(state.documents.remove(&key).is_some()),
            None => Ok(false),
        }
    }

    async fn fetch(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let state = self.lock();
        let mut documents: Vec<Document> = state
            .matching_keys(&query.filter)
            .iter()
            .filter_map(|key| state.documents.get(key))
            .map(|stored| stored.document.clone())
            .collect();
        drop(state);

        if let Some(sort) = &query.sort {
            // Vec::sort_by is stable: ties keep insertion order.
            documents.sort_by(|a, b| {
                let ord = compare_values(a.get(&sort.field), b.get(&sort.field));
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }

        Ok(documents)
    }
}
