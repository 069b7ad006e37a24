//! Document store contract for session persistence.
//!
//! `DocumentStore` is the port the infrastructure layer implements. Two
//! implementations exist and must be observably identical: a SQLite store in
//! `parley-infra` and [`memory::MemoryDocumentStore`] here, used when the
//! database cannot be reached at startup (and in tests).
//!
//! Follows the same RPITIT + box-wrapper pattern as `LlmProvider`:
//! [`BoxDocumentStore`] erases the concrete backend so it can be picked at
//! runtime.

pub mod cursor;
pub mod memory;

use std::future::Future;
use std::pin::Pin;

use parley_types::document::{Document, Filter, FindQuery, Update};
use parley_types::error::StoreError;

pub use cursor::Cursor;

/// Repository-style trait for the session document store.
///
/// Implementations live in parley-infra (e.g., `SqliteDocumentStore`) and in
/// [`memory`]. Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs and health output (e.g., "sqlite").
    fn backend(&self) -> &str;

    /// Return the first document matching `filter`.
    ///
    /// Which document is first is unspecified when several match; only rely
    /// on this for lookups by unique key.
    fn find_one(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Insert a new document. Fails with [`StoreError::DuplicateKey`] if the
    /// document's `session_id` is already present.
    fn insert_one(
        &self,
        document: Document,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Apply `update` to the first document matching `filter`.
    ///
    /// Returns whether a document matched. No match is not an error.
    fn update_one(
        &self,
        filter: &Filter,
        update: &Update,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Remove the first document matching `filter`. Returns whether one was removed.
    fn delete_one(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Execute a scan. Prefer [`DocumentStore::find`], which builds the query.
    fn fetch(
        &self,
        query: &FindQuery,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Start a cursor over every document matching `filter`.
    fn find(&self, filter: Filter) -> Cursor<'_, Self>
    where
        Self: Sized,
    {
        Cursor::new(self, filter)
    }
}

/// Object-safe version of [`DocumentStore`] with boxed futures.
///
/// A blanket implementation is provided for all types implementing `DocumentStore`.
pub trait DocumentStoreDyn: Send + Sync {
    fn backend_name(&self) -> &str;

    fn find_one_boxed<'a>(
        &'a self,
        filter: &'a Filter,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Document>, StoreError>> + Send + 'a>>;

    fn insert_one_boxed<'a>(
        &'a self,
        document: Document,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;

    fn update_one_boxed<'a>(
        &'a self,
        filter: &'a Filter,
        update: &'a Update,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + 'a>>;

    fn delete_one_boxed<'a>(
        &'a self,
        filter: &'a Filter,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + 'a>>;

    fn fetch_boxed<'a>(
        &'a self,
        query: &'a FindQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>, StoreError>> + Send + 'a>>;
}

impl<T: DocumentStore> DocumentStoreDyn for T {
    fn backend_name(&self) -> &str {
        DocumentStore::backend(self)
    }

    fn find_one_boxed<'a>(
        &'a self,
        filter: &'a Filter,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Document>, StoreError>> + Send + 'a>> {
        Box::pin(self.find_one(filter))
    }

    fn insert_one_boxed<'a>(
        &'a self,
        document: Document,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(self.insert_one(document))
    }

    fn update_one_boxed<'a>(
        &'a self,
        filter: &'a Filter,
        update: &'a Update,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + 'a>> {
        Box::pin(self.update_one(filter, update))
    }

    fn delete_one_boxed<'a>(
        &'a self,
        filter: &'a Filter,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + 'a>> {
        Box::pin(self.delete_one(filter))
    }

    fn fetch_boxed<'a>(
        &'a self,
        query: &'a FindQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>, StoreError>> + Send + 'a>> {
        Box::pin(self.fetch(query))
    }
}

/// Type-erased document store for runtime backend selection.
///
/// The application decides at startup whether the database is reachable and
/// wraps either backend in a `BoxDocumentStore`; the service never knows which.
pub struct BoxDocumentStore {
    inner: Box<dyn DocumentStoreDyn + Send + Sync>,
}

impl BoxDocumentStore {
    /// Wrap a concrete `DocumentStore` in a type-erased box.
    pub fn new<T: DocumentStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }
}

impl DocumentStore for BoxDocumentStore {
    fn backend(&self) -> &str {
        self.inner.backend_name()
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.inner.find_one_boxed(filter).await
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        self.inner.insert_one_boxed(document).await
    }

    async fn update_one(&self, filter: &Filter, update: &Update) -> Result<bool, StoreError> {
        self.inner.update_one_boxed(filter, update).await
    }

    async fn delete_one(&self, filter: &Filter) -> Result<bool, StoreError> {
        self.inner.delete_one_boxed(filter).await
    }

    async fn fetch(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        self.inner.fetch_boxed(query).await
    }
}
