//! Chainable, single-use cursor over a document scan.

use parley_types::document::{Document, Filter, FindQuery, Sort, SortDirection};
use parley_types::error::StoreError;

use super::DocumentStore;

/// A scan description bound to a store: filter, optional sort, optional limit.
///
/// Built with [`DocumentStore::find`], refined with [`Cursor::sort`] and
/// [`Cursor::limit`], and consumed exactly once by [`Cursor::into_documents`].
/// Nothing runs against the store until it is consumed.
#[must_use = "a cursor does nothing until it is consumed"]
pub struct Cursor<'a, S: DocumentStore> {
    store: &'a S,
    query: FindQuery,
}

impl<'a, S: DocumentStore> Cursor<'a, S> {
    pub(crate) fn new(store: &'a S, filter: Filter) -> Self {
        Self {
            store,
            query: FindQuery {
                filter,
                sort: None,
                limit: None,
            },
        }
    }

    /// Stable sort on a top-level field. Missing fields sort lowest.
    pub fn sort(mut self, field: &str, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Keep only the first `n` documents after sorting.
    pub fn limit(mut self, n: usize) -> Self {
        self.query.limit = Some(n);
        self
    }

    /// The query this cursor will run.
    pub fn query(&self) -> &FindQuery {
        &self.query
    }

    /// Run the scan and return the matching documents.
    pub async fn into_documents(self) -> Result<Vec<Document>, StoreError> {
        self.store.fetch(&self.query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryDocumentStore;

    #[test]
    fn test_cursor_builds_query() {
        let store = MemoryDocumentStore::new();
        let cursor = store
            .find(Filter::all().ne("is_archived", true))
            .sort("updated_at", SortDirection::Descending)
            .limit(3);

        let query = cursor.query();
        assert_eq!(query.limit, Some(3));
        let sort = query.sort.as_ref().unwrap();
        assert_eq!(sort.field, "updated_at");
        assert_eq!(sort.direction, SortDirection::Descending);
        assert_eq!(query.filter.predicates().len(), 1);
    }

    #[test]
    fn test_later_sort_replaces_earlier() {
        let store = MemoryDocumentStore::new();
        let cursor = store
            .find(Filter::all())
            .sort("created_at", SortDirection::Ascending)
            .sort("updated_at", SortDirection::Descending);
        assert_eq!(cursor.query().sort.as_ref().unwrap().field, "updated_at");
    }
}
