use async_trait::async_trait;
use recess_types::{Document, DocumentId, Filter, MergeRules};

use crate::error::StoreResult;

/// An ordered collection of documents for one entity type.
///
/// All implementations must satisfy these invariants:
/// - Documents are kept in insertion order; `find_one` returns the first match.
/// - At most one document per `_id` and per unique field value.
/// - Every returned document is an owned copy.
/// - A failed mutation leaves the collection exactly as it was.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The collection name, used in logs.
    fn name(&self) -> &str;

    /// The first document matching every clause of `filter`.
    async fn find_one(&self, filter: &Filter) -> Option<Document>;

    /// Every matching document, in insertion order.
    async fn find_all(&self, filter: &Filter) -> Vec<Document>;

    /// Look a document up by identity.
    async fn find_by_id(&self, id: &DocumentId) -> Option<Document> {
        self.find_one(&Filter::by_id(id)).await
    }

    /// Append a document and persist.
    ///
    /// Fails with `UniqueViolation` if its `_id` or any unique field value
    /// is already taken.
    async fn insert(&self, doc: Document) -> StoreResult<Document>;

    /// Merge `patch` into the document with this identity and persist.
    ///
    /// Returns `Ok(None)` if no document has this identity.
    async fn update(
        &self,
        id: &DocumentId,
        patch: Document,
        rules: &MergeRules,
    ) -> StoreResult<Option<Document>>;

    /// Number of stored documents.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
