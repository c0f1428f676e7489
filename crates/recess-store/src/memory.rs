use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use recess_types::{Document, DocumentId, Filter, MergeRules};

use crate::collection::{Collection, CollectionConfig};
use crate::error::StoreResult;
use crate::traits::DocumentStore;

/// In-memory document store with no backing file.
///
/// Intended for tests and embedding. Documents live in a [`Collection`]
/// behind an async `RwLock`; every read returns clones.
pub struct InMemoryDocumentStore {
    name: String,
    collection: RwLock<Collection>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new(config: CollectionConfig) -> Self {
        Self {
            name: config.name.clone(),
            collection: RwLock::new(Collection::new(config)),
        }
    }

    /// Create a store pre-populated with `docs`.
    pub fn with_documents(config: CollectionConfig, docs: Vec<Document>) -> StoreResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            collection: RwLock::new(Collection::from_documents(config, docs)?),
        })
    }

    /// A copy of every stored document, in insertion order.
    pub async fn snapshot(&self) -> Vec<Document> {
        self.collection.read().await.documents().to_vec()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(&self, filter: &Filter) -> Option<Document> {
        self.collection.read().await.find_one(filter).cloned()
    }

    async fn find_all(&self, filter: &Filter) -> Vec<Document> {
        self.collection.read().await.find_all(filter)
    }

    async fn insert(&self, doc: Document) -> StoreResult<Document> {
        let mut collection = self.collection.write().await;
        let (stored, _) = collection.insert(doc)?;
        debug!(store = %self.name, id = ?stored.id(), "inserted document");
        Ok(stored)
    }

    async fn update(
        &self,
        id: &DocumentId,
        patch: Document,
        rules: &MergeRules,
    ) -> StoreResult<Option<Document>> {
        let mut collection = self.collection.write().await;
        let updated = collection.update(id, patch, rules)?.map(|(doc, _)| doc);
        debug!(store = %self.name, id = %id, found = updated.is_some(), "updated document");
        Ok(updated)
    }

    async fn len(&self) -> usize {
        self.collection.read().await.len()
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("name", &self.name)
            .finish()
    }
}
