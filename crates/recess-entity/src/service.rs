use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use recess_schema::{
    apply_defaults, check_required, coerce_enums, strip_non_overwritable, trim_strings,
    truncate_bounded_lists, SchemaDescriptor,
};
use recess_store::{CollectionConfig, DocumentStore};
use recess_types::{Document, DocumentId, Filter, MergeRules, Timestamp, CREATED_FIELD, ID_FIELD};

use crate::error::{EntityResult, ValidationError};

/// Entity-specific derivations run after normalization and before the
/// document reaches the store.
///
/// Hooks may set non-overwritable fields; those were stripped from caller
/// input earlier in the pipeline.
#[async_trait]
pub trait EntityHooks: Send + Sync {
    /// Complete a new document. `_id`, `created`, and defaults are already set.
    async fn before_create(&self, _doc: &mut Document) -> EntityResult<()> {
        Ok(())
    }

    /// Adjust an update patch. `current` is the stored version.
    async fn before_update(&self, _current: &Document, _patch: &mut Document) -> EntityResult<()> {
        Ok(())
    }
}

/// Hooks that derive nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

#[async_trait]
impl EntityHooks for NoHooks {}

/// Proof that the holder is the entity's single writer.
///
/// Obtained from [`EntityService::begin_write`]. Mutations queued behind
/// the guard run in FIFO order.
pub struct WriteGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Store settings derived from a schema: collection name and unique fields.
pub fn collection_config(schema: &SchemaDescriptor) -> CollectionConfig {
    CollectionConfig::new(schema.name()).unique(schema.unique_fields())
}

/// Validation and normalization for one document type over a
/// [`DocumentStore`].
///
/// Every mutation passes through a single-writer queue, so
/// read-modify-write sequences on the same entity type never interleave.
pub struct EntityService {
    schema: Arc<SchemaDescriptor>,
    store: Arc<dyn DocumentStore>,
    hooks: Arc<dyn EntityHooks>,
    rules: MergeRules,
    writer: Mutex<()>,
}

impl EntityService {
    pub fn new(
        schema: Arc<SchemaDescriptor>,
        store: Arc<dyn DocumentStore>,
        hooks: Arc<dyn EntityHooks>,
    ) -> Self {
        let rules = schema.merge_rules();
        Self {
            schema,
            store,
            hooks,
            rules,
            writer: Mutex::new(()),
        }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn entity(&self) -> &str {
        self.schema.name()
    }

    /// Wait for exclusive write access.
    pub async fn begin_write(&self) -> WriteGuard<'_> {
        WriteGuard {
            _guard: self.writer.lock().await,
        }
    }

    /// Validate, normalize, and store a new document.
    pub async fn create(&self, input: Document) -> EntityResult<Document> {
        let guard = self.begin_write().await;
        self.create_with(&guard, input).await
    }

    /// [`create`](Self::create) for a caller already holding the writer.
    pub async fn create_with(
        &self,
        _guard: &WriteGuard<'_>,
        mut input: Document,
    ) -> EntityResult<Document> {
        if let Some(field) = check_required(&self.schema, &input) {
            return Err(ValidationError::MissingField(field).into());
        }
        self.normalize(&mut input);
        apply_defaults(&self.schema, &mut input);
        input.insert(ID_FIELD, DocumentId::new().to_string());
        input.insert(CREATED_FIELD, Timestamp::now().to_value());

        self.hooks.before_create(&mut input).await?;
        truncate_bounded_lists(&self.schema, &mut input);

        let stored = self.store.insert(input).await?;
        info!(entity = %self.entity(), id = ?stored.id(), "created");
        Ok(stored)
    }

    /// Merge a partial input into an existing document.
    ///
    /// Returns `Ok(None)` when no document has this identity.
    pub async fn update(&self, id: &DocumentId, patch: Document) -> EntityResult<Option<Document>> {
        let guard = self.begin_write().await;
        self.update_with(&guard, id, patch).await
    }

    /// [`update`](Self::update) for a caller already holding the writer.
    pub async fn update_with(
        &self,
        _guard: &WriteGuard<'_>,
        id: &DocumentId,
        mut patch: Document,
    ) -> EntityResult<Option<Document>> {
        let Some(current) = self.store.find_by_id(id).await else {
            debug!(entity = %self.entity(), id = %id, "update target not found");
            return Ok(None);
        };
        self.normalize(&mut patch);

        // Defaults only fill fields the stored document never had.
        let mut missing = Document::new();
        apply_defaults(&self.schema, &mut missing);
        for (field, value) in missing.into_map() {
            if !patch.contains_key(&field) && !current.contains_key(&field) {
                patch.insert(field, value);
            }
        }

        self.hooks.before_update(&current, &mut patch).await?;
        truncate_bounded_lists(&self.schema, &mut patch);

        let updated = self.store.update(id, patch, &self.rules).await?;
        if updated.is_some() {
            info!(entity = %self.entity(), id = %id, "updated");
        }
        Ok(updated)
    }

    fn normalize(&self, input: &mut Document) {
        let removed = strip_non_overwritable(&self.schema, input);
        if !removed.is_empty() {
            debug!(entity = %self.entity(), fields = ?removed, "dropped non-overwritable fields");
        }
        coerce_enums(&self.schema, input);
        trim_strings(&self.schema, input);
    }

    pub async fn find_by_id(&self, id: &DocumentId) -> Option<Document> {
        self.store.find_by_id(id).await
    }

    pub async fn find_one(&self, filter: &Filter) -> Option<Document> {
        self.store.find_one(filter).await
    }

    pub async fn find_all(&self, filter: &Filter) -> Vec<Document> {
        self.store.find_all(filter).await
    }

    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    /// A deep copy of `doc` without the named fields.
    pub fn to_safe_view<'a>(doc: &Document, hidden: impl IntoIterator<Item = &'a str>) -> Document {
        doc.without(hidden)
    }
}

impl std::fmt::Debug for EntityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityService")
            .field("entity", &self.entity())
            .field("store", &self.store.name())
            .finish()
    }
}
