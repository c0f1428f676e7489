use std::time::Duration;

use serde_json::Value;

use recess_types::{Document, DocumentId, Filter, MergeRules, ID_FIELD};

use crate::error::{StoreError, StoreResult};

/// Default deadline for persisting one mutation.
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Static settings for one collection.
#[derive(Clone, Debug)]
pub struct CollectionConfig {
    /// Collection name, used in logs.
    pub name: String,
    /// Fields whose values must be distinct across documents.
    pub unique_fields: Vec<String>,
    /// Deadline for persisting a mutation (file-backed stores only).
    pub persist_timeout: Duration,
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique_fields: Vec::new(),
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
        }
    }

    pub fn unique<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }
}

/// How to reverse one applied mutation.
#[derive(Debug)]
pub enum Undo {
    /// Remove the document appended at the end.
    Inserted,
    /// Restore the previous version at `index`.
    Updated { index: usize, previous: Document },
}

/// The in-memory state shared by every backend: documents in insertion
/// order plus the uniqueness rules.
#[derive(Clone, Debug)]
pub struct Collection {
    config: CollectionConfig,
    docs: Vec<Document>,
}

impl Collection {
    pub fn new(config: CollectionConfig) -> Self {
        Self {
            config,
            docs: Vec::new(),
        }
    }

    /// Build a collection from previously stored documents, checking that
    /// every document has an `_id` and that no unique value repeats.
    pub fn from_documents(config: CollectionConfig, docs: Vec<Document>) -> StoreResult<Self> {
        let mut collection = Self::new(config);
        for doc in docs {
            collection.check_insertable(&doc)?;
            collection.docs.push(doc);
        }
        Ok(collection)
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn find_one(&self, filter: &Filter) -> Option<&Document> {
        self.docs.iter().find(|doc| filter.matches(doc))
    }

    pub fn find_all(&self, filter: &Filter) -> Vec<Document> {
        self.docs
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect()
    }

    fn position(&self, id: &DocumentId) -> Option<usize> {
        let id = id.to_string();
        self.docs
            .iter()
            .position(|doc| doc.get_str(ID_FIELD) == Some(id.as_str()))
    }

    fn check_insertable(&self, doc: &Document) -> StoreResult<()> {
        if doc.get_str(ID_FIELD).is_none() {
            return Err(StoreError::MissingId);
        }
        self.check_unique(doc, None)
    }

    /// Fail if any other document shares `_id` or a unique field value
    /// with `doc`. Absent and `null` values never conflict.
    fn check_unique(&self, doc: &Document, skip: Option<usize>) -> StoreResult<()> {
        let fields = std::iter::once(ID_FIELD)
            .chain(self.config.unique_fields.iter().map(String::as_str));
        for field in fields {
            let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = self
                .docs
                .iter()
                .enumerate()
                .any(|(i, other)| Some(i) != skip && other.get(field) == Some(value));
            if taken {
                return Err(StoreError::UniqueViolation {
                    field: field.to_string(),
                    value: display_value(value),
                });
            }
        }
        Ok(())
    }

    /// Append `doc`. Returns a copy of the stored document and its undo.
    pub fn insert(&mut self, doc: Document) -> StoreResult<(Document, Undo)> {
        self.check_insertable(&doc)?;
        self.docs.push(doc.clone());
        Ok((doc, Undo::Inserted))
    }

    /// Merge `patch` into the document with this identity.
    ///
    /// The `_id` of the stored document never changes. Returns `Ok(None)`
    /// on a miss; the collection is untouched on any error.
    pub fn update(
        &mut self,
        id: &DocumentId,
        patch: Document,
        rules: &MergeRules,
    ) -> StoreResult<Option<(Document, Undo)>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        let previous = self.docs[index].clone();
        let mut merged = previous.clone();
        merged.merge(patch, rules);
        if let Some(original_id) = previous.get(ID_FIELD) {
            merged.insert(ID_FIELD, original_id.clone());
        }
        self.check_unique(&merged, Some(index))?;
        self.docs[index] = merged.clone();
        Ok(Some((merged, Undo::Updated { index, previous })))
    }

    /// Reverse a mutation applied by [`insert`](Self::insert) or
    /// [`update`](Self::update). Must be called before any other mutation.
    pub fn rollback(&mut self, undo: Undo) {
        match undo {
            Undo::Inserted => {
                self.docs.pop();
            }
            Undo::Updated { index, previous } => {
                if let Some(slot) = self.docs.get_mut(index) {
                    *slot = previous;
                }
            }
        }
    }

    /// The whole collection as a pretty-printed JSON array.
    pub fn to_json(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(&self.docs).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
