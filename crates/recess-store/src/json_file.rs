use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use recess_types::{Document, DocumentId, Filter, MergeRules};

use crate::collection::{Collection, CollectionConfig, Undo};
use crate::error::{StoreError, StoreResult};
use crate::traits::DocumentStore;

/// Document store backed by a single JSON file.
///
/// The file holds the whole collection as a top-level JSON array. It is read
/// once at open; after every successful mutation the entire array is
/// rewritten through a temporary file in the same directory followed by an
/// atomic rename.
///
/// The collection's write lock is held across the rewrite, so readers never
/// see a mutation that could still be rolled back. If the rewrite fails or
/// misses the persist deadline, the mutation is undone in memory and the
/// error is returned.
pub struct JsonFileStore {
    name: String,
    path: PathBuf,
    persist_timeout: Duration,
    collection: RwLock<Collection>,
    #[cfg(test)]
    rename_pause: Duration,
}

const PENDING: u8 = 0;
const COMMITTED: u8 = 1;
const ABANDONED: u8 = 2;

/// Decides, exactly once, whether a background write may rename its temp
/// file into place or must be dropped.
#[derive(Debug, Default)]
struct PersistTicket(AtomicU8);

impl PersistTicket {
    /// Claim the rename. `false` if the caller already gave up.
    fn commit(&self) -> bool {
        self.0
            .compare_exchange(PENDING, COMMITTED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Give up on the write. `false` if the rename was already claimed.
    fn abandon(&self) -> bool {
        self.0
            .compare_exchange(PENDING, ABANDONED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// An absent file means an empty collection; the file is created on the
    /// first write. A file that cannot be read or parsed is an error.
    pub fn open(path: impl Into<PathBuf>, config: CollectionConfig) -> StoreResult<Self> {
        let path = path.into();
        let docs = load_documents(&path)?;
        let count = docs.len();
        let collection = Collection::from_documents(config, docs).map_err(|e| match e {
            StoreError::UniqueViolation { .. } | StoreError::MissingId => StoreError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            },
            other => other,
        })?;
        let name = collection.name().to_string();
        let persist_timeout = collection.config().persist_timeout;
        info!(store = %name, path = %path.display(), documents = count, "opened JSON store");
        Ok(Self {
            name,
            path,
            persist_timeout,
            collection: RwLock::new(collection),
            #[cfg(test)]
            rename_pause: Duration::ZERO,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A copy of every stored document, in insertion order.
    pub async fn snapshot(&self) -> Vec<Document> {
        self.collection.read().await.documents().to_vec()
    }

    /// Rewrite the backing file from `collection` on the blocking pool,
    /// bounded by the persist deadline.
    ///
    /// A deadline that fires after the blocking task has claimed the rename
    /// does not abandon the write; the outcome of the rename is awaited
    /// instead, so the file never diverges from what the caller keeps.
    async fn persist(&self, collection: &Collection) -> StoreResult<()> {
        let bytes = collection.to_json()?;
        let path = self.path.clone();
        let ticket = Arc::new(PersistTicket::default());
        let claim = Arc::clone(&ticket);
        let pause = self.rename_pause();
        let mut task =
            tokio::task::spawn_blocking(move || write_atomic(&path, &bytes, &claim, pause));

        let joined = match tokio::time::timeout(self.persist_timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) if ticket.abandon() => return Err(StoreError::Timeout(self.persist_timeout)),
            Err(_) => {
                debug!(store = %self.name, "deadline passed mid-rename; awaiting the write");
                task.await
            }
        };
        joined.map_err(|join| StoreError::Io(io::Error::other(join.to_string())))?
    }

    #[cfg(test)]
    fn rename_pause(&self) -> Duration {
        self.rename_pause
    }

    #[cfg(not(test))]
    fn rename_pause(&self) -> Duration {
        Duration::ZERO
    }

    /// Persist after an in-memory mutation, undoing it on failure.
    async fn commit(&self, collection: &mut Collection, undo: Undo) -> StoreResult<()> {
        if let Err(e) = self.persist(collection).await {
            warn!(store = %self.name, error = %e, "persist failed; rolling back");
            collection.rollback(undo);
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
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
        let (stored, undo) = collection.insert(doc)?;
        self.commit(&mut collection, undo).await?;
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
        let Some((updated, undo)) = collection.update(id, patch, rules)? else {
            debug!(store = %self.name, id = %id, "update missed");
            return Ok(None);
        };
        self.commit(&mut collection, undo).await?;
        debug!(store = %self.name, id = %id, "updated document");
        Ok(Some(updated))
    }

    async fn len(&self) -> usize {
        self.collection.read().await.len()
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

fn load_documents(path: &Path) -> StoreResult<Vec<Document>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
///
/// Skips the rename if the caller has abandoned the write. `pause` delays
/// the rename after it has been claimed.
fn write_atomic(
    path: &Path,
    bytes: &[u8],
    ticket: &PersistTicket,
    pause: Duration,
) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    if !ticket.commit() {
        return Ok(());
    }
    if !pause.is_zero() {
        std::thread::sleep(pause);
    }
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
