use std::sync::Arc;

use recess_crypto::{HasherConfig, PasswordPolicy, SecretHasher};
use recess_entity::{TimeManagementService, UserService};
use recess_store::{DocumentStore, InMemoryDocumentStore, JsonFileStore};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Services shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub time_off: Arc<TimeManagementService>,
}

impl AppState {
    pub fn new(
        users_store: Arc<dyn DocumentStore>,
        time_off_store: Arc<dyn DocumentStore>,
        hasher: HasherConfig,
        policy: PasswordPolicy,
    ) -> ServerResult<Self> {
        let hasher = SecretHasher::new(hasher)?;
        Ok(Self {
            users: Arc::new(UserService::new(users_store, hasher, policy)),
            time_off: Arc::new(TimeManagementService::new(time_off_store)),
        })
    }

    /// Open the JSON collection files under `config.data_dir`, creating the
    /// directory if needed. A corrupt file aborts startup.
    pub fn open(config: &ServerConfig) -> ServerResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let timeout = config.persist_timeout();
        let users = JsonFileStore::open(
            config.users_path(),
            UserService::collection_config().persist_timeout(timeout),
        )?;
        let time_off = JsonFileStore::open(
            config.time_management_path(),
            TimeManagementService::collection_config().persist_timeout(timeout),
        )?;
        info!(data_dir = %config.data_dir.display(), "collections loaded");
        Self::new(
            Arc::new(users),
            Arc::new(time_off),
            config.hasher,
            config.password_policy.clone(),
        )
    }

    /// Empty in-memory collections.
    pub fn in_memory(hasher: HasherConfig, policy: PasswordPolicy) -> ServerResult<Self> {
        Self::new(
            Arc::new(InMemoryDocumentStore::new(UserService::collection_config())),
            Arc::new(InMemoryDocumentStore::new(
                TimeManagementService::collection_config(),
            )),
            hasher,
            policy,
        )
    }
}
