//! User accounts: schema, credential handling, and profile operations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use recess_crypto::{generate_passphrase, CryptoResult, PasswordPolicy, SecretHasher};
use recess_schema::{DefaultValue, FieldSpec, SchemaDescriptor};
use recess_store::{CollectionConfig, DocumentStore};
use recess_types::{Document, DocumentId, Filter, Timestamp};

use crate::error::{EntityError, EntityResult, ValidationError};
use crate::service::{collection_config, EntityHooks, EntityService};

/// Number of previous credential hashes kept for reuse checks.
pub const HISTORY_LIMIT: usize = 5;

/// Fields removed before a user document leaves the service boundary.
pub const HIDDEN_FIELDS: [&str; 6] = [
    "password",
    "lastPasswords",
    "internalName",
    "created",
    "resetPasswordToken",
    "resetPasswordExpires",
];

/// Fields a user may change through [`UserService::update_profile`].
pub const PROFILE_FIELDS: [&str; 3] = ["firstName", "lastName", "username"];

const RESET_ATTEMPTS: usize = 16;

/// The user document type.
pub fn user_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("user")
        .field("internalName", FieldSpec::string().locked().unique())
        .field(
            "roles",
            FieldSpec::list()
                .one_of(["user", "admin"])
                .default(DefaultValue::Literal(json!(["user"]))),
        )
        .field("displayName", FieldSpec::string().locked().trim())
        .field("firstName", FieldSpec::string().required().trim())
        .field("lastName", FieldSpec::string().required().trim())
        .field("username", FieldSpec::string().required().trim())
        .field("email", FieldSpec::string().required().trim())
        .field("password", FieldSpec::string().required().secret())
        .field("passwordUpdatedLast", FieldSpec::date().locked())
        .field(
            "lastPasswords",
            FieldSpec::list()
                .locked()
                .max(HISTORY_LIMIT)
                .default(DefaultValue::EmptyList),
        )
        .field("lastLogin", FieldSpec::date())
        .field("resetPasswordToken", FieldSpec::string())
        .field("resetPasswordExpires", FieldSpec::date())
}

/// Outcome of [`UserService::change_password`].
#[derive(Debug, Clone, PartialEq)]
pub enum PasswordChange {
    Changed(Document),
    WrongCurrentPassword,
    RecentlyUsed,
}

impl PasswordChange {
    /// Message shown to the user for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Changed(_) => "Successful password change.",
            Self::WrongCurrentPassword => "Current password does not match.",
            Self::RecentlyUsed => {
                "This password was used within the last 5 password changes. Please choose a different one."
            }
        }
    }
}

async fn blocking<T, F>(f: F) -> EntityResult<T>
where
    F: FnOnce() -> CryptoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EntityError::Internal(e.to_string()))?
        .map_err(Into::into)
}

/// Derived user fields: lookup key, display name, and credential hashing.
struct UserHooks {
    hasher: SecretHasher,
}

impl UserHooks {
    /// Replace a plaintext `password` in `doc` with its hash and push the
    /// hash onto `history`, newest first.
    async fn rotate_secret(&self, doc: &mut Document, mut history: Vec<Value>) -> EntityResult<()> {
        let Some(value) = doc.get("password") else {
            return Ok(());
        };
        let plaintext = value
            .as_str()
            .ok_or_else(|| ValidationError::invalid("password", "must be a string"))?
            .to_string();
        let hasher = self.hasher.clone();
        let hash = blocking(move || hasher.hash(&plaintext)).await?;

        history.insert(0, Value::String(hash.clone()));
        history.truncate(HISTORY_LIMIT);
        doc.insert("password", hash);
        doc.insert("passwordUpdatedLast", Timestamp::now().to_value());
        doc.insert("lastPasswords", history);
        Ok(())
    }
}

fn internal_name(username: &Value) -> EntityResult<String> {
    username
        .as_str()
        .map(str::to_lowercase)
        .ok_or_else(|| ValidationError::invalid("username", "must be a string").into())
}

fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default())
}

#[async_trait]
impl EntityHooks for UserHooks {
    async fn before_create(&self, doc: &mut Document) -> EntityResult<()> {
        if let Some(username) = doc.get("username") {
            let name = internal_name(username)?;
            doc.insert("internalName", name);
        }
        let display = display_name(doc.get_str("firstName"), doc.get_str("lastName"));
        doc.insert("displayName", display);

        let history = doc.get_array("lastPasswords").cloned().unwrap_or_default();
        self.rotate_secret(doc, history).await
    }

    async fn before_update(&self, current: &Document, patch: &mut Document) -> EntityResult<()> {
        if let Some(username) = patch.get("username") {
            let name = internal_name(username)?;
            patch.insert("internalName", name);
        }
        if patch.contains_key("firstName") || patch.contains_key("lastName") {
            let first = patch.get_str("firstName").or(current.get_str("firstName"));
            let last = patch.get_str("lastName").or(current.get_str("lastName"));
            let display = display_name(first, last);
            patch.insert("displayName", display);
        }

        let history = current.get_array("lastPasswords").cloned().unwrap_or_default();
        self.rotate_secret(patch, history).await
    }
}

/// User accounts over a document store.
pub struct UserService {
    entity: EntityService,
    hasher: SecretHasher,
    policy: PasswordPolicy,
}

impl UserService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        hasher: SecretHasher,
        policy: PasswordPolicy,
    ) -> Self {
        let hooks = Arc::new(UserHooks {
            hasher: hasher.clone(),
        });
        Self {
            entity: EntityService::new(Arc::new(user_schema()), store, hooks),
            hasher,
            policy,
        }
    }

    /// Store settings for the user collection.
    pub fn collection_config() -> CollectionConfig {
        collection_config(&user_schema())
    }

    pub fn entity(&self) -> &EntityService {
        &self.entity
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    pub async fn create_user(&self, input: Document) -> EntityResult<Document> {
        self.entity.create(input).await
    }

    pub async fn update_user(
        &self,
        id: &DocumentId,
        patch: Document,
    ) -> EntityResult<Option<Document>> {
        self.entity.update(id, patch).await
    }

    pub async fn find_by_id(&self, id: &DocumentId) -> Option<Document> {
        self.entity.find_by_id(id).await
    }

    /// Case-insensitive lookup by username.
    pub async fn find_by_username(&self, username: &str) -> Option<Document> {
        let key = username.trim().to_lowercase();
        self.entity
            .find_one(&Filter::new().eq("internalName", key))
            .await
    }

    pub async fn find_all(&self) -> Vec<Document> {
        self.entity.find_all(&Filter::new()).await
    }

    /// One-way comparison of `candidate` with the stored credential.
    pub async fn compare_secret(&self, doc: &Document, candidate: &str) -> EntityResult<bool> {
        let Some(stored) = doc.get_str("password").map(str::to_string) else {
            return Ok(false);
        };
        let hasher = self.hasher.clone();
        let candidate = candidate.to_string();
        blocking(move || hasher.verify(&candidate, &stored)).await
    }

    /// `true` if `candidate` matches any hash in the credential history.
    pub async fn compare_against_history(
        &self,
        doc: &Document,
        candidate: &str,
    ) -> EntityResult<bool> {
        let history: Vec<String> = doc
            .get_array("lastPasswords")
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if history.is_empty() {
            return Ok(false);
        }
        let hasher = self.hasher.clone();
        let candidate = candidate.to_string();
        blocking(move || hasher.verify_any(&candidate, history.iter().map(String::as_str))).await
    }

    /// Apply the password policy.
    pub fn check_strength(&self, password: &str) -> Result<(), ValidationError> {
        if self.policy.is_strong(password) {
            Ok(())
        } else {
            Err(ValidationError::WeakPassword(self.policy.requirement_hint()))
        }
    }

    /// Replace the credential after checking the current one and the
    /// reuse history. The whole sequence holds the writer.
    pub async fn change_password(
        &self,
        id: &DocumentId,
        current: &str,
        new: &str,
    ) -> EntityResult<PasswordChange> {
        self.check_strength(new)?;
        let guard = self.entity.begin_write().await;
        let doc = self
            .entity
            .find_by_id(id)
            .await
            .ok_or_else(|| EntityError::not_found(self.entity.entity(), id))?;

        if !self.compare_secret(&doc, current).await? {
            warn!(id = %id, "password change rejected: current password mismatch");
            return Ok(PasswordChange::WrongCurrentPassword);
        }
        if self.compare_against_history(&doc, new).await? {
            warn!(id = %id, "password change rejected: recently used");
            return Ok(PasswordChange::RecentlyUsed);
        }

        let updated = self
            .entity
            .update_with(&guard, id, Document::new().with("password", new))
            .await?
            .ok_or_else(|| EntityError::not_found(self.entity.entity(), id))?;
        info!(id = %id, "password changed");
        Ok(PasswordChange::Changed(updated))
    }

    /// Stamp `lastLogin` with the current time.
    pub async fn record_login(&self, id: &DocumentId) -> EntityResult<Option<Document>> {
        self.entity
            .update(id, Document::new().with("lastLogin", Timestamp::now().to_value()))
            .await
    }

    /// Check a username/password pair. On success the login is recorded
    /// and the safe view returned.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> EntityResult<Option<Document>> {
        let Some(doc) = self.find_by_username(username).await else {
            warn!(username, "login rejected: unknown user");
            return Ok(None);
        };
        if !self.compare_secret(&doc, password).await? {
            warn!(username, "login rejected: wrong password");
            return Ok(None);
        }
        let Some(id) = doc.id() else {
            return Err(EntityError::Internal("stored user has no valid _id".into()));
        };
        let logged_in = self.record_login(&id).await?.unwrap_or(doc);
        info!(id = %id, "login");
        Ok(Some(Self::safe_view(&logged_in)))
    }

    /// Replace the credential with a generated passphrase and return the
    /// plaintext. It is not retrievable afterwards.
    pub async fn reset_password(&self, id: &DocumentId) -> EntityResult<String> {
        let passphrase = self.generate_passphrase()?;
        let guard = self.entity.begin_write().await;
        self.entity
            .update_with(&guard, id, Document::new().with("password", passphrase.as_str()))
            .await?
            .ok_or_else(|| EntityError::not_found(self.entity.entity(), id))?;
        info!(id = %id, "password reset");
        Ok(passphrase)
    }

    /// A random passphrase that satisfies the configured policy.
    pub fn generate_passphrase(&self) -> EntityResult<String> {
        let mut rng = rand::thread_rng();
        (0..RESET_ATTEMPTS)
            .map(|_| generate_passphrase(&mut rng))
            .find(|p| self.policy.is_strong(p))
            .ok_or_else(|| {
                EntityError::Internal("no generated passphrase met the password policy".into())
            })
    }

    /// Change first name, last name, or username. Other fields in `input`
    /// are ignored. Names must contain only letters.
    pub async fn update_profile(
        &self,
        id: &DocumentId,
        input: &Document,
    ) -> EntityResult<Option<Document>> {
        let mut patch = Document::new();
        for field in PROFILE_FIELDS {
            if let Some(value) = input.get(field) {
                patch.insert(field, value.clone());
            }
        }
        for field in ["firstName", "lastName"] {
            if let Some(value) = patch.get(field) {
                let valid = value
                    .as_str()
                    .map(str::trim)
                    .is_some_and(|s| !s.is_empty() && s.chars().all(char::is_alphabetic));
                if !valid {
                    return Err(ValidationError::invalid(field, "must contain only letters").into());
                }
            }
        }
        if let Some(value) = patch.get("username") {
            if !value.as_str().is_some_and(|s| !s.trim().is_empty()) {
                return Err(ValidationError::invalid("username", "is required").into());
            }
        }
        if patch.is_empty() {
            return Ok(self.find_by_id(id).await);
        }
        self.update_user(id, patch).await
    }

    /// A copy of `doc` safe to send to a client.
    pub fn safe_view(doc: &Document) -> Document {
        EntityService::to_safe_view(doc, HIDDEN_FIELDS)
    }
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("entity", &self.entity)
            .finish()
    }
}
