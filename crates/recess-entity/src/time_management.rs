//! Per-user time-off records.
//!
//! Each user has at most one record holding a list of dated entries, kept
//! sorted by day. The first entry for a user creates the record.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use recess_schema::{DefaultValue, FieldSpec, SchemaDescriptor};
use recess_store::{CollectionConfig, DocumentStore};
use recess_types::{Document, DocumentId, Filter, Timestamp};

use crate::error::{EntityError, EntityResult, ValidationError};
use crate::service::{collection_config, EntityService, NoHooks};
use crate::user::UserService;

/// Canonical time-off reasons.
pub const TIME_OFF_TYPES: [&str; 5] = ["WFH", "On Vacation", "Out Sick", "In Late", "Out Early"];

/// The time-management document type.
pub fn time_management_schema() -> SchemaDescriptor {
    SchemaDescriptor::new("time-management")
        .field("userId", FieldSpec::string().required().trim().unique())
        .field("dates", FieldSpec::list().default(DefaultValue::EmptyList))
}

/// One day off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOffEntry {
    /// Display form, e.g. `Jan 5, 2024`.
    pub date: String,
    /// Epoch milliseconds of the day's UTC midnight.
    pub time: i64,
    pub reason: String,
}

impl TimeOffEntry {
    pub fn new(day: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            date: day.format("%b %-d, %Y").to_string(),
            time: Timestamp::start_of_day(day).epoch_millis(),
            reason: reason.into(),
        }
    }
}

/// Outcome of [`TimeManagementService::add_time_off`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddTimeOff {
    /// The user's first entry; a new record was created.
    Created,
    Added,
    /// The day was already recorded with another reason.
    ReasonUpdated,
    /// The day was already recorded with this reason.
    AlreadyExists,
}

impl AddTimeOff {
    pub fn message(self) -> &'static str {
        match self {
            Self::Created | Self::Added | Self::ReasonUpdated => "Addition successful!",
            Self::AlreadyExists => "This type of time off already exists for this date.",
        }
    }
}

/// Outcome of [`TimeManagementService::delete_time_off`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteTimeOff {
    Deleted,
    NothingToDelete,
}

impl DeleteTimeOff {
    pub fn message(self) -> &'static str {
        match self {
            Self::Deleted => "Deletion successful!",
            Self::NothingToDelete => "Nothing to delete!",
        }
    }
}

/// A user's time off joined with their display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTimeOff {
    pub user_id: String,
    pub display_name: Option<String>,
    pub dates: Vec<TimeOffEntry>,
}

/// Someone who is off on a given day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffOnDay {
    pub user_id: String,
    pub display_name: Option<String>,
    pub date: String,
    pub reason: String,
}

/// Parse `YYYY-MM-DD`, or take the date part of an RFC 3339 timestamp.
pub fn parse_day(input: &str) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::MissingField("date".into()));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| Timestamp::parse(input).map(|t| t.date()))
        .map_err(|_| ValidationError::invalid("date", format!("'{input}' is not a date")))
}

/// Map a reason case-insensitively onto [`TIME_OFF_TYPES`]; unknown
/// reasons are kept as given.
pub fn canonical_reason(reason: &str) -> String {
    let reason = reason.trim();
    TIME_OFF_TYPES
        .iter()
        .find(|t| t.eq_ignore_ascii_case(reason))
        .map_or_else(|| reason.to_string(), |t| t.to_string())
}

fn entries(doc: &Document) -> Vec<TimeOffEntry> {
    let Some(items) = doc.get_array("dates") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(id = ?doc.id(), error = %e, "skipping malformed time-off entry");
                None
            }
        })
        .collect()
}

/// Stored entries as raw values. Writers edit only the matched item, so
/// entries that do not parse survive untouched.
fn raw_dates(doc: &Document) -> Vec<Value> {
    doc.get_array("dates").cloned().unwrap_or_default()
}

fn entry_time(item: &Value) -> Option<i64> {
    item.get("time").and_then(Value::as_i64)
}

fn entry_value(entry: &TimeOffEntry) -> EntityResult<Value> {
    serde_json::to_value(entry).map_err(|e| EntityError::Internal(e.to_string()))
}

/// Time-off records over a document store.
pub struct TimeManagementService {
    entity: EntityService,
}

impl TimeManagementService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            entity: EntityService::new(
                Arc::new(time_management_schema()),
                store,
                Arc::new(NoHooks),
            ),
        }
    }

    /// Store settings for the time-management collection.
    pub fn collection_config() -> CollectionConfig {
        collection_config(&time_management_schema())
    }

    pub fn entity(&self) -> &EntityService {
        &self.entity
    }

    pub fn time_off_types() -> &'static [&'static str] {
        &TIME_OFF_TYPES
    }

    async fn record(&self, user_id: &DocumentId) -> Option<Document> {
        self.entity
            .find_one(&Filter::new().eq("userId", user_id.to_string()))
            .await
    }

    /// The user's entries, sorted by day; empty if they have no record.
    pub async fn time_off(&self, user_id: &DocumentId) -> Vec<TimeOffEntry> {
        self.record(user_id)
            .await
            .map(|doc| entries(&doc))
            .unwrap_or_default()
    }

    pub async fn add_time_off(
        &self,
        user_id: &DocumentId,
        date: &str,
        reason: &str,
    ) -> EntityResult<AddTimeOff> {
        let day = parse_day(date)?;
        let reason = canonical_reason(reason);
        if reason.is_empty() {
            return Err(ValidationError::MissingField("reason".into()).into());
        }
        let entry = TimeOffEntry::new(day, reason);

        let guard = self.entity.begin_write().await;
        let Some(doc) = self.record(user_id).await else {
            let input = Document::new()
                .with("userId", user_id.to_string())
                .with("dates", Value::Array(vec![entry_value(&entry)?]));
            self.entity.create_with(&guard, input).await?;
            info!(user = %user_id, day = %day, "time-off record created");
            return Ok(AddTimeOff::Created);
        };
        let Some(id) = doc.id() else {
            return Err(EntityError::Internal(
                "stored time-off record has no valid _id".into(),
            ));
        };

        let mut dates = raw_dates(&doc);
        let same_day = dates.iter().position(|d| entry_time(d) == Some(entry.time));
        let outcome = match same_day {
            Some(pos) if dates[pos]["reason"].as_str() == Some(entry.reason.as_str()) => {
                return Ok(AddTimeOff::AlreadyExists);
            }
            Some(pos) => {
                dates[pos]["reason"] = Value::String(entry.reason);
                AddTimeOff::ReasonUpdated
            }
            None => {
                let at = dates
                    .iter()
                    .position(|d| entry_time(d).is_some_and(|t| t > entry.time))
                    .unwrap_or(dates.len());
                dates.insert(at, entry_value(&entry)?);
                AddTimeOff::Added
            }
        };
        self.entity
            .update_with(&guard, &id, Document::new().with("dates", dates))
            .await?;
        info!(user = %user_id, day = %day, outcome = ?outcome, "time off added");
        Ok(outcome)
    }

    pub async fn delete_time_off(
        &self,
        user_id: &DocumentId,
        date: &str,
    ) -> EntityResult<DeleteTimeOff> {
        let day = parse_day(date)?;
        let time = Timestamp::start_of_day(day).epoch_millis();

        let guard = self.entity.begin_write().await;
        let Some((doc, id)) = self
            .record(user_id)
            .await
            .and_then(|doc| doc.id().map(|id| (doc, id)))
        else {
            return Ok(DeleteTimeOff::NothingToDelete);
        };
        let mut dates = raw_dates(&doc);
        let Some(pos) = dates.iter().position(|d| entry_time(d) == Some(time)) else {
            return Ok(DeleteTimeOff::NothingToDelete);
        };
        dates.remove(pos);
        self.entity
            .update_with(&guard, &id, Document::new().with("dates", dates))
            .await?;
        info!(user = %user_id, day = %day, "time off deleted");
        Ok(DeleteTimeOff::Deleted)
    }

    /// Every user's time off, with display names from `users`.
    pub async fn all_time_off(&self, users: &UserService) -> Vec<UserTimeOff> {
        let mut out = Vec::new();
        for doc in self.entity.find_all(&Filter::new()).await {
            let Some(user_id) = doc.get_str("userId").map(str::to_string) else {
                continue;
            };
            out.push(UserTimeOff {
                display_name: display_name_of(users, &user_id).await,
                dates: entries(&doc),
                user_id,
            });
        }
        out
    }

    /// Who is off on `day`, and why.
    pub async fn time_off_on(&self, users: &UserService, day: NaiveDate) -> Vec<TimeOffOnDay> {
        let time = Timestamp::start_of_day(day).epoch_millis();
        let mut out = Vec::new();
        for record in self.all_time_off(users).await {
            if let Some(entry) = record.dates.into_iter().find(|d| d.time == time) {
                out.push(TimeOffOnDay {
                    user_id: record.user_id,
                    display_name: record.display_name,
                    date: entry.date,
                    reason: entry.reason,
                });
            }
        }
        out
    }
}

async fn display_name_of(users: &UserService, user_id: &str) -> Option<String> {
    let id = DocumentId::parse(user_id).ok()?;
    users
        .find_by_id(&id)
        .await
        .and_then(|doc| doc.get_str("displayName").map(str::to_string))
}

impl std::fmt::Debug for TimeManagementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeManagementService")
            .field("entity", &self.entity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use recess_crypto::{HasherConfig, PasswordPolicy, SecretHasher};
    use recess_store::InMemoryDocumentStore;
    use recess_types::ID_FIELD;
    use serde_json::json;

    fn service() -> TimeManagementService {
        TimeManagementService::new(Arc::new(InMemoryDocumentStore::new(
            TimeManagementService::collection_config(),
        )))
    }

    fn users() -> UserService {
        UserService::new(
            Arc::new(InMemoryDocumentStore::new(UserService::collection_config())),
            SecretHasher::new(HasherConfig::low_cost()).unwrap(),
            PasswordPolicy::default(),
        )
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn entry_has_display_date_and_midnight_time() {
        let entry = TimeOffEntry::new(day("2024-01-05"), "WFH");
        assert_eq!(entry.date, "Jan 5, 2024");
        assert_eq!(entry.time, 1_704_412_800_000);
    }

    #[test]
    fn parse_day_accepts_dates_and_timestamps() {
        assert_eq!(parse_day("2024-01-05").unwrap(), day("2024-01-05"));
        assert_eq!(parse_day("2024-01-05T15:30:00Z").unwrap(), day("2024-01-05"));
        assert!(matches!(
            parse_day("tomorrow"),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(matches!(parse_day(" "), Err(ValidationError::MissingField(_))));
    }

    #[test]
    fn reasons_are_coerced_case_insensitively() {
        assert_eq!(canonical_reason("wfh"), "WFH");
        assert_eq!(canonical_reason(" out sick "), "Out Sick");
        assert_eq!(canonical_reason("Vacation"), "Vacation");
    }

    #[tokio::test]
    async fn first_add_creates_record_and_repeat_is_already_exists() {
        let svc = service();
        let user = DocumentId::new();

        let first = svc.add_time_off(&user, "2024-01-05", "Vacation").await.unwrap();
        assert_eq!(first, AddTimeOff::Created);
        assert_eq!(svc.entity().len().await, 1);
        assert_eq!(svc.time_off(&user).await.len(), 1);

        let again = svc.add_time_off(&user, "2024-01-05", "Vacation").await.unwrap();
        assert_eq!(again, AddTimeOff::AlreadyExists);
        assert_eq!(svc.time_off(&user).await.len(), 1);
        assert_eq!(svc.entity().len().await, 1);
    }

    #[tokio::test]
    async fn same_day_new_reason_updates_in_place() {
        let svc = service();
        let user = DocumentId::new();
        svc.add_time_off(&user, "2024-01-05", "wfh").await.unwrap();
        let out = svc.add_time_off(&user, "2024-01-05", "out sick").await.unwrap();
        assert_eq!(out, AddTimeOff::ReasonUpdated);
        let dates = svc.time_off(&user).await;
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].reason, "Out Sick");
    }

    #[tokio::test]
    async fn entries_stay_sorted_by_day() {
        let svc = service();
        let user = DocumentId::new();
        for date in ["2024-03-01", "2024-01-15", "2024-02-10", "2023-12-31"] {
            svc.add_time_off(&user, date, "WFH").await.unwrap();
        }
        let times: Vec<i64> = svc.time_off(&user).await.iter().map(|d| d.time).collect();
        let mut sorted = times.clone();
        sorted.sort_unstable();
        assert_eq!(times, sorted);
        assert_eq!(times.len(), 4);
    }

    #[tokio::test]
    async fn delete_outcomes() {
        let svc = service();
        let user = DocumentId::new();
        assert_eq!(
            svc.delete_time_off(&user, "2024-01-05").await.unwrap(),
            DeleteTimeOff::NothingToDelete
        );
        svc.add_time_off(&user, "2024-01-05", "WFH").await.unwrap();
        assert_eq!(
            svc.delete_time_off(&user, "2024-01-06").await.unwrap(),
            DeleteTimeOff::NothingToDelete
        );
        assert_eq!(
            svc.delete_time_off(&user, "2024-01-05").await.unwrap(),
            DeleteTimeOff::Deleted
        );
        assert!(svc.time_off(&user).await.is_empty());
    }

    #[tokio::test]
    async fn invalid_input_is_validation_error() {
        let svc = service();
        let user = DocumentId::new();
        let err = svc.add_time_off(&user, "not a date", "WFH").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = svc.add_time_off(&user, "2024-01-05", "  ").await.unwrap_err();
        assert!(matches!(
            err,
            EntityError::Validation(ValidationError::MissingField(ref f)) if f == "reason"
        ));
        assert!(svc.entity().is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_adds_lose_nothing() {
        let svc = Arc::new(service());
        let user = DocumentId::new();
        let handles: Vec<_> = (1..=20)
            .map(|d| {
                let svc = Arc::clone(&svc);
                tokio::spawn(async move {
                    svc.add_time_off(&user, &format!("2024-05-{d:02}"), "WFH").await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(svc.time_off(&user).await.len(), 20);
        assert_eq!(svc.entity().len().await, 1);
    }

    #[tokio::test]
    async fn all_and_today_join_display_names() {
        let users = users();
        let alice = users
            .create_user(
                Document::from_value(json!({
                    "username": "alice", "firstName": "A", "lastName": "Lice",
                    "email": "a@x.com", "password": "Str0ng!Pass"
                }))
                .unwrap(),
            )
            .await
            .unwrap()
            .id()
            .unwrap();
        let ghost = DocumentId::new();

        let svc = service();
        svc.add_time_off(&alice, "2024-01-05", "WFH").await.unwrap();
        svc.add_time_off(&alice, "2024-01-08", "Out Sick").await.unwrap();
        svc.add_time_off(&ghost, "2024-01-05", "In Late").await.unwrap();

        let all = svc.all_time_off(&users).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].display_name.as_deref(), Some("A Lice"));
        assert_eq!(all[0].dates.len(), 2);
        assert_eq!(all[1].display_name, None);

        let off = svc.time_off_on(&users, day("2024-01-05")).await;
        assert_eq!(off.len(), 2);
        assert_eq!(off[0].reason, "WFH");
        assert_eq!(off[1].reason, "In Late");
        assert!(svc.time_off_on(&users, day("2024-01-06")).await.is_empty());
    }

    #[tokio::test]
    async fn writes_keep_entries_that_do_not_parse() {
        let uid = DocumentId::new();
        let unreadable = json!({
            "date": "Jan 3, 2024",
            "time": 1_704_240_000_000.0_f64,
            "reason": "WFH"
        });
        let record = Document::new()
            .with(ID_FIELD, DocumentId::new().to_string())
            .with("userId", uid.to_string())
            .with("dates", json!([unreadable.clone()]));
        let store = InMemoryDocumentStore::with_documents(
            TimeManagementService::collection_config(),
            vec![record],
        )
        .unwrap();
        let svc = TimeManagementService::new(Arc::new(store));
        assert!(svc.time_off(&uid).await.is_empty());

        let added = svc.add_time_off(&uid, "2024-01-05", "Vacation").await.unwrap();
        assert_eq!(added, AddTimeOff::Added);
        let dates = svc.time_off(&uid).await;
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].reason, "Vacation");

        let deleted = svc.delete_time_off(&uid, "2024-01-05").await.unwrap();
        assert_eq!(deleted, DeleteTimeOff::Deleted);
        let stored = svc
            .entity()
            .find_one(&Filter::new().eq("userId", uid.to_string()))
            .await
            .unwrap();
        assert_eq!(stored.get("dates"), Some(&json!([unreadable])));
    }

    #[test]
    fn types_are_the_canonical_reasons() {
        assert_eq!(
            TimeManagementService::time_off_types(),
            &["WFH", "On Vacation", "Out Sick", "In Late", "Out Early"]
        );
    }
}
