//! Entity services for Recess.
//!
//! An [`EntityService`] validates and normalizes caller input against a
//! [`SchemaDescriptor`](recess_schema::SchemaDescriptor) before handing it to
//! a [`DocumentStore`](recess_store::DocumentStore):
//!
//! 1. reject input missing a required field
//! 2. drop fields the caller may not set
//! 3. coerce enumerated values and trim strings
//! 4. fill defaults, identity, and creation time
//! 5. run entity hooks (derived fields, credential hashing)
//!
//! Mutations for one entity type go through a single-writer queue.
//!
//! [`UserService`] and [`TimeManagementService`] are the two entity types.

pub mod error;
pub mod service;
pub mod time_management;
pub mod user;

pub use error::{EntityError, EntityResult, ErrorKind, ValidationError};
pub use service::{collection_config, EntityHooks, EntityService, NoHooks, WriteGuard};
pub use time_management::{
    AddTimeOff, DeleteTimeOff, TimeManagementService, TimeOffEntry, TimeOffOnDay, UserTimeOff,
    TIME_OFF_TYPES,
};
pub use user::{PasswordChange, UserService, HIDDEN_FIELDS, HISTORY_LIMIT};
