//! Foundation types for Recess.
//!
//! Every other Recess crate depends on `recess-types`. Documents are plain
//! JSON objects; this crate gives them an identity, a timestamp convention,
//! exact-match filters, and an explicit per-field merge policy.
//!
//! # Key Types
//!
//! - [`DocumentId`]: UUID v7 identity carried in every document's `_id`
//! - [`Timestamp`]: UTC wall-clock time stored as RFC 3339
//! - [`Document`]: an owned JSON object, the unit of storage
//! - [`Filter`]: exact field-equality predicate with dotted-path support
//! - [`MergePolicy`] / [`MergeRules`]: how an update patch lands on a stored document

pub mod document;
pub mod error;
pub mod filter;
pub mod id;
pub mod merge;
pub mod temporal;

pub use document::{Document, CREATED_FIELD, ID_FIELD};
pub use error::TypeError;
pub use filter::Filter;
pub use id::DocumentId;
pub use merge::{MergePolicy, MergeRules};
pub use temporal::Timestamp;
