//! Document storage for Recess.
//!
//! A store holds one entity type's documents as an ordered collection in
//! insertion order. Lookups are linear scans with exact-match filters.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- no backing file, for tests and embedding
//! - [`JsonFileStore`] -- the whole collection rewritten to a JSON array file
//!   after every successful mutation
//!
//! # Design Rules
//!
//! 1. At most one document per `_id`, and per value of each unique field.
//! 2. Callers always receive owned copies; stored state is never aliased.
//! 3. Writers are serialized; the write lock is held across persistence.
//! 4. A mutation whose persistence fails is rolled back before the error
//!    is returned, so memory and disk never diverge.

pub mod collection;
pub mod error;
pub mod json_file;
pub mod memory;
pub mod traits;

pub use collection::{Collection, CollectionConfig};
pub use error::{StoreError, StoreResult};
pub use json_file::JsonFileStore;
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
