//! Schema descriptors for Recess documents.
//!
//! A [`SchemaDescriptor`] is static, per-entity metadata: which fields are
//! required, which the caller may never overwrite, what their defaults are,
//! which values are enumerated, which strings are trimmed, how long bounded
//! lists may grow, which fields are unique, and how updates merge.
//!
//! Derivations over a descriptor are pure and infallible. The functions in
//! [`normalize`] apply the descriptor to caller input before it reaches a
//! document store.

pub mod descriptor;
pub mod field;
pub mod normalize;

pub use descriptor::SchemaDescriptor;
pub use field::{DefaultValue, FieldKind, FieldSpec};
pub use normalize::{
    apply_defaults, check_required, coerce_enums, strip_non_overwritable, trim_strings,
    truncate_bounded_lists,
};
