//! Credential primitives for Recess.
//!
//! Provides salted Argon2id secret hashing, random passphrase generation, and
//! an OWASP-style password strength policy.
//!
//! Hashing is delegated to the `argon2` crate.

pub mod error;
pub mod hasher;
pub mod passphrase;
pub mod policy;

pub use error::{CryptoError, CryptoResult};
pub use hasher::{HasherConfig, SecretHasher};
pub use passphrase::generate_passphrase;
pub use policy::{PasswordPolicy, StrengthReport};
