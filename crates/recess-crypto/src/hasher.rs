use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HasherConfig {
    /// Minimal cost, for tests and local development only.
    pub fn low_cost() -> Self {
        Self {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Salted one-way hasher for credential fields.
///
/// Produces PHC-format strings (`$argon2id$v=19$...`) that embed the salt
/// and parameters, so verification never needs the original configuration.
/// The plaintext is never recoverable from the output.
#[derive(Clone, Debug)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    /// Create a hasher, validating the cost parameters.
    pub fn new(config: HasherConfig) -> CryptoResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| CryptoError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext secret with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> CryptoResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| CryptoError::Hashing(e.to_string()))
    }

    /// Check a candidate plaintext against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; only an unparseable hash is an error.
    pub fn verify(&self, candidate: &str, stored_hash: &str) -> CryptoResult<bool> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
        match self.argon2().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::Hashing(e.to_string())),
        }
    }

    /// `true` if `candidate` matches any of the stored hashes.
    pub fn verify_any<'a>(
        &self,
        candidate: &str,
        stored_hashes: impl IntoIterator<Item = &'a str>,
    ) -> CryptoResult<bool> {
        for hash in stored_hashes {
            if self.verify(candidate, hash)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> SecretHasher {
        SecretHasher::new(HasherConfig::low_cost()).unwrap()
    }

    #[test]
    fn hash_is_not_plaintext() {
        let h = hasher().hash("Str0ng!Pass").unwrap();
        assert_ne!(h, "Str0ng!Pass");
        assert!(h.starts_with("$argon2id$"));
        assert!(!h.contains("Str0ng!Pass"));
    }

    #[test]
    fn same_secret_gets_different_salts() {
        let h = hasher();
        assert_ne!(h.hash("secret").unwrap(), h.hash("secret").unwrap());
    }

    #[test]
    fn verify_correct_secret() {
        let h = hasher();
        let stored = h.hash("correct horse").unwrap();
        assert!(h.verify("correct horse", &stored).unwrap());
    }

    #[test]
    fn verify_wrong_secret() {
        let h = hasher();
        let stored = h.hash("correct horse").unwrap();
        assert!(!h.verify("battery staple", &stored).unwrap());
    }

    #[test]
    fn verify_with_different_params_still_works() {
        let stored = hasher().hash("portable").unwrap();
        let other = SecretHasher::new(HasherConfig {
            memory_kib: 512,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(other.verify("portable", &stored).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            hasher().verify("x", "not-a-hash"),
            Err(CryptoError::MalformedHash(_))
        ));
    }

    #[test]
    fn verify_any_scans_history() {
        let h = hasher();
        let history = vec![h.hash("one").unwrap(), h.hash("two").unwrap()];
        assert!(h.verify_any("two", history.iter().map(String::as_str)).unwrap());
        assert!(!h.verify_any("three", history.iter().map(String::as_str)).unwrap());
        assert!(!h.verify_any("one", std::iter::empty()).unwrap());
    }

    #[test]
    fn invalid_params_rejected() {
        let bad = HasherConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(matches!(
            SecretHasher::new(bad),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: HasherConfig = serde_json::from_str(r#"{"iterations": 3}"#).unwrap();
        assert_eq!(cfg.iterations, 3);
        assert_eq!(cfg.memory_kib, HasherConfig::default().memory_kib);
    }
}
