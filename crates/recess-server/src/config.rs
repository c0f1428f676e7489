use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use recess_crypto::{HasherConfig, PasswordPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const USERS_FILE: &str = "users.json";
pub const TIME_MANAGEMENT_FILE: &str = "time-management.json";

/// Server settings. Every field has a default, so an empty TOML file is a
/// valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding the JSON collection files.
    pub data_dir: PathBuf,
    /// Deadline for one collection file write.
    pub persist_timeout_ms: u64,
    pub hasher: HasherConfig,
    pub password_policy: PasswordPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            persist_timeout_ms: 5_000,
            hasher: HasherConfig::default(),
            password_policy: PasswordPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text).map_err(|e| match e {
            ServerError::Config(msg) => ServerError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn time_management_path(&self) -> PathBuf {
        self.data_dir.join(TIME_MANAGEMENT_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.persist_timeout(), Duration::from_secs(5));
        assert_eq!(c.password_policy.min_length, 10);
        assert_eq!(c.users_path(), PathBuf::from("data/users.json"));
        assert_eq!(
            c.time_management_path(),
            PathBuf::from("data/time-management.json")
        );
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let c = ServerConfig::from_toml(
            r#"
            bind_addr = "0.0.0.0:8080"
            data_dir = "/var/lib/recess"

            [hasher]
            iterations = 4

            [password_policy]
            min_optional_tests = 3
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.data_dir, PathBuf::from("/var/lib/recess"));
        assert_eq!(c.hasher.iterations, 4);
        assert_eq!(c.hasher.memory_kib, HasherConfig::default().memory_kib);
        assert_eq!(c.password_policy.min_optional_tests, 3);
        assert_eq!(c.password_policy.min_length, 10);
        assert_eq!(c.persist_timeout_ms, 5_000);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = ServerConfig::from_toml("bind_addr = 42").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
