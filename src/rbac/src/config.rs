//! Configuration loading

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RbacError, Result};
use crate::gate::NavEntry;
use crate::types::RoleId;

/// Complete configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RbacConfig {
    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub logging: LoggingSection,

    /// Navigation entries to gate; the built-in fleet menu when empty
    #[serde(default)]
    pub navigation: Vec<NavEntry>,
}

impl RbacConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
            .map_err(|e| RbacError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| RbacError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.loader.load_timeout_ms == 0 {
            return Err(RbacError::Config("loader.load_timeout_ms must be positive".into()));
        }
        if self.loader.fallback_role_id.is_administrator() {
            return Err(RbacError::Config(
                "loader.fallback_role_id must not be the administrator role".into(),
            ));
        }
        Ok(())
    }
}

/// Data loader settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    #[serde(default = "default_load_timeout")]
    pub load_timeout_ms: u64,

    /// Role given to a session with no matching user row
    #[serde(default = "default_fallback_role")]
    pub fallback_role_id: RoleId,

    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: default_load_timeout(),
            fallback_role_id: default_fallback_role(),
            fallback_name: default_fallback_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub with_target: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: false,
        }
    }
}

fn default_load_timeout() -> u64 {
    10_000
}

fn default_fallback_role() -> RoleId {
    RoleId(3)
}

fn default_fallback_name() -> String {
    "Employee".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RbacConfig::from_toml_str("").unwrap();
        assert_eq!(config.loader.load_timeout_ms, 10_000);
        assert_eq!(config.loader.fallback_role_id, RoleId(3));
        assert_eq!(config.logging.level, "info");
        assert!(config.navigation.is_empty());
    }

    #[test]
    fn test_partial_sections() {
        let config = RbacConfig::from_toml_str(
            r#"
            [loader]
            fallback_role_id = 2

            [logging]
            level = "debug"

            [[navigation]]
            key = "reports"
            route = "/reports"
            permission = "reports:read"
            "#,
        )
        .unwrap();

        assert_eq!(config.loader.fallback_role_id, RoleId(2));
        assert_eq!(config.loader.fallback_name, "Employee");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.navigation.len(), 1);
        assert!(!config.navigation[0].admin_only);
    }

    #[test]
    fn test_rejects_admin_fallback() {
        let result = RbacConfig::from_toml_str("[loader]\nfallback_role_id = 1\n");
        assert!(matches!(result, Err(RbacError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(RbacConfig::from_toml_str("[loader]\nload_timeout_ms = 0\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[loader]\nload_timeout_ms = 250").unwrap();

        let config = RbacConfig::from_file(file.path()).unwrap();
        assert_eq!(config.loader.load_timeout_ms, 250);
    }
}
