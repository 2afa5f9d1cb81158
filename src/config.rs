// ⚙️ Configuration - TOML file plus environment overrides
//
// Lookup order: built-in defaults, then the file named by KISA_CONFIG
// (default `kisa.toml`, silently skipped when absent), then KISA_DB,
// KISA_BIND and KISA_LOG.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "KISA_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "kisa.toml";
pub const DEFAULT_LOG_FILTER: &str = "kisa_admin=info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// tracing-subscriber EnvFilter directive
    pub log_filter: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        AdminConfig {
            database_path: PathBuf::from("kisa.db"),
            bind_addr: "127.0.0.1:3000".to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AdminConfig {
    /// Load from the environment-selected file and apply env overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.merge_env_vars();
        Ok(config)
    }

    /// Parse a TOML file; a missing file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AdminConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    pub fn merge_env_vars(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(db) = value("KISA_DB") {
            self.database_path = PathBuf::from(db);
        }
        if let Some(bind) = value("KISA_BIND") {
            self.bind_addr = bind;
        }
        if let Some(filter) = value("KISA_LOG") {
            self.log_filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AdminConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AdminConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_path = \"/var/lib/kisa/admin.db\"").unwrap();
        file.flush().unwrap();

        let config = AdminConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/kisa/admin.db"));
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = [").unwrap();
        file.flush().unwrap();

        assert!(AdminConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides_win_and_blank_is_ignored() {
        let env: HashMap<&str, &str> = [("KISA_BIND", "0.0.0.0:8080"), ("KISA_LOG", "  ")]
            .into_iter()
            .collect();

        let mut config = AdminConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(config.database_path, PathBuf::from("kisa.db"));
    }
}
