//! User preferences stored as JSON.

use ether_types::ReleasePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "ETHER_CONFIG";

/// Every key `ether config` accepts.
pub const KEYS: [&str; 5] = [
    "install-commit",
    "remove-commit",
    "update-commit",
    "package-list-url",
    "prerelease",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine a configuration directory")]
    NoConfigDir,
    #[error("Failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("Failed to write {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),
    #[error("Unknown configuration key '{0}' (expected one of: {keys})", keys = KEYS.join(", "))]
    UnknownKey(String),
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
    #[error("Expected key:value, got '{0}'")]
    BadAssignment(String),
}

/// Which verb a commit message template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    Install,
    Remove,
    Update,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// Commit message after `install`; `&0` is the package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_commit: Option<String>,
    /// Commit message after `remove`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_commit: Option<String>,
    /// Commit message after `update` and version changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_commit: Option<String>,
    /// Package list used by `search` and name lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_list_url: Option<String>,
    /// Accept pre-release tags as the latest version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<bool>,
}

impl Configuration {
    /// `$ETHER_CONFIG`, or `config.json` in the platform config directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        directories::ProjectDirs::from("", "", "ether")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from `path`; a missing file is an empty configuration.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |e: std::io::Error| ConfigError::Write(path.to_path_buf(), e);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        fs::write(path, content + "\n").map_err(write_error)
    }

    /// Set `key`; `None` or an empty value clears it.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), ConfigError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let text = value.map(String::from);
        match key {
            "install-commit" => self.install_commit = text,
            "remove-commit" => self.remove_commit = text,
            "update-commit" => self.update_commit = text,
            "package-list-url" => self.package_list_url = text,
            "prerelease" => {
                self.prerelease = match value {
                    None => None,
                    Some(v) => Some(parse_bool(v).ok_or_else(|| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: v.to_string(),
                    })?),
                }
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "install-commit" => self.install_commit.clone(),
            "remove-commit" => self.remove_commit.clone(),
            "update-commit" => self.update_commit.clone(),
            "package-list-url" => self.package_list_url.clone(),
            "prerelease" => self.prerelease.map(|b| b.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// The commit message for a verb, with `&0` replaced by `name`.
    pub fn commit_message(&self, kind: CommitKind, name: &str) -> Option<String> {
        let template = match kind {
            CommitKind::Install => self.install_commit.as_ref(),
            CommitKind::Remove => self.remove_commit.as_ref(),
            CommitKind::Update => self.update_commit.as_ref(),
        }?;
        Some(template.replace("&0", name))
    }

    /// Release policy after applying a `--pre` flag.
    pub fn release_policy(&self, allow_prerelease: bool) -> ReleasePolicy {
        ReleasePolicy::from_flag(allow_prerelease || self.prerelease.unwrap_or(false))
    }

    pub fn package_list_url(&self) -> &str {
        self.package_list_url
            .as_deref()
            .unwrap_or(ether_registry::DEFAULT_PACKAGE_LIST_URL)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Split `key:value`. The value may itself contain colons.
pub fn parse_assignment(input: &str) -> Result<(&str, Option<&str>), ConfigError> {
    let (key, value) = input
        .split_once(':')
        .ok_or_else(|| ConfigError::BadAssignment(input.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::BadAssignment(input.to_string()));
    }
    let value = Some(value.trim()).filter(|v| !v.is_empty());
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let mut config = Configuration::default();
        config.set("install-commit", Some("Added &0")).unwrap();
        config.set("prerelease", Some("yes")).unwrap();

        assert_eq!(config.get("install-commit").unwrap().as_deref(), Some("Added &0"));
        assert_eq!(config.get("prerelease").unwrap().as_deref(), Some("true"));

        config.set("install-commit", None).unwrap();
        assert_eq!(config.install_commit, None);

        assert!(matches!(
            config.set("colour", Some("blue")),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            config.set("prerelease", Some("sometimes")),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_commit_message() {
        let mut config = Configuration::default();
        assert_eq!(config.commit_message(CommitKind::Install, "vapor"), None);

        config.install_commit = Some("Installed &0 via Ether".into());
        assert_eq!(
            config.commit_message(CommitKind::Install, "vapor").as_deref(),
            Some("Installed vapor via Ether")
        );
    }

    #[test]
    fn test_release_policy() {
        let mut config = Configuration::default();
        assert_eq!(config.release_policy(false), ReleasePolicy::PreferStable);
        assert_eq!(config.release_policy(true), ReleasePolicy::AllowPrerelease);
        config.prerelease = Some(true);
        assert_eq!(config.release_policy(false), ReleasePolicy::AllowPrerelease);
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("package-list-url:https://example.com/list.json").unwrap(),
            ("package-list-url", Some("https://example.com/list.json"))
        );
        assert_eq!(parse_assignment("remove-commit:").unwrap(), ("remove-commit", None));
        assert!(parse_assignment("nocolon").is_err());
        assert!(parse_assignment(":value").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");

        assert_eq!(Configuration::load_from(&path).unwrap(), Configuration::default());

        let mut config = Configuration::default();
        config.set("update-commit", Some("Updated dependencies")).unwrap();
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"update-commit\""));
        assert_eq!(Configuration::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Configuration::load_from(&path),
            Err(ConfigError::Parse(..))
        ));
    }
}
