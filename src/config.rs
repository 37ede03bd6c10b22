//! # Settings
//!
//! Process-wide dispatcher settings, loaded once at startup and passed as an
//! `Arc<Settings>` to the components that need them (the content reader for
//! its size limits, startup code for the message table).
//!
//! Settings come from a YAML or TOML file (chosen by extension) and are then
//! overridden by environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ROUTEGATE_LANGUAGE` | `language` |
//! | `ROUTEGATE_MESSAGES` | `messages` |
//! | `ROUTEGATE_MAX_REQUEST_SIZE` | `max_request_size` |
//! | `ROUTEGATE_MAX_FILE_SIZE` | `max_file_size` |
//!
//! ```yaml
//! language: en
//! messages: messages.yaml
//! max_request_size: 10485760
//! max_file_size: 5242880
//! ```

use crate::messages::Messages;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default limit for a whole request body (10 MiB).
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;
/// Default limit for a single multipart file (5 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Language section selected from the message resource
    pub language: String,
    /// Message resource file; relative paths resolve against the settings file
    pub messages: Option<PathBuf>,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    /// Maximum size of one multipart file part in bytes
    pub max_file_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            messages: None,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Settings {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    /// Load from a `.yaml`, `.yml` or `.toml` file, then apply environment
    /// overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let mut settings = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "toml" => Self::from_toml_str(&content),
            other => bail!(
                "Unsupported settings format '{}' for {}",
                other,
                path.display()
            ),
        }
        .with_context(|| format!("Failed to parse settings {}", path.display()))?;

        if let (Some(messages), Some(dir)) = (&settings.messages, path.parent()) {
            if messages.is_relative() {
                settings.messages = Some(dir.join(messages));
            }
        }
        let settings = settings.apply_overrides(|key| std::env::var(key).ok());
        info!(
            path = %path.display(),
            language = %settings.language,
            max_request_size = settings.max_request_size,
            max_file_size = settings.max_file_size,
            "Settings loaded"
        );
        Ok(settings)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `ROUTEGATE_*` overrides read through `lookup`.
    ///
    /// Unparseable numeric values are ignored with a warning.
    #[must_use]
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(language) = lookup("ROUTEGATE_LANGUAGE") {
            self.language = language;
        }
        if let Some(messages) = lookup("ROUTEGATE_MESSAGES") {
            self.messages = Some(PathBuf::from(messages));
        }
        if let Some(size) = parse_size(&lookup, "ROUTEGATE_MAX_REQUEST_SIZE") {
            self.max_request_size = size;
        }
        if let Some(size) = parse_size(&lookup, "ROUTEGATE_MAX_FILE_SIZE") {
            self.max_file_size = size;
        }
        self
    }

    /// Build the message table: built-in defaults overlaid by the configured
    /// resource, if any.
    pub fn load_messages(&self) -> Result<Messages> {
        match &self.messages {
            Some(path) => Messages::load(path, &self.language),
            None => Ok(Messages::new(self.language.clone())),
        }
    }
}

fn parse_size<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(size) => Some(size),
        Err(_) => {
            warn!(variable = %key, value = %raw, "Ignoring invalid size override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.language, "en");
        assert_eq!(settings.max_request_size, 10 * 1024 * 1024);
        assert_eq!(settings.max_file_size, 5 * 1024 * 1024);
        assert!(settings.messages.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml_str("language: de\n").unwrap();
        assert_eq!(settings.language, "de");
        assert_eq!(settings.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_toml() {
        let settings = Settings::from_toml_str("max_request_size = 1024\n").unwrap();
        assert_eq!(settings.max_request_size, 1024);
        assert_eq!(settings.language, "en");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("ROUTEGATE_LANGUAGE", "fr"),
            ("ROUTEGATE_MAX_REQUEST_SIZE", "2048"),
            ("ROUTEGATE_MAX_FILE_SIZE", "lots"),
        ]
        .into_iter()
        .collect();
        let settings =
            Settings::default().apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.language, "fr");
        assert_eq!(settings.max_request_size, 2048);
        assert_eq!(settings.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }
}
