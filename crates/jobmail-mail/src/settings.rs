//! Ordered setting lookups: environment first, configuration file second.
//!
//! A [`Settings`] chain asks each [`SettingSource`] in turn and keeps the
//! first non-empty value. The default chain is
//!
//! ```text
//! EnvSource("APPSETTING_")  →  JsonFileSource("appsettings.json")
//! ```
//!
//! Tests and embedders build their own chain from [`MapSource`]s.

use crate::error::{Error, Result};
use jobmail_text::decode_html_entities;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Recipients notified after every run.
pub const EXECUTION_NOTIFICATION_TO: &str = "ExecutionNotificationTo";
/// Recipients added when the run reported warnings.
pub const WARNING_NOTIFICATION_TO: &str = "WarningNotificationTo";
/// Recipients added when the run reported errors.
pub const ERROR_NOTIFICATION_TO: &str = "ErrorNotificationTo";
/// Redirects every message to these recipients.
pub const SEND_ALL_EMAIL_TO_DEVELOPER: &str = "SendGridSendAllEmailToDeveloper";
/// Older name of [`SEND_ALL_EMAIL_TO_DEVELOPER`].
pub const LEGACY_SEND_TO_DEVELOPER: &str = "AzureEmailSendToDeveloper";
/// Provider API key.
pub const SENDGRID_API_KEY: &str = "SendGridApiKey";

/// Prefix of application settings exposed as environment variables.
pub const ENV_PREFIX: &str = "APPSETTING_";
/// File read by [`Settings::standard`].
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// One place settings can come from.
pub trait SettingSource: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Returns the raw value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads `{prefix}{key}` from the process environment.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    /// Creates a source reading variables with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new(ENV_PREFIX)
    }
}

impl SettingSource for EnvSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}{key}", self.prefix)).ok()
    }
}

/// Flat JSON object of settings, e.g. `appsettings.json`.
///
/// String values are HTML-entity decoded on load, so recipient lists
/// written as `&quot;Ops&quot; &lt;ops@example.com&gt;` work as-is.
/// Numbers and booleans are kept as their JSON text; nested values are
/// ignored.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl JsonFileSource {
    /// Loads a settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not JSON or is not
    /// a JSON object.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut source = Self::from_json(&text)?;
        source.path = path.to_path_buf();
        tracing::debug!(path = %path.display(), count = source.values.len(), "Loaded settings file");
        Ok(source)
    }

    /// Parses settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(map) = value else {
            return Err(Error::Settings("expected a JSON object".into()));
        };

        let values = map
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => decode_html_entities(&s),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect();

        Ok(Self {
            path: PathBuf::new(),
            values,
        })
    }

    /// Path the settings were loaded from (empty for in-memory JSON).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingSource for JsonFileSource {
    fn name(&self) -> &str {
        "settings file"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// In-memory settings.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SettingSource for MapSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Ordered chain of setting sources.
#[derive(Default)]
pub struct Settings {
    sources: Vec<Box<dyn SettingSource>>,
}

impl Settings {
    /// Creates an empty chain: every lookup misses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment (`APPSETTING_` prefix), then `appsettings.json` in the
    /// working directory when the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be loaded.
    pub fn standard() -> Result<Self> {
        Self::standard_with_file(DEFAULT_SETTINGS_FILE)
    }

    /// Environment, then the given settings file when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn standard_with_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Self::new().with_source(EnvSource::default());
        if path.exists() {
            Ok(settings.with_source(JsonFileSource::load(path)?))
        } else {
            tracing::debug!(path = %path.display(), "No settings file, using environment only");
            Ok(settings)
        }
    }

    /// Appends a source at the lowest priority.
    #[must_use]
    pub fn with_source(mut self, source: impl SettingSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Number of sources in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if the chain has no sources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// First non-empty value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_any(&[key])
    }

    /// First non-empty value for any of `keys`.
    ///
    /// Sources are tried in order; within a source, keys are tried in order.
    #[must_use]
    pub fn get_any(&self, keys: &[&str]) -> Option<String> {
        self.sources.iter().find_map(|source| {
            keys.iter().find_map(|key| {
                let value = source.get(key).filter(|v| !v.is_empty())?;
                tracing::debug!(source = source.name(), key, "Setting resolved");
                Some(value)
            })
        })
    }

    /// Resolves related keys together.
    ///
    /// The first source holding a non-empty value for any of `keys`
    /// supplies all of them; keys it lacks come back empty. Returns one
    /// entry per key, all empty when no source has any.
    #[must_use]
    pub fn get_group(&self, keys: &[&str]) -> Vec<String> {
        for source in &self.sources {
            let values: Vec<String> = keys
                .iter()
                .map(|key| source.get(key).unwrap_or_default())
                .collect();
            if values.iter().any(|v| !v.is_empty()) {
                tracing::debug!(source = source.name(), ?keys, "Setting group resolved");
                return values;
            }
        }
        vec![String::new(); keys.len()]
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.name()))
            .finish()
    }
}
