use serde::{de::Deserializer, Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, path::PathBuf};

use crate::ConfigError;

/// Per-user settings for a grid session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Acting identity; documents are stored under `users/{identity}`.
    pub identity: String,
    pub default_format: String,
    /// Identity allowed to publish the shared column layout, keyed by format.
    pub primary_identities: BTreeMap<String, String>,
    pub backend: BackendKind,
    pub debounce_ms: u64,
    pub retry_max_delay_ms: u64,
    pub locale: LocaleSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional root directory for stored sheets. Defaults to the platform data dir.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity: Self::default_identity(),
            default_format: "weekly".into(),
            primary_identities: BTreeMap::new(),
            backend: BackendKind::default(),
            debounce_ms: Self::DEFAULT_DEBOUNCE_MS,
            retry_max_delay_ms: Self::DEFAULT_RETRY_MAX_DELAY_MS,
            locale: LocaleSettings::default(),
            data_root: None,
        }
    }
}

impl Config {
    pub const DEFAULT_DEBOUNCE_MS: u64 = 800;
    pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

    pub fn default_identity() -> String {
        "local".into()
    }

    /// Whether `identity` may publish the shared layout for `format`.
    pub fn is_primary(&self, format: &str, identity: &str) -> bool {
        self.primary_identities
            .get(format)
            .is_some_and(|primary| primary == identity)
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("ledger_grid")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.trim().is_empty() {
            return Err(ConfigError::Invalid("identity must not be empty".into()));
        }
        if self.identity.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "identity `{}` must not contain '/'",
                self.identity
            )));
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid("debounce_ms must be positive".into()));
        }
        if self.retry_max_delay_ms < self.debounce_ms {
            return Err(ConfigError::Invalid(
                "retry_max_delay_ms must not be shorter than debounce_ms".into(),
            ));
        }
        if self.locale.grouping_separator == self.locale.decimal_separator {
            return Err(ConfigError::Invalid(
                "grouping and decimal separators must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Persistence backend selected for new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Documents,
    Local,
}

impl BackendKind {
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "localstorage" => BackendKind::Local,
            _ => BackendKind::Documents,
        }
    }
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Documents
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendKind::Documents => "documents",
            BackendKind::Local => "local",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for BackendKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .map(|raw| BackendKind::from_str(&raw))
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleSettings {
    pub grouping_separator: char,
    pub decimal_separator: char,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            grouping_separator: ',',
            decimal_separator: '.',
        }
    }
}
