//! On-disk configuration records.
//!
//! Three files live in the configuration directory:
//! - `credentials.toml`: platform credentials,
//! - `config.json`: title template and game mappings,
//! - `excluded_processes.json`: process names and prefixes to ignore.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{CategoryMapping, DEFAULT_TITLE_TEMPLATE, ExclusionFilter, GameMapping};
use crate::utils::fs;
use crate::{Error, Result};

pub const CREDENTIALS_FILE: &str = "credentials.toml";
pub const MAPPING_FILE: &str = "config.json";
pub const EXCLUSIONS_FILE: &str = "excluded_processes.json";

/// Locations of the configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub dir: PathBuf,
    pub credentials: PathBuf,
    pub mapping: PathBuf,
    pub exclusions: PathBuf,
}

impl ConfigPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            credentials: dir.join(CREDENTIALS_FILE),
            mapping: dir.join(MAPPING_FILE),
            exclusions: dir.join(EXCLUSIONS_FILE),
            dir,
        }
    }
}

fn default_title_template() -> String {
    DEFAULT_TITLE_TEMPLATE.to_string()
}

/// Title template and game tables.
///
/// Field names follow the established `config.json` layout. Unknown keys are
/// kept so that saving the record does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    #[serde(rename = "base", default = "default_title_template")]
    pub title_template: String,
    #[serde(rename = "process_name", default)]
    pub games: GameMapping,
    #[serde(rename = "TwitchCategoryName", default)]
    pub categories: CategoryMapping,
    /// Optional tracing filter directive applied on load, e.g. `game_sync=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Default for MappingRecord {
    fn default() -> Self {
        Self {
            title_template: default_title_template(),
            games: GameMapping::new(),
            categories: CategoryMapping::new(),
            log_filter: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl MappingRecord {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Strict read used before writing the record back.
    ///
    /// A missing file yields the default record; a malformed one is an error
    /// so that a mutation never overwrites a file the user is still fixing.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Lenient read used by the live store.
    ///
    /// Any failure is logged and yields an empty record, which makes the
    /// matcher report the fallback category until the file is fixed.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path).and_then(|json| Self::from_json(&json)) {
            Ok(record) => {
                debug!(path = %path.display(), games = record.games.len(), "Loaded mapping record");
                record
            }
            Err(Error::IoPath { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Mapping record not found; no games configured");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load mapping record; using an empty mapping");
                Self::default()
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write_atomic(path, self.to_json_pretty()?.as_bytes())
    }
}

/// Which exclusion list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionKind {
    /// Whole process name.
    Name,
    /// Process name prefix.
    Prefix,
}

impl fmt::Display for ExclusionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Prefix => f.write_str("prefix"),
        }
    }
}

/// Process names and prefixes that are never considered games.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    #[serde(default)]
    pub exclude_process_names: Vec<String>,
    #[serde(default)]
    pub exclude_prefixes: Vec<String>,
}

impl ExclusionRecord {
    /// Template written on first run.
    pub fn defaults() -> Self {
        Self {
            exclude_process_names: [
                "System",
                "System Idle Process",
                "svchost.exe",
                "explorer.exe",
                "cmd.exe",
                "python.exe",
                "pythonw.exe",
            ]
            .map(String::from)
            .to_vec(),
            exclude_prefixes: ["MicrosoftEdge", "Google Chrome", "Brave Browser"]
                .map(String::from)
                .to_vec(),
        }
    }

    pub fn to_filter(&self) -> ExclusionFilter {
        ExclusionFilter::new(&self.exclude_process_names, &self.exclude_prefixes)
    }

    /// Strict read used before writing the record back.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn entries(&self, kind: ExclusionKind) -> &[String] {
        match kind {
            ExclusionKind::Name => &self.exclude_process_names,
            ExclusionKind::Prefix => &self.exclude_prefixes,
        }
    }

    fn entries_mut(&mut self, kind: ExclusionKind) -> &mut Vec<String> {
        match kind {
            ExclusionKind::Name => &mut self.exclude_process_names,
            ExclusionKind::Prefix => &mut self.exclude_prefixes,
        }
    }

    /// Whether `value` is already listed, ignoring case like the filter does.
    pub fn contains(&self, kind: ExclusionKind, value: &str) -> bool {
        let value = value.to_lowercase();
        self.entries(kind).iter().any(|e| e.to_lowercase() == value)
    }

    /// Append `value`; returns `false` when it is already listed.
    pub fn add(&mut self, kind: ExclusionKind, value: &str) -> bool {
        if self.contains(kind, value) {
            return false;
        }
        self.entries_mut(kind).push(value.to_string());
        true
    }

    /// Remove every case-insensitive occurrence of `value`.
    pub fn remove(&mut self, kind: ExclusionKind, value: &str) -> bool {
        let value = value.to_lowercase();
        let entries = self.entries_mut(kind);
        let before = entries.len();
        entries.retain(|e| e.to_lowercase() != value);
        entries.len() != before
    }

    /// Lenient read: a missing or malformed file means no exclusions.
    pub fn load(path: &Path) -> Self {
        let result = fs::read_to_string(path)
            .and_then(|json| serde_json::from_str::<Self>(&json).map_err(Error::from));
        match result {
            Ok(record) => {
                info!(
                    names = record.exclude_process_names.len(),
                    prefixes = record.exclude_prefixes.len(),
                    "Loaded exclusions"
                );
                record
            }
            Err(Error::IoPath { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Exclusions file not found; no exclusions loaded");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load exclusions");
                Self::default()
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write_atomic(path, serde_json::to_string_pretty(self)?.as_bytes())
    }
}

pub const ENV_CLIENT_ID: &str = "TWITCH_CLIENT_ID";
pub const ENV_ACCESS_TOKEN: &str = "TWITCH_ACCESS_TOKEN";
pub const ENV_STREAMER_ID: &str = "TWITCH_STREAMER_ID";

#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    twitch: PartialCredentials,
}

#[derive(Debug, Default, Deserialize)]
struct PartialCredentials {
    client_id: Option<String>,
    access_token: Option<String>,
    streamer_id: Option<String>,
}

/// Platform credentials: client id, user access token and the channel owner's
/// user id.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub access_token: String,
    pub streamer_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .field("streamer_id", &self.streamer_id)
            .finish()
    }
}

impl Credentials {
    /// Load from `path` (if it exists) with process environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load with a custom environment lookup.
    pub fn load_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = if path.exists() {
            toml::from_str::<CredentialsFile>(&fs::read_to_string(path)?)?
        } else {
            debug!(path = %path.display(), "Credentials file not found; using environment only");
            CredentialsFile::default()
        };

        let pick = |file_value: Option<String>, key: &str| -> Result<String> {
            // A variable that is set but blank does not shadow the file.
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or(file_value)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    Error::config(format!(
                        "missing credential: set it in {} or via {}",
                        path.display(),
                        key
                    ))
                })
        };

        let twitch = file.twitch;
        Ok(Self {
            client_id: pick(twitch.client_id, ENV_CLIENT_ID)?,
            access_token: pick(twitch.access_token, ENV_ACCESS_TOKEN)?,
            streamer_id: pick(twitch.streamer_id, ENV_STREAMER_ID)?,
        })
    }

    pub fn to_helix(&self) -> platforms_api::twitch::HelixCredentials {
        platforms_api::twitch::HelixCredentials {
            client_id: self.client_id.clone(),
            access_token: self.access_token.clone(),
            broadcaster_id: self.streamer_id.clone(),
        }
    }
}

/// Contents written to a fresh `credentials.toml`.
pub const CREDENTIALS_TEMPLATE: &str = r#"# Twitch credentials used to update the channel.
# Each value can also be provided through TWITCH_CLIENT_ID,
# TWITCH_ACCESS_TOKEN and TWITCH_STREAMER_ID.
[twitch]
client_id = ""
access_token = ""
streamer_id = ""
"#;
