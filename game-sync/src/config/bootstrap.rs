//! First-run setup of the configuration directory.

use std::path::{Path, PathBuf};

use reqwest::{Client, StatusCode};
use tracing::{info, warn};

use super::records::{CREDENTIALS_TEMPLATE, ConfigPaths, ExclusionRecord, MappingRecord};
use crate::utils::fs;
use crate::{Error, Result};

/// Community-maintained default mapping.
pub const DEFAULT_MAPPING_URL: &str =
    "https://raw.githubusercontent.com/QEXLAUWASD/Twitch-StreamManger/refs/heads/main/Default_config.json";

/// Files written by [`bootstrap`]. Existing files are never touched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created: Vec<PathBuf>,
    /// Set when the default mapping could not be downloaded and an empty one
    /// was written instead.
    pub mapping_fallback: Option<String>,
}

/// Create any missing configuration file.
///
/// With `mapping_url` set, the initial `config.json` is fetched from it; a
/// failed download falls back to an empty record.
pub async fn bootstrap(
    paths: &ConfigPaths,
    client: &Client,
    mapping_url: Option<&str>,
) -> Result<BootstrapReport> {
    fs::ensure_dir_all_sync_with_op("creating config directory", &paths.dir)?;
    let mut report = BootstrapReport::default();

    if !paths.exclusions.exists() {
        ExclusionRecord::defaults().write(&paths.exclusions)?;
        report.created.push(paths.exclusions.clone());
    }

    if !paths.mapping.exists() {
        let record = match mapping_url {
            Some(url) => match download_mapping_record(client, url).await {
                Ok(record) => {
                    info!(url, games = record.games.len(), "Downloaded default mapping");
                    record
                }
                Err(e) => {
                    warn!(url, error = %e, "Failed to download default mapping; writing an empty one");
                    report.mapping_fallback = Some(e.to_string());
                    MappingRecord::default()
                }
            },
            None => MappingRecord::default(),
        };
        record.write(&paths.mapping)?;
        report.created.push(paths.mapping.clone());
    }

    if !paths.credentials.exists() {
        write_credentials_template(&paths.credentials)?;
        report.created.push(paths.credentials.clone());
    }

    for path in &report.created {
        info!(path = %path.display(), "Created configuration file");
    }
    Ok(report)
}

/// Fetch a mapping record. Only `200 OK` with a valid body is accepted.
pub async fn download_mapping_record(client: &Client, url: &str) -> Result<MappingRecord> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(platforms_api::ApiError::from)?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(platforms_api::ApiError::from)?;

    if status != StatusCode::OK {
        return Err(platforms_api::ApiError::UnexpectedStatus { status, body }.into());
    }
    MappingRecord::from_json(&body)
}

fn write_credentials_template(path: &Path) -> Result<()> {
    fs::write_atomic(path, CREDENTIALS_TEMPLATE.as_bytes())
        .map_err(|e| Error::config(format!("cannot write credentials template: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use platforms_api::client::{DEFAULT_TIMEOUT, default_client};

    #[tokio::test]
    async fn test_bootstrap_creates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::new(dir.path().join("cfg"));
        let client = default_client(DEFAULT_TIMEOUT).unwrap();

        let report = bootstrap(&paths, &client, None).await.unwrap();
        assert_eq!(report.created.len(), 3);
        assert!(report.mapping_fallback.is_none());

        assert_eq!(ExclusionRecord::load(&paths.exclusions), ExclusionRecord::defaults());
        let mapping = MappingRecord::read(&paths.mapping).unwrap();
        assert!(mapping.games.is_empty());
        assert_eq!(mapping.title_template, crate::domain::DEFAULT_TITLE_TEMPLATE);
        assert!(std::fs::read_to_string(&paths.credentials).unwrap().contains("client_id"));
    }

    #[tokio::test]
    async fn test_bootstrap_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::new(dir.path());
        std::fs::write(&paths.mapping, r#"{"process_name":{"Chess":"chess.exe"}}"#).unwrap();
        let client = default_client(DEFAULT_TIMEOUT).unwrap();

        let report = bootstrap(&paths, &client, None).await.unwrap();
        assert!(!report.created.contains(&paths.mapping));

        let mapping = MappingRecord::read(&paths.mapping).unwrap();
        assert_eq!(mapping.games.get("Chess"), Some("chess.exe"));

        let again = bootstrap(&paths, &client, None).await.unwrap();
        assert!(again.created.is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_falls_back_when_download_fails() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::new(dir.path());
        let client = default_client(DEFAULT_TIMEOUT).unwrap();

        let report = bootstrap(&paths, &client, Some("http://127.0.0.1:9/config.json"))
            .await
            .unwrap();
        assert!(report.mapping_fallback.is_some());
        assert_eq!(MappingRecord::read(&paths.mapping).unwrap(), MappingRecord::default());
    }
}
