use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info};

use crate::contract::MakeLatest;

/// Optional YAML config file. Holds no secrets: the token only ever comes from
/// the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub release: ReleaseSection,
    pub assets: Option<AssetsSection>,
    #[serde(default)]
    pub mime_types: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSection {
    pub tag_name: Option<String>,
    pub target_commitish: Option<String>,
    pub name: Option<String>,
    pub body: Option<String>,
    pub body_file: Option<PathBuf>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub generate_release_notes: bool,
    pub make_latest: Option<MakeLatestYaml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsSection {
    pub dir: Option<PathBuf>,
    pub pattern: Option<String>,
}

/// `make_latest` written either as a YAML bool or as one of the forge's strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MakeLatestYaml {
    Bool(bool),
    Named(String),
}

impl MakeLatestYaml {
    pub fn to_make_latest(&self) -> Result<MakeLatest> {
        match self {
            MakeLatestYaml::Bool(true) => Ok(MakeLatest::True),
            MakeLatestYaml::Bool(false) => Ok(MakeLatest::False),
            MakeLatestYaml::Named(name) => match name.to_ascii_lowercase().as_str() {
                "true" => Ok(MakeLatest::True),
                "false" => Ok(MakeLatest::False),
                "legacy" => Ok(MakeLatest::Legacy),
                other => {
                    error!(value = %other, "Unsupported release.make_latest in config");
                    anyhow::bail!("Unsupported release.make_latest: {other} (expected true, false or legacy)")
                }
            },
        }
    }
}

/// Loads the YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(e).with_context(|| format!("Failed to read config file {:?}", path_ref));
        }
    };

    let file_config: FileConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Some(make_latest) = &file_config.release.make_latest {
        make_latest.to_make_latest()?;
    }

    info!(
        owner = ?file_config.owner,
        repo = ?file_config.repo,
        mime_types = file_config.mime_types.len(),
        "Config loaded successfully"
    );
    Ok(file_config)
}
