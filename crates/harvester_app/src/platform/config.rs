use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use harvester_engine::{
    CatalogSettings, DownloadSettings, LinkExtractor, OutputLayout, RunSettings,
    DEFAULT_EXTENSION, DEFAULT_MARKER, DEFAULT_URL_TEMPLATE,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const CONFIG_FILENAME: &str = "harvester.ron";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Everything a run can be tuned with. Fields missing from the file keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct HarvestConfig {
    pub channel_id: String,
    /// Sent to the catalog as `hl`.
    pub locale: String,
    pub catalog_base_url: String,
    pub link_marker: String,
    /// `{id}` is replaced by the object id found in a description.
    pub download_url_template: String,
    pub output_root: PathBuf,
    pub document_extension: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub skip_existing: bool,
    pub verbose: bool,
    /// Rows shown at once by the selection prompts.
    pub page_size: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            channel_id: "UCUZ1Jxh8roXc1JJh4PXBF7w".to_string(),
            locale: "en-US".to_string(),
            catalog_base_url: CatalogSettings::default().base_url,
            link_marker: DEFAULT_MARKER.to_string(),
            download_url_template: DEFAULT_URL_TEMPLATE.to_string(),
            output_root: PathBuf::from("."),
            document_extension: DEFAULT_EXTENSION.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            skip_existing: true,
            verbose: false,
            page_size: 10,
        }
    }
}

impl HarvestConfig {
    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            base_url: self.catalog_base_url.clone(),
            locale: self.locale.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn link_extractor(&self) -> LinkExtractor {
        LinkExtractor::new(&self.link_marker, &self.download_url_template)
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_root, &self.document_extension)
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            channel_id: self.channel_id.clone(),
            skip_existing: self.skip_existing,
        }
    }
}

/// A configuration and the file it came from, if any.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoadedConfig {
    pub config: HarvestConfig,
    pub source: Option<PathBuf>,
}

/// Reads `harvester.ron` from `dir`. A missing file yields the defaults.
///
/// Runs before the logger exists, so nothing is logged here.
pub(crate) fn load_config(dir: &Path) -> Result<LoadedConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(LoadedConfig {
                config: HarvestConfig::default(),
                source: None,
            });
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.clone(),
        reason: err.to_string(),
    })?;
    Ok(LoadedConfig {
        config,
        source: Some(path),
    })
}
