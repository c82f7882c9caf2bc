//! Configuration loading helper functions
//!
//! Layered loading with figment: serde defaults, then the conventional
//! `config/gldpubs.{toml,yaml,json}` files, then an explicit file, then
//! `GLDPUBS_`-prefixed environment variables (`__` separates nested keys,
//! e.g. `GLDPUBS_IMPORTER__URL`).

use std::collections::HashMap;
use std::path::Path;

use errors::{config_error, PubsResult};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Property key for the triple-store endpoint
pub const BLAZEGRAPH_HOST_PATH: &str = "blazegraph.host.path";
/// Property key for the dictionary importer service
pub const IMPORTER_URL: &str = "importer.url";

/// Endpoint used when no triple-store endpoint is configured
pub const DEFAULT_BLAZEGRAPH_ENDPOINT: &str = "http://blazegraph:8080/bigdata/namespace/kb/sparql";

pub const ENV_PREFIX: &str = "GLDPUBS_";
pub const DEFAULT_IMPORTER_TIMEOUT_SECS: u64 = 60;

/// Lookup of named configuration properties
///
/// Hosts hand one of these to the configuration handler instead of a
/// process-wide configuration manager.
pub trait ConfigurationSource: Send + Sync {
    fn configuration_property(&self, key: &str) -> Option<String>;
}

impl ConfigurationSource for HashMap<String, String> {
    fn configuration_property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Top-level configuration of the generator
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// SPARQL endpoint of the CIM triple store
    pub blazegraph_host_path: Option<String>,
    pub importer: ImporterConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            blazegraph_host_path: None,
            importer: ImporterConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// External dictionary importer service
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ImporterConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_IMPORTER_TIMEOUT_SECS,
        }
    }
}

impl ConfigurationSource for AppConfig {
    fn configuration_property(&self, key: &str) -> Option<String> {
        match key {
            BLAZEGRAPH_HOST_PATH => self.blazegraph_host_path.clone(),
            IMPORTER_URL => self.importer.url.clone(),
            _ => None,
        }
    }
}

/// Load configuration from defaults, conventional files, `path` and the environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (`GLDPUBS_` prefix)
/// 2. The file at `path`, when given
/// 3. `config/gldpubs.{toml,yaml,json}`
/// 4. Default values
pub fn load_config(path: Option<&Path>) -> PubsResult<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file("config/gldpubs.toml"))
        .merge(Yaml::file("config/gldpubs.yaml"))
        .merge(Json::file("config/gldpubs.json"));

    if let Some(path) = path {
        figment = figment.merge(file_provider(path)?);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| config_error!("Failed to load configuration: {}", e))?;

    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// Load configuration from a specific file layered over the defaults
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> PubsResult<AppConfig> {
    let path = path.as_ref();
    Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(file_provider(path)?)
        .extract()
        .map_err(|e| {
            config_error!(
                "Failed to load configuration from {}: {}",
                path.display(),
                e
            )
        })
}

fn file_provider(path: &Path) -> PubsResult<Figment> {
    if !path.exists() {
        return Err(config_error!("Config file not found: {}", path.display()));
    }

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| config_error!("Config file must have an extension"))?;

    match extension {
        "toml" => Ok(Figment::new().merge(Toml::file(path))),
        "yaml" | "yml" => Ok(Figment::new().merge(Yaml::file(path))),
        "json" => Ok(Figment::new().merge(Json::file(path))),
        _ => Err(config_error!(
            "Unsupported config file format: {}",
            extension
        )),
    }
}

/// Get string property with priority: source (if not blank) > default
pub fn property_or_default(source: &dyn ConfigurationSource, key: &str, default: &str) -> String {
    match source.configuration_property(key) {
        Some(val) if !val.trim().is_empty() => {
            info!("Using {} from configuration", key);
            val
        },
        _ => {
            info!("Using default value for {}", key);
            default.to_string()
        },
    }
}
