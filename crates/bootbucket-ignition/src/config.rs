//! Backend configuration
//!
//! The version → base template table and the user-data location are fixed
//! when a backend is constructed and never change afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use bootbucket_common::Error;

/// Kubernetes version whose template is used for unknown versions
pub const KUBERNETES_DEFAULT_VERSION: &str = "v1.17.4";

/// Bucket holding base templates and uploaded user data
pub const DEFAULT_USER_DATA_BUCKET: &str = "ignition-userdata-bucket";

/// Key prefix of uploaded user data
pub const DEFAULT_USER_DATA_DIR: &str = "node-userdata";

/// Environment variable naming a backend config file
pub const CONFIG_PATH_ENV: &str = "BOOTBUCKET_CONFIG";

/// Known Kubernetes versions and their base template object paths
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCatalog {
    /// Version used when the requested one is not in `templates`
    pub default_version: String,
    /// Version → template object key
    pub templates: BTreeMap<String, String>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self {
            default_version: KUBERNETES_DEFAULT_VERSION.to_string(),
            templates: BTreeMap::from([
                ("v1.15.11".to_string(), "ignition-config/k8s-v1.15.11.ign".to_string()),
                ("v1.16.8".to_string(), "ignition-config/k8s-v1.16.8.ign".to_string()),
                ("v1.17.4".to_string(), "ignition-config/k8s-v1.17.4.ign".to_string()),
            ]),
        }
    }
}

/// Outcome of looking up a template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTemplate<'a> {
    /// Version whose template was picked
    pub version: &'a str,
    /// Template object key
    pub path: &'a str,
    /// Whether the requested version was unknown
    pub fell_back: bool,
}

impl TemplateCatalog {
    /// Check that the default version has a template
    pub fn validate(&self) -> Result<(), Error> {
        if self.templates.contains_key(&self.default_version) {
            Ok(())
        } else {
            Err(Error::config(format!(
                "default version {} has no template",
                self.default_version
            )))
        }
    }

    /// Template for `version`, or for the default version if unknown
    pub fn resolve(&self, version: &str) -> Result<ResolvedTemplate<'_>, Error> {
        if let Some((version, path)) = self.templates.get_key_value(version) {
            return Ok(ResolvedTemplate {
                version,
                path,
                fell_back: false,
            });
        }
        let (version, path) = self
            .templates
            .get_key_value(&self.default_version)
            .ok_or_else(|| {
                Error::config(format!(
                    "default version {} has no template",
                    self.default_version
                ))
            })?;
        Ok(ResolvedTemplate {
            version,
            path,
            fell_back: true,
        })
    }
}

/// Configuration shared by all document backends
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Bucket holding templates and uploaded user data
    #[serde(default = "default_bucket")]
    pub user_data_bucket: String,
    /// Key prefix of uploaded user data
    #[serde(default = "default_dir")]
    pub user_data_dir: String,
    /// Base template table
    #[serde(default)]
    pub catalog: TemplateCatalog,
}

fn default_bucket() -> String {
    DEFAULT_USER_DATA_BUCKET.to_string()
}

fn default_dir() -> String {
    DEFAULT_USER_DATA_DIR.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            user_data_bucket: default_bucket(),
            user_data_dir: default_dir(),
            catalog: TemplateCatalog::default(),
        }
    }
}

impl BackendConfig {
    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), Error> {
        if self.user_data_bucket.is_empty() {
            return Err(Error::config("userDataBucket can't be empty"));
        }
        if self.user_data_dir.trim_matches('/').is_empty() {
            return Err(Error::config("userDataDir can't be empty"));
        }
        self.catalog.validate()
    }

    /// Parse and validate a YAML configuration
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid backend config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, else from `$BOOTBUCKET_CONFIG`, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_PATH_ENV).map(Into::into),
        };
        match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(&path).map_err(|e| {
                    Error::config(format!("failed to read {}: {}", path.display(), e))
                })?;
                Self::from_yaml(&yaml)
            }
            None => Ok(Self::default()),
        }
    }
}
