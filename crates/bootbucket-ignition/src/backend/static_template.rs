//! Catalog templates with inline payloads

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use bootbucket_common::{s3_url, Error};

use super::TemplateBackend;
use crate::config::BackendConfig;
use crate::error::Result;
use crate::model::NodeModel;
use crate::types::Config;

/// Prefix of an inline base64 `data:` URL with no media type
pub(crate) const DATA_URL_BASE64_PREFIX: &str = "data:;base64,";

/// Encode bytes as an inline `data:` URL
pub(crate) fn data_url(bytes: &[u8]) -> String {
    format!("{}{}", DATA_URL_BASE64_PREFIX, STANDARD.encode(bytes))
}

/// Base config appending the catalog template for the node's version
pub(crate) fn catalog_template(config: &BackendConfig, node: &NodeModel) -> Result<Config> {
    let resolved = config.catalog.resolve(&node.version)?;
    if resolved.fell_back {
        warn!(
            requested = %node.version,
            using = %resolved.version,
            "Kubernetes version is not supported, falling back to default template"
        );
    }
    Ok(Config::appending(s3_url(
        &config.user_data_bucket,
        resolved.path,
    )))
}

/// Backend serving templates from a fixed catalog and inlining payloads
#[derive(Clone, Debug)]
pub struct StaticTemplateBackend {
    config: BackendConfig,
}

impl StaticTemplateBackend {
    /// Create a backend over the given catalog
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TemplateBackend for StaticTemplateBackend {
    async fn get_template(&self, node: &NodeModel) -> Result<Config> {
        catalog_template(&self.config, node)
    }

    async fn apply_config(&self, payload: &[u8]) -> Result<Config> {
        if payload.is_empty() {
            return Err(Error::invalid_input("got empty data").into());
        }
        Ok(Config::replaced_by(data_url(payload)))
    }

    fn user_data_dir(&self) -> &str {
        &self.config.user_data_dir
    }

    fn user_data_bucket(&self) -> &str {
        &self.config.user_data_bucket
    }

    fn file_path(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(version: &str) -> NodeModel {
        NodeModel {
            version: version.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn template_appends_catalog_entry() {
        let backend = StaticTemplateBackend::new(BackendConfig::default());
        let config = backend.get_template(&node("v1.15.11")).await.unwrap();
        assert_eq!(config.ignition.version, "2.2.0");
        assert_eq!(
            config.ignition.config.append[0].source,
            "s3://ignition-userdata-bucket/ignition-config/k8s-v1.15.11.ign"
        );
        assert!(config.ignition.config.replace.is_none());
    }

    #[tokio::test]
    async fn unknown_version_uses_default_template() {
        let backend = StaticTemplateBackend::new(BackendConfig::default());
        let config = backend.get_template(&node("v1.2.3")).await.unwrap();
        assert_eq!(
            config.ignition.config.append[0].source,
            "s3://ignition-userdata-bucket/ignition-config/k8s-v1.17.4.ign"
        );

        let config = backend.get_template(&node("")).await.unwrap();
        assert!(config.ignition.config.append[0].source.ends_with("k8s-v1.17.4.ign"));
    }

    #[tokio::test]
    async fn apply_inlines_the_payload() {
        let backend = StaticTemplateBackend::new(BackendConfig::default());
        let config = backend.apply_config(b"{}").await.unwrap();
        let source = config.ignition.config.replace.unwrap().source;
        assert_eq!(source, "data:;base64,e30=");
        assert!(config.ignition.config.append.is_empty());
        assert_eq!(backend.file_path(), "");
    }

    #[tokio::test]
    async fn apply_rejects_empty_payload() {
        let backend = StaticTemplateBackend::new(BackendConfig::default());
        assert!(backend.apply_config(b"").await.is_err());
    }
}
