//! Document backends
//!
//! A backend supplies the base template a node's config is built on, and
//! decides where a final rendered payload lives. Two implementations exist:
//!
//! - [`StaticTemplateBackend`]: templates from a fixed catalog, payloads
//!   inlined into the document as `data:` URLs (nothing is persisted)
//! - [`ObjectStoreBackend`]: templates from the same catalog, payloads
//!   uploaded to a fresh key under the user-data directory
//!
//! The backend is chosen once, when the factory is built.

mod object_store;
mod static_template;

pub use object_store::ObjectStoreBackend;
pub use static_template::StaticTemplateBackend;
pub(crate) use static_template::data_url;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use bootbucket_common::Error;
use bootbucket_s3::ObjectStoreClient;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::model::NodeModel;
use crate::types::Config;

/// Source of base templates and sink for rendered payloads
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TemplateBackend: Send + Sync {
    /// Base config for the node's Kubernetes version
    ///
    /// Unknown versions fall back to the default version's template.
    async fn get_template(&self, node: &NodeModel) -> Result<Config>;

    /// Persist a rendered payload, returning a config that replaces itself with it
    async fn apply_config(&self, payload: &[u8]) -> Result<Config>;

    /// Key prefix for uploaded payloads
    fn user_data_dir(&self) -> &str;

    /// Bucket holding templates and payloads
    fn user_data_bucket(&self) -> &str;

    /// Key of the most recently applied payload (empty if none)
    fn file_path(&self) -> String;
}

/// Backend implementations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Inline payloads, no persistence
    #[default]
    Static,
    /// Upload payloads to the object store
    ObjectStore,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::ObjectStore => write!(f, "object-store"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "object-store" | "objectstore" | "s3" => Ok(Self::ObjectStore),
            other => Err(Error::config(format!("unknown backend: {}", other))),
        }
    }
}

/// Create a backend of the given kind
///
/// The object-store backend needs a client; asking for it without one is a
/// configuration error.
pub fn create_backend(
    kind: BackendKind,
    config: BackendConfig,
    client: Option<Arc<dyn ObjectStoreClient>>,
) -> Result<Box<dyn TemplateBackend>> {
    config.validate()?;
    match kind {
        BackendKind::Static => Ok(Box::new(StaticTemplateBackend::new(config))),
        BackendKind::ObjectStore => {
            let client = client.ok_or_else(|| {
                Error::config("object-store backend requires an object store client")
            })?;
            Ok(Box::new(ObjectStoreBackend::new(config, client)))
        }
    }
}
