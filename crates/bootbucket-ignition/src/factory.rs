//! Ignition document factory
//!
//! Builds a node's user data on top of the backend's base template:
//!
//! 1. Ask the backend for the version's template
//! 2. Fill `storage.directories` and `storage.files` from the model
//! 3. Fill `systemd.units` from the model's services
//! 4. Validate; fatal findings abort with the full report
//! 5. Serialize to JSON

use tracing::{debug, warn};

use crate::backend::{data_url, TemplateBackend};
use crate::error::{IgnitionError, Result};
use crate::model::{
    DirectorySpec, FileSpec, NodeModel, ServiceUnitSpec, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE,
};
use crate::types::{Config, Directory, Dropin, File, FileContents, Storage, Systemd, Unit};
use crate::validate::validate_config;

/// Filesystem every generated file is written to
pub const ROOT_FILESYSTEM: &str = "root";

/// Renders and applies Ignition configs through a backend
///
/// The factory owns its backend, and [`Factory::file_path`] reflects the
/// last [`Factory::apply_config`] call only. Use one factory per machine
/// when the uploaded payload must later be deleted.
pub struct Factory {
    backend: Box<dyn TemplateBackend>,
}

impl Factory {
    /// Create a factory over the given backend
    pub fn new(backend: Box<dyn TemplateBackend>) -> Self {
        Self { backend }
    }

    /// Key prefix for uploaded payloads
    pub fn user_data_dir(&self) -> &str {
        self.backend.user_data_dir()
    }

    /// Bucket holding templates and payloads
    pub fn user_data_bucket(&self) -> &str {
        self.backend.user_data_bucket()
    }

    /// Key of the most recently applied payload (empty if none)
    pub fn file_path(&self) -> String {
        self.backend.file_path()
    }

    /// Build and validate the node's config
    pub async fn build_user_data(&self, node: &NodeModel) -> Result<Config> {
        let template = self.backend.get_template(node).await?;
        build_ignition_config(template, node)
    }

    /// Build, validate and serialize the node's config
    pub async fn generate_user_data(&self, node: &NodeModel) -> Result<Vec<u8>> {
        let config = self.build_user_data(node).await?;
        Ok(serde_json::to_vec(&config)?)
    }

    /// Hand a rendered payload to the backend and serialize the resulting config
    ///
    /// The node is not consulted; the backend alone decides where the
    /// payload lives.
    pub async fn apply_config(&self, _node: &NodeModel, payload: &[u8]) -> Result<Vec<u8>> {
        let config = self.backend.apply_config(payload).await?;
        Ok(serde_json::to_vec(&config)?)
    }
}

/// Fill a template's storage and systemd sections from the node, then validate
///
/// Existing storage and systemd entries of the template are replaced.
pub fn build_ignition_config(mut config: Config, node: &NodeModel) -> Result<Config> {
    config.systemd = systemd_section(&node.services);
    config.storage = storage_section(node)?;

    let report = validate_config(&config);
    for entry in report.warnings() {
        warn!(finding = %entry, "Ignition config validation warning");
    }
    if report.is_fatal() {
        return Err(IgnitionError::Validation { report });
    }

    debug!(
        directories = config.storage.directories.len(),
        files = config.storage.files.len(),
        units = config.systemd.units.len(),
        "Built ignition config"
    );
    Ok(config)
}

fn storage_section(node: &NodeModel) -> Result<Storage> {
    let directories = node
        .directories
        .iter()
        .map(storage_directory)
        .collect::<Result<Vec<_>>>()?;
    let files = node.files.iter().map(storage_file).collect::<Result<Vec<_>>>()?;
    Ok(Storage { directories, files })
}

fn mode_or(path: &str, permissions: Option<&str>, default: u32) -> Result<u32> {
    match permissions {
        Some(permissions) if !permissions.is_empty() => parse_mode(path, permissions),
        _ => Ok(default),
    }
}

fn storage_directory(spec: &DirectorySpec) -> Result<Directory> {
    Ok(Directory {
        filesystem: ROOT_FILESYSTEM.to_string(),
        path: spec.path.clone(),
        overwrite: None,
        mode: Some(mode_or(&spec.path, spec.permissions.as_deref(), DEFAULT_DIR_MODE)?),
    })
}

fn storage_file(spec: &FileSpec) -> Result<File> {
    let mode = mode_or(&spec.path, spec.permissions.as_deref(), DEFAULT_FILE_MODE)?;
    let contents = spec
        .content
        .as_deref()
        .filter(|content| !content.is_empty())
        .map(|content| FileContents {
            source: data_url(content.as_bytes()),
            compression: None,
        });

    Ok(File {
        filesystem: ROOT_FILESYSTEM.to_string(),
        path: spec.path.clone(),
        overwrite: Some(true),
        append: false,
        contents,
        mode: Some(mode),
    })
}

/// Parse an octal permission string such as "0640"
pub fn parse_mode(path: &str, permissions: &str) -> Result<u32> {
    u32::from_str_radix(permissions, 8).map_err(|source| IgnitionError::Permissions {
        path: path.to_string(),
        value: permissions.to_string(),
        source,
    })
}

fn systemd_section(services: &[ServiceUnitSpec]) -> Systemd {
    Systemd {
        units: services.iter().map(systemd_unit).collect(),
    }
}

fn systemd_unit(service: &ServiceUnitSpec) -> Unit {
    Unit {
        name: service.name.clone(),
        enabled: Some(service.enabled),
        mask: None,
        contents: non_empty(&service.content),
        dropins: service
            .dropins
            .iter()
            .map(|dropin| Dropin {
                name: dropin.name.clone(),
                contents: non_empty(&dropin.content),
            })
            .collect(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
