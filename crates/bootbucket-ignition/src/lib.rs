//! Ignition bootstrap documents for bootbucket
//!
//! A machine's user data is an Ignition v2.2 config built in two stages:
//!
//! 1. [`Factory::generate_user_data`] renders the node's files and units on
//!    top of a base template chosen by Kubernetes version
//! 2. [`Factory::apply_config`] hands the rendered bytes to a backend, which
//!    returns a small document that replaces itself with them
//!
//! Backends are picked at construction with [`create_backend`].

pub mod backend;
pub mod config;
pub mod error;
pub mod factory;
pub mod kubeadm;
pub mod model;
pub mod service;
pub mod types;
pub mod validate;

pub use backend::{create_backend, BackendKind, ObjectStoreBackend, StaticTemplateBackend, TemplateBackend};
pub use config::{BackendConfig, TemplateCatalog};
pub use error::{IgnitionError, Result};
pub use factory::{build_ignition_config, Factory};
pub use kubeadm::{kubeadm_node, KubeadmAction, KubeadmNodeSpec};
pub use model::{DirectorySpec, DropinSpec, FileSpec, NodeModel, ServiceUnitSpec};
pub use service::UserDataService;
pub use types::Config;
pub use validate::{validate_config, Report};
