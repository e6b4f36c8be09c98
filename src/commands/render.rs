//! Ignition render command
//!
//! Runs the document factory against the static template backend, so the
//! output can be inspected without any object store.

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args};
use tracing::debug;

use bootbucket_ignition::{
    create_backend, kubeadm_node, BackendConfig, BackendKind, Factory, KubeadmNodeSpec, NodeModel,
};

use super::read_yaml;
use crate::Result;

/// Render a node's Ignition user data
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true)))]
pub struct RenderArgs {
    /// Path to a NodeModel YAML
    #[arg(long, group = "source")]
    pub node: Option<PathBuf>,

    /// Path to a KubeadmNodeSpec YAML
    #[arg(long, group = "source")]
    pub kubeadm: Option<PathBuf>,

    /// Path to the backend config YAML
    #[arg(long, env = "BOOTBUCKET_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Static-backend factory for the given config file
pub fn static_factory(config: Option<&Path>) -> Result<Factory> {
    let config = BackendConfig::load(config)?;
    let backend = create_backend(BackendKind::Static, config, None)?;
    Ok(Factory::new(backend))
}

/// Load the node model named by the arguments
pub fn load_node(node: Option<&Path>, kubeadm: Option<&Path>) -> Result<NodeModel> {
    match (node, kubeadm) {
        (_, Some(path)) => {
            let spec: KubeadmNodeSpec = read_yaml(path)?;
            Ok(kubeadm_node(&spec))
        }
        (Some(path), None) => read_yaml(path),
        (None, None) => Ok(NodeModel::default()),
    }
}

/// Render the user data JSON
pub async fn render(args: &RenderArgs) -> Result<String> {
    let node = load_node(args.node.as_deref(), args.kubeadm.as_deref())?;
    let factory = static_factory(args.config.as_deref())?;
    debug!(version = %node.version, files = node.files.len(), "Rendering user data");

    let config = factory.build_user_data(&node).await?;
    Ok(serde_json::to_string_pretty(&config)?)
}

/// Run the render command
pub async fn run(args: RenderArgs) -> Result<()> {
    println!("{}", render(&args).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::file_with;
    use crate::Error;

    fn args(node: Option<PathBuf>, kubeadm: Option<PathBuf>, config: Option<PathBuf>) -> RenderArgs {
        RenderArgs {
            node,
            kubeadm,
            config,
        }
    }

    #[tokio::test]
    async fn renders_node_model() {
        let node = file_with(
            "version: v1.16.8\nfiles:\n  - path: /etc/foo\n    permissions: \"0600\"\n    content: bar\n",
        );
        let json = render(&args(Some(node.path().into()), None, None)).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["ignition"]["version"], "2.2.0");
        assert_eq!(
            value["ignition"]["config"]["append"][0]["source"],
            "s3://ignition-userdata-bucket/ignition-config/k8s-v1.16.8.ign"
        );
        assert_eq!(value["storage"]["files"][0]["mode"], 384);
    }

    #[tokio::test]
    async fn renders_kubeadm_node_with_custom_config() {
        let kubeadm = file_with(
            "action: join\nconfigurations: [\"kind: JoinConfiguration\"]\nkubernetesVersion: v1.18.0\n",
        );
        let config = file_with(
            "userDataBucket: templates\ncatalog:\n  defaultVersion: v1.18.0\n  templates:\n    v1.18.0: base/v1.18.0.ign\n",
        );
        let json = render(&args(None, Some(kubeadm.path().into()), Some(config.path().into())))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(
            value["ignition"]["config"]["append"][0]["source"],
            "s3://templates/base/v1.18.0.ign"
        );
        assert_eq!(value["storage"]["files"][0]["path"], "/etc/kubeadm.yml");
        assert_eq!(value["systemd"]["units"][0]["name"], "kubeinit.service");
    }

    #[tokio::test]
    async fn invalid_node_reports_validation_failure() {
        let node = file_with("files:\n  - path: etc/relative\n");
        let err = render(&args(Some(node.path().into()), None, None)).await.unwrap_err();
        assert!(matches!(err, Error::Ignition(_)));
        assert!(err.to_string().contains("path not absolute"));
    }
}
