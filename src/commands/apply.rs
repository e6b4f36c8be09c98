//! Ignition apply command

use std::path::PathBuf;

use clap::Args;

use super::read_file;
use super::render::{load_node, static_factory};
use crate::{Error, Result};

/// Render the document that replaces itself with a payload
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to a NodeModel YAML
    #[arg(long)]
    pub node: PathBuf,

    /// Path to the rendered payload
    #[arg(long)]
    pub payload: PathBuf,

    /// Path to the backend config YAML
    #[arg(long, env = "BOOTBUCKET_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Produce the replace document for the payload
pub async fn apply(args: &ApplyArgs) -> Result<String> {
    let node = load_node(Some(args.node.as_path()), None)?;
    let payload = read_file(&args.payload)?;
    if payload.is_empty() {
        return Err(Error::validation(format!(
            "payload {} is empty",
            args.payload.display()
        )));
    }

    let factory = static_factory(args.config.as_deref())?;
    let document = factory.apply_config(&node, &payload).await?;
    String::from_utf8(document).map_err(|e| Error::validation(e.to_string()))
}

/// Run the apply command
pub async fn run(args: ApplyArgs) -> Result<()> {
    println!("{}", apply(&args).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::file_with;

    #[tokio::test]
    async fn payload_is_inlined_as_replace_reference() {
        let node = file_with("version: v1.17.4\n");
        let payload = file_with("{\"ignition\":{\"version\":\"2.2.0\"}}");
        let args = ApplyArgs {
            node: node.path().into(),
            payload: payload.path().into(),
            config: None,
        };

        let document: serde_json::Value = serde_json::from_str(&apply(&args).await.unwrap()).unwrap();
        let source = document["ignition"]["config"]["replace"]["source"]
            .as_str()
            .unwrap();
        assert!(source.starts_with("data:;base64,"));
        assert!(document["ignition"]["config"].get("append").is_none());
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let node = file_with("version: v1.17.4\n");
        let payload = file_with("");
        let args = ApplyArgs {
            node: node.path().into(),
            payload: payload.path().into(),
            config: None,
        };
        assert!(matches!(apply(&args).await, Err(Error::Validation { .. })));
    }
}
