//! Kubeadm node helpers
//!
//! Assembles the [`NodeModel`] of a kubeadm-bootstrapped machine: the
//! kubeadm configuration file, a oneshot `kubeinit.service` running
//! `kubeadm init` or `kubeadm join`, and drop-ins running the user's pre and
//! post commands around it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{DropinSpec, FileSpec, NodeModel, ServiceUnitSpec};

/// Where the kubeadm configuration is written on the machine
pub const KUBEADM_CONFIG_PATH: &str = "/etc/kubeadm.yml";

/// Permissions of the kubeadm configuration file
pub const KUBEADM_CONFIG_PERMISSIONS: &str = "0640";

/// Name of the unit running kubeadm
pub const KUBEINIT_UNIT_NAME: &str = "kubeinit.service";

/// Drop-in running pre-kubeadm commands
pub const PRE_KUBEADM_DROPIN: &str = "10-pre-kubeadm.conf";

/// Drop-in running post-kubeadm commands
pub const POST_KUBEADM_DROPIN: &str = "20-post-kubeadm.conf";

/// Separator between YAML documents in the kubeadm configuration
const YAML_DOCUMENT_SEPARATOR: &str = "\n---\n";

/// kubeadm subcommand run at first boot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KubeadmAction {
    /// First control plane node
    #[default]
    Init,
    /// Additional control plane or worker node
    Join,
}

impl fmt::Display for KubeadmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Join => write!(f, "join"),
        }
    }
}

/// Inputs of a kubeadm-bootstrapped node
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeadmNodeSpec {
    /// `init` or `join`
    #[serde(default)]
    pub action: KubeadmAction,
    /// kubeadm configuration documents (Init/Join, Cluster, ...)
    #[serde(default)]
    pub configurations: Vec<String>,
    /// kubeadm log verbosity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u32>,
    /// Commands run before kubeadm
    #[serde(default)]
    pub pre_kubeadm_commands: Vec<String>,
    /// Commands run after kubeadm
    #[serde(default)]
    pub post_kubeadm_commands: Vec<String>,
    /// Extra files to write
    #[serde(default)]
    pub files: Vec<FileSpec>,
    /// Kubernetes version
    #[serde(default)]
    pub kubernetes_version: String,
}

/// Contents of `kubeinit.service`
pub fn kubeinit_unit(action: KubeadmAction, verbosity: Option<u32>, config_path: &str) -> String {
    let verbosity = verbosity
        .map(|v| format!(" --v {}", v))
        .unwrap_or_default();
    format!(
        "[Unit]
Description=Bootstrap a Kubernetes node with kubeadm
Wants=network-online.target
After=network-online.target
ConditionPathExists=!/etc/kubernetes/kubelet.conf

[Service]
Type=oneshot
RemainAfterExit=yes
ExecStart=/usr/bin/kubeadm {action}{verbosity} --config {config_path}

[Install]
WantedBy=multi-user.target
"
    )
}

/// Drop-ins running `pre` before and `post` after kubeadm
///
/// Empty command lists produce no drop-in.
pub fn commands_dropins(pre: &[String], post: &[String]) -> Vec<DropinSpec> {
    let mut dropins = Vec::new();
    if !pre.is_empty() {
        dropins.push(DropinSpec {
            name: PRE_KUBEADM_DROPIN.to_string(),
            content: service_commands("ExecStartPre", pre),
        });
    }
    if !post.is_empty() {
        dropins.push(DropinSpec {
            name: POST_KUBEADM_DROPIN.to_string(),
            content: service_commands("ExecStartPost", post),
        });
    }
    dropins
}

fn service_commands(directive: &str, commands: &[String]) -> String {
    let mut out = String::from("[Service]\n");
    for command in commands {
        out.push_str(&format!(
            "{}=/bin/sh -c \"{}\"\n",
            directive,
            escape_command(command)
        ));
    }
    out
}

/// Escape a shell command for a double-quoted systemd command line
fn escape_command(command: &str) -> String {
    let mut out = String::with_capacity(command.len());
    for c in command.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '%' => out.push_str("%%"),
            '$' => out.push_str("$$"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Node model of a kubeadm-bootstrapped machine
pub fn kubeadm_node(spec: &KubeadmNodeSpec) -> NodeModel {
    let mut files = vec![FileSpec {
        path: KUBEADM_CONFIG_PATH.to_string(),
        permissions: Some(KUBEADM_CONFIG_PERMISSIONS.to_string()),
        content: Some(spec.configurations.join(YAML_DOCUMENT_SEPARATOR)),
    }];
    files.extend(spec.files.iter().cloned());

    NodeModel {
        files,
        services: vec![ServiceUnitSpec {
            name: KUBEINIT_UNIT_NAME.to_string(),
            content: kubeinit_unit(spec.action, spec.verbosity, KUBEADM_CONFIG_PATH),
            enabled: true,
            dropins: commands_dropins(&spec.pre_kubeadm_commands, &spec.post_kubeadm_commands),
        }],
        version: spec.kubernetes_version.clone(),
        ..Default::default()
    }
}
