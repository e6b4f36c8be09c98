//! Bootstrap document source model
//!
//! What a machine's Ignition config should contain, as supplied by the
//! caller. A model is read-only for the duration of one document build.

use serde::{Deserialize, Serialize};

/// Mode applied to files without explicit permissions
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode applied to directories without explicit permissions
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Files, units and Kubernetes version of one machine
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeModel {
    /// Directories to create, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<DirectorySpec>,
    /// Files to write, in order
    #[serde(default)]
    pub files: Vec<FileSpec>,
    /// Systemd units to install, in order
    #[serde(default)]
    pub services: Vec<ServiceUnitSpec>,
    /// Kubernetes version, used to pick the base template
    #[serde(default)]
    pub version: String,
}

/// A file to place on the machine
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSpec {
    /// Absolute path
    pub path: String,
    /// Octal permission string (e.g., "0640")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    /// File contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A directory to create on the machine
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySpec {
    /// Absolute path
    pub path: String,
    /// Octal permission string; [`DEFAULT_DIR_MODE`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
}

/// A systemd unit to install
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUnitSpec {
    /// Unit file name (e.g., "kubeinit.service")
    pub name: String,
    /// Unit file contents
    #[serde(default)]
    pub content: String,
    /// Enable the unit at boot
    #[serde(default)]
    pub enabled: bool,
    /// Drop-in fragments, in order
    #[serde(default)]
    pub dropins: Vec<DropinSpec>,
}

/// A systemd drop-in fragment
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DropinSpec {
    /// Drop-in file name
    pub name: String,
    /// Drop-in contents
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_model_parses_from_yaml() {
        let yaml = r#"
version: v1.17.4
directories:
  - path: /etc/kubernetes
files:
  - path: /etc/foo
    permissions: "0640"
    content: bar
  - path: /etc/empty
services:
  - name: kubeinit.service
    content: "[Unit]\n"
    enabled: true
    dropins:
      - name: 10-pre.conf
        content: "[Service]\n"
"#;
        let node: NodeModel = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(node.version, "v1.17.4");
        assert_eq!(node.directories[0].path, "/etc/kubernetes");
        assert_eq!(node.directories[0].permissions, None);
        assert_eq!(node.files.len(), 2);
        assert_eq!(node.files[0].permissions.as_deref(), Some("0640"));
        assert_eq!(node.files[1].content, None);
        assert!(node.services[0].enabled);
        assert_eq!(node.services[0].dropins[0].name, "10-pre.conf");
    }

    #[test]
    fn default_modes() {
        assert_eq!(DEFAULT_FILE_MODE, 420);
        assert_eq!(DEFAULT_DIR_MODE, 493);
    }
}
