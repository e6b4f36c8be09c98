//! Ignition v2.2 config types
//!
//! Only the sections bootbucket renders: config references, files,
//! directories and systemd units. Field names follow the v2.2 JSON schema.
//!
//! Reference: <https://coreos.github.io/ignition/configuration-v2_2/>

use serde::{Deserialize, Serialize};

/// Schema version stamped into every rendered config
pub const IGNITION_SCHEMA_VERSION: &str = "2.2.0";

/// Root of an Ignition config
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Metadata and config references
    pub ignition: Ignition,
    /// Files and directories
    #[serde(default)]
    pub storage: Storage,
    /// Systemd units
    #[serde(default)]
    pub systemd: Systemd,
}

impl Config {
    /// Empty config carrying the schema version
    pub fn base() -> Self {
        Self {
            ignition: Ignition {
                version: IGNITION_SCHEMA_VERSION.to_string(),
                config: IgnitionConfig::default(),
            },
            ..Default::default()
        }
    }

    /// Base config that merges the referenced config into itself
    pub fn appending(source: impl Into<String>) -> Self {
        let mut config = Self::base();
        config.ignition.config.append.push(ConfigReference::new(source));
        config
    }

    /// Base config that is replaced wholesale by the referenced config
    pub fn replaced_by(source: impl Into<String>) -> Self {
        let mut config = Self::base();
        config.ignition.config.replace = Some(ConfigReference::new(source));
        config
    }
}

/// The `ignition` section
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Ignition {
    /// Schema version
    pub version: String,
    /// References to other configs
    #[serde(default)]
    pub config: IgnitionConfig,
}

/// Config references: `append` augments this config, `replace` supersedes it
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct IgnitionConfig {
    /// Configs merged into this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<ConfigReference>,
    /// Config that replaces this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<ConfigReference>,
}

/// Location of a remote config
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigReference {
    /// URL of the config (`s3://`, `https://`, `data:`, ...)
    pub source: String,
}

impl ConfigReference {
    /// Reference the config at `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// The `storage` section
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Storage {
    /// Directories to create
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<Directory>,
    /// Files to write
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
}

/// A file to write
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct File {
    /// Filesystem identifier the path is relative to
    pub filesystem: String,
    /// Absolute path
    pub path: String,
    /// Replace an existing file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    /// Append to an existing file instead of writing it
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub append: bool,
    /// File contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<FileContents>,
    /// Permission bits (decimal in JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

/// Contents of a file
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FileContents {
    /// URL of the contents, usually an inline `data:` URL
    pub source: String,
    /// Compression of the fetched contents (`gzip`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

/// A directory to create
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Directory {
    /// Filesystem identifier the path is relative to
    pub filesystem: String,
    /// Absolute path
    pub path: String,
    /// Replace an existing node at the path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    /// Permission bits (decimal in JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

/// The `systemd` section
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Systemd {
    /// Units to install
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
}

/// A systemd unit
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    /// Unit file name including its suffix (e.g., "kubeinit.service")
    pub name: String,
    /// Enable the unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Mask the unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<bool>,
    /// Unit file contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    /// Drop-in fragments, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropins: Vec<Dropin>,
}

/// A systemd drop-in fragment
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Dropin {
    /// Drop-in file name (must end in ".conf")
    pub name: String,
    /// Drop-in contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_config_serializes_version_and_empty_sections() {
        let json = serde_json::to_value(Config::base()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ignition": {"version": "2.2.0", "config": {}},
                "storage": {},
                "systemd": {}
            })
        );
    }

    #[test]
    fn append_and_replace_references() {
        let json = serde_json::to_value(Config::appending("s3://b/t.ign")).unwrap();
        assert_eq!(
            json["ignition"]["config"],
            serde_json::json!({"append": [{"source": "s3://b/t.ign"}]})
        );

        let json = serde_json::to_value(Config::replaced_by("s3://b/u")).unwrap();
        assert_eq!(
            json["ignition"]["config"],
            serde_json::json!({"replace": {"source": "s3://b/u"}})
        );
    }

    #[test]
    fn file_omits_unset_fields() {
        let file = File {
            filesystem: "root".into(),
            path: "/etc/foo".into(),
            mode: Some(0o644),
            ..Default::default()
        };
        let json = serde_json::to_value(file).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"filesystem": "root", "path": "/etc/foo", "mode": 420})
        );
    }

    #[test]
    fn config_parses_from_ignition_json() {
        let json = r#"{
            "ignition": {"version": "2.2.0", "config": {"replace": {"source": "s3://b/k"}}},
            "systemd": {"units": [{"name": "a.service", "enabled": true}]}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.ignition.config.replace, Some(ConfigReference::new("s3://b/k")));
        assert!(config.storage.files.is_empty());
        assert_eq!(config.systemd.units[0].enabled, Some(true));
    }
}
