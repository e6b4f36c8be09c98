//! S3 bootstrap bucket configuration
//!
//! Field struct embedded in the infrastructure cluster spec. Admission-time
//! validation is expected to have run already; [`S3Bucket::validate`] exposes
//! the same rules so callers and tooling can check a spec offline.
//!
//! Naming rules: <https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html>

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum length of an S3 bucket name
pub const MIN_BUCKET_NAME_LENGTH: usize = 3;

/// Maximum length of an S3 bucket name
pub const MAX_BUCKET_NAME_LENGTH: usize = 63;

/// Field path of the bucket spec inside the cluster spec
const SPEC_PATH: &str = "spec.s3Bucket";

/// S3 bucket used to distribute machine bootstrap data
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct S3Bucket {
    /// Feature gate for bootstrap-data-in-S3 (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Whether bootbucket creates and deletes the bucket itself
    #[serde(default)]
    pub create: bool,

    /// Explicit bucket name; derived from namespace and cluster name if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// IAM role assumed by control plane machines
    #[serde(default)]
    pub control_plane_identity: String,

    /// IAM roles assumed by worker machines
    #[serde(default)]
    pub node_identities: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for S3Bucket {
    fn default() -> Self {
        Self {
            enabled: true,
            create: false,
            name: None,
            control_plane_identity: String::new(),
            node_identities: Vec::new(),
        }
    }
}

impl S3Bucket {
    /// Whether bucket and object management is active
    pub fn management_enabled(&self) -> bool {
        self.enabled && self.create
    }

    /// Explicit bucket name, treating an empty string as unset
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Validate the spec, returning every violation found
    ///
    /// Nothing is checked unless `create` is set.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errs = Vec::new();

        if !self.create {
            return errs;
        }

        if self.control_plane_identity.is_empty() {
            errs.push(FieldError::required(
                format!("{SPEC_PATH}.controlPlaneIdentity"),
                "can't be empty",
            ));
        }

        if self.node_identities.is_empty() {
            errs.push(FieldError::required(
                format!("{SPEC_PATH}.nodeIdentities"),
                "can't be empty",
            ));
        }

        let mut seen = BTreeSet::new();
        for (i, identity) in self.node_identities.iter().enumerate() {
            let field = format!("{SPEC_PATH}.nodeIdentities[{i}]");
            if identity.is_empty() {
                errs.push(FieldError::required(field, "can't be empty"));
            } else if *identity == self.control_plane_identity {
                errs.push(FieldError::invalid(
                    field,
                    identity,
                    "must differ from controlPlaneIdentity",
                ));
            } else if !seen.insert(identity.as_str()) {
                errs.push(FieldError::duplicate(field, identity));
            }
        }

        if let Some(name) = self.explicit_name() {
            for violation in bucket_name_violations(name) {
                errs.push(FieldError::invalid(
                    format!("{SPEC_PATH}.name"),
                    name,
                    violation,
                ));
            }
        }

        errs
    }
}

/// Kind of field validation failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A required value is missing
    Required,
    /// A value is present but malformed
    Invalid,
    /// A list entry repeats an earlier one
    Duplicate,
}

/// A single field validation failure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    /// Path of the offending field (e.g., "spec.s3Bucket.name")
    pub field: String,
    /// Failure category
    pub kind: FieldErrorKind,
    /// Offending value, for invalid fields
    pub value: Option<String>,
    /// What is wrong
    pub detail: String,
}

impl FieldError {
    fn required(field: String, detail: &str) -> Self {
        Self {
            field,
            kind: FieldErrorKind::Required,
            value: None,
            detail: detail.to_string(),
        }
    }

    fn invalid(field: String, value: &str, detail: &str) -> Self {
        Self {
            field,
            kind: FieldErrorKind::Invalid,
            value: Some(value.to_string()),
            detail: detail.to_string(),
        }
    }
}

impl FieldError {
    fn duplicate(field: String, value: &str) -> Self {
        Self {
            field,
            kind: FieldErrorKind::Duplicate,
            value: Some(value.to_string()),
            detail: String::new(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.value) {
            (FieldErrorKind::Invalid, Some(value)) => write!(
                f,
                "{}: Invalid value: {:?}: {}",
                self.field, value, self.detail
            ),
            (FieldErrorKind::Invalid, None) => {
                write!(f, "{}: Invalid value: {}", self.field, self.detail)
            }
            (FieldErrorKind::Required, _) => {
                write!(f, "{}: Required value: {}", self.field, self.detail)
            }
            (FieldErrorKind::Duplicate, value) => write!(
                f,
                "{}: Duplicate value: {:?}",
                self.field,
                value.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Check a bucket name against the S3 naming rules
///
/// Returns one message per violated rule; an empty list means the name is valid.
pub fn bucket_name_violations(name: &str) -> Vec<&'static str> {
    let mut violations = Vec::new();

    if name.len() < MIN_BUCKET_NAME_LENGTH || name.len() > MAX_BUCKET_NAME_LENGTH {
        violations.push("must be between 3 and 63 characters long");
    }

    if !name.chars().all(is_bucket_name_char) {
        violations.push("consist only of lowercase letters, numbers, dots (.), and hyphens (-)");
    }

    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let starts_ok = name.chars().next().is_some_and(alnum);
    let ends_ok = name.chars().last().is_some_and(alnum);
    if !starts_ok || !ends_ok {
        violations.push("must begin and end with a letter or number");
    }

    if name.parse::<IpAddr>().is_ok() {
        violations.push("must not be formatted as an IP address (for example, 192.168.5.4)");
    }

    violations
}

fn is_bucket_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
}
