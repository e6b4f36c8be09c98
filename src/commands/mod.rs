//! CLI commands

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Error, Result};

pub mod apply;
pub mod bucket_name;
pub mod policy;
pub mod render;
pub mod validate;

/// Read a whole file
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a YAML file
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = read_file(path)?;
    serde_yaml::from_slice(&bytes).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::file_with;
    use super::*;
    use bootbucket_common::crd::S3Bucket;

    #[test]
    fn yaml_files_parse() {
        let file = file_with("create: true\ncontrolPlaneIdentity: cp\n");
        let spec: S3Bucket = read_yaml(file.path()).unwrap();
        assert!(spec.create);
        assert_eq!(spec.control_plane_identity, "cp");
    }

    #[test]
    fn errors_name_the_file() {
        let err = read_yaml::<S3Bucket>(Path::new("/nonexistent/bucket.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bucket.yaml"));

        let file = file_with("create: [\n");
        let err = read_yaml::<S3Bucket>(file.path()).unwrap_err();
        assert!(matches!(err, Error::Yaml { .. }));
    }
}
