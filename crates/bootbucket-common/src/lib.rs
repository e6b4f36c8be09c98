//! Common types for bootbucket: errors, bucket spec, and telemetry

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod telemetry;

pub use error::{ClientError, Error};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// URL scheme of objects stored in S3
pub const S3_SCHEME: &str = "s3";

/// Format an `s3://bucket/key` reference
///
/// The result is an opaque provenance string; nothing in bootbucket parses it back.
pub fn s3_url(bucket: &str, key: &str) -> String {
    format!("{}://{}/{}", S3_SCHEME, bucket, key.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_url_joins_bucket_and_key() {
        assert_eq!(
            s3_url("demo-cluster1", "node/worker-0"),
            "s3://demo-cluster1/node/worker-0"
        );
        assert_eq!(s3_url("b", "/leading"), "s3://b/leading");
    }
}
