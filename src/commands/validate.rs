//! Bucket spec validation command

use std::path::PathBuf;

use clap::Args;

use bootbucket_common::crd::S3Bucket;

use super::read_yaml;
use crate::{Error, Result};

/// Validate a bucket spec
#[derive(Args, Debug)]
pub struct ValidateBucketArgs {
    /// Path to the S3Bucket spec YAML
    #[arg(long)]
    pub bucket_spec: PathBuf,
}

/// Check a spec, joining every violation into one error
pub fn validate_bucket(spec: &S3Bucket) -> Result<()> {
    let errs = spec.validate();
    if errs.is_empty() {
        return Ok(());
    }
    let message = errs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::validation(message))
}

/// Run the validate-bucket command
pub fn run(args: ValidateBucketArgs) -> Result<()> {
    let spec: S3Bucket = read_yaml(&args.bucket_spec)?;
    validate_bucket(&spec)?;
    println!("{} is valid", args.bucket_spec.display());
    Ok(())
}
