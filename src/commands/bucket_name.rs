//! Bucket name command

use clap::Args;

use bootbucket_s3::derive_bucket_name;

use crate::Result;

/// Print the bucket name derived for a cluster
#[derive(Args, Debug)]
pub struct BucketNameArgs {
    /// Namespace of the cluster
    #[arg(long)]
    pub namespace: String,

    /// Name of the cluster
    #[arg(long)]
    pub cluster: String,

    /// Explicit bucket name; printed unchanged when set
    #[arg(long)]
    pub name: Option<String>,
}

/// Compute the bucket name
pub fn bucket_name(args: &BucketNameArgs) -> Result<String> {
    Ok(derive_bucket_name(
        args.name.as_deref().filter(|name| !name.is_empty()),
        &args.namespace,
        &args.cluster,
    )?)
}

/// Run the bucket-name command
pub fn run(args: BucketNameArgs) -> Result<()> {
    println!("{}", bucket_name(&args)?);
    Ok(())
}
