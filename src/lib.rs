//! bootbucket - bootstrap-data buckets and Ignition user data for Cluster API machines
//!
//! The library crates do the work:
//!
//! - [`bootbucket_common`] - errors, the `S3Bucket` spec, telemetry
//! - [`bootbucket_s3`] - bucket naming, policy, bucket and object lifecycle
//! - [`bootbucket_ignition`] - Ignition documents, backends and factory
//!
//! This crate adds an offline CLI over them: name derivation, policy
//! rendering, spec validation and Ignition rendering, none of which needs
//! cloud credentials.

#![deny(missing_docs)]

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// bootbucket - bootstrap-data bucket and Ignition user-data tooling
#[derive(Parser, Debug)]
#[command(name = "bootbucket")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the bucket name derived for a cluster
    BucketName(commands::bucket_name::BucketNameArgs),

    /// Print the bucket policy for a bucket spec
    Policy(commands::policy::PolicyArgs),

    /// Validate a bucket spec
    ValidateBucket(commands::validate::ValidateBucketArgs),

    /// Render a node's Ignition user data
    Render(commands::render::RenderArgs),

    /// Render the document that replaces itself with a payload
    Apply(commands::apply::ApplyArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::BucketName(args) => commands::bucket_name::run(args),
            Commands::Policy(args) => commands::policy::run(args),
            Commands::ValidateBucket(args) => commands::validate::run(args),
            Commands::Render(args) => commands::render::run(args).await,
            Commands::Apply(args) => commands::apply::run(args).await,
        }
    }
}
