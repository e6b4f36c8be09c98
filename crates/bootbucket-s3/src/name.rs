//! Bucket name derivation
//!
//! Bucket names are recomputed on every reconcile and never stored, so the
//! derivation must stay a pure function of its inputs. Changing the hash
//! below renames the bucket of every existing cluster whose
//! `namespace-cluster` candidate is too long: the digest (SHA-512, first
//! `len` bytes, each reduced mod 36) is pinned and must not change.

use aws_lc_rs::digest::{digest, SHA512, SHA512_OUTPUT_LEN};
use tracing::debug;

use bootbucket_common::crd::MAX_BUCKET_NAME_LENGTH;
use bootbucket_common::{Error, Result};

/// Suffix appended to hashed bucket names
pub const HASHED_NAME_SUFFIX: &str = "-k8s";

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Derive the bootstrap bucket name for a cluster
///
/// An explicit, non-empty name wins and is returned unchanged. Otherwise
/// `namespace-cluster` is used when it fits, and a fixed-width base-36 hash
/// of it suffixed with `-k8s` when it doesn't.
pub fn derive_bucket_name(
    explicit: Option<&str>,
    namespace: &str,
    cluster_name: &str,
) -> Result<String> {
    if let Some(name) = explicit.filter(|name| !name.is_empty()) {
        return Ok(name.to_string());
    }

    let candidate = format!("{}-{}", namespace, cluster_name);
    if candidate.len() < MAX_BUCKET_NAME_LENGTH {
        return Ok(candidate);
    }

    let short = base36_truncated_hash(
        &candidate,
        MAX_BUCKET_NAME_LENGTH - HASHED_NAME_SUFFIX.len(),
    )?;
    debug!(candidate = %candidate, "bucket name candidate too long, using hashed name");

    Ok(format!("{}{}", short, HASHED_NAME_SUFFIX))
}

/// Hash `input` to exactly `len` characters of `[0-9a-z]`
///
/// `len` must be between 1 and 64 (the SHA-512 digest size).
pub fn base36_truncated_hash(input: &str, len: usize) -> Result<String> {
    if len == 0 || len > SHA512_OUTPUT_LEN {
        return Err(Error::encoding(
            "generating bucket name",
            format!(
                "hash length {} out of range 1..={}",
                len, SHA512_OUTPUT_LEN
            ),
        ));
    }

    let hash = digest(&SHA512, input.as_bytes());
    Ok(hash.as_ref()[..len]
        .iter()
        .map(|b| BASE36_ALPHABET[(*b % 36) as usize] as char)
        .collect())
}
