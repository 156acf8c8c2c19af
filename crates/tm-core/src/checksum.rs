//! SHA-256 checksums for migration bodies.

use sha2::{Digest, Sha256};

/// Compute the hex SHA-256 of a migration body.
///
/// Line endings are normalised to `\n` first so a script checked out on
/// Windows does not register as drifted.
pub fn compute_checksum(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}
