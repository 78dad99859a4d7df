use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 10_000;

/// Digest of a file's content.
///
/// Unsalted, so third parties holding the same file can reproduce it.
pub fn compute_file_digest<D: Digest>(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    let digest = hasher.finalize().to_vec();
    tracing::debug!(path = %path.display(), bytes = total, "computed file digest");
    Ok(digest)
}

/// Lowercase hex SHA-256 of a file's content
pub fn sha256_file_hex(path: impl AsRef<Path>) -> Result<String> {
    let digest = compute_file_digest::<Sha256>(path)?;
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
