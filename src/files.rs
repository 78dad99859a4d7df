use crate::error::Result;
use std::path::Path;
use tempfile::{Builder, NamedTempFile, TempDir};

/// Prefix of directories created by [`make_temp_dir`]
pub const TEMP_DIR_PREFIX: &str = "safeharbor_";

/// Create a fresh directory under the system temp dir.
///
/// The directory is removed when the returned value is dropped unless it
/// is persisted through `TempDir`.
pub fn make_temp_dir() -> Result<TempDir> {
    Ok(Builder::new().prefix(TEMP_DIR_PREFIX).tempdir()?)
}

/// Create a uniquely named file in `dir` whose name starts with `prefix`
pub fn make_temp_file(dir: impl AsRef<Path>, prefix: &str) -> Result<NamedTempFile> {
    Ok(Builder::new().prefix(prefix).tempfile_in(dir)?)
}
