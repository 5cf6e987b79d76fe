//! Data directory resolution.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Environment variable overriding the data directory location.
pub const ENV_OXLIMA_HOME: &str = "OXLIMA_HOME";

/// Default data directory name under the user's home directory.
pub const DOT_OXLIMA: &str = ".oxlima";

/// Subdirectory of the data directory holding disk directories.
///
/// The leading underscore keeps it out of instance enumeration.
pub const DISKS_DIR: &str = "_disks";

/// Resolve the oxlima data directory.
///
/// `OXLIMA_HOME` takes precedence when set and non-empty; otherwise
/// the directory is `~/.oxlima`. The directory is not required to
/// exist.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_OXLIMA_HOME) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(DOT_OXLIMA))
        .ok_or(StoreError::DataDirUnavailable)
}

/// Resolve the directory holding disk directories.
pub fn disks_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join(DISKS_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_env_override() {
        let tmp = tempfile::tempdir().unwrap();
        let _guard = testutil::set_home(tmp.path());

        assert_eq!(data_dir().unwrap(), tmp.path());
        assert_eq!(disks_dir().unwrap(), tmp.path().join(DISKS_DIR));
    }
}
