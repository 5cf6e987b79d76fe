//! Enumeration and validation of instance and disk directories.
//!
//! Three different error postures for three different call sites:
//! listing tolerates an absent root (initial discovery), resolution is
//! pure path construction behind identifier validation (ad-hoc use),
//! and [`validate`] fails fast on the first integrity problem.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::dirnames;
use crate::error::{Result, StoreError};
use crate::filenames;
use crate::identifiers;

/// The data directory, or an empty path if it cannot be resolved.
///
/// Callers must treat an empty result as "unavailable", never as a
/// valid directory.
pub fn root_directory() -> PathBuf {
    dirnames::data_dir().unwrap_or_default()
}

/// Names of the instances under the data directory, sorted.
///
/// Entries starting with `.` or `_` and non-directories are skipped.
/// A non-existent data directory yields an empty list.
pub fn instances() -> Result<Vec<String>> {
    instances_under(&dirnames::data_dir()?)
}

pub(crate) fn instances_under(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        if !entry.file_type()?.is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();

    debug!(count = names.len(), "Enumerated instances");
    Ok(names)
}

/// Names of the disks under the disk directory, sorted.
///
/// Disks have no hidden-name convention, so nothing is filtered. A
/// non-existent disk directory yields an empty list.
pub fn disks() -> Result<Vec<String>> {
    disks_under(&dirnames::disks_dir()?)
}

pub(crate) fn disks_under(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Resolve the directory of the instance `name`.
///
/// Validates the identifier first and never touches the filesystem:
/// whether the directory exists is the caller's concern.
pub fn instance_dir(name: &str) -> Result<PathBuf> {
    identifiers::validate(name)?;
    Ok(dirnames::data_dir()?.join(name))
}

/// Resolve the directory of the disk `name`.
///
/// Same contract as [`instance_dir`], under the disk root.
pub fn disk_dir(name: &str) -> Result<PathBuf> {
    identifiers::validate(name)?;
    Ok(dirnames::disks_dir()?.join(name))
}

/// Check the integrity of the data directory.
///
/// Every enumerated instance directory must contain a configuration
/// document; fails fast on the first one that does not.
pub fn validate() -> Result<()> {
    let root = dirnames::data_dir()?;
    for name in instances_under(&root)? {
        let config_path = root.join(&name).join(filenames::CONFIG_YAML);
        if let Err(err) = fs::metadata(&config_path) {
            if err.kind() == ErrorKind::NotFound {
                return Err(StoreError::MissingConfig {
                    instance: name,
                    path: config_path,
                });
            }
            return Err(err.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_instances_absent_root() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");
        assert_eq!(instances_under(&missing).unwrap(), Vec::<String>::new());
        assert_eq!(disks_under(&missing).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_instances_filtering() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join(".hidden")).unwrap();
        fs::create_dir(tmp.path().join("_private")).unwrap();
        fs::create_dir(tmp.path().join("real1")).unwrap();
        fs::write(tmp.path().join("not-a-dir"), b"x").unwrap();

        assert_eq!(instances_under(tmp.path()).unwrap(), vec!["real1"]);
    }

    #[test]
    fn test_disks_not_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("data")).unwrap();
        fs::create_dir(tmp.path().join("_odd")).unwrap();
        fs::write(tmp.path().join("raw"), b"x").unwrap();

        assert_eq!(disks_under(tmp.path()).unwrap(), vec!["_odd", "data", "raw"]);
    }

    #[test]
    fn test_resolution_is_pure() {
        let tmp = tempfile::tempdir().unwrap();
        // Point the store at a directory that does not exist: path
        // resolution must still succeed.
        let root = tmp.path().join("never-created");
        let _guard = testutil::set_home(&root);

        let dir = instance_dir("myvm").unwrap();
        assert_eq!(dir, root.join("myvm"));
        assert!(dir.ends_with("myvm"));

        let disk = disk_dir("data0").unwrap();
        assert_eq!(disk, root.join(dirnames::DISKS_DIR).join("data0"));
    }

    #[test]
    fn test_resolution_rejects_invalid_names() {
        let tmp = tempfile::tempdir().unwrap();
        let _guard = testutil::set_home(tmp.path());

        for name in ["", "a/b", "../up", ".hidden"] {
            assert!(matches!(
                instance_dir(name),
                Err(StoreError::InvalidIdentifier { .. })
            ));
            assert!(matches!(
                disk_dir(name),
                Err(StoreError::InvalidIdentifier { .. })
            ));
        }
    }

    #[test]
    fn test_validate_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        let _guard = testutil::set_home(tmp.path());

        fs::create_dir(tmp.path().join("good")).unwrap();
        fs::write(
            tmp.path().join("good").join(filenames::CONFIG_YAML),
            b"vmType: qemu\n",
        )
        .unwrap();
        assert!(validate().is_ok());

        fs::create_dir(tmp.path().join("bad")).unwrap();
        let err = validate().unwrap_err();
        match err {
            StoreError::MissingConfig { instance, .. } => assert_eq!(instance, "bad"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
