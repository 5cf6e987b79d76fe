//! Pid-file liveness inspection.
//!
//! Status strategy for every backend family except WSL2: pid-based
//! drivers write [`filenames::DRIVER_PID`] into the instance directory
//! while the guest is running, and `create` provisions the boot disk.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::trace;

use crate::error::{Result, StoreError};
use crate::filenames;
use crate::instance::InstanceStatus;

/// Whether a process with `pid` is currently alive.
pub fn process_alive(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
    system.process(Pid::from_u32(pid)).is_some()
}

/// Read a pid file; `Ok(None)` when the file does not exist.
pub fn read_pid_file(path: &Path) -> Result<Option<u32>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    content
        .trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|err| StoreError::BadPidFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
}

/// Resolve the status of a pid-based instance from its directory.
///
/// A live pid means `Running`; a stale pid file or a provisioned boot
/// disk without a pid means `Stopped`; a directory with neither means
/// the instance was never created.
pub fn inspect_status(inst_dir: &Path) -> Result<InstanceStatus> {
    let pid_path = inst_dir.join(filenames::DRIVER_PID);
    match read_pid_file(&pid_path)? {
        Some(pid) if process_alive(pid) => {
            trace!(pid, dir = %inst_dir.display(), "Driver process is alive");
            Ok(InstanceStatus::Running)
        }
        // Stale pid file: the driver exited without cleaning up.
        Some(_) => Ok(InstanceStatus::Stopped),
        None => {
            if inst_dir.join(filenames::DIFF_DISK).exists() {
                Ok(InstanceStatus::Stopped)
            } else {
                Ok(InstanceStatus::Uninitialized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_when_nothing_present() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(
            inspect_status(tmp.path()).unwrap(),
            InstanceStatus::Uninitialized
        );
    }

    #[test]
    fn test_stopped_when_disk_provisioned() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(filenames::DIFF_DISK), b"").unwrap();
        assert_eq!(inspect_status(tmp.path()).unwrap(), InstanceStatus::Stopped);
    }

    #[test]
    fn test_running_when_pid_alive() {
        let tmp = tempfile::tempdir().unwrap();
        // Our own pid is certainly alive.
        let pid = std::process::id();
        fs::write(tmp.path().join(filenames::DRIVER_PID), format!("{pid}\n")).unwrap();
        assert_eq!(inspect_status(tmp.path()).unwrap(), InstanceStatus::Running);
    }

    #[test]
    #[cfg(unix)]
    fn test_stopped_when_pid_stale() {
        let tmp = tempfile::tempdir().unwrap();
        // Spawn and reap a short-lived child to obtain a dead pid.
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        fs::write(tmp.path().join(filenames::DRIVER_PID), pid.to_string()).unwrap();
        assert_eq!(inspect_status(tmp.path()).unwrap(), InstanceStatus::Stopped);
    }

    #[test]
    fn test_garbage_pid_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(filenames::DRIVER_PID), b"not-a-pid").unwrap();
        assert!(matches!(
            inspect_status(tmp.path()),
            Err(StoreError::BadPidFile { .. })
        ));
    }
}
