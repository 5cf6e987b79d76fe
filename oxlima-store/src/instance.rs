//! Instance records and the status resolution engine.
//!
//! An [`Instance`] is rebuilt from the on-disk presence every time it
//! is inspected; nothing here is persisted except the configuration
//! document. Inspection failures are recorded on the instance itself
//! so that one broken instance never hides its siblings.

use std::path::PathBuf;

use serde::{Serialize, Serializer};
use tracing::warn;

use crate::error::Result;
use crate::filenames;
use crate::liveness;
use crate::store;
use crate::wsl;
use crate::yaml::ConfigDocument;

/// Backend tag of the host-OS-subsystem family.
pub const VM_TYPE_WSL2: &str = "wsl2";

/// Lifecycle status of an instance.
///
/// `Reported` carries a backend state string verbatim when it matches
/// none of the canonical states; the raw backend vocabulary is passed
/// through rather than translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceStatus {
    /// The instance was never created on its backend.
    Uninitialized,
    Running,
    Stopped,
    /// Inspection failed or the backend reported an unrecoverable
    /// condition; at least one recorded error explains why.
    Broken,
    /// Verbatim backend-reported state.
    Reported(String),
}

impl InstanceStatus {
    /// Canonicalize a state string reported by a backend.
    pub fn from_reported(state: &str) -> Self {
        match state {
            "Running" => Self::Running,
            "Stopped" => Self::Stopped,
            other => Self::Reported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Broken => "Broken",
            Self::Reported(state) => state,
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InstanceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One VM's on-disk presence plus derived runtime facts.
#[derive(Debug, Clone, Serialize)]
pub struct Instance {
    pub name: String,
    /// Declared backend tag from the configuration document.
    pub vm_type: String,
    pub dir: PathBuf,
    pub status: InstanceStatus,
    /// Non-fatal errors accumulated while computing the status.
    pub errors: Vec<String>,
    pub ssh_address: Option<String>,
    /// 0 when unknown.
    pub ssh_local_port: u16,
}

impl Instance {
    fn new(name: &str, dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            vm_type: crate::yaml::DEFAULT_VM_TYPE.to_string(),
            dir,
            status: InstanceStatus::Uninitialized,
            errors: Vec::new(),
            ssh_address: None,
            ssh_local_port: 0,
        }
    }

    fn broken(name: &str, err: impl std::fmt::Display) -> Self {
        let mut inst = Self::new(name, PathBuf::new());
        inst.status = InstanceStatus::Broken;
        inst.errors.push(err.to_string());
        inst
    }

    /// Inspect the instance `name`.
    ///
    /// Only identifier validation and data-directory resolution are
    /// fatal; a missing or invalid configuration document yields a
    /// `Broken` instance with the cause recorded on it.
    pub fn inspect(name: &str) -> Result<Self> {
        let dir = store::instance_dir(name)?;
        let mut inst = Self::new(name, dir);

        let config_path = inst.dir.join(filenames::CONFIG_YAML);
        let doc = match ConfigDocument::load(&config_path) {
            Ok(doc) => doc,
            Err(err) => {
                inst.status = InstanceStatus::Broken;
                inst.errors.push(err.to_string());
                return Ok(inst);
            }
        };
        inst.vm_type = doc.vm_type().to_string();
        inst.inspect_status();
        Ok(inst)
    }

    /// Resolve the runtime status, dispatching on the backend family.
    fn inspect_status(&mut self) {
        if self.vm_type == VM_TYPE_WSL2 {
            match wsl::wsl_status(&self.name) {
                Ok(status) => self.status = status,
                Err(err) => {
                    self.status = InstanceStatus::Broken;
                    self.errors.push(err.to_string());
                }
            }

            self.ssh_local_port = wsl::SSH_LOCAL_PORT;

            if self.status == InstanceStatus::Running {
                match wsl::ssh_address(&self.name) {
                    Ok(addr) => self.ssh_address = Some(addr),
                    // Address resolution failure does not downgrade a
                    // running instance.
                    Err(err) => self.errors.push(err.to_string()),
                }
            }
        } else {
            match liveness::inspect_status(&self.dir) {
                Ok(status) => self.status = status,
                Err(err) => {
                    self.status = InstanceStatus::Broken;
                    self.errors.push(err.to_string());
                }
            }
        }
    }
}

/// Inspect every instance under the data directory.
///
/// Partial success is first-class: instances whose inspection failed
/// are returned as `Broken` with their errors attached, and never
/// prevent the remaining instances from being resolved.
pub fn list_instances() -> Result<Vec<Instance>> {
    let mut result = Vec::new();
    for name in store::instances()? {
        match Instance::inspect(&name) {
            Ok(inst) => result.push(inst),
            Err(err) => {
                warn!(instance = %name, error = %err, "Failed to inspect instance");
                result.push(Instance::broken(&name, err));
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use std::fs;

    fn write_instance(root: &std::path::Path, name: &str, config: &[u8]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(filenames::CONFIG_YAML), config).unwrap();
    }

    #[test]
    fn test_status_display() {
        assert_eq!(InstanceStatus::Uninitialized.to_string(), "Uninitialized");
        assert_eq!(InstanceStatus::Broken.to_string(), "Broken");
        assert_eq!(
            InstanceStatus::Reported("Converting".to_string()).to_string(),
            "Converting"
        );
    }

    #[test]
    fn test_from_reported() {
        assert_eq!(
            InstanceStatus::from_reported("Running"),
            InstanceStatus::Running
        );
        assert_eq!(
            InstanceStatus::from_reported("Stopped"),
            InstanceStatus::Stopped
        );
        assert_eq!(
            InstanceStatus::from_reported("Installing"),
            InstanceStatus::Reported("Installing".to_string())
        );
    }

    #[test]
    fn test_inspect_missing_config_is_broken_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let _guard = testutil::set_home(tmp.path());
        fs::create_dir(tmp.path().join("novm")).unwrap();

        let inst = Instance::inspect("novm").unwrap();
        assert_eq!(inst.status, InstanceStatus::Broken);
        assert!(!inst.errors.is_empty());
    }

    #[test]
    fn test_inspect_pid_based_instance() {
        let tmp = tempfile::tempdir().unwrap();
        let _guard = testutil::set_home(tmp.path());
        write_instance(tmp.path(), "qvm", b"vmType: qemu\ncpus: 2\n");

        // Nothing provisioned yet.
        let inst = Instance::inspect("qvm").unwrap();
        assert_eq!(inst.vm_type, "qemu");
        assert_eq!(inst.status, InstanceStatus::Uninitialized);
        assert!(inst.errors.is_empty());

        // Provisioned disk, no driver process.
        fs::write(tmp.path().join("qvm").join(filenames::DIFF_DISK), b"").unwrap();
        let inst = Instance::inspect("qvm").unwrap();
        assert_eq!(inst.status, InstanceStatus::Stopped);

        // Live driver process.
        fs::write(
            tmp.path().join("qvm").join(filenames::DRIVER_PID),
            std::process::id().to_string(),
        )
        .unwrap();
        let inst = Instance::inspect("qvm").unwrap();
        assert_eq!(inst.status, InstanceStatus::Running);
    }

    #[test]
    fn test_one_broken_instance_does_not_affect_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let _guard = testutil::set_home(tmp.path());

        write_instance(tmp.path(), "alpha", b"vmType: qemu\n");
        fs::write(tmp.path().join("alpha").join(filenames::DIFF_DISK), b"").unwrap();

        // Corrupt document: decodes but is not a mapping.
        write_instance(tmp.path(), "beta", b"- not\n- a\n- mapping\n");

        write_instance(tmp.path(), "gamma", b"vmType: qemu\n");

        let instances = list_instances().unwrap();
        assert_eq!(instances.len(), 3);

        assert_eq!(instances[0].name, "alpha");
        assert_eq!(instances[0].status, InstanceStatus::Stopped);
        assert!(instances[0].errors.is_empty());

        assert_eq!(instances[1].name, "beta");
        assert_eq!(instances[1].status, InstanceStatus::Broken);
        assert!(!instances[1].errors.is_empty());

        assert_eq!(instances[2].name, "gamma");
        assert_eq!(instances[2].status, InstanceStatus::Uninitialized);
        assert!(instances[2].errors.is_empty());
    }
}
