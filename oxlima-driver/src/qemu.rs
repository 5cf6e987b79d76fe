//! QEMU driver.
//!
//! Pid-file supervised backend: `start` launches a daemonized qemu
//! process that writes `driver.pid` into the instance directory, and
//! status resolution reads it back through the store's liveness
//! strategy.

use std::path::PathBuf;

use async_trait::async_trait;
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tokio::process::Command;
use tracing::{info, instrument, warn};

use oxlima_store::{filenames, liveness, ConfigDocument, Instance, InstanceStatus};

use crate::error::{DriverError, Result};
use crate::traits::Driver;

const DEFAULT_CPUS: u64 = 4;
const DEFAULT_MEMORY: &str = "4G";
const DEFAULT_DISK: &str = "100G";

pub struct QemuDriver {
    binary: String,
}

impl QemuDriver {
    /// Driver for the host architecture's system emulator.
    pub fn new() -> Self {
        Self {
            binary: format!("qemu-system-{}", std::env::consts::ARCH),
        }
    }

    /// The qemu binary this driver invokes.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn load_config(&self, inst: &Instance) -> Result<ConfigDocument> {
        Ok(ConfigDocument::load(
            inst.dir.join(filenames::CONFIG_YAML),
        )?)
    }
}

impl Default for QemuDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for QemuDriver {
    fn name(&self) -> &'static str {
        "qemu"
    }

    async fn validate_host(&self) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|err| DriverError::Unavailable(format!("{}: {err}", self.binary)))?;
        if !output.status.success() {
            return Err(DriverError::Unavailable(format!(
                "{} exited with {}",
                self.binary, output.status
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, config), fields(instance = %inst.name))]
    async fn create(&self, inst: &Instance, config: &ConfigDocument) -> Result<()> {
        let disk_path = inst.dir.join(filenames::DIFF_DISK);
        if disk_path.exists() {
            return Err(DriverError::InvalidState(format!(
                "instance {} is already created",
                inst.name
            )));
        }

        let disk_size = config
            .value()
            .get("disk")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_DISK);

        tokio::fs::create_dir_all(&inst.dir).await?;

        let output = Command::new("qemu-img")
            .arg("create")
            .arg("-f")
            .arg("qcow2")
            .arg(&disk_path)
            .arg(disk_size)
            .output()
            .await
            .map_err(|err| DriverError::OperationFailed(format!("qemu-img: {err}")))?;
        if !output.status.success() {
            return Err(DriverError::OperationFailed(format!(
                "qemu-img create failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!(disk = %disk_path.display(), size = disk_size, "Boot disk provisioned");
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn start(&self, inst: &Instance) -> Result<()> {
        if liveness::inspect_status(&inst.dir)? == InstanceStatus::Running {
            return Err(DriverError::InvalidState(
                "instance is already running".to_string(),
            ));
        }

        let config = self.load_config(inst)?;
        let cpus = config
            .value()
            .get("cpus")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_CPUS);
        let memory = config
            .value()
            .get("memory")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_MEMORY);

        let disk_path = inst.dir.join(filenames::DIFF_DISK);
        let pid_path = inst.dir.join(filenames::DRIVER_PID);
        let serial_path = inst.dir.join(filenames::SERIAL_LOG);

        let output = Command::new(&self.binary)
            .arg("-name")
            .arg(&inst.name)
            .arg("-machine")
            .arg("accel=kvm:hvf:tcg")
            .arg("-smp")
            .arg(cpus.to_string())
            .arg("-m")
            .arg(memory)
            .arg("-drive")
            .arg(format!("file={},if=virtio", disk_path.display()))
            .arg("-display")
            .arg("none")
            .arg("-serial")
            .arg(format!("file:{}", serial_path.display()))
            .arg("-pidfile")
            .arg(&pid_path)
            .arg("-daemonize")
            .output()
            .await
            .map_err(|err| DriverError::OperationFailed(format!("{}: {err}", self.binary)))?;
        if !output.status.success() {
            return Err(DriverError::OperationFailed(format!(
                "qemu failed to start: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!("Guest started");
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn stop(&self, inst: &Instance) -> Result<()> {
        let pid_path = inst.dir.join(filenames::DRIVER_PID);
        let pid = match liveness::read_pid_file(&pid_path)? {
            Some(pid) => pid,
            None => {
                return Err(DriverError::InvalidState(
                    "instance is not running".to_string(),
                ))
            }
        };

        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);
        match system.process(Pid::from_u32(pid)) {
            Some(process) => {
                // Prefer a graceful shutdown; fall back to SIGKILL on
                // platforms without SIGTERM support.
                if process.kill_with(Signal::Term).is_none() {
                    let _ = process.kill();
                }
                info!(pid, "Sent termination signal");
            }
            None => {
                warn!(pid, "Stale pid file, removing");
                tokio::fs::remove_file(&pid_path).await?;
                return Err(DriverError::InvalidState(
                    "instance is not running".to_string(),
                ));
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn delete(&self, inst: &Instance) -> Result<()> {
        if liveness::inspect_status(&inst.dir)? == InstanceStatus::Running {
            return Err(DriverError::InvalidState(
                "instance must be stopped before deletion".to_string(),
            ));
        }

        // Remove provisioned artifacts; the configuration document and
        // the directory itself belong to the store.
        for name in [
            filenames::DIFF_DISK,
            filenames::DRIVER_PID,
            filenames::SERIAL_LOG,
        ] {
            let path: PathBuf = inst.dir.join(name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        info!("Instance artifacts removed");
        Ok(())
    }

    async fn status(&self, inst: &Instance) -> Result<InstanceStatus> {
        Ok(liveness::inspect_status(&inst.dir)?)
    }
}
