//! WSL2 driver.
//!
//! Drives the Windows Subsystem for Linux through `wsl.exe`. The
//! instance is backed by a WSL distribution named `lima-<instance>`;
//! status resolution parses the `wsl.exe --list --verbose` report via
//! the store's external-command strategy.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, instrument};

use oxlima_store::wsl;
use oxlima_store::{ConfigDocument, Instance, InstanceStatus};

use crate::error::{DriverError, Result};
use crate::traits::Driver;

pub struct Wsl2Driver;

impl Wsl2Driver {
    pub fn new() -> Self {
        Self
    }

    async fn run_wsl(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("wsl.exe")
            .args(args)
            .output()
            .await
            .map_err(|err| DriverError::Unavailable(format!("wsl.exe: {err}")))?;
        if !output.status.success() {
            // wsl.exe writes UTF-16LE to both streams.
            let stderr = wsl::decode_utf16le(&output.stderr);
            return Err(DriverError::OperationFailed(format!(
                "wsl.exe {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Default for Wsl2Driver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for Wsl2Driver {
    fn name(&self) -> &'static str {
        "wsl2"
    }

    async fn validate_host(&self) -> Result<()> {
        self.run_wsl(&["--status"]).await
    }

    #[instrument(skip(self, config), fields(instance = %inst.name))]
    async fn create(&self, inst: &Instance, config: &ConfigDocument) -> Result<()> {
        let tarball = config
            .value()
            .get("images")
            .and_then(|v| v.as_sequence())
            .and_then(|images| images.first())
            .and_then(|image| image.get("location"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                DriverError::InvalidConfig(
                    "wsl2 instances require images[0].location pointing at a rootfs tarball"
                        .to_string(),
                )
            })?;

        let distro = wsl::distro_name(&inst.name);
        let dir = inst.dir.to_string_lossy().into_owned();
        self.run_wsl(&["--import", &distro, &dir, tarball, "--version", "2"])
            .await?;

        info!(distro = %distro, "Distribution imported");
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn start(&self, inst: &Instance) -> Result<()> {
        let distro = wsl::distro_name(&inst.name);
        // Any command boots the distribution; keep one alive so the
        // utility VM is not reclaimed after the idle timeout.
        Command::new("wsl.exe")
            .args(["--distribution", &distro, "--exec", "sleep", "infinity"])
            .spawn()
            .map_err(|err| DriverError::OperationFailed(format!("wsl.exe: {err}")))?;

        info!(distro = %distro, "Distribution started");
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn stop(&self, inst: &Instance) -> Result<()> {
        let distro = wsl::distro_name(&inst.name);
        self.run_wsl(&["--terminate", &distro]).await?;
        info!(distro = %distro, "Distribution terminated");
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn delete(&self, inst: &Instance) -> Result<()> {
        let distro = wsl::distro_name(&inst.name);
        self.run_wsl(&["--unregister", &distro]).await?;
        info!(distro = %distro, "Distribution unregistered");
        Ok(())
    }

    async fn status(&self, inst: &Instance) -> Result<InstanceStatus> {
        // The report parsing is synchronous and blocking.
        let name = inst.name.clone();
        let status = tokio::task::spawn_blocking(move || wsl::wsl_status(&name))
            .await
            .map_err(|err| DriverError::Internal(err.to_string()))??;
        Ok(status)
    }
}
