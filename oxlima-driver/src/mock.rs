//! Mock driver for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{info, instrument};

use oxlima_store::{ConfigDocument, Instance, InstanceStatus};

use crate::error::{DriverError, Result};
use crate::traits::Driver;

/// In-memory driver.
///
/// Simulates instance lifecycle without any hypervisor. Useful for:
/// - Unit and integration testing
/// - Development on hosts without a virtualization backend
pub struct MockDriver {
    instances: RwLock<HashMap<String, InstanceStatus>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn validate_host(&self) -> Result<()> {
        Ok(())
    }

    #[instrument(skip(self, _config), fields(instance = %inst.name))]
    async fn create(&self, inst: &Instance, _config: &ConfigDocument) -> Result<()> {
        let mut instances = self
            .instances
            .write()
            .map_err(|_| DriverError::Internal("lock poisoned".to_string()))?;

        if instances.contains_key(&inst.name) {
            return Err(DriverError::InvalidState(format!(
                "instance {} already exists",
                inst.name
            )));
        }

        instances.insert(inst.name.clone(), InstanceStatus::Stopped);
        info!("Mock instance created");
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn start(&self, inst: &Instance) -> Result<()> {
        let mut instances = self
            .instances
            .write()
            .map_err(|_| DriverError::Internal("lock poisoned".to_string()))?;

        let status = instances
            .get_mut(&inst.name)
            .ok_or_else(|| DriverError::InstanceNotFound(inst.name.clone()))?;

        if *status == InstanceStatus::Running {
            return Err(DriverError::InvalidState(
                "instance is already running".to_string(),
            ));
        }

        *status = InstanceStatus::Running;
        info!("Mock instance started");
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn stop(&self, inst: &Instance) -> Result<()> {
        let mut instances = self
            .instances
            .write()
            .map_err(|_| DriverError::Internal("lock poisoned".to_string()))?;

        let status = instances
            .get_mut(&inst.name)
            .ok_or_else(|| DriverError::InstanceNotFound(inst.name.clone()))?;

        *status = InstanceStatus::Stopped;
        info!("Mock instance stopped");
        Ok(())
    }

    #[instrument(skip(self), fields(instance = %inst.name))]
    async fn delete(&self, inst: &Instance) -> Result<()> {
        let mut instances = self
            .instances
            .write()
            .map_err(|_| DriverError::Internal("lock poisoned".to_string()))?;

        match instances.get(&inst.name) {
            None => return Err(DriverError::InstanceNotFound(inst.name.clone())),
            Some(InstanceStatus::Running) => {
                return Err(DriverError::InvalidState(
                    "instance must be stopped before deletion".to_string(),
                ));
            }
            Some(_) => {}
        }

        instances.remove(&inst.name);
        info!("Mock instance deleted");
        Ok(())
    }

    async fn status(&self, inst: &Instance) -> Result<InstanceStatus> {
        let instances = self
            .instances
            .read()
            .map_err(|_| DriverError::Internal("lock poisoned".to_string()))?;

        Ok(instances
            .get(&inst.name)
            .cloned()
            .unwrap_or(InstanceStatus::Uninitialized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_instance(name: &str) -> Instance {
        Instance {
            name: name.to_string(),
            vm_type: "mock".to_string(),
            dir: PathBuf::new(),
            status: InstanceStatus::Uninitialized,
            errors: Vec::new(),
            ssh_address: None,
            ssh_local_port: 0,
        }
    }

    fn test_config() -> ConfigDocument {
        ConfigDocument::parse(b"vmType: mock\n", PathBuf::from("/tmp/oxlima.yaml")).unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let driver = MockDriver::new();
        let inst = test_instance("vm1");

        assert_eq!(
            driver.status(&inst).await.unwrap(),
            InstanceStatus::Uninitialized
        );

        driver.create(&inst, &test_config()).await.unwrap();
        assert_eq!(driver.status(&inst).await.unwrap(), InstanceStatus::Stopped);

        driver.start(&inst).await.unwrap();
        assert_eq!(driver.status(&inst).await.unwrap(), InstanceStatus::Running);

        // Deleting a running instance is refused.
        assert!(matches!(
            driver.delete(&inst).await,
            Err(DriverError::InvalidState(_))
        ));

        driver.stop(&inst).await.unwrap();
        driver.delete(&inst).await.unwrap();
        assert_eq!(
            driver.status(&inst).await.unwrap(),
            InstanceStatus::Uninitialized
        );
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let driver = MockDriver::new();
        let inst = test_instance("vm1");

        driver.create(&inst, &test_config()).await.unwrap();
        assert!(matches!(
            driver.create(&inst, &test_config()).await,
            Err(DriverError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_start_unknown_instance() {
        let driver = MockDriver::new();
        assert!(matches!(
            driver.start(&test_instance("ghost")).await,
            Err(DriverError::InstanceNotFound(_))
        ));
    }
}
