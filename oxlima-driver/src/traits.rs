//! Core driver abstraction trait.

use async_trait::async_trait;

use oxlima_store::{ConfigDocument, Instance, InstanceStatus};

use crate::error::Result;

/// Capability contract every virtualization backend must satisfy.
///
/// The registry does not verify that a backend is actually usable on
/// the current host; that is [`Driver::validate_host`]'s job, invoked
/// by callers before they rely on the driver.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Stable identifier the driver is registered under. Matches the
    /// `vmType` tag declared in instance configuration documents.
    fn name(&self) -> &'static str;

    /// Check that the backend can run guests on this host.
    async fn validate_host(&self) -> Result<()>;

    /// Create the instance on the backend (does not start it).
    async fn create(&self, inst: &Instance, config: &ConfigDocument) -> Result<()>;

    /// Start a created instance.
    async fn start(&self, inst: &Instance) -> Result<()>;

    /// Stop a running instance.
    async fn stop(&self, inst: &Instance) -> Result<()>;

    /// Delete a stopped instance from the backend.
    async fn delete(&self, inst: &Instance) -> Result<()>;

    /// Current status as seen by the backend.
    async fn status(&self, inst: &Instance) -> Result<InstanceStatus>;
}
