//! Driver registry.
//!
//! An ordinary table owned by the composition root. Registration
//! happens once per backend during process initialization, before any
//! lookup; lookups afterwards are read-only and safe to share across
//! threads.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{DriverError, Result};
use crate::traits::Driver;

/// Table mapping a driver identifier to a registered driver.
#[derive(Default)]
pub struct Registry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under its self-reported identifier.
    ///
    /// Each identifier may be registered exactly once.
    pub fn register(&mut self, driver: Arc<dyn Driver>) -> Result<()> {
        let name = driver.name().to_string();
        if self.drivers.contains_key(&name) {
            return Err(DriverError::AlreadyRegistered(name));
        }
        debug!(driver = %name, "Registered driver");
        self.drivers.insert(name, driver);
        Ok(())
    }

    /// Look up a driver by identifier. Pure read; never blocks.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    /// Sorted identifiers of all registered drivers.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.keys().cloned().collect();
        names.sort();
        names
    }
}
