//! # oxlima Store
//!
//! On-disk instance store and status resolution for oxlima.
//!
//! This crate owns the layout of the oxlima data directory, the
//! per-instance configuration document, and the engine that turns the
//! on-disk presence of an instance into a runtime status:
//!
//! - [`store`] - enumeration and validation of instance/disk directories
//! - [`yaml`] - configuration document load/validate/save
//! - [`instance`] - the [`Instance`] record and status resolution
//! - [`wsl`] - `wsl.exe` report parsing for the WSL2 backend family
//! - [`liveness`] - pid-file inspection for all other backend families
//!
//! Everything here is synchronous and blocking; callers wanting
//! parallel inspection across many instances run these functions on
//! their own workers.

pub mod dirnames;
pub mod error;
pub mod filenames;
pub mod identifiers;
pub mod instance;
pub mod liveness;
pub mod store;
pub mod wsl;
pub mod yaml;

pub use error::{Result, StoreError};
pub use instance::{list_instances, Instance, InstanceStatus};
pub use store::{disk_dir, disks, instance_dir, instances, root_directory, validate};
pub use yaml::ConfigDocument;
