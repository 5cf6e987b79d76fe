//! # oxlima Driver
//!
//! Driver abstraction layer for the virtualization backends.
//!
//! This crate provides a unified interface over incompatible backends:
//! - **qemu** - emulator-based engine, pid-file supervised
//! - **wsl2** - Windows Subsystem for Linux, driven through `wsl.exe`
//! - **mock** - in-memory backend for tests and development
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Driver Trait                │
//! │ (validate_host, create, start, stop, …)  │
//! └───────────────────┬──────────────────────┘
//!                     │  Registry (by tag)
//!        ┌────────────┼────────────┐
//!        ▼            ▼            ▼
//! ┌────────────┐ ┌────────────┐ ┌────────────┐
//! │ QemuDriver │ │ Wsl2Driver │ │ MockDriver │
//! └────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! Drivers never register themselves: the composition root builds a
//! [`Registry`] explicitly at startup, so which backends exist in a
//! given build is visible in one place.

pub mod error;
pub mod mock;
pub mod qemu;
pub mod registry;
pub mod traits;
pub mod wsl2;

pub use error::{DriverError, Result};
pub use mock::MockDriver;
pub use qemu::QemuDriver;
pub use registry::Registry;
pub use traits::Driver;
pub use wsl2::Wsl2Driver;
