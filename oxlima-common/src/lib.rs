//! # oxlima Common
//!
//! Shared utilities for the oxlima components.
//!
//! ## Logging
//!
//! ```rust,ignore
//! oxlima_common::init_logging("info").unwrap();
//! ```

pub mod logging;

pub use logging::{init_logging, init_logging_json};
