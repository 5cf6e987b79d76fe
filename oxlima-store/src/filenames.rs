//! Well-known file names under an instance directory.

/// The per-instance configuration document.
pub const CONFIG_YAML: &str = "oxlima.yaml";

/// Pid file written by pid-based drivers while the guest is running.
pub const DRIVER_PID: &str = "driver.pid";

/// Copy-on-write boot disk provisioned by `create`.
pub const DIFF_DISK: &str = "diffdisk";

/// Guest serial console log.
pub const SERIAL_LOG: &str = "serial.log";
