//! Status inspection for the WSL2 backend family.
//!
//! WSL has no pid files to look at: the only status source is the
//! human-readable report printed by `wsl.exe --list --verbose`, which
//! is UTF-16LE encoded, localized, and replaced entirely by prose
//! messages in a couple of edge cases. Parsing is kept in a pure
//! function so it can be tested against literal fixtures.

use std::process::Command;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::instance::InstanceStatus;

/// Fixed prefix mapping an instance name to its WSL distribution name.
pub const DISTRO_PREFIX: &str = "lima-";

/// SSH port forwarded on the loopback interface by WSL2.
pub const SSH_LOCAL_PORT: u16 = 22;

const NO_DISTRO_MESSAGE: &str = "Windows Subsystem for Linux has no installed distributions.";
const NO_DEFAULT_DISTRO_CODE: &str = "Wsl/WSL_E_DEFAULT_DISTRO_NOT_FOUND";

/// The WSL distribution name backing the instance `name`.
pub fn distro_name(name: &str) -> String {
    format!("{DISTRO_PREFIX}{name}")
}

/// Decode UTF-16LE bytes into a string, dropping a leading BOM.
///
/// `wsl.exe` writes its report in UTF-16LE regardless of console code
/// page. An odd trailing byte is ignored.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16_lossy(&units);
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Run a command whose stdout is UTF-16LE encoded and decode it.
///
/// Blocks until the command exits; callers wanting a timeout must wrap
/// the invocation themselves.
pub fn run_utf16le_command(argv: &[&str]) -> Result<String> {
    let command_line = argv.join(" ");
    let output = Command::new(argv[0])
        .args(&argv[1..])
        .output()
        .map_err(|source| StoreError::CommandFailed {
            command: command_line.clone(),
            output: String::new(),
            source,
        })?;

    let decoded = decode_utf16le(&output.stdout);
    if !output.status.success() {
        return Err(StoreError::CommandFailed {
            command: command_line,
            output: decoded,
            source: std::io::Error::other(format!("exit status: {}", output.status)),
        });
    }
    Ok(decoded)
}

/// Resolve the status of the instance `name` via `wsl.exe`.
///
/// An `Err` here means the status could not be determined; the caller
/// records it and marks the instance `Broken`.
pub fn wsl_status(name: &str) -> Result<InstanceStatus> {
    let out = run_utf16le_command(&["wsl.exe", "--list", "--verbose"])?;
    debug!(instance = name, bytes = out.len(), "Parsing wsl.exe report");
    parse_wsl_status(&out, name)
}

/// Parse a decoded `wsl --list --verbose` report.
///
/// The report has several shapes, checked in order:
///
/// 1. Empty output - the state cannot be read at all.
/// 2. "No installed distributions" with the
///    `WSL_E_DEFAULT_DISTRO_NOT_FOUND` error code - WSL works but no
///    distro exists yet.
/// 3. "No installed distributions" without the code - the WSL kernel
///    component itself is missing for this user.
/// 4. The normal table: one row per distribution, columns separated by
///    runs of whitespace, a `*` marker column on the default distro.
///    Headers may be localized, but a header's first column never
///    equals a distribution name, so rows are matched by name only.
pub fn parse_wsl_status(out: &str, name: &str) -> Result<InstanceStatus> {
    if out.is_empty() {
        return Err(StoreError::EmptyStatusReport {
            instance: name.to_string(),
        });
    }

    // Edge-case reports replace the table entirely; check them first.
    if out.contains(NO_DISTRO_MESSAGE) {
        if out.contains(NO_DEFAULT_DISTRO_CODE) {
            return Err(StoreError::NoDistro {
                instance: name.to_string(),
            });
        }
        return Err(StoreError::NoKernel {
            instance: name.to_string(),
        });
    }

    let distro = distro_name(name);
    for row in out.replace("\r\n", "\n").split('\n') {
        let cols: Vec<&str> = row.split_whitespace().collect();
        // '*' marks the default distribution.
        let name_idx = usize::from(cols.first() == Some(&"*"));
        if cols.get(name_idx) == Some(&distro.as_str()) {
            if let Some(state) = cols.get(name_idx + 1) {
                return Ok(InstanceStatus::from_reported(state));
            }
        }
    }

    // No matching row: the distribution was never registered.
    Ok(InstanceStatus::Uninitialized)
}

/// SSH address of a running WSL2 instance.
///
/// WSL2 forwards guest ports to the loopback interface, so the address
/// is fixed rather than discovered.
pub fn ssh_address(_name: &str) -> Result<String> {
    Ok("127.0.0.1".to_string())
}
