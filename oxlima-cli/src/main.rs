//! # oxlima
//!
//! Command-line interface for the oxlima instance manager: lists
//! instances with their resolved status, inspects the data directory,
//! and reports which virtualization backends are usable on this host.
//!
//! ## Usage
//! ```bash
//! oxlima list
//! oxlima validate
//! ```

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use oxlima_driver::{MockDriver, QemuDriver, Registry, Wsl2Driver};
use oxlima_store::{list_instances, store};

mod cli;

use cli::{Args, Command};

/// Build the driver registry.
///
/// Backends are registered here, explicitly, exactly once, before any
/// lookup happens; the core never branches on backend identity outside
/// the registry.
fn build_registry(dev: bool) -> Result<Registry> {
    let mut registry = Registry::new();
    registry
        .register(Arc::new(QemuDriver::new()))
        .context("failed to register the qemu driver")?;
    registry
        .register(Arc::new(Wsl2Driver::new()))
        .context("failed to register the wsl2 driver")?;
    if dev {
        registry
            .register(Arc::new(MockDriver::new()))
            .context("failed to register the mock driver")?;
    }
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    oxlima_common::init_logging(&args.log_level)?;

    let registry = build_registry(args.dev)?;
    info!(drivers = ?registry.names(), "Drivers registered");

    match args.command {
        Command::List { json, quiet } => cmd_list(json, quiet),
        Command::Disks => cmd_disks(),
        Command::Dir { name } => cmd_dir(name.as_deref()),
        Command::Validate => cmd_validate(),
        Command::Info => cmd_info(&registry).await,
    }
}

fn cmd_list(json: bool, quiet: bool) -> Result<()> {
    let instances = list_instances().context("failed to enumerate instances")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
        return Ok(());
    }

    if quiet {
        for inst in &instances {
            println!("{}", inst.name);
        }
        return Ok(());
    }

    println!(
        "{:<20} {:<14} {:<8} {:<22} DIR",
        "NAME", "STATUS", "VMTYPE", "SSH"
    );
    for inst in &instances {
        let ssh = match &inst.ssh_address {
            Some(addr) => format!("{addr}:{}", inst.ssh_local_port),
            None => "-".to_string(),
        };
        println!(
            "{:<20} {:<14} {:<8} {:<22} {}",
            inst.name,
            inst.status.to_string(),
            inst.vm_type,
            ssh,
            inst.dir.display()
        );
        for err in &inst.errors {
            warn!(instance = %inst.name, "{err}");
        }
    }
    Ok(())
}

fn cmd_disks() -> Result<()> {
    for name in store::disks().context("failed to enumerate disks")? {
        println!("{name}");
    }
    Ok(())
}

fn cmd_dir(name: Option<&str>) -> Result<()> {
    let dir = match name {
        Some(name) => store::instance_dir(name)?,
        None => {
            let root = store::root_directory();
            if root.as_os_str().is_empty() {
                bail!("the oxlima data directory cannot be resolved");
            }
            root
        }
    };
    println!("{}", dir.display());
    Ok(())
}

fn cmd_validate() -> Result<()> {
    store::validate().context("data directory failed validation")?;
    println!("OK");
    Ok(())
}

async fn cmd_info(registry: &Registry) -> Result<()> {
    for name in registry.names() {
        // Names come from the registry itself, so the lookup cannot miss.
        let Some(driver) = registry.lookup(&name) else {
            continue;
        };
        match driver.validate_host().await {
            Ok(()) => println!("{name}: available"),
            Err(err) => println!("{name}: unavailable ({err})"),
        }
    }
    Ok(())
}
