//! List command - show all listening ports.

use anyhow::Result;
use portprobe_core::{PortInfo, PortProbe};

use crate::output::{print_json, truncate};

pub fn run(port_filter: Option<u16>, name_filter: Option<String>, json: bool) -> Result<()> {
    let ports = apply_filters(
        PortProbe::default().list_active()?,
        port_filter,
        name_filter.as_deref(),
    );

    if json {
        return print_json(&ports);
    }

    if ports.is_empty() {
        println!("No listening ports found.");
        return Ok(());
    }

    // Table header
    println!(
        "{:<7} {:<8} {:<20} {:<30} USER",
        "PORT", "PID", "PROCESS", "COMMAND"
    );
    println!("{}", "-".repeat(80));

    for info in &ports {
        match info.process() {
            Some(p) => println!(
                "{:<7} {:<8} {:<20} {:<30} {}",
                info.port(),
                p.pid,
                truncate(&p.name, 19),
                truncate(p.launch_token.as_deref().unwrap_or("-"), 29),
                p.user.as_deref().unwrap_or("-"),
            ),
            None => println!("{:<7} {:<8} {:<20} {:<30} -", info.port(), "?", "-", "-"),
        }
    }

    println!("\nTotal: {} ports", ports.len());
    Ok(())
}

/// Keep ports equal to `port` and matching `query` (name, pid, user or port).
fn apply_filters(mut ports: Vec<PortInfo>, port: Option<u16>, query: Option<&str>) -> Vec<PortInfo> {
    if let Some(p) = port {
        ports.retain(|info| info.port() == p);
    }
    if let Some(query) = query {
        ports.retain(|info| info.matches_search(query));
    }
    ports
}
