//! Suggest command - find free ports in development ranges.

use anyhow::Result;
use portprobe_core::{ConfigStore, PortProbe, PortRange};

use crate::output::{port_hint, print_json};

pub fn run(count: Option<u16>, range: Option<(u16, u16)>, json: bool) -> Result<()> {
    let config = ConfigStore::new()?.load()?;
    let count = count.map_or(config.suggest_count, usize::from);

    let ranges = match range {
        Some((from, to)) => vec![PortRange::new(from, to)?],
        None => config.suggest_ranges,
    };

    let ports = suggest_across(&PortProbe::default(), count, &ranges)?;

    if json {
        return print_json(&ports);
    }

    if ports.is_empty() {
        println!("No free ports found in development ranges.");
        return Ok(());
    }

    println!("Available ports in development ranges:");
    for port in ports {
        match port_hint(port) {
            Some(hint) => println!("  {} - {}", port, hint),
            None => println!("  {}", port),
        }
    }
    Ok(())
}

/// Walk `ranges` in order until `count` free ports are collected.
pub fn suggest_across(
    probe: &PortProbe,
    count: usize,
    ranges: &[PortRange],
) -> portprobe_core::Result<Vec<u16>> {
    let mut found = Vec::with_capacity(count);
    for range in ranges {
        let remaining = count - found.len();
        if remaining == 0 {
            break;
        }
        found.extend(probe.suggest_free(remaining, *range)?);
    }
    Ok(found)
}
