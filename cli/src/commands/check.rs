//! Check and info commands - snapshot a single port.

use anyhow::Result;
use portprobe_core::PortProbe;

use crate::output::{print_detailed_info, print_json, print_port_info};

pub fn run(port: u16, json: bool) -> Result<()> {
    let info = PortProbe::default().check(port)?;
    if json {
        return print_json(&info);
    }
    print_port_info(&info);
    Ok(())
}

pub fn info(port: u16, json: bool) -> Result<()> {
    let info = PortProbe::default().check(port)?;
    if json {
        return print_json(&info);
    }
    print_detailed_info(&info);
    Ok(())
}
