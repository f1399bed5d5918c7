//! Kill command - signal the process holding a port.

use anyhow::Result;
use portprobe_core::{PortProbe, Signal};

use super::send_and_report;
use crate::output::print_port_info;
use crate::prompt;

pub fn run(port: u16, force: bool, yes: bool) -> Result<()> {
    let probe = PortProbe::default();
    let info = probe.check(port)?;

    if info.is_free() {
        println!("Port {} is not in use", port);
        return Ok(());
    }

    let Some(process) = info.process() else {
        eprintln!("Could not find process information for port {}", port);
        return Ok(());
    };

    if !yes {
        print_port_info(&info);
        println!();
        if !prompt::confirm("Kill this process?")? {
            println!("Cancelled");
            return Ok(());
        }
    }

    send_and_report(&probe, process.pid, Signal::for_force(force));
    Ok(())
}
