//! Subcommand implementations.

pub mod check;
pub mod config;
pub mod fix;
pub mod kill;
pub mod list;
pub mod scan;
pub mod suggest;

use portprobe_core::{PortProbe, Signal};
use tracing::debug;

/// Deliver `signal` to `pid` and report the outcome. Returns whether it was accepted.
fn send_and_report(probe: &PortProbe, pid: u32, signal: Signal) -> bool {
    debug!(pid, %signal, "Signalling port owner");
    let accepted = match signal {
        Signal::Terminate => probe.signal_terminate(pid),
        Signal::Kill => probe.signal_kill(pid),
    };
    if accepted {
        println!("Sent {} to PID {}", signal, pid);
    } else {
        eprintln!("Failed to kill process {} (permission denied?)", pid);
    }
    accepted
}
