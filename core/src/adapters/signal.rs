//! Unix signal adapter built on `kill(2)`.

use nix::sys::signal::{kill, Signal as NixSignal};
use nix::unistd::Pid;
use tracing::debug;

use crate::ports::{ProcessSignaller, Signal};

/// Delivers signals with `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixSignaller;

impl UnixSignaller {
    pub fn new() -> Self {
        Self
    }
}

/// Only positive pids name a single process; 0 and negatives address
/// process groups, which we never want to hit.
fn target(pid: u32) -> Option<Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|&raw| raw > 0)
        .map(Pid::from_raw)
}

impl ProcessSignaller for UnixSignaller {
    fn send(&self, pid: u32, signal: Signal) -> bool {
        let Some(target) = target(pid) else {
            debug!(pid, "Refusing to signal non-process pid");
            return false;
        };
        let nix_signal = match signal {
            Signal::Terminate => NixSignal::SIGTERM,
            Signal::Kill => NixSignal::SIGKILL,
        };

        match kill(target, nix_signal) {
            Ok(()) => {
                debug!(pid, %signal, "Signal sent");
                true
            }
            Err(errno) => {
                debug!(pid, %signal, %errno, "Signal rejected");
                false
            }
        }
    }

    fn is_alive(&self, pid: u32) -> bool {
        target(pid).is_some_and(|target| kill(target, None::<NixSignal>).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_pids_are_refused() {
        let signaller = UnixSignaller::new();
        assert!(!signaller.is_alive(0));
        assert!(!signaller.send(0, Signal::Terminate));
        assert!(!signaller.is_alive(u32::MAX));
    }

    #[test]
    fn test_self_is_alive() {
        assert!(UnixSignaller::new().is_alive(std::process::id()));
    }
}
