//! Process signaller port (interface).

/// Signals the control primitives can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Ask the process to exit (SIGTERM).
    Terminate,
    /// Stop the process immediately (SIGKILL).
    Kill,
}

impl Signal {
    /// Pick the signal for a graceful or forced termination.
    pub fn for_force(force: bool) -> Self {
        if force {
            Signal::Kill
        } else {
            Signal::Terminate
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Terminate => write!(f, "SIGTERM"),
            Signal::Kill => write!(f, "SIGKILL"),
        }
    }
}

/// Port for delivering signals to processes.
///
/// Every call is a single blocking syscall with no retry. A `false` return
/// covers both "no such process" and "not permitted"; callers that need to
/// tell them apart should probe with `is_alive` first.
pub trait ProcessSignaller: Send + Sync {
    /// Send a signal. Returns whether the OS accepted it, not whether the
    /// process has exited.
    fn send(&self, pid: u32, signal: Signal) -> bool;

    /// Probe with the null signal: the pid exists and we may signal it.
    fn is_alive(&self, pid: u32) -> bool;

    /// Request graceful termination (SIGTERM).
    fn signal_terminate(&self, pid: u32) -> bool {
        self.send(pid, Signal::Terminate)
    }

    /// Request immediate termination (SIGKILL).
    fn signal_kill(&self, pid: u32) -> bool {
        self.send(pid, Signal::Kill)
    }
}
