//! Port query application service.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::domain::{ListeningSocket, PortInfo, PortRange, ProcessInfo};
use crate::error::Result;
use crate::ports::{ProcessSignaller, Signal, SystemSource};

use super::Resolver;

/// Application service for port queries and process control.
///
/// Composes the resolution engine with a signaller. It holds no state
/// between calls: each query reads the kernel tables afresh, and within one
/// query every owner is resolved in a single walk of the process table.
pub struct PortService<S: SystemSource, K: ProcessSignaller> {
    resolver: Resolver<S>,
    signaller: K,
}

impl<S: SystemSource, K: ProcessSignaller> PortService<S, K> {
    /// Create a new port service over the given system source and signaller.
    pub fn new(system: S, signaller: K) -> Self {
        Self {
            resolver: Resolver::new(system),
            signaller,
        }
    }

    pub fn resolver(&self) -> &Resolver<S> {
        &self.resolver
    }

    pub fn signaller(&self) -> &K {
        &self.signaller
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshot a single port. Owner metadata is only read if it is in use.
    pub fn check(&self, port: u16) -> Result<PortInfo> {
        let sockets = self.resolver.enumerate_listening_sockets()?;
        let mut infos = self.describe_ports(&sockets, &[port])?;
        Ok(infos.pop().unwrap_or_else(|| PortInfo::free(port)))
    }

    /// Snapshot a fixed list of ports, in the order given.
    pub fn scan(&self, candidates: &[u16]) -> Result<Vec<PortInfo>> {
        let sockets = self.resolver.enumerate_listening_sockets()?;
        self.describe_ports(&sockets, candidates)
    }

    /// Snapshot every port with a listener, one entry per port, ascending.
    pub fn list_active(&self) -> Result<Vec<PortInfo>> {
        let sockets = self.resolver.enumerate_listening_sockets()?;
        let ports: Vec<u16> = sockets
            .iter()
            .map(|s| s.port)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.describe_ports(&sockets, &ports)
    }

    /// The first `count` ports in `range`, ascending, with no listener.
    ///
    /// Returns fewer than `count` if the range runs out; that is not an error.
    pub fn suggest_free(&self, count: usize, range: PortRange) -> Result<Vec<u16>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let listening: HashSet<u16> = self
            .resolver
            .enumerate_listening_sockets()?
            .into_iter()
            .map(|s| s.port)
            .filter(|&port| range.contains(port))
            .collect();

        Ok(range
            .iter()
            .filter(|port| !listening.contains(port))
            .take(count)
            .collect())
    }

    /// Signal the owner of a port: SIGKILL if `force`, SIGTERM otherwise.
    ///
    /// Returns `false` when the port is free, its owner cannot be resolved,
    /// or the OS rejects the signal.
    pub fn terminate(&self, port: u16, force: bool) -> Result<bool> {
        let info = self.check(port)?;
        let Some(process) = info.process() else {
            debug!(port, in_use = info.is_in_use(), "No owner to terminate");
            return Ok(false);
        };
        Ok(self.signaller.send(process.pid, Signal::for_force(force)))
    }

    // =========================================================================
    // Process control
    // =========================================================================

    /// Request graceful termination of a pid.
    pub fn signal_terminate(&self, pid: u32) -> bool {
        self.signaller.signal_terminate(pid)
    }

    /// Request immediate termination of a pid.
    pub fn signal_kill(&self, pid: u32) -> bool {
        self.signaller.signal_kill(pid)
    }

    /// Whether a pid exists and can be signalled by us.
    pub fn is_alive(&self, pid: u32) -> bool {
        self.signaller.is_alive(pid)
    }

    /// Build one `PortInfo` per requested port from an enumeration pass.
    fn describe_ports(&self, sockets: &[ListeningSocket], ports: &[u16]) -> Result<Vec<PortInfo>> {
        let wanted: HashSet<u16> = ports.iter().copied().collect();
        let mut inodes_by_port: HashMap<u16, Vec<u64>> = HashMap::new();
        for socket in sockets.iter().filter(|s| wanted.contains(&s.port)) {
            inodes_by_port
                .entry(socket.port)
                .or_default()
                .push(socket.inode);
        }

        let inodes: HashSet<u64> = inodes_by_port.values().flatten().copied().collect();
        let index = self.resolver.owner_index(&inodes)?;
        let clock = if index.is_empty() {
            None
        } else {
            self.resolver.boot_clock()
        };

        // A process listening on several ports is described once per call.
        let mut described: HashMap<u32, ProcessInfo> = HashMap::new();
        let mut infos = Vec::with_capacity(ports.len());
        for &port in ports {
            let Some(inodes) = inodes_by_port.get(&port) else {
                infos.push(PortInfo::free(port));
                continue;
            };
            let process = inodes
                .iter()
                .find_map(|&inode| index.owner(inode))
                .map(|pid| {
                    described
                        .entry(pid)
                        .or_insert_with(|| self.resolver.describe_with_clock(pid, clock))
                        .clone()
                });
            infos.push(PortInfo::in_use(port, process));
        }
        Ok(infos)
    }
}
