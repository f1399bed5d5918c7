//! Socket-to-process resolution engine.
//!
//! Reduces the kernel socket tables to listening sockets, maps socket inodes
//! to the processes holding them, and reads process metadata. Nothing is kept
//! between calls: every operation re-reads the current kernel state.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::{
    listening_sockets, parse_real_uid, parse_socket_descriptor_target, parse_start_ticks,
    parse_uptime, socket_descriptor_target, AddressFamily, BootClock, ListeningSocket,
    ProcessInfo,
};
use crate::error::{Error, Result};
use crate::ports::SystemSource;

/// Inode to owning pid, built in one pass over every descriptor table.
///
/// When several processes share a socket (forked workers inheriting a
/// listener), the pid recorded is whichever the process listing yielded
/// first: an arbitrary one of the owners, not a canonical one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerIndex {
    owners: HashMap<u64, u32>,
}

impl OwnerIndex {
    /// The pid holding the socket with this inode, if one was found.
    pub fn owner(&self, inode: u64) -> Option<u32> {
        self.owners.get(&inode).copied()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// The resolution engine over a `SystemSource`.
pub struct Resolver<S: SystemSource> {
    system: S,
}

impl<S: SystemSource> Resolver<S> {
    pub fn new(system: S) -> Self {
        Self { system }
    }

    /// The underlying system source.
    pub fn system(&self) -> &S {
        &self.system
    }

    /// Read both TCP tables and keep the listening sockets.
    ///
    /// A missing table is skipped; only losing both is an error. The result
    /// is unordered and may list a port twice (one socket per family).
    pub fn enumerate_listening_sockets(&self) -> Result<Vec<ListeningSocket>> {
        let mut sockets = Vec::new();
        self.for_each_table(|table, family| {
            sockets.extend(listening_sockets(table, family));
            false
        })?;
        Ok(sockets)
    }

    /// Whether any socket is listening on `port`. Stops at the first match
    /// and never looks up owners.
    pub fn is_port_listening(&self, port: u16) -> Result<bool> {
        let mut found = false;
        self.for_each_table(|table, family| {
            found = listening_sockets(table, family).any(|s| s.port == port);
            found
        })?;
        Ok(found)
    }

    /// Find a process holding the socket with this inode.
    ///
    /// Walks every process's descriptor table until one refers to the
    /// socket. If several processes share it, which one is returned depends
    /// on process listing order and is not stable across runs.
    pub fn resolve_owner(&self, inode: u64) -> Result<Option<u32>> {
        if inode == 0 {
            return Ok(None);
        }
        let wanted = socket_descriptor_target(inode);

        for pid in self.process_ids()? {
            let Some(targets) = self.descriptor_targets(pid) else {
                continue;
            };
            if targets.iter().any(|target| *target == wanted) {
                return Ok(Some(pid));
            }
        }
        Ok(None)
    }

    /// Resolve owners for many inodes with a single walk of the process
    /// table. The walk ends early once every inode has an owner. Inode 0
    /// never has one.
    pub fn owner_index(&self, inodes: &HashSet<u64>) -> Result<OwnerIndex> {
        let mut index = OwnerIndex::default();
        let inodes: HashSet<u64> = inodes.iter().copied().filter(|&inode| inode != 0).collect();
        if inodes.is_empty() {
            return Ok(index);
        }

        for pid in self.process_ids()? {
            let Some(targets) = self.descriptor_targets(pid) else {
                continue;
            };
            for inode in targets
                .iter()
                .filter_map(|target| parse_socket_descriptor_target(target))
                .filter(|inode| inodes.contains(inode))
            {
                index.owners.entry(inode).or_insert(pid);
            }
            if index.owners.len() == inodes.len() {
                break;
            }
        }
        Ok(index)
    }

    /// Snapshot a process's metadata. Never fails: whatever cannot be read
    /// is left unset.
    pub fn describe_process(&self, pid: u32) -> ProcessInfo {
        self.describe_with_clock(pid, self.boot_clock())
    }

    /// Read the boot clock once so a batch of start times share one
    /// reference point.
    pub fn boot_clock(&self) -> Option<BootClock> {
        let uptime = match self.system.uptime_record() {
            Ok(record) => parse_uptime(&record)?,
            Err(e) => {
                debug!(error = %e, "Uptime unavailable");
                return None;
            }
        };
        let ticks = self.system.ticks_per_second()?;
        BootClock::new(self.system.now_epoch(), uptime, ticks)
    }

    /// `describe_process` with a caller-supplied clock.
    pub fn describe_with_clock(&self, pid: u32, clock: Option<BootClock>) -> ProcessInfo {
        let mut info = ProcessInfo::new(pid);

        match self.system.invocation_record(pid) {
            Ok(record) => info = info.with_invocation(&record),
            Err(e) => debug!(pid, error = %e, "Invocation record unreadable"),
        }

        match self.system.stat_record(pid) {
            Ok(stat) => {
                info.start_time = clock
                    .zip(parse_start_ticks(&stat))
                    .and_then(|(clock, ticks)| clock.start_time(ticks));
            }
            Err(e) => debug!(pid, error = %e, "Stat record unreadable"),
        }

        match self.system.status_record(pid) {
            Ok(status) => {
                info.user = parse_real_uid(&status).map(|uid| {
                    self.system
                        .user_name(uid)
                        .unwrap_or_else(|| uid.to_string())
                });
            }
            Err(e) => debug!(pid, error = %e, "Status record unreadable"),
        }

        info
    }

    /// Feed each readable socket table to `visit` until it returns `true`.
    fn for_each_table(&self, mut visit: impl FnMut(&str, AddressFamily) -> bool) -> Result<()> {
        let mut readable = 0;
        for family in AddressFamily::ALL {
            match self.system.socket_table(family) {
                Ok(table) => {
                    readable += 1;
                    if visit(&table, family) {
                        return Ok(());
                    }
                }
                Err(e) => debug!(%family, error = %e, "Socket table unavailable"),
            }
        }

        if readable == 0 {
            return Err(Error::SourceUnavailable(
                "no TCP socket table is readable".to_string(),
            ));
        }
        Ok(())
    }

    fn process_ids(&self) -> Result<Vec<u32>> {
        self.system
            .process_ids()
            .map_err(|e| Error::SourceUnavailable(format!("process listing: {}", e)))
    }

    /// A process that exits mid-walk, or hides its descriptors, is skipped.
    fn descriptor_targets(&self, pid: u32) -> Option<Vec<String>> {
        match self.system.descriptor_targets(pid) {
            Ok(targets) => Some(targets),
            Err(e) => {
                debug!(pid, error = %e, "Descriptor table unreadable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FakeProcess, InMemorySystem};

    fn resolver(system: InMemorySystem) -> Resolver<InMemorySystem> {
        Resolver::new(system)
    }

    #[test]
    fn test_enumerate_both_families() {
        let r = resolver(
            InMemorySystem::new()
                .with_listener(AddressFamily::Ipv4, 8080, 10)
                .with_listener(AddressFamily::Ipv6, 8080, 11)
                .with_socket(AddressFamily::Ipv4, 5432, 0x01, 12),
        );
        let mut found: Vec<(u16, u64)> = r
            .enumerate_listening_sockets()
            .unwrap()
            .iter()
            .map(|s| (s.port, s.inode))
            .collect();
        found.sort();
        assert_eq!(found, vec![(8080, 10), (8080, 11)]);
    }

    #[test]
    fn test_enumerate_one_table_missing() {
        let r = resolver(InMemorySystem::new().with_listener(AddressFamily::Ipv6, 22, 5));
        let sockets = r.enumerate_listening_sockets().unwrap();
        assert_eq!(sockets.len(), 1);
        assert_eq!(sockets[0].family, AddressFamily::Ipv6);
    }

    #[test]
    fn test_enumerate_no_tables_is_source_unavailable() {
        let r = resolver(InMemorySystem::new());
        assert!(matches!(
            r.enumerate_listening_sockets(),
            Err(Error::SourceUnavailable(_))
        ));
        assert!(matches!(r.is_port_listening(22), Err(Error::SourceUnavailable(_))));
    }

    #[test]
    fn test_empty_tables_are_not_an_error() {
        let r = resolver(InMemorySystem::new().with_empty_tables());
        assert!(r.enumerate_listening_sockets().unwrap().is_empty());
        assert!(!r.is_port_listening(22).unwrap());
    }

    #[test]
    fn test_is_port_listening_short_circuits() {
        let system = InMemorySystem::new()
            .with_listener(AddressFamily::Ipv4, 3000, 1)
            .with_listener(AddressFamily::Ipv6, 3001, 2);
        let r = resolver(system.clone());

        assert!(r.is_port_listening(3000).unwrap());
        assert_eq!(system.table_reads(), vec![AddressFamily::Ipv4]);

        assert!(r.is_port_listening(3001).unwrap());
        assert_eq!(
            system.table_reads(),
            vec![AddressFamily::Ipv4, AddressFamily::Ipv4, AddressFamily::Ipv6]
        );
    }

    #[test]
    fn test_inode_zero_listener_has_no_owner() {
        let r = resolver(
            InMemorySystem::new()
                .with_listener(AddressFamily::Ipv4, 5000, 0)
                .with_process(100, FakeProcess::new().socket(0)),
        );
        assert!(r.is_port_listening(5000).unwrap());
        assert_eq!(r.resolve_owner(0).unwrap(), None);
        assert!(r.owner_index(&HashSet::from([0])).unwrap().is_empty());
    }

    #[test]
    fn test_is_port_listening_ignores_other_states() {
        let r = resolver(InMemorySystem::new().with_socket(AddressFamily::Ipv4, 3000, 0x01, 1));
        assert!(!r.is_port_listening(3000).unwrap());
    }

    #[test]
    fn test_resolve_owner() {
        let r = resolver(
            InMemorySystem::new()
                .with_process(100, FakeProcess::new().descriptor("/dev/null").socket(7))
                .with_process(200, FakeProcess::new().socket(41532).descriptor("pipe:[9]")),
        );
        assert_eq!(r.resolve_owner(41532).unwrap(), Some(200));
        assert_eq!(r.resolve_owner(7).unwrap(), Some(100));
        assert_eq!(r.resolve_owner(9).unwrap(), None);
        assert_eq!(r.resolve_owner(0).unwrap(), None);
    }

    #[test]
    fn test_resolve_owner_skips_unreadable_processes() {
        let r = resolver(
            InMemorySystem::new()
                .with_process(1, FakeProcess::new().socket(5).hidden_descriptors())
                .with_process(2, FakeProcess::vanished())
                .with_process(3, FakeProcess::new().socket(5)),
        );
        assert_eq!(r.resolve_owner(5).unwrap(), Some(3));
    }

    #[test]
    fn test_resolve_owner_without_listing_fails() {
        let r = resolver(InMemorySystem::new().without_process_listing());
        assert!(matches!(r.resolve_owner(5), Err(Error::SourceUnavailable(_))));
    }

    #[test]
    fn test_owner_index_single_pass() {
        let r = resolver(
            InMemorySystem::new()
                .with_process(10, FakeProcess::new().socket(1).socket(2))
                .with_process(20, FakeProcess::new().socket(3))
                .with_process(30, FakeProcess::new().socket(1)),
        );
        let wanted: HashSet<u64> = [1, 3, 99].into_iter().collect();
        let index = r.owner_index(&wanted).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.owner(1), Some(10));
        assert_eq!(index.owner(3), Some(20));
        assert_eq!(index.owner(2), None);
        assert_eq!(index.owner(99), None);
    }

    #[test]
    fn test_owner_index_agrees_with_resolve_owner() {
        let r = resolver(
            InMemorySystem::new()
                .with_process(4, FakeProcess::new().socket(40))
                .with_process(5, FakeProcess::new().socket(50).socket(51))
                .with_process(6, FakeProcess::vanished()),
        );
        let wanted: HashSet<u64> = [40, 50, 51, 60].into_iter().collect();
        let index = r.owner_index(&wanted).unwrap();
        for inode in wanted {
            assert_eq!(index.owner(inode), r.resolve_owner(inode).unwrap());
        }
    }

    #[test]
    fn test_describe_process_full() {
        // Booted at 1_699_999_000; ticks 1520 at 100Hz is 15.2s after boot.
        let r = resolver(
            InMemorySystem::new()
                .with_user(1000, "alice")
                .with_process(
                    812,
                    FakeProcess::new()
                        .invocation(b"/usr/sbin/nginx\0-g\0daemon off;\0")
                        .start_ticks(1520)
                        .uid(1000),
                ),
        );
        let info = r.describe_process(812);
        assert_eq!(info.pid, 812);
        assert_eq!(info.name, "nginx");
        assert_eq!(info.launch_token.as_deref(), Some("/usr/sbin/nginx"));
        assert_eq!(info.user.as_deref(), Some("alice"));
        assert_eq!(info.start_time, Some(1_699_999_015));
    }

    #[test]
    fn test_describe_unknown_uid_falls_back_to_number() {
        let r = resolver(InMemorySystem::new().with_process(5, FakeProcess::new().uid(4242)));
        assert_eq!(r.describe_process(5).user.as_deref(), Some("4242"));
    }

    #[test]
    fn test_describe_vanished_process_uses_defaults() {
        let r = resolver(InMemorySystem::new().with_process(9, FakeProcess::vanished()));
        let info = r.describe_process(9);
        assert_eq!(info, ProcessInfo::new(9));
        assert_eq!(info.name, "unknown");
        assert_eq!(r.describe_process(12345), ProcessInfo::new(12345));
    }

    #[test]
    fn test_describe_reads_are_independent() {
        // No invocation record, malformed stat, valid status.
        let r = resolver(
            InMemorySystem::new().with_user(0, "root").with_process(
                1,
                FakeProcess::new().stat("1 (init) S").uid(0),
            ),
        );
        let info = r.describe_process(1);
        assert_eq!(info.name, "unknown");
        assert!(info.launch_token.is_none());
        assert!(info.start_time.is_none());
        assert_eq!(info.user.as_deref(), Some("root"));
    }

    #[test]
    fn test_describe_status_without_uid_leaves_user_empty() {
        let r = resolver(InMemorySystem::new().with_process(
            3,
            FakeProcess::new().invocation(b"redis-server *:6379").status("Name:\tredis\n"),
        ));
        let info = r.describe_process(3);
        assert_eq!(info.name, "redis-server");
        assert!(info.user.is_none());
    }

    #[test]
    fn test_start_time_needs_clock() {
        let process = FakeProcess::new().start_ticks(500);
        let no_uptime = resolver(
            InMemorySystem::new()
                .with_clock(1_700_000_000.0, None)
                .with_process(1, process.clone()),
        );
        assert!(no_uptime.describe_process(1).start_time.is_none());

        let no_ticks = resolver(
            InMemorySystem::new()
                .with_ticks_per_second(None)
                .with_process(1, process),
        );
        assert!(no_ticks.describe_process(1).start_time.is_none());
    }

    #[test]
    fn test_start_times_follow_start_order() {
        let r = resolver(
            InMemorySystem::new()
                .with_process(1, FakeProcess::new().start_ticks(100))
                .with_process(2, FakeProcess::new().start_ticks(250))
                .with_process(3, FakeProcess::new().start_ticks(99_000)),
        );
        let clock = r.boot_clock();
        let a = r.describe_with_clock(1, clock).start_time.unwrap();
        let b = r.describe_with_clock(2, clock).start_time.unwrap();
        let c = r.describe_with_clock(3, clock).start_time.unwrap();
        assert!(a <= b && b <= c);
    }
}
