//! In-memory adapters for tests.
//!
//! `InMemorySystem` stages arbitrary socket tables and process records;
//! `RecordingSignaller` records every signal and models which pids are alive.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{socket_descriptor_target, AddressFamily};
use crate::ports::{ProcessSignaller, Signal, SystemSource};

const TABLE_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

/// Kernel code for the LISTEN state.
pub const LISTEN: u8 = 0x0A;
/// Kernel code for the ESTABLISHED state.
pub const ESTABLISHED: u8 = 0x01;

fn not_found(what: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not staged", what))
}

// ============================================================================
// FakeProcess
// ============================================================================

/// Staged records of one process. Any record left unset reads as missing.
#[derive(Debug, Clone, Default)]
pub struct FakeProcess {
    invocation: Option<Vec<u8>>,
    stat: Option<String>,
    status: Option<String>,
    descriptors: Option<Vec<String>>,
}

impl FakeProcess {
    /// A process with an empty descriptor table and no other records.
    pub fn new() -> Self {
        Self {
            descriptors: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// A process that is still listed but whose records are all gone.
    pub fn vanished() -> Self {
        Self::default()
    }

    pub fn invocation(mut self, record: &[u8]) -> Self {
        self.invocation = Some(record.to_vec());
        self
    }

    /// Stage a stat record with the given start ticks in field 22.
    pub fn start_ticks(mut self, ticks: u64) -> Self {
        self.stat = Some(format!(
            "1 (fake) S 1 1 1 0 -1 4194560 0 0 0 0 0 0 0 0 20 0 1 0 {} 0 0",
            ticks
        ));
        self
    }

    pub fn stat(mut self, record: impl Into<String>) -> Self {
        self.stat = Some(record.into());
        self
    }

    /// Stage a status table whose real uid is `uid`.
    pub fn uid(mut self, uid: u32) -> Self {
        self.status = Some(format!(
            "Name:\tfake\nState:\tS (sleeping)\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\nGid:\t0\t0\t0\t0\n"
        ));
        self
    }

    pub fn status(mut self, record: impl Into<String>) -> Self {
        self.status = Some(record.into());
        self
    }

    /// Add an open descriptor referring to a socket inode.
    pub fn socket(self, inode: u64) -> Self {
        self.descriptor(socket_descriptor_target(inode))
    }

    /// Add an open descriptor with an arbitrary target.
    pub fn descriptor(mut self, target: impl Into<String>) -> Self {
        self.descriptors
            .get_or_insert_with(Vec::new)
            .push(target.into());
        self
    }

    /// Make the descriptor table unreadable.
    pub fn hidden_descriptors(mut self) -> Self {
        self.descriptors = None;
        self
    }
}

// ============================================================================
// InMemorySystem
// ============================================================================

/// A `SystemSource` whose kernel state is staged by the test.
#[derive(Debug, Clone)]
pub struct InMemorySystem {
    tables: HashMap<AddressFamily, String>,
    processes: BTreeMap<u32, FakeProcess>,
    listing_available: bool,
    uptime: Option<String>,
    ticks_per_second: Option<u64>,
    now_epoch: f64,
    users: HashMap<u32, String>,
    table_reads: Arc<Mutex<Vec<AddressFamily>>>,
}

impl Default for InMemorySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySystem {
    /// No socket tables, no processes, booted 1000s before epoch 1_700_000_000.
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            processes: BTreeMap::new(),
            listing_available: true,
            uptime: Some("1000.00 4000.00\n".to_string()),
            ticks_per_second: Some(100),
            now_epoch: 1_700_000_000.0,
            users: HashMap::new(),
            table_reads: Arc::default(),
        }
    }

    /// Stage both socket tables with just their headers.
    pub fn with_empty_tables(mut self) -> Self {
        for family in AddressFamily::ALL {
            self.tables
                .entry(family)
                .or_insert_with(|| format!("{}\n", TABLE_HEADER));
        }
        self
    }

    /// Replace a socket table with raw text.
    pub fn with_socket_table(mut self, family: AddressFamily, table: impl Into<String>) -> Self {
        self.tables.insert(family, table.into());
        self
    }

    /// Append a wildcard-address row to a socket table.
    pub fn with_socket(mut self, family: AddressFamily, port: u16, state: u8, inode: u64) -> Self {
        let address = match family {
            AddressFamily::Ipv4 => "0".repeat(8),
            AddressFamily::Ipv6 => "0".repeat(32),
        };
        let table = self
            .tables
            .entry(family)
            .or_insert_with(|| format!("{}\n", TABLE_HEADER));
        let sl = table.lines().count() - 1;
        table.push_str(&format!(
            "{:>4}: {}:{:04X} {}:0000 {:02X} 00000000:00000000 00:00000000 00000000  1000        0 {} 1 0000000000000000 100 0 0 10 0\n",
            sl, address, port, address, state, inode
        ));
        self
    }

    /// Append a listening socket to a socket table.
    pub fn with_listener(self, family: AddressFamily, port: u16, inode: u64) -> Self {
        self.with_socket(family, port, LISTEN, inode)
    }

    pub fn with_process(mut self, pid: u32, process: FakeProcess) -> Self {
        self.processes.insert(pid, process);
        self
    }

    pub fn with_user(mut self, uid: u32, name: impl Into<String>) -> Self {
        self.users.insert(uid, name.into());
        self
    }

    /// Make the process listing itself unreadable.
    pub fn without_process_listing(mut self) -> Self {
        self.listing_available = false;
        self
    }

    pub fn with_clock(mut self, now_epoch: f64, uptime: Option<&str>) -> Self {
        self.now_epoch = now_epoch;
        self.uptime = uptime.map(str::to_string);
        self
    }

    pub fn with_ticks_per_second(mut self, ticks: Option<u64>) -> Self {
        self.ticks_per_second = ticks;
        self
    }

    /// Socket tables requested so far, in order. Clones share the log.
    pub fn table_reads(&self) -> Vec<AddressFamily> {
        self.table_reads.lock().clone()
    }

    fn process(&self, pid: u32) -> io::Result<&FakeProcess> {
        self.processes
            .get(&pid)
            .ok_or_else(|| not_found(format!("process {}", pid)))
    }
}

impl SystemSource for InMemorySystem {
    fn socket_table(&self, family: AddressFamily) -> io::Result<String> {
        self.table_reads.lock().push(family);
        self.tables.get(&family).cloned().ok_or_else(|| not_found(family))
    }

    fn process_ids(&self) -> io::Result<Vec<u32>> {
        if !self.listing_available {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "process listing hidden",
            ));
        }
        Ok(self.processes.keys().copied().collect())
    }

    fn descriptor_targets(&self, pid: u32) -> io::Result<Vec<String>> {
        self.process(pid)?
            .descriptors
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::PermissionDenied, "fd hidden"))
    }

    fn invocation_record(&self, pid: u32) -> io::Result<Vec<u8>> {
        self.process(pid)?
            .invocation
            .clone()
            .ok_or_else(|| not_found("cmdline"))
    }

    fn stat_record(&self, pid: u32) -> io::Result<String> {
        self.process(pid)?.stat.clone().ok_or_else(|| not_found("stat"))
    }

    fn status_record(&self, pid: u32) -> io::Result<String> {
        self.process(pid)?
            .status
            .clone()
            .ok_or_else(|| not_found("status"))
    }

    fn uptime_record(&self) -> io::Result<String> {
        self.uptime.clone().ok_or_else(|| not_found("uptime"))
    }

    fn ticks_per_second(&self) -> Option<u64> {
        self.ticks_per_second
    }

    fn now_epoch(&self) -> f64 {
        self.now_epoch
    }

    fn user_name(&self, uid: u32) -> Option<String> {
        self.users.get(&uid).cloned()
    }
}

// ============================================================================
// RecordingSignaller
// ============================================================================

/// A `ProcessSignaller` that records deliveries instead of sending them.
///
/// A pid accepts signals while it is alive; an accepted SIGTERM or SIGKILL
/// marks it dead, so a later `is_alive` returns `false`.
#[derive(Debug, Default)]
pub struct RecordingSignaller {
    alive: Mutex<HashSet<u32>>,
    sent: Mutex<Vec<(u32, Signal)>>,
}

impl RecordingSignaller {
    pub fn new(alive: impl IntoIterator<Item = u32>) -> Self {
        Self {
            alive: Mutex::new(alive.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Every accepted signal, in order.
    pub fn sent(&self) -> Vec<(u32, Signal)> {
        self.sent.lock().clone()
    }
}

impl ProcessSignaller for RecordingSignaller {
    fn send(&self, pid: u32, signal: Signal) -> bool {
        if !self.alive.lock().remove(&pid) {
            return false;
        }
        self.sent.lock().push((pid, signal));
        true
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().contains(&pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parse_listening_table;

    #[test]
    fn test_staged_rows_parse_back() {
        let system = InMemorySystem::new()
            .with_listener(AddressFamily::Ipv4, 3000, 11)
            .with_socket(AddressFamily::Ipv4, 3001, ESTABLISHED, 12)
            .with_listener(AddressFamily::Ipv6, 8080, 13);

        let v4 = system.socket_table(AddressFamily::Ipv4).unwrap();
        let v4 = parse_listening_table(&v4, AddressFamily::Ipv4);
        assert_eq!(v4.len(), 1);
        assert_eq!((v4[0].port, v4[0].inode), (3000, 11));

        let v6 = system.socket_table(AddressFamily::Ipv6).unwrap();
        let v6 = parse_listening_table(&v6, AddressFamily::Ipv6);
        assert_eq!((v6[0].port, v6[0].inode), (8080, 13));
    }

    #[test]
    fn test_vanished_process_has_no_records() {
        let system = InMemorySystem::new().with_process(7, FakeProcess::vanished());
        assert_eq!(system.process_ids().unwrap(), vec![7]);
        assert!(system.descriptor_targets(7).is_err());
        assert!(system.invocation_record(7).is_err());
    }

    #[test]
    fn test_recording_signaller() {
        let signaller = RecordingSignaller::new([10]);
        assert!(signaller.is_alive(10));
        assert!(signaller.signal_terminate(10));
        assert!(!signaller.is_alive(10));
        assert!(!signaller.signal_kill(10));
        assert_eq!(signaller.sent(), vec![(10, Signal::Terminate)]);
    }
}
