//! Kernel introspection port (interface).

use std::io;

use crate::domain::AddressFamily;

/// Port for reading kernel-exposed process and socket state.
///
/// Each method is one read of one source. Implementations return raw text or
/// bytes and leave all parsing to the domain layer, so a test double only
/// has to stage file contents.
///
/// Errors are per source: the resolver decides which ones are fatal (the
/// socket tables, the process listing) and which are absorbed (everything
/// per-process).
pub trait SystemSource: Send + Sync {
    /// The TCP socket table for one address family, header included.
    fn socket_table(&self, family: AddressFamily) -> io::Result<String>;

    /// Ids of all processes currently listed. Order is unspecified.
    fn process_ids(&self) -> io::Result<Vec<u32>>;

    /// Symlink targets of every open descriptor of a process.
    fn descriptor_targets(&self, pid: u32) -> io::Result<Vec<String>>;

    /// The raw NUL-delimited invocation record of a process.
    fn invocation_record(&self, pid: u32) -> io::Result<Vec<u8>>;

    /// The one-line stat record of a process.
    fn stat_record(&self, pid: u32) -> io::Result<String>;

    /// The `Key:\tvalue` status table of a process.
    fn status_record(&self, pid: u32) -> io::Result<String>;

    /// The system uptime record (seconds since boot, then idle seconds).
    fn uptime_record(&self) -> io::Result<String>;

    /// Clock ticks per second used by stat records.
    fn ticks_per_second(&self) -> Option<u64>;

    /// Current wall-clock time in seconds since the Unix epoch.
    fn now_epoch(&self) -> f64;

    /// Account name for a numeric user id.
    fn user_name(&self, uid: u32) -> Option<String>;
}
