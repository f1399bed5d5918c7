//! Process snapshot model and parsers for per-process kernel records.
//!
//! Everything here is pure: the functions take the raw bytes or text of a
//! record and return `None` when the piece they look for is missing or does
//! not parse. Reading the records is the job of a `SystemSource`.

use serde::Serialize;

/// Name reported for a process whose invocation record is empty or unreadable.
pub const UNKNOWN_PROCESS_NAME: &str = "unknown";

// ============================================================================
// ProcessInfo
// ============================================================================

/// Point-in-time snapshot of one process.
///
/// Every field except `pid` and `name` is independently optional: a `None`
/// means that piece of metadata could not be read, not that the whole lookup
/// failed. `name` falls back to [`UNKNOWN_PROCESS_NAME`] and is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    /// Process ID.
    pub pid: u32,
    /// Executable basename.
    pub name: String,
    /// First NUL-delimited token of the invocation record, usually the
    /// executable path as invoked. Arguments are not included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_token: Option<String>,
    /// Account name of the real user id, or the numeric id when the account
    /// database has no entry for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Start time in seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
}

impl ProcessInfo {
    /// A snapshot with nothing known beyond the pid.
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            name: UNKNOWN_PROCESS_NAME.to_string(),
            launch_token: None,
            user: None,
            start_time: None,
        }
    }

    /// Set the display name. An empty name keeps the unknown placeholder.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.name = name;
        }
        self
    }

    /// Fill `name` and `launch_token` from a raw invocation record.
    pub fn with_invocation(mut self, record: &[u8]) -> Self {
        if let Some(invocation) = Invocation::parse(record) {
            self.name = invocation.name;
            self.launch_token = Some(invocation.launch_token);
        }
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_start_time(mut self, start_time: u64) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

impl std::fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

// ============================================================================
// Invocation record
// ============================================================================

/// The parts of an invocation record (`/proc/<pid>/cmdline`) we keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub launch_token: String,
    pub name: String,
}

impl Invocation {
    /// Parse the first NUL-delimited segment of an invocation record.
    ///
    /// Returns `None` for an empty record (kernel threads, zombies).
    pub fn parse(record: &[u8]) -> Option<Self> {
        let first = record.split(|&b| b == 0).next().unwrap_or_default();
        if first.is_empty() {
            return None;
        }

        let launch_token = String::from_utf8_lossy(first).into_owned();
        let base = launch_token
            .rsplit_once('/')
            .map_or(launch_token.as_str(), |(_, base)| base);
        // Processes that rewrite their argv often leave one space-joined segment.
        let name = base.split([' ', '\0']).next().unwrap_or_default();
        let name = if name.is_empty() {
            UNKNOWN_PROCESS_NAME.to_string()
        } else {
            name.to_string()
        };

        Some(Self { launch_token, name })
    }
}

// ============================================================================
// stat / status records
// ============================================================================

/// Index of `starttime` among the fields that follow the `(comm)` field of
/// `/proc/<pid>/stat`. It is field 22 overall; fields 1 and 2 precede comm's
/// closing parenthesis.
const STARTTIME_FIELD_AFTER_COMM: usize = 22 - 3;

/// Extract the start time, in clock ticks since boot, from a stat record.
///
/// The command name can itself contain spaces and parentheses, so fields are
/// counted from the last `)`.
pub fn parse_start_ticks(stat: &str) -> Option<u64> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace()
        .nth(STARTTIME_FIELD_AFTER_COMM)?
        .parse()
        .ok()
}

/// Extract the real user id from a status record (`Uid:` line, first value).
pub fn parse_real_uid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

/// Extract seconds since boot from an uptime record (`/proc/uptime`).
pub fn parse_uptime(uptime: &str) -> Option<f64> {
    let secs: f64 = uptime.split_whitespace().next()?.parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then_some(secs)
}

// ============================================================================
// BootClock
// ============================================================================

/// Converts "ticks since boot" into epoch seconds.
///
/// Built from one reading of wall-clock time and uptime, and reused for every
/// process described in the same pass, so start times within a pass are
/// ordered exactly like their tick counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootClock {
    boot_epoch: f64,
    ticks_per_second: u64,
}

impl BootClock {
    /// Returns `None` if the inputs cannot produce a meaningful boot time.
    pub fn new(now_epoch: f64, uptime_secs: f64, ticks_per_second: u64) -> Option<Self> {
        let boot_epoch = now_epoch - uptime_secs;
        if ticks_per_second == 0 || !boot_epoch.is_finite() || boot_epoch < 0.0 {
            return None;
        }
        Some(Self {
            boot_epoch,
            ticks_per_second,
        })
    }

    /// Epoch seconds at which a process with the given start ticks began.
    pub fn start_time(&self, start_ticks: u64) -> Option<u64> {
        let since_boot = start_ticks as f64 / self.ticks_per_second as f64;
        let start = (self.boot_epoch + since_boot).floor();
        (start.is_finite() && start >= 0.0 && start <= u64::MAX as f64).then(|| start as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================
