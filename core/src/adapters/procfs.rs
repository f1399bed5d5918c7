//! Linux `/proc` adapter.
//!
//! Reads the socket tables and per-process records straight from procfs.
//! No external commands, no privileges: whatever the calling user cannot read
//! comes back as an `io::Error` for the resolver to absorb.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use nix::unistd::{sysconf, SysconfVar, Uid, User};

use crate::domain::AddressFamily;
use crate::ports::SystemSource;

/// Procfs-backed system source.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    /// Where procfs is mounted on a normal Linux host.
    pub const DEFAULT_ROOT: &'static str = "/proc";

    /// Create a source reading the host's `/proc`.
    pub fn new() -> Self {
        Self::with_root(Self::DEFAULT_ROOT)
    }

    /// Create a source reading a procfs tree at a custom path (for testing).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn process_path(&self, pid: u32, leaf: &str) -> PathBuf {
        self.root.join(pid.to_string()).join(leaf)
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSource for ProcFs {
    fn socket_table(&self, family: AddressFamily) -> io::Result<String> {
        fs::read_to_string(self.root.join(family.table_path()))
    }

    fn process_ids(&self) -> io::Result<Vec<u32>> {
        let mut pids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let Ok(entry) = entry else {
                continue;
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Ok(pid) = name.parse() {
                pids.push(pid);
            }
        }
        Ok(pids)
    }

    fn descriptor_targets(&self, pid: u32) -> io::Result<Vec<String>> {
        let mut targets = Vec::new();
        for entry in fs::read_dir(self.process_path(pid, "fd"))? {
            // Descriptors close while we iterate; skip the ones that vanish.
            let Ok(entry) = entry else {
                continue;
            };
            if let Ok(target) = fs::read_link(entry.path()) {
                targets.push(target.to_string_lossy().into_owned());
            }
        }
        Ok(targets)
    }

    fn invocation_record(&self, pid: u32) -> io::Result<Vec<u8>> {
        fs::read(self.process_path(pid, "cmdline"))
    }

    fn stat_record(&self, pid: u32) -> io::Result<String> {
        fs::read_to_string(self.process_path(pid, "stat"))
    }

    fn status_record(&self, pid: u32) -> io::Result<String> {
        fs::read_to_string(self.process_path(pid, "status"))
    }

    fn uptime_record(&self) -> io::Result<String> {
        fs::read_to_string(self.root.join("uptime"))
    }

    fn ticks_per_second(&self) -> Option<u64> {
        sysconf(SysconfVar::CLK_TCK)
            .ok()
            .flatten()
            .and_then(|ticks| u64::try_from(ticks).ok())
            .filter(|&ticks| ticks > 0)
    }

    fn now_epoch(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }

    fn user_name(&self, uid: u32) -> Option<String> {
        User::from_uid(Uid::from_raw(uid))
            .ok()
            .flatten()
            .map(|user| user.name)
    }
}
