//! Port binding domain models.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::ProcessInfo;
use crate::error::{Error, Result};

// ============================================================================
// PortStatus
// ============================================================================

/// Binding state of a TCP port at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortStatus {
    /// No socket was listening on the port.
    Free,
    /// At least one socket was listening on the port.
    InUse,
}

impl PortStatus {
    /// Get the display name for this status.
    pub fn display_name(&self) -> &'static str {
        match self {
            PortStatus::Free => "FREE",
            PortStatus::InUse => "IN USE",
        }
    }
}

impl std::fmt::Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// PortInfo
// ============================================================================

/// Snapshot of one TCP port.
///
/// A process is only ever attached to an in-use port. An in-use port without
/// a process means the socket exists but its owner could not be identified,
/// usually because of permissions or because the owner exited mid-scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    port: u16,
    status: PortStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    process: Option<ProcessInfo>,
}

impl PortInfo {
    /// A port with no listener.
    pub fn free(port: u16) -> Self {
        Self {
            port,
            status: PortStatus::Free,
            process: None,
        }
    }

    /// A port with a listener, and its owner if one was resolved.
    pub fn in_use(port: u16, process: Option<ProcessInfo>) -> Self {
        Self {
            port,
            status: PortStatus::InUse,
            process,
        }
    }

    /// The port number.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the port was listening.
    pub fn status(&self) -> PortStatus {
        self.status
    }

    /// The owning process, if it was resolved.
    pub fn process(&self) -> Option<&ProcessInfo> {
        self.process.as_ref()
    }

    pub fn is_free(&self) -> bool {
        self.status == PortStatus::Free
    }

    pub fn is_in_use(&self) -> bool {
        self.status == PortStatus::InUse
    }

    /// Check if this port matches a search query.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query_lower = query.to_lowercase();
        if self.port.to_string().contains(&query_lower) {
            return true;
        }
        self.process.as_ref().is_some_and(|p| {
            p.name.to_lowercase().contains(&query_lower)
                || p.pid.to_string().contains(&query_lower)
                || p.user
                    .as_deref()
                    .is_some_and(|u| u.to_lowercase().contains(&query_lower))
        })
    }
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.process {
            Some(p) => write!(
                f,
                "{} {} (PID: {}, Process: {})",
                self.port, self.status, p.pid, p.name
            ),
            None => write!(f, "{} {}", self.port, self.status),
        }
    }
}

// ============================================================================
// PortRange
// ============================================================================

/// An inclusive, non-empty range of port numbers starting at 1 or above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct PortRange {
    start: u16,
    end: u16,
}

#[derive(Deserialize)]
struct RawRange {
    start: u16,
    end: u16,
}

impl TryFrom<RawRange> for PortRange {
    type Error = Error;

    fn try_from(raw: RawRange) -> Result<Self> {
        PortRange::new(raw.start, raw.end)
    }
}

impl PortRange {
    /// Create a range covering `start..=end`.
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if start == 0 || start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }

    /// Ports in ascending order.
    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl std::fmt::Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ============================================================================
// Tests
// ============================================================================
