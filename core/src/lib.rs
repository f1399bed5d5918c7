//! PortProbe Core Library
//!
//! Finds the process that owns a listening TCP port by reading what the
//! kernel exposes under `/proc`. Provides functionality to:
//! - Enumerate listening TCP sockets (IPv4 and IPv6)
//! - Resolve a socket to its owning process and describe that process
//! - Check, scan and list ports, and suggest free ones
//! - Terminate a port's owner (SIGTERM or SIGKILL)
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models and kernel record parsers
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Operating system implementations
//! - `application`: Resolution engine and query facade
//!
//! # Platform Support
//! - Linux: reads `/proc/net/tcp{,6}` and `/proc/<pid>/{fd,cmdline,stat,status}`
//!
//! Nothing is privileged and nothing is cached: metadata the caller may not
//! read is reported as unknown, and every call reflects the kernel state at
//! that moment.

#[cfg(not(unix))]
compile_error!("Unsupported platform: portprobe-core needs procfs and Unix signals");

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    AddressFamily, ListeningSocket, PortInfo, PortRange, PortStatus, ProcessInfo, TcpState,
};

// Re-export other commonly used types
pub use adapters::{ProcFs, UnixSignaller};
pub use application::{OwnerIndex, PortService, Resolver};
pub use config::{Config, ConfigStore};
pub use error::{Error, Result};
pub use ports::{ProcessSignaller, Signal, SystemSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The port service backed by the host's `/proc` and `kill(2)`.
pub type PortProbe = PortService<ProcFs, UnixSignaller>;

impl Default for PortService<ProcFs, UnixSignaller> {
    fn default() -> Self {
        PortService::new(ProcFs::new(), UnixSignaller::new())
    }
}
