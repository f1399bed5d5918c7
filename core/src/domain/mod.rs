//! Domain layer - Pure data models and kernel record parsers.
//!
//! This module contains the port/process snapshot types and the parsers for
//! the text and byte records the kernel exposes under `/proc`.
//! These types have no I/O dependencies and can be tested in isolation.

mod port;
mod process;
mod socket;

// Re-export all domain types
pub use port::{PortInfo, PortRange, PortStatus};
pub use process::{
    parse_real_uid, parse_start_ticks, parse_uptime, BootClock, Invocation, ProcessInfo,
    UNKNOWN_PROCESS_NAME,
};
pub use socket::{
    listening_sockets, parse_listening_table, parse_socket_descriptor_target, socket_descriptor_target,
    AddressFamily, ListeningSocket, SocketRow, TcpState,
};
