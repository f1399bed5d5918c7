//! Adapters layer - Operating system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter talks to one external system.

pub mod procfs;
pub mod signal;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

// Re-export main types for convenience
pub use procfs::ProcFs;
pub use signal::UnixSignaller;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::{FakeProcess, InMemorySystem, RecordingSignaller};
