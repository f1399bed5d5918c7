//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with the operating system. Implementations live in `adapters`.

mod signaller;
mod system;

pub use signaller::{ProcessSignaller, Signal};
pub use system::SystemSource;
