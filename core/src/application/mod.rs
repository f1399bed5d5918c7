//! Application layer - Use case services.
//!
//! This module contains the services that orchestrate domain logic and
//! adapter interactions:
//! - `Resolver`: the socket-to-process resolution engine
//! - `PortService`: the caller-facing query and control facade
//!
//! Both take their operating system access through the traits in `ports`,
//! so tests can inject staged kernel state.

mod port_service;
mod resolver;

pub use port_service::PortService;
pub use resolver::{OwnerIndex, Resolver};
