//! Core Kernel - Foundational types shared by the loyalty crates
//!
//! This crate provides the building blocks every other crate depends on:
//! - Strongly-typed identifiers for tenants, programs, rewards and users
//! - Port abstractions (errors, health checks) for hexagonal adapters

pub mod identifiers;
pub mod ports;

pub use identifiers::{OrganizationId, ProgramId, RewardId, UserId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
