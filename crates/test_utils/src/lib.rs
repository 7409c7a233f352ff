//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! loyalty test suite.
//!
//! # Modules
//!
//! - `fixtures`: Ready-made valid program definitions and ids
//! - `builders`: Builder patterns for rewards and stores
//! - `database`: PostgreSQL test container management
//! - `assertions`: Assertion helpers for violations and aggregates
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
