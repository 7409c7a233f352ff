//! Domain Adapters
//!
//! Adapter implementations connecting domain ports to PostgreSQL. Each
//! adapter implements a port trait, translates between domain models and
//! row types, and uses the repository layer for SQL.

pub mod program;

pub use program::{PgProgramTransaction, PostgresProgramStore};
