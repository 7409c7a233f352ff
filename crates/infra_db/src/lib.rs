//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the loyalty crates using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: [`repositories`] holds the
//! row types and SQL, [`adapters`] implements the domain's `ProgramStore`
//! port on top of them and translates errors into `PortError`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresProgramStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/loyalty")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresProgramStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::PostgresProgramStore;
