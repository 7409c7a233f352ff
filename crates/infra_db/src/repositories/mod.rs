//! Repository implementations
//!
//! Repositories encapsulate SQL and map between rows and the types the
//! adapters hand to the domain.

pub mod program;

pub use program::ProgramRepository;
