//! Loyalty Domain - Program configuration for POINTS and STAMPS programs
//!
//! A loyalty program is created in one shot from a [`ProgramDefinition`]:
//! header, rule set, wallet design, accrual products and a reward catalog.
//! This crate decides whether a definition is internally consistent and
//! persists it atomically.
//!
//! # Pipeline
//!
//! ```text
//!   ProgramDefinition
//!        │
//!        ▼
//!   ProgramTypePolicy ──► RewardPolicy (per reward)
//!        │
//!        │ ValidatedProgram
//!        ▼
//!   ProgramService::create_program ──► ProgramTransaction (one per program)
//!        │
//!        ▼
//!   ProgramAggregate (projected back from the store)
//! ```
//!
//! Policies never stop at the first failure: every violation is collected
//! and returned together.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_loyalty::{ProgramService, ProgramTypePolicy};
//!
//! let result = ProgramTypePolicy::validate(&definition);
//! if result.is_valid() {
//!     let program = service.create_program(org_id, user_id, &definition).await?;
//! }
//! ```

#[macro_use]
mod macros;

pub mod aggregate;
pub mod error;
pub mod ports;
pub mod product;
pub mod program;
pub mod program_policy;
pub mod reward;
pub mod reward_policy;
pub mod rules;
pub mod services;
pub mod validated;
pub mod violation;
pub mod wallet;

pub use aggregate::{ProgramAggregate, RewardView};
pub use error::LoyaltyError;
pub use ports::{ProgramStore, ProgramTransaction};
pub use product::{ProductKey, ProductRef, ProductSource};
pub use program::{
    BilingualText, ProgramDefinition, ProgramDetails, ProgramHeader, ProgramStatus, ProgramType,
};
pub use program_policy::ProgramTypePolicy;
pub use reward::{
    DiscountDetails, FreeProductLine, RewardCostInput, RewardDefinition, RewardStatus, RewardType,
};
pub use reward_policy::RewardPolicy;
pub use rules::{
    AccrualProduct, AccrualRule, ExpiryDuration, ExpiryUnit, LimitScope, PointsRules, RoundingMode,
    StampsRules, TimeRestrictionUnit, VisitLimitMode,
};
pub use services::{ProgramService, ServiceConfig};
pub use validated::{
    AccrualItem, FreeProductItem, PointsRuleSet, ProgramConfig, RewardBehavior, RewardCost,
    StampsRuleSet, ValidatedProgram, ValidatedReward,
};
pub use violation::{ValidationResult, Violation, ViolationCode};
pub use wallet::{StampIcon, StampIcons, WalletDesign, WalletTheme};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{InMemoryProgramStore, WriteStep};
