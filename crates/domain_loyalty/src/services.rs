//! Loyalty program service
//!
//! [`ProgramService`] is the single entry point for creating and reading
//! programs. Creation runs the Program Type Policy first and only touches
//! the store once the definition is accepted; the Aggregate Constructor
//! then writes every row inside one transaction bounded by
//! [`ServiceConfig::transaction_timeout`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{HealthCheckResult, OrganizationId, PortError, ProgramId, RewardId, UserId};

use crate::aggregate::ProgramAggregate;
use crate::error::LoyaltyError;
use crate::ports::{ProgramStore, ProgramTransaction};
use crate::program::{ProgramDefinition, ProgramHeader};
use crate::program_policy::ProgramTypePolicy;
use crate::validated::{ProgramConfig, RewardBehavior, ValidatedProgram};

/// Default bound on the write transaction
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for [`ProgramService`]
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound on the write sequence and its commit; exceeding it rolls back
    pub transaction_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }
}

/// Creates and reads loyalty programs
pub struct ProgramService {
    store: Arc<dyn ProgramStore>,
    config: ServiceConfig,
}

impl ProgramService {
    /// Creates a service with the default configuration
    pub fn new(store: Arc<dyn ProgramStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: Arc<dyn ProgramStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    /// Validates and atomically persists a program, returning it as stored
    ///
    /// # Errors
    ///
    /// - [`LoyaltyError::ValidationFailed`] with every violation when the
    ///   definition is rejected; nothing is written
    /// - [`LoyaltyError::PersistenceFailed`] when any write, the commit, or
    ///   the transaction deadline fails; nothing is written
    ///
    /// Once the commit succeeds the call succeeds. If re-reading the program
    /// then fails, the returned aggregate is built from the written rows.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let program = service.create_program(org_id, user_id, &definition).await?;
    /// assert_eq!(program.rewards.len(), definition.rewards.len());
    /// ```
    #[instrument(
        skip(self, created_by, definition),
        fields(
            organization_id = %organization_id,
            caller_id = %created_by,
            program_type = %definition.program_type
        )
    )]
    pub async fn create_program(
        &self,
        organization_id: OrganizationId,
        created_by: UserId,
        definition: &ProgramDefinition,
    ) -> Result<ProgramAggregate, LoyaltyError> {
        let validated = ProgramTypePolicy::accept(definition).map_err(|violations| {
            warn!(violations = violations.len(), "Program definition rejected");
            LoyaltyError::ValidationFailed(violations)
        })?;

        let now = Utc::now();
        let header = ProgramHeader {
            id: ProgramId::new_v7(),
            organization_id,
            program_type: validated.program_type(),
            details: validated.details.clone(),
            created_by,
            created_at: now,
            updated_at: now,
        };
        let program_id = header.id;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| LoyaltyError::persistence("begin", e))?;

        // One deadline covers the writes and the commit
        let deadline = Instant::now() + self.config.transaction_timeout;
        let written = timeout_at(deadline, write_aggregate(tx.as_mut(), &header, &validated)).await;

        let outcome = match written {
            Ok(Ok(reward_ids)) => match timeout_at(deadline, tx.commit()).await {
                Ok(committed) => committed
                    .map(|()| reward_ids)
                    .map_err(|e| LoyaltyError::persistence("commit", e)),
                // Dropping an unfinished commit discards the transaction
                Err(_elapsed) => Err(self.timed_out()),
            },
            Ok(Err(e)) => {
                rollback(tx).await;
                Err(LoyaltyError::persistence("create_program", e))
            }
            Err(_elapsed) => {
                rollback(tx).await;
                Err(self.timed_out())
            }
        };

        let reward_ids = outcome.inspect_err(|e| {
            error!(program_id = %program_id, error = %e, "Program write failed, transaction rolled back");
        })?;

        info!(program_id = %program_id, rewards = validated.rewards.len(), "Loyalty program created");

        // Committed: a failed reload is not a failed write
        match self.store.load_program(program_id).await {
            Ok(Some(program)) => Ok(program),
            Ok(None) => {
                warn!(program_id = %program_id, "Committed program not visible, returning written state");
                Ok(ProgramAggregate::from_validated(header, &validated, &reward_ids))
            }
            Err(e) => {
                warn!(program_id = %program_id, error = %e, "Reload after commit failed, returning written state");
                Ok(ProgramAggregate::from_validated(header, &validated, &reward_ids))
            }
        }
    }

    /// Reads a program with every sub-entity
    ///
    /// # Errors
    ///
    /// [`LoyaltyError::NotFound`] when no header exists for `id`.
    #[instrument(skip(self), fields(program_id = %id))]
    pub async fn load_program(&self, id: ProgramId) -> Result<ProgramAggregate, LoyaltyError> {
        self.store
            .load_program(id)
            .await
            .map_err(|e| LoyaltyError::persistence("load_program", e))?
            .ok_or(LoyaltyError::NotFound(id))
    }

    /// Reads a program only if it belongs to `organization_id`
    ///
    /// A program owned by another organization is reported as not found.
    pub async fn load_organization_program(
        &self,
        organization_id: OrganizationId,
        id: ProgramId,
    ) -> Result<ProgramAggregate, LoyaltyError> {
        let program = self.load_program(id).await?;
        if program.program.organization_id != organization_id {
            debug!(program_id = %id, organization_id = %organization_id, "Program belongs to another organization");
            return Err(LoyaltyError::NotFound(id));
        }
        Ok(program)
    }

    /// Lists an organization's program headers, newest first
    #[instrument(skip(self), fields(organization_id = %organization_id))]
    pub async fn list_programs(&self, organization_id: OrganizationId) -> Result<Vec<ProgramHeader>, LoyaltyError> {
        self.store
            .list_programs(organization_id)
            .await
            .map_err(|e| LoyaltyError::persistence("list_programs", e))
    }

    /// Health of the underlying store
    pub async fn health(&self) -> HealthCheckResult {
        self.store.health_check().await
    }

    fn timed_out(&self) -> LoyaltyError {
        LoyaltyError::persistence(
            "create_program",
            PortError::Timeout {
                operation: "create_program".to_string(),
                duration_ms: u64::try_from(self.config.transaction_timeout.as_millis()).unwrap_or(u64::MAX),
            },
        )
    }
}

/// Issues every insert of a validated program, parents before dependents
///
/// Returns the generated reward ids in submission order.
async fn write_aggregate(
    tx: &mut dyn ProgramTransaction,
    header: &ProgramHeader,
    program: &ValidatedProgram,
) -> Result<Vec<RewardId>, PortError> {
    let program_id = header.id;
    tx.insert_program(header).await?;

    match &program.config {
        ProgramConfig::Points { rules, wallet } => {
            tx.insert_points_rules(program_id, rules).await?;
            tx.insert_wallet_design(program_id, wallet, None).await?;
        }
        ProgramConfig::Stamps {
            rules,
            wallet,
            stamp_icons,
            accrual_products,
        } => {
            tx.insert_stamps_rules(program_id, rules).await?;
            tx.insert_wallet_design(program_id, wallet, Some(stamp_icons)).await?;
            if !accrual_products.is_empty() {
                tx.insert_accrual_products(program_id, accrual_products).await?;
            }
        }
    }

    let mut reward_ids = Vec::with_capacity(program.rewards.len());
    for (position, reward) in program.rewards.iter().enumerate() {
        let reward_id = RewardId::new_v7();
        let position = i32::try_from(position)
            .map_err(|_| PortError::internal("reward position exceeds i32"))?;

        tx.insert_reward(program_id, reward_id, position, reward).await?;
        tx.insert_reward_cost(reward_id, &reward.cost).await?;
        match &reward.behavior {
            RewardBehavior::Discount(discount) => tx.insert_reward_discount(reward_id, discount).await?,
            RewardBehavior::FreeProduct(lines) => tx.insert_free_products(reward_id, lines).await?,
        }
        reward_ids.push(reward_id);
    }

    debug!(program_id = %program_id, "Program rows staged");
    Ok(reward_ids)
}

async fn rollback(tx: Box<dyn ProgramTransaction>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "Rollback failed");
    }
}
