//! Loyalty Program Store Port
//!
//! The [`ProgramStore`] trait is everything the loyalty service needs from
//! persistence. Writes happen inside a [`ProgramTransaction`]: the Aggregate
//! Constructor issues one insert per sub-entity and then commits, so either
//! every row of a program becomes visible or none does.
//!
//! # Adapters
//!
//! - **PostgreSQL**: `infra_db::PostgresProgramStore`
//! - **In-memory**: [`mock::InMemoryProgramStore`] behind the `mock` feature,
//!   with failure injection for atomicity tests
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! tx.insert_program(&header).await?;
//! tx.insert_points_rules(header.id, &rules).await?;
//! tx.commit().await?;
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, OrganizationId, PortError, ProgramId, RewardId};

use crate::aggregate::ProgramAggregate;
use crate::program::ProgramHeader;
use crate::reward::DiscountDetails;
use crate::validated::{
    AccrualItem, FreeProductItem, PointsRuleSet, RewardCost, StampsRuleSet, ValidatedReward,
};
use crate::wallet::{StampIcons, WalletTheme};

/// Persistence port for loyalty programs
#[async_trait]
pub trait ProgramStore: DomainPort + HealthCheckable {
    /// Opens a write transaction
    async fn begin(&self) -> Result<Box<dyn ProgramTransaction>, PortError>;

    /// Reads the header and every sub-entity of a program
    ///
    /// Returns `Ok(None)` when no header exists for the id.
    async fn load_program(&self, id: ProgramId) -> Result<Option<ProgramAggregate>, PortError>;

    /// Lists the program headers of an organization, newest first
    async fn list_programs(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<ProgramHeader>, PortError>;
}

/// Unit of work spanning every insert of one program
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait ProgramTransaction: Send {
    async fn insert_program(&mut self, header: &ProgramHeader) -> Result<(), PortError>;

    async fn insert_points_rules(
        &mut self,
        program_id: ProgramId,
        rules: &PointsRuleSet,
    ) -> Result<(), PortError>;

    async fn insert_stamps_rules(
        &mut self,
        program_id: ProgramId,
        rules: &StampsRuleSet,
    ) -> Result<(), PortError>;

    /// Writes the wallet design; `stamp_icons` is set for STAMPS programs only
    async fn insert_wallet_design(
        &mut self,
        program_id: ProgramId,
        theme: &WalletTheme,
        stamp_icons: Option<&StampIcons>,
    ) -> Result<(), PortError>;

    async fn insert_accrual_products(
        &mut self,
        program_id: ProgramId,
        products: &[AccrualItem],
    ) -> Result<(), PortError>;

    /// Writes the reward row itself; `position` preserves submission order
    async fn insert_reward(
        &mut self,
        program_id: ProgramId,
        reward_id: RewardId,
        position: i32,
        reward: &ValidatedReward,
    ) -> Result<(), PortError>;

    async fn insert_reward_cost(&mut self, reward_id: RewardId, cost: &RewardCost) -> Result<(), PortError>;

    async fn insert_reward_discount(
        &mut self,
        reward_id: RewardId,
        discount: &DiscountDetails,
    ) -> Result<(), PortError>;

    async fn insert_free_products(
        &mut self,
        reward_id: RewardId,
        lines: &[FreeProductItem],
    ) -> Result<(), PortError>;

    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}

/// In-memory program store for tests
///
/// Committed rows live in shared tables; each transaction stages its rows
/// separately and merges them on commit. Constraints mirror the relational
/// schema: a header needs a known organization, and every dependent row
/// needs its parent staged in the same transaction.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    use crate::aggregate::RewardView;
    use crate::program::BilingualText;
    use crate::reward::{RewardStatus, RewardType};
    use crate::wallet::WalletDesign;

    /// Write operations that can be made to fail
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum WriteStep {
        Program,
        PointsRules,
        StampsRules,
        WalletDesign,
        AccrualProducts,
        Reward,
        RewardCost,
        RewardDiscount,
        FreeProducts,
        Commit,
    }

    #[derive(Debug)]
    struct Fault {
        step: WriteStep,
        /// 1-based occurrence of `step` that fails
        occurrence: usize,
        seen: AtomicUsize,
    }

    #[derive(Debug, Clone)]
    struct RewardRow {
        id: RewardId,
        program_id: ProgramId,
        position: i32,
        voucher_name: BilingualText,
        voucher_description: Option<BilingualText>,
        reward_type: RewardType,
        status: RewardStatus,
    }

    #[derive(Debug, Clone, Default)]
    struct Tables {
        programs: HashMap<ProgramId, ProgramHeader>,
        points_rules: HashMap<ProgramId, PointsRuleSet>,
        stamps_rules: HashMap<ProgramId, StampsRuleSet>,
        wallet_designs: HashMap<ProgramId, (WalletTheme, Option<StampIcons>)>,
        accrual_products: HashMap<ProgramId, Vec<AccrualItem>>,
        rewards: Vec<RewardRow>,
        reward_costs: HashMap<RewardId, RewardCost>,
        reward_discounts: HashMap<RewardId, DiscountDetails>,
        free_products: HashMap<RewardId, Vec<FreeProductItem>>,
    }

    impl Tables {
        fn row_count(&self) -> usize {
            self.programs.len()
                + self.points_rules.len()
                + self.stamps_rules.len()
                + self.wallet_designs.len()
                + self.accrual_products.values().map(Vec::len).sum::<usize>()
                + self.rewards.len()
                + self.reward_costs.len()
                + self.reward_discounts.len()
                + self.free_products.values().map(Vec::len).sum::<usize>()
        }

        fn has_reward(&self, reward_id: RewardId) -> bool {
            self.rewards.iter().any(|r| r.id == reward_id)
        }

        fn merge(&mut self, staged: Tables) {
            self.programs.extend(staged.programs);
            self.points_rules.extend(staged.points_rules);
            self.stamps_rules.extend(staged.stamps_rules);
            self.wallet_designs.extend(staged.wallet_designs);
            self.accrual_products.extend(staged.accrual_products);
            self.rewards.extend(staged.rewards);
            self.reward_costs.extend(staged.reward_costs);
            self.reward_discounts.extend(staged.reward_discounts);
            self.free_products.extend(staged.free_products);
        }

        fn project(&self, id: ProgramId) -> Option<ProgramAggregate> {
            let program = self.programs.get(&id)?.clone();

            let mut rows: Vec<&RewardRow> = self.rewards.iter().filter(|r| r.program_id == id).collect();
            rows.sort_by_key(|r| r.position);

            let rewards = rows
                .into_iter()
                .map(|row| RewardView {
                    id: row.id,
                    program_id: row.program_id,
                    voucher_name: row.voucher_name.clone(),
                    voucher_description: row.voucher_description.clone(),
                    reward_type: row.reward_type,
                    status: row.status,
                    cost: self.reward_costs.get(&row.id).copied().map(Into::into),
                    discount: self.reward_discounts.get(&row.id).cloned(),
                    free_products: self
                        .free_products
                        .get(&row.id)
                        .map(|lines| lines.iter().map(Into::into).collect())
                        .unwrap_or_default(),
                })
                .collect();

            Some(ProgramAggregate {
                program,
                points_rules: self.points_rules.get(&id).cloned(),
                stamps_rules: self.stamps_rules.get(&id).cloned(),
                wallet_design: self.wallet_designs.get(&id).map(|(theme, stamp_icons)| WalletDesign {
                    theme: theme.clone(),
                    stamp_icons: stamp_icons.clone(),
                }),
                accrual_products: self
                    .accrual_products
                    .get(&id)
                    .map(|items| items.iter().map(Into::into).collect())
                    .unwrap_or_default(),
                rewards,
            })
        }
    }

    /// In-memory implementation of [`ProgramStore`]
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryProgramStore {
        committed: Arc<RwLock<Tables>>,
        organizations: HashSet<OrganizationId>,
        fault: Option<Arc<Fault>>,
        step_delay: Option<Duration>,
        commit_delay: Option<Duration>,
        reads_failing: Arc<AtomicBool>,
        rollbacks: Arc<AtomicUsize>,
    }

    impl InMemoryProgramStore {
        /// Creates an empty store that knows no organization
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a store that knows a single organization
        pub fn for_organization(organization_id: OrganizationId) -> Self {
            Self::new().with_organization(organization_id)
        }

        /// Registers an organization programs may reference
        pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
            self.organizations.insert(organization_id);
            self
        }

        /// Makes the `occurrence`-th execution of `step` fail
        pub fn failing_at(mut self, step: WriteStep, occurrence: usize) -> Self {
            self.fault = Some(Arc::new(Fault {
                step,
                occurrence,
                seen: AtomicUsize::new(0),
            }));
            self
        }

        /// Delays every write step
        pub fn with_step_delay(mut self, delay: Duration) -> Self {
            self.step_delay = Some(delay);
            self
        }

        /// Delays the commit after every write step has succeeded
        pub fn with_commit_delay(mut self, delay: Duration) -> Self {
            self.commit_delay = Some(delay);
            self
        }

        /// Makes `load_program` fail with a connection error while set
        ///
        /// Shared by every clone of the store.
        pub fn set_reads_failing(&self, failing: bool) {
            self.reads_failing.store(failing, Ordering::SeqCst);
        }

        /// Number of committed rows across every table
        pub async fn row_count(&self) -> usize {
            self.committed.read().await.row_count()
        }

        /// Number of transactions rolled back explicitly
        pub fn rollback_count(&self) -> usize {
            self.rollbacks.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for InMemoryProgramStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryProgramStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-program-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("In-memory store always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl ProgramStore for InMemoryProgramStore {
        async fn begin(&self) -> Result<Box<dyn ProgramTransaction>, PortError> {
            Ok(Box::new(InMemoryTransaction {
                committed: Arc::clone(&self.committed),
                staged: Tables::default(),
                organizations: self.organizations.clone(),
                fault: self.fault.clone(),
                step_delay: self.step_delay,
                commit_delay: self.commit_delay,
                rollbacks: Arc::clone(&self.rollbacks),
            }))
        }

        async fn load_program(&self, id: ProgramId) -> Result<Option<ProgramAggregate>, PortError> {
            if self.reads_failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("in-memory reads disabled"));
            }
            Ok(self.committed.read().await.project(id))
        }

        async fn list_programs(
            &self,
            organization_id: OrganizationId,
        ) -> Result<Vec<ProgramHeader>, PortError> {
            let tables = self.committed.read().await;
            let mut headers: Vec<ProgramHeader> = tables
                .programs
                .values()
                .filter(|p| p.organization_id == organization_id)
                .cloned()
                .collect();
            headers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(headers)
        }
    }

    struct InMemoryTransaction {
        committed: Arc<RwLock<Tables>>,
        staged: Tables,
        organizations: HashSet<OrganizationId>,
        fault: Option<Arc<Fault>>,
        step_delay: Option<Duration>,
        commit_delay: Option<Duration>,
        rollbacks: Arc<AtomicUsize>,
    }

    impl InMemoryTransaction {
        async fn enter(&self, step: WriteStep) -> Result<(), PortError> {
            if let Some(delay) = self.step_delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(fault) = self.fault.as_ref().filter(|f| f.step == step) {
                let seen = fault.seen.fetch_add(1, Ordering::SeqCst) + 1;
                if seen == fault.occurrence {
                    return Err(PortError::connection(format!("injected failure at {step:?}")));
                }
            }

            Ok(())
        }

        fn require_program(&self, program_id: ProgramId, table: &str) -> Result<(), PortError> {
            if self.staged.programs.contains_key(&program_id) {
                Ok(())
            } else {
                Err(PortError::constraint(format!(
                    "{table} references missing program {program_id}"
                )))
            }
        }

        fn require_reward(&self, reward_id: RewardId, table: &str) -> Result<(), PortError> {
            if self.staged.has_reward(reward_id) {
                Ok(())
            } else {
                Err(PortError::constraint(format!(
                    "{table} references missing reward {reward_id}"
                )))
            }
        }
    }

    #[async_trait]
    impl ProgramTransaction for InMemoryTransaction {
        async fn insert_program(&mut self, header: &ProgramHeader) -> Result<(), PortError> {
            self.enter(WriteStep::Program).await?;

            if !self.organizations.contains(&header.organization_id) {
                return Err(PortError::constraint(format!(
                    "loyalty_programs references missing organization {}",
                    header.organization_id
                )));
            }
            if self.staged.programs.contains_key(&header.id)
                || self.committed.read().await.programs.contains_key(&header.id)
            {
                return Err(PortError::constraint(format!("duplicate program id {}", header.id)));
            }

            self.staged.programs.insert(header.id, header.clone());
            Ok(())
        }

        async fn insert_points_rules(
            &mut self,
            program_id: ProgramId,
            rules: &PointsRuleSet,
        ) -> Result<(), PortError> {
            self.enter(WriteStep::PointsRules).await?;
            self.require_program(program_id, "points_rules")?;
            if self.staged.points_rules.insert(program_id, rules.clone()).is_some() {
                return Err(PortError::constraint(format!("duplicate points rules for {program_id}")));
            }
            Ok(())
        }

        async fn insert_stamps_rules(
            &mut self,
            program_id: ProgramId,
            rules: &StampsRuleSet,
        ) -> Result<(), PortError> {
            self.enter(WriteStep::StampsRules).await?;
            self.require_program(program_id, "stamps_rules")?;
            if self.staged.stamps_rules.insert(program_id, rules.clone()).is_some() {
                return Err(PortError::constraint(format!("duplicate stamps rules for {program_id}")));
            }
            Ok(())
        }

        async fn insert_wallet_design(
            &mut self,
            program_id: ProgramId,
            theme: &WalletTheme,
            stamp_icons: Option<&StampIcons>,
        ) -> Result<(), PortError> {
            self.enter(WriteStep::WalletDesign).await?;
            self.require_program(program_id, "wallet_designs")?;
            let row = (theme.clone(), stamp_icons.cloned());
            if self.staged.wallet_designs.insert(program_id, row).is_some() {
                return Err(PortError::constraint(format!("duplicate wallet design for {program_id}")));
            }
            Ok(())
        }

        async fn insert_accrual_products(
            &mut self,
            program_id: ProgramId,
            products: &[AccrualItem],
        ) -> Result<(), PortError> {
            self.enter(WriteStep::AccrualProducts).await?;
            self.require_program(program_id, "accrual_products")?;
            self.staged
                .accrual_products
                .entry(program_id)
                .or_default()
                .extend_from_slice(products);
            Ok(())
        }

        async fn insert_reward(
            &mut self,
            program_id: ProgramId,
            reward_id: RewardId,
            position: i32,
            reward: &ValidatedReward,
        ) -> Result<(), PortError> {
            self.enter(WriteStep::Reward).await?;
            self.require_program(program_id, "rewards")?;
            if self.staged.has_reward(reward_id) {
                return Err(PortError::constraint(format!("duplicate reward id {reward_id}")));
            }
            self.staged.rewards.push(RewardRow {
                id: reward_id,
                program_id,
                position,
                voucher_name: reward.voucher_name.clone(),
                voucher_description: reward.voucher_description.clone(),
                reward_type: reward.reward_type(),
                status: reward.status,
            });
            Ok(())
        }

        async fn insert_reward_cost(&mut self, reward_id: RewardId, cost: &RewardCost) -> Result<(), PortError> {
            self.enter(WriteStep::RewardCost).await?;
            self.require_reward(reward_id, "reward_costs")?;
            if self.staged.reward_costs.insert(reward_id, *cost).is_some() {
                return Err(PortError::constraint(format!("duplicate cost for reward {reward_id}")));
            }
            Ok(())
        }

        async fn insert_reward_discount(
            &mut self,
            reward_id: RewardId,
            discount: &DiscountDetails,
        ) -> Result<(), PortError> {
            self.enter(WriteStep::RewardDiscount).await?;
            self.require_reward(reward_id, "reward_discounts")?;
            if self.staged.reward_discounts.insert(reward_id, discount.clone()).is_some() {
                return Err(PortError::constraint(format!("duplicate discount for reward {reward_id}")));
            }
            Ok(())
        }

        async fn insert_free_products(
            &mut self,
            reward_id: RewardId,
            lines: &[FreeProductItem],
        ) -> Result<(), PortError> {
            self.enter(WriteStep::FreeProducts).await?;
            self.require_reward(reward_id, "reward_free_products")?;
            self.staged
                .free_products
                .entry(reward_id)
                .or_default()
                .extend_from_slice(lines);
            Ok(())
        }

        async fn commit(self: Box<Self>) -> Result<(), PortError> {
            self.enter(WriteStep::Commit).await?;
            if let Some(delay) = self.commit_delay {
                tokio::time::sleep(delay).await;
            }
            let this = *self;
            this.committed.write().await.merge(this.staged);
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), PortError> {
            self.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
