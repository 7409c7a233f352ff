//! PostgreSQL Program Store Adapter
//!
//! Implements the loyalty domain's `ProgramStore` port on top of the
//! [`ProgramRepository`]. A [`PgProgramTransaction`] owns one SQLx
//! transaction for the whole aggregate write; dropping it without a commit
//! rolls back every row.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresProgramStore;
//! use domain_loyalty::{ProgramService, ProgramStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ProgramStore> = Arc::new(PostgresProgramStore::new(pool));
//! let service = ProgramService::new(store);
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, OrganizationId, PortError,
    ProgramId, RewardId, UserId,
};
use domain_loyalty::{
    AccrualItem, AccrualProduct, BilingualText, DiscountDetails, ExpiryDuration, FreeProductItem,
    FreeProductLine, PointsRuleSet, ProductRef, ProductSource, ProgramAggregate, ProgramDetails,
    ProgramHeader, ProgramStore, ProgramTransaction, RewardCost, RewardCostInput, RewardView,
    StampIcon, StampIcons, StampsRuleSet, ValidatedReward, WalletDesign, WalletTheme,
};

use crate::repositories::program::{
    AccrualProductRow, FreeProductRow, PointsRulesRow, ProgramRepository, ProgramRow, ProgramRows,
    RewardCostRow, RewardDiscountRow, RewardRow, StampsRulesRow, WalletDesignRow,
};

/// PostgreSQL-backed implementation of the `ProgramStore` port
#[derive(Debug, Clone)]
pub struct PostgresProgramStore {
    repository: ProgramRepository,
    pool: PgPool,
}

impl PostgresProgramStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ProgramRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresProgramStore {}

#[async_trait]
impl HealthCheckable for PostgresProgramStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = self.repository.ping().await;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status, message) = match result {
            Ok(()) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: "postgres-program-store".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ProgramStore for PostgresProgramStore {
    async fn begin(&self) -> Result<Box<dyn ProgramTransaction>, PortError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::from(crate::DatabaseError::from(e)))?;
        Ok(Box::new(PgProgramTransaction { tx }))
    }

    #[instrument(skip(self), fields(program_id = %id))]
    async fn load_program(&self, id: ProgramId) -> Result<Option<ProgramAggregate>, PortError> {
        let rows = self.repository.load(*id.as_uuid()).await?;
        rows.map(rows_to_aggregate).transpose()
    }

    #[instrument(skip(self), fields(organization_id = %organization_id))]
    async fn list_programs(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<ProgramHeader>, PortError> {
        let rows = self
            .repository
            .list_by_organization(*organization_id.as_uuid())
            .await?;
        debug!(count = rows.len(), "Listed program headers");
        rows.into_iter().map(row_to_header).collect()
    }
}

/// One SQLx transaction spanning every insert of a program
pub struct PgProgramTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProgramTransaction for PgProgramTransaction {
    async fn insert_program(&mut self, header: &ProgramHeader) -> Result<(), PortError> {
        ProgramRepository::insert_program(&mut self.tx, header).await?;
        Ok(())
    }

    async fn insert_points_rules(
        &mut self,
        program_id: ProgramId,
        rules: &PointsRuleSet,
    ) -> Result<(), PortError> {
        ProgramRepository::insert_points_rules(&mut self.tx, *program_id.as_uuid(), rules).await?;
        Ok(())
    }

    async fn insert_stamps_rules(
        &mut self,
        program_id: ProgramId,
        rules: &StampsRuleSet,
    ) -> Result<(), PortError> {
        ProgramRepository::insert_stamps_rules(&mut self.tx, *program_id.as_uuid(), rules).await?;
        Ok(())
    }

    async fn insert_wallet_design(
        &mut self,
        program_id: ProgramId,
        theme: &WalletTheme,
        stamp_icons: Option<&StampIcons>,
    ) -> Result<(), PortError> {
        ProgramRepository::insert_wallet_design(&mut self.tx, *program_id.as_uuid(), theme, stamp_icons)
            .await?;
        Ok(())
    }

    async fn insert_accrual_products(
        &mut self,
        program_id: ProgramId,
        products: &[AccrualItem],
    ) -> Result<(), PortError> {
        ProgramRepository::insert_accrual_products(&mut self.tx, *program_id.as_uuid(), products).await?;
        Ok(())
    }

    async fn insert_reward(
        &mut self,
        program_id: ProgramId,
        reward_id: RewardId,
        position: i32,
        reward: &ValidatedReward,
    ) -> Result<(), PortError> {
        ProgramRepository::insert_reward(
            &mut self.tx,
            *program_id.as_uuid(),
            *reward_id.as_uuid(),
            position,
            reward,
        )
        .await?;
        Ok(())
    }

    async fn insert_reward_cost(&mut self, reward_id: RewardId, cost: &RewardCost) -> Result<(), PortError> {
        ProgramRepository::insert_reward_cost(&mut self.tx, *reward_id.as_uuid(), cost).await?;
        Ok(())
    }

    async fn insert_reward_discount(
        &mut self,
        reward_id: RewardId,
        discount: &DiscountDetails,
    ) -> Result<(), PortError> {
        ProgramRepository::insert_reward_discount(&mut self.tx, *reward_id.as_uuid(), discount).await?;
        Ok(())
    }

    async fn insert_free_products(
        &mut self,
        reward_id: RewardId,
        lines: &[FreeProductItem],
    ) -> Result<(), PortError> {
        ProgramRepository::insert_free_products(&mut self.tx, *reward_id.as_uuid(), lines).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx
            .commit()
            .await
            .map_err(|e| PortError::from(crate::DatabaseError::from(e)))
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| PortError::from(crate::DatabaseError::from(e)))
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn code<T>(value: &str) -> Result<T, PortError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| PortError::transformation(e.to_string()))
}

fn bilingual(en: Option<String>, ar: Option<String>) -> Option<BilingualText> {
    en.map(|en| BilingualText { en, ar })
}

fn product_ref(
    source: &str,
    internal_product_id: Option<Uuid>,
    external_product_id: Option<String>,
) -> Result<ProductRef, PortError> {
    Ok(ProductRef {
        product_source: code::<ProductSource>(source)?,
        internal_product_id,
        external_product_id,
    })
}

fn row_to_header(row: ProgramRow) -> Result<ProgramHeader, PortError> {
    Ok(ProgramHeader {
        id: ProgramId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        program_type: code(&row.program_type)?,
        details: ProgramDetails {
            name: BilingualText {
                en: row.name_en,
                ar: row.name_ar,
            },
            description: bilingual(row.description_en, row.description_ar),
            terms: bilingual(row.terms_en, row.terms_ar),
            how_to_use: bilingual(row.how_to_use_en, row.how_to_use_ar),
            status: code(&row.status)?,
        },
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_points_rules(row: PointsRulesRow) -> Result<PointsRuleSet, PortError> {
    let expiry = match (row.expiry_value, row.expiry_unit) {
        (Some(value), Some(unit)) => Some(ExpiryDuration {
            value,
            unit: code(&unit)?,
        }),
        _ => None,
    };

    Ok(PointsRuleSet {
        currency: row.currency,
        earn_rate: row.earn_rate,
        min_spend: row.min_spend,
        rounding_mode: code(&row.rounding_mode)?,
        redemption_value: row.redemption_value,
        tax_percent: row.tax_percent,
        expiry,
    })
}

fn row_to_stamps_rules(row: StampsRulesRow) -> Result<StampsRuleSet, PortError> {
    Ok(StampsRuleSet {
        stamps_target: row.stamps_target,
        accrual_rule: code(&row.accrual_rule)?,
        time_restriction_unit: code(&row.time_restriction_unit)?,
        time_restriction_value: row.time_restriction_value,
        visit_limit_mode: code(&row.visit_limit_mode)?,
        max_per_window: row.max_per_window,
        limit_scope: code(&row.limit_scope)?,
    })
}

fn row_to_wallet_design(row: WalletDesignRow) -> WalletDesign {
    let stamp_icons = match (
        row.fulfilled_stamp_icon,
        row.fulfilled_stamp_color,
        row.unfulfilled_stamp_icon,
        row.unfulfilled_stamp_color,
    ) {
        (Some(fulfilled_icon), Some(fulfilled_color), Some(unfulfilled_icon), Some(unfulfilled_color)) => {
            Some(StampIcons {
                fulfilled: StampIcon {
                    icon: fulfilled_icon,
                    color: fulfilled_color,
                },
                unfulfilled: StampIcon {
                    icon: unfulfilled_icon,
                    color: unfulfilled_color,
                },
            })
        }
        _ => None,
    };

    WalletDesign {
        theme: WalletTheme {
            card_color: row.card_color,
            title_color: row.title_color,
            text_color: row.text_color,
            strip_image_url: row.strip_image_url,
            logo_url: row.logo_url,
        },
        stamp_icons,
    }
}

fn row_to_accrual_product(row: AccrualProductRow) -> Result<AccrualProduct, PortError> {
    Ok(AccrualProduct {
        product: product_ref(&row.product_source, row.internal_product_id, row.external_product_id)?,
        stamps_per_item: row.stamps_per_item,
    })
}

fn row_to_cost(row: RewardCostRow) -> RewardCostInput {
    RewardCostInput {
        cost_points: row.cost_points,
        cost_stamps: row.cost_stamps,
    }
}

fn row_to_discount(row: RewardDiscountRow) -> DiscountDetails {
    DiscountDetails {
        discount_percentage: row.discount_percentage,
        max_discount_amount: row.max_discount_amount,
        currency: row.currency,
    }
}

fn row_to_free_product(row: FreeProductRow) -> Result<FreeProductLine, PortError> {
    Ok(FreeProductLine {
        product: product_ref(&row.product_source, row.internal_product_id, row.external_product_id)?,
        quantity_free: row.quantity_free,
    })
}

fn row_to_reward(
    row: RewardRow,
    program_id: ProgramId,
    costs: &mut HashMap<Uuid, RewardCostInput>,
    discounts: &mut HashMap<Uuid, DiscountDetails>,
    free_products: &mut HashMap<Uuid, Vec<FreeProductLine>>,
) -> Result<RewardView, PortError> {
    Ok(RewardView {
        id: RewardId::from_uuid(row.id),
        program_id,
        voucher_name: BilingualText {
            en: row.voucher_name_en,
            ar: row.voucher_name_ar,
        },
        voucher_description: bilingual(row.voucher_description_en, row.voucher_description_ar),
        reward_type: code(&row.reward_type)?,
        status: code(&row.status)?,
        cost: costs.remove(&row.id),
        discount: discounts.remove(&row.id),
        free_products: free_products.remove(&row.id).unwrap_or_default(),
    })
}

fn rows_to_aggregate(rows: ProgramRows) -> Result<ProgramAggregate, PortError> {
    let program = row_to_header(rows.program)?;
    let program_id = program.id;

    let mut costs: HashMap<Uuid, RewardCostInput> = rows
        .reward_costs
        .into_iter()
        .map(|row| (row.reward_id, row_to_cost(row)))
        .collect();
    let mut discounts: HashMap<Uuid, DiscountDetails> = rows
        .reward_discounts
        .into_iter()
        .map(|row| (row.reward_id, row_to_discount(row)))
        .collect();
    let mut free_products: HashMap<Uuid, Vec<FreeProductLine>> = HashMap::new();
    for row in rows.free_products {
        let reward_id = row.reward_id;
        free_products
            .entry(reward_id)
            .or_default()
            .push(row_to_free_product(row)?);
    }

    let rewards = rows
        .rewards
        .into_iter()
        .map(|row| row_to_reward(row, program_id, &mut costs, &mut discounts, &mut free_products))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProgramAggregate {
        program,
        points_rules: rows.points_rules.map(row_to_points_rules).transpose()?,
        stamps_rules: rows.stamps_rules.map(row_to_stamps_rules).transpose()?,
        wallet_design: rows.wallet_design.map(row_to_wallet_design),
        accrual_products: rows
            .accrual_products
            .into_iter()
            .map(row_to_accrual_product)
            .collect::<Result<Vec<_>, _>>()?,
        rewards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_loyalty::{ProgramType, RewardType};
    use rust_decimal_macros::dec;

    fn program_row() -> ProgramRow {
        ProgramRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            program_type: "POINTS".to_string(),
            name_en: "Coffee Points".to_string(),
            name_ar: None,
            description_en: Some("Earn with every visit".to_string()),
            description_ar: Some("اكسب مع كل زيارة".to_string()),
            terms_en: None,
            terms_ar: None,
            how_to_use_en: None,
            how_to_use_ar: None,
            status: "ACTIVE".to_string(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn reward_row(id: Uuid) -> RewardRow {
        RewardRow {
            id,
            voucher_name_en: "20% off".to_string(),
            voucher_name_ar: None,
            voucher_description_en: None,
            voucher_description_ar: None,
            reward_type: "DISCOUNT".to_string(),
            status: "ACTIVE".to_string(),
        }
    }

    fn rows(program: ProgramRow, rewards: Vec<RewardRow>) -> ProgramRows {
        ProgramRows {
            program,
            points_rules: None,
            stamps_rules: None,
            wallet_design: None,
            accrual_products: vec![],
            rewards,
            reward_costs: vec![],
            reward_discounts: vec![],
            free_products: vec![],
        }
    }

    #[test]
    fn test_header_maps_codes_and_bilingual_text() {
        let header = row_to_header(program_row()).unwrap();

        assert_eq!(header.program_type, ProgramType::Points);
        assert_eq!(header.details.name.ar, None);
        assert_eq!(
            header.details.description.unwrap().ar.as_deref(),
            Some("اكسب مع كل زيارة")
        );
        assert!(header.details.terms.is_none());
    }

    #[test]
    fn test_unknown_stored_code_is_transformation_error() {
        let mut row = program_row();
        row.program_type = "TIERS".to_string();

        let err = row_to_header(row).unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }

    #[test]
    fn test_reward_sub_rows_attach_to_their_reward() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut rows = rows(program_row(), vec![reward_row(first), reward_row(second)]);
        rows.reward_costs = vec![RewardCostRow {
            reward_id: second,
            cost_points: Some(100),
            cost_stamps: None,
        }];
        rows.reward_discounts = vec![RewardDiscountRow {
            reward_id: second,
            discount_percentage: dec!(20),
            max_discount_amount: None,
            currency: Some("SAR".to_string()),
        }];

        let aggregate = rows_to_aggregate(rows).unwrap();

        assert_eq!(aggregate.rewards.len(), 2);
        assert_eq!(aggregate.rewards[0].id, RewardId::from_uuid(first));
        assert!(aggregate.rewards[0].cost.is_none());
        assert!(aggregate.rewards[0].discount.is_none());
        assert_eq!(aggregate.rewards[1].reward_type, RewardType::Discount);
        assert_eq!(aggregate.rewards[1].cost.and_then(|c| c.cost_points), Some(100));
        assert_eq!(
            aggregate.rewards[1].discount.as_ref().map(|d| d.discount_percentage),
            Some(dec!(20))
        );
    }

    #[test]
    fn test_partial_stamp_icon_columns_project_no_icons() {
        let wallet = row_to_wallet_design(WalletDesignRow {
            card_color: "#000000".to_string(),
            title_color: None,
            text_color: None,
            strip_image_url: None,
            logo_url: None,
            fulfilled_stamp_icon: Some("cup".to_string()),
            fulfilled_stamp_color: None,
            unfulfilled_stamp_icon: None,
            unfulfilled_stamp_color: None,
        });
        assert!(wallet.stamp_icons.is_none());
    }
}
