//! Loyalty program repository
//!
//! Row types and SQL for the nine program tables. Inserts take an explicit
//! connection so the adapter can run all of them inside one transaction;
//! reads run in a read-only REPEATABLE READ transaction so a program is
//! always projected from a single snapshot.
//!
//! Enumerations are bound and read as their wire codes (`TEXT` columns).
//! Queries are built at runtime with `sqlx::query`/`query_as` so the crate
//! compiles without a live database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use domain_loyalty::{
    AccrualItem, BilingualText, DiscountDetails, FreeProductItem, PointsRuleSet, ProductKey,
    ProgramHeader, RewardCost, StampIcons, StampsRuleSet, ValidatedReward, WalletTheme,
};

use crate::error::DatabaseError;

/// Repository for loyalty program rows
#[derive(Debug, Clone)]
pub struct ProgramRepository {
    pool: PgPool,
}

impl ProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub async fn insert_program(conn: &mut PgConnection, header: &ProgramHeader) -> Result<(), DatabaseError> {
        let details = &header.details;
        sqlx::query(
            r#"
            INSERT INTO loyalty_programs (
                id, organization_id, program_type,
                name_en, name_ar, description_en, description_ar,
                terms_en, terms_ar, how_to_use_en, how_to_use_ar,
                status, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(header.id.as_uuid())
        .bind(header.organization_id.as_uuid())
        .bind(header.program_type.as_str())
        .bind(&details.name.en)
        .bind(details.name.ar.as_deref())
        .bind(en(&details.description))
        .bind(ar(&details.description))
        .bind(en(&details.terms))
        .bind(ar(&details.terms))
        .bind(en(&details.how_to_use))
        .bind(ar(&details.how_to_use))
        .bind(details.status.as_str())
        .bind(header.created_by.as_uuid())
        .bind(header.created_at)
        .bind(header.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_points_rules(
        conn: &mut PgConnection,
        program_id: Uuid,
        rules: &PointsRuleSet,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO points_rules (
                program_id, currency, earn_rate, min_spend, rounding_mode,
                redemption_value, tax_percent, expiry_value, expiry_unit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(program_id)
        .bind(&rules.currency)
        .bind(rules.earn_rate)
        .bind(rules.min_spend)
        .bind(rules.rounding_mode.as_str())
        .bind(rules.redemption_value)
        .bind(rules.tax_percent)
        .bind(rules.expiry.map(|e| e.value))
        .bind(rules.expiry.map(|e| e.unit.as_str()))
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_stamps_rules(
        conn: &mut PgConnection,
        program_id: Uuid,
        rules: &StampsRuleSet,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO stamps_rules (
                program_id, stamps_target, accrual_rule, time_restriction_unit,
                time_restriction_value, visit_limit_mode, max_per_window, limit_scope
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(program_id)
        .bind(rules.stamps_target)
        .bind(rules.accrual_rule.as_str())
        .bind(rules.time_restriction_unit.as_str())
        .bind(rules.time_restriction_value)
        .bind(rules.visit_limit_mode.as_str())
        .bind(rules.max_per_window)
        .bind(rules.limit_scope.as_str())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_wallet_design(
        conn: &mut PgConnection,
        program_id: Uuid,
        theme: &WalletTheme,
        stamp_icons: Option<&StampIcons>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO wallet_designs (
                program_id, card_color, title_color, text_color, strip_image_url, logo_url,
                fulfilled_stamp_icon, fulfilled_stamp_color,
                unfulfilled_stamp_icon, unfulfilled_stamp_color
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(program_id)
        .bind(&theme.card_color)
        .bind(theme.title_color.as_deref())
        .bind(theme.text_color.as_deref())
        .bind(theme.strip_image_url.as_deref())
        .bind(theme.logo_url.as_deref())
        .bind(stamp_icons.map(|i| i.fulfilled.icon.as_str()))
        .bind(stamp_icons.map(|i| i.fulfilled.color.as_str()))
        .bind(stamp_icons.map(|i| i.unfulfilled.icon.as_str()))
        .bind(stamp_icons.map(|i| i.unfulfilled.color.as_str()))
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_accrual_products(
        conn: &mut PgConnection,
        program_id: Uuid,
        products: &[AccrualItem],
    ) -> Result<(), DatabaseError> {
        for (position, item) in products.iter().enumerate() {
            let (source, internal_id, external_id) = product_columns(&item.product);
            sqlx::query(
                r#"
                INSERT INTO accrual_products (
                    program_id, position, product_source,
                    internal_product_id, external_product_id, stamps_per_item
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(program_id)
            .bind(position_of(position)?)
            .bind(source)
            .bind(internal_id)
            .bind(external_id)
            .bind(item.stamps_per_item)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn insert_reward(
        conn: &mut PgConnection,
        program_id: Uuid,
        reward_id: Uuid,
        position: i32,
        reward: &ValidatedReward,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO rewards (
                id, program_id, position,
                voucher_name_en, voucher_name_ar,
                voucher_description_en, voucher_description_ar,
                reward_type, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(reward_id)
        .bind(program_id)
        .bind(position)
        .bind(&reward.voucher_name.en)
        .bind(reward.voucher_name.ar.as_deref())
        .bind(en(&reward.voucher_description))
        .bind(ar(&reward.voucher_description))
        .bind(reward.reward_type().as_str())
        .bind(reward.status.as_str())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_reward_cost(
        conn: &mut PgConnection,
        reward_id: Uuid,
        cost: &RewardCost,
    ) -> Result<(), DatabaseError> {
        let (points, stamps) = match *cost {
            RewardCost::Points(points) => (Some(points), None),
            RewardCost::Stamps(stamps) => (None, Some(stamps)),
        };

        sqlx::query("INSERT INTO reward_costs (reward_id, cost_points, cost_stamps) VALUES ($1, $2, $3)")
            .bind(reward_id)
            .bind(points)
            .bind(stamps)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    pub async fn insert_reward_discount(
        conn: &mut PgConnection,
        reward_id: Uuid,
        discount: &DiscountDetails,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO reward_discounts (reward_id, discount_percentage, max_discount_amount, currency)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reward_id)
        .bind(discount.discount_percentage)
        .bind(discount.max_discount_amount)
        .bind(discount.currency.as_deref())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_free_products(
        conn: &mut PgConnection,
        reward_id: Uuid,
        lines: &[FreeProductItem],
    ) -> Result<(), DatabaseError> {
        for (position, line) in lines.iter().enumerate() {
            let (source, internal_id, external_id) = product_columns(&line.product);
            sqlx::query(
                r#"
                INSERT INTO reward_free_products (
                    reward_id, position, product_source,
                    internal_product_id, external_product_id, quantity_free
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(reward_id)
            .bind(position_of(position)?)
            .bind(source)
            .bind(internal_id)
            .bind(external_id)
            .bind(line.quantity_free)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Reads every row of a program from one snapshot
    ///
    /// Returns `Ok(None)` when no header exists.
    pub async fn load(&self, program_id: Uuid) -> Result<Option<ProgramRows>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let program = sqlx::query_as::<_, ProgramRow>(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM loyalty_programs WHERE id = $1"
        ))
        .bind(program_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(program) = program else {
            tx.commit().await?;
            return Ok(None);
        };

        let points_rules = sqlx::query_as::<_, PointsRulesRow>(
            r#"
            SELECT currency, earn_rate, min_spend, rounding_mode, redemption_value,
                   tax_percent, expiry_value, expiry_unit
            FROM points_rules
            WHERE program_id = $1
            "#,
        )
        .bind(program_id)
        .fetch_optional(&mut *tx)
        .await?;

        let stamps_rules = sqlx::query_as::<_, StampsRulesRow>(
            r#"
            SELECT stamps_target, accrual_rule, time_restriction_unit, time_restriction_value,
                   visit_limit_mode, max_per_window, limit_scope
            FROM stamps_rules
            WHERE program_id = $1
            "#,
        )
        .bind(program_id)
        .fetch_optional(&mut *tx)
        .await?;

        let wallet_design = sqlx::query_as::<_, WalletDesignRow>(
            r#"
            SELECT card_color, title_color, text_color, strip_image_url, logo_url,
                   fulfilled_stamp_icon, fulfilled_stamp_color,
                   unfulfilled_stamp_icon, unfulfilled_stamp_color
            FROM wallet_designs
            WHERE program_id = $1
            "#,
        )
        .bind(program_id)
        .fetch_optional(&mut *tx)
        .await?;

        let accrual_products = sqlx::query_as::<_, AccrualProductRow>(
            r#"
            SELECT product_source, internal_product_id, external_product_id, stamps_per_item
            FROM accrual_products
            WHERE program_id = $1
            ORDER BY position
            "#,
        )
        .bind(program_id)
        .fetch_all(&mut *tx)
        .await?;

        let rewards = sqlx::query_as::<_, RewardRow>(
            r#"
            SELECT id, voucher_name_en, voucher_name_ar, voucher_description_en,
                   voucher_description_ar, reward_type, status
            FROM rewards
            WHERE program_id = $1
            ORDER BY position
            "#,
        )
        .bind(program_id)
        .fetch_all(&mut *tx)
        .await?;

        let reward_costs = sqlx::query_as::<_, RewardCostRow>(
            r#"
            SELECT c.reward_id, c.cost_points, c.cost_stamps
            FROM reward_costs c
            JOIN rewards r ON r.id = c.reward_id
            WHERE r.program_id = $1
            "#,
        )
        .bind(program_id)
        .fetch_all(&mut *tx)
        .await?;

        let reward_discounts = sqlx::query_as::<_, RewardDiscountRow>(
            r#"
            SELECT d.reward_id, d.discount_percentage, d.max_discount_amount, d.currency
            FROM reward_discounts d
            JOIN rewards r ON r.id = d.reward_id
            WHERE r.program_id = $1
            "#,
        )
        .bind(program_id)
        .fetch_all(&mut *tx)
        .await?;

        let free_products = sqlx::query_as::<_, FreeProductRow>(
            r#"
            SELECT f.reward_id, f.product_source, f.internal_product_id,
                   f.external_product_id, f.quantity_free
            FROM reward_free_products f
            JOIN rewards r ON r.id = f.reward_id
            WHERE r.program_id = $1
            ORDER BY f.reward_id, f.position
            "#,
        )
        .bind(program_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(ProgramRows {
            program,
            points_rules,
            stamps_rules,
            wallet_design,
            accrual_products,
            rewards,
            reward_costs,
            reward_discounts,
            free_products,
        }))
    }

    /// Lists the program headers of an organization, newest first
    pub async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<ProgramRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ProgramRow>(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM loyalty_programs \
             WHERE organization_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Checks that the database answers queries
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

const PROGRAM_COLUMNS: &str = "id, organization_id, program_type, \
    name_en, name_ar, description_en, description_ar, terms_en, terms_ar, \
    how_to_use_en, how_to_use_ar, status, created_by, created_at, updated_at";

fn en(text: &Option<BilingualText>) -> Option<&str> {
    text.as_ref().map(|t| t.en.as_str())
}

fn ar(text: &Option<BilingualText>) -> Option<&str> {
    text.as_ref().and_then(|t| t.ar.as_deref())
}

fn product_columns(key: &ProductKey) -> (&'static str, Option<Uuid>, Option<&str>) {
    match key {
        ProductKey::Internal(id) => (key.source().as_str(), Some(*id), None),
        ProductKey::Foodics(id) => (key.source().as_str(), None, Some(id.as_str())),
    }
}

fn position_of(index: usize) -> Result<i32, DatabaseError> {
    i32::try_from(index).map_err(|_| DatabaseError::QueryFailed(format!("position {index} exceeds i32")))
}

// ============================================================================
// Row types
// ============================================================================

/// Every row of one program, as read
#[derive(Debug, Clone)]
pub struct ProgramRows {
    pub program: ProgramRow,
    pub points_rules: Option<PointsRulesRow>,
    pub stamps_rules: Option<StampsRulesRow>,
    pub wallet_design: Option<WalletDesignRow>,
    pub accrual_products: Vec<AccrualProductRow>,
    /// Ordered by submission position
    pub rewards: Vec<RewardRow>,
    pub reward_costs: Vec<RewardCostRow>,
    pub reward_discounts: Vec<RewardDiscountRow>,
    pub free_products: Vec<FreeProductRow>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProgramRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub program_type: String,
    pub name_en: String,
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub terms_en: Option<String>,
    pub terms_ar: Option<String>,
    pub how_to_use_en: Option<String>,
    pub how_to_use_ar: Option<String>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PointsRulesRow {
    pub currency: String,
    pub earn_rate: Decimal,
    pub min_spend: Option<Decimal>,
    pub rounding_mode: String,
    pub redemption_value: Decimal,
    pub tax_percent: Decimal,
    pub expiry_value: Option<i32>,
    pub expiry_unit: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct StampsRulesRow {
    pub stamps_target: i32,
    pub accrual_rule: String,
    pub time_restriction_unit: String,
    pub time_restriction_value: Option<i32>,
    pub visit_limit_mode: String,
    pub max_per_window: Option<i32>,
    pub limit_scope: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct WalletDesignRow {
    pub card_color: String,
    pub title_color: Option<String>,
    pub text_color: Option<String>,
    pub strip_image_url: Option<String>,
    pub logo_url: Option<String>,
    pub fulfilled_stamp_icon: Option<String>,
    pub fulfilled_stamp_color: Option<String>,
    pub unfulfilled_stamp_icon: Option<String>,
    pub unfulfilled_stamp_color: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AccrualProductRow {
    pub product_source: String,
    pub internal_product_id: Option<Uuid>,
    pub external_product_id: Option<String>,
    pub stamps_per_item: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct RewardRow {
    pub id: Uuid,
    pub voucher_name_en: String,
    pub voucher_name_ar: Option<String>,
    pub voucher_description_en: Option<String>,
    pub voucher_description_ar: Option<String>,
    pub reward_type: String,
    pub status: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct RewardCostRow {
    pub reward_id: Uuid,
    pub cost_points: Option<i64>,
    pub cost_stamps: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RewardDiscountRow {
    pub reward_id: Uuid,
    pub discount_percentage: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct FreeProductRow {
    pub reward_id: Uuid,
    pub product_source: String,
    pub internal_product_id: Option<Uuid>,
    pub external_product_id: Option<String>,
    pub quantity_free: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_columns_follow_source() {
        let id = Uuid::new_v4();
        assert_eq!(
            product_columns(&ProductKey::Internal(id)),
            ("INTERNAL", Some(id), None)
        );

        let key = ProductKey::Foodics("fd-1".to_string());
        assert_eq!(product_columns(&key), ("FOODICS", None, Some("fd-1")));
    }

    #[test]
    fn test_bilingual_columns() {
        let text = Some(BilingualText::en("Terms").with_ar("الشروط"));
        assert_eq!(en(&text), Some("Terms"));
        assert_eq!(ar(&text), Some("الشروط"));
        assert_eq!(ar(&Some(BilingualText::en("Terms"))), None);
        assert_eq!(en(&None), None);
    }
}
