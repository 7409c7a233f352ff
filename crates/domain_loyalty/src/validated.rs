//! Validated write model
//!
//! Only the Program Type Policy constructs these types. Each one is the
//! type-matched shape of a submitted section, so the Aggregate Constructor
//! writes them by pattern matching on the variant and never re-checks a
//! business rule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::{ProductKey, ProductRef};
use crate::program::{BilingualText, ProgramDetails, ProgramType};
use crate::reward::{DiscountDetails, FreeProductLine, RewardCostInput, RewardStatus, RewardType};
use crate::rules::{
    AccrualProduct, AccrualRule, ExpiryDuration, LimitScope, RoundingMode, TimeRestrictionUnit,
    VisitLimitMode,
};
use crate::wallet::{StampIcons, WalletTheme};

/// Points rule set with every business rule satisfied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsRuleSet {
    pub currency: String,
    pub earn_rate: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_spend: Option<Decimal>,
    pub rounding_mode: RoundingMode,
    pub redemption_value: Decimal,
    pub tax_percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<ExpiryDuration>,
}

/// Stamps rule set with every business rule satisfied
///
/// `time_restriction_value` is populated iff the unit is not `NONE`, and
/// `max_per_window` iff the mode is `MAX_PER_WINDOW`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampsRuleSet {
    pub stamps_target: i32,
    pub accrual_rule: AccrualRule,
    pub time_restriction_unit: TimeRestrictionUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_restriction_value: Option<i32>,
    pub visit_limit_mode: VisitLimitMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_per_window: Option<i32>,
    pub limit_scope: LimitScope,
}

/// Accrual product with a resolved product identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualItem {
    pub product: ProductKey,
    pub stamps_per_item: i32,
}

impl From<&AccrualItem> for AccrualProduct {
    fn from(item: &AccrualItem) -> Self {
        AccrualProduct {
            product: ProductRef::from(&item.product),
            stamps_per_item: item.stamps_per_item,
        }
    }
}

/// Free-product line with a resolved product identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeProductItem {
    pub product: ProductKey,
    pub quantity_free: i32,
}

impl From<&FreeProductItem> for FreeProductLine {
    fn from(item: &FreeProductItem) -> Self {
        FreeProductLine {
            product: ProductRef::from(&item.product),
            quantity_free: item.quantity_free,
        }
    }
}

/// Type-matched rule set, wallet, and accrual products
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramConfig {
    Points {
        rules: PointsRuleSet,
        wallet: WalletTheme,
    },
    Stamps {
        rules: StampsRuleSet,
        wallet: WalletTheme,
        stamp_icons: StampIcons,
        /// Non-empty iff the accrual rule is PER_ITEM
        accrual_products: Vec<AccrualItem>,
    },
}

impl ProgramConfig {
    pub fn program_type(&self) -> ProgramType {
        match self {
            ProgramConfig::Points { .. } => ProgramType::Points,
            ProgramConfig::Stamps { .. } => ProgramType::Stamps,
        }
    }
}

/// Cost matching the program type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardCost {
    Points(i64),
    Stamps(i32),
}

impl From<RewardCost> for RewardCostInput {
    fn from(cost: RewardCost) -> Self {
        match cost {
            RewardCost::Points(points) => RewardCostInput {
                cost_points: Some(points),
                cost_stamps: None,
            },
            RewardCost::Stamps(stamps) => RewardCostInput {
                cost_points: None,
                cost_stamps: Some(stamps),
            },
        }
    }
}

/// Behavior matching the reward type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardBehavior {
    Discount(DiscountDetails),
    /// At least one line
    FreeProduct(Vec<FreeProductItem>),
}

/// Reward with a type-matched cost and behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReward {
    pub voucher_name: BilingualText,
    pub voucher_description: Option<BilingualText>,
    pub status: RewardStatus,
    pub cost: RewardCost,
    pub behavior: RewardBehavior,
}

impl ValidatedReward {
    pub fn reward_type(&self) -> RewardType {
        match self.behavior {
            RewardBehavior::Discount(_) => RewardType::Discount,
            RewardBehavior::FreeProduct(_) => RewardType::FreeProduct,
        }
    }
}

/// Program definition accepted by the Program Type Policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProgram {
    pub details: ProgramDetails,
    pub config: ProgramConfig,
    /// At least one reward
    pub rewards: Vec<ValidatedReward>,
}

impl ValidatedProgram {
    pub fn program_type(&self) -> ProgramType {
        self.config.program_type()
    }
}
