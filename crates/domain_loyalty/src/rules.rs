//! Earning rule sets
//!
//! A program carries exactly one rule set whose shape follows its type:
//! [`PointsRules`] for POINTS programs and [`StampsRules`] for STAMPS
//! programs. Numeric bounds (positive earn rate, tax percent range, ...)
//! are business rules checked by the Program Type Policy, not by
//! deserialization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::product::ProductRef;

code_enum! {
    /// How fractional points are turned into whole points
    pub enum RoundingMode {
        Floor => "FLOOR",
        Round => "ROUND",
        Ceil => "CEIL",
    }
}

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::Floor
    }
}

code_enum! {
    pub enum ExpiryUnit {
        Month => "MONTH",
        Year => "YEAR",
    }
}

code_enum! {
    /// Whether a stamp is earned per visit or per qualifying item
    pub enum AccrualRule {
        PerVisit => "PER_VISIT",
        PerItem => "PER_ITEM",
    }
}

code_enum! {
    pub enum TimeRestrictionUnit {
        None => "NONE",
        Day => "DAY",
        Hour => "HOUR",
    }
}

impl Default for TimeRestrictionUnit {
    fn default() -> Self {
        TimeRestrictionUnit::None
    }
}

code_enum! {
    pub enum VisitLimitMode {
        Unlimited => "UNLIMITED",
        OncePerWindow => "ONCE_PER_WINDOW",
        MaxPerWindow => "MAX_PER_WINDOW",
    }
}

impl Default for VisitLimitMode {
    fn default() -> Self {
        VisitLimitMode::Unlimited
    }
}

code_enum! {
    /// Whether visit limits count across the organization or per branch
    pub enum LimitScope {
        Org => "ORG",
        Branch => "BRANCH",
    }
}

impl Default for LimitScope {
    fn default() -> Self {
        LimitScope::Org
    }
}

/// Period after which earned points expire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryDuration {
    pub value: i32,
    pub unit: ExpiryUnit,
}

/// Points earning rules as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PointsRules {
    /// ISO 4217 code of the currency points are earned against
    #[serde(default)]
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    /// Points earned per unit of currency spent
    pub earn_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_spend: Option<Decimal>,
    #[serde(default)]
    pub rounding_mode: RoundingMode,
    /// Currency value of a single point at redemption
    pub redemption_value: Decimal,
    #[serde(default)]
    pub tax_percent: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<ExpiryDuration>,
}

/// Stamps earning rules as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StampsRules {
    /// Number of stamps that completes a card
    pub stamps_target: i32,
    #[serde(default)]
    pub accrual_rule: Option<AccrualRule>,
    #[serde(default)]
    pub time_restriction_unit: TimeRestrictionUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_restriction_value: Option<i32>,
    #[serde(default)]
    pub visit_limit_mode: VisitLimitMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_window: Option<i32>,
    #[serde(default)]
    pub limit_scope: LimitScope,
}

fn one() -> i32 {
    1
}

/// Product whose purchase earns stamps under the PER_ITEM accrual rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccrualProduct {
    #[serde(flatten)]
    #[validate(nested)]
    pub product: ProductRef,
    #[serde(default = "one")]
    pub stamps_per_item: i32,
}
