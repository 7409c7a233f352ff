//! Reward catalog entries
//!
//! A reward has exactly one cost (points or stamps, following the program
//! type) and exactly one behavior (a discount block or free-product lines,
//! following `reward_type`). The submitted shape allows both of each so the
//! Reward Policy can report the mismatch instead of failing to parse.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::product::ProductRef;
use crate::program::BilingualText;

code_enum! {
    pub enum RewardType {
        Discount => "DISCOUNT",
        FreeProduct => "FREE_PRODUCT",
    }
}

code_enum! {
    pub enum RewardStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
    }
}

impl Default for RewardStatus {
    fn default() -> Self {
        RewardStatus::Active
    }
}

/// Cost fields as submitted; exactly one must be populated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCostInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_stamps: Option<i32>,
}

/// Discount behavior
///
/// Decimal amounts are written as JSON strings (`"20"`). Input accepts
/// either a string or a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDetails {
    /// Percentage off, in (0, 100]
    pub discount_percentage: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discount_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
}

/// One free-product line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FreeProductLine {
    #[serde(flatten)]
    #[validate(nested)]
    pub product: ProductRef,
    pub quantity_free: i32,
}

/// Reward definition as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RewardDefinition {
    #[validate(nested)]
    pub voucher_name: BilingualText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub voucher_description: Option<BilingualText>,
    pub reward_type: RewardType,
    #[serde(default)]
    pub status: RewardStatus,
    #[serde(default)]
    pub cost: RewardCostInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub discount: Option<DiscountDetails>,
    #[serde(default)]
    #[validate(nested)]
    pub free_products: Vec<FreeProductLine>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_discount_accepts_numbers_and_writes_strings() {
        let discount: DiscountDetails = serde_json::from_value(json!({
            "discountPercentage": 20,
            "maxDiscountAmount": "12.50",
            "currency": "SAR"
        }))
        .unwrap();

        assert_eq!(discount.discount_percentage, dec!(20));
        assert_eq!(discount.max_discount_amount, Some(dec!(12.50)));

        let written = serde_json::to_value(&discount).unwrap();
        assert_eq!(written["discountPercentage"], "20");
        assert_eq!(written["maxDiscountAmount"], "12.50");
    }
}
