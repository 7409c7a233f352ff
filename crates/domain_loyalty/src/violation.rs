//! Business-rule violations
//!
//! A [`Violation`] is one structured failure produced by a policy. Codes are
//! stable so a UI can map them to translated messages; the `field` path
//! points at the offending part of the submitted definition using the wire
//! (camelCase) names, e.g. `rewards[1].cost.costPoints`.

use serde::{Deserialize, Serialize};

code_enum! {
    /// Machine-readable violation codes
    pub enum ViolationCode {
        RewardsMissing => "REWARDS_MISSING",
        RulesTypeMismatch => "RULES_TYPE_MISMATCH",

        PointsRulesMissing => "POINTS_RULES_MISSING",
        PointsWalletMissing => "POINTS_WALLET_MISSING",
        EarnRateNotPositive => "EARN_RATE_NOT_POSITIVE",
        RedemptionValueNotPositive => "REDEMPTION_VALUE_NOT_POSITIVE",
        CurrencyMissing => "CURRENCY_MISSING",
        TaxPercentOutOfRange => "TAX_PERCENT_OUT_OF_RANGE",
        MinSpendNegative => "MIN_SPEND_NEGATIVE",
        ExpiryValueNotPositive => "EXPIRY_VALUE_NOT_POSITIVE",

        StampsRulesMissing => "STAMPS_RULES_MISSING",
        StampsWalletMissing => "STAMPS_WALLET_MISSING",
        StampsTargetNotPositive => "STAMPS_TARGET_NOT_POSITIVE",
        AccrualRuleMissing => "ACCRUAL_RULE_MISSING",
        TimeRestrictionValueInvalid => "TIME_RESTRICTION_VALUE_INVALID",
        MaxPerWindowInvalid => "MAX_PER_WINDOW_INVALID",

        AccrualProductsMissing => "ACCRUAL_PRODUCTS_MISSING",
        AccrualProductsForbidden => "ACCRUAL_PRODUCTS_FORBIDDEN",
        AccrualProductDuplicate => "ACCRUAL_PRODUCT_DUPLICATE",
        StampsPerItemInvalid => "STAMPS_PER_ITEM_INVALID",
        ProductIdMismatch => "PRODUCT_ID_MISMATCH",
        ProductIdAmbiguous => "PRODUCT_ID_AMBIGUOUS",

        WalletStampIconsForbidden => "WALLET_STAMP_ICONS_FORBIDDEN",
        WalletStampIconsMissing => "WALLET_STAMP_ICONS_MISSING",

        CostPointsMissing => "COST_POINTS_MISSING",
        CostPointsNotPositive => "COST_POINTS_NOT_POSITIVE",
        CostPointsForbidden => "COST_POINTS_FORBIDDEN",
        CostStampsMissing => "COST_STAMPS_MISSING",
        CostStampsNotPositive => "COST_STAMPS_NOT_POSITIVE",
        CostStampsForbidden => "COST_STAMPS_FORBIDDEN",

        DiscountMissing => "DISCOUNT_MISSING",
        DiscountPercentageOutOfRange => "DISCOUNT_PERCENTAGE_OUT_OF_RANGE",
        MaxDiscountNotPositive => "MAX_DISCOUNT_NOT_POSITIVE",
        DiscountFreeProductsForbidden => "DISCOUNT_FREE_PRODUCTS_FORBIDDEN",
        FreeProductsMissing => "FREE_PRODUCTS_MISSING",
        FreeProductDiscountForbidden => "FREE_PRODUCT_DISCOUNT_FORBIDDEN",
        QuantityFreeInvalid => "QUANTITY_FREE_INVALID",
        FreeProductDuplicate => "FREE_PRODUCT_DUPLICATE",
    }
}

/// A single business-rule failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable machine-readable code
    pub code: ViolationCode,
    /// Human-readable explanation
    pub message: String,
    /// Path of the offending field in the submitted definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Violation {
    /// Creates a violation attached to a field path
    pub fn new(code: ViolationCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} at {}: {}", self.code, field, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Accumulated outcome of a policy run
///
/// Violations keep the order in which checks ran; merging appends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    /// Creates an empty (passing) result
    pub fn ok() -> Self {
        Self::default()
    }

    /// Whether no violation was recorded
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Records a violation
    pub fn add(&mut self, code: ViolationCode, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(code, field, message));
    }

    /// Appends every violation of another result
    pub fn merge(&mut self, other: ValidationResult) {
        self.violations.extend(other.violations);
    }

    /// Number of violations recorded so far
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether no violation was recorded
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Checks if a violation with the given code was recorded
    pub fn has(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    /// Borrows the recorded violations
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes the result, returning its violations
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_str() {
        for code in ViolationCode::ALL {
            let parsed: ViolationCode = code.as_str().parse().unwrap();
            assert_eq!(*code, parsed);
        }
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = "NOT_A_CODE".parse::<ViolationCode>().unwrap_err();
        assert!(err.to_string().contains("ViolationCode"));
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut first = ValidationResult::ok();
        first.add(ViolationCode::RewardsMissing, "rewards", "no rewards");

        let mut second = ValidationResult::ok();
        second.add(ViolationCode::CostPointsMissing, "rewards[0].cost.costPoints", "missing");

        first.merge(second);

        let codes: Vec<_> = first.violations().iter().map(|v| v.code).collect();
        assert_eq!(codes, vec![ViolationCode::RewardsMissing, ViolationCode::CostPointsMissing]);
        assert!(!first.is_valid());
    }

    #[test]
    fn test_violation_serializes_code_as_wire_string() {
        let violation = Violation::new(ViolationCode::AccrualProductsMissing, "accrualProducts", "required");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["code"], "ACCRUAL_PRODUCTS_MISSING");
        assert_eq!(json["field"], "accrualProducts");
    }
}
