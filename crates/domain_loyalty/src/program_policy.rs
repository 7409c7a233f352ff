//! Program Type Policy
//!
//! Validates a complete [`ProgramDefinition`] against the invariants its
//! `program_type` implies. Every check runs; violations accumulate in the
//! order below so a caller can report all of them at once.
//!
//! # Checks
//!
//! 1. At least one reward
//! 2. POINTS: points rules and a wallet without stamp icons; earn rate > 0,
//!    redemption value > 0, currency present, tax percent in [0, 100],
//!    minimum spend >= 0, expiry value > 0; no stamps rules, no accrual
//!    products
//! 3. STAMPS: stamps rules and a wallet with stamp icons; stamps target > 0,
//!    accrual rule present, time restriction and visit limit values
//!    consistent with their units; no points rules
//! 4. PER_ITEM accrual: at least one accrual product, each resolving to a
//!    product id matching its source with at least one stamp per item and
//!    no duplicates; any other accrual rule forbids accrual products
//! 5. Each reward through the [`RewardPolicy`]

use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::program::{ProgramDefinition, ProgramType};
use crate::reward_policy::{product_id_message, RewardPolicy};
use crate::rules::{AccrualProduct, AccrualRule, PointsRules, StampsRules, TimeRestrictionUnit, VisitLimitMode};
use crate::validated::{
    AccrualItem, PointsRuleSet, ProgramConfig, StampsRuleSet, ValidatedProgram, ValidatedReward,
};
use crate::violation::{ValidationResult, Violation, ViolationCode};

const MAX_TAX_PERCENT: Decimal = dec!(100);

/// Validator for complete program definitions
pub struct ProgramTypePolicy;

impl ProgramTypePolicy {
    /// Runs every check over the definition
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let result = ProgramTypePolicy::validate(&definition);
    /// for violation in result.violations() {
    ///     println!("{}", violation);
    /// }
    /// ```
    pub fn validate(definition: &ProgramDefinition) -> ValidationResult {
        match Self::evaluate(definition) {
            Ok(_) => ValidationResult::ok(),
            Err(result) => result,
        }
    }

    /// Validates the definition and returns its typed form
    ///
    /// # Errors
    ///
    /// Returns the full ordered list of violations when any check fails
    pub fn accept(definition: &ProgramDefinition) -> Result<ValidatedProgram, Vec<Violation>> {
        Self::evaluate(definition).map_err(ValidationResult::into_violations)
    }

    fn evaluate(definition: &ProgramDefinition) -> Result<ValidatedProgram, ValidationResult> {
        let mut result = ValidationResult::ok();

        if definition.rewards.is_empty() {
            result.add(
                ViolationCode::RewardsMissing,
                "rewards",
                "A program requires at least one reward",
            );
        }

        let config = match definition.program_type {
            ProgramType::Points => Self::check_points(definition, &mut result),
            ProgramType::Stamps => Self::check_stamps(definition, &mut result),
        };

        let rewards: Vec<Option<ValidatedReward>> = definition
            .rewards
            .iter()
            .enumerate()
            .map(|(index, reward)| {
                let (reward_result, validated) =
                    RewardPolicy::evaluate(reward, definition.program_type, &format!("rewards[{index}]"));
                result.merge(reward_result);
                validated
            })
            .collect();
        let rewards: Option<Vec<ValidatedReward>> = rewards.into_iter().collect();

        match (config, rewards) {
            (Some(config), Some(rewards)) if result.is_valid() => Ok(ValidatedProgram {
                details: definition.details.clone(),
                config,
                rewards,
            }),
            _ => Err(result),
        }
    }

    // ========================================================================
    // POINTS
    // ========================================================================

    fn check_points(definition: &ProgramDefinition, result: &mut ValidationResult) -> Option<ProgramConfig> {
        if definition.stamps_rules.is_some() {
            result.add(
                ViolationCode::RulesTypeMismatch,
                "stampsRules",
                "A POINTS program cannot carry stamps rules",
            );
        }

        let rules = match &definition.points_rules {
            Some(rules) => Self::check_points_rules(rules, result),
            None => {
                result.add(
                    ViolationCode::PointsRulesMissing,
                    "pointsRules",
                    "A POINTS program requires a points rule set",
                );
                None
            }
        };

        let wallet = match &definition.wallet_design {
            Some(wallet) if wallet.stamp_icons.is_some() => {
                result.add(
                    ViolationCode::WalletStampIconsForbidden,
                    "walletDesign.stampIcons",
                    "A POINTS wallet design cannot carry stamp icons",
                );
                None
            }
            Some(wallet) => Some(wallet.theme.clone()),
            None => {
                result.add(
                    ViolationCode::PointsWalletMissing,
                    "walletDesign",
                    "A POINTS program requires a points wallet design",
                );
                None
            }
        };

        if !definition.accrual_products.is_empty() {
            result.add(
                ViolationCode::AccrualProductsForbidden,
                "accrualProducts",
                "Accrual products apply only to STAMPS programs with the PER_ITEM accrual rule",
            );
        }

        Some(ProgramConfig::Points {
            rules: rules?,
            wallet: wallet?,
        })
    }

    fn check_points_rules(rules: &PointsRules, result: &mut ValidationResult) -> Option<PointsRuleSet> {
        let before = result.len();

        if rules.earn_rate <= Decimal::ZERO {
            result.add(
                ViolationCode::EarnRateNotPositive,
                "pointsRules.earnRate",
                format!("Earn rate must be greater than 0, got {}", rules.earn_rate),
            );
        }

        if rules.redemption_value <= Decimal::ZERO {
            result.add(
                ViolationCode::RedemptionValueNotPositive,
                "pointsRules.redemptionValue",
                format!("Point redemption value must be greater than 0, got {}", rules.redemption_value),
            );
        }

        let currency = rules
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase);
        if currency.is_none() {
            result.add(
                ViolationCode::CurrencyMissing,
                "pointsRules.currency",
                "A points rule set requires a currency code",
            );
        }

        if rules.tax_percent < Decimal::ZERO || rules.tax_percent > MAX_TAX_PERCENT {
            result.add(
                ViolationCode::TaxPercentOutOfRange,
                "pointsRules.taxPercent",
                format!("Point tax percent must be in [0, 100], got {}", rules.tax_percent),
            );
        }

        if let Some(min_spend) = rules.min_spend {
            if min_spend < Decimal::ZERO {
                result.add(
                    ViolationCode::MinSpendNegative,
                    "pointsRules.minSpend",
                    format!("Minimum spend cannot be negative, got {}", min_spend),
                );
            }
        }

        if let Some(expiry) = rules.expiry {
            if expiry.value <= 0 {
                result.add(
                    ViolationCode::ExpiryValueNotPositive,
                    "pointsRules.expiry.value",
                    format!("Expiry duration must be greater than 0, got {}", expiry.value),
                );
            }
        }

        if result.len() != before {
            return None;
        }

        Some(PointsRuleSet {
            currency: currency?,
            earn_rate: rules.earn_rate,
            min_spend: rules.min_spend,
            rounding_mode: rules.rounding_mode,
            redemption_value: rules.redemption_value,
            tax_percent: rules.tax_percent,
            expiry: rules.expiry,
        })
    }

    // ========================================================================
    // STAMPS
    // ========================================================================

    fn check_stamps(definition: &ProgramDefinition, result: &mut ValidationResult) -> Option<ProgramConfig> {
        if definition.points_rules.is_some() {
            result.add(
                ViolationCode::RulesTypeMismatch,
                "pointsRules",
                "A STAMPS program cannot carry points rules",
            );
        }

        let rules = match &definition.stamps_rules {
            Some(rules) => Self::check_stamps_rules(rules, result),
            None => {
                result.add(
                    ViolationCode::StampsRulesMissing,
                    "stampsRules",
                    "A STAMPS program requires a stamps rule set",
                );
                None
            }
        };

        let wallet = match &definition.wallet_design {
            Some(wallet) => match &wallet.stamp_icons {
                Some(icons) => Some((wallet.theme.clone(), icons.clone())),
                None => {
                    result.add(
                        ViolationCode::WalletStampIconsMissing,
                        "walletDesign.stampIcons",
                        "A STAMPS wallet design requires fulfilled and unfulfilled stamp icons",
                    );
                    None
                }
            },
            None => {
                result.add(
                    ViolationCode::StampsWalletMissing,
                    "walletDesign",
                    "A STAMPS program requires a stamps wallet design",
                );
                None
            }
        };

        let accrual_rule = definition.stamps_rules.as_ref().and_then(|r| r.accrual_rule);
        let accrual_products = match accrual_rule {
            Some(AccrualRule::PerItem) => Self::check_accrual_products(&definition.accrual_products, result),
            Some(AccrualRule::PerVisit) => {
                if definition.accrual_products.is_empty() {
                    Some(Vec::new())
                } else {
                    result.add(
                        ViolationCode::AccrualProductsForbidden,
                        "accrualProducts",
                        "Accrual products are only allowed with the PER_ITEM accrual rule",
                    );
                    None
                }
            }
            // Already reported as a missing rule set or accrual rule
            None => None,
        };

        let (wallet, stamp_icons) = wallet?;
        Some(ProgramConfig::Stamps {
            rules: rules?,
            wallet,
            stamp_icons,
            accrual_products: accrual_products?,
        })
    }

    fn check_stamps_rules(rules: &StampsRules, result: &mut ValidationResult) -> Option<StampsRuleSet> {
        let before = result.len();

        if rules.stamps_target <= 0 {
            result.add(
                ViolationCode::StampsTargetNotPositive,
                "stampsRules.stampsTarget",
                format!("Stamps target must be greater than 0, got {}", rules.stamps_target),
            );
        }

        if rules.accrual_rule.is_none() {
            result.add(
                ViolationCode::AccrualRuleMissing,
                "stampsRules.accrualRule",
                "A stamps rule set requires an accrual rule",
            );
        }

        let time_restriction_value = match rules.time_restriction_unit {
            TimeRestrictionUnit::None => None,
            unit => match rules.time_restriction_value {
                Some(value) if value > 0 => Some(value),
                _ => {
                    result.add(
                        ViolationCode::TimeRestrictionValueInvalid,
                        "stampsRules.timeRestrictionValue",
                        format!("A {} time restriction requires a value greater than 0", unit),
                    );
                    None
                }
            },
        };

        let max_per_window = match rules.visit_limit_mode {
            VisitLimitMode::MaxPerWindow => match rules.max_per_window {
                Some(max) if max > 0 => Some(max),
                _ => {
                    result.add(
                        ViolationCode::MaxPerWindowInvalid,
                        "stampsRules.maxPerWindow",
                        "The MAX_PER_WINDOW visit limit requires a maximum greater than 0",
                    );
                    None
                }
            },
            VisitLimitMode::Unlimited | VisitLimitMode::OncePerWindow => None,
        };

        if result.len() != before {
            return None;
        }

        Some(StampsRuleSet {
            stamps_target: rules.stamps_target,
            accrual_rule: rules.accrual_rule?,
            time_restriction_unit: rules.time_restriction_unit,
            time_restriction_value,
            visit_limit_mode: rules.visit_limit_mode,
            max_per_window,
            limit_scope: rules.limit_scope,
        })
    }

    fn check_accrual_products(
        products: &[AccrualProduct],
        result: &mut ValidationResult,
    ) -> Option<Vec<AccrualItem>> {
        if products.is_empty() {
            result.add(
                ViolationCode::AccrualProductsMissing,
                "accrualProducts",
                "The PER_ITEM accrual rule requires at least one accrual product",
            );
            return None;
        }

        let before = result.len();
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(products.len());

        for (index, product) in products.iter().enumerate() {
            let path = format!("accrualProducts[{index}]");

            if product.stamps_per_item < 1 {
                result.add(
                    ViolationCode::StampsPerItemInvalid,
                    format!("{path}.stampsPerItem"),
                    format!("Stamps per item must be at least 1, got {}", product.stamps_per_item),
                );
            }

            match product.product.key() {
                Ok(key) => {
                    if !seen.insert(key.clone()) {
                        result.add(
                            ViolationCode::AccrualProductDuplicate,
                            path,
                            "The same product is listed more than once",
                        );
                    }
                    items.push(AccrualItem {
                        product: key,
                        stamps_per_item: product.stamps_per_item,
                    });
                }
                Err(code) => {
                    result.add(code, path, product_id_message(code, product.product.product_source));
                }
            }
        }

        (result.len() == before).then_some(items)
    }
}
