//! Reward Policy
//!
//! Decides whether a single reward's cost and behavior are consistent with
//! the enclosing program's type and with its own `reward_type`.
//!
//! # Rules
//!
//! - POINTS program: `costPoints` present and > 0, `costStamps` absent
//! - STAMPS program: `costStamps` present and > 0, `costPoints` absent
//! - DISCOUNT: discount block with percentage in (0, 100], optional max
//!   amount > 0, no free-product lines
//! - FREE_PRODUCT: at least one free-product line, no discount block;
//!   each line's id matches its source and frees at least one unit

use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::product::ProductSource;
use crate::program::ProgramType;
use crate::reward::{DiscountDetails, FreeProductLine, RewardDefinition, RewardType};
use crate::validated::{FreeProductItem, RewardBehavior, RewardCost, ValidatedReward};
use crate::violation::{ValidationResult, ViolationCode};

const MAX_DISCOUNT_PERCENTAGE: Decimal = dec!(100);

/// Validator for reward definitions
pub struct RewardPolicy;

impl RewardPolicy {
    /// Validates one reward against the enclosing program type
    ///
    /// Field paths in the result are rooted at `reward`.
    pub fn validate(reward: &RewardDefinition, program_type: ProgramType) -> ValidationResult {
        Self::evaluate(reward, program_type, "reward").0
    }

    /// Validates one reward and, when it passes, returns its typed form
    ///
    /// `path` prefixes every reported field, e.g. `rewards[2]`.
    pub(crate) fn evaluate(
        reward: &RewardDefinition,
        program_type: ProgramType,
        path: &str,
    ) -> (ValidationResult, Option<ValidatedReward>) {
        let mut result = ValidationResult::ok();

        let cost = Self::check_cost(reward, program_type, path, &mut result);
        let behavior = match reward.reward_type {
            RewardType::Discount => Self::check_discount(reward, path, &mut result),
            RewardType::FreeProduct => Self::check_free_products(reward, path, &mut result),
        };

        let validated = match (cost, behavior) {
            (Some(cost), Some(behavior)) if result.is_valid() => Some(ValidatedReward {
                voucher_name: reward.voucher_name.clone(),
                voucher_description: reward.voucher_description.clone(),
                status: reward.status,
                cost,
                behavior,
            }),
            _ => None,
        };

        (result, validated)
    }

    fn check_cost(
        reward: &RewardDefinition,
        program_type: ProgramType,
        path: &str,
        result: &mut ValidationResult,
    ) -> Option<RewardCost> {
        let points_field = format!("{path}.cost.costPoints");
        let stamps_field = format!("{path}.cost.costStamps");

        match program_type {
            ProgramType::Points => {
                let forbidden = reward.cost.cost_stamps.is_some();
                if forbidden {
                    result.add(
                        ViolationCode::CostStampsForbidden,
                        stamps_field,
                        "A reward in a POINTS program cannot have a stamps cost",
                    );
                }
                let cost = match reward.cost.cost_points {
                    None => {
                        result.add(
                            ViolationCode::CostPointsMissing,
                            points_field,
                            "A reward in a POINTS program requires a points cost",
                        );
                        None
                    }
                    Some(points) if points <= 0 => {
                        result.add(
                            ViolationCode::CostPointsNotPositive,
                            points_field,
                            format!("Points cost must be greater than 0, got {points}"),
                        );
                        None
                    }
                    Some(points) => Some(RewardCost::Points(points)),
                };
                cost.filter(|_| !forbidden)
            }
            ProgramType::Stamps => {
                let forbidden = reward.cost.cost_points.is_some();
                if forbidden {
                    result.add(
                        ViolationCode::CostPointsForbidden,
                        points_field,
                        "A reward in a STAMPS program cannot have a points cost",
                    );
                }
                let cost = match reward.cost.cost_stamps {
                    None => {
                        result.add(
                            ViolationCode::CostStampsMissing,
                            stamps_field,
                            "A reward in a STAMPS program requires a stamps cost",
                        );
                        None
                    }
                    Some(stamps) if stamps <= 0 => {
                        result.add(
                            ViolationCode::CostStampsNotPositive,
                            stamps_field,
                            format!("Stamps cost must be greater than 0, got {stamps}"),
                        );
                        None
                    }
                    Some(stamps) => Some(RewardCost::Stamps(stamps)),
                };
                cost.filter(|_| !forbidden)
            }
        }
    }

    fn check_discount(
        reward: &RewardDefinition,
        path: &str,
        result: &mut ValidationResult,
    ) -> Option<RewardBehavior> {
        if !reward.free_products.is_empty() {
            result.add(
                ViolationCode::DiscountFreeProductsForbidden,
                format!("{path}.freeProducts"),
                "A DISCOUNT reward cannot carry free-product lines",
            );
        }

        let Some(discount) = &reward.discount else {
            result.add(
                ViolationCode::DiscountMissing,
                format!("{path}.discount"),
                "A DISCOUNT reward requires a discount block",
            );
            return None;
        };

        let before = result.len();
        Self::check_discount_values(discount, path, result);

        (result.len() == before && reward.free_products.is_empty())
            .then(|| RewardBehavior::Discount(discount.clone()))
    }

    fn check_discount_values(discount: &DiscountDetails, path: &str, result: &mut ValidationResult) {
        let percentage = discount.discount_percentage;
        if percentage <= Decimal::ZERO || percentage > MAX_DISCOUNT_PERCENTAGE {
            result.add(
                ViolationCode::DiscountPercentageOutOfRange,
                format!("{path}.discount.discountPercentage"),
                format!("Discount percentage must be in (0, 100], got {percentage}"),
            );
        }

        if let Some(max) = discount.max_discount_amount {
            if max <= Decimal::ZERO {
                result.add(
                    ViolationCode::MaxDiscountNotPositive,
                    format!("{path}.discount.maxDiscountAmount"),
                    format!("Maximum discount amount must be greater than 0, got {max}"),
                );
            }
        }
    }

    fn check_free_products(
        reward: &RewardDefinition,
        path: &str,
        result: &mut ValidationResult,
    ) -> Option<RewardBehavior> {
        let before = result.len();

        if reward.discount.is_some() {
            result.add(
                ViolationCode::FreeProductDiscountForbidden,
                format!("{path}.discount"),
                "A FREE_PRODUCT reward cannot carry a discount block",
            );
        }

        if reward.free_products.is_empty() {
            result.add(
                ViolationCode::FreeProductsMissing,
                format!("{path}.freeProducts"),
                "A FREE_PRODUCT reward requires at least one free-product line",
            );
            return None;
        }

        let mut seen = HashSet::new();
        let items: Vec<Option<FreeProductItem>> = reward
            .free_products
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let line_path = format!("{path}.freeProducts[{index}]");
                let item = Self::check_free_product_line(line, &line_path, result)?;
                if !seen.insert(item.product.clone()) {
                    result.add(
                        ViolationCode::FreeProductDuplicate,
                        line_path,
                        "The same product is listed more than once in this reward",
                    );
                }
                Some(item)
            })
            .collect();

        if result.len() != before {
            return None;
        }
        items.into_iter().collect::<Option<Vec<_>>>().map(RewardBehavior::FreeProduct)
    }

    fn check_free_product_line(
        line: &FreeProductLine,
        path: &str,
        result: &mut ValidationResult,
    ) -> Option<FreeProductItem> {
        let key = match line.product.key() {
            Ok(key) => Some(key),
            Err(code) => {
                result.add(code, path, product_id_message(code, line.product.product_source));
                None
            }
        };

        if line.quantity_free < 1 {
            result.add(
                ViolationCode::QuantityFreeInvalid,
                format!("{path}.quantityFree"),
                format!("Free quantity must be at least 1, got {}", line.quantity_free),
            );
            return None;
        }

        key.map(|product| FreeProductItem {
            product,
            quantity_free: line.quantity_free,
        })
    }
}

/// Message for a product reference whose ids disagree with its source
pub(crate) fn product_id_message(code: ViolationCode, source: ProductSource) -> String {
    match (code, source) {
        (ViolationCode::ProductIdAmbiguous, _) => {
            "Only the id matching the product source may be set, not both".to_string()
        }
        (_, ProductSource::Internal) => "An INTERNAL product requires internalProductId".to_string(),
        (_, ProductSource::Foodics) => "A FOODICS product requires externalProductId".to_string(),
    }
}
