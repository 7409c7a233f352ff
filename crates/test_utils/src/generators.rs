//! Property-Based Test Generators
//!
//! Provides proptest strategies for loyalty program definitions. The
//! `valid_*` strategies only produce definitions the Program Type Policy
//! accepts; the remaining strategies cover values on both sides of a rule.

use domain_loyalty::{
    AccrualProduct, AccrualRule, ProductRef, ProductSource, ProgramDefinition, ProgramType,
    RewardCostInput, RewardDefinition, RoundingMode, TimeRestrictionUnit, VisitLimitMode,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::builders::TestRewardBuilder;
use crate::fixtures::ProgramFixtures;

pub fn program_type_strategy() -> impl Strategy<Value = ProgramType> {
    prop_oneof![Just(ProgramType::Points), Just(ProgramType::Stamps)]
}

pub fn rounding_mode_strategy() -> impl Strategy<Value = RoundingMode> {
    prop_oneof![
        Just(RoundingMode::Floor),
        Just(RoundingMode::Round),
        Just(RoundingMode::Ceil),
    ]
}

/// Strictly positive decimal with two fractional digits, up to 10 000.00
pub fn positive_decimal_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Zero or negative decimal with two fractional digits
pub fn non_positive_decimal_strategy() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..=0i64).prop_map(|n| Decimal::new(n, 2))
}

/// Percentage in [0, 100] with two fractional digits
pub fn percent_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Product reference whose id matches its source
pub fn product_ref_strategy() -> impl Strategy<Value = ProductRef> {
    prop_oneof![
        any::<u128>().prop_map(|n| ProductRef {
            product_source: ProductSource::Internal,
            internal_product_id: Some(Uuid::from_u128(n)),
            external_product_id: None,
        }),
        "[a-z0-9]{4,16}".prop_map(|id| ProductRef {
            product_source: ProductSource::Foodics,
            internal_product_id: None,
            external_product_id: Some(id),
        }),
    ]
}

/// Any combination of the two cost fields, including invalid values
pub fn cost_input_strategy() -> impl Strategy<Value = RewardCostInput> {
    (
        proptest::option::of(-10i64..1_000i64),
        proptest::option::of(-10i32..100i32),
    )
        .prop_map(|(cost_points, cost_stamps)| RewardCostInput {
            cost_points,
            cost_stamps,
        })
}

/// Valid reward for a program of the given type
pub fn valid_reward_strategy(program_type: ProgramType) -> impl Strategy<Value = RewardDefinition> {
    (any::<bool>(), 1i64..10_000i64, 1i32..50i32, 1i64..=10_000i64).prop_map(
        move |(discount, points, stamps, percentage)| {
            let builder = if discount {
                TestRewardBuilder::discount().with_percentage(Decimal::new(percentage, 2))
            } else {
                TestRewardBuilder::free_product()
            };
            match program_type {
                ProgramType::Points => builder.with_cost_points(points).build(),
                ProgramType::Stamps => builder.with_cost_stamps(stamps).build(),
            }
        },
    )
}

/// Valid POINTS definition with one to four rewards
pub fn valid_points_program_strategy() -> impl Strategy<Value = ProgramDefinition> {
    (
        positive_decimal_strategy(),
        positive_decimal_strategy(),
        percent_strategy(),
        rounding_mode_strategy(),
        proptest::collection::vec(valid_reward_strategy(ProgramType::Points), 1..5),
    )
        .prop_map(|(earn_rate, redemption_value, tax_percent, rounding_mode, rewards)| {
            let mut definition = ProgramFixtures::valid_points_program();
            if let Some(rules) = definition.points_rules.as_mut() {
                rules.earn_rate = earn_rate;
                rules.redemption_value = redemption_value;
                rules.tax_percent = tax_percent;
                rules.rounding_mode = rounding_mode;
            }
            definition.rewards = rewards;
            definition
        })
}

/// Valid STAMPS definition, PER_VISIT or PER_ITEM with distinct products
pub fn valid_stamps_program_strategy() -> impl Strategy<Value = ProgramDefinition> {
    (
        1i32..100i32,
        prop_oneof![Just(AccrualRule::PerVisit), Just(AccrualRule::PerItem)],
        prop_oneof![
            Just(TimeRestrictionUnit::None),
            Just(TimeRestrictionUnit::Day),
            Just(TimeRestrictionUnit::Hour),
        ],
        1i32..48i32,
        prop_oneof![
            Just(VisitLimitMode::Unlimited),
            Just(VisitLimitMode::OncePerWindow),
            Just(VisitLimitMode::MaxPerWindow),
        ],
        proptest::collection::hash_set(any::<u128>(), 1..5),
        proptest::collection::vec(valid_reward_strategy(ProgramType::Stamps), 1..4),
    )
        .prop_map(
            |(target, accrual_rule, unit, window, visit_limit_mode, product_ids, rewards)| {
                let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
                let mut rules = ProgramFixtures::stamps_rules(accrual_rule);
                rules.stamps_target = target;
                rules.time_restriction_unit = unit;
                rules.time_restriction_value = Some(window);
                rules.visit_limit_mode = visit_limit_mode;
                rules.max_per_window = Some(window);
                definition.stamps_rules = Some(rules);

                if accrual_rule == AccrualRule::PerItem {
                    definition.accrual_products = product_ids
                        .into_iter()
                        .map(|n| AccrualProduct {
                            product: ProductRef {
                                product_source: ProductSource::Internal,
                                internal_product_id: Some(Uuid::from_u128(n)),
                                external_product_id: None,
                            },
                            stamps_per_item: 1,
                        })
                        .collect();
                }
                definition.rewards = rewards;
                definition
            },
        )
}

/// Any valid definition of either type
pub fn valid_program_strategy() -> impl Strategy<Value = ProgramDefinition> {
    prop_oneof![valid_points_program_strategy(), valid_stamps_program_strategy()]
}
