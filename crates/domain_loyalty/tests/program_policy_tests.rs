//! Tests for the Program Type Policy - type consistency, rule bounds, accrual products

use rust_decimal_macros::dec;

use domain_loyalty::{
    AccrualProduct, AccrualRule, ProgramConfig, ProgramType, ProgramTypePolicy, TimeRestrictionUnit,
    ViolationCode, VisitLimitMode,
};
use test_utils::{
    assert_has_violation, assert_valid, assert_violation_at, ProgramFixtures, RewardFixtures,
    TestRewardBuilder,
};

// ============= COMMON TESTS =============
mod common_tests {
    use super::*;

    #[test]
    fn test_fixtures_are_valid() {
        assert_valid(&ProgramTypePolicy::validate(&ProgramFixtures::valid_points_program()));
        assert_valid(&ProgramTypePolicy::validate(&ProgramFixtures::valid_stamps_per_visit_program()));
        assert_valid(&ProgramTypePolicy::validate(&ProgramFixtures::valid_stamps_per_item_program()));
    }

    #[test]
    fn test_program_without_rewards_is_rejected() {
        let mut definition = ProgramFixtures::valid_points_program();
        definition.rewards.clear();

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::RewardsMissing, "rewards");
    }

    #[test]
    fn test_violations_accumulate_instead_of_short_circuiting() {
        let mut definition = ProgramFixtures::valid_points_program();
        definition.rewards.clear();
        definition.wallet_design = None;
        if let Some(rules) = definition.points_rules.as_mut() {
            rules.earn_rate = dec!(0);
            rules.redemption_value = dec!(-1);
        }

        let result = ProgramTypePolicy::validate(&definition);

        let codes: Vec<_> = result.violations().iter().map(|v| v.code).collect();
        assert_eq!(
            codes,
            vec![
                ViolationCode::RewardsMissing,
                ViolationCode::EarnRateNotPositive,
                ViolationCode::RedemptionValueNotPositive,
                ViolationCode::PointsWalletMissing,
            ]
        );
    }

    #[test]
    fn test_reward_violations_carry_their_index() {
        let mut definition = ProgramFixtures::valid_points_program();
        definition.rewards.push(TestRewardBuilder::discount().build());

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::CostPointsMissing, "rewards[1].cost.costPoints");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_accept_returns_typed_program() {
        let validated = ProgramTypePolicy::accept(&ProgramFixtures::valid_points_program()).unwrap();

        assert_eq!(validated.program_type(), ProgramType::Points);
        assert_eq!(validated.rewards.len(), 1);
        match validated.config {
            ProgramConfig::Points { rules, .. } => assert_eq!(rules.currency, "SAR"),
            ProgramConfig::Stamps { .. } => panic!("Expected a POINTS config"),
        }
    }

    #[test]
    fn test_accept_returns_every_violation() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        definition.stamps_rules = None;
        definition.wallet_design = None;

        let violations = ProgramTypePolicy::accept(&definition).unwrap_err();
        let codes: Vec<_> = violations.iter().map(|v| v.code).collect();
        assert!(codes.contains(&ViolationCode::StampsRulesMissing));
        assert!(codes.contains(&ViolationCode::StampsWalletMissing));
    }
}

// ============= POINTS TESTS =============
mod points_tests {
    use super::*;

    #[test]
    fn test_points_program_requires_points_rules() {
        let mut definition = ProgramFixtures::valid_points_program();
        definition.points_rules = None;

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::PointsRulesMissing, "pointsRules");
    }

    #[test]
    fn test_points_program_rejects_stamps_rules() {
        let mut definition = ProgramFixtures::valid_points_program();
        definition.stamps_rules = Some(ProgramFixtures::stamps_rules(AccrualRule::PerVisit));

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::RulesTypeMismatch, "stampsRules");
    }

    #[test]
    fn test_earn_rate_must_be_positive() {
        for earn_rate in [dec!(0), dec!(-0.5)] {
            let mut definition = ProgramFixtures::valid_points_program();
            if let Some(rules) = definition.points_rules.as_mut() {
                rules.earn_rate = earn_rate;
            }

            let result = ProgramTypePolicy::validate(&definition);
            assert_violation_at(&result, ViolationCode::EarnRateNotPositive, "pointsRules.earnRate");
        }
    }

    #[test]
    fn test_tax_percent_bounds_are_inclusive() {
        for (tax, valid) in [(dec!(0), true), (dec!(100), true), (dec!(-1), false), (dec!(100.5), false)] {
            let mut definition = ProgramFixtures::valid_points_program();
            if let Some(rules) = definition.points_rules.as_mut() {
                rules.tax_percent = tax;
            }

            let result = ProgramTypePolicy::validate(&definition);
            assert_eq!(
                result.has(ViolationCode::TaxPercentOutOfRange),
                !valid,
                "tax percent {tax}"
            );
        }
    }

    #[test]
    fn test_currency_is_required() {
        let mut definition = ProgramFixtures::valid_points_program();
        if let Some(rules) = definition.points_rules.as_mut() {
            rules.currency = Some("  ".to_string());
        }

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::CurrencyMissing, "pointsRules.currency");
    }

    #[test]
    fn test_negative_min_spend_and_zero_expiry_are_rejected() {
        let mut definition = ProgramFixtures::valid_points_program();
        if let Some(rules) = definition.points_rules.as_mut() {
            rules.min_spend = Some(dec!(-10));
            if let Some(expiry) = rules.expiry.as_mut() {
                expiry.value = 0;
            }
        }

        let result = ProgramTypePolicy::validate(&definition);
        assert_has_violation(&result, ViolationCode::MinSpendNegative);
        assert_violation_at(&result, ViolationCode::ExpiryValueNotPositive, "pointsRules.expiry.value");
    }

    #[test]
    fn test_points_wallet_cannot_carry_stamp_icons() {
        let mut definition = ProgramFixtures::valid_points_program();
        definition.wallet_design = Some(ProgramFixtures::stamps_wallet());

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::WalletStampIconsForbidden, "walletDesign.stampIcons");
    }

    #[test]
    fn test_points_program_rejects_accrual_products() {
        let mut definition = ProgramFixtures::valid_points_program();
        definition.accrual_products = vec![AccrualProduct {
            product: ProgramFixtures::internal_product(),
            stamps_per_item: 1,
        }];

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::AccrualProductsForbidden, "accrualProducts");
    }
}

// ============= STAMPS TESTS =============
mod stamps_tests {
    use super::*;

    #[test]
    fn test_stamps_program_rejects_points_rules() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        definition.points_rules = Some(ProgramFixtures::points_rules());

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::RulesTypeMismatch, "pointsRules");
    }

    #[test]
    fn test_stamps_target_must_be_positive() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        if let Some(rules) = definition.stamps_rules.as_mut() {
            rules.stamps_target = 0;
        }

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::StampsTargetNotPositive, "stampsRules.stampsTarget");
    }

    #[test]
    fn test_missing_accrual_rule_is_reported_once() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        if let Some(rules) = definition.stamps_rules.as_mut() {
            rules.accrual_rule = None;
        }

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::AccrualRuleMissing, "stampsRules.accrualRule");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_time_restriction_requires_value_unless_none() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        if let Some(rules) = definition.stamps_rules.as_mut() {
            rules.time_restriction_unit = TimeRestrictionUnit::Day;
            rules.time_restriction_value = None;
        }
        assert_has_violation(
            &ProgramTypePolicy::validate(&definition),
            ViolationCode::TimeRestrictionValueInvalid,
        );

        if let Some(rules) = definition.stamps_rules.as_mut() {
            rules.time_restriction_unit = TimeRestrictionUnit::None;
            rules.time_restriction_value = Some(-3);
        }
        assert_valid(&ProgramTypePolicy::validate(&definition));
    }

    #[test]
    fn test_inapplicable_limit_values_are_dropped() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        if let Some(rules) = definition.stamps_rules.as_mut() {
            rules.time_restriction_unit = TimeRestrictionUnit::None;
            rules.time_restriction_value = Some(6);
            rules.visit_limit_mode = VisitLimitMode::Unlimited;
            rules.max_per_window = Some(3);
        }

        let validated = ProgramTypePolicy::accept(&definition).unwrap();
        match validated.config {
            ProgramConfig::Stamps { rules, .. } => {
                assert_eq!(rules.time_restriction_value, None);
                assert_eq!(rules.max_per_window, None);
            }
            ProgramConfig::Points { .. } => panic!("Expected a STAMPS config"),
        }
    }

    #[test]
    fn test_max_per_window_requires_positive_maximum() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        if let Some(rules) = definition.stamps_rules.as_mut() {
            rules.visit_limit_mode = VisitLimitMode::MaxPerWindow;
            rules.max_per_window = Some(0);
        }

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::MaxPerWindowInvalid, "stampsRules.maxPerWindow");
    }

    #[test]
    fn test_stamps_wallet_requires_stamp_icons() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        definition.wallet_design = Some(ProgramFixtures::points_wallet());

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::WalletStampIconsMissing, "walletDesign.stampIcons");
    }

    #[test]
    fn test_several_rewards_are_allowed() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        definition.rewards.push(RewardFixtures::stamps_free_product());
        definition.rewards.push(TestRewardBuilder::discount().with_cost_stamps(4).build());

        assert_valid(&ProgramTypePolicy::validate(&definition));
    }
}

// ============= ACCRUAL PRODUCT TESTS =============
mod accrual_tests {
    use super::*;

    #[test]
    fn test_per_item_without_products_is_rejected() {
        let mut definition = ProgramFixtures::valid_stamps_per_item_program();
        definition.accrual_products.clear();

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::AccrualProductsMissing, "accrualProducts");
    }

    #[test]
    fn test_per_visit_with_products_is_rejected() {
        let mut definition = ProgramFixtures::valid_stamps_per_visit_program();
        definition.accrual_products = vec![AccrualProduct {
            product: ProgramFixtures::foodics_product(),
            stamps_per_item: 1,
        }];

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::AccrualProductsForbidden, "accrualProducts");
    }

    #[test]
    fn test_duplicate_product_is_rejected() {
        let mut definition = ProgramFixtures::valid_stamps_per_item_program();
        definition.accrual_products.push(AccrualProduct {
            product: ProgramFixtures::internal_product(),
            stamps_per_item: 3,
        });

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::AccrualProductDuplicate, "accrualProducts[2]");
    }

    #[test]
    fn test_product_id_must_match_source() {
        let mut definition = ProgramFixtures::valid_stamps_per_item_program();
        definition.accrual_products[1].product.external_product_id = None;
        definition.accrual_products[1].product.internal_product_id = Some(uuid::Uuid::new_v4());

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(&result, ViolationCode::ProductIdMismatch, "accrualProducts[1]");
    }

    #[test]
    fn test_stamps_per_item_must_be_at_least_one() {
        let mut definition = ProgramFixtures::valid_stamps_per_item_program();
        definition.accrual_products[0].stamps_per_item = 0;

        let result = ProgramTypePolicy::validate(&definition);
        assert_violation_at(
            &result,
            ViolationCode::StampsPerItemInvalid,
            "accrualProducts[0].stampsPerItem",
        );
    }

    #[test]
    fn test_accepted_per_item_program_keeps_product_order() {
        let validated = ProgramTypePolicy::accept(&ProgramFixtures::valid_stamps_per_item_program()).unwrap();

        match validated.config {
            ProgramConfig::Stamps { accrual_products, .. } => {
                assert_eq!(accrual_products.len(), 2);
                assert_eq!(accrual_products[1].stamps_per_item, 2);
            }
            ProgramConfig::Points { .. } => panic!("Expected a STAMPS config"),
        }
    }
}

// ============= PROPERTY TESTS =============
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use test_utils::{non_positive_decimal_strategy, valid_points_program_strategy, valid_program_strategy, valid_stamps_program_strategy};

    proptest! {
        #[test]
        fn prop_generated_valid_programs_pass(definition in valid_program_strategy()) {
            let result = ProgramTypePolicy::validate(&definition);
            prop_assert!(result.is_valid(), "{:?}", result.violations());
        }

        #[test]
        fn prop_validate_and_accept_agree(definition in valid_stamps_program_strategy(), drop_wallet in any::<bool>()) {
            let mut definition = definition;
            if drop_wallet {
                definition.wallet_design = None;
            }

            let result = ProgramTypePolicy::validate(&definition);
            let accepted = ProgramTypePolicy::accept(&definition);
            prop_assert_eq!(result.is_valid(), accepted.is_ok());
            if let Err(violations) = accepted {
                prop_assert_eq!(violations.as_slice(), result.violations());
            }
        }

        #[test]
        fn prop_non_positive_earn_rate_is_always_rejected(
            definition in valid_points_program_strategy(),
            earn_rate in non_positive_decimal_strategy(),
        ) {
            let mut definition = definition;
            if let Some(rules) = definition.points_rules.as_mut() {
                rules.earn_rate = earn_rate;
            }
            prop_assert!(ProgramTypePolicy::validate(&definition).has(ViolationCode::EarnRateNotPositive));
        }

        #[test]
        fn prop_mismatched_rule_set_is_always_rejected(definition in valid_program_strategy()) {
            let mut definition = definition;
            match definition.program_type {
                ProgramType::Points => {
                    definition.stamps_rules = Some(ProgramFixtures::stamps_rules(AccrualRule::PerVisit));
                }
                ProgramType::Stamps => definition.points_rules = Some(ProgramFixtures::points_rules()),
            }
            prop_assert!(ProgramTypePolicy::validate(&definition).has(ViolationCode::RulesTypeMismatch));
        }
    }
}
