//! Tests for the Reward Policy - cost exclusivity and behavior shape

use rust_decimal_macros::dec;

use domain_loyalty::{
    DiscountDetails, ProductRef, ProductSource, ProgramType, RewardPolicy, RewardType, ViolationCode,
};
use test_utils::{
    assert_has_violation, assert_valid, assert_violation_at, ProgramFixtures, RewardFixtures,
    TestRewardBuilder,
};

// ============= COST TESTS =============
mod cost_tests {
    use super::*;

    #[test]
    fn test_fixture_rewards_are_valid_for_their_program_type() {
        assert_valid(&RewardPolicy::validate(&RewardFixtures::points_discount(), ProgramType::Points));
        assert_valid(&RewardPolicy::validate(&RewardFixtures::stamps_free_product(), ProgramType::Stamps));
    }

    #[test]
    fn test_stamps_reward_with_both_costs_is_rejected() {
        let reward = TestRewardBuilder::free_product()
            .with_cost_stamps(50)
            .with_cost_points(50)
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Stamps);

        assert_violation_at(&result, ViolationCode::CostPointsForbidden, "reward.cost.costPoints");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_points_reward_with_stamps_cost_is_rejected() {
        let reward = TestRewardBuilder::discount()
            .with_cost_points(100)
            .with_cost_stamps(5)
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Points);
        assert_violation_at(&result, ViolationCode::CostStampsForbidden, "reward.cost.costStamps");
    }

    #[test]
    fn test_points_reward_without_cost_is_rejected() {
        let reward = TestRewardBuilder::discount().build();

        let result = RewardPolicy::validate(&reward, ProgramType::Points);
        assert_violation_at(&result, ViolationCode::CostPointsMissing, "reward.cost.costPoints");
    }

    #[test]
    fn test_points_reward_cannot_be_paid_with_stamps_only() {
        let reward = TestRewardBuilder::discount().with_cost_stamps(10).build();

        let result = RewardPolicy::validate(&reward, ProgramType::Points);
        assert_has_violation(&result, ViolationCode::CostStampsForbidden);
        assert_has_violation(&result, ViolationCode::CostPointsMissing);
    }

    #[test]
    fn test_non_positive_costs_are_rejected() {
        let points = TestRewardBuilder::discount().with_cost_points(0).build();
        assert_has_violation(
            &RewardPolicy::validate(&points, ProgramType::Points),
            ViolationCode::CostPointsNotPositive,
        );

        let stamps = TestRewardBuilder::free_product().with_cost_stamps(-2).build();
        assert_has_violation(
            &RewardPolicy::validate(&stamps, ProgramType::Stamps),
            ViolationCode::CostStampsNotPositive,
        );
    }
}

// ============= DISCOUNT TESTS =============
mod discount_tests {
    use super::*;

    #[test]
    fn test_discount_block_is_required() {
        let reward = TestRewardBuilder::discount()
            .with_cost_points(100)
            .with_discount(None)
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Points);
        assert_violation_at(&result, ViolationCode::DiscountMissing, "reward.discount");
    }

    #[test]
    fn test_discount_cannot_carry_free_products() {
        let reward = TestRewardBuilder::discount()
            .with_cost_points(100)
            .with_free_products(vec![(ProgramFixtures::internal_product(), 1)])
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Points);
        assert_violation_at(&result, ViolationCode::DiscountFreeProductsForbidden, "reward.freeProducts");
    }

    #[test]
    fn test_percentage_must_be_within_range() {
        for percentage in [dec!(0), dec!(150)] {
            let reward = TestRewardBuilder::discount()
                .with_cost_points(100)
                .with_percentage(percentage)
                .build();

            let result = RewardPolicy::validate(&reward, ProgramType::Points);
            assert_violation_at(
                &result,
                ViolationCode::DiscountPercentageOutOfRange,
                "reward.discount.discountPercentage",
            );
        }
    }

    #[test]
    fn test_max_discount_amount_must_be_positive() {
        let reward = TestRewardBuilder::discount()
            .with_cost_points(100)
            .with_discount(Some(DiscountDetails {
                discount_percentage: dec!(15),
                max_discount_amount: Some(dec!(0)),
                currency: Some("SAR".to_string()),
            }))
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Points);
        assert_violation_at(
            &result,
            ViolationCode::MaxDiscountNotPositive,
            "reward.discount.maxDiscountAmount",
        );
    }

    #[test]
    fn test_discount_reward_in_stamps_program_is_allowed() {
        let reward = TestRewardBuilder::discount().with_cost_stamps(8).build();

        assert_eq!(reward.reward_type, RewardType::Discount);
        assert_valid(&RewardPolicy::validate(&reward, ProgramType::Stamps));
    }
}

// ============= FREE PRODUCT TESTS =============
mod free_product_tests {
    use super::*;

    #[test]
    fn test_internal_product_with_only_external_id_is_rejected() {
        let product = ProductRef {
            product_source: ProductSource::Internal,
            internal_product_id: None,
            external_product_id: Some("fd-991".to_string()),
        };
        let reward = TestRewardBuilder::free_product()
            .with_cost_stamps(10)
            .with_free_products(vec![(product, 1)])
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Stamps);

        assert_violation_at(&result, ViolationCode::ProductIdMismatch, "reward.freeProducts[0]");
        let violation = &result.violations()[0];
        assert!(violation.message.contains("internalProductId"));
    }

    #[test]
    fn test_product_with_both_ids_is_ambiguous() {
        let product = ProductRef {
            product_source: ProductSource::Foodics,
            internal_product_id: Some(uuid::Uuid::new_v4()),
            external_product_id: Some("fd-991".to_string()),
        };
        let reward = TestRewardBuilder::free_product()
            .with_cost_stamps(10)
            .with_free_products(vec![(ProgramFixtures::foodics_product(), 1), (product, 1)])
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Stamps);
        assert_violation_at(&result, ViolationCode::ProductIdAmbiguous, "reward.freeProducts[1]");
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_free_product_lines_are_required() {
        let reward = TestRewardBuilder::free_product()
            .with_cost_stamps(10)
            .with_free_products(vec![])
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Stamps);
        assert_violation_at(&result, ViolationCode::FreeProductsMissing, "reward.freeProducts");
    }

    #[test]
    fn test_free_product_cannot_carry_discount() {
        let reward = TestRewardBuilder::free_product()
            .with_cost_points(250)
            .with_discount(Some(DiscountDetails {
                discount_percentage: dec!(10),
                max_discount_amount: None,
                currency: None,
            }))
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Points);
        assert_violation_at(&result, ViolationCode::FreeProductDiscountForbidden, "reward.discount");
    }

    #[test]
    fn test_quantity_free_must_be_at_least_one() {
        let reward = TestRewardBuilder::free_product()
            .with_cost_stamps(10)
            .with_free_products(vec![(ProgramFixtures::foodics_product(), 0)])
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Stamps);
        assert_violation_at(
            &result,
            ViolationCode::QuantityFreeInvalid,
            "reward.freeProducts[0].quantityFree",
        );
    }

    #[test]
    fn test_repeated_free_product_is_rejected() {
        let reward = TestRewardBuilder::free_product()
            .with_cost_stamps(10)
            .with_free_products(vec![
                (ProgramFixtures::foodics_product(), 1),
                (ProgramFixtures::internal_product(), 1),
                (ProgramFixtures::foodics_product(), 2),
            ])
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Stamps);

        assert_eq!(result.len(), 1);
        assert_violation_at(&result, ViolationCode::FreeProductDuplicate, "reward.freeProducts[2]");
    }

    #[test]
    fn test_every_line_is_checked() {
        let reward = TestRewardBuilder::free_product()
            .with_cost_stamps(10)
            .with_free_products(vec![
                (ProgramFixtures::internal_product(), 0),
                (ProgramFixtures::foodics_product(), 2),
                (ProgramFixtures::foodics_product(), -1),
            ])
            .build();

        let result = RewardPolicy::validate(&reward, ProgramType::Stamps);

        let fields: Vec<_> = result
            .violations()
            .iter()
            .filter_map(|v| v.field.as_deref())
            .collect();
        assert_eq!(
            fields,
            vec!["reward.freeProducts[0].quantityFree", "reward.freeProducts[2].quantityFree"]
        );
    }
}

// ============= PROPERTY TESTS =============
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use test_utils::{program_type_strategy, valid_reward_strategy};

    proptest! {
        #[test]
        fn prop_generated_rewards_pass(
            (program_type, reward) in program_type_strategy()
                .prop_flat_map(|t| (Just(t), valid_reward_strategy(t)))
        ) {
            let result = RewardPolicy::validate(&reward, program_type);
            prop_assert!(result.is_valid(), "{:?}", result.violations());
        }

        #[test]
        fn prop_reward_is_never_valid_for_both_program_types(
            reward in valid_reward_strategy(ProgramType::Points)
        ) {
            prop_assert!(!RewardPolicy::validate(&reward, ProgramType::Stamps).is_valid());
        }
    }
}
