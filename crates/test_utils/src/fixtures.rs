//! Pre-built Test Fixtures
//!
//! Provides ready-to-use loyalty program definitions. Every `valid_*`
//! fixture passes the Program Type Policy; tests break one field at a time
//! to target a single rule.

use core_kernel::{OrganizationId, UserId};
use domain_loyalty::{
    AccrualProduct, AccrualRule, BilingualText, DiscountDetails, ExpiryDuration, ExpiryUnit,
    FreeProductLine, LimitScope, PointsRules, ProductRef, ProductSource, ProgramDefinition,
    ProgramDetails, ProgramStatus, ProgramType, RewardCostInput, RewardDefinition, RewardStatus,
    RewardType, RoundingMode, StampIcon, StampIcons, StampsRules, TimeRestrictionUnit,
    VisitLimitMode, WalletDesign, WalletTheme,
};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// Organization used by most tests
    pub fn organization_id() -> OrganizationId {
        OrganizationId::from_uuid(Uuid::from_u128(0x0a11_0000_0000_4000_8000_0000_0000_0001))
    }

    /// A second organization for tenant isolation tests
    pub fn other_organization_id() -> OrganizationId {
        OrganizationId::from_uuid(Uuid::from_u128(0x0a11_0000_0000_4000_8000_0000_0000_0002))
    }

    /// Back-office user creating programs
    pub fn user_id() -> UserId {
        UserId::from_uuid(Uuid::from_u128(0x05e7_0000_0000_4000_8000_0000_0000_0001))
    }

    /// Internal catalog product
    pub fn internal_product_id() -> Uuid {
        Uuid::from_u128(0x9700_0000_0000_4000_8000_0000_0000_0001)
    }

    /// Foodics catalog product
    pub fn foodics_product_id() -> &'static str {
        "fd-latte-001"
    }
}

/// Fixture for program sections
pub struct ProgramFixtures;

impl ProgramFixtures {
    pub fn details(name: &str) -> ProgramDetails {
        ProgramDetails {
            name: BilingualText::en(name).with_ar("برنامج الولاء"),
            description: Some(BilingualText::en("Earn with every visit")),
            terms: None,
            how_to_use: None,
            status: ProgramStatus::Active,
        }
    }

    pub fn points_rules() -> PointsRules {
        PointsRules {
            currency: Some("SAR".to_string()),
            earn_rate: dec!(1.5),
            min_spend: Some(dec!(10)),
            rounding_mode: RoundingMode::Floor,
            redemption_value: dec!(0.05),
            tax_percent: dec!(15),
            expiry: Some(ExpiryDuration {
                value: 12,
                unit: ExpiryUnit::Month,
            }),
        }
    }

    pub fn stamps_rules(accrual_rule: AccrualRule) -> StampsRules {
        StampsRules {
            stamps_target: 10,
            accrual_rule: Some(accrual_rule),
            time_restriction_unit: TimeRestrictionUnit::Hour,
            time_restriction_value: Some(4),
            visit_limit_mode: VisitLimitMode::OncePerWindow,
            max_per_window: None,
            limit_scope: LimitScope::Branch,
        }
    }

    pub fn wallet_theme() -> WalletTheme {
        WalletTheme {
            card_color: "#1F2937".to_string(),
            title_color: Some("#FFFFFF".to_string()),
            text_color: Some("#E5E7EB".to_string()),
            strip_image_url: None,
            logo_url: Some("https://cdn.example.com/logo.png".to_string()),
        }
    }

    pub fn stamp_icons() -> StampIcons {
        StampIcons {
            fulfilled: StampIcon {
                icon: "coffee-filled".to_string(),
                color: "#F59E0B".to_string(),
            },
            unfulfilled: StampIcon {
                icon: "coffee-outline".to_string(),
                color: "#9CA3AF".to_string(),
            },
        }
    }

    pub fn points_wallet() -> WalletDesign {
        WalletDesign {
            theme: Self::wallet_theme(),
            stamp_icons: None,
        }
    }

    pub fn stamps_wallet() -> WalletDesign {
        WalletDesign {
            theme: Self::wallet_theme(),
            stamp_icons: Some(Self::stamp_icons()),
        }
    }

    pub fn internal_product() -> ProductRef {
        ProductRef {
            product_source: ProductSource::Internal,
            internal_product_id: Some(IdFixtures::internal_product_id()),
            external_product_id: None,
        }
    }

    pub fn foodics_product() -> ProductRef {
        ProductRef {
            product_source: ProductSource::Foodics,
            internal_product_id: None,
            external_product_id: Some(IdFixtures::foodics_product_id().to_string()),
        }
    }

    /// POINTS program with one 20% discount reward costing 100 points
    pub fn valid_points_program() -> ProgramDefinition {
        ProgramDefinition {
            program_type: ProgramType::Points,
            details: Self::details("Coffee Points"),
            points_rules: Some(Self::points_rules()),
            stamps_rules: None,
            wallet_design: Some(Self::points_wallet()),
            accrual_products: vec![],
            rewards: vec![RewardFixtures::points_discount()],
        }
    }

    /// STAMPS program earning one stamp per visit
    pub fn valid_stamps_per_visit_program() -> ProgramDefinition {
        ProgramDefinition {
            program_type: ProgramType::Stamps,
            details: Self::details("Coffee Stamps"),
            points_rules: None,
            stamps_rules: Some(Self::stamps_rules(AccrualRule::PerVisit)),
            wallet_design: Some(Self::stamps_wallet()),
            accrual_products: vec![],
            rewards: vec![RewardFixtures::stamps_free_product()],
        }
    }

    /// STAMPS program earning stamps per qualifying item, one product per catalog
    pub fn valid_stamps_per_item_program() -> ProgramDefinition {
        ProgramDefinition {
            program_type: ProgramType::Stamps,
            details: Self::details("Latte Stamps"),
            points_rules: None,
            stamps_rules: Some(Self::stamps_rules(AccrualRule::PerItem)),
            wallet_design: Some(Self::stamps_wallet()),
            accrual_products: vec![
                AccrualProduct {
                    product: Self::internal_product(),
                    stamps_per_item: 1,
                },
                AccrualProduct {
                    product: Self::foodics_product(),
                    stamps_per_item: 2,
                },
            ],
            rewards: vec![RewardFixtures::stamps_free_product()],
        }
    }

    /// Wire form of [`ProgramFixtures::valid_points_program`]
    pub fn valid_points_program_json() -> Value {
        json!({
            "programType": "POINTS",
            "name": { "en": "Coffee Points" },
            "status": "ACTIVE",
            "pointsRules": {
                "currency": "SAR",
                "earnRate": "1.5",
                "minSpend": "10",
                "roundingMode": "FLOOR",
                "redemptionValue": "0.05",
                "taxPercent": "15",
                "expiry": { "value": 12, "unit": "MONTH" }
            },
            "walletDesign": { "cardColor": "#1F2937" },
            "rewards": [{
                "voucherName": { "en": "20% off" },
                "rewardType": "DISCOUNT",
                "cost": { "costPoints": 100 },
                "discount": { "discountPercentage": "20", "currency": "SAR" }
            }]
        })
    }
}

/// Fixture for rewards
pub struct RewardFixtures;

impl RewardFixtures {
    /// 20% discount costing 100 points
    pub fn points_discount() -> RewardDefinition {
        RewardDefinition {
            voucher_name: BilingualText::en("20% off").with_ar("خصم ٢٠٪"),
            voucher_description: None,
            reward_type: RewardType::Discount,
            status: RewardStatus::Active,
            cost: RewardCostInput {
                cost_points: Some(100),
                cost_stamps: None,
            },
            discount: Some(DiscountDetails {
                discount_percentage: dec!(20),
                max_discount_amount: Some(dec!(50)),
                currency: Some("SAR".to_string()),
            }),
            free_products: vec![],
        }
    }

    /// One free internal product costing 10 stamps
    pub fn stamps_free_product() -> RewardDefinition {
        RewardDefinition {
            voucher_name: BilingualText::en("Free latte"),
            voucher_description: Some(BilingualText::en("Any size")),
            reward_type: RewardType::FreeProduct,
            status: RewardStatus::Active,
            cost: RewardCostInput {
                cost_points: None,
                cost_stamps: Some(10),
            },
            discount: None,
            free_products: vec![FreeProductLine {
                product: ProgramFixtures::internal_product(),
                quantity_free: 1,
            }],
        }
    }
}
