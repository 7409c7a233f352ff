//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use std::sync::Arc;
use std::time::Duration;

use core_kernel::OrganizationId;
use domain_loyalty::{
    BilingualText, DiscountDetails, FreeProductLine, InMemoryProgramStore, ProductRef,
    ProgramService, RewardCostInput, RewardDefinition, RewardStatus, RewardType, ServiceConfig,
    WriteStep,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{IdFixtures, ProgramFixtures};

/// Builder for reward definitions
pub struct TestRewardBuilder {
    reward: RewardDefinition,
}

impl TestRewardBuilder {
    /// Starts a DISCOUNT reward at 10% with no cost set
    pub fn discount() -> Self {
        Self {
            reward: RewardDefinition {
                voucher_name: BilingualText::en("Discount"),
                voucher_description: None,
                reward_type: RewardType::Discount,
                status: RewardStatus::Active,
                cost: RewardCostInput::default(),
                discount: Some(DiscountDetails {
                    discount_percentage: dec!(10),
                    max_discount_amount: None,
                    currency: None,
                }),
                free_products: vec![],
            },
        }
    }

    /// Starts a FREE_PRODUCT reward freeing one internal product, no cost set
    pub fn free_product() -> Self {
        Self {
            reward: RewardDefinition {
                voucher_name: BilingualText::en("Free item"),
                voucher_description: None,
                reward_type: RewardType::FreeProduct,
                status: RewardStatus::Active,
                cost: RewardCostInput::default(),
                discount: None,
                free_products: vec![FreeProductLine {
                    product: ProgramFixtures::internal_product(),
                    quantity_free: 1,
                }],
            },
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.reward.voucher_name = BilingualText::en(name);
        self
    }

    pub fn with_cost_points(mut self, points: i64) -> Self {
        self.reward.cost.cost_points = Some(points);
        self
    }

    pub fn with_cost_stamps(mut self, stamps: i32) -> Self {
        self.reward.cost.cost_stamps = Some(stamps);
        self
    }

    pub fn with_percentage(mut self, percentage: Decimal) -> Self {
        if let Some(discount) = self.reward.discount.as_mut() {
            discount.discount_percentage = percentage;
        }
        self
    }

    pub fn with_discount(mut self, discount: Option<DiscountDetails>) -> Self {
        self.reward.discount = discount;
        self
    }

    /// Replaces the free-product lines
    pub fn with_free_products(mut self, lines: Vec<(ProductRef, i32)>) -> Self {
        self.reward.free_products = lines
            .into_iter()
            .map(|(product, quantity_free)| FreeProductLine {
                product,
                quantity_free,
            })
            .collect();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.reward.status = RewardStatus::Inactive;
        self
    }

    pub fn build(self) -> RewardDefinition {
        self.reward
    }
}

/// Builder for a [`ProgramService`] over an in-memory store
///
/// The returned store handle shares its tables with the service, so tests
/// can inspect committed rows after a call.
pub struct TestServiceBuilder {
    store: InMemoryProgramStore,
    config: ServiceConfig,
}

impl Default for TestServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServiceBuilder {
    /// Store knowing [`IdFixtures::organization_id`], default timeout
    pub fn new() -> Self {
        Self {
            store: InMemoryProgramStore::for_organization(IdFixtures::organization_id()),
            config: ServiceConfig::default(),
        }
    }

    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.store = self.store.with_organization(organization_id);
        self
    }

    pub fn failing_at(mut self, step: WriteStep, occurrence: usize) -> Self {
        self.store = self.store.failing_at(step, occurrence);
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.store = self.store.with_step_delay(delay);
        self
    }

    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.store = self.store.with_commit_delay(delay);
        self
    }

    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.config.transaction_timeout = timeout;
        self
    }

    pub fn build(self) -> (ProgramService, InMemoryProgramStore) {
        let service = ProgramService::with_config(Arc::new(self.store.clone()), self.config);
        (service, self.store)
    }
}
