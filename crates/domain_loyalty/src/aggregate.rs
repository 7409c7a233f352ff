//! Hydrated program view returned by the Aggregate Projector
//!
//! Sub-entities are optional: a POINTS program simply has no
//! `stampsRules`, and a reward whose behavior row is missing projects with
//! neither `discount` nor `freeProducts`.

use serde::{Deserialize, Serialize};

use core_kernel::{ProgramId, RewardId};

use crate::program::{BilingualText, ProgramHeader};
use crate::reward::{DiscountDetails, FreeProductLine, RewardCostInput, RewardStatus, RewardType};
use crate::rules::AccrualProduct;
use crate::validated::{
    PointsRuleSet, ProgramConfig, RewardBehavior, StampsRuleSet, ValidatedProgram, ValidatedReward,
};
use crate::wallet::WalletDesign;

/// Reward row with its cost and behavior sub-records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardView {
    pub id: RewardId,
    pub program_id: ProgramId,
    pub voucher_name: BilingualText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_description: Option<BilingualText>,
    pub reward_type: RewardType,
    pub status: RewardStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<RewardCostInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountDetails>,
    #[serde(default)]
    pub free_products: Vec<FreeProductLine>,
}

impl RewardView {
    fn from_validated(program_id: ProgramId, id: RewardId, reward: &ValidatedReward) -> Self {
        let (discount, free_products) = match &reward.behavior {
            RewardBehavior::Discount(discount) => (Some(discount.clone()), Vec::new()),
            RewardBehavior::FreeProduct(lines) => (None, lines.iter().map(Into::into).collect()),
        };

        Self {
            id,
            program_id,
            voucher_name: reward.voucher_name.clone(),
            voucher_description: reward.voucher_description.clone(),
            reward_type: reward.reward_type(),
            status: reward.status,
            cost: Some(reward.cost.into()),
            discount,
            free_products,
        }
    }
}

/// Fully hydrated loyalty program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramAggregate {
    pub program: ProgramHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_rules: Option<PointsRuleSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamps_rules: Option<StampsRuleSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_design: Option<WalletDesign>,
    #[serde(default)]
    pub accrual_products: Vec<AccrualProduct>,
    #[serde(default)]
    pub rewards: Vec<RewardView>,
}

impl ProgramAggregate {
    /// Builds the aggregate exactly as the Aggregate Constructor wrote it
    ///
    /// `reward_ids` pairs with `program.rewards` by position.
    pub fn from_validated(header: ProgramHeader, program: &ValidatedProgram, reward_ids: &[RewardId]) -> Self {
        let program_id = header.id;
        let rewards = program
            .rewards
            .iter()
            .zip(reward_ids)
            .map(|(reward, id)| RewardView::from_validated(program_id, *id, reward))
            .collect();

        let (points_rules, stamps_rules, wallet_design, accrual_products) = match &program.config {
            ProgramConfig::Points { rules, wallet } => (
                Some(rules.clone()),
                None,
                WalletDesign {
                    theme: wallet.clone(),
                    stamp_icons: None,
                },
                Vec::new(),
            ),
            ProgramConfig::Stamps {
                rules,
                wallet,
                stamp_icons,
                accrual_products,
            } => (
                None,
                Some(rules.clone()),
                WalletDesign {
                    theme: wallet.clone(),
                    stamp_icons: Some(stamp_icons.clone()),
                },
                accrual_products.iter().map(Into::into).collect(),
            ),
        };

        Self {
            program: header,
            points_rules,
            stamps_rules,
            wallet_design: Some(wallet_design),
            accrual_products,
            rewards,
        }
    }

    pub fn id(&self) -> ProgramId {
        self.program.id
    }

    /// Total rows the aggregate spans across its tables
    pub fn row_count(&self) -> usize {
        let rewards: usize = self
            .rewards
            .iter()
            .map(|r| {
                1 + usize::from(r.cost.is_some())
                    + usize::from(r.discount.is_some())
                    + r.free_products.len()
            })
            .sum();

        1 + usize::from(self.points_rules.is_some())
            + usize::from(self.stamps_rules.is_some())
            + usize::from(self.wallet_design.is_some())
            + self.accrual_products.len()
            + rewards
    }
}
