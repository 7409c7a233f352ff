//! Loyalty program definition and header
//!
//! [`ProgramDefinition`] is the payload a back-office user submits to create
//! a program. It mirrors the wire shape: the rule-set sections for both
//! program types are optional side by side, and the Program Type Policy
//! decides which of them the `program_type` discriminant requires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{OrganizationId, ProgramId, UserId};

use crate::reward::RewardDefinition;
use crate::rules::{AccrualProduct, PointsRules, StampsRules};
use crate::wallet::WalletDesign;

code_enum! {
    /// Discriminant for every other entity of a program; immutable once created
    pub enum ProgramType {
        Points => "POINTS",
        Stamps => "STAMPS",
    }
}

code_enum! {
    pub enum ProgramStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
    }
}

impl Default for ProgramStatus {
    fn default() -> Self {
        ProgramStatus::Active
    }
}

/// English text with an optional Arabic translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BilingualText {
    #[validate(length(min = 1, max = 2000))]
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub ar: Option<String>,
}

impl BilingualText {
    pub fn en(text: impl Into<String>) -> Self {
        Self {
            en: text.into(),
            ar: None,
        }
    }

    pub fn with_ar(mut self, text: impl Into<String>) -> Self {
        self.ar = Some(text.into());
        self
    }
}

/// Descriptive fields of a program header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDetails {
    #[validate(nested)]
    pub name: BilingualText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub description: Option<BilingualText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub terms: Option<BilingualText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub how_to_use: Option<BilingualText>,
    #[serde(default)]
    pub status: ProgramStatus,
}

/// Complete program definition as submitted for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDefinition {
    pub program_type: ProgramType,
    #[serde(flatten)]
    #[validate(nested)]
    pub details: ProgramDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub points_rules: Option<PointsRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub stamps_rules: Option<StampsRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub wallet_design: Option<WalletDesign>,
    #[serde(default)]
    #[validate(nested)]
    pub accrual_products: Vec<AccrualProduct>,
    #[serde(default)]
    #[validate(nested)]
    pub rewards: Vec<RewardDefinition>,
}

/// Persisted program header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramHeader {
    pub id: ProgramId,
    pub organization_id: OrganizationId,
    pub program_type: ProgramType,
    #[serde(flatten)]
    pub details: ProgramDetails,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
