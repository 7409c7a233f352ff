//! Wallet card visual design

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Colors and images shared by every wallet card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WalletTheme {
    #[validate(length(min = 1, max = 32))]
    pub card_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 32))]
    pub title_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 32))]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 2048))]
    pub strip_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 2048))]
    pub logo_url: Option<String>,
}

/// Icon and color used to draw one stamp slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StampIcon {
    #[validate(length(min = 1, max = 2048))]
    pub icon: String,
    #[validate(length(min = 1, max = 32))]
    pub color: String,
}

/// Fulfilled/unfulfilled stamp pair, STAMPS programs only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StampIcons {
    #[validate(nested)]
    pub fulfilled: StampIcon,
    #[validate(nested)]
    pub unfulfilled: StampIcon,
}

/// Wallet design as submitted and as projected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WalletDesign {
    #[serde(flatten)]
    #[validate(nested)]
    pub theme: WalletTheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub stamp_icons: Option<StampIcons>,
}
