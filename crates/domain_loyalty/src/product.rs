//! Product references
//!
//! Accrual products and free-product reward lines point at a product either
//! in the organization's own catalog or in the Foodics POS catalog. On the
//! wire both id fields are optional; [`ProductRef::key`] resolves them into
//! a [`ProductKey`] once the source and the populated id agree.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::violation::ViolationCode;

code_enum! {
    /// Catalog a product reference points into
    pub enum ProductSource {
        Internal => "INTERNAL",
        Foodics => "FOODICS",
    }
}

/// Product reference as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub product_source: ProductSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_product_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 128))]
    pub external_product_id: Option<String>,
}

/// Resolved product identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductKey {
    Internal(Uuid),
    Foodics(String),
}

impl ProductKey {
    pub fn source(&self) -> ProductSource {
        match self {
            ProductKey::Internal(_) => ProductSource::Internal,
            ProductKey::Foodics(_) => ProductSource::Foodics,
        }
    }
}

impl ProductRef {
    /// Resolves the id field that matches the declared source
    ///
    /// Fails with `ProductIdMismatch` when the matching id is absent and with
    /// `ProductIdAmbiguous` when both ids are populated.
    pub fn key(&self) -> Result<ProductKey, ViolationCode> {
        let external = self
            .external_product_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        match (self.product_source, self.internal_product_id, external) {
            (_, Some(_), Some(_)) => Err(ViolationCode::ProductIdAmbiguous),
            (ProductSource::Internal, Some(id), None) => Ok(ProductKey::Internal(id)),
            (ProductSource::Foodics, None, Some(id)) => Ok(ProductKey::Foodics(id.to_string())),
            _ => Err(ViolationCode::ProductIdMismatch),
        }
    }
}

impl From<&ProductKey> for ProductRef {
    fn from(key: &ProductKey) -> Self {
        match key {
            ProductKey::Internal(id) => ProductRef {
                product_source: ProductSource::Internal,
                internal_product_id: Some(*id),
                external_product_id: None,
            },
            ProductKey::Foodics(id) => ProductRef {
                product_source: ProductSource::Foodics,
                internal_product_id: None,
                external_product_id: Some(id.clone()),
            },
        }
    }
}
