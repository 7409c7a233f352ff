//! Request extractors

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that parsed and passed its structural `Validate` rules
///
/// Both failure kinds surface as [`ApiError::Shape`], so a structurally
/// broken payload never reaches the domain policies.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(shape_error)?;
        value.validate()?;
        Ok(Self(value))
    }
}

fn shape_error(rejection: JsonRejection) -> ApiError {
    ApiError::Shape {
        message: "Request body is not a valid program definition".to_string(),
        details: vec![rejection.body_text()],
    }
}

/// Path parameters whose parse failure is reported as [`ApiError::Shape`]
#[derive(Debug, Clone)]
pub struct IdPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for IdPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_error)?;
        Ok(Self(value))
    }
}

fn path_error(rejection: PathRejection) -> ApiError {
    ApiError::Shape {
        message: "Request path is not valid".to_string(),
        details: vec![rejection.body_text()],
    }
}
