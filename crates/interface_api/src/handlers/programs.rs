//! Loyalty program handlers

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};

use core_kernel::ProgramId;
use domain_loyalty::{ProgramAggregate, ProgramDefinition, ProgramHeader};

use crate::auth::{permissions, CallerContext};
use crate::error::ApiError;
use crate::extract::{IdPath, ValidatedJson};
use crate::AppState;

/// Creates a program for the caller's organization
pub async fn create_program(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidatedJson(definition): ValidatedJson<ProgramDefinition>,
) -> Result<(StatusCode, Json<ProgramAggregate>), ApiError> {
    caller.require(permissions::PROGRAM_WRITE)?;

    let program = state
        .service
        .create_program(caller.organization_id, caller.user_id, &definition)
        .await?;

    Ok((StatusCode::CREATED, Json(program)))
}

/// Lists the caller organization's programs, newest first
pub async fn list_programs(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Vec<ProgramHeader>>, ApiError> {
    caller.require(permissions::PROGRAM_READ)?;

    let programs = state.service.list_programs(caller.organization_id).await?;
    Ok(Json(programs))
}

/// Gets a program with every sub-entity
pub async fn get_program(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    IdPath(id): IdPath<ProgramId>,
) -> Result<Json<ProgramAggregate>, ApiError> {
    caller.require(permissions::PROGRAM_READ)?;

    let program = state
        .service
        .load_organization_program(caller.organization_id, id)
        .await?;
    Ok(Json(program))
}
