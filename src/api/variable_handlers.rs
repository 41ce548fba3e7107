use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::api::handlers::{CropPath, TermPath};
use crate::api::json_extractor::ApiJson;
use crate::api::program_extractor::ProgramContext;
use crate::api::state::AppState;
use crate::error::ApiError;
use crate::model::{GenericResponse, VariableDetails, VariableRequest, VariableSummary};
use crate::store::traits::Middleware;

#[derive(Debug, Deserialize)]
pub struct VariableQuery {
    #[serde(rename = "propertyId")]
    pub property_id: Option<String>,
    pub favourite: Option<bool>,
}

pub async fn list_variables<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
    program: ProgramContext,
    Query(query): Query<VariableQuery>,
) -> Result<Json<Vec<VariableSummary>>, ApiError> {
    let variables = state
        .variables
        .get_all_variables(
            program.as_deref(),
            query.property_id.as_deref(),
            query.favourite.unwrap_or(false),
        )
        .await?;
    Ok(Json(variables))
}

pub async fn get_variable<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
    program: ProgramContext,
) -> Result<Json<VariableDetails>, ApiError> {
    state
        .variables
        .get_variable(program.as_deref(), &path.id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("No variable with id {} in crop {}", path.id, path.cropname))
        })
}

pub async fn add_variable<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
    program: ProgramContext,
    ApiJson(request): ApiJson<VariableRequest>,
) -> Result<(StatusCode, Json<GenericResponse>), ApiError> {
    let created = state.variables.add_variable(program.as_deref(), &request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_variable<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
    program: ProgramContext,
    ApiJson(request): ApiJson<VariableRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .variables
        .update_variable(program.as_deref(), &path.id, &request)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_variable<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
) -> Result<StatusCode, ApiError> {
    state.variables.delete_variable(&path.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
