use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::error::ApiError;
use crate::model::{BrapiResponse, DataList, ObservationVariable};
use crate::store::traits::Middleware;

#[derive(Debug, Deserialize)]
pub struct BrapiCropPath {
    pub crop: String,
}

#[derive(Debug, Deserialize)]
pub struct BrapiVariablePath {
    pub crop: String,
    pub id: String,
}

/// BrAPI v1 paging: zero-based `page`, `pageSize` items per page
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,
}

pub async fn list_observation_variables<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<BrapiCropPath>,
    Query(query): Query<PageQuery>,
) -> Result<Json<BrapiResponse<DataList<ObservationVariable>>>, ApiError> {
    let response = state
        .variables
        .list_observation_variables(&path.crop, query.page, query.page_size)
        .await?;
    Ok(Json(response))
}

pub async fn get_observation_variable<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<BrapiVariablePath>,
) -> Result<Json<BrapiResponse<ObservationVariable>>, ApiError> {
    state
        .variables
        .get_observation_variable(&path.crop, &path.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No observation variable with id {}", path.id)))
}
