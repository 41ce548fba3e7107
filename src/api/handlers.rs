use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::api::json_extractor::ApiJson;
use crate::api::state::AppState;
use crate::error::ApiError;
use crate::model::{
    DataTypeSummary, GenericResponse, MethodDetails, MethodRequest, MethodSummary,
    PropertyDetails, PropertyRequest, PropertySummary, ScaleDetails, ScaleRequest, ScaleSummary,
    VariableTypeSummary,
};
use crate::store::traits::Middleware;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `/ontology/:cropname/<collection>`
#[derive(Debug, Deserialize)]
pub struct CropPath {
    pub cropname: String,
}

/// `/ontology/:cropname/<collection>/:id`
#[derive(Debug, Deserialize)]
pub struct TermPath {
    pub cropname: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct PropertyQuery {
    pub class: Option<String>,
}

pub async fn list_crops<S: Middleware>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let crops = state.store.list_crops().await.map_err(ApiError::runtime)?;
    Ok(Json(crops))
}

fn not_found(kind: &str, path: &TermPath) -> ApiError {
    ApiError::NotFound(format!("No {} with id {} in crop {}", kind, path.id, path.cropname))
}

// Methods

pub async fn list_methods<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
) -> Result<Json<Vec<MethodSummary>>, ApiError> {
    Ok(Json(state.ontology.get_all_methods().await?))
}

pub async fn get_method<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
) -> Result<Json<MethodDetails>, ApiError> {
    state
        .ontology
        .get_method(&path.id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("method", &path))
}

pub async fn add_method<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
    ApiJson(request): ApiJson<MethodRequest>,
) -> Result<(StatusCode, Json<GenericResponse>), ApiError> {
    let created = state.ontology.add_method(&request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_method<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
    ApiJson(request): ApiJson<MethodRequest>,
) -> Result<StatusCode, ApiError> {
    state.ontology.update_method(&path.id, &request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_method<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
) -> Result<StatusCode, ApiError> {
    state.ontology.delete_method(&path.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Properties

pub async fn list_properties<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<Vec<PropertySummary>>, ApiError> {
    Ok(Json(state.ontology.get_all_properties(query.class.as_deref()).await?))
}

pub async fn get_property<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
) -> Result<Json<PropertyDetails>, ApiError> {
    state
        .ontology
        .get_property(&path.id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("property", &path))
}

pub async fn add_property<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
    ApiJson(request): ApiJson<PropertyRequest>,
) -> Result<(StatusCode, Json<GenericResponse>), ApiError> {
    let created = state.ontology.add_property(&request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_property<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
    ApiJson(request): ApiJson<PropertyRequest>,
) -> Result<StatusCode, ApiError> {
    state.ontology.update_property(&path.id, &request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_property<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
) -> Result<StatusCode, ApiError> {
    state.ontology.delete_property(&path.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Scales

pub async fn list_scales<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
) -> Result<Json<Vec<ScaleSummary>>, ApiError> {
    Ok(Json(state.ontology.get_all_scales().await?))
}

pub async fn get_scale<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
) -> Result<Json<ScaleDetails>, ApiError> {
    state
        .ontology
        .get_scale(&path.id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("scale", &path))
}

pub async fn add_scale<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
    ApiJson(request): ApiJson<ScaleRequest>,
) -> Result<(StatusCode, Json<GenericResponse>), ApiError> {
    let created = state.ontology.add_scale(&request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_scale<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
    ApiJson(request): ApiJson<ScaleRequest>,
) -> Result<StatusCode, ApiError> {
    state.ontology.update_scale(&path.id, &request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_scale<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(path): Path<TermPath>,
) -> Result<StatusCode, ApiError> {
    state.ontology.delete_scale(&path.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Lookups

pub async fn list_data_types<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
) -> Json<Vec<DataTypeSummary>> {
    Json(state.ontology.get_data_types())
}

pub async fn list_classes<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.ontology.get_classes().await?))
}

pub async fn list_variable_types<S: Middleware>(
    State(state): State<AppState<S>>,
    Path(_crop): Path<CropPath>,
) -> Json<Vec<VariableTypeSummary>> {
    Json(state.ontology.get_variable_types())
}
