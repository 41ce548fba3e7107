use axum::{
    extract::{RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::state::AppState;
use crate::error::ApiError;
use crate::store::traits::Middleware;

/// Path parameters that name a crop
pub const CROP_PARAMS: &[&str] = &["cropname", "crop"];

/// Reject requests whose crop path parameter is not a crop this installation serves.
///
/// Runs as a route layer, so path parameters are already matched. Routes
/// without a crop parameter pass straight through.
pub async fn crop_interceptor<S: Middleware + 'static>(
    State(state): State<AppState<S>>,
    params: Option<RawPathParams>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let crop = params.as_ref().and_then(|params| {
        params
            .iter()
            .find(|(key, _)| CROP_PARAMS.contains(key))
            .map(|(_, value)| value.to_string())
    });

    if let Some(crop) = crop {
        let valid = state
            .store
            .is_valid_crop(&crop)
            .await
            .map_err(ApiError::runtime)?;
        if !valid {
            log::warn!("Rejected request to {} for unknown crop '{}'", request.uri().path(), crop);
            return Err(ApiError::InvalidCrop(format!("Invalid crop name: {}", crop)));
        }
    }

    Ok(next.run(request).await)
}
