use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON request body whose rejections go through [`ApiError`], so a body that
/// does not parse gets the same 400 error list as a failed validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(malformed_body(rejection)),
        }
    }
}

fn malformed_body(rejection: JsonRejection) -> ApiError {
    let message = match &rejection {
        JsonRejection::JsonDataError(_) => "The request body does not match the expected fields or types.",
        JsonRejection::JsonSyntaxError(_) => "The request body is not valid JSON.",
        JsonRejection::MissingJsonContentType(_) => "The request body must be sent as application/json.",
        _ => "The request body could not be read.",
    };
    log::debug!("Rejected request body: {}", rejection.body_text());
    ApiError::MalformedBody(message.to_string())
}
