use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, HeaderMap, StatusCode},
};
use serde::Deserialize;

/// The breeding program a request acts for.
///
/// Read from the `programId` query parameter, falling back to the
/// `X-Program-Id` header. Without either the request is program-less:
/// variables are listed without favourites and favourite flags are not stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramContext {
    pub program_uuid: Option<String>,
}

impl ProgramContext {
    pub fn as_deref(&self) -> Option<&str> {
        self.program_uuid.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct ProgramQuery {
    #[serde(rename = "programId")]
    program_id: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ProgramContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_query = Query::<ProgramQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.program_id);

        let program_uuid = from_query
            .or_else(|| extract_header_value(&parts.headers, "x-program-id"))
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(ProgramContext { program_uuid })
    }
}

fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    async fn extract(request: Request<()>) -> ProgramContext {
        let (mut parts, _) = request.into_parts();
        ProgramContext::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_program_from_query() {
        let request = Request::builder()
            .uri("/ontology/maize/variables?programId=abc-123&favourite=true")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn test_program_from_header() {
        let mut request = Request::builder().uri("/ontology/maize/variables").body(()).unwrap();
        request
            .headers_mut()
            .insert("x-program-id", HeaderValue::from_static("p-9"));
        assert_eq!(extract(request).await.as_deref(), Some("p-9"));
    }

    #[tokio::test]
    async fn test_blank_program_is_none() {
        let request = Request::builder()
            .uri("/ontology/maize/variables?programId=%20")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, ProgramContext::default());
    }
}
