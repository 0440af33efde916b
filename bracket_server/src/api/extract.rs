//! Request extractors that report malformed input with the API error body.
//!
//! Axum's own `Json`, `Path` and `Query` reject with plain text. These
//! wrappers keep the rejection's status code but answer with
//! [`ErrorResponse`] and the `invalid_request` code, so clients can always
//! decode an error as JSON.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, OptionalFromRequest, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, request::Parts},
};

use super::tournaments::{ApiError, ErrorResponse};

/// Error code shared by every extractor rejection
pub const INVALID_REQUEST: &str = "invalid_request";

fn invalid_request(status: StatusCode, message: String) -> ApiError {
    tracing::debug!(status = %status, error = %message, "Rejected malformed request");
    (
        status,
        Json(ErrorResponse {
            error: message,
            code: INVALID_REQUEST.to_string(),
        }),
    )
}

/// JSON request body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_request(rejection.status(), rejection.body_text())),
        }
    }
}

/// Absent without a JSON content type; a present but malformed body is
/// still rejected.
impl<S, T> OptionalFromRequest<S> for ApiJson<T>
where
    Json<T>: OptionalFromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        match <Json<T> as OptionalFromRequest<S>>::from_request(request, state).await {
            Ok(value) => Ok(value.map(|Json(value)| Self(value))),
            Err(rejection) => Err(invalid_request(rejection.status(), rejection.body_text())),
        }
    }
}

/// Typed path parameters.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match <Path<T> as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_request(rejection.status(), rejection.body_text())),
        }
    }
}

/// Typed query string.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match <Query<T> as FromRequestParts<S>>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_request(rejection.status(), rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header::CONTENT_TYPE};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Score {
        score_a: u32,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_is_extracted() {
        let ApiJson(score) =
            <ApiJson<Score> as FromRequest<()>>::from_request(json_request(r#"{"score_a":3}"#), &())
                .await
                .unwrap();
        assert_eq!(score.score_a, 3);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_body() {
        let Err((status, Json(body))) =
            <ApiJson<Score> as FromRequest<()>>::from_request(json_request("{"), &()).await
        else {
            panic!("malformed JSON must be rejected");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, INVALID_REQUEST);

        let Err((status, Json(body))) = <ApiJson<Score> as FromRequest<()>>::from_request(
            json_request(r#"{"score_a":-1}"#),
            &(),
        )
        .await
        else {
            panic!("a negative score must be rejected");
        };
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_optional_body_absent_without_content_type() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let body = <ApiJson<Score> as OptionalFromRequest<()>>::from_request(request, &())
            .await
            .unwrap();
        assert!(body.is_none());
    }
}
