//! Extractors whose rejections use the service error envelope
//!
//! Wrap axum's `Json` and `Query` so malformed input comes back as a
//! `VALIDATION_ERROR` body instead of axum's plain-text rejection.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{FieldViolation, ServiceError};

/// JSON request body.
#[derive(Debug, Clone, Default)]
pub struct JsonBody<T>(pub T);

/// Deserialized query string.
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(query_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> ServiceError {
    let message = match rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err.body_text()),
        JsonRejection::MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        other => format!("Invalid request body: {}", other.body_text()),
    };
    ServiceError::validation(vec![FieldViolation::new("body", message)])
}

fn query_rejection(rejection: &QueryRejection) -> ServiceError {
    ServiceError::validation(vec![FieldViolation::new(
        "query",
        format!("Invalid query string: {}", rejection.body_text()),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusClass;
    use axum::{body::Body, http::Request as HttpRequest};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Paging {
        limit: u32,
    }

    #[tokio::test]
    async fn test_query_rejection_is_validation_error() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/activities?limit=lots")
            .body(())
            .unwrap()
            .into_parts();

        let err = QueryParams::<Paging>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status_class(), StatusClass::BadRequest);
        assert!(err.message().starts_with("Invalid query string"));
    }

    #[tokio::test]
    async fn test_query_accepts_valid_input() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/activities?limit=5")
            .body(())
            .unwrap()
            .into_parts();

        let QueryParams(paging) = QueryParams::<Paging>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(paging.limit, 5);
    }

    #[tokio::test]
    async fn test_json_syntax_error_is_validation_error() {
        let req = HttpRequest::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = JsonBody::<Paging>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status_class(), StatusClass::BadRequest);
        assert!(err.message().starts_with("Invalid JSON syntax"));
    }

    #[tokio::test]
    async fn test_json_requires_content_type() {
        let req = HttpRequest::builder()
            .method("POST")
            .body(Body::from(r#"{"limit": 1}"#))
            .unwrap();

        let err = JsonBody::<Paging>::from_request(req, &()).await.unwrap_err();
        assert!(err.message().contains("Content-Type"));
    }
}
