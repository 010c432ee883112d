//! Extractors whose rejections render through `AppError`, so malformed input
//! gets a 400 with the usual envelope.

use super::error::AppError;
use axum::extract::{FromRequest, FromRequestParts};

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Verb {
        Start,
        Stop,
    }

    #[derive(Debug, Deserialize)]
    struct VerbQuery {
        action: Verb,
    }

    #[derive(Debug, Deserialize)]
    struct Credentials {
        email: String,
        password: String,
    }

    async fn envelope(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unknown_query_value_is_a_bad_request() {
        let (mut parts, _) = Request::get("/parser?action=bogus").body(()).unwrap().into_parts();
        let err = AppQuery::<VerbQuery>::from_request_parts(&mut parts, &()).await.unwrap_err();

        let (status, body) = envelope(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().starts_with("Invalid query"));
    }

    #[tokio::test]
    async fn known_query_value_is_extracted() {
        let (mut parts, _) = Request::get("/parser?action=stop").body(()).unwrap().into_parts();
        let AppQuery(query) = AppQuery::<VerbQuery>::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(matches!(query.action, Verb::Stop));
    }

    #[tokio::test]
    async fn missing_json_field_is_a_bad_request() {
        let req = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"a@b.co"}"#))
            .unwrap();
        let err = AppJson::<Credentials>::from_request(req, &()).await.unwrap_err();

        let (status, body) = envelope(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("password"));
    }

    #[tokio::test]
    async fn missing_content_type_is_a_bad_request() {
        let req = Request::post("/login")
            .body(Body::from(r#"{"email":"a@b.co","password":"x"}"#))
            .unwrap();
        let err = AppJson::<Credentials>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn well_formed_json_is_extracted() {
        let req = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"a@b.co","password":"x"}"#))
            .unwrap();
        let AppJson(credentials) = AppJson::<Credentials>::from_request(req, &()).await.unwrap();
        assert_eq!(credentials.email, "a@b.co");
        assert_eq!(credentials.password, "x");
    }
}
