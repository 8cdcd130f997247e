use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

/// Prefix axum puts in front of serde's `path: message` detail
const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// JSON body extractor whose rejections use the API error envelope.
///
/// Well-formed JSON with a wrongly typed field is a validation failure naming
/// the field path; anything unparsable is a bad request.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(rejection_to_error)
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let text = err.body_text();
            let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(&text);
            AppError::validation(detail)
        }
        JsonRejection::JsonSyntaxError(err) => {
            AppError::BadRequest(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest("Expected `Content-Type: application/json`".to_string())
        }
        other => AppError::BadRequest(format!("Failed to read JSON body: {}", other)),
    }
}

/// The user resolved by `auth_middleware`; absent means the route is unprotected
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Deserialize)]
    struct Point {
        #[allow(dead_code)]
        latitude: f64,
    }

    async fn accept(AppJson(_): AppJson<Point>) -> StatusCode {
        StatusCode::NO_CONTENT
    }

    fn server() -> TestServer {
        TestServer::new(Router::new().route("/points", post(accept))).unwrap()
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_validation_error() {
        let response = server()
            .post("/points")
            .json(&json!({ "latitude": "abc" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Validation failed");
        let error = body["errors"][0].as_str().unwrap();
        assert!(error.starts_with("latitude: invalid type"), "{}", error);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = server()
            .post("/points")
            .content_type("application/json")
            .bytes("{\"latitude\":".into())
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert!(body["errors"].is_null());
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON syntax"));
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        async fn whoami(user: AuthenticatedUser) -> String {
            user.email
        }
        let server = TestServer::new(Router::new().route("/me", axum::routing::get(whoami))).unwrap();

        let response = server.get("/me").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
