//! HTTP mapping for domain errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use filing_core::FilingError;

/// Newtype so `?` works in handlers returning axum responses.
#[derive(Debug)]
pub struct AppError(pub FilingError);

impl From<FilingError> for AppError {
    fn from(e: FilingError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = match &self.0 {
            FilingError::ActionForbidden(reasons) => serde_json::json!({
                "error": self.0.to_string(),
                "reasons": reasons,
            }),
            _ => serde_json::json!({ "error": self.0.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_maps_to_404_with_error_body() {
        let response = AppError(FilingError::NotFound("filing 7".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "not found: filing 7");
    }

    #[tokio::test]
    async fn action_forbidden_lists_every_reason() {
        let response = AppError(FilingError::ActionForbidden(vec![
            "institution has no TIN".into(),
            "contact info is missing".into(),
        ]))
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["reasons"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unsupported_file_maps_to_415() {
        let response =
            AppError(FilingError::UnsupportedFile("application/pdf".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn internal_maps_to_500() {
        let response = AppError(FilingError::Internal(anyhow::anyhow!("boom"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
