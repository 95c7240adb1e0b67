//! Identity extraction from gateway-forwarded headers.
//!
//! Authentication happens upstream; this service trusts `x-user-id`,
//! `x-user-name`, and `x-user-email`. A request without `x-user-id` is
//! rejected with 403.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use filing_core::{Actor, FilingError};

use crate::error::AppError;

pub struct ForwardedActor(pub Actor);

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ForwardedActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, "x-user-id").ok_or_else(|| {
            AppError(FilingError::ActionForbidden(vec![
                "x-user-id header is required".into(),
            ]))
        })?;
        Ok(Self(Actor {
            user_id,
            user_name: header_value(parts, "x-user-name").unwrap_or_default(),
            user_email: header_value(parts, "x-user-email").unwrap_or_default(),
        }))
    }
}
