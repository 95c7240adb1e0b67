//! GET /v1/periods — list filing periods.

use axum::{Extension, Json};
use filing_core::FilingPeriod;

use crate::actor::ForwardedActor;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_periods(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
) -> Result<Json<Vec<FilingPeriod>>, AppError> {
    let periods = state.periods.list().await?;
    Ok(Json(periods))
}
