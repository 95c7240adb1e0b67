//! Filing lifecycle endpoints under /v1/institutions/{lei}/filings/{period}.

use anyhow::anyhow;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use filing_core::{ContactInfo, Filing, FilingError, UserActionType};
use serde::Deserialize;
use tracing::info;

use crate::actions::ActionContext;
use crate::actor::ForwardedActor;
use crate::error::AppError;
use crate::state::AppState;

/// Filing lookup shared by every per-filing route; 404 when absent.
pub(crate) async fn fetch_filing(
    state: &AppState,
    lei: &str,
    period: &str,
) -> Result<Filing, FilingError> {
    state
        .filings
        .get(lei, period)
        .await?
        .ok_or_else(|| {
            FilingError::NotFound(format!("there is no filing for LEI {lei} in period {period}"))
        })
}

pub async fn create_filing(
    Extension(state): Extension<AppState>,
    ForwardedActor(actor): ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Filing>), AppError> {
    let filing_period = state.periods.get(&period).await?;
    let existing = state.filings.get(&lei, &period).await?;

    let mut ctx = ActionContext::new(&lei, &period);
    ctx.filing_period = filing_period.as_ref();
    ctx.filing = existing.as_ref();
    state.actions.validate(UserActionType::Create, &ctx)?;

    let action = state
        .user_actions
        .record(&actor, UserActionType::Create)
        .await?;
    let filing = state.filings.create(&period, &lei, action.id).await?;
    info!(lei = %lei, period = %period, filing_id = filing.id, "filing created");
    Ok((StatusCode::CREATED, Json(filing)))
}

pub async fn get_filing(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
) -> Result<Json<Filing>, AppError> {
    let filing = fetch_filing(&state, &lei, &period).await?;
    Ok(Json(filing))
}

#[derive(Deserialize)]
pub struct SnapshotIdBody {
    pub institution_snapshot_id: String,
}

pub async fn put_institution_snapshot_id(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
    Json(body): Json<SnapshotIdBody>,
) -> Result<Json<Filing>, AppError> {
    let mut filing = fetch_filing(&state, &lei, &period).await?;
    filing.institution_snapshot_id = Some(body.institution_snapshot_id);
    let filing = state.filings.update(&filing).await?;
    Ok(Json(filing))
}

pub async fn get_contact_info(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
) -> Result<Json<ContactInfo>, AppError> {
    let filing = fetch_filing(&state, &lei, &period).await?;
    let contact_info = filing.contact_info.ok_or_else(|| {
        FilingError::NotFound(format!(
            "no contact info recorded for LEI {lei} in period {period}"
        ))
    })?;
    Ok(Json(contact_info))
}

pub async fn put_contact_info(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
    Json(contact_info): Json<ContactInfo>,
) -> Result<Json<Filing>, AppError> {
    let mut filing = fetch_filing(&state, &lei, &period).await?;
    filing.contact_info = Some(contact_info);
    let filing = state.filings.update(&filing).await?;
    Ok(Json(filing))
}

#[derive(Deserialize)]
pub struct VoluntaryBody {
    pub is_voluntary: bool,
}

pub async fn put_is_voluntary(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
    Json(body): Json<VoluntaryBody>,
) -> Result<Json<Filing>, AppError> {
    let mut filing = fetch_filing(&state, &lei, &period).await?;
    filing.is_voluntary = Some(body.is_voluntary);
    let filing = state.filings.update(&filing).await?;
    Ok(Json(filing))
}

pub async fn sign_filing(
    Extension(state): Extension<AppState>,
    ForwardedActor(actor): ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
) -> Result<Json<Filing>, AppError> {
    let institution = state.institutions.get_institution(&lei).await?;
    let filing = state.filings.get(&lei, &period).await?;
    let latest = match &filing {
        Some(f) => state.submissions.get_latest(f.id).await?,
        None => None,
    };

    let mut ctx = ActionContext::new(&lei, &period);
    ctx.institution = institution.as_ref();
    ctx.filing = filing.as_ref();
    ctx.latest_submission = latest.as_ref();
    state.actions.validate(UserActionType::Sign, &ctx)?;

    let (Some(mut filing), Some(latest)) = (filing, latest) else {
        return Err(FilingError::Internal(anyhow!(
            "sign checks passed without a filing and an accepted submission"
        ))
        .into());
    };

    let action = state
        .user_actions
        .record(&actor, UserActionType::Sign)
        .await?;
    state.filings.add_signature(filing.id, action.id).await?;
    filing.confirmation_id = Some(format!(
        "{lei}-{period}-{}-{}",
        latest.id,
        Utc::now().timestamp_millis()
    ));
    let filing = state.filings.update(&filing).await?;
    info!(
        lei = %lei,
        period = %period,
        filing_id = filing.id,
        confirmation_id = filing.confirmation_id.as_deref().unwrap_or(""),
        "filing signed"
    );
    Ok(Json(filing))
}
