//! Submission endpoints: upload, listing, acceptance, report download.
//!
//! Upload validates the file before anything is persisted, so a rejected
//! request never consumes a submission counter. Once the bytes are stored
//! the handler dispatches the validation pipeline and returns 202; the
//! caller polls the submission for its final state.

use anyhow::anyhow;
use axum::extract::{Multipart, Path};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use filing_core::{Filing, FilingError, Submission, SubmissionState, UserActionType};
use filing_engine::{
    report_key, spawn_validation, upload_key, BlobStoreError, REPORT_CONTENT_TYPE,
    REPORT_EXTENSION,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::actions::ActionContext;
use crate::actor::ForwardedActor;
use crate::config::Settings;
use crate::error::AppError;
use crate::handlers::filings::fetch_filing;
use crate::state::AppState;

struct Upload {
    filename: String,
    content: Vec<u8>,
}

/// Pull the `file` field out of the multipart body, enforcing content type,
/// extension, and size before the bytes go anywhere.
async fn read_upload(mut multipart: Multipart, settings: &Settings) -> Result<Upload, FilingError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FilingError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if content_type != settings.file_type {
                return Err(FilingError::UnsupportedFile(format!(
                    "content type {content_type} is not accepted, expected {}",
                    settings.file_type
                )));
            }
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload.{}", settings.file_extension));
        let extension = std::path::Path::new(&filename)
            .extension()
            .and_then(std::ffi::OsStr::to_str);
        match extension {
            Some(ext) if ext.eq_ignore_ascii_case(&settings.file_extension) => {}
            _ => {
                return Err(FilingError::UnsupportedFile(format!(
                    "only .{} uploads are accepted",
                    settings.file_extension
                )))
            }
        }

        let content = field
            .bytes()
            .await
            .map_err(|e| FilingError::InvalidInput(format!("failed to read upload: {e}")))?;
        if content.len() > settings.max_upload_bytes {
            return Err(FilingError::FileTooLarge(format!(
                "upload exceeds the {} byte limit",
                settings.max_upload_bytes
            )));
        }
        if content.is_empty() {
            return Err(FilingError::InvalidInput("uploaded file is empty".into()));
        }

        return Ok(Upload {
            filename,
            content: content.to_vec(),
        });
    }
    Err(FilingError::InvalidInput(
        "multipart field 'file' is required".into(),
    ))
}

pub async fn upload_submission(
    Extension(state): Extension<AppState>,
    ForwardedActor(actor): ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let filing = state.filings.get(&lei, &period).await?.ok_or_else(|| {
        FilingError::Unprocessable(format!(
            "there is no filing for LEI {lei} in period {period} to submit against"
        ))
    })?;

    let upload = read_upload(multipart, &state.settings).await?;

    let action = state
        .user_actions
        .record(&actor, UserActionType::Submit)
        .await?;
    let mut submission = state
        .submissions
        .create(filing.id, &upload.filename, action.id)
        .await?;

    let key = upload_key(&period, &lei, submission.id, &state.settings.file_extension);
    if let Err(e) = state
        .uploads
        .store(&key, &upload.content, &state.settings.file_type)
        .await
    {
        error!(submission_id = submission.id, error = %e, "upload storage failed");
        submission.state = SubmissionState::UploadFailed;
        state.submissions.update(&submission).await?;
        return Err(FilingError::Internal(anyhow!(e)).into());
    }

    submission.state = SubmissionState::SubmissionUploaded;
    let submission = state.submissions.update(&submission).await?;

    spawn_validation(
        Arc::clone(&state.orchestrator),
        Arc::clone(&state.watchdog),
        period.clone(),
        lei.clone(),
        submission.clone(),
        upload.content,
    );
    info!(
        submission_id = submission.id,
        counter = submission.counter,
        filename = %submission.filename,
        "submission dispatched for validation"
    );
    Ok((StatusCode::ACCEPTED, Json(submission)))
}

pub async fn list_submissions(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
) -> Result<Json<Vec<Submission>>, AppError> {
    let filing = fetch_filing(&state, &lei, &period).await?;
    let submissions = state.submissions.list(filing.id).await?;
    Ok(Json(submissions))
}

async fn latest(
    state: &AppState,
    filing: &Filing,
    lei: &str,
    period: &str,
) -> Result<Submission, FilingError> {
    state
        .submissions
        .get_latest(filing.id)
        .await?
        .ok_or_else(|| {
            FilingError::NotFound(format!(
                "there are no submissions for LEI {lei} in period {period}"
            ))
        })
}

pub async fn latest_submission(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
) -> Result<Json<Submission>, AppError> {
    let filing = fetch_filing(&state, &lei, &period).await?;
    let submission = latest(&state, &filing, &lei, &period).await?;
    Ok(Json(submission))
}

async fn owned_submission(
    state: &AppState,
    filing: &Filing,
    id: i64,
    lei: &str,
    period: &str,
) -> Result<Submission, FilingError> {
    state
        .submissions
        .get(id)
        .await?
        .filter(|s| s.filing_id == filing.id)
        .ok_or_else(|| {
            FilingError::NotFound(format!(
                "there is no submission {id} for LEI {lei} in period {period}"
            ))
        })
}

pub async fn get_submission(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period, id)): Path<(String, String, i64)>,
) -> Result<Json<Submission>, AppError> {
    let filing = fetch_filing(&state, &lei, &period).await?;
    let submission = owned_submission(&state, &filing, id, &lei, &period).await?;
    Ok(Json(submission))
}

pub async fn accept_submission(
    Extension(state): Extension<AppState>,
    ForwardedActor(actor): ForwardedActor,
    Path((lei, period, id)): Path<(String, String, i64)>,
) -> Result<Json<Submission>, AppError> {
    let filing = fetch_filing(&state, &lei, &period).await?;
    let mut submission = owned_submission(&state, &filing, id, &lei, &period).await?;
    let latest = state.submissions.get_latest(filing.id).await?;

    let mut ctx = ActionContext::new(&lei, &period);
    ctx.filing = Some(&filing);
    ctx.submission = Some(&submission);
    ctx.latest_submission = latest.as_ref();
    state.actions.validate(UserActionType::Accept, &ctx)?;

    let action = state
        .user_actions
        .record(&actor, UserActionType::Accept)
        .await?;
    submission.state = SubmissionState::SubmissionAccepted;
    submission.accepter_id = Some(action.id);
    let submission = state.submissions.update(&submission).await?;
    info!(submission_id = submission.id, "submission accepted");
    Ok(Json(submission))
}

async fn report_response(
    state: &AppState,
    lei: &str,
    period: &str,
    submission_id: i64,
) -> Result<Response, AppError> {
    let key = report_key(period, lei, submission_id, REPORT_EXTENSION);
    let bytes = state.reports.fetch(&key).await.map_err(|e| match e {
        BlobStoreError::NotFound(_) => FilingError::NotFound(format!(
            "there is no validation report for submission {submission_id}"
        )),
        other => FilingError::Internal(anyhow!(other)),
    })?;
    let disposition =
        format!("attachment; filename=\"{lei}-{period}-{submission_id}_report.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, REPORT_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn download_report(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period, id)): Path<(String, String, i64)>,
) -> Result<Response, AppError> {
    let filing = fetch_filing(&state, &lei, &period).await?;
    let submission = owned_submission(&state, &filing, id, &lei, &period).await?;
    report_response(&state, &lei, &period, submission.id).await
}

pub async fn download_latest_report(
    Extension(state): Extension<AppState>,
    _actor: ForwardedActor,
    Path((lei, period)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let filing = fetch_filing(&state, &lei, &period).await?;
    let submission = latest(&state, &filing, &lei, &period).await?;
    report_response(&state, &lei, &period, submission.id).await
}
