//! Router-level integration tests over in-memory ports and on-disk blob
//! stores. No database is required; the Postgres adapters have their own
//! ignored suite in `filing-postgres`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use filing_core::{
    Actor, Filing, FilingError, FilingPeriod, FilingPeriodStore, FilingStore, FilingType,
    Institution, InstitutionRegistry, Result, Submission, SubmissionState, SubmissionStore,
    UserAction, UserActionStore, UserActionType,
};
use filing_engine::{
    ExpiryWatchdog, LocalBlobStore, RegisterRuleValidator, ValidationOrchestrator,
};
use filing_server::actions::ActionRegistry;
use filing_server::config::Settings;
use filing_server::router::build_router;
use filing_server::state::AppState;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

const LEI: &str = "TESTBANK123400000000";
const OTHER_LEI: &str = "OTHERBANK99900000000";
const PERIOD: &str = "2024";
const USER: &str = "user-1";
const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

// ── in-memory ports ───────────────────────────────────────────────────

#[derive(Default)]
struct MemSubmissionStore {
    inner: Mutex<MemSubmissions>,
}

#[derive(Default)]
struct MemSubmissions {
    next_id: i64,
    by_id: HashMap<i64, Submission>,
}

impl MemSubmissionStore {
    fn state_of(&self, id: i64) -> SubmissionState {
        self.inner.lock().unwrap().by_id[&id].state
    }
}

#[async_trait]
impl SubmissionStore for MemSubmissionStore {
    async fn create(
        &self,
        filing_id: i64,
        filename: &str,
        submitter_id: i64,
    ) -> Result<Submission> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let counter = inner
            .by_id
            .values()
            .filter(|s| s.filing_id == filing_id)
            .map(|s| s.counter)
            .max()
            .unwrap_or(0)
            + 1;
        let submission = Submission {
            id: inner.next_id,
            counter,
            filing_id,
            state: SubmissionState::SubmissionStarted,
            filename: filename.to_string(),
            submitter_id,
            accepter_id: None,
            validation_ruleset_version: None,
            validation_summary: None,
            submission_time: Utc::now(),
        };
        inner.by_id.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn update(&self, submission: &Submission) -> Result<Submission> {
        let mut inner = self.inner.lock().unwrap();
        inner.by_id.insert(submission.id, submission.clone());
        Ok(submission.clone())
    }

    async fn get(&self, id: i64) -> Result<Option<Submission>> {
        Ok(self.inner.lock().unwrap().by_id.get(&id).cloned())
    }

    async fn get_latest(&self, filing_id: i64) -> Result<Option<Submission>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .by_id
            .values()
            .filter(|s| s.filing_id == filing_id)
            .max_by_key(|s| s.counter)
            .cloned())
    }

    async fn list(&self, filing_id: i64) -> Result<Vec<Submission>> {
        let mut subs: Vec<Submission> = self
            .inner
            .lock()
            .unwrap()
            .by_id
            .values()
            .filter(|s| s.filing_id == filing_id)
            .cloned()
            .collect();
        subs.sort_by_key(|s| std::cmp::Reverse(s.counter));
        Ok(subs)
    }

    async fn expire(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let submission = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| FilingError::NotFound(format!("submission {id}")))?;
        submission.state = SubmissionState::ValidationExpired;
        Ok(())
    }
}

#[derive(Default)]
struct MemUserActionStore {
    inner: Mutex<(i64, HashMap<i64, UserAction>)>,
}

#[async_trait]
impl UserActionStore for MemUserActionStore {
    async fn record(&self, actor: &Actor, action_type: UserActionType) -> Result<UserAction> {
        let mut inner = self.inner.lock().unwrap();
        inner.0 += 1;
        let action = UserAction {
            id: inner.0,
            user_id: actor.user_id.clone(),
            user_name: actor.user_name.clone(),
            user_email: actor.user_email.clone(),
            action_type,
            timestamp: Utc::now(),
        };
        inner.1.insert(action.id, action.clone());
        Ok(action)
    }

    async fn get(&self, id: i64) -> Result<Option<UserAction>> {
        Ok(self.inner.lock().unwrap().1.get(&id).cloned())
    }
}

struct MemFilingStore {
    actions: Arc<MemUserActionStore>,
    inner: Mutex<(i64, HashMap<i64, Filing>)>,
}

impl MemFilingStore {
    fn new(actions: Arc<MemUserActionStore>) -> Self {
        Self {
            actions,
            inner: Mutex::new((0, HashMap::new())),
        }
    }
}

#[async_trait]
impl FilingStore for MemFilingStore {
    async fn create(&self, period: &str, lei: &str, creator_id: i64) -> Result<Filing> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .1
            .values()
            .any(|f| f.filing_period == period && f.lei == lei)
        {
            return Err(FilingError::Conflict(format!(
                "filing for {lei} in {period} already exists"
            )));
        }
        inner.0 += 1;
        let filing = Filing {
            id: inner.0,
            filing_period: period.to_string(),
            lei: lei.to_string(),
            institution_snapshot_id: None,
            contact_info: None,
            confirmation_id: None,
            creator_id,
            is_voluntary: None,
            signatures: Vec::new(),
        };
        inner.1.insert(filing.id, filing.clone());
        Ok(filing)
    }

    async fn get(&self, lei: &str, period: &str) -> Result<Option<Filing>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .1
            .values()
            .find(|f| f.lei == lei && f.filing_period == period)
            .cloned())
    }

    async fn update(&self, filing: &Filing) -> Result<Filing> {
        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .1
            .get_mut(&filing.id)
            .ok_or_else(|| FilingError::NotFound(format!("filing {}", filing.id)))?;
        stored.institution_snapshot_id = filing.institution_snapshot_id.clone();
        stored.contact_info = filing.contact_info.clone();
        stored.confirmation_id = filing.confirmation_id.clone();
        stored.is_voluntary = filing.is_voluntary;
        Ok(stored.clone())
    }

    async fn add_signature(&self, filing_id: i64, action_id: i64) -> Result<()> {
        let action = self
            .actions
            .get(action_id)
            .await?
            .ok_or_else(|| FilingError::NotFound(format!("user action {action_id}")))?;
        let mut inner = self.inner.lock().unwrap();
        let stored = inner
            .1
            .get_mut(&filing_id)
            .ok_or_else(|| FilingError::NotFound(format!("filing {filing_id}")))?;
        stored.signatures.push(action);
        Ok(())
    }
}

struct MemFilingPeriodStore {
    periods: Vec<FilingPeriod>,
}

impl MemFilingPeriodStore {
    fn seeded() -> Self {
        Self {
            periods: vec![FilingPeriod {
                code: PERIOD.to_string(),
                description: format!("Filing period {PERIOD}"),
                start_period: Utc::now(),
                end_period: Utc::now(),
                due: Utc::now(),
                filing_type: FilingType::Annual,
            }],
        }
    }
}

#[async_trait]
impl FilingPeriodStore for MemFilingPeriodStore {
    async fn list(&self) -> Result<Vec<FilingPeriod>> {
        Ok(self.periods.clone())
    }

    async fn get(&self, code: &str) -> Result<Option<FilingPeriod>> {
        Ok(self.periods.iter().find(|p| p.code == code).cloned())
    }
}

struct StubRegistry;

#[async_trait]
impl InstitutionRegistry for StubRegistry {
    async fn get_institution(&self, lei: &str) -> Result<Option<Institution>> {
        Ok(Some(Institution {
            lei: lei.to_string(),
            name: "Test Bank".to_string(),
            tax_id: Some("12-3456789".to_string()),
            lei_status_code: "ISSUED".to_string(),
            can_file: true,
        }))
    }
}

// ── fixture ───────────────────────────────────────────────────────────

struct App {
    router: Router,
    submissions: Arc<MemSubmissionStore>,
    _dir: TempDir,
}

fn settings(root: &Path) -> Settings {
    Settings {
        database_url: String::new(),
        http_addr: "127.0.0.1:0".to_string(),
        upload_root: root.join("uploads"),
        download_root: root.join("reports"),
        expired_check_secs: 5,
        max_upload_bytes: MAX_UPLOAD_BYTES,
        file_type: "text/csv".to_string(),
        file_extension: "csv".to_string(),
        institution_api_url: None,
    }
}

fn app() -> App {
    let dir = TempDir::new().unwrap();
    let submissions = Arc::new(MemSubmissionStore::default());
    let user_actions = Arc::new(MemUserActionStore::default());
    let filings = Arc::new(MemFilingStore::new(user_actions.clone()));
    let uploads = Arc::new(LocalBlobStore::new(dir.path().join("uploads")));
    let reports = Arc::new(LocalBlobStore::new(dir.path().join("reports")));

    let orchestrator = Arc::new(ValidationOrchestrator::new(
        submissions.clone(),
        reports.clone(),
        Arc::new(RegisterRuleValidator::new()),
    ));
    let watchdog = Arc::new(ExpiryWatchdog::new(
        submissions.clone(),
        Duration::from_secs(5),
    ));

    let state = AppState {
        settings: Arc::new(settings(dir.path())),
        periods: Arc::new(MemFilingPeriodStore::seeded()),
        filings,
        submissions: submissions.clone(),
        user_actions,
        institutions: Arc::new(StubRegistry),
        uploads,
        reports,
        orchestrator,
        watchdog,
        actions: Arc::new(ActionRegistry::new()),
    };

    App {
        router: build_router(state),
        submissions,
        _dir: dir,
    }
}

// ── request helpers ───────────────────────────────────────────────────

const BOUNDARY: &str = "filing-test-boundary";

fn filing_uri() -> String {
    format!("/v1/institutions/{LEI}/filings/{PERIOD}")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("x-user-id", USER)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-user-id", USER)
        .body(Body::empty())
        .unwrap()
}

fn put_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("x-user-id", USER)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(uri: &str, filename: &str, content_type: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-user-id", USER)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn wait_for_settled(app: &App, id: i64) -> SubmissionState {
    for _ in 0..300 {
        let state = app.submissions.state_of(id);
        if state.is_terminal() || state.is_acceptable() {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("submission {id} never settled");
}

fn contact_info_json() -> serde_json::Value {
    serde_json::json!({
        "first_name": "Ada",
        "last_name": "Smith",
        "hq_address_street_1": "1 Main St",
        "hq_address_city": "Springfield",
        "hq_address_state": "IL",
        "hq_address_zip": "62701",
        "email": "ada@example.bank",
        "phone": "555-0100",
    })
}

fn clean_register() -> String {
    format!("uid,amount\n{LEI}001,100\n{LEI}002,250\n")
}

// ── tests ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_identity() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_identity_header_is_forbidden() {
    let app = app();
    let (status, body) = send(
        &app.router,
        Request::builder()
            .uri("/v1/periods")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reasons"][0], "x-user-id header is required");
}

#[tokio::test]
async fn periods_are_listed() {
    let app = app();
    let (status, body) = send(&app.router, get("/v1/periods")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["code"], PERIOD);
}

#[tokio::test]
async fn filing_create_fetch_conflict_and_unknown_period() {
    let app = app();

    let (status, body) = send(&app.router, post(&filing_uri())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["lei"], LEI);
    assert_eq!(body["filing_period"], PERIOD);

    let (status, body) = send(&app.router, get(&filing_uri())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lei"], LEI);

    let (status, _) = send(&app.router, post(&filing_uri())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app.router,
        post(&format!("/v1/institutions/{LEI}/filings/1999")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app.router,
        get(&format!("/v1/institutions/{OTHER_LEI}/filings/{PERIOD}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_lifecycle_upload_validate_accept_sign() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;

    let uri = format!("{}/submissions", filing_uri());
    let (status, body) = send(
        &app.router,
        upload_request(&uri, "register.csv", "text/csv", clean_register().as_bytes()),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["state"], "SUBMISSION_UPLOADED");
    assert_eq!(body["counter"], 1);
    let id = body["id"].as_i64().unwrap();

    let settled = wait_for_settled(&app, id).await;
    assert_eq!(settled, SubmissionState::ValidationSuccessful);

    let (status, body) = send(&app.router, get(&format!("{uri}/latest"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "VALIDATION_SUCCESSFUL");
    assert_eq!(body["validation_summary"]["total_records"], 2);
    assert!(body["validation_ruleset_version"].is_string());

    let report = app
        .router
        .clone()
        .oneshot(get(&format!("{uri}/{id}/report")))
        .await
        .unwrap();
    assert_eq!(report.status(), StatusCode::OK);
    assert_eq!(
        report.headers()[header::CONTENT_DISPOSITION].to_str().unwrap(),
        format!("attachment; filename=\"{LEI}-{PERIOD}-{id}_report.csv\"")
    );

    let (status, body) = send(&app.router, post(&format!("{uri}/{id}/accept"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "SUBMISSION_ACCEPTED");
    assert!(body["accepter_id"].is_i64());

    let (status, _) = send(
        &app.router,
        put_json(&format!("{}/contact-info", filing_uri()), contact_info_json()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app.router,
        put_json(
            &format!("{}/is-voluntary", filing_uri()),
            serde_json::json!({ "is_voluntary": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_voluntary"], false);

    let (status, body) = send(
        &app.router,
        put_json(&format!("{}/sign", filing_uri()), serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let confirmation = body["confirmation_id"].as_str().unwrap();
    assert!(confirmation.starts_with(&format!("{LEI}-{PERIOD}-{id}-")));
    assert_eq!(body["signatures"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_with_wrong_content_type_is_unsupported() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;

    let uri = format!("{}/submissions", filing_uri());
    let (status, _) = send(
        &app.router,
        upload_request(&uri, "register.csv", "application/pdf", b"uid\n"),
    )
    .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, _) = send(
        &app.router,
        upload_request(&uri, "register.txt", "text/csv", b"uid\n"),
    )
    .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn oversize_upload_is_rejected_before_a_counter_is_consumed() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;

    let uri = format!("{}/submissions", filing_uri());
    let oversize = vec![b'x'; MAX_UPLOAD_BYTES + 1];
    let (status, _) = send(
        &app.router,
        upload_request(&uri, "register.csv", "text/csv", &oversize),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (_, listed) = send(&app.router, get(&uri)).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn empty_upload_is_invalid() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;

    let uri = format!("{}/submissions", filing_uri());
    let (status, _) = send(
        &app.router,
        upload_request(&uri, "register.csv", "text/csv", b""),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_against_missing_filing_is_unprocessable() {
    let app = app();
    let uri = format!("{}/submissions", filing_uri());
    let (status, _) = send(
        &app.router,
        upload_request(&uri, "register.csv", "text/csv", b"uid\n"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_upload_cannot_be_accepted() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;

    let uri = format!("{}/submissions", filing_uri());
    let (status, body) = send(
        &app.router,
        upload_request(&uri, "register.csv", "text/csv", &[0xff, 0xfe, 0x00, 0x13]),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let id = body["id"].as_i64().unwrap();

    let settled = wait_for_settled(&app, id).await;
    assert_eq!(settled, SubmissionState::SubmissionUploadMalformed);

    let (status, body) = send(&app.router, post(&format!("{uri}/{id}/accept"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let reason = body["reasons"][0].as_str().unwrap();
    assert!(reason.contains("SUBMISSION_UPLOAD_MALFORMED"));
}

#[tokio::test]
async fn only_the_latest_submission_can_be_accepted() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;

    let uri = format!("{}/submissions", filing_uri());
    let (_, body) = send(
        &app.router,
        upload_request(&uri, "register.csv", "text/csv", clean_register().as_bytes()),
    )
    .await;
    let first = body["id"].as_i64().unwrap();
    wait_for_settled(&app, first).await;

    let (_, body) = send(
        &app.router,
        upload_request(&uri, "register.csv", "text/csv", clean_register().as_bytes()),
    )
    .await;
    let second = body["id"].as_i64().unwrap();
    wait_for_settled(&app, second).await;

    let (status, body) = send(&app.router, post(&format!("{uri}/{first}/accept"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["reasons"][0]
        .as_str()
        .unwrap()
        .starts_with("latest_submission:"));

    let (status, _) = send(&app.router, post(&format!("{uri}/{second}/accept"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn sign_without_prerequisites_collects_every_reason() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;

    let (status, body) = send(
        &app.router,
        put_json(&format!("{}/sign", filing_uri()), serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // no accepted submission, no voluntary flag, no contact info
    assert_eq!(body["reasons"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn submissions_are_scoped_to_their_filing() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;
    send(
        &app.router,
        post(&format!("/v1/institutions/{OTHER_LEI}/filings/{PERIOD}")),
    )
    .await;

    let uri = format!("{}/submissions", filing_uri());
    let (_, body) = send(
        &app.router,
        upload_request(&uri, "register.csv", "text/csv", clean_register().as_bytes()),
    )
    .await;
    let id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &app.router,
        get(&format!(
            "/v1/institutions/{OTHER_LEI}/filings/{PERIOD}/submissions/{id}"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn latest_and_report_of_an_empty_filing_are_not_found() {
    let app = app();
    send(&app.router, post(&filing_uri())).await;

    let uri = format!("{}/submissions", filing_uri());
    let (status, _) = send(&app.router, get(&format!("{uri}/latest"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app.router, get(&format!("{uri}/latest/report"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
