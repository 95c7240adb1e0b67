//! filing_server — REST backend for regulatory filing submissions.
//!
//! Reads config from env vars (see `config::Settings`):
//!   DATABASE_URL                — Postgres connection string (required)
//!   FILING_HTTP_ADDR            — listen address (default: 0.0.0.0:8085)
//!   FILING_INSTITUTION_API_URL  — upstream institutions API (required)

use std::sync::Arc;
use std::time::Duration;

use filing_core::{
    FilingPeriodStore, FilingStore, InstitutionRegistry, SubmissionStore, UserActionStore,
};
use filing_engine::{
    BlobStore, ExpiryWatchdog, LocalBlobStore, RegisterRuleValidator, ValidationOrchestrator,
};
use filing_postgres::{PgStores, MIGRATOR};
use filing_server::actions::ActionRegistry;
use filing_server::config::Settings;
use filing_server::institution::HttpInstitutionRegistry;
use filing_server::router::build_router;
use filing_server::state::AppState;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,filing_server=debug".into()),
        )
        .init();

    let settings = Settings::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await?;
    MIGRATOR.run(&pool).await?;
    tracing::info!("Connected to database, migrations applied");

    let stores = PgStores::new(pool);
    let submissions: Arc<dyn SubmissionStore> = Arc::new(stores.submissions);
    let filings: Arc<dyn FilingStore> = Arc::new(stores.filings);
    let periods: Arc<dyn FilingPeriodStore> = Arc::new(stores.periods);
    let user_actions: Arc<dyn UserActionStore> = Arc::new(stores.user_actions);

    let institutions: Arc<dyn InstitutionRegistry> = match &settings.institution_api_url {
        Some(url) => Arc::new(HttpInstitutionRegistry::new(url.clone())),
        None => anyhow::bail!("FILING_INSTITUTION_API_URL must be set"),
    };

    let uploads: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(settings.upload_root.clone()));
    let reports: Arc<dyn BlobStore> =
        Arc::new(LocalBlobStore::new(settings.download_root.clone()));

    let orchestrator = Arc::new(ValidationOrchestrator::new(
        Arc::clone(&submissions),
        Arc::clone(&reports),
        Arc::new(RegisterRuleValidator::new()),
    ));
    let watchdog = Arc::new(ExpiryWatchdog::new(
        Arc::clone(&submissions),
        Duration::from_secs(settings.expired_check_secs),
    ));

    let http_addr = settings.http_addr.clone();
    let state = AppState {
        settings: Arc::new(settings),
        periods,
        filings,
        submissions,
        user_actions,
        institutions,
        uploads,
        reports,
        orchestrator,
        watchdog,
        actions: Arc::new(ActionRegistry::new()),
    };

    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    tracing::info!("filing server listening on {http_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
