use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use snafu::ResultExt;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::api;
use crate::config::Settings;
use crate::db::Database;
use crate::services::{DealJobs, DealManager};
use crate::{
    AdmartServerArgs, DatabaseInitSnafu, Result, ServerBindSnafu, ServerStartSnafu, SettingsSnafu,
};
use admart_gateways::{BlockchainGateway, DelegatedSession, MessagingGateway, TonGateway};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub manager: Arc<DealManager>,
    pub jobs: Arc<DealJobs>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route(
            "/ads/:id/applications/:application_id",
            post(api::applications::review_application),
        )
        .route("/deals/:id", get(api::deals::get_deal))
        .route(
            "/deals/:id/creatives",
            post(api::creatives::submit_creative).get(api::creatives::list_creatives),
        )
        .route("/creatives/:id", patch(api::creatives::update_creative))
        .route(
            "/deals/:id/get-payment-wallet",
            post(api::deals::get_payment_wallet),
        )
        .route(
            "/deals/:id/submit-transaction",
            post(api::deals::submit_transaction),
        )
        .route("/deals/:id/get-payment", get(api::deals::get_payment))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": { "healthy": true },
    }))
}

pub async fn run_server(args: AdmartServerArgs) -> Result<()> {
    let settings = Settings::load().context(SettingsSnafu)?;

    let db = Database::connect(&args.database_url)
        .await
        .context(DatabaseInitSnafu)?;

    let blockchain: Arc<dyn BlockchainGateway> = Arc::new(TonGateway::new(
        settings.toncenter_url,
        settings.toncenter_api_key,
    ));
    let messaging: Arc<dyn MessagingGateway> = Arc::new(DelegatedSession::new(
        settings.session_bridge_url,
        settings.session_token,
    ));

    let manager = Arc::new(DealManager::new(db.clone(), blockchain, messaging));
    let jobs = Arc::new(DealJobs::new(Arc::clone(&manager)));

    let state = AppState { db, manager, jobs };
    let app = router(state);

    let addr = SocketAddr::from((args.host, args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(ServerBindSnafu)?;
    info!("admart server listening on {addr}");

    axum::serve(listener, app).await.context(ServerStartSnafu)
}
