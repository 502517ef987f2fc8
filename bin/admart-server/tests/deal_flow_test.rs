//! End-to-end lifecycle test: accept an application, review a
//! creative, fund the escrow, and let the job queues carry the deal
//! through publication, the aliveness check and settlement, all over
//! real HTTP against mock gateways.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admart_gateways::{
    BlockchainGateway, MessagingGateway, PostedMessage, TransferCheck, TransferOutcome,
};
use admart_jobs::{QueueOptions, RetryPolicy};
use admart_models::{
    AdApplication, AdFormat, AdRequest, AdRequestStatus, ApplicationStatus, Channel,
    EscrowWallet,
};
use admart_server::db::Database;
use admart_server::server::{router, AppState};
use admart_server::services::{DealJobs, DealManager, JobTuning};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Default)]
struct MockChain {
    checks: Mutex<VecDeque<TransferCheck>>,
    transfers: Mutex<Vec<(String, Decimal)>>,
}

#[async_trait]
impl BlockchainGateway for MockChain {
    fn create_escrow_wallet(&self) -> admart_gateways::Result<EscrowWallet> {
        let suffix = Uuid::new_v4().simple().to_string();
        Ok(EscrowWallet::new(
            Uuid::new_v4(),
            format!("0:{suffix}"),
            "test_public_key".to_string(),
            "test_private_key".to_string(),
            Utc::now(),
        ))
    }

    async fn check_incoming_transfer(
        &self,
        _to_address: &str,
        _from_address: &str,
        _min_amount: Decimal,
    ) -> admart_gateways::Result<TransferCheck> {
        Ok(self
            .checks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(TransferCheck::not_received))
    }

    async fn transfer(
        &self,
        _wallet: &EscrowWallet,
        to_address: &str,
        amount: Decimal,
    ) -> TransferOutcome {
        self.transfers
            .lock()
            .unwrap()
            .push((to_address.to_string(), amount));
        TransferOutcome::sent("settlement_tx".to_string())
    }
}

struct MockMessaging {
    next_id: AtomicI64,
    alive: AtomicBool,
}

impl Default for MockMessaging {
    fn default() -> Self {
        Self {
            next_id: AtomicI64::new(5000),
            alive: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl MessagingGateway for MockMessaging {
    async fn send_message(
        &self,
        _channel_tg_id: i64,
        _content: &str,
    ) -> admart_gateways::Result<i64> {
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn fetch_message(
        &self,
        _channel_tg_id: i64,
        message_id: i64,
    ) -> admart_gateways::Result<Option<PostedMessage>> {
        Ok(self.alive.load(Ordering::SeqCst).then(|| PostedMessage {
            id: message_id,
            date: Some(Utc::now()),
        }))
    }
}

struct App {
    base: String,
    http: reqwest::Client,
    db: Database,
    chain: Arc<MockChain>,
    messaging: Arc<MockMessaging>,
}

impl App {
    async fn start(pool: PgPool) -> Self {
        let db = Database::from_pool(pool).await.unwrap();
        let chain = Arc::new(MockChain::default());
        let messaging = Arc::new(MockMessaging::default());

        let manager = Arc::new(DealManager::new(
            db.clone(),
            Arc::clone(&chain) as Arc<dyn BlockchainGateway>,
            Arc::clone(&messaging) as Arc<dyn MessagingGateway>,
        ));
        // Production intervals shrunk to milliseconds so the whole
        // lifecycle runs in a few seconds of wall clock.
        let tuning = JobTuning {
            confirmation: QueueOptions {
                concurrency: 5,
                retry: RetryPolicy::fixed(100, Duration::from_millis(50)),
            },
            publish: QueueOptions {
                concurrency: 3,
                retry: RetryPolicy::fixed(3, Duration::from_millis(50)),
            },
            aliveness: QueueOptions {
                concurrency: 2,
                retry: RetryPolicy::fixed(3, Duration::from_millis(50)),
            },
            aliveness_delay: Duration::from_millis(100),
        };
        let jobs = Arc::new(DealJobs::with_tuning(Arc::clone(&manager), tuning));

        let state = AppState {
            db: db.clone(),
            manager,
            jobs,
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            http: reqwest::Client::new(),
            db,
            chain,
            messaging,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn patch(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .http
            .patch(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .http
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }
}

/// Channel + open ad request + pending application, seeded straight
/// through the repos.
async fn seed_funnel(db: &Database, deadline_in: Duration) -> (Channel, AdRequest, AdApplication) {
    let channel = Channel {
        id: Uuid::new_v4(),
        tg_id: rand::random::<i64>().abs(),
        title: Some("Crypto Daily".to_string()),
        tg_link: "https://t.me/crypto_daily".to_string(),
        wallet_address: Some("EQOwnerPayoutAddress".to_string()),
        created_at: Utc::now(),
    };
    let request = AdRequest {
        id: Uuid::new_v4(),
        title: "Promote our wallet app".to_string(),
        budget: dec!(100),
        ad_format: AdFormat::Post,
        deadline: Utc::now() + chrono::Duration::from_std(deadline_in).unwrap(),
        advertiser_tg_id: 9_007_199_254_740_993,
        status: AdRequestStatus::Open,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let application = AdApplication {
        id: Uuid::new_v4(),
        ad_request_id: request.id,
        channel_id: channel.id,
        status: ApplicationStatus::Pending,
        applied_at: Utc::now(),
    };

    let ads = db.ads();
    ads.create_channel(&channel).await.unwrap();
    ads.create_request(&request).await.unwrap();
    ads.create_application(&application).await.unwrap();
    (channel, request, application)
}

async fn wait_for_status(db: &Database, deal_id: Uuid, wanted: &str) {
    for _ in 0..200 {
        let deal = db.deals().get(deal_id).await.unwrap();
        if serde_json::to_value(deal.status).unwrap() == json!(wanted) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("deal {deal_id} never reached {wanted}");
}

#[sqlx::test]
async fn full_lifecycle_ends_in_payout(pool: PgPool) {
    let app = App::start(pool).await;
    let (_, request, application) = seed_funnel(&app.db, Duration::from_secs(2)).await;

    // Advertiser accepts the application; the deal is born.
    let (status, body) = app
        .post(
            &format!("/ads/{}/applications/{}", request.id, application.id),
            json!({ "status": "accepted" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "success");
    let deal = &body["data"]["deal"];
    // Telegram ids cross the wire as strings.
    assert_eq!(deal["advertiser_tg_id"], json!("9007199254740993"));
    assert_eq!(deal["agreed_price"], json!("100"));
    assert_eq!(deal["status"], json!("awaiting_creative"));
    let deal_id: Uuid = serde_json::from_value(deal["id"].clone()).unwrap();

    // Channel owner drafts and submits a creative.
    let (status, body) = app
        .post(
            &format!("/deals/{deal_id}/creatives"),
            json!({ "content": "Try the wallet app today" }),
        )
        .await;
    assert_eq!(status, 200);
    let creative_id: Uuid = serde_json::from_value(body["data"]["id"].clone()).unwrap();

    let (status, _) = app
        .patch(&format!("/creatives/{creative_id}"), json!({ "status": "submitted" }))
        .await;
    assert_eq!(status, 200);

    // Advertiser approves; the payment stage opens.
    let (status, _) = app
        .patch(&format!("/creatives/{creative_id}"), json!({ "status": "approved" }))
        .await;
    assert_eq!(status, 200);

    let (status, body) = app
        .post(
            &format!("/deals/{deal_id}/get-payment-wallet"),
            json!({ "user_wallet": "EQAdvertiserWallet" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], json!("pending"));
    let escrow_address = body["data"]["to_address"].as_str().unwrap().to_string();

    // Two empty polling windows, then the deposit shows up.
    app.chain.checks.lock().unwrap().extend([
        TransferCheck::not_received(),
        TransferCheck::not_received(),
        TransferCheck {
            received: true,
            tx_hash: Some("deposit_tx".to_string()),
        },
    ]);
    app.messaging.alive.store(true, Ordering::SeqCst);

    let (status, body) = app
        .post(&format!("/deals/{deal_id}/submit-transaction"), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], json!("confirming"));

    // Confirmation -> publication at the deadline -> aliveness -> payout.
    wait_for_status(&app.db, deal_id, "completed").await;

    let deal = app.db.deals().get(deal_id).await.unwrap();
    assert!(deal.tg_post_id.is_some());
    assert!(deal.completed_at.is_some());
    assert!(deal.cancelled_at.is_none());

    // Exactly one payout of the agreed price to the owner's wallet.
    let transfers = app.chain.transfers.lock().unwrap().clone();
    assert_eq!(transfers, vec![("EQOwnerPayoutAddress".to_string(), dec!(100))]);

    // The originating ad request closed with the deal.
    let request = app.db.ads().get_request(request.id).await.unwrap();
    assert_eq!(request.status, AdRequestStatus::Completed);

    // Latest payment row is the confirmed payout.
    let (status, body) = app.get(&format!("/deals/{deal_id}/get-payment")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["kind"], json!("release_to_owner"));
    assert_eq!(body["data"]["status"], json!("confirmed"));
    // The payout leaves from the escrow wallet.
    assert_eq!(body["data"]["from_address"], json!(escrow_address));
}

#[sqlx::test]
async fn unknown_deal_yields_error_envelope(pool: PgPool) {
    let app = App::start(pool).await;

    let (status, body) = app.get(&format!("/deals/{}", Uuid::new_v4())).await;
    assert_eq!(status, 404);
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());
}

#[sqlx::test]
async fn double_acceptance_is_rejected(pool: PgPool) {
    let app = App::start(pool).await;
    let (_, request, application) = seed_funnel(&app.db, Duration::from_secs(60)).await;

    let path = format!("/ads/{}/applications/{}", request.id, application.id);
    let (status, _) = app.post(&path, json!({ "status": "accepted" })).await;
    assert_eq!(status, 200);

    // The application is no longer pending; a second accept conflicts.
    let (status, body) = app.post(&path, json!({ "status": "accepted" })).await;
    assert_eq!(status, 409);
    assert_eq!(body["status"], "error");
}
