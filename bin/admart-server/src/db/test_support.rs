//! Shared fixtures for the repository tests.

use admart_models::{
    AdApplication, AdFormat, AdRequest, AdRequestStatus, ApplicationStatus, Channel, Deal,
    DealStatus, EscrowWallet,
};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::Database;

pub struct FunnelSeed {
    pub channel: Channel,
    pub request: AdRequest,
    pub application: AdApplication,
}

pub fn channel_fixture() -> Channel {
    Channel {
        id: Uuid::new_v4(),
        tg_id: rand::random::<i64>().abs(),
        title: Some("Crypto Daily".to_string()),
        tg_link: "https://t.me/crypto_daily".to_string(),
        wallet_address: Some("EQOwnerPayoutAddress".to_string()),
        created_at: Utc::now(),
    }
}

pub fn request_fixture() -> AdRequest {
    AdRequest {
        id: Uuid::new_v4(),
        title: "Promote our wallet app".to_string(),
        budget: dec!(100),
        ad_format: AdFormat::Post,
        deadline: Utc::now() + Duration::days(7),
        advertiser_tg_id: 123_456_789,
        status: AdRequestStatus::Open,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn application_fixture(ad_request_id: Uuid, channel_id: Uuid) -> AdApplication {
    AdApplication {
        id: Uuid::new_v4(),
        ad_request_id,
        channel_id,
        status: ApplicationStatus::Pending,
        applied_at: Utc::now(),
    }
}

pub fn deal_fixture(seed: &FunnelSeed) -> Deal {
    Deal {
        id: Uuid::new_v4(),
        application_id: seed.application.id,
        channel_id: seed.channel.id,
        advertiser_tg_id: seed.request.advertiser_tg_id,
        ad_format: seed.request.ad_format,
        agreed_price: seed.request.budget,
        status: DealStatus::AwaitingCreative,
        scheduled_post_at: seed.request.deadline,
        min_post_duration_hours: 24,
        completed_at: None,
        cancelled_at: None,
        tg_post_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn wallet_fixture() -> EscrowWallet {
    let suffix = Uuid::new_v4().simple().to_string();
    EscrowWallet::new(
        Uuid::new_v4(),
        format!("0:{suffix}"),
        "test_public_key".to_string(),
        "test_private_key".to_string(),
        Utc::now(),
    )
}

/// Channel + open request + pending application, persisted.
pub async fn seed_funnel(db: &Database) -> FunnelSeed {
    let channel = channel_fixture();
    let request = request_fixture();
    let application = application_fixture(request.id, channel.id);

    let ads = db.ads();
    ads.create_channel(&channel).await.unwrap();
    ads.create_request(&request).await.unwrap();
    ads.create_application(&application).await.unwrap();

    FunnelSeed {
        channel,
        request,
        application,
    }
}

/// A persisted deal in `AwaitingCreative`, with its full funnel behind it.
pub async fn seed_deal(db: &Database) -> Deal {
    let seed = seed_funnel(db).await;
    let deal = deal_fixture(&seed);
    db.deals().create(&deal).await.unwrap();
    deal
}
