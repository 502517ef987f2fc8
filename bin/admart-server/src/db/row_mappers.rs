use admart_models::{
    AdApplication, AdRequest, Channel, Creative, Deal, EscrowWallet, Payment,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{DbError, DbResult};

pub trait FromRow<'r>: Sized {
    fn from_row(row: &'r PgRow) -> DbResult<Self>;
}

impl<'r> FromRow<'r> for Deal {
    fn from_row(row: &'r PgRow) -> DbResult<Self> {
        Ok(Deal {
            id: row.try_get("id")?,
            application_id: row.try_get("application_id")?,
            channel_id: row.try_get("channel_id")?,
            advertiser_tg_id: row.try_get("advertiser_tg_id")?,
            ad_format: row.try_get("ad_format")?,
            agreed_price: row.try_get::<Decimal, _>("agreed_price")?,
            status: row.try_get("status")?,
            scheduled_post_at: row.try_get("scheduled_post_at")?,
            min_post_duration_hours: row.try_get("min_post_duration_hours")?,
            completed_at: row.try_get("completed_at")?,
            cancelled_at: row.try_get("cancelled_at")?,
            tg_post_id: row.try_get("tg_post_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r> for Creative {
    fn from_row(row: &'r PgRow) -> DbResult<Self> {
        let media_urls: serde_json::Value = row.try_get("media_urls")?;
        let media_urls: Vec<String> =
            serde_json::from_value(media_urls).map_err(|e| DbError::InvalidData {
                message: format!("media_urls is not a string array: {e}"),
            })?;

        Ok(Creative {
            id: row.try_get("id")?,
            deal_id: row.try_get("deal_id")?,
            version: row.try_get("version")?,
            content: row.try_get("content")?,
            media_urls,
            status: row.try_get("status")?,
            review_note: row.try_get("review_note")?,
            submitted_at: row.try_get("submitted_at")?,
            reviewed_at: row.try_get("reviewed_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r> for Payment {
    fn from_row(row: &'r PgRow) -> DbResult<Self> {
        Ok(Payment {
            id: row.try_get("id")?,
            deal_id: row.try_get("deal_id")?,
            escrow_wallet_id: row.try_get("escrow_wallet_id")?,
            kind: row.try_get("kind")?,
            status: row.try_get("status")?,
            amount_ton: row.try_get::<Decimal, _>("amount_ton")?,
            from_address: row.try_get("from_address")?,
            to_address: row.try_get("to_address")?,
            tx_hash: row.try_get("tx_hash")?,
            confirmed_at: row.try_get("confirmed_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r> for EscrowWallet {
    fn from_row(row: &'r PgRow) -> DbResult<Self> {
        let id: Uuid = row.try_get("id")?;
        let address: String = row.try_get("address")?;
        let public_key: String = row.try_get("public_key")?;
        let private_key: String = row.try_get("private_key")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(EscrowWallet::new(
            id, address, public_key, private_key, created_at,
        ))
    }
}

impl<'r> FromRow<'r> for AdRequest {
    fn from_row(row: &'r PgRow) -> DbResult<Self> {
        Ok(AdRequest {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            budget: row.try_get::<Decimal, _>("budget")?,
            ad_format: row.try_get("ad_format")?,
            deadline: row.try_get("deadline")?,
            advertiser_tg_id: row.try_get("advertiser_tg_id")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r> for AdApplication {
    fn from_row(row: &'r PgRow) -> DbResult<Self> {
        Ok(AdApplication {
            id: row.try_get("id")?,
            ad_request_id: row.try_get("ad_request_id")?,
            channel_id: row.try_get("channel_id")?,
            status: row.try_get("status")?,
            applied_at: row.try_get("applied_at")?,
        })
    }
}

impl<'r> FromRow<'r> for Channel {
    fn from_row(row: &'r PgRow) -> DbResult<Self> {
        Ok(Channel {
            id: row.try_get("id")?,
            tg_id: row.try_get("tg_id")?,
            title: row.try_get("title")?,
            tg_link: row.try_get("tg_link")?,
            wallet_address: row.try_get("wallet_address")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
