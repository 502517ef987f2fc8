use admart_models::{Deal, DealStatus, SettlementOutcome};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::row_mappers::FromRow;
use super::DbResult;

const DEAL_COLUMNS: &str = r"
    id, application_id, channel_id, advertiser_tg_id,
    ad_format, agreed_price, status,
    scheduled_post_at, min_post_duration_hours,
    completed_at, cancelled_at, tg_post_id,
    created_at, updated_at
";

#[derive(Clone)]
pub struct DealRepository {
    pool: PgPool,
}

impl DealRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, deal: &Deal) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO deals (
                id, application_id, channel_id, advertiser_tg_id,
                ad_format, agreed_price, status,
                scheduled_post_at, min_post_duration_hours,
                completed_at, cancelled_at, tg_post_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(deal.id)
        .bind(deal.application_id)
        .bind(deal.channel_id)
        .bind(deal.advertiser_tg_id)
        .bind(deal.ad_format)
        .bind(deal.agreed_price)
        .bind(deal.status)
        .bind(deal.scheduled_post_at)
        .bind(deal.min_post_duration_hours)
        .bind(deal.completed_at)
        .bind(deal.cancelled_at)
        .bind(deal.tg_post_id)
        .bind(deal.created_at)
        .bind(deal.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Deal> {
        let row = sqlx::query(&format!("SELECT {DEAL_COLUMNS} FROM deals WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Deal::from_row(&row)
    }

    pub async fn list_by_status(&self, status: DealStatus) -> DbResult<Vec<Deal>> {
        let rows = sqlx::query(&format!(
            "SELECT {DEAL_COLUMNS} FROM deals WHERE status = $1 ORDER BY created_at"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Deal::from_row).collect()
    }

    async fn persist(&self, deal: &Deal) -> DbResult<()> {
        sqlx::query(
            r"
            UPDATE deals
            SET status = $2,
                completed_at = $3,
                cancelled_at = $4,
                tg_post_id = $5,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(deal.id)
        .bind(deal.status)
        .bind(deal.completed_at)
        .bind(deal.cancelled_at)
        .bind(deal.tg_post_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load, apply the transition, persist. All lifecycle moves go
    /// through these helpers so the transition rules are never
    /// bypassed by a raw status update.
    pub async fn transition_creative_submitted(&self, id: Uuid) -> DbResult<Deal> {
        let mut deal = self.get(id).await?;
        deal.creative_submitted()
            .map_err(|source| super::DbError::InvalidState { source })?;
        self.persist(&deal).await?;
        Ok(deal)
    }

    pub async fn transition_creative_approved(&self, id: Uuid) -> DbResult<Deal> {
        let mut deal = self.get(id).await?;
        deal.creative_approved()
            .map_err(|source| super::DbError::InvalidState { source })?;
        self.persist(&deal).await?;
        Ok(deal)
    }

    pub async fn transition_payment_confirmed(&self, id: Uuid) -> DbResult<Deal> {
        let mut deal = self.get(id).await?;
        deal.payment_confirmed()
            .map_err(|source| super::DbError::InvalidState { source })?;
        self.persist(&deal).await?;
        Ok(deal)
    }

    pub async fn transition_posted(&self, id: Uuid, tg_post_id: i64) -> DbResult<Deal> {
        let mut deal = self.get(id).await?;
        deal.mark_posted(tg_post_id)
            .map_err(|source| super::DbError::InvalidState { source })?;
        self.persist(&deal).await?;
        Ok(deal)
    }

    pub async fn transition_settled(
        &self,
        id: Uuid,
        outcome: SettlementOutcome,
    ) -> DbResult<Deal> {
        let mut deal = self.get(id).await?;
        deal.settle(outcome)
            .map_err(|source| super::DbError::InvalidState { source })?;
        self.persist(&deal).await?;
        Ok(deal)
    }
}
