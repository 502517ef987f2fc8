use admart_models::{
    AdApplication, AdRequest, AdRequestStatus, ApplicationStatus, Channel,
};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::row_mappers::FromRow;
use super::DbResult;

#[derive(Clone)]
pub struct AdRepository {
    pool: PgPool,
}

impl AdRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_channel(&self, channel: &Channel) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO channels (id, tg_id, title, tg_link, wallet_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(channel.id)
        .bind(channel.tg_id)
        .bind(&channel.title)
        .bind(&channel.tg_link)
        .bind(&channel.wallet_address)
        .bind(channel.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_channel(&self, id: Uuid) -> DbResult<Channel> {
        let row = sqlx::query(
            "SELECT id, tg_id, title, tg_link, wallet_address, created_at FROM channels WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Channel::from_row(&row)
    }

    pub async fn create_request(&self, request: &AdRequest) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO ad_requests (
                id, title, budget, ad_format, deadline,
                advertiser_tg_id, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(request.id)
        .bind(&request.title)
        .bind(request.budget)
        .bind(request.ad_format)
        .bind(request.deadline)
        .bind(request.advertiser_tg_id)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_request(&self, id: Uuid) -> DbResult<AdRequest> {
        let row = sqlx::query(
            r"
            SELECT id, title, budget, ad_format, deadline,
                   advertiser_tg_id, status, created_at, updated_at
            FROM ad_requests WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        AdRequest::from_row(&row)
    }

    pub async fn update_request_status(
        &self,
        id: Uuid,
        status: AdRequestStatus,
    ) -> DbResult<()> {
        sqlx::query(
            r"
            UPDATE ad_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create_application(&self, application: &AdApplication) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO ad_applications (id, ad_request_id, channel_id, status, applied_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(application.id)
        .bind(application.ad_request_id)
        .bind(application.channel_id)
        .bind(application.status)
        .bind(application.applied_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_application(&self, id: Uuid) -> DbResult<AdApplication> {
        let row = sqlx::query(
            "SELECT id, ad_request_id, channel_id, status, applied_at FROM ad_applications WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        AdApplication::from_row(&row)
    }

    pub async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> DbResult<()> {
        sqlx::query("UPDATE ad_applications SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Competing applications are closed out when one is accepted.
    pub async fn reject_other_applications(
        &self,
        ad_request_id: Uuid,
        accepted_id: Uuid,
    ) -> DbResult<()> {
        sqlx::query(
            r"
            UPDATE ad_applications
            SET status = 'rejected'
            WHERE ad_request_id = $1 AND id <> $2 AND status = 'pending'
            ",
        )
        .bind(ad_request_id)
        .bind(accepted_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
