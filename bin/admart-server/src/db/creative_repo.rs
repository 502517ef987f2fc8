use admart_models::{Creative, CreativeStatus};
use chrono::Utc;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::row_mappers::FromRow;
use super::{DbError, DbResult};

const CREATIVE_COLUMNS: &str = r"
    id, deal_id, version, content, media_urls,
    status, review_note, submitted_at, reviewed_at, created_at
";

#[derive(Clone)]
pub struct CreativeRepository {
    pool: PgPool,
}

impl CreativeRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new draft for a deal, taking the next version number.
    /// The version is computed and inserted in one statement so
    /// concurrent submissions cannot take the same slot; the UNIQUE
    /// (deal_id, version) constraint backs it up.
    pub async fn create(
        &self,
        deal_id: Uuid,
        content: &str,
        media_urls: &[String],
    ) -> DbResult<Creative> {
        let media_json =
            serde_json::to_value(media_urls).map_err(|e| DbError::InvalidData {
                message: format!("media_urls not serializable: {e}"),
            })?;

        let row = sqlx::query(&format!(
            r"
            INSERT INTO deal_creatives (id, deal_id, version, content, media_urls, status)
            VALUES (
                $1, $2,
                (SELECT COALESCE(MAX(version), 0) + 1 FROM deal_creatives WHERE deal_id = $2),
                $3, $4, 'draft'
            )
            RETURNING {CREATIVE_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(deal_id)
        .bind(content)
        .bind(media_json)
        .fetch_one(&self.pool)
        .await?;

        Creative::from_row(&row)
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Creative> {
        let row = sqlx::query(&format!(
            "SELECT {CREATIVE_COLUMNS} FROM deal_creatives WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Creative::from_row(&row)
    }

    /// All versions for a deal, newest first.
    pub async fn list_for_deal(&self, deal_id: Uuid) -> DbResult<Vec<Creative>> {
        let rows = sqlx::query(&format!(
            "SELECT {CREATIVE_COLUMNS} FROM deal_creatives WHERE deal_id = $1 ORDER BY version DESC"
        ))
        .bind(deal_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Creative::from_row).collect()
    }

    pub async fn latest_for_deal(&self, deal_id: Uuid) -> DbResult<Option<Creative>> {
        let row = sqlx::query(&format!(
            "SELECT {CREATIVE_COLUMNS} FROM deal_creatives WHERE deal_id = $1 ORDER BY version DESC LIMIT 1"
        ))
        .bind(deal_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Creative::from_row).transpose()
    }

    /// The creative the publish job will post: the highest approved
    /// version, if any.
    pub async fn approved_for_deal(&self, deal_id: Uuid) -> DbResult<Option<Creative>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {CREATIVE_COLUMNS} FROM deal_creatives
            WHERE deal_id = $1 AND status = 'approved'
            ORDER BY version DESC
            LIMIT 1
            "
        ))
        .bind(deal_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Creative::from_row).transpose()
    }

    /// Content and media edits; only drafts are editable, enforced by
    /// the WHERE clause so a stray edit on a submitted version is a
    /// NotFound instead of silent corruption.
    pub async fn update_draft(
        &self,
        id: Uuid,
        content: Option<&str>,
        media_urls: Option<&[String]>,
    ) -> DbResult<Creative> {
        let media_json = media_urls
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| DbError::InvalidData {
                message: format!("media_urls not serializable: {e}"),
            })?;

        let row = sqlx::query(&format!(
            r"
            UPDATE deal_creatives
            SET content = COALESCE($2, content),
                media_urls = COALESCE($3, media_urls)
            WHERE id = $1 AND status = 'draft'
            RETURNING {CREATIVE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(content)
        .bind(media_json)
        .fetch_one(&self.pool)
        .await?;

        Creative::from_row(&row)
    }

    /// Draft goes out for review.
    pub async fn mark_submitted(&self, id: Uuid) -> DbResult<Creative> {
        let row = sqlx::query(&format!(
            r"
            UPDATE deal_creatives
            SET status = 'submitted', submitted_at = $2
            WHERE id = $1
            RETURNING {CREATIVE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Creative::from_row(&row)
    }

    /// Advertiser's verdict: `Approved` or `RevisionRequested`.
    pub async fn set_review_verdict(
        &self,
        id: Uuid,
        status: CreativeStatus,
        review_note: Option<&str>,
    ) -> DbResult<Creative> {
        let row = sqlx::query(&format!(
            r"
            UPDATE deal_creatives
            SET status = $2, review_note = $3, reviewed_at = $4
            WHERE id = $1
            RETURNING {CREATIVE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .bind(review_note)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Creative::from_row(&row)
    }
}
