use admart_models::{EscrowWallet, Payment, PaymentKind};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::row_mappers::FromRow;
use super::DbResult;

const PAYMENT_COLUMNS: &str = r"
    id, deal_id, escrow_wallet_id, kind, status,
    amount_ton, from_address, to_address,
    tx_hash, confirmed_at, created_at
";

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_wallet(&self, wallet: &EscrowWallet) -> DbResult<()> {
        sqlx::query(
            r"
            INSERT INTO escrow_wallets (id, address, public_key, private_key, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(wallet.id)
        .bind(&wallet.address)
        .bind(&wallet.public_key)
        .bind(wallet.private_key())
        .bind(wallet.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_wallet(&self, id: Uuid) -> DbResult<EscrowWallet> {
        let row = sqlx::query(
            "SELECT id, address, public_key, private_key, created_at FROM escrow_wallets WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        EscrowWallet::from_row(&row)
    }

    /// Create the escrow-hold payment for a deal, or return the
    /// existing one. A deal has at most one hold (partial unique index
    /// on deal_id), so asking twice for a payment wallet hands back the
    /// same address instead of minting a second wallet.
    pub async fn upsert_escrow_hold(
        &self,
        deal_id: Uuid,
        wallet: &EscrowWallet,
        amount_ton: Decimal,
        from_address: &str,
    ) -> DbResult<Payment> {
        if let Some(existing) = self.escrow_hold_for_deal(deal_id).await? {
            return Ok(existing);
        }

        self.create_wallet(wallet).await?;

        let row = sqlx::query(&format!(
            r"
            INSERT INTO payments (id, deal_id, escrow_wallet_id, kind, status, amount_ton, from_address, to_address)
            VALUES ($1, $2, $3, 'escrow_hold', 'pending', $4, $5, $6)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(deal_id)
        .bind(wallet.id)
        .bind(amount_ton)
        .bind(from_address)
        .bind(&wallet.address)
        .fetch_one(&self.pool)
        .await?;

        Payment::from_row(&row)
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Payment> {
        let row = sqlx::query(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Payment::from_row(&row)
    }

    pub async fn escrow_hold_for_deal(&self, deal_id: Uuid) -> DbResult<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE deal_id = $1 AND kind = 'escrow_hold'"
        ))
        .bind(deal_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Payment::from_row).transpose()
    }

    /// All payment rows for a deal, newest first.
    pub async fn list_for_deal(&self, deal_id: Uuid) -> DbResult<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE deal_id = $1 ORDER BY created_at DESC"
        ))
        .bind(deal_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Payment::from_row).collect()
    }

    /// The payer claims to have sent; polling begins. Safe to call
    /// again on a payment already past `Pending`.
    pub async fn mark_confirming(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            r"
            UPDATE payments
            SET status = 'confirming'
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record the matched inbound transfer. The tx hash is written only
    /// if the row had none, so the first confirmation wins.
    pub async fn mark_confirmed(&self, id: Uuid, tx_hash: Option<&str>) -> DbResult<()> {
        sqlx::query(
            r"
            UPDATE payments
            SET status = 'confirmed',
                tx_hash = COALESCE(tx_hash, $2),
                confirmed_at = COALESCE(confirmed_at, $3)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(tx_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE payments SET status = 'failed' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Record an outbound settlement attempt (payout or refund) as a
    /// pending row before the transfer is broadcast, so a crash between
    /// transfer and bookkeeping still leaves a trace.
    pub async fn create_settlement(
        &self,
        deal_id: Uuid,
        escrow_wallet_id: Uuid,
        kind: PaymentKind,
        amount_ton: Decimal,
        from_address: &str,
        to_address: &str,
    ) -> DbResult<Payment> {
        let row = sqlx::query(&format!(
            r"
            INSERT INTO payments (id, deal_id, escrow_wallet_id, kind, status, amount_ton, from_address, to_address)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(deal_id)
        .bind(escrow_wallet_id)
        .bind(kind)
        .bind(amount_ton)
        .bind(from_address)
        .bind(to_address)
        .fetch_one(&self.pool)
        .await?;

        Payment::from_row(&row)
    }

    pub async fn settlement_for_deal(
        &self,
        deal_id: Uuid,
        kind: PaymentKind,
    ) -> DbResult<Option<Payment>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE deal_id = $1 AND kind = $2
            ORDER BY created_at DESC
            LIMIT 1
            "
        ))
        .bind(deal_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Payment::from_row).transpose()
    }
}
