use std::sync::Arc;

use admart_gateways::{BlockchainGateway, MessagingGateway};
use admart_models::{
    AdRequestStatus, ApplicationStatus, Deal, DealStatus, Payment, PaymentKind, PaymentStatus,
    SettlementOutcome,
};
use chrono::Utc;
use snafu::{ensure, OptionExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{PreconditionSnafu, ServiceResult};
use crate::db::Database;

/// Outcome of one confirmation poll.
#[derive(Debug)]
pub enum ConfirmationCheck {
    /// Deposit matched; the deal is now scheduled.
    Confirmed(Deal),
    /// Nothing on chain yet; poll again later.
    NotSeen,
}

/// All deal lifecycle side effects live here: the HTTP handlers and
/// the job handlers both call into this service, so state changes,
/// gateway calls and bookkeeping stay in one place.
pub struct DealManager {
    db: Database,
    blockchain: Arc<dyn BlockchainGateway>,
    messaging: Arc<dyn MessagingGateway>,
}

impl DealManager {
    pub fn new(
        db: Database,
        blockchain: Arc<dyn BlockchainGateway>,
        messaging: Arc<dyn MessagingGateway>,
    ) -> Self {
        Self {
            db,
            blockchain,
            messaging,
        }
    }

    /// Advertiser accepts an application: the application flips to
    /// accepted, its rivals are rejected, the ad request moves to
    /// in-progress, and the deal is born copying price, format and
    /// deadline from the request.
    pub async fn accept_application(
        &self,
        ad_request_id: Uuid,
        application_id: Uuid,
    ) -> ServiceResult<Deal> {
        let ads = self.db.ads();
        let application = ads.get_application(application_id).await?;
        ensure!(
            application.ad_request_id == ad_request_id,
            PreconditionSnafu {
                message: "application does not belong to this ad request",
            }
        );
        ensure!(
            application.status == ApplicationStatus::Pending,
            PreconditionSnafu {
                message: format!("application is already {:?}", application.status),
            }
        );

        let request = ads.get_request(ad_request_id).await?;
        ensure!(
            request.status == AdRequestStatus::Open,
            PreconditionSnafu {
                message: format!("ad request is {:?}, not open", request.status),
            }
        );

        ads.update_application_status(application_id, ApplicationStatus::Accepted)
            .await?;
        ads.reject_other_applications(ad_request_id, application_id)
            .await?;
        ads.update_request_status(ad_request_id, AdRequestStatus::InProgress)
            .await?;

        let now = Utc::now();
        let deal = Deal {
            id: Uuid::new_v4(),
            application_id,
            channel_id: application.channel_id,
            advertiser_tg_id: request.advertiser_tg_id,
            ad_format: request.ad_format,
            agreed_price: request.budget,
            status: DealStatus::AwaitingCreative,
            scheduled_post_at: request.deadline,
            min_post_duration_hours: 24,
            completed_at: None,
            cancelled_at: None,
            tg_post_id: None,
            created_at: now,
            updated_at: now,
        };
        self.db.deals().create(&deal).await?;

        info!(deal_id = %deal.id, ad_request_id = %ad_request_id, "deal created");
        Ok(deal)
    }

    pub async fn reject_application(
        &self,
        ad_request_id: Uuid,
        application_id: Uuid,
    ) -> ServiceResult<()> {
        let ads = self.db.ads();
        let application = ads.get_application(application_id).await?;
        ensure!(
            application.ad_request_id == ad_request_id,
            PreconditionSnafu {
                message: "application does not belong to this ad request",
            }
        );

        ads.update_application_status(application_id, ApplicationStatus::Rejected)
            .await?;
        Ok(())
    }

    /// Mint an escrow wallet for the deal (or return the existing
    /// one) and record the pending escrow-hold payment the payer must
    /// fund.
    pub async fn request_payment_wallet(
        &self,
        deal_id: Uuid,
        user_wallet: &str,
    ) -> ServiceResult<Payment> {
        let deal = self.db.deals().get(deal_id).await?;
        ensure!(
            deal.status == DealStatus::AwaitingPayment,
            PreconditionSnafu {
                message: format!("deal is {:?}, not awaiting payment", deal.status),
            }
        );

        let wallet = self.blockchain.create_escrow_wallet()?;
        let payment = self
            .db
            .payments()
            .upsert_escrow_hold(deal_id, &wallet, deal.agreed_price, user_wallet)
            .await?;

        info!(deal_id = %deal_id, escrow = %payment.to_address, "payment wallet issued");
        Ok(payment)
    }

    /// The payer claims the transfer went out; start polling the
    /// chain. Re-submitting is harmless, the payment just stays
    /// confirming.
    pub async fn submit_transaction(&self, deal_id: Uuid) -> ServiceResult<Payment> {
        let payments = self.db.payments();
        let payment = payments
            .escrow_hold_for_deal(deal_id)
            .await?
            .context(PreconditionSnafu {
                message: "no payment wallet was issued for this deal",
            })?;

        payments.mark_confirming(payment.id).await?;
        payments.get(payment.id).await.map_err(Into::into)
    }

    /// One confirmation poll: scan the escrow address for the payer's
    /// deposit. Called by the confirmation job every interval.
    pub async fn confirm_payment(
        &self,
        deal_id: Uuid,
        payment_id: Uuid,
    ) -> ServiceResult<ConfirmationCheck> {
        let payments = self.db.payments();
        let payment = payments.get(payment_id).await?;

        // A poll raced a previous confirmation; nothing left to do.
        if payment.status == PaymentStatus::Confirmed {
            let deal = self.db.deals().get(deal_id).await?;
            return Ok(ConfirmationCheck::Confirmed(deal));
        }

        let check = self
            .blockchain
            .check_incoming_transfer(
                &payment.to_address,
                &payment.from_address,
                payment.amount_ton,
            )
            .await?;

        if !check.received {
            return Ok(ConfirmationCheck::NotSeen);
        }

        payments
            .mark_confirmed(payment_id, check.tx_hash.as_deref())
            .await?;
        let deal = self.db.deals().transition_payment_confirmed(deal_id).await?;

        info!(deal_id = %deal_id, tx_hash = ?check.tx_hash, "escrow deposit confirmed");
        Ok(ConfirmationCheck::Confirmed(deal))
    }

    /// Publish the approved creative to the channel. Preconditions
    /// (approved creative, active session) failing leave the deal
    /// untouched.
    pub async fn publish_post(&self, deal_id: Uuid) -> ServiceResult<Deal> {
        let deal = self.db.deals().get(deal_id).await?;
        ensure!(
            deal.status == DealStatus::Scheduled,
            PreconditionSnafu {
                message: format!("deal is {:?}, not scheduled", deal.status),
            }
        );

        let creative = self
            .db
            .creatives()
            .approved_for_deal(deal_id)
            .await?
            .context(PreconditionSnafu {
                message: "deal has no approved creative",
            })?;

        let channel = self.db.ads().get_channel(deal.channel_id).await?;

        let mut content = creative.content.clone();
        for url in &creative.media_urls {
            content.push('\n');
            content.push_str(url);
        }

        let tg_post_id = self.messaging.send_message(channel.tg_id, &content).await?;
        let deal = self.db.deals().transition_posted(deal_id, tg_post_id).await?;

        info!(deal_id = %deal_id, tg_post_id, "creative published");
        Ok(deal)
    }

    /// The holding period elapsed; decide the deal by whether the post
    /// is still live.
    pub async fn verify_post_aliveness(
        &self,
        deal_id: Uuid,
        post_id: i64,
    ) -> ServiceResult<Deal> {
        let deal = self.db.deals().get(deal_id).await?;
        if deal.is_terminal() {
            return Ok(deal);
        }

        let channel = self.db.ads().get_channel(deal.channel_id).await?;
        let message = self.messaging.fetch_message(channel.tg_id, post_id).await?;

        let outcome = if message.is_some() {
            SettlementOutcome::Completed
        } else {
            warn!(deal_id = %deal_id, post_id, "post removed before the holding period ended");
            SettlementOutcome::Cancelled
        };

        self.settle_deal(deal_id, outcome).await
    }

    /// Close the deal and move the escrow.
    ///
    /// Idempotent: an already-terminal deal is returned as-is and no
    /// second transfer is attempted. The settlement payment row is
    /// written as pending before the transfer goes out, so a crash in
    /// between leaves a reconciliation record instead of silence.
    pub async fn settle_deal(
        &self,
        deal_id: Uuid,
        outcome: SettlementOutcome,
    ) -> ServiceResult<Deal> {
        let deals = self.db.deals();
        let existing = deals.get(deal_id).await?;
        if existing.is_terminal() {
            return Ok(existing);
        }

        let deal = deals.transition_settled(deal_id, outcome).await?;

        // Mirror the outcome onto the originating ad request.
        let ads = self.db.ads();
        let application = ads.get_application(deal.application_id).await?;
        let request_status = match outcome {
            SettlementOutcome::Completed => AdRequestStatus::Completed,
            SettlementOutcome::Cancelled => AdRequestStatus::Cancelled,
        };
        ads.update_request_status(application.ad_request_id, request_status)
            .await?;

        let payments = self.db.payments();
        let Some(hold) = payments.escrow_hold_for_deal(deal_id).await? else {
            // Nothing was ever escrowed (settled before funding).
            return Ok(deal);
        };

        let (kind, recipient) = match outcome {
            SettlementOutcome::Completed => {
                let channel = ads.get_channel(deal.channel_id).await?;
                match channel.wallet_address {
                    Some(address) => (PaymentKind::ReleaseToOwner, address),
                    None => {
                        // Funds stay in escrow until the owner registers
                        // a payout address; operator reconciles manually.
                        error!(deal_id = %deal_id, "channel has no payout address, escrow not released");
                        return Ok(deal);
                    }
                }
            }
            SettlementOutcome::Cancelled => (PaymentKind::Refund, hold.from_address.clone()),
        };

        let wallet = payments.get_wallet(hold.escrow_wallet_id).await?;
        let settlement = payments
            .create_settlement(
                deal_id,
                hold.escrow_wallet_id,
                kind,
                hold.amount_ton,
                &wallet.address,
                &recipient,
            )
            .await?;

        let transfer = self
            .blockchain
            .transfer(&wallet, &recipient, hold.amount_ton)
            .await;

        if transfer.success {
            payments
                .mark_confirmed(settlement.id, transfer.tx_hash.as_deref())
                .await?;
            info!(deal_id = %deal_id, ?kind, tx_hash = ?transfer.tx_hash, "escrow released");
        } else {
            payments.mark_failed(settlement.id).await?;
            error!(
                deal_id = %deal_id,
                ?kind,
                error = ?transfer.error,
                "settlement transfer failed, payment row left for reconciliation"
            );
        }

        Ok(deal)
    }
}
