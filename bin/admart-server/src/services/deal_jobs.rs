use std::sync::Arc;
use std::time::Duration;

use admart_jobs::{
    JobError, JobHandler, JobQueue, JobResult, PaymentConfirmationJob, PostAlivenessJob,
    QueueConfig, QueueOptions, RetryPolicy, ScheduledPostingJob,
};
use admart_models::Deal;
use async_trait::async_trait;
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use super::{ConfirmationCheck, DealManager, ServiceError};

/// Map a service failure onto the queue's retry semantics. Transport
/// and RPC hiccups are worth another attempt; everything else (bad
/// state, missing records, inactive session) will not heal on its own.
fn job_error(err: ServiceError) -> JobError {
    match err {
        ServiceError::Gateway {
            source: admart_gateways::Error::SessionInactive,
        } => JobError::fatal("no active delegated session"),
        ServiceError::Gateway { source } => JobError::retry(source.to_string()),
        other => JobError::fatal(other.to_string()),
    }
}

/// Queue publication at `scheduled_post_at`. A deadline already in the
/// past is rejected outright rather than posting late.
fn schedule_publication(queue: &JobQueue<PublishHandler>, deal: &Deal) -> bool {
    let now = Utc::now();
    if deal.scheduled_post_at <= now {
        error!(
            deal_id = %deal.id,
            scheduled_post_at = %deal.scheduled_post_at,
            "scheduled time already passed, publication not queued"
        );
        return false;
    }

    let delay = (deal.scheduled_post_at - now)
        .to_std()
        .unwrap_or(Duration::ZERO);
    queue.enqueue_after(ScheduledPostingJob { deal_id: deal.id }, delay);
    true
}

pub struct ConfirmationHandler {
    manager: Arc<DealManager>,
    publish: Arc<JobQueue<PublishHandler>>,
}

#[async_trait]
impl JobHandler for ConfirmationHandler {
    type Payload = PaymentConfirmationJob;

    async fn run(&self, job: &PaymentConfirmationJob) -> JobResult {
        match self
            .manager
            .confirm_payment(job.deal_id, job.payment_id)
            .await
        {
            Ok(ConfirmationCheck::Confirmed(deal)) => {
                schedule_publication(&self.publish, &deal);
                Ok(())
            }
            Ok(ConfirmationCheck::NotSeen) => {
                Err(JobError::retry("transfer not seen on chain yet"))
            }
            Err(err) => Err(job_error(err)),
        }
    }
}

pub struct PublishHandler {
    manager: Arc<DealManager>,
    aliveness: Arc<JobQueue<AlivenessHandler>>,
    aliveness_delay: Duration,
}

#[async_trait]
impl JobHandler for PublishHandler {
    type Payload = ScheduledPostingJob;

    async fn run(&self, job: &ScheduledPostingJob) -> JobResult {
        let deal = self
            .manager
            .publish_post(job.deal_id)
            .await
            .map_err(job_error)?;

        if let Some(post_id) = deal.tg_post_id {
            self.aliveness.enqueue_after(
                PostAlivenessJob {
                    deal_id: deal.id,
                    post_id,
                },
                self.aliveness_delay,
            );
        }
        Ok(())
    }
}

pub struct AlivenessHandler {
    manager: Arc<DealManager>,
}

#[async_trait]
impl JobHandler for AlivenessHandler {
    type Payload = PostAlivenessJob;

    async fn run(&self, job: &PostAlivenessJob) -> JobResult {
        self.manager
            .verify_post_aliveness(job.deal_id, job.post_id)
            .await
            .map(drop)
            .map_err(job_error)
    }
}

/// Queue parameters for the three deal job kinds. `Default` is the
/// production tuning; tests shrink the delays.
#[derive(Debug, Clone, Copy)]
pub struct JobTuning {
    pub confirmation: QueueOptions,
    pub publish: QueueOptions,
    pub aliveness: QueueOptions,
    pub aliveness_delay: Duration,
}

impl Default for JobTuning {
    fn default() -> Self {
        Self {
            confirmation: QueueOptions {
                concurrency: QueueConfig::CONFIRMATION_CONCURRENCY,
                retry: RetryPolicy::fixed(
                    QueueConfig::BLOCKCHAIN_MAX_ATTEMPTS,
                    QueueConfig::BLOCKCHAIN_CHECK_INTERVAL,
                ),
            },
            publish: QueueOptions {
                concurrency: QueueConfig::PUBLISH_CONCURRENCY,
                retry: RetryPolicy::fixed(
                    QueueConfig::PUBLISH_MAX_ATTEMPTS,
                    QueueConfig::PUBLISH_RETRY_DELAY,
                ),
            },
            aliveness: QueueOptions {
                concurrency: QueueConfig::ALIVENESS_CONCURRENCY,
                retry: RetryPolicy::fixed(
                    QueueConfig::ALIVENESS_MAX_ATTEMPTS,
                    QueueConfig::ALIVENESS_RETRY_DELAY,
                ),
            },
            aliveness_delay: QueueConfig::POST_ALIVENESS_CHECK_DELAY,
        }
    }
}

/// The three queues driving a deal from funded to settled. Built in
/// reverse dependency order: the confirmation handler feeds the
/// publish queue, the publish handler feeds the aliveness queue.
pub struct DealJobs {
    confirmation: Arc<JobQueue<ConfirmationHandler>>,
    publish: Arc<JobQueue<PublishHandler>>,
    aliveness: Arc<JobQueue<AlivenessHandler>>,
    aliveness_delay: Duration,
}

impl DealJobs {
    pub fn new(manager: Arc<DealManager>) -> Self {
        Self::with_tuning(manager, JobTuning::default())
    }

    pub fn with_tuning(manager: Arc<DealManager>, tuning: JobTuning) -> Self {
        let aliveness = Arc::new(JobQueue::new(
            "post-aliveness",
            AlivenessHandler {
                manager: Arc::clone(&manager),
            },
            tuning.aliveness,
        ));
        let publish = Arc::new(JobQueue::new(
            "scheduled-posting",
            PublishHandler {
                manager: Arc::clone(&manager),
                aliveness: Arc::clone(&aliveness),
                aliveness_delay: tuning.aliveness_delay,
            },
            tuning.publish,
        ));
        let confirmation = Arc::new(JobQueue::new(
            "payment-confirmation",
            ConfirmationHandler {
                manager,
                publish: Arc::clone(&publish),
            },
            tuning.confirmation,
        ));

        Self {
            confirmation,
            publish,
            aliveness,
            aliveness_delay: tuning.aliveness_delay,
        }
    }

    pub fn add_payment_confirmation(&self, deal_id: Uuid, payment_id: Uuid) {
        self.confirmation
            .enqueue(PaymentConfirmationJob { deal_id, payment_id });
    }

    /// Queue the publication for the deal's scheduled time. Returns
    /// false (and queues nothing) when that time has already passed.
    pub fn add_scheduled_post(&self, deal: &Deal) -> bool {
        schedule_publication(&self.publish, deal)
    }

    pub fn add_post_aliveness_check(&self, deal_id: Uuid, post_id: i64) {
        self.aliveness.enqueue_after(
            PostAlivenessJob { deal_id, post_id },
            self.aliveness_delay,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_deal, wallet_fixture};
    use crate::db::Database;
    use admart_gateways::{
        BlockchainGateway, MessagingGateway, PostedMessage, TransferCheck, TransferOutcome,
    };
    use admart_models::{
        AdRequestStatus, DealStatus, EscrowWallet, PaymentKind, PaymentStatus,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sqlx::PgPool;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockChain {
        /// Scripted results for successive confirmation polls; an
        /// empty script means "nothing on chain".
        checks: Mutex<VecDeque<TransferCheck>>,
        transfers: Mutex<Vec<(String, Decimal)>>,
    }

    impl MockChain {
        fn script_checks(&self, results: impl IntoIterator<Item = TransferCheck>) {
            self.checks.lock().unwrap().extend(results);
        }
    }

    #[async_trait]
    impl BlockchainGateway for MockChain {
        fn create_escrow_wallet(&self) -> admart_gateways::Result<EscrowWallet> {
            Ok(wallet_fixture())
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
            TransferOutcome::sent("mock_tx".to_string())
        }
    }

    struct MockMessaging {
        next_id: AtomicI64,
        alive: AtomicBool,
    }

    impl Default for MockMessaging {
        fn default() -> Self {
            Self {
                next_id: AtomicI64::new(7000),
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

    struct Harness {
        db: Database,
        manager: Arc<DealManager>,
        chain: Arc<MockChain>,
        messaging: Arc<MockMessaging>,
    }

    async fn harness(pool: PgPool) -> Harness {
        let db = Database::from_pool(pool).await.unwrap();
        let chain = Arc::new(MockChain::default());
        let messaging = Arc::new(MockMessaging::default());
        let manager = Arc::new(DealManager::new(
            db.clone(),
            Arc::clone(&chain) as Arc<dyn BlockchainGateway>,
            Arc::clone(&messaging) as Arc<dyn MessagingGateway>,
        ));
        Harness {
            db,
            manager,
            chain,
            messaging,
        }
    }

    /// Deal in `AwaitingPayment` with a funded-pending escrow hold in
    /// `Confirming`.
    async fn deal_awaiting_deposit(h: &Harness) -> (admart_models::Deal, admart_models::Payment) {
        let deal = seed_deal(&h.db).await;
        h.db.deals().transition_creative_submitted(deal.id).await.unwrap();
        h.db.deals().transition_creative_approved(deal.id).await.unwrap();

        h.manager
            .request_payment_wallet(deal.id, "EQAdvertiserWallet")
            .await
            .unwrap();
        let payment = h.manager.submit_transaction(deal.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Confirming);

        let deal = h.db.deals().get(deal.id).await.unwrap();
        (deal, payment)
    }

    #[sqlx::test]
    async fn confirmation_retries_until_deposit_seen(pool: PgPool) {
        let h = harness(pool).await;
        let (deal, payment) = deal_awaiting_deposit(&h).await;

        h.chain.script_checks([
            TransferCheck::not_received(),
            TransferCheck::not_received(),
            TransferCheck {
                received: true,
                tx_hash: Some("deposit_tx".to_string()),
            },
        ]);

        let jobs = DealJobs::new(Arc::clone(&h.manager));
        let handler = ConfirmationHandler {
            manager: Arc::clone(&h.manager),
            publish: Arc::clone(&jobs.publish),
        };
        let job = PaymentConfirmationJob {
            deal_id: deal.id,
            payment_id: payment.id,
        };

        // Two empty windows poll again, the third attempt matches.
        assert!(matches!(handler.run(&job).await, Err(JobError::Retry { .. })));
        assert!(matches!(handler.run(&job).await, Err(JobError::Retry { .. })));
        handler.run(&job).await.unwrap();

        let deal = h.db.deals().get(deal.id).await.unwrap();
        assert_eq!(deal.status, DealStatus::Scheduled);
        let payment = h.db.payments().get(payment.id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Confirmed);
        assert_eq!(payment.tx_hash.as_deref(), Some("deposit_tx"));
    }

    #[sqlx::test]
    async fn past_deadline_is_never_queued(pool: PgPool) {
        let h = harness(pool).await;
        let jobs = DealJobs::new(Arc::clone(&h.manager));

        let mut deal = seed_deal(&h.db).await;
        deal.scheduled_post_at = Utc::now() - chrono::Duration::minutes(5);

        assert!(!jobs.add_scheduled_post(&deal));
    }

    #[sqlx::test]
    async fn future_deadline_is_queued(pool: PgPool) {
        let h = harness(pool).await;
        let jobs = DealJobs::new(Arc::clone(&h.manager));

        let deal = seed_deal(&h.db).await;
        assert!(jobs.add_scheduled_post(&deal));
    }

    /// Deal in `Posted` with a confirmed escrow deposit behind it.
    async fn posted_deal(h: &Harness) -> (admart_models::Deal, i64) {
        let (deal, payment) = deal_awaiting_deposit(h).await;
        h.chain.script_checks([TransferCheck {
            received: true,
            tx_hash: Some("deposit_tx".to_string()),
        }]);
        h.manager.confirm_payment(deal.id, payment.id).await.unwrap();

        let deal = h.db.deals().transition_posted(deal.id, 7001).await.unwrap();
        (deal, 7001)
    }

    #[sqlx::test]
    async fn live_post_pays_the_channel_owner(pool: PgPool) {
        let h = harness(pool).await;
        let (deal, post_id) = posted_deal(&h).await;

        h.messaging.alive.store(true, Ordering::SeqCst);
        let handler = AlivenessHandler {
            manager: Arc::clone(&h.manager),
        };
        handler
            .run(&PostAlivenessJob {
                deal_id: deal.id,
                post_id,
            })
            .await
            .unwrap();

        let deal = h.db.deals().get(deal.id).await.unwrap();
        assert_eq!(deal.status, DealStatus::Completed);

        let payout = h
            .db
            .payments()
            .settlement_for_deal(deal.id, PaymentKind::ReleaseToOwner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payout.status, PaymentStatus::Confirmed);
        assert_eq!(payout.to_address, "EQOwnerPayoutAddress");

        let transfers = h.chain.transfers.lock().unwrap();
        assert_eq!(transfers.as_slice(), &[("EQOwnerPayoutAddress".to_string(), dec!(100))]);
    }

    #[sqlx::test]
    async fn removed_post_refunds_the_advertiser(pool: PgPool) {
        let h = harness(pool).await;
        let (deal, post_id) = posted_deal(&h).await;

        h.messaging.alive.store(false, Ordering::SeqCst);
        let handler = AlivenessHandler {
            manager: Arc::clone(&h.manager),
        };
        handler
            .run(&PostAlivenessJob {
                deal_id: deal.id,
                post_id,
            })
            .await
            .unwrap();

        let deal = h.db.deals().get(deal.id).await.unwrap();
        assert_eq!(deal.status, DealStatus::Cancelled);

        let refund = h
            .db
            .payments()
            .settlement_for_deal(deal.id, PaymentKind::Refund)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refund.to_address, "EQAdvertiserWallet");

        // The originating ad request mirrors the outcome.
        let application = h.db.ads().get_application(deal.application_id).await.unwrap();
        let request = h.db.ads().get_request(application.ad_request_id).await.unwrap();
        assert_eq!(request.status, AdRequestStatus::Cancelled);
    }

    #[sqlx::test]
    async fn settlement_is_idempotent(pool: PgPool) {
        let h = harness(pool).await;
        let (deal, post_id) = posted_deal(&h).await;

        let handler = AlivenessHandler {
            manager: Arc::clone(&h.manager),
        };
        let job = PostAlivenessJob {
            deal_id: deal.id,
            post_id,
        };
        handler.run(&job).await.unwrap();
        handler.run(&job).await.unwrap();

        // One payout, not two.
        assert_eq!(h.chain.transfers.lock().unwrap().len(), 1);
    }
}
