use crate::{Deal, DealStatus, SettlementOutcome};
use chrono::Utc;
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu)]
pub enum TransitionError {
    #[snafu(display("Invalid state transition from {:?} to {:?}", from, to))]
    InvalidTransition { from: DealStatus, to: DealStatus },

    #[snafu(display("Deal already settled as {:?}", status))]
    AlreadySettled { status: DealStatus },
}

pub type TransitionResult = Result<(), TransitionError>;

impl Deal {
    /// A creative draft was submitted for advertiser review.
    ///
    /// Re-submitting after a revision request is legal, so this edge
    /// also loops on `CreativeSubmitted`.
    pub fn creative_submitted(&mut self) -> TransitionResult {
        ensure!(
            matches!(
                self.status,
                DealStatus::AwaitingCreative | DealStatus::CreativeSubmitted
            ),
            InvalidTransitionSnafu {
                from: self.status,
                to: DealStatus::CreativeSubmitted,
            }
        );

        self.status = DealStatus::CreativeSubmitted;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The advertiser approved the current creative; the payment flow
    /// begins.
    pub fn creative_approved(&mut self) -> TransitionResult {
        ensure!(
            self.status == DealStatus::CreativeSubmitted,
            InvalidTransitionSnafu {
                from: self.status,
                to: DealStatus::AwaitingPayment,
            }
        );

        self.status = DealStatus::AwaitingPayment;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The confirmation job matched the escrow deposit on chain.
    pub fn payment_confirmed(&mut self) -> TransitionResult {
        ensure!(
            self.status == DealStatus::AwaitingPayment,
            InvalidTransitionSnafu {
                from: self.status,
                to: DealStatus::Scheduled,
            }
        );

        self.status = DealStatus::Scheduled;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The publication job delivered the post to the channel.
    pub fn mark_posted(&mut self, tg_post_id: i64) -> TransitionResult {
        ensure!(
            self.status == DealStatus::Scheduled,
            InvalidTransitionSnafu {
                from: self.status,
                to: DealStatus::Posted,
            }
        );

        self.tg_post_id = Some(tg_post_id);
        self.status = DealStatus::Posted;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Close the deal after the aliveness verdict.
    ///
    /// Sets exactly one of `completed_at`/`cancelled_at`. A deal that
    /// is already terminal is rejected with `AlreadySettled`; callers
    /// treat that as a no-op so settlement stays idempotent.
    pub fn settle(&mut self, outcome: SettlementOutcome) -> TransitionResult {
        ensure!(
            !self.is_terminal(),
            AlreadySettledSnafu {
                status: self.status
            }
        );
        let to = match outcome {
            SettlementOutcome::Completed => DealStatus::Completed,
            SettlementOutcome::Cancelled => DealStatus::Cancelled,
        };
        ensure!(
            self.status == DealStatus::Posted,
            InvalidTransitionSnafu {
                from: self.status,
                to,
            }
        );

        let now = Utc::now();
        match outcome {
            SettlementOutcome::Completed => self.completed_at = Some(now),
            SettlementOutcome::Cancelled => self.cancelled_at = Some(now),
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}
