use async_trait::async_trait;
use snafu::Snafu;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, warn};

#[derive(Debug, Snafu)]
pub enum JobError {
    /// The work could not complete yet; run the attempt again after
    /// the retry delay. "Transfer not seen on chain" lives here.
    #[snafu(display("{message}"))]
    Retry { message: String },

    /// Retrying cannot help this invocation; give up immediately and
    /// leave the domain state untouched.
    #[snafu(display("{message}"))]
    Fatal { message: String },
}

impl JobError {
    pub fn retry(message: impl Into<String>) -> Self {
        Self::Retry {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }
}

pub type JobResult = Result<(), JobError>;

#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    type Payload: Clone + Debug + Send + Sync + 'static;

    async fn run(&self, payload: &Self::Payload) -> JobResult;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// One attempt, no re-runs.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            retry_delay: Duration::ZERO,
        }
    }

    pub fn fixed(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueueOptions {
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

/// An in-process delayed job queue with fixed-interval retries and
/// bounded parallelism per queue.
///
/// Each enqueued job becomes a tokio task that sleeps out its delay,
/// then runs attempts under the queue's semaphore. The permit is held
/// only while the handler runs, so a thousand parked confirmation
/// polls cost nothing but a timer each.
pub struct JobQueue<H: JobHandler> {
    name: &'static str,
    handler: Arc<H>,
    options: QueueOptions,
    semaphore: Arc<Semaphore>,
}

impl<H: JobHandler> JobQueue<H> {
    pub fn new(name: &'static str, handler: H, options: QueueOptions) -> Self {
        Self {
            name,
            handler: Arc::new(handler),
            options,
            semaphore: Arc::new(Semaphore::new(options.concurrency)),
        }
    }

    /// Run the job as soon as a worker slot frees up.
    pub fn enqueue(&self, payload: H::Payload) {
        self.enqueue_after(payload, Duration::ZERO);
    }

    /// Run the job after `delay`. Callers that need to reject
    /// already-elapsed deadlines must do so before enqueueing; a zero
    /// delay here simply means "now".
    pub fn enqueue_after(&self, payload: H::Payload, delay: Duration) {
        let name = self.name;
        let handler = Arc::clone(&self.handler);
        let semaphore = Arc::clone(&self.semaphore);
        let retry = self.options.retry;

        debug!(queue = name, ?payload, ?delay, "job enqueued");

        tokio::spawn(async move {
            if !delay.is_zero() {
                time::sleep(delay).await;
            }

            for attempt in 1..=retry.max_attempts {
                let outcome = {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .expect("job queue semaphore is never closed");
                    handler.run(&payload).await
                };

                match outcome {
                    Ok(()) => {
                        debug!(queue = name, ?payload, attempt, "job succeeded");
                        return;
                    }
                    Err(JobError::Fatal { message }) => {
                        error!(queue = name, ?payload, attempt, "job failed: {message}");
                        return;
                    }
                    Err(JobError::Retry { message }) => {
                        if attempt == retry.max_attempts {
                            error!(
                                queue = name,
                                ?payload,
                                attempt,
                                "job exhausted retries: {message}"
                            );
                            return;
                        }
                        warn!(queue = name, ?payload, attempt, "job retrying: {message}");
                        time::sleep(retry.retry_delay).await;
                    }
                }
            }
        });
    }
}
