pub mod payloads;
pub mod queue;

pub use payloads::*;
pub use queue::{JobError, JobHandler, JobQueue, JobResult, QueueOptions, RetryPolicy};
