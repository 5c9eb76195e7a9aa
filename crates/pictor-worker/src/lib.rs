//! Pictor Worker Library
//!
//! A FIFO of transform tasks kept in a cache list, and the single consumer
//! that drains it. Producers only ever `enqueue`; results are published to
//! the `processed:{taskId}` mailbox by the handler.

pub mod error;
pub mod handler;
pub mod queue;
pub mod worker;

pub use error::{QueueError, QueueResult, TaskError};
pub use handler::{TaskHandler, TaskOutcome, TransformTaskHandler};
pub use queue::{DeadLetter, Dequeued, TaskQueue};
pub use worker::{Processed, Worker, WorkerHandle};
