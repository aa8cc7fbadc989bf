//! Buffers connecting the network and render contexts.

pub mod jitter_queue;

pub use jitter_queue::{QueueConsumer, QueueProducer};
pub(crate) use jitter_queue::jitter_queue;
