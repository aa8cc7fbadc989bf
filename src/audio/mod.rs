//! Audio data types, rate conversion, and buffering.
//!
//! # Data Types
//! - [`frame::Format`] / [`frame::ChannelLayout`] - the declared stream format
//! - [`frame::PcmFrame`] - interleaved samples at the stream rate
//! - [`frame::NativeChunk`] - interleaved samples at the native output rate
//!
//! # Processing
//! - [`upsample::SampleRateBridge`] - zero-stuffing integral upsampler
//! - [`latency::LatencyController`] - adaptive target-depth control
//!
//! # Buffers
//! - [`buffers::jitter_queue`] - the shared FIFO between the network and
//!   render contexts, split into a producer and a consumer half

pub mod buffers;
pub mod frame;
pub mod latency;
pub mod upsample;

pub use buffers::{QueueConsumer, QueueProducer};
pub use frame::{ChannelLayout, Format, NativeChunk, PcmFrame};
pub use latency::LatencyController;
pub use upsample::SampleRateBridge;
