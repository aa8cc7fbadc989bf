//! Adaptive jitter buffering and sample-rate bridging between a bursty
//! network audio stream and a hard-real-time render callback.
//!
//! The network side delivers interleaved PCM at unpredictable intervals and
//! may change format or disconnect at any time; the render side must produce
//! a correctly sized output on a fixed schedule without ever blocking. A
//! [`session::BridgeSession`] sits between the two: it upsamples incoming
//! frames to the native rate by zero-stuffing, queues them with adaptive
//! latency control and overrun shedding, and pads underruns with declick
//! fill values.
//!
//! ```no_run
//! use stream_bridge::audio::{ChannelLayout, PcmFrame};
//! use stream_bridge::render::RenderSource;
//! use stream_bridge::session::{BridgeConfig, BridgeSession};
//!
//! let session = BridgeSession::new(BridgeConfig::new(48000.0));
//! let (mut input, mut renderer, events) = session.split();
//!
//! // Network context:
//! input.set_format(ChannelLayout::Stereo, 24000.0).unwrap();
//! input.accept(PcmFrame::new(vec![0.0; 960])).unwrap();
//!
//! // Render context, once per fixed period:
//! let (mut left, mut right) = ([0.0f32; 128], [0.0f32; 128]);
//! renderer.produce(&mut left, &mut right);
//! # drop(events);
//! ```

pub mod audio;
pub mod error;
pub mod output;
pub mod protocol;
pub mod render;
pub mod session;

pub use error::{BridgeError, Result};
pub use protocol::{Command, SessionEvent, StatusReport};
pub use render::{RenderSource, StreamRenderer};
pub use session::{BridgeConfig, BridgeSession, SessionActor, SessionInput};
