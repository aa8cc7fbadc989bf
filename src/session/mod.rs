//! The two-sided bridge session.
//!
//! A [`BridgeSession`] is created per connection attempt and split into its
//! two execution contexts: the network-side [`SessionInput`]
//! (`set_format` / `accept` / `reset_fill`, may block and allocate) and the
//! render-side [`StreamRenderer`](crate::render::StreamRenderer)
//! (`produce`, hard deadline, never blocks). The only coupling between them
//! is the jitter queue and its counters.

pub mod actor;
pub mod start_stop;

pub use actor::SessionActor;
pub use start_stop::StartStopController;

use crate::audio::buffers::{QueueProducer, jitter_queue};
use crate::audio::frame::{ChannelLayout, Format, PcmFrame};
use crate::audio::upsample::SampleRateBridge;
use crate::error::{BridgeError, Result};
use crate::protocol::{Command, EventSink, SessionEvent, event_channel};
use crate::render::StreamRenderer;
use crossbeam::channel::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Chunk count above which a push sheds the entire queue.
pub const MAX_QUEUED_CHUNKS: usize = 100;
/// Divisor turning the over-target excess into a per-pull drop count.
pub const OVERRUN_DROP_DIVISOR: usize = 1024;
/// Per-pull drop count above which an overrun is reported.
pub const OVERRUN_REPORT_THRESHOLD: usize = 50;
/// Delay between an underrun and the start/stop check it schedules.
pub const START_STOP_CHECK_DELAY: Duration = Duration::from_secs(1);

const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Session tuning. The shedding constants come straight from the original
/// streaming pipeline; override them for experiments, not because a better
/// value was derived.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// The fixed rate the host audio clock drives the render callback at.
    pub native_sample_rate: f64,
    pub max_queued_chunks: usize,
    pub overrun_drop_divisor: usize,
    pub overrun_report_threshold: usize,
    pub start_stop_delay: Duration,
    /// Capacity of the outward event channel.
    pub event_capacity: usize,
}

impl BridgeConfig {
    pub fn new(native_sample_rate: f64) -> Self {
        Self {
            native_sample_rate,
            max_queued_chunks: MAX_QUEUED_CHUNKS,
            overrun_drop_divisor: OVERRUN_DROP_DIVISOR,
            overrun_report_threshold: OVERRUN_REPORT_THRESHOLD,
            start_stop_delay: START_STOP_CHECK_DELAY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Owns the sample-rate bridge, jitter queue, latency control and start/stop
/// hysteresis for one connection.
pub struct BridgeSession {
    input: SessionInput,
    renderer: StreamRenderer,
    events: Receiver<SessionEvent>,
}

impl BridgeSession {
    pub fn new(config: BridgeConfig) -> Self {
        let (events_tx, events_rx) = event_channel(config.event_capacity);
        let start_stop = Arc::new(StartStopController::new());
        let (producer, consumer) = jitter_queue(&config, events_tx.clone(), start_stop.clone());

        let input = SessionInput {
            native_rate: config.native_sample_rate,
            bridge: None,
            producer,
            events: events_tx.clone(),
        };
        let renderer = StreamRenderer::new(consumer, start_stop, events_tx, config.start_stop_delay);

        Self {
            input,
            renderer,
            events: events_rx,
        }
    }

    /// Split into the network half, the render half, and the outward event
    /// stream, each free to move to its own thread.
    pub fn split(self) -> (SessionInput, StreamRenderer, Receiver<SessionEvent>) {
        (self.input, self.renderer, self.events)
    }
}

/// Network-side protocol surface of a session.
pub struct SessionInput {
    native_rate: f64,
    bridge: Option<SampleRateBridge>,
    producer: QueueProducer,
    events: EventSink,
}

impl SessionInput {
    /// A sink reporting onto this session's event stream, for the actor and
    /// transport glue.
    pub fn event_sink(&self) -> EventSink {
        self.events.clone()
    }

    /// Declare (or re-declare, on reconnect) the stream format.
    ///
    /// Fails when the rate is invalid or the native rate is not an integer
    /// multiple of it; a mid-session format change is expected to be paired
    /// with [`reset_fill`](Self::reset_fill) by the transport.
    pub fn set_format(&mut self, channels: ChannelLayout, stream_sample_rate: f64) -> Result<()> {
        let format = Format::new(channels, stream_sample_rate)?;
        let bridge = SampleRateBridge::new(format, self.native_rate)?;
        info!(
            ?channels,
            stream_sample_rate,
            factor = bridge.factor(),
            "stream format set"
        );
        self.producer
            .set_channels(channels.count(), self.native_rate);
        self.bridge = Some(bridge);
        Ok(())
    }

    /// Accept one frame of interleaved stream-rate samples.
    ///
    /// Fatal if no format has been set; the transport is expected to tear
    /// the connection down and reconnect.
    pub fn accept(&mut self, frame: PcmFrame) -> Result<()> {
        let bridge = self.bridge.as_ref().ok_or(BridgeError::FormatNotSet)?;
        let chunk = bridge.convert(&frame)?;
        self.producer.push(chunk);
        Ok(())
    }

    /// Flush all buffered audio and forget the stream format. Legal in any
    /// state and idempotent; the sole abort mechanism.
    pub fn reset_fill(&mut self) {
        debug!("reset fill");
        self.bridge = None;
        self.producer.reset();
    }

    /// Apply one transport command.
    pub fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::SetFormat {
                channels,
                sample_rate,
            } => self.set_format(channels, sample_rate),
            Command::ResetFill => {
                self.reset_fill();
                Ok(())
            }
            Command::Accept(frame) => self.accept(frame),
        }
    }
}
