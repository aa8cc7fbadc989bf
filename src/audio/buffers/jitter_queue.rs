//! The jitter queue bridging the network and render contexts.
//!
//! An ordered FIFO of [`NativeChunk`]s shared between a producing network
//! side and a consuming render side. The mutex only ever guards O(1) work
//! (moving whole chunks and a constant-size occupancy-history update); all
//! sample copying happens on the render side against a render-owned cursor,
//! so the render thread's worst-case wait stays bounded.
//!
//! Overload shedding:
//! - push into a queue already holding more than `max_queued_chunks` chunks
//!   clears the whole queue and keeps only the new chunk;
//! - the consumer drops `ceil(excess / overrun_drop_divisor)` samples when
//!   the aggregate exceeds the adaptive target depth.
//!
//! Both are reported as recoverable [`BridgeError::Overrun`] events.

use crate::audio::frame::NativeChunk;
use crate::audio::latency::LatencyController;
use crate::error::BridgeError;
use crate::protocol::{EventSink, SessionEvent, StatusReport};
use crate::session::BridgeConfig;
use crate::session::start_stop::StartStopController;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

struct QueueInner {
    chunks: VecDeque<NativeChunk>,
    latency: LatencyController,
}

struct QueueShared {
    inner: Mutex<QueueInner>,
    /// Samples currently held in the deque (the consumer's cursor remainder
    /// is tracked on the render side).
    queued_samples: AtomicUsize,
    /// Published copy of the adaptive target depth, for lock-free status.
    target: AtomicUsize,
    /// Bumped by `reset` so the consumer discards its held cursor.
    generation: AtomicU64,
    /// Current interleaved channel count, set on `set_format`.
    channels: AtomicUsize,
    /// Interleaved samples per second at the native rate (f64 bits),
    /// used to express the target depth in seconds.
    units_per_sec: AtomicU64,
}

impl QueueShared {
    fn status(&self, buffered: usize, running: bool) -> StatusReport {
        let target = self.target.load(Ordering::Acquire).max(1);
        let units = f64::from_bits(self.units_per_sec.load(Ordering::Acquire));
        StatusReport {
            buffered_fraction: buffered as f64 / target as f64,
            target_seconds: if units > 0.0 {
                target as f64 / units
            } else {
                0.0
            },
            queue_not_empty: running,
        }
    }
}

/// Create a connected producer/consumer pair over one shared queue.
pub(crate) fn jitter_queue(
    config: &BridgeConfig,
    events: EventSink,
    start_stop: Arc<StartStopController>,
) -> (QueueProducer, QueueConsumer) {
    let shared = Arc::new(QueueShared {
        inner: Mutex::new(QueueInner {
            chunks: VecDeque::new(),
            latency: LatencyController::new(),
        }),
        queued_samples: AtomicUsize::new(0),
        target: AtomicUsize::new(1),
        generation: AtomicU64::new(0),
        channels: AtomicUsize::new(0),
        units_per_sec: AtomicU64::new(0f64.to_bits()),
    });

    let producer = QueueProducer {
        shared: shared.clone(),
        events: events.clone(),
        start_stop: start_stop.clone(),
        max_queued_chunks: config.max_queued_chunks,
    };
    let consumer = QueueConsumer {
        shared,
        events,
        start_stop,
        cursor: None,
        generation_seen: 0,
        overrun_drop_divisor: config.overrun_drop_divisor,
        overrun_report_threshold: config.overrun_report_threshold,
    };
    (producer, consumer)
}

/// Network-side half: may block, may allocate.
pub struct QueueProducer {
    shared: Arc<QueueShared>,
    events: EventSink,
    start_stop: Arc<StartStopController>,
    max_queued_chunks: usize,
}

impl QueueProducer {
    /// Append a chunk, shedding the entire queue first if it is overfull.
    pub fn push(&self, chunk: NativeChunk) {
        let len = chunk.len();
        let mut dropped = 0usize;
        {
            let mut inner = self.shared.inner.lock().unwrap();

            if inner.chunks.len() > self.max_queued_chunks {
                dropped = inner.chunks.iter().map(NativeChunk::len).sum();
                inner.chunks.clear();
                self.shared
                    .queued_samples
                    .fetch_sub(dropped, Ordering::AcqRel);
                debug!(dropped, "queue overfull, shed all queued chunks");
            }

            inner.chunks.push_back(chunk);
            let occupancy = self.shared.queued_samples.fetch_add(len, Ordering::AcqRel) + len;
            inner.latency.record_push(occupancy, len);
            self.shared
                .target
                .store(inner.latency.target(), Ordering::Release);

            if occupancy == len {
                // The queue was empty before this push.
                self.start_stop.note_data_available();
            }
        }

        if dropped > 0 {
            self.events
                .send(SessionEvent::Error(BridgeError::Overrun { dropped }));
        }
        self.emit_status();
    }

    /// Flush all queued data. Idempotent; the consumer's cursor is
    /// invalidated through the generation counter.
    pub fn reset(&self) {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            let flushed: usize = inner.chunks.iter().map(NativeChunk::len).sum();
            inner.chunks.clear();
            inner.latency = LatencyController::new();
            self.shared
                .queued_samples
                .fetch_sub(flushed, Ordering::AcqRel);
            self.shared
                .target
                .store(inner.latency.target(), Ordering::Release);
            self.shared.generation.fetch_add(1, Ordering::AcqRel);
        }
        self.emit_status();
    }

    /// Publish the stream's channel count and the native sample budget,
    /// called whenever the format is (re)declared.
    pub fn set_channels(&self, channels: usize, native_rate: f64) {
        self.shared.channels.store(channels, Ordering::Release);
        self.shared.units_per_sec.store(
            (native_rate * channels as f64).to_bits(),
            Ordering::Release,
        );
    }

    fn emit_status(&self) {
        let buffered = self.shared.queued_samples.load(Ordering::Acquire);
        self.events.send(SessionEvent::Status(
            self.shared.status(buffered, self.start_stop.is_running()),
        ));
    }
}

/// The read position inside the head chunk.
struct Cursor {
    chunk: NativeChunk,
    offset: usize,
}

impl Cursor {
    fn remaining(&self) -> usize {
        self.chunk.len() - self.offset
    }
}

/// Render-side half: single consumer, no allocation, bounded lock holds.
pub struct QueueConsumer {
    shared: Arc<QueueShared>,
    events: EventSink,
    start_stop: Arc<StartStopController>,
    cursor: Option<Cursor>,
    generation_seen: u64,
    overrun_drop_divisor: usize,
    overrun_report_threshold: usize,
}

impl QueueConsumer {
    /// Total unread samples: deque plus the held cursor remainder.
    pub fn buffered_samples(&self) -> usize {
        self.shared.queued_samples.load(Ordering::Acquire)
            + self.cursor.as_ref().map_or(0, Cursor::remaining)
    }

    /// Drain queued samples into the two output channels in FIFO order.
    ///
    /// Returns the number of sample-frames written per channel; the caller
    /// is responsible for padding any shortfall. Mono chunks are written to
    /// both channels. Drops excess samples first when the aggregate is above
    /// the target depth.
    pub fn pop_into(&mut self, out_left: &mut [f32], out_right: &mut [f32]) -> usize {
        let generation = self.shared.generation.load(Ordering::Acquire);
        if generation != self.generation_seen {
            self.generation_seen = generation;
            self.cursor = None;
        }

        let len = out_left.len().min(out_right.len());
        let channels = self.shared.channels.load(Ordering::Acquire).max(1);
        let occupancy = self.buffered_samples();
        {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.latency.record_pull(occupancy, len * channels);
            self.shared
                .target
                .store(inner.latency.target(), Ordering::Release);
        }

        let target = self.shared.target.load(Ordering::Acquire);
        let excess = self.buffered_samples().saturating_sub(target);
        if excess > 0 {
            // Bound added latency by skipping ahead, keeping channel
            // alignment intact.
            let to_drop = excess
                .div_ceil(self.overrun_drop_divisor)
                .next_multiple_of(channels);
            let dropped = self.advance(to_drop);
            if dropped > self.overrun_report_threshold {
                self.events
                    .send(SessionEvent::Error(BridgeError::Overrun { dropped }));
            }
        }

        let mut written = 0;
        while written < len {
            if !self.refill_cursor() {
                break;
            }
            let Some(cursor) = self.cursor.as_mut() else {
                break;
            };
            let chunk_channels = cursor.chunk.channels().count();
            let data = cursor.chunk.data();
            while cursor.offset < data.len() && written < len {
                out_left[written] = data[cursor.offset];
                out_right[written] = data[cursor.offset + chunk_channels - 1];
                cursor.offset += chunk_channels;
                written += 1;
            }
            if cursor.remaining() == 0 {
                self.cursor = None;
            }
        }

        self.emit_status();
        written
    }

    pub(crate) fn emit_status(&self) {
        self.events.send(SessionEvent::Status(
            self.shared
                .status(self.buffered_samples(), self.start_stop.is_running()),
        ));
    }

    /// Skip up to `count` samples without copying. Returns how many were
    /// actually dropped.
    fn advance(&mut self, count: usize) -> usize {
        let mut dropped = 0;
        while dropped < count {
            if !self.refill_cursor() {
                break;
            }
            let Some(cursor) = self.cursor.as_mut() else {
                break;
            };
            let take = cursor.remaining().min(count - dropped);
            cursor.offset += take;
            dropped += take;
            if cursor.remaining() == 0 {
                self.cursor = None;
            }
        }
        dropped
    }

    /// Claim the next chunk from the shared deque if no cursor is held.
    fn refill_cursor(&mut self) -> bool {
        if self.cursor.is_some() {
            return true;
        }
        let chunk = {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.chunks.pop_front()
        };
        match chunk {
            Some(chunk) => {
                self.shared
                    .queued_samples
                    .fetch_sub(chunk.len(), Ordering::AcqRel);
                self.cursor = Some(Cursor { chunk, offset: 0 });
                true
            }
            None => false,
        }
    }
}
