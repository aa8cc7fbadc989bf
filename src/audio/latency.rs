//! Adaptive target-depth control for the jitter queue.
//!
//! A fixed-size circular history of queue occupancy samples, recorded once
//! per push and once per render pull, drives the target depth: the spread of
//! recent occupancy (delivery jitter plus pull-size jitter) padded by the
//! largest chunk moved through either side.

/// Number of occupancy samples the controller remembers.
pub const OCCUPANCY_HISTORY_LEN: usize = 200;

/// Computes the adaptive target queue depth from recent occupancy.
///
/// All quantities are in interleaved samples at the native rate.
#[derive(Debug)]
pub struct LatencyController {
    history: [usize; OCCUPANCY_HISTORY_LEN],
    len: usize,
    next: usize,
    last_input_len: usize,
    last_output_len: usize,
    target: usize,
}

impl LatencyController {
    pub fn new() -> Self {
        Self {
            history: [0; OCCUPANCY_HISTORY_LEN],
            len: 0,
            next: 0,
            last_input_len: 0,
            last_output_len: 0,
            target: 1,
        }
    }

    /// Record occupancy after a producer push of `chunk_len` samples.
    pub fn record_push(&mut self, occupancy: usize, chunk_len: usize) {
        self.last_input_len = chunk_len;
        self.record(occupancy);
    }

    /// Record occupancy at the start of a render pull requesting
    /// `request_len` samples.
    pub fn record_pull(&mut self, occupancy: usize, request_len: usize) {
        self.last_output_len = request_len;
        self.record(occupancy);
    }

    /// The current target depth in samples. Never below 1.
    pub fn target(&self) -> usize {
        self.target
    }

    fn record(&mut self, occupancy: usize) {
        self.history[self.next] = occupancy;
        self.next = (self.next + 1) % OCCUPANCY_HISTORY_LEN;
        self.len = (self.len + 1).min(OCCUPANCY_HISTORY_LEN);
        self.recompute();
    }

    fn recompute(&mut self) {
        let window = &self.history[..self.len];
        let min = window.iter().copied().min().unwrap_or(0);
        let max = window.iter().copied().max().unwrap_or(0);
        let spread = max - min;
        self.target = (spread + self.last_input_len.max(self.last_output_len)).max(1);
    }
}

impl Default for LatencyController {
    fn default() -> Self {
        Self::new()
    }
}
