//! Fixed-capacity, non-overlapping analysis window.
//!
//! Storage is a stack-allocated `heapless::Vec` sized for the largest
//! configurable window; the runtime capacity `C` comes from config.
//! Only contact-ok samples are ever admitted, so the window keeps their
//! raw values plus the first/last timestamps rather than whole [`Sample`]s.
//!
//! Once `C` values are buffered the window is full.  The owner must
//! estimate and [`clear`](Window::clear) it in the same tick; a full window
//! refuses further samples.

use super::Sample;

/// Hard ceiling on the configurable window capacity.
pub const MAX_WINDOW_CAPACITY: usize = 1024;

/// Outcome of [`Window::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Sample stored; window still filling.
    Accepted,
    /// Sample stored and the window is now full.
    Full,
    /// Sample refused: the window is already full or the sample has no contact.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Window {
    values: heapless::Vec<u16, MAX_WINDOW_CAPACITY>,
    capacity: usize,
    first_at_ms: u64,
    last_at_ms: u64,
}

impl Window {
    /// Build an empty window.  `capacity` is clamped to `3..=MAX_WINDOW_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: heapless::Vec::new(),
            capacity: capacity.clamp(3, MAX_WINDOW_CAPACITY),
            first_at_ms: 0,
            last_at_ms: 0,
        }
    }

    /// Build a full window straight from raw values (capacity = `values.len()`).
    /// Timestamps are synthesised at `period_ms` spacing.
    pub fn from_values(values: &[u16], period_ms: u32) -> Self {
        let mut w = Self::new(values.len());
        for (i, v) in values.iter().take(w.capacity).enumerate() {
            w.push(Sample::new(*v, i as u64 * u64::from(period_ms)));
        }
        w
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    /// Append a sample in acquisition order.
    ///
    /// Lead-off samples are gaps, not zero readings, and are refused.
    pub fn push(&mut self, sample: Sample) -> PushOutcome {
        if !sample.contact_ok || self.is_full() {
            return PushOutcome::Rejected;
        }
        if self.values.push(sample.raw).is_err() {
            return PushOutcome::Rejected;
        }
        if self.values.len() == 1 {
            self.first_at_ms = sample.taken_at_ms;
        }
        self.last_at_ms = sample.taken_at_ms;

        if self.is_full() {
            PushOutcome::Full
        } else {
            PushOutcome::Accepted
        }
    }

    /// Raw values in acquisition order.
    pub fn values(&self) -> &[u16] {
        &self.values
    }

    /// Most recently appended sample.
    pub fn last(&self) -> Option<Sample> {
        self.values.last().map(|raw| Sample::new(*raw, self.last_at_ms))
    }

    /// Clock time between the first and last buffered sample.
    pub fn measured_span_ms(&self) -> u64 {
        if self.values.len() < 2 {
            return 0;
        }
        self.last_at_ms.saturating_sub(self.first_at_ms)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.first_at_ms = 0;
        self.last_at_ms = 0;
    }
}
