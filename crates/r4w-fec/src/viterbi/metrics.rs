//! Path Metric Buffers
//!
//! Metrics are signed 16-bit fixed-point costs, stored lane-major: 32 lanes
//! of 8 states each. The same buffer is addressed two ways:
//!
//! - scalar: [`MetricBuffer::get`] / [`MetricBuffer::set`] by state number
//! - lanes: [`MetricBuffer::lane`] / [`MetricBuffer::lane_mut`] by lane number,
//!   where lane `i` holds states `8i .. 8i+8`
//!
//! Both views are bounds-checked indexing into one owned array.
//!
//! [`PathMetrics`] owns the "old" and "new" buffers of a decoder. A step
//! reads one and writes the other through [`PathMetrics::split`], then
//! [`PathMetrics::swap`] exchanges their roles.

use super::{NUM_STATES, UNLIKELY_START_METRIC};

/// States per lane.
pub const LANES: usize = 8;

/// Lanes per metric buffer.
pub const METRIC_LANES: usize = NUM_STATES / LANES;

/// Eight adjacent 16-bit values processed together.
pub type Lane = [i16; LANES];

/// Path metric for every trellis state.
#[derive(Clone, PartialEq, Eq)]
pub struct MetricBuffer {
    lanes: [Lane; METRIC_LANES],
}

impl MetricBuffer {
    /// Buffer with every state set to `value`.
    pub fn filled(value: i16) -> Self {
        Self {
            lanes: [[value; LANES]; METRIC_LANES],
        }
    }

    /// Metric of `state`.
    #[inline]
    pub fn get(&self, state: usize) -> i16 {
        self.lanes[state / LANES][state % LANES]
    }

    /// Set the metric of `state`.
    #[inline]
    pub fn set(&mut self, state: usize, value: i16) {
        self.lanes[state / LANES][state % LANES] = value;
    }

    /// Metrics of states `8 * lane .. 8 * lane + 8`.
    #[inline]
    pub fn lane(&self, lane: usize) -> &Lane {
        &self.lanes[lane]
    }

    /// Mutable view of one lane.
    #[inline]
    pub fn lane_mut(&mut self, lane: usize) -> &mut Lane {
        &mut self.lanes[lane]
    }

    /// All metrics in state order.
    pub fn iter(&self) -> impl Iterator<Item = i16> + '_ {
        self.lanes.iter().flatten().copied()
    }

    /// Copy the metrics into a state-indexed array.
    pub fn to_array(&self) -> [i16; NUM_STATES] {
        let mut out = [0i16; NUM_STATES];
        for (dst, src) in out.iter_mut().zip(self.iter()) {
            *dst = src;
        }
        out
    }

    /// Smallest metric.
    pub fn min(&self) -> i16 {
        let folded = self.lanes.iter().fold([i16::MAX; LANES], |mut acc, lane| {
            for (a, &m) in acc.iter_mut().zip(lane.iter()) {
                *a = (*a).min(m);
            }
            acc
        });
        folded.iter().copied().min().unwrap_or(i16::MAX)
    }

    /// State holding the smallest metric; the lowest such state on ties.
    pub fn argmin(&self) -> usize {
        let mut best = 0;
        let mut best_metric = i16::MAX;
        for (state, metric) in self.iter().enumerate() {
            if metric < best_metric {
                best = state;
                best_metric = metric;
            }
        }
        best
    }

    /// Rebase so the smallest metric becomes `i16::MIN`.
    ///
    /// Returns the amount subtracted from every state.
    pub fn renormalize(&mut self) -> u32 {
        let adjust = self.min() as i32 - i16::MIN as i32;
        // Every metric is >= min, so m - adjust >= i16::MIN
        for lane in self.lanes.iter_mut() {
            for m in lane.iter_mut() {
                *m = (*m as i32 - adjust) as i16;
            }
        }
        adjust as u32
    }
}

impl Default for MetricBuffer {
    fn default() -> Self {
        Self::filled(UNLIKELY_START_METRIC)
    }
}

impl std::fmt::Debug for MetricBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricBuffer")
            .field("min", &self.min())
            .field("state0", &self.get(0))
            .finish()
    }
}

/// The two metric buffers of a decoder, used in ping-pong fashion.
#[derive(Debug, Clone)]
pub struct PathMetrics {
    buffers: [MetricBuffer; 2],
    current: usize,
}

impl PathMetrics {
    pub fn new() -> Self {
        Self {
            buffers: [MetricBuffer::default(), MetricBuffer::default()],
            current: 0,
        }
    }

    /// Reset for a new frame with `start_state` as the known start.
    pub fn reset(&mut self, start_state: usize) {
        self.current = 0;
        let old = &mut self.buffers[0];
        *old = MetricBuffer::filled(UNLIKELY_START_METRIC);
        old.set(start_state % NUM_STATES, i16::MIN);
    }

    /// Metrics as of the last completed step.
    pub fn current(&self) -> &MetricBuffer {
        &self.buffers[self.current]
    }

    /// Borrow `(old, new)`: the metrics to read and the buffer to write.
    pub fn split(&mut self) -> (&MetricBuffer, &mut MetricBuffer) {
        let [a, b] = &mut self.buffers;
        if self.current == 0 {
            (&*a, b)
        } else {
            (&*b, a)
        }
    }

    /// Make the written buffer current.
    pub fn swap(&mut self) {
        self.current ^= 1;
    }
}

impl Default for PathMetrics {
    fn default() -> Self {
        Self::new()
    }
}
