//! Viterbi39 Decoder Instance
//!
//! A decoder owns its path metrics and decision history and shares only the
//! read-only branch table. The call sequence per frame is
//! `init -> update* -> chainback`; an instance can be re-initialised and
//! reused for any number of frames up to its configured length.

use std::sync::Arc;

use super::branch::{process_table, BranchTable};
use super::decision::DecisionHistory;
use super::kernel::{AcsKernel, Backend};
use super::metrics::{MetricBuffer, PathMetrics};
use super::{NUM_STATES, RENORMALIZE_THRESHOLD, SYMBOLS_PER_STEP, TRACEBACK_MARGIN};
use crate::types::{FecError, FecResult};

/// K=9, rate 1/3 soft-decision Viterbi decoder.
pub struct Viterbi39 {
    metrics: PathMetrics,
    history: DecisionHistory,
    table: Arc<BranchTable>,
    backend: Backend,
    kernel: &'static dyn AcsKernel,
    max_bits: usize,
    path_metric: u64,
}

impl Viterbi39 {
    /// Decoder for frames of up to `max_bits` data bits, using the
    /// process-wide branch table and the detected backend.
    ///
    /// History is reserved for the data bits plus the 8-step tail.
    pub fn new(max_bits: usize) -> FecResult<Self> {
        Self::with_table(max_bits, process_table(), Backend::Auto)
    }

    /// Decoder with an explicit branch table and backend.
    pub fn with_table(max_bits: usize, table: Arc<BranchTable>, backend: Backend) -> FecResult<Self> {
        let steps = max_bits
            .checked_add(TRACEBACK_MARGIN)
            .ok_or(FecError::AllocationFailed { records: usize::MAX })?;
        let history = DecisionHistory::with_capacity(steps)?;
        let backend = backend.resolve();

        tracing::debug!(
            max_bits,
            steps,
            backend = %backend,
            table = ?table,
            "Viterbi39 decoder created"
        );

        let mut decoder = Self {
            metrics: PathMetrics::new(),
            history,
            table,
            backend,
            kernel: backend.kernel(),
            max_bits,
            path_metric: 0,
        };
        decoder.init(0);
        Ok(decoder)
    }

    /// Start a new frame from `start_state` (taken modulo 256).
    pub fn init(&mut self, start_state: usize) {
        self.metrics.reset(start_state);
        self.history.rewind();
        self.path_metric = 0;
    }

    /// Advance the trellis by `nbits` steps, consuming `3 * nbits` symbols.
    ///
    /// Returns the total subtracted by renormalisation during this call.
    /// Fails without touching the decoder when the symbols are too few or
    /// the history has no room for `nbits` more steps.
    pub fn update(&mut self, symbols: &[u8], nbits: usize) -> FecResult<u64> {
        let needed = nbits.saturating_mul(SYMBOLS_PER_STEP);
        if symbols.len() < needed {
            return Err(FecError::BufferTooShort {
                expected: needed,
                actual: symbols.len(),
            });
        }
        if nbits > self.history.remaining() {
            return Err(FecError::HistoryExhausted {
                requested: nbits,
                available: self.history.remaining(),
            });
        }

        let mut adjusted = 0u64;
        for triple in symbols.chunks_exact(SYMBOLS_PER_STEP).take(nbits) {
            let Some(decision) = self.history.current_mut() else {
                return Err(FecError::HistoryExhausted {
                    requested: nbits,
                    available: 0,
                });
            };
            let (old, new) = self.metrics.split();
            self.kernel
                .step(&self.table, [triple[0], triple[1], triple[2]], old, new, decision);

            if new.get(0) >= RENORMALIZE_THRESHOLD {
                let adjust = new.renormalize();
                adjusted += u64::from(adjust);
                tracing::trace!(adjust, step = self.history.len(), "Path metrics renormalized");
            }

            self.history.advance();
            self.metrics.swap();
        }

        self.path_metric += adjusted;
        Ok(adjusted)
    }

    /// Trace back from `endstate` and write `nbits` decoded bits into `out`,
    /// most significant bit of each byte first.
    ///
    /// The last 8 decoded steps are the look-past margin, so `nbits + 8` steps
    /// must have been decoded since `init`. Returns the path metric of
    /// `endstate` relative to the metric floor; a noiseless frame reports 0.
    pub fn chainback(&self, out: &mut [u8], nbits: usize, endstate: usize) -> FecResult<u32> {
        let needed = nbits.saturating_add(TRACEBACK_MARGIN);
        if needed > self.history.len() {
            return Err(FecError::InsufficientHistory {
                needed,
                available: self.history.len(),
            });
        }
        let bytes = (nbits + 7) / 8;
        if out.len() < bytes {
            return Err(FecError::BufferTooShort {
                expected: bytes,
                actual: out.len(),
            });
        }

        let mut state = endstate % NUM_STATES;
        let metric = (self.metrics.current().get(state) as i32 - i16::MIN as i32) as u32;

        // Decision t + 8 names the register bit shifted in at step t
        let decisions = &self.history.recorded()[TRACEBACK_MARGIN..];
        for bit in (0..nbits).rev() {
            let k = decisions[bit].bit(state) as usize;
            state = (k << 7) | (state >> 1);
            out[bit >> 3] = state as u8;
        }

        Ok(metric)
    }

    /// State with the smallest path metric, for streams without a known tail.
    pub fn best_state(&self) -> usize {
        self.metrics.current().argmin()
    }

    /// Decode one zero-tail-terminated frame of `nbits` data bits.
    ///
    /// Runs `init(0)`, `update` over `nbits + 8` steps and `chainback` to
    /// state 0. Returns the data bytes and the total path metric.
    pub fn decode_frame(&mut self, symbols: &[u8], nbits: usize) -> FecResult<(Vec<u8>, u64)> {
        self.init(0);
        let adjusted = self.update(symbols, nbits.saturating_add(TRACEBACK_MARGIN))?;
        let mut data = vec![0u8; (nbits + 7) / 8];
        let metric = self.chainback(&mut data, nbits, 0)?;
        Ok((data, adjusted + u64::from(metric)))
    }

    /// Steps decoded since the last `init`.
    pub fn steps_decoded(&self) -> usize {
        self.history.len()
    }

    /// Largest frame, in data bits, this decoder was sized for.
    pub fn max_bits(&self) -> usize {
        self.max_bits
    }

    /// Renormalisation total accumulated since the last `init`.
    pub fn path_metric(&self) -> u64 {
        self.path_metric
    }

    /// Path metrics after the last step.
    pub fn metrics(&self) -> &MetricBuffer {
        self.metrics.current()
    }

    /// Branch table this decoder was built with.
    pub fn table(&self) -> &Arc<BranchTable> {
        &self.table
    }

    /// Resolved ACS backend.
    pub fn backend(&self) -> Backend {
        self.backend
    }
}

impl std::fmt::Debug for Viterbi39 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viterbi39")
            .field("max_bits", &self.max_bits)
            .field("steps_decoded", &self.history.len())
            .field("backend", &self.backend)
            .field("table", &self.table)
            .field("path_metric", &self.path_metric)
            .finish()
    }
}
