//! K=9, Rate 1/3 Viterbi Decoder
//!
//! Soft-decision maximum-likelihood decoder for the constraint-length 9,
//! rate 1/3 convolutional code. Each trellis step consumes three 8-bit
//! offset-binary symbols (0 = strong zero, 255 = strong one) and updates the
//! path metrics of all 256 states.
//!
//! ## Structure
//!
//! ```text
//! symbols ─▶ update() ──▶ AcsKernel (scalar | lanes) ──▶ PathMetrics (old ⇄ new)
//!                │                                      └─▶ renormalize
//!                └─▶ DecisionHistory (1 bit / state / step)
//!                                   │
//!              chainback(endstate) ◀┘ ──▶ decoded bytes (MSB first)
//! ```
//!
//! - [`branch`]: per-state expected outputs for the three polynomials, shared
//!   by every decoder through an `Arc`
//! - [`metrics`]: lane-major path-metric buffers and the ping-pong pair
//! - [`decision`]: packed survivor decisions
//! - [`kernel`]: the add-compare-select step, in scalar and lane-parallel form
//! - [`decoder`]: the [`Viterbi39`] state machine and traceback
//! - [`lifecycle`]: handle-style create/init/update/chainback/delete surface
//!
//! ## Example
//!
//! ```rust
//! use r4w_fec::convolutional::ConvolutionalEncoder;
//! use r4w_fec::viterbi::Viterbi39;
//!
//! let message = b"R4W";
//! let nbits = message.len() * 8;
//! let symbols = ConvolutionalEncoder::standard().encode_frame(message);
//!
//! let mut decoder = Viterbi39::new(nbits).unwrap();
//! decoder.init(0);
//! decoder.update(&symbols, nbits + 8).unwrap();
//!
//! let mut decoded = [0u8; 3];
//! let metric = decoder.chainback(&mut decoded, nbits, 0).unwrap();
//! assert_eq!(&decoded, message);
//! assert_eq!(metric, 0);
//! ```

pub mod branch;
pub mod decision;
pub mod decoder;
pub mod kernel;
pub mod lifecycle;
pub mod metrics;

pub use branch::{BranchTable, Polynomials};
pub use decision::{Decision, DecisionHistory};
pub use decoder::Viterbi39;
pub use kernel::{AcsKernel, Backend, LaneKernel, ScalarKernel};
pub use metrics::{MetricBuffer, PathMetrics};

/// Constraint length K.
pub const CONSTRAINT_LENGTH: usize = 9;

/// Trellis states: 2^(K-1).
pub const NUM_STATES: usize = 1 << (CONSTRAINT_LENGTH - 1);

/// Butterflies per step; each pairs predecessors `j` and `j + 128`.
pub const NUM_BUTTERFLIES: usize = NUM_STATES / 2;

/// Channel symbols per trellis step.
pub const SYMBOLS_PER_STEP: usize = 3;

/// Largest per-symbol distance for 8-bit offset-binary symbols.
pub const MAX_SYMBOL_METRIC: i16 = 255;

/// Largest branch metric; the two hypotheses of a state always sum to this.
pub const MAX_BRANCH_METRIC: i16 = SYMBOLS_PER_STEP as i16 * MAX_SYMBOL_METRIC;

/// Declared bound on the spread between the best and worst path metric.
pub const MAX_SPREAD: i16 = 12750;

/// Probe value at or above which metrics are rebased.
///
/// A probe below this keeps every metric at most `MAX_SPREAD` above it, and
/// the next step adds at most `MAX_BRANCH_METRIC`, so nothing reaches
/// `i16::MAX`.
pub const RENORMALIZE_THRESHOLD: i16 = i16::MAX - MAX_SPREAD - MAX_BRANCH_METRIC;

/// Initial metric of every state other than the known start state.
pub const UNLIKELY_START_METRIC: i16 = i16::MIN + 1000;

/// Steps the traceback looks past before trusting a decision: K - 1.
pub const TRACEBACK_MARGIN: usize = CONSTRAINT_LENGTH - 1;
