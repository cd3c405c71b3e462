//! Add-Compare-Select Kernels
//!
//! One trellis step for all 128 butterflies. Butterfly `j` joins
//! predecessors `j` and `j + 128` to successors `2j` and `2j + 1`:
//!
//! ```text
//!   old[j]       ──metric──▶  new[2j]     = min(old[j] + metric,  old[j+128] + ~metric)
//!                ╲        ╱
//!                 ╲      ╱
//!                  ╲    ╱
//!   old[j+128]   ──metric──▶  new[2j+1]   = min(old[j] + ~metric, old[j+128] + metric)
//! ```
//!
//! where `~metric = 765 - metric`. The decision bit is 1 when the candidate
//! from `j + 128` wins (ties included).
//!
//! Butterflies share no data within a step, so the step is data-parallel.
//! [`ScalarKernel`] walks states one at a time. [`LaneKernel`] processes eight
//! butterflies per iteration with fixed-width lane arrays and saturating
//! 16-bit arithmetic, which LLVM lowers to packed SSE2/NEON instructions.
//! Both produce identical metrics and decisions.

use serde::{Deserialize, Serialize};

use super::branch::{BranchTable, BRANCH_LANES};
use super::decision::Decision;
use super::metrics::{Lane, MetricBuffer, LANES};
use super::{MAX_BRANCH_METRIC, NUM_BUTTERFLIES, SYMBOLS_PER_STEP};

/// A single add-compare-select step over the whole trellis.
pub trait AcsKernel: Send + Sync {
    /// Short name for logs and benchmarks.
    fn name(&self) -> &'static str;

    /// Compute survivor metrics into `new` and decisions into `decision`
    /// from the previous step's metrics in `old`.
    fn step(
        &self,
        table: &BranchTable,
        symbols: [u8; SYMBOLS_PER_STEP],
        old: &MetricBuffer,
        new: &mut MetricBuffer,
        decision: &mut Decision,
    );
}

/// Portable one-state-at-a-time kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarKernel;

impl AcsKernel for ScalarKernel {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn step(
        &self,
        table: &BranchTable,
        symbols: [u8; SYMBOLS_PER_STEP],
        old: &MetricBuffer,
        new: &mut MetricBuffer,
        decision: &mut Decision,
    ) {
        for j in 0..NUM_BUTTERFLIES {
            let (metric, m_metric) = table.branch_metric(j, symbols);
            let upper = old.get(j);
            let lower = old.get(j + NUM_BUTTERFLIES);

            let m0 = upper.saturating_add(metric);
            let m1 = lower.saturating_add(m_metric);
            let m2 = upper.saturating_add(m_metric);
            let m3 = lower.saturating_add(metric);

            let survivor0 = m0.min(m1);
            let survivor1 = m2.min(m3);

            new.set(2 * j, survivor0);
            new.set(2 * j + 1, survivor1);
            decision.set(2 * j, survivor0 == m1);
            decision.set(2 * j + 1, survivor1 == m3);
        }
    }
}

/// Eight-butterflies-per-iteration kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaneKernel;

impl LaneKernel {
    #[inline(always)]
    fn branch_metrics(table: &BranchTable, lane: usize, symbols: [i16; SYMBOLS_PER_STEP]) -> Lane {
        let (b0, b1, b2) = (table.lane(0, lane), table.lane(1, lane), table.lane(2, lane));
        let mut metric = [0i16; LANES];
        for k in 0..LANES {
            // Expected outputs are 0 or 255, so XOR is a conditional 255 - sym
            metric[k] = (b0[k] ^ symbols[0]) + (b1[k] ^ symbols[1]) + (b2[k] ^ symbols[2]);
        }
        metric
    }
}

impl AcsKernel for LaneKernel {
    fn name(&self) -> &'static str {
        "lanes"
    }

    fn step(
        &self,
        table: &BranchTable,
        symbols: [u8; SYMBOLS_PER_STEP],
        old: &MetricBuffer,
        new: &mut MetricBuffer,
        decision: &mut Decision,
    ) {
        let symbols = symbols.map(i16::from);

        for i in 0..BRANCH_LANES {
            let metric = Self::branch_metrics(table, i, symbols);
            let upper = old.lane(i);
            let lower = old.lane(i + BRANCH_LANES);

            let mut survivor0 = [0i16; LANES];
            let mut survivor1 = [0i16; LANES];
            let mut word = 0u16;
            for k in 0..LANES {
                let m_metric = MAX_BRANCH_METRIC - metric[k];
                let m0 = upper[k].saturating_add(metric[k]);
                let m1 = lower[k].saturating_add(m_metric);
                let m2 = upper[k].saturating_add(m_metric);
                let m3 = lower[k].saturating_add(metric[k]);

                survivor0[k] = m0.min(m1);
                survivor1[k] = m2.min(m3);
                word |= ((survivor0[k] == m1) as u16) << (2 * k);
                word |= ((survivor1[k] == m3) as u16) << (2 * k + 1);
            }
            decision.store_word(i, word);

            // Successors 2j, 2j+1 are adjacent: interleave the two survivor lanes
            let mut first = [0i16; LANES];
            let mut second = [0i16; LANES];
            for k in 0..LANES / 2 {
                first[2 * k] = survivor0[k];
                first[2 * k + 1] = survivor1[k];
                second[2 * k] = survivor0[k + LANES / 2];
                second[2 * k + 1] = survivor1[k + LANES / 2];
            }
            *new.lane_mut(2 * i) = first;
            *new.lane_mut(2 * i + 1) = second;
        }
    }
}

/// Kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Pick at run time with [`Backend::detect`]
    #[default]
    Auto,
    /// [`ScalarKernel`]
    Scalar,
    /// [`LaneKernel`]
    Lanes,
}

impl Backend {
    /// Lanes when the CPU has a 128-bit integer vector unit, scalar otherwise.
    pub fn detect() -> Self {
        if cfg!(target_arch = "aarch64") || has_sse2() {
            Backend::Lanes
        } else {
            Backend::Scalar
        }
    }

    /// Replace `Auto` with the detected backend.
    pub fn resolve(self) -> Self {
        match self {
            Backend::Auto => Self::detect(),
            other => other,
        }
    }

    /// Kernel implementing this backend.
    pub fn kernel(self) -> &'static dyn AcsKernel {
        match self.resolve() {
            Backend::Scalar => &ScalarKernel,
            _ => &LaneKernel,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Auto => write!(f, "auto"),
            Backend::Scalar => write!(f, "scalar"),
            Backend::Lanes => write!(f, "lanes"),
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn has_sse2() -> bool {
    std::arch::is_x86_feature_detected!("sse2")
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn has_sse2() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viterbi::{NUM_STATES, UNLIKELY_START_METRIC};

    fn pseudo_random_metrics(seed: u32) -> MetricBuffer {
        let mut buf = MetricBuffer::filled(0);
        let mut state = seed;
        for s in 0..NUM_STATES {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            buf.set(s, i16::MIN + ((state >> 16) % 6000) as i16);
        }
        buf
    }

    #[test]
    fn test_kernels_agree() {
        let table = BranchTable::standard();
        let mut seed: u32 = 99;
        for round in 0..50 {
            let old = pseudo_random_metrics(round);
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let symbols = [(seed >> 4) as u8, (seed >> 12) as u8, (seed >> 20) as u8];

            let mut new_scalar = MetricBuffer::default();
            let mut new_lanes = MetricBuffer::default();
            let mut dec_scalar = Decision::default();
            let mut dec_lanes = Decision::default();
            ScalarKernel.step(&table, symbols, &old, &mut new_scalar, &mut dec_scalar);
            LaneKernel.step(&table, symbols, &old, &mut new_lanes, &mut dec_lanes);

            assert_eq!(new_scalar, new_lanes, "metrics differ in round {round}");
            assert_eq!(dec_scalar, dec_lanes, "decisions differ in round {round}");
        }
    }

    #[test]
    fn test_survivor_is_minimum_candidate() {
        let table = BranchTable::standard();
        let old = pseudo_random_metrics(7);
        let symbols = [200, 30, 128];
        let mut new = MetricBuffer::default();
        let mut decision = Decision::default();
        ScalarKernel.step(&table, symbols, &old, &mut new, &mut decision);

        for j in 0..NUM_BUTTERFLIES {
            let (metric, m_metric) = table.branch_metric(j, symbols);
            let from_upper = old.get(j) + metric;
            let from_lower = old.get(j + 128) + m_metric;
            assert_eq!(new.get(2 * j), from_upper.min(from_lower));
            assert_eq!(decision.bit(2 * j), (from_lower <= from_upper) as u8);

            let from_upper = old.get(j) + m_metric;
            let from_lower = old.get(j + 128) + metric;
            assert_eq!(new.get(2 * j + 1), from_upper.min(from_lower));
            assert_eq!(decision.bit(2 * j + 1), (from_lower <= from_upper) as u8);
        }
    }

    #[test]
    fn test_known_start_propagates() {
        // From state 0 with all-zero symbols, the zero path keeps its metric
        let table = BranchTable::standard();
        let mut old = MetricBuffer::filled(UNLIKELY_START_METRIC);
        old.set(0, i16::MIN);
        for kernel in [Backend::Scalar.kernel(), Backend::Lanes.kernel()] {
            let mut new = MetricBuffer::default();
            let mut decision = Decision::default();
            kernel.step(&table, [0, 0, 0], &old, &mut new, &mut decision);
            assert_eq!(new.get(0), i16::MIN, "{}", kernel.name());
            assert_eq!(new.get(1), i16::MIN + 765, "{}", kernel.name());
            assert_eq!(decision.bit(0), 0);
        }
    }

    #[test]
    fn test_saturates_instead_of_wrapping() {
        let table = BranchTable::standard();
        let old = MetricBuffer::filled(i16::MAX - 100);
        for kernel in [Backend::Scalar.kernel(), Backend::Lanes.kernel()] {
            let mut new = MetricBuffer::default();
            let mut decision = Decision::default();
            kernel.step(&table, [255, 255, 255], &old, &mut new, &mut decision);
            assert!(new.iter().all(|m| m >= i16::MAX - 100), "{}", kernel.name());
        }
    }

    #[test]
    fn test_backend_resolution() {
        assert_ne!(Backend::Auto.resolve(), Backend::Auto);
        assert_eq!(Backend::Scalar.kernel().name(), "scalar");
        assert_eq!(Backend::Lanes.kernel().name(), "lanes");
        assert_eq!(Backend::Lanes.to_string(), "lanes");
    }
}
