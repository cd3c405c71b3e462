//! Survivor Decisions
//!
//! One [`Decision`] per trellis step records, for every state, which of its
//! two predecessors survived: bit `s % 8` of byte `s / 8` is 1 when state `s`
//! was reached from predecessor `(s >> 1) | 128`, 0 when from `s >> 1`.

use super::NUM_STATES;
use crate::types::{FecError, FecResult};

/// Bytes per decision record.
pub const DECISION_BYTES: usize = NUM_STATES / 8;

/// Decision bits of one step, one per state.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision([u8; DECISION_BYTES]);

impl Decision {
    /// Decision bit of `state`.
    #[inline]
    pub fn bit(&self, state: usize) -> u8 {
        (self.0[state / 8] >> (state % 8)) & 1
    }

    /// Set the decision bit of `state`.
    #[inline]
    pub fn set(&mut self, state: usize, bit: bool) {
        let mask = 1 << (state % 8);
        if bit {
            self.0[state / 8] |= mask;
        } else {
            self.0[state / 8] &= !mask;
        }
    }

    /// Store the decisions of states `16 * index .. 16 * index + 16`,
    /// least significant bit first.
    #[inline]
    pub fn store_word(&mut self, index: usize, word: u16) {
        let [lo, hi] = word.to_le_bytes();
        self.0[2 * index] = lo;
        self.0[2 * index + 1] = hi;
    }

    pub fn as_bytes(&self) -> &[u8; DECISION_BYTES] {
        &self.0
    }
}

impl std::fmt::Debug for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Decision(")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

/// Decision records for a frame, filled front to back.
#[derive(Debug, Clone)]
pub struct DecisionHistory {
    records: Vec<Decision>,
    cursor: usize,
}

impl DecisionHistory {
    /// Reserve room for `steps` records.
    ///
    /// Allocation failure is reported instead of aborting.
    pub fn with_capacity(steps: usize) -> FecResult<Self> {
        let mut records = Vec::new();
        records
            .try_reserve_exact(steps)
            .map_err(|_| FecError::AllocationFailed { records: steps })?;
        records.resize(steps, Decision::default());
        Ok(Self { records, cursor: 0 })
    }

    /// Total steps this history can hold.
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Steps recorded since the last rewind.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Steps that can still be recorded.
    pub fn remaining(&self) -> usize {
        self.records.len() - self.cursor
    }

    /// Start a new frame.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Record slot for the step in progress, or `None` when full.
    #[inline]
    pub fn current_mut(&mut self) -> Option<&mut Decision> {
        self.records.get_mut(self.cursor)
    }

    /// Commit the step in progress.
    #[inline]
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Records of the steps decoded so far, oldest first.
    pub fn recorded(&self) -> &[Decision] {
        &self.records[..self.cursor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_addressing() {
        let mut d = Decision::default();
        d.set(0, true);
        d.set(9, true);
        d.set(255, true);
        assert_eq!(d.bit(0), 1);
        assert_eq!(d.bit(1), 0);
        assert_eq!(d.bit(9), 1);
        assert_eq!(d.bit(255), 1);
        assert_eq!(d.as_bytes()[1], 0x02);
        assert_eq!(d.as_bytes()[31], 0x80);
        d.set(9, false);
        assert_eq!(d.bit(9), 0);
    }

    #[test]
    fn test_store_word() {
        let mut d = Decision::default();
        d.store_word(3, 0x8001);
        assert_eq!(d.bit(48), 1);
        assert_eq!(d.bit(49), 0);
        assert_eq!(d.bit(63), 1);
        assert_eq!(d.as_bytes()[6], 0x01);
        assert_eq!(d.as_bytes()[7], 0x80);
    }

    #[test]
    fn test_history_cursor() {
        let mut h = DecisionHistory::with_capacity(3).unwrap();
        assert_eq!(h.capacity(), 3);
        assert!(h.is_empty());
        for _ in 0..3 {
            h.current_mut().unwrap().set(1, true);
            h.advance();
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.remaining(), 0);
        assert!(h.current_mut().is_none());
        assert!(h.recorded().iter().all(|d| d.bit(1) == 1));
        h.rewind();
        assert!(h.recorded().is_empty());
    }

    #[test]
    fn test_allocation_failure_reported() {
        let err = DecisionHistory::with_capacity(usize::MAX / 2).unwrap_err();
        assert_eq!(
            err,
            FecError::AllocationFailed {
                records: usize::MAX / 2
            }
        );
    }
}
