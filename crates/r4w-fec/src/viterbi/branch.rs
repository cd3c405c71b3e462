//! Branch Table
//!
//! For each of the 128 butterflies and each generator polynomial, the encoder
//! output bit on the transition out of predecessor state `j` (with the new
//! input bit and the outgoing top bit both zero), stored as 0 or 255 so that
//! XOR with an offset-binary symbol yields the symbol's distance from the
//! expected value.
//!
//! The table for the standard polynomials is built once per process. A
//! process-wide slot holds the table new decoders pick up by default;
//! [`set_polynomials`] replaces it.

use std::sync::{Arc, OnceLock, RwLock};

use super::metrics::{Lane, LANES};
use super::{CONSTRAINT_LENGTH, MAX_BRANCH_METRIC, NUM_BUTTERFLIES, SYMBOLS_PER_STEP};
use crate::types::{FecError, FecResult};

/// Lanes needed to cover all butterflies.
pub const BRANCH_LANES: usize = NUM_BUTTERFLIES / LANES;

/// Generator polynomials of the K=9 rate 1/3 code.
///
/// A negative value inverts that output; the taps are its absolute value.
pub struct Polynomials;

impl Polynomials {
    pub const A: i32 = 0x1ed;
    pub const B: i32 = 0x19b;
    pub const C: i32 = 0x127;

    /// The standard polynomial set.
    pub const STANDARD: [i32; 3] = [Self::A, Self::B, Self::C];

    /// Check that a polynomial is usable by the butterfly decoder.
    ///
    /// The taps must fit in K bits and include both the newest (bit 0) and the
    /// oldest (bit K-1) register stage.
    pub fn validate(poly: i32) -> FecResult<()> {
        let taps = poly.unsigned_abs();
        let oldest = 1u32 << (CONSTRAINT_LENGTH - 1);
        if taps >= oldest << 1 || taps & 1 == 0 || taps & oldest == 0 {
            return Err(FecError::InvalidPolynomial(poly));
        }
        Ok(())
    }

    /// Output bit of `poly` for a full K-bit encoder register.
    #[inline]
    pub fn output(poly: i32, register: u32) -> bool {
        ((register & poly.unsigned_abs()).count_ones() & 1 == 1) ^ (poly < 0)
    }
}

/// Expected encoder outputs per butterfly, read-only once built.
#[derive(Clone, PartialEq, Eq)]
pub struct BranchTable {
    polys: [i32; SYMBOLS_PER_STEP],
    expected: [[Lane; BRANCH_LANES]; SYMBOLS_PER_STEP],
}

impl BranchTable {
    /// Build a table for `polys`, validating each polynomial.
    pub fn new(polys: [i32; SYMBOLS_PER_STEP]) -> FecResult<Self> {
        for &poly in &polys {
            Polynomials::validate(poly)?;
        }
        Ok(Self::build(polys))
    }

    fn build(polys: [i32; SYMBOLS_PER_STEP]) -> Self {
        let mut expected = [[[0i16; LANES]; BRANCH_LANES]; SYMBOLS_PER_STEP];
        for (table, &poly) in expected.iter_mut().zip(polys.iter()) {
            for butterfly in 0..NUM_BUTTERFLIES {
                let bit = Polynomials::output(poly, 2 * butterfly as u32);
                table[butterfly / LANES][butterfly % LANES] = if bit { 255 } else { 0 };
            }
        }
        Self { polys, expected }
    }

    /// Table for [`Polynomials::STANDARD`], shared process-wide.
    pub fn standard() -> Arc<Self> {
        static STANDARD: OnceLock<Arc<BranchTable>> = OnceLock::new();
        STANDARD
            .get_or_init(|| Arc::new(Self::build(Polynomials::STANDARD)))
            .clone()
    }

    /// Polynomials this table was built from.
    pub fn polynomials(&self) -> [i32; SYMBOLS_PER_STEP] {
        self.polys
    }

    /// Expected output (0 or 255) of polynomial `poly` for `butterfly`.
    #[inline]
    pub fn expected(&self, poly: usize, butterfly: usize) -> i16 {
        self.expected[poly][butterfly / LANES][butterfly % LANES]
    }

    /// Expected outputs of polynomial `poly` for butterflies `lane*8 .. lane*8+8`.
    #[inline]
    pub fn lane(&self, poly: usize, lane: usize) -> &Lane {
        &self.expected[poly][lane]
    }

    /// Branch metrics of `butterfly` for the received `symbols`.
    ///
    /// Returns `(metric, complement)`: the distance of the symbols from the
    /// transition `j -> 2j`, and from its complement. They always sum to
    /// [`MAX_BRANCH_METRIC`].
    #[inline]
    pub fn branch_metric(&self, butterfly: usize, symbols: [u8; SYMBOLS_PER_STEP]) -> (i16, i16) {
        let metric = (0..SYMBOLS_PER_STEP)
            .map(|p| self.expected(p, butterfly) ^ symbols[p] as i16)
            .sum::<i16>();
        (metric, MAX_BRANCH_METRIC - metric)
    }
}

impl std::fmt::Debug for BranchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchTable")
            .field(
                "polys",
                &self.polys.iter().map(|p| format!("{:#x}", p)).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn process_slot() -> &'static RwLock<Arc<BranchTable>> {
    static SLOT: OnceLock<RwLock<Arc<BranchTable>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(BranchTable::standard()))
}

/// The branch table new decoders use by default.
pub fn process_table() -> Arc<BranchTable> {
    match process_slot().read() {
        Ok(table) => table.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Rebuild the process-wide branch table for `polys`.
///
/// Idempotent: setting the polynomials already in effect returns the current
/// table without rebuilding it. Decoders created earlier keep their table.
pub fn set_polynomials(polys: [i32; SYMBOLS_PER_STEP]) -> FecResult<Arc<BranchTable>> {
    let current = process_table();
    if current.polynomials() == polys {
        return Ok(current);
    }

    let table = Arc::new(BranchTable::new(polys)?);
    let mut slot = match process_slot().write() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    };
    *slot = table.clone();
    tracing::debug!(polys = ?table, "Process-wide branch table replaced");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viterbi::NUM_STATES;

    #[test]
    fn test_standard_polynomials_valid() {
        for poly in Polynomials::STANDARD {
            assert!(Polynomials::validate(poly).is_ok());
            assert!(Polynomials::validate(-poly).is_ok());
        }
    }

    #[test]
    fn test_rejects_polynomials_without_end_taps() {
        assert_eq!(
            Polynomials::validate(0x1ec),
            Err(FecError::InvalidPolynomial(0x1ec))
        );
        assert_eq!(
            Polynomials::validate(0x0ed),
            Err(FecError::InvalidPolynomial(0x0ed))
        );
        assert_eq!(
            Polynomials::validate(0x3ed),
            Err(FecError::InvalidPolynomial(0x3ed))
        );
        assert!(BranchTable::new([0x1ed, 0x19b, 0x126]).is_err());
    }

    #[test]
    fn test_table_matches_register_parity() {
        let table = BranchTable::standard();
        for (p, &poly) in Polynomials::STANDARD.iter().enumerate() {
            for j in 0..NUM_BUTTERFLIES {
                let parity = ((2 * j as u32) & poly as u32).count_ones() & 1;
                let expected = if parity == 1 { 255 } else { 0 };
                assert_eq!(table.expected(p, j), expected, "poly {p} butterfly {j}");
                assert_eq!(table.lane(p, j / LANES)[j % LANES], expected);
            }
        }
    }

    #[test]
    fn test_negative_polynomial_inverts() {
        let plain = BranchTable::new(Polynomials::STANDARD).unwrap();
        let inverted = BranchTable::new([Polynomials::A, -Polynomials::B, Polynomials::C]).unwrap();
        for j in 0..NUM_BUTTERFLIES {
            assert_eq!(plain.expected(0, j), inverted.expected(0, j));
            assert_eq!(plain.expected(1, j), 255 - inverted.expected(1, j));
            assert_eq!(plain.expected(2, j), inverted.expected(2, j));
        }
    }

    #[test]
    fn test_branch_metrics_complementary() {
        let table = BranchTable::standard();
        let mut seed: u32 = 12345;
        for _ in 0..64 {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let symbols = [(seed >> 8) as u8, (seed >> 16) as u8, (seed >> 24) as u8];
            for j in 0..NUM_BUTTERFLIES {
                let (metric, complement) = table.branch_metric(j, symbols);
                assert!((0..=765).contains(&metric));
                assert_eq!(metric + complement, 765, "butterfly {j}");
            }
        }
        assert_eq!(NUM_STATES, 2 * NUM_BUTTERFLIES);
    }

    #[test]
    fn test_branch_metric_is_distance() {
        let table = BranchTable::standard();
        // Butterfly 0 expects all-zero output for j -> 2j
        assert_eq!(table.branch_metric(0, [0, 0, 0]), (0, 765));
        assert_eq!(table.branch_metric(0, [255, 255, 255]), (765, 0));
        assert_eq!(table.branch_metric(0, [10, 20, 30]), (60, 705));
    }

    #[test]
    fn test_standard_is_shared() {
        assert!(Arc::ptr_eq(&BranchTable::standard(), &BranchTable::standard()));
    }

    #[test]
    fn test_set_polynomials_idempotent() {
        let first = set_polynomials(Polynomials::STANDARD).unwrap();
        let second = set_polynomials(Polynomials::STANDARD).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(process_table().polynomials(), Polynomials::STANDARD);
    }

    #[test]
    fn test_set_polynomials_rejects_invalid() {
        assert_eq!(
            set_polynomials([0x1ed, 0x19b, 0x100]).unwrap_err(),
            FecError::InvalidPolynomial(0x100)
        );
        assert_eq!(process_table().polynomials(), Polynomials::STANDARD);
    }
}
