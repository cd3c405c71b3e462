//! GF(2^m) Log/Antilog Tables
//!
//! Field elements have two representations: the element itself ("alpha-to"
//! form) and its power of the primitive element ("index-of" form). The
//! tables map between them so that multiplication becomes integer addition
//! modulo the field order.
//!
//! Zero has no logarithm. Its index-of value is the sentinel [`GfTables::a0`],
//! which equals `NN = 2^m - 1`, one past the largest valid exponent.
//!
//! ```text
//! index:     0   1   2   3   4   5   6   7   8   ...
//! alpha_to:  1   2   4   8  16  32  64 128 135   ...   (gfpoly 0x187)
//! ```

use crate::types::{FecError, FecResult};

/// Largest supported symbol size in bits.
pub const MAX_SYMBOL_SIZE: u32 = 8;

/// Log/antilog tables for GF(2^symsize).
#[derive(Clone, PartialEq, Eq)]
pub struct GfTables {
    symsize: u32,
    gfpoly: u32,
    nn: usize,
    /// alpha_to[i] = alpha^i; alpha_to[NN] = 0
    alpha_to: Vec<u8>,
    /// index_of[x] = log_alpha(x); index_of[0] = NN
    index_of: Vec<u8>,
}

impl GfTables {
    /// Build the tables for the field generated by `gfpoly`.
    ///
    /// `gfpoly` includes the x^symsize term (e.g. 0x187 for CCSDS,
    /// 0x11d for the common x^8 + x^4 + x^3 + x^2 + 1 field).
    pub fn new(symsize: u32, gfpoly: u32) -> FecResult<Self> {
        if symsize == 0 || symsize > MAX_SYMBOL_SIZE {
            return Err(FecError::InvalidSymbolSize(symsize));
        }
        let nn = (1usize << symsize) - 1;
        let mut alpha_to = vec![0u8; nn + 1];
        let mut index_of = vec![0u8; nn + 1];

        index_of[0] = nn as u8;
        alpha_to[nn] = 0;

        let mut sr: u32 = 1;
        for i in 0..nn {
            index_of[sr as usize] = i as u8;
            alpha_to[i] = sr as u8;
            sr <<= 1;
            if sr & (1 << symsize) != 0 {
                sr ^= gfpoly;
            }
            sr &= nn as u32;
        }
        // A primitive polynomial cycles back to 1 after exactly NN steps
        if sr != 1 {
            return Err(FecError::NotPrimitive { gfpoly });
        }

        Ok(Self {
            symsize,
            gfpoly,
            nn,
            alpha_to,
            index_of,
        })
    }

    /// Symbol size in bits.
    pub fn symsize(&self) -> u32 {
        self.symsize
    }

    /// Field generator polynomial.
    pub fn gfpoly(&self) -> u32 {
        self.gfpoly
    }

    /// Field order minus one: the number of nonzero elements.
    pub fn nn(&self) -> usize {
        self.nn
    }

    /// Index-of sentinel for the zero element.
    #[inline]
    pub fn a0(&self) -> usize {
        self.nn
    }

    /// Reduce an exponent modulo NN without a division.
    #[inline]
    pub fn modnn(&self, mut x: usize) -> usize {
        while x >= self.nn {
            x -= self.nn;
            x = (x >> self.symsize) + (x & self.nn);
        }
        x
    }

    /// Logarithm of `x`, or [`Self::a0`] when `x` is zero.
    #[inline]
    pub fn index_of(&self, x: u8) -> usize {
        self.index_of[x as usize] as usize
    }

    /// Field element alpha^`i`. `alpha_to(a0())` is zero.
    #[inline]
    pub fn alpha_to(&self, i: usize) -> u8 {
        self.alpha_to[i]
    }

    /// Multiply two field elements.
    #[inline]
    pub fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.alpha_to[self.modnn(self.index_of(a) + self.index_of(b))]
    }

    /// Largest valid symbol value.
    pub fn max_symbol(&self) -> u8 {
        self.nn as u8
    }
}

impl std::fmt::Debug for GfTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GfTables")
            .field("symsize", &self.symsize)
            .field("gfpoly", &format_args!("{:#x}", self.gfpoly))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ccsds_table_prefix() {
        let gf = GfTables::new(8, 0x187).unwrap();
        assert_eq!(
            &gf.alpha_to[..16],
            &[1, 2, 4, 8, 16, 32, 64, 128, 135, 137, 149, 173, 221, 61, 122, 244]
        );
        assert_eq!(
            &gf.index_of[..16],
            &[255, 0, 1, 99, 2, 198, 100, 106, 3, 205, 199, 188, 101, 126, 107, 42]
        );
    }

    #[test]
    fn test_log_antilog_inverse() {
        for &(symsize, gfpoly) in &[(3, 0xb), (4, 0x13), (8, 0x11d), (8, 0x187)] {
            let gf = GfTables::new(symsize, gfpoly).unwrap();
            for x in 1..=gf.nn() {
                let x = x as u8;
                assert_eq!(gf.alpha_to(gf.index_of(x)), x);
            }
            assert_eq!(gf.index_of(0), gf.a0());
            assert_eq!(gf.alpha_to(gf.a0()), 0);
        }
    }

    #[test]
    fn test_modnn() {
        let gf = GfTables::new(8, 0x11d).unwrap();
        for x in 0..2000 {
            assert_eq!(gf.modnn(x), x % 255, "modnn({x})");
        }
        let gf = GfTables::new(4, 0x13).unwrap();
        for x in 0..200 {
            assert_eq!(gf.modnn(x), x % 15, "modnn({x})");
        }
    }

    #[test]
    fn test_mul_matches_shift_and_add() {
        let gf = GfTables::new(8, 0x11d).unwrap();
        let slow = |mut a: u16, mut b: u16| -> u8 {
            let mut p = 0u16;
            while b != 0 {
                if b & 1 != 0 {
                    p ^= a;
                }
                a <<= 1;
                if a & 0x100 != 0 {
                    a ^= 0x11d;
                }
                b >>= 1;
            }
            p as u8
        };
        for a in (0..=255u16).step_by(7) {
            for b in (0..=255u16).step_by(5) {
                assert_eq!(gf.mul(a as u8, b as u8), slow(a, b));
            }
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert_eq!(GfTables::new(0, 0x3), Err(FecError::InvalidSymbolSize(0)));
        assert_eq!(GfTables::new(9, 0x211), Err(FecError::InvalidSymbolSize(9)));
        // x^8 + x^4 + x^3 + x + 1 is irreducible but not primitive
        assert_eq!(
            GfTables::new(8, 0x11b),
            Err(FecError::NotPrimitive { gfpoly: 0x11b })
        );
    }
}
