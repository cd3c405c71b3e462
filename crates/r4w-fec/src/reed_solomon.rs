//! Reed-Solomon Encoder
//!
//! Systematic RS encoder over GF(2^m), m <= 8, computed as synthetic
//! polynomial division by the generator polynomial in the log domain. Field
//! multiplications become integer additions modulo NN, so the inner loop is
//! a table lookup and an XOR per parity symbol.
//!
//! ## Configurations
//!
//! - CCSDS RS(255,223): gfpoly 0x187, fcr 112, prim 11, 32 roots ([`ccsds`])
//! - Any (symsize, gfpoly, fcr, prim, nroots, pad) via [`RsCode::new`]
//!
//! Shortened codes are expressed with `pad`: the leading `pad` message
//! symbols are implicitly zero and are not transmitted, so the encoder reads
//! exactly `NN - NROOTS - pad` data symbols.
//!
//! ## Example
//!
//! ```rust
//! use r4w_fec::reed_solomon::{self, RsCode, RsParams};
//!
//! // CCSDS RS(255,223), shortened to a 100-byte message
//! let rs = reed_solomon::ccsds();
//! let data = vec![0x5a; 100];
//! let mut parity = [0u8; 32];
//! reed_solomon::encode_rs_8(&data, &mut parity, 223 - 100).unwrap();
//! assert!(rs.is_codeword(&[&data[..], &parity[..]].concat(), 123).unwrap());
//!
//! // A small code over GF(16)
//! let small = RsCode::new(RsParams {
//!     symsize: 4,
//!     gfpoly: 0x13,
//!     fcr: 1,
//!     prim: 1,
//!     nroots: 4,
//!     pad: 0,
//! })
//! .unwrap();
//! assert_eq!(small.data_len(), 11);
//! ```

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::gf::GfTables;
use crate::types::{FecError, FecResult};

/// Parameters that fully determine a Reed-Solomon code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsParams {
    /// Bits per symbol (1..=8)
    pub symsize: u32,
    /// Field generator polynomial, including the x^symsize term
    pub gfpoly: u32,
    /// First consecutive root of the generator, in index form
    pub fcr: u32,
    /// Primitive element used to space the roots, in index form
    pub prim: u32,
    /// Number of generator roots (parity symbols)
    pub nroots: usize,
    /// Leading zero symbols dropped from a shortened code
    pub pad: usize,
}

impl RsParams {
    /// CCSDS RS(255,223). Used in space telemetry links.
    pub fn ccsds() -> Self {
        Self {
            symsize: 8,
            gfpoly: 0x187,
            fcr: 112,
            prim: 11,
            nroots: 32,
            pad: 0,
        }
    }

    /// RS(255,239) over the 0x11d field with narrow-sense roots.
    pub fn dvb() -> Self {
        Self {
            symsize: 8,
            gfpoly: 0x11d,
            fcr: 0,
            prim: 1,
            nroots: 16,
            pad: 0,
        }
    }

    /// Same code with a different shortening.
    pub fn with_pad(mut self, pad: usize) -> Self {
        self.pad = pad;
        self
    }
}

impl Default for RsParams {
    fn default() -> Self {
        Self::ccsds()
    }
}

/// A configured Reed-Solomon code: field tables plus generator polynomial.
///
/// Built once per configuration and read-only afterwards; one instance can
/// serve any number of concurrent encode calls.
#[derive(Debug, Clone)]
pub struct RsCode {
    gf: GfTables,
    fcr: u32,
    prim: u32,
    /// prim-th root of 1, index form
    iprim: usize,
    nroots: usize,
    pad: usize,
    /// Generator polynomial in index form, lowest degree first. genpoly[nroots] is 0 (unity).
    genpoly: Vec<usize>,
}

impl RsCode {
    /// Build the field tables and generator polynomial for `params`.
    pub fn new(params: RsParams) -> FecResult<Self> {
        let gf = GfTables::new(params.symsize, params.gfpoly)?;
        let nn = gf.nn();
        let field_size = 1u32 << params.symsize;

        if params.fcr >= field_size {
            return Err(FecError::InvalidFirstRoot {
                fcr: params.fcr,
                max: field_size - 1,
            });
        }
        if params.prim == 0 || params.prim >= field_size {
            return Err(FecError::InvalidPrimitiveElement {
                prim: params.prim,
                max: field_size - 1,
            });
        }
        // At least one message symbol must remain
        if params.nroots >= nn {
            return Err(FecError::InvalidRootCount {
                nroots: params.nroots,
                max: nn - 1,
            });
        }
        if params.pad >= nn - params.nroots {
            return Err(FecError::PadTooLarge {
                pad: params.pad,
                max: nn - params.nroots - 1,
            });
        }

        let prim = params.prim as usize;
        let mut iprim = 1;
        while iprim % prim != 0 {
            iprim += nn;
        }
        let iprim = iprim / prim;

        let genpoly = Self::build_generator(&gf, params.fcr as usize, prim, params.nroots);

        tracing::debug!(
            symsize = params.symsize,
            gfpoly = params.gfpoly,
            fcr = params.fcr,
            prim = params.prim,
            nroots = params.nroots,
            pad = params.pad,
            "Reed-Solomon code configured"
        );

        Ok(Self {
            gf,
            fcr: params.fcr,
            prim: params.prim,
            iprim,
            nroots: params.nroots,
            pad: params.pad,
            genpoly,
        })
    }

    /// Build prod_{i=0}^{nroots-1} (x - alpha^((fcr+i)*prim)), returned in index form.
    fn build_generator(gf: &GfTables, fcr: usize, prim: usize, nroots: usize) -> Vec<usize> {
        let mut genpoly = vec![0u8; nroots + 1];
        genpoly[0] = 1;

        let mut root = fcr * prim;
        for i in 0..nroots {
            genpoly[i + 1] = 1;
            // Multiply genpoly[] by (x + alpha^root)
            for j in (1..=i).rev() {
                genpoly[j] = if genpoly[j] != 0 {
                    genpoly[j - 1] ^ gf.alpha_to(gf.modnn(gf.index_of(genpoly[j]) + root))
                } else {
                    genpoly[j - 1]
                };
            }
            // genpoly[0] can never be zero
            genpoly[0] = gf.alpha_to(gf.modnn(gf.index_of(genpoly[0]) + root));
            root += prim;
        }

        genpoly.into_iter().map(|g| gf.index_of(g)).collect()
    }

    /// Field tables of this code.
    pub fn tables(&self) -> &GfTables {
        &self.gf
    }

    /// Symbols per full-length codeword (NN).
    pub fn nn(&self) -> usize {
        self.gf.nn()
    }

    /// Number of parity symbols (NROOTS).
    pub fn nroots(&self) -> usize {
        self.nroots
    }

    /// Configured shortening.
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// First consecutive root, index form.
    pub fn fcr(&self) -> u32 {
        self.fcr
    }

    /// Root spacing, index form.
    pub fn prim(&self) -> u32 {
        self.prim
    }

    /// prim-th root of 1, index form. Used when locating errors.
    pub fn iprim(&self) -> usize {
        self.iprim
    }

    /// Generator polynomial in index form, lowest degree first.
    pub fn generator(&self) -> &[usize] {
        &self.genpoly
    }

    /// Message symbols per codeword for the configured pad.
    pub fn data_len(&self) -> usize {
        self.nn() - self.nroots - self.pad
    }

    /// Largest pad this code accepts.
    pub fn max_pad(&self) -> usize {
        self.nn() - self.nroots - 1
    }

    /// Encode with the configured pad, writing `NROOTS` parity symbols.
    pub fn encode(&self, data: &[u8], parity: &mut [u8]) -> FecResult<()> {
        self.encode_with_pad(data, parity, self.pad)
    }

    /// Encode a message shortened by `pad` symbols.
    ///
    /// Reads exactly `NN - NROOTS - pad` symbols from `data` and overwrites
    /// the first `NROOTS` symbols of `parity`. Longer buffers are accepted;
    /// the excess is left untouched.
    pub fn encode_with_pad(&self, data: &[u8], parity: &mut [u8], pad: usize) -> FecResult<()> {
        let nn = self.nn();
        let nroots = self.nroots;

        if pad > self.max_pad() {
            return Err(FecError::PadTooLarge {
                pad,
                max: self.max_pad(),
            });
        }
        let data_len = nn - nroots - pad;
        if data.len() < data_len {
            return Err(FecError::BufferTooShort {
                expected: data_len,
                actual: data.len(),
            });
        }
        if parity.len() < nroots {
            return Err(FecError::BufferTooShort {
                expected: nroots,
                actual: parity.len(),
            });
        }
        let max = self.gf.max_symbol();
        if let Some((index, &value)) = data[..data_len].iter().enumerate().find(|(_, &s)| s > max) {
            return Err(FecError::SymbolOutOfRange { index, value, max });
        }

        lfsr_encode(&self.gf, &self.genpoly, &data[..data_len], &mut parity[..nroots]);
        Ok(())
    }

    /// Encode and return the systematic codeword `data || parity`.
    pub fn codeword(&self, data: &[u8]) -> FecResult<Vec<u8>> {
        let data_len = self.data_len();
        let mut block = vec![0u8; data_len + self.nroots];
        if data.len() < data_len {
            return Err(FecError::BufferTooShort {
                expected: data_len,
                actual: data.len(),
            });
        }
        block[..data_len].copy_from_slice(&data[..data_len]);
        let (message, parity) = block.split_at_mut(data_len);
        self.encode(message, parity)?;
        Ok(block)
    }

    /// Evaluate a received block at each generator root.
    ///
    /// `block` holds `NN - pad` symbols: the (shortened) message followed by
    /// the parity. Syndromes are returned in alpha-to form; all zero means
    /// `block` is a codeword.
    pub fn syndromes(&self, block: &[u8], pad: usize) -> FecResult<Vec<u8>> {
        if pad > self.max_pad() {
            return Err(FecError::PadTooLarge {
                pad,
                max: self.max_pad(),
            });
        }
        let len = self.nn() - pad;
        if block.len() < len {
            return Err(FecError::BufferTooShort {
                expected: len,
                actual: block.len(),
            });
        }
        let max = self.gf.max_symbol();
        if let Some((index, &value)) = block[..len].iter().enumerate().find(|(_, &s)| s > max) {
            return Err(FecError::SymbolOutOfRange { index, value, max });
        }

        let gf = &self.gf;
        let prim = self.prim as usize;
        let mut syndromes = vec![block[0]; self.nroots];
        for &symbol in &block[1..len] {
            for (i, s) in syndromes.iter_mut().enumerate() {
                *s = if *s == 0 {
                    symbol
                } else {
                    let root = (self.fcr as usize + i) * prim;
                    symbol ^ gf.alpha_to(gf.modnn(gf.index_of(*s) + root))
                };
            }
        }
        Ok(syndromes)
    }

    /// True when every syndrome of `block` is zero.
    pub fn is_codeword(&self, block: &[u8], pad: usize) -> FecResult<bool> {
        Ok(self.syndromes(block, pad)?.iter().all(|&s| s == 0))
    }
}

/// Polynomial division of `data` by the generator, leaving the remainder in `parity`.
fn lfsr_encode(gf: &GfTables, genpoly: &[usize], data: &[u8], parity: &mut [u8]) {
    let nroots = parity.len();
    let a0 = gf.a0();

    parity.fill(0);
    if nroots == 0 {
        return;
    }

    for &symbol in data {
        let feedback = gf.index_of(symbol ^ parity[0]);
        if feedback != a0 {
            for j in 1..nroots {
                parity[j] ^= gf.alpha_to(gf.modnn(feedback + genpoly[nroots - j]));
            }
        }
        parity.copy_within(1.., 0);
        parity[nroots - 1] = if feedback != a0 {
            gf.alpha_to(gf.modnn(feedback + genpoly[0]))
        } else {
            0
        };
    }
}

static CCSDS: OnceLock<RsCode> = OnceLock::new();

/// The CCSDS RS(255,223) code, built once per process.
pub fn ccsds() -> &'static RsCode {
    CCSDS.get_or_init(|| match RsCode::new(RsParams::ccsds()) {
        Ok(code) => code,
        // Constant parameters; validated by test_ccsds_generator
        Err(e) => unreachable!("CCSDS parameters rejected: {e}"),
    })
}

/// Encode with the CCSDS RS(255,223) code, shortened by `pad` symbols.
///
/// `data` must hold at least `223 - pad` symbols and `parity` at least 32.
pub fn encode_rs_8(data: &[u8], parity: &mut [u8], pad: usize) -> FecResult<()> {
    ccsds().encode_with_pad(data, parity, pad)
}
