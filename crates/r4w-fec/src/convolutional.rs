//! K=9, Rate 1/3 Convolutional Encoder
//!
//! Reference transmit side for [`crate::viterbi`]. The encoder shifts each
//! input bit into a 9-bit register and emits one output per generator
//! polynomial, as an offset-binary soft symbol: 0 for a zero bit, 255 for a
//! one bit.
//!
//! ## Framing
//!
//! - Bytes are consumed most significant bit first.
//! - [`ConvolutionalEncoder::encode_frame`] appends K-1 = 8 zero tail bits so
//!   the trellis ends in state 0.
//! - [`ConvolutionalEncoder::encode_stream`] does not, and keeps the register
//!   between calls.

use std::fmt;

use crate::types::FecResult;
use crate::viterbi::{Polynomials, CONSTRAINT_LENGTH, SYMBOLS_PER_STEP, TRACEBACK_MARGIN};

const REGISTER_MASK: u32 = (1 << CONSTRAINT_LENGTH) - 1;

/// Convolutional encoder for the K=9, rate 1/3 code.
#[derive(Debug, Clone)]
pub struct ConvolutionalEncoder {
    polys: [i32; SYMBOLS_PER_STEP],
    state: u32,
}

impl ConvolutionalEncoder {
    /// Create an encoder for `polys`. Negative polynomials invert their output.
    pub fn new(polys: [i32; SYMBOLS_PER_STEP]) -> FecResult<Self> {
        for &poly in &polys {
            Polynomials::validate(poly)?;
        }
        Ok(Self { polys, state: 0 })
    }

    /// Encoder for [`Polynomials::STANDARD`].
    pub fn standard() -> Self {
        Self {
            polys: Polynomials::STANDARD,
            state: 0,
        }
    }

    /// Generator polynomials, signed as passed to [`ConvolutionalEncoder::new`].
    pub fn polynomials(&self) -> [i32; SYMBOLS_PER_STEP] {
        self.polys
    }

    /// Current shift register contents (9 bits, newest bit in bit 0).
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Encode a single input bit, producing three symbols.
    pub fn encode_bit(&mut self, input: bool) -> [u8; SYMBOLS_PER_STEP] {
        self.state = ((self.state << 1) | input as u32) & REGISTER_MASK;
        self.polys
            .map(|poly| if Polynomials::output(poly, self.state) { 255 } else { 0 })
    }

    /// Encode a block of bits from a zeroed register, with the zero tail.
    pub fn encode_bits(&mut self, input: &[bool]) -> Vec<u8> {
        self.reset();
        let mut output = Vec::with_capacity((input.len() + TRACEBACK_MARGIN) * SYMBOLS_PER_STEP);
        for &bit in input {
            output.extend(self.encode_bit(bit));
        }
        output.extend(self.flush());
        output
    }

    /// Encode a byte frame from a zeroed register, with the zero tail.
    ///
    /// Produces `3 * (8 * data.len() + 8)` symbols.
    pub fn encode_frame(&mut self, data: &[u8]) -> Vec<u8> {
        self.reset();
        let mut output = self.encode_stream(data);
        output.extend(self.flush());
        output
    }

    /// Encode bytes without resetting or terminating (for streaming).
    pub fn encode_stream(&mut self, data: &[u8]) -> Vec<u8> {
        let mut output = Vec::with_capacity(data.len() * 8 * SYMBOLS_PER_STEP);
        for &byte in data {
            for i in (0..8).rev() {
                output.extend(self.encode_bit((byte >> i) & 1 == 1));
            }
        }
        output
    }

    /// Shift in the 8 zero tail bits.
    pub fn flush(&mut self) -> Vec<u8> {
        let mut output = Vec::with_capacity(TRACEBACK_MARGIN * SYMBOLS_PER_STEP);
        for _ in 0..TRACEBACK_MARGIN {
            output.extend(self.encode_bit(false));
        }
        output
    }

    /// Reset encoder state.
    pub fn reset(&mut self) {
        self.state = 0;
    }
}

impl Default for ConvolutionalEncoder {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for ConvolutionalEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conv(K={}, rate=1/{}, polys=[{:#x}, {:#x}, {:#x}])",
            CONSTRAINT_LENGTH, SYMBOLS_PER_STEP, self.polys[0], self.polys[1], self.polys[2]
        )
    }
}
