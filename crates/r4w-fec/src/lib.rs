//! # R4W Forward Error Correction
//!
//! Channel coding for noisy links: Reed-Solomon block encoding over
//! GF(2^m) and soft-decision Viterbi decoding of the K=9, rate 1/3
//! convolutional code.
//!
//! ## Overview
//!
//! - **Galois fields**: log/antilog tables for GF(2^m), m = 1..=8
//! - **Reed-Solomon**: generator construction and the systematic LFSR
//!   encoder, with the CCSDS (255,223) code prebuilt
//! - **Convolutional encoding**: reference K=9 r=1/3 encoder producing
//!   offset-binary soft symbols
//! - **Viterbi decoding**: 256-state trellis with lane-parallel
//!   add-compare-select, 16-bit metrics with renormalisation, and traceback
//!
//! ## Signal Flow
//!
//! ```text
//! TX: Data → RS Encode → (interleave/frame) → Conv Encode → symbols
//! RX: soft symbols → Viterbi update* → chainback → (deframe) → Data
//! ```
//!
//! ## Example
//!
//! ```rust
//! use r4w_fec::prelude::*;
//!
//! // Reed-Solomon parity for a shortened CCSDS block
//! let message = b"telemetry frame";
//! let pad = 223 - message.len();
//! let mut parity = [0u8; 32];
//! encode_rs_8(message, &mut parity, pad).unwrap();
//!
//! // Convolutionally encode the message and decode it again
//! let nbits = message.len() * 8;
//! let symbols = ConvolutionalEncoder::standard().encode_frame(message);
//! let mut decoder = Viterbi39::new(nbits).unwrap();
//! let (decoded, metric) = decoder.decode_frame(&symbols, nbits).unwrap();
//! assert_eq!(decoded, message);
//! assert_eq!(metric, 0);
//! ```

pub mod config;
pub mod convolutional;
pub mod gf;
pub mod observe;
pub mod reed_solomon;
pub mod types;
pub mod viterbi;

// Batch coding on rayon (requires `parallel` feature)
#[cfg(feature = "parallel")]
pub mod parallel;

pub use config::{ConfigError, FecConfig, ViterbiConfig};
pub use convolutional::ConvolutionalEncoder;
pub use gf::GfTables;
pub use reed_solomon::{encode_rs_8, RsCode, RsParams};
pub use types::{FecError, FecResult};
pub use viterbi::{Backend, BranchTable, Polynomials, Viterbi39};

/// Commonly used types.
pub mod prelude {
    pub use crate::convolutional::ConvolutionalEncoder;
    pub use crate::reed_solomon::{encode_rs_8, RsCode, RsParams};
    pub use crate::types::{FecError, FecResult};
    pub use crate::viterbi::lifecycle::{
        chainback_viterbi39, create_viterbi39, delete_viterbi39, init_viterbi39,
        set_viterbi39_polynomial, update_viterbi39_blk,
    };
    pub use crate::viterbi::{Backend, Polynomials, Viterbi39};
}
