//! Parallel Batch Coding
//!
//! Decoder instances share nothing mutable, so independent frames decode on
//! separate rayon workers with one decoder each. Enable with the `parallel`
//! feature flag.
//!
//! ```toml
//! [dependencies]
//! r4w-fec = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! A single frame is still decoded sequentially; the gain comes from
//! batches of frames.

use std::sync::Arc;

use rayon::prelude::*;

use crate::reed_solomon::RsCode;
use crate::types::FecResult;
use crate::viterbi::{Backend, BranchTable, Viterbi39};

/// Decodes batches of tail-terminated frames in parallel.
#[derive(Debug, Clone)]
pub struct ParallelDecoder {
    table: Arc<BranchTable>,
    backend: Backend,
}

impl ParallelDecoder {
    pub fn new(table: Arc<BranchTable>, backend: Backend) -> Self {
        Self {
            table,
            backend: backend.resolve(),
        }
    }

    /// Decoder for the standard polynomials on the detected backend.
    pub fn standard() -> Self {
        Self::new(BranchTable::standard(), Backend::Auto)
    }

    /// Decode frames of `nbits` data bits each.
    ///
    /// Results are in input order; each holds the data bytes and the total
    /// path metric, or the error for that frame alone.
    pub fn decode_batch(&self, frames: &[&[u8]], nbits: usize) -> Vec<FecResult<(Vec<u8>, u64)>> {
        frames
            .par_iter()
            .map_init(
                || Viterbi39::with_table(nbits, self.table.clone(), self.backend),
                |decoder, symbols| match decoder {
                    Ok(decoder) => decoder.decode_frame(symbols, nbits),
                    Err(e) => Err(e.clone()),
                },
            )
            .collect()
    }
}

/// Compute Reed-Solomon parity for many blocks in parallel.
pub fn encode_batch(code: &RsCode, blocks: &[&[u8]]) -> Vec<FecResult<Vec<u8>>> {
    blocks
        .par_iter()
        .map(|data| {
            let mut parity = vec![0u8; code.nroots()];
            code.encode(data, &mut parity).map(|()| parity)
        })
        .collect()
}
