//! Handle-Style Decoder Lifecycle
//!
//! Free functions mirroring the create / init / update / chainback / delete
//! surface that protocol layers drive. A handle is an `Option`: `None` stands
//! for a null or already-deleted decoder and yields
//! [`FecError::InvalidHandle`] instead of a crash.
//!
//! ```rust
//! use r4w_fec::convolutional::ConvolutionalEncoder;
//! use r4w_fec::viterbi::lifecycle::*;
//!
//! let symbols = ConvolutionalEncoder::standard().encode_frame(&[0x5a]);
//! let mut handle = create_viterbi39(8);
//! init_viterbi39(handle.as_deref_mut(), 0).unwrap();
//! update_viterbi39_blk(handle.as_deref_mut(), &symbols, 16).unwrap();
//! let mut out = [0u8; 1];
//! chainback_viterbi39(handle.as_deref(), &mut out, 8, 0).unwrap();
//! assert_eq!(out, [0x5a]);
//! delete_viterbi39(handle.take());
//! assert!(init_viterbi39(handle.as_deref_mut(), 0).is_err());
//! ```

use std::sync::Arc;

use super::branch::{set_polynomials, BranchTable};
use super::decoder::Viterbi39;
use super::SYMBOLS_PER_STEP;
use crate::types::{FecError, FecResult};

fn require<T>(handle: Option<T>, op: &'static str) -> FecResult<T> {
    handle.ok_or_else(|| {
        tracing::warn!(op, "Invalid Viterbi39 handle");
        FecError::InvalidHandle
    })
}

/// Allocate a decoder for frames of up to `len` data bits.
///
/// Returns `None` if the decision history cannot be allocated.
pub fn create_viterbi39(len: usize) -> Option<Box<Viterbi39>> {
    match Viterbi39::new(len) {
        Ok(decoder) => Some(Box::new(decoder)),
        Err(e) => {
            tracing::warn!(len, error = %e, "Viterbi39 creation failed");
            None
        }
    }
}

/// Reset the decoder to `starting_state`.
pub fn init_viterbi39(handle: Option<&mut Viterbi39>, starting_state: usize) -> FecResult<()> {
    require(handle, "init")?.init(starting_state);
    Ok(())
}

/// Decode `nbits` steps from `symbols`; returns the renormalisation total.
pub fn update_viterbi39_blk(
    handle: Option<&mut Viterbi39>,
    symbols: &[u8],
    nbits: usize,
) -> FecResult<u64> {
    require(handle, "update")?.update(symbols, nbits)
}

/// Trace back `nbits` bits into `data` from `endstate`.
pub fn chainback_viterbi39(
    handle: Option<&Viterbi39>,
    data: &mut [u8],
    nbits: usize,
    endstate: usize,
) -> FecResult<u32> {
    require(handle, "chainback")?.chainback(data, nbits, endstate)
}

/// Release a decoder. `None` is accepted and ignored.
pub fn delete_viterbi39(handle: Option<Box<Viterbi39>>) {
    drop(handle);
}

/// Rebuild the process-wide branch table from `polys`.
///
/// Decoders created afterwards use the new table.
pub fn set_viterbi39_polynomial(polys: [i32; SYMBOLS_PER_STEP]) -> FecResult<Arc<BranchTable>> {
    set_polynomials(polys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convolutional::ConvolutionalEncoder;
    use crate::viterbi::Polynomials;

    #[test]
    fn test_full_lifecycle() {
        set_viterbi39_polynomial(Polynomials::STANDARD).unwrap();
        let message = b"lifecycle";
        let nbits = message.len() * 8;
        let symbols = ConvolutionalEncoder::standard().encode_frame(message);

        let mut handle = create_viterbi39(nbits);
        assert!(handle.is_some());
        init_viterbi39(handle.as_deref_mut(), 0).unwrap();

        // Two blocks, split mid-frame
        let first = 30;
        update_viterbi39_blk(handle.as_deref_mut(), &symbols, first).unwrap();
        update_viterbi39_blk(
            handle.as_deref_mut(),
            &symbols[first * 3..],
            nbits + 8 - first,
        )
        .unwrap();

        let mut out = vec![0u8; message.len()];
        let metric = chainback_viterbi39(handle.as_deref(), &mut out, nbits, 0).unwrap();
        assert_eq!(out, message);
        assert_eq!(metric, 0);

        delete_viterbi39(handle.take());
        assert!(handle.is_none());
    }

    #[test]
    fn test_invalid_handle_rejected() {
        let mut out = [0u8; 4];
        assert_eq!(init_viterbi39(None, 0), Err(FecError::InvalidHandle));
        assert_eq!(
            update_viterbi39_blk(None, &[0; 3], 1),
            Err(FecError::InvalidHandle)
        );
        assert_eq!(
            chainback_viterbi39(None, &mut out, 8, 0),
            Err(FecError::InvalidHandle)
        );
    }

    #[test]
    fn test_delete_tolerates_null() {
        delete_viterbi39(None);
        let handle = create_viterbi39(16);
        delete_viterbi39(handle);
    }

    #[test]
    fn test_create_reports_allocation_failure() {
        assert!(create_viterbi39(usize::MAX / 2).is_none());
        assert!(create_viterbi39(usize::MAX).is_none());
    }

    #[test]
    fn test_set_polynomial_validates() {
        assert_eq!(
            set_viterbi39_polynomial([0x1ed, 0x19b, 0x26]).unwrap_err(),
            FecError::InvalidPolynomial(0x26)
        );
    }
}
