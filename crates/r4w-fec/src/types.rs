//! Core types shared by the FEC codecs
//!
//! Every fallible operation in this crate returns [`FecResult`]. The error
//! taxonomy follows the three failure classes of the codec library:
//!
//! - **Invalid handle**: a destroyed or missing decoder passed to one of the
//!   lifecycle functions in [`crate::viterbi::lifecycle`]
//! - **Allocation failure**: the decision history could not be reserved
//! - **Precondition violation**: buffer sizes or code parameters that do not
//!   match the configured code
//!
//! There are no retryable errors: nothing here performs I/O.

/// Result type for FEC operations
pub type FecResult<T> = Result<T, FecError>;

/// Errors that can occur during FEC operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FecError {
    #[error("Invalid decoder handle")]
    InvalidHandle,

    #[error("Failed to allocate decision history for {records} steps")]
    AllocationFailed { records: usize },

    #[error("Invalid symbol size: {0}. Must be between 1 and 8")]
    InvalidSymbolSize(u32),

    #[error("Field polynomial {gfpoly:#x} is not primitive")]
    NotPrimitive { gfpoly: u32 },

    #[error("Invalid first consecutive root: {fcr} (max {max})")]
    InvalidFirstRoot { fcr: u32, max: u32 },

    #[error("Invalid primitive element: {prim}. Must be between 1 and {max}")]
    InvalidPrimitiveElement { prim: u32, max: u32 },

    #[error("Invalid number of roots: {nroots} (max {max})")]
    InvalidRootCount { nroots: usize, max: usize },

    #[error("Pad too large: {pad} (max {max})")]
    PadTooLarge { pad: usize, max: usize },

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Symbol {value:#x} at index {index} exceeds field maximum {max:#x}")]
    SymbolOutOfRange { index: usize, value: u8, max: u8 },

    #[error("Invalid generator polynomial: {0:#x}")]
    InvalidPolynomial(i32),

    #[error("Decision history exhausted: {requested} steps requested, {available} available")]
    HistoryExhausted { requested: usize, available: usize },

    #[error("Insufficient history: {needed} steps needed, {available} decoded")]
    InsufficientHistory { needed: usize, available: usize },
}
