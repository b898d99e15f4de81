//! Single-shot LZ4 block compression into caller-supplied buffers.
//!
//! The whole input is compressed in one call, into an output buffer the caller owns and sized
//! beforehand. Nothing is allocated and nothing is remembered between calls.
//!
//! ```
//! use lz_block::{compress_bound, decompress, BlockCompressor};
//!
//! let input = [0x41u8; 1000];
//! let mut output = vec![0u8; compress_bound(input.len())];
//!
//! let compressor: BlockCompressor = BlockCompressor::default();
//! let written = compressor.compress(&input, &mut output)?;
//! assert!(written < input.len());
//!
//! assert_eq!(decompress(&output[..written])?, &input[..]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A buffer of [`compress_bound`] bytes never overflows. With anything smaller, compression may
//! fail with [`CompressionError::BoundExceeded`]; the caller decides whether to retry with a
//! bigger buffer. The [`ffi`] module exposes the same operation to C callers, where failure is
//! reported as a return value of 0.

#![deny(unsafe_code)]

pub mod block;
pub mod ffi;
pub mod raw;

pub use block::{BlockCompressor, BlockEngine, CompressionError};
pub use raw::{
    compress_bound, decompress, decompress_block, decompress_into, DecompressionError, Lz4,
    MAX_INPUT_SIZE,
};
