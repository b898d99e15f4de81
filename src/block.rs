//! The block compressor: one input buffer in, one caller-supplied output buffer out.
//!
//! The compressor does no compression of its own. It hands the buffers to a [`BlockEngine`],
//! checks that the engine kept within the output limit, and turns an overflow into
//! [`CompressionError::BoundExceeded`]. It holds no state between calls, so one compressor can be
//! shared freely between threads.

use std::cmp;
use std::io::{self, ErrorKind};
use fehler::{throw, throws};
use thiserror::Error;

use crate::raw::Lz4;

/// Errors when compressing a block.
#[derive(Error, Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionError {
    /// The compressed block did not fit within `limit` bytes. Retrying with a buffer of
    /// [`BlockCompressor::compress_bound`] bytes always succeeds.
    #[error("the compressed block does not fit into {limit} bytes")]
    BoundExceeded { limit: usize },
}
type Error = CompressionError;

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        io::Error::new(ErrorKind::Other, e)
    }
}

/// A single-pass block compression capability.
pub trait BlockEngine {
    /// Minimum output capacity that is guaranteed to hold the block for `input_len` bytes,
    /// or 0 if the engine refuses inputs that large.
    fn compress_bound(&self, input_len: usize) -> usize;

    /// Compresses all of `input` into `output` and returns the number of bytes written.
    ///
    /// Implementations fail instead of truncating when the block does not fit, and leave no
    /// partial block behind in `output` when they do.
    fn compress_block(&self, input: &[u8], output: &mut [u8]) -> io::Result<usize>;
}

/// Compresses whole buffers in one call each, using the engine `E`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockCompressor<E = Lz4> {
    engine: E,
}

impl<E> BlockCompressor<E> {
    pub const fn new(engine: E) -> Self {
        BlockCompressor { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: BlockEngine> BlockCompressor<E> {
    /// See [`BlockEngine::compress_bound`].
    pub fn compress_bound(&self, input_len: usize) -> usize {
        self.engine.compress_bound(input_len)
    }

    /// Compresses `input` into `output`, using all of `output` as the limit.
    #[throws]
    pub fn compress(&self, input: &[u8], output: &mut [u8]) -> usize {
        let limit = output.len();
        self.compress_limited(input, output, limit)?
    }

    /// Compresses `input` into `output`, writing at most `max_output` bytes.
    ///
    /// On success the block occupies `output[..n]` for the returned `n`, and `n <= max_output`.
    /// On failure nothing past `max_output` has been touched.
    #[throws]
    pub fn compress_limited(&self, input: &[u8], output: &mut [u8], max_output: usize) -> usize {
        let limit = cmp::min(max_output, output.len());
        match self.engine.compress_block(input, &mut output[..limit]) {
            Ok(written) if written <= limit => {
                log::trace!("compressed {} bytes into {} (limit {})", input.len(), written, limit);
                written
            }
            Ok(written) => {
                log::trace!("engine claimed {} bytes with a limit of {}", written, limit);
                throw!(Error::BoundExceeded { limit });
            }
            Err(e) => {
                log::trace!("compressing {} bytes within {} failed: {}", input.len(), limit, e);
                throw!(Error::BoundExceeded { limit });
            }
        }
    }

    /// Compresses `input` into a freshly allocated buffer sized with the engine bound.
    #[throws]
    pub fn compress_to_vec(&self, input: &[u8]) -> Vec<u8> {
        let mut output = vec![0u8; self.compress_bound(input.len())];
        let written = self.compress(input, &mut output)?;
        output.truncate(written);
        output
    }
}
