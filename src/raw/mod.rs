//! The raw LZ4 block format.
//!
//! A block is a run of sequences, each made of literal bytes followed by a back-reference into
//! the data decoded so far. There is no framing around it: no magic, no checksum, no size fields.
//! That keeps a block as small as LZ4 can make it, but the caller has to carry the compressed size
//! and a bound on the decompressed size alongside.

mod compress;
mod decompress;

pub use compress::{compress_bound, Lz4, MAX_INPUT_SIZE};
pub use decompress::*;
