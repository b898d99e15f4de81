use byteorder::{ReadBytesExt, LE};
use fehler::{throw, throws};
use std::io::{self, Cursor, ErrorKind, Read};
use thiserror::Error;

use super::compress::MAX_INPUT_SIZE;

const MINMATCH: usize = 4;

/// Errors when decompressing an LZ4 block.
#[derive(Error, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DecompressionError {
    /// Either the block was truncated or this is not LZ4 data.
    #[error("expected more bytes, the block is truncated or corrupt")]
    UnexpectedEnd,
    /// A match refers to bytes before the start of the block.
    #[error("a match refers to data before the start of the block")]
    InvalidDeduplicationOffset,
    /// The decompressed data would exceed the given output capacity.
    #[error("the decompressed data does not fit into {0} bytes")]
    OutputTooSmall(usize),
}
type Error = DecompressionError;

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        io::Error::new(ErrorKind::Other, e)
    }
}

/// Reads a length that continues past its token nibble while the bytes are all 0xFF.
#[throws]
fn read_length(initial: u8, cursor: &mut Cursor<&[u8]>) -> usize {
    let mut value = initial as usize;
    if value == 0xF {
        loop {
            let more = cursor.read_u8().map_err(|_| Error::UnexpectedEnd)?;
            value = value.saturating_add(more as usize);
            if more != 0xFF {
                break;
            }
        }
    }
    value
}

#[throws]
fn ensure_room(produced: usize, additional: usize, limit: usize) {
    match produced.checked_add(additional) {
        Some(total) if total <= limit => {}
        _ => throw!(Error::OutputTooSmall(limit)),
    }
}

#[throws]
fn decode(input: &[u8], output: &mut Vec<u8>, limit: usize) {
    let base = output.len();
    let mut reader = Cursor::new(input);
    loop {
        let token = match reader.read_u8() {
            Ok(x) => x,
            Err(_) => break,
        };

        let literal_length = read_length(token >> 4, &mut reader)?;
        let remaining = input.len() - reader.position() as usize;
        if literal_length > remaining {
            throw!(Error::UnexpectedEnd);
        }
        ensure_room(output.len() - base, literal_length, limit)?;

        let literal_start = output.len();
        output.resize(literal_start + literal_length, 0);
        reader.read_exact(&mut output[literal_start..]).map_err(|_| Error::UnexpectedEnd)?;

        // a block ends after the literals of its last sequence
        if reader.position() as usize == input.len() {
            break;
        }

        let offset = reader.read_u16::<LE>().map_err(|_| Error::UnexpectedEnd)? as usize;
        let match_length = MINMATCH + read_length(token & 0xF, &mut reader)?;
        ensure_room(output.len() - base, match_length, limit)?;
        copy_overlapping(offset, match_length, base, output)?;
    }
}

/// Appends `match_length` bytes starting `offset` bytes back from the end of `output`.
/// Bytes before `base` belong to the caller and may not be referenced.
#[throws]
fn copy_overlapping(offset: usize, match_length: usize, base: usize, output: &mut Vec<u8>) {
    let old_len = output.len();
    if offset == 0 || offset > old_len - base {
        throw!(Error::InvalidDeduplicationOffset);
    }

    match offset {
        // the same byte over and over
        1 => output.resize(old_len + match_length, output[old_len - 1]),

        o if match_length <= o => {
            // no overlap, a single memcpy
            output.resize(old_len + match_length, 0);
            let (head, tail) = output.split_at_mut(old_len);
            tail.copy_from_slice(&head[old_len - offset..][..match_length]);
        }

        2 | 4 | 8 => {
            // short period that divides 16: repeat a 16 byte pattern
            let mut pattern = [0u8; 16];
            for chunk in pattern.chunks_mut(offset) {
                chunk.copy_from_slice(&output[old_len - offset..][..offset]);
            }
            output.resize(old_len + match_length, 0);
            for target in output[old_len..].chunks_mut(pattern.len()) {
                target.copy_from_slice(&pattern[..target.len()]);
            }
        }

        _ => {
            output.reserve(match_length);
            for i in 0..match_length {
                let b = output[old_len - offset + i];
                output.push(b);
            }
        }
    }
}

/// Decompresses an LZ4 block, appending the result to `output`.
///
/// Matches may only refer to data produced by this block, never to what `output` held before.
/// The decompressed size is capped at [`MAX_INPUT_SIZE`], the largest block the encoder makes.
pub fn decompress_block(input: &[u8], output: &mut Vec<u8>) -> Result<(), Error> {
    decode(input, output, MAX_INPUT_SIZE)
}

/// Decompresses all bytes of `input`.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, Error> {
    let mut vec = Vec::new();
    decompress_block(input, &mut vec)?;
    Ok(vec)
}

/// Decompresses `input` into `output` and returns the number of bytes written.
///
/// Fails with [`DecompressionError::OutputTooSmall`] rather than writing past the end of
/// `output`. Nothing is written to `output` unless decompression succeeds.
#[throws]
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> usize {
    let mut vec = Vec::new();
    decode(input, &mut vec, output.len())?;
    output[..vec.len()].copy_from_slice(&vec);
    vec.len()
}
