//! The LZ4 block encoder.
//!
//! Duplicates are found through a small hash table keyed on the next few input bytes. The table
//! has a fixed size and lives on the stack of the call, so compressing a block never allocates
//! and nothing survives from one block to the next.

use std::cmp;
use std::io::{self, ErrorKind, Write};
use std::mem;
use byteorder::{ByteOrder, NativeEndian, WriteBytesExt, LE};
use fehler::{throw, throws};

use crate::block::BlockEngine;

type Error = io::Error;

const HASHLOG: usize = 12;
/// Number of slots in the wide table. The narrow table fits twice as many into the same memory.
const TABLE_SIZE: usize = 1 << HASHLOG;
const MINMATCH: usize = 4;
/// The last five bytes of a block are always encoded as literals.
const LAST_LITERALS: usize = 5;
/// A match may not start within the last twelve bytes of a block.
const MFLIMIT: usize = 12;
/// Every 64 failed probes the search step grows by one.
const SKIP_TRIGGER: usize = 6;

/// Largest input the encoder accepts. Same limit as the reference implementation.
pub const MAX_INPUT_SIZE: usize = 0x7E00_0000;

/// Worst-case size of the compressed block for `input_len` bytes of input.
///
/// An output buffer of this size can never overflow. Returns 0 for inputs larger than
/// [`MAX_INPUT_SIZE`], which the encoder refuses.
pub fn compress_bound(input_len: usize) -> usize {
    if input_len > MAX_INPUT_SIZE {
        0
    } else {
        input_len + input_len / 255 + 16
    }
}

/// Maps positions in the input to earlier positions that start with the same bytes.
trait MatchTable: Default {
    /// Longest input the table can address.
    const INPUT_LIMIT: usize;

    /// Stores `position` in the slot for `input[position..]` and returns what was there before.
    fn swap(&mut self, input: &[u8], position: usize) -> usize;
}

struct WideTable([u32; TABLE_SIZE]);

impl Default for WideTable {
    fn default() -> Self {
        WideTable([0; TABLE_SIZE])
    }
}

impl MatchTable for WideTable {
    const INPUT_LIMIT: usize = MAX_INPUT_SIZE;

    fn swap(&mut self, input: &[u8], position: usize) -> usize {
        let slot = &mut self.0[hash_wide(&input[position..])];
        mem::replace(slot, position as u32) as usize
    }
}

/// Used for blocks shorter than 64 KiB + MFLIMIT - 1. No match may start in the last MFLIMIT
/// bytes, so every position stored for such a block still fits in 16 bits.
struct NarrowTable([u16; TABLE_SIZE * 2]);

impl Default for NarrowTable {
    fn default() -> Self {
        NarrowTable([0; TABLE_SIZE * 2])
    }
}

impl MatchTable for NarrowTable {
    const INPUT_LIMIT: usize = 0x1_0000 + MFLIMIT - 2;

    fn swap(&mut self, input: &[u8], position: usize) -> usize {
        let slot = &mut self.0[hash_narrow(&input[position..])];
        mem::replace(slot, position as u16) as usize
    }
}

fn hash_narrow(input: &[u8]) -> usize {
    let v = NativeEndian::read_u32(input);
    // one bit more than HASHLOG because the narrow table has twice the slots
    (v.wrapping_mul(2654435761) >> (32 - HASHLOG - 1)) as usize
}

cfg_if::cfg_if! {
    if #[cfg(target_pointer_width = "64")] {
        // read 64 bits and hash the first five bytes
        fn hash_wide(input: &[u8]) -> usize {
            // only zero near the very end of the block, where no match may start anyway
            let v = input.get(..8).map(NativeEndian::read_u64).unwrap_or(0);

            #[cfg(target_endian = "little")]
            fn mix(v: u64) -> u64 { (v << 24).wrapping_mul(889523592379) }
            #[cfg(target_endian = "big")]
            fn mix(v: u64) -> u64 { (v >> 24).wrapping_mul(11400714785074694791) }

            (mix(v) >> (64 - HASHLOG)) as usize
        }
    } else {
        fn hash_wide(input: &[u8]) -> usize {
            hash_narrow(input) >> 1
        }
    }
}

/// The LZ4 block engine.
///
/// Produces the plain block format: no header, no checksum, no length prefix. Whoever stores the
/// block has to remember its compressed size and an upper bound for the decompressed size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lz4 {
    acceleration: usize,
}

impl Default for Lz4 {
    fn default() -> Self {
        Lz4 { acceleration: 1 }
    }
}

impl Lz4 {
    /// Larger values make the match search skip ahead faster, trading ratio for speed.
    ///
    /// 1 is the default and produces the same blocks as the reference `LZ4_compress_default`.
    /// 0 is treated as 1.
    pub fn acceleration(&mut self, v: usize) -> &mut Self {
        self.acceleration = cmp::max(v, 1);
        self
    }

    /// Compresses `input` into `output` and returns the number of bytes written.
    ///
    /// Fails with `ErrorKind::WriteZero` if the block does not fit, in which case `output` is
    /// left zeroed up to where the encoder had gotten.
    #[throws]
    pub fn compress_block(&self, input: &[u8], output: &mut [u8]) -> usize {
        if input.len() > MAX_INPUT_SIZE {
            throw!(io::Error::new(ErrorKind::InvalidInput, "input larger than MAX_INPUT_SIZE"));
        }

        let mut sink = BoundedSink::new(output);
        let encoded = if input.len() <= NarrowTable::INPUT_LIMIT {
            encode::<_, NarrowTable>(input, self.acceleration, &mut sink)
        } else {
            encode::<_, WideTable>(input, self.acceleration, &mut sink)
        };

        if let Err(e) = encoded {
            sink.discard();
            throw!(e);
        }
        sink.written()
    }
}

impl BlockEngine for Lz4 {
    fn compress_bound(&self, input_len: usize) -> usize {
        compress_bound(input_len)
    }

    fn compress_block(&self, input: &[u8], output: &mut [u8]) -> io::Result<usize> {
        Lz4::compress_block(self, input, output)
    }
}

#[derive(Copy, Clone, Debug)]
struct Duplicate {
    /// How far back from the cursor the duplicate starts.
    offset: u16,

    /// Match length minus MINMATCH.
    extra_bytes: usize,
}

fn count_matching_bytes(a: &[u8], b: &[u8]) -> usize {
    const REGSIZE: usize = mem::size_of::<usize>();
    fn read_usize(b: &[u8]) -> usize {
        let mut buf = [0u8; REGSIZE];
        buf.copy_from_slice(&b[..REGSIZE]);
        usize::from_le_bytes(buf)
    }

    let mut matching_bytes = 0;
    // compare a register at a time, the first differing bit tells us where the match ends
    for (a, b) in a.chunks_exact(REGSIZE).zip(b.chunks_exact(REGSIZE)) {
        let xor = read_usize(a) ^ read_usize(b);
        if xor != 0 {
            return matching_bytes + (xor.trailing_zeros() / 8) as usize;
        }
        matching_bytes += REGSIZE;
    }

    // up to REGSIZE - 1 bytes left over
    matching_bytes + a.iter().zip(b).skip(matching_bytes).take_while(|&(a, b)| a == b).count()
}

#[throws]
fn encode<W: Write, T: MatchTable>(input: &[u8], acceleration: usize, mut writer: W) {
    debug_assert!(input.len() <= T::INPUT_LIMIT);

    let mut table = T::default();
    let mut cursor = 0;
    loop {
        let literal_start = cursor;

        let mut step_counter = acceleration << SKIP_TRIGGER;
        let mut step = 1;
        let duplicate = loop {
            if input.len().saturating_sub(cursor) < MFLIMIT {
                // the rest of the block goes out as literals. An empty input ends up here
                // right away and encodes as a single zero token.
                write_sequence_head(&mut writer, &input[literal_start..], 0)?;
                return;
            }

            let current_batch = &input[cursor..input.len() - LAST_LITERALS];
            let candidate = table.swap(input, cursor);

            // the first byte has nothing to refer back to
            if cursor != 0 && cursor - candidate <= u16::MAX as usize {
                let matching_bytes = count_matching_bytes(current_batch, &input[candidate..]);

                // fewer than MINMATCH means the hash collided
                if let Some(mut extra_bytes) = matching_bytes.checked_sub(MINMATCH) {
                    let offset = (cursor - candidate) as u16;

                    // extend the match backwards into the pending literals
                    let max_backtrack = cursor - literal_start;
                    let backtrack = input[..cursor].iter().rev()
                        .zip(input[..candidate].iter().rev())
                        .take(max_backtrack)
                        .take_while(|&(a, b)| a == b)
                        .count();
                    extra_bytes += backtrack;
                    cursor += matching_bytes;

                    // past MFLIMIT no further match is searched, so the position would go unused
                    if input.len() - cursor >= MFLIMIT {
                        table.swap(input, cursor - 2);
                    }

                    break Duplicate { offset, extra_bytes };
                }
            }

            cursor += step;
            step = step_counter >> SKIP_TRIGGER;
            // the probe right after a sequence starts does not count towards skipping
            if literal_start + 1 != cursor {
                step_counter += 1;
            }
        };

        // cursor points past the match
        let literal_end = cursor - duplicate.extra_bytes - MINMATCH;
        write_sequence_head(&mut writer, &input[literal_start..literal_end], duplicate.extra_bytes)?;
        writer.write_u16::<LE>(duplicate.offset)?;
        write_length_extension(&mut writer, duplicate.extra_bytes)?;
    }
}

/// Writes the token, the literal length extension and the literals of one sequence.
#[throws]
fn write_sequence_head<W: Write>(writer: &mut W, literal: &[u8], match_extra: usize) {
    let token = (cmp::min(literal.len(), 0xF) << 4) as u8 | cmp::min(match_extra, 0xF) as u8;
    writer.write_u8(token)?;
    write_length_extension(writer, literal.len())?;
    writer.write_all(literal)?;
}

/// Lengths of 15 and up continue past the token nibble in bytes of 255, ended by a smaller byte.
#[throws]
fn write_length_extension<W: Write>(writer: &mut W, value: usize) {
    if value < 0xF {
        return;
    }

    let mut rest = value - 0xF;
    while rest >= 4 * 0xFF {
        writer.write_u32::<NativeEndian>(u32::MAX)?;
        rest -= 4 * 0xFF;
    }
    while rest >= 0xFF {
        writer.write_u8(0xFF)?;
        rest -= 0xFF;
    }
    writer.write_u8(rest as u8)?;
}

/// A `Write` over a fixed slice that refuses a write that would not fit instead of truncating it.
///
/// Refusing outright lets multi-byte writes compile to a single bounds check. Since the encoder
/// gives up on the first refusal, a partial write would be useless anyway.
struct BoundedSink<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> BoundedSink<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        BoundedSink { buf, written: 0 }
    }

    fn written(&self) -> usize {
        self.written
    }

    /// Clears everything written so far.
    fn discard(&mut self) {
        for b in &mut self.buf[..self.written] {
            *b = 0;
        }
        self.written = 0;
    }
}

impl<'a> Write for BoundedSink<'a> {
    #[inline]
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let end = self.written + data.len();
        if end > self.buf.len() {
            return Err(ErrorKind::WriteZero.into());
        }

        self.buf[self.written..end].copy_from_slice(data);
        self.written = end;
        Ok(data.len())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
