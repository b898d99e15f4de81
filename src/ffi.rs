//! C ABI.
//!
//! Flat pointer/length entry points for callers outside Rust, e.g. a WebAssembly host that
//! allocates both buffers and reads the result back. Every function returns a byte count, with
//! [`FAILURE`] (0) meaning nothing usable was written. No allocation, no panic and no Rust type
//! crosses the boundary.
//!
//! # Safety
//! Callers must pass pointers that are valid for the lengths they declare for the whole call.
//! Input and output must not overlap, and no other thread may touch either while the call runs.
#![allow(unsafe_code)]

use std::convert::TryFrom;
use std::slice;

use crate::block::BlockCompressor;
use crate::raw;

/// Returned by every entry point when the operation did not complete.
pub const FAILURE: u32 = 0;

unsafe fn input_slice<'a>(data: *const u8, len: u32) -> Option<&'a [u8]> {
    if len == 0 {
        // an empty input is never read, so any pointer will do
        Some(&[])
    } else if data.is_null() {
        None
    } else {
        Some(slice::from_raw_parts(data, len as usize))
    }
}

unsafe fn output_slice<'a>(result: *mut u8, len: u32) -> Option<&'a mut [u8]> {
    if result.is_null() {
        None
    } else if len == 0 {
        Some(&mut [])
    } else {
        Some(slice::from_raw_parts_mut(result, len as usize))
    }
}

fn byte_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(FAILURE)
}

/// Compresses `data_size` bytes at `data` into `result`, returning the compressed size or 0.
///
/// `data_size` doubles as the maximum output size: `result` must be valid for `data_size` bytes,
/// and data that does not shrink fails. Use [`compress_data_bounded`] to pass the capacity of
/// `result` explicitly.
///
/// # Safety
/// `data` must be valid for reads of `data_size` bytes (it may be null if `data_size` is 0) and
/// `result` must be valid for writes of `data_size` bytes.
#[no_mangle]
pub unsafe extern "C" fn compress_data(data: *const u8, data_size: u32, result: *mut u8) -> u32 {
    compress_data_bounded(data, data_size, result, data_size)
}

/// Compresses `data_size` bytes at `data` into the `result_capacity` bytes at `result`.
///
/// Returns the compressed size, or 0 if the block did not fit. A capacity of at least
/// [`compress_bound`]`(data_size)` always suffices.
///
/// # Safety
/// `data` must be valid for reads of `data_size` bytes (it may be null if `data_size` is 0) and
/// `result` must be valid for writes of `result_capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn compress_data_bounded(
    data: *const u8,
    data_size: u32,
    result: *mut u8,
    result_capacity: u32,
) -> u32 {
    let (input, output) = match (input_slice(data, data_size), output_slice(result, result_capacity)) {
        (Some(input), Some(output)) => (input, output),
        _ => return FAILURE,
    };

    let compressor: BlockCompressor = BlockCompressor::default();
    match compressor.compress(input, output) {
        Ok(written) => byte_count(written),
        Err(_) => FAILURE,
    }
}

/// Worst-case compressed size for `data_size` input bytes, or 0 if the input is too large to
/// compress at all.
#[no_mangle]
pub extern "C" fn compress_bound(data_size: u32) -> u32 {
    byte_count(raw::compress_bound(data_size as usize))
}

/// Decompresses the block of `data_size` bytes at `data` into the `result_capacity` bytes at
/// `result`.
///
/// Returns the decompressed size, or 0 if the block is corrupt or does not fit. An empty block
/// also decompresses to 0 bytes.
///
/// # Safety
/// `data` must be valid for reads of `data_size` bytes and `result` must be valid for writes of
/// `result_capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn decompress_data(
    data: *const u8,
    data_size: u32,
    result: *mut u8,
    result_capacity: u32,
) -> u32 {
    let (input, output) = match (input_slice(data, data_size), output_slice(result, result_capacity)) {
        (Some(input), Some(output)) => (input, output),
        _ => return FAILURE,
    };

    match raw::decompress_into(input, output) {
        Ok(written) => byte_count(written),
        Err(_) => FAILURE,
    }
}
