#![no_main]
use libfuzzer_sys::fuzz_target;
use lz_block::{compress_bound, decompress_into, BlockCompressor};

fuzz_target!(|data: &[u8]| {
    let compressor: BlockCompressor = BlockCompressor::default();
    let mut compressed = vec![0u8; compress_bound(data.len())];
    let written = compressor
        .compress(data, &mut compressed)
        .expect("a buffer of compress_bound bytes must always fit");

    let mut roundtripped = vec![0u8; data.len()];
    let restored = decompress_into(&compressed[..written], &mut roundtripped)
        .expect("Could not decompress our own block");
    assert_eq!(restored, data.len());
    assert!(roundtripped == data);

    // one byte less than needed must fail cleanly
    if let Some(limit) = written.checked_sub(1) {
        let mut short = vec![0u8; compressed.len()];
        assert!(compressor.compress_limited(data, &mut short, limit).is_err());
        assert!(short.iter().all(|&b| b == 0));
    }
});
