#![no_main]
use libfuzzer_sys::fuzz_target;
use lz_block::decompress_into;

fuzz_target!(|data: &[u8]| {
    let mut output = vec![0u8; data.len() * 3];
    // random bytes are mostly not valid LZ4, errors are expected but panics are not
    let _ = decompress_into(data, &mut output);
});
