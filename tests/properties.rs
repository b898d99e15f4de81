use lz_block::{compress_bound, decompress, decompress_into, BlockCompressor, CompressionError, Lz4};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::thread;

fn compressor() -> BlockCompressor {
    BlockCompressor::default()
}

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill(&mut data[..]);
    data
}

/// Random text over a small alphabet: compressible, but not trivially.
fn random_text(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| b"abcdefgh  \n"[rng.gen_range(0, 11)]).collect()
}

fn patterns(len: usize) -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("zeros", vec![0u8; len]),
        ("distinct", (0..len).map(|i| i as u8).collect()),
        ("repetitive", b"lz4 block ".iter().copied().cycle().take(len).collect()),
        ("random", random_bytes(len, len as u64)),
        ("text", random_text(len, len as u64)),
    ]
}

#[track_caller]
fn check_round_trip(name: &str, input: &[u8]) {
    let mut output = vec![0u8; compress_bound(input.len())];
    let written = compressor()
        .compress(input, &mut output)
        .unwrap_or_else(|e| panic!("{} of {} bytes: {}", name, input.len(), e));
    assert!(written > 0 && written <= output.len(), "{}: wrote {}", name, written);

    let mut restored = vec![0u8; input.len()];
    assert_eq!(decompress_into(&output[..written], &mut restored), Ok(input.len()), "{}", name);
    assert!(restored == input, "{} of {} bytes did not round-trip", name, input.len());
}

#[test]
fn fits_within_the_bound_and_round_trips() {
    for len in (0..300).chain([1 << 10, 4321, 65535, 65536, 65547, 100_000].iter().copied()) {
        for (name, input) in patterns(len) {
            check_round_trip(name, &input);
        }
    }
}

#[test]
fn large_blocks() {
    let mut data = vec![0u8; 3_000_000];
    StdRng::seed_from_u64(7).fill(&mut data[1_000_000..2_000_000]);
    check_round_trip("mixed", &data);
}

#[test]
fn empty_input_compresses_to_one_byte() {
    let mut output = [0xAAu8; 16];
    assert_eq!(compressor().compress(&[], &mut output), Ok(1));
    assert_eq!(output[0], 0);
    assert!(decompress(&output[..1]).unwrap().is_empty());
}

#[test]
fn deterministic() {
    for (name, input) in patterns(10_000) {
        let mut a = vec![0u8; compress_bound(input.len())];
        let mut b = vec![0xFFu8; compress_bound(input.len())];
        let n = compressor().compress(&input, &mut a).unwrap();
        let m = compressor().compress(&input, &mut b).unwrap();
        assert_eq!(n, m, "{}", name);
        assert!(a[..n] == b[..m], "{}", name);
    }
}

#[test]
fn thousand_as() {
    let input = [0x41u8; 1000];
    let mut output = vec![0u8; compress_bound(1000)];
    let written = compressor().compress(&input, &mut output).unwrap();
    assert!(written < 1000);

    let mut restored = [0u8; 1000];
    assert_eq!(decompress_into(&output[..written], &mut restored), Ok(1000));
    assert!(restored.iter().all(|&b| b == 0x41));
}

#[test]
fn too_small_fails_and_leaves_nothing_behind() {
    for (name, input) in patterns(5000) {
        let mut output = vec![0u8; compress_bound(input.len())];
        let needed = compressor().compress(&input, &mut output).unwrap();

        let mut output = vec![0u8; compress_bound(input.len())];
        let limit = needed - 1;
        assert_eq!(
            compressor().compress_limited(&input, &mut output, limit),
            Err(CompressionError::BoundExceeded { limit }),
            "{}",
            name
        );
        assert!(output.iter().all(|&b| b == 0), "{}: partial block left in output", name);

        // exactly enough is enough
        assert_eq!(compressor().compress_limited(&input, &mut output, needed), Ok(needed), "{}", name);
    }
}

#[test]
fn incompressible_data_does_not_fit_in_its_own_size() {
    let input = random_bytes(10_000, 1);
    let mut output = vec![0u8; input.len()];
    assert_eq!(
        compressor().compress(&input, &mut output),
        Err(CompressionError::BoundExceeded { limit: 10_000 })
    );
}

#[test]
fn input_is_untouched() {
    let input = random_text(20_000, 3);
    let copy = input.clone();
    let mut output = vec![0u8; compress_bound(input.len())];
    compressor().compress(&input, &mut output).unwrap();
    assert_eq!(input, copy);
}

#[test]
fn acceleration_trades_ratio() {
    let input = random_text(200_000, 11);
    let default = compressor().compress_to_vec(&input).unwrap();

    let mut engine = Lz4::default();
    engine.acceleration(32);
    let fast = BlockCompressor::new(engine).compress_to_vec(&input).unwrap();

    assert!(fast.len() >= default.len());
    assert_eq!(decompress(&fast).unwrap(), input);
}

#[test]
fn concurrent_calls_on_separate_buffers() {
    let compressor = Arc::new(compressor());
    let handles: Vec<_> = (0..8u64)
        .map(|seed| {
            let compressor = Arc::clone(&compressor);
            thread::spawn(move || {
                let input = random_text(50_000, seed);
                let mut output = vec![0u8; compress_bound(input.len())];
                let written = compressor.compress(&input, &mut output).unwrap();
                assert_eq!(decompress(&output[..written]).unwrap(), input);
                output.truncate(written);
                (input, output)
            })
        })
        .collect();

    for handle in handles {
        let (input, output) = handle.join().unwrap();
        // same result as on the main thread
        assert_eq!(BlockCompressor::<Lz4>::default().compress_to_vec(&input).unwrap(), output);
    }
}
