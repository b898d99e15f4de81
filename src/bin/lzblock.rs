//! Command line tool that compresses a file into a single raw LZ4 block, or decompresses one.

use clap::{value_parser, Arg, ArgAction, Command};
use fehler::throws;
use lz_block::{decompress_into, BlockCompressor, Lz4};
use std::fs;
use std::io;
use std::time::Instant;

const FILE_EXTENSION: &str = ".lz4";

/// A raw block does not record its decompressed size, so decompression gets this many times
/// the compressed size unless told otherwise.
const DEFAULT_EXPANSION: usize = 3;

#[throws(io::Error)]
fn main() {
    let matches = Command::new("lzblock")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compress or decompress a file as a single raw LZ4 block")
        .arg(
            Arg::new("decompress")
                .short('d')
                .long("decompress")
                .help("Decompress the input")
                .action(ArgAction::SetTrue)
                .conflicts_with("compress"),
        )
        .arg(
            Arg::new("compress")
                .short('c')
                .long("compress")
                .help("Compress the input")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path of the output file")
                .num_args(1),
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .value_name("BYTES")
                .help("Largest decompressed size to accept")
                .value_parser(value_parser!(usize))
                .num_args(1),
        )
        .arg(
            Arg::new("acceleration")
                .short('a')
                .long("acceleration")
                .value_name("N")
                .help("Trade compression ratio for speed")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
        .get_matches();

    env_logger::builder().format_timestamp(None).init();

    let input_path = matches
        .get_one::<String>("INPUT")
        .cloned()
        .unwrap_or_default();
    let input = fs::read(&input_path)?;

    // without an explicit mode, the file name decides
    let decompress = matches.get_flag("decompress")
        || (!matches.get_flag("compress") && input_path.ends_with(FILE_EXTENSION));

    let start = Instant::now();
    let (output, output_path) = if decompress {
        let capacity = matches
            .get_one::<usize>("capacity")
            .copied()
            .unwrap_or_else(|| input.len().saturating_mul(DEFAULT_EXPANSION));
        log::info!("Decompressing {} bytes, allowing up to {}", input.len(), capacity);

        let mut output = vec![0u8; capacity];
        let written = decompress_into(&input, &mut output)?;
        output.truncate(written);

        let default_path = match input_path.strip_suffix(FILE_EXTENSION) {
            Some(stem) => stem.to_string(),
            None => format!("{}.out", input_path),
        };
        (output, default_path)
    } else {
        let mut engine = Lz4::default();
        engine.acceleration(matches.get_one::<usize>("acceleration").copied().unwrap_or(1));
        log::info!("Compressing {} bytes with {:?}", input.len(), engine);

        let output = BlockCompressor::new(engine).compress_to_vec(&input)?;
        (output, format!("{}{}", input_path, FILE_EXTENSION))
    };

    let output_path = matches.get_one::<String>("output").cloned().unwrap_or(output_path);
    fs::write(&output_path, &output)?;

    log::info!(
        "Action: {}, Data Size: {}, Result Size: {}",
        if decompress { "DECOMPRESS" } else { "COMPRESS" },
        input.len(),
        output.len()
    );
    log::info!("Wrote {} in {:.3} seconds.", output_path, start.elapsed().as_secs_f32());
}
