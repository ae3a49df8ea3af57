//! LZ10/LZ11 compression command implementations

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use nds_lz::{BlockHeader, CompressionMethod};

use crate::utils::{format_bytes, format_compression_ratio, read_file, write_atomic};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum MethodArg {
    Lz10,
    Lz11,
}

impl From<MethodArg> for CompressionMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Lz10 => CompressionMethod::Lz10,
            MethodArg::Lz11 => CompressionMethod::Lz11,
        }
    }
}

#[derive(Subcommand)]
pub enum LzCommands {
    /// Show the block header of a compressed file
    Info {
        /// Path to the compressed file
        file: PathBuf,
    },

    /// Compress a file
    Compress {
        /// Path to the input file
        input: PathBuf,

        /// Path to write the compressed block
        output: PathBuf,

        /// Compression method
        #[arg(short, long, value_enum, default_value = "lz10")]
        method: MethodArg,
    },

    /// Decompress a file
    Decompress {
        /// Path to the compressed file
        input: PathBuf,

        /// Path to write the decompressed data
        output: PathBuf,
    },
}

pub fn execute(command: LzCommands, quiet: bool) -> Result<()> {
    match command {
        LzCommands::Info { file } => show_info(file),
        LzCommands::Compress {
            input,
            output,
            method,
        } => compress_file(input, output, method.into(), quiet),
        LzCommands::Decompress { input, output } => decompress_file(input, output, quiet),
    }
}

fn show_info(path: PathBuf) -> Result<()> {
    let data = read_file(&path)?;
    let header = BlockHeader::parse(&data)
        .with_context(|| format!("{} is not an LZ block", path.display()))?;

    println!("LZ Block Information");
    println!("====================");
    println!("Path: {}", path.display());
    println!("Method: {}", header.method);
    println!("Header size: {} bytes", header.header_len);
    println!("Compressed size: {}", format_bytes(data.len() as u64));
    println!(
        "Decompressed size: {}",
        format_bytes(header.decompressed_len as u64)
    );
    println!(
        "Space saved: {}",
        format_compression_ratio(header.decompressed_len as u64, data.len() as u64)
    );
    Ok(())
}

fn compress_file(
    input: PathBuf,
    output: PathBuf,
    method: CompressionMethod,
    quiet: bool,
) -> Result<()> {
    let data = read_file(&input)?;
    let compressed = nds_lz::compress_with(&data, method)
        .with_context(|| format!("Failed to compress {}", input.display()))?;
    write_atomic(&output, &compressed)?;

    if !quiet {
        println!(
            "✓ Compressed {} -> {} ({}, {} saved)",
            format_bytes(data.len() as u64),
            format_bytes(compressed.len() as u64),
            method,
            format_compression_ratio(data.len() as u64, compressed.len() as u64)
        );
    }
    Ok(())
}

fn decompress_file(input: PathBuf, output: PathBuf, quiet: bool) -> Result<()> {
    let data = read_file(&input)?;
    let decompressed = nds_lz::decompress(&data)
        .with_context(|| format!("Failed to decompress {}", input.display()))?;
    write_atomic(&output, &decompressed)?;

    if !quiet {
        println!(
            "✓ Decompressed {} -> {}",
            format_bytes(data.len() as u64),
            format_bytes(decompressed.len() as u64)
        );
    }
    Ok(())
}
