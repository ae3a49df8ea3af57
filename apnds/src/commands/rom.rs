//! Cartridge image command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use nds_rom::{AssetPath, RomImage};

use crate::utils::{Listing, format_bytes, format_offset, matches_pattern, write_atomic};

#[derive(Subcommand)]
pub enum RomCommands {
    /// Display header information of a cartridge image
    Info {
        /// Path to the ROM
        file: PathBuf,
    },

    /// List the files of the cartridge filesystem
    List {
        /// Path to the ROM
        file: PathBuf,

        /// Show detailed information (id, size, offset)
        #[arg(short, long)]
        long: bool,

        /// Filter files by pattern (supports wildcards)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Extract a file or nested archive entry
    Extract {
        /// Path to the ROM
        file: PathBuf,

        /// Asset path, e.g. poketool/personal/pl_personal.narc/25
        path: String,

        /// Path to write the extracted bytes
        output: PathBuf,
    },
}

pub fn execute(command: RomCommands, quiet: bool) -> Result<()> {
    match command {
        RomCommands::Info { file } => show_info(&file),
        RomCommands::List { file, long, filter } => list_files(&file, long, filter),
        RomCommands::Extract { file, path, output } => extract_asset(&file, &path, &output, quiet),
    }
}

fn load(path: &Path) -> Result<RomImage> {
    RomImage::load(path).with_context(|| format!("Failed to open ROM: {}", path.display()))
}

fn show_info(path: &Path) -> Result<()> {
    use console::style;

    let rom = load(path)?;
    let header = rom.header();
    let fs = rom.filesystem()?;

    println!("{}", style("ROM Information").bold().cyan());
    println!("{}", style("===============").cyan());
    println!("{}: {}", style("Path").bold(), path.display());
    println!("{}: {}", style("Title").bold(), header.title);
    println!("{}: {}", style("Game code").bold(), header.game_code);
    println!("Maker code: {}", header.maker_code);
    println!("Revision: {}", header.rom_version);
    println!("Size: {}", format_bytes(rom.len() as u64));
    if let Some(capacity) = header.capacity() {
        println!("Cartridge capacity: {}", format_bytes(capacity));
    }
    println!("Header CRC: 0x{:04X}", header.header_crc);
    println!("MD5: {}", rom.md5_hex());
    println!("Files: {} ({} named)", fs.len(), fs.paths().len());
    Ok(())
}

fn list_files(path: &Path, long: bool, filter: Option<String>) -> Result<()> {
    let rom = load(path)?;
    let fs = rom.filesystem()?;
    let files: Vec<(u16, String)> = fs
        .paths()
        .into_iter()
        .filter(|(_, name)| {
            filter
                .as_deref()
                .is_none_or(|pattern| matches_pattern(name, pattern))
        })
        .collect();

    if files.is_empty() {
        if let Some(pattern) = filter {
            println!("No files found matching pattern: {}", pattern);
        }
        return Ok(());
    }

    if long {
        let mut listing = Listing::new(&["Id", "Path", "Size", "Offset"]);
        for (id, name) in &files {
            let range = fs.file_range(*id)?;
            listing.row([
                id.to_string(),
                name.clone(),
                format_bytes(range.len() as u64),
                format_offset(Some(range.start)),
            ]);
        }
        listing.print(&format!("{} files", files.len()));
    } else {
        for (_, name) in files {
            println!("{}", name);
        }
    }
    Ok(())
}

fn extract_asset(path: &Path, asset: &str, output: &Path, quiet: bool) -> Result<()> {
    let rom = load(path)?;
    let asset_path = AssetPath::parse(asset)?;
    let entry = rom
        .resolve(&asset_path)
        .with_context(|| format!("Failed to resolve {}", asset))?;
    write_atomic(output, entry.bytes())?;

    if !quiet {
        println!(
            "✓ Extracted {} ({}, image offset {})",
            asset_path,
            format_bytes(entry.len() as u64),
            format_offset(entry.span().map(|span| span.start))
        );
    }
    Ok(())
}
