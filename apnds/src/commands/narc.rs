//! NARC archive command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::{Component, Path, PathBuf};

use nds_narc::{Narc, NarcBuilder};

use crate::utils::{Listing, entry_bar, format_bytes, matches_pattern, read_file, write_atomic};

#[derive(Subcommand)]
pub enum NarcCommands {
    /// List the entries of an archive
    List {
        /// Path to the archive
        file: PathBuf,

        /// Show detailed information (size, offset)
        #[arg(short, long)]
        long: bool,

        /// Filter entries by name pattern (supports wildcards)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Extract entries to a directory
    Extract {
        /// Path to the archive
        file: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Filter entries by name pattern (supports wildcards)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Create an archive from files, in the order given
    Create {
        /// Path to write the archive
        output: PathBuf,

        /// Files to add
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Store the file names in a name table
        #[arg(long)]
        named: bool,
    },
}

pub fn execute(command: NarcCommands, quiet: bool) -> Result<()> {
    match command {
        NarcCommands::List { file, long, filter } => list_entries(&file, long, filter),
        NarcCommands::Extract {
            file,
            output,
            filter,
        } => extract_entries(&file, &output, filter, quiet),
        NarcCommands::Create {
            output,
            files,
            named,
        } => create_archive(&output, &files, named, quiet),
    }
}

/// Display name of an entry: its stored name, or its zero-padded index
fn entry_label(narc: &Narc<'_>, index: usize) -> String {
    narc.name(index)
        .map_or_else(|| format!("{index:04}.bin"), str::to_string)
}

fn open<'a>(data: &'a [u8], path: &Path) -> Result<Narc<'a>> {
    Narc::open(data).with_context(|| format!("Failed to open archive: {}", path.display()))
}

fn selected(narc: &Narc<'_>, filter: Option<&str>) -> Vec<usize> {
    (0..narc.len())
        .filter(|&index| {
            filter.is_none_or(|pattern| matches_pattern(&entry_label(narc, index), pattern))
        })
        .collect()
}

fn list_entries(path: &Path, long: bool, filter: Option<String>) -> Result<()> {
    let data = read_file(path)?;
    let narc = open(&data, path)?;
    let indices = selected(&narc, filter.as_deref());

    if indices.is_empty() {
        if let Some(pattern) = filter {
            println!("No entries found matching pattern: {}", pattern);
        } else {
            println!("Archive is empty");
        }
        return Ok(());
    }

    if long {
        let mut listing = Listing::new(&["Index", "Name", "Size", "Offset"]);
        for &index in &indices {
            let range = narc.entry_range(index)?;
            listing.row([
                index.to_string(),
                entry_label(&narc, index),
                format_bytes(range.len() as u64),
                format!("0x{:08X}", range.start),
            ]);
        }
        listing.print(&format!("{} of {} entries", indices.len(), narc.len()));
    } else {
        for index in indices {
            println!("{}", entry_label(&narc, index));
        }
    }
    Ok(())
}

fn extract_entries(
    path: &Path,
    output: &Path,
    filter: Option<String>,
    quiet: bool,
) -> Result<()> {
    let data = read_file(path)?;
    let narc = open(&data, path)?;
    let indices = selected(&narc, filter.as_deref());

    let pb = entry_bar(indices.len() as u64, "Extracting", quiet);
    for &index in &indices {
        let label = entry_label(&narc, index);
        if !Path::new(&label)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("Refusing to extract entry {} to '{}'", index, label);
        }
        let target = output.join(label);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&target, narc.entry(index)?)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    if !quiet {
        println!(
            "✓ Extracted {} entries to {}",
            indices.len(),
            output.display()
        );
    }
    Ok(())
}

fn create_archive(output: &Path, files: &[PathBuf], named: bool, quiet: bool) -> Result<()> {
    let pb = entry_bar(files.len() as u64, "Packing", quiet);
    let mut builder = NarcBuilder::new();
    for file in files {
        let data = read_file(file)?;
        builder = if named {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("{} has no usable file name", file.display()))?;
            builder.add_named_entry(name, data)
        } else {
            builder.add_entry(data)
        };
        pb.inc(1);
    }
    pb.finish_and_clear();

    let archive = builder.build().context("Failed to build archive")?;
    write_atomic(output, &archive)?;
    if !quiet {
        println!(
            "✓ Created {} with {} entries ({})",
            output.display(),
            files.len(),
            format_bytes(archive.len() as u64)
        );
    }
    Ok(())
}
