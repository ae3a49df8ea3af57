//! Binary patch command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use nds_patch::PatchArtifact;

use crate::utils::{format_bytes, format_digest, read_file, step_spinner, write_atomic};

#[derive(Subcommand)]
pub enum PatchCommands {
    /// Build a patch turning one image into another
    Create {
        /// Path to the original image
        source: PathBuf,

        /// Path to the modified image
        target: PathBuf,

        /// Path to write the patch
        output: PathBuf,
    },

    /// Apply a patch to an image
    Apply {
        /// Path to the patch
        patch: PathBuf,

        /// Path to the original image
        source: PathBuf,

        /// Path to write the patched image
        output: PathBuf,
    },

    /// Display information about a patch
    Info {
        /// Path to the patch
        patch: PathBuf,
    },
}

pub fn execute(command: PatchCommands, quiet: bool) -> Result<()> {
    match command {
        PatchCommands::Create {
            source,
            target,
            output,
        } => create_patch(&source, &target, &output, quiet),
        PatchCommands::Apply {
            patch,
            source,
            output,
        } => apply_patch(&patch, &source, &output, quiet),
        PatchCommands::Info { patch } => show_info(&patch),
    }
}

fn load(path: &Path) -> Result<PatchArtifact> {
    PatchArtifact::load(path).with_context(|| format!("Failed to load patch: {}", path.display()))
}

fn create_patch(source: &Path, target: &Path, output: &Path, quiet: bool) -> Result<()> {
    let source_data = read_file(source)?;
    let target_data = read_file(target)?;

    let spinner = step_spinner("Computing patch", quiet);
    let artifact = nds_patch::diff(&source_data, &target_data);
    spinner.finish_and_clear();
    let artifact = artifact.context("Failed to compute patch")?;

    let bytes = artifact.to_bytes();
    write_atomic(output, &bytes)?;
    if !quiet {
        println!(
            "✓ Created {} ({}, {} control triples)",
            output.display(),
            format_bytes(bytes.len() as u64),
            artifact.control_len()
        );
    }
    Ok(())
}

fn apply_patch(patch: &Path, source: &Path, output: &Path, quiet: bool) -> Result<()> {
    let artifact = load(patch)?;
    let source_data = read_file(source)?;

    let spinner = step_spinner("Applying patch", quiet);
    let patched = nds_patch::apply(&artifact, &source_data);
    spinner.finish_and_clear();
    let patched =
        patched.with_context(|| format!("Failed to apply patch to {}", source.display()))?;

    write_atomic(output, &patched)?;
    if !quiet {
        println!(
            "✓ Wrote {} ({})",
            output.display(),
            format_bytes(patched.len() as u64)
        );
    }
    Ok(())
}

fn show_info(path: &Path) -> Result<()> {
    use console::style;

    let artifact = load(path)?;
    let header = artifact.header();

    println!("{}", style("Patch Information").bold().cyan());
    println!("{}", style("=================").cyan());
    println!("{}: {}", style("Path").bold(), path.display());
    println!("Format version: {}", header.version);
    println!("Block codec: {}", header.codec);
    println!(
        "Source: {} ({})",
        format_digest(&artifact.source_md5()),
        format_bytes(artifact.source_len() as u64)
    );
    println!(
        "Target: {} ({})",
        format_digest(&artifact.target_md5()),
        format_bytes(artifact.target_len() as u64)
    );
    println!("Control triples: {}", artifact.control_len());
    println!("Encoded size: {}", format_bytes(artifact.encoded_len() as u64));
    Ok(())
}
