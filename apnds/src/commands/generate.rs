//! ROM generation pipeline
//!
//! A run selects the patch matching the user's base image, applies it,
//! writes every manifest field and blob into the patched image, and only
//! then writes the output file.

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use nds_patch::{PatchArtifact, PatchSet};
use nds_rom::{FieldWrite, Injector, RomImage};

use crate::utils::{format_bytes, format_digest, read_file, step_spinner};

/// Filler text reserved in the patched code for the per-seed payload
pub const DEFAULT_BLOB_MARKER: &str =
    "AP BIN FILLER AP BIN FILLER AP BIN FILLER AP BIN FILLER AP BIN FILLER ";

#[derive(Args)]
pub struct GenerateArgs {
    /// Path to the unmodified base ROM
    #[arg(long, env = "APNDS_ROM")]
    pub rom: PathBuf,

    /// Patch for one supported base revision (can be repeated)
    #[arg(long = "patch", required = true)]
    pub patches: Vec<PathBuf>,

    /// Field and blob writes to apply after patching (YAML or JSON)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Path to write the generated ROM
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Writes applied to a patched image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationManifest {
    /// Fields to overwrite, in order
    #[serde(default)]
    pub fields: Vec<FieldWrite>,
    /// Files to store over filler markers
    #[serde(default)]
    pub blobs: Vec<BlobWrite>,
}

/// A file stored over a filler marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobWrite {
    /// Marker text starting the filler region
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Payload file, relative to the manifest
    pub file: PathBuf,
}

fn default_marker() -> String {
    DEFAULT_BLOB_MARKER.to_string()
}

impl GenerationManifest {
    /// Parse a manifest, as JSON for `.json` files and YAML otherwise
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut manifest: Self = if is_json {
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON manifest {}", path.display()))?
        } else {
            serde_yaml_ng::from_str(&text)
                .with_context(|| format!("Invalid YAML manifest {}", path.display()))?
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for blob in &mut manifest.blobs {
            if blob.file.is_relative() {
                blob.file = base.join(&blob.file);
            }
        }
        Ok(manifest)
    }
}

pub fn execute(args: GenerateArgs, quiet: bool) -> Result<()> {
    let base = read_file(&args.rom)?;
    log::info!(
        "Base ROM {} ({}), MD5 {}",
        args.rom.display(),
        format_bytes(base.len() as u64),
        format_digest(&nds_patch::md5_digest(&base))
    );

    let patches = args
        .patches
        .iter()
        .map(|path| {
            PatchArtifact::load(path)
                .with_context(|| format!("Failed to load patch: {}", path.display()))
        })
        .collect::<Result<PatchSet>>()?;

    let manifest = match &args.manifest {
        Some(path) => GenerationManifest::load(path)?,
        None => GenerationManifest::default(),
    };
    let blobs = manifest
        .blobs
        .iter()
        .map(|blob| Ok((blob.marker.as_bytes(), read_file(&blob.file)?)))
        .collect::<Result<Vec<_>>>()?;

    let spinner = step_spinner("Patching base ROM", quiet);
    let patched = patches.apply(&base);
    spinner.finish_and_clear();
    let patched = patched.context("Base ROM does not match any supplied patch")?;
    log::info!("Patched image is {} bytes", patched.len());

    let mut rom = RomImage::open(patched).context("Patched image is not a valid ROM")?;
    {
        let mut injector = Injector::new(&mut rom);
        injector
            .apply_all(&manifest.fields)
            .context("Failed to apply manifest fields")?;
        for (marker, payload) in &blobs {
            injector
                .write_at_marker(marker, payload)
                .with_context(|| format!("Failed to store {}-byte payload", payload.len()))?;
        }
    }

    rom.save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if !quiet {
        println!(
            "✓ Generated {} ({}, {} fields, {} blobs, MD5 {})",
            args.output.display(),
            format_bytes(rom.len() as u64),
            manifest.fields.len(),
            blobs.len(),
            rom.md5_hex()
        );
    }
    Ok(())
}
