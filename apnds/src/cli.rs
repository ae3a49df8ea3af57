//! Root CLI structure for apnds

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "apnds")]
#[command(about = "Command-line tools for Nintendo DS ROM patching and asset injection", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Hide progress indicators and status lines; listings and reports still print
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// LZ10/LZ11 compression operations
    Lz {
        #[command(subcommand)]
        command: crate::commands::lz::LzCommands,
    },

    /// NARC archive operations
    Narc {
        #[command(subcommand)]
        command: crate::commands::narc::NarcCommands,
    },

    /// Cartridge image operations
    Rom {
        #[command(subcommand)]
        command: crate::commands::rom::RomCommands,
    },

    /// Binary patch operations
    Patch {
        #[command(subcommand)]
        command: crate::commands::patch::PatchCommands,
    },

    /// Patch a base ROM and apply a generation manifest
    Generate(crate::commands::generate::GenerateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
