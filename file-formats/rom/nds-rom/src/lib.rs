//! # nds_rom - Nintendo DS cartridge images
//!
//! A validated in-memory view of a cartridge image: its header, its
//! filesystem, and the NARC archives nested inside it. Assets are addressed
//! by `/`-separated paths that continue through archive entries, and the
//! [`Injector`] overwrites fields of those entries in place.
//!
//! ## Features
//!
//! - Header parsing and CRC-16 validation
//! - File name and allocation table lookups
//! - Nested archive resolution, including read-only descent into LZ-compressed archives
//! - Bounds-checked field writes, batched so a failing batch changes nothing
//! - Filler-marker payload injection
//!
//! ## Examples
//!
//! ```no_run
//! use nds_rom::{AssetPath, FieldDescriptor, FieldEncoding, FieldValue, Injector, RomImage};
//!
//! # fn main() -> Result<(), nds_rom::Error> {
//! let mut rom = RomImage::load("platinum.nds")?;
//! let path = AssetPath::parse("poketool/personal/pl_personal.narc/25")?;
//!
//! let mut injector = Injector::new(&mut rom);
//! let field = FieldDescriptor::new(path, 0, FieldEncoding::U8);
//! injector.write(&field, &FieldValue::Int(90))?;
//!
//! rom.save("out.nds")?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod fs;
pub mod header;
pub mod inject;
pub mod path;
pub mod rom;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{Error, Result};
pub use fs::RomFs;
pub use header::{RomHeader, crc16};
pub use inject::{FieldDescriptor, FieldEncoding, FieldValue, FieldWrite, Injector};
pub use path::{AssetPath, LocatedContainer, ResolvedEntry};
pub use rom::RomImage;
