//! # nds_narc - Nintendo DS NARC archives
//!
//! Reading and writing of NARC containers, the chunked archive format that
//! packs many assets into one file of a Nintendo DS cartridge filesystem,
//! and of the file name table (FNT) layout they share with the cartridge.
//!
//! ## Examples
//!
//! ```
//! use nds_narc::{Narc, NarcBuilder};
//!
//! # fn main() -> Result<(), nds_narc::Error> {
//! let data = NarcBuilder::new()
//!     .add_named_entry("a", vec![1, 2])
//!     .add_named_entry("b", Vec::new())
//!     .build()?;
//!
//! let narc = Narc::open(&data)?;
//! assert_eq!(narc.entry_by_name("a")?, &[1, 2]);
//! assert!(narc.entry(1)?.is_empty());
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

pub mod builder;
mod bytes;
pub mod error;
pub mod fnt;
pub mod narc;

pub use builder::{NarcBuilder, build};
pub use error::{Error, Result};
pub use fnt::{DirEntry, Directory, FileNameTable};
pub use narc::{Narc, is_narc, signatures};
