//! # nds_lz - Nintendo DS LZ codec
//!
//! Compression and decompression of the LZ77 block formats found inside
//! Nintendo DS cartridge filesystems and NARC archives.
//!
//! ## Features
//!
//! - LZ10 (tag `0x10`): 2-byte back-references, lengths 3..=18
//! - LZ11 (tag `0x11`): 2, 3 or 4-byte back-references, lengths up to 0x10110
//! - Strict decoding: a block must produce exactly its declared length
//! - Greedy hash-chain encoder with deterministic output
//!
//! ## Examples
//!
//! ```
//! use nds_lz::{compress, decompress};
//!
//! # fn main() -> Result<(), nds_lz::Error> {
//! let data = b"abracadabra abracadabra abracadabra";
//! let block = compress(data)?;
//! assert_eq!(decompress(&block)?, data);
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

mod algorithms;
mod compress;
mod decompress;
pub mod error;
pub mod header;
pub mod methods;

pub use compress::{compress, compress_with};
pub use decompress::{decompress, detect};
pub use error::{Error, Result};
pub use header::BlockHeader;
pub use methods::{CompressionMethod, tags};
