//! Compression of the control, diff and extra blocks
//!
//! The diff block is mostly zeros for similar images and the control block
//! repeats small integers, so both shrink to a few hundred bytes under
//! bzip2 even for a full cartridge.

use crate::{Error, Result};
use bzip2::Compression;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use std::fmt;
use std::io::{Read, Write};

/// Codec applied to every block of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockCodec {
    /// Blocks stored as is
    Stored,
    /// Blocks compressed with bzip2
    #[default]
    Bzip2,
}

impl BlockCodec {
    /// Identifier stored in the artifact header
    pub fn id(self) -> u16 {
        match self {
            BlockCodec::Stored => 0,
            BlockCodec::Bzip2 => 1,
        }
    }

    /// Look up a codec by its header identifier
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0 => Some(BlockCodec::Stored),
            1 => Some(BlockCodec::Bzip2),
            _ => None,
        }
    }

    /// Encode one block
    pub(crate) fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            BlockCodec::Stored => Ok(data.to_vec()),
            BlockCodec::Bzip2 => {
                let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
        }
    }

    /// Decode one block, which must hold exactly `expected` bytes
    ///
    /// Decoding stops one byte past `expected`, so a damaged block cannot
    /// inflate without bound.
    pub(crate) fn decompress(self, block: &[u8], expected: usize, name: &str) -> Result<Vec<u8>> {
        let data = match self {
            BlockCodec::Stored => block.to_vec(),
            BlockCodec::Bzip2 => {
                let mut out = Vec::with_capacity(expected.min(64 * 1024 * 1024));
                BzDecoder::new(block)
                    .take(expected as u64 + 1)
                    .read_to_end(&mut out)
                    .map_err(|e| Error::malformed(format!("{} block: {}", name, e)))?;
                out
            }
        };

        if data.len() != expected {
            return Err(Error::malformed(format!(
                "{} block does not decode to the expected {} bytes",
                name, expected
            )));
        }
        Ok(data)
    }
}

impl fmt::Display for BlockCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockCodec::Stored => write!(f, "stored"),
            BlockCodec::Bzip2 => write!(f, "bzip2"),
        }
    }
}
