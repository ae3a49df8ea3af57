//! Compressed block header parsing

use crate::methods::CompressionMethod;
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Header preceding every compressed token stream
///
/// The inline form packs the decompressed length into 24 bits after the tag.
/// When those bits are zero, a full 32-bit length follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Token stream format
    pub method: CompressionMethod,
    /// Length of the payload once decoded
    pub decompressed_len: usize,
    /// Bytes occupied by the header itself (4 or 8)
    pub header_len: usize,
}

impl BlockHeader {
    /// Size of the inline header form
    pub const INLINE_SIZE: usize = 4;

    /// Size of the extended header form
    pub const EXTENDED_SIZE: usize = 8;

    /// Largest length that fits the inline form
    pub const MAX_INLINE_LEN: usize = 0x00FF_FFFF;

    /// Create a header for a payload of `decompressed_len` bytes
    ///
    /// Empty payloads use the extended form, since an inline zero is the
    /// extended-form marker.
    pub fn new(method: CompressionMethod, decompressed_len: usize) -> Self {
        let header_len = if decompressed_len == 0 || decompressed_len > Self::MAX_INLINE_LEN {
            Self::EXTENDED_SIZE
        } else {
            Self::INLINE_SIZE
        };
        Self {
            method,
            decompressed_len,
            header_len,
        }
    }

    /// Parse the header at the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::INLINE_SIZE {
            return Err(Error::corrupt(format!(
                "block header truncated: {} bytes, need {}",
                data.len(),
                Self::INLINE_SIZE
            )));
        }

        let mut reader = Cursor::new(data);
        let tag = reader.read_u8().map_err(|_| Error::corrupt("missing tag"))?;
        let method = CompressionMethod::from_tag(tag).ok_or(Error::UnsupportedFormat(tag))?;
        let inline_len = reader
            .read_u24::<LittleEndian>()
            .map_err(|_| Error::corrupt("missing inline length"))?;

        if inline_len != 0 {
            return Ok(Self {
                method,
                decompressed_len: inline_len as usize,
                header_len: Self::INLINE_SIZE,
            });
        }

        let extended_len = reader.read_u32::<LittleEndian>().map_err(|_| {
            Error::corrupt(format!(
                "extended length truncated: {} bytes, need {}",
                data.len(),
                Self::EXTENDED_SIZE
            ))
        })?;

        Ok(Self {
            method,
            decompressed_len: extended_len as usize,
            header_len: Self::EXTENDED_SIZE,
        })
    }

    /// Append the encoded header to `out`
    pub fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        let len = u32::try_from(self.decompressed_len)
            .map_err(|_| Error::PayloadTooLarge(self.decompressed_len))?;

        out.push(self.method.tag());
        if self.header_len == Self::INLINE_SIZE {
            out.write_u24::<LittleEndian>(len)
                .map_err(|_| Error::PayloadTooLarge(self.decompressed_len))?;
        } else {
            out.extend_from_slice(&[0, 0, 0]);
            out.write_u32::<LittleEndian>(len)
                .map_err(|_| Error::PayloadTooLarge(self.decompressed_len))?;
        }
        Ok(())
    }
}
