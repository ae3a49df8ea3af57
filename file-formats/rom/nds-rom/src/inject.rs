//! In-place asset injection
//!
//! Writes overwrite fixed-size ranges of resolved entries and never change
//! the length of anything, so every offset in the image stays valid. An
//! [`Injector`] holds the only mutable borrow of the image for a run.

use crate::path::AssetPath;
use crate::rom::RomImage;
use crate::{Error, Result};
use memchr::memmem;

/// How a field's bytes are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum FieldEncoding {
    /// Raw bytes of a fixed length
    Bytes {
        /// Field length in bytes
        len: usize,
    },
    /// Unsigned byte
    U8,
    /// Little-endian 16-bit unsigned integer
    U16,
    /// Little-endian 32-bit unsigned integer
    U32,
    /// Unsigned bit field, least significant bit first
    ///
    /// Bit `n` of the field lives in byte `(bit + n) / 8` from the field
    /// offset, at position `(bit + n) % 8`.
    Bits {
        /// First bit, counted from the least significant bit of the field offset
        bit: u32,
        /// Number of bits, 1 to 32
        width: u32,
    },
}

impl FieldEncoding {
    /// Number of bytes the field touches
    pub fn width(&self) -> usize {
        match *self {
            FieldEncoding::Bytes { len } => len,
            FieldEncoding::U8 => 1,
            FieldEncoding::U16 => 2,
            FieldEncoding::U32 => 4,
            FieldEncoding::Bits { bit, width } => (bit as usize + width as usize).div_ceil(8),
        }
    }

    fn check(&self) -> Result<()> {
        match *self {
            FieldEncoding::Bits { width, .. } if !(1..=32).contains(&width) => Err(
                Error::invalid_field(format!("bit field width {} outside 1..=32", width)),
            ),
            FieldEncoding::Bits { bit, .. } if bit > 0xFFFF => {
                Err(Error::invalid_field(format!("bit offset {}", bit)))
            }
            _ => Ok(()),
        }
    }

    /// Encode `value` as the bytes to write and the mask of bits they cover
    fn encode(&self, value: &FieldValue) -> Result<(Vec<u8>, Vec<u8>)> {
        self.check()?;
        let width = self.width();
        let full = |bytes: Vec<u8>| {
            let mask = vec![0xFF; bytes.len()];
            (bytes, mask)
        };

        match (*self, value) {
            (FieldEncoding::Bytes { len }, FieldValue::Bytes(bytes)) => {
                if bytes.len() != len {
                    return Err(Error::invalid_field(format!(
                        "{} bytes given for a {}-byte field",
                        bytes.len(),
                        len
                    )));
                }
                Ok(full(bytes.clone()))
            }
            (FieldEncoding::Bits { bit, width: bits }, FieldValue::Int(v)) => {
                if bits < 64 && *v >> bits != 0 {
                    return Err(Error::invalid_field(format!(
                        "value {} does not fit {} bits",
                        v, bits
                    )));
                }
                let mut bytes = vec![0u8; width];
                let mut mask = vec![0u8; width];
                for i in 0..bits {
                    let pos = (bit + i) as usize;
                    let flag = 1u8 << (pos % 8);
                    mask[pos / 8] |= flag;
                    if (v >> i) & 1 != 0 {
                        bytes[pos / 8] |= flag;
                    }
                }
                Ok((bytes, mask))
            }
            (FieldEncoding::U8 | FieldEncoding::U16 | FieldEncoding::U32, FieldValue::Int(v)) => {
                if width < 8 && *v >> (width * 8) != 0 {
                    return Err(Error::invalid_field(format!(
                        "value {} does not fit {} bytes",
                        v, width
                    )));
                }
                Ok(full(v.to_le_bytes()[..width].to_vec()))
            }
            (encoding, value) => Err(Error::invalid_field(format!(
                "{:?} cannot hold {:?}",
                encoding, value
            ))),
        }
    }

    /// Decode the field from exactly [`FieldEncoding::width`] bytes
    fn decode(&self, bytes: &[u8]) -> FieldValue {
        match *self {
            FieldEncoding::Bytes { .. } => FieldValue::Bytes(bytes.to_vec()),
            FieldEncoding::Bits { bit, width } => {
                let value = (0..width).fold(0u64, |acc, i| {
                    let pos = (bit + i) as usize;
                    acc | (u64::from((bytes[pos / 8] >> (pos % 8)) & 1) << i)
                });
                FieldValue::Int(value)
            }
            _ => {
                let mut buf = [0u8; 8];
                buf[..bytes.len()].copy_from_slice(bytes);
                FieldValue::Int(u64::from_le_bytes(buf))
            }
        }
    }
}

/// A field value
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum FieldValue {
    /// Integer for the integer and bit field encodings
    Int(u64),
    /// Raw bytes for [`FieldEncoding::Bytes`]
    Bytes(Vec<u8>),
}

/// Location and encoding of a field inside an entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDescriptor {
    /// Entry holding the field
    pub path: AssetPath,
    /// Byte offset of the field within the entry
    pub offset: usize,
    /// Field encoding
    pub encoding: FieldEncoding,
}

impl FieldDescriptor {
    /// Create a descriptor
    pub fn new(path: AssetPath, offset: usize, encoding: FieldEncoding) -> Self {
        Self {
            path,
            offset,
            encoding,
        }
    }
}

/// A value to store in a field
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldWrite {
    /// Target field
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub field: FieldDescriptor,
    /// Value to store
    pub value: FieldValue,
}

/// A write resolved to absolute image offsets
#[derive(Debug)]
struct PlannedWrite {
    start: usize,
    bytes: Vec<u8>,
    mask: Vec<u8>,
}

/// Exclusive writer over a cartridge image
#[derive(Debug)]
pub struct Injector<'r> {
    rom: &'r mut RomImage,
}

impl<'r> Injector<'r> {
    /// Take exclusive access to `rom` for the lifetime of the injector
    pub fn new(rom: &'r mut RomImage) -> Self {
        Self { rom }
    }

    /// The image being written
    pub fn rom(&self) -> &RomImage {
        &*self.rom
    }

    /// Absolute start of `len` bytes at `offset` in the entry at `path`
    fn target(&self, path: &AssetPath, offset: usize, len: usize) -> Result<usize> {
        let entry = self.rom.resolve(path)?;
        let span = entry
            .span()
            .ok_or_else(|| Error::CompressedLayer(path.to_string()))?;
        if offset.checked_add(len).is_none_or(|end| end > span.len()) {
            return Err(Error::OutOfRange {
                path: path.to_string(),
                offset,
                len,
                available: span.len(),
            });
        }
        Ok(span.start + offset)
    }

    fn plan(&self, field: &FieldDescriptor, value: &FieldValue) -> Result<PlannedWrite> {
        let (bytes, mask) = field.encoding.encode(value)?;
        let start = self.target(&field.path, field.offset, bytes.len())?;
        Ok(PlannedWrite { start, bytes, mask })
    }

    fn commit(&mut self, write: &PlannedWrite) {
        let data = self.rom.as_bytes_mut();
        for (i, (&byte, &mask)) in write.bytes.iter().zip(&write.mask).enumerate() {
            let slot = &mut data[write.start + i];
            *slot = (*slot & !mask) | (byte & mask);
        }
    }

    /// Overwrite `bytes.len()` bytes at `offset` in the entry at `path`
    pub fn write_field(&mut self, path: &AssetPath, offset: usize, bytes: &[u8]) -> Result<()> {
        let start = self.target(path, offset, bytes.len())?;
        self.rom.as_bytes_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        log::debug!(
            "Wrote {} bytes at {}+0x{:X} (image offset 0x{:X})",
            bytes.len(),
            path,
            offset,
            start
        );
        Ok(())
    }

    /// Read the current value of a field
    ///
    /// Unlike writes, reads may go through compressed layers.
    pub fn read_field(&self, field: &FieldDescriptor) -> Result<FieldValue> {
        field.encoding.check()?;
        let entry = self.rom.resolve(&field.path)?;
        let len = field.encoding.width();
        let bytes = field
            .offset
            .checked_add(len)
            .and_then(|end| entry.bytes().get(field.offset..end))
            .ok_or_else(|| Error::OutOfRange {
                path: field.path.to_string(),
                offset: field.offset,
                len,
                available: entry.len(),
            })?;
        Ok(field.encoding.decode(bytes))
    }

    /// Encode `value` and store it in `field`
    pub fn write(&mut self, field: &FieldDescriptor, value: &FieldValue) -> Result<()> {
        let planned = self.plan(field, value)?;
        self.commit(&planned);
        Ok(())
    }

    /// Apply a batch of writes in order
    ///
    /// Every write is resolved, bounds-checked and encoded before the first
    /// byte changes, so a failing batch leaves the image untouched.
    pub fn apply_all(&mut self, writes: &[FieldWrite]) -> Result<usize> {
        let planned = writes
            .iter()
            .map(|write| self.plan(&write.field, &write.value))
            .collect::<Result<Vec<_>>>()?;

        for write in &planned {
            self.commit(write);
        }
        log::info!("Applied {} field writes", planned.len());
        Ok(planned.len())
    }

    /// Store `payload` over the filler region that starts with `marker`
    ///
    /// The region runs from the marker to the first NUL byte at or after it,
    /// that byte included. Returns the image offset written to.
    pub fn write_at_marker(&mut self, marker: &[u8], payload: &[u8]) -> Result<usize> {
        let label = String::from_utf8_lossy(marker).into_owned();
        if marker.is_empty() {
            return Err(Error::MarkerNotFound("empty marker".to_string()));
        }

        let data = self.rom.as_bytes_mut();
        let start =
            memmem::find(data, marker).ok_or_else(|| Error::MarkerNotFound(label.clone()))?;
        let capacity = match memchr::memchr(0, &data[start..]) {
            Some(nul) => nul + 1,
            None => data.len() - start,
        };
        if payload.len() > capacity {
            return Err(Error::OutOfRange {
                path: format!("marker '{}'", label),
                offset: 0,
                len: payload.len(),
                available: capacity,
            });
        }

        data[start..start + payload.len()].copy_from_slice(payload);
        log::info!(
            "Wrote {} byte payload at marker 0x{:X} ({} bytes available)",
            payload.len(),
            start,
            capacity
        );
        Ok(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encoding_widths() {
        assert_eq!(FieldEncoding::U8.width(), 1);
        assert_eq!(FieldEncoding::U32.width(), 4);
        assert_eq!(FieldEncoding::Bytes { len: 7 }.width(), 7);
        assert_eq!(FieldEncoding::Bits { bit: 0, width: 8 }.width(), 1);
        assert_eq!(FieldEncoding::Bits { bit: 6, width: 4 }.width(), 2);
        assert_eq!(FieldEncoding::Bits { bit: 69, width: 1 }.width(), 9);
    }

    #[test]
    fn test_integer_encoding() {
        let (bytes, mask) = FieldEncoding::U16.encode(&FieldValue::Int(0x1234)).unwrap();
        assert_eq!(bytes, vec![0x34, 0x12]);
        assert_eq!(mask, vec![0xFF, 0xFF]);
        assert!(FieldEncoding::U8.encode(&FieldValue::Int(256)).is_err());
        assert!(FieldEncoding::U32.encode(&FieldValue::Int(1 << 32)).is_err());
        assert!(FieldEncoding::U8.encode(&FieldValue::Bytes(vec![1])).is_err());
    }

    #[test]
    fn test_bit_encoding_spans_bytes() {
        let encoding = FieldEncoding::Bits { bit: 6, width: 4 };
        let (bytes, mask) = encoding.encode(&FieldValue::Int(0b1011)).unwrap();
        assert_eq!(mask, vec![0b1100_0000, 0b0000_0011]);
        assert_eq!(bytes, vec![0b1100_0000, 0b0000_0010]);
        assert_eq!(encoding.decode(&bytes), FieldValue::Int(0b1011));
        assert!(encoding.encode(&FieldValue::Int(16)).is_err());
    }

    #[test]
    fn test_bit_width_bounds() {
        let zero = FieldEncoding::Bits { bit: 0, width: 0 };
        assert!(zero.encode(&FieldValue::Int(0)).is_err());
        let wide = FieldEncoding::Bits { bit: 0, width: 33 };
        assert!(wide.encode(&FieldValue::Int(0)).is_err());
    }

    #[test]
    fn test_bytes_encoding_requires_exact_length() {
        let encoding = FieldEncoding::Bytes { len: 3 };
        assert!(encoding.encode(&FieldValue::Bytes(vec![1, 2, 3])).is_ok());
        assert!(encoding.encode(&FieldValue::Bytes(vec![1, 2])).is_err());
        assert!(encoding.encode(&FieldValue::Int(1)).is_err());
    }
}
