//! Bounds-checked little-endian field reads

use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

fn field<'a>(data: &'a [u8], offset: usize, len: usize, name: &str) -> Result<&'a [u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            Error::malformed(format!(
                "{} at 0x{:X} lies past the end of {} bytes",
                name,
                offset,
                data.len()
            ))
        })
}

pub(crate) fn u8_at(data: &[u8], offset: usize, name: &str) -> Result<u8> {
    field(data, offset, 1, name).map(|b| b[0])
}

pub(crate) fn u16_at(data: &[u8], offset: usize, name: &str) -> Result<u16> {
    field(data, offset, 2, name).map(LittleEndian::read_u16)
}

pub(crate) fn u32_at(data: &[u8], offset: usize, name: &str) -> Result<u32> {
    field(data, offset, 4, name).map(LittleEndian::read_u32)
}

pub(crate) fn slice_at<'a>(data: &'a [u8], offset: usize, len: usize, name: &str) -> Result<&'a [u8]> {
    field(data, offset, len, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_bounds() {
        let data = [0x34, 0x12, 0x78, 0x56];
        assert_eq!(u16_at(&data, 0, "x").unwrap(), 0x1234);
        assert_eq!(u32_at(&data, 0, "x").unwrap(), 0x5678_1234);
        assert_eq!(u8_at(&data, 3, "x").unwrap(), 0x56);
    }

    #[test]
    fn test_reads_out_of_bounds() {
        let data = [0u8; 4];
        let err = u32_at(&data, 1, "file size").unwrap_err();
        assert!(err.to_string().contains("file size"));
        assert!(u16_at(&data, usize::MAX, "x").is_err());
    }
}
