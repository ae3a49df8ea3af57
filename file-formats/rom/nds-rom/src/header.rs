//! Cartridge header
//!
//! The first 0x200 bytes of an image describe the cartridge: identification
//! strings, the device capacity, and the locations of the filesystem tables.
//! The header ends its checked region with a CRC-16 (MODBUS parameters) over
//! everything before it.

use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Size of the cartridge header
pub const HEADER_SIZE: usize = 0x200;

/// Offset of the header CRC-16, which also ends the checked region
pub const CRC_OFFSET: usize = 0x15E;

/// Largest device capacity shift (`128 KiB << 12` = 512 MiB)
pub const MAX_CAPACITY_SHIFT: u8 = 12;

/// Field offsets within the header
pub mod offsets {
    /// Game title, 12 bytes
    pub const TITLE: usize = 0x000;
    /// Game code, 4 bytes
    pub const GAME_CODE: usize = 0x00C;
    /// Maker code, 2 bytes
    pub const MAKER_CODE: usize = 0x010;
    /// Unit code
    pub const UNIT_CODE: usize = 0x012;
    /// Device capacity shift
    pub const DEVICE_CAPACITY: usize = 0x014;
    /// ROM revision
    pub const ROM_VERSION: usize = 0x01E;
    /// File name table offset
    pub const FNT_OFFSET: usize = 0x040;
    /// File name table size
    pub const FNT_SIZE: usize = 0x044;
    /// File allocation table offset
    pub const FAT_OFFSET: usize = 0x048;
    /// File allocation table size
    pub const FAT_SIZE: usize = 0x04C;
    /// Bytes in use by the image
    pub const USED_ROM_SIZE: usize = 0x080;
}

/// CRC-16 with polynomial 0xA001 (reflected 0x8005) and initial value 0xFFFF
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFFu16;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xA001
            } else {
                crc >> 1
            };
        }
    }
    crc
}

/// Recompute the header CRC of `image` and store it
pub fn update_crc(image: &mut [u8]) -> Result<u16> {
    if image.len() < HEADER_SIZE {
        return Err(Error::invalid_rom(format!(
            "image of {} bytes is shorter than the header",
            image.len()
        )));
    }
    let crc = crc16(&image[..CRC_OFFSET]);
    LittleEndian::write_u16(&mut image[CRC_OFFSET..CRC_OFFSET + 2], crc);
    Ok(crc)
}

fn ascii_field(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).trim_end().to_string()
}

/// Parsed cartridge header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// Game title
    pub title: String,
    /// Four-character game code
    pub game_code: String,
    /// Two-character maker code
    pub maker_code: String,
    /// Unit code (0 = NDS)
    pub unit_code: u8,
    /// Device capacity shift; the cartridge holds `128 KiB << n`
    pub device_capacity: u8,
    /// ROM revision
    pub rom_version: u8,
    /// File name table offset
    pub fnt_offset: u32,
    /// File name table size
    pub fnt_size: u32,
    /// File allocation table offset
    pub fat_offset: u32,
    /// File allocation table size
    pub fat_size: u32,
    /// Bytes in use by the image
    pub used_rom_size: u32,
    /// Stored header CRC-16
    pub header_crc: u16,
}

impl RomHeader {
    /// Parse the header fields without validating them
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::invalid_rom(format!(
                "image of {} bytes is shorter than the 0x{:X}-byte header",
                data.len(),
                HEADER_SIZE
            )));
        }

        let u32_at = |offset: usize| LittleEndian::read_u32(&data[offset..offset + 4]);
        Ok(Self {
            title: ascii_field(&data[offsets::TITLE..offsets::TITLE + 12]),
            game_code: ascii_field(&data[offsets::GAME_CODE..offsets::GAME_CODE + 4]),
            maker_code: ascii_field(&data[offsets::MAKER_CODE..offsets::MAKER_CODE + 2]),
            unit_code: data[offsets::UNIT_CODE],
            device_capacity: data[offsets::DEVICE_CAPACITY],
            rom_version: data[offsets::ROM_VERSION],
            fnt_offset: u32_at(offsets::FNT_OFFSET),
            fnt_size: u32_at(offsets::FNT_SIZE),
            fat_offset: u32_at(offsets::FAT_OFFSET),
            fat_size: u32_at(offsets::FAT_SIZE),
            used_rom_size: u32_at(offsets::USED_ROM_SIZE),
            header_crc: LittleEndian::read_u16(&data[CRC_OFFSET..CRC_OFFSET + 2]),
        })
    }

    /// Cartridge capacity in bytes, if the shift is in range
    pub fn capacity(&self) -> Option<u64> {
        (self.device_capacity <= MAX_CAPACITY_SHIFT)
            .then(|| (128 * 1024u64) << self.device_capacity)
    }

    /// Number of entries in the file allocation table
    pub fn file_count(&self) -> usize {
        self.fat_size as usize / 8
    }

    /// Check the header against the image it was parsed from
    pub fn validate(&self, data: &[u8]) -> Result<()> {
        let computed = crc16(&data[..CRC_OFFSET]);
        if computed != self.header_crc {
            return Err(Error::invalid_rom(format!(
                "header CRC 0x{:04X} does not match computed 0x{:04X}",
                self.header_crc, computed
            )));
        }

        let capacity = self.capacity().ok_or_else(|| {
            Error::invalid_rom(format!("device capacity shift {}", self.device_capacity))
        })?;
        if data.len() as u64 > capacity {
            return Err(Error::invalid_rom(format!(
                "image of {} bytes exceeds cartridge capacity of {} bytes",
                data.len(),
                capacity
            )));
        }

        let tables = [
            ("file name table", self.fnt_offset, self.fnt_size),
            ("file allocation table", self.fat_offset, self.fat_size),
        ];
        for (name, offset, size) in tables {
            let end = u64::from(offset) + u64::from(size);
            if (offset as usize) < HEADER_SIZE || end > data.len() as u64 {
                return Err(Error::invalid_rom(format!(
                    "{} at 0x{:X}..0x{:X} lies outside the image of {} bytes",
                    name,
                    offset,
                    end,
                    data.len()
                )));
            }
        }
        if self.fat_size % 8 != 0 {
            return Err(Error::invalid_rom(format!(
                "file allocation table size {} is not a multiple of 8",
                self.fat_size
            )));
        }

        if (self.used_rom_size as usize) > data.len() {
            log::warn!(
                "Header declares {} used bytes but the image has {}",
                self.used_rom_size,
                data.len()
            );
        }

        Ok(())
    }
}
