//! Synthetic cartridge images for tests
//!
//! [`RomBuilder`] lays out a header, a file name table, a file allocation
//! table and the file payloads, each section aligned to 0x200 bytes, and
//! stamps a valid header CRC. There is no ARM9/ARM7 code; the images only
//! exercise the filesystem and injection paths.

use crate::header::{self, HEADER_SIZE, MAX_CAPACITY_SHIFT, offsets};
use crate::rom::RomImage;
use crate::{Error, Result};
use nds_narc::FileNameTable;

const ALIGNMENT: usize = 0x200;

/// Builder for small CRC-valid cartridge images
#[derive(Debug, Clone)]
pub struct RomBuilder {
    title: String,
    game_code: String,
    maker_code: String,
    rom_version: u8,
    files: Vec<(String, Vec<u8>)>,
}

impl Default for RomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RomBuilder {
    /// Create a builder for an image without files
    pub fn new() -> Self {
        Self {
            title: "APNDS TEST".to_string(),
            game_code: "ATST".to_string(),
            maker_code: "01".to_string(),
            rom_version: 0,
            files: Vec::new(),
        }
    }

    /// Set the game title (at most 12 bytes are kept)
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    /// Set the four-character game code
    pub fn game_code<S: Into<String>>(mut self, code: S) -> Self {
        self.game_code = code.into();
        self
    }

    /// Set the two-character maker code
    pub fn maker_code<S: Into<String>>(mut self, code: S) -> Self {
        self.maker_code = code.into();
        self
    }

    /// Set the ROM revision byte
    pub fn rom_version(mut self, version: u8) -> Self {
        self.rom_version = version;
        self
    }

    /// Add a file; files of one directory must be added consecutively
    pub fn add_file<S: Into<String>>(mut self, path: S, data: Vec<u8>) -> Self {
        self.files.push((path.into(), data));
        self
    }

    /// Lay out the image
    pub fn build(self) -> Result<Vec<u8>> {
        let paths: Vec<&str> = self.files.iter().map(|(path, _)| path.as_str()).collect();
        let fnt = FileNameTable::build(&paths, 0)?.to_bytes();

        let mut image = vec![0u8; HEADER_SIZE];
        put_ascii(&mut image[offsets::TITLE..offsets::TITLE + 12], &self.title);
        put_ascii(
            &mut image[offsets::GAME_CODE..offsets::GAME_CODE + 4],
            &self.game_code,
        );
        put_ascii(
            &mut image[offsets::MAKER_CODE..offsets::MAKER_CODE + 2],
            &self.maker_code,
        );
        image[offsets::ROM_VERSION] = self.rom_version;

        let fnt_offset = image.len();
        image.extend_from_slice(&fnt);
        align(&mut image);

        let fat_offset = image.len();
        let fat_size = self.files.len() * 8;
        image.resize(fat_offset + fat_size, 0);
        align(&mut image);

        for (index, (_, data)) in self.files.iter().enumerate() {
            let start = image.len();
            image.extend_from_slice(data);
            let end = image.len();
            let record = fat_offset + index * 8;
            image[record..record + 4].copy_from_slice(&(start as u32).to_le_bytes());
            image[record + 4..record + 8].copy_from_slice(&(end as u32).to_le_bytes());
            align(&mut image);
        }

        let used = image.len();
        let shift = (0..=MAX_CAPACITY_SHIFT)
            .find(|&n| ((128 * 1024usize) << n) >= used)
            .ok_or_else(|| Error::invalid_rom(format!("{} bytes exceed any cartridge", used)))?;

        put_u32(&mut image, offsets::FNT_OFFSET, fnt_offset);
        put_u32(&mut image, offsets::FNT_SIZE, fnt.len());
        put_u32(&mut image, offsets::FAT_OFFSET, fat_offset);
        put_u32(&mut image, offsets::FAT_SIZE, fat_size);
        put_u32(&mut image, offsets::USED_ROM_SIZE, used);
        image[offsets::DEVICE_CAPACITY] = shift;
        header::update_crc(&mut image)?;

        Ok(image)
    }

    /// Lay out and open the image
    pub fn build_image(self) -> Result<RomImage> {
        RomImage::open(self.build()?)
    }
}

fn put_ascii(field: &mut [u8], value: &str) {
    let len = value.len().min(field.len());
    field[..len].copy_from_slice(&value.as_bytes()[..len]);
}

fn put_u32(image: &mut [u8], offset: usize, value: usize) {
    image[offset..offset + 4].copy_from_slice(&(value as u32).to_le_bytes());
}

fn align(image: &mut Vec<u8>) {
    let padded = image.len().next_multiple_of(ALIGNMENT);
    image.resize(padded, 0xFF);
}
