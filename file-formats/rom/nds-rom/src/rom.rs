//! Cartridge image

use crate::fs::RomFs;
use crate::header::RomHeader;
use crate::path::{self, AssetPath, LocatedContainer, ResolvedEntry};
use crate::{Error, Result};
use md5::{Digest, Md5};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A validated cartridge image held in memory
#[derive(Debug, Clone)]
pub struct RomImage {
    data: Vec<u8>,
    header: RomHeader,
}

impl RomImage {
    /// Validate `data` as a cartridge image and take ownership of it
    pub fn open(data: Vec<u8>) -> Result<Self> {
        let header = RomHeader::parse(&data)?;
        header.validate(&data)?;
        log::info!(
            "Opened ROM '{}' ({}{}, revision {}), {} bytes",
            header.title,
            header.game_code,
            header.maker_code,
            header.rom_version,
            data.len()
        );
        Ok(Self { data, header })
    }

    /// Read and validate the image at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading ROM from {}", path.display());
        Self::open(fs::read(path)?)
    }

    /// Write the image to `path`
    ///
    /// The bytes go to a temporary file in the destination directory that is
    /// renamed over `path` once complete, so a failed save leaves no partial
    /// output.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(&self.data)?;
        temp_file.flush()?;
        temp_file.persist(path).map_err(|e| Error::Io(e.error))?;
        log::info!("Wrote {} bytes to {}", self.data.len(), path.display());
        Ok(())
    }

    /// Parsed header
    pub fn header(&self) -> &RomHeader {
        &self.header
    }

    /// Image contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Image length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image is empty (never true for a validated image)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// MD5 digest of the image
    pub fn md5(&self) -> [u8; 16] {
        Md5::digest(&self.data).into()
    }

    /// MD5 digest of the image as lowercase hex
    pub fn md5_hex(&self) -> String {
        hex::encode(self.md5())
    }

    /// Release the image bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Read-only view of the cartridge filesystem
    pub fn filesystem(&self) -> Result<RomFs<'_>> {
        RomFs::parse(&self.data, &self.header)
    }

    /// Resolve `path` to the bytes it names
    pub fn resolve(&self, path: &AssetPath) -> Result<ResolvedEntry<'_>> {
        let fs = self.filesystem()?;
        path::resolve(&self.data, &fs, path)
    }

    /// Resolve `path` and open it as an archive
    pub fn locate(&self, path: &AssetPath) -> Result<LocatedContainer<'_>> {
        let fs = self.filesystem()?;
        path::locate(&self.data, &fs, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RomBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_rejects_short_image() {
        let err = RomImage::open(vec![0; 0x100]).unwrap_err();
        assert!(matches!(err, Error::InvalidRom(_)));
    }

    #[test]
    fn test_open_rejects_corrupt_header() {
        let mut data = RomBuilder::new().build().unwrap();
        data[0x20] ^= 0xFF;
        assert!(RomImage::open(data).is_err());
    }

    #[test]
    fn test_header_fields() {
        let rom = RomBuilder::new()
            .title("POKEMON PL")
            .game_code("CPUE")
            .rom_version(1)
            .build_image()
            .unwrap();
        assert_eq!(rom.header().title, "POKEMON PL");
        assert_eq!(rom.header().game_code, "CPUE");
        assert_eq!(rom.header().rom_version, 1);
        assert_eq!(rom.md5_hex().len(), 32);
    }

    #[test]
    fn test_save_and_load() {
        let rom = RomBuilder::new()
            .add_file("data.bin", vec![7; 33])
            .build_image()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nds");
        rom.save(&path).unwrap();

        let loaded = RomImage::load(&path).unwrap();
        assert_eq!(loaded.as_bytes(), rom.as_bytes());
        assert_eq!(loaded.md5(), rom.md5());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let rom = RomBuilder::new().build_image().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.nds");
        assert!(matches!(rom.save(&path), Err(Error::Io(_))));
        assert!(!path.exists());
    }
}
