//! Cartridge filesystem
//!
//! Files are named by the file name table (the same layout NARC archives use
//! for their `BTNF` chunk) and located by the file allocation table, a list
//! of absolute `start, end` pairs indexed by file id. Ids below the root
//! directory's first id belong to overlays and carry no name.

use crate::header::RomHeader;
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use nds_narc::FileNameTable;
use std::ops::Range;

/// Read-only view of the filesystem of a cartridge image
#[derive(Debug, Clone)]
pub struct RomFs<'a> {
    data: &'a [u8],
    fat: Vec<(u32, u32)>,
    names: FileNameTable,
}

impl<'a> RomFs<'a> {
    pub(crate) fn parse(data: &'a [u8], header: &RomHeader) -> Result<Self> {
        let fnt_start = header.fnt_offset as usize;
        let fnt = &data[fnt_start..fnt_start + header.fnt_size as usize];
        let names = FileNameTable::parse(fnt)?;

        let fat_start = header.fat_offset as usize;
        let fat = data[fat_start..fat_start + header.fat_size as usize]
            .chunks_exact(8)
            .map(|pair| {
                (
                    LittleEndian::read_u32(&pair[..4]),
                    LittleEndian::read_u32(&pair[4..]),
                )
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Filesystem: {} allocation entries, {} directories",
            fat.len(),
            names.directories().len()
        );
        Ok(Self { data, fat, names })
    }

    /// Number of file ids in the allocation table
    pub fn len(&self) -> usize {
        self.fat.len()
    }

    /// Whether the allocation table is empty
    pub fn is_empty(&self) -> bool {
        self.fat.is_empty()
    }

    /// The parsed file name table
    pub fn name_table(&self) -> &FileNameTable {
        &self.names
    }

    /// Resolve a `/`-separated path to a file id
    pub fn file_id(&self, path: &str) -> Option<u16> {
        self.names.file_id(path)
    }

    /// Absolute byte range of file `id`
    pub fn file_range(&self, id: u16) -> Result<Range<usize>> {
        let (start, end) = *self.fat.get(usize::from(id)).ok_or_else(|| {
            Error::invalid_rom(format!(
                "file id {} past the allocation table of {} entries",
                id,
                self.fat.len()
            ))
        })?;
        let (start, end) = (start as usize, end as usize);
        if start > end || end > self.data.len() {
            return Err(Error::invalid_rom(format!(
                "file {} spans 0x{:X}..0x{:X} outside the image of {} bytes",
                id,
                start,
                end,
                self.data.len()
            )));
        }
        Ok(start..end)
    }

    /// Contents of file `id`
    pub fn file_by_id(&self, id: u16) -> Result<&'a [u8]> {
        let range = self.file_range(id)?;
        Ok(&self.data[range])
    }

    /// Contents of the file at `path`
    pub fn file(&self, path: &str) -> Result<&'a [u8]> {
        let id = self
            .file_id(path)
            .ok_or_else(|| Error::PathNotFound(path.to_string()))?;
        self.file_by_id(id)
    }

    /// Every named file as `(id, path)`, sorted by id
    pub fn paths(&self) -> Vec<(u16, String)> {
        self.names.paths()
    }
}

#[cfg(test)]
mod tests {
    use crate::RomImage;
    use crate::test_utils::RomBuilder;
    use pretty_assertions::assert_eq;

    fn image() -> RomImage {
        RomBuilder::new()
            .add_file("a/one.bin", vec![1; 5])
            .add_file("a/two.bin", vec![2; 3])
            .add_file("top.bin", b"top".to_vec())
            .build_image()
            .unwrap()
    }

    #[test]
    fn test_lookup_by_path() {
        let rom = image();
        let fs = rom.filesystem().unwrap();
        assert_eq!(fs.len(), 3);
        assert_eq!(fs.file("a/two.bin").unwrap(), &[2; 3]);
        assert_eq!(fs.file("/top.bin").unwrap(), b"top");
        assert!(fs.file("a/three.bin").is_err());
    }

    #[test]
    fn test_ranges_are_absolute() {
        let rom = image();
        let fs = rom.filesystem().unwrap();
        let id = fs.file_id("a/one.bin").unwrap();
        let range = fs.file_range(id).unwrap();
        assert_eq!(&rom.as_bytes()[range], &[1; 5]);
        assert!(fs.file_range(99).is_err());
    }

    #[test]
    fn test_paths_sorted_by_id() {
        let rom = image();
        let paths: Vec<String> = rom
            .filesystem()
            .unwrap()
            .paths()
            .into_iter()
            .map(|(_, path)| path)
            .collect();
        assert_eq!(paths, vec!["a/one.bin", "a/two.bin", "top.bin"]);
    }
}
