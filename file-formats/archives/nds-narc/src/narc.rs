//! NARC archive reader

use crate::bytes::{slice_at, u16_at, u32_at};
use crate::fnt::FileNameTable;
use crate::{Error, Result};
use std::borrow::Cow;
use std::ops::Range;

/// Archive and chunk signatures
pub mod signatures {
    /// Archive magic
    pub const NARC: [u8; 4] = *b"NARC";
    /// File allocation table chunk
    pub const BTAF: [u8; 4] = *b"BTAF";
    /// File name table chunk
    pub const BTNF: [u8; 4] = *b"BTNF";
    /// File image (payload) chunk
    pub const GMIF: [u8; 4] = *b"GMIF";
}

/// Byte-order mark of a little-endian archive
pub const BYTE_ORDER_MARK: u16 = 0xFFFE;

/// Format version written by the builder
pub const VERSION: u16 = 0x0100;

/// Size of the archive header
pub const HEADER_SIZE: usize = 16;

/// Size of a chunk header (tag + size)
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Check whether `data` starts with the archive magic
pub fn is_narc(data: &[u8]) -> bool {
    data.starts_with(&signatures::NARC)
}

/// A parsed archive over a borrowed or owned buffer
///
/// Entry ranges are absolute offsets into the buffer the archive was opened
/// from, so callers holding the enclosing image can map them back.
#[derive(Debug, Clone)]
pub struct Narc<'a> {
    data: Cow<'a, [u8]>,
    version: u16,
    entries: Vec<Range<usize>>,
    names: Option<Vec<String>>,
    name_table: Option<FileNameTable>,
}

impl<'a> Narc<'a> {
    /// Parse an archive borrowing `data`
    pub fn open(data: &'a [u8]) -> Result<Self> {
        Self::from_cow(Cow::Borrowed(data))
    }

    /// Parse an archive taking ownership of `data`
    pub fn from_owned(data: Vec<u8>) -> Result<Narc<'static>> {
        Narc::from_cow(Cow::Owned(data))
    }

    fn from_cow(data: Cow<'a, [u8]>) -> Result<Self> {
        let layout = parse_layout(&data)?;
        Ok(Self {
            data,
            version: layout.version,
            entries: layout.entries,
            names: layout.names,
            name_table: layout.name_table,
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Format version from the header
    pub fn version(&self) -> u16 {
        self.version
    }

    /// The buffer the archive was parsed from
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte range of entry `index` within [`Narc::as_bytes`]
    pub fn entry_range(&self, index: usize) -> Result<Range<usize>> {
        self.entries
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfRange {
                index,
                count: self.entries.len(),
            })
    }

    /// Payload of entry `index`
    pub fn entry(&self, index: usize) -> Result<&[u8]> {
        let range = self.entry_range(index)?;
        Ok(&self.data[range])
    }

    /// Payload of the entry named `name`
    pub fn entry_by_name(&self, name: &str) -> Result<&[u8]> {
        let index = self
            .index_of(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.entry(index)
    }

    /// Index of the entry named `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.as_ref()?.iter().position(|n| n == name)
    }

    /// Name of entry `index`, if the archive carries names
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.as_ref()?.get(index).map(String::as_str)
    }

    /// Entry names in index order, if the archive carries names
    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// The parsed name table, if the archive carries names
    pub fn name_table(&self) -> Option<&FileNameTable> {
        self.name_table.as_ref()
    }

    /// Entry payloads in index order
    pub fn entries(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.entries.iter().map(|range| &self.data[range.clone()])
    }

    /// Detach from the borrowed buffer
    pub fn into_owned(self) -> Narc<'static> {
        Narc {
            data: Cow::Owned(self.data.into_owned()),
            version: self.version,
            entries: self.entries,
            names: self.names,
            name_table: self.name_table,
        }
    }
}

struct Layout {
    version: u16,
    entries: Vec<Range<usize>>,
    names: Option<Vec<String>>,
    name_table: Option<FileNameTable>,
}

fn parse_layout(data: &[u8]) -> Result<Layout> {
    let magic = slice_at(data, 0, 4, "archive magic")?;
    if magic != signatures::NARC {
        return Err(Error::malformed(format!("bad magic {:02X?}", magic)));
    }

    let bom = u16_at(data, 4, "byte-order mark")?;
    if bom != BYTE_ORDER_MARK {
        return Err(Error::malformed(format!("byte-order mark 0x{:04X}", bom)));
    }

    let version = u16_at(data, 6, "version")?;
    if version != VERSION {
        log::warn!("Unexpected NARC version 0x{:04X}", version);
    }

    let file_size = u32_at(data, 8, "file size")? as usize;
    if file_size > data.len() {
        return Err(Error::malformed(format!(
            "declared length {} exceeds buffer of {} bytes",
            file_size,
            data.len()
        )));
    }
    if file_size < data.len() {
        log::debug!(
            "Ignoring {} bytes after the declared archive end",
            data.len() - file_size
        );
    }
    let data = &data[..file_size];

    let header_size = usize::from(u16_at(data, 12, "header size")?);
    if !(HEADER_SIZE..=file_size).contains(&header_size) {
        return Err(Error::malformed(format!("header size {}", header_size)));
    }
    let chunk_count = u16_at(data, 14, "chunk count")?;

    let mut btaf = None;
    let mut btnf = None;
    let mut gmif = None;
    let mut pos = header_size;
    for _ in 0..chunk_count {
        let tag = slice_at(data, pos, 4, "chunk tag")?;
        let size = u32_at(data, pos + 4, "chunk size")? as usize;
        if size < CHUNK_HEADER_SIZE || size > file_size - pos {
            return Err(Error::malformed(format!(
                "chunk {} of {} bytes at 0x{:X} exceeds declared length {}",
                String::from_utf8_lossy(tag),
                size,
                pos,
                file_size
            )));
        }

        let body = pos + CHUNK_HEADER_SIZE..pos + size;
        match <[u8; 4]>::try_from(tag) {
            Ok(signatures::BTAF) => btaf = Some(body),
            Ok(signatures::BTNF) => btnf = Some(body),
            Ok(signatures::GMIF) => gmif = Some(body),
            _ => log::warn!(
                "Skipping unknown chunk {} at 0x{:X}",
                String::from_utf8_lossy(tag),
                pos
            ),
        }
        pos += size;
    }

    let btaf = btaf.ok_or_else(|| Error::malformed("missing BTAF chunk"))?;
    let gmif = gmif.ok_or_else(|| Error::malformed("missing GMIF chunk"))?;

    let count = usize::from(u16_at(data, btaf.start, "entry count")?);
    if btaf.len() + CHUNK_HEADER_SIZE != 12 + 8 * count {
        return Err(Error::malformed(format!(
            "allocation table of {} bytes does not hold {} entries",
            btaf.len() + CHUNK_HEADER_SIZE,
            count
        )));
    }

    let data_len = gmif.len();
    let mut entries = Vec::with_capacity(count);
    for index in 0..count {
        let record = btaf.start + 4 + index * 8;
        let start = u32_at(data, record, "entry start")? as usize;
        let end = u32_at(data, record + 4, "entry end")? as usize;
        if start > end || end > data_len {
            return Err(Error::malformed(format!(
                "entry {} spans {}..{} outside data region of {} bytes",
                index, start, end, data_len
            )));
        }
        entries.push(gmif.start + start..gmif.start + end);
    }

    let (names, name_table) = match btnf {
        Some(range) => {
            let table = FileNameTable::parse(&data[range])?;
            if table.is_empty() {
                (None, None)
            } else {
                let names = names_by_index(&table, count)?;
                (Some(names), Some(table))
            }
        }
        None => (None, None),
    };

    log::debug!(
        "Opened NARC: {} entries, {} data bytes, names: {}",
        count,
        data_len,
        names.is_some()
    );

    Ok(Layout {
        version,
        entries,
        names,
        name_table,
    })
}

fn names_by_index(table: &FileNameTable, count: usize) -> Result<Vec<String>> {
    let paths = table.paths();
    if paths.len() != count {
        return Err(Error::malformed(format!(
            "name table lists {} files, allocation table {}",
            paths.len(),
            count
        )));
    }

    paths
        .into_iter()
        .enumerate()
        .map(|(index, (id, path))| {
            if usize::from(id) == index {
                Ok(path)
            } else {
                Err(Error::malformed(format!(
                    "name table has no name for entry {}",
                    index
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NarcBuilder;

    fn sample() -> Vec<u8> {
        NarcBuilder::new()
            .add_entry(vec![1, 2, 3])
            .add_entry(Vec::new())
            .add_entry(vec![9; 8])
            .build()
            .unwrap()
    }

    #[test]
    fn test_open_entries() {
        let data = sample();
        let narc = Narc::open(&data).unwrap();
        assert_eq!(narc.len(), 3);
        assert_eq!(narc.entry(0).unwrap(), &[1, 2, 3]);
        assert!(narc.entry(1).unwrap().is_empty());
        assert_eq!(narc.entry(2).unwrap(), &[9; 8]);
        assert!(narc.names().is_none());
        assert!(matches!(
            narc.entry(3),
            Err(Error::IndexOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_entry_ranges_are_absolute() {
        let data = sample();
        let narc = Narc::open(&data).unwrap();
        let range = narc.entry_range(2).unwrap();
        assert_eq!(range.start % 4, 0);
        assert_eq!(&data[range], &[9; 8]);
    }

    #[test]
    fn test_bad_magic_and_bom() {
        let mut data = sample();
        data[0] = b'X';
        assert!(matches!(Narc::open(&data), Err(Error::MalformedContainer(_))));

        let mut data = sample();
        data[4] = 0xFF;
        data[5] = 0xFE;
        assert!(Narc::open(&data).is_err());
    }

    #[test]
    fn test_declared_length_exceeds_buffer() {
        let data = sample();
        assert!(Narc::open(&data[..data.len() - 1]).is_err());
    }

    #[test]
    fn test_entry_outside_data_region() {
        let mut data = sample();
        // Entry 0 end field: header(16) + BTAF header(8) + count/reserved(4) + start(4)
        data[32..36].copy_from_slice(&0x1000u32.to_le_bytes());
        let err = Narc::open(&data).unwrap_err();
        assert!(err.to_string().contains("entry 0"));
    }

    #[test]
    fn test_count_inconsistent_with_table() {
        let mut data = sample();
        data[24] = 4;
        assert!(matches!(Narc::open(&data), Err(Error::MalformedContainer(_))));
    }

    #[test]
    fn test_owned_and_into_owned() {
        let narc = Narc::from_owned(sample()).unwrap();
        assert_eq!(narc.entries().count(), 3);

        let data = sample();
        let owned = Narc::open(&data).unwrap().into_owned();
        drop(data);
        assert_eq!(owned.entry(0).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_is_narc() {
        assert!(is_narc(&sample()));
        assert!(!is_narc(b"NAR"));
    }
}
