//! File name table (FNT) codec
//!
//! The same layout names files in the cartridge filesystem and inside the
//! `BTNF` chunk of a NARC. A main table of 8-byte directory records is
//! followed by one sub-table per directory:
//!
//! | length byte   | meaning                                         |
//! |---------------|-------------------------------------------------|
//! | `0x00`        | end of sub-table                                |
//! | `0x01..=0x7F` | file name of that many bytes                    |
//! | `0x80`        | reserved                                        |
//! | `0x81..=0xFF` | directory name (`& 0x7F` bytes), then `u16` id  |
//!
//! Files in a directory take consecutive ids starting at the record's first
//! file id, in sub-table order.

use crate::bytes::{slice_at, u8_at, u16_at, u32_at};
use crate::{Error, Result};
use std::collections::HashSet;

/// Directory ids are `0xF000 | index`
pub const ROOT_DIRECTORY_ID: u16 = 0xF000;

/// Longest file or directory name a sub-table entry can hold
pub const MAX_NAME_LEN: usize = 0x7F;

/// Directory ids leave 12 bits for the index
pub const MAX_DIRECTORIES: usize = 0x1000;

const RECORD_SIZE: usize = 8;

/// One sub-table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntry {
    /// A file; its id follows from its position
    File(String),
    /// A subdirectory
    Directory {
        /// Directory name
        name: String,
        /// Directory id (`0xF000 | index`)
        id: u16,
    },
}

/// A directory record and its sub-table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// Id of the first file listed in this directory
    pub first_file_id: u16,
    /// Id of the parent directory (unused for the root)
    pub parent_id: u16,
    /// Sub-table entries in stored order
    pub entries: Vec<DirEntry>,
}

impl Directory {
    fn new(first_file_id: u16, parent_id: u16) -> Self {
        Self {
            first_file_id,
            parent_id,
            entries: Vec::new(),
        }
    }

    fn subdirectory(&self, name: &str) -> Option<usize> {
        self.entries.iter().find_map(|entry| match entry {
            DirEntry::Directory { name: n, id } if n == name => Some(directory_index(*id)),
            _ => None,
        })
    }

    fn file_position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                DirEntry::File(n) => Some(n),
                DirEntry::Directory { .. } => None,
            })
            .position(|n| n == name)
    }

    fn has_name(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| match entry {
            DirEntry::File(n) | DirEntry::Directory { name: n, .. } => n == name,
        })
    }
}

fn directory_index(id: u16) -> usize {
    usize::from(id & 0x0FFF)
}

/// Parsed file name table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTable {
    directories: Vec<Directory>,
}

impl Default for FileNameTable {
    fn default() -> Self {
        Self::unnamed(0)
    }
}

impl FileNameTable {
    /// A table with an empty root directory
    pub fn unnamed(first_file_id: u16) -> Self {
        Self {
            directories: vec![Directory::new(first_file_id, 0)],
        }
    }

    /// Parse a table from its serialized form
    pub fn parse(data: &[u8]) -> Result<Self> {
        let dir_count = usize::from(u16_at(data, 6, "directory count")?);
        if dir_count == 0 || dir_count > MAX_DIRECTORIES {
            return Err(Error::malformed(format!(
                "name table declares {} directories",
                dir_count
            )));
        }
        if dir_count * RECORD_SIZE > data.len() {
            return Err(Error::malformed(format!(
                "name table main table of {} records exceeds {} bytes",
                dir_count,
                data.len()
            )));
        }

        let mut directories = Vec::with_capacity(dir_count);
        for index in 0..dir_count {
            let record = index * RECORD_SIZE;
            let offset = u32_at(data, record, "sub-table offset")? as usize;
            let first_file_id = u16_at(data, record + 4, "first file id")?;
            let parent_id = if index == 0 {
                0
            } else {
                let parent = u16_at(data, record + 6, "parent directory id")?;
                check_directory_id(parent, dir_count)?;
                parent
            };

            let entries = parse_sub_table(data, offset, dir_count)?;
            directories.push(Directory {
                first_file_id,
                parent_id,
                entries,
            });
        }

        log::debug!(
            "Parsed name table: {} directories, {} bytes",
            dir_count,
            data.len()
        );

        Ok(Self { directories })
    }

    /// Build a table naming `paths` with consecutive ids from `first_file_id`
    ///
    /// Paths use `/` between directory names. All files of one directory must
    /// be listed contiguously, since a directory record holds only its first id.
    pub fn build<S: AsRef<str>>(paths: &[S], first_file_id: u16) -> Result<Self> {
        let mut table = Self::unnamed(first_file_id);
        let mut last_file: Vec<Option<u32>> = vec![None];
        let mut seen = HashSet::new();

        for (i, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let id = u32::from(first_file_id) + i as u32;
            let id16 = u16::try_from(id).map_err(|_| {
                Error::invalid_name(format!("file id {} for '{}' exceeds 0xFFFF", id, path))
            })?;
            if !seen.insert(path) {
                return Err(Error::invalid_name(format!("duplicate name '{}'", path)));
            }

            let segments: Vec<&str> = path.split('/').collect();
            for segment in &segments {
                validate_name(segment, path)?;
            }
            let (file_name, dirs) = segments
                .split_last()
                .ok_or_else(|| Error::invalid_name("empty path"))?;

            let mut dir = 0;
            for segment in dirs {
                dir = match table.directories[dir].subdirectory(segment) {
                    Some(child) => child,
                    None => {
                        if table.directories[dir].has_name(segment) {
                            return Err(Error::invalid_name(format!(
                                "'{}' in '{}' is already a file",
                                segment, path
                            )));
                        }
                        let child = table.directories.len();
                        if child >= MAX_DIRECTORIES {
                            return Err(Error::invalid_name("more than 4096 directories"));
                        }
                        let child_id = ROOT_DIRECTORY_ID | child as u16;
                        table.directories[dir].entries.push(DirEntry::Directory {
                            name: (*segment).to_string(),
                            id: child_id,
                        });
                        table
                            .directories
                            .push(Directory::new(id16, ROOT_DIRECTORY_ID | dir as u16));
                        last_file.push(None);
                        child
                    }
                };
            }

            let directory = &mut table.directories[dir];
            if directory.has_name(file_name) {
                return Err(Error::invalid_name(format!(
                    "'{}' is already a directory",
                    path
                )));
            }
            match last_file[dir] {
                Some(prev) if prev + 1 != id => {
                    return Err(Error::invalid_name(format!(
                        "'{}' is not contiguous with the other files of its directory",
                        path
                    )));
                }
                Some(_) => {}
                None => directory.first_file_id = id16,
            }
            directory.entries.push(DirEntry::File((*file_name).to_string()));
            last_file[dir] = Some(id);
        }

        Ok(table)
    }

    /// Serialize the table
    ///
    /// A table without names and a zero first id is written in the
    /// canonical 8-byte form whose sub-table offset points at its own
    /// zero first-id field.
    pub fn to_bytes(&self) -> Vec<u8> {
        let count = self.directories.len();
        if self.is_empty() && count == 1 && self.directories[0].first_file_id == 0 {
            return vec![4, 0, 0, 0, 0, 0, 1, 0];
        }

        let mut sub_tables = Vec::new();
        let mut offsets = Vec::with_capacity(count);
        for directory in &self.directories {
            offsets.push(count * RECORD_SIZE + sub_tables.len());
            for entry in &directory.entries {
                match entry {
                    DirEntry::File(name) => {
                        sub_tables.push(name.len() as u8);
                        sub_tables.extend_from_slice(name.as_bytes());
                    }
                    DirEntry::Directory { name, id } => {
                        sub_tables.push(0x80 | name.len() as u8);
                        sub_tables.extend_from_slice(name.as_bytes());
                        sub_tables.extend_from_slice(&id.to_le_bytes());
                    }
                }
            }
            sub_tables.push(0);
        }

        let mut out = Vec::with_capacity(count * RECORD_SIZE + sub_tables.len());
        for (index, directory) in self.directories.iter().enumerate() {
            out.extend_from_slice(&(offsets[index] as u32).to_le_bytes());
            out.extend_from_slice(&directory.first_file_id.to_le_bytes());
            let third = if index == 0 {
                count as u16
            } else {
                directory.parent_id
            };
            out.extend_from_slice(&third.to_le_bytes());
        }
        out.extend_from_slice(&sub_tables);
        out
    }

    /// Whether the table names nothing
    pub fn is_empty(&self) -> bool {
        self.directories.iter().all(|d| d.entries.is_empty())
    }

    /// Directory records in index order
    pub fn directories(&self) -> &[Directory] {
        &self.directories
    }

    /// Resolve a `/`-separated path to a file id
    pub fn file_id(&self, path: &str) -> Option<u16> {
        let path = path.trim_start_matches('/');
        let (file_name, dirs) = match path.rsplit_once('/') {
            Some((dirs, file)) => (file, Some(dirs)),
            None => (path, None),
        };

        let mut dir = 0;
        if let Some(dirs) = dirs {
            for segment in dirs.split('/') {
                dir = self.directories.get(dir)?.subdirectory(segment)?;
            }
        }

        let directory = self.directories.get(dir)?;
        let position = directory.file_position(file_name)?;
        u16::try_from(usize::from(directory.first_file_id) + position).ok()
    }

    /// Every named file as `(id, path)`, sorted by id
    pub fn paths(&self) -> Vec<(u16, String)> {
        let mut out = Vec::new();
        let mut visited = vec![false; self.directories.len()];
        let mut stack = vec![(0usize, String::new())];

        while let Some((index, prefix)) = stack.pop() {
            let Some(directory) = self.directories.get(index) else {
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                log::warn!("Name table directory {} is referenced more than once", index);
                continue;
            }

            let mut file_id = u32::from(directory.first_file_id);
            for entry in &directory.entries {
                match entry {
                    DirEntry::File(name) => {
                        if let Ok(id) = u16::try_from(file_id) {
                            out.push((id, format!("{}{}", prefix, name)));
                        }
                        file_id += 1;
                    }
                    DirEntry::Directory { name, id } => {
                        stack.push((directory_index(*id), format!("{}{}/", prefix, name)));
                    }
                }
            }
        }

        out.sort_by_key(|(id, _)| *id);
        out
    }
}

fn check_directory_id(id: u16, dir_count: usize) -> Result<()> {
    if id & 0xF000 != ROOT_DIRECTORY_ID || directory_index(id) >= dir_count {
        return Err(Error::malformed(format!(
            "directory id 0x{:04X} outside {} directories",
            id, dir_count
        )));
    }
    Ok(())
}

fn parse_sub_table(data: &[u8], offset: usize, dir_count: usize) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    let mut pos = offset;

    loop {
        let kind = u8_at(data, pos, "sub-table entry")?;
        pos += 1;
        if kind == 0 {
            break;
        }
        if kind == 0x80 {
            return Err(Error::malformed(format!(
                "reserved sub-table length byte 0x80 at 0x{:X}",
                pos - 1
            )));
        }

        let len = usize::from(kind & 0x7F);
        let name = String::from_utf8_lossy(slice_at(data, pos, len, "entry name")?).into_owned();
        pos += len;

        if kind & 0x80 == 0 {
            entries.push(DirEntry::File(name));
        } else {
            let id = u16_at(data, pos, "subdirectory id")?;
            pos += 2;
            check_directory_id(id, dir_count)?;
            if directory_index(id) == 0 {
                return Err(Error::malformed(format!(
                    "directory '{}' refers back to the root",
                    name
                )));
            }
            entries.push(DirEntry::Directory { name, id });
        }
    }

    Ok(entries)
}

fn validate_name(name: &str, path: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name(format!("empty segment in '{}'", path)));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid_name(format!(
            "segment of {} bytes in '{}' exceeds {}",
            name.len(),
            path,
            MAX_NAME_LEN
        )));
    }
    if name.bytes().any(|b| b == 0) {
        return Err(Error::invalid_name(format!("NUL byte in '{}'", path)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_unnamed_table() {
        let table = FileNameTable::default();
        assert!(table.is_empty());
        let bytes = table.to_bytes();
        assert_eq!(bytes, vec![4, 0, 0, 0, 0, 0, 1, 0]);

        let parsed = FileNameTable::parse(&bytes).unwrap();
        assert!(parsed.is_empty());
        assert!(parsed.paths().is_empty());
    }

    #[test]
    fn test_flat_names() {
        let table = FileNameTable::build(&["a", "b", "c.bin"], 0).unwrap();
        let bytes = table.to_bytes();
        assert_eq!(
            bytes,
            vec![
                8, 0, 0, 0, 0, 0, 1, 0, // root record
                1, b'a', 1, b'b', 5, b'c', b'.', b'b', b'i', b'n', 0,
            ]
        );

        let parsed = FileNameTable::parse(&bytes).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(parsed.file_id("c.bin"), Some(2));
        assert_eq!(parsed.file_id("missing"), None);
    }

    #[test]
    fn test_nested_directories() {
        let paths = ["root.txt", "data/one.bin", "data/two.bin", "data/deep/x"];
        let table = FileNameTable::build(&paths, 0x40).unwrap();
        let parsed = FileNameTable::parse(&table.to_bytes()).unwrap();

        assert_eq!(parsed.directories().len(), 3);
        assert_eq!(parsed.file_id("data/two.bin"), Some(0x42));
        assert_eq!(parsed.file_id("/data/deep/x"), Some(0x43));
        assert_eq!(parsed.file_id("data"), None);

        let listed: Vec<String> = parsed.paths().into_iter().map(|(_, p)| p).collect();
        assert_eq!(listed, paths.to_vec());
    }

    #[test]
    fn test_build_rejects_non_contiguous_directory() {
        let err = FileNameTable::build(&["d/a", "top", "d/b"], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }

    #[test]
    fn test_build_rejects_bad_names() {
        assert!(FileNameTable::build(&["", "x"], 0).is_err());
        assert!(FileNameTable::build(&["x", "x"], 0).is_err());
        assert!(FileNameTable::build(&["a//b"], 0).is_err());
        assert!(FileNameTable::build(&["n".repeat(128)], 0).is_err());
        assert!(FileNameTable::build(&["d", "d/x"], 0).is_err());
    }

    #[test]
    fn test_parse_rejects_reserved_length_byte() {
        let bytes = vec![8, 0, 0, 0, 0, 0, 1, 0, 0x80, 0];
        assert!(matches!(
            FileNameTable::parse(&bytes),
            Err(Error::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_directory_id() {
        // Root lists a subdirectory with id 0xF005 but only one record exists
        let bytes = vec![8, 0, 0, 0, 0, 0, 1, 0, 0x81, b'd', 0x05, 0xF0, 0];
        assert!(FileNameTable::parse(&bytes).is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_table() {
        let table = FileNameTable::build(&["alpha", "beta"], 0).unwrap();
        let bytes = table.to_bytes();
        assert!(FileNameTable::parse(&bytes[..bytes.len() - 3]).is_err());
        assert!(FileNameTable::parse(&bytes[..4]).is_err());
    }
}
