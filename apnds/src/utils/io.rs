//! File and path utilities

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Read a whole file, naming it in the error
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write `data` to `path` through a temporary file in the same directory
///
/// Nothing appears at `path` unless every byte was written.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    temp_file.write_all(data)?;
    temp_file.flush()?;
    temp_file
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Simple wildcard pattern matching
pub fn matches_pattern(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() || pattern == "*" {
        return true;
    }

    let pattern_lower = pattern.to_lowercase();
    let text_lower = text.to_lowercase();

    if !pattern_lower.contains('*') {
        return text_lower.contains(&pattern_lower);
    }

    let parts: Vec<&str> = pattern_lower.split('*').collect();
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 && !text_lower.starts_with(part) {
            return false;
        }
        match text_lower[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    if let Some(last) = parts.last()
        && !last.is_empty()
        && !text_lower.ends_with(last)
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern("poketool/personal/pl_personal.narc", "*"));
        assert!(matches_pattern("poketool/personal/pl_personal.narc", "*.narc"));
        assert!(matches_pattern("poketool/personal/pl_personal.narc", "poketool/*"));
        assert!(matches_pattern("a/B.NARC", "*.narc"));
        assert!(matches_pattern("fielddata/encountdata", "encount"));
        assert!(!matches_pattern("arm9.bin", "*.narc"));
        assert!(!matches_pattern("arm9.bin", "data/*"));
    }

    #[test]
    fn test_write_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, b"payload").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"payload");

        let missing = dir.path().join("missing").join("out.bin");
        assert!(write_atomic(&missing, b"payload").is_err());
        assert!(!missing.exists());
    }
}
