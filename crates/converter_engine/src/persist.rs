use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// A download being written to a temp file next to its final name.
///
/// Nothing appears under the final name until `commit`; dropping an
/// uncommitted file removes the temp file.
pub struct PendingFile {
    tmp: NamedTempFile,
    target: PathBuf,
    written: u64,
}

impl PendingFile {
    pub fn create(dir: &Path, filename: &str) -> Result<Self, PersistError> {
        ensure_output_dir(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        Ok(Self {
            tmp,
            target: dir.join(filename),
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn commit(mut self) -> Result<PathBuf, PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        // Replace existing file if present so a re-download wins.
        if self.target.exists() {
            fs::remove_file(&self.target)?;
        }
        self.tmp
            .persist(&self.target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(self.target)
    }
}

/// Reduces a server-suggested file name to a safe, single path component.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(&['/', '\\'][..]).next().unwrap_or(name);
    let cleaned: String = last
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&[' ', '.'][..]);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_forbidden_chars() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\music\\My: Song?.mp3").as_deref(),
            Some("My_ Song_.mp3")
        );
        assert_eq!(sanitize_filename(" .. "), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn uncommitted_file_leaves_nothing_behind() {
        let temp = tempfile::TempDir::new().unwrap();
        {
            let mut pending = PendingFile::create(temp.path(), "song.mp3").unwrap();
            pending.write_chunk(b"partial").unwrap();
        }
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn commit_replaces_existing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("song.mp3"), "old").unwrap();

        let mut pending = PendingFile::create(temp.path(), "song.mp3").unwrap();
        pending.write_chunk(b"new ").unwrap();
        pending.write_chunk(b"data").unwrap();
        assert_eq!(pending.bytes_written(), 8);
        let path = pending.commit().unwrap();

        assert_eq!(path, temp.path().join("song.mp3"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "new data");
    }
}
