//! File system and environment capabilities.
//!
//! Everything that touches the outside world goes through [`FileSystem`] and
//! [`Environment`], so the decoder and the resolvers can run against real
//! files or against an in-memory tree.

use memmap2::Mmap;
use normalize_path::NormalizePath;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

/// A readable, seekable byte source.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// File operations needed to resolve and inspect binaries.
pub trait FileSystem {
    /// Returns `true` if `path` names an existing regular file.
    fn exists(&self, path: &Path) -> bool;

    /// Opens `path` for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>>;

    /// Reads `path` as text, one entry per line.
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Returns the absolute, lexically normalized form of `path`.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Source of the directory search list.
pub trait Environment {
    /// Returns the list-separated search directories, if any are set.
    fn search_path(&self) -> Option<OsString>;
}

/// The real file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        let file = File::open(path)?;

        if file.metadata()?.len() == 0 {
            return Ok(Box::new(Cursor::new(Vec::new())));
        }

        // The handle can go once mapped; the map lives as long as the reader.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Box::new(Cursor::new(mmap)))
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        BufReader::new(File::open(path)?).lines().collect()
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        if path.is_absolute() {
            return Ok(path.normalize());
        }
        Ok(std::env::current_dir()?.join(path).normalize())
    }
}

/// Reads the search list from the `PATH` variable of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnvironment;

impl Environment for OsEnvironment {
    fn search_path(&self) -> Option<OsString> {
        std::env::var_os("PATH")
    }
}

/// A fixed search list, independent of the process environment.
#[derive(Debug, Default, Clone)]
pub struct StaticEnvironment {
    search_path: Option<OsString>,
}

impl StaticEnvironment {
    pub fn new(search_path: Option<OsString>) -> Self {
        Self { search_path }
    }
}

impl Environment for StaticEnvironment {
    fn search_path(&self) -> Option<OsString> {
        self.search_path.clone()
    }
}

/// An in-memory file tree.
///
/// Relative paths are taken against the configured working directory, both
/// when adding files and when looking them up.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    current_dir: PathBuf,
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryFileSystem {
    /// Creates an empty tree rooted at `current_dir`.
    pub fn new(current_dir: impl Into<PathBuf>) -> Self {
        Self {
            current_dir: current_dir.into(),
            files: HashMap::new(),
        }
    }

    /// Adds or replaces a file.
    pub fn add_file(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let key = self.full_path(path.as_ref());
        self.files.insert(key, contents.into());
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.normalize()
        } else {
            self.current_dir.join(path).normalize()
        }
    }

    fn contents(&self, path: &Path) -> io::Result<&[u8]> {
        self.files
            .get(&self.full_path(path))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                )
            })
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&self.full_path(path))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        let data = self.contents(path)?.to_vec();
        Ok(Box::new(Cursor::new(data)))
    }

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let text = std::str::from_utf8(self.contents(path)?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(text.lines().map(str::to_owned).collect())
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(self.full_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_paths_are_relative_to_current_dir() {
        let mut fs = MemoryFileSystem::new("/work");
        fs.add_file("bin/tool.exe", b"MZ".to_vec());

        assert!(fs.exists(Path::new("/work/bin/tool.exe")));
        assert!(fs.exists(Path::new("bin/./tool.exe")));
        assert!(!fs.exists(Path::new("tool.exe")));
        assert_eq!(
            fs.absolute(Path::new("bin/../bin/tool.exe")).unwrap(),
            PathBuf::from("/work/bin/tool.exe")
        );
    }

    #[test]
    fn memory_read_lines_rejects_invalid_utf8() {
        let mut fs = MemoryFileSystem::new("/work");
        fs.add_file("bad.shim", vec![0xFF, 0xFE, b'\n']);

        let err = fs.read_lines(Path::new("bad.shim")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
