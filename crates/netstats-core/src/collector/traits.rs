//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the table parsers and the sysfs source work
//! with the real `/proc` and `/sys` trees on Linux and with in-memory
//! fixtures in tests.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Opens a file for buffered, line-oriented reading.
    ///
    /// # Returns
    /// A reader positioned at the start of the file, or an I/O error if the
    /// file cannot be opened.
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>>;

    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// A vector of paths to entries in the directory, or an I/O error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}
