//! In-memory mock filesystem for testing without real `/proc` or `/sys`.
//!
//! `MockFs` simulates a filesystem in memory, so table parsing and source
//! selection can be tested on any platform and in CI.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Files that fail with an I/O error once their content is exhausted.
    broken: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds a file whose reader returns `content` and then an I/O error,
    /// as a table that goes away mid-read would.
    pub fn add_broken_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_file(&path, content);
        self.broken.insert(path);
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Removes a file, leaving its directory in place.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
        self.broken.remove(path.as_ref());
    }

    /// Adds one network interface under `<sys>/class/net/<name>/`.
    pub fn add_net_interface(
        &mut self,
        sys_path: &str,
        name: &str,
        ifindex: i32,
        counters: [u64; 4],
    ) {
        let base = PathBuf::from(format!("{}/class/net/{}", sys_path, name));
        self.add_dir(&base);
        self.add_file(base.join("ifindex"), format!("{}\n", ifindex));
        let stats = base.join("statistics");
        let names = ["rx_bytes", "rx_packets", "tx_bytes", "tx_packets"];
        for (file, value) in names.iter().zip(counters) {
            self.add_file(stats.join(file), format!("{}\n", value));
        }
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

/// Reader that always fails.
struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("simulated read failure"))
    }
}

fn not_found(what: &str, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found: {:?}", what, path),
    )
}

impl FileSystem for MockFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        let content = self
            .files
            .get(path)
            .ok_or_else(|| not_found("file", path))?;
        let cursor = Cursor::new(content.as_bytes());
        if self.broken.contains(path) {
            Ok(Box::new(BufReader::new(cursor.chain(BrokenReader))))
        } else {
            Ok(Box::new(cursor))
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.broken.contains(path) {
            return Err(io::Error::other("simulated read failure"));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("file", path))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(not_found("directory", path));
        }

        let mut entries = HashSet::new();

        // Direct children only
        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}
