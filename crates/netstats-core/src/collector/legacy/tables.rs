//! Reader for the two `xt_qtaguid` tables under `/proc/net`.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::parser::{
    IfaceRow, UidRow, aggregate_iface_rows, aggregate_uid_rows, parse_iface_line, parse_uid_line,
};
use crate::collector::traits::FileSystem;
use crate::stats::StatsValue;

/// Line buffer size, terminator included. Longer lines are cut.
pub const MAX_LINE_LEN: usize = 384;

/// Error type for table reads.
#[derive(Debug)]
pub enum CollectError {
    /// The table could not be opened or read to the end.
    Io(std::io::Error),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Locations of the legacy tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    /// Per-interface totals (`iface_stat_fmt`).
    pub iface_stats: PathBuf,
    /// Per-uid, per-tag totals (`stats`).
    pub uid_stats: PathBuf,
}

impl TablePaths {
    /// Tables of the proc filesystem mounted at `proc_path`.
    pub fn under(proc_path: impl AsRef<Path>) -> Self {
        let base = proc_path.as_ref().join("net/xt_qtaguid");
        Self {
            iface_stats: base.join("iface_stat_fmt"),
            uid_stats: base.join("stats"),
        }
    }
}

impl Default for TablePaths {
    fn default() -> Self {
        Self::under("/proc")
    }
}

/// Reads one line, keeping at most `limit - 1` bytes of it.
///
/// The rest of an overlong line is consumed and dropped. Returns `None` at
/// end of input.
fn read_bounded_line<R: BufRead + ?Sized>(
    reader: &mut R,
    limit: usize,
) -> io::Result<Option<String>> {
    let keep = limit.saturating_sub(1);
    let mut line = Vec::new();
    let mut read_any = false;

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            break;
        }
        read_any = true;

        let (chunk, used, newline) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (&available[..pos], pos + 1, true),
            None => (available, available.len(), false),
        };
        let room = keep.saturating_sub(line.len());
        line.extend_from_slice(&chunk[..chunk.len().min(room)]);
        reader.consume(used);

        if newline {
            break;
        }
    }

    if !read_any {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

/// Iterator over the lines of a table, each cut to [`MAX_LINE_LEN`].
///
/// Stops after the first I/O error, which it yields.
pub struct BoundedLines<R> {
    reader: R,
    limit: usize,
    done: bool,
}

impl<R: BufRead> BoundedLines<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_LINE_LEN)
    }

    pub fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            reader,
            limit,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for BoundedLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_bounded_line(&mut self.reader, self.limit) {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads the legacy tables through a [`FileSystem`].
///
/// Every call opens, reads and closes the table again; nothing is cached.
pub struct LegacyTables<F: FileSystem> {
    fs: F,
    paths: TablePaths,
}

impl<F: FileSystem> LegacyTables<F> {
    /// Creates a reader for the tables at `paths`.
    pub fn new(fs: F, paths: TablePaths) -> Self {
        Self { fs, paths }
    }

    pub fn paths(&self) -> &TablePaths {
        &self.paths
    }

    /// Runs `consume` over the lines of the table at `path`.
    ///
    /// A read error part way through fails the whole call, so a half-read
    /// table is never passed off as complete.
    fn read_table<T>(
        &self,
        path: &Path,
        consume: impl FnOnce(&mut dyn Iterator<Item = String>) -> T,
    ) -> Result<T, CollectError> {
        let reader = self.fs.open(path)?;
        let mut error = None;
        let mut lines = BoundedLines::new(reader).map_while(|line| match line {
            Ok(line) => Some(line),
            Err(e) => {
                error = Some(e);
                None
            }
        });
        let value = consume(&mut lines);
        drop(lines);

        match error {
            Some(e) => {
                debug!(path = %path.display(), error = %e, "table read failed");
                Err(CollectError::Io(e))
            }
            None => Ok(value),
        }
    }

    /// Sums `iface_stat_fmt` rows for `iface`, or all rows when `None`.
    ///
    /// No matching row is not an error: the result is all zeros.
    pub fn parse_iface_stats(&self, iface: Option<&str>) -> Result<StatsValue, CollectError> {
        self.read_table(&self.paths.iface_stats, |lines| {
            aggregate_iface_rows(lines, iface)
        })
    }

    /// Sums the untagged `stats` rows of `uid`.
    pub fn parse_uid_stats(&self, uid: u32) -> Result<StatsValue, CollectError> {
        self.read_table(&self.paths.uid_stats, |lines| aggregate_uid_rows(lines, uid))
    }

    /// All well-formed `iface_stat_fmt` rows, in file order.
    pub fn iface_rows(&self) -> Result<Vec<IfaceRow>, CollectError> {
        self.read_table(&self.paths.iface_stats, |lines| {
            lines.filter_map(|line| parse_iface_line(&line)).collect()
        })
    }

    /// All well-formed `stats` rows, in file order.
    pub fn uid_rows(&self) -> Result<Vec<UidRow>, CollectError> {
        self.read_table(&self.paths.uid_stats, |lines| {
            lines.filter_map(|line| parse_uid_line(&line)).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::traits::RealFs;
    use std::io::Cursor;

    fn tables(fs: MockFs) -> LegacyTables<MockFs> {
        LegacyTables::new(fs, TablePaths::default())
    }

    #[test]
    fn test_table_paths() {
        let paths = TablePaths::default();
        assert_eq!(
            paths.iface_stats,
            PathBuf::from("/proc/net/xt_qtaguid/iface_stat_fmt")
        );
        assert_eq!(paths.uid_stats, PathBuf::from("/proc/net/xt_qtaguid/stats"));

        let paths = TablePaths::under("/tmp/capture");
        assert_eq!(
            paths.uid_stats,
            PathBuf::from("/tmp/capture/net/xt_qtaguid/stats")
        );
    }

    #[test]
    fn test_bounded_lines() {
        let lines: Vec<String> = BoundedLines::new(Cursor::new("a b\n\nc\r\nlast"))
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["a b", "", "c\r", "last"]);
    }

    #[test]
    fn test_bounded_lines_truncates() {
        let long = format!("{}\nnext\n", "x".repeat(1000));
        let lines: Vec<String> = BoundedLines::new(Cursor::new(long))
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), MAX_LINE_LEN - 1);
        assert_eq!(lines[1], "next");
    }

    #[test]
    fn test_bounded_lines_small_buffer() {
        // A tiny BufReader forces lines to span several fill_buf calls.
        let reader = std::io::BufReader::with_capacity(3, Cursor::new("abcdefgh\nij\n"));
        let lines: Vec<String> = BoundedLines::with_limit(reader, 6)
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["abcde", "ij"]);
    }

    #[test]
    fn test_parse_iface_stats_by_name() {
        let tables = tables(MockFs::qtaguid_device());
        assert_eq!(
            tables.parse_iface_stats(Some("wlan0")).unwrap(),
            StatsValue::new(150, 7, 200, 10)
        );
        assert_eq!(
            tables.parse_iface_stats(Some("rmnet0")).unwrap(),
            StatsValue::new(7000, 70, 3000, 30)
        );
    }

    #[test]
    fn test_parse_iface_stats_all() {
        let tables = tables(MockFs::qtaguid_device());
        assert_eq!(
            tables.parse_iface_stats(None).unwrap(),
            StatsValue::new(11246, 109, 7296, 72)
        );
    }

    #[test]
    fn test_parse_iface_stats_no_match_is_zero() {
        let tables = tables(MockFs::qtaguid_device());
        assert_eq!(
            tables.parse_iface_stats(Some("eth9")).unwrap(),
            StatsValue::default()
        );
    }

    #[test]
    fn test_parse_iface_stats_missing_table() {
        let tables = tables(MockFs::new());
        let err = tables.parse_iface_stats(None).unwrap_err();
        assert!(matches!(err, CollectError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn test_parse_iface_stats_read_failure() {
        let mut fs = MockFs::new();
        fs.add_broken_file("/proc/net/xt_qtaguid/iface_stat_fmt", "wlan0 1 2 3 4\n");
        assert!(tables(fs).parse_iface_stats(Some("wlan0")).is_err());
    }

    #[test]
    fn test_parse_iface_stats_overlong_line() {
        let mut fs = MockFs::new();
        let padding = " 0".repeat(300);
        // Totals survive the cut; the rest of the line is dropped.
        let content = format!(
            "wlan0 1 1 1 1{pad}\n{name} 9 9 9 9\nwlan0 2 2 2 2\n",
            pad = padding,
            name = format!("{}wlan0", " ".repeat(400)),
        );
        fs.add_file("/proc/net/xt_qtaguid/iface_stat_fmt", content);
        assert_eq!(
            tables(fs).parse_iface_stats(Some("wlan0")).unwrap(),
            StatsValue::new(3, 3, 3, 3)
        );
    }

    #[test]
    fn test_parse_uid_stats() {
        let tables = tables(MockFs::qtaguid_device());
        assert_eq!(
            tables.parse_uid_stats(1000).unwrap(),
            StatsValue::new(45, 5, 67, 7)
        );
        assert_eq!(tables.parse_uid_stats(31337).unwrap(), StatsValue::default());
    }

    #[test]
    fn test_parse_uid_stats_missing_table() {
        let mut fs = MockFs::qtaguid_device();
        fs.remove_file("/proc/net/xt_qtaguid/stats");
        assert!(tables(fs).parse_uid_stats(1000).is_err());
    }

    #[test]
    fn test_rows() {
        let tables = tables(MockFs::qtaguid_device());
        let iface_rows = tables.iface_rows().unwrap();
        assert_eq!(iface_rows.len(), 4);
        assert_eq!(iface_rows[1].iface, "wlan0");
        assert_eq!(iface_rows[1].tcp_rx_packets, Some(4));

        let uid_rows = tables.uid_rows().unwrap();
        assert_eq!(uid_rows.len(), 6);
        assert_eq!(uid_rows[3].tag, 0x5_0000_0000);
    }

    #[test]
    fn test_real_fs_tables() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("net/xt_qtaguid");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(
            base.join("iface_stat_fmt"),
            "ifname total_skb_rx_bytes\nwlan0 100 5 200 10\nwlan0 notanumber\nwlan0 50 2 0 0\n",
        )
        .unwrap();
        std::fs::write(
            base.join("stats"),
            "1 wlan0 0x0 1000 0 10 1 1 1\n2 wlan0 0x5 1000 0 999 1 1 1\n",
        )
        .unwrap();

        let tables = LegacyTables::new(RealFs::new(), TablePaths::under(dir.path()));
        assert_eq!(tables.parse_iface_stats(Some("wlan0")).unwrap().rx_bytes, 150);
        assert_eq!(tables.parse_uid_stats(1000).unwrap().rx_bytes, 10);
    }
}
