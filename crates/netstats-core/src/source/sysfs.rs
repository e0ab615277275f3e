//! Per-interface kernel counters from `/sys/class/net`.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::{PrimarySource, Probe};
use crate::collector::traits::FileSystem;
use crate::stats::StatsValue;

/// Reads `/sys/class/net/<iface>/statistics/*`.
///
/// Interface counters only; there is no per-uid accounting in sysfs, so
/// uid probes are always unavailable.
pub struct SysfsSource<F: FileSystem> {
    fs: F,
    class_net: PathBuf,
}

impl<F: FileSystem> SysfsSource<F> {
    /// Source rooted at the sysfs mount `sys_path` (usually "/sys").
    pub fn new(fs: F, sys_path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            class_net: sys_path.as_ref().join("class/net"),
        }
    }

    fn read_value(&self, path: &Path) -> Option<u64> {
        match self.fs.read_to_string(path) {
            Ok(content) => content.trim().parse().ok(),
            Err(e) => {
                trace!(path = %path.display(), error = %e, "sysfs read failed");
                None
            }
        }
    }

    /// Reads all four counters of the interface directory `dir`.
    fn read_interface(&self, dir: &Path) -> Option<StatsValue> {
        let stats = dir.join("statistics");
        Some(StatsValue {
            rx_bytes: self.read_value(&stats.join("rx_bytes"))?,
            rx_packets: self.read_value(&stats.join("rx_packets"))?,
            tx_bytes: self.read_value(&stats.join("tx_bytes"))?,
            tx_packets: self.read_value(&stats.join("tx_packets"))?,
        })
    }

    fn read_ifindex(&self, dir: &Path) -> Option<i32> {
        let content = self.fs.read_to_string(&dir.join("ifindex")).ok()?;
        content.trim().parse().ok()
    }

    fn interfaces(&self) -> Option<Vec<PathBuf>> {
        match self.fs.read_dir(&self.class_net) {
            Ok(mut dirs) => {
                dirs.sort();
                Some(dirs)
            }
            Err(e) => {
                debug!(path = %self.class_net.display(), error = %e, "cannot list interfaces");
                None
            }
        }
    }
}

/// Rejects names that would escape the class directory.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

impl<F: FileSystem> PrimarySource for SysfsSource<F> {
    /// Sums every interface that can be read, loopback included. Interfaces
    /// that vanish while being read are skipped.
    fn try_total(&self) -> Probe {
        let Some(dirs) = self.interfaces() else {
            return Probe::Unavailable;
        };

        let mut total = StatsValue::default();
        let mut read = 0;
        for dir in &dirs {
            if let Some(stats) = self.read_interface(dir) {
                total += stats;
                read += 1;
            }
        }

        if read == 0 {
            return Probe::Unavailable;
        }
        trace!(interfaces = read, "sysfs totals");
        Probe::Hit(total)
    }

    fn try_by_interface_name(&self, name: &str) -> Probe {
        if !is_valid_name(name) {
            return Probe::Unavailable;
        }
        self.read_interface(&self.class_net.join(name)).into()
    }

    fn try_by_interface_index(&self, index: i32) -> Probe {
        let Some(dirs) = self.interfaces() else {
            return Probe::Unavailable;
        };
        dirs.iter()
            .find(|dir| self.read_ifindex(dir) == Some(index))
            .and_then(|dir| self.read_interface(dir))
            .into()
    }

    fn try_by_user_id(&self, _uid: u32) -> Probe {
        Probe::Unavailable
    }
}
