//! Query surface: primary source first, legacy tables second, else unknown.
//!
//! ```text
//! query ──► PrimarySource ──Hit──────────────────────────► select(kind)
//!               │
//!          Unavailable
//!               │
//!               ▼                  (none for ifindex)
//!          LegacyTables ──Ok──────────────────────────────► select(kind)
//!               │
//!              Err ───────────────────────────────────────► UNKNOWN
//! ```

use tracing::debug;

use crate::collector::legacy::{CollectError, LegacyTables, TablePaths};
use crate::collector::traits::FileSystem;
use crate::source::{PrimarySource, Probe};
use crate::stats::{StatsValue, UNKNOWN, select};

/// Which tier answered a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The primary source had the answer.
    Primary(StatsValue),
    /// The primary source was unavailable; the legacy tables answered.
    Legacy(StatsValue),
    /// Neither could answer.
    Unknown,
}

impl Lookup {
    pub fn stats(&self) -> Option<&StatsValue> {
        match self {
            Lookup::Primary(stats) | Lookup::Legacy(stats) => Some(stats),
            Lookup::Unknown => None,
        }
    }

    /// Value of the counter `kind`, or [`UNKNOWN`].
    pub fn select(&self, kind: i32) -> u64 {
        self.stats().map_or(UNKNOWN, |stats| select(stats, kind))
    }

    /// Short name of the answering tier.
    pub fn tier(&self) -> &'static str {
        match self {
            Lookup::Primary(_) => "primary",
            Lookup::Legacy(_) => "legacy",
            Lookup::Unknown => "unknown",
        }
    }
}

/// Network statistics dispatcher.
///
/// Holds no mutable state: every query probes the primary source and, when
/// needed, re-reads a legacy table. Safe to share between threads.
pub struct NetworkStats<P: PrimarySource, F: FileSystem> {
    primary: P,
    legacy: LegacyTables<F>,
}

impl<P: PrimarySource, F: FileSystem> NetworkStats<P, F> {
    /// Creates a dispatcher over `primary` and the legacy tables at `paths`.
    pub fn new(primary: P, fs: F, paths: TablePaths) -> Self {
        Self {
            primary,
            legacy: LegacyTables::new(fs, paths),
        }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn legacy(&self) -> &LegacyTables<F> {
        &self.legacy
    }

    fn cascade(
        &self,
        query: &str,
        probe: Probe,
        fallback: impl FnOnce() -> Result<StatsValue, CollectError>,
    ) -> Lookup {
        if let Probe::Hit(stats) = probe {
            return Lookup::Primary(stats);
        }
        debug!(query, "primary source unavailable, reading legacy table");
        match fallback() {
            Ok(stats) => Lookup::Legacy(stats),
            Err(e) => {
                debug!(query, error = %e, "legacy table unavailable");
                Lookup::Unknown
            }
        }
    }

    /// Totals over all interfaces.
    pub fn total(&self) -> Lookup {
        self.cascade("total", self.primary.try_total(), || {
            self.legacy.parse_iface_stats(None)
        })
    }

    /// Totals for one interface. `None` is an absent name and resolves to
    /// `Unknown` without touching either source.
    pub fn interface(&self, iface: Option<&str>) -> Lookup {
        let Some(iface) = iface else {
            debug!("interface query without a name");
            return Lookup::Unknown;
        };
        self.cascade("interface", self.primary.try_by_interface_name(iface), || {
            self.legacy.parse_iface_stats(Some(iface))
        })
    }

    /// Totals for one interface index. The legacy tables are keyed by name,
    /// so there is no fallback.
    pub fn interface_index(&self, index: i32) -> Lookup {
        match self.primary.try_by_interface_index(index) {
            Probe::Hit(stats) => Lookup::Primary(stats),
            Probe::Unavailable => {
                debug!(index, "primary source unavailable for interface index");
                Lookup::Unknown
            }
        }
    }

    /// Untagged totals for one uid.
    pub fn user(&self, uid: u32) -> Lookup {
        self.cascade("user", self.primary.try_by_user_id(uid), || {
            self.legacy.parse_uid_stats(uid)
        })
    }

    /// Counter `kind` over all interfaces, or [`UNKNOWN`].
    pub fn get_total_stat(&self, kind: i32) -> u64 {
        self.total().select(kind)
    }

    /// Counter `kind` for the interface `iface`, or [`UNKNOWN`].
    pub fn get_interface_stat(&self, iface: Option<&str>, kind: i32) -> u64 {
        self.interface(iface).select(kind)
    }

    /// Counter `kind` for the interface with index `index`, or [`UNKNOWN`].
    pub fn get_interface_index_stat(&self, index: i32, kind: i32) -> u64 {
        self.interface_index(index).select(kind)
    }

    /// Counter `kind` for `uid`, or [`UNKNOWN`].
    pub fn get_user_stat(&self, uid: u32, kind: i32) -> u64 {
        self.user(uid).select(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::source::{MockSource, ProbeCall, SysfsSource, Unavailable};
    use crate::stats::StatsType;

    const RX_BYTES: i32 = StatsType::RxBytes as i32;
    const RX_PACKETS: i32 = StatsType::RxPackets as i32;
    const TX_BYTES: i32 = StatsType::TxBytes as i32;
    const TX_PACKETS: i32 = StatsType::TxPackets as i32;

    fn legacy_only(fs: MockFs) -> NetworkStats<Unavailable, MockFs> {
        NetworkStats::new(Unavailable, fs, TablePaths::default())
    }

    fn with_mock(source: MockSource, fs: MockFs) -> NetworkStats<MockSource, MockFs> {
        NetworkStats::new(source, fs, TablePaths::default())
    }

    #[test]
    fn test_interface_falls_back_to_legacy() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/net/xt_qtaguid/iface_stat_fmt",
            "wlan0 100 5 200 10\nwlan0 50 2 0 0\n",
        );
        let stats = legacy_only(fs);
        assert_eq!(stats.get_interface_stat(Some("wlan0"), RX_BYTES), 150);
        assert_eq!(stats.get_interface_stat(Some("wlan0"), RX_PACKETS), 7);
        assert_eq!(stats.get_interface_stat(Some("wlan0"), TX_BYTES), 200);
        assert_eq!(stats.get_interface_stat(Some("wlan0"), TX_PACKETS), 10);
    }

    #[test]
    fn test_malformed_line_does_not_abort() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/net/xt_qtaguid/iface_stat_fmt",
            "wlan0 100 5 200 10\nwlan0 notanumber\nwlan0 50 2 0 0\n",
        );
        assert_eq!(
            legacy_only(fs).get_interface_stat(Some("wlan0"), RX_BYTES),
            150
        );
    }

    #[test]
    fn test_user_excludes_tagged_rows() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/net/xt_qtaguid/stats",
            "2 wlan0 0x0 1000 0 10 1 0 0\n3 wlan0 0x5 1000 0 999 1 0 0\n",
        );
        assert_eq!(legacy_only(fs).get_user_stat(1000, RX_BYTES), 10);
    }

    #[test]
    fn test_interface_index_has_no_fallback() {
        let stats = with_mock(MockSource::new(), MockFs::full_device());
        assert_eq!(stats.get_interface_index_stat(7, TX_PACKETS), UNKNOWN);
        assert_eq!(stats.interface_index(7), Lookup::Unknown);
    }

    #[test]
    fn test_interface_index_primary_hit() {
        let wlan0 = StatsValue::new(1, 2, 3, 4);
        let stats = with_mock(
            MockSource::new().with_interface_index(7, wlan0),
            MockFs::new(),
        );
        assert_eq!(stats.get_interface_index_stat(7, TX_PACKETS), 4);
    }

    #[test]
    fn test_primary_hit_skips_legacy() {
        // Tables that would fail to read prove the fallback was never taken.
        let mut fs = MockFs::new();
        fs.add_broken_file("/proc/net/xt_qtaguid/iface_stat_fmt", "");
        fs.add_broken_file("/proc/net/xt_qtaguid/stats", "");

        let primary = StatsValue::new(1, 2, 3, 4);
        let stats = with_mock(
            MockSource::new()
                .with_total(primary)
                .with_interface("wlan0", primary)
                .with_user(1000, primary),
            fs,
        );

        assert_eq!(stats.total(), Lookup::Primary(primary));
        assert_eq!(stats.interface(Some("wlan0")), Lookup::Primary(primary));
        assert_eq!(stats.user(1000), Lookup::Primary(primary));
        assert_eq!(stats.get_user_stat(1000, TX_BYTES), 3);
    }

    #[test]
    fn test_primary_hit_preferred_over_legacy() {
        let primary = StatsValue::new(1, 1, 1, 1);
        let stats = with_mock(
            MockSource::new().with_interface("wlan0", primary),
            MockFs::qtaguid_device(),
        );
        assert_eq!(stats.get_interface_stat(Some("wlan0"), RX_BYTES), 1);
        assert_eq!(stats.get_interface_stat(Some("rmnet0"), RX_BYTES), 7000);
    }

    #[test]
    fn test_unavailable_everywhere_is_unknown() {
        let stats = legacy_only(MockFs::new());
        for kind in StatsType::ALL {
            assert_eq!(stats.get_total_stat(kind.code()), UNKNOWN);
            assert_eq!(stats.get_interface_stat(Some("wlan0"), kind.code()), UNKNOWN);
            assert_eq!(stats.get_interface_index_stat(1, kind.code()), UNKNOWN);
            assert_eq!(stats.get_user_stat(1000, kind.code()), UNKNOWN);
        }
    }

    #[test]
    fn test_read_failure_is_unknown() {
        let mut fs = MockFs::new();
        fs.add_broken_file("/proc/net/xt_qtaguid/iface_stat_fmt", "wlan0 1 1 1 1\n");
        let stats = legacy_only(fs);
        assert_eq!(stats.interface(Some("wlan0")), Lookup::Unknown);
    }

    #[test]
    fn test_absent_name_short_circuits() {
        let stats = with_mock(MockSource::new(), MockFs::qtaguid_device());
        assert_eq!(stats.get_interface_stat(None, RX_BYTES), UNKNOWN);
        assert!(stats.primary().calls().is_empty());
    }

    #[test]
    fn test_unknown_kind_is_unknown() {
        let stats = legacy_only(MockFs::qtaguid_device());
        assert_eq!(stats.get_total_stat(4), UNKNOWN);
        assert_eq!(stats.get_interface_stat(Some("wlan0"), -1), UNKNOWN);
        assert_eq!(stats.get_user_stat(1000, 99), UNKNOWN);
    }

    #[test]
    fn test_total_legacy() {
        let stats = legacy_only(MockFs::qtaguid_device());
        assert_eq!(
            stats.total(),
            Lookup::Legacy(StatsValue::new(11246, 109, 7296, 72))
        );
        assert_eq!(stats.total().tier(), "legacy");
    }

    #[test]
    fn test_no_match_is_zero_not_unknown() {
        let stats = legacy_only(MockFs::qtaguid_device());
        assert_eq!(stats.get_interface_stat(Some("eth9"), RX_BYTES), 0);
        assert_eq!(stats.get_user_stat(31337, TX_PACKETS), 0);
    }

    #[test]
    fn test_probe_order() {
        let stats = with_mock(MockSource::new(), MockFs::qtaguid_device());
        stats.get_total_stat(RX_BYTES);
        stats.get_interface_stat(Some("wlan0"), RX_BYTES);
        stats.get_interface_index_stat(3, RX_BYTES);
        stats.get_user_stat(1000, RX_BYTES);

        assert_eq!(
            stats.primary().calls(),
            vec![
                ProbeCall::Total,
                ProbeCall::InterfaceName("wlan0".into()),
                ProbeCall::InterfaceIndex(3),
                ProbeCall::UserId(1000),
            ]
        );
    }

    #[test]
    fn test_sysfs_with_legacy_fallback() {
        let fs = MockFs::full_device();
        let stats = NetworkStats::new(
            SysfsSource::new(fs.clone(), "/sys"),
            fs,
            TablePaths::default(),
        );

        // wlan0 is in sysfs, rmnet0 only in the legacy table, uids only there.
        assert_eq!(
            stats.interface(Some("wlan0")),
            Lookup::Primary(StatsValue::new(1000, 10, 2000, 20))
        );
        assert_eq!(
            stats.interface(Some("rmnet0")),
            Lookup::Legacy(StatsValue::new(7000, 70, 3000, 30))
        );
        assert_eq!(
            stats.user(1000),
            Lookup::Legacy(StatsValue::new(45, 5, 67, 7))
        );
        assert_eq!(stats.get_interface_index_stat(7, RX_PACKETS), 10);
    }

    #[test]
    fn test_shared_between_threads() {
        let stats = std::sync::Arc::new(legacy_only(MockFs::qtaguid_device()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = std::sync::Arc::clone(&stats);
                std::thread::spawn(move || stats.get_user_stat(1000, RX_BYTES))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 45);
        }
    }
}
