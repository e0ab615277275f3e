//! Pre-built mock filesystem scenarios for testing.
//!
//! These provide realistic `xt_qtaguid` tables and `/sys/class/net` trees.

use super::filesystem::MockFs;

/// Interface table as printed by `iface_stat_fmt`, with a header line.
pub const IFACE_STAT_FMT: &str = "\
ifname total_skb_rx_bytes total_skb_rx_packets total_skb_tx_bytes total_skb_tx_packets rx_tcp_bytes rx_tcp_packets rx_udp_bytes rx_udp_packets rx_other_bytes rx_other_packets tx_tcp_bytes tx_tcp_packets tx_udp_bytes tx_udp_packets tx_other_bytes tx_other_packets
lo 4096 32 4096 32 4096 32 0 0 0 0 4096 32 0 0 0 0
wlan0 100 5 200 10 80 4 20 1 0 0 150 8 50 2 0 0
rmnet0 7000 70 3000 30 6000 60 1000 10 0 0 2500 25 500 5 0 0
wlan0 50 2 0 0 50 2 0 0 0 0 0 0 0 0 0 0
";

/// Uid table as printed by `stats`, with a header line.
pub const QTAGUID_STATS: &str = "\
idx iface acct_tag_hex uid_tag_int cnt_set rx_bytes rx_packets tx_bytes tx_packets rx_tcp_bytes rx_tcp_packets rx_udp_bytes rx_udp_packets rx_other_bytes rx_other_packets tx_tcp_bytes tx_tcp_packets tx_udp_bytes tx_udp_packets tx_other_bytes tx_other_packets
2 wlan0 0x0 0 0 500 5 600 6 500 5 0 0 0 0 600 6 0 0 0 0
3 wlan0 0x0 1000 0 10 1 20 2 10 1 0 0 0 0 20 2 0 0 0 0
4 wlan0 0x0 1000 1 30 3 40 4 30 3 0 0 0 0 40 4 0 0 0 0
5 wlan0 0x500000000 1000 0 999 9 999 9 999 9 0 0 0 0 999 9 0 0 0 0
6 rmnet0 0x0 1000 0 5 1 7 1 5 1 0 0 0 0 7 1 0 0 0 0
7 rmnet0 0x0 10005 0 123 4 456 7 123 4 0 0 0 0 456 7 0 0 0 0
";

#[allow(dead_code)]
impl MockFs {
    /// A device with both `xt_qtaguid` tables under `/proc` and no sysfs.
    ///
    /// Interface totals: `lo` 4096/32/4096/32, `wlan0` 150/7/200/10 (two
    /// rows), `rmnet0` 7000/70/3000/30. Uid 1000 untagged totals are
    /// 45/5/67/7; the tagged row for uid 1000 must never be counted.
    pub fn qtaguid_device() -> Self {
        let mut fs = Self::new();
        fs.add_file("/proc/net/xt_qtaguid/iface_stat_fmt", IFACE_STAT_FMT);
        fs.add_file("/proc/net/xt_qtaguid/stats", QTAGUID_STATS);
        fs
    }

    /// A device exposing per-interface counters under `/sys/class/net` only.
    ///
    /// `lo` (ifindex 1), `eth0` (ifindex 2) and `wlan0` (ifindex 7).
    pub fn sysfs_device() -> Self {
        let mut fs = Self::new();
        fs.add_net_interface("/sys", "lo", 1, [8192, 64, 8192, 64]);
        fs.add_net_interface("/sys", "eth0", 2, [987654321, 654321, 123456789, 456789]);
        fs.add_net_interface("/sys", "wlan0", 7, [1000, 10, 2000, 20]);
        fs
    }

    /// Both of the above in one tree.
    pub fn full_device() -> Self {
        let mut fs = Self::qtaguid_device();
        fs.add_net_interface("/sys", "lo", 1, [8192, 64, 8192, 64]);
        fs.add_net_interface("/sys", "wlan0", 7, [1000, 10, 2000, 20]);
        fs
    }
}
