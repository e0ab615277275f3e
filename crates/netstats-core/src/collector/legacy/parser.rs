//! Parsers for the legacy `xt_qtaguid` tables.
//!
//! These are pure functions over lines of text. A line that does not parse
//! is `None` and is skipped by the aggregators; it never aborts a read.

use serde::Serialize;
use tracing::trace;

use crate::stats::StatsValue;

/// Longest interface name accepted in either table.
pub const MAX_IFACE_LEN: usize = 31;

/// One parsed row of `iface_stat_fmt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IfaceRow {
    pub iface: String,
    #[serde(flatten)]
    pub stats: StatsValue,
    /// `rx_tcp_packets` column, when the row carries it.
    pub tcp_rx_packets: Option<u64>,
    /// `tx_tcp_packets` column, when the row carries it.
    pub tcp_tx_packets: Option<u64>,
}

/// One parsed row of `stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UidRow {
    pub idx: u32,
    pub iface: String,
    pub tag: u64,
    pub uid: u32,
    pub set: u32,
    #[serde(flatten)]
    pub stats: StatsValue,
}

fn parse_iface_name(token: &str) -> Option<&str> {
    (token.len() <= MAX_IFACE_LEN).then_some(token)
}

/// Parses an account tag such as `0x500000000`. The `0x` prefix is required.
fn parse_tag(token: &str) -> Option<u64> {
    let hex = token.strip_prefix("0x")?;
    u64::from_str_radix(hex, 16).ok()
}

fn parse_counters<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<StatsValue> {
    let mut next = || tokens.next()?.parse::<u64>().ok();
    Some(StatsValue {
        rx_bytes: next()?,
        rx_packets: next()?,
        tx_bytes: next()?,
        tx_packets: next()?,
    })
}

/// Parses one line of `iface_stat_fmt`.
///
/// Format:
/// ifname total_skb_rx_bytes total_skb_rx_packets total_skb_tx_bytes total_skb_tx_packets rx_tcp_bytes rx_tcp_packets ... tx_tcp_bytes tx_tcp_packets ...
///
/// Only the name and the four totals are required. The trailing columns are
/// read in order up to the first one that does not parse.
pub fn parse_iface_line(line: &str) -> Option<IfaceRow> {
    let mut tokens = line.split_whitespace();
    let iface = parse_iface_name(tokens.next()?)?;
    let stats = parse_counters(&mut tokens)?;

    // Columns after the totals, starting at rx_tcp_bytes.
    let rest: Vec<u64> = tokens.map_while(|t| t.parse().ok()).collect();

    Some(IfaceRow {
        iface: iface.to_string(),
        stats,
        tcp_rx_packets: rest.get(1).copied(),
        tcp_tx_packets: rest.get(7).copied(),
    })
}

/// Parses one line of `stats`.
///
/// Format:
/// idx iface acct_tag_hex uid_tag_int cnt_set rx_bytes rx_packets tx_bytes tx_packets [...]
///
/// All nine leading columns must parse; anything after them is ignored.
pub fn parse_uid_line(line: &str) -> Option<UidRow> {
    let mut tokens = line.split_whitespace();
    let idx = tokens.next()?.parse().ok()?;
    let iface = parse_iface_name(tokens.next()?)?;
    let tag = parse_tag(tokens.next()?)?;
    let uid = tokens.next()?.parse().ok()?;
    let set = tokens.next()?.parse().ok()?;
    let stats = parse_counters(&mut tokens)?;

    Some(UidRow {
        idx,
        iface: iface.to_string(),
        tag,
        uid,
        set,
        stats,
    })
}

/// Sums the counters of every row for `iface`, or of every row when `iface`
/// is `None`. Names are compared exactly.
pub fn aggregate_iface_rows<I, S>(lines: I, iface: Option<&str>) -> StatsValue
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut stats = StatsValue::default();
    for line in lines {
        let line = line.as_ref();
        let Some(row) = parse_iface_line(line) else {
            trace!(line, "skipping malformed iface_stat_fmt line");
            continue;
        };
        if iface.is_none_or(|name| name == row.iface) {
            stats += row.stats;
        }
    }
    stats
}

/// Sums the counters of every untagged row that belongs to `uid`.
///
/// Rows with a nonzero tag are attributed sub-totals of the untagged ones
/// and are left out.
pub fn aggregate_uid_rows<I, S>(lines: I, uid: u32) -> StatsValue
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut stats = StatsValue::default();
    for line in lines {
        let line = line.as_ref();
        let Some(row) = parse_uid_line(line) else {
            trace!(line, "skipping malformed stats line");
            continue;
        };
        if row.uid == uid && row.tag == 0 {
            stats += row.stats;
        }
    }
    stats
}
