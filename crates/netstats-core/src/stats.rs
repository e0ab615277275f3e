//! Traffic counter record and counter selection.
//!
//! `StatsValue` is the one shape every data source fills in, whether it comes
//! from the kernel accounting source or from the legacy `xt_qtaguid` tables.

use serde::Serialize;

/// Value returned when no data source could answer a query.
///
/// Same bit pattern as `-1` on the caller side. It is a convention only:
/// callers must not treat it as a real reading.
pub const UNKNOWN: u64 = u64::MAX;

/// Aggregated traffic counters for one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsValue {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

impl StatsValue {
    /// Creates a record from the four counters.
    pub fn new(rx_bytes: u64, rx_packets: u64, tx_bytes: u64, tx_packets: u64) -> Self {
        Self {
            rx_bytes,
            rx_packets,
            tx_bytes,
            tx_packets,
        }
    }

    /// Adds every counter of `other` into `self`.
    ///
    /// Wraps on overflow; a corrupt table must not bring the caller down.
    pub fn accumulate(&mut self, other: &StatsValue) {
        self.rx_bytes = self.rx_bytes.wrapping_add(other.rx_bytes);
        self.rx_packets = self.rx_packets.wrapping_add(other.rx_packets);
        self.tx_bytes = self.tx_bytes.wrapping_add(other.tx_bytes);
        self.tx_packets = self.tx_packets.wrapping_add(other.tx_packets);
    }

    /// Returns the counter selected by `kind`.
    pub fn get(&self, kind: StatsType) -> u64 {
        match kind {
            StatsType::RxBytes => self.rx_bytes,
            StatsType::RxPackets => self.rx_packets,
            StatsType::TxBytes => self.tx_bytes,
            StatsType::TxPackets => self.tx_packets,
        }
    }
}

impl std::ops::AddAssign for StatsValue {
    fn add_assign(&mut self, rhs: Self) {
        self.accumulate(&rhs);
    }
}

impl std::fmt::Display for StatsValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rx_bytes: {} rx_packets: {} tx_bytes: {} tx_packets: {}",
            self.rx_bytes, self.rx_packets, self.tx_bytes, self.tx_packets
        )
    }
}

/// Counter kind. The discriminants are the codes callers pass in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatsType {
    RxBytes = 0,
    RxPackets = 1,
    TxBytes = 2,
    TxPackets = 3,
}

impl StatsType {
    pub const ALL: [StatsType; 4] = [
        StatsType::RxBytes,
        StatsType::RxPackets,
        StatsType::TxBytes,
        StatsType::TxPackets,
    ];

    /// Caller-facing code of this kind.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Short lowercase name, as used in CLI output.
    pub fn name(self) -> &'static str {
        match self {
            StatsType::RxBytes => "rx_bytes",
            StatsType::RxPackets => "rx_packets",
            StatsType::TxBytes => "tx_bytes",
            StatsType::TxPackets => "tx_packets",
        }
    }
}

impl TryFrom<i32> for StatsType {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(StatsType::RxBytes),
            1 => Ok(StatsType::RxPackets),
            2 => Ok(StatsType::TxBytes),
            3 => Ok(StatsType::TxPackets),
            other => Err(other),
        }
    }
}

/// Extracts the counter named by the raw `kind` code.
///
/// Codes outside the four defined kinds yield [`UNKNOWN`].
pub fn select(stats: &StatsValue, kind: i32) -> u64 {
    match StatsType::try_from(kind) {
        Ok(kind) => stats.get(kind),
        Err(_) => UNKNOWN,
    }
}
