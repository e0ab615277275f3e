//! netstats-core — network traffic counters with a legacy fallback.
//!
//! Provides:
//! - `stats` — counter record, counter kinds, the unknown sentinel
//! - `source` — primary source contract and implementations (sysfs, mock)
//! - `collector` — legacy `xt_qtaguid` table parsing, filesystem abstraction
//! - `dispatcher` — the four queries (total, interface, interface index, uid)
//!
//! # Example
//!
//! ```
//! use netstats_core::collector::{MockFs, TablePaths};
//! use netstats_core::dispatcher::NetworkStats;
//! use netstats_core::source::Unavailable;
//! use netstats_core::stats::{StatsType, UNKNOWN};
//!
//! let stats = NetworkStats::new(Unavailable, MockFs::qtaguid_device(), TablePaths::default());
//! assert_eq!(stats.get_user_stat(1000, StatsType::RxBytes.code()), 45);
//! assert_eq!(stats.get_interface_index_stat(7, StatsType::RxBytes.code()), UNKNOWN);
//! ```

pub mod collector;
pub mod dispatcher;
pub mod source;
pub mod stats;

pub use dispatcher::{Lookup, NetworkStats};
pub use stats::{StatsType, StatsValue, UNKNOWN};
