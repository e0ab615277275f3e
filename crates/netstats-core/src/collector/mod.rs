//! Filesystem-backed collectors for network traffic counters.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │        LegacyTables          │   │         SysfsSource          │
//! │ /proc/net/xt_qtaguid/        │   │ /sys/class/net/*/statistics  │
//! │   iface_stat_fmt, stats      │   │   (crate::source)            │
//! └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                └───────────────┬──────────────────┘
//!                         ┌──────▼──────┐
//!                         │  FileSystem │ (trait)
//!                         └──────┬──────┘
//!                 ┌──────────────┴──────────────┐
//!          ┌──────▼──────┐               ┌──────▼──────┐
//!          │   RealFs    │               │   MockFs    │
//!          └─────────────┘               └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use netstats_core::collector::{LegacyTables, MockFs, TablePaths};
//!
//! let tables = LegacyTables::new(MockFs::qtaguid_device(), TablePaths::default());
//! let wlan0 = tables.parse_iface_stats(Some("wlan0")).unwrap();
//! assert_eq!(wlan0.rx_bytes, 150);
//! ```

pub mod legacy;
pub mod mock;
pub mod traits;

pub use legacy::{CollectError, LegacyTables, TablePaths};
pub use mock::MockFs;
pub use traits::{FileSystem, RealFs};
