//! Mock filesystem for testing collectors without real `/proc` or `/sys`.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
pub use scenarios::{IFACE_STAT_FMT, QTAGUID_STATS};
