//! Fallback collector for the legacy `xt_qtaguid` proc tables.
//!
//! `parser` holds the pure line parsers and aggregators; `tables` does the
//! file I/O on top of them.

pub mod parser;
pub mod tables;

pub use parser::{IfaceRow, UidRow};
pub use tables::{CollectError, LegacyTables, TablePaths};
