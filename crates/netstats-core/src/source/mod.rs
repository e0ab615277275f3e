//! Primary (fast path) sources of traffic counters.
//!
//! A primary source answers a query with an authoritative snapshot or says
//! it cannot. Unavailability is an ordinary outcome, not an error; the
//! dispatcher then falls back to the legacy tables where it can.

mod mock;
mod sysfs;

pub use mock::{MockSource, ProbeCall};
pub use sysfs::SysfsSource;

use crate::stats::StatsValue;

/// Outcome of one probe of a primary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Hit(StatsValue),
    Unavailable,
}

impl Probe {
    pub fn is_hit(&self) -> bool {
        matches!(self, Probe::Hit(_))
    }

    pub fn into_option(self) -> Option<StatsValue> {
        match self {
            Probe::Hit(stats) => Some(stats),
            Probe::Unavailable => None,
        }
    }
}

impl From<Option<StatsValue>> for Probe {
    fn from(value: Option<StatsValue>) -> Self {
        value.map_or(Probe::Unavailable, Probe::Hit)
    }
}

/// Fast kernel accounting mechanism, one probe per query shape.
///
/// Implementations must not retry internally and must not panic on missing
/// or garbled kernel data; both are `Probe::Unavailable`.
pub trait PrimarySource: Send + Sync {
    /// Totals over all interfaces.
    fn try_total(&self) -> Probe;

    /// Totals for the interface called `name`.
    fn try_by_interface_name(&self, name: &str) -> Probe;

    /// Totals for the interface with kernel index `index`.
    fn try_by_interface_index(&self, index: i32) -> Probe;

    /// Totals attributed to `uid`.
    fn try_by_user_id(&self, uid: u32) -> Probe;
}

impl<P: PrimarySource + ?Sized> PrimarySource for Box<P> {
    fn try_total(&self) -> Probe {
        (**self).try_total()
    }

    fn try_by_interface_name(&self, name: &str) -> Probe {
        (**self).try_by_interface_name(name)
    }

    fn try_by_interface_index(&self, index: i32) -> Probe {
        (**self).try_by_interface_index(index)
    }

    fn try_by_user_id(&self, uid: u32) -> Probe {
        (**self).try_by_user_id(uid)
    }
}

/// Source for systems without a primary accounting mechanism.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl PrimarySource for Unavailable {
    fn try_total(&self) -> Probe {
        Probe::Unavailable
    }

    fn try_by_interface_name(&self, _name: &str) -> Probe {
        Probe::Unavailable
    }

    fn try_by_interface_index(&self, _index: i32) -> Probe {
        Probe::Unavailable
    }

    fn try_by_user_id(&self, _uid: u32) -> Probe {
        Probe::Unavailable
    }
}
