//! Scripted primary source for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{PrimarySource, Probe};
use crate::stats::StatsValue;

/// A probe received by [`MockSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeCall {
    Total,
    InterfaceName(String),
    InterfaceIndex(i32),
    UserId(u32),
}

/// Primary source with canned answers. Anything not scripted is
/// unavailable. Every probe is recorded.
#[derive(Debug, Default)]
pub struct MockSource {
    total: Option<StatsValue>,
    by_name: HashMap<String, StatsValue>,
    by_index: HashMap<i32, StatsValue>,
    by_uid: HashMap<u32, StatsValue>,
    calls: Mutex<Vec<ProbeCall>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total(mut self, stats: StatsValue) -> Self {
        self.total = Some(stats);
        self
    }

    pub fn with_interface(mut self, name: &str, stats: StatsValue) -> Self {
        self.by_name.insert(name.to_string(), stats);
        self
    }

    pub fn with_interface_index(mut self, index: i32, stats: StatsValue) -> Self {
        self.by_index.insert(index, stats);
        self
    }

    pub fn with_user(mut self, uid: u32, stats: StatsValue) -> Self {
        self.by_uid.insert(uid, stats);
        self
    }

    /// Probes received so far, oldest first.
    pub fn calls(&self) -> Vec<ProbeCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, call: ProbeCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }
}

impl PrimarySource for MockSource {
    fn try_total(&self) -> Probe {
        self.record(ProbeCall::Total);
        self.total.into()
    }

    fn try_by_interface_name(&self, name: &str) -> Probe {
        self.record(ProbeCall::InterfaceName(name.to_string()));
        self.by_name.get(name).copied().into()
    }

    fn try_by_interface_index(&self, index: i32) -> Probe {
        self.record(ProbeCall::InterfaceIndex(index));
        self.by_index.get(&index).copied().into()
    }

    fn try_by_user_id(&self, uid: u32) -> Probe {
        self.record(ProbeCall::UserId(uid));
        self.by_uid.get(&uid).copied().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_scripted() {
        let stats = StatsValue::new(1, 2, 3, 4);
        let source = MockSource::new()
            .with_interface("wlan0", stats)
            .with_user(1000, stats);

        assert_eq!(source.try_by_interface_name("wlan0"), Probe::Hit(stats));
        assert_eq!(source.try_by_interface_name("eth0"), Probe::Unavailable);
        assert_eq!(source.try_by_user_id(1000), Probe::Hit(stats));
        assert_eq!(source.try_total(), Probe::Unavailable);

        assert_eq!(
            source.calls(),
            vec![
                ProbeCall::InterfaceName("wlan0".into()),
                ProbeCall::InterfaceName("eth0".into()),
                ProbeCall::UserId(1000),
                ProbeCall::Total,
            ]
        );
    }
}
