use std::collections::BTreeMap;

/// Tiles drawn at the working order.
pub const TILES_DRAWN: &str = "tiles.drawn";
/// Ancestor tiles drawn in place of missing ones.
pub const TILES_FALLBACK: &str = "tiles.fallback";
/// Cells with nothing to show yet.
pub const TILES_MISSING: &str = "tiles.missing";
pub const TILES_REQUESTED: &str = "tiles.requested";
pub const TILES_LOADED: &str = "tiles.loaded";
pub const TILES_FAILED: &str = "tiles.failed";
pub const FRAMES_DRAWN: &str = "frames.drawn";
pub const WORKING_ORDER: &str = "view.order";
pub const VISIBLE_CELLS: &str = "view.visible_cells";

/// Viewer counters (monotonic) and gauges (last value wins).
///
/// Names are sorted so snapshots are stable across runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn add(&mut self, name: &'static str, by: u64) {
        if by > 0 {
            *self.counters.entry(name).or_insert(0) += by;
        }
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    /// Folds another set in: counters add up, gauges take the other side's value.
    pub fn merge(&mut self, other: &Metrics) {
        for (name, v) in &other.counters {
            self.add(*name, *v);
        }
        for (name, v) in &other.gauges {
            self.set_gauge(*name, *v);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counters_accumulate_and_skip_zero() {
        let mut m = Metrics::new();
        m.add(TILES_DRAWN, 2);
        m.add(TILES_DRAWN, 3);
        m.add(TILES_FAILED, 0);
        assert_eq!(m.counter(TILES_DRAWN), 5);
        assert_eq!(m.snapshot().counters, vec![(TILES_DRAWN, 5)]);
    }

    #[test]
    fn merge_adds_counters_and_replaces_gauges() {
        let mut total = Metrics::new();
        total.add(FRAMES_DRAWN, 1);
        total.set_gauge(WORKING_ORDER, 3);

        let mut frame = Metrics::new();
        frame.add(FRAMES_DRAWN, 1);
        frame.set_gauge(WORKING_ORDER, 5);
        total.merge(&frame);

        assert_eq!(total.counter(FRAMES_DRAWN), 2);
        assert_eq!(total.gauge(WORKING_ORDER), Some(5));
    }

    #[test]
    fn snapshot_is_sorted_by_name() {
        let mut m = Metrics::new();
        m.set_gauge(WORKING_ORDER, 4);
        m.set_gauge(VISIBLE_CELLS, 40);
        m.add(TILES_REQUESTED, 1);
        m.add(TILES_FALLBACK, 1);
        let snap = m.snapshot();
        assert_eq!(snap.counters, vec![(TILES_FALLBACK, 1), (TILES_REQUESTED, 1)]);
        assert_eq!(snap.gauges, vec![(WORKING_ORDER, 4), (VISIBLE_CELLS, 40)]);
    }
}
