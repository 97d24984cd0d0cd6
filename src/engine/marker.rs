//! The marker index: structural events on a timeline's time axis.
//!
//! Each marker records which entities first appear and which cease at one
//! instant. The ordered map keeps marker times unique and strictly ordered
//! by construction; neighbor queries are range scans. Markers are created
//! lazily on first registration and never deleted.

use crate::engine::entity::Child;
use crate::time::Ms;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

#[derive(Default)]
pub(crate) struct Marker {
    pub start_entities: Vec<Child>,
    pub end_entities: Vec<Child>,
}

#[derive(Default)]
pub(crate) struct MarkerIndex {
    markers: BTreeMap<Ms, Marker>,
}

impl MarkerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, time: Ms) -> Option<&Marker> {
        self.markers.get(&time)
    }

    /// Record an entity appearing at `time`. The caller guarantees
    /// at-most-once registration per entity.
    pub fn register_start(&mut self, time: Ms, child: Child) {
        self.markers
            .entry(time)
            .or_default()
            .start_entities
            .push(child);
    }

    /// Record an entity ceasing at `time`.
    pub fn register_end(&mut self, time: Ms, child: Child) {
        self.markers
            .entry(time)
            .or_default()
            .end_entities
            .push(child);
    }

    /// Nearest marker time strictly past `time` in the traversal direction.
    pub fn next_after(&self, time: Ms, forward: bool) -> Option<Ms> {
        if forward {
            self.markers
                .range((Excluded(time), Unbounded))
                .next()
                .map(|(t, _)| *t)
        } else {
            self.markers
                .range((Unbounded, Excluded(time)))
                .next_back()
                .map(|(t, _)| *t)
        }
    }

    /// Marker times in ascending order.
    pub fn times(&self) -> Vec<Ms> {
        self.markers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::entity::{Child, Delay};

    fn dummy(name: &str) -> Child {
        Child::leaf(Delay::new(name.to_string(), 16))
    }

    #[test]
    fn test_ordered_unique_times() {
        let mut index = MarkerIndex::new();
        index.register_start(32, dummy("a"));
        index.register_start(0, dummy("b"));
        index.register_end(32, dummy("c"));
        index.register_start(16, dummy("d"));

        assert_eq!(index.times(), vec![0, 16, 32]);
        assert_eq!(index.get(32).unwrap().start_entities.len(), 1);
        assert_eq!(index.get(32).unwrap().end_entities.len(), 1);
    }

    #[test]
    fn test_next_after() {
        let mut index = MarkerIndex::new();
        for t in [0, 16, 48] {
            index.register_start(t, dummy("x"));
        }
        assert_eq!(index.next_after(0, true), Some(16));
        assert_eq!(index.next_after(16, true), Some(48));
        assert_eq!(index.next_after(48, true), None);
        assert_eq!(index.next_after(48, false), Some(16));
        assert_eq!(index.next_after(1, false), Some(0));
        assert_eq!(index.next_after(0, false), None);
    }
}
