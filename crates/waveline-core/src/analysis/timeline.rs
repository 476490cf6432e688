//! Track timelines and nearest-sample lookup
//!
//! A [`Timeline`] is the precomputed (time, color) series for a whole track.
//! It is built once per track, published behind an `Arc`, and only read
//! afterwards.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Rgb;

/// One precomputed sample: window start time and its band-energy color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub time_ms: f64,
    pub color: Rgb,
}

/// Ordered (time, color) samples spanning a track
///
/// Entries are always non-decreasing in `time_ms`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Build from entries, sorting them by time if needed
    pub fn from_entries(mut entries: Vec<TimelineEntry>) -> Self {
        if !entries.windows(2).all(|w| w[0].time_ms <= w[1].time_ms) {
            log::debug!("Timeline entries out of order, sorting {} entries", entries.len());
            entries.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry closest in time to `time_ms`, in O(log n)
    ///
    /// When the query sits exactly halfway between two entries the earlier
    /// one wins.
    pub fn nearest(&self, time_ms: f64) -> Option<&TimelineEntry> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }

        let idx = self.entries.partition_point(|e| e.time_ms < time_ms);
        if idx == 0 {
            return self.entries.first();
        }
        if idx == len {
            return self.entries.last();
        }

        let before = &self.entries[idx - 1];
        let after = &self.entries[idx];
        if after.time_ms - time_ms < time_ms - before.time_ms {
            Some(after)
        } else {
            Some(before)
        }
    }

    /// Color of the nearest entry
    pub fn color_at(&self, time_ms: f64) -> Option<Rgb> {
        self.nearest(time_ms).map(|e| e.color)
    }
}

/// Where a track's timeline stands
///
/// "Computed but empty" is distinct from "not computed": a track shorter
/// than one analysis window legitimately has an empty timeline and must not
/// be precomputed again, while still falling back to on-the-fly coloring.
#[derive(Debug, Clone, Default)]
pub enum TimelineState {
    /// Not computed yet, in flight, or failed
    #[default]
    NotComputed,
    /// Computed, zero entries
    Empty,
    /// Computed, at least one entry
    Ready(Arc<Timeline>),
}

impl TimelineState {
    /// Wrap a finished timeline in the matching state
    pub fn from_timeline(timeline: Arc<Timeline>) -> Self {
        if timeline.is_empty() {
            TimelineState::Empty
        } else {
            TimelineState::Ready(timeline)
        }
    }

    pub fn is_computed(&self) -> bool {
        !matches!(self, TimelineState::NotComputed)
    }

    /// The timeline if it has entries to look colors up in
    pub fn timeline(&self) -> Option<&Arc<Timeline>> {
        match self {
            TimelineState::Ready(timeline) => Some(timeline),
            _ => None,
        }
    }
}
