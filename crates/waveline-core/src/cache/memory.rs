//! In-memory result cache for one app session

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{ResultCache, TrackFingerprint};
use crate::analysis::Timeline;
use crate::types::AudioSamples;

/// In-process [`ResultCache`]
///
/// Lives as long as the app session. A poisoned lock is treated as a miss
/// and writes to it are dropped.
#[derive(Default)]
pub struct MemoryCache {
    timelines: RwLock<HashMap<TrackFingerprint, Arc<Timeline>>>,
    waveforms: RwLock<HashMap<TrackFingerprint, AudioSamples>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything stored for `key`
    pub fn invalidate(&self, key: &TrackFingerprint) {
        if let Ok(mut timelines) = self.timelines.write() {
            timelines.remove(key);
        }
        if let Ok(mut waveforms) = self.waveforms.write() {
            waveforms.remove(key);
        }
    }

    pub fn timeline_count(&self) -> usize {
        self.timelines.read().map(|t| t.len()).unwrap_or(0)
    }
}

impl ResultCache for MemoryCache {
    fn get_fft(&self, key: &TrackFingerprint) -> Option<Arc<Timeline>> {
        self.timelines.read().ok()?.get(key).cloned()
    }

    fn put_fft(&self, key: &TrackFingerprint, timeline: Arc<Timeline>) {
        match self.timelines.write() {
            Ok(mut timelines) => {
                timelines.insert(key.clone(), timeline);
            }
            Err(_) => log::warn!("MemoryCache: timeline lock poisoned, dropping {}", key.short()),
        }
    }

    fn get_waveform(&self, key: &TrackFingerprint) -> Option<AudioSamples> {
        self.waveforms.read().ok()?.get(key).cloned()
    }

    fn put_waveform(&self, key: &TrackFingerprint, audio: AudioSamples) {
        match self.waveforms.write() {
            Ok(mut waveforms) => {
                waveforms.insert(key.clone(), audio);
            }
            Err(_) => log::warn!("MemoryCache: waveform lock poisoned, dropping {}", key.short()),
        }
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("timelines", &self.timeline_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TimelineEntry;
    use crate::types::Rgb;

    fn key(name: &str) -> TrackFingerprint {
        TrackFingerprint::from_bytes(name.as_bytes())
    }

    #[test]
    fn test_fft_roundtrip_and_invalidate() {
        let cache = MemoryCache::new();
        let timeline = Arc::new(Timeline::from_entries(vec![TimelineEntry {
            time_ms: 0.0,
            color: Rgb::RED,
        }]));

        assert!(cache.get_fft(&key("a")).is_none());
        cache.put_fft(&key("a"), timeline.clone());

        let hit = cache.get_fft(&key("a")).unwrap();
        assert!(Arc::ptr_eq(&hit, &timeline));
        assert!(cache.get_fft(&key("b")).is_none());
        assert_eq!(cache.timeline_count(), 1);

        cache.invalidate(&key("a"));
        assert!(cache.get_fft(&key("a")).is_none());
    }

    #[test]
    fn test_waveform_roundtrip() {
        let cache = MemoryCache::new();
        let audio = AudioSamples::new(vec![0.5f32; 8], 22050);
        cache.put_waveform(&key("a"), audio.clone());
        assert!(cache.get_waveform(&key("a")).unwrap().same_content(&audio));
    }
}
