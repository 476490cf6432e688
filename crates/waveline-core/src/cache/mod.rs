//! Result cache seam
//!
//! Precomputed timelines and decoded waveforms are expensive, so the
//! pipeline asks a [`ResultCache`] before recomputing either. Entries are
//! keyed by a [`TrackFingerprint`] of the track's content, not its path, so
//! a renamed file still hits.

mod fingerprint;
mod memory;

pub use fingerprint::TrackFingerprint;
pub use memory::MemoryCache;

use std::sync::Arc;

use crate::analysis::Timeline;
use crate::error::Result;
use crate::types::AudioSamples;

/// Store for per-track analysis results
///
/// Implementations must be safe to call from worker threads. Failures are
/// the implementation's to log; a failed `get_*` is a miss.
pub trait ResultCache: Send + Sync {
    fn get_fft(&self, key: &TrackFingerprint) -> Option<Arc<Timeline>>;
    fn put_fft(&self, key: &TrackFingerprint, timeline: Arc<Timeline>);
    fn get_waveform(&self, key: &TrackFingerprint) -> Option<AudioSamples>;
    fn put_waveform(&self, key: &TrackFingerprint, audio: AudioSamples);
}

/// Decoded samples for `key`, decoding and caching them on a miss
pub fn cached_waveform<F>(cache: &dyn ResultCache, key: &TrackFingerprint, decode: F) -> Result<AudioSamples>
where
    F: FnOnce() -> Result<AudioSamples>,
{
    if let Some(audio) = cache.get_waveform(key) {
        log::debug!("cached_waveform: hit for {}", key.short());
        return Ok(audio);
    }

    let audio = decode()?;
    cache.put_waveform(key, audio.clone());
    log::debug!("cached_waveform: stored {} samples for {}", audio.len(), key.short());
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisualizationError;
    use std::cell::Cell;

    #[test]
    fn test_cached_waveform_decodes_once() {
        let cache = MemoryCache::new();
        let key = TrackFingerprint::from_bytes(b"track.flac contents");
        let decodes = Cell::new(0);

        let decode = || {
            decodes.set(decodes.get() + 1);
            Ok(AudioSamples::new(vec![0.25f32; 16], 44100))
        };

        let first = cached_waveform(&cache, &key, decode).unwrap();
        let second = cached_waveform(&cache, &key, decode).unwrap();

        assert_eq!(decodes.get(), 1);
        assert!(first.same_content(&second));
    }

    #[test]
    fn test_cached_waveform_does_not_store_failures() {
        let cache = MemoryCache::new();
        let key = TrackFingerprint::from_bytes(b"broken");

        let result = cached_waveform(&cache, &key, || Err(VisualizationError::EmptyInput));
        assert_eq!(result.unwrap_err(), VisualizationError::EmptyInput);
        assert!(cache.get_waveform(&key).is_none());
    }
}
