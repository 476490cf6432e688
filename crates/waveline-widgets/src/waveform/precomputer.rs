//! Background whole-track timeline precompute
//!
//! Single-flight per track: asking again for the track already in flight is
//! a no-op, asking for a different track supersedes it. Every job carries
//! the generation it was launched under and [`TrackPrecomputer::poll`] drops
//! anything from an older generation.
//!
//! The job checks the [`ResultCache`] before computing and stores what it
//! computes, so reloading a track is a cache hit.

use std::sync::Arc;
use std::time::Instant;

use waveline_core::analysis::{precompute_timeline, BandClassifier, SpectralAnalyzer, Timeline};
use waveline_core::cache::{ResultCache, TrackFingerprint};
use waveline_core::{AudioSamples, VisualizationError};

use crate::worker::{JobPoll, PendingJob, WorkerPool};

/// A finished precompute for the current generation
#[derive(Debug)]
pub enum PrecomputeEvent {
    Ready {
        generation: u64,
        timeline: Arc<Timeline>,
    },
    Failed {
        generation: u64,
        error: VisualizationError,
    },
}

struct InFlight {
    generation: u64,
    audio: AudioSamples,
    job: PendingJob<Arc<Timeline>>,
}

pub struct TrackPrecomputer {
    pool: Arc<WorkerPool>,
    analyzer: Option<Arc<dyn SpectralAnalyzer>>,
    cache: Option<Arc<dyn ResultCache>>,
    classifier: Arc<BandClassifier>,
    window_size: usize,
    generation: u64,
    launches: u64,
    in_flight: Option<InFlight>,
}

impl TrackPrecomputer {
    pub fn new(
        pool: Arc<WorkerPool>,
        analyzer: Option<Arc<dyn SpectralAnalyzer>>,
        cache: Option<Arc<dyn ResultCache>>,
        classifier: Arc<BandClassifier>,
        window_size: usize,
    ) -> Self {
        Self {
            pool,
            analyzer,
            cache,
            classifier,
            window_size,
            generation: 0,
            launches: 0,
            in_flight: None,
        }
    }

    /// Current generation; results tagged with anything else are stale
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Jobs launched so far
    pub fn launches(&self) -> u64 {
        self.launches
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start precomputing `audio` unless that track is already in flight
    ///
    /// Returns the generation of the launched job.
    pub fn request(&mut self, audio: &AudioSamples) -> Option<u64> {
        if let Some(in_flight) = &self.in_flight {
            if in_flight.audio.same_content(audio) {
                log::debug!("Precompute already in flight (generation {}), ignoring", in_flight.generation);
                return None;
            }
            log::debug!("Precompute generation {} superseded", in_flight.generation);
        }

        self.generation += 1;
        self.launches += 1;
        let generation = self.generation;

        let job_audio = audio.clone();
        let analyzer = self.analyzer.clone();
        let cache = self.cache.clone();
        let classifier = Arc::clone(&self.classifier);
        let window_size = self.window_size;

        log::info!(
            "Starting timeline precompute (generation {}, {:.1}s of audio)",
            generation,
            audio.duration_ms() / 1000.0
        );

        let job = self.pool.spawn_job("precompute", move || {
            let start = Instant::now();
            let key = cache.as_ref().map(|_| TrackFingerprint::from_samples(&job_audio));

            if let (Some(cache), Some(key)) = (&cache, &key) {
                if let Some(timeline) = cache.get_fft(key) {
                    log::info!("Timeline cache hit for {} ({} entries)", key.short(), timeline.len());
                    return Ok(timeline);
                }
            }

            let timeline = Arc::new(precompute_timeline(
                &job_audio,
                analyzer.as_deref(),
                &classifier,
                window_size,
            )?);

            if let (Some(cache), Some(key)) = (&cache, &key) {
                cache.put_fft(key, Arc::clone(&timeline));
            }

            log::info!(
                "Timeline precompute finished: {} entries in {:?}",
                timeline.len(),
                start.elapsed()
            );
            Ok(timeline)
        });

        self.in_flight = Some(InFlight {
            generation,
            audio: audio.clone(),
            job,
        });
        Some(generation)
    }

    /// Forget the in-flight job; its result will be discarded
    pub fn cancel(&mut self) {
        if self.in_flight.take().is_some() {
            self.generation += 1;
            log::debug!("Precompute cancelled, now at generation {}", self.generation);
        }
    }

    /// Non-blocking check for a finished job of the current generation
    pub fn poll(&mut self) -> Option<PrecomputeEvent> {
        let in_flight = self.in_flight.as_mut()?;
        let result = match in_flight.job.poll() {
            JobPoll::Pending => return None,
            JobPoll::Done(result) => result,
        };

        let generation = in_flight.generation;
        self.in_flight = None;

        if generation != self.generation {
            log::debug!("Discarding stale precompute result (generation {})", generation);
            return None;
        }

        Some(match result {
            Ok(timeline) => PrecomputeEvent::Ready { generation, timeline },
            Err(error) => PrecomputeEvent::Failed { generation, error },
        })
    }
}

impl std::fmt::Debug for TrackPrecomputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackPrecomputer")
            .field("generation", &self.generation)
            .field("launches", &self.launches)
            .field("busy", &self.is_busy())
            .field("window_size", &self.window_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use waveline_core::analysis::{RealFftAnalyzer, NEUTRAL_COLOR};
    use waveline_core::cache::MemoryCache;

    fn precomputer(cache: Option<Arc<dyn ResultCache>>) -> TrackPrecomputer {
        TrackPrecomputer::new(
            Arc::new(WorkerPool::new(2).unwrap()),
            Some(Arc::new(RealFftAnalyzer::new())),
            cache,
            Arc::new(BandClassifier::default()),
            2048,
        )
    }

    fn wait_for_event(pre: &mut TrackPrecomputer) -> PrecomputeEvent {
        for _ in 0..1000 {
            if let Some(event) = pre.poll() {
                return event;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("precompute never finished");
    }

    #[test]
    fn test_silence_precompute() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut pre = precomputer(None);
        let audio = AudioSamples::new(vec![0.0f32; 441_000], 44100);

        assert_eq!(pre.request(&audio), Some(1));
        match wait_for_event(&mut pre) {
            PrecomputeEvent::Ready { generation, timeline } => {
                assert_eq!(generation, 1);
                assert_eq!(timeline.len(), 428);
                assert!(timeline.entries().iter().all(|e| e.color == NEUTRAL_COLOR));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!pre.is_busy());
    }

    #[test]
    fn test_same_track_in_flight_is_ignored() {
        let mut pre = precomputer(None);
        let audio = AudioSamples::new(vec![0.0f32; 441_000], 44100);
        let copy = AudioSamples::new(audio.samples().to_vec(), 44100);

        assert_eq!(pre.request(&audio), Some(1));
        assert_eq!(pre.request(&copy), None);
        assert_eq!(pre.launches(), 1);
    }

    #[test]
    fn test_new_track_supersedes() {
        let mut pre = precomputer(None);
        let first = AudioSamples::new(vec![0.0f32; 441_000], 44100);
        let second = AudioSamples::new(vec![0.0f32; 8192], 44100);

        pre.request(&first);
        assert_eq!(pre.request(&second), Some(2));

        match wait_for_event(&mut pre) {
            PrecomputeEvent::Ready { generation, timeline } => {
                assert_eq!(generation, 2);
                assert_eq!(timeline.len(), 7);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancel_discards_result() {
        let mut pre = precomputer(None);
        pre.request(&AudioSamples::new(vec![0.0f32; 8192], 44100));
        pre.cancel();
        assert!(!pre.is_busy());
        std::thread::sleep(Duration::from_millis(50));
        assert!(pre.poll().is_none());
    }

    #[test]
    fn test_cache_hit_skips_compute() {
        let cache = Arc::new(MemoryCache::new());
        let audio = AudioSamples::new(vec![0.0f32; 8192], 44100);
        let key = TrackFingerprint::from_samples(&audio);
        let cached = Arc::new(Timeline::default());
        cache.put_fft(&key, Arc::clone(&cached));

        let mut pre = precomputer(Some(cache));
        pre.request(&audio);
        match wait_for_event(&mut pre) {
            PrecomputeEvent::Ready { timeline, .. } => assert!(Arc::ptr_eq(&timeline, &cached)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_result_is_stored_in_cache() {
        let cache = Arc::new(MemoryCache::new());
        let audio = AudioSamples::new(vec![0.0f32; 8192], 44100);

        let mut pre = precomputer(Some(cache.clone()));
        pre.request(&audio);
        wait_for_event(&mut pre);

        let stored = cache.get_fft(&TrackFingerprint::from_samples(&audio)).unwrap();
        assert_eq!(stored.len(), 7);
    }

    #[test]
    fn test_missing_analyzer_fails() {
        let mut pre = TrackPrecomputer::new(
            Arc::new(WorkerPool::new(1).unwrap()),
            None,
            None,
            Arc::new(BandClassifier::default()),
            2048,
        );
        pre.request(&AudioSamples::new(vec![0.0f32; 8192], 44100));
        match wait_for_event(&mut pre) {
            PrecomputeEvent::Failed { error, .. } => {
                assert_eq!(error, VisualizationError::AnalyzerUnavailable)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
