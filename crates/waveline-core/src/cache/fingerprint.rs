//! Content fingerprints keying the result cache

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::AudioSamples;

/// Hex-encoded SHA-256 of a track's content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackFingerprint(String);

impl TrackFingerprint {
    /// Fingerprint decoded samples: sample rate, then little-endian f32 data
    pub fn from_samples(audio: &AudioSamples) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(audio.sample_rate().to_le_bytes());

        #[cfg(target_endian = "little")]
        hasher.update(bytemuck::cast_slice::<f32, u8>(audio.samples()));

        #[cfg(not(target_endian = "little"))]
        for sample in audio.samples() {
            hasher.update(sample.to_le_bytes());
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Fingerprint raw file bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for TrackFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
