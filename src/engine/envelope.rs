//! Linear fade envelope
//!
//! The envelope is derived from the buffer length, never stored. It ramps
//! 0 -> 1 over the first `F` samples of a channel and 1 -> 0 over the last
//! `F` samples, where `F = round(44100 * 0.1)`.

use serde::{Deserialize, Serialize};

use crate::engine::buffer::frames_for_duration;

/// Length of each fade ramp in seconds
pub const FADE_SECONDS: f64 = 0.1;

/// How to handle buffers too short to hold two non-overlapping ramps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadePolicy {
    /// Always use the full 100ms ramp. When the ramps overlap (buffer shorter
    /// than 200ms) both multiply the shared samples.
    #[default]
    Overlap,
    /// Shorten the ramp to at most half the buffer so ramps never share samples.
    Clamp,
}

impl FadePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FadePolicy::Overlap => "overlap",
            FadePolicy::Clamp => "clamp",
        }
    }

    /// Parses a policy from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "overlap" => Some(FadePolicy::Overlap),
            "clamp" => Some(FadePolicy::Clamp),
            _ => None,
        }
    }
}

impl std::fmt::Display for FadePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fade-in/fade-out ramp pair sized for one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeEnvelope {
    length: usize,
}

impl FadeEnvelope {
    /// Envelope with an explicit ramp length in samples
    pub fn with_length(length: usize) -> Self {
        Self { length }
    }

    /// Envelope for a channel of `num_frames` samples under `policy`
    pub fn for_buffer(num_frames: usize, policy: FadePolicy) -> Self {
        let full = frames_for_duration(FADE_SECONDS);
        let length = match policy {
            FadePolicy::Overlap => full,
            FadePolicy::Clamp => full.min(num_frames / 2),
        };
        Self { length }
    }

    /// Ramp length in samples
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Value of the ascending ramp at `index`
    ///
    /// Points are spaced evenly over [0, 1] including both endpoints. A
    /// single-point ramp is just `0.0`.
    pub fn ramp_value(&self, index: usize) -> f64 {
        if self.length <= 1 {
            0.0
        } else {
            index as f64 / (self.length - 1) as f64
        }
    }

    /// The ascending ramp (0 -> 1)
    pub fn fade_in(&self) -> Vec<f64> {
        (0..self.length).map(|i| self.ramp_value(i)).collect()
    }

    /// The descending ramp (1 -> 0), the reverse of [`fade_in`](Self::fade_in)
    pub fn fade_out(&self) -> Vec<f64> {
        let mut ramp = self.fade_in();
        ramp.reverse();
        ramp
    }

    /// Multiply one channel's samples by both ramps in place
    ///
    /// The fade-in covers the head and the fade-out covers the tail. Where
    /// they overlap the multiplications compose. A channel shorter than the
    /// ramp receives only as much of each ramp as fits, aligned so the first
    /// sample meets the start of the fade-in and the last sample meets the
    /// end of the fade-out.
    pub fn apply(&self, samples: &mut [f64]) {
        let n = samples.len();
        let span = self.length.min(n);

        for (i, sample) in samples[..span].iter_mut().enumerate() {
            *sample *= self.ramp_value(i);
        }

        // fade_out[F - 1 - k] == fade_in[k], so the tail is walked backwards
        for k in 0..span {
            samples[n - 1 - k] *= self.ramp_value(k);
        }
    }
}
