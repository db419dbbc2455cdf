//! Stereo Buffer
//!
//! Holds the output of the synthesizer: interleaved (left, right) frames in
//! double precision at a fixed 44.1kHz rate. A buffer is owned by whichever
//! consumer requested it (exporter or previewer) and is dropped after one
//! export or playback cycle.

// ============================================================================
// Constants
// ============================================================================

/// Sample rate for all synthesized audio (44.1kHz)
pub const SAMPLE_RATE: u32 = 44100;

/// Number of channels in every buffer
pub const NUM_CHANNELS: usize = 2;

/// Left channel index
pub const LEFT: usize = 0;

/// Right channel index
pub const RIGHT: usize = 1;

/// Samples at or above this magnitude are treated as clipped
pub const CLIP_SAMPLE_THRESHOLD: f64 = 1.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f64::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Number of frames covering `duration_secs` at the fixed sample rate
///
/// Non-positive (or NaN) durations give zero frames.
pub fn frames_for_duration(duration_secs: f64) -> usize {
    let frames = (SAMPLE_RATE as f64 * duration_secs).round();
    if frames > 0.0 {
        frames as usize
    } else {
        0
    }
}

// ============================================================================
// Stereo Buffer
// ============================================================================

/// One stereo sample frame: `[left, right]`
pub type Frame = [f64; NUM_CHANNELS];

/// Ordered sequence of stereo frames sampled at [`SAMPLE_RATE`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StereoBuffer {
    frames: Vec<Frame>,
}

impl StereoBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer by pairing two equal-length channels into frames
    ///
    /// If the channels differ in length, the extra samples are dropped.
    pub fn from_channels(left: &[f64], right: &[f64]) -> Self {
        let frames = left
            .iter()
            .zip(right.iter())
            .map(|(&l, &r)| [l, r])
            .collect();
        Self { frames }
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / SAMPLE_RATE as f64
    }

    /// All frames in order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get the frame at `index`
    pub fn frame(&self, index: usize) -> Option<Frame> {
        self.frames.get(index).copied()
    }

    /// Iterate one channel's samples
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().map(move |frame| frame[channel])
    }

    /// Peak absolute sample value for a channel
    pub fn peak(&self, channel: usize) -> f64 {
        if channel >= NUM_CHANNELS {
            return 0.0;
        }
        self.channel(channel).map(f64::abs).fold(0.0_f64, f64::max)
    }

    /// RMS level in dB for a channel
    ///
    /// Returns -f64::INFINITY for empty or silent channels.
    pub fn rms_db(&self, channel: usize) -> f64 {
        if channel >= NUM_CHANNELS || self.frames.is_empty() {
            return f64::NEG_INFINITY;
        }

        let sum_sq: f64 = self.channel(channel).map(|s| s * s).sum();
        let rms = (sum_sq / self.frames.len() as f64).sqrt();
        linear_to_db(rms)
    }

    /// Ratio of samples (both channels) at or beyond full scale
    pub fn clipping_ratio(&self) -> f64 {
        if self.frames.is_empty() {
            return 0.0;
        }

        let clipped = self
            .frames
            .iter()
            .flat_map(|frame| frame.iter())
            .filter(|&&s| s.abs() >= CLIP_SAMPLE_THRESHOLD)
            .count();
        clipped as f64 / (self.frames.len() * NUM_CHANNELS) as f64
    }
}
