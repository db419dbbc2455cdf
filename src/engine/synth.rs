//! Dual-tone synthesizer
//!
//! Renders one sine wave per ear. The left and right channels are generated
//! independently from the same time axis; the only difference between them
//! is their frequency.
//!
//! Synthesis is pure: identical requests always yield bit-identical buffers.

use std::f64::consts::PI;

use log::debug;

use crate::engine::buffer::{frames_for_duration, StereoBuffer};
use crate::engine::envelope::{FadeEnvelope, FadePolicy};
use crate::engine::request::SynthesisRequest;

/// Synthesizer configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Synthesizer {
    fade_policy: FadePolicy,
}

impl Synthesizer {
    pub fn new(fade_policy: FadePolicy) -> Self {
        Self { fade_policy }
    }

    pub fn fade_policy(&self) -> FadePolicy {
        self.fade_policy
    }

    /// Render a request into a stereo buffer
    ///
    /// Produces `round(44100 * duration)` frames over the half-open interval
    /// `[0, duration)`. A zero or negative duration yields an empty buffer.
    /// Amplitude is `volume` with no clamping.
    pub fn synthesize(&self, request: &SynthesisRequest) -> StereoBuffer {
        let num_frames = frames_for_duration(request.duration_secs());
        if num_frames == 0 {
            return StereoBuffer::new();
        }

        let step = request.duration_secs() / num_frames as f64;
        let mut left = sine(request.left_frequency(), request.volume(), num_frames, step);
        let mut right = sine(request.right_frequency(), request.volume(), num_frames, step);

        if request.fade_enabled() {
            let envelope = FadeEnvelope::for_buffer(num_frames, self.fade_policy);
            envelope.apply(&mut left);
            envelope.apply(&mut right);
        }

        debug!(
            "Synthesized {} frames ({:.3}s): L={}Hz R={}Hz vol={} fade={}",
            num_frames,
            request.duration_secs(),
            request.left_frequency(),
            request.right_frequency(),
            request.volume(),
            request.fade_enabled()
        );

        StereoBuffer::from_channels(&left, &right)
    }
}

/// Render a request with the default fade policy
pub fn synthesize(request: &SynthesisRequest) -> StereoBuffer {
    Synthesizer::default().synthesize(request)
}

/// `volume * sin(2π f t)` for `t = i * step`
///
/// Time is computed from the sample index on every step rather than
/// accumulated, so phase error does not grow over multi-hour renders.
fn sine(frequency: f64, volume: f64, num_frames: usize, step: f64) -> Vec<f64> {
    let angular = 2.0 * PI * frequency;
    (0..num_frames)
        .map(|i| volume * (angular * (i as f64 * step)).sin())
        .collect()
}
