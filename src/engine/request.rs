//! Synthesis and export requests
//!
//! A request is built once, at the moment the user asks for audio, and is
//! passed by value into the engine. Nothing in the engine reads form state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::export::ExportFormat;
use crate::engine::preview::PREVIEW_SECONDS;

/// Parameters for one call to the synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisRequest {
    left_frequency: f64,
    right_frequency: f64,
    duration_secs: f64,
    fade_enabled: bool,
    volume: f64,
}

impl SynthesisRequest {
    /// Create a new request
    ///
    /// # Arguments
    /// * `left_frequency` - Left channel frequency in Hz
    /// * `right_frequency` - Right channel frequency in Hz
    /// * `duration_secs` - Length of the rendered audio in seconds
    /// * `fade_enabled` - Apply 100ms linear fade-in/fade-out ramps
    /// * `volume` - Linear amplitude, nominally 0.0 to 1.0 (not enforced)
    pub fn new(
        left_frequency: f64,
        right_frequency: f64,
        duration_secs: f64,
        fade_enabled: bool,
        volume: f64,
    ) -> Self {
        Self {
            left_frequency,
            right_frequency,
            duration_secs,
            fade_enabled,
            volume,
        }
    }

    pub fn left_frequency(&self) -> f64 {
        self.left_frequency
    }

    pub fn right_frequency(&self) -> f64 {
        self.right_frequency
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn fade_enabled(&self) -> bool {
        self.fade_enabled
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Perceived beat frequency (|left - right|) in Hz
    pub fn beat_frequency(&self) -> f64 {
        beat_frequency(self.left_frequency, self.right_frequency)
    }
}

/// Absolute difference between the two ear frequencies
pub fn beat_frequency(left: f64, right: f64) -> f64 {
    (left - right).abs()
}

/// Export duration as entered on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Timecode {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Total length in seconds. Minutes and seconds are not required to be < 60.
    pub fn total_seconds(&self) -> f64 {
        self.hours as f64 * 3600.0 + self.minutes as f64 * 60.0 + self.seconds as f64
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h{:02}m{:02}s", self.hours, self.minutes, self.seconds)
    }
}

/// Everything needed to render and name an exported file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRequest {
    pub left_frequency: f64,
    pub right_frequency: f64,
    pub timecode: Timecode,
    pub volume: f64,
    pub fade_enabled: bool,
    pub format: ExportFormat,
}

impl ExportRequest {
    /// The synthesis parameters for this export
    pub fn synthesis(&self) -> SynthesisRequest {
        SynthesisRequest::new(
            self.left_frequency,
            self.right_frequency,
            self.timecode.total_seconds(),
            self.fade_enabled,
            self.volume,
        )
    }

    /// Deterministic output filename for this export
    pub fn filename(&self) -> String {
        crate::engine::export::derive_filename(
            self.left_frequency,
            self.right_frequency,
            self.timecode,
            self.volume,
            self.fade_enabled,
            self.format,
        )
    }
}

/// Parameters for a live preview; duration is fixed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewRequest {
    pub left_frequency: f64,
    pub right_frequency: f64,
    pub volume: f64,
    pub fade_enabled: bool,
}

impl PreviewRequest {
    /// The synthesis parameters for this preview, always [`PREVIEW_SECONDS`] long
    pub fn synthesis(&self) -> SynthesisRequest {
        SynthesisRequest::new(
            self.left_frequency,
            self.right_frequency,
            PREVIEW_SECONDS,
            self.fade_enabled,
            self.volume,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timecode_total_seconds() {
        assert_eq!(Timecode::new(0, 1, 0).total_seconds(), 60.0);
        assert_eq!(Timecode::new(1, 30, 15).total_seconds(), 5415.0);
        assert_eq!(Timecode::default().total_seconds(), 0.0);
    }

    #[test]
    fn test_timecode_display() {
        assert_eq!(Timecode::new(0, 1, 0).to_string(), "0h01m00s");
        assert_eq!(Timecode::new(12, 5, 9).to_string(), "12h05m09s");
    }

    #[test]
    fn test_beat_frequency_is_symmetric() {
        assert_eq!(beat_frequency(178.0, 175.0), 3.0);
        assert_eq!(beat_frequency(175.0, 178.0), 3.0);

        let request = SynthesisRequest::new(200.0, 210.5, 1.0, false, 0.5);
        assert_eq!(request.beat_frequency(), 10.5);
    }

    #[test]
    fn test_export_request_synthesis() {
        let export = ExportRequest {
            left_frequency: 178.0,
            right_frequency: 175.0,
            timecode: Timecode::new(0, 1, 30),
            volume: 0.5,
            fade_enabled: true,
            format: ExportFormat::Wav,
        };

        let synthesis = export.synthesis();
        assert_eq!(synthesis.duration_secs(), 90.0);
        assert_eq!(synthesis.left_frequency(), 178.0);
        assert_eq!(synthesis.right_frequency(), 175.0);
        assert!(synthesis.fade_enabled());
        assert_eq!(synthesis.volume(), 0.5);
    }

    #[test]
    fn test_preview_request_is_fixed_length() {
        let preview = PreviewRequest {
            left_frequency: 200.0,
            right_frequency: 210.0,
            volume: 0.3,
            fade_enabled: false,
        };

        let synthesis = preview.synthesis();
        assert_eq!(synthesis.duration_secs(), 3.0);
        assert_eq!(synthesis.volume(), 0.3);
        assert!(!synthesis.fade_enabled());
    }
}
