//! Audio Engine Module
//!
//! Core synthesis engine including:
//! - Synthesis and export requests
//! - Stereo buffer and level analysis
//! - Fade envelope and dual-tone synthesizer
//! - File export and live preview

pub mod buffer;
pub mod envelope;
pub mod export;
pub mod preview;
pub mod request;
pub mod synth;

pub use buffer::{StereoBuffer, SAMPLE_RATE};
pub use envelope::{FadeEnvelope, FadePolicy, FADE_SECONDS};
pub use export::{derive_filename, export, ExportFormat, ExportResult, Exporter, SampleEncoding};
pub use preview::{CpalDevice, PlaybackDevice, PlaybackHandle, Previewer, PREVIEW_SECONDS};
pub use request::{beat_frequency, ExportRequest, PreviewRequest, SynthesisRequest, Timecode};
pub use synth::{synthesize, Synthesizer};
