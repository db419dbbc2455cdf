//! Generator configuration
//!
//! Settings provide the initial form values and the output options that the
//! form itself does not expose. They come from built-in defaults, an optional
//! JSON settings file, and `BINAURAL_*` environment variables, in that order.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::envelope::FadePolicy;
use crate::engine::export::{ExportFormat, Exporter, SampleEncoding};
use crate::engine::request::Timecode;
use crate::engine::synth::Synthesizer;
use crate::error::{BinauralError, Result};
use crate::form::FormInput;

/// Environment variable overriding the export directory
pub const ENV_OUTPUT_DIR: &str = "BINAURAL_OUTPUT_DIR";
/// Environment variable overriding the sample encoding (pcm16, pcm24, float32)
pub const ENV_ENCODING: &str = "BINAURAL_ENCODING";
/// Environment variable overriding the fade policy (overlap, clamp)
pub const ENV_FADE_POLICY: &str = "BINAURAL_FADE_POLICY";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Initial left frequency in Hz
    pub left_frequency: f64,
    /// Initial right frequency in Hz
    pub right_frequency: f64,
    /// Initial export duration
    pub duration: Timecode,
    /// Initial volume (0.0 to 1.0)
    pub volume: f64,
    /// Initial fade flag
    pub fade_enabled: bool,
    /// Initial export format
    pub format: ExportFormat,
    /// Sample encoding for exported files
    pub encoding: SampleEncoding,
    /// Behaviour for buffers shorter than two fade ramps
    pub fade_policy: FadePolicy,
    /// Directory exported files are written to
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            left_frequency: 178.0,
            right_frequency: 175.0,
            duration: Timecode::new(0, 1, 0),
            volume: 0.5,
            fade_enabled: true,
            format: ExportFormat::Wav,
            encoding: SampleEncoding::Pcm16,
            fade_policy: FadePolicy::Overlap,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings: defaults, then the file (if any), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env()
    }

    /// Read settings from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| BinauralError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings =
            serde_json::from_str(&text).map_err(|e| BinauralError::Config {
                reason: format!("{}: {}", path.display(), e),
            })?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Apply `BINAURAL_*` environment overrides
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }

        if let Some(value) = lookup(ENV_ENCODING) {
            self.encoding = SampleEncoding::parse(&value).ok_or_else(|| BinauralError::Config {
                reason: format!("{}={} (expected pcm16, pcm24 or float32)", ENV_ENCODING, value),
            })?;
        }

        if let Some(value) = lookup(ENV_FADE_POLICY) {
            self.fade_policy = FadePolicy::parse(&value).ok_or_else(|| BinauralError::Config {
                reason: format!("{}={} (expected overlap or clamp)", ENV_FADE_POLICY, value),
            })?;
        }

        Ok(self)
    }

    /// Initial form contents
    pub fn form(&self) -> FormInput {
        FormInput {
            left_frequency: self.left_frequency.to_string(),
            right_frequency: self.right_frequency.to_string(),
            hours: self.duration.hours.to_string(),
            minutes: self.duration.minutes.to_string(),
            seconds: self.duration.seconds.to_string(),
            volume: self.volume.to_string(),
            fade_enabled: self.fade_enabled,
            format: self.format.to_string(),
        }
    }

    pub fn exporter(&self) -> Exporter {
        Exporter::new(self.output_dir.clone(), self.encoding)
    }

    pub fn synthesizer(&self) -> Synthesizer {
        Synthesizer::new(self.fade_policy)
    }
}
