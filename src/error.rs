//! Error handling for the binaural generator
//!
//! Every failure the core can report is caught at the form/CLI boundary and
//! turned into a user-facing notification. None of them are fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for binaural operations
pub type Result<T> = std::result::Result<T, BinauralError>;

/// Main error type for binaural operations
#[derive(Error, Debug)]
pub enum BinauralError {
    // Input Errors
    #[error("Invalid value for {field}: '{value}'")]
    InputParse { field: String, value: String },

    // Export Errors
    #[error("Cannot write {format} audio: {reason}")]
    Write { format: String, reason: String },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Playback Errors
    #[error("Audio device error: {reason}")]
    Device { reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl BinauralError {
    /// Shorthand for a field that failed to parse
    pub fn input_parse(field: &str, value: &str) -> Self {
        BinauralError::InputParse {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BinauralError::InputParse { .. } => "INPUT_PARSE_ERROR",
            BinauralError::Write { .. } => "WRITE_ERROR",
            BinauralError::Io { .. } => "IO_ERROR",
            BinauralError::Device { .. } => "DEVICE_ERROR",
            BinauralError::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Check if the user can retry after fixing their input or environment
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BinauralError::Config { .. })
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BinauralError::InputParse { .. } => vec![
                "Frequencies and volume must be decimal numbers (e.g. 178 or 0.5)",
                "Hours, minutes and seconds must be whole numbers",
                "Supported formats: wav, flac, mp3",
            ],
            BinauralError::Write { .. } => vec![
                "Choose WAV or FLAC output",
                "FLAC supports 16-bit and 24-bit encodings only",
            ],
            BinauralError::Io { .. } => vec![
                "Check that the output directory exists and is writable",
                "Free up disk space",
                "Export to a different location",
            ],
            BinauralError::Device { .. } => vec![
                "Check that an audio output device is connected",
                "Close other applications holding the audio device",
                "Export to a file instead of previewing",
            ],
            BinauralError::Config { .. } => vec![
                "Fix or remove the settings file",
                "Unset BINAURAL_* environment variables",
            ],
        }
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            BinauralError::InputParse { field, value } => {
                format!("'{}' is not a valid {}. Nothing was generated.", value, field)
            }
            BinauralError::Write { format, reason } => {
                format!("The file couldn't be saved as {}: {}", format, reason)
            }
            BinauralError::Io { path, source } => {
                format!("Couldn't write '{}': {}", path.display(), source)
            }
            BinauralError::Device { reason } => {
                format!("Preview isn't available right now: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}
