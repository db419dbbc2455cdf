//! Form boundary
//!
//! The form holds every field as the raw text the user typed. Text is only
//! turned into numbers when the user asks for an export or a preview; if any
//! field fails to parse, the request is never built and the synthesizer is
//! never called. Stored text is left as it was.

use std::str::FromStr;

use crate::engine::export::ExportFormat;
use crate::engine::request::{beat_frequency, ExportRequest, PreviewRequest, Timecode};
use crate::error::{BinauralError, Result};

/// One editable field on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    LeftFrequency,
    RightFrequency,
    Hours,
    Minutes,
    Seconds,
    Volume,
    Format,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::LeftFrequency,
        FormField::RightFrequency,
        FormField::Hours,
        FormField::Minutes,
        FormField::Seconds,
        FormField::Volume,
        FormField::Format,
    ];

    /// Name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            FormField::LeftFrequency => "left frequency",
            FormField::RightFrequency => "right frequency",
            FormField::Hours => "hours",
            FormField::Minutes => "minutes",
            FormField::Seconds => "seconds",
            FormField::Volume => "volume",
            FormField::Format => "format",
        }
    }

    /// Whether editing this field changes the beat display
    pub fn affects_beat(&self) -> bool {
        matches!(self, FormField::LeftFrequency | FormField::RightFrequency)
    }

    /// Parses a field name as typed in the interactive session.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" => Some(FormField::LeftFrequency),
            "right" | "r" => Some(FormField::RightFrequency),
            "hours" | "h" => Some(FormField::Hours),
            "minutes" | "m" => Some(FormField::Minutes),
            "seconds" | "s" => Some(FormField::Seconds),
            "volume" | "vol" | "v" => Some(FormField::Volume),
            "format" | "f" => Some(FormField::Format),
            _ => None,
        }
    }
}

/// Raw form state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub left_frequency: String,
    pub right_frequency: String,
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    pub volume: String,
    pub fade_enabled: bool,
    pub format: String,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            left_frequency: "178".to_string(),
            right_frequency: "175".to_string(),
            hours: "0".to_string(),
            minutes: "1".to_string(),
            seconds: "0".to_string(),
            volume: "0.5".to_string(),
            fade_enabled: true,
            format: "wav".to_string(),
        }
    }
}

impl FormInput {
    /// Current text of a field
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::LeftFrequency => &self.left_frequency,
            FormField::RightFrequency => &self.right_frequency,
            FormField::Hours => &self.hours,
            FormField::Minutes => &self.minutes,
            FormField::Seconds => &self.seconds,
            FormField::Volume => &self.volume,
            FormField::Format => &self.format,
        }
    }

    /// Replace a field's text. No validation happens here.
    pub fn set(&mut self, field: FormField, text: impl Into<String>) {
        let text = text.into();
        match field {
            FormField::LeftFrequency => self.left_frequency = text,
            FormField::RightFrequency => self.right_frequency = text,
            FormField::Hours => self.hours = text,
            FormField::Minutes => self.minutes = text,
            FormField::Seconds => self.seconds = text,
            FormField::Volume => self.volume = text,
            FormField::Format => self.format = text,
        }
    }

    /// Build an export request from the current fields
    ///
    /// # Errors
    /// * `InputParse` - naming the first field that failed to parse
    pub fn parse_export(&self) -> Result<ExportRequest> {
        Ok(ExportRequest {
            left_frequency: parse_decimal(FormField::LeftFrequency, &self.left_frequency)?,
            right_frequency: parse_decimal(FormField::RightFrequency, &self.right_frequency)?,
            timecode: Timecode::new(
                parse_whole(FormField::Hours, &self.hours)?,
                parse_whole(FormField::Minutes, &self.minutes)?,
                parse_whole(FormField::Seconds, &self.seconds)?,
            ),
            volume: parse_decimal(FormField::Volume, &self.volume)?,
            fade_enabled: self.fade_enabled,
            format: ExportFormat::from_str(&self.format)?,
        })
    }

    /// Build a preview request from the frequency, volume and fade fields
    ///
    /// Duration and format fields are ignored, so they cannot block a preview.
    pub fn parse_preview(&self) -> Result<PreviewRequest> {
        Ok(PreviewRequest {
            left_frequency: parse_decimal(FormField::LeftFrequency, &self.left_frequency)?,
            right_frequency: parse_decimal(FormField::RightFrequency, &self.right_frequency)?,
            volume: parse_decimal(FormField::Volume, &self.volume)?,
            fade_enabled: self.fade_enabled,
        })
    }

    /// The beat display for the current frequency fields
    pub fn beat_label(&self) -> String {
        beat_label(&self.left_frequency, &self.right_frequency)
    }
}

/// Parse a decimal field (frequency or volume)
///
/// Surrounding whitespace is ignored. NaN and infinities are rejected.
pub fn parse_decimal(field: FormField, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| BinauralError::input_parse(field.label(), text))
}

/// Parse a non-negative whole-number field (hours, minutes, seconds)
pub fn parse_whole(field: FormField, text: &str) -> Result<u32> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| BinauralError::input_parse(field.label(), text))
}

/// Derived beat display: `Δ = 3.00 Hz (binaural beat)`, or `Δ = ? Hz` if
/// either frequency is not a number
pub fn beat_label(left_text: &str, right_text: &str) -> String {
    let left = parse_decimal(FormField::LeftFrequency, left_text);
    let right = parse_decimal(FormField::RightFrequency, right_text);
    match (left, right) {
        (Ok(left), Ok(right)) => {
            format!("Δ = {:.2} Hz (binaural beat)", beat_frequency(left, right))
        }
        _ => "Δ = ? Hz".to_string(),
    }
}
