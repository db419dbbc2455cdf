//! Binaural - dual-tone stereo synthesis for ambient and meditation audio
//!
//! A sine wave at one frequency plays in the left ear and a sine wave at a
//! nearby frequency plays in the right ear; the listener perceives a beat at
//! the difference. The crate renders such pairs to WAV or FLAC files and
//! previews them on the default audio device.
//!
//! # Architecture
//!
//! - `form`: raw text fields, parsed only when an export or preview is asked for
//! - `engine`: synthesis, fade envelope, file export and audio preview
//! - `config`: defaults, JSON settings file and environment overrides
//! - `cli`: command-line commands and the interactive session

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod form;

pub use error::{BinauralError, Result};
