//! CLI Module
//!
//! Command-line interface for the binaural generator. Numeric values are
//! taken as free text and parsed by the form layer, so a malformed value is
//! reported the same way the interactive session reports it.

pub mod commands;
pub mod session;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::engine::export::SampleEncoding;

/// Binaural Generator - dual-tone stereo synthesis for ambient and meditation audio
#[derive(Parser, Debug)]
#[command(name = "binaural")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Without a subcommand an interactive session starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a tone pair to an audio file
    #[command(name = "generate")]
    Generate(GenerateArgs),

    /// Play a three-second preview on the default output device
    #[command(name = "preview")]
    Preview(ToneArgs),

    /// Print the beat frequency for a pair of frequencies
    #[command(name = "beat")]
    Beat {
        /// Left frequency in Hz
        #[arg(short, long, allow_hyphen_values = true)]
        left: Option<String>,

        /// Right frequency in Hz
        #[arg(short, long, allow_hyphen_values = true)]
        right: Option<String>,
    },
}

/// Tone parameters shared by generate and preview
#[derive(Args, Debug, Default, Clone)]
pub struct ToneArgs {
    /// Left frequency in Hz
    #[arg(short, long, allow_hyphen_values = true)]
    pub left: Option<String>,

    /// Right frequency in Hz
    #[arg(short, long, allow_hyphen_values = true)]
    pub right: Option<String>,

    /// Volume (0.0 to 1.0)
    #[arg(long, allow_hyphen_values = true)]
    pub volume: Option<String>,

    /// Disable the 100ms fade-in/fade-out
    #[arg(long)]
    pub no_fade: bool,

    /// Force the 100ms fade-in/fade-out on
    #[arg(long, conflicts_with = "no_fade")]
    pub fade: bool,

    /// Shorten fades on buffers too short for two full ramps
    #[arg(long)]
    pub clamp_fade: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub tone: ToneArgs,

    /// Hours
    #[arg(long, allow_hyphen_values = true)]
    pub hours: Option<String>,

    /// Minutes
    #[arg(long, allow_hyphen_values = true)]
    pub minutes: Option<String>,

    /// Seconds
    #[arg(long, allow_hyphen_values = true)]
    pub seconds: Option<String>,

    /// Output format: wav, flac or mp3
    #[arg(short, long)]
    pub format: Option<String>,

    /// Sample encoding of the written file
    #[arg(short, long, value_enum)]
    pub encoding: Option<EncodingArg>,

    /// Directory to write into (default: current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Sample encodings selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    /// 16-bit integer PCM
    Pcm16,
    /// 24-bit integer PCM
    Pcm24,
    /// 32-bit float (WAV only)
    Float32,
}

impl From<EncodingArg> for SampleEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Pcm16 => SampleEncoding::Pcm16,
            EncodingArg::Pcm24 => SampleEncoding::Pcm24,
            EncodingArg::Float32 => SampleEncoding::Float32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from([
            "binaural-cli",
            "generate",
            "--left",
            "200",
            "--right",
            "204",
            "--minutes",
            "-1",
            "--format",
            "flac",
            "--encoding",
            "pcm24",
            "--no-fade",
        ]);

        match cli.command {
            Some(Commands::Generate(args)) => {
                assert_eq!(args.tone.left.as_deref(), Some("200"));
                assert_eq!(args.minutes.as_deref(), Some("-1"));
                assert_eq!(args.format.as_deref(), Some("flac"));
                assert_eq!(args.encoding, Some(EncodingArg::Pcm24));
                assert!(args.tone.no_fade);
                assert!(!args.tone.fade);
            }
            other => panic!("Expected generate, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_without_subcommand() {
        let cli = Cli::parse_from(["binaural-cli", "--verbose"]);
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_fade_flags_conflict() {
        let result = Cli::try_parse_from(["binaural-cli", "preview", "--fade", "--no-fade"]);
        assert!(result.is_err());
    }
}
