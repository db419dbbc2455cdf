//! Audio file export
//!
//! Writes a synthesized buffer to disk under a filename derived from the
//! request parameters. WAV is written with hound, FLAC with flacenc. MP3 is
//! accepted as a format name but has no encoder in this build.

use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use flacenc::bitsink::ByteSink;
use flacenc::component::{BitRepr, Stream, StreamInfo};
use flacenc::config::Encoder as FlacConfig;
use flacenc::constant::MIN_BLOCK_SIZE;
use flacenc::error::{Verified, Verify};
use flacenc::source::{Context, Fill, FrameBuf};
use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::buffer::{StereoBuffer, LEFT, NUM_CHANNELS, RIGHT, SAMPLE_RATE};
use crate::engine::request::{ExportRequest, Timecode};
use crate::error::{BinauralError, Result};

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Uncompressed PCM WAV
    #[default]
    Wav,
    /// Lossless compressed FLAC
    Flac,
    /// Lossy MP3 (no encoder available)
    Mp3,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Wav, ExportFormat::Flac, ExportFormat::Mp3];

    /// Lowercase name, also used as the file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Flac => "flac",
            ExportFormat::Mp3 => "mp3",
        }
    }

    /// Whether this build can write the format
    pub fn is_supported(&self) -> bool {
        !matches!(self, ExportFormat::Mp3)
    }
}

impl FromStr for ExportFormat {
    type Err = BinauralError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "wav" => Ok(ExportFormat::Wav),
            "flac" => Ok(ExportFormat::Flac),
            "mp3" => Ok(ExportFormat::Mp3),
            _ => Err(BinauralError::input_parse("format", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Sample encoding written to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    /// 16-bit signed integer (clips at full scale)
    #[default]
    Pcm16,
    /// 24-bit signed integer (clips at full scale)
    Pcm24,
    /// 32-bit float (WAV only, preserves out-of-range samples)
    Float32,
}

impl SampleEncoding {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleEncoding::Pcm16 => 16,
            SampleEncoding::Pcm24 => 24,
            SampleEncoding::Float32 => 32,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, SampleEncoding::Float32)
    }

    /// Full-scale value for integer encodings
    fn full_scale(&self) -> f64 {
        match self {
            SampleEncoding::Pcm16 => 32767.0,
            SampleEncoding::Pcm24 => 8388607.0,
            SampleEncoding::Float32 => 1.0,
        }
    }

    /// Scale a normalized sample to this encoding's integer range, clamping
    fn quantize(&self, sample: f64) -> i32 {
        let scale = self.full_scale();
        (sample * scale).clamp(-scale - 1.0, scale) as i32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleEncoding::Pcm16 => "pcm16",
            SampleEncoding::Pcm24 => "pcm24",
            SampleEncoding::Float32 => "float32",
        }
    }

    /// Parses an encoding from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pcm16" | "16" => Some(SampleEncoding::Pcm16),
            "pcm24" | "24" => Some(SampleEncoding::Pcm24),
            "float32" | "float" | "32" => Some(SampleEncoding::Float32),
            _ => None,
        }
    }
}

impl std::fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derive the output filename for an export
///
/// `{left}_{right}_{h}h{mm}m{ss}s_vol{vvv}[_fade].{ext}` where frequencies and
/// volume percent are truncated toward zero.
pub fn derive_filename(
    left_frequency: f64,
    right_frequency: f64,
    timecode: Timecode,
    volume: f64,
    fade_enabled: bool,
    format: ExportFormat,
) -> String {
    let fade = if fade_enabled { "_fade" } else { "" };
    format!(
        "{}_{}_{}_vol{:03}{}.{}",
        left_frequency.trunc() as i64,
        right_frequency.trunc() as i64,
        timecode,
        (volume * 100.0).trunc() as i64,
        fade,
        format.extension()
    )
}

/// A file written by the exporter
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    /// Derived filename (the artifact identity)
    pub filename: String,
    /// Full path of the written file
    pub path: PathBuf,
    pub format: ExportFormat,
    /// Frames written per channel
    pub frames: usize,
    /// Peak absolute sample per channel, before quantization
    pub peak: [f64; NUM_CHANNELS],
    /// RMS level in dB per channel
    pub rms_db: [f64; NUM_CHANNELS],
    /// SHA-256 of the written file
    pub checksum: String,
}

/// Writes buffers to files in one output directory
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    encoding: SampleEncoding,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(PathBuf::from("."), SampleEncoding::default())
    }
}

impl Exporter {
    pub fn new(output_dir: PathBuf, encoding: SampleEncoding) -> Self {
        Self {
            output_dir,
            encoding,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    /// Write `buffer` to `<output_dir>/<derived filename>`, overwriting any existing file
    ///
    /// # Errors
    /// * `Write` - If the format or encoding cannot be written
    /// * `Io` - If the file cannot be created or written
    pub fn export(&self, buffer: &StereoBuffer, request: &ExportRequest) -> Result<ExportResult> {
        let filename = request.filename();
        let path = self.output_dir.join(&filename);

        self.check_writable(request.format)?;

        if self.encoding.is_integer() {
            let clipped = buffer.clipping_ratio();
            if clipped > 0.0 {
                warn!(
                    "{:.2}% of samples exceed full scale and will clip in {} output",
                    clipped * 100.0,
                    self.encoding
                );
            }
        }

        match request.format {
            ExportFormat::Wav => write_wav(buffer, &path, self.encoding)?,
            ExportFormat::Flac => write_flac(buffer, &path, self.encoding)?,
            ExportFormat::Mp3 => return Err(no_encoder(request.format)),
        }

        let checksum = calculate_checksum(&path)?;
        let peak = [buffer.peak(LEFT), buffer.peak(RIGHT)];
        let rms_db = [buffer.rms_db(LEFT), buffer.rms_db(RIGHT)];

        info!(
            "Exported {} frames to {} ({})",
            buffer.num_frames(),
            path.display(),
            self.encoding
        );
        debug!(
            "Levels: peak L/R {:.3}/{:.3}, RMS L/R {:.1}/{:.1} dB",
            peak[LEFT], peak[RIGHT], rms_db[LEFT], rms_db[RIGHT]
        );

        Ok(ExportResult {
            filename,
            path,
            format: request.format,
            frames: buffer.num_frames(),
            peak,
            rms_db,
            checksum,
        })
    }

    /// Reject format/encoding pairs before any file is created
    fn check_writable(&self, format: ExportFormat) -> Result<()> {
        match format {
            _ if !format.is_supported() => Err(no_encoder(format)),
            ExportFormat::Flac if !self.encoding.is_integer() => Err(BinauralError::Write {
                format: format.to_string(),
                reason: format!("{} samples are not supported by FLAC", self.encoding),
            }),
            _ => Ok(()),
        }
    }
}

/// Export into the current working directory with default encoding
pub fn export(buffer: &StereoBuffer, request: &ExportRequest) -> Result<ExportResult> {
    Exporter::default().export(buffer, request)
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| BinauralError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Map a hound error: I/O failures stay I/O, everything else is a write error
fn wav_error(path: &Path, err: hound::Error) -> BinauralError {
    match err {
        hound::Error::IoError(source) => BinauralError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => BinauralError::Write {
            format: ExportFormat::Wav.to_string(),
            reason: other.to_string(),
        },
    }
}

fn no_encoder(format: ExportFormat) -> BinauralError {
    BinauralError::Write {
        format: format.to_string(),
        reason: format!("no {} encoder is available in this build", format),
    }
}

fn flac_error(reason: String) -> BinauralError {
    BinauralError::Write {
        format: ExportFormat::Flac.to_string(),
        reason,
    }
}

/// Write a stereo WAV file at 44.1kHz
fn write_wav(buffer: &StereoBuffer, path: &Path, encoding: SampleEncoding) -> Result<()> {
    let spec = WavSpec {
        channels: NUM_CHANNELS as u16,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: encoding.bits_per_sample(),
        sample_format: if encoding.is_integer() {
            SampleFormat::Int
        } else {
            SampleFormat::Float
        },
    };

    let file = create_file(path)?;
    let mut writer =
        WavWriter::new(BufWriter::new(file), spec).map_err(|e| wav_error(path, e))?;

    for frame in buffer.frames() {
        for &sample in frame {
            let written = match encoding {
                SampleEncoding::Pcm16 => writer.write_sample(encoding.quantize(sample) as i16),
                // 24-bit stored as i32 in hound
                SampleEncoding::Pcm24 => writer.write_sample(encoding.quantize(sample)),
                SampleEncoding::Float32 => writer.write_sample(sample as f32),
            };
            written.map_err(|e| wav_error(path, e))?;
        }
    }

    writer.finalize().map_err(|e| wav_error(path, e))?;
    Ok(())
}

/// Encoder settings for the regular blocks and for a final block too short
/// for predictive coding
fn flac_configs() -> Result<(Verified<FlacConfig>, Verified<FlacConfig>)> {
    let config = FlacConfig::default()
        .into_verified()
        .map_err(|(_, e)| flac_error(e.to_string()))?;

    let mut short = FlacConfig::default();
    short.subframe_coding.use_fixed = false;
    short.subframe_coding.use_lpc = false;
    let short = short
        .into_verified()
        .map_err(|(_, e)| flac_error(e.to_string()))?;

    Ok((config, short))
}

/// Encode a stereo FLAC stream in memory and write it out
///
/// Blocks are encoded one at a time so the last one holds exactly the frames
/// that remain. STREAMINFO carries the nominal block size, the true frame
/// count and the MD5 of the unpadded samples; an empty buffer yields a
/// header-only stream.
fn write_flac(buffer: &StereoBuffer, path: &Path, encoding: SampleEncoding) -> Result<()> {
    let bits = encoding.bits_per_sample() as usize;
    let samples: Vec<i32> = buffer
        .frames()
        .iter()
        .flat_map(|frame| frame.iter().map(|&s| encoding.quantize(s)))
        .collect();

    let (config, short_config) = flac_configs()?;
    let block_size = config.block_size;

    let mut info = StreamInfo::new(SAMPLE_RATE as usize, NUM_CHANNELS, bits)
        .map_err(|e| flac_error(e.to_string()))?;
    info.set_block_sizes(block_size, block_size)
        .map_err(|e| flac_error(e.to_string()))?;
    info.set_total_samples(buffer.num_frames());

    let mut digest = Context::new(bits, NUM_CHANNELS, buffer.num_frames());
    digest
        .fill_interleaved(&samples)
        .map_err(|e| flac_error(e.to_string()))?;
    info.set_md5_digest(&digest.md5_digest());

    let mut framebuf =
        FrameBuf::with_size(NUM_CHANNELS, block_size).map_err(|e| flac_error(e.to_string()))?;
    let mut frames = Vec::with_capacity(buffer.num_frames().div_ceil(block_size));

    for (number, chunk) in samples.chunks(block_size * NUM_CHANNELS).enumerate() {
        let len = chunk.len() / NUM_CHANNELS;
        let frame_config = if len < MIN_BLOCK_SIZE {
            &short_config
        } else {
            &config
        };

        framebuf.resize(len);
        framebuf
            .fill_interleaved(chunk)
            .map_err(|e| flac_error(e.to_string()))?;

        let frame = flacenc::encode_fixed_size_frame(frame_config, &framebuf, number, &info)
            .map_err(|e| flac_error(format!("{:?}", e)))?;
        frames.push(frame);
    }

    let frame_bytes = || frames.iter().map(|frame| frame.count_bits() / 8);
    info.set_frame_sizes(
        frame_bytes().min().unwrap_or(0),
        frame_bytes().max().unwrap_or(0),
    )
    .map_err(|e| flac_error(e.to_string()))?;

    let mut sink = ByteSink::new();
    Stream::with_stream_info(info)
        .write(&mut sink)
        .map_err(|e| flac_error(e.to_string()))?;
    for frame in &frames {
        frame
            .write(&mut sink)
            .map_err(|e| flac_error(e.to_string()))?;
    }

    fs::write(path, sink.as_slice()).map_err(|source| BinauralError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Calculate SHA-256 checksum of a file
fn calculate_checksum(path: &Path) -> Result<String> {
    let io_error = |source| BinauralError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_error)?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut chunk).map_err(io_error)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&chunk[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Tests
// ============================================================================
