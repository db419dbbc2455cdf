//! Integration Tests
//!
//! End-to-end tests from raw form text to files on disk and buffers handed
//! to an output device.

use std::f64::consts::PI;
use std::fs;
use std::sync::Mutex;

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use binaural::cli::commands::{run_export, run_preview};
use binaural::config::Settings;
use binaural::engine::{
    ExportFormat, ExportRequest, Exporter, FadePolicy, PlaybackDevice, PlaybackHandle, Previewer,
    SampleEncoding, StereoBuffer, SynthesisRequest, Synthesizer, Timecode, SAMPLE_RATE,
};
use binaural::form::{FormField, FormInput};
use binaural::{BinauralError, Result};

#[derive(Default)]
struct RecordingDevice {
    buffers: Mutex<Vec<StereoBuffer>>,
}

impl PlaybackDevice for RecordingDevice {
    fn play(&self, buffer: StereoBuffer) -> Result<PlaybackHandle> {
        self.buffers.lock().unwrap().push(buffer);
        Ok(PlaybackHandle::completed())
    }
}

fn short_form(seconds: &str) -> FormInput {
    let mut form = FormInput::default();
    form.set(FormField::Minutes, "0");
    form.set(FormField::Seconds, seconds);
    form
}

// === Export Pipeline Tests ===

#[test]
fn test_form_to_wav_samples() {
    let dir = tempdir().unwrap();
    let mut form = short_form("1");
    form.set(FormField::LeftFrequency, "200");
    form.set(FormField::RightFrequency, "204");
    form.set(FormField::Volume, "0.8");
    form.fade_enabled = false;

    let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Float32);
    let result = run_export(&form, &Synthesizer::default(), &exporter).unwrap();
    assert_eq!(result.filename, "200_204_0h00m01s_vol080.wav");

    let mut reader = hound::WavReader::open(&result.path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);

    let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 2 * 44100);

    let step = 1.0 / 44100.0;
    for i in [0usize, 1, 137, 22050, 44099] {
        let t = i as f64 * step;
        let left = 0.8 * (2.0 * PI * 200.0 * t).sin();
        let right = 0.8 * (2.0 * PI * 204.0 * t).sin();
        assert_abs_diff_eq!(samples[2 * i] as f64, left, epsilon = 1e-6);
        assert_abs_diff_eq!(samples[2 * i + 1] as f64, right, epsilon = 1e-6);
    }
}

#[test]
fn test_faded_export_starts_and_ends_silent() {
    let dir = tempdir().unwrap();
    let form = short_form("1");

    let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Pcm16);
    let result = run_export(&form, &Synthesizer::default(), &exporter).unwrap();
    assert_eq!(result.filename, "178_175_0h00m01s_vol050_fade.wav");

    let mut reader = hound::WavReader::open(&result.path).unwrap();
    assert_eq!(reader.spec().bits_per_sample, 16);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();

    assert_eq!(&samples[..2], &[0, 0]);
    assert_eq!(&samples[samples.len() - 2..], &[0, 0]);
}

#[test]
fn test_export_overwrites_same_name() {
    let dir = tempdir().unwrap();
    let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Pcm16);

    let first = run_export(&short_form("2"), &Synthesizer::default(), &exporter).unwrap();
    let second = run_export(&short_form("2"), &Synthesizer::default(), &exporter).unwrap();

    assert_eq!(first.path, second.path);
    assert_eq!(first.checksum, second.checksum);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_flac_export_writes_stream() {
    let dir = tempdir().unwrap();
    let mut form = short_form("1");
    form.set(FormField::Format, "flac");

    let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Pcm24);
    let result = run_export(&form, &Synthesizer::default(), &exporter).unwrap();

    assert_eq!(result.format, ExportFormat::Flac);
    let mut reader = claxon::FlacReader::open(&result.path).unwrap();
    let info = reader.streaminfo();
    assert_eq!(info.samples, Some(44100));
    assert_eq!(info.bits_per_sample, 24);

    let decoded: Vec<i32> = reader.samples().map(|s| s.unwrap()).collect();
    assert_eq!(decoded.len(), 2 * 44100);
    assert_eq!(&decoded[..2], &[0, 0]);
    assert_eq!(&decoded[decoded.len() - 2..], &[0, 0]);
}

#[test]
fn test_zero_duration_flac_is_readable() {
    let dir = tempdir().unwrap();
    let mut form = short_form("0");
    form.set(FormField::Format, "flac");

    let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Pcm16);
    let result = run_export(&form, &Synthesizer::default(), &exporter).unwrap();
    assert_eq!(result.frames, 0);

    let mut reader = claxon::FlacReader::open(&result.path).unwrap();
    assert_eq!(reader.streaminfo().samples, Some(0));
    assert_eq!(reader.samples().count(), 0);
}

#[test]
fn test_zero_duration_export() {
    let dir = tempdir().unwrap();
    let form = short_form("0");

    let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Pcm16);
    let result = run_export(&form, &Synthesizer::default(), &exporter).unwrap();
    assert_eq!(result.frames, 0);
    assert_eq!(result.filename, "178_175_0h00m00s_vol050_fade.wav");

    let reader = hound::WavReader::open(&result.path).unwrap();
    assert_eq!(reader.len(), 0);
}

#[test]
fn test_parse_error_prevents_synthesis_and_write() {
    let dir = tempdir().unwrap();
    let mut form = short_form("1");
    form.set(FormField::Seconds, "1.5");

    let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Pcm16);
    let err = run_export(&form, &Synthesizer::default(), &exporter).unwrap_err();

    match err {
        BinauralError::InputParse { field, value } => {
            assert_eq!(field, "seconds");
            assert_eq!(value, "1.5");
        }
        other => panic!("Expected InputParse error, got: {:?}", other),
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_mp3_is_write_error() {
    let dir = tempdir().unwrap();
    let mut form = short_form("1");
    form.set(FormField::Format, "mp3");

    let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Pcm16);
    let err = run_export(&form, &Synthesizer::default(), &exporter).unwrap_err();

    assert_eq!(err.error_code(), "WRITE_ERROR");
    assert!(err.is_recoverable());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_hour_long_filename() {
    let request = ExportRequest {
        left_frequency: 432.9,
        right_frequency: 436.2,
        timecode: Timecode::new(1, 5, 9),
        volume: 0.256,
        fade_enabled: true,
        format: ExportFormat::Flac,
    };
    assert_eq!(request.filename(), "432_436_1h05m09s_vol025_fade.flac");
}

// === Preview Tests ===

#[test]
fn test_preview_hands_three_seconds_to_device() {
    let mut form = FormInput::default();
    form.set(FormField::Hours, "not a number");
    form.fade_enabled = false;

    let previewer = Previewer::new(RecordingDevice::default());
    run_preview(&form, &previewer).unwrap().wait();

    let buffers = previewer.device().buffers.lock().unwrap();
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers[0].num_frames(), 3 * 44100);
    assert_abs_diff_eq!(buffers[0].peak(0), 0.5, epsilon = 1e-3);
}

#[test]
fn test_preview_parse_error_never_plays() {
    let mut form = FormInput::default();
    form.set(FormField::Volume, "");

    let previewer = Previewer::new(RecordingDevice::default());
    assert!(run_preview(&form, &previewer).is_err());
    assert!(previewer.device().buffers.lock().unwrap().is_empty());
}

// === Synthesis Policy Tests ===

#[test]
fn test_short_buffer_policies() {
    let request = SynthesisRequest::new(440.0, 444.0, 0.05, true, 1.0);

    let overlap = Synthesizer::new(FadePolicy::Overlap).synthesize(&request);
    let clamp = Synthesizer::new(FadePolicy::Clamp).synthesize(&request);

    assert_eq!(overlap.num_frames(), 2205);
    assert_eq!(clamp.num_frames(), 2205);

    for buffer in [&overlap, &clamp] {
        let first = buffer.frame(0).unwrap();
        let last = buffer.frame(buffer.num_frames() - 1).unwrap();
        assert_eq!(first, [0.0, 0.0]);
        assert_abs_diff_eq!(last[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(last[1], 0.0, epsilon = 1e-12);
    }

    // Clamped ramps are shorter, so the middle of the buffer is louder
    assert!(clamp.peak(0) > overlap.peak(0));
}

#[test]
fn test_settings_drive_the_pipeline() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        left_frequency: 100.0,
        right_frequency: 107.5,
        duration: Timecode::new(0, 0, 1),
        volume: 0.25,
        fade_enabled: false,
        format: ExportFormat::Flac,
        encoding: SampleEncoding::Pcm16,
        fade_policy: FadePolicy::Clamp,
        output_dir: dir.path().to_path_buf(),
    };

    let form = settings.form();
    assert_eq!(form.beat_label(), "Δ = 7.50 Hz (binaural beat)");

    let result = run_export(&form, &settings.synthesizer(), &settings.exporter()).unwrap();
    assert_eq!(result.filename, "100_107_0h00m01s_vol025.flac");
    assert!(result.path.starts_with(dir.path()));

    let reader = claxon::FlacReader::open(&result.path).unwrap();
    assert_eq!(reader.streaminfo().samples, Some(44100));
    assert_eq!(reader.streaminfo().bits_per_sample, 16);
}
