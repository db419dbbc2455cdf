//! CLI Command Implementations
//!
//! Each command builds a form from the settings, applies the command-line
//! overrides, and hands the parsed request to the engine.

use log::info;

use crate::cli::{GenerateArgs, ToneArgs};
use crate::config::Settings;
use crate::engine::envelope::FadePolicy;
use crate::engine::export::{ExportResult, Exporter};
use crate::engine::preview::{CpalDevice, PlaybackDevice, PlaybackHandle, Previewer};
use crate::engine::synth::Synthesizer;
use crate::error::{BinauralError, Result};
use crate::form::{FormField, FormInput};

/// Parse the form and write the export. Nothing is synthesized if parsing fails.
pub fn run_export(
    form: &FormInput,
    synthesizer: &Synthesizer,
    exporter: &Exporter,
) -> Result<ExportResult> {
    let request = form.parse_export()?;

    info!(
        "Generating {} ({} Hz beat, {})",
        request.timecode,
        request.synthesis().beat_frequency(),
        request.format
    );

    let buffer = synthesizer.synthesize(&request.synthesis());
    exporter.export(&buffer, &request)
}

/// Parse the form and start a preview. Nothing is synthesized if parsing fails.
pub fn run_preview<D: PlaybackDevice>(
    form: &FormInput,
    previewer: &Previewer<D>,
) -> Result<PlaybackHandle> {
    let request = form.parse_preview()?;
    previewer.play(&request)
}

/// Render an error as the notification shown to the user
pub fn describe_error(err: &BinauralError) -> String {
    let mut message = format!("Error: {}", err.friendly_message());
    for suggestion in err.recovery_suggestions() {
        message.push_str("\n  - ");
        message.push_str(suggestion);
    }
    message
}

/// Render a tone pair to a file.
pub fn generate(settings: &Settings, args: &GenerateArgs) -> Result<ExportResult> {
    let mut form = settings.form();
    apply_tone(&mut form, &args.tone);
    override_field(&mut form, FormField::Hours, &args.hours);
    override_field(&mut form, FormField::Minutes, &args.minutes);
    override_field(&mut form, FormField::Seconds, &args.seconds);
    override_field(&mut form, FormField::Format, &args.format);

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.output_dir.clone());
    let encoding = args.encoding.map(Into::into).unwrap_or(settings.encoding);
    let exporter = Exporter::new(output_dir, encoding);
    let synthesizer = synthesizer_for(settings, &args.tone);

    println!("{}", form.beat_label());
    let result = run_export(&form, &synthesizer, &exporter)?;

    println!("Saved as:");
    println!("{}", result.filename);
    println!("  Path: {}", result.path.display());
    println!(
        "  Peak: L {:.3} / R {:.3}  RMS: L {:.1} dB / R {:.1} dB",
        result.peak[0], result.peak[1], result.rms_db[0], result.rms_db[1]
    );
    println!("  SHA-256: {}", result.checksum);

    Ok(result)
}

/// Play a three-second preview and wait for it to finish.
pub fn preview(settings: &Settings, args: &ToneArgs) -> Result<()> {
    let mut form = settings.form();
    apply_tone(&mut form, args);

    let previewer = Previewer::with_synthesizer(CpalDevice, synthesizer_for(settings, args));

    println!("{}", form.beat_label());
    let handle = run_preview(&form, &previewer)?;
    println!("Playing preview...");

    // The process would end playback on exit
    handle.wait();
    Ok(())
}

/// Print the beat label for a frequency pair.
pub fn beat(settings: &Settings, left: Option<&str>, right: Option<&str>) -> Result<()> {
    let mut form = settings.form();
    if let Some(left) = left {
        form.set(FormField::LeftFrequency, left);
    }
    if let Some(right) = right {
        form.set(FormField::RightFrequency, right);
    }

    println!("{}", form.beat_label());
    Ok(())
}

fn override_field(form: &mut FormInput, field: FormField, value: &Option<String>) {
    if let Some(value) = value {
        form.set(field, value.as_str());
    }
}

fn apply_tone(form: &mut FormInput, args: &ToneArgs) {
    override_field(form, FormField::LeftFrequency, &args.left);
    override_field(form, FormField::RightFrequency, &args.right);
    override_field(form, FormField::Volume, &args.volume);
    if args.no_fade {
        form.fade_enabled = false;
    } else if args.fade {
        form.fade_enabled = true;
    }
}

fn synthesizer_for(settings: &Settings, args: &ToneArgs) -> Synthesizer {
    if args.clamp_fade {
        Synthesizer::new(FadePolicy::Clamp)
    } else {
        settings.synthesizer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::export::SampleEncoding;
    use tempfile::tempdir;

    #[test]
    fn test_generate_writes_named_file() {
        let dir = tempdir().unwrap();
        let settings = Settings::default();
        let args = GenerateArgs {
            tone: ToneArgs {
                left: Some("200".to_string()),
                right: Some("204".to_string()),
                no_fade: true,
                ..ToneArgs::default()
            },
            minutes: Some("0".to_string()),
            seconds: Some("2".to_string()),
            encoding: Some(crate::cli::EncodingArg::Pcm24),
            output_dir: Some(dir.path().to_path_buf()),
            ..GenerateArgs::default()
        };

        let result = generate(&settings, &args).unwrap();
        assert_eq!(result.filename, "200_204_0h00m02s_vol050.wav");
        assert_eq!(result.frames, 88200);
        assert!((result.peak[0] - 0.5).abs() < 1e-3);
        assert!((result.rms_db[1] - (-9.03)).abs() < 0.05);

        let reader = hound::WavReader::open(&result.path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 24);
    }

    #[test]
    fn test_generate_bad_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let args = GenerateArgs {
            tone: ToneArgs {
                left: Some("abc".to_string()),
                ..ToneArgs::default()
            },
            output_dir: Some(dir.path().to_path_buf()),
            ..GenerateArgs::default()
        };

        let err = generate(&Settings::default(), &args).unwrap_err();
        assert_eq!(err.error_code(), "INPUT_PARSE_ERROR");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_run_export_uses_exporter_settings() {
        let dir = tempdir().unwrap();
        let mut form = FormInput::default();
        form.set(FormField::Minutes, "0");
        form.set(FormField::Seconds, "1");
        form.set(FormField::Format, "flac");

        let exporter = Exporter::new(dir.path().to_path_buf(), SampleEncoding::Pcm16);
        let result = run_export(&form, &Synthesizer::default(), &exporter).unwrap();
        assert_eq!(result.filename, "178_175_0h00m01s_vol050_fade.flac");
        assert!(result.path.exists());
    }

    #[test]
    fn test_describe_error_lists_suggestions() {
        let err = BinauralError::input_parse("volume", "loud");
        let text = describe_error(&err);
        assert!(text.starts_with("Error: "));
        assert!(text.contains("'loud'"));
        assert!(text.contains("\n  - "));
    }

    #[test]
    fn test_apply_tone_fade_flags() {
        let mut form = FormInput::default();
        apply_tone(
            &mut form,
            &ToneArgs {
                no_fade: true,
                ..ToneArgs::default()
            },
        );
        assert!(!form.fade_enabled);

        apply_tone(
            &mut form,
            &ToneArgs {
                fade: true,
                ..ToneArgs::default()
            },
        );
        assert!(form.fade_enabled);
    }
}
