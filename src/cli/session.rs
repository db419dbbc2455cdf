//! Interactive session
//!
//! A line-oriented stand-in for the generator form. Every field is edited as
//! text and only parsed when `generate` or `preview` is issued. Errors are
//! printed and the session carries on with its state untouched.

use std::io::{self, BufRead, Write};

use log::debug;

use crate::cli::commands::{describe_error, run_export, run_preview};
use crate::engine::export::{ExportFormat, Exporter};
use crate::engine::preview::{PlaybackDevice, Previewer};
use crate::engine::synth::Synthesizer;
use crate::form::{FormField, FormInput};

const HELP: &str = "\
Commands:
  set <field> <value>   Edit a field (left, right, hours, minutes, seconds, volume, format)
  fade on|off           Toggle the 100ms fade-in/fade-out
  format <fmt>          Choose wav, flac or mp3
  show                  Print the current form
  preview               Play three seconds of the current tones
  generate              Render the current form to a file
  help                  Show this text
  quit                  Leave the session";

/// Whether the session should keep reading lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Form state plus the engine pieces the form's buttons drive
pub struct Session<D: PlaybackDevice> {
    form: FormInput,
    exporter: Exporter,
    synthesizer: Synthesizer,
    previewer: Previewer<D>,
}

impl<D: PlaybackDevice> Session<D> {
    pub fn new(form: FormInput, exporter: Exporter, synthesizer: Synthesizer, device: D) -> Self {
        Self {
            form,
            exporter,
            synthesizer,
            previewer: Previewer::with_synthesizer(device, synthesizer),
        }
    }

    pub fn form(&self) -> &FormInput {
        &self.form
    }

    pub fn previewer(&self) -> &Previewer<D> {
        &self.previewer
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> io::Result<()> {
        writeln!(
            output,
            "Binaural Generator v{} (type 'help' for commands)",
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(output, "{}", self.form.beat_label())?;
        prompt(output)?;

        for line in input.lines() {
            let line = line?;
            if self.handle_line(&line, output)? == Flow::Quit {
                return Ok(());
            }
            prompt(output)?;
        }

        writeln!(output)?;
        Ok(())
    }

    /// Execute one command line
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        debug!("Session command: {:?} {:?}", command, rest);

        match command.to_lowercase().as_str() {
            "" => {}
            "set" => self.set(rest, out)?,
            "fade" => self.fade(rest, out)?,
            "format" => self.edit(FormField::Format, rest, out)?,
            "show" => self.show(out)?,
            "generate" | "export" => self.generate(out)?,
            "preview" | "test" => self.preview(out)?,
            "help" | "?" => writeln!(out, "{}", HELP)?,
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            other => writeln!(out, "Unknown command '{}'. Type 'help' for commands.", other)?,
        }

        Ok(Flow::Continue)
    }

    fn set<W: Write>(&mut self, args: &str, out: &mut W) -> io::Result<()> {
        let (name, value) = match args.split_once(char::is_whitespace) {
            Some((name, value)) => (name, value.trim()),
            None => (args, ""),
        };

        match FormField::parse(name) {
            Some(field) => self.edit(field, value, out),
            None => writeln!(out, "Unknown field '{}'", name),
        }
    }

    fn edit<W: Write>(&mut self, field: FormField, value: &str, out: &mut W) -> io::Result<()> {
        self.form.set(field, value);
        if field.affects_beat() {
            writeln!(out, "{}", self.form.beat_label())?;
        }
        Ok(())
    }

    fn fade<W: Write>(&mut self, args: &str, out: &mut W) -> io::Result<()> {
        match args.to_lowercase().as_str() {
            "on" | "yes" | "true" => self.form.fade_enabled = true,
            "off" | "no" | "false" => self.form.fade_enabled = false,
            "" => self.form.fade_enabled = !self.form.fade_enabled,
            other => return writeln!(out, "Expected 'on' or 'off', got '{}'", other),
        }
        writeln!(
            out,
            "Fade: {}",
            if self.form.fade_enabled { "on" } else { "off" }
        )
    }

    fn show<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for field in FormField::ALL {
            writeln!(out, "  {:<16} {}", field.label(), self.form.get(field))?;
        }
        writeln!(
            out,
            "  {:<16} {}",
            "fade",
            if self.form.fade_enabled { "on" } else { "off" }
        )?;
        let formats: Vec<String> = ExportFormat::ALL.iter().map(|f| f.to_string()).collect();
        writeln!(out, "  {:<16} {}", "formats", formats.join(", "))?;
        writeln!(
            out,
            "  {:<16} {} ({})",
            "output",
            self.exporter.output_dir().display(),
            self.exporter.encoding()
        )?;
        writeln!(out, "{}", self.form.beat_label())
    }

    fn generate<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match run_export(&self.form, &self.synthesizer, &self.exporter) {
            Ok(result) => writeln!(out, "Saved as:\n{}", result.filename),
            Err(err) => writeln!(out, "{}", describe_error(&err)),
        }
    }

    fn preview<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match run_preview(&self.form, &self.previewer) {
            // Detached: the session keeps accepting commands during playback
            Ok(_handle) => writeln!(out, "Playing preview..."),
            Err(err) => writeln!(out, "{}", describe_error(&err)),
        }
    }
}

fn prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}
