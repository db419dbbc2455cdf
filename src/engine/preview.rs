//! Live preview playback
//!
//! A preview is always a fixed three-second render, independent of any
//! export duration. Playback is fire-and-forget: the caller gets control back
//! as soon as the device has accepted the buffer.
//!
//! cpal streams are not `Send` on every platform, so [`CpalDevice`] opens the
//! stream on its own playback thread and reports startup success or failure
//! back over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use log::{debug, error, info, warn};

use crate::engine::buffer::{StereoBuffer, SAMPLE_RATE};
use crate::engine::request::PreviewRequest;
use crate::engine::synth::Synthesizer;
use crate::error::{BinauralError, Result};

/// Length of every preview in seconds
pub const PREVIEW_SECONDS: f64 = 3.0;

/// How often the playback thread checks whether the buffer has drained
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Extra time the stream stays open after the last frame is handed over,
/// so the device can flush its own buffer
const DRAIN_TAIL: Duration = Duration::from_millis(150);

/// Slack added to the buffer duration before the playback thread gives up on
/// a device that stopped pulling samples
const STALL_GRACE: Duration = Duration::from_secs(2);

/// An audio output that can play a stereo buffer
pub trait PlaybackDevice {
    /// Start playing `buffer` and return without waiting for it to finish
    ///
    /// Whether a second call queues behind or cuts off an earlier one is up
    /// to the device.
    fn play(&self, buffer: StereoBuffer) -> Result<PlaybackHandle>;
}

/// Handle to a playback started by a [`PlaybackDevice`]
///
/// Dropping the handle detaches playback; it keeps running on its own thread.
#[derive(Debug)]
pub struct PlaybackHandle {
    thread: Option<JoinHandle<()>>,
    finished: Arc<AtomicBool>,
}

impl PlaybackHandle {
    /// Handle for playback driven by a background thread
    pub fn new(thread: JoinHandle<()>, finished: Arc<AtomicBool>) -> Self {
        Self {
            thread: Some(thread),
            finished,
        }
    }

    /// Handle for playback that has already completed
    pub fn completed() -> Self {
        Self {
            thread: None,
            finished: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether playback has ended, including when the stream failed to open
    /// or the device stopped pulling samples
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Block until playback ends
    pub fn wait(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Preview playback thread panicked");
            }
        }
    }
}

/// Synthesizes fixed-length previews and hands them to a device
#[derive(Debug)]
pub struct Previewer<D: PlaybackDevice> {
    device: D,
    synthesizer: Synthesizer,
}

impl Previewer<CpalDevice> {
    /// Previewer on the system's default output device
    pub fn with_default_device() -> Self {
        Self::new(CpalDevice)
    }
}

impl<D: PlaybackDevice> Previewer<D> {
    pub fn new(device: D) -> Self {
        Self::with_synthesizer(device, Synthesizer::default())
    }

    pub fn with_synthesizer(device: D, synthesizer: Synthesizer) -> Self {
        Self {
            device,
            synthesizer,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Render three seconds of audio and start playing it
    ///
    /// # Errors
    /// * `Device` - If no output device is available or it refuses the stream
    pub fn preview(
        &self,
        left_frequency: f64,
        right_frequency: f64,
        volume: f64,
        fade_enabled: bool,
    ) -> Result<PlaybackHandle> {
        self.play(&PreviewRequest {
            left_frequency,
            right_frequency,
            volume,
            fade_enabled,
        })
    }

    /// Render and play a parsed preview request
    pub fn play(&self, request: &PreviewRequest) -> Result<PlaybackHandle> {
        let synthesis = request.synthesis();
        let buffer = self.synthesizer.synthesize(&synthesis);

        info!(
            "Previewing {}Hz / {}Hz (beat {:.2}Hz) for {}s",
            request.left_frequency,
            request.right_frequency,
            synthesis.beat_frequency(),
            PREVIEW_SECONDS
        );

        self.device.play(buffer)
    }
}

// ============================================================================
// cpal output
// ============================================================================

/// The system's default output device, opened through cpal
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalDevice;

impl PlaybackDevice for CpalDevice {
    fn play(&self, buffer: StereoBuffer) -> Result<PlaybackHandle> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let finished = Arc::new(AtomicBool::new(false));
        let done = Arc::clone(&finished);
        let deadline = Duration::from_secs_f64(buffer.duration_secs()) + STALL_GRACE;

        let thread = thread::Builder::new()
            .name("binaural-preview".to_string())
            .spawn(move || {
                let stream = match open_stream(buffer, Arc::clone(&done)) {
                    Ok(stream) => stream,
                    Err(e) => {
                        done.store(true, Ordering::SeqCst);
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let started = Instant::now();
                while !done.load(Ordering::SeqCst) {
                    if started.elapsed() > deadline {
                        warn!("Output device stopped pulling samples; ending preview");
                        done.store(true, Ordering::SeqCst);
                        break;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                thread::sleep(DRAIN_TAIL);
                drop(stream);
                debug!("Preview stream closed");
            })
            .map_err(|e| BinauralError::Device {
                reason: format!("failed to start playback thread: {}", e),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(PlaybackHandle::new(thread, finished)),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => Err(BinauralError::Device {
                reason: "playback thread exited before the stream started".to_string(),
            }),
        }
    }
}

fn device_error(context: &str, err: impl std::fmt::Display) -> BinauralError {
    BinauralError::Device {
        reason: format!("{}: {}", context, err),
    }
}

/// Open the default output device and start streaming `buffer`
fn open_stream(buffer: StereoBuffer, done: Arc<AtomicBool>) -> Result<cpal::Stream> {
    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .ok_or_else(|| BinauralError::Device {
            reason: "no audio output device available".to_string(),
        })?;

    let supported = device
        .default_output_config()
        .map_err(|e| device_error("failed to get default output config", e))?;

    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let cursor = PlaybackCursor::new(
        &buffer,
        config.sample_rate.0,
        config.channels as usize,
        done,
    );

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, cursor)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, cursor)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, cursor)?,
        other => {
            return Err(BinauralError::Device {
                reason: format!("unsupported sample format: {:?}", other),
            });
        }
    };

    stream
        .play()
        .map_err(|e| device_error("failed to play audio stream", e))?;

    debug!(
        "Preview stream started ({} Hz, {} channels, {:?})",
        config.sample_rate.0, config.channels, sample_format
    );

    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut cursor: PlaybackCursor,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| cursor.fill(data),
            |err| error!("Preview stream error: {}", err),
            None,
        )
        .map_err(|e| device_error("failed to build audio stream", e))
}

// ============================================================================
// Playback cursor
// ============================================================================

/// Reads a 44.1kHz stereo buffer out at the device's rate and channel count
///
/// Rate conversion is linear interpolation between neighbouring frames. The
/// left and right channels go to the first two device channels; extra
/// channels are silent and a mono device gets the average of both.
struct PlaybackCursor {
    frames: Vec<[f32; 2]>,
    position: f64,
    step: f64,
    channels: usize,
    done: Arc<AtomicBool>,
}

impl PlaybackCursor {
    fn new(buffer: &StereoBuffer, device_rate: u32, channels: usize, done: Arc<AtomicBool>) -> Self {
        let frames = buffer
            .frames()
            .iter()
            .map(|&[l, r]| [l as f32, r as f32])
            .collect();

        Self {
            frames,
            position: 0.0,
            step: SAMPLE_RATE as f64 / device_rate.max(1) as f64,
            channels: channels.max(1),
            done,
        }
    }

    /// Next output frame, or silence once the buffer is exhausted
    fn next_frame(&mut self) -> [f32; 2] {
        let index = self.position.floor() as usize;
        if index >= self.frames.len() {
            self.done.store(true, Ordering::SeqCst);
            return [0.0, 0.0];
        }

        let frac = (self.position - index as f64) as f32;
        let current = self.frames[index];
        let frame = match self.frames.get(index + 1) {
            Some(next) if frac > 0.0 => [
                current[0] * (1.0 - frac) + next[0] * frac,
                current[1] * (1.0 - frac) + next[1] * frac,
            ],
            _ => current,
        };

        self.position += self.step;
        frame
    }

    /// Fill an interleaved device buffer
    fn fill<T>(&mut self, data: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        let channels = self.channels;
        for out in data.chunks_mut(channels) {
            let [left, right] = self.next_frame();
            if channels == 1 {
                out[0] = T::from_sample((left + right) * 0.5);
                continue;
            }
            for (ch, sample) in out.iter_mut().enumerate() {
                *sample = match ch {
                    0 => T::from_sample(left),
                    1 => T::from_sample(right),
                    _ => T::EQUILIBRIUM,
                };
            }
        }
    }
}
