use crate::{
    audio::{AudioCapturer, AudioDevice, Resampler, SttEngine, Transcription},
    {AudioError, CoreResult},
};

use std::{panic::Location, path::Path};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Whisper's required input sample rate.
const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Facade over the audio pipeline: capture, resample, transcribe.
///
/// The Whisper model loads lazily through [`AudioManager::load_model`], so
/// the manager can be constructed (and devices enumerated) before any
/// model is on disk.
///
/// # Thread Safety
///
/// Not thread-safe; owns its components and expects a single caller,
/// typically behind an async mutex. [`AudioManager::transcribe`] blocks
/// for seconds, so callers run it from a dedicated task rather than a
/// shared event loop.
pub struct AudioManager {
    capturer: AudioCapturer,
    resampler: Option<Resampler>,
    engine: SttEngine,
}

impl AudioManager {
    /// Bind to the default input device with no model loaded.
    ///
    /// # Errors
    ///
    /// Returns error if no audio input device is present.
    #[track_caller]
    #[instrument]
    pub fn new() -> CoreResult<Self> {
        let capturer = AudioCapturer::new()?;

        info!("AudioManager initialized");

        Ok(Self {
            capturer,
            resampler: None,
            engine: SttEngine::new(),
        })
    }

    /// Whether a Whisper model is currently loaded.
    pub fn is_model_loaded(&self) -> bool {
        self.engine.is_loaded()
    }

    /// Load (or replace) the Whisper model.
    ///
    /// # Errors
    ///
    /// Returns error if the model file is missing or fails to parse.
    #[track_caller]
    #[instrument(skip(self, model_path))]
    pub fn load_model<P: AsRef<Path>>(&mut self, model_path: P, use_gpu: bool) -> CoreResult<()> {
        self.engine.load(model_path, use_gpu)
    }

    /// Start recording from the selected (or default) input device.
    ///
    /// A resampler is set up whenever the device rate differs from the
    /// 16kHz Whisper needs.
    ///
    /// # Errors
    ///
    /// Returns error if the audio device cannot be started.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start_recording(&mut self) -> CoreResult<()> {
        let device_rate = self.capturer.sample_rate();

        self.resampler = if device_rate == WHISPER_SAMPLE_RATE {
            None
        } else {
            debug!(device_rate, target_rate = WHISPER_SAMPLE_RATE, "Resampler configured");
            Some(Resampler::new(device_rate, WHISPER_SAMPLE_RATE)?)
        };

        self.capturer.start()?;

        info!("Recording started");

        Ok(())
    }

    /// Stop recording and return the captured audio at 16kHz mono.
    ///
    /// # Errors
    ///
    /// Returns error if no audio was captured.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop_recording(&mut self) -> CoreResult<Vec<f32>> {
        let raw = self.capturer.stop()?;

        if raw.is_empty() {
            return Err(AudioError::NoAudioCaptured {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let samples = match self.resampler.as_mut() {
            Some(resampler) => {
                let converted = resampler.resample(&raw)?;
                debug!(
                    raw_len = raw.len(),
                    converted_len = converted.len(),
                    "Audio resampled"
                );
                converted
            }
            None => raw,
        };

        info!(sample_count = samples.len(), "Recording stopped");

        Ok(samples)
    }

    /// Transcribe 16kHz mono samples.
    ///
    /// **WARNING**: blocks for 1-10 seconds. Do NOT call while holding a
    /// lock shared with latency-sensitive code.
    ///
    /// # Errors
    ///
    /// Returns error if no model is loaded or inference fails.
    #[track_caller]
    #[instrument(skip(self, samples))]
    pub fn transcribe(&mut self, samples: &[f32]) -> CoreResult<Transcription> {
        if samples.is_empty() {
            return Err(AudioError::NoAudioCaptured {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let started = std::time::Instant::now();
        let outcome = self.engine.transcribe(samples)?;

        info!(
            duration_ms = started.elapsed().as_millis(),
            text_len = outcome.text.len(),
            language = %outcome.language,
            "Transcription complete"
        );

        Ok(outcome)
    }

    /// Whether a capture stream is currently live.
    pub fn is_recording(&self) -> bool {
        self.capturer.is_capturing()
    }

    /// Enumerate available input devices.
    pub fn list_input_devices(&self) -> Vec<AudioDevice> {
        AudioCapturer::list_devices()
    }

    /// Switch the capture device; `None` selects the system default.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn set_input_device(&mut self, device_id: Option<&str>) -> CoreResult<()> {
        self.capturer.select_device(device_id)
    }

    /// The persisted-selection id of the active device, if not default.
    pub fn selected_device(&self) -> Option<&str> {
        self.capturer.selected_device()
    }
}
