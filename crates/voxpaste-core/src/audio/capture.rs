use crate::{AudioError, CoreResult};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        atomic::{AtomicBool, Ordering},
        {Arc, Mutex},
    },
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// Ring-buffer bound: five minutes of 48kHz mono (~58MB of f32). Older
/// samples fall off the front once a recording runs past this.
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 5;

/// An audio input device as presented to the UI.
///
/// `id` doubles as the persisted selection key; CPAL identifies input
/// devices by name, so the two fields carry the same value today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Stable identifier used for persistence and re-selection.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
}

#[track_caller]
fn device_err(reason: String) -> AudioError {
    AudioError::DeviceError {
        reason,
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Push-to-talk capture over a CPAL input stream.
///
/// Samples land in a shared ring buffer from the audio callback;
/// multi-channel devices are downmixed to mono on the way in. The
/// `closing` flag is raised before the stream is dropped so a callback
/// still in flight never writes after `stop()` has drained the buffer.
pub struct AudioCapturer {
    device: Device,
    config: StreamConfig,
    sample_rate: u32,
    channels: usize,
    selected_device: Option<String>,
    stream: Option<Stream>,
    buffer: Arc<Mutex<VecDeque<f32>>>,
    closing: Arc<AtomicBool>,
}

impl AudioCapturer {
    /// Bind to the system default input device.
    #[track_caller]
    #[instrument]
    pub fn new() -> CoreResult<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(AudioError::NoMicrophoneFound {
                location: ErrorLocation::from(Location::caller()),
            })?;

        let (config, sample_rate, channels) = Self::resolve_config(&device)?;

        info!(sample_rate, channels, "AudioCapturer initialized");

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
            selected_device: None,
            stream: None,
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_BUFFER_SAMPLES))),
            closing: Arc::new(AtomicBool::new(false)),
        })
    }

    #[track_caller]
    fn resolve_config(device: &Device) -> CoreResult<(StreamConfig, u32, usize)> {
        let config = device
            .default_input_config()
            .map_err(|e| device_err(format!("Failed to get config: {}", e)))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        Ok((config.into(), sample_rate, channels))
    }

    /// Enumerate the currently available input devices.
    pub fn list_devices() -> Vec<AudioDevice> {
        let host = cpal::default_host();

        let Ok(inputs) = host.input_devices() else {
            return Vec::new();
        };

        inputs
            .filter_map(|device| device.name().ok())
            .map(|name| AudioDevice {
                id: name.clone(),
                name,
            })
            .collect()
    }

    /// Switch the capture device. `None` returns to the system default.
    ///
    /// Rejected while a recording is in progress; the stream is bound to
    /// the device it was built from.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn select_device(&mut self, device_id: Option<&str>) -> CoreResult<()> {
        if self.stream.is_some() {
            return Err(device_err(
                "Cannot switch input device while recording".to_string(),
            ));
        }

        let host = cpal::default_host();

        let device = match device_id {
            Some(name) => host
                .input_devices()
                .map_err(|e| device_err(format!("Failed to enumerate input devices: {}", e)))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| AudioError::DeviceNotFound {
                    name: name.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?,
            None => host
                .default_input_device()
                .ok_or(AudioError::NoMicrophoneFound {
                    location: ErrorLocation::from(Location::caller()),
                })?,
        };

        let (config, sample_rate, channels) = Self::resolve_config(&device)?;

        self.device = device;
        self.config = config;
        self.sample_rate = sample_rate;
        self.channels = channels;
        self.selected_device = device_id.map(str::to_string);

        info!(device = ?self.selected_device, sample_rate, "Input device selected");

        Ok(())
    }

    /// The id of the explicitly selected device, if any.
    pub fn selected_device(&self) -> Option<&str> {
        self.selected_device.as_deref()
    }

    /// Open the input stream and begin buffering samples.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        let buffer = Arc::clone(&self.buffer);
        let closing = Arc::clone(&self.closing);
        let channels = self.channels;

        self.closing.store(false, Ordering::Release);

        // Discard whatever the previous session left behind.
        buffer
            .lock()
            .map_err(|e| device_err(format!("Failed to lock sample buffer: {}", e)))?
            .clear();

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // stop() raises `closing` before tearing the stream
                    // down; a callback that fires during teardown must not
                    // write.
                    if closing.load(Ordering::Acquire) {
                        return;
                    }
                    // A poisoned buffer lock still holds valid samples;
                    // recover rather than dropping the user's audio.
                    let mut buf = buffer.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    if channels > 1 {
                        // Downmix interleaved frames to mono by averaging.
                        for frame in data.chunks(channels) {
                            let mono = frame.iter().sum::<f32>() / channels as f32;
                            buf.push_back(mono);
                        }
                    } else {
                        buf.extend(data.iter().copied());
                    }
                    while buf.len() > MAX_BUFFER_SAMPLES {
                        buf.pop_front();
                    }
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| device_err(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| device_err(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        info!("Audio capture started");

        Ok(())
    }

    /// Tear the stream down and drain the buffered samples.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> CoreResult<Vec<f32>> {
        // Raise the flag first: some backends return from Stream::drop
        // before the final callback has run.
        self.closing.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            // Brief yield so an in-flight callback observes the flag and
            // finishes before the buffer is drained.
            std::thread::sleep(std::time::Duration::from_millis(5));
            info!("Audio capture stopped");
        }

        let samples: Vec<f32> = self
            .buffer
            .lock()
            .map_err(|e| device_err(format!("Failed to lock sample buffer: {}", e)))?
            .iter()
            .copied()
            .collect();

        debug!(sample_count = samples.len(), "Captured audio samples");

        Ok(samples)
    }

    pub fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
