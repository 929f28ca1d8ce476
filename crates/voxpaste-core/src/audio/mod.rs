pub(crate) mod capture;
mod engine;
mod manager;
mod resampler;

pub(crate) use {capture::AudioCapturer, engine::SttEngine, resampler::Resampler};

pub use {capture::AudioDevice, engine::Transcription, manager::AudioManager};
