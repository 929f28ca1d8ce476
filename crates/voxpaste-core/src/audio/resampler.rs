use crate::{AudioError, CoreResult};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

/// Frames fed to the FFT per iteration. Rubato wants a fixed input size;
/// the tail of a capture is zero-padded up to this and trimmed afterwards.
const FRAMES_PER_CHUNK: usize = 1024;

/// Converts captured audio to Whisper's 16 kHz using rubato's synchronous
/// FFT resampler, one fixed-size chunk at a time.
///
/// Scratch buffers are reused across chunks, so a conversion allocates
/// once for the output plus two fixed-size buffers at construction.
pub struct Resampler {
    fft: Fft<f32>,
    in_rate: u32,
    out_rate: u32,
    padded: Vec<f32>,
    rendered: Vec<f32>,
}

impl Resampler {
    #[track_caller]
    #[instrument]
    pub fn new(in_rate: u32, out_rate: u32) -> CoreResult<Self> {
        let fft = Fft::<f32>::new(
            in_rate as usize,
            out_rate as usize,
            FRAMES_PER_CHUNK,
            2, // sub_chunks
            1, // mono
            FixedSync::Input,
        )
        .map_err(|e| AudioError::ResamplingError {
            reason: format!("Failed to create resampler: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rendered = vec![0.0f32; fft.output_frames_max()];

        debug!(in_rate, out_rate, chunk = FRAMES_PER_CHUNK, "Resampler initialized");

        Ok(Self {
            fft,
            in_rate,
            out_rate,
            padded: vec![0.0f32; FRAMES_PER_CHUNK],
            rendered,
        })
    }

    #[track_caller]
    #[instrument(skip(self, samples))]
    pub fn resample(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        // Exact output length for the rate ratio; the zero-padded tail of
        // the final chunk produces surplus frames that get trimmed back to
        // this.
        let want = (samples.len() as f64 * self.out_rate as f64 / self.in_rate as f64) as usize;
        let mut out = Vec::with_capacity(want + FRAMES_PER_CHUNK);

        for chunk in samples.chunks(FRAMES_PER_CHUNK) {
            let frames_written = if chunk.len() == FRAMES_PER_CHUNK {
                Self::run_chunk(&mut self.fft, chunk, &mut self.rendered)?
            } else {
                self.padded[..chunk.len()].copy_from_slice(chunk);
                self.padded[chunk.len()..].fill(0.0);
                Self::run_chunk(&mut self.fft, &self.padded, &mut self.rendered)?
            };
            out.extend_from_slice(&self.rendered[..frames_written]);
        }

        out.truncate(want);

        debug!(
            input_len = samples.len(),
            output_len = out.len(),
            "Audio resampled"
        );

        Ok(out)
    }

    /// One fixed-size chunk through the FFT; returns frames written into
    /// `rendered`.
    #[track_caller]
    fn run_chunk(fft: &mut Fft<f32>, input: &[f32], rendered: &mut [f32]) -> CoreResult<usize> {
        let source = InterleavedSlice::new(input, 1, input.len()).map_err(|e| {
            AudioError::ResamplingError {
                reason: format!("Failed to wrap input chunk: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let len = rendered.len();
        let mut sink = InterleavedSlice::new_mut(rendered, 1, len).map_err(|e| {
            AudioError::ResamplingError {
                reason: format!("Failed to wrap output chunk: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let (_frames_read, frames_written) = fft
            .process_into_buffer(&source, &mut sink, None)
            .map_err(|e| AudioError::ResamplingError {
                reason: format!("Resampling failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(frames_written)
    }
}
