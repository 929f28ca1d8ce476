use crate::audio::Resampler;

const MIC_RATE: u32 = 48_000;
const WHISPER_RATE: u32 = 16_000;

/// Absolute slack on expected output lengths; the chunked FFT flushes on
/// fixed boundaries so the count is approximate.
const SLACK: usize = 100;

fn close_enough(got: usize, want: usize) -> bool {
    got.abs_diff(want) < SLACK
}

/// WHAT: One second of 48kHz input yields roughly one second at 16kHz
/// WHY: Whisper only accepts 16kHz mono; the length ratio must hold
#[test]
#[allow(clippy::unwrap_used)]
fn given_one_second_at_48khz_when_resampling_then_one_third_of_the_samples() {
    // Given: A 48kHz -> 16kHz converter and one second of DC signal
    let mut resampler = Resampler::new(MIC_RATE, WHISPER_RATE).unwrap();
    let input = vec![0.25f32; MIC_RATE as usize];

    // When: Converting
    let output = resampler.resample(&input).unwrap();

    // Then: Roughly 16k samples out, none of them NaN or infinite
    assert!(
        close_enough(output.len(), WHISPER_RATE as usize),
        "expected ~{} samples, got {}",
        WHISPER_RATE,
        output.len()
    );
    assert!(output.iter().all(|s| s.is_finite()));
}

/// WHAT: Empty input produces empty output
/// WHY: A zero-length capture must not reach the FFT
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_samples_when_resampling_then_nothing_out() {
    let mut resampler = Resampler::new(MIC_RATE, WHISPER_RATE).unwrap();

    let output = resampler.resample(&[]).unwrap();

    assert!(output.is_empty());
}

/// WHAT: A sine tone survives conversion with bounded amplitude
/// WHY: The converter must not ring or clip the signal it hands to STT
#[test]
#[allow(clippy::unwrap_used)]
fn given_sine_tone_when_resampling_then_signal_stays_bounded() {
    // Given: A tenth of a second of a 440Hz-ish tone at 48kHz
    let mut resampler = Resampler::new(MIC_RATE, WHISPER_RATE).unwrap();
    let input: Vec<f32> = (0..4800)
        .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * 440.0 / MIC_RATE as f32).sin() * 0.8)
        .collect();

    // When: Converting
    let output = resampler.resample(&input).unwrap();

    // Then: A third of the input length, amplitude within a small margin of
    // the source tone
    assert!(close_enough(output.len(), 1600));
    assert!(output.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
}

/// WHAT: Input shorter than one FFT chunk still converts
/// WHY: The zero-padded tail path must hold for tiny captures
#[test]
#[allow(clippy::unwrap_used)]
fn given_sub_chunk_input_when_resampling_then_proportional_output() {
    // Given: 300 input frames, well under the 1024-frame chunk
    let mut resampler = Resampler::new(MIC_RATE, WHISPER_RATE).unwrap();
    let input = vec![0.5f32; 300];

    // When: Converting
    let output = resampler.resample(&input).unwrap();

    // Then: The padding was trimmed back to the proportional length
    assert_eq!(output.len(), 100);
}
