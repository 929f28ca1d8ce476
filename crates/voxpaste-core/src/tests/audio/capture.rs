use crate::audio::capture::MAX_BUFFER_SAMPLES;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Push `data` the way the capture callback does: append, then trim the
/// front back to the ring-buffer bound.
fn push_bounded(buf: &mut VecDeque<f32>, data: &[f32]) {
    buf.extend(data.iter().copied());
    while buf.len() > MAX_BUFFER_SAMPLES {
        buf.pop_front();
    }
}

/// WHAT: The ring buffer evicts from the front once full
/// WHY: A recording left running for an hour must not grow without bound
#[test]
fn given_full_ring_buffer_when_pushing_then_oldest_samples_leave_first() {
    // Given: A buffer filled to the bound with zeros
    let mut buf: VecDeque<f32> = std::iter::repeat(0.0f32).take(MAX_BUFFER_SAMPLES).collect();

    // When: One more callback's worth of distinct samples arrives
    push_bounded(&mut buf, &[1.0f32; 512]);

    // Then: Size is unchanged and the newest samples are at the back
    assert_eq!(buf.len(), MAX_BUFFER_SAMPLES);
    assert!((buf[MAX_BUFFER_SAMPLES - 1] - 1.0).abs() < f32::EPSILON);
    assert!((buf[MAX_BUFFER_SAMPLES - 512] - 1.0).abs() < f32::EPSILON);
    assert!(buf[MAX_BUFFER_SAMPLES - 513].abs() < f32::EPSILON);
}

/// WHAT: Interleaved stereo frames downmix to mono by averaging
/// WHY: Multi-channel devices must feed Whisper a single channel
#[test]
fn given_stereo_frames_when_downmixing_then_channels_averaged() {
    // Given: Interleaved stereo data with distinct channel values
    let channels = 2usize;
    let data: Vec<f32> = vec![0.2, 0.4, 0.6, 0.8, -1.0, 1.0];
    let mut buf: VecDeque<f32> = VecDeque::new();

    // When: Downmixing the way the capture callback does
    for frame in data.chunks(channels) {
        let mono = frame.iter().sum::<f32>() / channels as f32;
        buf.push_back(mono);
    }

    // Then: Each frame collapses to the mean of its channels
    let mixed: Vec<f32> = buf.into_iter().collect();
    assert_eq!(mixed.len(), 3);
    assert!((mixed[0] - 0.3).abs() < 1e-6);
    assert!((mixed[1] - 0.7).abs() < 1e-6);
    assert!(mixed[2].abs() < 1e-6);
}

/// WHAT: Samples survive a poisoned buffer lock
/// WHY: A panic elsewhere must not cost the user their recording
#[test]
#[allow(clippy::unwrap_used, clippy::panic)]
fn given_poisoned_lock_when_draining_then_samples_intact() {
    // Given: A holder panics with the buffer lock taken
    let shared = Arc::new(Mutex::new(VecDeque::from(vec![0.25f32; 64])));
    let poisoner = Arc::clone(&shared);
    let _ = std::thread::spawn(move || {
        let _held = poisoner.lock().unwrap();
        panic!("poison the buffer lock");
    })
    .join();
    assert!(shared.lock().is_err());

    // When: Draining through the recovery path the callback uses
    let drained: Vec<f32> = shared
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .copied()
        .collect();

    // Then: Every sample is still there
    assert_eq!(drained, vec![0.25f32; 64]);
}

/// WHAT: Concurrent callers never push the buffer past its bound
/// WHY: The callback and stop() race on the same buffer
#[test]
#[allow(clippy::unwrap_used)]
fn given_concurrent_pushers_when_racing_then_bound_holds() {
    // Given: Writers hammering the shared buffer from several threads
    let shared = Arc::new(Mutex::new(VecDeque::new()));

    let writers: Vec<_> = (0..4u8)
        .map(|value| {
            let buf = Arc::clone(&shared);
            std::thread::spawn(move || {
                let batch = vec![f32::from(value); 64];
                for _ in 0..500 {
                    let mut guard = buf.lock().unwrap_or_else(|e| e.into_inner());
                    push_bounded(&mut guard, &batch);
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }

    // Then: Nothing was lost or duplicated and the bound held
    let buf = shared.lock().unwrap();
    assert_eq!(buf.len(), 4 * 500 * 64);
    assert!(buf.len() <= MAX_BUFFER_SAMPLES);
    assert!(buf.iter().all(|s| s.is_finite()));
}
