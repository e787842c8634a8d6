//! Sample/second conversions at the engine's working sample rate
//!
//! Narration zones and narration durations are stored as sample counts at
//! 48 kHz; the timeline itself runs in floating-point seconds. All
//! conversions between the two go through this module.

/// Working sample rate for zones, durations and decoded buffers
pub const SAMPLE_RATE: u32 = 48_000;

/// Convert a sample count at [`SAMPLE_RATE`] to seconds
pub fn samples_to_seconds(samples: u64) -> f64 {
    samples as f64 / SAMPLE_RATE as f64
}

/// Convert a signed sample offset at [`SAMPLE_RATE`] to seconds
pub fn offset_to_seconds(samples: i64) -> f64 {
    samples as f64 / SAMPLE_RATE as f64
}

/// Rescale a frame count from a source rate to [`SAMPLE_RATE`]
///
/// Uses integer arithmetic so that a 44.1 kHz file of N frames maps to the
/// same working length every time.
pub fn rescale_frames(frames: u64, source_rate: u32) -> u64 {
    if source_rate == 0 {
        return 0;
    }
    if source_rate == SAMPLE_RATE {
        return frames;
    }
    ((frames as u128 * SAMPLE_RATE as u128) / source_rate as u128) as u64
}
