//! Time handling for the engine.
//!
//! All times live on a shared millisecond axis and are quantized to the
//! [`FRAME_MS`](crate::config::FRAME_MS) grid at the DSL boundary, so plain
//! integer milliseconds are enough. Durations that are not yet known (nested
//! sub-players discover theirs on the first complete cycle) are `Option<Ms>`.

use crate::config::FRAME_MS;

/// Milliseconds on the timeline axis.
pub type Ms = i64;

/// Quantize a duration to whole frames, stretched by the playback speed.
///
/// A 100 ms duration at speed 2 takes 48 ms of timeline (3 frames); the same
/// duration at speed 0.5 takes 208 ms (13 frames).
pub fn adjust_duration(ms: Ms, speed: f64) -> Ms {
    if speed <= 0.0 {
        return 0;
    }
    let frames = (ms as f64 / speed / FRAME_MS as f64).round() as Ms;
    frames * FRAME_MS
}

/// Round an arbitrary time down to the frame grid.
#[inline]
pub fn to_frame_floor(ms: Ms) -> Ms {
    ms.div_euclid(FRAME_MS) * FRAME_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_duration_is_frame_aligned() {
        for ms in [0, 1, 15, 16, 17, 100, 999, 1000] {
            for speed in [0.5, 1.0, 2.0, 3.0] {
                assert_eq!(adjust_duration(ms, speed) % FRAME_MS, 0);
            }
        }
    }

    #[test]
    fn test_adjust_duration_values() {
        assert_eq!(adjust_duration(16, 1.0), 16);
        assert_eq!(adjust_duration(100, 1.0), 96);
        assert_eq!(adjust_duration(100, 2.0), 48);
        assert_eq!(adjust_duration(100, 0.5), 208);
        assert_eq!(adjust_duration(1000, 1.0), 1008);
    }

    #[test]
    fn test_adjust_duration_degenerate_speed() {
        assert_eq!(adjust_duration(100, 0.0), 0);
        assert_eq!(adjust_duration(100, -1.0), 0);
    }

    #[test]
    fn test_frame_floor() {
        assert_eq!(to_frame_floor(0), 0);
        assert_eq!(to_frame_floor(15), 0);
        assert_eq!(to_frame_floor(16), 16);
        assert_eq!(to_frame_floor(47), 32);
    }
}
