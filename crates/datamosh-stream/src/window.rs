//! Effect window resolution.
//!
//! Effect times are given on the source timeline. The intermediate stream is
//! trimmed to start at `video_start`, so both ends are shifted by that amount
//! before being turned into frame indices.

use crate::{Error, Result};

/// Effect timing in seconds, as configured by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectTimes {
    /// Where the trimmed video starts on the source timeline.
    pub video_start: f64,
    /// Where the effect starts on the source timeline.
    pub effect_start: f64,
    /// Where the effect ends on the source timeline.
    pub effect_end: f64,
}

/// Inclusive range of frame indices the mosh policy applies to.
///
/// Indices may be negative when the effect starts before the trimmed stream;
/// membership is still checked against the signed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectWindow {
    pub start_index: i64,
    pub end_index: i64,
}

impl EffectWindow {
    pub fn new(start_index: i64, end_index: i64) -> Self {
        Self {
            start_index,
            end_index,
        }
    }

    /// Whether `index` lies within `[start_index, end_index]`.
    pub fn contains(&self, index: usize) -> bool {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        !(index < self.start_index || index > self.end_index)
    }

    /// Number of indices covered, counting from 0 for windows that start
    /// before the stream.
    pub fn frame_span(&self) -> u64 {
        if self.end_index < 0 || self.end_index < self.start_index {
            return 0;
        }
        // Both bounds are non-negative here, so the difference fits.
        (self.end_index - self.start_index.max(0)) as u64 + 1
    }
}

impl std::fmt::Display for EffectWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start_index, self.end_index)
    }
}

/// The effect window together with the trimmed-timeline seconds it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedWindow {
    /// Effect start on the trimmed timeline.
    pub shifted_start: f64,
    /// Effect end on the trimmed timeline.
    pub shifted_end: f64,
    /// Length of the effect in seconds.
    pub hold_duration: f64,
    pub window: EffectWindow,
}

/// Resolve effect times and a frame rate into an inclusive index window.
///
/// # Errors
///
/// - [`Error::InvalidFrameRate`] if `fps` is zero.
/// - [`Error::InvalidTime`] if any time is NaN or infinite.
/// - [`Error::InvertedWindow`] if the shifted start lies after the shifted
///   end. Callers must treat this as fatal before doing any transcoding.
pub fn resolve(times: &EffectTimes, fps: u32) -> Result<ResolvedWindow> {
    if fps == 0 {
        return Err(Error::InvalidFrameRate(fps));
    }

    for (field, value) in [
        ("video start", times.video_start),
        ("effect start", times.effect_start),
        ("effect end", times.effect_end),
    ] {
        if !value.is_finite() {
            return Err(Error::InvalidTime { field, value });
        }
    }

    let shifted_start = times.effect_start - times.video_start;
    let hold_duration = times.effect_end - times.effect_start;
    let shifted_end = shifted_start + hold_duration;

    if shifted_start > shifted_end {
        return Err(Error::inverted_window(shifted_start, shifted_end));
    }

    let fps = f64::from(fps);
    let window = EffectWindow::new(
        (shifted_start * fps).floor() as i64,
        (shifted_end * fps).floor() as i64,
    );

    Ok(ResolvedWindow {
        shifted_start,
        shifted_end,
        hold_duration,
        window,
    })
}
