//! Immutable per-run mosh configuration.

use crate::transducer::{Transducer, DEFAULT_REPEAT_COUNT};
use crate::window::{resolve, EffectTimes, ResolvedWindow};
use crate::Result;

/// Everything the resolver and transducer need for one run.
///
/// Times are seconds on the source video's timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct MoshSettings {
    /// Start of the trimmed clip.
    pub video_start: f64,
    /// End of the trimmed clip.
    pub video_end: f64,
    /// Start of the mosh effect.
    pub effect_start: f64,
    /// End of the mosh effect.
    pub effect_end: f64,
    /// Copies written per predictive frame inside the window. Zero leaves
    /// only the frames outside the window.
    #[cfg_attr(feature = "serialize", serde(alias = "repeat_frames"))]
    pub repeat_count: u32,
    /// Frame rate the intermediate stream is converted to.
    pub fps: u32,
}

impl Default for MoshSettings {
    fn default() -> Self {
        Self {
            video_start: 0.0,
            video_end: 60.0,
            effect_start: 3.0,
            effect_end: 6.0,
            repeat_count: DEFAULT_REPEAT_COUNT,
            fps: 30,
        }
    }
}

impl MoshSettings {
    pub fn effect_times(&self) -> EffectTimes {
        EffectTimes {
            video_start: self.video_start,
            effect_start: self.effect_start,
            effect_end: self.effect_end,
        }
    }

    /// Resolve the effect window for these settings.
    pub fn resolve_window(&self) -> Result<ResolvedWindow> {
        resolve(&self.effect_times(), self.fps)
    }

    /// Build a transducer, failing on an inverted window.
    pub fn transducer(&self) -> Result<Transducer> {
        let resolved = self.resolve_window()?;
        Ok(Transducer::new(resolved.window, self.repeat_count))
    }

    /// Length of the trimmed clip in seconds.
    pub fn clip_duration(&self) -> f64 {
        self.video_end - self.video_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EffectWindow, Error};

    #[test]
    fn test_defaults() {
        let settings = MoshSettings::default();
        assert_eq!(settings.repeat_count, 15);
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.clip_duration(), 60.0);
    }

    #[test]
    fn test_default_transducer_window() {
        let transducer = MoshSettings::default().transducer().unwrap();
        assert_eq!(transducer.window(), EffectWindow::new(90, 180));
        assert_eq!(transducer.repeat_count(), 15);
    }

    #[test]
    fn test_inverted_settings() {
        let settings = MoshSettings {
            effect_start: 8.0,
            effect_end: 4.0,
            ..MoshSettings::default()
        };
        assert!(matches!(
            settings.transducer(),
            Err(Error::InvertedWindow { .. })
        ));
    }
}
