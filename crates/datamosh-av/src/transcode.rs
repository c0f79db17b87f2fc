//! The two ffmpeg invocations around the mosh step.
//!
//! [`normalize_to_avi`] turns any source ffmpeg can read into an MPEG-4 Part 2
//! AVI at a fixed frame rate, trimmed to the requested clip, with a keyframe
//! forced where the effect begins. That layout is what the frame splitter
//! expects: `00dc`-terminated video chunks and VOS headers marking keyframes.
//!
//! [`encode_deliverable`] re-encodes the moshed AVI into the final container.
//! ffmpeg decodes the broken prediction chain as-is, which bakes the glitch
//! into ordinary frames that any player can show.

use std::path::Path;

use crate::command::{EncodeProgress, ToolCommand};
use crate::tools::ToolConfig;
use crate::{Error, Result};

/// Video codec for the intermediate AVI. Its keyframes carry the signature
/// the frame classifier looks for.
pub const INTERMEDIATE_CODEC: &str = "mpeg4";

/// Parameters for the source → intermediate AVI conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntermediateSpec {
    /// Output frame rate.
    pub fps: u32,
    /// Trim start on the source timeline, in seconds.
    pub video_start: f64,
    /// Trim end on the source timeline, in seconds.
    pub video_end: f64,
    /// Where to force a keyframe, in seconds on the trimmed timeline.
    pub keyframe_at: f64,
}

/// Parameters for the moshed AVI → deliverable encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverableSpec {
    /// Output frame rate.
    pub fps: u32,
    /// Scale to this width, keeping aspect ratio, when set.
    pub width: Option<u32>,
}

fn seconds(value: f64) -> String {
    format!("{}", value)
}

/// Build the ffmpeg command for [`normalize_to_avi`].
pub fn normalize_command(
    ffmpeg: &ToolConfig,
    input: &Path,
    output: &Path,
    spec: &IntermediateSpec,
) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-hide_banner", "-nostats", "-progress", "pipe:1"]);
    cmd.arg("-i");
    cmd.arg(input.to_string_lossy().as_ref());

    cmd.args(["-c:v", INTERMEDIATE_CODEC]);
    cmd.args(["-crf", "0"]);
    cmd.args(["-pix_fmt", "yuv420p"]);
    cmd.args(["-r", &spec.fps.to_string()]);
    cmd.args(["-ss", &seconds(spec.video_start)]);
    cmd.args(["-to", &seconds(spec.video_end)]);

    // A negative time would never match; the stream's first frame is a
    // keyframe anyway.
    if spec.keyframe_at >= 0.0 {
        cmd.args(["-force_key_frames", &seconds(spec.keyframe_at)]);
    }

    cmd.arg(output.to_string_lossy().as_ref());
    cmd
}

/// Build the ffmpeg command for [`encode_deliverable`].
pub fn deliverable_command(
    ffmpeg: &ToolConfig,
    input: &Path,
    output: &Path,
    spec: &DeliverableSpec,
) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(["-y", "-hide_banner", "-nostats", "-progress", "pipe:1"]);
    cmd.arg("-i");
    cmd.arg(input.to_string_lossy().as_ref());

    cmd.args(["-r", &spec.fps.to_string()]);

    if let Some(width) = spec.width {
        cmd.args(["-vf", &format!("scale={}:-2", width)]);
    }

    cmd.arg(output.to_string_lossy().as_ref());
    cmd
}

/// Convert `input` into the intermediate AVI at `output`.
///
/// # Errors
///
/// - [`Error::FileNotFound`] if `input` does not exist.
/// - [`Error::InvalidInput`] if the trim range is empty or `fps` is zero.
/// - [`Error::ToolNotFound`] / [`Error::ToolFailed`] from ffmpeg.
pub fn normalize_to_avi(
    ffmpeg: &ToolConfig,
    input: &Path,
    output: &Path,
    spec: &IntermediateSpec,
    on_progress: impl FnMut(&EncodeProgress),
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }
    if spec.fps == 0 {
        return Err(Error::InvalidInput("frame rate must be positive".into()));
    }
    if spec.video_end <= spec.video_start {
        return Err(Error::InvalidInput(format!(
            "clip end {}s is not after clip start {}s",
            spec.video_end, spec.video_start
        )));
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Normalizing {:?} -> {:?} ({} fps, {}s..{}s, keyframe at {}s)",
        input,
        output,
        spec.fps,
        spec.video_start,
        spec.video_end,
        spec.keyframe_at
    );

    normalize_command(ffmpeg, input, output, spec).execute_with_progress(on_progress)?;

    if !output.exists() {
        return Err(Error::tool_failed(
            "ffmpeg",
            format!("no intermediate written to {:?}", output),
        ));
    }

    Ok(())
}

/// Re-encode the moshed AVI at `input` into the deliverable at `output`.
///
/// # Errors
///
/// - [`Error::FileNotFound`] if `input` does not exist.
/// - [`Error::InvalidInput`] if `width` is zero or odd.
/// - [`Error::ToolNotFound`] / [`Error::ToolFailed`] from ffmpeg.
pub fn encode_deliverable(
    ffmpeg: &ToolConfig,
    input: &Path,
    output: &Path,
    spec: &DeliverableSpec,
    on_progress: impl FnMut(&EncodeProgress),
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }
    if let Some(width) = spec.width {
        if width == 0 || width % 2 != 0 {
            return Err(Error::InvalidInput(format!(
                "output width must be a positive even number, got {}",
                width
            )));
        }
    }

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Encoding {:?} -> {:?} ({} fps, width {:?})",
        input,
        output,
        spec.fps,
        spec.width
    );

    deliverable_command(ffmpeg, input, output, spec).execute_with_progress(on_progress)?;

    Ok(())
}
