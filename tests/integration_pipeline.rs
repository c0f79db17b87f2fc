//! Pipeline integration tests
//!
//! Tests for configuration loading, planning and the mosh pass through the
//! public library API. The ffmpeg stages are covered by dry runs, plus one
//! full run that is skipped when ffmpeg is not installed.

use datamosh::config::{self, Config};
use datamosh::pipeline::{output_filename, MoshPipeline};
use datamosh_av::ToolRegistry;
use datamosh_stream::{EffectWindow, MoshSettings, FRAME_MARKER};
use std::fs;
use tempfile::{tempdir, NamedTempFile};

fn keyframe(tag: u8) -> Vec<u8> {
    vec![0, 0, 0, 0, 0, 0, 0x01, 0xB0, tag]
}

fn predictive(tag: u8) -> Vec<u8> {
    vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x01, 0xB6, tag]
}

fn join_frames(frames: &[Vec<u8>]) -> Vec<u8> {
    frames.join(FRAME_MARKER.as_slice())
}

/// The transducer built from a loaded config moshes a synthetic stream.
#[test]
fn test_config_to_transducer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datamosh.toml");
    fs::write(
        &path,
        "[mosh]\nfps = 1\neffect_start = 1.0\neffect_end = 2.0\nrepeat_frames = 3\n",
    )
    .unwrap();

    let config = config::load_config(&path).unwrap();
    let transducer = config.mosh.transducer().unwrap();
    assert_eq!(transducer.window(), EffectWindow::new(1, 2));

    let raw = join_frames(&[keyframe(0), predictive(1), keyframe(2), predictive(3)]);
    let out = transducer.mosh(&raw);

    // K passes, P1 x3, K dropped, P3 passes.
    assert_eq!(out.stats.frames_out, 5);
    assert_eq!(out.stats.dropped_keyframes, 1);

    let mut expected = Vec::new();
    for frame in [keyframe(0), predictive(1), predictive(1), predictive(1), predictive(3)] {
        expected.extend_from_slice(&frame);
        expected.extend_from_slice(&FRAME_MARKER);
    }
    assert_eq!(out.data.as_ref(), expected.as_slice());
}

/// Without a keyframe the window never arms and the stream is unchanged.
#[test]
fn test_stream_without_keyframe_passes_through() {
    let settings = MoshSettings {
        fps: 1,
        effect_start: 0.0,
        effect_end: 10.0,
        ..MoshSettings::default()
    };
    let raw = join_frames(&[predictive(1), predictive(2), predictive(3)]);
    let out = settings.transducer().unwrap().mosh(&raw);

    let mut expected = raw.clone();
    expected.extend_from_slice(&FRAME_MARKER);
    assert_eq!(out.data.as_ref(), expected.as_slice());
    assert!(!out.stats.moshed());
}

#[test]
fn test_plan_output_path() {
    let input_dir = tempdir().unwrap();
    let input = input_dir.path().join("holiday clip.mov");
    fs::write(&input, b"not really a video").unwrap();

    let out_dir = tempdir().unwrap();
    let mut config = Config::default();
    config.output.dir = out_dir.path().to_path_buf();

    let plan = MoshPipeline::new(&config, ToolRegistry::default(), true)
        .plan(&input)
        .unwrap();
    assert_eq!(plan.deliverable, out_dir.path().join("moshed_holiday clip.mp4"));
    assert_eq!(output_filename(&input).unwrap(), "moshed_holiday clip.mp4");
}

#[test]
fn test_dry_run_uses_configured_width() {
    let input = NamedTempFile::new().unwrap();
    let out_dir = tempdir().unwrap();
    let mut config = Config::default();
    config.output.dir = out_dir.path().join("out");
    config.output.width = Some(480);

    let pipeline = MoshPipeline::new(&config, ToolRegistry::default(), true);
    let plan = pipeline.plan(input.path()).unwrap();
    let report = pipeline.execute(&plan).unwrap();

    assert!(report.planned[2].contains("scale=480:-2"));
    assert!(report.planned[0].contains("-pix_fmt yuv420p"));
    assert!(!config.output.dir.exists());
}

#[test]
fn test_dry_run_uses_registered_ffmpeg() {
    let input = NamedTempFile::new().unwrap();
    let out_dir = tempdir().unwrap();
    let mut config = Config::default();
    config.output.dir = out_dir.path().to_path_buf();

    let tools = ToolRegistry::default().with_tool("ffmpeg", "/opt/ffmpeg/bin/ffmpeg");
    let pipeline = MoshPipeline::new(&config, tools, true);
    let plan = pipeline.plan(input.path()).unwrap();
    let report = pipeline.execute(&plan).unwrap();

    assert!(report.planned[0].starts_with("/opt/ffmpeg/bin/ffmpeg "));
    assert!(report.planned[2].starts_with("/opt/ffmpeg/bin/ffmpeg "));
}

#[test]
fn test_negative_window_plans() {
    // Effect before the trimmed clip starts: indices go negative and no
    // keyframe is forced.
    let input = NamedTempFile::new().unwrap();
    let mut config = Config::default();
    config.output.dir = tempdir().unwrap().path().join("out");
    config.mosh.video_start = 10.0;
    config.mosh.effect_start = 2.0;
    config.mosh.effect_end = 5.0;

    let pipeline = MoshPipeline::new(&config, ToolRegistry::default(), true);
    let plan = pipeline.plan(input.path()).unwrap();
    assert_eq!(plan.window(), EffectWindow::new(-240, -150));

    let report = pipeline.execute(&plan).unwrap();
    assert!(!report.planned[0].contains("-force_key_frames"));
}

/// Full run against a generated test pattern. Needs ffmpeg on PATH.
#[test]
fn test_full_run_with_ffmpeg() {
    let tools = ToolRegistry::discover(&Default::default());
    let Ok(ffmpeg) = tools.require("ffmpeg") else {
        eprintln!("ffmpeg not found, skipping");
        return;
    };

    let dir = tempdir().unwrap();
    let source = dir.path().join("pattern.mp4");
    let status = std::process::Command::new(&ffmpeg.path)
        .args(["-y", "-loglevel", "error", "-f", "lavfi", "-i"])
        .arg("testsrc=duration=3:size=160x120:rate=10")
        .arg(&source)
        .status()
        .unwrap();
    if !status.success() {
        eprintln!("ffmpeg could not generate a test pattern, skipping");
        return;
    }

    let mut config = Config::default();
    config.mosh = MoshSettings {
        video_start: 0.0,
        video_end: 3.0,
        effect_start: 1.0,
        effect_end: 2.0,
        repeat_count: 2,
        fps: 10,
    };
    config.output.dir = dir.path().join("moshed");
    config.output.keep_intermediates = true;

    let pipeline = MoshPipeline::new(&config, tools.clone(), false);
    let plan = pipeline.plan(&source).unwrap();
    let report = pipeline.execute(&plan).unwrap();

    assert_eq!(report.output, dir.path().join("moshed/moshed_pattern.mp4"));
    assert!(report.output.exists());
    assert_eq!(report.kept.len(), 2);
    assert!(report.kept.iter().all(|p| p.exists()));
    assert_eq!(
        report.kept[0],
        dir.path().join("moshed/pattern_datamoshing_input.avi")
    );
    assert_eq!(
        report.kept[1],
        dir.path().join("moshed/pattern_datamoshing_output.avi")
    );

    let stats = report.stats.unwrap();
    assert!(stats.frames_in > 0);
    assert!(stats.keyframes >= 1);
}
