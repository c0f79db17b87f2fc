use crate::config::{Config, OutputConfig};
use anyhow::{Context, Result};
use datamosh_av::transcode::{self, DeliverableSpec, IntermediateSpec};
use datamosh_av::workspace::{INTERMEDIATE_INPUT, INTERMEDIATE_OUTPUT};
use datamosh_av::{EncodeProgress, ToolConfig, ToolRegistry, Workspace};
use datamosh_stream::{EffectWindow, MoshSettings, MoshStats, ResolvedWindow, Transducer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(f32, &str) + Send + Sync>;

/// Name of the deliverable for `input`: `moshed_<stem>.mp4`.
pub fn output_filename(input: &Path) -> Result<String> {
    let stem = input
        .file_stem()
        .with_context(|| format!("Input has no file name: {:?}", input))?;
    Ok(format!("moshed_{}.mp4", stem.to_string_lossy()))
}

/// A checked job: the effect window is resolved and every path is known,
/// but nothing has touched the filesystem yet.
#[derive(Debug, Clone)]
pub struct MoshPlan {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub deliverable: PathBuf,
    pub settings: MoshSettings,
    pub resolved: ResolvedWindow,
    pub width: Option<u32>,
    pub keep_intermediates: bool,
}

impl MoshPlan {
    pub fn window(&self) -> EffectWindow {
        self.resolved.window
    }

    pub fn transducer(&self) -> Transducer {
        Transducer::new(self.resolved.window, self.settings.repeat_count)
    }

    /// The keyframe is forced where the effect begins on the trimmed clip.
    pub fn intermediate_spec(&self) -> IntermediateSpec {
        IntermediateSpec {
            fps: self.settings.fps,
            video_start: self.settings.video_start,
            video_end: self.settings.video_end,
            keyframe_at: self.resolved.shifted_start,
        }
    }

    pub fn deliverable_spec(&self) -> DeliverableSpec {
        DeliverableSpec {
            fps: self.settings.fps,
            width: self.width,
        }
    }
}

impl fmt::Display for MoshPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start time from original video: {}", self.settings.video_start)?;
        writeln!(f, "end time from original video: {}", self.settings.video_end)?;
        writeln!(f, "mosh effect applied at: {}", self.resolved.shifted_start)?;
        writeln!(
            f,
            "mosh effect stops being applied at: {}",
            self.resolved.shifted_end
        )?;
        write!(
            f,
            "frames moshed: {} ({} frames) at {} fps, {} repeats per frame",
            self.resolved.window,
            self.resolved.window.frame_span(),
            self.settings.fps,
            self.settings.repeat_count
        )
    }
}

/// What a finished (or dry) run produced.
#[derive(Debug, Clone)]
pub struct MoshReport {
    /// The deliverable path. Not written on a dry run.
    pub output: PathBuf,
    pub window: EffectWindow,
    /// `None` on a dry run.
    pub stats: Option<MoshStats>,
    /// Intermediate files copied into the output directory.
    pub kept: Vec<PathBuf>,
    /// Commands a dry run would have executed.
    pub planned: Vec<String>,
}

/// Runs one video through normalize, mosh and encode.
pub struct MoshPipeline {
    settings: MoshSettings,
    output: OutputConfig,
    tools: ToolRegistry,
    dry_run: bool,
    progress_callback: Option<ProgressCallback>,
}

impl MoshPipeline {
    pub fn new(config: &Config, tools: ToolRegistry, dry_run: bool) -> Self {
        Self {
            settings: config.mosh,
            output: config.output.clone(),
            tools,
            dry_run,
            progress_callback: None,
        }
    }

    /// Build a pipeline with tools discovered from the config's `[tools]` section.
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self::new(config, ToolRegistry::discover(&config.tools), dry_run)
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn report_progress(&self, progress: f32, step: &str) {
        if let Some(ref cb) = self.progress_callback {
            cb(progress, step);
        }
        tracing::info!("[{:.0}%] {}", progress, step);
    }

    /// Check the input and resolve the effect window.
    ///
    /// An inverted window is rejected here, before any directory is created
    /// or any subprocess is started.
    pub fn plan(&self, input: &Path) -> Result<MoshPlan> {
        if !input.is_file() {
            anyhow::bail!(
                "Couldn't find {}. You might want to check the file name",
                input.display()
            );
        }

        let resolved = match self.settings.resolve_window() {
            Ok(resolved) => resolved,
            Err(e @ datamosh_stream::error::Error::InvertedWindow { .. }) => {
                return Err(anyhow::Error::new(e)
                    .context("No moshing will occur because --effect-start begins after --effect-end"));
            }
            Err(e) => return Err(e).context("Invalid effect window"),
        };

        let deliverable = self.output.dir.join(output_filename(input)?);

        Ok(MoshPlan {
            input: input.to_path_buf(),
            output_dir: self.output.dir.clone(),
            deliverable,
            settings: self.settings,
            resolved,
            width: self.output.width,
            keep_intermediates: self.output.keep_intermediates,
        })
    }

    /// Execute a plan and return the deliverable path with the mosh counters.
    pub fn execute(&self, plan: &MoshPlan) -> Result<MoshReport> {
        self.report_progress(0.0, &format!("Effect window {}", plan.window()));

        if self.dry_run {
            return Ok(self.dry_run_report(plan));
        }

        let ffmpeg = self
            .tools
            .require("ffmpeg")
            .context("ffmpeg is required to mosh videos")?;

        std::fs::create_dir_all(&plan.output_dir).with_context(|| {
            format!("Failed to create output directory: {:?}", plan.output_dir)
        })?;

        let workspace = Workspace::new(&plan.input)?;
        let input_avi = workspace.intermediate_input();
        let output_avi = workspace.intermediate_output();

        self.report_progress(5.0, "Converting to intermediate AVI");
        let clip_duration = plan.settings.clip_duration();
        transcode::normalize_to_avi(
            ffmpeg,
            &plan.input,
            &input_avi,
            &plan.intermediate_spec(),
            |p| self.encode_progress(5.0, 40.0, clip_duration, p),
        )
        .context("Failed to convert input to AVI")?;

        self.report_progress(45.0, "Moshing frames");
        let stats = mosh_file(&plan.transducer(), &input_avi, &output_avi)?;

        self.report_progress(55.0, "Encoding final video");
        let moshed_duration = stats.frames_out as f64 / f64::from(plan.settings.fps);
        transcode::encode_deliverable(
            ffmpeg,
            &output_avi,
            &plan.deliverable,
            &plan.deliverable_spec(),
            |p| self.encode_progress(55.0, 40.0, moshed_duration, p),
        )
        .context("Failed to encode moshed video")?;

        let mut kept = Vec::new();
        if plan.keep_intermediates {
            for file in [&input_avi, &output_avi] {
                kept.push(workspace.persist(file, &plan.output_dir)?);
            }
        }

        self.report_progress(100.0, "Finalizing");
        workspace.cleanup()?;

        Ok(MoshReport {
            output: plan.deliverable.clone(),
            window: plan.window(),
            stats: Some(stats),
            kept,
            planned: Vec::new(),
        })
    }

    fn dry_run_report(&self, plan: &MoshPlan) -> MoshReport {
        let ffmpeg = self
            .tools
            .require("ffmpeg")
            .cloned()
            .unwrap_or_else(|_| ToolConfig {
                name: "ffmpeg".to_string(),
                path: PathBuf::from("ffmpeg"),
            });
        let workspace = Path::new("<workspace>");
        let input_avi = workspace.join(INTERMEDIATE_INPUT);
        let output_avi = workspace.join(INTERMEDIATE_OUTPUT);

        let planned = vec![
            transcode::normalize_command(&ffmpeg, &plan.input, &input_avi, &plan.intermediate_spec())
                .display(),
            format!(
                "mosh frames {} of {:?} ({} repeats) -> {:?}",
                plan.window(),
                input_avi,
                plan.settings.repeat_count,
                output_avi
            ),
            transcode::deliverable_command(
                &ffmpeg,
                &output_avi,
                &plan.deliverable,
                &plan.deliverable_spec(),
            )
            .display(),
        ];

        for step in &planned {
            tracing::info!("[DRY RUN] Would run: {}", step);
        }

        MoshReport {
            output: plan.deliverable.clone(),
            window: plan.window(),
            stats: None,
            kept: Vec::new(),
            planned,
        }
    }

    fn encode_progress(&self, base: f32, span: f32, duration: f64, block: &EncodeProgress) {
        tracing::debug!("ffmpeg progress: {:?}", block);

        let Some(ref cb) = self.progress_callback else {
            return;
        };
        if let Some(t) = block.out_time_secs() {
            if duration > 0.0 {
                let fraction = (t / duration).clamp(0.0, 1.0) as f32;
                cb(base + span * fraction, "Encoding");
            }
        }
    }
}

/// Read the intermediate AVI, mosh it, and write the result.
fn mosh_file(transducer: &Transducer, input: &Path, output: &Path) -> Result<MoshStats> {
    let raw = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
    let moshed = transducer.mosh(&raw);
    let stats = moshed.stats;

    tracing::info!(
        "Moshed {} frames: {} passed through, {} repeated x{}, {} keyframes dropped ({} frames out)",
        stats.frames_in,
        stats.passed_through,
        stats.repeated,
        transducer.repeat_count(),
        stats.dropped_keyframes,
        stats.frames_out
    );
    if !stats.moshed() {
        tracing::warn!(
            "No frames fell inside window {} after the first keyframe; output matches input",
            transducer.window()
        );
    }

    std::fs::write(output, &moshed.data)
        .with_context(|| format!("Failed to write {:?}", output))?;

    Ok(stats)
}
