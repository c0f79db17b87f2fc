use datamosh_av::ToolPaths;
use datamosh_stream::MoshSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub mosh: MoshSettings,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub tools: ToolPaths,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory the moshed video is written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Scale the deliverable to this width (height follows aspect ratio)
    #[serde(default)]
    pub width: Option<u32>,

    /// Copy the intermediate AVI files next to the deliverable
    #[serde(default)]
    pub keep_intermediates: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            width: None,
            keep_intermediates: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("moshed_videos")
}
