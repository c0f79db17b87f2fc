//! # datamosh-av
//!
//! The ffmpeg side of datamosh.
//!
//! This crate provides:
//! - **Tool discovery** ([`ToolRegistry`]) -- find ffmpeg from configuration
//!   or `PATH`, and report versions for `check-tools`.
//! - **Command execution** ([`ToolCommand`]) -- blocking subprocess builder
//!   with ffmpeg `-progress` parsing.
//! - **Workspace management** ([`Workspace`]) -- temporary directory holding
//!   the intermediate AVI files for one job.
//! - **Transcoding** ([`transcode`]) -- source to intermediate AVI, and moshed
//!   AVI to the final deliverable.
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use datamosh_av::{transcode, ToolPaths, ToolRegistry, Workspace};
//! use std::path::Path;
//!
//! let tools = ToolRegistry::discover(&ToolPaths::default());
//! let ffmpeg = tools.require("ffmpeg")?;
//! let workspace = Workspace::new("clip.mp4")?;
//!
//! let spec = transcode::IntermediateSpec {
//!     fps: 30,
//!     video_start: 0.0,
//!     video_end: 60.0,
//!     keyframe_at: 3.0,
//! };
//! transcode::normalize_to_avi(
//!     ffmpeg,
//!     Path::new("clip.mp4"),
//!     &workspace.intermediate_input(),
//!     &spec,
//!     |p| println!("{:?}", p.frame),
//! )?;
//! # Ok::<(), datamosh_av::Error>(())
//! ```

pub mod command;
mod error;
pub mod tools;
pub mod transcode;
pub mod workspace;

// Re-exports
pub use command::{EncodeProgress, ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use tools::{ToolConfig, ToolInfo, ToolPaths, ToolRegistry};
pub use transcode::{DeliverableSpec, IntermediateSpec};
pub use workspace::Workspace;
