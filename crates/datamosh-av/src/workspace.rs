//! Workspace management for intermediate files.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name of the normalized AVI the source video is converted to.
pub const INTERMEDIATE_INPUT: &str = "datamoshing_input.avi";

/// File name of the moshed AVI written by the transducer.
pub const INTERMEDIATE_OUTPUT: &str = "datamoshing_output.avi";

/// Workspace for one mosh job.
///
/// Holds the two intermediate AVI files in a temporary directory that is
/// removed when the workspace is dropped, whether or not the job succeeded.
///
/// # Example
///
/// ```no_run
/// use datamosh_av::Workspace;
/// use std::path::Path;
///
/// let workspace = Workspace::new("/path/to/clip.mp4")?;
/// let avi = workspace.intermediate_input();
/// // ... transcode into `avi`, mosh, encode ...
/// workspace.persist(&avi, Path::new("/path/to/keep"))?;
/// # Ok::<(), datamosh_av::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
    input_stem: String,
}

impl Workspace {
    /// Create a new workspace for processing `input`.
    pub fn new<P: AsRef<Path>>(input: P) -> Result<Self> {
        let input = input.as_ref();
        let input_stem = match input.file_stem() {
            Some(stem) if input.file_name().is_some() => stem.to_string_lossy().to_string(),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "invalid input file path: {:?}",
                    input
                )))
            }
        };

        let temp_dir = tempfile::Builder::new()
            .prefix("datamosh-")
            .tempdir()
            .map_err(|e| Error::Workspace(e.to_string()))?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Created workspace at {:?}", temp_dir.path());

        Ok(Self {
            temp_dir,
            input_stem,
        })
    }

    fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Path of the normalized AVI.
    pub fn intermediate_input(&self) -> PathBuf {
        self.temp_file(INTERMEDIATE_INPUT)
    }

    /// Path of the moshed AVI.
    pub fn intermediate_output(&self) -> PathBuf {
        self.temp_file(INTERMEDIATE_OUTPUT)
    }

    /// Copy an intermediate file into `dest_dir` as `<source stem>_<file name>`,
    /// so intermediates kept from different sources do not overwrite each other.
    ///
    /// Returns the path of the copy.
    pub fn persist(&self, file: &Path, dest_dir: &Path) -> Result<PathBuf> {
        if !file.exists() {
            return Err(Error::file_not_found(file));
        }

        let name = file
            .file_name()
            .ok_or_else(|| Error::Workspace(format!("not a file: {:?}", file)))?;
        let dest = dest_dir.join(format!("{}_{}", self.input_stem, name.to_string_lossy()));

        std::fs::copy(file, &dest).map_err(|e| {
            Error::Workspace(format!("failed to copy {:?} to {:?}: {}", file, dest, e))
        })?;

        Ok(dest)
    }

    /// Remove the workspace and everything in it.
    pub fn cleanup(self) -> Result<()> {
        self.temp_dir
            .close()
            .map_err(|e| Error::Workspace(format!("failed to remove workspace: {}", e)))
    }
}
