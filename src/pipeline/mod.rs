pub mod executor;

pub use executor::{output_filename, MoshPipeline, MoshPlan, MoshReport, ProgressCallback};

// Re-export from datamosh-av
pub use datamosh_av::Workspace;
