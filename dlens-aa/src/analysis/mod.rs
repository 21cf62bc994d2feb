//! Detection-to-severity analysis pipeline

pub mod aggregate;
pub mod batch;
pub mod region;
pub mod severity;

pub use batch::{BatchCoordinator, BatchError, BatchOutcome, RegionUpload};
pub use region::{RegionAnalysis, RegionPipeline};
pub use severity::SeverityGrade;
