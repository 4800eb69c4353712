pub mod chunker;
pub mod enrichment;
pub mod executor;
pub mod job_tracker;
pub mod pagination;
pub mod processors;
pub mod rows;
pub mod xlsx;

pub use executor::ExportExecutor;
pub use job_tracker::ExportJobTracker;
