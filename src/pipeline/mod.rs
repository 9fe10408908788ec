// Pipeline orchestration — staging, progress, cancellation, errors.

pub mod analyze;
pub mod error;
pub mod progress;

pub use analyze::Pipeline;
pub use error::{PipelineError, Stage};
pub use progress::{CancelFlag, NoopProgress, ProgressSink};
