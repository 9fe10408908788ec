// Pipeline stages and the typed error taxonomy.
//
// Item-level problems (one review failing normalization or embedding) are
// absorbed inside the stages and only counted. What surfaces here is the
// stage-level taxonomy: a capability broke, a stage blew its time budget,
// or the run was cancelled. Each variant names the stage so the caller can
// retry or alert with context.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The sequential stages of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Filtering,
    Embedding,
    Clustering,
    Labeling,
    Ranking,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Filtering => "filtering",
            Stage::Embedding => "embedding",
            Stage::Clustering => "clustering",
            Stage::Labeling => "labeling",
            Stage::Ranking => "ranking",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage-level failures. Insufficient data is deliberately absent — that
/// outcome is a valid AnalysisResult, not an error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run was handed a configuration the pipeline cannot honor.
    #[error("invalid analysis configuration: {source}")]
    Config {
        #[source]
        source: anyhow::Error,
    },

    /// A capability (embedding, labeling) failed at the batch level.
    #[error("{stage} stage failed: {source}")]
    Capability {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    /// A stage exceeded its soft time budget.
    #[error("{stage} stage exceeded its {seconds}s budget")]
    Timeout { stage: Stage, seconds: u64 },

    /// Cooperative cancellation was observed between stages. Distinguished
    /// from failure: nothing broke, the caller asked the run to stop.
    #[error("analysis cancelled before the {stage} stage")]
    Cancelled { stage: Stage },
}

impl PipelineError {
    /// The stage this error is attributed to, when one applies.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Config { .. } => None,
            PipelineError::Capability { stage, .. }
            | PipelineError::Timeout { stage, .. }
            | PipelineError::Cancelled { stage } => Some(*stage),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_the_stage() {
        let err = PipelineError::Timeout {
            stage: Stage::Embedding,
            seconds: 120,
        };
        assert_eq!(err.stage(), Some(Stage::Embedding));
        assert!(err.to_string().contains("embedding"));
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn test_cancelled_is_not_capability() {
        let err = PipelineError::Cancelled {
            stage: Stage::Labeling,
        };
        assert!(err.is_cancelled());
        assert_eq!(err.stage(), Some(Stage::Labeling));
    }
}
