// Configuration — per-run analysis knobs and process-level environment.
//
// AnalysisConfig travels with each analyze() call and carries every
// tunable the pipeline honors, all defaulted to sane values. Config is the
// process-level environment (which embedding backend, where the model
// files live), loaded once at startup from env vars; the .env file is
// loaded via dotenvy in main.

use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::rank::RankingParams;

/// Which embedding backend to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedderBackend {
    /// Local ONNX sentence transformer (default) — best paraphrase
    /// similarity, needs downloaded model files
    Onnx,
    /// Deterministic feature-hashing vectorizer — no model files, weaker
    /// semantic similarity
    Hashing,
}

/// Process-level configuration loaded from environment variables.
pub struct Config {
    /// Which embedder to construct (default: Onnx)
    pub embedder_backend: EmbedderBackend,
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let embedder_backend = match env::var("GRIPE_EMBEDDER").as_deref() {
            Ok("hashing") => EmbedderBackend::Hashing,
            // "onnx" or unset both default to ONNX
            _ => EmbedderBackend::Onnx,
        };

        let model_dir = env::var("GRIPE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embedding::download::default_model_dir());

        Ok(Self {
            embedder_backend,
            model_dir,
        })
    }

    /// Validate that the chosen embedder backend has what it needs.
    /// For ONNX: model files must exist (or the user should run
    /// download-model). Hashing needs nothing.
    pub fn require_embedder(&self) -> Result<()> {
        match self.embedder_backend {
            EmbedderBackend::Onnx => {
                if !crate::embedding::download::model_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "ONNX model files not found in {}\n\
                         Run `gripe download-model` to download them.\n\
                         Or set GRIPE_EMBEDDER=hashing to use the model-free vectorizer.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            EmbedderBackend::Hashing => Ok(()),
        }
    }
}

/// Per-run analysis configuration. Callers override any subset; `default()`
/// matches the product's tuned values.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Minimum reviews per cluster. None derives 4% of the negative count
    /// with a floor of 2.
    pub min_cluster_size: Option<usize>,
    /// Below this many negative reviews the run short-circuits to an
    /// insufficient-data result.
    pub min_negative_reviews: usize,
    /// Reviews younger than this count at full recency weight.
    pub recency_window_days: u32,
    /// Composite-score weight for cluster frequency.
    pub frequency_weight: f64,
    /// Composite-score weight for cluster recency.
    pub recency_weight: f64,
    pub max_keywords_per_cluster: usize,
    pub max_sample_reviews: usize,
    /// Soft per-stage timeout.
    pub stage_timeout_secs: u64,
    /// Maximum cosine distance for two reviews to count as neighbors in
    /// the density engine.
    pub density_threshold: f64,
    /// Texts per embed_batch call.
    pub embed_batch_size: usize,
    /// Concurrent embed_batch calls in flight.
    pub embed_concurrency: usize,
    /// Recency score at or above which a cluster counts as "recent".
    pub recent_cluster_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: None,
            min_negative_reviews: 5,
            recency_window_days: 90,
            frequency_weight: 0.7,
            recency_weight: 0.3,
            max_keywords_per_cluster: 8,
            max_sample_reviews: 3,
            stage_timeout_secs: 120,
            density_threshold: 0.35,
            embed_batch_size: 32,
            embed_concurrency: 4,
            recent_cluster_threshold: 70.0,
        }
    }
}

impl AnalysisConfig {
    /// Reject configurations the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.frequency_weight < 0.0 || self.recency_weight < 0.0 {
            anyhow::bail!("ranking weights must be non-negative");
        }
        if self.frequency_weight + self.recency_weight <= 0.0 {
            anyhow::bail!("at least one ranking weight must be positive");
        }
        if !(0.0..=1.0).contains(&self.density_threshold) {
            anyhow::bail!("density_threshold must be within [0, 1]");
        }
        if self.embed_batch_size == 0 || self.embed_concurrency == 0 {
            anyhow::bail!("embed_batch_size and embed_concurrency must be positive");
        }
        if self.stage_timeout_secs == 0 {
            anyhow::bail!("stage_timeout_secs must be positive");
        }
        if self.min_negative_reviews < 2 {
            anyhow::bail!("min_negative_reviews must be at least 2");
        }
        Ok(())
    }

    pub fn ranking_params(&self) -> RankingParams {
        RankingParams {
            frequency_weight: self.frequency_weight,
            recency_weight: self.recency_weight,
            recency_window_days: self.recency_window_days,
            recent_cluster_threshold: self.recent_cluster_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_weights() {
        let config = AnalysisConfig {
            frequency_weight: -0.5,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_weights() {
        let config = AnalysisConfig {
            frequency_weight: 0.0,
            recency_weight: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_density() {
        let config = AnalysisConfig {
            density_threshold: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_batch() {
        let config = AnalysisConfig {
            embed_batch_size: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
