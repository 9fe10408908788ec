// Core data model — the types that flow through the analysis pipeline.
//
// These are kept separate from the engines that produce them so callers
// (CLI, export layers) can use them without pulling in the pipeline.
// Everything is serde-serializable: the final AnalysisResult is handed off
// whole to whatever persistence or API layer surrounds the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw review as delivered by the scraping/aggregation layer.
/// Immutable once ingested — the pipeline never mutates reviews, it only
/// derives new data from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub text: String,
    /// Star rating on a normalized 1-5 scale. Absent for sources without
    /// ratings (e.g. social-media mentions).
    pub rating: Option<u8>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub locale: Option<String>,
    pub source_platform: String,
}

/// A review that survived text normalization.
/// Invariant: `cleaned_text` is non-empty, at least three words, and capped
/// at the normalizer's maximum length.
#[derive(Debug, Clone)]
pub struct NormalizedReview {
    pub review: Review,
    pub cleaned_text: String,
}

/// A normalized review plus its embedding vector.
/// Invariant: vector dimension is constant across a single pipeline run,
/// and the vector is never mutated after creation.
#[derive(Debug, Clone)]
pub struct EmbeddedReview {
    pub normalized: NormalizedReview,
    pub vector: Vec<f64>,
}

/// One complaint theme: a group of semantically similar negative reviews.
///
/// Created by the cluster engine as a bare member group, then populated by
/// the labeler. Clusters are never merged or split after creation — one
/// clustering pass per analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Creation-order id, also the final tie-break key in ranking.
    pub id: u32,
    /// Ids of the member reviews (unique, at least one).
    pub member_ids: Vec<String>,
    /// Mean of the member embedding vectors.
    pub centroid: Vec<f64>,
    pub name: String,
    pub description: String,
    /// Top keywords in descending score order, unique.
    pub keywords: Vec<String>,
    /// Up to three member texts closest to the centroid.
    pub sample_reviews: Vec<String>,
}

/// A labeled cluster with its ranking metrics attached.
/// Once ranked, the numeric fields are frozen — only list order varies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCluster {
    pub cluster: Cluster,
    pub review_count: u32,
    /// Share of the negative-review set, 0-100.
    pub percentage_of_total: f64,
    /// How concentrated this cluster's volume is in recent time, 0-100.
    pub recency_score: f64,
    /// Weighted combination of frequency and recency used for ordering.
    pub composite_score: f64,
}

/// Aggregate statistics for the reporting layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    pub negative_percentage: f64,
    /// Negative reviews that landed in a ranked cluster.
    pub clustered_review_count: u32,
    /// Negative reviews the cluster engine could not confidently group.
    pub noise_review_count: u32,
    /// Clusters whose recency score is at or above the "recent" threshold.
    pub recent_cluster_count: u32,
}

/// Terminal outcome of an analysis run that completed without a stage
/// failure. Insufficient data is a valid result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    Complete,
    InsufficientData { reason: String },
}

impl AnalysisStatus {
    pub fn is_insufficient(&self) -> bool {
        matches!(self, AnalysisStatus::InsufficientData { .. })
    }
}

/// The final output of one analysis run, owned by the orchestrator and
/// handed off whole to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    pub total_reviews: u32,
    /// Reviews classified as negative after normalization and dedup.
    pub negative_review_count: u32,
    /// Items absorbed by per-item failure policy (normalization drops,
    /// duplicates, embedding failures).
    pub dropped_review_count: u32,
    /// Complaint clusters in descending composite-score order. Empty when
    /// status is InsufficientData.
    pub ranked_clusters: Vec<RankedCluster>,
    pub summary: SummaryStats,
}

impl AnalysisResult {
    /// An insufficient-data result carrying the counts gathered so far.
    pub fn insufficient(reason: impl Into<String>, total: u32, negative: u32, dropped: u32) -> Self {
        let negative_percentage = if total > 0 {
            f64::from(negative) / f64::from(total) * 100.0
        } else {
            0.0
        };
        Self {
            status: AnalysisStatus::InsufficientData {
                reason: reason.into(),
            },
            total_reviews: total,
            negative_review_count: negative,
            dropped_review_count: dropped,
            ranked_clusters: vec![],
            summary: SummaryStats {
                negative_percentage,
                clustered_review_count: 0,
                noise_review_count: 0,
                recent_cluster_count: 0,
            },
        }
    }
}
