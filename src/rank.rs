// Cluster ranking — orders complaint themes by combined frequency/recency.
//
// Pure frequency would bury a small-but-rapidly-growing complaint under
// old high-volume ones, so the composite score blends the cluster's share
// of negative reviews with how concentrated its volume is in recent time.
// A complaint that is both big AND active ranks first.

use chrono::{DateTime, Utc};

use crate::model::{Cluster, RankedCluster, SummaryStats};

/// Minimum recency weight for very old reviews. Old complaints never decay
/// to zero — a years-old theme still carries some signal.
const RECENCY_FLOOR: f64 = 0.1;

/// Reviews older than this many windows sit at the floor weight.
const DECAY_SPAN_WINDOWS: f64 = 4.0;

/// Configurable weights and windows for the composite ranking.
#[derive(Debug, Clone)]
pub struct RankingParams {
    /// Weight of percentage_of_total in the composite score (default 0.7).
    pub frequency_weight: f64,
    /// Weight of recency_score in the composite score (default 0.3).
    pub recency_weight: f64,
    /// Reviews younger than this count at full weight (default 90 days).
    pub recency_window_days: u32,
    /// Recency score at or above which a cluster counts as "recent" in
    /// the summary stats (default 70).
    pub recent_cluster_threshold: f64,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            frequency_weight: 0.7,
            recency_weight: 0.3,
            recency_window_days: 90,
            recent_cluster_threshold: 70.0,
        }
    }
}

/// Recency weight for a single review: 1.0 inside the window, then linear
/// decay down to the floor at DECAY_SPAN_WINDOWS times the window.
fn review_recency_weight(age_days: f64, window_days: f64) -> f64 {
    if age_days <= window_days {
        return 1.0;
    }
    let decay_end = window_days * DECAY_SPAN_WINDOWS;
    if age_days >= decay_end {
        return RECENCY_FLOOR;
    }
    let progress = (age_days - window_days) / (decay_end - window_days);
    1.0 - (1.0 - RECENCY_FLOOR) * progress
}

/// Recency score for a cluster: mean member weight scaled to 0-100.
pub fn recency_score(dates: &[DateTime<Utc>], now: DateTime<Utc>, window_days: u32) -> f64 {
    if dates.is_empty() {
        return 0.0;
    }

    let window = f64::from(window_days.max(1));
    let total: f64 = dates
        .iter()
        .map(|date| {
            let age_days = (now - *date).num_seconds() as f64 / 86_400.0;
            // Future-dated reviews (clock skew upstream) count as fresh
            review_recency_weight(age_days.max(0.0), window)
        })
        .sum();

    (total / dates.len() as f64 * 100.0).clamp(0.0, 100.0)
}

/// Rank labeled clusters by composite score.
///
/// Input is each cluster paired with its member review dates. Ordering is
/// composite descending, ties broken by review count descending, then by
/// cluster creation order — fully deterministic.
pub fn rank_clusters(
    clusters: Vec<(Cluster, Vec<DateTime<Utc>>)>,
    negative_review_count: u32,
    params: &RankingParams,
    now: DateTime<Utc>,
) -> Vec<RankedCluster> {
    let mut ranked: Vec<RankedCluster> = clusters
        .into_iter()
        .map(|(cluster, dates)| {
            let review_count = cluster.member_ids.len() as u32;
            let percentage_of_total = if negative_review_count > 0 {
                f64::from(review_count) / f64::from(negative_review_count) * 100.0
            } else {
                0.0
            };
            let recency = recency_score(&dates, now, params.recency_window_days);
            let composite_score =
                params.frequency_weight * percentage_of_total + params.recency_weight * recency;

            RankedCluster {
                cluster,
                review_count,
                percentage_of_total,
                recency_score: recency,
                composite_score,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.review_count.cmp(&a.review_count))
            .then_with(|| a.cluster.id.cmp(&b.cluster.id))
    });

    ranked
}

/// Aggregate statistics over a completed ranking.
pub fn summary_stats(
    total_reviews: u32,
    negative_review_count: u32,
    ranked: &[RankedCluster],
    noise_review_count: u32,
    recent_cluster_threshold: f64,
) -> SummaryStats {
    let negative_percentage = if total_reviews > 0 {
        f64::from(negative_review_count) / f64::from(total_reviews) * 100.0
    } else {
        0.0
    };

    SummaryStats {
        negative_percentage,
        clustered_review_count: ranked.iter().map(|r| r.review_count).sum(),
        noise_review_count,
        recent_cluster_count: ranked
            .iter()
            .filter(|r| r.recency_score >= recent_cluster_threshold)
            .count() as u32,
    }
}
