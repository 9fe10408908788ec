// End-to-end pipeline tests with a deterministic stub embedder.
//
// The stub maps topical vocabulary onto orthogonal axes, so reviews about
// the same complaint land on identical vectors and reviews about different
// complaints are orthogonal. That makes clustering outcomes exact and lets
// these tests assert on the full analyze() contract: counts, percentages,
// ordering, terminal states.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Duration, Utc};

use gripe::config::AnalysisConfig;
use gripe::embedding::traits::Embedder;
use gripe::model::{AnalysisStatus, Review};
use gripe::pipeline::{CancelFlag, NoopProgress, Pipeline, PipelineError, ProgressSink, Stage};

// ============================================================
// Test doubles
// ============================================================

/// Maps known complaint vocabulary onto orthogonal axes. Deterministic,
/// fixed dimension, one vector per text.
struct TopicStubEmbedder;

const STUB_DIM: usize = 8;
const TOPIC_WORDS: [&str; 6] = ["crash", "battery", "login", "shipping", "ads", "sync"];

#[async_trait]
impl Embedder for TopicStubEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f64>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0_f64; STUB_DIM];
                for (axis, word) in TOPIC_WORDS.iter().enumerate() {
                    if text.contains(word) {
                        vector[axis] = 1.0;
                    }
                }
                if vector.iter().all(|&v| v == 0.0) {
                    // Off-topic text gets its own axis so it never joins
                    // a topical cluster
                    vector[STUB_DIM - 1] = 1.0;
                    vector[STUB_DIM - 2] = (text.len() % 7) as f64 / 10.0;
                }
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        STUB_DIM
    }
}

/// Fails every call — the capability is entirely unreachable.
struct UnreachableEmbedder;

#[async_trait]
impl Embedder for UnreachableEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f64>>> {
        Err(anyhow!("connection refused"))
    }

    fn dimension(&self) -> usize {
        STUB_DIM
    }
}

/// Fails for texts containing "poison", works otherwise. Batch calls with
/// a poisoned item fail whole, exercising the per-item retry path.
struct PoisonEmbedder {
    inner: TopicStubEmbedder,
}

#[async_trait]
impl Embedder for PoisonEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f64>>> {
        if texts.iter().any(|t| t.contains("poison")) {
            return Err(anyhow!("encoding error"));
        }
        self.inner.embed_batch(texts).await
    }

    fn dimension(&self) -> usize {
        STUB_DIM
    }
}

/// Never responds within any reasonable budget.
struct StalledEmbedder;

#[async_trait]
impl Embedder for StalledEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f64>>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(vec![vec![0.0; STUB_DIM]; texts.len()])
    }

    fn dimension(&self) -> usize {
        STUB_DIM
    }
}

/// Flips the cancel flag as soon as the clustering stage reports done.
struct CancelAfterClustering {
    flag: CancelFlag,
}

impl ProgressSink for CancelAfterClustering {
    fn on_progress(&self, stage: Stage, percent: u8, _message: &str) {
        if stage == Stage::Clustering && percent == 100 {
            self.flag.cancel();
        }
    }
}

// ============================================================
// Fixtures
// ============================================================

fn review(id: &str, text: &str, rating: Option<u8>, days_ago: i64) -> Review {
    Review {
        id: id.to_string(),
        text: text.to_string(),
        rating,
        date: Utc::now() - Duration::days(days_ago),
        locale: None,
        source_platform: "app_store".to_string(),
    }
}

fn crash_reviews(count: usize) -> Vec<Review> {
    (0..count)
        .map(|i| {
            let word = if i % 2 == 0 { "crash" } else { "crashes" };
            review(
                &format!("crash-{i}"),
                &format!("the app {word} on startup attempt number {i}"),
                Some(1),
                5,
            )
        })
        .collect()
}

fn battery_reviews(count: usize) -> Vec<Review> {
    (0..count)
        .map(|i| {
            review(
                &format!("battery-{i}"),
                &format!("battery drain is terrible overnight case {i}"),
                Some(1),
                5,
            )
        })
        .collect()
}

fn login_reviews(count: usize) -> Vec<Review> {
    (0..count)
        .map(|i| {
            review(
                &format!("login-{i}"),
                &format!("login failure locks me out repeatedly case {i}"),
                Some(2),
                5,
            )
        })
        .collect()
}

fn praise_reviews(count: usize) -> Vec<Review> {
    (0..count)
        .map(|i| {
            review(
                &format!("praise-{i}"),
                &format!("love this app it works great number {i}"),
                Some(5),
                5,
            )
        })
        .collect()
}

fn pipeline() -> Pipeline {
    Pipeline::new(Arc::new(TopicStubEmbedder)).unwrap()
}

// ============================================================
// Scenario: one dominant complaint
// ============================================================

#[tokio::test]
async fn single_crash_cluster_takes_all() {
    let mut reviews = crash_reviews(6);
    reviews.extend(praise_reviews(4));

    let config = AnalysisConfig {
        min_cluster_size: Some(3),
        ..AnalysisConfig::default()
    };

    let result = pipeline()
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(result.status, AnalysisStatus::Complete);
    assert_eq!(result.total_reviews, 10);
    assert_eq!(result.negative_review_count, 6);
    assert_eq!(result.ranked_clusters.len(), 1);

    let top = &result.ranked_clusters[0];
    assert_eq!(top.review_count, 6);
    assert!((top.percentage_of_total - 100.0).abs() < 1e-9);
    assert!(
        top.cluster.keywords.iter().any(|k| k.contains("crash")),
        "expected a crash keyword in {:?}",
        top.cluster.keywords
    );
    assert!(top.cluster.sample_reviews.len() <= 3);
}

// ============================================================
// Scenario: two equal topics, deterministic tie-break
// ============================================================

#[tokio::test]
async fn two_equal_topics_split_fifty_fifty() {
    let mut reviews = battery_reviews(10);
    reviews.extend(login_reviews(10));

    let config = AnalysisConfig {
        min_cluster_size: Some(3),
        ..AnalysisConfig::default()
    };

    let result = pipeline()
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(result.ranked_clusters.len(), 2);
    for ranked in &result.ranked_clusters {
        assert_eq!(ranked.review_count, 10);
        assert!((ranked.percentage_of_total - 50.0).abs() < 1e-9);
    }

    // Equal composite scores and counts: creation order decides, and the
    // battery reviews come first in the input.
    assert!(result.ranked_clusters[0]
        .cluster
        .member_ids
        .contains(&"battery-0".to_string()));
    assert!(result.ranked_clusters[1]
        .cluster
        .member_ids
        .contains(&"login-0".to_string()));

    // Rerun: same outcome
    let mut reviews = battery_reviews(10);
    reviews.extend(login_reviews(10));
    let rerun = pipeline()
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .unwrap();
    assert!(rerun.ranked_clusters[0]
        .cluster
        .member_ids
        .contains(&"battery-0".to_string()));
}

// ============================================================
// Scenario: too few negative reviews
// ============================================================

#[tokio::test]
async fn below_minimum_negative_is_insufficient_not_error() {
    let mut reviews = crash_reviews(3);
    reviews.extend(praise_reviews(7));

    let result = pipeline()
        .analyze(
            reviews,
            &AnalysisConfig::default(),
            &NoopProgress,
            &CancelFlag::new(),
        )
        .await
        .expect("insufficient data must not be an error");

    assert!(result.status.is_insufficient());
    assert!(result.ranked_clusters.is_empty());
    assert_eq!(result.negative_review_count, 3);
    assert_eq!(result.total_reviews, 10);
}

#[tokio::test]
async fn no_dense_region_is_insufficient_patterns() {
    // Seven negative reviews, each on its own topic axis — nothing clusters
    let reviews: Vec<Review> = (0..7)
        .map(|i| {
            let topics = ["crash", "battery", "login", "shipping", "ads", "sync", ""];
            review(
                &format!("lone-{i}"),
                &format!("single complaint about {} issue number {i}", topics[i]),
                Some(1),
                5,
            )
        })
        .collect();

    let config = AnalysisConfig {
        min_cluster_size: Some(3),
        ..AnalysisConfig::default()
    };

    let result = pipeline()
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert!(result.status.is_insufficient());
    assert!(result.ranked_clusters.is_empty());
    // The noise count survives into the summary
    assert_eq!(result.summary.noise_review_count, 7);
}

// ============================================================
// Scenario: cancellation between stages
// ============================================================

#[tokio::test]
async fn cancel_between_clustering_and_labeling() {
    let mut reviews = battery_reviews(10);
    reviews.extend(login_reviews(10));

    let cancel = CancelFlag::new();
    let progress = CancelAfterClustering {
        flag: cancel.clone(),
    };

    let err = pipeline()
        .analyze(reviews, &AnalysisConfig::default(), &progress, &cancel)
        .await
        .expect_err("cancelled run must not produce a result");

    assert!(err.is_cancelled());
    assert_eq!(err.stage(), Some(Stage::Labeling));
}

// ============================================================
// Percentage invariant with a noise bucket
// ============================================================

#[tokio::test]
async fn percentages_sum_below_100_with_noise() {
    let mut reviews = battery_reviews(5);
    reviews.extend(login_reviews(4));
    // Three one-off complaints that will not cluster
    reviews.push(review("lone-0", "shipping took forever to arrive", Some(1), 5));
    reviews.push(review("lone-1", "way too many ads everywhere", Some(1), 5));
    reviews.push(review("lone-2", "sync keeps deleting my notes", Some(1), 5));

    let config = AnalysisConfig {
        min_cluster_size: Some(3),
        ..AnalysisConfig::default()
    };

    let result = pipeline()
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(result.ranked_clusters.len(), 2);
    assert_eq!(result.summary.noise_review_count, 3);

    let sum: f64 = result
        .ranked_clusters
        .iter()
        .map(|r| r.percentage_of_total)
        .sum();
    assert!(sum <= 100.0 + 1e-9);
    assert!(sum < 100.0, "non-empty noise must leave the sum under 100");
}

// ============================================================
// Ranking monotonicity over the final output
// ============================================================

#[tokio::test]
async fn ranked_output_is_monotonic_in_composite_score() {
    let mut reviews = battery_reviews(8);
    reviews.extend(login_reviews(5));
    reviews.extend(crash_reviews(4));

    let config = AnalysisConfig {
        min_cluster_size: Some(3),
        ..AnalysisConfig::default()
    };

    let result = pipeline()
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(result.ranked_clusters.len(), 3);
    for pair in result.ranked_clusters.windows(2) {
        assert!(pair[0].composite_score >= pair[1].composite_score);
    }
}

// ============================================================
// Error taxonomy
// ============================================================

#[tokio::test]
async fn unreachable_embedder_fails_the_embedding_stage() {
    let pipeline = Pipeline::new(Arc::new(UnreachableEmbedder)).unwrap();
    let reviews = crash_reviews(8);

    let err = pipeline
        .analyze(
            reviews,
            &AnalysisConfig::default(),
            &NoopProgress,
            &CancelFlag::new(),
        )
        .await
        .expect_err("a dead capability must fail the run");

    match err {
        PipelineError::Capability { stage, .. } => assert_eq!(stage, Stage::Embedding),
        other => panic!("expected Capability, got {other:?}"),
    }
}

#[tokio::test]
async fn poisoned_items_are_dropped_without_failing_the_run() {
    let pipeline = Pipeline::new(Arc::new(PoisonEmbedder {
        inner: TopicStubEmbedder,
    }))
    .unwrap();

    let mut reviews = battery_reviews(6);
    reviews.push(review(
        "bad-0",
        "poison token breaks the encoder somehow",
        Some(1),
        5,
    ));

    let config = AnalysisConfig {
        min_cluster_size: Some(3),
        // One batch containing the poisoned item forces the retry path
        embed_batch_size: 4,
        ..AnalysisConfig::default()
    };

    let result = pipeline
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(result.status, AnalysisStatus::Complete);
    assert_eq!(result.dropped_review_count, 1);
    assert_eq!(result.ranked_clusters.len(), 1);
    assert_eq!(result.ranked_clusters[0].review_count, 6);
}

#[tokio::test]
async fn stalled_embedder_times_out_the_embedding_stage() {
    let pipeline = Pipeline::new(Arc::new(StalledEmbedder)).unwrap();
    let reviews = crash_reviews(8);

    let config = AnalysisConfig {
        stage_timeout_secs: 1,
        ..AnalysisConfig::default()
    };

    let err = pipeline
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .expect_err("a stalled capability must time out");

    match err {
        PipelineError::Timeout { stage, seconds } => {
            assert_eq!(stage, Stage::Embedding);
            assert_eq!(seconds, 1);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

// ============================================================
// Result serialization round trip (hand-off contract)
// ============================================================

#[tokio::test]
async fn result_serializes_for_the_export_layer() {
    let mut reviews = crash_reviews(6);
    reviews.extend(praise_reviews(2));

    let config = AnalysisConfig {
        min_cluster_size: Some(3),
        ..AnalysisConfig::default()
    };

    let result = pipeline()
        .analyze(reviews, &config, &NoopProgress, &CancelFlag::new())
        .await
        .unwrap();

    let json = serde_json::to_string(&result).unwrap();
    let parsed: gripe::model::AnalysisResult = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.negative_review_count, result.negative_review_count);
    assert_eq!(parsed.ranked_clusters.len(), result.ranked_clusters.len());
}
