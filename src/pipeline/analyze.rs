// Analysis pipeline: normalize, filter, embed, cluster, label, rank.
//
// One entry point wraps the whole sequence. Stages run strictly
// sequentially, single pass, no backtracking; each stage consumes the
// previous stage's complete output. Per-item failures are absorbed and
// counted; batch-level capability failures, stage timeouts, and
// cancellation surface as typed errors naming the stage.
//
// Insufficient data — too few negative reviews, or no cluster meeting the
// minimum size — is a valid terminal result, never an error.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::cluster::density::{self, DensityParams};
use crate::config::AnalysisConfig;
use crate::embedding::traits::Embedder;
use crate::filter::{self, lexicon::LexiconSentiment, traits::SentimentClassifier};
use crate::label::{self, heuristic::HeuristicNamer, traits::ClusterNamer};
use crate::model::{AnalysisResult, AnalysisStatus, EmbeddedReview, NormalizedReview, Review};
use crate::normalize::Normalizer;
use crate::rank;

use super::error::{PipelineError, Stage};
use super::progress::{CancelFlag, ProgressSink};

/// The analysis pipeline with its injected capabilities.
///
/// Construct once per process (the embedder owns the loaded model) and
/// reuse across runs — each analyze() call owns its own working set, so
/// concurrent runs never contend on anything but the shared read-only
/// capabilities.
pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    sentiment: Arc<dyn SentimentClassifier>,
    namer: Arc<dyn ClusterNamer>,
}

impl Pipeline {
    /// Build a pipeline around an embedding backend, with the default
    /// lexicon sentiment classifier and heuristic cluster namer.
    pub fn new(embedder: Arc<dyn Embedder>) -> Result<Self> {
        Ok(Self {
            embedder,
            sentiment: Arc::new(LexiconSentiment::new()?),
            namer: Arc::new(HeuristicNamer),
        })
    }

    /// Replace the sentiment classifier used for unrated reviews.
    pub fn with_sentiment(mut self, sentiment: Arc<dyn SentimentClassifier>) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Replace the cluster naming backend.
    pub fn with_namer(mut self, namer: Arc<dyn ClusterNamer>) -> Self {
        self.namer = namer;
        self
    }

    /// Run one full analysis over a batch of raw reviews.
    pub async fn analyze(
        &self,
        reviews: Vec<Review>,
        config: &AnalysisConfig,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<AnalysisResult, PipelineError> {
        config
            .validate()
            .map_err(|source| PipelineError::Config { source })?;

        let timeout_secs = config.stage_timeout_secs;
        let total_reviews = reviews.len() as u32;
        let mut dropped = 0u32;

        // --- Stage 1: normalize + filter ---
        check_cancel(cancel, Stage::Filtering)?;
        progress.on_progress(
            Stage::Filtering,
            0,
            &format!("Normalizing {total_reviews} reviews"),
        );

        let sentiment = Arc::clone(&self.sentiment);
        let (negative, normalize_dropped) =
            stage_timeout(Stage::Filtering, timeout_secs, async move {
                tokio::task::spawn_blocking(move || {
                    let normalizer = Normalizer::default();
                    let (normalized, dropped) = normalizer.normalize_batch(reviews);
                    let negative = filter::filter_negative(normalized, sentiment.as_ref());
                    (negative, dropped)
                })
                .await
                .map_err(|e| join_failure(Stage::Filtering, &e))
            })
            .await?;
        dropped += normalize_dropped;

        let negative_count = negative.len() as u32;
        progress.on_progress(
            Stage::Filtering,
            100,
            &format!("{negative_count} negative reviews selected"),
        );

        if (negative_count as usize) < config.min_negative_reviews {
            info!(
                negative = negative_count,
                minimum = config.min_negative_reviews,
                "Too few negative reviews to analyze"
            );
            return Ok(AnalysisResult::insufficient(
                format!(
                    "only {negative_count} negative reviews, need at least {}",
                    config.min_negative_reviews
                ),
                total_reviews,
                negative_count,
                dropped,
            ));
        }

        // --- Stage 2: embed ---
        check_cancel(cancel, Stage::Embedding)?;
        progress.on_progress(
            Stage::Embedding,
            0,
            &format!("Embedding {negative_count} reviews"),
        );

        let (embedded, embed_dropped) = stage_timeout(
            Stage::Embedding,
            timeout_secs,
            embed_stage(&self.embedder, negative, config, progress),
        )
        .await?;
        dropped += embed_dropped;

        progress.on_progress(
            Stage::Embedding,
            100,
            &format!("{} reviews embedded", embedded.len()),
        );

        // --- Stage 3: cluster ---
        check_cancel(cancel, Stage::Clustering)?;
        progress.on_progress(Stage::Clustering, 0, "Clustering embeddings");

        let params = DensityParams::for_input(
            embedded.len(),
            config.min_cluster_size,
            config.density_threshold,
        );
        let (embedded, partition) = stage_timeout(Stage::Clustering, timeout_secs, async move {
            tokio::task::spawn_blocking(move || {
                let vectors: Vec<Vec<f64>> =
                    embedded.iter().map(|e| e.vector.clone()).collect();
                let partition = density::cluster(&vectors, &params);
                (embedded, partition)
            })
            .await
            .map_err(|e| join_failure(Stage::Clustering, &e))
        })
        .await?;

        debug_assert!(partition.covers_exactly(embedded.len()));
        progress.on_progress(
            Stage::Clustering,
            100,
            &format!(
                "{} clusters, {} reviews in noise",
                partition.clusters.len(),
                partition.noise.len()
            ),
        );

        // --- Stage 4: label ---
        check_cancel(cancel, Stage::Labeling)?;

        if partition.clusters.is_empty() {
            info!(
                noise = partition.noise.len(),
                "No cluster met the minimum size"
            );
            let mut result = AnalysisResult::insufficient(
                "no recurring complaint patterns found",
                total_reviews,
                negative_count,
                dropped,
            );
            result.summary.noise_review_count = partition.noise.len() as u32;
            return Ok(result);
        }

        progress.on_progress(
            Stage::Labeling,
            0,
            &format!("Labeling {} clusters", partition.clusters.len()),
        );

        let namer = Arc::clone(&self.namer);
        let max_keywords = config.max_keywords_per_cluster;
        let max_samples = config.max_sample_reviews;
        let (partition, labeled) = stage_timeout(Stage::Labeling, timeout_secs, async move {
            tokio::task::spawn_blocking(move || {
                let labeled = label_stage(&embedded, &partition, namer.as_ref(), max_keywords, max_samples);
                (partition, labeled)
            })
            .await
            .map_err(|e| join_failure(Stage::Labeling, &e))
        })
        .await?;

        progress.on_progress(Stage::Labeling, 100, "Clusters labeled");

        // --- Stage 5: rank ---
        check_cancel(cancel, Stage::Ranking)?;
        progress.on_progress(Stage::Ranking, 0, "Ranking clusters");

        let ranked = rank::rank_clusters(
            labeled,
            negative_count,
            &config.ranking_params(),
            Utc::now(),
        );
        let summary = rank::summary_stats(
            total_reviews,
            negative_count,
            &ranked,
            partition.noise.len() as u32,
            config.recent_cluster_threshold,
        );

        progress.on_progress(
            Stage::Ranking,
            100,
            &format!("{} complaint categories ranked", ranked.len()),
        );

        info!(
            total = total_reviews,
            negative = negative_count,
            clusters = ranked.len(),
            noise = summary.noise_review_count,
            dropped,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            status: AnalysisStatus::Complete,
            total_reviews,
            negative_review_count: negative_count,
            dropped_review_count: dropped,
            ranked_clusters: ranked,
            summary,
        })
    }
}

/// Embed the negative reviews in bounded-concurrency chunks.
///
/// Chunk results come back in order (`buffered`, not `buffer_unordered`)
/// so embeddings stay aligned with their reviews. A failed chunk is
/// retried item-by-item; items that still fail are dropped and counted.
async fn embed_stage(
    embedder: &Arc<dyn Embedder>,
    negative: Vec<NormalizedReview>,
    config: &AnalysisConfig,
    progress: &dyn ProgressSink,
) -> Result<(Vec<EmbeddedReview>, u32), PipelineError> {
    let expected_dim = embedder.dimension();
    let input_count = negative.len();

    let chunks: Vec<Vec<NormalizedReview>> = negative
        .chunks(config.embed_batch_size)
        .map(<[NormalizedReview]>::to_vec)
        .collect();
    let total_chunks = chunks.len();

    let mut chunk_stream = stream::iter(chunks.into_iter().map(|chunk| {
        let embedder = Arc::clone(embedder);
        async move {
            let texts: Vec<String> = chunk.iter().map(|r| r.cleaned_text.clone()).collect();
            let vectors = embed_chunk(&embedder, &texts).await;
            (chunk, vectors)
        }
    }))
    .buffered(config.embed_concurrency);

    let mut embedded: Vec<EmbeddedReview> = Vec::with_capacity(input_count);
    let mut dropped = 0u32;
    let mut chunks_done = 0usize;

    while let Some((chunk, vectors)) = chunk_stream.next().await {
        for (normalized, vector) in chunk.into_iter().zip(vectors) {
            match vector {
                Some(v) if v.len() == expected_dim => {
                    embedded.push(EmbeddedReview {
                        normalized,
                        vector: v,
                    });
                }
                Some(v) => {
                    warn!(
                        review_id = %normalized.review.id,
                        got = v.len(),
                        expected = expected_dim,
                        "Dropped review: embedding dimension mismatch"
                    );
                    dropped += 1;
                }
                None => {
                    dropped += 1;
                }
            }
        }
        chunks_done += 1;
        let percent = (chunks_done * 100 / total_chunks) as u8;
        progress.on_progress(
            Stage::Embedding,
            percent,
            &format!("Embedded batch {chunks_done}/{total_chunks}"),
        );
    }

    if embedded.is_empty() {
        return Err(PipelineError::Capability {
            stage: Stage::Embedding,
            source: anyhow!("embedding capability produced no vectors for {input_count} reviews"),
        });
    }

    Ok((embedded, dropped))
}

/// Embed one chunk, falling back to per-item calls when the batch call
/// fails or returns the wrong count.
async fn embed_chunk(embedder: &Arc<dyn Embedder>, texts: &[String]) -> Vec<Option<Vec<f64>>> {
    match embedder.embed_batch(texts).await {
        Ok(vectors) if vectors.len() == texts.len() => vectors.into_iter().map(Some).collect(),
        Ok(vectors) => {
            warn!(
                expected = texts.len(),
                got = vectors.len(),
                "Embedder returned wrong vector count, retrying per item"
            );
            embed_singly(embedder, texts).await
        }
        Err(e) => {
            warn!(
                error = %e,
                batch = texts.len(),
                "Batch embedding failed, retrying per item"
            );
            embed_singly(embedder, texts).await
        }
    }
}

async fn embed_singly(embedder: &Arc<dyn Embedder>, texts: &[String]) -> Vec<Option<Vec<f64>>> {
    let mut out = Vec::with_capacity(texts.len());
    for text in texts {
        match embedder.embed_batch(std::slice::from_ref(text)).await {
            Ok(mut vectors) if vectors.len() == 1 => out.push(vectors.pop()),
            Ok(_) => out.push(None),
            Err(e) => {
                warn!(error = %e, "Dropped review: embedding failed");
                out.push(None);
            }
        }
    }
    out
}

/// Label every cluster in the partition. Runs on the blocking pool — the
/// namer contract is synchronous and keyword extraction is CPU work.
fn label_stage(
    embedded: &[EmbeddedReview],
    partition: &crate::cluster::Partition,
    namer: &dyn ClusterNamer,
    max_keywords: usize,
    max_samples: usize,
) -> Vec<(crate::model::Cluster, Vec<chrono::DateTime<Utc>>)> {
    partition
        .clusters
        .iter()
        .enumerate()
        .map(|(id, member_indices)| {
            let members: Vec<&EmbeddedReview> =
                member_indices.iter().map(|&i| &embedded[i]).collect();
            let cluster =
                label::label_cluster(id as u32, &members, namer, max_keywords, max_samples);
            let dates = members
                .iter()
                .map(|m| m.normalized.review.date)
                .collect();
            (cluster, dates)
        })
        .collect()
}

fn check_cancel(cancel: &CancelFlag, next_stage: Stage) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        info!(stage = %next_stage, "Cancellation observed, discarding run");
        return Err(PipelineError::Cancelled { stage: next_stage });
    }
    Ok(())
}

async fn stage_timeout<T>(
    stage: Stage,
    seconds: u64,
    fut: impl std::future::Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    match tokio::time::timeout(Duration::from_secs(seconds), fut).await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::Timeout { stage, seconds }),
    }
}

fn join_failure(stage: Stage, e: &tokio::task::JoinError) -> PipelineError {
    PipelineError::Capability {
        stage,
        source: anyhow!("{stage} task panicked: {e}"),
    }
}
