// Cluster labeling — turns a bare member group into a named complaint theme.
//
// Three steps per cluster: extract top keywords via TF-IDF over the member
// texts, pick the sample reviews closest to the centroid (representative,
// not random), then derive a name and description through the pluggable
// namer. Labeling failure never drops a cluster — worst case it ships with
// a generic name and raw keywords.

pub mod heuristic;
pub mod traits;

use keyword_extraction::tf_idf::{TfIdf, TfIdfParams};
use stop_words::{get, LANGUAGE};
use tracing::{debug, warn};

use crate::embedding::{cosine_similarity, mean_vector};
use crate::model::{Cluster, EmbeddedReview};
use traits::ClusterNamer;

/// Extract the top keywords from a cluster's member texts.
///
/// Each review is a separate document for IDF purposes: words that appear
/// in every member get downweighted, distinctive complaint vocabulary gets
/// boosted. Falls back to plain word frequency when TF-IDF produces
/// nothing (single-member clusters, all-stopword text).
pub fn extract_keywords(texts: &[String], max_keywords: usize) -> Vec<String> {
    if texts.is_empty() || max_keywords == 0 {
        return Vec::new();
    }

    let stop_words: Vec<String> = get(LANGUAGE::English);

    let params = TfIdfParams::UnprocessedDocuments(texts, &stop_words, None);
    let tfidf = TfIdf::new(params);
    let ranked: Vec<(String, f32)> = tfidf.get_ranked_word_scores(max_keywords);

    let keywords: Vec<String> = ranked
        .into_iter()
        .filter(|(_, score)| *score > 0.0)
        .map(|(word, _)| word)
        .collect();

    if !keywords.is_empty() {
        return keywords;
    }

    debug!("TF-IDF produced no keywords, falling back to word frequency");
    frequency_keywords(texts, &stop_words, max_keywords)
}

/// Plain frequency counting over non-stopword words of length > 3.
fn frequency_keywords(texts: &[String], stop_words: &[String], max_keywords: usize) -> Vec<String> {
    let mut counts: std::collections::HashMap<&str, u32> = std::collections::HashMap::new();
    for text in texts {
        for word in text.split_whitespace() {
            if word.len() > 3
                && word.chars().all(char::is_alphabetic)
                && !stop_words.iter().any(|s| s == word)
            {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(&str, u32)> = counts.into_iter().collect();
    // Count descending, then alphabetical for a stable order
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Select up to `max_samples` member texts whose embeddings sit closest to
/// the centroid. Ties resolve toward earlier members.
fn representative_samples(
    members: &[&EmbeddedReview],
    centroid: &[f64],
    max_samples: usize,
) -> Vec<String> {
    let mut by_closeness: Vec<(usize, f64)> = members
        .iter()
        .enumerate()
        .map(|(i, m)| (i, cosine_similarity(&m.vector, centroid)))
        .collect();
    by_closeness.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    by_closeness
        .into_iter()
        .take(max_samples)
        .map(|(i, _)| members[i].normalized.review.text.clone())
        .collect()
}

/// Label one cluster: keywords, representative samples, name, description.
pub fn label_cluster(
    id: u32,
    members: &[&EmbeddedReview],
    namer: &dyn ClusterNamer,
    max_keywords: usize,
    max_samples: usize,
) -> Cluster {
    let texts: Vec<String> = members
        .iter()
        .map(|m| m.normalized.cleaned_text.clone())
        .collect();

    let keywords = extract_keywords(&texts, max_keywords);

    let vectors: Vec<&[f64]> = members.iter().map(|m| m.vector.as_slice()).collect();
    let centroid = mean_vector(&vectors);

    let sample_reviews = representative_samples(members, &centroid, max_samples);

    let (name, description) = match namer.name_cluster(&keywords, &sample_reviews) {
        Ok(named) => named,
        Err(e) => {
            warn!(cluster_id = id, error = %e, "Namer failed, using generic label");
            (
                format!("Complaint Group {}", id + 1),
                format!(
                    "Recurring complaints mentioning {}",
                    keywords
                        .iter()
                        .take(3)
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        }
    };

    Cluster {
        id,
        member_ids: members
            .iter()
            .map(|m| m.normalized.review.id.clone())
            .collect(),
        centroid,
        name,
        description,
        keywords,
        sample_reviews,
    }
}
