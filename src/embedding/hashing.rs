// Feature-hashing vectorizer — the model-free embedding fallback.
//
// When the ONNX model files aren't on disk (CI, first run, minimal
// installs) the pipeline still needs vectors whose cosine similarity
// tracks vocabulary overlap. Feature hashing gives that with zero state:
// each token is hashed into one of `dimension` buckets, counts are
// dampened sublinearly, and the vector is L2-normalized. Purely a function
// of the input text — deterministic across runs and processes.
//
// Reviews about the same complaint share vocabulary ("crash", "startup",
// "update"), so their hashed vectors land close in cosine space. Paraphrase
// similarity is weaker than with a sentence transformer; this is the
// trade-off for requiring nothing on disk.

use anyhow::Result;
use async_trait::async_trait;

use super::traits::Embedder;

/// Default dimension for hashed vectors. High enough that collisions are
/// rare at review vocabulary sizes.
pub const DEFAULT_HASHED_DIM: usize = 256;

/// Deterministic bag-of-words embedder using feature hashing.
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHED_DIM)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0_f64; self.dimension];

        for token in text.split_whitespace() {
            if token.len() < 2 {
                continue;
            }
            let bucket = (fnv1a64(token.as_bytes()) as usize) % self.dimension;
            vector[bucket] += 1.0;
        }

        // Sublinear term frequency: repeated words shouldn't dominate.
        for val in &mut vector {
            if *val > 0.0 {
                *val = 1.0 + val.ln();
            }
        }

        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// FNV-1a 64-bit hash. Stable across platforms and releases, unlike the
/// standard library's DefaultHasher.
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn l2_normalize(vector: &mut [f64]) {
    let norm: f64 = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for val in vector {
            *val /= norm;
        }
    }
}
