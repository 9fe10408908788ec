// Lexicon-based sentiment classifier — the default text-sentiment backend.
//
// Zero API calls, runs locally, no cost. Counts complaint-vocabulary hits
// against praise-vocabulary hits with case-insensitive Aho-Corasick
// matchers. Crude next to a real model, but review language is blunt
// enough ("crashes", "scam", "refund") that hit counting separates
// complaints from praise reliably in practice.

use aho_corasick::AhoCorasick;
use anyhow::{anyhow, Result};

use super::traits::SentimentClassifier;

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "hate",
    "horrible",
    "worst",
    "angry",
    "disappointed",
    "disappointing",
    "poor",
    "broken",
    "crash",
    "crashes",
    "crashing",
    "bug",
    "buggy",
    "glitch",
    "useless",
    "unusable",
    "frustrating",
    "annoying",
    "slow",
    "laggy",
    "freezes",
    "scam",
    "refund",
    "uninstall",
    "uninstalled",
    "waste",
    "garbage",
    "never works",
    "doesn't work",
    "does not work",
    "stopped working",
];

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "love",
    "amazing",
    "wonderful",
    "happy",
    "fantastic",
    "awesome",
    "best",
    "perfect",
    "smooth",
    "helpful",
    "recommend",
    "works great",
    "well done",
];

/// Word-list sentiment classifier over complaint/praise vocabulary.
pub struct LexiconSentiment {
    negative: AhoCorasick,
    positive: AhoCorasick,
}

impl LexiconSentiment {
    pub fn new() -> Result<Self> {
        let negative = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(NEGATIVE_WORDS)
            .map_err(|e| anyhow!("Failed to build negative lexicon matcher: {e}"))?;
        let positive = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(POSITIVE_WORDS)
            .map_err(|e| anyhow!("Failed to build positive lexicon matcher: {e}"))?;

        Ok(Self { negative, positive })
    }
}

impl SentimentClassifier for LexiconSentiment {
    fn is_negative(&self, text: &str) -> bool {
        let negative_hits = self.negative.find_iter(text).count();
        let positive_hits = self.positive.find_iter(text).count();
        // Strict majority: a tie (including zero hits either way) is not
        // enough evidence to call the text a complaint.
        negative_hits > positive_hits
    }
}
