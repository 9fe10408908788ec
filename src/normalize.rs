// Text normalization — cleans raw review text into clustering-ready form.
//
// Review text arrives full of noise: URLs, emoji, platform boilerplate
// ("Full Review" suffixes), repeated whitespace. The normalizer strips all
// of that and lowercases, producing text suitable for both the sentiment
// lexicon and the embedding model.
//
// Normalization is a pure transform and a fixed point: cleaning already
// cleaned text yields the same bytes. Reviews that end up too short are
// dropped, never propagated. Exact duplicates within a batch are dropped
// too, keeping the first occurrence — one spam repost must not dominate a
// cluster's weight.

use std::collections::HashSet;

use regex_lite::Regex;
use tracing::{debug, warn};

use crate::model::{NormalizedReview, Review};

/// Default cap on cleaned text length, in characters.
pub const DEFAULT_MAX_CHARS: usize = 2000;

/// Default minimum word count below which a review is dropped.
pub const DEFAULT_MIN_WORDS: usize = 3;

/// Review text normalizer. Construct once per run and reuse — the regexes
/// are compiled in `new`.
pub struct Normalizer {
    url_re: Regex,
    email_re: Regex,
    boilerplate_re: Regex,
    punct_re: Regex,
    whitespace_re: Regex,
    max_chars: usize,
    min_words: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS, DEFAULT_MIN_WORDS)
    }
}

impl Normalizer {
    pub fn new(max_chars: usize, min_words: usize) -> Self {
        Self {
            url_re: Regex::new(r"https?://\S+").expect("valid url regex"),
            email_re: Regex::new(r"\S+@\S+").expect("valid email regex"),
            // Trailing platform boilerplate. Stripped repeatedly so stacked
            // suffixes ("... Read More Full Review") all come off.
            boilerplate_re: Regex::new(r"(?:full review|read more|show more|show less)\s*$")
                .expect("valid boilerplate regex"),
            // Keep word characters, whitespace, and basic sentence
            // punctuation; everything else becomes a space.
            punct_re: Regex::new(r"[^\w\s.!?']").expect("valid punctuation regex"),
            whitespace_re: Regex::new(r"\s+").expect("valid whitespace regex"),
            max_chars,
            min_words,
        }
    }

    /// Clean a single review text. Returns None when the result is too
    /// short to carry a complaint.
    pub fn clean(&self, text: &str) -> Option<String> {
        let mut text = text.to_lowercase();

        text = self.url_re.replace_all(&text, " ").into_owned();
        text = self.email_re.replace_all(&text, " ").into_owned();
        text = strip_emoji_and_control(&text);
        text = self.punct_re.replace_all(&text, " ").into_owned();
        text = self.whitespace_re.replace_all(&text, " ").into_owned();
        text = text.trim().to_string();

        loop {
            let stripped = self.boilerplate_re.replace(&text, "").trim_end().to_string();
            if stripped == text {
                break;
            }
            text = stripped;
        }

        if text.chars().count() > self.max_chars {
            text = text.chars().take(self.max_chars).collect::<String>();
            text = text.trim_end().to_string();
        }

        if text.split_whitespace().count() < self.min_words {
            return None;
        }

        Some(text)
    }

    /// Normalize a batch of reviews.
    ///
    /// Returns the surviving reviews in input order plus the count of
    /// dropped items (too short after cleaning, or exact duplicates of an
    /// earlier review in the same batch). A single malformed review never
    /// aborts the batch.
    pub fn normalize_batch(&self, reviews: Vec<Review>) -> (Vec<NormalizedReview>, u32) {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(reviews.len());
        let mut dropped = 0u32;

        for review in reviews {
            let Some(cleaned_text) = self.clean(&review.text) else {
                debug!(review_id = %review.id, "Dropped review: too short after cleaning");
                dropped += 1;
                continue;
            };

            if !seen.insert(cleaned_text.clone()) {
                warn!(review_id = %review.id, "Dropped review: exact duplicate text");
                dropped += 1;
                continue;
            }

            out.push(NormalizedReview {
                review,
                cleaned_text,
            });
        }

        (out, dropped)
    }
}

/// Replace emoji, pictographs, and control characters with spaces.
///
/// Character-range filter rather than a regex: regex-lite has no Unicode
/// property classes, and the emoji blocks are few enough to enumerate.
fn strip_emoji_and_control(text: &str) -> String {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            let is_emoji = (0x1F000..=0x1FAFF).contains(&cp)   // pictographs, emoticons, symbols
                || (0x2600..=0x27BF).contains(&cp)              // misc symbols, dingbats
                || (0x2190..=0x21FF).contains(&cp)              // arrows
                || cp == 0xFE0F                                 // variation selector
                || cp == 0x200D;                                // zero-width joiner
            if c.is_control() || is_emoji {
                ' '
            } else {
                c
            }
        })
        .collect()
}
