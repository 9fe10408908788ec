// Sentiment classifier trait — swap-ready abstraction.
//
// Reviews from platforms without star ratings (social mentions, forum
// posts) still need to participate in complaint analysis. This trait lets
// the filter ask "is this text a complaint?" without caring whether the
// answer comes from a lexicon, a local model, or an external service.

/// Trait for classifying unrated review text as negative or not.
pub trait SentimentClassifier: Send + Sync {
    /// True when the text reads as a complaint.
    fn is_negative(&self, text: &str) -> bool;
}
