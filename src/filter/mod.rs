// Negative-review filter — selects the subset worth clustering.
//
// The selection rule is rating-first: a 1-2 star review is a complaint by
// definition, a 3+ star review is not. Only when the rating is missing do
// we fall back to the pluggable sentiment classifier, so platforms without
// star ratings (social mentions) still participate.

pub mod lexicon;
pub mod traits;

use tracing::info;

use crate::model::NormalizedReview;
use traits::SentimentClassifier;

/// Rating at or below which a review counts as negative (1-5 scale).
pub const NEGATIVE_RATING_MAX: u8 = 2;

/// Partition normalized reviews into the negative subset.
///
/// Returns the negative reviews in input order. The caller keeps the full
/// input count alongside so "25% negative" reporting works without
/// recomputation.
pub fn filter_negative(
    reviews: Vec<NormalizedReview>,
    sentiment: &dyn SentimentClassifier,
) -> Vec<NormalizedReview> {
    let total = reviews.len();

    let negative: Vec<NormalizedReview> = reviews
        .into_iter()
        .filter(|r| match r.review.rating {
            Some(rating) => rating <= NEGATIVE_RATING_MAX,
            None => sentiment.is_negative(&r.cleaned_text),
        })
        .collect();

    info!(
        total,
        negative = negative.len(),
        "Filtered reviews to negative subset"
    );

    negative
}
