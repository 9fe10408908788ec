// Markdown report generation.
//
// Renders an AnalysisResult as a standalone markdown document — the
// hand-off format for sharing a complaint report outside the terminal.

use std::fmt::Write as _;

use crate::model::{AnalysisResult, AnalysisStatus};

/// Render the analysis result as a markdown report.
pub fn render_report(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Complaint Analysis Report\n");
    let _ = writeln!(
        out,
        "- Total reviews analyzed: **{}**",
        result.total_reviews
    );
    let _ = writeln!(
        out,
        "- Negative reviews: **{}** ({:.1}%)",
        result.negative_review_count, result.summary.negative_percentage
    );

    if let AnalysisStatus::InsufficientData { reason } = &result.status {
        let _ = writeln!(out, "\n**Insufficient data**: {reason}");
        return out;
    }

    let _ = writeln!(
        out,
        "- Clustered: {} | Unclassified: {} | Dropped: {}\n",
        result.summary.clustered_review_count,
        result.summary.noise_review_count,
        result.dropped_review_count
    );

    let _ = writeln!(out, "## Ranked complaint categories\n");
    let _ = writeln!(out, "| # | Category | Reviews | Share | Recency |");
    let _ = writeln!(out, "|---|----------|---------|-------|---------|");
    for (i, ranked) in result.ranked_clusters.iter().enumerate() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1}% | {:.0} |",
            i + 1,
            ranked.cluster.name,
            ranked.review_count,
            ranked.percentage_of_total,
            ranked.recency_score,
        );
    }

    for (i, ranked) in result.ranked_clusters.iter().enumerate() {
        let _ = writeln!(out, "\n### {}. {}\n", i + 1, ranked.cluster.name);
        let _ = writeln!(out, "{}\n", ranked.cluster.description);
        if !ranked.cluster.keywords.is_empty() {
            let _ = writeln!(out, "Keywords: {}\n", ranked.cluster.keywords.join(", "));
        }
        for sample in &ranked.cluster.sample_reviews {
            let _ = writeln!(out, "> {}", super::truncate_chars(sample, 300));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cluster, RankedCluster, SummaryStats};

    fn complete_result() -> AnalysisResult {
        AnalysisResult {
            status: AnalysisStatus::Complete,
            total_reviews: 40,
            negative_review_count: 10,
            dropped_review_count: 1,
            ranked_clusters: vec![RankedCluster {
                cluster: Cluster {
                    id: 0,
                    member_ids: vec!["a".into(), "b".into()],
                    centroid: vec![],
                    name: "App Crashes".into(),
                    description: "Issues related to app crashes and instability".into(),
                    keywords: vec!["crash".into(), "startup".into()],
                    sample_reviews: vec!["crashes on startup".into()],
                },
                review_count: 2,
                percentage_of_total: 20.0,
                recency_score: 100.0,
                composite_score: 44.0,
            }],
            summary: SummaryStats {
                negative_percentage: 25.0,
                clustered_review_count: 2,
                noise_review_count: 8,
                recent_cluster_count: 1,
            },
        }
    }

    #[test]
    fn test_report_contains_cluster_table() {
        let report = render_report(&complete_result());
        assert!(report.contains("# Complaint Analysis Report"));
        assert!(report.contains("| 1 | App Crashes | 2 | 20.0% | 100 |"));
        assert!(report.contains("> crashes on startup"));
    }

    #[test]
    fn test_insufficient_report_is_short() {
        let result = AnalysisResult::insufficient("only 3 negative reviews", 10, 3, 0);
        let report = render_report(&result);
        assert!(report.contains("**Insufficient data**: only 3 negative reviews"));
        assert!(!report.contains("Ranked complaint categories"));
    }
}
