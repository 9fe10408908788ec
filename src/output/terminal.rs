// Colored terminal output for analysis results.
//
// This module handles all terminal-specific formatting: colors, bars,
// summary lines. The main.rs display path delegates here.

use colored::Colorize;

use crate::model::{AnalysisResult, AnalysisStatus, RankedCluster};

/// Display a complete analysis result in the terminal.
pub fn display_analysis(result: &AnalysisResult) {
    println!(
        "\n{}",
        format!(
            "=== Complaint Analysis ({} reviews, {} negative) ===",
            result.total_reviews, result.negative_review_count
        )
        .bold()
    );

    if let AnalysisStatus::InsufficientData { reason } = &result.status {
        println!();
        println!("  {} {}", "Insufficient data:".yellow().bold(), reason);
        println!("  Collect more reviews and rerun the analysis.");
        return;
    }

    println!();
    for (i, ranked) in result.ranked_clusters.iter().enumerate() {
        display_cluster_row(i + 1, ranked);
    }

    // Summary
    let summary = &result.summary;
    println!("  {}", "-".repeat(72).dimmed());
    println!(
        "  {:.1}% of all reviews are negative; {} clustered, {} unclassified",
        summary.negative_percentage, summary.clustered_review_count, summary.noise_review_count
    );
    if summary.recent_cluster_count > 0 {
        println!(
            "  {} {} complaint categories show concentrated recent activity",
            "!".bright_red(),
            summary.recent_cluster_count
        );
    }
    if result.dropped_review_count > 0 {
        println!(
            "  {}",
            format!("{} reviews dropped during processing", result.dropped_review_count).dimmed()
        );
    }
    println!();
}

/// One ranked cluster: name, share bar, metrics, keywords, top sample.
fn display_cluster_row(rank: usize, ranked: &RankedCluster) {
    let bar_width: usize = 20;
    let filled = (ranked.percentage_of_total / 100.0 * bar_width as f64).round() as usize;
    let empty = bar_width.saturating_sub(filled);
    let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(empty));

    let colored_bar = if ranked.percentage_of_total >= 25.0 {
        bar.bright_red()
    } else if ranked.percentage_of_total >= 10.0 {
        bar.bright_yellow()
    } else {
        bar.bright_blue()
    };

    println!(
        "  {:>2}. {:<36} {} {:>5.1}%  ({} reviews, recency {:.0})",
        rank,
        ranked.cluster.name.bold(),
        colored_bar,
        ranked.percentage_of_total,
        ranked.review_count,
        ranked.recency_score,
    );
    println!("      {}", ranked.cluster.description);

    if !ranked.cluster.keywords.is_empty() {
        let keywords_str = ranked.cluster.keywords.join(", ");
        println!("      Keywords: {}", keywords_str.dimmed());
    }
    if let Some(sample) = ranked.cluster.sample_reviews.first() {
        let preview = super::truncate_chars(sample, 120);
        println!("      \"{}\"", preview.dimmed());
    }
    println!();
}
