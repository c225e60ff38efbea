//! Review aggregation and statistics.
//!
//! Aggregation runs in two explicit passes over the full record set:
//!
//! 1. [`reviewer_statistics`] computes per-reviewer score statistics.
//! 2. [`summarize_papers`] groups records by submission and derives paper
//!    scores, two of which read the complete reviewer statistics.
//!
//! Grouping uses insertion-ordered maps so repeated runs over the same
//! records produce identical output.

use super::text_metrics::round_to;
use crate::models::{
    PaperSummary, ReviewDetail, ReviewRecord, ReviewRow, ReviewSummary, ReviewerStats,
};
use indexmap::IndexMap;

/// Lowest and highest confidence used for weighting.
const CONFIDENCE_MIN: f64 = 1.0;
const CONFIDENCE_MAX: f64 = 5.0;
/// Extra weight given at maximum confidence.
const CONFIDENCE_BONUS: f64 = 0.5;

/// Reviewer statistics keyed by reviewer key, in first-seen order.
pub type ReviewerStatsMap = IndexMap<String, ReviewerStats>;

/// Mean of a slice, `None` when empty.
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Pass 1: score statistics per reviewer.
///
/// Reviewers without any scored review are absent from the result.
pub fn reviewer_statistics(reviews: &[ReviewRecord]) -> ReviewerStatsMap {
    let mut scores: IndexMap<String, Vec<f64>> = IndexMap::new();

    for review in reviews {
        if let Some(score) = review.overall_score {
            scores.entry(review.reviewer_key()).or_default().push(score);
        }
    }

    scores
        .into_iter()
        .filter_map(|(key, scores)| ReviewerStats::from_scores(&scores).map(|s| (key, s)))
        .collect()
}

/// Weight of a review in the confidence-weighted score.
///
/// Confidence is clamped to [1, 5] and mapped linearly onto [1.0, 1.5];
/// a review without a confidence counts with weight 1.0.
pub fn confidence_weight(confidence: Option<f64>) -> f64 {
    match confidence {
        None => 1.0,
        Some(confidence) => {
            let clamped = confidence.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX);
            1.0 + CONFIDENCE_BONUS * (clamped - CONFIDENCE_MIN) / (CONFIDENCE_MAX - CONFIDENCE_MIN)
        }
    }
}

/// A score's deviation from its reviewer's mean, scaled by the reviewer's range.
///
/// Reviewers with a zero range (a single score, or always the same score)
/// contribute 0.0.
pub fn reviewer_adjusted_contribution(score: f64, stats: &ReviewerStats) -> f64 {
    if stats.range > 0.0 {
        (score - stats.mean) / stats.range
    } else {
        0.0
    }
}

/// Aggregate one submission's reviews.
///
/// `reviews` pairs each record with its resolved reviewer key.
fn summarize_paper(reviews: &[(&ReviewRecord, String)], stats: &ReviewerStatsMap) -> PaperSummary {
    let first = reviews[0].0;

    let scores: Vec<f64> = reviews.iter().filter_map(|(r, _)| r.overall_score).collect();
    let confidences: Vec<f64> = reviews
        .iter()
        .filter_map(|(r, _)| r.confidence_score)
        .collect();
    let word_counts: Vec<f64> = reviews
        .iter()
        .map(|(r, _)| r.metrics.word_count as f64)
        .collect();

    let min_score = scores.iter().copied().reduce(f64::min);
    let max_score = scores.iter().copied().reduce(f64::max);
    let score_discrepancy = min_score
        .zip(max_score)
        .map(|(min, max)| round_to(max - min, 3));

    let mut weighted_total = 0.0;
    let mut weight_sum = 0.0;
    let mut adjusted = Vec::new();

    for (review, key) in reviews {
        let Some(score) = review.overall_score else {
            continue;
        };

        let weight = confidence_weight(review.confidence_score);
        weighted_total += score * weight;
        weight_sum += weight;

        if let Some(reviewer) = stats.get(key) {
            adjusted.push(reviewer_adjusted_contribution(score, reviewer));
        }
    }

    let confidence_weighted_score = if weight_sum > 0.0 {
        Some(round_to(weighted_total / weight_sum, 3))
    } else {
        None
    };

    PaperSummary {
        submission: first.submission.clone(),
        title: first.title.clone(),
        authors: first.authors.clone(),
        review_count: reviews.len(),
        avg_score: mean(&scores).map(|v| round_to(v, 3)),
        min_score,
        max_score,
        score_discrepancy,
        avg_confidence: mean(&confidences).map(|v| round_to(v, 3)),
        avg_word_count: mean(&word_counts).map(|v| round_to(v, 1)).unwrap_or(0.0),
        confidence_weighted_score,
        reviewer_adjusted_score: mean(&adjusted).map(|v| round_to(v, 3)),
        reviews: reviews
            .iter()
            .map(|(r, key)| ReviewDetail::new(r, key.clone()))
            .collect(),
    }
}

/// Pass 2: one summary per submission, in first-seen order.
///
/// `stats` must be the complete result of [`reviewer_statistics`] over the
/// same records.
pub fn summarize_papers(reviews: &[ReviewRecord], stats: &ReviewerStatsMap) -> Vec<PaperSummary> {
    let mut by_submission: IndexMap<&str, Vec<(&ReviewRecord, String)>> = IndexMap::new();

    for review in reviews {
        by_submission
            .entry(review.submission.as_str())
            .or_default()
            .push((review, review.reviewer_key()));
    }

    by_submission
        .values()
        .map(|group| summarize_paper(group, stats))
        .collect()
}

/// Run the full aggregation over one record set.
pub fn summarize_reviews(reviews: &[ReviewRecord]) -> ReviewSummary {
    let stats = reviewer_statistics(reviews);
    let papers = summarize_papers(reviews, &stats);

    let review_rows: Vec<ReviewRow> = reviews
        .iter()
        .map(|r| ReviewRow::new(r, r.reviewer_key()))
        .collect();

    ReviewSummary {
        paper_count: papers.len(),
        review_count: review_rows.len(),
        papers,
        review_rows,
        reviewer_count: stats.len(),
    }
}

/// Papers sorted by descending score discrepancy (unscored papers last).
///
/// Useful for spotting submissions whose reviewers disagree the most.
pub fn most_contested_papers(papers: &[PaperSummary], n: usize) -> Vec<&PaperSummary> {
    let mut contested: Vec<&PaperSummary> = papers
        .iter()
        .filter(|p| p.score_discrepancy.is_some())
        .collect();

    contested.sort_by(|a, b| {
        b.score_discrepancy
            .partial_cmp(&a.score_discrepancy)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    contested.truncate(n);

    contested
}
