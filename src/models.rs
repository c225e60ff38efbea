//! Data models for the review aggregator.
//!
//! This module contains the core data structures used throughout the
//! application: the canonical per-document review record, reviewer
//! statistics, and the serialized aggregate returned to callers.

use serde::{Deserialize, Serialize};

/// Text metrics derived from a review's overall evaluation text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMetrics {
    /// Number of word tokens.
    pub word_count: usize,
    /// Number of characters in the normalized text.
    pub char_count: usize,
    /// Number of non-empty sentences.
    pub sentence_count: usize,
    /// Distinct/total word ratio, rounded to 3 decimals.
    pub unique_word_ratio: f64,
}

/// One parsed review document in canonical form.
///
/// Records are immutable once extracted; every aggregation run derives its
/// statistics from a fresh slice of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    /// Submission (paper) identifier.
    pub submission: String,
    /// Paper title.
    pub title: String,
    /// Paper authors as given in the document.
    pub authors: String,
    /// Name of the source document, used as a fallback identity.
    pub file_name: String,
    /// Review identifier.
    pub review_id: String,
    /// Program committee member responsible for the review.
    pub pc_member: String,
    /// Normalized overall evaluation text.
    pub overall_text: String,
    /// Overall evaluation score, if present and numeric.
    pub overall_score: Option<f64>,
    /// Reviewer's stated confidence, if present and numeric.
    pub confidence_score: Option<f64>,
    /// Normalized confidential remarks for the program committee.
    pub confidential_text: String,
    /// Delegated (sub)reviewer full name.
    pub subreviewer_name: String,
    /// Delegated (sub)reviewer email.
    pub subreviewer_email: String,
    /// Metrics computed over `overall_text`.
    pub metrics: TextMetrics,
}

impl ReviewRecord {
    /// Resolve the identity used to group this review by reviewer.
    ///
    /// Precedence: PC member, subreviewer email, subreviewer name, then a
    /// synthetic key derived from the file name.
    pub fn reviewer_key(&self) -> String {
        [
            &self.pc_member,
            &self.subreviewer_email,
            &self.subreviewer_name,
        ]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .cloned()
        .unwrap_or_else(|| format!("unknown:{}", self.file_name))
    }

    /// Whether confidential remarks were supplied.
    pub fn has_confidential(&self) -> bool {
        !self.confidential_text.is_empty()
    }
}

/// Score statistics for a single reviewer across all papers in a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewerStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// `max - min`.
    pub range: f64,
}

impl ReviewerStats {
    /// Compute statistics over a reviewer's scores. Returns `None` for an
    /// empty slice.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            min,
            max,
            range: max - min,
        })
    }
}

/// Per-review detail attached to a paper aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetail {
    pub file_name: String,
    pub review_id: String,
    pub pc_member: String,
    pub overall_score: Option<f64>,
    pub confidence_score: Option<f64>,
    pub overall_text: String,
    /// Blanked when a redaction policy is applied at the interface boundary.
    pub confidential_text: String,
    pub has_confidential: bool,
    pub subreviewer_name: String,
    pub subreviewer_email: String,
    #[serde(flatten)]
    pub metrics: TextMetrics,
    pub reviewer_key: String,
}

impl ReviewDetail {
    pub fn new(review: &ReviewRecord, reviewer_key: String) -> Self {
        Self {
            file_name: review.file_name.clone(),
            review_id: review.review_id.clone(),
            pc_member: review.pc_member.clone(),
            overall_score: review.overall_score,
            confidence_score: review.confidence_score,
            overall_text: review.overall_text.clone(),
            confidential_text: review.confidential_text.clone(),
            has_confidential: review.has_confidential(),
            subreviewer_name: review.subreviewer_name.clone(),
            subreviewer_email: review.subreviewer_email.clone(),
            metrics: review.metrics,
            reviewer_key,
        }
    }
}

/// Flat per-review row for tabular listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub submission: String,
    pub title: String,
    pub file_name: String,
    pub overall_score: Option<f64>,
    pub confidence_score: Option<f64>,
    #[serde(flatten)]
    pub metrics: TextMetrics,
    pub pc_member: String,
    pub reviewer_key: String,
    pub review_id: String,
    pub has_confidential: bool,
}

impl ReviewRow {
    pub fn new(review: &ReviewRecord, reviewer_key: String) -> Self {
        Self {
            submission: review.submission.clone(),
            title: review.title.clone(),
            file_name: review.file_name.clone(),
            overall_score: review.overall_score,
            confidence_score: review.confidence_score,
            metrics: review.metrics,
            pc_member: review.pc_member.clone(),
            reviewer_key,
            review_id: review.review_id.clone(),
            has_confidential: review.has_confidential(),
        }
    }
}

/// Aggregate statistics for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperSummary {
    pub submission: String,
    pub title: String,
    pub authors: String,
    pub review_count: usize,
    pub avg_score: Option<f64>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub score_discrepancy: Option<f64>,
    pub avg_confidence: Option<f64>,
    pub avg_word_count: f64,
    pub confidence_weighted_score: Option<f64>,
    pub reviewer_adjusted_score: Option<f64>,
    pub reviews: Vec<ReviewDetail>,
}

/// Output of one aggregation engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub paper_count: usize,
    pub review_count: usize,
    /// Papers in first-seen submission order.
    pub papers: Vec<PaperSummary>,
    /// One row per review record, in input order.
    pub review_rows: Vec<ReviewRow>,
    /// Number of reviewers with at least one scored review.
    pub reviewer_count: usize,
}

/// Result of loading a review folder.
#[derive(Debug, Clone)]
pub struct LoadedFolder {
    /// Successfully extracted records, in file-name order.
    pub records: Vec<ReviewRecord>,
    /// Number of candidate documents found.
    pub candidate_files: usize,
    /// Number of documents that parsed.
    pub parsed_files: usize,
    /// One message per document that failed to parse.
    pub parse_errors: Vec<String>,
}

/// The complete aggregate for a review folder, as served to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDashboard {
    #[serde(flatten)]
    pub summary: ReviewSummary,
    /// Folder the reviews were loaded from.
    pub source_folder: String,
    /// Number of candidate XML documents.
    pub xml_files: usize,
    /// Number of documents parsed successfully.
    pub parsed_files: usize,
    pub parse_errors: Vec<String>,
}

impl ReviewDashboard {
    /// Blank confidential remarks in every review detail.
    ///
    /// `has_confidential` flags are left intact so callers can still tell
    /// which reviews carried remarks.
    pub fn redact_confidential(&mut self) {
        for paper in &mut self.summary.papers {
            for review in &mut paper.reviews {
                review.confidential_text.clear();
            }
        }
    }

    /// Whether any document in the folder failed to parse.
    pub fn has_parse_errors(&self) -> bool {
        !self.parse_errors.is_empty()
    }
}
