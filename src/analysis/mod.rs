//! Review analysis: text metrics and score aggregation.

pub mod aggregator;
pub mod text_metrics;

pub use aggregator::*;

use crate::error::ReviewError;
use crate::models::ReviewDashboard;
use crate::scanner::load_folder;
use std::path::Path;
use tracing::info;

/// Load a review folder and aggregate it into a dashboard.
///
/// Each call owns all of its data; nothing is cached between runs.
pub fn build_dashboard(folder: &Path) -> Result<ReviewDashboard, ReviewError> {
    let loaded = load_folder(folder)?;
    let summary = summarize_reviews(&loaded.records);

    info!(
        "Aggregated {} reviews across {} papers ({} reviewers)",
        summary.review_count, summary.paper_count, summary.reviewer_count
    );

    Ok(ReviewDashboard {
        summary,
        source_folder: folder.display().to_string(),
        xml_files: loaded.candidate_files,
        parsed_files: loaded.parsed_files,
        parse_errors: loaded.parse_errors,
    })
}
