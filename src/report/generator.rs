//! Markdown and JSON report generation.
//!
//! This module renders a [`ReviewDashboard`] for the one-shot CLI mode.

use crate::analysis::most_contested_papers;
use crate::models::{PaperSummary, ReviewDashboard};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(
    dashboard: &ReviewDashboard,
    generated_at: DateTime<Utc>,
    contested_papers: usize,
) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Review Summary Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(dashboard, generated_at));

    // Per-paper table
    output.push_str(&generate_papers_section(&dashboard.summary.papers));

    // Papers with the widest score spread
    output.push_str(&generate_contested_section(
        &dashboard.summary.papers,
        contested_papers,
    ));

    // Documents that could not be read
    output.push_str(&generate_parse_errors_section(&dashboard.parse_errors));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(dashboard: &ReviewDashboard, generated_at: DateTime<Utc>) -> String {
    let mut section = String::new();
    let summary = &dashboard.summary;

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source Folder:** `{}`\n", dashboard.source_folder));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Documents Parsed:** {} of {}\n",
        dashboard.parsed_files, dashboard.xml_files
    ));
    if dashboard.has_parse_errors() {
        section.push_str(&format!(
            "- **Documents Skipped:** {}\n",
            dashboard.parse_errors.len()
        ));
    }
    section.push_str(&format!("- **Papers:** {}\n", summary.paper_count));
    section.push_str(&format!("- **Reviews:** {}\n", summary.review_count));
    section.push_str(&format!("- **Scoring Reviewers:** {}\n", summary.reviewer_count));
    section.push('\n');

    section
}

/// Render an optional score, with a dash for missing values.
fn score_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "–".to_string())
}

/// Escape text for use inside a Markdown table cell.
fn table_cell(text: &str) -> String {
    if text.is_empty() {
        return "–".to_string();
    }
    text.replace('|', "\\|")
}

/// Generate the per-paper statistics table.
fn generate_papers_section(papers: &[PaperSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Papers\n\n");

    if papers.is_empty() {
        section.push_str("No papers were found.\n\n");
        return section;
    }

    section.push_str(
        "| Submission | Title | Reviews | Avg | Min | Max | Spread | Avg Conf | Conf-Weighted | Reviewer-Adjusted | Avg Words |\n",
    );
    section.push_str("|:---|:---|:---:|:---:|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for paper in papers {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {:.1} |\n",
            table_cell(&paper.submission),
            table_cell(&paper.title),
            paper.review_count,
            score_cell(paper.avg_score),
            score_cell(paper.min_score),
            score_cell(paper.max_score),
            score_cell(paper.score_discrepancy),
            score_cell(paper.avg_confidence),
            score_cell(paper.confidence_weighted_score),
            score_cell(paper.reviewer_adjusted_score),
            paper.avg_word_count,
        ));
    }
    section.push('\n');

    section
}

/// Generate the most-contested papers section.
fn generate_contested_section(papers: &[PaperSummary], n: usize) -> String {
    let contested = most_contested_papers(papers, n);
    if contested.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Most Contested Papers\n\n");
    section.push_str("Submissions whose reviewers disagree the most (max - min overall score).\n\n");

    for (i, paper) in contested.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** {} (spread {}, {} reviews)\n",
            i + 1,
            table_cell(&paper.submission),
            paper.title,
            score_cell(paper.score_discrepancy),
            paper.review_count
        ));
    }
    section.push('\n');

    section
}

/// Generate the parse errors section.
fn generate_parse_errors_section(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Skipped Documents\n\n");
    for error in errors {
        section.push_str(&format!("- {}\n", error));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by ReviewLens v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &ReviewDashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn save_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::summarize_reviews;
    use crate::models::{ReviewRecord, TextMetrics};
    use chrono::TimeZone;

    fn create_test_review(file_name: &str, submission: &str, pc: &str, score: Option<f64>) -> ReviewRecord {
        ReviewRecord {
            submission: submission.to_string(),
            title: format!("Title | {}", submission),
            authors: String::new(),
            file_name: file_name.to_string(),
            review_id: String::new(),
            pc_member: pc.to_string(),
            overall_text: "Fine.".to_string(),
            overall_score: score,
            confidence_score: None,
            confidential_text: String::new(),
            subreviewer_name: String::new(),
            subreviewer_email: String::new(),
            metrics: TextMetrics::from_text("Fine."),
        }
    }

    fn create_test_dashboard() -> ReviewDashboard {
        let reviews = vec![
            create_test_review("a.xml", "1", "alice", Some(3.0)),
            create_test_review("b.xml", "1", "bob", Some(-2.0)),
            create_test_review("c.xml", "2", "alice", None),
        ];

        ReviewDashboard {
            summary: summarize_reviews(&reviews),
            source_folder: "/srv/reviews".to_string(),
            xml_files: 4,
            parsed_files: 3,
            parse_errors: vec!["Invalid review document d.xml: malformed XML".to_string()],
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_markdown_report() {
        let dashboard = create_test_dashboard();
        let markdown = generate_markdown_report(&dashboard, fixed_time(), 5);

        assert!(markdown.contains("# Review Summary Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Papers"));
        assert!(markdown.contains("## Most Contested Papers"));
        assert!(markdown.contains("## Skipped Documents"));
        assert!(markdown.contains("d.xml"));
        assert!(markdown.contains("2026-03-01 12:00:00 UTC"));
    }

    #[test]
    fn test_metadata_section() {
        let dashboard = create_test_dashboard();
        let section = generate_metadata_section(&dashboard, fixed_time());

        assert!(section.contains("/srv/reviews"));
        assert!(section.contains("3 of 4"));
        assert!(section.contains("Documents Skipped:** 1"));
        assert!(section.contains("Papers:** 2"));
    }

    #[test]
    fn test_papers_table_escapes_and_dashes() {
        let dashboard = create_test_dashboard();
        let section = generate_papers_section(&dashboard.summary.papers);

        assert!(section.contains("Title \\| 1"));
        // Paper 2 has no scores.
        let row = section.lines().find(|l| l.starts_with("| 2 ")).unwrap();
        assert!(row.contains("| – |"));
    }

    #[test]
    fn test_no_parse_errors_section_when_clean() {
        let mut dashboard = create_test_dashboard();
        dashboard.parse_errors.clear();
        let markdown = generate_markdown_report(&dashboard, fixed_time(), 5);
        assert!(!markdown.contains("## Skipped Documents"));
    }

    #[test]
    fn test_generate_json_report() {
        let dashboard = create_test_dashboard();
        let json = generate_json_report(&dashboard).unwrap();

        assert!(json.contains("\"paperCount\""));
        assert!(json.contains("\"reviewRows\""));
        assert!(json.contains("\"confidenceWeightedScore\""));
    }

    #[test]
    fn test_save_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.md");
        save_report("# hi\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hi\n");
    }
}
