use colored::Colorize;
use std::collections::BTreeMap;

use crate::backend::{FileCheck, HistoryEntry, SearchResult, Snapshot};
use crate::knowledge::AggregationReport;

pub fn format_search_results(query: &str, results: &[SearchResult], limit: usize) -> String {
    if results.is_empty() {
        return format!("No results found for \"{}\"", query);
    }

    let mut output = String::new();
    output.push_str(
        &format!("{} results for \"{}\"", results.len(), query)
            .bold()
            .to_string(),
    );
    output.push('\n');

    for (rank, result) in results.iter().take(limit).enumerate() {
        output.push_str(&"━".repeat(60));
        output.push('\n');

        let title = if result.title.is_empty() {
            "(untitled)"
        } else {
            result.title.as_str()
        };
        output.push_str(&format!("{:>2}. ", rank + 1));
        output.push_str(&title.blue().bold().to_string());
        output.push_str(&format!("  [doc {}]", result.doc_id).bright_black().to_string());
        output.push('\n');

        let mut meta = Vec::new();
        if !result.source.is_empty() {
            meta.push(result.source.clone());
        }
        if !result.publish_time.is_empty() {
            meta.push(result.publish_time.clone());
        }
        if !meta.is_empty() {
            output.push_str(&meta.join(" · ").bright_black().to_string());
            output.push('\n');
        }

        let terms = result.matched_terms();
        if !terms.is_empty() {
            output.push_str(&format!("matched: {}", terms.join(", ")).cyan().to_string());
            output.push('\n');
        }

        // Content preview (first 200 chars)
        if !result.content.is_empty() {
            output.push_str(&preview(&result.content, 200));
            output.push('\n');
        }

        if let Some(score) = result.score {
            output.push_str(&format!("score {:.4}", score).green().to_string());
            output.push('\n');
        }
    }

    if results.len() > limit {
        output.push_str(
            &format!("... {} more not shown", results.len() - limit)
                .bright_black()
                .to_string(),
        );
        output.push('\n');
    }

    output
}

pub fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No search history".to_string();
    }

    let mut output = String::new();

    // Header
    output.push_str(
        &format!("{:<6} {:<42} {:<20} {}\n", "ID", "Query", "Time", "Results")
            .bold()
            .to_string(),
    );
    output.push_str(&"─".repeat(80));
    output.push('\n');

    for entry in entries {
        let query = if entry.search_query.chars().count() > 40 {
            format!("{}...", truncate_chars(&entry.search_query, 37))
        } else {
            entry.search_query.clone()
        };
        output.push_str(&format!(
            "{:<6} {:<42} {:<20} {}\n",
            entry.id, query, entry.time, entry.num
        ));
    }

    output
}

pub fn format_file_check(check: &FileCheck) -> String {
    let status = if check.exists {
        "present".green().to_string()
    } else {
        "missing".red().to_string()
    };

    let mut line = format!("{} {}", status, check.path);
    if check.is_dir {
        line.push_str(" (directory)");
    }
    if let Some(modified) = &check.last_modified {
        line.push_str(&format!("  modified {}", modified));
    }
    if let Some(size) = check.size_bytes {
        line.push_str(&format!("  {}", format_size(size)));
    }
    line
}

pub fn format_file_checks(checks: &BTreeMap<String, FileCheck>) -> String {
    checks
        .values()
        .map(format_file_check)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a crawled page as wrapped plain text
pub fn format_snapshot(snapshot: &Snapshot, width: usize) -> String {
    let text = html2text::config::plain()
        .string_from_read(snapshot.html_content.as_bytes(), width)
        .unwrap_or_else(|_| snapshot.html_content.clone());

    let mut output = String::new();
    if !snapshot.url.is_empty() {
        output.push_str(&snapshot.url.bright_black().to_string());
        output.push('\n');
        output.push_str(&"━".repeat(width.min(60)));
        output.push('\n');
    }
    output.push_str(text.trim_end());
    output
}

pub fn format_aggregation(report: &AggregationReport) -> String {
    let mut output = format!(
        "Knowledge: {} of {} documents loaded",
        report.appended.len(),
        report.requested()
    );
    if !report.is_complete() {
        let failed: Vec<String> = report
            .failed
            .iter()
            .map(|(doc_id, e)| format!("doc {} ({})", doc_id, e.kind()))
            .collect();
        output.push_str(&format!(", skipped {}", failed.join(", ")));
    }
    output.bright_black().to_string()
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() > max_chars {
        format!("{}...", truncate_chars(&flattened, max_chars))
    } else {
        flattened
    }
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}
