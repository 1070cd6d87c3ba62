//! Output formatting utilities.

use nfts_canonical::CanonicalReport;

/// Prints a table header and separator.
pub fn print_table_header(columns: &str) {
    println!("{}", columns);
    println!("{}", "-".repeat(70));
}

/// Prints a section title, as used by `compare`.
pub fn print_section(title: &str) {
    println!("{}", title);
    println!("{}", "-".repeat(70));
}

/// One-line summary of canonicalization warnings.
pub fn format_warnings(report: &CanonicalReport) -> String {
    if report.warnings.is_empty() {
        "-".to_string()
    } else {
        report.warning_codes().join(", ")
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
