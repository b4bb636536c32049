// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain text and CSV encoders.

use chrono::{DateTime, Local};

const RULE: &str = "========================================";

fn stamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn encode_txt(text: &str, original_name: &str, timestamp: &DateTime<Local>) -> String {
    format!(
        "{RULE}\nDocument Converted by Doc2Any\nOriginal File: {original_name}\nDate: {}\n{RULE}\n\n{text}",
        stamp(timestamp)
    )
}

/// Quote a cell when it holds a comma, quote or newline; inner quotes are
/// doubled.
pub fn csv_cell(cell: &str) -> String {
    let escaped = cell.replace('"', "\"\"");
    if escaped.contains([',', '"', '\n']) {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// Provenance rows, a blank line, then one CSV row per non-blank line.
/// Tab-separated lines spread across cells.
pub fn encode_csv(text: &str, original_name: &str, timestamp: &DateTime<Local>) -> String {
    let rows: Vec<String> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split('\t')
                .map(csv_cell)
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();

    format!(
        "Original File,{}\nConverted By,Doc2Any\nDate,{}\n\n{}",
        csv_cell(original_name),
        stamp(timestamp),
        rows.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::csv::{csv_to_text, parse_csv};
    use chrono::TimeZone;

    fn fixed() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn txt_header() {
        let out = encode_txt("body", "a.pdf", &fixed());
        assert!(out.starts_with(RULE));
        assert!(out.contains("Original File: a.pdf\nDate: 2026-03-01 12:30:00\n"));
        assert!(out.ends_with("\n\nbody"));
    }

    #[test]
    fn cells_are_quoted_when_needed() {
        assert_eq!(csv_cell("plain"), "plain");
        assert_eq!(csv_cell("a,b"), "\"a,b\"");
        assert_eq!(csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn tabbed_text_survives_csv_round_trip() {
        let text = "name\tscore\nSmith, J\t10\n\n";
        let csv = encode_csv(text, "report.csv", &fixed());
        let body = csv.split("\n\n").nth(1).unwrap();
        assert_eq!(body, "name,score\n\"Smith, J\",10");
        assert_eq!(csv_to_text(&parse_csv(body)), "name\tscore\nSmith, J\t10");
    }
}
