// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line-oriented CSV reading. Quoted fields may contain commas and doubled
// quotes; a quoted field never spans lines.

/// Split CSV text into trimmed fields. Blank lines are skipped.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }

        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    row.push(field.trim().to_string());
                    field.clear();
                }
                other => field.push(other),
            }
        }
        row.push(field.trim().to_string());
        rows.push(row);
    }
    rows
}

/// Tab-joined fields, newline-joined rows.
pub fn csv_to_text(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_comma_stays_in_field() {
        let rows = parse_csv("\"a,b\",c\n1,2,3");
        assert_eq!(rows, vec![vec!["a,b", "c"], vec!["1", "2", "3"]]);
        assert_eq!(csv_to_text(&rows), "a,b\tc\n1\t2\t3");
    }

    #[test]
    fn doubled_quotes_and_crlf() {
        let rows = parse_csv("\"say \"\"hi\"\"\", x \r\n\r\n  \nlast");
        assert_eq!(rows, vec![vec!["say \"hi\"", "x"], vec!["last"]]);
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(parse_csv("").is_empty());
        assert_eq!(csv_to_text(&[]), "");
    }
}
