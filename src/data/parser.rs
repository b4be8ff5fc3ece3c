use std::collections::HashMap;

use crate::data::periods;

/// Detect the header row among the first `max_rows` rows of a sheet.
/// Returns the 0-based row index of the header row.
///
/// Scans from the bottom up for the last row that has the most common
/// column count and consists only of non-empty text cells (no numbers and
/// no period labels). Falls back to row 0.
pub fn detect_header_row(rows: &[Vec<String>], max_rows: usize) -> usize {
    // Blank lines are skipped but keep their original index.
    let rows: Vec<(usize, &Vec<String>)> = rows
        .iter()
        .take(max_rows)
        .enumerate()
        .filter(|(_, r)| r.iter().any(|c| !c.trim().is_empty()))
        .collect();
    if rows.is_empty() {
        return 0;
    }

    let width = |row: &Vec<String>| {
        row.iter()
            .rposition(|c| !c.trim().is_empty())
            .map(|p| p + 1)
            .unwrap_or(0)
    };

    // Find most common column count
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for (_, row) in &rows {
        *counts.entry(width(*row)).or_insert(0) += 1;
    }
    let most_common = counts
        .into_iter()
        .max_by_key(|&(len, c)| (c, len))
        .map(|(len, _)| len)
        .unwrap_or(0);

    for &(index, row) in rows.iter().rev() {
        if width(row) != most_common {
            continue;
        }
        let all_text = row.iter().take(most_common).all(|cell| {
            let trimmed = cell.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().is_err() && !is_period_like(trimmed)
        });
        if all_text {
            return index;
        }
    }

    0
}

fn is_period_like(s: &str) -> bool {
    let has_digit = s.chars().any(|c| c.is_ascii_digit());
    has_digit && periods::parse_period(s).is_some()
}

/// Decode file bytes as UTF-8, falling back to Latin-1.
pub fn decode_text(content: Vec<u8>) -> String {
    match String::from_utf8(content) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}
