//! Row text: join the data tokens inside a band into one treatment line.

use super::rows::RowBand;
use super::text::TextToken;
use crate::config::{RowTuning, Vocabulary};

/// Tokens whose vertical centre lies in the band, read line by line.
pub fn assemble_row_text(tokens: &[&TextToken], band: &RowBand, line_tolerance: f32) -> String {
    let mut inside: Vec<&TextToken> = tokens
        .iter()
        .copied()
        .filter(|t| band.owns(t.y_center()))
        .collect();
    inside.sort_by(|a, b| a.y_center().total_cmp(&b.y_center()));

    let mut lines: Vec<Vec<&TextToken>> = Vec::new();
    for token in inside {
        match lines.last_mut() {
            Some(line) if (token.y_center() - line[0].y_center()).abs() <= line_tolerance => {
                line.push(token)
            }
            _ => lines.push(vec![token]),
        }
    }

    lines
        .into_iter()
        .flat_map(|mut line| {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            line
        })
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop leading words that belong to a section title rather than the
/// treatment.
pub fn trim_prefix(text: &str, vocabulary: &Vocabulary) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words
        .iter()
        .position(|w| {
            let starts_well = w.starts_with(|c: char| c.is_uppercase() || c.is_ascii_digit());
            starts_well && !vocabulary.category_words.iter().any(|cw| cw == w)
        })
        .unwrap_or(words.len());
    words[start..].join(" ")
}

/// Boilerplate fields of the form (name, date, VIN, mileage...).
pub fn is_junk(text: &str, vocabulary: &Vocabulary) -> bool {
    vocabulary.junk_patterns.iter().any(|p| text.contains(p.as_str()))
}

/// Final text for a row, or `None` when there is nothing worth keeping.
///
/// A trim that leaves less than `min_trimmed_len` characters is undone.
pub fn clean_row_text(raw: &str, tuning: &RowTuning, vocabulary: &Vocabulary) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let trimmed = trim_prefix(raw, vocabulary);
    let text = if trimmed.chars().count() < tuning.min_trimmed_len {
        raw.to_string()
    } else {
        trimmed
    };
    if is_junk(&text, vocabulary) {
        return None;
    }
    Some(text)
}
