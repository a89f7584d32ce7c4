//! Service-interval and model columns.
//!
//! Service columns come from checkbox X positions across the whole document;
//! each one is labelled from the header text stacked above it. Model columns
//! are the narrow labels printed just left of the first service column, and
//! a single label may be split over two adjacent positions.

use super::text::TextToken;
use crate::config::{ColumnTuning, Vocabulary};
use crate::grid::ServiceKey;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static RE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4}$").unwrap());

/// One maintenance-interval column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceColumn {
    pub x: f32,
    /// `None` when the header matched no interval marker.
    pub key: Option<ServiceKey>,
    pub header: String,
}

/// One vehicle-model column; `xs` has two members for a split label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelColumn {
    pub xs: Vec<f32>,
    pub name: String,
}

/// The column layout of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnAxis {
    pub service_columns: Vec<ServiceColumn>,
    pub model_columns: Vec<ModelColumn>,
}

impl ColumnAxis {
    /// Build the axis from every checkbox X of the document and the header
    /// tokens of its first page.
    pub fn classify(
        checkbox_xs: &[f32],
        header: &[&TextToken],
        tuning: &ColumnTuning,
        vocabulary: &Vocabulary,
    ) -> Self {
        let mut xs = cluster_positions(checkbox_xs, tuning.service_cluster_tolerance);
        if xs.is_empty() {
            xs = marker_unit_positions(header, tuning, vocabulary);
        }

        let service_columns: Vec<ServiceColumn> = xs
            .into_iter()
            .map(|x| {
                let header_text = header
                    .iter()
                    .filter(|t| (t.x_center() - x).abs() < tuning.service_header_radius)
                    .take(tuning.service_header_max_tokens)
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                ServiceColumn {
                    x,
                    key: match_service_key(&header_text, vocabulary),
                    header: header_text,
                }
            })
            .collect();

        let mut axis = Self {
            service_columns,
            model_columns: Vec::new(),
        };
        if let Some(first) = axis.first_service_x() {
            axis.model_columns = find_model_columns(header, first, tuning, vocabulary);
        }
        axis
    }

    /// Left-most service column X.
    pub fn first_service_x(&self) -> Option<f32> {
        self.service_columns
            .iter()
            .map(|c| c.x)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// The nearest service column to `x`, if it is closer than
    /// `max_distance` and carries an interval.
    pub fn nearest_service(&self, x: f32, max_distance: f32) -> Option<&ServiceColumn> {
        let nearest = self
            .service_columns
            .iter()
            .min_by(|a, b| (a.x - x).abs().total_cmp(&(b.x - x).abs()))?;
        if (nearest.x - x).abs() < max_distance && nearest.key.is_some() {
            Some(nearest)
        } else {
            None
        }
    }

    pub fn matched_services(&self) -> usize {
        self.service_columns.iter().filter(|c| c.key.is_some()).count()
    }
}

/// Collapse positions closer than `tolerance` to the first one seen, then
/// sort.
pub fn cluster_positions(values: &[f32], tolerance: f32) -> Vec<f32> {
    let mut reps: Vec<f32> = Vec::new();
    for &v in values {
        if !reps.iter().any(|r| (v - r).abs() < tolerance) {
            reps.push(v);
        }
    }
    reps.sort_by(|a, b| a.total_cmp(b));
    reps
}

/// First interval whose marker occurs in `header`, case-insensitively.
///
/// A numeric marker must not continue a longer number: "15 tkm" does not
/// match inside "115 tkm".
pub fn match_service_key(header: &str, vocabulary: &Vocabulary) -> Option<ServiceKey> {
    let haystack = header.to_lowercase();
    vocabulary
        .interval_markers
        .iter()
        .find(|im| im.markers.iter().any(|m| contains_marker(&haystack, &m.to_lowercase())))
        .map(|im| im.key)
}

fn contains_marker(haystack: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    haystack.match_indices(marker).any(|(at, _)| {
        !marker.starts_with(|c: char| c.is_ascii_digit())
            || !haystack[..at].ends_with(|c: char| c.is_ascii_digit())
    })
}

pub fn is_date_like(text: &str) -> bool {
    RE_DATE.is_match(text)
}

fn is_model_word(token: &TextToken, vocabulary: &Vocabulary) -> bool {
    token.text.chars().count() >= 2
        && !is_date_like(&token.text)
        && !vocabulary.model_stopwords.iter().any(|w| *w == token.text)
}

/// Header X positions of unit words ("tkm", "tmls", "time-dependent"), for
/// documents without checkbox widgets.
fn marker_unit_positions(
    header: &[&TextToken],
    tuning: &ColumnTuning,
    vocabulary: &Vocabulary,
) -> Vec<f32> {
    let units: Vec<String> = vocabulary
        .interval_markers
        .iter()
        .flat_map(|im| im.markers.iter())
        .filter_map(|m| m.split_whitespace().last())
        .map(str::to_lowercase)
        .collect();

    let xs: Vec<f32> = header
        .iter()
        .filter(|t| {
            let lower = t.text.to_lowercase();
            units.iter().any(|u| lower.contains(u.as_str()))
        })
        .map(|t| t.x_center())
        .collect();
    cluster_positions(&xs, tuning.service_cluster_tolerance)
}

/// Model columns left of `first_service_x`.
pub fn find_model_columns(
    header: &[&TextToken],
    first_service_x: f32,
    tuning: &ColumnTuning,
    vocabulary: &Vocabulary,
) -> Vec<ModelColumn> {
    let candidates: Vec<f32> = header
        .iter()
        .filter(|t| {
            let d = first_service_x - t.x_center();
            d >= tuning.model_min_distance && d <= tuning.model_max_distance
        })
        .filter(|t| is_model_word(t, vocabulary))
        .map(|t| t.x_center())
        .collect();
    let xs = cluster_positions(&candidates, tuning.model_cluster_tolerance);

    let mut groups: Vec<Vec<f32>> = Vec::new();
    let mut i = 0;
    while i < xs.len() {
        if let Some(&next) = xs.get(i + 1) {
            let gap = next - xs[i];
            if gap >= tuning.model_merge_min_gap && gap <= tuning.model_merge_max_gap {
                groups.push(vec![xs[i], next]);
                i += 2;
                continue;
            }
        }
        groups.push(vec![xs[i]]);
        i += 1;
    }

    groups
        .into_iter()
        .filter_map(|xs| {
            let name = model_name(header, &xs, tuning, vocabulary);
            (!name.is_empty()).then_some(ModelColumn { xs, name })
        })
        .collect()
}

fn model_name(
    header: &[&TextToken],
    xs: &[f32],
    tuning: &ColumnTuning,
    vocabulary: &Vocabulary,
) -> String {
    let mut words: Vec<&str> = Vec::new();
    for token in header {
        if !xs.iter().any(|x| (token.x_center() - x).abs() < tuning.model_cluster_tolerance) {
            continue;
        }
        if !is_model_word(token, vocabulary) || words.contains(&token.text.as_str()) {
            continue;
        }
        words.push(&token.text);
        if words.len() == tuning.model_name_max_tokens {
            break;
        }
    }
    words.join(" ")
}
