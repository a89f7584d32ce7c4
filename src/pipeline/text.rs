//! Positioned word tokens for one page.
//!
//! pdfium reports text as runs (segments) that share a baseline and font.
//! The engine needs words: the row assembler joins them back by geometry and
//! the column classifier clusters header words by X. [`split_segment`] cuts a
//! run at whitespace and gives each word a share of the run's box in
//! proportion to its character offsets, along the run's major axis so
//! rotated (vertical) model labels keep a sensible X.

use super::anchor::Anchor;
use serde::Serialize;

/// One word with its bounding box in top-left layout coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextToken {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub text: String,
    pub page_index: usize,
}

impl TextToken {
    pub fn new(
        text: impl Into<String>,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        page_index: usize,
    ) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            text: text.into(),
            page_index,
        }
    }

    pub fn x_center(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn y_center(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }
}

/// All word tokens of one page, in content-stream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageText {
    page_index: usize,
    tokens: Vec<TextToken>,
}

impl PageText {
    pub fn new(page_index: usize, tokens: Vec<TextToken>) -> Self {
        Self { page_index, tokens }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn tokens(&self) -> &[TextToken] {
        &self.tokens
    }

    /// Tokens of the data table: at or right of the anchor and at or below it.
    ///
    /// A `(0, 0)` anchor keeps every token.
    pub fn data_tokens(&self, anchor: Anchor) -> Vec<&TextToken> {
        self.tokens
            .iter()
            .filter(|t| t.x0 >= anchor.x && t.y_center() >= anchor.y)
            .collect()
    }

    /// Tokens of the page header, strictly above the anchor.
    pub fn header_tokens(&self, anchor: Anchor) -> Vec<&TextToken> {
        self.tokens
            .iter()
            .filter(|t| t.y_center() < anchor.y)
            .collect()
    }
}

/// Split one text run into word tokens.
pub fn split_segment(
    text: &str,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    page_index: usize,
) -> Vec<TextToken> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    if n == 0 {
        return Vec::new();
    }

    let horizontal = (x1 - x0).abs() >= (y1 - y0).abs();
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for i in 0..=n {
        let boundary = i == n || chars[i].is_whitespace();
        match (boundary, start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                let word: String = chars[s..i].iter().collect();
                let (fs, fe) = (s as f32 / n as f32, i as f32 / n as f32);
                let token = if horizontal {
                    let (wx0, wx1) = (x0 + (x1 - x0) * fs, x0 + (x1 - x0) * fe);
                    TextToken::new(word, wx0, y0, wx1, y1, page_index)
                } else {
                    let (wy0, wy1) = (y0 + (y1 - y0) * fs, y0 + (y1 - y0) * fe);
                    TextToken::new(word, x0, wy0, x1, wy1, page_index)
                };
                words.push(token);
                start = None;
            }
            _ => {}
        }
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_horizontal_run_proportionally() {
        // 10 chars over 100 units: 10 units per char.
        let words = split_segment("Fill in oi", 0.0, 5.0, 100.0, 15.0, 0);
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["Fill", "in", "oi"]);
        assert_eq!(words[0].x0, 0.0);
        assert_eq!(words[0].x1, 40.0);
        assert_eq!(words[1].x0, 50.0);
        assert_eq!(words[2].x1, 100.0);
        assert!(words.iter().all(|w| w.y0 == 5.0 && w.y1 == 15.0));
    }

    #[test]
    fn splits_vertical_run_along_y() {
        let words = split_segment("GTS 4", 300.0, 0.0, 310.0, 50.0, 2);
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|w| w.x_center() == 305.0));
        assert!(words[0].y1 <= words[1].y0);
        assert_eq!(words[1].page_index, 2);
    }

    #[test]
    fn whitespace_only_run_yields_nothing() {
        assert!(split_segment("   ", 0.0, 0.0, 10.0, 10.0, 0).is_empty());
        assert!(split_segment("", 0.0, 0.0, 10.0, 10.0, 0).is_empty());
    }

    #[test]
    fn data_and_header_views_split_at_anchor() {
        let page = PageText::new(
            0,
            vec![
                TextToken::new("Every", 400.0, 20.0, 420.0, 30.0, 0),
                TextToken::new("Check", 120.0, 145.0, 150.0, 155.0, 0),
                TextToken::new("left", 10.0, 145.0, 30.0, 155.0, 0),
            ],
        );
        let anchor = Anchor { x: 50.0, y: 100.0 };

        let data: Vec<&str> = page.data_tokens(anchor).iter().map(|t| t.text.as_str()).collect();
        let header: Vec<&str> = page
            .header_tokens(anchor)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(data, ["Check"]);
        assert_eq!(header, ["Every"]);
        assert_eq!(page.data_tokens(Anchor::NONE).len(), 3);
    }
}
