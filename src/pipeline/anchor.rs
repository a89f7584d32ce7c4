//! Header/body separator lookup.
//!
//! Every form prints a column title (default "Measures") on the line that
//! separates the interval/model header from the treatment table. Anything
//! above it is header; anything at or below it and at or right of its X is
//! table data. Pages that lack the marker fall back to the right-most
//! category heading, and pages with neither get the `(0, 0)` anchor, which
//! filters nothing.

use super::text::TextToken;
use crate::config::Vocabulary;
use serde::Serialize;

/// Position of the separator marker, top-left coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Anchor {
    /// Left edge of the marker token.
    pub x: f32,
    /// Vertical centre of the marker token.
    pub y: f32,
}

impl Anchor {
    /// "No anchor": keeps every token and every widget.
    pub const NONE: Anchor = Anchor { x: 0.0, y: 0.0 };

    pub fn is_found(&self) -> bool {
        *self != Self::NONE
    }
}

/// Locate the anchor among a page's tokens.
pub fn locate_anchor(tokens: &[TextToken], vocabulary: &Vocabulary) -> Anchor {
    if let Some(marker) = tokens.iter().find(|t| t.text == vocabulary.anchor_marker) {
        return Anchor {
            x: marker.x0,
            y: marker.y_center(),
        };
    }

    let mut best: Option<&TextToken> = None;
    for token in tokens
        .iter()
        .filter(|t| vocabulary.category_words.iter().any(|w| *w == t.text))
    {
        if best.is_none_or(|b| token.x0 > b.x0) {
            best = Some(token);
        }
    }

    best.map(|t| Anchor {
        x: t.x0,
        y: t.y_center(),
    })
    .unwrap_or(Anchor::NONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, x0: f32, y: f32) -> TextToken {
        TextToken::new(text, x0, y - 4.0, x0 + 30.0, y + 4.0, 0)
    }

    #[test]
    fn exact_marker_wins() {
        let tokens = vec![tok("Engine", 300.0, 90.0), tok("Measures", 52.0, 110.0)];
        let anchor = locate_anchor(&tokens, &Vocabulary::default());
        assert_eq!(anchor, Anchor { x: 52.0, y: 110.0 });
    }

    #[test]
    fn falls_back_to_rightmost_category_word() {
        let tokens = vec![
            tok("Electrics", 40.0, 200.0),
            tok("Under", 180.0, 150.0),
            tok("Outside", 120.0, 170.0),
            tok("Replace", 400.0, 150.0),
        ];
        let anchor = locate_anchor(&tokens, &Vocabulary::default());
        assert_eq!(anchor, Anchor { x: 180.0, y: 150.0 });
    }

    #[test]
    fn first_of_equal_category_positions_is_kept() {
        let tokens = vec![tok("Inside", 100.0, 50.0), tok("Outside", 100.0, 80.0)];
        let anchor = locate_anchor(&tokens, &Vocabulary::default());
        assert_eq!(anchor.y, 50.0);
    }

    #[test]
    fn no_anchor_is_origin() {
        let tokens = vec![tok("Replace", 10.0, 10.0)];
        let anchor = locate_anchor(&tokens, &Vocabulary::default());
        assert_eq!(anchor, Anchor::NONE);
        assert!(!anchor.is_found());
        assert_eq!(locate_anchor(&[], &Vocabulary::default()), Anchor::NONE);
    }
}
