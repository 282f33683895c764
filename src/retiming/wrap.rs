//! Two-line word wrapping for subtitle cues.

use super::partition::{char_len, joined_len};

/// Result of wrapping one chunk of tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapped {
    /// One or two lines.
    pub lines: Vec<String>,
    /// Every line respects the limit, or is a single unbreakable word.
    pub fits: bool,
}

/// A line is acceptable if it respects the limit or cannot be broken further.
fn line_ok(tokens: &[&str], max_chars_per_line: usize) -> bool {
    tokens.len() == 1 || joined_len(tokens) <= max_chars_per_line
}

/// Wrap tokens into at most two lines, breaking at the word boundary closest
/// to the character midpoint among the breaks that keep both lines in limit.
///
/// Words are never split. When no break satisfies the limit the most balanced
/// break is used and `fits` is false.
pub fn wrap(tokens: &[&str], max_chars_per_line: usize) -> Wrapped {
    let text = tokens.join(" ");

    if tokens.len() <= 1 || char_len(&text) <= max_chars_per_line {
        return Wrapped {
            lines: if text.is_empty() { Vec::new() } else { vec![text] },
            fits: true,
        };
    }

    let (split, fits) = (1..tokens.len())
        .map(|i| {
            let (first, second) = tokens.split_at(i);
            let fits = line_ok(first, max_chars_per_line) && line_ok(second, max_chars_per_line);
            let imbalance = joined_len(first).abs_diff(joined_len(second));
            (i, fits, imbalance)
        })
        .min_by_key(|&(_, fits, imbalance)| (!fits, imbalance))
        .map(|(i, fits, _)| (i, fits))
        .unwrap_or((1, false));

    let (first, second) = tokens.split_at(split);
    Wrapped {
        lines: vec![first.join(" "), second.join(" ")],
        fits,
    }
}
