//! Tokenization and balanced partitioning of translated text.

use std::ops::Range;

/// Split text on Unicode whitespace. Punctuation stays attached to its word.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Character count (not bytes).
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Character count of tokens joined by single spaces.
pub fn joined_len(tokens: &[&str]) -> usize {
    if tokens.is_empty() {
        return 0;
    }
    tokens.iter().map(|t| char_len(t)).sum::<usize>() + tokens.len() - 1
}

/// Partition tokens into `count` contiguous, non-empty ranges of near-equal
/// character length.
///
/// Boundary `k` sits at the token boundary whose running character offset is
/// nearest to `total * k / count`. Ties resolve to the earlier boundary.
pub fn partition(tokens: &[&str], count: usize) -> Vec<Range<usize>> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let count = count.clamp(1, tokens.len());

    // ends[i]: offset just past token i in the joined text
    let mut ends = Vec::with_capacity(tokens.len());
    let mut offset = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            offset += 1;
        }
        offset += char_len(token);
        ends.push(offset);
    }
    let total = offset;

    let mut ranges = Vec::with_capacity(count);
    let mut start = 0;
    for k in 1..count {
        // Leave at least one token for every remaining chunk.
        let lo = start + 1;
        let hi = tokens.len() - (count - k);
        let target = total * k;

        let boundary = (lo..=hi)
            .min_by_key(|&b| (ends[b - 1] * count).abs_diff(target))
            .unwrap_or(lo);

        ranges.push(start..boundary);
        start = boundary;
    }
    ranges.push(start..tokens.len());
    ranges
}
