//! Similarity Scorer: Jaccard similarity over distinct line sets.
//!
//! Jaccard is preferred here over the alternative
//! `1 - diff_ops / max_lines` formula: Jaccard is symmetric, bounded in
//! [0, 1] without needing to special-case an empty-both input, and is
//! insensitive to how many times a line repeats — two files differing
//! only in how many blank lines they carry still score as near-identical.

use ahash::HashSet;

/// Score the similarity of two line sequences in `[0.0, 1.0]`.
///
/// - both empty → `1.0` (no lines to disagree on)
/// - exactly one empty → `0.0`
/// - otherwise, `|A ∩ B| / |A ∪ B|` over the sets of distinct lines
pub fn score(lines_a: &[String], lines_b: &[String]) -> f64 {
    if lines_a.is_empty() && lines_b.is_empty() {
        return 1.0;
    }
    if lines_a.is_empty() || lines_b.is_empty() {
        return 0.0;
    }

    let set_a: HashSet<&str> = lines_a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = lines_b.iter().map(String::as_str).collect();

    if set_a == set_b {
        return 1.0;
    }

    let intersection = set_a.iter().filter(|line| set_b.contains(*line)).count();
    let union = set_a.len() + set_b.len() - intersection;

    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Pick the highest-scoring pair among `groups`, returning its indices
/// and score. Ties break on lowest `(i, j)` index pair — deterministic,
/// but not otherwise meaningful; the tiebreak itself is unspecified.
pub fn most_similar_pair<T, F>(items: &[T], lines_of: F) -> Option<(usize, usize, f64)>
where
    F: Fn(&T) -> &[String],
{
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let s = score(lines_of(&items[i]), lines_of(&items[j]));
            match best {
                Some((_, _, best_score)) if best_score >= s => {},
                _ => best = Some((i, j, s)),
            }
        }
    }
    best
}
