//! Fuzzy string similarity for kai deduplication.
//!
//! Implements a Ratcliff-Obershelp style ratio: twice the number of
//! characters in the recursively-found longest matching blocks, divided by
//! the combined length of both strings. Comparison is over Unicode scalar
//! values so multi-byte text works the same as ASCII.

use std::collections::HashMap;

/// Similarity of two strings in [0.0, 1.0].
///
/// Reflexive (`ratio(s, s) == 1.0`), symmetric, and 0.0 for strings with
/// no characters in common. Two empty strings score 1.0.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = match_count(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Total characters covered by matching blocks between `a` and `b`.
///
/// Finds the longest matching block, then recurses into the unmatched
/// pieces on either side of it.
fn match_count(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (ai, bi, size) = longest_match(a, b);
    if size == 0 {
        return 0;
    }
    size + match_count(&a[..ai], &b[..bi]) + match_count(&a[ai + size..], &b[bi + size..])
}

/// Longest matching block as (start in a, start in b, length).
///
/// Earliest block wins among equals, which keeps the result deterministic
/// under argument order.
fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut b_positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &ch) in b.iter().enumerate() {
        b_positions.entry(ch).or_default().push(j);
    }

    let mut best = (0usize, 0usize, 0usize);
    // run_lengths[j] = length of the match ending at a[i], b[j]
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate() {
        let mut next_runs: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b_positions.get(ch) {
            for &j in positions {
                let len = if j == 0 {
                    1
                } else {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0) + 1
                };
                next_runs.insert(j, len);
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        run_lengths = next_runs;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_one() {
        assert_eq!(ratio("swim", "swim"), 1.0);
        assert_eq!(ratio("morning walk", "morning walk"), 1.0);
    }

    #[test]
    fn test_both_empty_score_one() {
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn test_one_empty_scores_zero() {
        assert_eq!(ratio("swim", ""), 0.0);
        assert_eq!(ratio("", "swim"), 0.0);
    }

    #[test]
    fn test_disjoint_strings_score_zero() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("swim", "swiming"),
            ("reading before bed", "reading"),
            ("abcd", "bcda"),
            ("", "notempty"),
        ];
        for (a, b) in pairs {
            assert_eq!(ratio(a, b), ratio(b, a), "asymmetric for {:?}/{:?}", a, b);
        }
    }

    #[test]
    fn test_close_variant_scores_high() {
        // "swim" aligns fully inside "swiming": 2*4/(4+7)
        let score = ratio("swim", "swiming");
        assert!(score > 0.7, "expected > 0.7, got {}", score);
    }

    #[test]
    fn test_unrelated_phrases_score_low() {
        let score = ratio("swim", "reading");
        assert!(score < 0.4, "expected < 0.4, got {}", score);
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(ratio("朝の散歩", "朝の散歩"), 1.0);
        let score = ratio("朝の散歩", "朝のさんぽ");
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_known_ratio_value() {
        // One shared block of 2 ("ab"): 2*2/(3+3)
        let score = ratio("abx", "yab");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }
}
