//! Character-level text similarity
//!
//! Implements the Ratcliff/Obershelp "gestalt" ratio: find the longest
//! common block, recurse on both sides of it, and report `2 * M / T`
//! where `M` is the number of matched characters and `T` the combined
//! length of both strings.

/// Similarity ratio in `[0.0, 1.0]`; two empty strings are identical
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_chars(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`
///
/// Returns `(i, j, size)`. Among equally long blocks the one starting
/// earliest in `a` wins, then the one starting earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    // run[j + 1] = length of the common run ending at a[i - 1], b[blo + j]
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

    for i in alo..ahi {
        for j in 0..width {
            curr[j + 1] = if a[i] == b[blo + j] { prev[j] + 1 } else { 0 };
            let k = curr[j + 1];
            if k > best_size {
                best_size = k;
                best_i = i + 1 - k;
                best_j = blo + j + 1 - k;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("taxi", "taxi"), 1.0);
        assert_eq!(sequence_ratio("taxi", ""), 0.0);
    }

    #[test]
    fn test_disjoint_strings() {
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_known_ratios() {
        assert!(close(sequence_ratio("abcd", "bcde"), 0.75));
        assert!(close(
            sequence_ratio("the quick brown fox", "the quick brown dog"),
            0.8947
        ));
        assert!(close(
            sequence_ratio("how do i book a taxi?", "how can i book a ride?"),
            0.744
        ));
    }

    #[test]
    fn test_ratio_is_bounded() {
        let r = sequence_ratio("كيف يمكنني حجز سيارة؟", "how can i book a ride?");
        assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn test_longest_match_prefers_earliest_block() {
        let a: Vec<char> = "abxab".chars().collect();
        let b: Vec<char> = "ab".chars().collect();
        assert_eq!(longest_match(&a, &b, 0, a.len(), 0, b.len()), (0, 0, 2));
    }
}
