//! Filename/title similarity.
//!
//! Ratcliff/Obershelp matching: repeatedly take the longest common block,
//! recurse on both sides of it, and score `2 * matched / total`. Sequences
//! of 200+ characters drop "popular" characters (more than 1% + 1 of the
//! second string) from the block index, the same heuristic common
//! sequence-matcher implementations apply.

use std::collections::HashMap;

/// Case-insensitive similarity of `a` and `b`, in `[0, 100]` with two decimals.
///
/// Two empty strings score 0: there is nothing to compare.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }

    let matched = BlockMatcher::new(&a, &b).matched_chars();
    let ratio = 2.0 * matched as f64 / total as f64;
    (ratio * 100.0 * 100.0).round() / 100.0
}

struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character of `b`, ascending.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if b.len() >= 200 {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given window.
    /// Ties go to the earliest `i`, then the earliest `j`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 };
                    let k = prev + 1;
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular characters are missing from the index; grow the block over them.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && self.a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }

    fn matched_chars(&self) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_ignoring_case() {
        assert_eq!(similarity("File.PY", "file.py"), 100.0);
        assert_eq!(similarity("report.py", "report.py"), 100.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [("report.py", "reprt.py"), ("abcd", "bcda"), ("Main.java", "main_v2.java")];
        for (a, b) in pairs {
            assert!((similarity(a, b) - similarity(b, a)).abs() < 0.011, "{a} vs {b}");
        }
    }

    #[test]
    fn known_ratios() {
        // "abcd" vs "bcde": block "bcd" → 2*3/8
        assert_eq!(similarity("abcd", "bcde"), 75.0);
        // "abc" vs "xyz": nothing in common
        assert_eq!(similarity("abc", "xyz"), 0.0);
        // 2*2/6
        assert_eq!(similarity("ab", "abxx"), 66.67);
    }

    #[test]
    fn recurses_on_both_sides_of_the_longest_block() {
        // "qabxcd" vs "abycdf": longest "ab", then "cd" on the right → 2*4/12
        assert_eq!(similarity("qabxcd", "abycdf"), 66.67);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("", "a.py"), 0.0);
        assert_eq!(similarity("a.py", ""), 0.0);
    }

    #[test]
    fn long_strings_still_score_identical() {
        let long = "a".repeat(300);
        assert_eq!(similarity(&long, &long), 100.0);
    }

    #[test]
    fn score_is_bounded() {
        let s = similarity("tests/test_report_generation.py", "report.py");
        assert!(s > 0.0 && s < 100.0);
    }
}
