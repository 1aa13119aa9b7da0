//! Text similarity and uniqueness-constrained pool draws.
//!
//! The ratio is the Ratcliff/Obershelp "gestalt" measure: twice the number of
//! characters in recursively found longest matching blocks, divided by the total
//! length of both strings. Text is NFKC-normalized and lowercased first.

use rand::seq::SliceRandom;
use rand::Rng;
use unicode_normalization::UnicodeNormalization;

/// Default similarity threshold; accepted strings must score strictly below it
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Default cap on pool draws per batch
pub const DEFAULT_MAX_DRAWS: usize = 100;

fn normalized_chars(text: &str) -> Vec<char> {
    text.nfkc().flat_map(char::to_lowercase).collect()
}

/// Similarity ratio in `0.0..=1.0` between two strings, case-insensitive.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a = normalized_chars(a);
    let b = normalized_chars(b);
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
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

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`; ties resolve to the
/// earliest start in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    let width = bhi - blo;
    // run_lengths[k] is the length of the match ending at a[i - 1], b[blo + k]
    let mut previous = vec![0usize; width];
    let mut current = vec![0usize; width];
    for i in alo..ahi {
        for k in 0..width {
            let j = blo + k;
            current[k] = if a[i] == b[j] {
                let run = if k > 0 { previous[k - 1] } else { 0 } + 1;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
                run
            } else {
                0
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    best
}

/// True when `candidate` is below `threshold` against every accepted string.
pub fn is_distinct(candidate: &str, accepted: &[String], threshold: f64) -> bool {
    accepted
        .iter()
        .all(|existing| similarity_ratio(candidate, existing) < threshold)
}

/// Draw up to `count` mutually dissimilar strings from `pool`.
///
/// Each draw picks uniformly at random (with replacement); blank strings and
/// strings too similar to an accepted one are rejected. Stops after `max_draws`
/// attempts, so the result may hold fewer than `count` entries.
pub fn pick_unique<R: Rng + ?Sized>(
    pool: &[String],
    count: usize,
    threshold: f64,
    max_draws: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut accepted: Vec<String> = Vec::with_capacity(count);
    let mut draws = 0;
    while accepted.len() < count && draws < max_draws {
        draws += 1;
        let Some(raw) = pool.choose(rng) else {
            break;
        };
        let candidate = raw.trim();
        if !candidate.is_empty() && is_distinct(candidate, &accepted, threshold) {
            accepted.push(candidate.to_string());
        }
    }
    accepted
}
