//! Edit-distance similarity between a submission and a reference solution.

use super::normalize::normalize;

/// Levenshtein distance over `char`s (insert, delete, substitute; cost 1).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity score in `0..=100` between normalized `user` and `reference`.
///
/// Blank submissions score 0 without comparing anything.
pub fn similarity(user: &str, reference: &str) -> u8 {
    if user.trim().is_empty() {
        return 0;
    }

    let user = normalize(user);
    let reference = normalize(reference);

    if user == reference {
        return 100;
    }

    let max_len = user.chars().count().max(reference.chars().count());
    if max_len == 0 {
        return 0;
    }

    let distance = edit_distance(&user, &reference);
    let ratio = (max_len.saturating_sub(distance)) as f64 / max_len as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
