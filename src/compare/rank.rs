/// Replaces every value by its 0-based ascending rank.
///
/// Ties keep their input order (stable sort), so the result is always a
/// permutation of `0..values.len()`.
pub fn rank_transform(values: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // -0.0 and 0.0 tie; NaN sorts last
    let key = |i: usize| values[i] + 0.0;
    order.sort_by(|&a, &b| key(a).total_cmp(&key(b)));
    let mut ranks = vec![0u32; values.len()];
    for (rank, index) in order.into_iter().enumerate() {
        ranks[index] = rank as u32;
    }
    ranks
}
