//! Fractal boundary generation for judgment nodes.
//!
//! A fractal judgment node partitions its feature range hierarchically: a
//! production rule of `k` subdivision ratios is applied recursively `d`
//! times, yielding `k^d` interval widths with a self-similar profile. The
//! rule's cut points are ordinary genetic material and can be mutated, which
//! reshapes the whole partition at once.

use rand::Rng;

/// Picks a uniformly random `(k, d)` pair with `k >= 2`, `d >= d_min` and
/// `k^d <= n`, where `d_min` is 2 for `n > 3` and 1 otherwise.
///
/// The depth floor keeps the subdivision genuinely recursive whenever the
/// node has enough successors to support it; `n <= 3` only admits a flat
/// binary or ternary split.
///
/// # Panics
/// Panics if no valid pair exists (`n < 2`).
///
/// # Examples
/// ```
/// use fracnetics::random_k_d;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let (k, d) = random_k_d(8, &mut rng);
/// assert!(k >= 2 && d >= 2);
/// assert!(k.pow(d as u32) <= 8);
/// ```
pub fn random_k_d<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let d_min = if n > 3 { 2 } else { 1 };
    let mut combinations = Vec::new();
    let mut k = 2usize;
    while k <= n {
        let mut d = d_min;
        while k
            .checked_pow(d as u32)
            .map_or(false, |power| power <= n)
        {
            combinations.push((k, d));
            d += 1;
        }
        k += 1;
    }
    assert!(
        !combinations.is_empty(),
        "no (k, d) with k^d <= {} exists",
        n
    );
    combinations[rng.gen_range(0..combinations.len())]
}

/// Returns `[0, u_1, ..., u_m, 1]` with each `u_i` drawn uniformly from the
/// open interval (0, 1). The interior values are *not* sorted; feed the
/// result through [`sort_and_distance`] to obtain subdivision ratios.
pub fn random_cuts<R: Rng>(m: usize, rng: &mut R) -> Vec<f64> {
    let mut cuts = Vec::with_capacity(m + 2);
    cuts.push(0.0);
    for _ in 0..m {
        cuts.push(rng.gen_range(f64::MIN_POSITIVE..1.0));
    }
    cuts.push(1.0);
    cuts
}

/// Sorts the cut points ascending and returns the consecutive differences.
///
/// With 0 and 1 as the extreme cut points the differences sum to 1, making
/// them valid relative lengths for partitioning.
///
/// # Examples
/// ```
/// use fracnetics::sort_and_distance;
///
/// let ratios = sort_and_distance(&[0.0, 0.4, 0.1, 0.5, 1.0]);
/// for (got, want) in ratios.iter().zip([0.1, 0.3, 0.1, 0.5]) {
///     assert!((got - want).abs() < 1e-12);
/// }
/// ```
pub fn sort_and_distance(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("cut points must be comparable"));
    sorted.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Applies the production rule recursively: starting from the unit interval,
/// each round replaces every current length `L` by `parameter.len()` new
/// lengths `L * parameter[j]`. The result has `parameter.len()^depth`
/// entries and sums to 1 whenever `parameter` sums to 1.
///
/// # Examples
/// ```
/// use fracnetics::fractal_lengths;
///
/// let lengths = fractal_lengths(2, &[0.3, 0.7]);
/// assert_eq!(lengths.len(), 4);
/// let expected = [0.09, 0.21, 0.21, 0.49];
/// for (got, want) in lengths.iter().zip(expected) {
///     assert!((got - want).abs() < 1e-12);
/// }
/// ```
pub fn fractal_lengths(depth: usize, parameter: &[f64]) -> Vec<f64> {
    let mut lengths = vec![1.0];
    for _ in 0..depth {
        lengths = lengths
            .iter()
            .flat_map(|&len| parameter.iter().map(move |&ratio| len * ratio))
            .collect();
    }
    lengths
}
