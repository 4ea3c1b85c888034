//! Backshift-operator polynomials: differencing and its inversion.
//!
//! A polynomial is stored as its coefficients, `poly[k]` multiplying `B^k`, with
//! `poly[0] == 1`.

/// Product of two lag polynomials.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `(1 - B)^d (1 - B^s)^D`.
///
/// ```
/// use ehyd::model::diff::differencing_polynomial;
///
/// assert_eq!(differencing_polynomial(1, 0, 12), vec![1.0, -1.0]);
/// assert_eq!(differencing_polynomial(2, 0, 12), vec![1.0, -2.0, 1.0]);
/// ```
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// Applies `poly` to `series`: `w_t = Σ_k poly[k] y_{t-k}`.
///
/// The first `poly.len() - 1` values have no complete history and are dropped.
pub fn apply_polynomial(poly: &[f64], series: &[f64]) -> Vec<f64> {
    let order = poly.len().saturating_sub(1);
    if series.len() <= order {
        return Vec::new();
    }
    (order..series.len())
        .map(|t| poly.iter().enumerate().map(|(k, c)| c * series[t - k]).sum())
        .collect()
}

/// Inverts differencing: extends `history` with the levels implied by the
/// differenced values `diffs`, `y_t = w_t - Σ_{k≥1} poly[k] y_{t-k}`.
///
/// Returns only the new levels. `history` must hold at least `poly.len() - 1` values.
pub fn integrate(poly: &[f64], history: &[f64], diffs: &[f64]) -> Vec<f64> {
    let mut levels = history.to_vec();
    let start = levels.len();
    for w in diffs {
        let t = levels.len();
        let carried: f64 = poly
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, c)| if t >= k { c * levels[t - k] } else { 0.0 })
            .sum();
        levels.push(w - carried);
    }
    levels.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn seasonal_polynomial_shape() {
        let poly = differencing_polynomial(1, 1, 4);
        // (1 - B)(1 - B^4) = 1 - B - B^4 + B^5
        assert_eq!(poly, vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
    }

    #[test]
    fn apply_matches_plain_difference() {
        let series = [1.0, 4.0, 9.0, 16.0, 25.0];
        assert_eq!(
            apply_polynomial(&differencing_polynomial(1, 0, 0), &series),
            vec![3.0, 5.0, 7.0, 9.0]
        );
        assert_eq!(
            apply_polynomial(&differencing_polynomial(2, 0, 0), &series),
            vec![2.0, 2.0, 2.0]
        );
        assert!(apply_polynomial(&[1.0, -1.0], &[1.0]).is_empty());
    }

    #[test]
    fn integrate_inverts_seasonal_differencing() {
        let series: Vec<f64> = (0..40)
            .map(|i| 0.3 * i as f64 + [1.0, -2.0, 0.5, 4.0][i % 4])
            .collect();
        let poly = differencing_polynomial(1, 1, 4);
        let diffs = apply_polynomial(&poly, &series);

        let split = 25;
        let offset = poly.len() - 1;
        let rebuilt = integrate(&poly, &series[..split], &diffs[split - offset..]);
        assert_eq!(rebuilt.len(), series.len() - split);
        for (a, b) in rebuilt.iter().zip(&series[split..]) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }
}
