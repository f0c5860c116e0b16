// Numeric kernels shared by series methods and the script libraries.
//
// All functions take plain slices with nulls already removed. Functions that
// are undefined for too few values return None rather than NaN.

use crate::error::FrameError;

pub fn sum(xs: &[f64]) -> f64 {
    xs.iter().sum()
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(sum(xs) / xs.len() as f64)
}

/// Variance with `ddof` delta degrees of freedom (1 = sample, 0 = population).
pub fn var(xs: &[f64], ddof: usize) -> Option<f64> {
    if xs.len() <= ddof {
        return None;
    }
    let m = mean(xs)?;
    let ss = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    Some(ss / (xs.len() - ddof) as f64)
}

pub fn std(xs: &[f64], ddof: usize) -> Option<f64> {
    var(xs, ddof).map(f64::sqrt)
}

pub fn min(xs: &[f64]) -> Option<f64> {
    xs.iter().copied().reduce(f64::min)
}

pub fn max(xs: &[f64]) -> Option<f64> {
    xs.iter().copied().reduce(f64::max)
}

pub fn median(xs: &[f64]) -> Option<f64> {
    quantile(xs, 0.5)
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(xs: &[f64], q: f64) -> Option<f64> {
    if xs.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn cumsum(xs: &[f64]) -> Vec<f64> {
    xs.iter()
        .scan(0.0, |acc, x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

pub fn dot(a: &[f64], b: &[f64]) -> Result<f64, FrameError> {
    check_same_len(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Longest sequence `arange` and `linspace` will generate.
pub const MAX_RANGE_LEN: usize = 10_000_000;

/// Values from `start` (inclusive) to `stop` (exclusive) by `step`.
pub fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>, FrameError> {
    if step == 0.0 || !step.is_finite() {
        return Err(FrameError::Invalid("step must be a non-zero number".into()));
    }
    if !start.is_finite() || !stop.is_finite() {
        return Err(FrameError::Invalid("range bounds must be finite".into()));
    }
    let n = ((stop - start) / step).ceil();
    if n <= 0.0 {
        return Ok(Vec::new());
    }
    if n > MAX_RANGE_LEN as f64 {
        return Err(FrameError::Invalid(format!("range of {n} values exceeds the limit of {MAX_RANGE_LEN}")));
    }
    Ok((0..n as usize).map(|i| start + step * i as f64).collect())
}

/// `n` evenly spaced values over `[start, stop]`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Result<Vec<f64>, FrameError> {
    if n > MAX_RANGE_LEN {
        return Err(FrameError::Invalid(format!("linspace of {n} values exceeds the limit of {MAX_RANGE_LEN}")));
    }
    Ok(match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    })
}

/// Pearson correlation coefficient.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64, FrameError> {
    check_same_len(x, y)?;
    if x.len() < 2 {
        return Err(FrameError::Empty("correlation"));
    }
    let mx = mean(x).unwrap_or(0.0);
    let my = mean(y).unwrap_or(0.0);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return Ok(f64::NAN);
    }
    Ok(sxy / (sxx * syy).sqrt())
}

/// Spearman rank correlation (average ranks for ties).
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64, FrameError> {
    check_same_len(x, y)?;
    pearson(&rank(x), &rank(y))
}

/// 1-based average ranks.
pub fn rank(xs: &[f64]) -> Vec<f64> {
    let mut idx: Vec<usize> = (0..xs.len()).collect();
    idx.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));
    let mut ranks = vec![0.0; xs.len()];
    let mut i = 0;
    while i < idx.len() {
        let mut j = i;
        while j + 1 < idx.len() && xs[idx[j + 1]] == xs[idx[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &k in &idx[i..=j] {
            ranks[k] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Standard scores using the population standard deviation.
pub fn zscore(xs: &[f64]) -> Option<Vec<f64>> {
    let m = mean(xs)?;
    let s = std(xs, 0)?;
    Some(xs.iter().map(|x| (x - m) / s).collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub rvalue: f64,
}

/// Simple least-squares line `y = slope * x + intercept`.
pub fn linregress(x: &[f64], y: &[f64]) -> Result<LinearFit, FrameError> {
    check_same_len(x, y)?;
    if x.len() < 2 {
        return Err(FrameError::Empty("linear regression"));
    }
    let mx = mean(x).unwrap_or(0.0);
    let my = mean(y).unwrap_or(0.0);
    let sxx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
    if sxx == 0.0 {
        return Err(FrameError::Invalid("all x values are identical".into()));
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let slope = sxy / sxx;
    Ok(LinearFit {
        slope,
        intercept: my - slope * mx,
        rvalue: pearson(x, y)?,
    })
}

/// Welch's t statistic and its Welch-Satterthwaite degrees of freedom.
pub fn welch_t(a: &[f64], b: &[f64]) -> Result<(f64, f64), FrameError> {
    let (va, vb) = match (var(a, 1), var(b, 1)) {
        (Some(va), Some(vb)) => (va, vb),
        _ => return Err(FrameError::Empty("t-test (two values per sample)")),
    };
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (ma, mb) = (mean(a).unwrap_or(0.0), mean(b).unwrap_or(0.0));
    let se2 = va / na + vb / nb;
    let t = (ma - mb) / se2.sqrt();
    let df = se2.powi(2) / ((va / na).powi(2) / (na - 1.0) + (vb / nb).powi(2) / (nb - 1.0));
    Ok((t, df))
}

/// Error function approximation (Abramowitz & Stegun 7.1.26, max error ~1.5e-7)
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

/// Standard normal CDF.
pub fn norm_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// Intercept first, then one coefficient per regressor.
    pub params: Vec<f64>,
    pub rsquared: f64,
    pub nobs: usize,
}

/// Ordinary least squares with an intercept, solved through the normal
/// equations. `regressors` holds one vector per explanatory variable.
pub fn ols(y: &[f64], regressors: &[Vec<f64>]) -> Result<OlsFit, FrameError> {
    let n = y.len();
    for (i, x) in regressors.iter().enumerate() {
        if x.len() != n {
            return Err(FrameError::LengthMismatch {
                column: format!("x{}", i + 1),
                expected: n,
                found: x.len(),
            });
        }
    }
    let k = regressors.len() + 1;
    if n < k {
        return Err(FrameError::Invalid(format!("ols needs at least {k} observations, got {n}")));
    }

    let row = |i: usize| -> Vec<f64> {
        std::iter::once(1.0).chain(regressors.iter().map(|x| x[i])).collect()
    };

    // X'X | X'y
    let mut aug = vec![vec![0.0; k + 1]; k];
    for i in 0..n {
        let r = row(i);
        for a in 0..k {
            for b in 0..k {
                aug[a][b] += r[a] * r[b];
            }
            aug[a][k] += r[a] * y[i];
        }
    }
    let params = solve(aug)?;

    let my = mean(y).unwrap_or(0.0);
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for i in 0..n {
        let fitted: f64 = row(i).iter().zip(&params).map(|(a, b)| a * b).sum();
        ss_res += (y[i] - fitted).powi(2);
        ss_tot += (y[i] - my).powi(2);
    }
    let rsquared = if ss_tot == 0.0 { f64::NAN } else { 1.0 - ss_res / ss_tot };
    Ok(OlsFit { params, rsquared, nobs: n })
}

/// Gauss-Jordan elimination with partial pivoting on an augmented matrix.
fn solve(mut aug: Vec<Vec<f64>>) -> Result<Vec<f64>, FrameError> {
    let k = aug.len();
    for col in 0..k {
        let pivot = (col..k)
            .max_by(|&a, &b| aug[a][col].abs().total_cmp(&aug[b][col].abs()))
            .unwrap_or(col);
        if aug[pivot][col].abs() < 1e-12 {
            return Err(FrameError::Invalid("singular design matrix (collinear regressors)".into()));
        }
        aug.swap(col, pivot);
        let p = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= p;
        }
        for r in 0..k {
            if r != col {
                let factor = aug[r][col];
                if factor != 0.0 {
                    for c in col..=k {
                        aug[r][c] -= factor * aug[col][c];
                    }
                }
            }
        }
    }
    Ok(aug.into_iter().map(|r| r[k]).collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    /// Cluster index per point (0-based).
    pub labels: Vec<usize>,
    pub centers: Vec<Vec<f64>>,
    pub inertia: f64,
}

/// Lloyd's algorithm. Centroids are seeded with the first `k` distinct
/// points so results are reproducible.
pub fn kmeans(points: &[Vec<f64>], k: usize, max_iter: usize) -> Result<KMeans, FrameError> {
    if k == 0 {
        return Err(FrameError::Invalid("k must be at least 1".into()));
    }
    let mut centers: Vec<Vec<f64>> = Vec::with_capacity(k.min(points.len()));
    for p in points {
        if !centers.contains(p) {
            centers.push(p.clone());
            if centers.len() == k {
                break;
            }
        }
    }
    if centers.len() < k {
        return Err(FrameError::Invalid(format!(
            "k={k} exceeds the number of distinct points ({})",
            centers.len()
        )));
    }

    let dist2 = |a: &[f64], b: &[f64]| -> f64 { a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum() };
    let nearest = |p: &[f64], centers: &[Vec<f64>]| -> (usize, f64) {
        centers
            .iter()
            .enumerate()
            .map(|(i, c)| (i, dist2(p, c)))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
    };

    let dims = centers[0].len();
    let mut labels = vec![0usize; points.len()];
    for _ in 0..max_iter.max(1) {
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let (label, _) = nearest(p, &centers);
            if labels[i] != label {
                labels[i] = label;
                changed = true;
            }
        }

        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (p, &label) in points.iter().zip(&labels) {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(p) {
                *s += v;
            }
        }
        for (c, (s, n)) in centers.iter_mut().zip(sums.into_iter().zip(counts)) {
            if n > 0 {
                *c = s.into_iter().map(|v| v / n as f64).collect();
            }
        }
        if !changed {
            break;
        }
    }

    let inertia = points.iter().map(|p| nearest(p, &centers).1).sum();
    Ok(KMeans { labels, centers, inertia })
}

fn check_same_len(a: &[f64], b: &[f64]) -> Result<(), FrameError> {
    if a.len() != b.len() {
        return Err(FrameError::LengthMismatch {
            column: "y".into(),
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sample_std() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(std(&xs, 0).unwrap(), 2.0));
        assert!(std(&[1.0], 1).is_none());
    }

    #[test]
    fn test_quantile_interpolates() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(quantile(&xs, 0.5).unwrap(), 2.5));
        assert!(approx(quantile(&xs, 0.25).unwrap(), 1.75));
        assert!(quantile(&xs, 1.5).is_none());
    }

    #[test]
    fn test_arange_and_linspace() {
        assert_eq!(arange(0.0, 5.0, 2.0).unwrap(), vec![0.0, 2.0, 4.0]);
        assert!(arange(0.0, 1.0, 0.0).is_err());
        assert_eq!(linspace(0.0, 1.0, 3).unwrap(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_ranges_are_bounded() {
        assert!(matches!(arange(0.0, f64::INFINITY, 1.0), Err(FrameError::Invalid(_))));
        assert!(matches!(arange(f64::NAN, 1.0, 1.0), Err(FrameError::Invalid(_))));
        assert!(arange(0.0, 1e12, 1.0).is_err());
        assert!(matches!(linspace(0.0, 1.0, MAX_RANGE_LEN + 1), Err(FrameError::Invalid(_))));
    }

    #[test]
    fn test_kmeans_huge_k_is_an_error() {
        let points = vec![vec![0.0], vec![1.0]];
        assert!(matches!(kmeans(&points, usize::MAX, 10), Err(FrameError::Invalid(_))));
    }

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0];
        let y = [2.0, 4.0, 6.0];
        assert!(approx(pearson(&x, &y).unwrap(), 1.0));
    }

    #[test]
    fn test_rank_ties() {
        assert_eq!(rank(&[10.0, 20.0, 10.0]), vec![1.5, 3.0, 1.5]);
    }

    #[test]
    fn test_linregress() {
        let fit = linregress(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!(approx(fit.slope, 2.0));
        assert!(approx(fit.intercept, 1.0));
    }

    #[test]
    fn test_ols_recovers_coefficients() {
        let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let x2 = vec![2.0, 1.0, 4.0, 3.0, 5.0];
        let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 1.0 + 2.0 * a - 0.5 * b).collect();
        let fit = ols(&y, &[x1, x2]).unwrap();
        assert!(approx(fit.params[0], 1.0));
        assert!(approx(fit.params[1], 2.0));
        assert!(approx(fit.params[2], -0.5));
        assert!(approx(fit.rsquared, 1.0));
    }

    #[test]
    fn test_ols_collinear() {
        let x = vec![1.0, 2.0, 3.0];
        assert!(ols(&[1.0, 2.0, 3.0], &[x.clone(), x]).is_err());
    }

    #[test]
    fn test_kmeans_two_clusters() {
        let pts = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![0.5, 0.0], vec![10.0, 9.5]];
        let km = kmeans(&pts, 2, 100).unwrap();
        assert_eq!(km.labels, vec![0, 1, 0, 1]);
        assert!(approx(km.centers[0][0], 0.25));
    }

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((norm_cdf(1.96) - 0.975).abs() < 1e-3);
    }

    #[test]
    fn test_welch_t_symmetric() {
        let (t, _) = welch_t(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!(approx(t, 0.0));
    }
}
