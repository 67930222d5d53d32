//! Least-squares line fitting and Student-t quantiles for prediction
//! intervals.

use std::f64::consts::PI;

// ─── Ordinary least squares ──────────────────────────────────────────────────

/// `y = intercept + slope * x`, fitted by ordinary least squares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
  pub slope:     f64,
  pub intercept: f64,
  /// Number of points fitted.
  pub n:         usize,
  mean_x:        f64,
  /// Σ (x - x̄)²
  sxx:           f64,
  /// Σ (y - ŷ)²
  sse:           f64,
}

impl LinearFit {
  /// Fit `ys` on `xs`. `None` with fewer than two points or when every `x`
  /// is identical.
  pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
    let n = xs.len().min(ys.len());
    if n < 2 {
      return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    if sxx == 0.0 {
      return None;
    }
    let sxy: f64 = xs
      .iter()
      .zip(ys)
      .map(|(x, y)| (x - mean_x) * (y - mean_y))
      .sum();

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let sse: f64 = xs
      .iter()
      .zip(ys)
      .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
      .sum();

    Some(Self { slope, intercept, n, mean_x, sxx, sse })
  }

  pub fn predict(&self, x: f64) -> f64 { self.intercept + self.slope * x }

  /// Residual degrees of freedom, `n - 2`.
  pub fn dof(&self) -> usize { self.n.saturating_sub(2) }

  /// Half-width of the two-sided prediction interval for a new observation
  /// at `x`:
  ///
  /// `t(1 - α/2, n-2) · s · sqrt(1 + 1/n + (x - x̄)² / Sxx)`
  ///
  /// The width grows with the distance of `x` from the fitted mean. `None`
  /// when there are no residual degrees of freedom (two points fit exactly).
  pub fn prediction_half_width(&self, x: f64, confidence: f64) -> Option<f64> {
    let dof = self.dof();
    if dof == 0 {
      return None;
    }
    let s = (self.sse / dof as f64).sqrt();
    let t = student_t_quantile(0.5 + confidence / 2.0, dof as f64)?;
    let leverage = 1.0 + 1.0 / self.n as f64 + (x - self.mean_x).powi(2) / self.sxx;
    Some(t * s * leverage.sqrt())
  }
}

// ─── Student-t distribution ──────────────────────────────────────────────────

/// CDF of Student's t with `dof` degrees of freedom.
pub fn student_t_cdf(t: f64, dof: f64) -> f64 {
  if t.is_nan() || dof <= 0.0 {
    return f64::NAN;
  }
  let x = dof / (dof + t * t);
  let tail = 0.5 * regularized_incomplete_beta(x, dof / 2.0, 0.5);
  if t > 0.0 { 1.0 - tail } else { tail }
}

/// Inverse CDF of Student's t. `None` unless `0 < p < 1` and `dof > 0`.
pub fn student_t_quantile(p: f64, dof: f64) -> Option<f64> {
  if !(p > 0.0 && p < 1.0) || !(dof > 0.0) {
    return None;
  }
  if p == 0.5 {
    return Some(0.0);
  }
  if p < 0.5 {
    return student_t_quantile(1.0 - p, dof).map(|q| -q);
  }

  // Bracket, then bisect; the CDF is monotone.
  let mut hi = 1.0;
  while student_t_cdf(hi, dof) < p {
    hi *= 2.0;
    if hi > 1e12 {
      return None;
    }
  }
  let mut lo = 0.0;
  for _ in 0..200 {
    let mid = 0.5 * (lo + hi);
    if student_t_cdf(mid, dof) < p {
      lo = mid;
    } else {
      hi = mid;
    }
    if hi - lo < 1e-12 * hi.max(1.0) {
      break;
    }
  }
  Some(0.5 * (lo + hi))
}

/// `I_x(a, b)`, evaluated with the continued fraction expansion.
fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
  if x <= 0.0 {
    return 0.0;
  }
  if x >= 1.0 {
    return 1.0;
  }
  let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)
    + a * x.ln()
    + b * (1.0 - x).ln();
  let front = ln_front.exp();
  // The fraction converges fastest on this side of the mean.
  if x < (a + 1.0) / (a + b + 2.0) {
    front * beta_continued_fraction(x, a, b) / a
  } else {
    1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
  }
}

fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
  const MAX_ITER: usize = 300;
  const EPS: f64 = 1e-15;
  const TINY: f64 = 1e-300;

  let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

  let (qab, qap, qam) = (a + b, a + 1.0, a - 1.0);
  let mut c = 1.0;
  let mut d = 1.0 / guard(1.0 - qab * x / qap);
  let mut h = d;

  for m in 1..=MAX_ITER {
    let m = m as f64;
    let m2 = 2.0 * m;

    let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
    d = 1.0 / guard(1.0 + aa * d);
    c = guard(1.0 + aa / c);
    h *= d * c;

    let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
    d = 1.0 / guard(1.0 + aa * d);
    c = guard(1.0 + aa / c);
    let step = d * c;
    h *= step;

    if (step - 1.0).abs() < EPS {
      break;
    }
  }
  h
}

/// `ln Γ(x)` via the Lanczos approximation (g = 7).
fn ln_gamma(x: f64) -> f64 {
  const G: f64 = 7.0;
  const COEF: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
  ];

  if x < 0.5 {
    // Reflection formula.
    return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
  }
  let x = x - 1.0;
  let t = x + G + 0.5;
  let series = COEF
    .iter()
    .enumerate()
    .skip(1)
    .fold(COEF[0], |acc, (i, c)| acc + c / (x + i as f64));
  0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}
