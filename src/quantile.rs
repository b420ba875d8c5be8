use std::f64::consts::{LN_2, SQRT_2};

use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};
use statrs::function::erf::erfc_inv;
use statrs::function::gamma::ln_gamma;

use crate::Error;

const MAX_ITERATIONS: usize = 200;

/// Returns the plotting position `(rank + 1 - 0.5) / n` of the 0-based `rank` in a sample of
/// size `n`.
///
/// The value lies strictly inside `(0, 1)` whenever `rank < n`.
///
/// # Examples
///
/// ```
/// use chiqq::plotting_position;
///
/// let positions: Vec<f64> = (0..4).map(|i| plotting_position(i, 4)).collect();
/// assert_eq!(positions, vec![0.125, 0.375, 0.625, 0.875]);
/// ```
#[must_use]
pub fn plotting_position(rank: usize, n: usize) -> f64 {
    debug_assert!(rank < n, "rank {rank} out of range for sample size {n}");

    (rank as f64 + 0.5) / n as f64
}

/// Computes the quantile (inverse CDF) of the Chi-square distribution with `df` degrees of
/// freedom at probability `p`.
///
/// The result is accurate to double precision across the open interval `(0, 1)`. A
/// Wilson-Hilferty estimate is polished by Newton steps on the regularized incomplete gamma
/// function, kept inside a shrinking bisection bracket.
///
/// # Examples
///
/// ```
/// use chiqq::chi_squared_quantile;
///
/// // With two degrees of freedom the quantile has the closed form -2 ln(1 - p).
/// let q = chi_squared_quantile(0.75, 2.0).unwrap();
/// assert!((q - (-2.0 * 0.25_f64.ln())).abs() < 1e-12);
///
/// assert!(chi_squared_quantile(1.0, 2.0).is_err());
/// assert!(chi_squared_quantile(0.5, -1.0).is_err());
/// ```
pub fn chi_squared_quantile(p: f64, df: f64) -> Result<f64, Error> {
    ChiSquaredQuantile::new(df)?.at(p)
}

/// Inverse CDF of a fixed Chi-square distribution, reused across many probabilities.
#[derive(Debug, Clone)]
pub(crate) struct ChiSquaredQuantile {
    dist: ChiSquared,
    df: f64,
}

impl ChiSquaredQuantile {
    pub(crate) fn new(df: f64) -> Result<Self, Error> {
        Ok(Self {
            dist: ChiSquared::new(df)?,
            df,
        })
    }

    pub(crate) fn at(&self, p: f64) -> Result<f64, Error> {
        if !(p > 0.0 && p < 1.0) {
            return Err(Error::InvalidProbability(p));
        }

        Ok(self.solve(p))
    }

    fn solve(&self, p: f64) -> f64 {
        // Matching the upper tail against the survival function keeps full precision for p
        // close to 1.
        let upper = p > 0.5;
        let target = if upper { 1.0 - p } else { p };
        let residual =
            |x: f64| if upper { target - self.dist.sf(x) } else { self.cdf(x) - target };

        let mut x = self.initial_guess(p);
        let mut lo = 0.0;
        let mut hi = x.max(1.0);

        while residual(hi) < 0.0 {
            lo = hi;
            hi *= 2.0;
        }

        if !(x > lo && x < hi) {
            x = 0.5 * (lo + hi);
        }

        for _ in 0..MAX_ITERATIONS {
            let f = residual(x);

            if f == 0.0 {
                return x;
            }

            if f < 0.0 {
                lo = x;
            } else {
                hi = x;
            }

            let mut next = x - f / self.dist.pdf(x);

            if !next.is_finite() || next <= lo || next >= hi {
                next = 0.5 * (lo + hi);
            }

            if (next - x).abs() <= 2.0 * f64::EPSILON * next || hi - lo <= 2.0 * f64::EPSILON * hi
            {
                return next;
            }

            x = next;
        }

        tracing::warn!(p, df = self.df, x, "Chi-square quantile did not converge");

        x
    }

    /// Lower-tail CDF. Near zero it sums the series of the regularized lower incomplete gamma
    /// function directly, since `statrs` flushes arguments below about `1e-15` to zero.
    fn cdf(&self, x: f64) -> f64 {
        let a = 0.5 * self.df;
        let z = 0.5 * x;

        if z <= 0.0 {
            return 0.0;
        }

        if z >= 0.5 * (a + 1.0) {
            return self.dist.cdf(x);
        }

        // P(a, z) = z^a e^-z / Gamma(a + 1) * sum_k z^k / ((a + 1) ... (a + k))
        let mut term = 1.0;
        let mut sum = 1.0;

        for k in 1..=MAX_ITERATIONS {
            term *= z / (a + k as f64);
            sum += term;

            if term <= sum * f64::EPSILON {
                break;
            }
        }

        (a * z.ln() - z - ln_gamma(a + 1.0)).exp() * sum
    }

    fn initial_guess(&self, p: f64) -> f64 {
        let df = self.df;
        let z = -SQRT_2 * erfc_inv(2.0 * p);
        let h = 2.0 / (9.0 * df);
        let base = 1.0 - h + z * h.sqrt();

        if base > 0.0 {
            df * base.powi(3)
        } else {
            // Leading term of the lower tail: F(x) ~ (x / 2)^(df / 2) / Gamma(df / 2 + 1).
            ((2.0 / df) * (p.ln() + ln_gamma(0.5 * df + 1.0)) + LN_2).exp()
        }
    }
}
