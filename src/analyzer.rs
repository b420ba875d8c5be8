use std::cmp::Ordering;

use nalgebra::{DMatrix, DVector, RealField, SymmetricEigen};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::quantile::{ChiSquaredQuantile, plotting_position};
use crate::render::{PlotMode, Renderer};
use crate::{Error, Float, QQPair};

/// Chi-square QQ diagnostic for multivariate normality.
///
/// Holds an `n x p` sample (rows are observations, columns are variables) together with its
/// mean vector and unbiased covariance matrix, both computed once at construction. Squared
/// Mahalanobis distances and QQ pairs are recomputed from that state on every call; no method
/// mutates the analyzer, so a shared reference can be queried from several threads.
///
/// Under multivariate normality the squared distances follow a Chi-square distribution with
/// `p` degrees of freedom, so the pairs returned by [`qq_pairs`](ChiSquareQQ::qq_pairs) should
/// lie close to the line `y = x`.
///
/// # Examples
///
/// ```
/// use chiqq::ChiSquareQQ;
///
/// let data = vec![
///     vec![2.1_f64, 0.3],
///     vec![1.4, -0.2],
///     vec![3.0, 1.1],
///     vec![2.6, 0.1],
///     vec![1.9, 0.9],
///     vec![2.2, -0.5],
/// ];
///
/// let qq = ChiSquareQQ::new(data).unwrap();
/// assert_eq!(qq.variables(), 2);
///
/// let pairs = qq.qq_pairs().unwrap();
/// assert_eq!(pairs.len(), 6);
/// assert!(pairs.windows(2).all(|w| w[0].quantile < w[1].quantile));
/// assert!(pairs.windows(2).all(|w| w[0].distance <= w[1].distance));
/// ```
#[derive(Debug, Clone)]
pub struct ChiSquareQQ<T: Float + RealField> {
    data: DMatrix<T>,
    mean: DVector<T>,
    covariance: DMatrix<T>,
    singularity_tolerance: T,
}

impl<T: Float + RealField> ChiSquareQQ<T> {
    /// Builds the analyzer from an iterator of observations.
    ///
    /// Takes an argument `data` which is an iterator of iterators (`impl IntoIterator<Item = impl
    /// IntoIterator<Item = T>>`). Each inner iterator is one observation; all of them must have
    /// the same, non-zero number of variables. At least two observations are needed for the
    /// unbiased covariance estimator.
    ///
    /// Fewer observations than `p + 1` is accepted here, but the covariance matrix is then
    /// singular and distance queries fail with [`Error::SingularCovariance`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chiqq::{ChiSquareQQ, Error};
    ///
    /// let ragged = vec![vec![1.0_f64, 2.0], vec![3.0]];
    /// assert_eq!(
    ///     ChiSquareQQ::new(ragged).unwrap_err(),
    ///     Error::DimensionMismatch {
    ///         row: 1,
    ///         expected: 2,
    ///         given: 1
    ///     }
    /// );
    /// ```
    pub fn new<I: IntoIterator<Item = J>, J: IntoIterator<Item = T>>(
        data: I,
    ) -> Result<Self, Error> {
        let mut flat_data = Vec::new();
        let mut n = 0;
        let mut p = 0;

        for (i, row) in data.into_iter().enumerate() {
            n += 1;
            let mut row_len = 0;

            for val in row {
                flat_data.push(val);
                row_len += 1;
            }

            if i == 0 {
                p = row_len;

                if p == 0 {
                    return Err(Error::NoVariables);
                }
            } else if row_len != p {
                return Err(Error::DimensionMismatch {
                    row: i,
                    expected: p,
                    given: row_len,
                });
            }
        }

        if n == 0 {
            return Err(Error::EmptySample);
        }

        Self::from_matrix(DMatrix::from_row_slice(n, p, &flat_data))
    }

    /// Builds the analyzer from an `n x p` matrix whose rows are observations.
    pub fn from_matrix(data: DMatrix<T>) -> Result<Self, Error> {
        let (n, p) = data.shape();

        if n == 0 {
            return Err(Error::EmptySample);
        }

        if p == 0 {
            return Err(Error::NoVariables);
        }

        if data.iter().any(|&v| v.is_nan()) {
            return Err(Error::ContainsNaN);
        }

        if data.iter().any(|&v| v.is_infinite()) {
            return Err(Error::ContainsInfinity);
        }

        if n < 2 {
            return Err(Error::InsufficientSampleSize {
                given: n,
                needed: 2,
            });
        }

        if n <= p {
            tracing::warn!(
                n,
                p,
                "Fewer observations than variables plus one; the covariance matrix will be singular"
            );
        }

        let mean = data.row_mean().transpose();
        let covariance = sample_covariance(&data, &mean);

        if covariance.shape() != (p, p) {
            return Err(Error::CovarianceShape {
                expected: p,
                rows: covariance.nrows(),
                cols: covariance.ncols(),
            });
        }

        tracing::debug!(n, p, "Estimated mean vector and covariance matrix");

        let epsilon: T = num_traits::Float::epsilon();

        Ok(Self {
            data,
            mean,
            covariance,
            singularity_tolerance: epsilon * T::from(1000 * p).unwrap(),
        })
    }

    /// Overrides the relative threshold below which the covariance matrix counts as singular.
    ///
    /// The check runs on the correlation matrix, so rescaling a column never changes its
    /// outcome. The matrix is rejected when a column's standard deviation is at most `tolerance`
    /// times its largest absolute value, or when the smallest eigenvalue of the correlation
    /// matrix is at most `tolerance` times its largest. The default is `1000 * p * T::epsilon()`.
    #[must_use]
    pub fn with_singularity_tolerance(mut self, tolerance: T) -> Self {
        self.singularity_tolerance = tolerance;
        self
    }

    /// The relative threshold used to detect a singular covariance matrix.
    pub fn singularity_tolerance(&self) -> T {
        self.singularity_tolerance
    }

    /// The sample, one observation per row.
    pub fn data(&self) -> &DMatrix<T> {
        &self.data
    }

    /// Number of observations `n`.
    pub fn observations(&self) -> usize {
        self.data.nrows()
    }

    /// Number of variables `p`, which is also the Chi-square degrees of freedom.
    pub fn variables(&self) -> usize {
        self.data.ncols()
    }

    /// The arithmetic mean of each column.
    pub fn mean_vector(&self) -> &DVector<T> {
        &self.mean
    }

    /// The `p x p` sample covariance matrix, using the `n - 1` divisor.
    pub fn covariance_matrix(&self) -> &DMatrix<T> {
        &self.covariance
    }

    /// Computes `(x - mean)ᵀ Σ⁻¹ (x - mean)` for every observation, in input order.
    ///
    /// Fails with [`Error::SingularCovariance`] when the covariance matrix is singular or
    /// numerically close to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use chiqq::ChiSquareQQ;
    ///
    /// let qq = ChiSquareQQ::new(vec![[1.0_f64], [2.0], [3.0]]).unwrap();
    /// let distances = qq.generalized_distance_squared().unwrap();
    ///
    /// assert!((distances[0] - 1.0).abs() < 1e-12);
    /// assert!(distances[1].abs() < 1e-12);
    /// assert!((distances[2] - 1.0).abs() < 1e-12);
    /// ```
    pub fn generalized_distance_squared(&self) -> Result<Vec<T>, Error> {
        let (scale, l) = self.correlation_factor()?;

        // With Σ = S⁻¹ L Lᵀ S⁻¹ the quadratic form is ‖L⁻¹ S (x - mean)‖², which cannot go
        // negative.
        let distances = into_iter_if_parallel!(0..self.observations())
            .map(|k| {
                let diff = (self.data.row(k).transpose() - &self.mean).component_mul(&scale);

                l.solve_lower_triangular(&diff).map(|z| z.norm_squared())
            })
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| singular_error(T::zero(), T::zero()))?;

        debug_assert_eq!(distances.len(), self.observations());

        Ok(distances)
    }

    /// Pairs each sorted squared distance with its theoretical Chi-square quantile.
    ///
    /// The distances are sorted ascending with a stable sort. The distance at 0-based rank `i`
    /// is paired with the quantile of the Chi-square distribution with `p` degrees of freedom at
    /// the plotting position `(i + 0.5) / n`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chiqq::{ChiSquareQQ, chi_squared_quantile};
    ///
    /// let qq = ChiSquareQQ::new(vec![[1.0_f64], [2.0], [3.0]]).unwrap();
    /// let pairs = qq.qq_pairs().unwrap();
    ///
    /// let distances: Vec<f64> = pairs.iter().map(|pair| pair.distance.round()).collect();
    /// assert_eq!(distances, vec![0.0, 1.0, 1.0]);
    /// assert_eq!(pairs[1].quantile, chi_squared_quantile(0.5, 1.0).unwrap());
    /// ```
    pub fn qq_pairs(&self) -> Result<Vec<QQPair<T>>, Error> {
        let mut distances = self.generalized_distance_squared()?;
        stable_sort_if_parallel!(distances.as_mut_slice(), |a: &T, b: &T| a
            .partial_cmp(b)
            .unwrap_or(Ordering::Equal));

        let n = distances.len();
        let quantile = ChiSquaredQuantile::new(self.variables() as f64)?;

        distances
            .into_iter()
            .enumerate()
            .map(|(i, distance)| {
                let q = quantile.at(plotting_position(i, n))?;

                Ok(QQPair {
                    quantile: T::from(q).unwrap_or_else(<T as num_traits::Float>::nan),
                    distance,
                })
            })
            .collect()
    }

    /// Hands the QQ pairs to `renderer` as two parallel coordinate sequences (theoretical
    /// quantiles on x, squared distances on y) and returns its output.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &R) -> Result<String, Error> {
        let pairs = self.qq_pairs()?;
        let x: Vec<f64> =
            pairs.iter().map(|pair| pair.quantile.to_f64().unwrap_or(f64::NAN)).collect();
        let y: Vec<f64> =
            pairs.iter().map(|pair| pair.distance.to_f64().unwrap_or(f64::NAN)).collect();

        renderer.render(&x, &y)
    }

    /// Renders the QQ plot with the default renderer for `mode`.
    pub fn draw(&self, mode: PlotMode) -> Result<String, Error> {
        self.render(mode.renderer().as_ref())
    }

    /// Returns the inverse column standard deviations `S` and the lower Cholesky factor of the
    /// correlation matrix `S Σ S`.
    fn correlation_factor(&self) -> Result<(DVector<T>, DMatrix<T>), Error> {
        let p = self.variables();
        let variances = self.covariance.diagonal();

        for j in 0..p {
            let magnitude = self
                .data
                .column(j)
                .iter()
                .fold(T::zero(), |m, &v| num_traits::Float::max(m, num_traits::Float::abs(v)));

            if num_traits::Float::sqrt(variances[j]) <= magnitude * self.singularity_tolerance {
                let eigenvalues = SymmetricEigen::new(self.covariance.clone()).eigenvalues;

                tracing::debug!(column = j, "Covariance matrix rejected for a constant column");

                return Err(singular_error(eigenvalues.min(), eigenvalues.max()));
            }
        }

        let scale = variances.map(|v| T::one() / num_traits::Float::sqrt(v));
        let mut correlation = self.covariance.clone();

        for i in 0..p {
            for j in 0..p {
                correlation[(i, j)] = correlation[(i, j)] * scale[i] * scale[j];
            }
        }

        let eigenvalues = SymmetricEigen::new(correlation.clone()).eigenvalues;
        let min_eigenvalue = eigenvalues.min();
        let max_eigenvalue = eigenvalues.max();

        if max_eigenvalue <= T::zero()
            || min_eigenvalue <= max_eigenvalue * self.singularity_tolerance
        {
            tracing::debug!(
                min_eigenvalue = min_eigenvalue.to_f64(),
                max_eigenvalue = max_eigenvalue.to_f64(),
                "Correlation matrix rejected as singular"
            );

            return Err(singular_error(min_eigenvalue, max_eigenvalue));
        }

        let cholesky = correlation
            .cholesky()
            .ok_or_else(|| singular_error(min_eigenvalue, max_eigenvalue))?;

        Ok((scale, cholesky.unpack()))
    }
}

fn singular_error<T: Float>(min_eigenvalue: T, max_eigenvalue: T) -> Error {
    Error::SingularCovariance {
        min_eigenvalue: min_eigenvalue.to_f64().unwrap_or(f64::NAN),
        max_eigenvalue: max_eigenvalue.to_f64().unwrap_or(f64::NAN),
    }
}

fn sample_covariance<T: Float + RealField>(data: &DMatrix<T>, mean: &DVector<T>) -> DMatrix<T> {
    let (n, p) = data.shape();
    let mut centered = data.clone();

    for i in 0..n {
        let mut row = centered.row_mut(i);
        row -= mean.transpose();
    }

    let denominator = T::from(n - 1).unwrap();
    let mut covariance = DMatrix::zeros(p, p);

    // Only the upper triangle is computed so the result is exactly symmetric.
    for i in 0..p {
        for j in i..p {
            let value = centered.column(i).dot(&centered.column(j)) / denominator;
            covariance[(i, j)] = value;
            covariance[(j, i)] = value;
        }
    }

    covariance
}
