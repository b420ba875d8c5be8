use assert_float_eq::{assert_float_absolute_eq, assert_float_relative_eq};
use chiqq::{ChiSquareQQ, ErrorKind, chi_squared_quantile, plotting_position};
use rand::SeedableRng;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use statrs::distribution::{ChiSquared, Normal, Uniform};

const SEED: u64 = 0x5eed;

/// Generates N observations of D-dimensional correlated normal data.
///
/// Each observation is `A z` for a standard normal `z` and a fixed lower-triangular `A`, so the
/// population covariance is `A Aᵀ`.
fn sample_mv_norm_data(n: usize, d: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(0.0, 1.0).unwrap();

    (0..n)
        .map(|_| {
            let z: Vec<f64> = dist.sample_iter(&mut rng).take(d).collect();

            (0..d)
                .map(|i| (0..=i).map(|j| z[j] / (1.0 + (i - j) as f64)).sum::<f64>())
                .collect()
        })
        .collect()
}

/// Generates N rows of (Uniform(-1, 1), Normal(-1, 4), ChiSquared(10)).
fn sample_mixed_data(n: usize, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let uniform = Uniform::new(-1.0, 1.0).unwrap();
    let normal = Normal::new(-1.0, 4.0).unwrap();
    let chi_squared = ChiSquared::new(10.0).unwrap();

    (0..n)
        .map(|_| {
            [uniform.sample(&mut rng), normal.sample(&mut rng), chi_squared.sample(&mut rng)]
        })
        .collect()
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let sxx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
    let syy: f64 = y.iter().map(|b| (b - my).powi(2)).sum();

    sxy / (sxx * syy).sqrt()
}

macro_rules! gen_property_tests {
    ($(($n:expr, $d:expr)),+) => {
        pastey::paste! {$(
            #[test]
            fn [<mean_and_covariance_ $n _by_ $d>]() {
                let data = sample_mv_norm_data($n, $d, SEED);
                let qq = ChiSquareQQ::new(data.clone()).unwrap();

                assert_eq!(qq.observations(), $n);
                assert_eq!(qq.variables(), $d);

                for j in 0..$d {
                    let column_mean = data.iter().map(|row| row[j]).sum::<f64>() / $n as f64;
                    assert_float_absolute_eq!(qq.mean_vector()[j], column_mean, 1e-12);
                }

                let cov = qq.covariance_matrix();
                assert_eq!(cov.shape(), ($d, $d));
                for i in 0..$d {
                    assert!(cov[(i, i)] > 0.0);
                    for j in 0..$d {
                        assert_eq!(cov[(i, j)], cov[(j, i)]);
                    }
                }
            }

            #[test]
            fn [<distances_ $n _by_ $d>]() {
                let qq = ChiSquareQQ::new(sample_mv_norm_data($n, $d, SEED)).unwrap();
                let distances = qq.generalized_distance_squared().unwrap();

                assert_eq!(distances.len(), $n);
                assert!(distances.iter().all(|&d| d >= 0.0));

                // With the unbiased estimator the squared distances sum to (n - 1) p.
                let total: f64 = distances.iter().sum();
                assert_float_relative_eq!(total, (($n - 1) * $d) as f64, 1e-9);
            }

            #[test]
            fn [<qq_pairs_ $n _by_ $d>]() {
                let qq = ChiSquareQQ::new(sample_mv_norm_data($n, $d, SEED)).unwrap();
                let pairs = qq.qq_pairs().unwrap();

                assert_eq!(pairs.len(), $n);
                assert!(pairs.windows(2).all(|w| w[0].distance <= w[1].distance));
                assert!(pairs.windows(2).all(|w| w[0].quantile < w[1].quantile));

                for (i, pair) in pairs.iter().enumerate() {
                    let expected =
                        chi_squared_quantile(plotting_position(i, $n), $d as f64).unwrap();
                    assert_eq!(pair.quantile, expected);
                }
            }
        )+}
    };
}

gen_property_tests!((10, 1), (10, 3), (32, 2), (50, 4), (100, 3), (256, 5), (500, 2));

#[test]
fn distances_are_affine_invariant() {
    let data = sample_mv_norm_data(60, 3, SEED);
    let transformed: Vec<Vec<f64>> = data
        .iter()
        .map(|r| vec![2.0 * r[0] - r[1] + 5.0, 0.5 * r[1] + 3.0 * r[2] - 1.0, r[0] + r[2]])
        .collect();

    let original = ChiSquareQQ::new(data).unwrap().generalized_distance_squared().unwrap();
    let moved = ChiSquareQQ::new(transformed).unwrap().generalized_distance_squared().unwrap();

    for (a, b) in original.iter().zip(&moved) {
        assert_float_absolute_eq!(*a, *b, 1e-9);
    }
}

#[test]
fn row_order_does_not_change_the_pairs() {
    let data = sample_mv_norm_data(40, 2, SEED);
    let mut reversed = data.clone();
    reversed.reverse();

    let forward = ChiSquareQQ::new(data).unwrap().qq_pairs().unwrap();
    let backward = ChiSquareQQ::new(reversed).unwrap().qq_pairs().unwrap();

    for (a, b) in forward.iter().zip(&backward) {
        assert_eq!(a.quantile, b.quantile);
        assert_float_absolute_eq!(a.distance, b.distance, 1e-9);
    }
}

#[test]
fn normal_data_hugs_the_identity_line() {
    let qq = ChiSquareQQ::new(sample_mv_norm_data(500, 3, SEED)).unwrap();
    let pairs = qq.qq_pairs().unwrap();
    let x: Vec<f64> = pairs.iter().map(|pair| pair.quantile).collect();
    let y: Vec<f64> = pairs.iter().map(|pair| pair.distance).collect();

    assert!(pearson(&x, &y) > 0.95);
}

#[test]
fn mixed_demo_data_runs_end_to_end() {
    let qq = ChiSquareQQ::new(sample_mixed_data(100, SEED)).unwrap();
    let pairs = qq.qq_pairs().unwrap();

    assert_eq!(qq.variables(), 3);
    assert_eq!(pairs.len(), 100);
    assert_float_relative_eq!(
        pairs[0].quantile,
        chi_squared_quantile(0.005, 3.0).unwrap(),
        1e-15
    );
}

#[test]
fn plotting_positions_for_four_observations() {
    let qq = ChiSquareQQ::new(vec![[1.0_f64, 0.0], [0.0, 1.0], [-1.0, 0.5], [0.3, -2.0]]).unwrap();
    let pairs = qq.qq_pairs().unwrap();

    // For two degrees of freedom the quantile is -2 ln(1 - p).
    for (pair, p) in pairs.iter().zip([0.125_f64, 0.375, 0.625, 0.875]) {
        assert_float_relative_eq!(pair.quantile, -2.0 * (1.0 - p).ln(), 1e-10);
    }
}

#[test]
fn too_few_observations_for_the_dimension() {
    let qq = ChiSquareQQ::new(vec![[1.0_f64, 2.0, 3.0], [4.0, 6.0, 9.0]]).unwrap();

    assert_eq!(
        qq.generalized_distance_squared().unwrap_err().kind(),
        ErrorKind::SingularCovariance
    );
    assert_eq!(
        ChiSquareQQ::new(vec![[1.0_f64, 2.0, 3.0]]).unwrap_err().kind(),
        ErrorKind::InsufficientSample
    );
}

#[test]
fn distances_match_the_explicit_inverse() {
    let data = sample_mv_norm_data(300, 4, SEED + 2);
    let qq = ChiSquareQQ::new(data.clone()).unwrap();
    let inverse = qq.covariance_matrix().clone().try_inverse().unwrap();
    let distances = qq.generalized_distance_squared().unwrap();

    for (row, distance) in data.iter().zip(&distances) {
        let diff = nalgebra::DVector::from_column_slice(row) - qq.mean_vector();
        let expected = (diff.transpose() * &inverse * &diff)[(0, 0)];

        assert_float_relative_eq!(*distance, expected, 1e-9);
    }

    let pairs = qq.qq_pairs().unwrap();
    let mut sorted = distances;
    sorted.sort_by(f64::total_cmp);

    for (pair, distance) in pairs.iter().zip(&sorted) {
        assert_eq!(pair.distance, *distance);
    }
}
