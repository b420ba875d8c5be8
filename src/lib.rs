#![doc = include_str!("../README.md")]
#![warn(clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

#[macro_use]
pub(crate) mod macros;

mod analyzer;
mod error;
mod quantile;
pub mod render;

use std::iter::Sum;

pub use analyzer::ChiSquareQQ;
pub use error::{Error, ErrorKind};
use num_traits::{Float as Float_, Num, NumAssign, NumOps};
pub use quantile::{chi_squared_quantile, plotting_position};

/// A convenience trait combining bounds frequently used for floating-point computations.
#[cfg(feature = "parallel")]
pub trait Float: Float_ + Num + NumAssign + NumOps + Sum + Send + Sync {}

/// Blanket implementation of [`Float`] for any type that satisfies its bounds.
#[cfg(feature = "parallel")]
impl<T: Float_ + Num + NumAssign + NumOps + Sum + Send + Sync> Float for T {}

/// A convenience trait combining bounds frequently used for floating-point computations.
#[cfg(not(feature = "parallel"))]
pub trait Float: Float_ + Num + NumAssign + NumOps + Sum {}

/// Blanket implementation of [`Float`] for any type that satisfies its bounds.
#[cfg(not(feature = "parallel"))]
impl<T: Float_ + Num + NumAssign + NumOps + Sum> Float for T {}

/// One point of a Chi-square QQ plot.
///
/// Pairs are produced by [`ChiSquareQQ::qq_pairs`] in ascending order of `distance`; the
/// `quantile` sequence is then strictly increasing as well.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct QQPair<T: Float> {
    /// Theoretical Chi-square quantile at this rank's plotting position (the x coordinate).
    pub quantile: T,

    /// Observed squared Mahalanobis distance at this rank (the y coordinate).
    pub distance: T,
}

#[cfg(all(feature = "serde", test))]
mod qq_pair_serde_test {
    use serde_test::{Token, assert_tokens};

    use super::QQPair;

    #[test]
    fn test_qq_pair_tokens() {
        let pair = QQPair {
            quantile: 0.454_936_423_119_572_7,
            distance: 1.0,
        };

        let expected_tokens = vec![
            Token::Struct {
                name: "QQPair",
                len: 2,
            },
            Token::Str("quantile"),
            Token::F64(0.454_936_423_119_572_7),
            Token::Str("distance"),
            Token::F64(1.0),
            Token::StructEnd,
        ];

        assert_tokens(&pair, &expected_tokens);
    }
}
