//! Scatter-plot renderers for QQ pairs.
//!
//! A renderer receives two equal-length coordinate sequences, the theoretical Chi-square
//! quantiles on x and the sorted squared Mahalanobis distances on y, and turns them into text.
//! Renderers only visualize; they never feed anything back into the analysis.
//!
//! # Example
//!
//! ```rust
//! use chiqq::ChiSquareQQ;
//! use chiqq::render::{SvgPlot, TerminalPlot};
//!
//! let data = vec![[0.3_f64, 1.2], [1.1, 0.4], [-0.6, -0.2], [0.2, -1.3], [-1.0, 0.9], [0.5, 0.1]];
//! let qq = ChiSquareQQ::new(data).unwrap();
//!
//! let text = qq.render(&TerminalPlot::new(40, 12).with_color(false)).unwrap();
//! assert_eq!(text.lines().count(), 12 + 2);
//!
//! let svg = qq.render(&SvgPlot::default()).unwrap();
//! assert!(svg.starts_with("<svg"));
//! ```

mod svg;
mod terminal;

pub use svg::SvgPlot;
pub use terminal::TerminalPlot;

use crate::Error;

/// Turns a sequence of `(x, y)` points into a textual plot.
pub trait Renderer {
    /// Renders the points `(x[i], y[i])`.
    ///
    /// Fails with [`Error::LengthMismatch`] when `x` and `y` differ in length.
    fn render(&self, x: &[f64], y: &[f64]) -> Result<String, Error>;
}

/// Selects between the character-cell and the graphical renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PlotMode {
    /// A [`TerminalPlot`] of 60 x 20 cells.
    #[default]
    Terminal,

    /// A standalone SVG document from [`SvgPlot`].
    Graphical,
}

impl PlotMode {
    /// Returns the default renderer for this mode.
    #[must_use]
    pub fn renderer(self) -> Box<dyn Renderer> {
        match self {
            Self::Terminal => Box::new(TerminalPlot::default()),
            Self::Graphical => Box::new(SvgPlot::default()),
        }
    }
}

/// Closed interval spanned by a coordinate sequence, widened when degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Extent {
    pub(crate) min: f64,
    pub(crate) max: f64,
}

impl Extent {
    pub(crate) fn of(values: &[f64]) -> Self {
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        if !min.is_finite() || !max.is_finite() {
            return Self { min: 0.0, max: 1.0 };
        }

        if max - min <= f64::EPSILON * max.abs().max(1.0) {
            return Self {
                min: min - 0.5,
                max: max + 0.5,
            };
        }

        Self { min, max }
    }

    /// Position of `v` inside the extent, 0 at `min` and 1 at `max`.
    pub(crate) fn fraction(self, v: f64) -> f64 {
        (v - self.min) / (self.max - self.min)
    }

    pub(crate) fn contains(self, v: f64) -> bool {
        (self.min..=self.max).contains(&v)
    }
}

pub(crate) fn check_lengths(x: &[f64], y: &[f64]) -> Result<(), Error> {
    if x.len() == y.len() {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            x: x.len(),
            y: y.len(),
        })
    }
}
