use super::{Extent, Renderer, check_lengths};
use crate::Error;

/// Standalone SVG scatter plot.
///
/// The document contains the axes, a dashed `y = x` reference line over the range shared by
/// both axes, one circle per point and the axis ranges as tick labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgPlot {
    width: u32,
    height: u32,
    margin: u32,
    title: String,
}

impl Default for SvgPlot {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            margin: 56,
            title: "Chi-square Q-Q plot".to_string(),
        }
    }
}

impl SvgPlot {
    /// Sets the canvas size in pixels. The margin shrinks to fit small canvases.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(16);
        self.height = height.max(16);
        self.margin = self.margin.min(self.width / 4).min(self.height / 4);
        self
    }

    /// Sets the title drawn above the plot.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Renderer for SvgPlot {
    fn render(&self, x: &[f64], y: &[f64]) -> Result<String, Error> {
        check_lengths(x, y)?;

        let xs = Extent::of(x);
        let ys = Extent::of(y);
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let m = f64::from(self.margin);
        let px = |v: f64| m + xs.fraction(v) * (w - 2.0 * m);
        let py = |v: f64| h - m - ys.fraction(v) * (h - 2.0 * m);

        let mut output = String::new();
        output.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{1}\" viewBox=\"0 0 \
             {0} {1}\">\n",
            self.width, self.height
        ));
        output.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
        output.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"16\">{}</text>\n",
            w / 2.0,
            m / 2.0,
            escape(&self.title)
        ));

        output.push_str(&format!(
            "<line x1=\"{m:.1}\" y1=\"{0:.1}\" x2=\"{1:.1}\" y2=\"{0:.1}\" stroke=\"black\"/>\n",
            h - m,
            w - m
        ));
        output.push_str(&format!(
            "<line x1=\"{m:.1}\" y1=\"{m:.1}\" x2=\"{m:.1}\" y2=\"{:.1}\" stroke=\"black\"/>\n",
            h - m
        ));

        let lo = xs.min.max(ys.min);
        let hi = xs.max.min(ys.max);
        if lo < hi {
            output.push_str(&format!(
                "<line class=\"reference\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" \
                 stroke=\"gray\" stroke-dasharray=\"4 4\"/>\n",
                px(lo),
                py(lo),
                px(hi),
                py(hi)
            ));
        }

        for (&xv, &yv) in x.iter().zip(y) {
            output.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"3\" fill=\"steelblue\"/>\n",
                px(xv),
                py(yv)
            ));
        }

        let tick = |tx: f64, ty: f64, anchor: &str, value: f64| {
            format!(
                "<text x=\"{tx:.1}\" y=\"{ty:.1}\" text-anchor=\"{anchor}\" \
                 font-size=\"11\">{value:.2}</text>\n"
            )
        };
        output.push_str(&tick(m, h - m + 16.0, "start", xs.min));
        output.push_str(&tick(w - m, h - m + 16.0, "end", xs.max));
        output.push_str(&tick(m - 6.0, h - m, "end", ys.min));
        output.push_str(&tick(m - 6.0, m + 4.0, "end", ys.max));

        output.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"12\">Chi-square \
             quantile</text>\n",
            w / 2.0,
            h - m / 4.0
        ));
        output.push_str(&format!(
            "<text x=\"{0:.1}\" y=\"{1:.1}\" text-anchor=\"middle\" font-size=\"12\" \
             transform=\"rotate(-90 {0:.1} {1:.1})\">Squared Mahalanobis distance</text>\n",
            m / 4.0,
            h / 2.0
        ));
        output.push_str("</svg>\n");

        Ok(output)
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }

    escaped
}
