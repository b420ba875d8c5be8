use colored::Colorize;

use super::{Extent, Renderer, check_lengths};
use crate::Error;

/// Character-cell scatter plot for terminals.
///
/// Points are drawn as `*` (or `#` where several share a cell) over a dotted `y = x` reference
/// line. The y range is labelled on the left edge and the x range under the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalPlot {
    width: usize,
    height: usize,
    color: bool,
}

impl Default for TerminalPlot {
    fn default() -> Self {
        Self::new(60, 20)
    }
}

impl TerminalPlot {
    /// A plot area of `width` x `height` cells (at least 2 x 2), with ANSI colours enabled.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(2),
            height: height.max(2),
            color: true,
        }
    }

    /// Enables or disables ANSI colours. `colored` still honours `NO_COLOR` when enabled.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn column(&self, fraction: f64) -> usize {
        (fraction.clamp(0.0, 1.0) * (self.width - 1) as f64).round() as usize
    }

    fn row(&self, fraction: f64) -> usize {
        let from_bottom = (fraction.clamp(0.0, 1.0) * (self.height - 1) as f64).round() as usize;

        self.height - 1 - from_bottom
    }

    fn paint(&self, cell: Cell) -> String {
        let glyph = match cell {
            Cell::Empty => " ",
            Cell::Reference => ".",
            Cell::Point => "*",
            Cell::Overlap => "#",
        };

        if !self.color {
            return glyph.to_string();
        }

        match cell {
            Cell::Empty => glyph.to_string(),
            Cell::Reference => glyph.dimmed().to_string(),
            Cell::Point => glyph.cyan().to_string(),
            Cell::Overlap => glyph.cyan().bold().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Reference,
    Point,
    Overlap,
}

impl Renderer for TerminalPlot {
    fn render(&self, x: &[f64], y: &[f64]) -> Result<String, Error> {
        check_lengths(x, y)?;

        let xs = Extent::of(x);
        let ys = Extent::of(y);
        let mut grid = vec![vec![Cell::Empty; self.width]; self.height];

        for col in 0..self.width {
            let value = xs.min + (xs.max - xs.min) * col as f64 / (self.width - 1) as f64;

            if ys.contains(value) {
                grid[self.row(ys.fraction(value))][col] = Cell::Reference;
            }
        }

        for (&xv, &yv) in x.iter().zip(y) {
            let cell = &mut grid[self.row(ys.fraction(yv))][self.column(xs.fraction(xv))];
            *cell = match *cell {
                Cell::Point | Cell::Overlap => Cell::Overlap,
                Cell::Empty | Cell::Reference => Cell::Point,
            };
        }

        let top = format!("{:.2}", ys.max);
        let bottom = format!("{:.2}", ys.min);
        let label_width = top.len().max(bottom.len());
        let mut output = String::new();

        for (r, cells) in grid.iter().enumerate() {
            let label = if r == 0 {
                top.as_str()
            } else if r == self.height - 1 {
                bottom.as_str()
            } else {
                ""
            };

            output.push_str(&format!("{label:>label_width$} \u{2502}"));
            for &cell in cells {
                output.push_str(&self.paint(cell));
            }
            output.push('\n');
        }

        output.push_str(&format!("{:>label_width$} \u{2514}{}\n", "", "\u{2500}".repeat(self.width)));

        let left = format!("{:.2}", xs.min);
        let right = format!("{:.2}", xs.max);
        let gap = self.width.saturating_sub(left.len() + right.len()).max(1);
        output.push_str(&format!(
            "{:>indent$}{left}{}{right}\n",
            "",
            " ".repeat(gap),
            indent = label_width + 2
        ));

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_points_over_the_reference_line() {
        let plot = TerminalPlot::new(5, 3).with_color(false);
        let output = plot.render(&[0.0, 1.0], &[0.0, 1.0]).unwrap();

        let expected = [
            "1.00 \u{2502}   .*",
            "     \u{2502} ..  ",
            "0.00 \u{2502}*    ",
            "     \u{2514}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}",
            "      0.00 1.00",
        ]
        .join("\n")
            + "\n";

        assert_eq!(output, expected);
    }

    #[test]
    fn shared_cells_are_marked_as_overlap() {
        let plot = TerminalPlot::new(4, 4).with_color(false);
        let output = plot.render(&[0.0, 0.0, 3.0], &[0.0, 0.0, 3.0]).unwrap();

        assert_eq!(output.matches('#').count(), 1);
        assert_eq!(output.matches('*').count(), 1);
    }

    #[test]
    fn default_size_matches_a_sixty_by_twenty_figure() {
        let output = TerminalPlot::default()
            .with_color(false)
            .render(&[0.5, 1.5, 2.5], &[0.2, 1.9, 2.4])
            .unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 22);
        assert!(lines[..20].iter().all(|line| line.chars().count() == 4 + 2 + 60));
    }

    #[test]
    fn empty_input_renders_an_empty_frame() {
        let output = TerminalPlot::new(10, 4).with_color(false).render(&[], &[]).unwrap();

        assert!(!output.contains('*'));
        assert_eq!(output.lines().count(), 6);
    }
}
