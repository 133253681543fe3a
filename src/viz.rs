// Terminal visualizer - renders a row of bucket magnitudes as a colored
// half-block strip, two virtual rows per physical terminal row.
//
// Ported from `DebugVisualizeValues`/`Gradient`/`Lerp` in the original
// AudioId source, with the `static`/non-threadsafe line-pairing buffer
// replaced by fields on a caller-owned struct.

use std::io::Write;

use crossterm::style::{Color, SetForegroundColor, SetBackgroundColor, ResetColor};
use crossterm::QueueableCommand;

type Rgb = (f64, f64, f64);

const BLACK: Rgb = (0.0, 0.0, 0.0);
const PURPLE: Rgb = (0.5, 0.0, 1.0);
const ORANGE: Rgb = (1.0, 0.5, 0.0);
const YELLOW: Rgb = (1.0, 1.0, 0.0);
const WHITE: Rgb = (1.0, 1.0, 1.0);

fn lerp(start: Rgb, end: Rgb, proportion: f64) -> Color {
    let proportion = proportion.clamp(0.0, 1.0);
    let channel = |s: f64, e: f64| {
        let v = (proportion * (e - s) + s).clamp(0.0, 1.0);
        (255.0 * v) as u8
    };
    Color::Rgb {
        r: channel(start.0, end.0),
        g: channel(start.1, end.1),
        b: channel(start.2, end.2),
    }
}

/// Map a bucket magnitude (expected roughly in `[0, 1]`, saturating to
/// white above `1.0`) to a black→purple→orange→yellow→white gradient color.
pub fn gradient(value: f64) -> Color {
    if value <= 0.0 {
        lerp(BLACK, BLACK, 0.0)
    } else if value < 0.333 {
        lerp(BLACK, PURPLE, value * 3.0)
    } else if value < 0.666 {
        lerp(PURPLE, ORANGE, (value - 0.333) * 3.0)
    } else if value <= 1.0 {
        lerp(ORANGE, YELLOW, (value - 0.666) * 3.0)
    } else {
        lerp(YELLOW, WHITE, value - 1.0)
    }
}

/// Renders consecutive bucket-magnitude rows as a two-virtual-lines-per-row
/// colored strip (the upper-half-block trick): the first row of a pair is
/// buffered, the second paints each column with the first row's color on
/// top and the second row's color below, via a single Unicode upper-half
/// block glyph per column.
pub struct Visualizer {
    buffered_row: Option<Vec<f64>>,
    label_annotation: String,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            buffered_row: None,
            label_annotation: String::new(),
        }
    }

    /// Set the trailing `" label distance"` annotation shown at the end of
    /// the next completed pair of rows. Pass an empty closest label for
    /// `UNKNOWN` (rendered as `-`).
    pub fn set_annotation(&mut self, matched: bool, label: Option<&str>, distance: f64) {
        let marker = if matched { "\x1b[32m" } else { "\x1b[31m" };
        let label = label.unwrap_or("-");
        self.label_annotation = format!(" {marker}{label:.5} {distance:.2}\x1b[0m");
    }

    /// Feed one row of bucket means. Every second call actually writes a
    /// physical terminal row (pairing this row with the previously buffered
    /// one); the first call of each pair only buffers.
    pub fn push_row(&mut self, out: &mut impl Write, row: &[f64]) -> std::io::Result<()> {
        match self.buffered_row.take() {
            None => {
                self.buffered_row = Some(row.to_vec());
                Ok(())
            }
            Some(previous) => {
                for (top, bottom) in previous.iter().zip(row.iter()) {
                    let fg = gradient(*top);
                    let bg = gradient(*bottom);
                    out.queue(SetForegroundColor(fg))?;
                    out.queue(SetBackgroundColor(bg))?;
                    write!(out, "\u{2580}")?;
                }
                out.queue(ResetColor)?;
                writeln!(out, "{}", self.label_annotation)?;
                self.label_annotation.clear();
                out.flush()
            }
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_is_black_at_zero() {
        assert_eq!(gradient(0.0), Color::Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn gradient_is_white_at_saturation() {
        assert_eq!(gradient(2.0), Color::Rgb { r: 255, g: 255, b: 255 });
    }

    #[test]
    fn gradient_is_monotonic_in_total_brightness_across_the_first_three_segments() {
        let brightness = |c: Color| match c {
            Color::Rgb { r, g, b } => r as u32 + g as u32 + b as u32,
            _ => unreachable!(),
        };
        let samples: Vec<u32> = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0].iter().map(|&v| brightness(gradient(v))).collect();
        for w in samples.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn first_push_only_buffers_no_output() {
        let mut viz = Visualizer::new();
        let mut out = Vec::new();
        viz.push_row(&mut out, &[0.1, 0.2, 0.3]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn second_push_emits_one_physical_row() {
        let mut viz = Visualizer::new();
        let mut out = Vec::new();
        viz.push_row(&mut out, &[0.1, 0.2, 0.3]).unwrap();
        viz.push_row(&mut out, &[0.4, 0.5, 0.6]).unwrap();
        assert!(!out.is_empty());
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains('\u{2580}'));
    }

    #[test]
    fn annotation_appears_after_the_completed_row() {
        let mut viz = Visualizer::new();
        viz.set_annotation(true, Some("bark"), 0.12);
        let mut out = Vec::new();
        viz.push_row(&mut out, &[0.1]).unwrap();
        viz.push_row(&mut out, &[0.2]).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("bark"));
    }
}
