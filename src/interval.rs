// Interval Tracker - an ordered, read-only list of ground-truth
// `[start, end) -> label` intervals with an advancing pointer, plus the
// tab-separated label-file parser.
//
// Grounded on `AudioIdAddInterval` and the label-file read loop in
// `AudioIdStart` in the original AudioId source.

use std::path::Path;

use tracing::warn;

use crate::error::AudioIdError;
use crate::label::{LabelId, LabelTable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    pub label: LabelId,
}

/// Ordered intervals with a monotonically advancing read pointer, matching
/// the single-pass, strictly-increasing-timestamp access pattern the
/// recognizer drives it with.
pub struct IntervalTracker {
    intervals: Vec<Interval>,
    cursor: usize,
    active: Option<usize>,
}

impl IntervalTracker {
    /// Build a tracker from already-parsed intervals, sorted by start time.
    /// Logs (non-fatal) warnings for overlapping or inverted intervals.
    pub fn new(mut intervals: Vec<Interval>) -> Self {
        intervals.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap());

        for w in intervals.windows(2) {
            if w[1].start < w[0].end {
                warn!(
                    "overlapping intervals: [{}, {}) and [{}, {})",
                    w[0].start, w[0].end, w[1].start, w[1].end
                );
            }
        }
        for interval in &intervals {
            if interval.end < interval.start {
                warn!("inverted interval: start {} > end {}", interval.start, interval.end);
            }
        }

        Self {
            intervals,
            cursor: 0,
            active: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Advance the tracker to timestamp `t`, returning the active interval
    /// (if any) and whether this call crossed an enter or exit transition.
    pub fn advance(&mut self, t: f64) -> IntervalTransition {
        while self.cursor < self.intervals.len() && t >= self.intervals[self.cursor].end {
            if self.active == Some(self.cursor) {
                self.active = None;
            }
            self.cursor += 1;
        }

        let now_active = self
            .intervals
            .get(self.cursor)
            .filter(|iv| t >= iv.start && t < iv.end)
            .map(|_| self.cursor);

        let transition = match (self.active, now_active) {
            (None, Some(_)) => Transition::Entered,
            (Some(a), Some(b)) if a != b => Transition::Entered,
            (Some(_), None) => Transition::Exited,
            _ => Transition::None,
        };

        self.active = now_active;

        IntervalTransition {
            interval: now_active.map(|i| self.intervals[i]),
            transition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Entered,
    Exited,
}

#[derive(Debug, Clone, Copy)]
pub struct IntervalTransition {
    pub interval: Option<Interval>,
    pub transition: Transition,
}

/// Parse a tab-separated `start\tend\tlabel` label/ground-truth file,
/// registering any new label text with `labels`. Malformed lines are
/// skipped; the count of skipped lines is returned alongside the intervals.
pub fn parse_label_file(
    path: &Path,
    contents: &str,
    labels: &mut LabelTable,
) -> Result<(Vec<Interval>, usize), AudioIdError> {
    let mut intervals = Vec::new();
    let mut skipped = 0;

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(start), Some(end), Some(text)) = (fields.next(), fields.next(), fields.next()) else {
            skipped += 1;
            continue;
        };
        let (Ok(start), Ok(end)) = (start.parse::<f64>(), end.parse::<f64>()) else {
            skipped += 1;
            continue;
        };

        let label = labels.get_or_insert(text.trim())?;
        intervals.push(Interval {
            start,
            end,
            label,
        });
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped malformed label-file lines");
    }

    Ok((intervals, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn table_with(labels: &[&str]) -> (LabelTable, Vec<LabelId>) {
        let mut table = LabelTable::new(1);
        let ids = labels.iter().map(|l| table.get_or_insert(l).unwrap()).collect();
        (table, ids)
    }

    #[test]
    fn parses_well_formed_lines() {
        let mut table = LabelTable::new(1);
        let contents = "0.0\t1.5\tbark\n1.5\t3.0\tsilence\n";
        let (intervals, skipped) = parse_label_file(&PathBuf::from("x"), contents, &mut table).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(skipped, 0);
        assert_eq!(intervals[0].start, 0.0);
        assert_eq!(intervals[1].end, 3.0);
    }

    #[test]
    fn skips_malformed_lines_without_failing() {
        let mut table = LabelTable::new(1);
        let contents = "0.0\t1.0\tbark\nnot a valid line\n2.0\t3.0\tsilence\n";
        let (intervals, skipped) = parse_label_file(&PathBuf::from("x"), contents, &mut table).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn blank_lines_are_ignored_not_counted_as_skipped() {
        let mut table = LabelTable::new(1);
        let contents = "0.0\t1.0\tbark\n\n1.0\t2.0\tsilence\n";
        let (intervals, skipped) = parse_label_file(&PathBuf::from("x"), contents, &mut table).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn advance_reports_enter_and_exit_transitions() {
        let (_table, ids) = table_with(&["bark"]);
        let mut tracker = IntervalTracker::new(vec![Interval {
            start: 1.0,
            end: 2.0,
            label: ids[0],
        }]);

        assert_eq!(tracker.advance(0.5).transition, Transition::None);
        assert_eq!(tracker.advance(1.0).transition, Transition::Entered);
        assert_eq!(tracker.advance(1.5).transition, Transition::None);
        assert_eq!(tracker.advance(2.0).transition, Transition::Exited);
    }

    #[test]
    fn gaps_between_intervals_report_inactive() {
        let (_table, ids) = table_with(&["bark", "silence"]);
        let mut tracker = IntervalTracker::new(vec![
            Interval { start: 0.0, end: 1.0, label: ids[0] },
            Interval { start: 2.0, end: 3.0, label: ids[1] },
        ]);
        tracker.advance(0.5);
        let mid_gap = tracker.advance(1.5);
        assert!(mid_gap.interval.is_none());
    }

    #[test]
    fn empty_tracker_never_reports_active() {
        let mut tracker = IntervalTracker::new(vec![]);
        assert!(tracker.is_empty());
        assert!(tracker.advance(100.0).interval.is_none());
    }
}
