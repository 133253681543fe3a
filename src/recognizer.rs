// Recognizer - nearest-template matching, modal filtering across recent
// windows, and the latching event state machine that emits
// hear/e:start/e:cont/e:end.
//
// The nearest-match/scale/limit loop is grounded on the recognition block of
// `AudioIdProcess` in the original AudioId source; the modal filter and
// state machine have no counterpart in that older snapshot and are built
// directly from the behavioral description this crate's requirements add.

use crate::distance::DistanceMetric;
use crate::label::{LabelId, LabelTable};
use crate::stats::RunningStats;

/// Default seconds between repeated `hear`/`e:cont` reports of an unchanged
/// state.
pub const REPORT_MAX_INTERVAL: f64 = 1.0;

/// A group hypothesis: either a known label's group, or `UNKNOWN`.
/// `Unknown` sorts before every `Known` id, matching the original source's
/// `-1 < any label index` tie-break ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Group {
    Unknown,
    Known(LabelId),
}

/// Finds the closest learned label to a smoothed bucket-stats vector.
pub struct Recognizer<M> {
    metric: M,
}

impl<M: DistanceMetric> Recognizer<M> {
    pub fn new(metric: M) -> Self {
        Self { metric }
    }

    /// Nearest label under scale/limit gating, or `None` if no label is a
    /// candidate (empty table, or every label's scaled distance exceeds its
    /// limit).
    pub fn classify(&self, labels: &LabelTable, input: &[RunningStats]) -> Option<LabelId> {
        self.classify_with_distance(labels, input).map(|(id, _)| id)
    }

    /// Like [`Recognizer::classify`], but also returns the winning label's
    /// scaled distance (for display/debugging, e.g. the terminal visualizer's
    /// annotation).
    pub fn classify_with_distance(&self, labels: &LabelTable, input: &[RunningStats]) -> Option<(LabelId, f64)> {
        let mut best: Option<(LabelId, f64)> = None;
        for (id, label) in labels.iter() {
            let raw = self.metric.distance(&label.template, input);
            let scaled = label.scale * raw;
            let within_limit = label.limit < 0.0 || scaled <= label.limit;
            if !within_limit {
                continue;
            }
            if best.is_none_or(|(_, best_distance)| scaled < best_distance) {
                best = Some((id, scaled));
            }
        }
        best
    }

    /// Project a classified label to its voting group.
    pub fn group_of(&self, labels: &LabelTable, label: Option<LabelId>) -> Group {
        match label {
            Some(id) => Group::Known(labels.matching_group(id)),
            None => Group::Unknown,
        }
    }
}

/// A fixed-size ring of the last `MODAL_SIZE` group hypotheses, used for
/// plurality voting.
pub struct StateHistory {
    capacity: usize,
    buf: std::collections::VecDeque<Group>,
}

impl StateHistory {
    /// `MODAL_SIZE = ceil(1.5 * cycle_count)`.
    pub fn new(cycle_count: usize) -> Self {
        let capacity = (1.5 * cycle_count as f64).ceil() as usize;
        Self {
            capacity: capacity.max(1),
            buf: std::collections::VecDeque::with_capacity(capacity),
        }
    }

    pub fn modal_size(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, group: Group) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(group);
    }

    /// The plurality group over the current ring contents. Ties break
    /// toward the smallest group id (`Unknown` first).
    pub fn hypothesis(&self) -> Group {
        let mut counts: std::collections::BTreeMap<Group, usize> = std::collections::BTreeMap::new();
        for &g in &self.buf {
            *counts.entry(g).or_insert(0) += 1;
        }
        let mut best = (Group::Unknown, 0usize);
        for (g, c) in counts {
            if c > best.1 {
                best = (g, c);
            }
        }
        best.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Hear,
    Start,
    Continue,
    End,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Hear => "hear",
            EventKind::Start => "e:start",
            EventKind::Continue => "e:cont",
            EventKind::End => "e:end",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub time: f64,
    pub kind: EventKind,
    pub group: Group,
    pub duration: f64,
}

impl Event {
    /// Tab-separated `time\tkind\tgroup\tduration`, `"-"` for `UNKNOWN`.
    pub fn format(&self, labels: &LabelTable) -> String {
        let group_text = match self.group {
            Group::Unknown => "-".to_string(),
            Group::Known(id) => labels.get(id).group.clone(),
        };
        format!("{}\t{}\t{}\t{}", self.time, self.kind.as_str(), group_text, self.duration)
    }
}

/// The latching event state machine: tracks the current hypothesis,
/// reports `hear`/`e:cont` on a rate-limited cadence, and latches into
/// discrete `e:start`/`e:end`-bracketed events when a label's gating
/// conditions hold.
pub struct DetectorState {
    last_state: Group,
    state_change_time: f64,
    last_report: Option<f64>,
    latched: bool,
}

impl Default for DetectorState {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorState {
    pub fn new() -> Self {
        Self {
            last_state: Group::Unknown,
            state_change_time: 0.0,
            last_report: None,
            latched: false,
        }
    }

    pub fn last_state(&self) -> Group {
        self.last_state
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Advance the state machine one tick given the current hypothesis.
    /// Returns every event emitted this tick (usually 0 or 1; an `e:end`
    /// followed immediately by an `e:start` is possible on the same tick
    /// only if the new state's gating is satisfied right away, which cannot
    /// happen since a just-changed state has `duration == 0`).
    pub fn tick(&mut self, now: f64, hypothesis: Group, labels: &mut LabelTable) -> Vec<Event> {
        let mut events = Vec::new();

        if hypothesis != self.last_state {
            if self.latched {
                if let Group::Known(old_id) = self.last_state {
                    let duration = now - self.state_change_time;
                    events.push(Event {
                        time: now,
                        kind: EventKind::End,
                        group: self.last_state,
                        duration,
                    });
                    labels.get_mut(old_id).last_finished = now;
                }
                self.latched = false;
            }
            self.state_change_time = now;
            self.last_state = hypothesis;
            self.last_report = None;
        }

        let duration = now - self.state_change_time;

        if !self.latched {
            if let Group::Known(id) = hypothesis {
                let label = labels.get(id);
                let min_duration_ok = label.min_duration >= 0.0 && duration >= label.min_duration;
                let after_event_ok = match label.after_event {
                    None => true,
                    Some(after_id) => {
                        let after_label = labels.get(after_id);
                        after_label.last_finished >= 0.0
                            && now <= after_label.last_finished + label.within_interval + duration
                    }
                };
                if min_duration_ok && after_event_ok {
                    events.push(Event {
                        time: now,
                        kind: EventKind::Start,
                        group: hypothesis,
                        duration,
                    });
                    self.latched = true;
                    self.last_report = Some(now);
                    return events;
                }
            }
        }

        let should_report = match self.last_report {
            None => true,
            Some(last) => now - last >= REPORT_MAX_INTERVAL,
        };
        if should_report {
            let kind = if self.latched { EventKind::Continue } else { EventKind::Hear };
            events.push(Event {
                time: now,
                kind,
                group: hypothesis,
                duration,
            });
            self.last_report = Some(now);
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::L1Mean;

    fn stats_from(values: &[f64]) -> Vec<RunningStats> {
        values
            .iter()
            .map(|&v| {
                let mut s = RunningStats::new();
                s.add(v);
                s
            })
            .collect()
    }

    #[test]
    fn classify_picks_minimum_scaled_distance() {
        let mut labels = LabelTable::new(1);
        let a = labels.get_or_insert("a").unwrap();
        let b = labels.get_or_insert("b").unwrap();
        labels.get_mut(a).template = stats_from(&[0.0]);
        labels.get_mut(b).template = stats_from(&[10.0]);

        let recognizer = Recognizer::new(L1Mean);
        let input = stats_from(&[1.0]);
        assert_eq!(recognizer.classify(&labels, &input), Some(a));
    }

    #[test]
    fn classify_respects_limit_gating() {
        let mut labels = LabelTable::new(1);
        let a = labels.get_or_insert("a").unwrap();
        labels.get_mut(a).template = stats_from(&[0.0]);
        labels.get_mut(a).limit = 0.5;

        let recognizer = Recognizer::new(L1Mean);
        let far_input = stats_from(&[10.0]);
        assert_eq!(recognizer.classify(&labels, &far_input), None);
    }

    #[test]
    fn limit_below_zero_disables_rejection() {
        let mut labels = LabelTable::new(1);
        let a = labels.get_or_insert("a").unwrap();
        labels.get_mut(a).template = stats_from(&[0.0]);
        labels.get_mut(a).limit = -1.0;

        let recognizer = Recognizer::new(L1Mean);
        let far_input = stats_from(&[1000.0]);
        assert_eq!(recognizer.classify(&labels, &far_input), Some(a));
    }

    #[test]
    fn modal_filter_size_matches_formula() {
        let history = StateHistory::new(8);
        assert_eq!(history.modal_size(), 12);
        let history = StateHistory::new(1);
        assert_eq!(history.modal_size(), 2);
    }

    #[test]
    fn modal_filter_counts_sum_to_modal_size() {
        let mut labels = LabelTable::new(1);
        let a = labels.get_or_insert("a").unwrap();
        let b = labels.get_or_insert("b").unwrap();
        let mut history = StateHistory::new(4);
        for i in 0..20 {
            history.push(if i % 3 == 0 { Group::Known(a) } else { Group::Known(b) });
        }
        let mut counts = std::collections::HashMap::new();
        for g in &history.buf {
            *counts.entry(*g).or_insert(0) += 1;
        }
        let total: usize = counts.values().sum();
        assert_eq!(total, history.modal_size());
    }

    #[test]
    fn modal_filter_ties_break_toward_smallest_group() {
        let mut labels = LabelTable::new(1);
        let a = labels.get_or_insert("a").unwrap();
        let b = labels.get_or_insert("b").unwrap();
        let mut history = StateHistory::new(2);
        history.push(Group::Known(a));
        history.push(Group::Known(b));
        history.push(Group::Known(a));
        // modal_size = 3, buf = [a, b, a]: a leads 2-1.
        assert_eq!(history.hypothesis(), Group::Known(a));
    }

    #[test]
    fn stable_group_despite_alternating_labels_within_one_group() {
        // Scenario: bark/loud and bark/soft alternate every window but both
        // share the "bark" group, so the modal filter sees one stable group.
        let mut labels = LabelTable::new(1);
        let loud = labels.get_or_insert("bark/loud").unwrap();
        let soft = labels.get_or_insert("bark/soft").unwrap();
        let silence = labels.get_or_insert("silence").unwrap();
        assert_eq!(labels.matching_group(loud), labels.matching_group(soft));

        let mut history = StateHistory::new(4);
        for i in 0..12 {
            let chosen = if i % 2 == 0 { loud } else { soft };
            history.push(Group::Known(labels.matching_group(chosen)));
        }
        let hypothesis = history.hypothesis();
        assert_eq!(hypothesis, Group::Known(labels.matching_group(loud)));
        assert_ne!(hypothesis, Group::Known(silence));
    }

    #[test]
    fn silent_input_reports_hear_once_per_second() {
        let mut labels = LabelTable::new(1);
        let a = labels.get_or_insert("a").unwrap();
        labels.get_mut(a).template = stats_from(&[0.0]);

        let mut detector = DetectorState::new();
        let group = Group::Known(a);

        let first = detector.tick(0.0, group, &mut labels);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, EventKind::Hear);

        let no_report_yet = detector.tick(0.5, group, &mut labels);
        assert!(no_report_yet.is_empty());

        let second_report = detector.tick(1.0, group, &mut labels);
        assert_eq!(second_report.len(), 1);
        assert_eq!(second_report[0].kind, EventKind::Hear);
    }

    #[test]
    fn afterevent_gating_allows_start_within_interval() {
        let mut labels = LabelTable::new(1);
        let call = labels.get_or_insert("call").unwrap();
        let reply = labels.get_or_insert("reply").unwrap();
        labels.get_mut(reply).after_event = Some(call);
        labels.get_mut(reply).within_interval = 2.0;
        labels.get_mut(reply).min_duration = 0.5;

        labels.get_mut(call).last_finished = 1.0; // call ended at t=1.0

        let mut detector = DetectorState::new();
        // reply hypothesis starts at t=2.0 (1.0s after call ended)
        let group = Group::Known(reply);
        detector.tick(2.0, group, &mut labels); // change -> duration 0, not latched yet
        detector.tick(2.3, group, &mut labels); // duration 0.3 < minDuration, not yet
        let events = detector.tick(2.6, group, &mut labels); // duration 0.6 >= 0.5
        assert!(events.iter().any(|e| e.kind == EventKind::Start));
    }

    #[test]
    fn afterevent_gating_rejects_start_outside_interval() {
        let mut labels = LabelTable::new(1);
        let call = labels.get_or_insert("call").unwrap();
        let reply = labels.get_or_insert("reply").unwrap();
        labels.get_mut(reply).after_event = Some(call);
        labels.get_mut(reply).within_interval = 2.0;
        labels.get_mut(reply).min_duration = 0.5;

        labels.get_mut(call).last_finished = 0.0; // call ended at t=0.0

        let mut detector = DetectorState::new();
        let group = Group::Known(reply);
        // reply starts 3.0s after call ended - well outside withinInterval + duration budget
        detector.tick(3.0, group, &mut labels);
        let events = detector.tick(3.6, group, &mut labels);
        assert!(!events.iter().any(|e| e.kind == EventKind::Start));
    }

    #[test]
    fn state_change_emits_end_for_previously_latched_state() {
        let mut labels = LabelTable::new(1);
        let a = labels.get_or_insert("a").unwrap();
        let b = labels.get_or_insert("b").unwrap();
        labels.get_mut(a).min_duration = 0.05;

        let mut detector = DetectorState::new();
        let not_yet = detector.tick(0.0, Group::Known(a), &mut labels);
        assert!(!not_yet.iter().any(|e| e.kind == EventKind::Start));
        let started = detector.tick(0.1, Group::Known(a), &mut labels);
        assert!(started.iter().any(|e| e.kind == EventKind::Start));
        assert!(detector.is_latched());

        let on_change = detector.tick(1.0, Group::Known(b), &mut labels);
        assert!(on_change.iter().any(|e| e.kind == EventKind::End));
        assert_eq!(labels.get(a).last_finished, 1.0);
    }
}
