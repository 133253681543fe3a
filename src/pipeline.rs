// Pipeline - wires the Framer/FFT/bucketer, cyclic stats ring, learner, and
// recognizer together in strict per-window order: a fingerprint at window k
// is fully learned/recognized/reported before window k+1 is accepted.
//
// Grounded on `AudioIdProcess`'s main per-window loop in the original
// AudioId source for the overall sequencing (interval tracking, then
// learn-or-recognize, then report); the modal filter/state-machine wiring
// has no counterpart there and follows this crate's recognizer module.

use tracing::info;

use crate::clock::Clock;
use crate::cycle::CycleRing;
use crate::distance::L1Mean;
use crate::fingerprint::Fingerprint;
use crate::interval::{IntervalTracker, Transition};
use crate::label::LabelTable;
use crate::learner::Learner;
use crate::recognizer::{DetectorState, Event, Recognizer, StateHistory};

/// Per-window snapshot handed to a [`Pipeline::process_with`] caller -
/// the data the terminal visualizer annotates each row with.
pub struct WindowInfo<'a> {
    pub time: f64,
    pub buckets: &'a [f64],
    pub matched_label: Option<&'a str>,
    pub distance: f64,
}

pub struct Pipeline<C> {
    fingerprint: Fingerprint,
    cycle: CycleRing,
    clock: C,
    intervals: IntervalTracker,
    recognizer: Recognizer<L1Mean>,
    history: StateHistory,
    detector: DetectorState,
    learn: bool,
}

impl<C: Clock> Pipeline<C> {
    pub fn new(
        window_size: usize,
        bucket_count: usize,
        cycle_count: usize,
        overlap: usize,
        intervals: IntervalTracker,
        clock: C,
        learn: bool,
    ) -> Self {
        Self {
            fingerprint: Fingerprint::new(window_size, bucket_count, overlap),
            cycle: CycleRing::new(bucket_count, cycle_count),
            clock,
            intervals,
            recognizer: Recognizer::new(L1Mean),
            history: StateHistory::new(cycle_count),
            detector: DetectorState::new(),
            learn,
        }
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Feed a chunk of PCM through the pipeline, returning every event
    /// emitted (recognize mode) or none (learn mode, which has no events).
    pub fn process(&mut self, samples: &[i16], labels: &mut LabelTable) -> Vec<Event> {
        self.process_with(samples, labels, |_| {})
    }

    /// Like [`Pipeline::process`], but `on_window` is called with a
    /// [`WindowInfo`] once per completed window - the hook the terminal
    /// visualizer feeds on.
    pub fn process_with(
        &mut self,
        samples: &[i16],
        labels: &mut LabelTable,
        mut on_window: impl FnMut(&WindowInfo),
    ) -> Vec<Event> {
        let mut events = Vec::new();
        let mut offset = 0;

        while offset < samples.len() {
            let consumed = self.fingerprint.add_samples(&samples[offset..]);
            if consumed == 0 {
                break;
            }
            offset += consumed;
            self.clock.advance(consumed);

            let Some(raw_buckets) = self.fingerprint.buckets() else {
                continue;
            };
            let raw_buckets = raw_buckets.to_vec();
            let now = self.clock.now();

            let transition = self.intervals.advance(now);
            match transition.transition {
                Transition::Entered => info!(time = now, "entered ground-truth interval"),
                Transition::Exited => info!(time = now, "exited ground-truth interval"),
                Transition::None => {}
            }

            if self.learn {
                if let Some(interval) = transition.interval {
                    Learner::observe(labels, interval.label, &raw_buckets);
                }
                self.cycle.accumulate(&raw_buckets);
            } else {
                self.cycle.accumulate(&raw_buckets);
                let smoothed = self.cycle.stats().to_vec();
                let means: Vec<f64> = smoothed.iter().map(|s| s.mean()).collect();
                let classified = self.recognizer.classify_with_distance(labels, &smoothed);
                let matched_label = classified.map(|(id, _)| labels.get(id).text.as_str());
                on_window(&WindowInfo {
                    time: now,
                    buckets: &means,
                    matched_label,
                    distance: classified.map_or(0.0, |(_, distance)| distance),
                });
                let group = self.recognizer.group_of(labels, classified.map(|(id, _)| id));
                self.history.push(group);
                let hypothesis = self.history.hypothesis();
                events.extend(self.detector.tick(now, hypothesis, labels));
            }
        }

        events
    }
}
