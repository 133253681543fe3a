// Template Learner - accumulates raw per-window bucket values into a
// label's template while inside its matching ground-truth interval.
//
// Ported from the `if (interval != NULL && audioid->learn)` block in
// `AudioIdProcess` in the original AudioId source.

use crate::label::LabelTable;

/// Feeds raw bucket vectors into whichever label is currently active in the
/// ground-truth, unconditionally and without a cap (see the Open Question
/// decision in the design notes).
pub struct Learner;

impl Learner {
    /// Accumulate `buckets` (this window's raw, un-smoothed bucket vector)
    /// into `label`'s template.
    pub fn observe(labels: &mut LabelTable, label: crate::label::LabelId, buckets: &[f64]) {
        let template = &mut labels.get_mut(label).template;
        for (stat, &value) in template.iter_mut().zip(buckets.iter()) {
            stat.add(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observing_accumulates_into_the_labels_template() {
        let mut labels = LabelTable::new(2);
        let bark = labels.get_or_insert("bark").unwrap();

        Learner::observe(&mut labels, bark, &[1.0, 2.0]);
        Learner::observe(&mut labels, bark, &[3.0, 4.0]);

        let template = &labels.get(bark).template;
        assert_eq!(template[0].count(), 2);
        assert_eq!(template[0].mean(), 2.0);
        assert_eq!(template[1].mean(), 3.0);
    }

    #[test]
    fn observing_one_label_never_touches_another() {
        let mut labels = LabelTable::new(1);
        let bark = labels.get_or_insert("bark").unwrap();
        let silence = labels.get_or_insert("silence").unwrap();

        Learner::observe(&mut labels, bark, &[5.0]);

        assert_eq!(labels.get(bark).template[0].count(), 1);
        assert_eq!(labels.get(silence).template[0].count(), 0);
    }

    #[test]
    fn template_accumulation_is_unbounded_across_many_windows() {
        let mut labels = LabelTable::new(1);
        let bark = labels.get_or_insert("bark").unwrap();
        for _ in 0..10_000 {
            Learner::observe(&mut labels, bark, &[1.0]);
        }
        assert_eq!(labels.get(bark).template[0].count(), 10_000);
    }
}
