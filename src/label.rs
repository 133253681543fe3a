// Label table - consolidates what the original AudioId source kept as four
// parallel `realloc`'d arrays (names, groups, templates, gating params) into
// one `Vec<Label>` plus a name index.
//
// Grounded on `AudioIdGetLabelId`/`AudioIdFreeLabels` in the original source
// for the group-derivation rule.

use std::collections::HashMap;

use crate::error::AudioIdError;
use crate::stats::RunningStats;

/// Maximum number of distinct labels a single table can hold.
pub const MAX_LABELS: usize = 64;

/// Opaque handle into a [`LabelTable`]. Stable for the table's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(u32);

impl LabelId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single recognizable event class.
#[derive(Debug, Clone)]
pub struct Label {
    /// The text as given in the label/ground-truth file, including any
    /// leading `?`/`!` flag characters.
    pub text: String,
    /// The group this label belongs to: the text after stripping a leading
    /// flag character and truncating at the first `/`.
    pub group: String,
    /// Learned per-bucket statistics.
    pub template: Vec<RunningStats>,
    /// Multiplies the computed distance before comparing against `limit`
    /// (smaller `scale` makes a label easier to match). Default `1.0`.
    pub scale: f64,
    /// Maximum accepted distance; `-1.0` means unbounded. Default `-1.0`.
    pub limit: f64,
    /// Minimum seconds an event must hold before `e:start` fires.
    /// `-1.0` means no minimum. Default `-1.0`.
    pub min_duration: f64,
    /// Another label that must have most recently finished before this one
    /// is eligible to start.
    pub after_event: Option<LabelId>,
    /// Seconds of slack added to `afterEvent`'s `lastFinished` when gating
    /// this label's start (see the recognizer's latching rule).
    pub within_interval: f64,
    /// Timestamp (seconds) this label's event last ended, or `-1.0` if it
    /// has never finished.
    pub last_finished: f64,
}

impl Label {
    fn new(text: String, bucket_count: usize) -> Self {
        let group = derive_group(&text);
        Self {
            text,
            group,
            template: vec![RunningStats::new(); bucket_count],
            scale: 1.0,
            limit: -1.0,
            min_duration: -1.0,
            after_event: None,
            within_interval: 0.0,
            last_finished: -1.0,
        }
    }
}

/// Strip a leading `?`/`!` flag character and truncate at the first `/`.
fn derive_group(text: &str) -> String {
    let stripped = text.strip_prefix(['?', '!']).unwrap_or(text);
    match stripped.find('/') {
        Some(idx) => stripped[..idx].to_string(),
        None => stripped.to_string(),
    }
}

/// Owns every known label, keyed by both a stable [`LabelId`] and its text.
pub struct LabelTable {
    bucket_count: usize,
    labels: Vec<Label>,
    by_text: HashMap<String, LabelId>,
    /// `matching_group[i]` is the id of the earliest-inserted label sharing
    /// `labels[i].group`, i.e. the state the modal filter actually votes on.
    matching_group: Vec<LabelId>,
}

impl LabelTable {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            bucket_count,
            labels: Vec::new(),
            by_text: HashMap::new(),
            matching_group: Vec::new(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, id: LabelId) -> &Label {
        &self.labels[id.index()]
    }

    pub fn get_mut(&mut self, id: LabelId) -> &mut Label {
        &mut self.labels[id.index()]
    }

    pub fn find(&self, text: &str) -> Option<LabelId> {
        self.by_text.get(text).copied()
    }

    /// The id of the earliest label sharing `id`'s group - the value the
    /// modal filter and event state machine actually operate on.
    pub fn matching_group(&self, id: LabelId) -> LabelId {
        self.matching_group[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (LabelId, &Label)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| (LabelId(i as u32), label))
    }

    /// Find an existing label with this exact text, or insert a new one.
    /// Computes `group`/`matching_group` once, at insertion.
    pub fn get_or_insert(&mut self, text: &str) -> Result<LabelId, AudioIdError> {
        if let Some(&id) = self.by_text.get(text) {
            return Ok(id);
        }
        if self.labels.len() >= MAX_LABELS {
            return Err(AudioIdError::ResourceExhausted {
                what: "labels".to_string(),
                limit: MAX_LABELS,
            });
        }

        let label = Label::new(text.to_string(), self.bucket_count);
        let id = LabelId(self.labels.len() as u32);

        let matching = self
            .labels
            .iter()
            .enumerate()
            .find(|(_, existing)| existing.group == label.group)
            .map(|(i, _)| LabelId(i as u32))
            .unwrap_or(id);

        self.by_text.insert(label.text.clone(), id);
        self.labels.push(label);
        self.matching_group.push(matching);

        Ok(id)
    }
}
