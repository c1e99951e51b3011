//! Helpers for asserting on metrics recorded during a test.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

/// Create a debugging recorder and its snapshotter.
///
/// Install the recorder with `metrics::with_local_recorder` around the code
/// under test, then read the results with [`RecordedMetrics::take`].
#[must_use]
pub fn debugging_recorder() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

struct Entry {
    name: String,
    labels: Vec<(String, String)>,
    value: DebugValue,
}

/// One snapshot of every metric recorded so far.
pub struct RecordedMetrics {
    entries: Vec<Entry>,
}

impl RecordedMetrics {
    /// Take a snapshot from `snapshotter`.
    #[must_use]
    pub fn take(snapshotter: &Snapshotter) -> Self {
        let entries = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, value)| Entry {
                name: key.key().name().to_owned(),
                labels: key
                    .key()
                    .labels()
                    .map(|l| (l.key().to_owned(), l.value().to_owned()))
                    .collect(),
                value,
            })
            .collect();
        Self { entries }
    }

    /// Sum of every counter named `name` carrying the `label` pair.
    ///
    /// Pass `None` to match the counter regardless of labels.
    #[must_use]
    pub fn counter(&self, name: &str, label: Option<(&str, &str)>) -> u64 {
        self.entries
            .iter()
            .filter(|entry| {
                entry.name == name
                    && label.is_none_or(|(k, v)| entry.labels.iter().any(|(lk, lv)| lk == k && lv == v))
            })
            .map(|entry| match &entry.value {
                DebugValue::Counter(count) => *count,
                _ => 0,
            })
            .sum()
    }

    /// Value of the gauge named `name`, if it was recorded.
    #[must_use]
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.entries.iter().find_map(|entry| match &entry.value {
            DebugValue::Gauge(gauge) if entry.name == name => Some(gauge.into_inner()),
            _ => None,
        })
    }
}
