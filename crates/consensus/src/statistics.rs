//! Robust statistics over small windows

/// Median of a set of values.
///
/// Values are ranked ascending; an even count yields the mean of the two
/// middle values. Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Some((sorted[middle - 1] + sorted[middle]) / 2.0)
    } else {
        Some(sorted[middle])
    }
}

/// Occurrence counts of labels, kept in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: Vec<(String, usize)>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit counts; repeated labels are merged
    pub fn from_counts<'a>(counts: impl IntoIterator<Item = (&'a str, usize)>) -> Self {
        let mut tally = Self::new();
        for (label, count) in counts {
            tally.add(label, count);
        }
        tally
    }

    /// Count one occurrence
    pub fn record(&mut self, label: &str) {
        self.add(label, 1);
    }

    fn add(&mut self, label: &str, count: usize) {
        match self.counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, c)) => *c += count,
            None => self.counts.push((label.to_string(), count)),
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Label with the highest count.
    ///
    /// Ties go to whichever label was seen first. `None` when nothing was
    /// recorded.
    pub fn mode(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.counts {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(label, _)| label.as_str())
    }
}

impl<'a> FromIterator<&'a str> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut tally = Self::new();
        for label in iter {
            tally.record(label);
        }
        tally
    }
}
