/// One constant-valued stretch `[start, end)` of a node's signal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValuedRun<T> {
    /// First base of the run.
    pub start: u32,
    /// One past the last base of the run.
    pub end: u32,
    /// Value shared by every base in the run.
    pub value: T,
}

impl<T> ValuedRun<T> {
    /// Construct a run.
    pub fn new(start: u32, end: u32, value: T) -> Self {
        Self { start, end, value }
    }

    /// Number of bases in the run.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the run covers no bases.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Compress a node's values into maximal runs.
///
/// A break is emitted wherever the value changes; for tuple values any
/// component change breaks, and simultaneous changes yield a single break.
pub fn compress_slice<T: Copy + PartialEq>(values: &[T]) -> Vec<ValuedRun<T>> {
    let mut runs = Vec::new();
    let Some(&first) = values.first() else {
        return runs;
    };

    let mut start = 0usize;
    let mut current = first;
    for (pos, &value) in values.iter().enumerate().skip(1) {
        if value != current {
            runs.push(ValuedRun::new(start as u32, pos as u32, current));
            start = pos;
            current = value;
        }
    }
    runs.push(ValuedRun::new(start as u32, values.len() as u32, current));
    runs
}

/// Expand runs back into per-base values.
pub fn expand_runs<T: Copy>(runs: &[ValuedRun<T>]) -> Vec<T> {
    let total = runs.iter().map(|run| run.len() as usize).sum();
    let mut values = Vec::with_capacity(total);
    for run in runs {
        values.extend(std::iter::repeat(run.value).take(run.len() as usize));
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ControlSample;

    #[test]
    fn compress_collapses_equal_neighbours() {
        let runs = compress_slice(&[0.0, 0.0, 2.0, 2.0, 2.0, 0.0]);
        assert_eq!(
            runs,
            vec![
                ValuedRun::new(0, 2, 0.0),
                ValuedRun::new(2, 5, 2.0),
                ValuedRun::new(5, 6, 0.0),
            ]
        );
        assert_eq!(expand_runs(&runs), vec![0.0, 0.0, 2.0, 2.0, 2.0, 0.0]);
    }

    #[test]
    fn paired_values_merge_breakpoints() {
        let a = ControlSample::new(1.0, 0.0);
        let b = ControlSample::new(1.0, 3.0);
        let c = ControlSample::new(2.0, 4.0);
        let d = ControlSample::new(2.0, 3.0);
        let runs = compress_slice(&[a, a, b, c, c, d]);
        let starts: Vec<u32> = runs.iter().map(|run| run.start).collect();
        // control changes at 3 together with sample: one break there.
        assert_eq!(starts, vec![0, 2, 3, 5]);
    }

    #[test]
    fn empty_input_gives_no_runs() {
        assert!(compress_slice::<f64>(&[]).is_empty());
    }
}
