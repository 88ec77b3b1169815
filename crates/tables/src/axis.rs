//! Sorted, duplicate-free coordinate axes and bracketing search.

/// Distinct values of one table coordinate, strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    values: Vec<f64>,
}

/// Bracketing positions for a query value and its fractional offset between them.
///
/// When the value is clamped to an end of the axis, `lower == upper` and `t == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: usize,
    pub upper: usize,
    pub t: f64,
}

impl Axis {
    /// Collect the distinct values of an axis. Values must be finite.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        // `+ 0.0` folds -0.0 into 0.0 so lookups agree with `total_cmp` ordering
        let mut values: Vec<f64> = values.into_iter().map(|v| v + 0.0).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Position of a value that is exactly on the axis.
    pub fn position(&self, value: f64) -> Option<usize> {
        let value = value + 0.0;
        self.values.binary_search_by(|v| v.total_cmp(&value)).ok()
    }

    /// Locate the pair of axis positions around `value`, clamping at both ends.
    ///
    /// Returns `None` only for an empty axis. `value` must not be NaN; infinities clamp.
    pub fn bracket(&self, value: f64) -> Option<Bracket> {
        let first = *self.values.first()?;
        let last_index = self.values.len() - 1;

        if value <= first {
            return Some(Bracket {
                lower: 0,
                upper: 0,
                t: 0.0,
            });
        }
        if value >= self.values[last_index] {
            return Some(Bracket {
                lower: last_index,
                upper: last_index,
                t: 0.0,
            });
        }

        // first value strictly greater than `value`; lies in 1..=last_index here
        let upper = self.values.partition_point(|&v| v <= value);
        let lower = upper - 1;
        let (v0, v1) = (self.values[lower], self.values[upper]);

        Some(Bracket {
            lower,
            upper,
            t: (value - v0) / (v1 - v0),
        })
    }
}
