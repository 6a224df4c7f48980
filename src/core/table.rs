use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A set of independently-sampled series merged onto one sorted timestamp
/// axis. Stored column-major: `values[c][r]` is column `c` at `index[r]`,
/// `None` where the column has no observation at or before that row.
#[derive(Debug, Clone, Serialize)]
pub struct MergedTable {
    columns: Vec<String>,
    index: Vec<DateTime<Utc>>,
    values: Vec<Vec<Option<f64>>>,
}

impl MergedTable {
    /// Table with declared columns and no rows — the valid "nothing to show"
    /// state.
    pub fn empty(columns: Vec<String>) -> Self {
        let values = vec![Vec::new(); columns.len()];
        Self {
            columns,
            index: Vec::new(),
            values,
        }
    }

    pub(crate) fn from_parts(
        columns: Vec<String>,
        index: Vec<DateTime<Utc>>,
        values: Vec<Vec<Option<f64>>>,
    ) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        debug_assert!(values.iter().all(|c| c.len() == index.len()));
        Self {
            columns,
            index,
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        let pos = self.columns.iter().position(|c| c == name)?;
        Some(&self.values[pos])
    }

    pub fn max_timestamp(&self) -> Option<DateTime<Utc>> {
        self.index.last().copied()
    }

    /// Rows with `timestamp >= max - retention` (inclusive boundary).
    /// An empty table windows to an empty table; `max` is never computed
    /// on empty input.
    pub fn window(&self, retention: Duration) -> MergedTable {
        let max_ts = match self.max_timestamp() {
            Some(ts) => ts,
            None => return self.clone(),
        };
        let cutoff = max_ts - retention;
        let start = self.index.partition_point(|ts| *ts < cutoff);

        let index = self.index[start..].to_vec();
        let values = self
            .values
            .iter()
            .map(|col| col[start..].to_vec())
            .collect();
        MergedTable::from_parts(self.columns.clone(), index, values)
    }

    /// The last `count` non-absent values of a column, oldest first, as
    /// (timestamp, value) pairs.
    pub fn tail_of(&self, name: &str, count: usize) -> Vec<(DateTime<Utc>, f64)> {
        let col = match self.column(name) {
            Some(col) => col,
            None => return Vec::new(),
        };
        let mut out: Vec<(DateTime<Utc>, f64)> = self
            .index
            .iter()
            .zip(col.iter())
            .rev()
            .filter_map(|(ts, v)| v.map(|v| (*ts, v)))
            .take(count)
            .collect();
        out.reverse();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn sample() -> MergedTable {
        MergedTable::from_parts(
            vec!["a".to_string()],
            vec![ts(1), ts(10), ts(20)],
            vec![vec![Some(1.0), None, Some(3.0)]],
        )
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let table = sample();
        // max = Jan 20, retention 10 days -> cutoff Jan 10, which is kept.
        let windowed = table.window(Duration::days(10));
        assert_eq!(windowed.index(), &[ts(10), ts(20)]);

        // Retention 9 days -> cutoff Jan 11, Jan 10 drops.
        let windowed = table.window(Duration::days(9));
        assert_eq!(windowed.index(), &[ts(20)]);
    }

    #[test]
    fn window_of_empty_table_is_empty() {
        let table = MergedTable::empty(vec!["a".to_string()]);
        let windowed = table.window(Duration::days(30));
        assert!(windowed.is_empty());
        assert_eq!(windowed.columns(), &["a".to_string()]);
    }

    #[test]
    fn tail_skips_absent_values() {
        let table = sample();
        let tail = table.tail_of("a", 3);
        assert_eq!(tail, vec![(ts(1), 1.0), (ts(20), 3.0)]);
        assert_eq!(table.tail_of("a", 1), vec![(ts(20), 3.0)]);
        assert!(table.tail_of("missing", 3).is_empty());
    }
}
