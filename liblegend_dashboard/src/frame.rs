use ndarray::{Array2, ArrayView1, Axis};
use std::fmt::Display;

use super::error::StoreError;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

/// Label of a table column. Monitoring tables are keyed by DAQ raw id, auxiliary tables by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnLabel {
    RawId(i64),
    Name(String),
}

impl Display for ColumnLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RawId(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Where resampling buckets are anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleOrigin {
    /// The first timestamp of the series
    Start,
    /// Midnight of the day of the first timestamp
    StartDay,
}

/// A time indexed table of numeric values.
///
/// The index holds nanoseconds since the unix epoch, values are stored row-major as
/// (rows, columns).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: Vec<i64>,
    columns: Vec<ColumnLabel>,
    values: Array2<f64>,
}

impl Frame {
    pub fn try_new(
        key: &str,
        index: Vec<i64>,
        columns: Vec<ColumnLabel>,
        values: Array2<f64>,
    ) -> Result<Self, StoreError> {
        if values.nrows() != index.len() || values.ncols() != columns.len() {
            return Err(StoreError::MalformedTable {
                key: key.to_string(),
                reason: format!(
                    "values have shape {:?} but index has {} entries and there are {} columns",
                    values.shape(),
                    index.len(),
                    columns.len()
                ),
            });
        }
        Ok(Self {
            index,
            columns,
            values,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn columns(&self) -> &[ColumnLabel] {
        &self.columns
    }

    pub fn column_position(&self, label: &ColumnLabel) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    pub fn column(&self, label: &ColumnLabel) -> Option<ArrayView1<'_, f64>> {
        self.column_position(label)
            .map(|pos| self.values.index_axis(Axis(1), pos))
    }

    /// Keep only the given columns, in the given order. Labels not in the frame are skipped
    pub fn select(&self, labels: &[ColumnLabel]) -> Frame {
        let positions: Vec<usize> = labels
            .iter()
            .filter_map(|l| self.column_position(l))
            .collect();
        Frame {
            index: self.index.clone(),
            columns: positions.iter().map(|p| self.columns[*p].clone()).collect(),
            values: self.values.select(Axis(1), &positions),
        }
    }

    /// Relabel every column
    pub fn rename<F>(mut self, mut relabel: F) -> Frame
    where
        F: FnMut(&ColumnLabel) -> ColumnLabel,
    {
        self.columns = self.columns.iter().map(|c| relabel(c)).collect();
        self
    }

    /// Shift the time index by a fixed offset
    pub fn shift_index(mut self, offset_nanos: i64) -> Frame {
        for t in self.index.iter_mut() {
            *t += offset_nanos;
        }
        self
    }

    /// Bucket the rows into fixed intervals and average each column per bucket.
    ///
    /// The output contains every bucket between the first and last timestamp, labelled by its
    /// start. Empty buckets and buckets with only NaN values yield NaN.
    pub fn resample_mean(&self, interval_nanos: i64, origin: ResampleOrigin) -> Frame {
        let (first, last) = match (self.index.iter().min(), self.index.iter().max()) {
            (Some(f), Some(l)) if interval_nanos > 0 => (*f, *l),
            _ => return self.clone(),
        };
        let anchor = match origin {
            ResampleOrigin::Start => first,
            ResampleOrigin::StartDay => first - first.rem_euclid(NANOS_PER_DAY),
        };
        let first_bucket = (first - anchor).div_euclid(interval_nanos);
        let last_bucket = (last - anchor).div_euclid(interval_nanos);
        let n_buckets = (last_bucket - first_bucket + 1) as usize;
        let n_cols = self.columns.len();

        let mut sums = Array2::<f64>::zeros((n_buckets, n_cols));
        let mut counts = Array2::<u32>::zeros((n_buckets, n_cols));
        for (row, t) in self.index.iter().enumerate() {
            let bucket = ((t - anchor).div_euclid(interval_nanos) - first_bucket) as usize;
            for col in 0..n_cols {
                let value = self.values[[row, col]];
                if !value.is_nan() {
                    sums[[bucket, col]] += value;
                    counts[[bucket, col]] += 1;
                }
            }
        }

        let values = Array2::from_shape_fn((n_buckets, n_cols), |(b, c)| match counts[[b, c]] {
            0 => f64::NAN,
            n => sums[[b, c]] / n as f64,
        });
        let index = (0..n_buckets as i64)
            .map(|b| anchor + (first_bucket + b) * interval_nanos)
            .collect();
        Frame {
            index,
            columns: self.columns.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn secs(s: i64) -> i64 {
        s * NANOS_PER_SECOND
    }

    fn frame() -> Frame {
        Frame::try_new(
            "test",
            vec![secs(0), secs(30), secs(60), secs(150)],
            vec![ColumnLabel::RawId(1), ColumnLabel::RawId(2)],
            array![[1.0, 10.0], [3.0, f64::NAN], [5.0, 50.0], [7.0, 70.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_mismatch() {
        let result = Frame::try_new(
            "bad",
            vec![0, 1],
            vec![ColumnLabel::RawId(1)],
            Array2::zeros((3, 1)),
        );
        assert!(matches!(result, Err(StoreError::MalformedTable { .. })));
    }

    #[test]
    fn test_select_and_rename() {
        let f = frame().select(&[ColumnLabel::RawId(2), ColumnLabel::RawId(9)]);
        assert_eq!(f.columns(), &[ColumnLabel::RawId(2)]);
        let f = f.rename(|c| ColumnLabel::Name(format!("det{c}")));
        let col = f.column(&ColumnLabel::Name(String::from("det2"))).unwrap();
        assert_eq!(col[0], 10.0);
        assert_eq!(col[3], 70.0);
    }

    #[test]
    fn test_resample_from_start() {
        let r = frame().resample_mean(secs(60), ResampleOrigin::Start);
        assert_eq!(r.index(), &[secs(0), secs(60), secs(120)]);
        let c1 = r.column(&ColumnLabel::RawId(1)).unwrap();
        assert_eq!(c1.to_vec(), vec![2.0, 5.0, 7.0]);
        let c2 = r.column(&ColumnLabel::RawId(2)).unwrap();
        assert_eq!(c2[0], 10.0);
    }

    #[test]
    fn test_resample_gaps_are_nan() {
        let f = Frame::try_new(
            "gaps",
            vec![secs(10), secs(200)],
            vec![ColumnLabel::RawId(1)],
            array![[1.0], [2.0]],
        )
        .unwrap();
        let r = f.resample_mean(secs(60), ResampleOrigin::Start);
        assert_eq!(r.n_rows(), 4);
        let c = r.column(&ColumnLabel::RawId(1)).unwrap();
        assert_eq!(c[0], 1.0);
        assert!(c[1].is_nan());
        assert!(c[2].is_nan());
        assert_eq!(c[3], 2.0);
    }

    #[test]
    fn test_resample_from_start_day() {
        let f = Frame::try_new(
            "day",
            vec![secs(86_400 + 90), secs(86_400 + 100)],
            vec![ColumnLabel::RawId(1)],
            array![[1.0], [3.0]],
        )
        .unwrap();
        let r = f.resample_mean(secs(60), ResampleOrigin::StartDay);
        assert_eq!(r.index(), &[secs(86_400 + 60)]);
        assert_eq!(r.column(&ColumnLabel::RawId(1)).unwrap()[0], 2.0);
    }
}
