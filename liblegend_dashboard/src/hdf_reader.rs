use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use ndarray::{Array2, Axis};
use std::path::Path;

use super::error::StoreError;
use super::frame::{ColumnLabel, Frame};

const COLUMNS_NAME: &str = "axis0";
const INDEX_NAME: &str = "axis1";

/// Longest fixed-width labels we expect pandas to write
type FixedLabel = FixedAscii<64>;
type FixedUnicodeLabel = FixedUnicode<256>;

// Layout written by pandas' HDFStore in "fixed" format, one group per key
// <key> - pandas_type, nblocks, ...
// |---- axis0(dset)          column labels
// |---- axis1(dset)          index (datetime64[ns] as int64, or a plain range)
// |---- block0_items(dset)   column labels held by block 0
// |---- block0_values(dset)  (rows, items) values of block 0
// |---- block1_items ...

/// Read access to key-addressed tables.
///
/// Implemented by [`PandasStore`] for monitoring files on disk.
pub trait FrameSource {
    fn has_key(&self, key: &str) -> bool;

    /// List the column labels of a table without reading its values
    fn column_labels(&self, key: &str) -> Result<Vec<ColumnLabel>, StoreError>;

    /// Read all numeric columns of a table
    fn read_frame(&self, key: &str) -> Result<Frame, StoreError>;

    /// Read a text column of a table
    fn read_text(&self, key: &str, column: &str) -> Result<Vec<String>, StoreError>;
}

/// A simple struct which wraps around the hdf5-rust library.
///
/// Opens an HDF5 file written by pandas for reading. The handle is released when the store
/// is dropped.
#[derive(Debug)]
pub struct PandasStore {
    file_handle: File,
}

impl PandasStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file_handle = File::open(path)?;
        let size = path.metadata().map(|m| m.len()).unwrap_or(0);
        spdlog::debug!(
            "Opened {} ({})",
            path.display(),
            human_bytes::human_bytes(size as f64)
        );
        Ok(Self { file_handle })
    }

    fn table(&self, key: &str) -> Result<Group, StoreError> {
        let name = key.trim_start_matches('/');
        if !self.file_handle.link_exists(name) {
            return Err(StoreError::MissingKey(key.to_string()));
        }
        Ok(self.file_handle.group(name)?)
    }
}

impl FrameSource for PandasStore {
    fn has_key(&self, key: &str) -> bool {
        let name = key.trim_start_matches('/');
        !name.is_empty() && self.file_handle.link_exists(name)
    }

    fn column_labels(&self, key: &str) -> Result<Vec<ColumnLabel>, StoreError> {
        let table = self.table(key)?;
        read_labels(key, &table.dataset(COLUMNS_NAME)?)
    }

    fn read_frame(&self, key: &str) -> Result<Frame, StoreError> {
        let table = self.table(key)?;
        let columns = read_labels(key, &table.dataset(COLUMNS_NAME)?)?;
        let index = table.dataset(INDEX_NAME)?.read_1d::<i64>()?.to_vec();
        let n_rows = index.len();

        let mut numeric_labels: Vec<ColumnLabel> = Vec::new();
        let mut numeric_columns: Vec<Vec<f64>> = Vec::new();
        let mut block = 0;
        while table.link_exists(&format!("block{block}_values")) {
            let items = read_labels(key, &table.dataset(&format!("block{block}_items"))?)?;
            let values = table.dataset(&format!("block{block}_values"))?;
            if let Some(matrix) = read_numeric_block(key, &values, n_rows, items.len())? {
                for (pos, label) in items.into_iter().enumerate() {
                    numeric_columns.push(matrix.index_axis(Axis(1), pos).to_vec());
                    numeric_labels.push(label);
                }
            }
            block += 1;
        }

        // Restore the column order of axis0
        let mut ordered_labels = Vec::new();
        let mut ordered_values = Vec::new();
        for label in columns.iter() {
            if let Some(pos) = numeric_labels.iter().position(|l| l == label) {
                ordered_labels.push(label.clone());
                ordered_values.extend_from_slice(&numeric_columns[pos]);
            }
        }
        let n_cols = ordered_labels.len();
        let values = Array2::from_shape_vec((n_cols, n_rows), ordered_values)
            .map_err(|e| StoreError::MalformedTable {
                key: key.to_string(),
                reason: e.to_string(),
            })?
            .reversed_axes()
            .as_standard_layout()
            .to_owned();
        Frame::try_new(key, index, ordered_labels, values)
    }

    fn read_text(&self, key: &str, column: &str) -> Result<Vec<String>, StoreError> {
        let table = self.table(key)?;
        let wanted = ColumnLabel::Name(column.to_string());
        let mut block = 0;
        while table.link_exists(&format!("block{block}_values")) {
            let items = read_labels(key, &table.dataset(&format!("block{block}_items"))?)?;
            if let Some(pos) = items.iter().position(|l| *l == wanted) {
                let values = table.dataset(&format!("block{block}_values"))?;
                if let Some(text) = read_text_block(&values)? {
                    return Ok(text.index_axis(Axis(1), pos).to_vec());
                }
            }
            block += 1;
        }
        Err(StoreError::MissingColumn {
            key: key.to_string(),
            column: column.to_string(),
        })
    }
}

fn read_labels(key: &str, dataset: &Dataset) -> Result<Vec<ColumnLabel>, StoreError> {
    let labels = match dataset.dtype()?.to_descriptor()? {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => dataset
            .read_1d::<i64>()?
            .iter()
            .map(|id| ColumnLabel::RawId(*id))
            .collect(),
        TypeDescriptor::FixedAscii(_) => dataset
            .read_1d::<FixedLabel>()?
            .iter()
            .map(|s| ColumnLabel::Name(s.as_str().to_string()))
            .collect(),
        TypeDescriptor::FixedUnicode(_) => dataset
            .read_1d::<FixedUnicodeLabel>()?
            .iter()
            .map(|s| ColumnLabel::Name(s.as_str().to_string()))
            .collect(),
        TypeDescriptor::VarLenUnicode => dataset
            .read_1d::<VarLenUnicode>()?
            .iter()
            .map(|s| ColumnLabel::Name(s.as_str().to_string()))
            .collect(),
        TypeDescriptor::VarLenAscii => dataset
            .read_1d::<VarLenAscii>()?
            .iter()
            .map(|s| ColumnLabel::Name(s.as_str().to_string()))
            .collect(),
        other => {
            return Err(StoreError::MalformedTable {
                key: key.to_string(),
                reason: format!("unsupported column label type {other:?}"),
            })
        }
    };
    Ok(labels)
}

/// Read a value block as (rows, items). Returns None for non-numeric blocks
fn read_numeric_block(
    key: &str,
    dataset: &Dataset,
    n_rows: usize,
    n_items: usize,
) -> Result<Option<Array2<f64>>, StoreError> {
    let matrix = match dataset.dtype()?.to_descriptor()? {
        TypeDescriptor::Float(_) => dataset.read_2d::<f64>()?,
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            dataset.read_2d::<i64>()?.mapv(|v| v as f64)
        }
        _ => return Ok(None),
    };
    let shape = (matrix.nrows(), matrix.ncols());
    if shape == (n_rows, n_items) {
        Ok(Some(matrix))
    } else if shape == (n_items, n_rows) {
        Ok(Some(matrix.reversed_axes().as_standard_layout().to_owned()))
    } else {
        Err(StoreError::MalformedTable {
            key: key.to_string(),
            reason: format!(
                "block of shape {shape:?} does not match {n_rows} rows and {n_items} items"
            ),
        })
    }
}

fn read_text_block(dataset: &Dataset) -> Result<Option<Array2<String>>, StoreError> {
    let text = match dataset.dtype()?.to_descriptor()? {
        TypeDescriptor::VarLenUnicode => dataset
            .read_2d::<VarLenUnicode>()?
            .mapv(|s| s.as_str().to_string()),
        TypeDescriptor::VarLenAscii => dataset
            .read_2d::<VarLenAscii>()?
            .mapv(|s| s.as_str().to_string()),
        TypeDescriptor::FixedAscii(_) => dataset
            .read_2d::<FixedLabel>()?
            .mapv(|s| s.as_str().to_string()),
        TypeDescriptor::FixedUnicode(_) => dataset
            .read_2d::<FixedUnicodeLabel>()?
            .mapv(|s| s.as_str().to_string()),
        _ => return Ok(None),
    };
    Ok(Some(text))
}
