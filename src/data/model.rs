use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the common CSV column dtypes.
///
/// `Null` marks a missing cell and is distinct from `0`, `false` and `""`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

// -- Manual Eq/Ord so floats compare bit-for-bit (NaN == NaN) --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Whether this cell is missing.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// The column type this value belongs to, `None` for `Null`.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            CellValue::Integer(_) => Some(ColumnType::Integer),
            CellValue::Float(_) => Some(ColumnType::Float),
            CellValue::Bool(_) => Some(ColumnType::Bool),
            CellValue::Text(_) => Some(ColumnType::Text),
            CellValue::Null => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – per-column dtype
// ---------------------------------------------------------------------------

/// Type shared by every non-missing cell of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Bool,
    Text,
    /// No non-missing cell at all.
    Empty,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Text => "text",
            ColumnType::Empty => "empty",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShapeError {
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("column '{column}' mixes {first} and {second} values")]
    MixedTypes {
        column: String,
        first: ColumnType,
        second: ColumnType,
    },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// One row of the table: a cell per column, in column order.
pub type Row = Vec<CellValue>;

/// An in-memory table: ordered rows over ordered, named, typed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub(crate) column_names: Vec<String>,
    pub(crate) column_types: Vec<ColumnType>,
    pub(crate) rows: Vec<Row>,
}

impl Dataset {
    /// Assemble a dataset whose shape has already been checked by the caller.
    pub(crate) fn from_parts(
        column_names: Vec<String>,
        column_types: Vec<ColumnType>,
        rows: Vec<Row>,
    ) -> Self {
        debug_assert_eq!(column_names.len(), column_types.len());
        debug_assert!(rows.iter().all(|r| r.len() == column_names.len()));
        Dataset {
            column_names,
            column_types,
            rows,
        }
    }

    /// Build a dataset from named columns, inferring each column's type.
    pub fn from_columns<S: Into<String>>(
        columns: Vec<(S, Vec<CellValue>)>,
    ) -> Result<Self, ShapeError> {
        let height = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut seen = BTreeSet::new();
        let mut column_names = Vec::with_capacity(columns.len());
        let mut column_types = Vec::with_capacity(columns.len());
        let mut cells = Vec::with_capacity(columns.len());

        for (name, values) in columns {
            let name: String = name.into();
            if !seen.insert(name.clone()) {
                return Err(ShapeError::DuplicateColumn(name));
            }
            if values.len() != height {
                return Err(ShapeError::LengthMismatch {
                    column: name,
                    expected: height,
                    found: values.len(),
                });
            }

            let mut dtype = ColumnType::Empty;
            for t in values.iter().filter_map(CellValue::column_type) {
                if dtype == ColumnType::Empty {
                    dtype = t;
                } else if dtype != t {
                    return Err(ShapeError::MixedTypes {
                        column: name,
                        first: dtype,
                        second: t,
                    });
                }
            }

            column_names.push(name);
            column_types.push(dtype);
            cells.push(values.into_iter());
        }

        let rows = (0..height)
            .map(|_| {
                cells
                    .iter_mut()
                    .map(|col| col.next().unwrap_or(CellValue::Null))
                    .collect()
            })
            .collect();

        Ok(Dataset::from_parts(column_names, column_types, rows))
    }

    /// Ordered column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Column types, parallel to [`Dataset::column_names`].
    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column_index(name).map(|i| self.column_types[i])
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.column_names.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.width())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cell at `row` in the column called `column`.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// The cells of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// Number of missing cells in a column.
    pub fn null_count(&self, name: &str) -> Option<usize> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().filter(|r| r[col].is_null()).count())
    }
}

// -- Serialized as a list of records: [{"col": value, ...}, ...] --

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record {
                names: &self.column_names,
                cells: row,
            })?;
        }
        seq.end()
    }
}

struct Record<'a> {
    names: &'a [String],
    cells: &'a [CellValue],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, cell) in self.names.iter().zip(self.cells) {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            ("a", vec![CellValue::Integer(1), CellValue::Integer(2)]),
            ("b", vec![CellValue::Null, CellValue::Text("x".into())]),
            ("c", vec![CellValue::Null, CellValue::Null]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns_infers_types() {
        let ds = sample();
        assert_eq!(ds.shape(), (2, 3));
        assert_eq!(
            ds.column_types(),
            &[ColumnType::Integer, ColumnType::Text, ColumnType::Empty]
        );
        assert_eq!(ds.get(1, "b"), Some(&CellValue::Text("x".into())));
        assert_eq!(ds.get(0, "missing"), None);
        assert_eq!(ds.null_count("b"), Some(1));
        assert_eq!(ds.null_count("c"), Some(2));
    }

    #[test]
    fn test_from_columns_rejects_bad_shapes() {
        let err = Dataset::from_columns(vec![
            ("a", vec![CellValue::Integer(1)]),
            ("b", vec![]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ShapeError::LengthMismatch {
                column: "b".into(),
                expected: 1,
                found: 0
            }
        );

        let err = Dataset::from_columns(vec![(
            "a",
            vec![CellValue::Integer(1), CellValue::Float(1.5)],
        )])
        .unwrap_err();
        assert!(matches!(err, ShapeError::MixedTypes { .. }));

        let err = Dataset::from_columns(vec![("a", vec![]), ("a", vec![])]).unwrap_err();
        assert_eq!(err, ShapeError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_nan_equals_itself() {
        assert_eq!(CellValue::Float(f64::NAN), CellValue::Float(f64::NAN));
        assert_ne!(CellValue::Integer(0), CellValue::Null);
        assert_ne!(CellValue::Text(String::new()), CellValue::Null);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Null.to_string(), "<null>");
        let err = ShapeError::MixedTypes {
            column: "a".into(),
            first: ColumnType::Integer,
            second: ColumnType::Text,
        };
        assert_eq!(err.to_string(), "column 'a' mixes integer and text values");
    }

    #[test]
    fn test_serializes_as_records() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"a": 1, "b": null, "c": null},
                {"a": 2, "b": "x", "c": null},
            ])
        );
    }
}
