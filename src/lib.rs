//! Load delimited text files into a typed in-memory table and clean them by
//! forward-filling missing cells.
//!
//! ```no_run
//! use tabular_prep::{load_data, preprocess_data};
//!
//! let data = preprocess_data(load_data("prices.csv")?);
//! println!("{} rows", data.len());
//! # Ok::<(), tabular_prep::LoadError>(())
//! ```

pub mod data;

pub use data::loader::{load_data, load_data_with, CsvOptions, LoadError, DEFAULT_NA_VALUES};
pub use data::model::{CellValue, ColumnType, Dataset, Row, ShapeError};
pub use data::preprocess::preprocess_data;
