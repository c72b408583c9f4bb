use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;

use super::model::{CellValue, ColumnType, Dataset, Row};

/// Tokens read as a missing cell when no `na_values` are given.
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse CSV in {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{}: line {line} has {found} fields, header has {expected}", .path.display())]
    TooManyFields {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("no columns to parse from {}", .path.display())]
    NoColumns { path: PathBuf },
}

/// Reader settings for [`load_data_with`].
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field separator.
    pub delimiter: u8,
    /// Fields equal to one of these (after trimming) are missing.
    pub na_values: Vec<String>,
    /// Trim whitespace before NA matching and number/bool parsing.
    /// Text cells always keep the raw field.
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
            trim: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a comma-separated file whose first record is the header.
pub fn load_data(path: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    load_data_with(path, &CsvOptions::default())
}

/// Load a delimited file with explicit reader settings.
///
/// The file is opened once and closed when the reader drops, on success
/// and on every error path. Nothing is returned unless the whole file parsed.
pub fn load_data_with(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    log::info!("Loading data from {}...", path.display());

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let csv_err = |source| csv_error(path, source);

    let headers = reader.headers().map_err(csv_err)?;
    if headers.is_empty() {
        return Err(LoadError::NoColumns {
            path: path.to_path_buf(),
        });
    }
    let column_names = column_names(headers);
    let width = column_names.len();

    // Raw fields per row; typed once the whole column has been seen.
    let mut raw: Vec<Vec<Option<String>>> = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(csv_err)? {
        if record.len() > width {
            return Err(LoadError::TooManyFields {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: width,
                found: record.len(),
            });
        }
        let mut fields: Vec<Option<String>> = record
            .iter()
            .map(|field| (!is_missing(field, options)).then(|| field.to_string()))
            .collect();
        fields.resize(width, None);
        raw.push(fields);
    }

    let column_types: Vec<ColumnType> = (0..width)
        .map(|col| infer_column_type(raw.iter().filter_map(|r| r[col].as_deref()), options.trim))
        .collect();

    let rows: Vec<Row> = raw
        .into_iter()
        .map(|fields| {
            fields
                .into_iter()
                .zip(&column_types)
                .map(|(field, &dtype)| match field {
                    Some(field) => parse_cell(field, dtype, options.trim),
                    None => CellValue::Null,
                })
                .collect()
        })
        .collect();

    let dataset = Dataset::from_parts(column_names, column_types, rows);
    log::debug!(
        "Loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.width(),
        path.display()
    );
    Ok(dataset)
}

/// Read failures from the underlying file are file-access errors, the rest
/// are malformed content.
fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    match source.kind() {
        csv::ErrorKind::Io(_) => match source.into_kind() {
            csv::ErrorKind::Io(source) => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
            _ => unreachable!(),
        },
        _ => LoadError::Csv {
            path: path.to_path_buf(),
            source,
        },
    }
}

// ---------------------------------------------------------------------------
// Header handling
// ---------------------------------------------------------------------------

/// Name blank headers `Unnamed: i` and suffix repeats with `.1`, `.2`, ...
fn column_names(headers: &StringRecord) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());

    for (i, header) in headers.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            header.to_string()
        };

        let mut name = base;
        let mut count = counts.get(&name).copied().unwrap_or(0);
        while count > 0 {
            counts.insert(name.clone(), count + 1);
            name = format!("{name}.{count}");
            count = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), count + 1);
        names.push(name);
    }
    names
}

// ---------------------------------------------------------------------------
// Cell typing
// ---------------------------------------------------------------------------

fn is_missing(field: &str, options: &CsvOptions) -> bool {
    let field = if options.trim { field.trim() } else { field };
    field.is_empty() || options.na_values.iter().any(|na| na == field)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Parse a float field. `nan` spellings are not numbers here: they are either
/// an NA token or text.
fn parse_float(s: &str) -> Option<f64> {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.eq_ignore_ascii_case("nan") {
        return None;
    }
    s.parse().ok()
}

/// Narrowest type every non-missing field of a column fits.
fn infer_column_type<'a>(fields: impl Iterator<Item = &'a str> + Clone, trim: bool) -> ColumnType {
    let prep = |s: &'a str| if trim { s.trim() } else { s };

    let mut fields = fields.map(prep).peekable();
    if fields.peek().is_none() {
        return ColumnType::Empty;
    }
    if fields.clone().all(|s| s.parse::<i64>().is_ok()) {
        return ColumnType::Integer;
    }
    if fields.clone().all(|s| parse_float(s).is_some()) {
        return ColumnType::Float;
    }
    if fields.all(|s| parse_bool(s).is_some()) {
        return ColumnType::Bool;
    }
    ColumnType::Text
}

fn parse_cell(field: String, dtype: ColumnType, trim: bool) -> CellValue {
    let s = if trim { field.trim() } else { field.as_str() };
    let parsed = match dtype {
        ColumnType::Integer => s.parse().ok().map(CellValue::Integer),
        ColumnType::Float => parse_float(s).map(CellValue::Float),
        ColumnType::Bool => parse_bool(s).map(CellValue::Bool),
        ColumnType::Text | ColumnType::Empty => None,
    };
    parsed.unwrap_or(CellValue::Text(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    #[test]
    fn test_column_names_mangles_blanks_and_repeats() {
        let names = column_names(&headers(&["a", "", "a", "b", "a", " "]));
        assert_eq!(names, ["a", "Unnamed: 1", "a.1", "b", "a.2", "Unnamed: 5"]);
    }

    #[test]
    fn test_column_names_skips_taken_suffix() {
        let names = column_names(&headers(&["a", "a.1", "a"]));
        assert_eq!(names, ["a", "a.1", "a.1.1"]);
    }

    #[test]
    fn test_infer_column_type() {
        let infer = |v: &[&str]| infer_column_type(v.iter().copied(), true);
        assert_eq!(infer(&["1", "-2", " 3 "]), ColumnType::Integer);
        assert_eq!(infer(&["1", "2.5"]), ColumnType::Float);
        assert_eq!(infer(&["1e3"]), ColumnType::Float);
        assert_eq!(infer(&["1.5", "inf", "-Infinity"]), ColumnType::Float);
        assert_eq!(infer(&["1.5", "NAN"]), ColumnType::Text);
        assert_eq!(infer(&["+nan"]), ColumnType::Text);
        assert_eq!(infer(&["true", "FALSE", "True"]), ColumnType::Bool);
        assert_eq!(infer(&["1", "x"]), ColumnType::Text);
        assert_eq!(infer(&["yes"]), ColumnType::Text);
        assert_eq!(infer(&[]), ColumnType::Empty);
    }

    #[test]
    fn test_parse_cell_keeps_raw_text() {
        assert_eq!(
            parse_cell(" x ".into(), ColumnType::Text, true),
            CellValue::Text(" x ".into())
        );
        assert_eq!(parse_cell(" 7".into(), ColumnType::Integer, true), CellValue::Integer(7));
        assert_eq!(parse_cell("3".into(), ColumnType::Float, true), CellValue::Float(3.0));
    }

    #[test]
    fn test_is_missing() {
        let opts = CsvOptions::default();
        for token in ["", "  ", "NA", "NaN", "null", " n/a ", "#N/A"] {
            assert!(is_missing(token, &opts), "{token:?} should be missing");
        }
        for token in ["0", "false", "x", "na"] {
            assert!(!is_missing(token, &opts), "{token:?} should not be missing");
        }

        let strict = CsvOptions {
            trim: false,
            ..CsvOptions::default()
        };
        assert!(!is_missing(" NA", &strict));
    }
}
