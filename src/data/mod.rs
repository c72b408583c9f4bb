/// Data layer: core types, loading, and forward-fill.
///
/// Architecture:
/// ```text
///     .csv
///       │
///       ▼
///   ┌──────────┐
///   │  loader  │  parse file → Dataset (typed columns, Null for missing)
///   └──────────┘
///       │
///       ▼
///   ┌──────────┐
///   │ Dataset  │  Vec<Row>, column names + types
///   └──────────┘
///       │
///       ▼
///   ┌────────────┐
///   │ preprocess │  forward-fill Null cells per column
///   └────────────┘
/// ```

pub mod loader;
pub mod model;
pub mod preprocess;
