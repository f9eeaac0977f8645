/// Data layer: tables, loading, loop transforms and export.
///
/// Architecture:
/// ```text
///  .csv / .txt / .dat / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  named f64 columns, one per LoadedFile
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ processing  │  normalize / close loop / invert, in place
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Table → .csv
///   └──────────┘
/// ```

pub mod export;
pub mod loader;
pub mod model;
pub mod processing;
