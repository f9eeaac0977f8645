//! Write tables back to CSV so processed loops can be reused elsewhere.

use std::path::Path;

use anyhow::{Context, Result};

use super::model::Table;

/// Write `table` as comma-separated text with a header row.  `NaN` cells
/// are written empty.
pub fn save_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer
        .write_record(table.column_names())
        .context("writing CSV header")?;

    for row in 0..table.n_rows() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|col| {
                let v = col.values[row];
                if v.is_nan() { String::new() } else { v.to_string() }
            })
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }

    writer.flush().context("flushing CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use crate::data::model::Column;

    #[test]
    fn saved_table_loads_back() {
        let table = Table::from_columns(vec![
            Column::new("H", vec![-1.0, 0.0, 1.0]),
            Column::new("M", vec![-0.5, f64::NAN, 0.5]),
        ])
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.csv");
        save_csv(&table, &path).unwrap();

        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.column_names(), vec!["H", "M"]);
        assert_eq!(loaded.column("H"), table.column("H"));
        assert!(loaded.column("M").unwrap()[1].is_nan());
    }
}
