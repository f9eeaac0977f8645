use std::path::PathBuf;

use anyhow::{Result, bail};

// ---------------------------------------------------------------------------
// Column – one named numeric column
// ---------------------------------------------------------------------------

/// A named column of samples. Cells that could not be parsed are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – rows × named columns
// ---------------------------------------------------------------------------

/// An in-memory table of equally long numeric columns, mutated in place by
/// the loop transforms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, rejecting duplicate names and ragged columns.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let n = first.values.len();
            for col in &columns {
                if col.values.len() != n {
                    bail!(
                        "Column '{}' has {} rows but '{}' has {n}",
                        col.name,
                        col.values.len(),
                        first.name
                    );
                }
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                bail!("Duplicate column name '{}'", col.name);
            }
        }
        Ok(Table { columns })
    }

    /// Column values by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Mutable column values by name.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.values)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// LoadedFile – a table plus where it came from
// ---------------------------------------------------------------------------

/// A loaded measurement file, addressed in the UI as `File N`.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub table: Table,
}

impl LoadedFile {
    pub fn new(path: PathBuf, table: Table) -> Self {
        Self { path, table }
    }

    /// File name without directories, for tooltips and logs.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The `File N` label shown for the file at `index` (0-based).
pub fn file_label(index: usize) -> String {
    format!("File {}", index + 1)
}

// ---------------------------------------------------------------------------
// Column pair selections
// ---------------------------------------------------------------------------

/// One row of the pair selector: a file and its x/y columns, any of which
/// may still be unset.  Pairs `2k` and `2k + 1` are the branches of cycle `k`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedPair {
    pub file: Option<usize>,
    pub x: Option<String>,
    pub y: Option<String>,
}

impl SelectedPair {
    /// A pair on `file`, defaulting to its first two columns.
    pub fn for_file(file: usize, table: &Table) -> Self {
        let names = table.column_names();
        let x = names.first().cloned();
        let y = names.get(1).or(names.first()).cloned();
        Self {
            file: Some(file),
            x,
            y,
        }
    }
}

/// A fully specified pair whose columns were checked against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPair {
    pub file: usize,
    pub x: String,
    pub y: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_columns() {
        let result = Table::from_columns(vec![
            Column::new("H", vec![1.0, 2.0]),
            Column::new("M", vec![1.0]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = Table::from_columns(vec![
            Column::new("H", vec![1.0]),
            Column::new("H", vec![2.0]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn column_lookup_and_mutation() {
        let mut table = Table::from_columns(vec![
            Column::new("H", vec![1.0, 2.0]),
            Column::new("M", vec![3.0, 4.0]),
        ])
        .unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column_names(), vec!["H", "M"]);
        table.column_mut("M").unwrap()[0] = -3.0;
        assert_eq!(table.column("M"), Some(&[-3.0, 4.0][..]));
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn new_pair_defaults_to_first_two_columns() {
        let table = Table::from_columns(vec![
            Column::new("H", vec![0.0]),
            Column::new("M", vec![0.0]),
            Column::new("T", vec![0.0]),
        ])
        .unwrap();
        let pair = SelectedPair::for_file(0, &table);
        assert_eq!(pair.x.as_deref(), Some("H"));
        assert_eq!(pair.y.as_deref(), Some("M"));

        let single = Table::from_columns(vec![Column::new("M", vec![0.0])]).unwrap();
        let pair = SelectedPair::for_file(1, &single);
        assert_eq!(pair.y.as_deref(), Some("M"));
    }

    #[test]
    fn labels_are_one_based() {
        assert_eq!(file_label(0), "File 1");
        assert_eq!(file_label(2), "File 3");
    }
}
