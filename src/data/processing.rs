//! In-place loop transforms: normalization, loop closure and axis inversion.
//!
//! Every transform works on the branches named by the pair selector.  Pairs
//! are grouped two by two into cycles; the first pair of a cycle is the
//! ascending branch and the second the descending one.

use std::collections::BTreeSet;

use thiserror::Error;

use super::model::{LoadedFile, ResolvedPair, SelectedPair, file_label};

/// Number of samples averaged at each field extreme of a branch.
pub const EXTREME_SAMPLES: usize = 5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of a transform request.  The message is shown verbatim to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error("No data loaded!")]
    NoData,
    #[error("You must select all the column pairs!")]
    IncompletePair,
    #[error("You must select a file!")]
    NoFileSelected,
    #[error("Select the pair of columns that forms the loop")]
    NoColumnsSelected,
    #[error("{file} is not loaded")]
    MissingFile { file: String },
    #[error("Column '{column}' does not exist in {file}")]
    MissingColumn { file: String, column: String },
    #[error("Cannot normalize {columns}: the loop has no amplitude")]
    FlatLoop { columns: String },
    #[error("Branch '{column}' has no finite samples")]
    EmptyBranch { column: String },
    #[error("No loop in {file} uses the selected columns")]
    NoMatchingCycle { file: String },
}

// ---------------------------------------------------------------------------
// Selection resolution
// ---------------------------------------------------------------------------

/// Check every selected pair against the loaded tables.
pub fn resolve_pairs(
    files: &[LoadedFile],
    pairs: &[SelectedPair],
) -> Result<Vec<ResolvedPair>, ProcessingError> {
    if files.is_empty() {
        return Err(ProcessingError::NoData);
    }
    if pairs.is_empty() {
        return Err(ProcessingError::IncompletePair);
    }

    pairs
        .iter()
        .map(|pair| {
            let (Some(file), Some(x), Some(y)) = (pair.file, &pair.x, &pair.y) else {
                return Err(ProcessingError::IncompletePair);
            };
            let table = &files
                .get(file)
                .ok_or_else(|| ProcessingError::MissingFile {
                    file: file_label(file),
                })?
                .table;
            for column in [x, y] {
                if !table.has_column(column) {
                    return Err(ProcessingError::MissingColumn {
                        file: file_label(file),
                        column: column.clone(),
                    });
                }
            }
            Ok(ResolvedPair {
                file,
                x: x.clone(),
                y: y.clone(),
            })
        })
        .collect()
}

fn branch_data<'a>(
    files: &'a [LoadedFile],
    pair: &ResolvedPair,
) -> Result<(&'a [f64], &'a [f64]), ProcessingError> {
    let missing = |column: &str| ProcessingError::MissingColumn {
        file: file_label(pair.file),
        column: column.to_string(),
    };
    let table = &files
        .get(pair.file)
        .ok_or_else(|| ProcessingError::MissingFile {
            file: file_label(pair.file),
        })?
        .table;
    let x = table.column(&pair.x).ok_or_else(|| missing(&pair.x))?;
    let y = table.column(&pair.y).ok_or_else(|| missing(&pair.y))?;
    Ok((x, y))
}

// ---------------------------------------------------------------------------
// Branch extremes
// ---------------------------------------------------------------------------

/// Averages over the `n` lowest-field and `n` highest-field samples of a branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremes {
    pub low_x: f64,
    pub low_y: f64,
    pub high_x: f64,
    pub high_y: f64,
}

/// Extremes of one branch, ignoring non-finite samples.  `None` when the
/// branch has no finite sample.
pub fn branch_extremes(x: &[f64], y: &[f64], n: usize) -> Option<Extremes> {
    let mut points: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (xi, yi))
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .collect();
    if points.is_empty() {
        return None;
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = n.clamp(1, points.len());
    let mean = |pts: &[(f64, f64)]| {
        let len = pts.len() as f64;
        let (sx, sy) = pts
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (xi, yi)| (sx + xi, sy + yi));
        (sx / len, sy / len)
    };
    let (low_x, low_y) = mean(&points[..n]);
    let (high_x, high_y) = mean(&points[points.len() - n..]);
    Some(Extremes {
        low_x,
        low_y,
        high_x,
        high_y,
    })
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Affine map `y → (y - mid) / half` taking a loop onto `[-1, 1]`, with the
/// low-field end at `-1`.  A loop whose moment falls with the field is
/// therefore flipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mid: f64,
    pub half: f64,
}

impl Normalization {
    /// Midpoint and half-amplitude from the branches' extreme averages.
    /// `None` for a flat loop.
    pub fn from_extremes(extremes: &[Extremes]) -> Option<Self> {
        if extremes.is_empty() {
            return None;
        }
        let n = extremes.len() as f64;
        let low = extremes.iter().map(|e| e.low_y).sum::<f64>() / n;
        let high = extremes.iter().map(|e| e.high_y).sum::<f64>() / n;
        let mid = (high + low) / 2.0;
        let half = (high - low) / 2.0;
        if !mid.is_finite()
            || !half.is_finite()
            || half.abs() <= f64::EPSILON * mid.abs().max(1.0)
        {
            return None;
        }
        Some(Self { mid, half })
    }

    pub fn apply(&self, y: &mut [f64]) {
        for v in y {
            *v = (*v - self.mid) / self.half;
        }
    }
}

/// Normalize every cycle of `pairs` in place.  Returns the normalized y
/// columns; a column shared by several pairs is only normalized once.
pub fn normalize_cycles(
    files: &mut [LoadedFile],
    pairs: &[ResolvedPair],
) -> Result<Vec<String>, ProcessingError> {
    // All factors are computed before any column is touched.
    let mut plan: Vec<(usize, String, Normalization)> = Vec::new();
    for cycle in pairs.chunks(2) {
        let mut extremes = Vec::with_capacity(cycle.len());
        for pair in cycle {
            let (x, y) = branch_data(files, pair)?;
            let e = branch_extremes(x, y, EXTREME_SAMPLES).ok_or_else(|| {
                ProcessingError::EmptyBranch {
                    column: pair.y.clone(),
                }
            })?;
            extremes.push(e);
        }
        let norm = Normalization::from_extremes(&extremes).ok_or_else(|| {
            ProcessingError::FlatLoop {
                columns: cycle
                    .iter()
                    .map(|p| p.y.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })?;
        for pair in cycle {
            if !plan.iter().any(|(f, y, _)| *f == pair.file && *y == pair.y) {
                plan.push((pair.file, pair.y.clone(), norm));
            }
        }
    }

    let mut done = Vec::with_capacity(plan.len());
    for (file, column, norm) in plan {
        if let Some(values) = files[file].table.column_mut(&column) {
            norm.apply(values);
            log::info!("Normalization applied to column {column}.");
            done.push(column);
        }
    }
    Ok(done)
}

// ---------------------------------------------------------------------------
// Loop closure
// ---------------------------------------------------------------------------

/// Difference between two branches (first minus second) at both field
/// extremes, interpolated linearly in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopGap {
    pub low_x: f64,
    pub low: f64,
    pub high_x: f64,
    pub high: f64,
}

impl LoopGap {
    pub fn between(a: &Extremes, b: &Extremes) -> Self {
        Self {
            low_x: (a.low_x + b.low_x) / 2.0,
            low: a.low_y - b.low_y,
            high_x: (a.high_x + b.high_x) / 2.0,
            high: a.high_y - b.high_y,
        }
    }

    /// Gap at field `x`.
    pub fn at(&self, x: f64) -> f64 {
        let span = self.high_x - self.low_x;
        if span.abs() <= f64::EPSILON {
            return (self.low + self.high) / 2.0;
        }
        self.low + (self.high - self.low) * (x - self.low_x) / span
    }
}

/// Shift `y` by `-weight * gap(x)`.
pub fn shift_branch(x: &[f64], y: &mut [f64], gap: &LoopGap, weight: f64) {
    for (xi, yi) in x.iter().zip(y.iter_mut()) {
        *yi -= weight * gap.at(*xi);
    }
}

/// Close the loops of `file` whose branches are among `columns`.
///
/// A cycle takes part when both of its branches live in `file` and at least
/// one of its y columns is selected.  With both branches selected each
/// takes half of the correction, otherwise the selected one takes all of it.
pub fn close_loops(
    files: &mut [LoadedFile],
    pairs: &[ResolvedPair],
    file: Option<usize>,
    columns: &BTreeSet<String>,
) -> Result<Vec<String>, ProcessingError> {
    let file = file.ok_or(ProcessingError::NoFileSelected)?;
    if columns.is_empty() {
        return Err(ProcessingError::NoColumnsSelected);
    }
    if file >= files.len() {
        return Err(ProcessingError::MissingFile {
            file: file_label(file),
        });
    }

    // Every gap is measured before any column is shifted.
    let mut plan: Vec<(&ResolvedPair, LoopGap, f64)> = Vec::new();
    for cycle in pairs.chunks(2) {
        let [a, b] = cycle else {
            continue;
        };
        if a.file != file || b.file != file || a.y == b.y {
            continue;
        }
        let (weight_a, weight_b) = match (columns.contains(&a.y), columns.contains(&b.y)) {
            (true, true) => (0.5, 0.5),
            (true, false) => (1.0, 0.0),
            (false, true) => (0.0, 1.0),
            (false, false) => continue,
        };

        let extremes = |pair: &ResolvedPair| -> Result<Extremes, ProcessingError> {
            let (x, y) = branch_data(files, pair)?;
            branch_extremes(x, y, EXTREME_SAMPLES).ok_or_else(|| ProcessingError::EmptyBranch {
                column: pair.y.clone(),
            })
        };
        let gap = LoopGap::between(&extremes(a)?, &extremes(b)?);

        for (pair, weight) in [(a, weight_a), (b, -weight_b)] {
            if weight != 0.0 {
                plan.push((pair, gap, weight));
            }
        }
    }

    let mut corrected = Vec::with_capacity(plan.len());
    let table = &mut files[file].table;
    for (pair, gap, weight) in plan {
        let Some(x) = table.column(&pair.x).map(<[f64]>::to_vec) else {
            continue;
        };
        if let Some(y) = table.column_mut(&pair.y) {
            shift_branch(&x, y, &gap, weight);
            log::info!("Loop closure applied to {}.", pair.y);
            corrected.push(pair.y.clone());
        }
    }

    if corrected.is_empty() {
        return Err(ProcessingError::NoMatchingCycle {
            file: file_label(file),
        });
    }
    Ok(corrected)
}

// ---------------------------------------------------------------------------
// Axis inversion
// ---------------------------------------------------------------------------

/// Negate `columns` of `file` in place.
pub fn invert_columns(
    files: &mut [LoadedFile],
    file: Option<usize>,
    columns: &BTreeSet<String>,
) -> Result<Vec<String>, ProcessingError> {
    let file = file.ok_or(ProcessingError::NoFileSelected)?;
    if columns.is_empty() {
        return Err(ProcessingError::NoColumnsSelected);
    }
    let table = &mut files
        .get_mut(file)
        .ok_or_else(|| ProcessingError::MissingFile {
            file: file_label(file),
        })?
        .table;
    if let Some(column) = columns.iter().find(|c| !table.has_column(c)) {
        return Err(ProcessingError::MissingColumn {
            file: file_label(file),
            column: column.clone(),
        });
    }

    let mut inverted = Vec::with_capacity(columns.len());
    for column in columns {
        if let Some(values) = table.column_mut(column) {
            values.iter_mut().for_each(|v| *v = -*v);
            log::info!("Inverted column {column} of {}.", file_label(file));
            inverted.push(column.clone());
        }
    }
    Ok(inverted)
}
