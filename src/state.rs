use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use eframe::egui::Color32;

use crate::color::named_color;
use crate::console::Console;
use crate::data::export::save_csv;
use crate::data::loader::load_file;
use crate::data::model::{LoadedFile, SelectedPair, Table, file_label};
use crate::data::processing::{
    ProcessingError, close_loops, invert_columns, normalize_cycles, resolve_pairs,
};
use crate::fit::curve_fit::{FitError, FitOptions, Model, curve_fit, parse_bounds, parse_values};
use crate::fit::results::FitResults;
use crate::plotting::{
    CycleStyle, LineKind, Marker, Overlay, PlotCustomizations, PlotModel, build_plot,
    cycle_label,
};

// ---------------------------------------------------------------------------
// Notices (modal info / error messages)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message waiting to be acknowledged by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Dialog forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    CloseLoop,
    InvertX,
    InvertY,
}

impl TransformKind {
    pub fn title(self) -> &'static str {
        match self {
            TransformKind::CloseLoop => "Close loop",
            TransformKind::InvertX => "Invert fields",
            TransformKind::InvertY => "Invert y axis",
        }
    }
}

/// File and column choice for close-loop and the inversions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformDialog {
    pub kind: TransformKind,
    pub file: Option<usize>,
    /// Candidate columns and whether each is ticked.
    pub columns: BTreeMap<String, bool>,
}

impl TransformDialog {
    pub fn selected(&self) -> BTreeSet<String> {
        self.columns
            .iter()
            .filter(|(_, ticked)| **ticked)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleForm {
    pub cycle: usize,
    pub color: &'static str,
    pub marker: Marker,
    pub line: LineKind,
}

impl Default for StyleForm {
    fn default() -> Self {
        Self {
            cycle: 0,
            color: "blue",
            marker: Marker::Circle,
            line: LineKind::Solid,
        }
    }
}

/// Inputs of the curve fitting window.
#[derive(Debug, Clone, PartialEq)]
pub struct FitForm {
    pub file: Option<usize>,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub function: String,
    pub param_names: String,
    pub initial: String,
    pub lower: String,
    pub upper: String,
    pub x_start: f64,
    pub x_end: f64,
}

impl Default for FitForm {
    fn default() -> Self {
        Self {
            file: None,
            x_column: None,
            y_column: None,
            function: "a*(x - b)".to_string(),
            param_names: "a, b".to_string(),
            initial: "1, 1".to_string(),
            lower: String::new(),
            upper: String::new(),
            x_start: 0.0,
            x_end: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded files, addressed as `File 1`, `File 2`, … in load order.
    pub files: Vec<LoadedFile>,

    /// Pair selector rows; pairs `2k`, `2k + 1` form cycle `k`.
    pub pairs: Vec<SelectedPair>,

    /// Saved per-cycle styles.
    pub customizations: PlotCustomizations,

    /// Fitted values shared with the console.
    pub fit_results: FitResults,

    /// What the plot panel draws (None until "Create plot").
    pub plot: Option<PlotModel>,

    /// Number of times the plot has been (re)built.
    pub plot_count: usize,

    /// x-range visible in the plot, updated every frame.
    pub visible_x_range: Option<(f64, f64)>,

    /// Modal messages, oldest first.
    pub notices: VecDeque<Notice>,

    pub transform_dialog: Option<TransformDialog>,
    pub style_form: Option<StyleForm>,
    pub fit_form: FitForm,
    pub show_fit_window: bool,
    pub console: Console,
    pub show_console: bool,
    pub fit_options: FitOptions,

    /// Status line shown in the top bar.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            pairs: Vec::new(),
            customizations: PlotCustomizations::new(),
            fit_results: FitResults::default(),
            plot: None,
            plot_count: 0,
            visible_x_range: None,
            notices: VecDeque::new(),
            transform_dialog: None,
            style_form: None,
            fit_form: FitForm::default(),
            show_fit_window: false,
            console: Console::default(),
            show_console: false,
            fit_options: FitOptions::default(),
            status_message: None,
        }
    }
}

impl AppState {
    // -- notices --

    pub fn info(&mut self, title: &str, message: impl Into<String>) {
        self.notices.push_back(Notice {
            level: NoticeLevel::Info,
            title: title.to_string(),
            message: message.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{message}");
        self.notices.push_back(Notice {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            message,
        });
    }

    pub fn dismiss_notice(&mut self) {
        self.notices.pop_front();
    }

    // -- files --

    /// Load a file and register it as the next `File N`.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(table) => self.add_file(path.to_path_buf(), table),
            Err(e) => {
                self.status_message = Some(format!("Error: {e:#}"));
                self.error(format!("Failed to load {}: {e:#}", path.display()));
            }
        }
    }

    pub fn add_file(&mut self, path: PathBuf, table: Table) {
        let index = self.files.len();
        log::info!(
            "Loaded {} as {} with columns {:?}",
            path.display(),
            file_label(index),
            table.column_names()
        );
        self.status_message = Some(format!(
            "{} loaded: {} rows × {} columns",
            file_label(index),
            table.n_rows(),
            table.n_columns()
        ));
        self.files.push(LoadedFile::new(path, table));
        if self.pairs.is_empty() {
            self.add_pair();
        }
    }

    /// Write `File N` back to disk as CSV.
    pub fn save_file(&mut self, index: usize, path: &Path) {
        let Some(file) = self.files.get(index) else {
            self.error(ProcessingError::NoFileSelected.to_string());
            return;
        };
        match save_csv(&file.table, path) {
            Ok(()) => {
                log::info!("Saved {} to {}", file_label(index), path.display());
                self.status_message = Some(format!("Saved {}", path.display()));
            }
            Err(e) => self.error(format!("Failed to save {}: {e:#}", path.display())),
        }
    }

    // -- pair selector --

    /// Append a selector row on `File 1`.
    pub fn add_pair(&mut self) {
        let pair = match self.files.first() {
            Some(file) => SelectedPair::for_file(0, &file.table),
            None => SelectedPair::default(),
        };
        self.pairs.push(pair);
    }

    pub fn remove_pair(&mut self, index: usize) {
        if index < self.pairs.len() {
            self.pairs.remove(index);
        }
    }

    /// Point a selector row at another file, resetting its columns.
    pub fn set_pair_file(&mut self, index: usize, file: usize) {
        let Some(loaded) = self.files.get(file) else {
            return;
        };
        if let Some(pair) = self.pairs.get_mut(index) {
            *pair = SelectedPair::for_file(file, &loaded.table);
        }
    }

    // -- plot --

    /// Build the plot from the current selection.
    pub fn create_plot(&mut self) {
        if self.files.is_empty() {
            self.error(ProcessingError::NoData.to_string());
            return;
        }
        let built = resolve_pairs(&self.files, &self.pairs)
            .and_then(|pairs| build_plot(&self.files, &pairs, &self.customizations));
        match built {
            Ok(model) => {
                self.plot = Some(model);
                self.plot_count += 1;
            }
            Err(e @ ProcessingError::IncompletePair) => self.error(e.to_string()),
            Err(e) => self.error(format!("Error while creating the plot: {e}")),
        }
    }

    /// Rebuild an open plot after the data changed.
    fn refresh_plot(&mut self) {
        if self.plot.is_some() {
            self.create_plot();
        }
    }

    fn overlay(&mut self, name: String, points: Vec<[f64; 2]>) {
        let points = points
            .into_iter()
            .filter(|p| p[0].is_finite() && p[1].is_finite())
            .collect();
        self.plot.get_or_insert_with(PlotModel::default).overlays.push(Overlay {
            name,
            points,
            color: Color32::from_rgb(0, 160, 0),
        });
    }

    // -- transforms --

    /// Normalize every selected cycle.
    pub fn normalize(&mut self) {
        let result = resolve_pairs(&self.files, &self.pairs)
            .and_then(|pairs| normalize_cycles(&mut self.files, &pairs));
        match result {
            Ok(columns) => {
                self.status_message = Some(format!("Normalized {}", columns.join(", ")));
                self.refresh_plot();
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    /// Open the close-loop / inversion dialog.
    pub fn open_transform(&mut self, kind: TransformKind) {
        if self.files.is_empty() {
            self.error(ProcessingError::NoData.to_string());
            return;
        }
        let file = self.pairs.iter().find_map(|p| p.file);
        let mut dialog = TransformDialog {
            kind,
            file,
            columns: BTreeMap::new(),
        };
        self.fill_transform_columns(&mut dialog);
        self.transform_dialog = Some(dialog);
    }

    pub fn set_transform_file(&mut self, file: usize) {
        if let Some(mut dialog) = self.transform_dialog.take() {
            dialog.file = Some(file);
            self.fill_transform_columns(&mut dialog);
            self.transform_dialog = Some(dialog);
        }
    }

    /// Offer the columns the selected pairs use in the dialog's file: y
    /// columns for close-loop and y inversion, x columns for field
    /// inversion.  Falls back to every column of the file.
    fn fill_transform_columns(&self, dialog: &mut TransformDialog) {
        dialog.columns.clear();
        let Some(file) = dialog.file else {
            return;
        };
        for pair in self.pairs.iter().filter(|p| p.file == Some(file)) {
            let column = match dialog.kind {
                TransformKind::InvertX => &pair.x,
                TransformKind::CloseLoop | TransformKind::InvertY => &pair.y,
            };
            if let Some(column) = column {
                dialog.columns.insert(column.clone(), false);
            }
        }
        if dialog.columns.is_empty() {
            if let Some(loaded) = self.files.get(file) {
                for name in loaded.table.column_names() {
                    dialog.columns.insert(name, false);
                }
            }
        }
    }

    /// Run the open dialog's transform.  The dialog stays open on error.
    pub fn apply_transform(&mut self) {
        let Some(dialog) = self.transform_dialog.clone() else {
            return;
        };
        let columns = dialog.selected();
        let applied = match dialog.kind {
            TransformKind::CloseLoop => self.close_loop(dialog.file, &columns),
            TransformKind::InvertX | TransformKind::InvertY => {
                self.invert(dialog.file, &columns)
            }
        };
        if applied {
            self.transform_dialog = None;
        }
    }

    /// Close the loops of `file` whose branches are among `columns`.
    pub fn close_loop(&mut self, file: Option<usize>, columns: &BTreeSet<String>) -> bool {
        let result = if file.is_none() {
            Err(ProcessingError::NoFileSelected)
        } else if columns.is_empty() {
            Err(ProcessingError::NoColumnsSelected)
        } else {
            resolve_pairs(&self.files, &self.pairs)
                .and_then(|pairs| close_loops(&mut self.files, &pairs, file, columns))
        };
        self.finish_transform(file, result)
    }

    /// Negate `columns` of `file`.
    pub fn invert(&mut self, file: Option<usize>, columns: &BTreeSet<String>) -> bool {
        let result = invert_columns(&mut self.files, file, columns);
        self.finish_transform(file, result)
    }

    fn finish_transform(
        &mut self,
        file: Option<usize>,
        result: Result<Vec<String>, ProcessingError>,
    ) -> bool {
        match result {
            Ok(_) => {
                let file = file.map(file_label).unwrap_or_default();
                self.info("Success", format!("Operation applied to {file}!"));
                self.refresh_plot();
                true
            }
            Err(e) => {
                self.error(e.to_string());
                false
            }
        }
    }

    // -- style --

    pub fn open_style_dialog(&mut self) {
        let problem = match &self.plot {
            None => Some("No plot open! Create a plot first."),
            Some(plot) if plot.is_empty() => Some("There are no lines in the plot!"),
            Some(_) => None,
        };
        match problem {
            Some(message) => self.error(message),
            None => self.style_form = Some(StyleForm::default()),
        }
    }

    /// Apply and remember the style form for its cycle.
    pub fn apply_style(&mut self) {
        let Some(form) = self.style_form.clone() else {
            return;
        };
        let Some(color) = named_color(form.color) else {
            self.error(format!("Unknown colour '{}'", form.color));
            return;
        };
        let n_cycles = self.plot.as_ref().map_or(0, PlotModel::n_cycles);
        if form.cycle >= n_cycles {
            self.error(format!("Error while applying the style: no cycle {}", form.cycle + 1));
            return;
        }

        let style = CycleStyle {
            color,
            marker: form.marker,
            line: form.line,
        };
        log::info!(
            "{}: colour {}, marker {}, line {}",
            cycle_label(form.cycle),
            form.color,
            form.marker.symbol(),
            form.line.symbol()
        );
        self.customizations.insert(form.cycle, style);
        if let Some(plot) = &mut self.plot {
            plot.restyle(form.cycle, style);
        }
        self.style_form = None;
    }

    // -- curve fitting --

    pub fn open_fit_window(&mut self) {
        if self.files.is_empty() {
            self.error(ProcessingError::NoData.to_string());
            return;
        }
        if self.fit_form.file.map_or(true, |f| f >= self.files.len()) {
            self.set_fit_file(0);
        }
        self.show_fit_window = true;
    }

    /// Select the file to fit, resetting the column choice.
    pub fn set_fit_file(&mut self, file: usize) {
        let Some(loaded) = self.files.get(file) else {
            return;
        };
        let defaults = SelectedPair::for_file(file, &loaded.table);
        self.fit_form.file = Some(file);
        self.fit_form.x_column = defaults.x;
        self.fit_form.y_column = defaults.y;
    }

    /// Copy the plot's visible x-range into the fit range.
    pub fn use_visible_range(&mut self) {
        if let Some((start, end)) = self.visible_x_range {
            self.fit_form.x_start = start;
            self.fit_form.x_end = end;
        }
    }

    /// Fit the form's model.  On failure the curve at the initial guess is
    /// drawn instead, to help adjust it.
    pub fn run_fit(&mut self) {
        let form = self.fit_form.clone();
        let Some(table) = form.file.and_then(|f| self.files.get(f)).map(|f| &f.table) else {
            self.error(ProcessingError::NoFileSelected.to_string());
            return;
        };
        let (Some(x_col), Some(y_col)) = (&form.x_column, &form.y_column) else {
            self.error("Invalid columns selected!");
            return;
        };
        log::info!("Fit of {y_col} as a function of {x_col}.");
        let (Some(x), Some(y)) = (table.column(x_col), table.column(y_col)) else {
            self.error("Invalid columns selected!");
            return;
        };
        let (x, y) = (x.to_vec(), y.to_vec());

        let model = match Model::new(&form.function, &form.param_names) {
            Ok(model) => model,
            Err(e) => {
                self.error(format!("Error during fitting: {e}"));
                return;
            }
        };
        log::info!("Fit function: {}.", model.expression());

        let prepared = parse_values(&form.initial).and_then(|initial| {
            let bounds = parse_bounds(&form.lower, &form.upper, model.params().len())?;
            Ok((initial, bounds))
        });
        let (initial, bounds) = match prepared {
            Ok(p) => p,
            Err(e) => {
                self.error(format!("Error during fitting: {e}"));
                return;
            }
        };

        let range = (form.x_start, form.x_end);
        match curve_fit(&model, &x, &y, range, &initial, &bounds, &self.fit_options) {
            Ok(outcome) => {
                let curve = model.curve(range.0, range.1, self.fit_options.samples, &outcome.values());
                self.overlay(format!("Fit: {y_col} vs {x_col}"), curve);

                let summary = outcome.summary();
                log::info!(
                    "Fit converged on {} points after {} evaluations, SSR = {:.3e}.",
                    outcome.points,
                    outcome.evaluations,
                    outcome.ssr
                );
                log::info!("Fit results: {}.", summary.replace('\n', " "));
                self.fit_results.record(&outcome);
                self.info(
                    "Fit completed",
                    format!("The fitted parameters are:\n{summary}"),
                );
            }
            Err(e @ (FitError::EmptyRange | FitError::ParameterCount { .. })) => {
                self.error(e.to_string());
            }
            Err(e) => {
                self.error(format!("Error during fitting: {e}"));
                let curve = model.curve(range.0, range.1, self.fit_options.samples, &initial);
                self.overlay("initial guess curve".to_string(), curve);
            }
        }
    }

    // -- console --

    pub fn submit_console(&mut self) {
        self.console.submit(&mut self.fit_results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::processing::tests::open_loop_file;

    /// State with the open test loop loaded and its two branches selected.
    fn loop_state() -> AppState {
        let mut state = AppState::default();
        let file = open_loop_file();
        state.add_file(file.path, file.table);
        state.pairs = vec![
            SelectedPair {
                file: Some(0),
                x: Some("FieldUp".into()),
                y: Some("Up".into()),
            },
            SelectedPair {
                file: Some(0),
                x: Some("FieldDw".into()),
                y: Some("Down".into()),
            },
        ];
        state
    }

    fn last_notice(state: &AppState) -> &Notice {
        state.notices.back().expect("a notice")
    }

    #[test]
    fn first_file_gets_a_default_pair() {
        let mut state = AppState::default();
        let file = open_loop_file();
        state.add_file(file.path, file.table);
        assert_eq!(state.pairs.len(), 1);
        assert_eq!(state.pairs[0].x.as_deref(), Some("FieldUp"));
        assert_eq!(state.pairs[0].y.as_deref(), Some("Up"));
    }

    #[test]
    fn plot_without_data_is_an_error() {
        let mut state = AppState::default();
        state.create_plot();
        assert_eq!(last_notice(&state).message, "No data loaded!");
        assert!(state.plot.is_none());
    }

    #[test]
    fn plot_with_incomplete_pair_is_an_error() {
        let mut state = loop_state();
        state.pairs[1].y = None;
        state.create_plot();
        assert_eq!(
            last_notice(&state).message,
            "You must select all the column pairs!"
        );
    }

    #[test]
    fn normalize_rebuilds_an_open_plot() {
        let mut state = loop_state();
        state.create_plot();
        assert_eq!(state.plot_count, 1);
        state.normalize();
        assert!(state.notices.is_empty());
        assert_eq!(state.plot_count, 2);
        let up = state.files[0].table.column("Up").unwrap();
        assert!(up.iter().all(|v| v.abs() < 1.6));
    }

    #[test]
    fn close_loop_reports_success() {
        let mut state = loop_state();
        state.open_transform(TransformKind::CloseLoop);
        let dialog = state.transform_dialog.as_mut().unwrap();
        assert_eq!(dialog.file, Some(0));
        assert_eq!(dialog.columns.keys().collect::<Vec<_>>(), ["Down", "Up"]);
        dialog.columns.values_mut().for_each(|v| *v = true);

        state.apply_transform();
        let notice = last_notice(&state);
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(notice.title, "Success");
        assert_eq!(notice.message, "Operation applied to File 1!");
        assert!(state.transform_dialog.is_none());
    }

    #[test]
    fn close_loop_without_file_or_columns() {
        let mut state = loop_state();
        state.open_transform(TransformKind::CloseLoop);
        state.transform_dialog.as_mut().unwrap().file = None;
        state.apply_transform();
        assert_eq!(last_notice(&state).message, "You must select a file!");

        state.set_transform_file(0);
        state.apply_transform();
        assert_eq!(
            last_notice(&state).message,
            "Select the pair of columns that forms the loop"
        );
        assert!(state.transform_dialog.is_some());
    }

    #[test]
    fn invert_fields_offers_x_columns() {
        let mut state = loop_state();
        state.open_transform(TransformKind::InvertX);
        let dialog = state.transform_dialog.as_mut().unwrap();
        assert_eq!(
            dialog.columns.keys().collect::<Vec<_>>(),
            ["FieldDw", "FieldUp"]
        );
        dialog.columns.insert("FieldUp".into(), true);
        let before = state.files[0].table.column("FieldUp").unwrap()[0];
        state.apply_transform();
        assert_eq!(state.files[0].table.column("FieldUp").unwrap()[0], -before);
    }

    #[test]
    fn invert_needs_a_file_and_columns() {
        let mut state = loop_state();
        let columns = BTreeSet::from(["Up".to_string()]);
        assert!(!state.invert(None, &columns));
        assert_eq!(last_notice(&state).message, "You must select a file!");
        assert!(!state.invert(Some(0), &BTreeSet::new()));
        assert_eq!(
            last_notice(&state).message,
            "Select the pair of columns that forms the loop"
        );
        assert!(state.invert(Some(0), &columns));
    }

    #[test]
    fn style_requires_a_plot() {
        let mut state = loop_state();
        state.open_style_dialog();
        assert_eq!(
            last_notice(&state).message,
            "No plot open! Create a plot first."
        );
        assert!(state.style_form.is_none());

        state.create_plot();
        state.open_style_dialog();
        state.style_form.as_mut().unwrap().color = "red";
        state.apply_style();
        let red = named_color("red").unwrap();
        assert_eq!(state.customizations[&0].color, red);
        assert!(state.plot.as_ref().unwrap().curves.iter().all(|c| c.style.color == red));
    }

    #[test]
    fn successful_fit_records_results_and_overlay() {
        let mut state = loop_state();
        state.open_fit_window();
        state.fit_form.x_column = Some("FieldUp".into());
        state.fit_form.y_column = Some("FieldUp".into());
        state.fit_form.function = "a*(x - b)".into();
        state.fit_form.x_start = -1.0;
        state.fit_form.x_end = 1.0;
        state.run_fit();

        let notice = last_notice(&state);
        assert_eq!(notice.title, "Fit completed", "{}", notice.message);
        assert!((state.fit_results.get("a").unwrap() - 1.0).abs() < 1e-6);
        assert!(state.fit_results.get("b").unwrap().abs() < 1e-6);
        assert!(state.fit_results.get("error_a").is_some());
        let overlay = &state.plot.as_ref().unwrap().overlays[0];
        assert_eq!(overlay.name, "Fit: FieldUp vs FieldUp");
        assert_eq!(overlay.points.len(), 500);
    }

    #[test]
    fn failed_fit_draws_initial_guess() {
        let mut state = loop_state();
        state.open_fit_window();
        state.fit_form.x_start = -1.0;
        state.fit_form.x_end = -1.0;
        state.run_fit();

        let notice = last_notice(&state);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("Error during fitting:"), "{}", notice.message);
        let overlay = &state.plot.as_ref().unwrap().overlays[0];
        assert_eq!(overlay.name, "initial guess curve");
    }

    #[test]
    fn fit_with_empty_range_draws_nothing() {
        let mut state = loop_state();
        state.open_fit_window();
        state.fit_form.x_start = 5.0;
        state.fit_form.x_end = 6.0;
        state.run_fit();
        assert_eq!(last_notice(&state).message, "No data in the selected range!");
        assert!(state.plot.is_none());
    }

    #[test]
    fn console_sees_fit_results() {
        let mut state = loop_state();
        state.fit_results.set("hc", 4.0);
        state.console.input = "hc / 2".into();
        state.submit_console();
        assert_eq!(state.console.history.last().unwrap().text, "2");
    }
}
