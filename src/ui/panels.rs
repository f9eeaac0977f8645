use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::file_label;
use crate::state::{AppState, TransformKind};

// ---------------------------------------------------------------------------
// Shared selectors
// ---------------------------------------------------------------------------

/// Combo box over the loaded files.  Returns the newly chosen index.
pub fn file_combo(
    ui: &mut Ui,
    id: impl std::hash::Hash,
    n_files: usize,
    current: Option<usize>,
) -> Option<usize> {
    let mut chosen = None;
    let text = current.map(file_label).unwrap_or_default();
    egui::ComboBox::from_id_salt(id)
        .selected_text(text)
        .width(70.0)
        .show_ui(ui, |ui: &mut Ui| {
            for i in 0..n_files {
                if ui.selectable_label(current == Some(i), file_label(i)).clicked() {
                    chosen = Some(i);
                }
            }
        });
    chosen
}

/// Combo box over `columns`, writing the choice into `current`.
pub fn column_combo(
    ui: &mut Ui,
    id: impl std::hash::Hash,
    columns: &[String],
    current: &mut Option<String>,
) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.clone().unwrap_or_default())
        .width(90.0)
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                if ui
                    .selectable_label(current.as_deref() == Some(col.as_str()), col)
                    .clicked()
                {
                    *current = Some(col.clone());
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Left side panel – pair selector and transforms
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Column pairs");
    ui.separator();

    if state.files.is_empty() {
        ui.label("No data loaded.");
        return;
    }

    // Column lists per file, so the rows can mutate `state.pairs`.
    let columns: Vec<Vec<String>> = state
        .files
        .iter()
        .map(|f| f.table.column_names())
        .collect();
    let mut file_change = None;
    let mut remove = None;

    ScrollArea::vertical()
        .id_salt("pairs")
        .max_height(ui.available_height() * 0.6)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            for (i, pair) in state.pairs.iter_mut().enumerate() {
                if i % 2 == 0 {
                    ui.label(RichText::new(format!("Cycle {}", i / 2 + 1)).strong());
                }
                ui.horizontal(|ui: &mut Ui| {
                    if let Some(file) = file_combo(ui, ("pair_file", i), columns.len(), pair.file) {
                        file_change = Some((i, file));
                    }
                    let names = pair
                        .file
                        .and_then(|f| columns.get(f))
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    column_combo(ui, ("pair_x", i), names, &mut pair.x);
                    column_combo(ui, ("pair_y", i), names, &mut pair.y);
                    if ui.small_button("✖").on_hover_text("Remove pair").clicked() {
                        remove = Some(i);
                    }
                });
            }
        });

    if let Some((i, file)) = file_change {
        state.set_pair_file(i, file);
    }
    if let Some(i) = remove {
        state.remove_pair(i);
    }

    if ui.button("Add pair").clicked() {
        state.add_pair();
    }
    ui.separator();

    ui.strong("Transforms");
    if ui.button("Normalize").clicked() {
        state.normalize();
    }
    if ui.button("Close loop…").clicked() {
        state.open_transform(TransformKind::CloseLoop);
    }
    if ui.button("Invert fields…").clicked() {
        state.open_transform(TransformKind::InvertX);
    }
    if ui.button("Invert y axis…").clicked() {
        state.open_transform(TransformKind::InvertY);
    }
    ui.separator();

    ui.strong("Loaded files");
    for (i, file) in state.files.iter().enumerate() {
        ui.label(format!("{}: {}", file_label(i), file.file_name()))
            .on_hover_text(file.path.display().to_string());
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.add_enabled_ui(!state.files.is_empty(), |ui: &mut Ui| {
                ui.menu_button("Save as CSV…", |ui: &mut Ui| {
                    for i in 0..state.files.len() {
                        if ui.button(file_label(i)).clicked() {
                            save_file_dialog(state, i);
                            ui.close_menu();
                        }
                    }
                });
            });
        });

        ui.separator();

        if ui.button("Create plot").clicked() {
            state.create_plot();
        }
        if ui.button("Customize style").clicked() {
            state.open_style_dialog();
        }
        if ui.button("Curve fitting").clicked() {
            state.open_fit_window();
        }
        if ui.selectable_label(state.show_console, "Console").clicked() {
            state.show_console = !state.show_console;
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().weak_text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open hysteresis data")
        .add_filter(
            "Supported files",
            &["csv", "txt", "dat", "tsv", "json", "parquet", "pq"],
        )
        .add_filter("Text tables", &["csv", "txt", "dat", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_files();

    for path in files.unwrap_or_default() {
        state.load_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState, index: usize) {
    let stem = state
        .files
        .get(index)
        .and_then(|f| f.path.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "loop".to_string());
    let path = rfd::FileDialog::new()
        .set_title("Save as CSV")
        .set_file_name(format!("{stem}_processed.csv"))
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = path {
        state.save_file(index, &path);
    }
}
