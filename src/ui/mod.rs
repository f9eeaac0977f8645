/// egui rendering.  Each function draws one part of the window and calls
/// the matching `AppState` operation when a widget is used.
pub mod console_window;
pub mod dialogs;
pub mod fit_window;
pub mod panels;
pub mod plot;
