//! Grid renderer for any [`TableHandle`].
//!
//! The table is projected into a [`TableView`] first, drawn with `egui_extras`, and
//! clicks are collected as [`TableEvent`]s that are applied once drawing is done.

use beaute_business::table::{
    CellValue, ColumnKind, HeaderCell, RowActionKind, RowId, RowMenuItem, TableBody,
    TableHandle, TableView, ViewCell,
};
use egui::{Button, Checkbox, Frame, Margin, RichText, Sense, Stroke, Ui, vec2};
use egui_extras::{Column, TableBuilder};
use log::warn;
use ustr::Ustr;

use crate::utils::colors::{
    COLOR_GRAY, COLOR_GREEN, COLOR_RED, HEADER_BG_COLOR, TABLE_BORDER_COLOR,
};

pub const ROW_HEIGHT: f32 = 32.0;
pub const HEADER_HEIGHT: f32 = 28.0;
const CHECKBOX_WIDTH: f32 = 32.0;
const ACTIONS_WIDTH: f32 = 48.0;
/// Opacity of rows that are being refreshed.
const DIMMED_OPACITY: f32 = 0.5;

/// A click inside the grid, applied after rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    Sort { column: Ustr, multi: bool },
    ToggleRow(RowId),
    TogglePage(bool),
    Activate {
        column: Ustr,
        row: RowId,
        kind: RowActionKind,
    },
}

/// Draws `table` and applies the clicks it received. Returns the view that was drawn.
pub fn data_table<T, H>(ui: &mut Ui, id_salt: &str, table: &mut H, empty_message: &str) -> TableView
where
    H: TableHandle<T> + ?Sized,
    T: Clone,
{
    let view = TableView::project(table, empty_message);
    let events = render_table(ui, id_salt, &view);
    if !events.is_empty() {
        apply_events(table, events);
        ui.ctx().request_repaint();
    }
    view
}

/// Applies `events` in order.
pub fn apply_events<T, H>(table: &mut H, events: Vec<TableEvent>)
where
    H: TableHandle<T> + ?Sized,
    T: Clone,
{
    for event in events {
        match event {
            TableEvent::Sort { column, multi } => table.toggle_sort(column, multi),
            TableEvent::ToggleRow(id) => table.toggle_row(id),
            TableEvent::TogglePage(selected) => table.toggle_all_page_rows(selected),
            TableEvent::Activate { column, row, kind } => {
                match (table.column(column), table.row(row)) {
                    (Some(def), Some(value)) => def.activate(value, row, kind),
                    _ => warn!("row action {kind:?} for unknown row {row} or column {column}"),
                }
            }
        }
    }
}

fn render_table(ui: &mut Ui, id_salt: &str, view: &TableView) -> Vec<TableEvent> {
    let mut events = Vec::new();

    Frame::NONE
        .stroke(Stroke::new(1.0, TABLE_BORDER_COLOR))
        .inner_margin(Margin::ZERO)
        .show(ui, |ui| {
            if view.dimmed {
                ui.multiply_opacity(DIMMED_OPACITY);
            }
            if let TableBody::Skeleton { rows, columns } = view.body {
                render_skeleton(ui, id_salt, rows, columns);
                return;
            }

            let mut builder = TableBuilder::new(ui)
                .id_salt(id_salt)
                .striped(true)
                .resizable(false)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
            for header in &view.headers {
                builder = builder.column(column_for(header));
            }

            builder
                .header(HEADER_HEIGHT, |mut row| {
                    for header in &view.headers {
                        row.col(|ui| render_header_cell(ui, header, view, &mut events));
                    }
                })
                .body(|mut body| match &view.body {
                    TableBody::Skeleton { .. } => {}
                    TableBody::Empty(message) => {
                        body.row(ROW_HEIGHT, |mut row| {
                            for (index, _) in view.headers.iter().enumerate() {
                                row.col(|ui| {
                                    if index == 0 {
                                        ui.weak(message.as_str());
                                    }
                                });
                            }
                        });
                    }
                    TableBody::Rows(rows) => {
                        for view_row in rows {
                            body.row(ROW_HEIGHT, |mut row| {
                                row.set_selected(view_row.selected);
                                for (cell, header) in view_row.cells.iter().zip(&view.headers) {
                                    row.col(|ui| {
                                        render_cell(ui, view_row.id, header.column, cell, &mut events);
                                    });
                                }
                            });
                        }
                    }
                });
        });

    events
}

fn column_for(header: &HeaderCell) -> Column {
    match header.kind {
        ColumnKind::Select => Column::exact(CHECKBOX_WIDTH),
        ColumnKind::Actions => Column::exact(ACTIONS_WIDTH),
        ColumnKind::RowNumber => Column::exact(header.width.max(40.0)),
        ColumnKind::Data => Column::initial(header.width).at_least(60.0).clip(true),
    }
}

fn render_header_cell(ui: &mut Ui, header: &HeaderCell, view: &TableView, events: &mut Vec<TableEvent>) {
    Frame::NONE
        .fill(HEADER_BG_COLOR)
        .inner_margin(Margin::symmetric(4, 2))
        .show(ui, |ui| match header.kind {
            ColumnKind::Select => {
                let mut all = view.all_page_selected;
                let checkbox = Checkbox::without_text(&mut all).indeterminate(view.some_page_selected);
                if ui.add(checkbox).on_hover_text("Select page").clicked() {
                    events.push(TableEvent::TogglePage(all));
                }
            }
            _ if header.sortable => {
                let text = format!("{}{}", header.label, sort_indicator(header.sort));
                let response = ui.add(Button::new(RichText::new(text).strong()).frame(false));
                if response.clicked() {
                    let multi = ui.input(|input| input.modifiers.shift);
                    events.push(TableEvent::Sort {
                        column: header.column,
                        multi,
                    });
                }
            }
            _ => {
                ui.strong(header.label.as_str());
            }
        });
}

fn sort_indicator(sort: Option<(usize, bool)>) -> String {
    match sort {
        None => String::new(),
        Some((0, desc)) => format!(" {}", arrow(desc)),
        Some((priority, desc)) => format!(" {}{}", arrow(desc), priority + 1),
    }
}

fn arrow(desc: bool) -> &'static str {
    if desc { "▼" } else { "▲" }
}

fn render_cell(ui: &mut Ui, id: RowId, column: Ustr, cell: &ViewCell, events: &mut Vec<TableEvent>) {
    match cell {
        ViewCell::Checkbox(selected) => {
            let mut checked = *selected;
            if ui.add(Checkbox::without_text(&mut checked)).clicked() {
                events.push(TableEvent::ToggleRow(id));
            }
        }
        ViewCell::RowNumber(number) => {
            ui.label(RichText::new(number.to_string()).monospace());
        }
        ViewCell::Value(value) => render_value(ui, value),
        ViewCell::Actions(items) => {
            if let Some(kind) = row_menu(ui, items) {
                events.push(TableEvent::Activate { column, row: id, kind });
            }
        }
    }
}

fn render_value(ui: &mut Ui, value: &CellValue) {
    match value {
        CellValue::Empty => {
            ui.weak(value.display());
        }
        CellValue::Status { label, active } => {
            let color = if *active { COLOR_GREEN } else { COLOR_GRAY };
            Frame::NONE
                .stroke(Stroke::new(1.0, color))
                .corner_radius(8.0)
                .inner_margin(Margin::symmetric(6, 1))
                .show(ui, |ui| {
                    ui.label(RichText::new(label.as_str()).small().color(color));
                });
        }
        other => {
            ui.label(other.display());
        }
    }
}

fn row_menu(ui: &mut Ui, items: &[RowMenuItem]) -> Option<RowActionKind> {
    let mut chosen = None;
    ui.menu_button("⋯", |ui| {
        for item in items {
            if item.separator_before {
                ui.separator();
            }
            let text = if item.destructive {
                RichText::new(item.label.as_str()).color(COLOR_RED)
            } else {
                RichText::new(item.label.as_str())
            };
            if ui.button(text).clicked() {
                chosen = Some(item.kind);
                ui.close();
            }
        }
    })
    .response
    .on_hover_text("Open menu");
    chosen
}

/// Fixed placeholder grid; it does not follow the real column layout.
fn render_skeleton(ui: &mut Ui, id_salt: &str, rows: usize, columns: usize) {
    let mut builder = TableBuilder::new(ui)
        .id_salt(id_salt)
        .striped(true)
        .resizable(false)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
    for _ in 0..columns {
        builder = builder.column(Column::remainder());
    }
    builder
        .header(HEADER_HEIGHT, |mut row| {
            for _ in 0..columns {
                row.col(skeleton_bar);
            }
        })
        .body(|mut body| {
            for _ in 0..rows {
                body.row(ROW_HEIGHT, |mut row| {
                    for _ in 0..columns {
                        row.col(skeleton_bar);
                    }
                });
            }
        });
}

fn skeleton_bar(ui: &mut Ui) {
    let width = (ui.available_width() * 0.8).max(8.0);
    let (rect, _) = ui.allocate_exact_size(vec2(width, 12.0), Sense::hover());
    ui.painter().rect_filled(rect, 4.0, HEADER_BG_COLOR);
}

#[cfg(test)]
mod tests {
    use beaute_business::table::{ClientTable, ColumnDef, InitialTableState, RowKey};
    use egui_kittest::Harness;
    use kittest::Queryable;

    use super::*;

    #[derive(Clone)]
    struct Serum {
        id: u64,
        name: &'static str,
    }

    impl RowKey for Serum {
        fn row_key(&self) -> Option<RowId> {
            Some(RowId::from(self.id))
        }
    }

    fn serums() -> ClientTable<Serum> {
        let mut table = ClientTable::new(
            vec![
                ColumnDef::select(),
                ColumnDef::data("name", "Name", |s: &Serum| CellValue::text(s.name)),
            ],
            InitialTableState::default(),
        );
        table.set_data(vec![Serum {
            id: 1,
            name: "Niacinamide",
        }]);
        table
    }

    #[test]
    fn loading_table_draws_placeholders_instead_of_columns() {
        let mut table = serums();
        table.set_loading(true);
        let harness = Harness::new_ui_state(
            |ui, table: &mut ClientTable<Serum>| {
                data_table(ui, "serums", table, "No serums.");
            },
            table,
        );

        assert!(harness.query_by_label_contains("Name").is_none());
        assert!(harness.query_by_label_contains("Niacinamide").is_none());
        assert!(harness.query_by_label_contains("No serums.").is_none());
    }

    #[test]
    fn loaded_table_draws_headers_and_rows() {
        let harness = Harness::new_ui_state(
            |ui, table: &mut ClientTable<Serum>| {
                data_table(ui, "serums", table, "No serums.");
            },
            serums(),
        );

        assert!(harness.query_by_label_contains("Name").is_some());
        assert!(harness.query_by_label("Niacinamide").is_some());
    }

    #[test]
    fn secondary_sort_rules_show_their_priority() {
        assert_eq!(sort_indicator(None), "");
        assert_eq!(sort_indicator(Some((0, false))), " ▲");
        assert_eq!(sort_indicator(Some((1, true))), " ▼2");
    }
}
