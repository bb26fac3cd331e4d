//! Controls above a table: search box, filter builder, sort menu and column toggles.

use std::collections::BTreeSet;

use beaute_business::table::{
    ColumnKind, FilterField, FilterFieldKind, FilterOption, FilterValue, TableHandle, ToolbarConfig,
};
use chrono::NaiveDate;
use egui::{Id, TextEdit, Ui};

const SEARCH_WIDTH: f32 = 220.0;
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn table_toolbar<T, H>(ui: &mut Ui, table: &mut H, config: ToolbarConfig, fields: &[FilterField])
where
    H: TableHandle<T> + ?Sized,
{
    ui.horizontal(|ui| {
        if config.search {
            let mut search = table.state().global_filter.clone();
            let response = ui.add(
                TextEdit::singleline(&mut search)
                    .hint_text("Search...")
                    .desired_width(SEARCH_WIDTH),
            );
            if response.changed() {
                table.set_global_filter(search);
            }
        }

        if config.filter && !fields.is_empty() {
            let active = table.state().column_filters.len();
            let label = match active {
                0 => "Filter".to_owned(),
                n => format!("Filter ({n})"),
            };
            ui.menu_button(label, |ui| filter_menu(ui, table, fields));
        }

        if config.sort {
            ui.menu_button("Sort", |ui| sort_menu(ui, table));
        }

        let has_filters = {
            let state = table.state();
            !state.column_filters.is_empty() || !state.global_filter.is_empty()
        };
        if has_filters && ui.button("Reset").clicked() {
            table.reset_filters();
        }

        if table.is_fetching() {
            ui.spinner();
        }

        if config.view_options {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.menu_button("View", |ui| view_menu(ui, table));
            });
        }
    });
}

fn filter_menu<T, H>(ui: &mut Ui, table: &mut H, fields: &[FilterField])
where
    H: TableHandle<T> + ?Sized,
{
    for field in fields {
        ui.label(field.label.as_str());
        let current = table.state().column_filters.get(&field.id).cloned();
        let next = match &field.kind {
            FilterFieldKind::Text => text_filter(ui, current),
            FilterFieldKind::Select(options) => select_filter(ui, current, options),
            FilterFieldKind::Date => date_filter(ui, field, current),
        };
        if let Some(value) = next {
            table.set_column_filter(field.id, value);
        }
        ui.separator();
    }
}

/// `Some(change)` when the editor changed the filter; the inner `None` removes it.
type FilterEdit = Option<Option<FilterValue>>;

fn text_filter(ui: &mut Ui, current: Option<FilterValue>) -> FilterEdit {
    let mut text = match current {
        Some(FilterValue::Text(text)) => text,
        _ => String::new(),
    };
    ui.text_edit_singleline(&mut text)
        .changed()
        .then(|| (!text.trim().is_empty()).then(|| FilterValue::Text(text)))
}

fn select_filter(ui: &mut Ui, current: Option<FilterValue>, options: &[FilterOption]) -> FilterEdit {
    let mut values = match current {
        Some(FilterValue::Values(values)) => values,
        _ => BTreeSet::new(),
    };
    let mut changed = false;
    for option in options {
        let mut checked = values.contains(&option.value);
        if ui.checkbox(&mut checked, option.label.as_str()).changed() {
            changed = true;
            if checked {
                values.insert(option.value.clone());
            } else {
                values.remove(&option.value);
            }
        }
    }
    changed.then(|| (!values.is_empty()).then_some(FilterValue::Values(values)))
}

/// Two `YYYY-MM-DD` boxes. Raw text lives in egui memory until it parses.
fn date_filter(ui: &mut Ui, field: &FilterField, current: Option<FilterValue>) -> FilterEdit {
    let (from, to) = match current {
        Some(FilterValue::DateRange { from, to }) => (from, to),
        _ => (None, None),
    };
    let mut next = (from, to);
    let mut changed = false;
    ui.horizontal(|ui| {
        changed |= date_box(ui, Id::new((field.id, "from")), "From", &mut next.0);
        changed |= date_box(ui, Id::new((field.id, "to")), "To", &mut next.1);
    });
    changed.then(|| match next {
        (None, None) => None,
        (from, to) => Some(FilterValue::DateRange { from, to }),
    })
}

fn date_box(ui: &mut Ui, id: Id, hint: &str, date: &mut Option<NaiveDate>) -> bool {
    let formatted = date
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    // Only half-typed text is remembered; anything valid is shown from the table state.
    let mut text = ui
        .data_mut(|data| data.get_temp::<String>(id))
        .filter(|raw| parse_date(raw).is_none())
        .unwrap_or(formatted);
    let response = ui.add(TextEdit::singleline(&mut text).hint_text(hint).desired_width(96.0));
    if !response.changed() {
        return false;
    }
    ui.data_mut(|data| data.insert_temp(id, text.clone()));
    let Some(parsed) = parse_date(&text) else {
        return false;
    };
    let changed = parsed != *date;
    *date = parsed;
    changed
}

/// `None` while the text is not a date yet; `Some(None)` for an empty box.
fn parse_date(text: &str) -> Option<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        Some(None)
    } else {
        NaiveDate::parse_from_str(text, DATE_FORMAT).ok().map(Some)
    }
}

fn sort_menu<T, H>(ui: &mut Ui, table: &mut H)
where
    H: TableHandle<T> + ?Sized,
{
    let sortable: Vec<_> = table
        .columns()
        .iter()
        .filter(|column| column.kind() == ColumnKind::Data && column.is_sortable())
        .map(|column| (column.id(), column.header().to_owned()))
        .collect();
    for (column, header) in sortable {
        let label = match table.state().sort_of(column) {
            Some((_, false)) => format!("{header} ▲"),
            Some((_, true)) => format!("{header} ▼"),
            None => header,
        };
        if ui.button(label).clicked() {
            let multi = ui.input(|input| input.modifiers.shift);
            table.toggle_sort(column, multi);
        }
    }
    if !table.state().sorting.is_empty() {
        ui.separator();
        if ui.button("Clear sorting").clicked() {
            table.set_sorting(Vec::new());
            ui.close();
        }
    }
}

fn view_menu<T, H>(ui: &mut Ui, table: &mut H)
where
    H: TableHandle<T> + ?Sized,
{
    ui.label("Toggle columns");
    let toggles: Vec<_> = table
        .columns()
        .iter()
        .filter(|column| column.is_hideable())
        .map(|column| (column.id(), column.header().to_owned()))
        .collect();
    for (column, header) in toggles {
        let mut visible = table.state().is_column_visible(column);
        if ui.checkbox(&mut visible, header).changed() {
            table.set_column_visible(column, visible);
        }
    }
}
