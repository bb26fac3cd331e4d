//! Footer under a table: row counters, page size and page navigation.

use beaute_business::table::{PaginationInfo, TableHandle};
use egui::{Button, ComboBox, Ui};

pub const PAGE_SIZES: [usize; 5] = [10, 20, 30, 40, 50];

pub fn pagination_footer<T, H>(ui: &mut Ui, id_salt: &str, table: &mut H)
where
    H: TableHandle<T> + ?Sized,
{
    let info = table.pagination_info();
    let selected = table.state().row_selection.len();

    ui.horizontal(|ui| {
        ui.label(showing_label(&info));
        if selected > 0 {
            ui.weak(format!("({selected} selected)"));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(table.can_next_page(), Button::new("»"))
                .on_hover_text("Last page")
                .clicked()
            {
                table.last_page();
            }
            if ui
                .add_enabled(table.can_next_page(), Button::new("›"))
                .on_hover_text("Next page")
                .clicked()
            {
                table.next_page();
            }
            ui.label(format!(
                "Page {} of {}",
                info.current_page,
                info.page_count.max(1)
            ));
            if ui
                .add_enabled(table.can_previous_page(), Button::new("‹"))
                .on_hover_text("Previous page")
                .clicked()
            {
                table.previous_page();
            }
            if ui
                .add_enabled(table.can_previous_page(), Button::new("«"))
                .on_hover_text("First page")
                .clicked()
            {
                table.first_page();
            }

            let mut page_size = info.page_size;
            ComboBox::from_id_salt((id_salt, "page_size"))
                .selected_text(page_size.to_string())
                .width(56.0)
                .show_ui(ui, |ui| {
                    for size in PAGE_SIZES {
                        ui.selectable_value(&mut page_size, size, size.to_string());
                    }
                });
            if page_size != info.page_size {
                table.set_page_size(page_size);
            }
            ui.label("Rows per page");
        });
    });
}

fn showing_label(info: &PaginationInfo) -> String {
    format!(
        "Showing {} to {} of {} entries",
        info.start_row, info.end_row, info.total_count
    )
}
