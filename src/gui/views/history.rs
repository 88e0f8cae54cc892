use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::format::{format_bits, format_bits_signed};
use crate::gui::app::GuiApp;
use crate::history::Operation;

pub fn view_history(app: &mut GuiApp, ui: &mut egui::Ui) {
    let theme = app.theme;

    ui.add_space(theme.spacing_md);
    ui.heading("Bankroll history");
    ui.add_space(theme.spacing_md);

    if app.history_view.loading {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(
                egui::RichText::new("Loading history...").color(theme.text_secondary),
            );
        });
        return;
    }

    if let Some(err) = &app.history_view.error {
        ui.colored_label(theme.error, err);
        ui.add_space(theme.spacing_sm);
        if ui.add(theme.button_secondary("Retry")).clicked() {
            app.start_history_fetch();
        }
        return;
    }

    if app.history_view.entries.is_empty() {
        ui.label(
            egui::RichText::new("No bankroll activity yet.").color(theme.text_secondary),
        );
        return;
    }

    let entries = &app.history_view.entries;
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(160.0))
        .column(Column::auto().at_least(130.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(110.0))
        .column(Column::remainder())
        .header(24.0, |mut header| {
            for title in ["Time", "Bankroll at time", "Operation", "Amount", "Offsite"] {
                header.col(|ui| {
                    ui.label(
                        egui::RichText::new(title)
                            .strong()
                            .color(theme.text_secondary),
                    );
                });
            }
        })
        .body(|mut body| {
            for entry in entries {
                body.row(22.0, |mut row| {
                    row.col(|ui| {
                        ui.label(entry.created.format("%Y-%m-%d %H:%M:%S").to_string());
                    });
                    row.col(|ui| {
                        ui.label(format_bits(entry.pre_bankroll));
                    });
                    let operation = entry.operation();
                    let color = match operation {
                        Operation::Added => theme.success,
                        Operation::Removed => theme.warning,
                    };
                    row.col(|ui| {
                        ui.label(egui::RichText::new(operation.label()).color(color));
                    });
                    row.col(|ui| {
                        ui.label(
                            egui::RichText::new(format_bits_signed(entry.amount)).color(color),
                        );
                    });
                    row.col(|ui| {
                        ui.label(format_bits(entry.offsite));
                    });
                });
            }
        });
}
