use eframe::egui;

use crate::format::format_bits;
use crate::gui::app::{GuiApp, GuiSection};

pub fn view_home(app: &mut GuiApp, ui: &mut egui::Ui) {
    let theme = app.theme;
    let mirror = app.mirror.borrow().clone();

    ui.add_space(theme.spacing_md);
    ui.heading("Bankroll");
    ui.add_space(theme.spacing_md);

    theme.frame_panel().show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Site bankroll:")
                    .color(theme.text_secondary),
            );
            ui.label(
                egui::RichText::new(format!("{} bits", format_bits(mirror.bankroll)))
                    .strong()
                    .color(theme.text_primary),
            );
        });
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Your stake:")
                    .color(theme.text_secondary),
            );
            ui.label(
                egui::RichText::new(format!("{:.4}%", mirror.stake * 100.0))
                    .strong()
                    .color(theme.text_primary),
            );
        });
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("Your share:")
                    .color(theme.text_secondary),
            );
            ui.label(
                egui::RichText::new(format!("{} bits", format_bits(mirror.user_share())))
                    .strong()
                    .color(theme.primary),
            );
        });
    });

    ui.add_space(theme.spacing_lg);

    let mut target = None;
    ui.horizontal(|ui| {
        if ui.add(theme.button_primary("View history")).clicked() {
            target = Some(GuiSection::History);
        }
        if ui
            .add(theme.button_warning("Remove from bankroll"))
            .clicked()
        {
            target = Some(GuiSection::RemoveFromBankroll);
        }
    });
    if let Some(section) = target {
        app.set_section(section);
    }
}
