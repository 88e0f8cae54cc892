use eframe::egui;

use crate::divest::{parse_amount, DivestPhase};
use crate::format::format_bits;
use crate::gui::app::{GuiApp, SubmitClick};

pub fn view_withdraw(app: &mut GuiApp, ui: &mut egui::Ui) {
    let theme = app.theme;
    let mirror = app.mirror.borrow().clone();
    let phase = app.withdraw_view.phase();
    let busy = phase != DivestPhase::Idle;
    let below_floor = mirror.user_share() < app.config.min_divest;
    let min_divest = app.config.min_divest;

    ui.add_space(theme.spacing_md);
    ui.heading("Remove from bankroll");
    ui.add_space(theme.spacing_md);

    let mut clicked = None;

    theme.frame_panel().show(ui, |ui| {
        let state = &mut app.withdraw_view;

        if let Some(err) = &state.amount_error {
            ui.colored_label(theme.error, err.to_string());
            ui.add_space(theme.spacing_sm);
        }

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Amount:").color(theme.text_secondary));
            let response = ui.add_enabled(
                !busy && !below_floor,
                egui::TextEdit::singleline(&mut state.amount).desired_width(180.0),
            );
            if state.wants_focus {
                response.request_focus();
                state.wants_focus = false;
            }
            if response.changed() && state.touched {
                state.amount_error = parse_amount(&state.amount, min_divest).err();
            }
            ui.label(
                egui::RichText::new("bits (enter * to withdraw everything)")
                    .small()
                    .color(theme.text_secondary),
            );
        });

        if state.advanced {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Offsite:").color(theme.text_secondary));
                ui.add_enabled(
                    !busy,
                    egui::TextEdit::singleline(&mut state.offsite).desired_width(180.0),
                );
                ui.label(
                    egui::RichText::new("bits held off-site")
                        .small()
                        .color(theme.text_secondary),
                );
            });
        } else if ui.link("Show advanced").clicked() {
            state.advanced = true;
        }

        ui.add_space(theme.spacing_md);

        let submit_text = match phase {
            DivestPhase::Idle => "Submit",
            DivestPhase::Submitting => "Submitting...",
            DivestPhase::Blocking => "Please wait for the current game to end",
        };
        if ui
            .add_enabled(!busy && !below_floor, theme.button_primary(submit_text))
            .clicked()
        {
            clicked = Some(SubmitClick::Form);
        }

        if phase == DivestPhase::Blocking {
            ui.add_space(theme.spacing_sm);
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(
                    egui::RichText::new("The request will be retried when the game ends.")
                        .small()
                        .color(theme.text_secondary),
                );
            });
        }

        if below_floor {
            ui.add_space(theme.spacing_sm);
            ui.label(
                egui::RichText::new(format!(
                    "Your share of the bankroll is below the {} bits minimum.",
                    format_bits(min_divest)
                ))
                .color(theme.warning),
            );
        }
    });

    if !busy {
        ui.add_space(theme.spacing_lg);
        ui.separator();
        ui.add_space(theme.spacing_sm);
        if ui
            .add_enabled(mirror.stake != 0.0, theme.button_warning("Remove all"))
            .clicked()
        {
            clicked = Some(SubmitClick::All);
        }
    }

    if let Some(click) = clicked {
        app.start_divest(click);
    }
}
