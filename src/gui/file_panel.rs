use egui::{Color32, Frame, RichText, TextEdit, Ui};
use egui_extras::{Column, TableBuilder};

use super::theme::{ACCENT, ERROR};
use super::utils::{format_file_size, truncate_string};
use super::UiCommand;
use crate::state::{Action, AppState};

/// Sidebar: loaded files, keyword input and the current message
pub fn show(ui: &mut Ui, state: &AppState, keywords_input: &mut String, commands: &mut Vec<UiCommand>) {
    ui.vertical_centered(|ui| {
        ui.heading("PDF Smart Studio");
    });
    ui.separator();

    ui.label(RichText::new("1. Caricamento").strong());
    if ui
        .add_enabled(!state.is_busy(), egui::Button::new("📂 Seleziona i PDF"))
        .clicked()
    {
        commands.push(UiCommand::OpenFiles);
    }
    ui.add_space(4.0);
    file_table(ui, state, commands);

    ui.add_space(12.0);
    ui.label(RichText::new("2. Filtro Contenuti").strong());
    ui.add(
        TextEdit::multiline(keywords_input)
            .hint_text("Parole chiave separate da virgola...")
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );

    ui.horizontal(|ui| {
        let search = egui::Button::new(RichText::new("🔍 Filtra Pagine").color(Color32::WHITE)).fill(ACCENT);
        if ui.add_enabled(!state.is_busy(), search).clicked() {
            commands.push(UiCommand::Search);
        }
        if state.is_busy() {
            ui.spinner();
        }
    });

    if let Some(message) = state.message() {
        ui.add_space(12.0);
        Frame::none()
            .fill(ERROR.linear_multiply(0.12))
            .stroke(egui::Stroke::new(1.0, ERROR))
            .rounding(6.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(RichText::new(message.to_string()).color(ERROR));
                    if ui.small_button("✖").clicked() {
                        commands.push(UiCommand::Dispatch(Action::DismissMessage));
                    }
                });
            });
    }
}

fn file_table(ui: &mut Ui, state: &AppState, commands: &mut Vec<UiCommand>) {
    if state.files().is_empty() {
        ui.label(RichText::new("Nessun file caricato").weak());
        return;
    }

    ui.push_id("file_table", |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::remainder())
            .column(Column::auto())
            .column(Column::auto())
            .body(|mut body| {
                for file in state.files() {
                    body.row(22.0, |mut row| {
                        row.col(|ui| {
                            ui.label(truncate_string(&file.name, 28)).on_hover_text(format!(
                                "{} ({})",
                                file.name,
                                format_file_size(file.bytes().len() as u64)
                            ));
                        });
                        row.col(|ui| {
                            if file.total_pages == 0 {
                                ui.spinner();
                            } else {
                                ui.label(format!("{} pag.", file.total_pages));
                            }
                        });
                        row.col(|ui| {
                            if ui.small_button("🗑").on_hover_text("Rimuovi file").clicked() {
                                commands.push(UiCommand::Dispatch(Action::RemoveFile(file.id.clone())));
                            }
                        });
                    });
                }
            });
    });
}
