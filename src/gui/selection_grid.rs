use egui::{Color32, Frame, RichText, ScrollArea, Sense, Ui, Vec2};

use super::theme::{ACCENT, SUCCESS};
use super::thumbnails::{texture_points, SlotId, ThumbnailBoard};
use super::utils::truncate_string;
use super::UiCommand;
use crate::model::SelectionEntry;
use crate::state::{Action, AppState};

const CARD_WIDTH: f32 = 170.0;
/// Placeholder aspect ratio (A4 portrait) until the page is rendered
const PAGE_RATIO: f32 = 1.414;

/// Central panel: the selected pages in merge order, plus the merge and
/// download controls
pub fn show(
    ui: &mut Ui,
    state: &AppState,
    thumbnail_scale: f32,
    board: &mut ThumbnailBoard,
    commands: &mut Vec<UiCommand>,
) {
    let selection = state.sorted_selection();

    ui.horizontal(|ui| {
        ui.heading("Anteprima Selezione");
        ui.label(RichText::new(format!("{} pagine", selection.len())).weak());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(!selection.is_empty(), egui::Button::new("Svuota Selezione"))
                .clicked()
            {
                commands.push(UiCommand::Dispatch(Action::ClearSelection));
            }
        });
    });
    ui.separator();

    if selection.is_empty() {
        empty_placeholder(ui);
        return;
    }

    ScrollArea::horizontal()
        .id_source("selection_scroll")
        .auto_shrink([false, true])
        .show(ui, |ui| {
            ui.horizontal_top(|ui| {
                for entry in &selection {
                    page_card(ui, state, entry, thumbnail_scale, board, commands);
                }
            });
        });

    ui.add_space(12.0);
    merge_controls(ui, state, commands);
}

fn empty_placeholder(ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.label(RichText::new("📄").size(48.0).weak());
        ui.label(RichText::new("Nessuna pagina selezionata").size(18.0).strong());
        ui.label(
            RichText::new("Carica dei PDF e filtra per parole chiave per iniziare.").weak(),
        );
    });
}

fn page_card(
    ui: &mut Ui,
    state: &AppState,
    entry: &SelectionEntry,
    thumbnail_scale: f32,
    board: &mut ThumbnailBoard,
    commands: &mut Vec<UiCommand>,
) {
    let Some(file) = state.file(&entry.file_id) else {
        return;
    };

    Frame::group(ui.style())
        .fill(ui.visuals().window_fill)
        .rounding(8.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                let slot = SlotId::Card(entry.file_id.clone(), entry.page_index);
                let texture = board.texture(ui.ctx(), slot, file, entry.page_index, thumbnail_scale);

                let clicked = match texture {
                    Some(texture) => {
                        let points = texture_points(ui.ctx(), &texture);
                        let size = points * (CARD_WIDTH / points.x.max(1.0));
                        let image = egui::Image::new(&texture)
                            .fit_to_exact_size(size)
                            .sense(Sense::click());
                        ui.add(image).on_hover_text("Clicca per ingrandire").clicked()
                    }
                    None => {
                        let size = Vec2::new(CARD_WIDTH, CARD_WIDTH * PAGE_RATIO);
                        let (rect, response) = ui.allocate_exact_size(size, Sense::click());
                        ui.painter().rect_filled(rect, 4.0, Color32::WHITE);
                        response.clicked()
                    }
                };
                if clicked {
                    commands.push(UiCommand::Preview(entry.clone()));
                }

                ui.label(
                    RichText::new(truncate_string(&entry.file_name, 24).to_uppercase())
                        .small()
                        .weak(),
                )
                .on_hover_text(entry.file_name.as_str());

                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("Pagina {}", entry.page_number())).strong());
                    if entry.is_manual {
                        ui.label(RichText::new("manuale").small().color(ACCENT));
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("−").on_hover_text("Rimuovi pagina").clicked() {
                            commands.push(UiCommand::Dispatch(Action::TogglePage {
                                file_id: entry.file_id.clone(),
                                page_index: entry.page_index,
                            }));
                        }
                    });
                });

                if let Some(keywords) = &entry.matched_keywords {
                    ui.label(RichText::new(keywords.join(", ")).small().color(ACCENT));
                }

                ui.horizontal(|ui| {
                    for (label, offset) in [("+ -1 pag", -1isize), ("+ +1 pag", 1)] {
                        if ui.small_button(label).clicked() {
                            commands.push(UiCommand::Dispatch(Action::AddNeighbor {
                                file_id: entry.file_id.clone(),
                                page_index: entry.page_index,
                                offset,
                            }));
                        }
                    }
                });
            });
        });
}

fn merge_controls(ui: &mut Ui, state: &AppState, commands: &mut Vec<UiCommand>) {
    ui.horizontal(|ui| {
        let label = if state.artifact().is_some() {
            "Rigenera Documento"
        } else {
            "Crea PDF Unificato"
        };
        let merge = egui::Button::new(RichText::new(label).color(Color32::WHITE)).fill(ACCENT);
        if ui.add_enabled(!state.is_busy(), merge).clicked() {
            commands.push(UiCommand::Merge);
        }

        if state.is_busy() {
            ui.spinner();
        }

        if let Some(artifact) = state.artifact() {
            let save = egui::Button::new(RichText::new("Scarica PDF").color(Color32::WHITE)).fill(SUCCESS);
            if ui.add(save).clicked() {
                commands.push(UiCommand::SaveMerged);
            }
            ui.label(RichText::new(format!("{} KB", artifact.bytes().len() / 1024)).weak());
        }
    });
}
