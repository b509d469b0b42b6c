use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use eframe::{egui, CreationContext};
use egui::{Context, Ui, ViewportCommand};
use log::{error, info, warn};
use rfd::FileDialog;

use super::theme::{apply_theme, Theme};
use super::thumbnails::{texture_points, SlotId, ThumbnailBoard};
use super::{file_panel, selection_grid, UiCommand};
use crate::config::StudioConfig;
use crate::model::{FileIdGenerator, SelectionEntry, SourceFile};
use crate::search::parse_keywords;
use crate::service;
use crate::state::{validate_search, Action, AppState};
use crate::thumbnail::ThumbnailRenderer;

/// The main application state
pub struct StudioApp {
    state: AppState,
    config: StudioConfig,
    ids: FileIdGenerator,

    // UI state
    keywords_input: String,
    preview: Option<SelectionEntry>,
    show_sidebar: bool,
    sidebar_width: f32,
    theme: Theme,

    thumbnails: ThumbnailBoard,

    // Outcomes of background work
    actions_tx: Sender<Action>,
    actions_rx: Receiver<Action>,
}

impl StudioApp {
    pub fn new(cc: &CreationContext) -> Self {
        super::theme::setup_custom_theme(&cc.egui_ctx);

        let (actions_tx, actions_rx) = mpsc::channel();
        Self {
            state: AppState::new(),
            config: StudioConfig::default(),
            ids: FileIdGenerator::new(),
            keywords_input: String::new(),
            preview: None,
            show_sidebar: true,
            sidebar_width: 280.0,
            theme: Theme::Light,
            thumbnails: ThumbnailBoard::new(ThumbnailRenderer::with_pdfium()),
            actions_tx,
            actions_rx,
        }
    }

    /// Run `task` on a worker thread and feed its action back into the state
    fn spawn_task<F>(&self, ctx: &Context, task: F)
    where
        F: FnOnce() -> Action + Send + 'static,
    {
        let tx = self.actions_tx.clone();
        let ctx = ctx.clone();
        thread::spawn(move || {
            if tx.send(task()).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    fn process_actions(&mut self) {
        while let Ok(action) = self.actions_rx.try_recv() {
            self.state.dispatch(action);
        }
    }

    fn handle(&mut self, ctx: &Context, command: UiCommand) {
        match command {
            UiCommand::Dispatch(action) => self.state.dispatch(action),
            UiCommand::OpenFiles => self.open_files(ctx),
            UiCommand::Search => self.start_search(ctx),
            UiCommand::Merge => self.start_merge(ctx),
            UiCommand::SaveMerged => self.save_merged(),
            UiCommand::Preview(entry) => self.preview = Some(entry),
        }
    }

    /// Pick PDFs and count their pages in the background, one task per file
    fn open_files(&mut self, ctx: &Context) {
        let Some(paths) = open_files_dialog() else {
            return;
        };

        let mut files = Vec::new();
        for path in paths {
            match SourceFile::read(self.ids.next_id(), &path) {
                Ok(file) => files.push(file),
                Err(e) => error!("Cannot read {}: {}", path.display(), e),
            }
        }
        if files.is_empty() {
            return;
        }

        for file in &files {
            let file = file.clone();
            self.spawn_task(ctx, move || match service::count_pages(&file) {
                Ok(total_pages) => Action::PageCountResolved {
                    file_id: file.id,
                    total_pages,
                },
                Err(error) => Action::PageCountFailed {
                    file_id: file.id,
                    error,
                },
            });
        }
        self.state.dispatch(Action::FilesAdded(files));
    }

    fn start_search(&mut self, ctx: &Context) {
        let keywords = parse_keywords(&self.keywords_input, self.config.keyword_separator);
        if let Err(input) = validate_search(self.state.files(), &keywords) {
            self.state.dispatch(Action::SearchRejected(input));
            return;
        }

        self.state.dispatch(Action::SearchStarted);
        self.preview = None;
        let files = self.state.files().to_vec();
        self.spawn_task(ctx, move || {
            Action::SearchFinished(service::search_keywords(&files, &keywords))
        });
    }

    fn start_merge(&mut self, ctx: &Context) {
        if self.state.selection().is_empty() || self.state.is_busy() {
            return;
        }

        self.state.dispatch(Action::MergeStarted);
        let files = self.state.files().to_vec();
        let selection = self.state.selection().to_vec();
        self.spawn_task(ctx, move || {
            Action::MergeFinished(service::merge_pages(&files, &selection))
        });
    }

    fn save_merged(&mut self) {
        let Some(reference) = self.state.artifact_ref() else {
            return;
        };
        let Some(path) = FileDialog::new()
            .set_directory(&self.config.output_dir)
            .set_file_name(self.config.output_file_name.as_str())
            .add_filter("PDF Files", &["pdf"])
            .save_file()
        else {
            return;
        };

        // The dialog is modal, so the artifact cannot have changed meanwhile
        let Some(bytes) = self.state.artifact_bytes(reference) else {
            warn!("Merged document is out of date; not saving");
            return;
        };
        match std::fs::write(&path, bytes) {
            Ok(()) => info!("Saved {} ({} bytes)", path.display(), bytes.len()),
            Err(e) => error!("Cannot save {}: {}", path.display(), e),
        }
    }

    /// Draw the top menu bar
    fn menu_bar(&mut self, ui: &mut Ui, ctx: &Context, commands: &mut Vec<UiCommand>) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Apri PDF...").clicked() {
                    commands.push(UiCommand::OpenFiles);
                    ui.close_menu();
                }
                let can_save = self.state.artifact().is_some();
                if ui
                    .add_enabled(can_save, egui::Button::new("Salva PDF unito..."))
                    .clicked()
                {
                    commands.push(UiCommand::SaveMerged);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Esci").clicked() {
                    ctx.send_viewport_cmd(ViewportCommand::Close);
                }
            });

            ui.menu_button("Vista", |ui| {
                if ui.checkbox(&mut self.show_sidebar, "Mostra barra laterale").clicked() {
                    ui.close_menu();
                }
                if ui.radio_value(&mut self.theme, Theme::Light, "Tema chiaro").clicked() {
                    apply_theme(ctx, self.theme);
                    ui.close_menu();
                }
                if ui.radio_value(&mut self.theme, Theme::Dark, "Tema scuro").clicked() {
                    apply_theme(ctx, self.theme);
                    ui.close_menu();
                }
            });
        });
    }

    /// Full-size view of one selected page
    fn show_preview(&mut self, ctx: &Context) {
        let Some(entry) = self.preview.clone() else {
            return;
        };
        let Some(file) = self.state.file(&entry.file_id).cloned() else {
            self.preview = None;
            return;
        };

        let mut open = true;
        let thumbnails = &mut self.thumbnails;
        let scale = self.config.preview_scale;
        egui::Window::new(format!("{} · Pagina {}", entry.file_name, entry.page_number()))
            .id(egui::Id::new("page_preview"))
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_size([640.0, 820.0])
            .show(ctx, |ui| {
                egui::ScrollArea::both().show(ui, |ui| {
                    if let Some(texture) =
                        thumbnails.texture(ctx, SlotId::Preview, &file, entry.page_index, scale)
                    {
                        let size = texture_points(ctx, &texture);
                        ui.add(egui::Image::new(&texture).fit_to_exact_size(size));
                    }
                });
            });

        if !open {
            self.preview = None;
        }
    }

    /// Release the textures of pages that are no longer displayed
    fn retain_thumbnails(&mut self) {
        let state = &self.state;
        let preview_open = self.preview.is_some();
        self.thumbnails.retain(|slot| match slot {
            SlotId::Card(file_id, page_index) => state.is_selected(file_id, *page_index),
            SlotId::Preview => preview_open,
        });
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.process_actions();
        self.thumbnails.poll(ctx);

        let mut commands = Vec::new();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.menu_bar(ui, ctx, &mut commands);
        });

        if self.show_sidebar {
            egui::SidePanel::left("sidebar")
                .resizable(true)
                .default_width(self.sidebar_width)
                .width_range(220.0..=420.0)
                .show(ctx, |ui| {
                    file_panel::show(ui, &self.state, &mut self.keywords_input, &mut commands);
                    self.sidebar_width = ui.available_width();
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            selection_grid::show(
                ui,
                &self.state,
                self.config.thumbnail_scale,
                &mut self.thumbnails,
                &mut commands,
            );
        });

        self.show_preview(ctx);

        for command in commands {
            self.handle(ctx, command);
        }
        self.retain_thumbnails();

        if self.thumbnails.has_pending() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

/// Open a file dialog for one or more PDFs
fn open_files_dialog() -> Option<Vec<PathBuf>> {
    FileDialog::new()
        .add_filter("PDF Files", &["pdf"])
        .pick_files()
}
