mod app;
mod file_panel;
mod selection_grid;
mod theme;
mod thumbnails;
mod utils;

pub use app::StudioApp;
pub use thumbnails::{SlotId, ThumbnailBoard};

use crate::model::SelectionEntry;
use crate::state::Action;

/// What a panel asks the app to do in response to user input
#[derive(Debug)]
pub enum UiCommand {
    Dispatch(Action),
    OpenFiles,
    Search,
    Merge,
    SaveMerged,
    Preview(SelectionEntry),
}
