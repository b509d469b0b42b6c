//! PDF Smart Studio
//!
//! Load several PDFs, find the pages mentioning any of a set of keywords,
//! adjust the page selection by hand and merge the selected pages into one
//! new document.
//!
//! ```no_run
//! use pdfstudio::controller::Studio;
//! use std::path::{Path, PathBuf};
//!
//! let mut studio = Studio::default();
//! studio.load_files(&[PathBuf::from("a.pdf"), PathBuf::from("b.pdf")])?;
//! studio.search("invoice, contract");
//! if let Some(merged) = studio.merge() {
//!     studio.save_artifact(merged, Path::new("."))?;
//! }
//! # Ok::<(), pdfstudio::StudioError>(())
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod merge;
pub mod model;
pub mod search;
pub mod service;
pub mod state;
pub mod thumbnail;

#[cfg(feature = "gui")]
pub mod gui;

pub use error::{EmptyInput, Result, StudioError};
pub use model::{FileId, SelectionEntry, SourceFile};
