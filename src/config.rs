use std::path::PathBuf;

/// Default name of the merged document
pub const OUTPUT_FILE_NAME: &str = "smart_merged_doc.pdf";

/// Session settings shared by the CLI and the GUI
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    /// Scale of the thumbnails in the selection grid
    pub thumbnail_scale: f32,
    /// Scale of the full-page preview
    pub preview_scale: f32,
    /// Separator between keywords in the keyword input
    pub keyword_separator: char,
    pub output_file_name: String,
    /// Where the merged document is saved by default
    pub output_dir: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            thumbnail_scale: 0.3,
            preview_scale: 1.5,
            keyword_separator: ',',
            output_file_name: OUTPUT_FILE_NAME.to_string(),
            output_dir: default_output_dir(),
        }
    }
}

impl StudioConfig {
    /// Full path of the merged document
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }
}

/// The user's download directory, or the current directory when there is none
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}
