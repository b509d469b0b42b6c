use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::process;

use pdfstudio::config::{StudioConfig, OUTPUT_FILE_NAME};
use pdfstudio::controller::Studio;
use pdfstudio::extract::{self, collect_pdf_paths};
use pdfstudio::model::SelectionEntry;
use pdfstudio::service;
use pdfstudio::thumbnail::{PageRasterizer, PdfiumRasterizer};

#[derive(Parser)]
#[command(author, version, about = "Find pages by keyword across PDFs and merge them into one document")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the page count of every input PDF
    Pages {
        /// Input paths (directories or PDF files)
        #[arg(required = true)]
        input_paths: Vec<PathBuf>,
    },

    /// List the pages that contain any of the keywords
    Search {
        /// Comma separated keywords, matched case-insensitively
        #[arg(short, long)]
        keywords: String,

        /// Input paths (directories or PDF files)
        #[arg(required = true)]
        input_paths: Vec<PathBuf>,
    },

    /// Search, adjust the selection and merge the selected pages
    Merge {
        /// Comma separated keywords, matched case-insensitively
        #[arg(short, long)]
        keywords: String,

        /// Input paths (directories or PDF files)
        #[arg(required = true)]
        input_paths: Vec<PathBuf>,

        /// Output PDF file path
        #[arg(short, long, default_value = OUTPUT_FILE_NAME)]
        output: PathBuf,

        /// Also take the page before every match
        #[arg(long)]
        previous: bool,

        /// Also take the page after every match
        #[arg(long)]
        next: bool,

        /// Toggle a page by hand, as FILE_NAME:PAGE (1-based); repeatable
        #[arg(short, long, value_name = "FILE:PAGE")]
        toggle: Vec<String>,
    },

    /// Extract the text of every page to a file
    Extract {
        /// Output text file path
        output_file: PathBuf,

        /// Input paths (directories or PDF files)
        #[arg(required = true)]
        input_paths: Vec<PathBuf>,
    },

    /// Render one page to a PNG image
    Render {
        /// Input PDF file
        input: PathBuf,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Viewport scale
        #[arg(short, long, default_value_t = 1.5)]
        scale: f32,

        /// Pixel density of the output
        #[arg(short, long, default_value_t = 1.0)]
        density: f32,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pages { input_paths } => run_pages(&input_paths),
        Commands::Search { keywords, input_paths } => run_search(&keywords, &input_paths),
        Commands::Merge {
            keywords,
            input_paths,
            output,
            previous,
            next,
            toggle,
        } => run_merge(&keywords, &input_paths, &output, previous, next, &toggle),
        Commands::Extract { output_file, input_paths } => {
            extract::run(&output_file, &input_paths).map(|count| {
                println!(
                    "Successfully extracted text from {} PDFs to '{}'",
                    count,
                    output_file.display()
                );
            })
        }
        Commands::Render {
            input,
            page,
            scale,
            density,
            output,
        } => run_render(&input, page, scale, density, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Load every PDF found under the input paths into a fresh session
fn load_studio(input_paths: &[PathBuf], config: StudioConfig) -> Result<Studio> {
    let pdf_paths = collect_pdf_paths(input_paths);
    if pdf_paths.is_empty() {
        bail!("No PDF files found in the provided paths");
    }

    let mut studio = Studio::new(config);
    studio.load_files(&pdf_paths)?;
    if let Some(message) = studio.state().message() {
        eprintln!("Warning: {}", message);
    }
    Ok(studio)
}

fn run_pages(input_paths: &[PathBuf]) -> Result<()> {
    let studio = load_studio(input_paths, StudioConfig::default())?;

    let mut total = 0;
    for file in studio.state().files() {
        println!("{:>6}  {}", file.total_pages, file.name);
        total += file.total_pages;
    }
    println!("{:>6}  total", total);
    Ok(())
}

/// Search with a progress bar; a search that ends with a message is an error
fn search(studio: &mut Studio, keywords: &str) -> Result<()> {
    let pb = ProgressBar::new(studio.state().files().len() as u64);
    pb.set_message("Searching PDFs");
    studio.search_with(keywords, |_| pb.inc(1));
    pb.finish_and_clear();

    match studio.state().message() {
        Some(message) => Err(anyhow!("{}", message)),
        None => Ok(()),
    }
}

fn print_selection(selection: &[SelectionEntry]) {
    for entry in selection {
        let reason = match &entry.matched_keywords {
            Some(keywords) => keywords.join(", "),
            None => "manual".to_string(),
        };
        println!("{}  page {:>4}  [{}]", entry.file_name, entry.page_number(), reason);
    }
}

fn run_search(keywords: &str, input_paths: &[PathBuf]) -> Result<()> {
    let mut studio = load_studio(input_paths, StudioConfig::default())?;
    search(&mut studio, keywords)?;

    let selection = studio.state().sorted_selection();
    println!("\nFound {} matching pages:", selection.len());
    print_selection(&selection);
    Ok(())
}

fn run_merge(
    keywords: &str,
    input_paths: &[PathBuf],
    output: &Path,
    previous: bool,
    next: bool,
    toggles: &[String],
) -> Result<()> {
    let output_dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let config = StudioConfig {
        output_file_name: output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| OUTPUT_FILE_NAME.to_string()),
        output_dir,
        ..StudioConfig::default()
    };

    let mut studio = load_studio(input_paths, config)?;
    search(&mut studio, keywords)?;

    let offsets: Vec<isize> = [(previous, -1), (next, 1)]
        .into_iter()
        .filter_map(|(wanted, offset)| wanted.then_some(offset))
        .collect();
    for entry in studio.state().sorted_selection() {
        for &offset in &offsets {
            studio.add_neighbor(&entry.file_id, entry.page_index, offset);
        }
    }

    for toggle in toggles {
        let (name, page) = parse_toggle(toggle)?;
        let file_id = studio
            .state()
            .files()
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.id.clone())
            .ok_or_else(|| anyhow!("No loaded file named '{}'", name))?;
        studio.toggle_page(&file_id, page - 1);
    }

    let selection = studio.state().sorted_selection();
    if selection.is_empty() {
        bail!("Nothing left to merge");
    }
    print_selection(&selection);

    let merged = match studio.merge() {
        Some(merged) => merged,
        None => bail!(
            "{}",
            studio
                .state()
                .message()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Merge produced no document".to_string())
        ),
    };
    let path = studio.save_artifact(merged, &studio.config().output_dir)?;
    println!("Merged {} pages into '{}'", selection.len(), path.display());
    Ok(())
}

/// Parse `FILE_NAME:PAGE` with a 1-based page
fn parse_toggle(toggle: &str) -> Result<(&str, usize)> {
    let (name, page) = toggle
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Expected FILE:PAGE, got '{}'", toggle))?;
    let page: usize = page
        .parse()
        .with_context(|| format!("Invalid page number in '{}'", toggle))?;
    if page == 0 {
        bail!("Page numbers start at 1: '{}'", toggle);
    }
    Ok((name, page))
}

fn run_render(input: &Path, page: usize, scale: f32, density: f32, output: &Path) -> Result<()> {
    if page == 0 {
        bail!("Page numbers start at 1");
    }
    let mut studio = Studio::default();
    studio.load_files(&[input.to_path_buf()])?;
    let file = studio
        .state()
        .files()
        .first()
        .ok_or_else(|| anyhow!("Cannot read {}", input.display()))?;
    if !file.contains_page(page - 1) {
        bail!("{} has {} pages", file.name, service::count_pages(file)?);
    }

    let mut rasterizer = PdfiumRasterizer::bind()?;
    let surface = rasterizer.rasterize(file.bytes(), page - 1, scale, density)?;
    surface
        .image
        .save(output)
        .with_context(|| format!("Cannot write {}", output.display()))?;

    println!(
        "Rendered page {} of {} at {}x{} px to '{}'",
        page,
        file.name,
        surface.width(),
        surface.height(),
        output.display()
    );
    Ok(())
}
