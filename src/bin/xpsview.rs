//! xpsview - inspect, render and extract text from XPS documents

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tiny_skia::Pixmap;

use xpsview::{OutlineEntry, XpsFile};

#[derive(Parser)]
#[command(name = "xpsview")]
#[command(version, about = "Render and extract text from XPS and OpenXPS documents", long_about = None)]
#[command(after_help = "EXAMPLES:
    xpsview info report.xps                    Show metadata and page sizes
    xpsview render report.xps -p 1 -o p1.png   Render the first page
    xpsview render report.xps --dpi 150        Render every page
    xpsview text report.oxps > report.txt      Export plain text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show document metadata, page sizes and link targets
    Info {
        /// XPS or OpenXPS file
        input: PathBuf,
    },
    /// Render pages to PNG
    Render {
        input: PathBuf,

        /// Page to render, starting at 1 (default: every page)
        #[arg(short, long)]
        page: Option<usize>,

        /// Output file; with several pages the page number is appended
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Resolution, used when no pixel size is given
        #[arg(long, default_value_t = 96.0)]
        dpi: f32,

        /// Raster width in pixels
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Raster height in pixels
        #[arg(long, requires = "width")]
        height: Option<u32>,
    },
    /// Print the text of every page
    Text {
        input: PathBuf,

        /// Write to a file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the document outline
    Outline { input: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Info { input } => show_info(&input),
        Command::Render {
            input,
            page,
            output,
            dpi,
            width,
            height,
        } => render(&input, page, output, dpi, width.zip(height)),
        Command::Text { input, output } => export_text(&input, output),
        Command::Outline { input } => show_outline(&input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn show_info(path: &Path) -> xpsview::Result<()> {
    let doc = XpsFile::open(path)?;

    println!("File: {}", path.display());
    for (name, value) in doc.metadata()?.entries() {
        println!("{name}: {value}");
    }
    println!("Pages: {}", doc.page_count());
    for index in 0..doc.page_count() {
        let (w, h) = doc.page_size(index)?;
        println!("  {:>4}: {:.0} x {:.0} ({:.1} x {:.1} in)", index + 1, w, h, w / 96.0, h / 96.0);
    }

    let mut targets: Vec<&str> = doc.link_target_names().collect();
    targets.sort_unstable();
    if !targets.is_empty() {
        println!("Link targets: {}", targets.join(", "));
    }
    if doc.signature_origin().is_some() {
        println!("Signed: yes");
    }
    if let Some(thumbnail) = doc.thumbnail()? {
        println!("Thumbnail: {} bytes", thumbnail.len());
    }
    Ok(())
}

fn render(
    path: &Path,
    page: Option<usize>,
    output: Option<PathBuf>,
    dpi: f32,
    size: Option<(u32, u32)>,
) -> xpsview::Result<()> {
    let doc = XpsFile::open(path)?;

    let pages: Vec<usize> = match page {
        Some(0) => return Err(xpsview::Error::Other("pages are numbered from 1".to_string())),
        Some(n) => vec![n - 1],
        None => (0..doc.page_count()).collect(),
    };
    let base = output.unwrap_or_else(|| path.with_extension("png"));

    let rasters = render_pages(&doc, &pages, dpi, size);
    for (index, raster) in pages.iter().zip(rasters) {
        let target = if pages.len() == 1 {
            base.clone()
        } else {
            numbered(&base, index + 1)
        };
        raster?
            .save_png(&target)
            .map_err(|e| xpsview::Error::Other(format!("{}: {}", target.display(), e)))?;
        log::info!("wrote {}", target.display());
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn render_pages(doc: &XpsFile, pages: &[usize], dpi: f32, size: Option<(u32, u32)>) -> Vec<xpsview::Result<Arc<Pixmap>>> {
    use rayon::prelude::*;

    pages.par_iter().map(|&index| render_one(doc, index, dpi, size)).collect()
}

#[cfg(not(feature = "parallel"))]
fn render_pages(doc: &XpsFile, pages: &[usize], dpi: f32, size: Option<(u32, u32)>) -> Vec<xpsview::Result<Arc<Pixmap>>> {
    pages.iter().map(|&index| render_one(doc, index, dpi, size)).collect()
}

fn render_one(doc: &XpsFile, index: usize, dpi: f32, size: Option<(u32, u32)>) -> xpsview::Result<Arc<Pixmap>> {
    match size {
        Some((w, h)) => doc.render_page(index, w, h),
        None => doc.render_page_at_dpi(index, dpi),
    }
}

/// `out.png` becomes `out-3.png` for page 3.
fn numbered(base: &Path, number: usize) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("png");
    base.with_file_name(format!("{stem}-{number}.{ext}"))
}

fn export_text(path: &Path, output: Option<PathBuf>) -> xpsview::Result<()> {
    let doc = XpsFile::open(path)?;
    match output {
        Some(target) => doc.export_text_to(BufWriter::new(File::create(target)?)),
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            doc.export_text_to(&mut lock)?;
            writeln!(lock)?;
            Ok(())
        },
    }
}

fn show_outline(path: &Path) -> xpsview::Result<()> {
    let doc = XpsFile::open(path)?;
    if doc.outline().is_empty() {
        println!("(no outline)");
    }
    for entry in doc.outline() {
        print_entry(entry, 0);
    }
    Ok(())
}

fn print_entry(entry: &OutlineEntry, depth: usize) {
    let page = entry.page.map(|p| format!("  [page {}]", p + 1)).unwrap_or_default();
    println!("{:indent$}{}{}", "", entry.title, page, indent = depth * 2);
    for child in &entry.children {
        print_entry(child, depth + 1);
    }
}
