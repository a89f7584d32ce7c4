//! CLI binary for service-grid.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs each model directory in turn and writes one
//! `<model>_Service_Mapping.json` per model.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use service_grid::pipeline::input::{classify_file_name, resolve_model_dir};
use service_grid::{
    extract_model, inspect, read_grid_file, write_grid_file, DocumentKind, ExtractionConfig,
    ExtractionOutput, ExtractionProgressCallback, ModelDirectory, PageSelection,
    ProgressCallback,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per document, reset when the next
/// document starts.
struct CliProgressCallback {
    bar: ProgressBar,
    page_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Locating forms…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, kind: DocumentKind, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix(kind.label().to_string());
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_documents: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_documents} form(s)…"))
        ));
    }

    fn on_document_start(&self, kind: DocumentKind, file_name: &str, total_pages: usize) {
        self.activate_bar(kind, total_pages);
        self.bar
            .println(format!("  {} {}", cyan("▸"), dim(file_name)));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, rows: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{rows:>3} rows")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.page_errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_document_complete(&self, kind: DocumentKind, items: usize) {
        self.bar.println(format!(
            "  {} {} form: {} items",
            green("✔"),
            kind,
            bold(&items.to_string())
        ));
    }

    fn on_extraction_complete(&self, _total_documents: usize, _total_items: usize) {
        self.bar.finish_and_clear();
        let errors = self.page_errors.swap(0, Ordering::SeqCst);
        if errors > 0 {
            eprintln!("{} {} page(s) could not be read", cyan("⚠"), red(&errors.to_string()));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One model directory (forms under <dir>/PDFs/)
  svcgrid Cars/Panamera/97ADS1

  # Every model of a range, into a custom directory
  svcgrid Cars/Panamera/* -o mappings/

  # A single form, printed as JSON with diagnostics
  svcgrid --kind inspection --json "97ADS1 Inspection.pdf"

  # List the forms that would be read
  svcgrid --inspect-only Cars/Panamera/97ADS1

  # Tune detection thresholds from a JSON file
  svcgrid --config thresholds.json Cars/Macan/95BAT1

INPUT LAYOUT:
  <model dir>/PDFs/*Oil maintenance*.pdf
  <model dir>/PDFs/*Inspection*.pdf
  (the model directory itself is searched when it has no PDFs/ folder)

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (else ./ then system paths)
  RUST_LOG                Override log filter (e.g. service_grid=debug)
"#;

/// Reconstruct maintenance-schedule grids from service-form PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "svcgrid",
    version,
    about = "Reconstruct maintenance-schedule grids from service-form PDFs",
    long_about = "Read the oil maintenance and inspection forms of each vehicle model and \
reconstruct which treatment lines apply to which model at which service interval, from \
text positions, checkbox widgets and rendered page colours.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Model directories, or PDF files when --kind is given or the file name
    /// names the form.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for `<model>_Service_Mapping.json` files.
    #[arg(short, long, env = "SVCGRID_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// Overwrite mappings that already exist (otherwise they are skipped).
    #[arg(short, long, env = "SVCGRID_FORCE")]
    force: bool,

    /// Form kind for PDF inputs: oil or inspection.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// JSON file with detection settings (thresholds, vocabulary).
    #[arg(long, env = "SVCGRID_CONFIG")]
    config: Option<PathBuf>,

    /// Render zoom factor (0.5–8).
    #[arg(long, env = "SVCGRID_ZOOM")]
    zoom: Option<f32>,

    /// Page selection per form: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "SVCGRID_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted forms.
    #[arg(long, env = "SVCGRID_PASSWORD")]
    password: Option<String>,

    /// Print the full result (grid + diagnostics) as JSON on stdout instead
    /// of writing mapping files.
    #[arg(long, env = "SVCGRID_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SVCGRID_NO_PROGRESS")]
    no_progress: bool,

    /// List the forms and page counts only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SVCGRID_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SVCGRID_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Oil,
    Inspection,
}

impl From<KindArg> for DocumentKind {
    fn from(v: KindArg) -> Self {
        match v {
            KindArg::Oil => DocumentKind::OilMaintenance,
            KindArg::Inspection => DocumentKind::Inspection,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        for input in &cli.inputs {
            let docs = inspect(input)
                .await
                .with_context(|| format!("Failed to inspect {}", input.display()))?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&docs).context("Failed to serialise forms")?
                );
                continue;
            }
            println!("Model:  {}", input.display());
            for d in &docs {
                println!(
                    "  {:<16} {:>3} pages  {}",
                    d.kind.label(),
                    d.page_count,
                    d.path.display()
                );
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run each input ───────────────────────────────────────────────────
    let mut failed = 0usize;
    for input in &cli.inputs {
        if let Err(e) = run_input(&cli, input, &config).await {
            failed += 1;
            eprintln!("{} {}: {:#}", red("✘"), input.display(), e);
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} input(s) failed", cli.inputs.len());
    }
    Ok(())
}

async fn run_input(cli: &Cli, input: &Path, config: &ExtractionConfig) -> Result<()> {
    let model = if input.is_dir() {
        resolve_model_dir(input)?
    } else {
        let kind = match cli.kind {
            Some(k) => k.into(),
            None => {
                let name = input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                classify_file_name(&name).with_context(|| {
                    format!("Cannot tell the form kind of '{}'; pass --kind", input.display())
                })?
            }
        };
        ModelDirectory::single(input, kind)?
    };
    let target = cli
        .output_dir
        .join(format!("{}_Service_Mapping.json", model.model_name()));

    if !cli.json && !cli.force && target.exists() {
        let existing = read_grid_file(&target).await?;
        if !cli.quiet {
            eprintln!(
                "{} {} exists ({} services, {} items), skipping; use --force to rebuild",
                dim("·"),
                target.display(),
                existing.len(),
                existing.total_items()
            );
        }
        return Ok(());
    }

    let output = extract_model(model, config).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        write_grid_file(&output.services, &target).await?;
    }

    if !cli.quiet {
        print_summary(&output, (!cli.json).then_some(target.as_path()));
    }
    Ok(())
}

fn print_summary(output: &ExtractionOutput, written: Option<&Path>) {
    let summary = output.summary();
    eprintln!("{}", bold(&output.metadata.model_dir.display().to_string()));
    for line in summary.to_string().lines() {
        eprintln!("  {line}");
    }
    let failed = output.failed_pages();
    eprintln!(
        "{}  {}ms{}",
        if failed == 0 { green("✔") } else { cyan("⚠") },
        output.total_duration_ms,
        written
            .map(|p| format!("  →  {}", bold(&p.display().to_string())))
            .unwrap_or_default(),
    );
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let base = match cli.config {
        Some(ref path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            serde_json::from_str::<ExtractionConfig>(&text)
                .with_context(|| format!("Invalid config file {:?}", path))?
        }
        None => ExtractionConfig::default(),
    };

    let mut builder = ExtractionConfig::builder()
        .zoom(cli.zoom.unwrap_or(base.zoom))
        .pages(parse_pages(&cli.pages)?)
        .zones(base.zones)
        .bullet(base.bullet)
        .widget(base.widget)
        .columns(base.columns)
        .rows(base.rows)
        .vocabulary(base.vocabulary);

    if let Some(pwd) = cli.password.clone().or(base.password) {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
