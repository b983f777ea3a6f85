use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vibereport::branding::{logo_source, BrandingCache};
use vibereport::render::Image;
use vibereport::report::{self, Mode};
use vibereport::serve::{self, ServeContext};
use vibereport::{LayoutMetrics, MachineRecord, RandomSynthesizer, ReportError, Synthesizer};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "vibereport")]
#[command(author, version, about = "Render paginated vibration-health reports for machines and their bearings")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Layout metrics file (.toml, .json, .yaml); env VIBEREPORT_LAYOUT_* overrides
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    /// Logo for page headers: http(s) URL or file path
    #[arg(long, global = true)]
    logo: Option<String>,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one machine record
    Render {
        /// Machine JSON (bare record or {"machine": ...} envelope)
        input: PathBuf,

        /// Report on a single bearing instead of all of them
        #[arg(short, long)]
        bearing: Option<String>,

        /// Directory the report is written to
        #[arg(short, long, default_value = "reports")]
        output_dir: PathBuf,

        /// Write the JSON display list instead of HTML
        #[arg(long)]
        json: bool,

        /// Seed for placeholder data (reproducible output)
        #[arg(long)]
        seed: Option<u64>,

        /// Don't open the report when done
        #[arg(long)]
        no_open: bool,
    },

    /// Render every machine record in a directory
    Batch {
        /// Directory searched recursively for *.json
        dir: PathBuf,

        /// Directory reports are written to
        #[arg(short, long, default_value = "reports")]
        output_dir: PathBuf,

        /// Number of parallel workers (default: number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Seed for placeholder data; each machine gets seed + its index
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Serve reports for a directory of machine records over HTTP
    Serve {
        /// Directory of machine JSON files
        dir: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,
    },
}

fn main() {
    let args = Args::parse();
    init_tracing(args.quiet);

    let metrics = match LayoutMetrics::load(args.layout.as_deref()) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Invalid layout: {}", e);
            std::process::exit(1);
        }
    };
    let logo = fetch_logo(args.logo.as_deref());

    match args.command {
        Command::Render { input, bearing, output_dir, json, seed, no_open } => {
            let mode = match bearing {
                Some(id) => Mode::SingleBearing(id),
                None => Mode::AllBearings,
            };
            let mut synth = synthesizer(seed);
            match render_one(&input, mode, &metrics, logo, &mut synth, &output_dir, json) {
                Ok(path) => {
                    if !args.quiet {
                        eprintln!("\x1b[32mReport saved: {}\x1b[0m", path.display());
                    }
                    if !no_open {
                        if let Err(e) = open::that(&path) {
                            eprintln!("Failed to open report: {}", e);
                        }
                    }
                }
                Err(e) => {
                    error!(input = %input.display(), error = %e, "render failed");
                    eprintln!("Failed to generate report for {}", input.display());
                    std::process::exit(1);
                }
            }
        }

        Command::Batch { dir, output_dir, jobs, seed } => {
            if let Some(jobs) = jobs {
                rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global().ok();
            }
            let failed = run_batch(&dir, &output_dir, &metrics, logo, seed, args.quiet);
            if failed > 0 {
                std::process::exit(1);
            }
        }

        Command::Serve { dir, port } => {
            let context = ServeContext { dir, metrics, logo };
            if let Err(e) = serve::start(port, context) {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the logo once, before any rendering starts
fn fetch_logo(location: Option<&str>) -> Option<Arc<Image>> {
    let cache = match location {
        Some(l) => BrandingCache::new(logo_source(l)),
        None => return None,
    };
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::warn!(error = %e, "no async runtime, rendering without logo");
            return None;
        }
    };
    runtime.block_on(cache.logo())
}

fn synthesizer(seed: Option<u64>) -> RandomSynthesizer {
    match seed {
        Some(s) => RandomSynthesizer::seeded(s),
        None => RandomSynthesizer::new(),
    }
}

fn render_one(
    input: &Path,
    mode: Mode,
    metrics: &LayoutMetrics,
    logo: Option<Arc<Image>>,
    synth: &mut dyn Synthesizer,
    output_dir: &Path,
    json: bool,
) -> vibereport::Result<PathBuf> {
    let machine = MachineRecord::from_json(&std::fs::read_to_string(input)?)?;
    let today = chrono::Local::now().date_naive();
    let doc = report::assemble(&machine, mode, metrics, logo, synth, today)?;

    std::fs::create_dir_all(output_dir)?;
    let mut path = output_dir.join(doc.file_name());
    if json {
        path.set_extension("json");
    }
    report::generate(&path, &doc)?;
    info!(path = %path.display(), pages = doc.page_count(), "report written");
    Ok(path)
}

/// Render every machine under `dir`; returns the number of failures
fn run_batch(
    dir: &Path,
    output_dir: &Path,
    metrics: &LayoutMetrics,
    logo: Option<Arc<Image>>,
    seed: Option<u64>,
    quiet: bool,
) -> usize {
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    if files.is_empty() {
        eprintln!("No machine records found in {}", dir.display());
        return 0;
    }

    if !quiet {
        eprintln!("\x1b[1mvibereport\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} machine record(s)\n", files.len());
    }

    let pb = if !quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    } else {
        None
    };

    let results: Vec<(PathBuf, Result<PathBuf, ReportError>)> = files
        .par_iter()
        .enumerate()
        .map(|(i, input)| {
            let mut synth = synthesizer(seed.map(|s| s.wrapping_add(i as u64)));
            let result = render_one(input, Mode::AllBearings, metrics, logo.clone(), &mut synth, output_dir, false);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(format!("{}", input.display()));
            }
            (input.clone(), result)
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut failed = 0;
    for (input, result) in &results {
        match result {
            Ok(path) => {
                if !quiet {
                    println!("\x1b[32m[OK]\x1b[0m    {}  ->  {}", input.display(), path.display());
                }
            }
            Err(e) => {
                failed += 1;
                error!(input = %input.display(), error = %e, "render failed");
                println!("\x1b[31m[FAILED]\x1b[0m {}", input.display());
            }
        }
    }

    if !quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m {} rendered, {} failed", results.len() - failed, failed);
    }
    failed
}
