use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use perfume_images::sources::{
    CandidateSource, DirectorySource, FsProbe, IndexHtmlSource, ListingSource, ProbeSource,
};
use perfume_images::state::data::ImportResult;
use perfume_images::{CandidateSet, Config, Library, ResolvedImage, Result};

#[derive(Parser)]
#[command(name = "perfume-images")]
#[command(version)]
#[command(about = "Find catalog photos for perfume and brand names")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog database (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an image folder and add its files to the catalog
    Scan {
        dir: PathBuf,
        /// Prefix for stored paths (default: the configured image folder)
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Import image URLs from a JSON API listing
    Listing { file: PathBuf },
    /// Import files linked from a saved directory index page
    Index {
        file: PathBuf,
        /// Path the index page lists (default: the configured image folder)
        #[arg(long)]
        base: Option<String>,
    },
    /// Probe a folder for `<name>.<ext>` files and import what exists
    Probe {
        dir: PathBuf,
        /// Names to probe (default: probe_names from the config)
        #[arg(long = "name")]
        names: Vec<String>,
    },
    /// Resolve a perfume or brand name to an image path
    Resolve {
        name: String,
        #[arg(long)]
        brand: Option<String>,
        /// Resolve against this folder instead of the catalog
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Ignore a stored resolution
        #[arg(long)]
        fresh: bool,
    },
    /// Normalize a stored image reference into a fetchable URL
    Url { reference: String },
    /// Mark catalog files that no longer exist under ROOT as deleted
    Verify { root: PathBuf },
    /// Forget stored resolutions
    ClearCache,
    /// Show catalog counts
    Stats,
}

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load_or_default(&config_path)?;

    let db_path = match cli.db {
        Some(path) => path,
        None => config.database_path()?,
    };

    match cli.command {
        Commands::Url { reference } => {
            println!("{}", config.url_normalizer().normalize(Some(&reference)));
        }
        Commands::Scan { dir, prefix } => {
            let prefix = prefix.unwrap_or_else(|| config.image_dir.clone());
            let source = DirectorySource::new(dir, prefix);
            import(&db_path, &source.load()?, source.label())?;
        }
        Commands::Listing { file } => {
            let source = ListingSource::from_path(&file)?;
            import(&db_path, &source.load()?, source.label())?;
        }
        Commands::Index { file, base } => {
            let base = base.unwrap_or_else(|| config.image_dir.clone());
            let source = IndexHtmlSource::from_path(&file, base)?;
            import(&db_path, &source.load()?, source.label())?;
        }
        Commands::Probe { dir, names } => {
            let names = if names.is_empty() { config.probe_names.clone() } else { names };
            if names.is_empty() {
                println!("Nothing to probe: pass --name or set probe_names in {}", config_path.display());
                return Ok(());
            }

            let source = ProbeSource::new(FsProbe::new(dir), names)
                .with_batch_size(config.probe_batch_size)
                .with_extensions(config.extensions.clone())
                .with_prefix(config.image_dir.clone());
            let set = source.discover().await;
            import(&db_path, &set, "probe")?;
        }
        Commands::Resolve { name, brand, dir, fresh } => {
            let resolver = config.resolver();
            let library = Library::open(&db_path)?;

            let from_catalog = dir.is_none();

            if !fresh && from_catalog {
                if let Some(stored) = library.lookup_resolution(&name, brand.as_deref())? {
                    info!(resolved_at = stored.resolved_at, "using stored resolution");
                    print_resolution(&stored.path, stored.found);
                    return Ok(());
                }
            }

            let candidates = match dir {
                Some(dir) => CandidateSet::load_or_empty(&DirectorySource::new(dir, config.image_dir.clone())),
                None => library.load_candidates()?,
            };

            let resolved: ResolvedImage = resolver.resolve(&name, brand.as_deref(), &candidates);
            if let Some(matched) = resolved.matched {
                info!(tier = ?matched.tier, pass = ?matched.pass, brand_matched = matched.brand_matched, "match");
            }
            // Only catalog lookups are stored; a folder answer is specific to that folder
            if from_catalog {
                library.save_resolution(&name, brand.as_deref(), &resolved)?;
            }
            print_resolution(&resolved.path, resolved.found);
        }
        Commands::Verify { root } => {
            let library = Library::open(&db_path)?;
            let deleted = library.verify_files(&root, &config.image_dir)?;
            println!("Marked {deleted} missing files as deleted.");
        }
        Commands::ClearCache => {
            let library = Library::open(&db_path)?;
            let removed = library.clear_resolutions()?;
            println!("Removed {removed} stored resolutions.");
        }
        Commands::Stats => {
            let library = Library::open(&db_path)?;
            println!("Catalog: {}", library.path().display());
            println!("Images: {}", library.candidate_count()?);
            println!("Stored resolutions: {}", library.resolution_count()?);
        }
    }

    Ok(())
}

/// Add a discovered candidate set to the catalog and report the outcome
fn import(db_path: &std::path::Path, set: &CandidateSet, source: &str) -> Result<ImportResult> {
    let mut library = Library::open(db_path)?;
    let result = library.import_candidates(set, source)?;

    println!(
        "Import complete! Added {} images, skipped {} duplicates.",
        result.imported_count, result.skipped_count
    );
    Ok(result)
}

fn print_resolution(path: &str, found: bool) {
    if found {
        println!("{path}");
    } else {
        println!("{path} (placeholder)");
    }
}
