use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sprite_catalog_core::{PathClassifier, SheetDefinition};
use sprite_catalog_source::{
    CatalogConfig, list_dirs, list_paths, load_definitions, scan_tree, write_listing,
};
use sprite_catalog_sqlite::{CatalogQuery, CatalogWriter, Migration, SqliteStore, WriteCount};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "sprite-catalog")]
#[command(about = "Build a relational catalog of an LPC sprite tree")]
#[command(version)]
struct Cli {
    /// YAML configuration file (defaults are used when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the schema and catalog classified image assets.
    Scan(ScanArgs),
    /// Import JSON sheet definitions.
    Import(ImportArgs),
    /// Attribute image files to imported sheets by type name.
    LinkFiles(LinkFilesArgs),
    /// Write every file path under the listing roots.
    ListPaths(ListingArgs),
    /// Write every directory that directly contains a file.
    ListDirs(ListingArgs),
    /// Show whether the catalog exists and its row counts.
    Status,
    /// Drop the catalog tables.
    Down,
    /// Write a configuration file populated with the defaults.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Sprite tree root (overrides `assets_dir`).
    #[arg(long)]
    root: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// Definitions directory (overrides `definitions_dir`).
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Also attribute image files under `assets_dir` to the imported sheets.
    #[arg(long)]
    with_files: bool,
}

#[derive(Debug, Args)]
struct LinkFilesArgs {
    /// Sprite tree root (overrides `assets_dir`).
    #[arg(long)]
    root: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ListingArgs {
    /// Output file (overrides the configured listing output).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InitConfigArgs {
    /// Destination path.
    output: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Command::Scan(args) => run_scan(config, args),
        Command::Import(args) => run_import(config, args),
        Command::LinkFiles(args) => run_link_files(config, args),
        Command::ListPaths(args) => run_list_paths(config, args),
        Command::ListDirs(args) => run_list_dirs(config, args),
        Command::Status => run_status(config),
        Command::Down => run_down(config),
        Command::InitConfig(args) => run_init_config(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_scan(config: Option<&Path>, args: ScanArgs) -> Result<(), String> {
    let config = &load_config(config)?;
    let root = args.root.unwrap_or_else(|| config.assets_dir.clone());
    let files = scan_tree(&root).map_err(|e| format!("Cannot scan '{}': {e}", root.display()))?;
    info!(root = %root.display(), files = files.len(), "Found files");

    let store = open_store(config)?;
    let mut writer = CatalogWriter::new(&store);
    writer
        .ensure_schema(&config.vocabulary)
        .map_err(|e| format!("Failed to create schema: {e}"))?;

    let classifier = PathClassifier::new(&config.vocabulary);
    let batch = writer.scan(
        &classifier,
        &files,
        config.extension(),
        config.progress_interval,
    );
    let report = writer
        .write_assets(&batch)
        .map_err(|e| format!("Asset write failed: {e}"))?;

    println!("Scan complete:");
    println!("  Files seen: {}", report.files_seen);
    println!("  Files dropped: {}", report.dropped);
    print_count("Assets", &report.assets);
    print_count("Animation links", &report.links);
    Ok(())
}

fn run_import(config: Option<&Path>, args: ImportArgs) -> Result<(), String> {
    let config = &load_config(config)?;
    let dir = args.dir.unwrap_or_else(|| config.definitions_dir.clone());
    let set = load_definitions(&dir)
        .map_err(|e| format!("Cannot load definitions from '{}': {e}", dir.display()))?;
    if set.definitions.is_empty() {
        warn!(dir = %dir.display(), "No usable definitions found");
    }

    let store = open_store(config)?;
    let mut writer = CatalogWriter::new(&store);
    writer
        .ensure_schema(&config.vocabulary)
        .map_err(|e| format!("Failed to create schema: {e}"))?;

    let sheets: Vec<SheetDefinition> = set.sheets().cloned().collect();
    let report = writer
        .write_definitions(&sheets)
        .map_err(|e| format!("Definition import failed: {e}"))?;

    println!("Import complete:");
    println!("  Files read: {}", set.file_count());
    println!("  Skipped (no type_name): {}", set.skipped.len());
    println!("  Failed to parse: {}", set.failed.len());
    println!("  Duplicate definitions: {}", report.duplicates);
    print_count("Sheets", &report.sheets);
    print_count("Layers", &report.layers);
    print_count("Variants", &report.variants);
    print_count("Sheet animations", &report.sheet_animations);
    print_count("Layer paths", &report.layer_paths);

    if args.with_files {
        link_files(config, &mut writer, &config.assets_dir)?;
    }
    Ok(())
}

fn run_link_files(config: Option<&Path>, args: LinkFilesArgs) -> Result<(), String> {
    let config = &load_config(config)?;
    let root = args.root.unwrap_or_else(|| config.assets_dir.clone());
    let store = open_store(config)?;
    let mut writer = CatalogWriter::new(&store);
    writer
        .ensure_schema(&config.vocabulary)
        .map_err(|e| format!("Failed to create schema: {e}"))?;
    link_files(config, &mut writer, &root)
}

fn link_files(
    config: &CatalogConfig,
    writer: &mut CatalogWriter<'_, SqliteStore>,
    root: &Path,
) -> Result<(), String> {
    let files = scan_tree(root).map_err(|e| format!("Cannot scan '{}': {e}", root.display()))?;
    let report = writer
        .link_sheet_files(&files, config.extension(), config.file_batch_size)
        .map_err(|e| format!("File linking failed: {e}"))?;

    println!("Sheet files:");
    println!("  Image files seen: {}", report.files_seen);
    println!("  Matched a sheet type: {}", report.matched);
    println!("  Batches committed: {}", report.batches);
    print_count("Files", &report.files);
    Ok(())
}

fn run_list_paths(config: Option<&Path>, args: ListingArgs) -> Result<(), String> {
    let config = &load_config(config)?;
    let output = args
        .output
        .unwrap_or_else(|| config.listing.paths_output.clone());
    let paths = list_paths(&config.listing.roots).map_err(|e| format!("Listing failed: {e}"))?;
    write_listing(&output, &paths)
        .map_err(|e| format!("Failed to write '{}': {e}", output.display()))?;
    println!("Wrote {} paths to {}", paths.len(), output.display());
    Ok(())
}

fn run_list_dirs(config: Option<&Path>, args: ListingArgs) -> Result<(), String> {
    let config = &load_config(config)?;
    let output = args
        .output
        .unwrap_or_else(|| config.listing.dirs_output.clone());
    let dirs = list_dirs(&config.listing.roots).map_err(|e| format!("Listing failed: {e}"))?;
    write_listing(&output, &dirs)
        .map_err(|e| format!("Failed to write '{}': {e}", output.display()))?;
    println!("Wrote {} directories to {}", dirs.len(), output.display());
    Ok(())
}

fn run_status(config: Option<&Path>) -> Result<(), String> {
    let config = &load_config(config)?;
    let migration = open_migration(config)?;
    let status = migration
        .status()
        .map_err(|e| format!("Failed to get catalog status: {e}"))?;
    println!("Catalog Status:");
    println!(
        "  Tables exist: {}",
        if status.tables_exist { "yes" } else { "no" }
    );
    println!("  Render layers: {}", status.render_layer_count);
    println!("  Animations: {}", status.animation_count);
    println!("  Sheets: {}", status.sheet_count);
    println!("  Layers: {}", status.layer_count);
    println!("  Layer paths: {}", status.layer_path_count);
    println!("  Variants: {}", status.variant_count);
    println!("  Sheet animations: {}", status.sheet_animation_count);
    println!("  Sheet files: {}", status.sheet_file_count);
    println!("  Assets: {}", status.asset_count);
    println!("  Asset animations: {}", status.asset_animation_count);

    if status.tables_exist {
        let rows = CatalogQuery::new(migration.connection(), &config.table_prefix)
            .and_then(|query| query.character_layers())
            .map_err(|e| format!("Failed to read character layers: {e}"))?;
        println!("  Character layer rows: {}", rows.len());
    }
    Ok(())
}

fn run_down(config: Option<&Path>) -> Result<(), String> {
    let config = &load_config(config)?;
    let mut migration = open_migration(config)?;
    migration
        .down()
        .map_err(|e| format!("Migration down failed: {e}"))?;
    println!(
        "Tables with prefix '{}' dropped from '{}'.",
        config.table_prefix,
        config.database.display()
    );
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<(), String> {
    CatalogConfig::default()
        .save(&args.output)
        .map_err(|e| format!("Failed to write '{}': {e}", args.output.display()))?;
    println!("Wrote default configuration to {}", args.output.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<CatalogConfig, String> {
    let config = match path {
        Some(path) => CatalogConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => CatalogConfig::default(),
    };
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;
    Ok(config)
}

fn open_store(config: &CatalogConfig) -> Result<SqliteStore, String> {
    SqliteStore::open(&config.database, &config.table_prefix).map_err(|e| {
        format!(
            "Failed to open database '{}': {e}",
            config.database.display()
        )
    })
}

fn open_migration(config: &CatalogConfig) -> Result<Migration, String> {
    let conn = rusqlite::Connection::open(&config.database).map_err(|e| {
        format!(
            "Failed to open database '{}': {e}",
            config.database.display()
        )
    })?;
    Migration::new(conn, &config.table_prefix)
        .map_err(|e| format!("Failed to initialize migration: {e}"))
}

fn print_count(label: &str, count: &WriteCount) {
    println!(
        "  {label}: {} inserted, {} already present, {} failed",
        count.inserted, count.already_present, count.failed
    );
}
