use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use globset::Glob;
use memmap2::Mmap;
use rayon::prelude::*;
use regex::Regex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use rfax_core::config::Config;
use rfax_core::known::scan_unknown_vocabulary;
use rfax_core::model::FamilyEntry;
use rfax_core::{repository, service};

const WARN_RFA_BYTES: u64 = 50 * 1024 * 1024;
const MAX_RFA_BYTES: u64 = 500 * 1024 * 1024;
const MAX_WALK_DEPTH: usize = 10;

#[derive(Parser)]
#[command(name = "rfax", about = "Extract Revit family metadata from .rfa containers to JSON")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Extract family metadata from .rfa files and write JSON documents")]
    Extract {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "*.rfa")]
        glob: String,
        #[arg(short, long)]
        recursive: bool,
        #[arg(short, long)]
        force: bool,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        include_backups: bool,
        #[arg(long, alias = "seq")]
        sequential: bool,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    },
    #[command(about = "Show a summary of one extracted JSON document")]
    Info {
        json: PathBuf,
        #[arg(short, long)]
        verbose: bool,
    },
    #[command(about = "Check that extracted JSON documents still load cleanly")]
    Validate {
        path: PathBuf,
        #[arg(long, default_value = "*.json")]
        glob: String,
        #[arg(short, long)]
        recursive: bool,
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Extract {
            input,
            out,
            glob,
            recursive,
            force,
            dry_run,
            include_backups,
            sequential,
            config,
            verbose,
        } => run_extract(ExtractOptions {
            input,
            out,
            glob,
            recursive,
            force,
            dry_run,
            include_backups,
            sequential,
            config,
            verbose,
        }),
        Command::Info { json, verbose } => {
            init_tracing(verbose, None);
            run_info(&json)
        }
        Command::Validate { path, glob, recursive, verbose } => {
            init_tracing(verbose, None);
            run_validate(&path, &glob, recursive)
        }
    }
}

/// `--verbose` wins over the config file's logging level; `RUST_LOG` wins
/// over both.
fn init_tracing(verbose: bool, config_level: Option<&str>) {
    let default = if verbose { "debug" } else { config_level.unwrap_or("info") };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

struct ExtractOptions {
    input: PathBuf,
    out: Option<PathBuf>,
    glob: String,
    recursive: bool,
    force: bool,
    dry_run: bool,
    include_backups: bool,
    sequential: bool,
    config: Option<PathBuf>,
    verbose: bool,
}

enum FileResult {
    Processed { novel: Vec<String> },
    DryRun,
    SkippedExisting,
    Failed(String),
}

struct Outcome {
    file: PathBuf,
    result: FileResult,
}

fn run_extract(options: ExtractOptions) -> Result<()> {
    let file_config = match &options.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let config_level = file_config.logging.as_ref().and_then(|logging| logging.level.clone());
    init_tracing(options.verbose, config_level.as_deref());
    let defaults = file_config.extract.unwrap_or_default();

    let recursive = options.recursive || defaults.recursive.unwrap_or(false);
    let include_backups = options.include_backups || defaults.include_backups.unwrap_or(false);
    let sequential = options.sequential || defaults.sequential.unwrap_or(false);
    let force = options.force || defaults.force.unwrap_or(false);
    let out = options.out.or(defaults.output);
    let glob = if options.glob == "*.rfa" {
        defaults.glob.unwrap_or(options.glob)
    } else {
        options.glob
    };

    let started = Instant::now();
    let (files, backups_filtered) =
        collect_rfa_files(&options.input, &glob, recursive, include_backups)?;
    if backups_filtered > 0 {
        info!("{backups_filtered} backup file(s) skipped");
    }
    if files.is_empty() {
        bail!("no .rfa files found under {}", options.input.display());
    }
    info!("found {} .rfa file(s)", files.len());

    let handle = |file: &PathBuf| -> Outcome {
        let json_path = determine_output_path(file, &options.input, out.as_deref());
        if json_path.exists() && !force {
            info!("skipping {} (output exists)", file.display());
            return Outcome { file: file.clone(), result: FileResult::SkippedExisting };
        }
        if options.dry_run {
            println!("[dry-run] {} -> {}", file.display(), json_path.display());
            return Outcome { file: file.clone(), result: FileResult::DryRun };
        }
        match process_file(file, &json_path) {
            Ok(novel) => Outcome { file: file.clone(), result: FileResult::Processed { novel } },
            Err(error) => {
                warn!("failed {}: {error}", file.display());
                Outcome { file: file.clone(), result: FileResult::Failed(error) }
            }
        }
    };

    let outcomes: Vec<Outcome> = if sequential {
        files.iter().map(handle).collect()
    } else {
        files.par_iter().map(handle).collect()
    };

    let mut processed = 0usize;
    let mut skipped = 0usize;
    let mut failed: Vec<(PathBuf, String)> = Vec::new();
    let mut novel = BTreeSet::new();
    for outcome in outcomes {
        match outcome.result {
            FileResult::Processed { novel: items } => {
                processed += 1;
                novel.extend(items);
            }
            FileResult::DryRun => processed += 1,
            FileResult::SkippedExisting => skipped += 1,
            FileResult::Failed(error) => failed.push((outcome.file, error)),
        }
    }

    println!();
    println!("extraction summary");
    println!("  processed         {processed}");
    println!("  failed            {}", failed.len());
    println!("  skipped existing  {skipped}");
    println!("  backups filtered  {backups_filtered}");
    println!("  elapsed           {:.2?}", started.elapsed());
    for (file, error) in &failed {
        println!("  error {}: {error}", file.display());
    }
    if !novel.is_empty() {
        println!();
        println!("unknown vocabulary encountered (mapping update may be required):");
        for item in &novel {
            println!("  {item}");
        }
    }

    if !failed.is_empty() {
        return Err(anyhow!("{} of {} file(s) failed", failed.len(), files.len()));
    }
    Ok(())
}

fn process_file(rfa: &Path, json_path: &Path) -> std::result::Result<Vec<String>, String> {
    let file = fs::File::open(rfa).map_err(|e| format!("open failed: {e}"))?;
    let len = file.metadata().map_err(|e| format!("metadata failed: {e}"))?.len();
    if len > MAX_RFA_BYTES {
        return Err(format!("file exceeds {MAX_RFA_BYTES} bytes"));
    }
    if len > WARN_RFA_BYTES {
        warn!("{} is unusually large ({len} bytes)", rfa.display());
    }
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| format!("mmap failed: {e}"))?;
    let extraction = service::extract_entry(&mmap).map_err(|e| e.to_string())?;
    repository::save_entry(&extraction.entry, json_path).map_err(|e| e.to_string())?;
    info!("extracted {} -> {}", rfa.display(), json_path.display());
    Ok(scan_unknown_vocabulary(&extraction.entry))
}

fn collect_rfa_files(
    input: &Path,
    pattern: &str,
    recursive: bool,
    include_backups: bool,
) -> Result<(Vec<PathBuf>, usize)> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("invalid glob pattern {pattern:?}"))?
        .compile_matcher();
    let mut files = Vec::new();
    let mut backups_filtered = 0usize;

    if input.is_file() {
        if !has_rfa_extension(input) {
            bail!("not an .rfa file: {}", input.display());
        }
        if is_backup_file(input) && !include_backups {
            backups_filtered += 1;
        } else {
            files.push(input.to_path_buf());
        }
    } else if input.is_dir() {
        let depth = if recursive { MAX_WALK_DEPTH } else { 1 };
        for entry in WalkDir::new(input).max_depth(depth).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", input.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !matcher.is_match(name.as_ref()) {
                continue;
            }
            if is_backup_file(entry.path()) && !include_backups {
                backups_filtered += 1;
                continue;
            }
            files.push(entry.into_path());
        }
    } else {
        bail!("input path does not exist: {}", input.display());
    }

    files.sort();
    Ok((files, backups_filtered))
}

fn has_rfa_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("rfa"))
}

/// Revit backups look like `Familie.0001.rfa`.
fn is_backup_file(path: &Path) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\.\d{4}\.rfa$").expect("backup pattern"));
    path.file_name().map(|name| re.is_match(&name.to_string_lossy())).unwrap_or(false)
}

fn determine_output_path(rfa: &Path, input_base: &Path, output_base: Option<&Path>) -> PathBuf {
    let Some(out) = output_base else {
        return rfa.with_extension("json");
    };
    let file_name = match rfa.file_stem() {
        Some(stem) => PathBuf::from(stem).with_extension("json"),
        None => PathBuf::from("family.json"),
    };
    if input_base.is_file() {
        return out.join(file_name);
    }
    // keep the relative directory structure below the input root
    let relative = rfa
        .parent()
        .and_then(|parent| parent.strip_prefix(input_base).ok())
        .unwrap_or_else(|| Path::new(""));
    out.join(relative).join(file_name)
}

fn run_info(path: &Path) -> Result<()> {
    let entry = repository::load_entry(path)?;
    print_entry(&entry);
    Ok(())
}

fn print_entry(entry: &FamilyEntry) {
    println!("name     {}", entry.name);
    println!("id       {}", entry.id);
    println!("updated  {}", entry.updated.to_rfc3339());
    if !entry.categories.is_empty() {
        let names: Vec<&str> = entry.categories.iter().map(|c| c.name.as_str()).collect();
        println!("categories  {}", names.join(", "));
    }
    for link in &entry.links {
        match &link.design_file {
            Some(df) => println!(
                "link  {} {} ({} {})",
                link.rel, link.href, df.product, df.product_version
            ),
            None => println!("link  {} {}", link.rel, link.href),
        }
    }
    for feature in &entry.features {
        println!("feature  {}", feature.name);
        for group in &feature.groups {
            println!("  group {} ({} parameter(s))", group.name, group.parameters.len());
            for parameter in &group.parameters {
                println!(
                    "    {} = {} [{}]",
                    parameter.name,
                    parameter.value.as_deref().unwrap_or("-"),
                    parameter.param_type
                );
            }
        }
    }
    if let Some(family) = &entry.family {
        println!(
            "family  type={} variations={} parts={}",
            family.family_type,
            family.variation_count,
            family.parts.len()
        );
        for part in &family.parts {
            println!("  part {} ({} parameter(s))", part.name, part.parameters.len());
        }
    }
}

fn run_validate(input: &Path, pattern: &str, recursive: bool) -> Result<()> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("invalid glob pattern {pattern:?}"))?
        .compile_matcher();
    let mut files = Vec::new();
    if input.is_file() {
        files.push(input.to_path_buf());
    } else if input.is_dir() {
        let depth = if recursive { MAX_WALK_DEPTH } else { 1 };
        for entry in WalkDir::new(input).max_depth(depth).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", input.display()))?;
            if entry.file_type().is_file()
                && matcher.is_match(entry.file_name().to_string_lossy().as_ref())
            {
                files.push(entry.into_path());
            }
        }
    } else {
        bail!("input path does not exist: {}", input.display());
    }
    if files.is_empty() {
        bail!("no JSON documents found under {}", input.display());
    }

    let mut failures = 0usize;
    for file in &files {
        match repository::load_entry(file) {
            Ok(entry) => println!("ok    {} ({})", file.display(), entry.name),
            Err(error) => {
                failures += 1;
                println!("fail  {}: {error}", file.display());
            }
        }
    }
    println!();
    println!("{} document(s), {} failure(s)", files.len(), failures);
    if failures > 0 {
        return Err(anyhow!("{failures} document(s) failed to load"));
    }
    Ok(())
}
