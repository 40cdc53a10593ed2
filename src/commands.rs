//! CLI commands: library, resolve, report, plan.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::error;
use crate::library::Library;
use crate::report::{self, Report};
use crate::resolver::Resolution;
use crate::types::ReferenceKind;

/// Exit code when at least one name did not resolve to a unique candidate.
const UNRESOLVED_EXIT: u8 = 2;

/// Build the library for `kind` from the config in `root`.
///
/// # Errors
///
/// Returns errors from config loading.
fn load_library(root: &Path, kind: ReferenceKind) -> Result<(Config, Library), error::Error> {
    let config = Config::load(root)?;
    let library = Library::build(&config.lister(), &config.library, config.extension(kind));
    Ok((config, library))
}

/// List every candidate file of a kind, grouped by base name.
///
/// # Errors
///
/// Returns errors from config loading.
pub fn library(kind: ReferenceKind) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let (config, library) = load_library(&root, kind)?;

    if config.library.is_empty() {
        println!("No library directories configured.");
        return Ok(());
    }

    for candidate in library.iter() {
        println!("{}\t{}", candidate.base_name, candidate.path.display());
    }
    println!();
    println!(
        "{} {} candidates ({} distinct names)",
        library.len(),
        config.extension(kind),
        library.name_count()
    );
    Ok(())
}

/// Resolve one reference name against the configured library.
///
/// # Errors
///
/// Returns errors from config loading or an invalid name pattern.
pub fn resolve(name: &str, kind: ReferenceKind) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let (config, library) = load_library(&root, kind)?;
    let options = config.reload_options(kind)?;

    let lookup = (options.normalize_name)(name);
    let resolution = library.resolve(&lookup, options.match_mode);
    if lookup != name {
        println!("{name} -> {lookup}");
    }

    match &resolution {
        Resolution::Unique(path) => {
            println!("UNIQUE     {}", path.display());
            return Ok(ExitCode::SUCCESS);
        },
        Resolution::NotFound => println!("NOT FOUND  {lookup}"),
        Resolution::Ambiguous(paths) => {
            println!("AMBIGUOUS  {lookup}");
            for path in paths {
                println!("  {}", path.display());
            }
        },
    }
    Ok(ExitCode::from(UNRESOLVED_EXIT))
}

/// Summarize a report file, or list one host's records.
///
/// # Errors
///
/// Returns errors from reading or parsing the report.
pub fn report(path: &Path, host: Option<&str>) -> Result<(), error::Error> {
    let report = Report::read(path)?;
    println!("{}", report.header.join("\t"));

    if let Some(host) = host {
        for record in report.records_for_host(host) {
            let fields: Vec<&str> = (0..record.len()).filter_map(|i| record.field(i)).collect();
            println!("{}", fields.join("\t"));
        }
        return Ok(());
    }

    for host in report.host_files() {
        let host = host.display().to_string();
        let count = report.records_for_host(&host).count();
        println!("{count:>6}  {host}");
    }
    println!();
    println!("{} records", report.records.len());
    Ok(())
}

/// Dry run: resolve every reference named in a report against the library
/// without touching any document.
///
/// # Errors
///
/// Returns errors from config loading, an invalid name pattern, or reading
/// the report.
pub fn plan(path: &Path, kind: ReferenceKind, column: Option<usize>) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let report = Report::read(path)?;
    let (config, library) = load_library(&root, kind)?;
    let options = config.reload_options(kind)?;
    let column = column.unwrap_or(report::NAME_COLUMN);

    let mut unresolved = 0_usize;
    for record in &report.records {
        let Some(name) = record.field(column).filter(|name| !name.trim().is_empty()) else {
            // Nothing to resolve counts as unresolved.
            unresolved = unresolved.saturating_add(1);
            println!("NO NAME    {} (column {column})", record.host_file().unwrap_or(report::UNKNOWN));
            continue;
        };
        let lookup = (options.normalize_name)(name);
        let resolution = library.resolve(&lookup, options.match_mode);
        let state = match &resolution {
            Resolution::Unique(_) => "RELOAD   ",
            Resolution::NotFound => "NO MATCH ",
            Resolution::Ambiguous(_) => "AMBIGUOUS",
        };
        if resolution.path().is_none() {
            unresolved = unresolved.saturating_add(1);
        }
        println!("{state}  {name} -> {resolution}");
    }

    println!();
    if unresolved > 0 {
        println!("{unresolved} of {} references cannot be reloaded", report.records.len());
        return Ok(ExitCode::from(UNRESOLVED_EXIT));
    }
    println!("All {} references resolve uniquely", report.records.len());
    Ok(ExitCode::SUCCESS)
}
