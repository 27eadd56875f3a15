use std::path::{Path, PathBuf};

use anyhow::Context;
use jsdeob::ast::Program;
use rayon::prelude::*;

/// Load an ESTree program from a JSON file.
pub fn load_program(path: &Path) -> anyhow::Result<Program> {
    Program::from_file(path).with_context(|| format!("failed to load program: {}", path.display()))
}

/// Files a directory scan must not treat as input.
///
/// A batch run writes its outputs and report next to the inputs, so a later scan of
/// the same directory has to leave them out.
#[derive(Debug, Default)]
pub struct ScanFilter {
    /// Output filename suffix; files whose stem ends with it are skipped.
    pub suffix: Option<String>,
    /// Report file written by the run.
    pub report: Option<PathBuf>,
}

impl ScanFilter {
    /// Returns true if `path` is a `.json` file produced by something other than a run.
    pub fn accepts(&self, path: &Path) -> bool {
        if !is_program_file(path) {
            return false;
        }
        if let Some(suffix) = self.suffix.as_deref().filter(|s| !s.is_empty()) {
            let stem = path.file_stem().map(|s| s.to_string_lossy());
            if stem.is_some_and(|stem| stem.ends_with(suffix)) {
                return false;
            }
        }
        match &self.report {
            Some(report) => !same_file(path, report),
            None => true,
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Collect all accepted `.json` files recursively from a directory.
pub fn collect_programs(dir: &Path, filter: &ScanFilter) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_programs_recursive(dir, filter, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_programs_recursive(
    dir: &Path,
    filter: &ScanFilter,
    files: &mut Vec<PathBuf>,
) -> anyhow::Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_programs_recursive(&path, filter, files)?;
        } else if filter.accepts(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Returns true if the path has a `.json` extension.
pub fn is_program_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Run `process` over every program file under `dir` in parallel.
///
/// Returns the successful results in path order and the number of failures.
/// Failures are reported on stderr as they happen.
pub fn process_directory<T, F>(
    dir: &Path,
    filter: &ScanFilter,
    process: F,
) -> anyhow::Result<(Vec<T>, usize)>
where
    T: Send,
    F: Fn(&Path) -> anyhow::Result<T> + Sync,
{
    let files = collect_programs(dir, filter)?;
    if files.is_empty() {
        anyhow::bail!("no .json files found in {}", dir.display());
    }

    let outcomes: Vec<_> = files.par_iter().map(|file| (file, process(file))).collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = 0;
    for (file, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => {
                eprintln!("{}: {err:#}", file_display_name(file));
                failures += 1;
            }
        }
    }
    Ok((results, failures))
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}
