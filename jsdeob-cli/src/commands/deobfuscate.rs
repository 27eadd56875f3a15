use std::path::{Path, PathBuf};

use anyhow::Context;
use jsdeob::{
    ast::Program,
    codegen::{generate, GeneratorConfig},
    deobfuscation::{DeobfuscationEngine, DeobfuscationResult, EngineConfig},
};
use serde::Serialize;

use crate::{
    app::{Emit, GlobalOptions},
    commands::common::{file_display_name, process_directory, ScanFilter},
    output::{Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct DeobfuscationReport {
    file: String,
    output: String,
    detected: bool,
    score: usize,
    passes: Vec<&'static str>,
    iterations: usize,
    time_ms: u128,
    stats: StatsReport,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    scopes_transformed: usize,
    strings_decoded: usize,
    members_normalized: usize,
    constants_inlined: usize,
    calls_inlined: usize,
    dictionaries: usize,
    dispatchers: usize,
    loops_reconstructed: usize,
}

pub struct DeobfuscateOptions<'a> {
    pub output: Option<&'a Path>,
    pub suffix: &'a str,
    pub recursive: bool,
    pub emit: Emit,
    pub no_strings: bool,
    pub no_dictionaries: bool,
    pub no_unflatten: bool,
    pub loops: bool,
    pub no_normalize: bool,
    pub rounds: Option<usize>,
    pub show_stats: bool,
    pub report: Option<&'a Path>,
    pub layout: GeneratorConfig,
    pub global: &'a GlobalOptions,
}

pub fn run(path: &Path, opts: &DeobfuscateOptions) -> anyhow::Result<()> {
    if opts.recursive {
        run_recursive(path, opts)
    } else {
        run_single(path, opts)
    }
}

fn run_single(path: &Path, opts: &DeobfuscateOptions) -> anyhow::Result<()> {
    let mut engine = DeobfuscationEngine::new(build_config(opts));
    let (program, result) = engine
        .process_file(path)
        .with_context(|| format!("deobfuscation failed: {}", path.display()))?;

    let output_path = resolve_output_path(path, opts.output, opts.suffix, opts.emit);
    write_program(&program, &output_path, opts.emit, &opts.layout)?;

    let report = build_report(path, &output_path, &engine, &result);

    if let Some(report_file) = opts.report {
        write_report(report_file, &report)?;
    }

    if opts.global.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let input_name = file_display_name(path);
        let output_name = file_display_name(&output_path);

        eprintln!("Deobfuscation complete: {input_name} -> {output_name}");
        if report.detected {
            eprintln!("  Detection:   obfuscated (score: {})", report.score);
        } else {
            eprintln!("  Detection:   none (score: {})", report.score);
        }
        eprintln!("  Passes:      {}", report.passes.join(", "));

        if opts.show_stats {
            display_stats(&report.stats);
        }

        eprintln!("  Iterations:  {}", report.iterations);
        eprintln!("  Time:        {}ms", report.time_ms);

        if !report.warnings.is_empty() {
            eprintln!("  Warnings:    {}", report.warnings.len());
            for w in &report.warnings {
                eprintln!("    - {w}");
            }
        }
    }

    Ok(())
}

fn run_recursive(dir: &Path, opts: &DeobfuscateOptions) -> anyhow::Result<()> {
    let config = build_config(opts);
    if let Some(out_dir) = opts.output {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;
    }

    let filter = ScanFilter {
        suffix: Some(opts.suffix.to_string()),
        report: opts.report.map(Path::to_path_buf),
    };
    let (reports, fail_count) = process_directory(dir, &filter, |file| {
        let mut engine = DeobfuscationEngine::new(config.clone());
        let (program, result) = engine
            .process_file(file)
            .with_context(|| format!("deobfuscation failed: {}", file.display()))?;

        let name = suffixed_filename(file, opts.suffix, opts.emit);
        let out_path = match opts.output {
            Some(out_dir) => out_dir.join(name),
            None => file.parent().unwrap_or(Path::new(".")).join(name),
        };
        write_program(&program, &out_path, opts.emit, &opts.layout)?;

        let report = build_report(file, &out_path, &engine, &result);
        if !opts.global.json {
            eprintln!(
                "{}: {} transformations, {}ms",
                report.file,
                result.events.transformation_count(),
                report.time_ms
            );
        }
        Ok(report)
    })?;

    let success_count = reports.len();

    if let Some(report_file) = opts.report {
        write_report(report_file, &reports)?;
    }

    if opts.global.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        eprintln!();
        eprintln!(
            "Processed {} files: {} succeeded, {} failed",
            success_count + fail_count,
            success_count,
            fail_count
        );
        if opts.show_stats {
            let total_strings: usize = reports.iter().map(|r| r.stats.strings_decoded).sum();
            let total_dispatchers: usize = reports.iter().map(|r| r.stats.dispatchers).sum();
            eprintln!("  Total strings decoded:       {total_strings}");
            eprintln!("  Total dispatchers flattened: {total_dispatchers}");
        }
    }

    Ok(())
}

fn build_config(opts: &DeobfuscateOptions) -> EngineConfig {
    let mut config = EngineConfig::default()
        .with_passes(
            !opts.no_strings,
            !opts.no_dictionaries,
            !opts.no_unflatten,
            opts.loops,
        )
        .with_member_normalization(!opts.no_normalize);

    if let Some(rounds) = opts.rounds {
        config = config.with_unflatten_rounds(rounds);
    }
    config
}

fn write_program(
    program: &Program,
    path: &Path,
    emit: Emit,
    layout: &GeneratorConfig,
) -> anyhow::Result<()> {
    let text = match emit {
        Emit::Json => program.to_json_pretty()?,
        Emit::Js => generate(program, layout)
            .with_context(|| format!("failed to print program for {}", path.display()))?,
    };
    std::fs::write(path, text)
        .with_context(|| format!("failed to write output: {}", path.display()))
}

fn write_report<T: Serialize>(path: &Path, report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report: {}", path.display()))?;
    eprintln!("Report written to {}", path.display());
    Ok(())
}

fn resolve_output_path(input: &Path, output: Option<&Path>, suffix: &str, emit: Emit) -> PathBuf {
    if let Some(out) = output {
        // If output is a directory, place the suffixed file inside it
        if out.is_dir() {
            return out.join(suffixed_filename(input, suffix, emit));
        }
        return out.to_path_buf();
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(suffixed_filename(input, suffix, emit))
}

fn suffixed_filename(input: &Path, suffix: &str, emit: Emit) -> String {
    let stem = input
        .file_stem()
        .map_or("output", |s| s.to_str().unwrap_or("output"));
    format!("{stem}{suffix}.{}", emit.extension())
}

fn build_report(
    input: &Path,
    output: &Path,
    engine: &DeobfuscationEngine,
    result: &DeobfuscationResult,
) -> DeobfuscationReport {
    let derived = result.stats();
    let warnings = result
        .events
        .warnings()
        .map(|ev| match &ev.scope {
            Some(scope) => format!("{scope}: {}", ev.message),
            None => ev.message.clone(),
        })
        .collect();

    DeobfuscationReport {
        file: file_display_name(input),
        output: file_display_name(output),
        detected: result.detection.is_obfuscated(),
        score: result.detection.score(),
        passes: engine.pass_names(),
        iterations: result.iterations,
        time_ms: result.total_time.as_millis(),
        stats: StatsReport {
            scopes_transformed: derived.scopes_transformed,
            strings_decoded: derived.strings_decoded,
            members_normalized: derived.members_normalized,
            constants_inlined: derived.constants_inlined,
            calls_inlined: derived.calls_inlined,
            dictionaries: derived.dictionaries,
            dispatchers: derived.dispatchers,
            loops_reconstructed: derived.loops_reconstructed,
        },
        warnings,
    }
}

fn display_stats(s: &StatsReport) {
    let mut tw = TabWriter::new(&[("Transformation", Align::Left), ("Count", Align::Right)])
        .indent("  ");
    let rows = [
        ("Scopes transformed", s.scopes_transformed),
        ("Strings decoded", s.strings_decoded),
        ("Members normalized", s.members_normalized),
        ("Dictionaries removed", s.dictionaries),
        ("Constants inlined", s.constants_inlined),
        ("Calls inlined", s.calls_inlined),
        ("Dispatchers flattened", s.dispatchers),
        ("Loops rebuilt", s.loops_reconstructed),
    ];
    for (label, count) in rows.into_iter().filter(|(_, count)| *count > 0) {
        tw.row(vec![label.to_string(), count.to_string()]);
    }
    tw.eprint();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixed_filename() {
        assert_eq!(
            suffixed_filename(Path::new("dir/bundle.json"), ".deobf", Emit::Json),
            "bundle.deobf.json"
        );
        assert_eq!(
            suffixed_filename(Path::new("bundle.json"), "_clean", Emit::Js),
            "bundle_clean.js"
        );
    }

    #[test]
    fn test_js_output_uses_layout() {
        let program = Program::from_json(
            r#"{"type":"Program","sourceType":"script","body":[{"type":"IfStatement",
                "test":{"type":"Identifier","name":"a"},
                "consequent":{"type":"ExpressionStatement","expression":
                    {"type":"CallExpression","callee":{"type":"Identifier","name":"f"},"arguments":[]}},
                "alternate":null}]}"#,
        )
        .unwrap();
        let path = std::env::temp_dir().join(format!("jsdeob-layout-{}.js", std::process::id()));
        write_program(&program, &path, Emit::Js, &GeneratorConfig::default().with_tabs()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(text, "if (a) {\n\tf();\n}\n");
    }

    #[test]
    fn test_output_next_to_input() {
        assert_eq!(
            resolve_output_path(Path::new("in/app.json"), None, ".deobf", Emit::Js),
            PathBuf::from("in/app.deobf.js")
        );
    }
}
