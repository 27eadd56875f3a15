use std::path::Path;

use jsdeob::deobfuscation::{detect, DetectionEvidence};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_program, process_directory, ScanFilter},
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct EvidenceInfo {
    evidence_type: &'static str,
    scope: String,
    description: String,
    confidence: usize,
}

#[derive(Debug, Serialize)]
struct DetectionInfo {
    file: String,
    detected: bool,
    score: usize,
    summary: String,
    evidence: Vec<EvidenceInfo>,
}

#[derive(Debug, Serialize)]
struct BatchDetectionInfo {
    results: Vec<DetectionInfo>,
    total_files: usize,
    detected_count: usize,
}

pub fn run(path: &Path, recursive: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    if recursive {
        run_recursive(path, opts)
    } else {
        run_single(path, opts)
    }
}

fn run_single(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let info = detect_file(path)?;
    print_output(&info, opts, display_detection)
}

fn run_recursive(dir: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let (results, _fail_count) = process_directory(dir, &ScanFilter::default(), detect_file)?;

    let detected_count = results.iter().filter(|r| r.detected).count();
    let batch = BatchDetectionInfo {
        total_files: results.len(),
        detected_count,
        results,
    };

    print_output(&batch, opts, |batch| {
        let mut tw = TabWriter::new(&[
            ("File", Align::Left),
            ("Score", Align::Right),
            ("Confidence", Align::Left),
            ("Findings", Align::Left),
        ]);
        for info in &batch.results {
            tw.row(vec![
                info.file.clone(),
                info.score.to_string(),
                confidence_label(info.score).to_string(),
                info.summary.clone(),
            ]);
        }
        tw.print();
        println!();
        println!(
            "Scanned {} files, {} with obfuscation detected",
            batch.total_files, batch.detected_count
        );
    })
}

fn detect_file(path: &Path) -> anyhow::Result<DetectionInfo> {
    let program = load_program(path)?;
    let report = detect(&program);

    let evidence = report
        .evidence
        .iter()
        .map(|ev| EvidenceInfo {
            evidence_type: evidence_type_name(ev),
            scope: evidence_scope(ev).to_string(),
            description: ev.short_description(),
            confidence: ev.confidence(),
        })
        .collect();

    Ok(DetectionInfo {
        file: file_display_name(path),
        detected: report.is_obfuscated(),
        score: report.score(),
        summary: report.summary(),
        evidence,
    })
}

fn display_detection(info: &DetectionInfo) {
    if info.detected {
        println!(
            "{}: obfuscated (confidence: {}, score: {})",
            info.file,
            confidence_label(info.score),
            info.score
        );
    } else {
        println!("{}: no obfuscation detected (score: {})", info.file, info.score);
    }

    if !info.evidence.is_empty() {
        println!("  Evidence:");
        let mut tw = TabWriter::new(&[
            ("Kind", Align::Left),
            ("Scope", Align::Left),
            ("Details", Align::Left),
            ("Confidence", Align::Right),
        ])
        .indent("    ");
        for ev in &info.evidence {
            tw.row(vec![
                ev.evidence_type.to_string(),
                ev.scope.clone(),
                ev.description.clone(),
                ev.confidence.to_string(),
            ]);
        }
        tw.print();
    }
}

fn confidence_label(score: usize) -> &'static str {
    match score {
        0..=20 => "very low",
        21..=50 => "low",
        51..=75 => "medium",
        76..=90 => "high",
        _ => "very high",
    }
}

fn evidence_type_name(ev: &DetectionEvidence) -> &'static str {
    match ev {
        DetectionEvidence::StringTable { .. } => "StringTable",
        DetectionEvidence::Dictionary { .. } => "Dictionary",
        DetectionEvidence::Dispatcher { .. } => "Dispatcher",
        DetectionEvidence::ConstantLoop { .. } => "ConstantLoop",
    }
}

fn evidence_scope(ev: &DetectionEvidence) -> &str {
    match ev {
        DetectionEvidence::StringTable { .. } => "program",
        DetectionEvidence::Dictionary { scope, .. }
        | DetectionEvidence::Dispatcher { scope, .. }
        | DetectionEvidence::ConstantLoop { scope } => scope,
    }
}
