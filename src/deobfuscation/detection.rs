//! Pattern detection without rewriting.
//!
//! [`detect`] walks a program and reports which of the obfuscation patterns the
//! passes handle are present, with a confidence score built from the evidence found.
//! The engine attaches the report to every [`DeobfuscationResult`](crate::deobfuscation::DeobfuscationResult);
//! the CLI `detect` command prints it on its own.

use std::fmt;

use serde::Serialize;

use crate::{
    ast::{
        visit::{walk_program, Flow, VisitMut},
        Expression, Program, Statement,
    },
    deobfuscation::passes::{
        dispatcher_cases, is_constant_true_loop, utils::ScopeTracker, CaseSequence,
        FunctionDictionary, Prologue,
    },
};

/// Evidence that contributed to a detection report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionEvidence {
    /// The string table prologue heads the program.
    StringTable {
        /// Array variable name.
        name: String,
        /// Number of encoded strings.
        size: usize,
        /// Rotation count.
        rotation: usize,
        /// Decode-by-index function name.
        decoder: String,
    },

    /// A function body starts with a dictionary declaration.
    Dictionary {
        /// Enclosing function scope.
        scope: String,
        /// Dictionary variable name.
        name: String,
        /// Number of captured entries.
        entries: usize,
    },

    /// A `while`/`switch` dispatcher.
    Dispatcher {
        /// Enclosing function scope.
        scope: String,
        /// Number of `case` clauses.
        cases: usize,
        /// The order string heading the block, if present.
        sequence: Option<String>,
    },

    /// A loop with a constant truthy test.
    ConstantLoop {
        /// Enclosing function scope.
        scope: String,
    },
}

impl DetectionEvidence {
    /// Returns the confidence contribution of this evidence.
    ///
    /// A dispatcher without its order string is weak evidence; endless loops are
    /// common in hand-written code and contribute little.
    #[must_use]
    pub fn confidence(&self) -> usize {
        match self {
            Self::StringTable { .. } => 50,
            Self::Dictionary { .. } => 15,
            Self::Dispatcher { sequence, .. } => {
                if sequence.is_some() {
                    20
                } else {
                    5
                }
            }
            Self::ConstantLoop { .. } => 1,
        }
    }

    /// Generates a short description suitable for summaries.
    #[must_use]
    pub fn short_description(&self) -> String {
        match self {
            Self::StringTable { name, size, .. } => format!("table:{name}x{size}"),
            Self::Dictionary { name, entries, .. } => format!("dict:{name}x{entries}"),
            Self::Dispatcher {
                cases, sequence, ..
            } => match sequence {
                Some(seq) => format!("dispatcher:{cases} cases ({seq})"),
                None => format!("dispatcher:{cases} cases"),
            },
            Self::ConstantLoop { scope } => format!("loop:{scope}"),
        }
    }
}

/// Which obfuscation patterns a program contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionReport {
    /// Everything found, in traversal order.
    pub evidence: Vec<DetectionEvidence>,
}

impl DetectionReport {
    /// Returns the string table prologue details, if present.
    #[must_use]
    pub fn string_table(&self) -> Option<&DetectionEvidence> {
        self.evidence
            .iter()
            .find(|e| matches!(e, DetectionEvidence::StringTable { .. }))
    }

    /// Checks if the string table prologue is present.
    #[must_use]
    pub fn has_string_table(&self) -> bool {
        self.string_table().is_some()
    }

    /// Number of dictionary declarations.
    #[must_use]
    pub fn dictionaries(&self) -> usize {
        self.count(|e| matches!(e, DetectionEvidence::Dictionary { .. }))
    }

    /// Number of dispatcher loops.
    #[must_use]
    pub fn dispatchers(&self) -> usize {
        self.count(|e| matches!(e, DetectionEvidence::Dispatcher { .. }))
    }

    /// Number of loops with a constant truthy test, dispatchers included.
    #[must_use]
    pub fn constant_loops(&self) -> usize {
        self.count(|e| matches!(e, DetectionEvidence::ConstantLoop { .. }))
    }

    fn count(&self, pred: impl Fn(&DetectionEvidence) -> bool) -> usize {
        self.evidence.iter().filter(|e| pred(e)).count()
    }

    /// Total confidence score, capped at 100.
    #[must_use]
    pub fn score(&self) -> usize {
        self.evidence
            .iter()
            .map(DetectionEvidence::confidence)
            .sum::<usize>()
            .min(100)
    }

    /// Checks if the evidence indicates an obfuscated program (score >= 50).
    #[must_use]
    pub fn is_obfuscated(&self) -> bool {
        self.score() >= 50
    }

    /// Generates a one-line summary of the findings.
    #[must_use]
    pub fn summary(&self) -> String {
        let table = match self.string_table() {
            Some(DetectionEvidence::StringTable {
                name,
                size,
                rotation,
                decoder,
            }) => format!("string table {name} ({size} entries, rotation {rotation}, decoder {decoder})"),
            _ => "no string table".to_string(),
        };
        format!(
            "{table}, {} dictionaries, {} dispatchers, {} constant loops, score {}",
            self.dictionaries(),
            self.dispatchers(),
            self.constant_loops(),
            self.score()
        )
    }
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Reports which obfuscation patterns `program` contains.
///
/// The program is not modified.
#[must_use]
pub fn detect(program: &Program) -> DetectionReport {
    let mut report = DetectionReport::default();
    if let Some(prologue) = Prologue::find(&program.body) {
        report.evidence.push(DetectionEvidence::StringTable {
            size: prologue.encoded.len(),
            name: prologue.table_name,
            rotation: prologue.rotation,
            decoder: prologue.decoder,
        });
    }

    // the walker needs mutable access; scan a private copy
    let mut scan = program.clone();
    let mut scanner = Scanner {
        scopes: ScopeTracker::new(),
        evidence: report.evidence,
    };
    walk_program(&mut scanner, &mut scan);
    report.evidence = scanner.evidence;
    report
}

struct Scanner {
    scopes: ScopeTracker,
    evidence: Vec<DetectionEvidence>,
}

impl VisitMut for Scanner {
    fn enter_function(&mut self, _params: &[Expression], body: Option<&mut Vec<Statement>>) {
        self.scopes.enter();
        if let Some(dictionary) = body.and_then(|b| FunctionDictionary::capture(b)) {
            self.evidence.push(DetectionEvidence::Dictionary {
                scope: self.scopes.label(),
                entries: dictionary.entries.len(),
                name: dictionary.name,
            });
        }
    }

    fn leave_function(&mut self) {
        self.scopes.leave();
    }

    fn enter_statements(&mut self, stmts: &mut Vec<Statement>) -> Flow {
        for stmt in stmts.iter() {
            if let Some(cases) = dispatcher_cases(stmt) {
                self.evidence.push(DetectionEvidence::Dispatcher {
                    scope: self.scopes.label(),
                    cases: cases.len(),
                    sequence: CaseSequence::source(stmts).map(str::to_string),
                });
            }
            if is_constant_true_loop(stmt) {
                self.evidence.push(DetectionEvidence::ConstantLoop {
                    scope: self.scopes.label(),
                });
            }
        }
        Flow::Continue
    }
}
