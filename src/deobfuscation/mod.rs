//! Deobfuscation framework for JavaScript syntax trees.
//!
//! This module undoes the transformations applied by common JavaScript obfuscators.
//! It works on the typed ESTree tree from [`crate::ast`]: each pass recognizes one
//! obfuscation shape and rewrites it into plain code, leaving everything it does not
//! recognize untouched.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Deobfuscation Pipeline                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Input: Program (ESTree JSON)                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    Detection (read-only)                        │    │
//! │  │  String table prologue, dictionaries, dispatchers, loops        │    │
//! │  └────────────────────────────┬────────────────────────────────────┘    │
//! │                               ▼                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │  1. strings       decode table, inline lookups, dot access      │    │
//! │  │  2. dictionaries  inline per-function constants and templates   │    │
//! │  │  3. unflatten     reassemble while/switch dispatchers (rounds)  │    │
//! │  │  4. loops         rebuild loop exit conditions (opt-in)         │    │
//! │  └────────────────────────────┬────────────────────────────────────┘    │
//! │                               ▼                                         │
//! │  Output: Program + DeobfuscationResult (events, stats, detection)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Components
//!
//! - [`DeobfuscationEngine`] - runs detection and the enabled passes in order
//! - [`EngineConfig`] - which passes run and how
//! - [`AstPass`] - the trait every pass implements
//! - [`EventLog`] - append-only record of everything the passes did
//! - [`DeobfuscationResult`] - events, derived statistics and the detection report
//! - [`detect`] - the read-only pattern scan on its own
//!
//! # Usage
//!
//! ```rust,no_run
//! use jsdeob::deobfuscation::{DeobfuscationEngine, EngineConfig};
//!
//! let mut engine = DeobfuscationEngine::new(EngineConfig::default());
//! let (program, result) = engine.process_file("bundle.json")?;
//!
//! println!("{}", result.detailed_summary());
//! # Ok::<(), jsdeob::Error>(())
//! ```

mod config;
mod detection;
mod engine;
pub(crate) mod events;
mod pass;
mod result;

// Built-in passes
pub mod passes;

pub use config::EngineConfig;
pub use detection::{detect, DetectionEvidence, DetectionReport};
pub use engine::DeobfuscationEngine;
pub use events::{DerivedStats, Event, EventBuilder, EventKind, EventLog, EventLogIter};
pub use pass::AstPass;
pub use result::DeobfuscationResult;
