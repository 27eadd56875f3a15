//! Main deobfuscation engine.
//!
//! The [`DeobfuscationEngine`] is the main entry point for deobfuscating
//! JavaScript syntax trees. It runs detection, then the enabled passes in their
//! fixed order, and collects every event into one [`DeobfuscationResult`].

use std::{path::Path, time::Instant};

use log::{debug, info};

use crate::{
    ast::Program,
    deobfuscation::{
        config::EngineConfig,
        detection::detect,
        pass::AstPass,
        passes::{
            ControlFlowUnflattener, FunctionDictionaryInliner, LoopReconstructor,
            StringTableDecoder,
        },
        result::DeobfuscationResult,
        EventKind, EventLog,
    },
    Result,
};

/// Number of leading prologue statements hidden from the dictionary inliner.
const SHIELDED_PROLOGUE: usize = 2;

/// One step of the pipeline.
struct Stage {
    pass: Box<dyn AstPass>,
    /// Maximum number of runs; stops early once a run changes nothing.
    rounds: usize,
    /// Detach the string table prologue while this pass runs.
    shields_prologue: bool,
}

/// Main deobfuscation engine.
///
/// The engine runs the pipeline in a fixed order:
///
/// 1. **Detection**: Record which patterns are present (read-only)
/// 2. **Strings**: Decode the string table and inline its entries
/// 3. **Dictionaries**: Inline dictionary lookups, with the first two prologue
///    statements detached so the table and its rotation call are not mistaken for
///    dictionary material
/// 4. **Unflattening**: Reassemble dispatchers, one nesting level per round
/// 5. **Loops**: Rebuild loop exit conditions (disabled by default)
///
/// A pass that does not find its pattern leaves the tree alone; only I/O and
/// malformed input surface as errors.
///
/// # Example
///
/// ```rust
/// use jsdeob::deobfuscation::{DeobfuscationEngine, EngineConfig};
///
/// let json = r#"{"type":"Program","sourceType":"script","body":[]}"#;
/// let mut engine = DeobfuscationEngine::new(EngineConfig::default());
/// let (program, result) = engine.process_json(json)?;
///
/// assert!(program.body.is_empty());
/// println!("{}", result.summary());
/// # Ok::<(), jsdeob::Error>(())
/// ```
pub struct DeobfuscationEngine {
    /// Configuration.
    config: EngineConfig,
    /// Pipeline stages in execution order (built once in constructor).
    stages: Vec<Stage>,
}

impl Default for DeobfuscationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DeobfuscationEngine {
    /// Creates a new engine with the given configuration.
    ///
    /// Disabled passes are not instantiated.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let mut stages = Vec::new();

        if config.enable_string_decoding {
            stages.push(Stage {
                pass: Box::new(StringTableDecoder::new(config.enable_member_normalization)),
                rounds: 1,
                shields_prologue: false,
            });
        }
        if config.enable_dictionary_inlining {
            stages.push(Stage {
                pass: Box::new(FunctionDictionaryInliner::new()),
                rounds: 1,
                shields_prologue: true,
            });
        }
        if config.enable_unflattening && config.unflatten_rounds > 0 {
            stages.push(Stage {
                pass: Box::new(ControlFlowUnflattener::new()),
                rounds: config.unflatten_rounds,
                shields_prologue: false,
            });
        }
        if config.enable_loop_reconstruction {
            stages.push(Stage {
                pass: Box::new(LoopReconstructor::new()),
                rounds: 1,
                shields_prologue: false,
            });
        }

        Self { config, stages }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of the passes that will run, in order.
    #[must_use]
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.pass.name()).collect()
    }

    /// Deobfuscates a program in place.
    ///
    /// # Errors
    ///
    /// Returns an error if a pass fails to initialize, run or finalize. Passes that do
    /// not recognize their pattern are not errors.
    pub fn process_program(&mut self, program: &mut Program) -> Result<DeobfuscationResult> {
        let start = Instant::now();

        let detection = detect(program);
        debug!("engine: {}", detection.summary());

        let shield = detection.has_string_table();
        let events = EventLog::new();
        let mut iterations = 0;

        for stage in &mut self.stages {
            let name = stage.pass.name();
            events
                .record(EventKind::PassStarted)
                .pass(name)
                .message(stage.pass.description());

            let detached: Vec<_> = if stage.shields_prologue && shield {
                let n = SHIELDED_PROLOGUE.min(program.body.len());
                program.body.drain(..n).collect()
            } else {
                Vec::new()
            };

            let outcome = Self::run_stage(stage, program, &events, &mut iterations);

            if !detached.is_empty() {
                let rest = std::mem::replace(&mut program.body, detached);
                program.body.extend(rest);
            }
            let changed = outcome?;

            debug!("engine: pass {name} {}", if changed { "changed the tree" } else { "made no change" });
            events
                .record(EventKind::PassCompleted)
                .pass(name)
                .message(if changed { "changed" } else { "no change" });
        }

        let result =
            DeobfuscationResult::new(detection, events).with_timing(start.elapsed(), iterations);
        info!("engine: {}", result.summary());
        Ok(result)
    }

    fn run_stage(
        stage: &mut Stage,
        program: &mut Program,
        events: &EventLog,
        iterations: &mut usize,
    ) -> Result<bool> {
        stage.pass.initialize(events)?;
        let mut changed = false;
        for _ in 0..stage.rounds {
            *iterations += 1;
            if !stage.pass.run(program, events)? {
                break;
            }
            changed = true;
        }
        stage.pass.finalize(events)?;
        Ok(changed)
    }

    /// Reads ESTree JSON and deobfuscates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not an ESTree `Program`, or if a pass fails.
    pub fn process_json(&mut self, json: &str) -> Result<(Program, DeobfuscationResult)> {
        let mut program = Program::from_json(json)?;
        let result = self.process_program(&mut program)?;
        Ok((program, result))
    }

    /// Reads an ESTree JSON file and deobfuscates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an ESTree `Program`, or if
    /// a pass fails.
    pub fn process_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<(Program, DeobfuscationResult)> {
        let mut program = Program::from_file(path.as_ref())?;
        let result = self.process_program(&mut program)?;
        Ok((program, result))
    }
}
