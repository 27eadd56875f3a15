//! Pass trait for the deobfuscation pipeline.
//!
//! Every pass implements [`AstPass`]. The engine owns the passes and drives them in a
//! fixed order over one [`Program`]; a pass never decides when it runs.

use crate::{ast::Program, deobfuscation::EventLog, Result};

/// A deobfuscation pass that rewrites the syntax tree in place.
///
/// Passes record what they did (and what they declined to do) in the shared
/// [`EventLog`]. A pass that does not find the pattern it targets returns
/// `Ok(false)` and leaves the tree untouched; errors are reserved for failures
/// outside the tree.
///
/// # Lifecycle
///
/// For every run the engine calls [`initialize`](AstPass::initialize), then
/// [`run`](AstPass::run) one or more times, then [`finalize`](AstPass::finalize).
/// State captured during `run` must not leak into the next engine run.
pub trait AstPass: Send {
    /// Unique name for logging and event attribution.
    fn name(&self) -> &'static str;

    /// Run the pass over the whole program.
    ///
    /// Returns `true` if the tree was modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass cannot process the program.
    fn run(&mut self, program: &mut Program, events: &EventLog) -> Result<bool>;

    /// Called once before the first `run` of an engine run.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    fn initialize(&mut self, _events: &EventLog) -> Result<()> {
        Ok(())
    }

    /// Called once after the last `run` of an engine run.
    ///
    /// # Errors
    ///
    /// Returns an error if finalization fails.
    fn finalize(&mut self, _events: &EventLog) -> Result<()> {
        Ok(())
    }

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}
