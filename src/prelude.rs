//! # jsdeob Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the jsdeob library. Import this module to get quick access to the essential
//! types for reading, deobfuscating and printing ESTree programs.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all jsdeob operations
pub use crate::Error;

/// The result type used throughout jsdeob
pub use crate::Result;

// ================================================================================================
// Syntax Tree
// ================================================================================================

/// Root node and the statement/expression enums
pub use crate::ast::{Expression, Literal, LiteralValue, Program, Statement};

/// Mutable traversal
pub use crate::ast::visit::{walk_program, Flow, VisitMut};

// ================================================================================================
// Deobfuscation
// ================================================================================================

/// Engine entry points and configuration
pub use crate::deobfuscation::{DeobfuscationEngine, DeobfuscationResult, EngineConfig};

/// Pass trait and the built-in passes
pub use crate::deobfuscation::passes::{
    ControlFlowUnflattener, FunctionDictionaryInliner, LoopReconstructor, StringTableDecoder,
};
pub use crate::deobfuscation::AstPass;

/// Events and statistics
pub use crate::deobfuscation::{DerivedStats, Event, EventKind, EventLog};

/// Pattern detection
pub use crate::deobfuscation::{detect, DetectionEvidence, DetectionReport};

// ================================================================================================
// Code Generation
// ================================================================================================

/// JavaScript printing
pub use crate::codegen::{generate, GeneratorConfig};
