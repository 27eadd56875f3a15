//! Built-in deobfuscation passes.
//!
//! Each pass rewrites the syntax tree in place and records what it changed in the
//! shared [`EventLog`](crate::deobfuscation::EventLog). A pass that does not find its
//! pattern leaves the tree untouched.
//!
//! # Pipeline Order
//!
//! The [`DeobfuscationEngine`](crate::deobfuscation::DeobfuscationEngine) runs the
//! passes in a fixed order. Later passes rely on the output of earlier ones: the
//! dispatcher sequence string and dictionary keys are often string table lookups
//! until the first pass has run.
//!
//! | Order | Pass | Description |
//! |-------|------|-------------|
//! | 1 | [`StringTableDecoder`] | Decodes the rotated base64 string table, inlines lookups, normalizes `obj["name"]` |
//! | 2 | [`FunctionDictionaryInliner`] | Inlines per-function dictionaries of constants and wrapper functions |
//! | 3 | [`ControlFlowUnflattener`] | Replaces `while`/`switch` dispatchers with their cases in execution order |
//! | 4 | [`LoopReconstructor`] | Rebuilds `while(true)` loops that exit through a trailing `if`/`break` (opt-in) |
//!
//! The unflattener runs once per configured round; each round resolves one level of
//! nested dispatchers.

mod dictionary;
mod loops;
mod strings;
mod unflattening;
pub(crate) mod utils;

pub use self::dictionary::{
    DictionaryEntry, FunctionDictionary, FunctionDictionaryInliner, FunctionTemplate,
};
pub use self::loops::{is_constant_true_loop, LoopReconstructor};
pub use self::strings::{base64_decode, bytes_to_string, Prologue, StringTable, StringTableDecoder};
pub use self::unflattening::{dispatcher_cases, CaseSequence, ControlFlowUnflattener};
pub use self::utils::is_identifier_name;
