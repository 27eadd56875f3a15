// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # jsdeob
//!
//! AST-level deobfuscation of JavaScript. `jsdeob` reads the ESTree JSON produced by
//! parsers such as `acorn` or `esprima`, undoes the transformations applied by
//! common JavaScript obfuscators, and writes the result back as ESTree JSON or as
//! readable JavaScript source.
//!
//! ## Features
//!
//! - **🔤 String tables** - Decodes base64 string arrays, undoes their rotation and
//!   inlines every lookup
//! - **📖 Dictionaries** - Inlines per-function constant and call-forwarding objects
//! - **🔀 Control flow** - Reassembles `while`/`switch` dispatchers driven by a
//!   `"2|0|1"` order string
//! - **🔁 Loops** - Rebuilds `while (true)` loops whose exit is a trailing `break`
//! - **🔍 Detection** - Reports which patterns a program contains without rewriting it
//! - **📝 Code generation** - Prints the tree as JavaScript with minimal parentheses
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jsdeob::prelude::*;
//!
//! let mut engine = DeobfuscationEngine::new(EngineConfig::default());
//! let (program, result) = engine.process_file("bundle.json")?;
//!
//! println!("{}", result.detailed_summary());
//! println!("{}", generate(&program, &GeneratorConfig::default())?);
//! # Ok::<(), jsdeob::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ast`] - Typed ESTree nodes, JSON input/output and mutable traversal
//! - [`deobfuscation`] - The engine, its passes, events and detection
//! - [`codegen`] - JavaScript source generation
//! - [`prelude`] - Common re-exports
//!
//! Everything a pass does is recorded in an [`deobfuscation::EventLog`]; only
//! boundary failures (I/O, malformed JSON, unprintable nodes) surface as [`Error`].

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// ```rust
/// use jsdeob::prelude::*;
///
/// let program = Program::new(Vec::new());
/// let report = detect(&program);
/// assert!(!report.is_obfuscated());
/// ```
pub mod prelude;

/// Typed ESTree syntax tree.
pub mod ast;

/// JavaScript source generation.
pub mod codegen;

/// Deobfuscation engine and passes.
pub mod deobfuscation;

/// `jsdeob` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `jsdeob` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
