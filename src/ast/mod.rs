//! Typed ESTree syntax tree.
//!
//! The tree is read from and written to the JSON produced by ESTree-conformant parsers
//! such as `acorn`, `esprima` or `espree`. Every node kind the deobfuscation passes
//! read or write is a distinct enum variant; anything else is preserved verbatim as an
//! `Unknown` JSON value so that a tree survives a round trip through the pipeline.
//! Position information (`start`, `end`, `loc`, `range`) is dropped on read.
//!
//! # Key Components
//!
//! - [`Program`] - root node with JSON entry points
//! - [`Statement`] / [`Expression`] - the tagged node enums
//! - [`builders`] - constructors for synthesized nodes
//! - [`visit`] - mutable traversal with enter/leave hooks
//!
//! # Examples
//!
//! ```rust
//! use jsdeob::ast::Program;
//!
//! let json = r#"{"type":"Program","sourceType":"script","body":[
//!     {"type":"ExpressionStatement","expression":{"type":"Identifier","name":"x"}}
//! ]}"#;
//! let program = Program::from_json(json)?;
//! assert_eq!(program.body.len(), 1);
//! # Ok::<(), jsdeob::Error>(())
//! ```

pub mod builders;
mod expression;
mod operator;
mod statement;
pub mod visit;

use std::{io::Read, path::Path};

pub use expression::{
    ArrowBody, ArrowFunction, AssignmentExpression, BinaryExpression, CallExpression,
    ConditionalExpression, Expression, Function, Literal, LiteralValue, LogicalExpression,
    MemberExpression, NewExpression, ObjectMember, Property, PropertyKind, RegexLiteral,
    TemplateElement, TemplateLiteral, TemplateValue, UnaryExpression, UpdateExpression,
};
pub(crate) use expression::unknown_kind;
pub use operator::{
    AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator, UpdateOperator,
};
pub use statement::{
    BlockStatement, CatchClause, ForHead, Identifier, Program, SourceType, Statement,
    SwitchCase, VariableDeclaration, VariableDeclarator, VariableKind,
};

use crate::{Error, Result};

impl Program {
    /// Reads a program from ESTree JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] for blank input, [`Error::Json`] for invalid JSON, and
    /// [`Error::Malformed`] when the root node is not a `Program`.
    pub fn from_json(json: &str) -> Result<Program> {
        if json.trim().is_empty() {
            return Err(Error::Empty);
        }
        Self::from_reader(json.as_bytes())
    }

    /// Reads a program from a reader yielding ESTree JSON.
    ///
    /// Minified bundles nest far deeper than `serde_json`'s default recursion limit,
    /// so the limit is lifted for this read.
    ///
    /// # Errors
    ///
    /// See [`Program::from_json`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Program> {
        let mut de = serde_json::Deserializer::from_reader(reader);
        de.disable_recursion_limit();
        let value: serde_json::Value = serde::Deserialize::deserialize(&mut de)?;
        de.end()?;
        Self::from_value(value)
    }

    /// Converts an already parsed JSON value into a program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] when the root node is not a `Program`, and
    /// [`Error::Json`] when a known node kind is missing required fields.
    pub fn from_value(value: serde_json::Value) -> Result<Program> {
        match value.get("type").and_then(serde_json::Value::as_str) {
            Some("Program") => Ok(serde_json::from_value(value)?),
            Some(other) => Err(malformed_error!("root node is {}, expected Program", other)),
            None => Err(malformed_error!("root value is not an ESTree node")),
        }
    }

    /// Reads a program from an ESTree JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] when the file cannot be read, otherwise see
    /// [`Program::from_json`].
    pub fn from_file(path: &Path) -> Result<Program> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serializes the program to compact ESTree JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the program to indented ESTree JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
