//! Statement nodes, the program root, and the supporting nodes that carry their own
//! `type` tag wherever they appear.

use serde::{Deserialize, Serialize};

use crate::ast::{expression::unknown_kind, Expression, Function};

/// Root of an ESTree tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Program {
    /// Top-level statements.
    pub body: Vec<Statement>,
    /// `script` or `module`.
    #[serde(default, rename = "sourceType")]
    pub source_type: SourceType,
}

impl Program {
    /// Creates a script program from a statement list.
    #[must_use]
    pub fn new(body: Vec<Statement>) -> Self {
        Program {
            body,
            source_type: SourceType::Script,
        }
    }
}

/// Parse goal of a [`Program`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Classic script.
    #[default]
    Script,
    /// ECMAScript module.
    Module,
}

/// Any JavaScript statement or declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    /// `expr;`
    #[serde(rename = "ExpressionStatement")]
    Expression {
        /// The evaluated expression.
        expression: Expression,
        /// Directive prologue text such as `use strict`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directive: Option<String>,
    },

    /// `{ ... }`
    #[serde(rename = "BlockStatement")]
    Block {
        /// Statements in source order.
        body: Vec<Statement>,
    },

    /// `;`
    #[serde(rename = "EmptyStatement")]
    Empty,

    /// `debugger;`
    #[serde(rename = "DebuggerStatement")]
    Debugger,

    /// `return argument;`
    #[serde(rename = "ReturnStatement")]
    Return {
        /// Returned value, if any.
        argument: Option<Expression>,
    },

    /// `break label;`
    #[serde(rename = "BreakStatement")]
    Break {
        /// Target label, if any.
        label: Option<Identifier>,
    },

    /// `continue label;`
    #[serde(rename = "ContinueStatement")]
    Continue {
        /// Target label, if any.
        label: Option<Identifier>,
    },

    /// `label: body`
    #[serde(rename = "LabeledStatement")]
    Labeled {
        /// The label.
        label: Identifier,
        /// The labeled statement.
        body: Box<Statement>,
    },

    /// `if (test) consequent else alternate`
    #[serde(rename = "IfStatement")]
    If {
        /// Condition.
        test: Expression,
        /// Taken branch.
        consequent: Box<Statement>,
        /// `else` branch.
        alternate: Option<Box<Statement>>,
    },

    /// `switch (discriminant) { cases }`
    #[serde(rename = "SwitchStatement")]
    Switch {
        /// Switched-on value.
        discriminant: Expression,
        /// Cases in source order.
        cases: Vec<SwitchCase>,
    },

    /// `throw argument;`
    #[serde(rename = "ThrowStatement")]
    Throw {
        /// Thrown value.
        argument: Expression,
    },

    /// `try { block } catch (param) { handler } finally { finalizer }`
    #[serde(rename = "TryStatement")]
    Try {
        /// Protected block.
        block: BlockStatement,
        /// `catch` clause.
        handler: Option<CatchClause>,
        /// `finally` block.
        finalizer: Option<BlockStatement>,
    },

    /// `while (test) body`
    #[serde(rename = "WhileStatement")]
    While {
        /// Loop condition.
        test: Expression,
        /// Loop body.
        body: Box<Statement>,
    },

    /// `do body while (test);`
    #[serde(rename = "DoWhileStatement")]
    DoWhile {
        /// Loop body.
        body: Box<Statement>,
        /// Loop condition.
        test: Expression,
    },

    /// `for (init; test; update) body`
    #[serde(rename = "ForStatement")]
    For {
        /// Initializer clause.
        init: Option<ForHead>,
        /// Loop condition.
        test: Option<Expression>,
        /// Step expression.
        update: Option<Expression>,
        /// Loop body.
        body: Box<Statement>,
    },

    /// `for (left in right) body`
    #[serde(rename = "ForInStatement")]
    ForIn {
        /// Binding or assignment target.
        left: ForHead,
        /// Enumerated object.
        right: Expression,
        /// Loop body.
        body: Box<Statement>,
    },

    /// `for (left of right) body`
    #[serde(rename = "ForOfStatement")]
    ForOf {
        /// Binding or assignment target.
        left: ForHead,
        /// Iterated value.
        right: Expression,
        /// Loop body.
        body: Box<Statement>,
        /// `for await`
        #[serde(default, rename = "await")]
        is_await: bool,
    },

    /// `function name(params) { body }`
    FunctionDeclaration(Function),

    /// `var a = 1, b;`
    VariableDeclaration(VariableDeclaration),

    /// A node kind outside this model, kept verbatim.
    #[serde(untagged)]
    Unknown(serde_json::Value),
}

impl Statement {
    /// Returns the ESTree kind name of this node.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Statement::Expression { .. } => "ExpressionStatement",
            Statement::Block { .. } => "BlockStatement",
            Statement::Empty => "EmptyStatement",
            Statement::Debugger => "DebuggerStatement",
            Statement::Return { .. } => "ReturnStatement",
            Statement::Break { .. } => "BreakStatement",
            Statement::Continue { .. } => "ContinueStatement",
            Statement::Labeled { .. } => "LabeledStatement",
            Statement::If { .. } => "IfStatement",
            Statement::Switch { .. } => "SwitchStatement",
            Statement::Throw { .. } => "ThrowStatement",
            Statement::Try { .. } => "TryStatement",
            Statement::While { .. } => "WhileStatement",
            Statement::DoWhile { .. } => "DoWhileStatement",
            Statement::For { .. } => "ForStatement",
            Statement::ForIn { .. } => "ForInStatement",
            Statement::ForOf { .. } => "ForOfStatement",
            Statement::FunctionDeclaration(_) => "FunctionDeclaration",
            Statement::VariableDeclaration(_) => "VariableDeclaration",
            Statement::Unknown(value) => unknown_kind(value),
        }
    }

    /// Returns true for an unlabeled `break;`.
    #[must_use]
    pub fn is_plain_break(&self) -> bool {
        matches!(self, Statement::Break { label: None })
    }

    /// Returns the declaration if this is a variable declaration.
    #[must_use]
    pub fn as_variable_declaration(&self) -> Option<&VariableDeclaration> {
        match self {
            Statement::VariableDeclaration(decl) => Some(decl),
            _ => None,
        }
    }

    /// Returns the expression of an expression statement.
    #[must_use]
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Statement::Expression { expression, .. } => Some(expression),
            _ => None,
        }
    }
}

/// Head of a `for`, `for-in` or `for-of` loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ForHead {
    /// `for (var i = 0; ...)`
    VariableDeclaration(VariableDeclaration),
    /// `for (i = 0; ...)`
    #[serde(untagged)]
    Expression(Expression),
}

/// Function body, `try` block, `catch` body or `finally` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct BlockStatement {
    /// Statements in source order.
    pub body: Vec<Statement>,
}

/// Identifier appearing outside an expression position: labels and function names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Identifier")]
pub struct Identifier {
    /// The identifier text.
    pub name: String,
}

impl Identifier {
    /// Creates an identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Identifier { name: name.into() }
    }
}

/// `var`, `let` or `const` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// Declarators in source order.
    pub declarations: Vec<VariableDeclarator>,
    /// Declaration keyword.
    pub kind: VariableKind,
}

impl VariableDeclaration {
    /// Returns the binding name and initializer of the only declarator.
    ///
    /// `None` when the declaration has several declarators or binds a pattern.
    #[must_use]
    pub fn single(&self) -> Option<(&str, Option<&Expression>)> {
        match self.declarations.as_slice() {
            [decl] => decl.id.as_identifier().map(|name| (name, decl.init.as_ref())),
            _ => None,
        }
    }
}

/// `id = init` inside a [`VariableDeclaration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct VariableDeclarator {
    /// Binding identifier or pattern.
    pub id: Expression,
    /// Initializer.
    pub init: Option<Expression>,
}

/// Declaration keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// `var`
    #[default]
    Var,
    /// `let`
    Let,
    /// `const`
    Const,
}

impl VariableKind {
    /// Keyword text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

/// `case test: consequent` or `default: consequent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct SwitchCase {
    /// Case value; `None` for `default`.
    pub test: Option<Expression>,
    /// Statements executed for this case.
    pub consequent: Vec<Statement>,
}

/// `catch (param) { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct CatchClause {
    /// Bound exception; absent for `catch {}`.
    pub param: Option<Expression>,
    /// Handler body.
    pub body: BlockStatement,
}
