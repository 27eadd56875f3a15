//! Expression nodes.
//!
//! ESTree treats destructuring patterns as a separate `Pattern` category. They share
//! the expression enum here since every pattern position in the tree can be told
//! apart by its parent, and passes never need to distinguish the two.

use serde::{Deserialize, Serialize};

use crate::ast::{
    operator::{
        AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator, UpdateOperator,
    },
    BlockStatement, Identifier,
};

/// Any JavaScript expression or binding pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    /// `name`
    Identifier {
        /// The identifier text.
        name: String,
    },

    /// String, number, boolean, null or regular expression literal.
    Literal(Literal),

    /// `this`
    #[serde(rename = "ThisExpression")]
    This,

    /// `[a, , b]`; holes are `None`.
    #[serde(rename = "ArrayExpression")]
    Array {
        /// Elements in source order.
        elements: Vec<Option<Expression>>,
    },

    /// `{ key: value, ...rest }`
    #[serde(rename = "ObjectExpression")]
    Object {
        /// Properties in source order.
        properties: Vec<ObjectMember>,
    },

    /// `function name(params) { body }`
    FunctionExpression(Function),

    /// `(params) => body`
    #[serde(rename = "ArrowFunctionExpression")]
    Arrow(ArrowFunction),

    /// `!x`, `typeof x`, ...
    #[serde(rename = "UnaryExpression")]
    Unary(UnaryExpression),

    /// `x++`, `--x`
    #[serde(rename = "UpdateExpression")]
    Update(UpdateExpression),

    /// `a + b`, `a === b`, ...
    #[serde(rename = "BinaryExpression")]
    Binary(BinaryExpression),

    /// `a && b`, `a || b`, `a ?? b`
    #[serde(rename = "LogicalExpression")]
    Logical(LogicalExpression),

    /// `a = b`, `a += b`, ...
    #[serde(rename = "AssignmentExpression")]
    Assignment(AssignmentExpression),

    /// `test ? consequent : alternate`
    #[serde(rename = "ConditionalExpression")]
    Conditional(ConditionalExpression),

    /// `callee(arguments)`
    #[serde(rename = "CallExpression")]
    Call(CallExpression),

    /// `new callee(arguments)`
    #[serde(rename = "NewExpression")]
    New(NewExpression),

    /// `object.property` or `object[property]`
    #[serde(rename = "MemberExpression")]
    Member(MemberExpression),

    /// `a, b, c`
    #[serde(rename = "SequenceExpression")]
    Sequence {
        /// Expressions in evaluation order.
        expressions: Vec<Expression>,
    },

    /// `` `text ${expr}` ``
    TemplateLiteral(TemplateLiteral),

    /// `` tag`text ${expr}` ``
    #[serde(rename = "TaggedTemplateExpression")]
    TaggedTemplate {
        /// The tag function.
        tag: Box<Expression>,
        /// The template; always a [`Expression::TemplateLiteral`].
        quasi: Box<Expression>,
    },

    /// `...argument` in calls and array literals.
    #[serde(rename = "SpreadElement")]
    Spread {
        /// The spread operand.
        argument: Box<Expression>,
    },

    /// `target = default` inside a binding pattern.
    AssignmentPattern {
        /// The binding target.
        left: Box<Expression>,
        /// The default value.
        right: Box<Expression>,
    },

    /// `[a, b]` as a binding target.
    ArrayPattern {
        /// Elements in source order; holes are `None`.
        elements: Vec<Option<Expression>>,
    },

    /// `{ a, b: c }` as a binding target.
    ObjectPattern {
        /// Properties in source order.
        properties: Vec<ObjectMember>,
    },

    /// `...rest` as a binding target.
    RestElement {
        /// The binding target.
        argument: Box<Expression>,
    },

    /// A node kind outside this model, kept verbatim.
    #[serde(untagged)]
    Unknown(serde_json::Value),
}

impl Expression {
    /// Returns the ESTree kind name of this node.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Expression::Identifier { .. } => "Identifier",
            Expression::Literal(_) => "Literal",
            Expression::This => "ThisExpression",
            Expression::Array { .. } => "ArrayExpression",
            Expression::Object { .. } => "ObjectExpression",
            Expression::FunctionExpression(_) => "FunctionExpression",
            Expression::Arrow(_) => "ArrowFunctionExpression",
            Expression::Unary(_) => "UnaryExpression",
            Expression::Update(_) => "UpdateExpression",
            Expression::Binary(_) => "BinaryExpression",
            Expression::Logical(_) => "LogicalExpression",
            Expression::Assignment(_) => "AssignmentExpression",
            Expression::Conditional(_) => "ConditionalExpression",
            Expression::Call(_) => "CallExpression",
            Expression::New(_) => "NewExpression",
            Expression::Member(_) => "MemberExpression",
            Expression::Sequence { .. } => "SequenceExpression",
            Expression::TemplateLiteral(_) => "TemplateLiteral",
            Expression::TaggedTemplate { .. } => "TaggedTemplateExpression",
            Expression::Spread { .. } => "SpreadElement",
            Expression::AssignmentPattern { .. } => "AssignmentPattern",
            Expression::ArrayPattern { .. } => "ArrayPattern",
            Expression::ObjectPattern { .. } => "ObjectPattern",
            Expression::RestElement { .. } => "RestElement",
            Expression::Unknown(value) => unknown_kind(value),
        }
    }

    /// Returns the name if this is an identifier.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Returns the literal if this is a literal node.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expression::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Returns the string value if this is a string literal.
    #[must_use]
    pub fn as_str_literal(&self) -> Option<&str> {
        match self {
            Expression::Literal(Literal {
                value: LiteralValue::String(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value if this is a number literal.
    #[must_use]
    pub fn as_number_literal(&self) -> Option<f64> {
        match self {
            Expression::Literal(Literal {
                value: LiteralValue::Number(n),
                ..
            }) => Some(*n),
            _ => None,
        }
    }

    /// Returns true when the expression is a constant that is always truthy.
    ///
    /// Recognizes `true`, non-zero numbers, non-empty strings, and the `!![]` and
    /// `!0` spellings obfuscators favour for an endless loop.
    #[must_use]
    pub fn is_truthy_constant(&self) -> bool {
        match self {
            Expression::Literal(lit) => match &lit.value {
                LiteralValue::Boolean(b) => *b,
                LiteralValue::Number(n) => *n != 0.0 && !n.is_nan(),
                LiteralValue::String(s) => !s.is_empty(),
                LiteralValue::Null | LiteralValue::Opaque(_) => false,
            },
            Expression::Unary(UnaryExpression {
                operator: UnaryOperator::Not,
                argument,
                ..
            }) => argument.is_falsy_constant(),
            _ => false,
        }
    }

    /// Returns true when the expression is a constant that is always falsy.
    #[must_use]
    pub fn is_falsy_constant(&self) -> bool {
        match self {
            Expression::Literal(lit) => match &lit.value {
                LiteralValue::Boolean(b) => !*b,
                LiteralValue::Number(n) => *n == 0.0 || n.is_nan(),
                LiteralValue::String(s) => s.is_empty(),
                LiteralValue::Null => lit.regex.is_none(),
                LiteralValue::Opaque(_) => false,
            },
            Expression::Array { .. } | Expression::Object { .. } => false,
            Expression::Unary(UnaryExpression {
                operator: UnaryOperator::Not,
                argument,
                ..
            }) => argument.is_truthy_constant() || argument.is_object_literal(),
            _ => false,
        }
    }

    fn is_object_literal(&self) -> bool {
        matches!(self, Expression::Array { .. } | Expression::Object { .. })
    }
}

pub(crate) fn unknown_kind(value: &serde_json::Value) -> &str {
    value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("<untyped>")
}

/// Literal node.
///
/// Literals synthesized by the passes carry no `raw` text; the code generator
/// derives the source form from `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    /// The literal value.
    pub value: LiteralValue,
    /// Source text of the literal, when the parser recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Pattern and flags of a regular expression literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegexLiteral>,
    /// Decimal digits of a BigInt literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bigint: Option<String>,
}

/// Value carried by a [`Literal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// `null` (also the placeholder parsers write for regex values)
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Any numeric literal.
    Number(f64),
    /// String literal, already unescaped.
    String(String),
    /// Anything else a parser put in `value`, kept verbatim.
    Opaque(serde_json::Value),
}

/// Regular expression literal payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegexLiteral {
    /// Pattern source between the slashes.
    pub pattern: String,
    /// Flag characters after the closing slash.
    pub flags: String,
}

/// Member of an object literal or object pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectMember {
    /// `key: value`, shorthand, method, getter or setter.
    Property(Property),
    /// `...argument` in an object literal.
    #[serde(rename = "SpreadElement")]
    Spread {
        /// The spread operand.
        argument: Expression,
    },
    /// `...argument` in an object pattern.
    #[serde(rename = "RestElement")]
    Rest {
        /// The binding target.
        argument: Expression,
    },
    /// A node kind outside this model, kept verbatim.
    #[serde(untagged)]
    Unknown(serde_json::Value),
}

/// Object property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property key; an identifier or literal unless `computed`.
    pub key: Expression,
    /// Property value.
    pub value: Expression,
    /// `init`, `get` or `set`.
    #[serde(default)]
    pub kind: PropertyKind,
    /// `[key]: value`
    #[serde(default)]
    pub computed: bool,
    /// `key() {}`
    #[serde(default)]
    pub method: bool,
    /// `{ key }`
    #[serde(default)]
    pub shorthand: bool,
}

impl Property {
    /// Returns the static key name: an identifier name or a string literal value.
    #[must_use]
    pub fn key_name(&self) -> Option<&str> {
        if self.computed {
            return self.key.as_str_literal();
        }
        self.key
            .as_identifier()
            .or_else(|| self.key.as_str_literal())
    }
}

/// Kind of an object [`Property`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Plain data property.
    #[default]
    Init,
    /// Getter.
    Get,
    /// Setter.
    Set,
}

/// Shared payload of function declarations and function expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Function name, absent for anonymous expressions.
    pub id: Option<Identifier>,
    /// Formal parameters (identifiers or patterns).
    pub params: Vec<Expression>,
    /// Function body.
    pub body: BlockStatement,
    /// `function*`
    #[serde(default)]
    pub generator: bool,
    /// `async function`
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

impl Function {
    /// Returns the names of the plain identifier parameters, in order.
    ///
    /// Pattern parameters yield `None` at their position.
    #[must_use]
    pub fn param_names(&self) -> Vec<Option<&str>> {
        self.params.iter().map(Expression::as_identifier).collect()
    }
}

/// Arrow function payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowFunction {
    /// Formal parameters (identifiers or patterns).
    pub params: Vec<Expression>,
    /// Block or concise expression body.
    pub body: ArrowBody,
    /// True when the body is a concise expression.
    #[serde(default)]
    pub expression: bool,
    /// `async () => {}`
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

/// Body of an [`ArrowFunction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrowBody {
    /// `=> { ... }`
    Block(BlockStatement),
    /// `=> expr`
    Expression(Box<Expression>),
}

/// Unary expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
    /// The operator.
    pub operator: UnaryOperator,
    /// Always true in ESTree; kept for round trips.
    #[serde(default = "default_true")]
    pub prefix: bool,
    /// The operand.
    pub argument: Box<Expression>,
}

/// Update expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateExpression {
    /// The operator.
    pub operator: UpdateOperator,
    /// `++x` when true, `x++` when false.
    pub prefix: bool,
    /// The operand.
    pub argument: Box<Expression>,
}

/// Binary expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    /// The operator.
    pub operator: BinaryOperator,
    /// Left operand.
    pub left: Box<Expression>,
    /// Right operand.
    pub right: Box<Expression>,
}

/// Logical expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalExpression {
    /// The operator.
    pub operator: LogicalOperator,
    /// Left operand.
    pub left: Box<Expression>,
    /// Right operand.
    pub right: Box<Expression>,
}

/// Assignment expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentExpression {
    /// The operator.
    pub operator: AssignmentOperator,
    /// Assignment target.
    pub left: Box<Expression>,
    /// Assigned value.
    pub right: Box<Expression>,
}

/// Conditional expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalExpression {
    /// Condition.
    pub test: Box<Expression>,
    /// Value when the condition holds.
    pub consequent: Box<Expression>,
    /// Value otherwise.
    pub alternate: Box<Expression>,
}

/// Call expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
    /// The called expression.
    pub callee: Box<Expression>,
    /// Actual arguments.
    pub arguments: Vec<Expression>,
    /// `callee?.(args)`
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
}

/// New expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpression {
    /// The constructor expression.
    pub callee: Box<Expression>,
    /// Actual arguments.
    pub arguments: Vec<Expression>,
}

/// Member expression payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberExpression {
    /// The accessed object.
    pub object: Box<Expression>,
    /// Identifier for dot access, arbitrary expression when `computed`.
    pub property: Box<Expression>,
    /// `object[property]`
    pub computed: bool,
    /// `object?.property`
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
}

impl MemberExpression {
    /// Returns the statically known property name: `obj.name` or `obj["name"]`.
    #[must_use]
    pub fn static_property(&self) -> Option<&str> {
        if self.computed {
            self.property.as_str_literal()
        } else {
            self.property.as_identifier()
        }
    }
}

/// Template literal payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLiteral {
    /// Literal text segments; always one more than `expressions`.
    pub quasis: Vec<TemplateElement>,
    /// Interpolated expressions.
    pub expressions: Vec<Expression>,
}

/// Text segment of a template literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct TemplateElement {
    /// Raw and cooked text.
    pub value: TemplateValue,
    /// True for the last segment.
    #[serde(default)]
    pub tail: bool,
}

/// Raw and cooked text of a [`TemplateElement`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateValue {
    /// Text as written in the source.
    pub raw: String,
    /// Text after escape processing; absent for invalid escapes in tagged templates.
    #[serde(default)]
    pub cooked: Option<String>,
}

fn default_true() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}
