//! JavaScript source generation.
//!
//! Prints a [`Program`] back to JavaScript source text. Parentheses are inserted only
//! where operator precedence or statement-position rules require them, so rewritten
//! trees print the same way a hand-written program would.
//!
//! Statement bodies of `if` and loops are always printed as braced blocks.
//! This keeps the `else` binding unambiguous without tracking dangling-else context.
//!
//! # Examples
//!
//! ```rust
//! use jsdeob::{ast::{builders::*, Program}, codegen::{generate, GeneratorConfig}};
//!
//! let program = Program::new(vec![expression_statement(call(
//!     dot_member(ident("console"), "log"),
//!     vec![string("hello")],
//! ))]);
//! let source = generate(&program, &GeneratorConfig::default())?;
//! assert_eq!(source, "console.log(\"hello\");\n");
//! # Ok::<(), jsdeob::Error>(())
//! ```

use crate::{
    ast::{
        ArrowBody, BinaryOperator, BlockStatement, Expression, ForHead, Function, Literal,
        LiteralValue, LogicalOperator, ObjectMember, Program, Property, PropertyKind,
        Statement, TemplateLiteral, UnaryOperator, UpdateOperator, VariableDeclaration,
        unknown_kind,
    },
    Error, Result,
};

const SEQUENCE: u8 = 1;
const ASSIGN: u8 = 2;
const CONDITIONAL_TEST: u8 = 3;
const UNARY: u8 = 15;
const POSTFIX: u8 = 16;
const CALL: u8 = 17;
const MEMBER: u8 = 18;
const PRIMARY: u8 = 19;

/// Output formatting options.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Text used for one level of indentation.
    pub indent: String,
    /// Escape every non-ASCII character in string literals as `\uXXXX`.
    pub ascii_only: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            ascii_only: false,
        }
    }
}

impl GeneratorConfig {
    /// Indents with `width` spaces per level.
    #[must_use]
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    /// Indents with one tab per level.
    #[must_use]
    pub fn with_tabs(mut self) -> Self {
        self.indent = "\t".to_string();
        self
    }
}

/// Prints `program` as JavaScript source.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] when the tree contains a node kind outside the typed
/// model, since there is no source form to print for it.
pub fn generate(program: &Program, config: &GeneratorConfig) -> Result<String> {
    let mut generator = JsCodeGenerator::new(config);
    generator.emit_statements(&program.body)?;
    Ok(generator.finish())
}

/// Stateful printer behind [`generate`].
pub struct JsCodeGenerator<'a> {
    config: &'a GeneratorConfig,
    out: String,
    depth: usize,
}

impl<'a> JsCodeGenerator<'a> {
    /// Creates a printer with an empty output buffer.
    #[must_use]
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            out: String::new(),
            depth: 0,
        }
    }

    /// Returns the generated text.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    fn line_start(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(&self.config.indent);
        }
    }

    /// Prints each statement on its own line at the current depth.
    ///
    /// # Errors
    ///
    /// See [`generate`].
    pub fn emit_statements(&mut self, stmts: &[Statement]) -> Result<()> {
        for stmt in stmts {
            self.line_start();
            self.emit_statement(stmt)?;
            self.out.push('\n');
        }
        Ok(())
    }

    fn emit_block(&mut self, body: &[Statement]) -> Result<()> {
        if body.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }
        self.out.push_str("{\n");
        self.depth += 1;
        self.emit_statements(body)?;
        self.depth -= 1;
        self.line_start();
        self.out.push('}');
        Ok(())
    }

    fn emit_body(&mut self, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::Block { body } => self.emit_block(body),
            other => self.emit_block(std::slice::from_ref(other)),
        }
    }

    fn emit_statement(&mut self, stmt: &Statement) -> Result<()> {
        match stmt {
            Statement::Expression { expression, .. } => {
                if starts_ambiguously(expression) {
                    self.out.push('(');
                    self.emit_expression(expression, SEQUENCE)?;
                    self.out.push(')');
                } else {
                    self.emit_expression(expression, SEQUENCE)?;
                }
                self.out.push(';');
            }
            Statement::Block { body } => self.emit_block(body)?,
            Statement::Empty => self.out.push(';'),
            Statement::Debugger => self.out.push_str("debugger;"),
            Statement::Return { argument } => {
                self.out.push_str("return");
                if let Some(argument) = argument {
                    self.out.push(' ');
                    self.emit_expression(argument, SEQUENCE)?;
                }
                self.out.push(';');
            }
            Statement::Break { label } | Statement::Continue { label } => {
                self.out.push_str(if matches!(stmt, Statement::Break { .. }) {
                    "break"
                } else {
                    "continue"
                });
                if let Some(label) = label {
                    self.out.push(' ');
                    self.out.push_str(&label.name);
                }
                self.out.push(';');
            }
            Statement::Labeled { label, body } => {
                self.out.push_str(&label.name);
                self.out.push_str(": ");
                self.emit_statement(body)?;
            }
            Statement::If {
                test,
                consequent,
                alternate,
            } => {
                self.out.push_str("if (");
                self.emit_expression(test, SEQUENCE)?;
                self.out.push_str(") ");
                self.emit_body(consequent)?;
                if let Some(alternate) = alternate {
                    self.out.push_str(" else ");
                    if matches!(**alternate, Statement::If { .. }) {
                        self.emit_statement(alternate)?;
                    } else {
                        self.emit_body(alternate)?;
                    }
                }
            }
            Statement::Switch {
                discriminant,
                cases,
            } => {
                self.out.push_str("switch (");
                self.emit_expression(discriminant, SEQUENCE)?;
                self.out.push_str(") {\n");
                self.depth += 1;
                for case in cases {
                    self.line_start();
                    match &case.test {
                        Some(test) => {
                            self.out.push_str("case ");
                            self.emit_expression(test, SEQUENCE)?;
                            self.out.push_str(":\n");
                        }
                        None => self.out.push_str("default:\n"),
                    }
                    self.depth += 1;
                    self.emit_statements(&case.consequent)?;
                    self.depth -= 1;
                }
                self.depth -= 1;
                self.line_start();
                self.out.push('}');
            }
            Statement::Throw { argument } => {
                self.out.push_str("throw ");
                self.emit_expression(argument, SEQUENCE)?;
                self.out.push(';');
            }
            Statement::Try {
                block,
                handler,
                finalizer,
            } => {
                self.out.push_str("try ");
                self.emit_block(&block.body)?;
                if let Some(handler) = handler {
                    self.out.push_str(" catch ");
                    if let Some(param) = &handler.param {
                        self.out.push('(');
                        self.emit_expression(param, ASSIGN)?;
                        self.out.push_str(") ");
                    }
                    self.emit_block(&handler.body.body)?;
                }
                if let Some(finalizer) = finalizer {
                    self.out.push_str(" finally ");
                    self.emit_block(&finalizer.body)?;
                }
            }
            Statement::While { test, body } => {
                self.out.push_str("while (");
                self.emit_expression(test, SEQUENCE)?;
                self.out.push_str(") ");
                self.emit_body(body)?;
            }
            Statement::DoWhile { body, test } => {
                self.out.push_str("do ");
                self.emit_body(body)?;
                self.out.push_str(" while (");
                self.emit_expression(test, SEQUENCE)?;
                self.out.push_str(");");
            }
            Statement::For {
                init,
                test,
                update,
                body,
            } => {
                self.out.push_str("for (");
                if let Some(init) = init {
                    self.emit_for_head(init, true)?;
                }
                self.out.push(';');
                if let Some(test) = test {
                    self.out.push(' ');
                    self.emit_expression(test, SEQUENCE)?;
                }
                self.out.push(';');
                if let Some(update) = update {
                    self.out.push(' ');
                    self.emit_expression(update, SEQUENCE)?;
                }
                self.out.push_str(") ");
                self.emit_body(body)?;
            }
            Statement::ForIn { left, right, body } => {
                self.out.push_str("for (");
                self.emit_for_head(left, false)?;
                self.out.push_str(" in ");
                self.emit_expression(right, SEQUENCE)?;
                self.out.push_str(") ");
                self.emit_body(body)?;
            }
            Statement::ForOf {
                left,
                right,
                body,
                is_await,
            } => {
                self.out
                    .push_str(if *is_await { "for await (" } else { "for (" });
                self.emit_for_head(left, false)?;
                self.out.push_str(" of ");
                self.emit_expression(right, ASSIGN)?;
                self.out.push_str(") ");
                self.emit_body(body)?;
            }
            Statement::FunctionDeclaration(func) => self.emit_function(func)?,
            Statement::VariableDeclaration(decl) => {
                self.emit_variable_declaration(decl)?;
                self.out.push(';');
            }
            Statement::Unknown(_) => return Err(Error::Unsupported(stmt.kind().to_string())),
        }
        Ok(())
    }

    fn emit_for_head(&mut self, head: &ForHead, guard_in: bool) -> Result<()> {
        match head {
            ForHead::VariableDeclaration(decl) => self.emit_variable_declaration(decl),
            ForHead::Expression(expr) => {
                let wrap = guard_in
                    && matches!(expr, Expression::Binary(b) if b.operator == BinaryOperator::In);
                if wrap {
                    self.out.push('(');
                }
                self.emit_expression(expr, SEQUENCE)?;
                if wrap {
                    self.out.push(')');
                }
                Ok(())
            }
        }
    }

    fn emit_variable_declaration(&mut self, decl: &VariableDeclaration) -> Result<()> {
        self.out.push_str(decl.kind.as_str());
        self.out.push(' ');
        for (i, declarator) in decl.declarations.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.emit_expression(&declarator.id, ASSIGN)?;
            if let Some(init) = &declarator.init {
                self.out.push_str(" = ");
                self.emit_expression(init, ASSIGN)?;
            }
        }
        Ok(())
    }

    fn emit_function(&mut self, func: &Function) -> Result<()> {
        if func.is_async {
            self.out.push_str("async ");
        }
        self.out.push_str("function");
        if func.generator {
            self.out.push('*');
        }
        if let Some(id) = &func.id {
            self.out.push(' ');
            self.out.push_str(&id.name);
        }
        self.emit_params(&func.params)?;
        self.out.push(' ');
        self.emit_block(&func.body.body)
    }

    fn emit_params(&mut self, params: &[Expression]) -> Result<()> {
        self.out.push('(');
        self.emit_list(params, ASSIGN)?;
        self.out.push(')');
        Ok(())
    }

    fn emit_list(&mut self, items: &[Expression], min: u8) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.emit_expression(item, min)?;
        }
        Ok(())
    }

    fn emit_elements(&mut self, elements: &[Option<Expression>]) -> Result<()> {
        self.out.push('[');
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            match element {
                Some(element) => self.emit_expression(element, ASSIGN)?,
                None if i + 1 == elements.len() => self.out.push(','),
                None => {}
            }
        }
        self.out.push(']');
        Ok(())
    }

    fn emit_members(&mut self, members: &[ObjectMember]) -> Result<()> {
        if members.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }
        self.out.push_str("{ ");
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            match member {
                ObjectMember::Property(prop) => self.emit_property(prop)?,
                ObjectMember::Spread { argument } | ObjectMember::Rest { argument } => {
                    self.out.push_str("...");
                    self.emit_expression(argument, ASSIGN)?;
                }
                ObjectMember::Unknown(value) => {
                    return Err(Error::Unsupported(unknown_kind(value).to_string()));
                }
            }
        }
        self.out.push_str(" }");
        Ok(())
    }

    fn emit_property_key(&mut self, prop: &Property) -> Result<()> {
        if prop.computed {
            self.out.push('[');
            self.emit_expression(&prop.key, ASSIGN)?;
            self.out.push(']');
            Ok(())
        } else {
            self.emit_expression(&prop.key, PRIMARY)
        }
    }

    fn emit_property(&mut self, prop: &Property) -> Result<()> {
        let method = match (&prop.value, prop.kind) {
            (Expression::FunctionExpression(func), PropertyKind::Get | PropertyKind::Set) => {
                let keyword = if prop.kind == PropertyKind::Get {
                    "get "
                } else {
                    "set "
                };
                Some((keyword, func))
            }
            (Expression::FunctionExpression(func), PropertyKind::Init) if prop.method => {
                Some(("", func))
            }
            _ => None,
        };

        if let Some((keyword, func)) = method {
            self.out.push_str(keyword);
            if func.is_async {
                self.out.push_str("async ");
            }
            if func.generator {
                self.out.push('*');
            }
            self.emit_property_key(prop)?;
            self.emit_params(&func.params)?;
            self.out.push(' ');
            return self.emit_block(&func.body.body);
        }

        if prop.shorthand {
            return self.emit_expression(&prop.value, ASSIGN);
        }
        self.emit_property_key(prop)?;
        self.out.push_str(": ");
        self.emit_expression(&prop.value, ASSIGN)
    }

    /// Prints `expr`, parenthesized when it binds looser than `min`.
    fn emit_expression(&mut self, expr: &Expression, min: u8) -> Result<()> {
        let wrap = precedence(expr) < min;
        if wrap {
            self.out.push('(');
        }
        self.emit_unwrapped(expr)?;
        if wrap {
            self.out.push(')');
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn emit_unwrapped(&mut self, expr: &Expression) -> Result<()> {
        match expr {
            Expression::Identifier { name } => self.out.push_str(name),
            Expression::Literal(lit) => self.emit_literal(lit),
            Expression::This => self.out.push_str("this"),
            Expression::Array { elements } | Expression::ArrayPattern { elements } => {
                self.emit_elements(elements)?;
            }
            Expression::Object { properties } | Expression::ObjectPattern { properties } => {
                self.emit_members(properties)?;
            }
            Expression::FunctionExpression(func) => self.emit_function(func)?,
            Expression::Arrow(arrow) => {
                if arrow.is_async {
                    self.out.push_str("async ");
                }
                self.emit_params(&arrow.params)?;
                self.out.push_str(" => ");
                match &arrow.body {
                    ArrowBody::Block(BlockStatement { body }) => self.emit_block(body)?,
                    ArrowBody::Expression(body) => {
                        if starts_ambiguously(body) {
                            self.out.push('(');
                            self.emit_expression(body, SEQUENCE)?;
                            self.out.push(')');
                        } else {
                            self.emit_expression(body, ASSIGN)?;
                        }
                    }
                }
            }
            Expression::Unary(unary) => {
                self.out.push_str(unary.operator.into());
                if unary.operator.is_keyword() || needs_sign_space(unary.operator, &unary.argument)
                {
                    self.out.push(' ');
                }
                self.emit_expression(&unary.argument, UNARY)?;
            }
            Expression::Update(update) => {
                let token: &'static str = update.operator.into();
                if update.prefix {
                    self.out.push_str(token);
                    self.emit_expression(&update.argument, UNARY)?;
                } else {
                    self.emit_expression(&update.argument, CALL)?;
                    self.out.push_str(token);
                }
            }
            Expression::Binary(binary) => {
                let prec = binary.operator.precedence();
                let (left_min, right_min) = if binary.operator == BinaryOperator::Exp {
                    (POSTFIX, prec)
                } else {
                    (prec, prec + 1)
                };
                self.emit_expression(&binary.left, left_min)?;
                self.out.push(' ');
                self.out.push_str(binary.operator.into());
                self.out.push(' ');
                self.emit_expression(&binary.right, right_min)?;
            }
            Expression::Logical(logical) => {
                let prec = logical.operator.precedence();
                // `??` cannot be mixed with `||` / `&&` without parentheses
                let (left_min, right_min) = if logical.operator == LogicalOperator::Coalesce {
                    (LogicalOperator::And.precedence() + 1, LogicalOperator::And.precedence() + 1)
                } else {
                    (prec, prec + 1)
                };
                self.emit_expression(&logical.left, left_min)?;
                self.out.push(' ');
                self.out.push_str(logical.operator.into());
                self.out.push(' ');
                self.emit_expression(&logical.right, right_min)?;
            }
            Expression::Assignment(assign) => {
                self.emit_expression(&assign.left, CALL)?;
                self.out.push(' ');
                self.out.push_str(assign.operator.into());
                self.out.push(' ');
                self.emit_expression(&assign.right, ASSIGN)?;
            }
            Expression::AssignmentPattern { left, right } => {
                self.emit_expression(left, CALL)?;
                self.out.push_str(" = ");
                self.emit_expression(right, ASSIGN)?;
            }
            Expression::Conditional(cond) => {
                self.emit_expression(&cond.test, CONDITIONAL_TEST)?;
                self.out.push_str(" ? ");
                self.emit_expression(&cond.consequent, ASSIGN)?;
                self.out.push_str(" : ");
                self.emit_expression(&cond.alternate, ASSIGN)?;
            }
            Expression::Call(call) => {
                self.emit_expression(&call.callee, CALL)?;
                if call.optional {
                    self.out.push_str("?.");
                }
                self.out.push('(');
                self.emit_list(&call.arguments, ASSIGN)?;
                self.out.push(')');
            }
            Expression::New(new) => {
                self.out.push_str("new ");
                if contains_call(&new.callee) {
                    self.out.push('(');
                    self.emit_expression(&new.callee, SEQUENCE)?;
                    self.out.push(')');
                } else {
                    self.emit_expression(&new.callee, MEMBER)?;
                }
                self.out.push('(');
                self.emit_list(&new.arguments, ASSIGN)?;
                self.out.push(')');
            }
            Expression::Member(member) => {
                let bare_integer = member.object.as_number_literal().is_some_and(|n| {
                    n.fract() == 0.0 && n.is_finite() && n >= 0.0
                });
                if bare_integer && !member.computed {
                    self.out.push('(');
                    self.emit_unwrapped(&member.object)?;
                    self.out.push(')');
                } else {
                    self.emit_expression(&member.object, CALL)?;
                }
                match (member.computed, member.optional) {
                    (true, true) => self.out.push_str("?.["),
                    (true, false) => self.out.push('['),
                    (false, true) => self.out.push_str("?."),
                    (false, false) => self.out.push('.'),
                }
                if member.computed {
                    self.emit_expression(&member.property, SEQUENCE)?;
                    self.out.push(']');
                } else {
                    self.emit_expression(&member.property, PRIMARY)?;
                }
            }
            Expression::Sequence { expressions } => self.emit_list(expressions, ASSIGN)?,
            Expression::TemplateLiteral(template) => self.emit_template(template)?,
            Expression::TaggedTemplate { tag, quasi } => {
                self.emit_expression(tag, CALL)?;
                self.emit_expression(quasi, PRIMARY)?;
            }
            Expression::Spread { argument } | Expression::RestElement { argument } => {
                self.out.push_str("...");
                self.emit_expression(argument, ASSIGN)?;
            }
            Expression::Unknown(_) => return Err(Error::Unsupported(expr.kind().to_string())),
        }
        Ok(())
    }

    fn emit_template(&mut self, template: &TemplateLiteral) -> Result<()> {
        self.out.push('`');
        for (i, quasi) in template.quasis.iter().enumerate() {
            self.out.push_str(&quasi.value.raw);
            if let Some(expr) = template.expressions.get(i) {
                self.out.push_str("${");
                self.emit_expression(expr, SEQUENCE)?;
                self.out.push('}');
            }
        }
        self.out.push('`');
        Ok(())
    }

    fn emit_literal(&mut self, lit: &Literal) {
        if let Some(regex) = &lit.regex {
            self.out.push('/');
            self.out.push_str(&regex.pattern);
            self.out.push('/');
            self.out.push_str(&regex.flags);
            return;
        }
        if let Some(bigint) = &lit.bigint {
            self.out.push_str(bigint);
            self.out.push('n');
            return;
        }
        match &lit.value {
            LiteralValue::Null => self.out.push_str("null"),
            LiteralValue::Boolean(b) => self.out.push_str(if *b { "true" } else { "false" }),
            LiteralValue::Number(n) => match &lit.raw {
                // keeps hex and exponent spellings of untouched literals
                Some(raw) => self.out.push_str(raw),
                None => self.out.push_str(&format_number(*n)),
            },
            LiteralValue::String(s) => {
                let quoted = quote_string(s, self.config.ascii_only);
                self.out.push_str(&quoted);
            }
            LiteralValue::Opaque(_) => match &lit.raw {
                Some(raw) => self.out.push_str(raw),
                None => self.out.push_str("undefined"),
            },
        }
    }
}

fn precedence(expr: &Expression) -> u8 {
    match expr {
        Expression::Sequence { .. } => SEQUENCE,
        Expression::Arrow(_)
        | Expression::Assignment(_)
        | Expression::Conditional(_)
        | Expression::AssignmentPattern { .. }
        | Expression::Spread { .. }
        | Expression::RestElement { .. } => ASSIGN,
        Expression::Logical(logical) => logical.operator.precedence(),
        Expression::Binary(binary) => binary.operator.precedence(),
        Expression::Unary(_) => UNARY,
        Expression::Update(update) if update.prefix => UNARY,
        Expression::Update(_) => POSTFIX,
        Expression::Call(_) | Expression::New(_) | Expression::TaggedTemplate { .. } => CALL,
        Expression::Member(_) => MEMBER,
        Expression::Literal(lit) => match lit.value {
            LiteralValue::Number(n) if n.is_sign_negative() && n != 0.0 => UNARY,
            _ => PRIMARY,
        },
        Expression::Identifier { .. }
        | Expression::This
        | Expression::Array { .. }
        | Expression::Object { .. }
        | Expression::FunctionExpression(_)
        | Expression::TemplateLiteral(_)
        | Expression::ArrayPattern { .. }
        | Expression::ObjectPattern { .. }
        | Expression::Unknown(_) => PRIMARY,
    }
}

/// True when printing `expr` first in a statement would read as a block or a
/// function declaration.
fn starts_ambiguously(expr: &Expression) -> bool {
    match leftmost(expr) {
        Expression::Object { .. }
        | Expression::ObjectPattern { .. }
        | Expression::FunctionExpression(_) => true,
        _ => false,
    }
}

fn leftmost(expr: &Expression) -> &Expression {
    match expr {
        Expression::Binary(b) => leftmost(&b.left),
        Expression::Logical(l) => leftmost(&l.left),
        Expression::Assignment(a) => leftmost(&a.left),
        Expression::Conditional(c) => leftmost(&c.test),
        Expression::Call(c) => leftmost(&c.callee),
        Expression::Member(m) => leftmost(&m.object),
        Expression::Sequence { expressions } => expressions.first().map_or(expr, leftmost),
        Expression::Update(u) if !u.prefix => leftmost(&u.argument),
        Expression::TaggedTemplate { tag, .. } => leftmost(tag),
        _ => expr,
    }
}

fn contains_call(expr: &Expression) -> bool {
    match expr {
        Expression::Call(_) => true,
        Expression::Member(m) => contains_call(&m.object),
        Expression::TaggedTemplate { tag, .. } => contains_call(tag),
        _ => false,
    }
}

/// `- -x` and `+ +x` must not fuse into `--x` / `++x`.
fn needs_sign_space(op: UnaryOperator, argument: &Expression) -> bool {
    let sign = match op {
        UnaryOperator::Minus => '-',
        UnaryOperator::Plus => '+',
        _ => return false,
    };
    match argument {
        Expression::Unary(inner) => {
            matches!((op, inner.operator), (UnaryOperator::Minus, UnaryOperator::Minus))
                || matches!((op, inner.operator), (UnaryOperator::Plus, UnaryOperator::Plus))
        }
        Expression::Update(update) if update.prefix => matches!(
            (sign, update.operator),
            ('-', UpdateOperator::Decrement) | ('+', UpdateOperator::Increment)
        ),
        Expression::Literal(Literal {
            value: LiteralValue::Number(n),
            ..
        }) => sign == '-' && n.is_sign_negative(),
        _ => false,
    }
}

/// Formats a number the way JavaScript prints it for integral and common values.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// Quotes `s` as a double-quoted JavaScript string literal.
#[must_use]
pub fn quote_string(s: &str, ascii_only: bool) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if ascii_only && !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
