//! Mutable depth-first traversal.
//!
//! Implement [`VisitMut`] and override the hooks you need; every hook has a no-op
//! default. The `walk_*` functions drive the traversal and call the hooks in this
//! order:
//!
//! - [`VisitMut::enter_statements`] before the statements of a list are walked. Returning
//!   [`Flow::Skip`] leaves the list's contents unvisited, so a visitor that rewrote the
//!   list is not handed its own output again.
//! - [`VisitMut::leave_statements`] after every statement of the list was walked.
//! - [`VisitMut::enter_function`] / [`VisitMut::leave_function`] around every function
//!   body (declarations, expressions, arrows).
//! - [`VisitMut::leave_expression`] after an expression's children. A returned
//!   replacement is written into the parent slot and is not visited.
//!
//! ```rust
//! use jsdeob::ast::{visit::{walk_program, VisitMut}, Expression, Program};
//!
//! struct CountIdentifiers(usize);
//!
//! impl VisitMut for CountIdentifiers {
//!     fn leave_expression(&mut self, expr: &mut Expression) -> Option<Expression> {
//!         if expr.as_identifier().is_some() {
//!             self.0 += 1;
//!         }
//!         None
//!     }
//! }
//!
//! let mut program = Program::new(Vec::new());
//! let mut counter = CountIdentifiers(0);
//! walk_program(&mut counter, &mut program);
//! assert_eq!(counter.0, 0);
//! ```

use crate::ast::{
    ArrowBody, BlockStatement, Expression, ForHead, Function, ObjectMember, Program, Statement,
    VariableDeclaration,
};

/// Whether the walker descends into a statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Walk the list's statements.
    Continue,
    /// Leave the list's statements unvisited.
    Skip,
}

/// Mutable AST visitor.
pub trait VisitMut: Sized {
    /// Called on a statement list before its statements are walked.
    fn enter_statements(&mut self, _stmts: &mut Vec<Statement>) -> Flow {
        Flow::Continue
    }

    /// Called on a statement list after its statements were walked.
    fn leave_statements(&mut self, _stmts: &mut Vec<Statement>) {}

    /// Called before a function's parameters and body are walked.
    ///
    /// `body` is `None` for arrow functions with an expression body.
    fn enter_function(&mut self, _params: &[Expression], _body: Option<&mut Vec<Statement>>) {}

    /// Called after a function's body was walked.
    fn leave_function(&mut self) {}

    /// Called after an expression's children were walked.
    fn leave_expression(&mut self, _expr: &mut Expression) -> Option<Expression> {
        None
    }
}

/// Walks a whole program.
pub fn walk_program<V: VisitMut>(v: &mut V, program: &mut Program) {
    walk_statements(v, &mut program.body);
}

/// Walks a statement list.
pub fn walk_statements<V: VisitMut>(v: &mut V, stmts: &mut Vec<Statement>) {
    if v.enter_statements(stmts) == Flow::Skip {
        return;
    }
    for stmt in stmts.iter_mut() {
        walk_statement(v, stmt);
    }
    v.leave_statements(stmts);
}

fn walk_block<V: VisitMut>(v: &mut V, block: &mut BlockStatement) {
    walk_statements(v, &mut block.body);
}

/// Walks a single statement.
pub fn walk_statement<V: VisitMut>(v: &mut V, stmt: &mut Statement) {
    match stmt {
        Statement::Expression { expression, .. } => walk_expression(v, expression),
        Statement::Block { body } => walk_statements(v, body),
        Statement::Return { argument } => walk_opt_expression(v, argument.as_mut()),
        Statement::Labeled { body, .. } => walk_statement(v, body),
        Statement::If {
            test,
            consequent,
            alternate,
        } => {
            walk_expression(v, test);
            walk_statement(v, consequent);
            if let Some(alternate) = alternate {
                walk_statement(v, alternate);
            }
        }
        Statement::Switch {
            discriminant,
            cases,
        } => {
            walk_expression(v, discriminant);
            for case in cases {
                walk_opt_expression(v, case.test.as_mut());
                walk_statements(v, &mut case.consequent);
            }
        }
        Statement::Throw { argument } => walk_expression(v, argument),
        Statement::Try {
            block,
            handler,
            finalizer,
        } => {
            walk_block(v, block);
            if let Some(handler) = handler {
                walk_opt_expression(v, handler.param.as_mut());
                walk_block(v, &mut handler.body);
            }
            if let Some(finalizer) = finalizer {
                walk_block(v, finalizer);
            }
        }
        Statement::While { test, body } | Statement::DoWhile { body, test } => {
            walk_expression(v, test);
            walk_statement(v, body);
        }
        Statement::For {
            init,
            test,
            update,
            body,
        } => {
            if let Some(init) = init {
                walk_for_head(v, init);
            }
            walk_opt_expression(v, test.as_mut());
            walk_opt_expression(v, update.as_mut());
            walk_statement(v, body);
        }
        Statement::ForIn { left, right, body } | Statement::ForOf { left, right, body, .. } => {
            walk_for_head(v, left);
            walk_expression(v, right);
            walk_statement(v, body);
        }
        Statement::FunctionDeclaration(func) => walk_function(v, func),
        Statement::VariableDeclaration(decl) => walk_variable_declaration(v, decl),
        Statement::Empty
        | Statement::Debugger
        | Statement::Break { .. }
        | Statement::Continue { .. }
        | Statement::Unknown(_) => {}
    }
}

fn walk_for_head<V: VisitMut>(v: &mut V, head: &mut ForHead) {
    match head {
        ForHead::VariableDeclaration(decl) => walk_variable_declaration(v, decl),
        ForHead::Expression(expr) => walk_expression(v, expr),
    }
}

fn walk_variable_declaration<V: VisitMut>(v: &mut V, decl: &mut VariableDeclaration) {
    for declarator in &mut decl.declarations {
        walk_expression(v, &mut declarator.id);
        walk_opt_expression(v, declarator.init.as_mut());
    }
}

/// Walks a function declaration or expression.
pub fn walk_function<V: VisitMut>(v: &mut V, func: &mut Function) {
    v.enter_function(&func.params, Some(&mut func.body.body));
    for param in &mut func.params {
        walk_expression(v, param);
    }
    walk_block(v, &mut func.body);
    v.leave_function();
}

fn walk_opt_expression<V: VisitMut>(v: &mut V, expr: Option<&mut Expression>) {
    if let Some(expr) = expr {
        walk_expression(v, expr);
    }
}

fn walk_members<V: VisitMut>(v: &mut V, members: &mut [ObjectMember]) {
    for member in members {
        match member {
            ObjectMember::Property(prop) => {
                if prop.computed {
                    walk_expression(v, &mut prop.key);
                }
                walk_expression(v, &mut prop.value);
            }
            ObjectMember::Spread { argument } | ObjectMember::Rest { argument } => {
                walk_expression(v, argument);
            }
            ObjectMember::Unknown(_) => {}
        }
    }
}

/// Walks an expression and applies the visitor's replacement, if any.
pub fn walk_expression<V: VisitMut>(v: &mut V, expr: &mut Expression) {
    match expr {
        Expression::Array { elements } | Expression::ArrayPattern { elements } => {
            for element in elements.iter_mut().flatten() {
                walk_expression(v, element);
            }
        }
        Expression::Object { properties } | Expression::ObjectPattern { properties } => {
            walk_members(v, properties);
        }
        Expression::FunctionExpression(func) => walk_function(v, func),
        Expression::Arrow(arrow) => {
            match &mut arrow.body {
                ArrowBody::Block(block) => v.enter_function(&arrow.params, Some(&mut block.body)),
                ArrowBody::Expression(_) => v.enter_function(&arrow.params, None),
            }
            for param in &mut arrow.params {
                walk_expression(v, param);
            }
            match &mut arrow.body {
                ArrowBody::Block(block) => walk_block(v, block),
                ArrowBody::Expression(body) => walk_expression(v, body),
            }
            v.leave_function();
        }
        Expression::Unary(unary) => walk_expression(v, &mut unary.argument),
        Expression::Update(update) => walk_expression(v, &mut update.argument),
        Expression::Binary(binary) => {
            walk_expression(v, &mut binary.left);
            walk_expression(v, &mut binary.right);
        }
        Expression::Logical(logical) => {
            walk_expression(v, &mut logical.left);
            walk_expression(v, &mut logical.right);
        }
        Expression::Assignment(assign) => {
            walk_expression(v, &mut assign.left);
            walk_expression(v, &mut assign.right);
        }
        Expression::AssignmentPattern { left, right } => {
            walk_expression(v, left);
            walk_expression(v, right);
        }
        Expression::Conditional(cond) => {
            walk_expression(v, &mut cond.test);
            walk_expression(v, &mut cond.consequent);
            walk_expression(v, &mut cond.alternate);
        }
        Expression::Call(call) => {
            walk_expression(v, &mut call.callee);
            for arg in &mut call.arguments {
                walk_expression(v, arg);
            }
        }
        Expression::New(new) => {
            walk_expression(v, &mut new.callee);
            for arg in &mut new.arguments {
                walk_expression(v, arg);
            }
        }
        Expression::Member(member) => {
            walk_expression(v, &mut member.object);
            if member.computed {
                walk_expression(v, &mut member.property);
            }
        }
        Expression::Sequence { expressions } => {
            for e in expressions {
                walk_expression(v, e);
            }
        }
        Expression::TemplateLiteral(template) => {
            for e in &mut template.expressions {
                walk_expression(v, e);
            }
        }
        Expression::TaggedTemplate { tag, quasi } => {
            walk_expression(v, tag);
            walk_expression(v, quasi);
        }
        Expression::Spread { argument } | Expression::RestElement { argument } => {
            walk_expression(v, argument);
        }
        Expression::Identifier { .. }
        | Expression::Literal(_)
        | Expression::This
        | Expression::Unknown(_) => {}
    }

    if let Some(replacement) = v.leave_expression(expr) {
        *expr = replacement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::{call, dot_member, expression_statement, ident, number, string};

    struct Renamer;

    impl VisitMut for Renamer {
        fn leave_expression(&mut self, expr: &mut Expression) -> Option<Expression> {
            match expr.as_identifier() {
                Some("a") => Some(ident("b")),
                // revisiting a replacement would swap it back
                Some("b") => Some(ident("a")),
                _ => None,
            }
        }
    }

    #[test]
    fn test_replacement_written_to_parent() {
        let mut program = Program::new(vec![expression_statement(call(
            ident("a"),
            vec![ident("a"), number(1.0)],
        ))]);
        walk_program(&mut Renamer, &mut program);
        assert_eq!(
            program.body[0],
            expression_statement(call(ident("b"), vec![ident("b"), number(1.0)]))
        );
    }

    #[test]
    fn test_dot_property_is_not_an_expression_slot() {
        let mut program = Program::new(vec![expression_statement(dot_member(ident("x"), "a"))]);
        walk_program(&mut Renamer, &mut program);
        assert_eq!(
            program.body[0],
            expression_statement(dot_member(ident("x"), "a"))
        );
    }

    struct SkipAll(usize);

    impl VisitMut for SkipAll {
        fn enter_statements(&mut self, _stmts: &mut Vec<Statement>) -> Flow {
            self.0 += 1;
            Flow::Skip
        }

        fn leave_expression(&mut self, _expr: &mut Expression) -> Option<Expression> {
            panic!("skipped list was visited");
        }
    }

    #[test]
    fn test_skip_leaves_list_unvisited() {
        let mut program = Program::new(vec![expression_statement(string("x"))]);
        let mut v = SkipAll(0);
        walk_program(&mut v, &mut program);
        assert_eq!(v.0, 1);
    }
}
