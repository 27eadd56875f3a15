//! Loop reconstruction.
//!
//! Rewrites endless loops that exit through a trailing `if` back into loops with a
//! condition:
//!
//! ```text
//! while (true) {              while (!(i >= n)) {
//!     step();                     step();
//!     if (i >= n) {      =>   }
//!         done();             done();
//!         break;
//!     }
//! }
//! ```
//!
//! The `break` may also sit at the end of an `else` branch, in which case the `if`
//! test becomes the loop test and the `then` branch joins the loop body. The rewrite
//! tests the condition before the first iteration rather than after the body, so it is
//! only approximately equivalent and the pass is disabled by default.

use log::{debug, info, warn};

use crate::{
    ast::{
        builders,
        visit::{walk_program, VisitMut},
        Expression, Program, Statement,
    },
    deobfuscation::{passes::utils::ScopeTracker, AstPass, EventKind, EventLog},
    Result,
};

/// Where the exiting `break` was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// `if (t) { ...; break; }` without `else`.
    Then,
    /// `if (t) { ... } else { ...; break; }`
    Else,
}

/// Returns true for `while (<truthy constant>)`.
#[must_use]
pub fn is_constant_true_loop(stmt: &Statement) -> bool {
    matches!(stmt, Statement::While { test, .. } if test.is_truthy_constant())
}

fn branch(stmt: &Statement) -> &[Statement] {
    match stmt {
        Statement::Block { body } => body,
        other => std::slice::from_ref(other),
    }
}

fn into_branch(stmt: Statement) -> Vec<Statement> {
    match stmt {
        Statement::Block { body } => body,
        other => vec![other],
    }
}

fn ends_in_break(stmts: &[Statement]) -> bool {
    stmts.last().is_some_and(Statement::is_plain_break)
}

/// Checks for an unlabeled `continue` (and `break`, if `breaks` is set) that would
/// transfer control to the loop enclosing `stmts`.
fn jumps_to_loop(stmts: &[Statement], breaks: bool) -> bool {
    stmts.iter().any(|s| stmt_jumps_to_loop(s, breaks, false))
}

fn stmt_jumps_to_loop(stmt: &Statement, breaks: bool, in_switch: bool) -> bool {
    let any = |stmts: &[Statement], in_switch: bool| {
        stmts
            .iter()
            .any(|s| stmt_jumps_to_loop(s, breaks, in_switch))
    };
    match stmt {
        Statement::Continue { label: None } => true,
        Statement::Break { label: None } => breaks && !in_switch,
        Statement::Block { body } => any(body, in_switch),
        Statement::Labeled { body, .. } => stmt_jumps_to_loop(body, breaks, in_switch),
        Statement::If {
            consequent,
            alternate,
            ..
        } => {
            stmt_jumps_to_loop(consequent, breaks, in_switch)
                || alternate
                    .as_ref()
                    .is_some_and(|alt| stmt_jumps_to_loop(alt, breaks, in_switch))
        }
        Statement::Switch { cases, .. } => cases.iter().any(|c| any(&c.consequent, true)),
        Statement::Try {
            block,
            handler,
            finalizer,
        } => {
            any(&block.body, in_switch)
                || handler.as_ref().is_some_and(|h| any(&h.body.body, in_switch))
                || finalizer.as_ref().is_some_and(|f| any(&f.body, in_switch))
        }
        _ => false,
    }
}

/// Rebuilds `while(true)` plus `break` loops with their exit condition.
#[derive(Debug, Default)]
pub struct LoopReconstructor;

impl LoopReconstructor {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AstPass for LoopReconstructor {
    fn name(&self) -> &'static str {
        "loops"
    }

    fn description(&self) -> &'static str {
        "Rebuilds while(true) loops that exit through a trailing if/break"
    }

    fn run(&mut self, program: &mut Program, events: &EventLog) -> Result<bool> {
        let mut rebuilder = Rebuilder {
            scopes: ScopeTracker::new(),
            events,
            pass: self.name(),
            rebuilt: 0,
        };
        walk_program(&mut rebuilder, program);

        if rebuilder.rebuilt > 0 {
            info!("loops: {} loops reconstructed", rebuilder.rebuilt);
        }
        Ok(rebuilder.rebuilt > 0)
    }
}

struct Rebuilder<'a> {
    scopes: ScopeTracker,
    events: &'a EventLog,
    pass: &'static str,
    rebuilt: usize,
}

impl Rebuilder<'_> {
    /// Decides whether the loop at `location` can be rebuilt.
    fn classify(&self, stmt: &Statement, location: usize) -> Option<Exit> {
        let Statement::While { test, body } = stmt else {
            return None;
        };
        if !test.is_truthy_constant() {
            return None;
        }
        let Statement::Block { body } = body.as_ref() else {
            return None;
        };
        let Some((
            Statement::If {
                consequent,
                alternate,
                ..
            },
            head,
        )) = body.split_last()
        else {
            return None;
        };

        let then_branch = branch(consequent);
        let else_branch = alternate.as_deref().map(branch);
        let scope = self.scopes.label();

        let (exit, retained_tail, spliced) = match else_branch {
            None if ends_in_break(then_branch) => {
                (Exit::Then, &[][..], &then_branch[..then_branch.len() - 1])
            }
            Some(else_branch) if ends_in_break(else_branch) && !ends_in_break(then_branch) => {
                (Exit::Else, then_branch, &else_branch[..else_branch.len() - 1])
            }
            Some(_) if ends_in_break(then_branch) => {
                warn!("loops: break in then-branch with else in {scope}, not rebuilt");
                self.events
                    .record(EventKind::Warning)
                    .at(scope, location)
                    .pass(self.pass)
                    .message("loop exits from the then-branch of an if/else");
                return None;
            }
            _ => return None,
        };

        if jumps_to_loop(head, false) || jumps_to_loop(retained_tail, false) {
            debug!("loops: body in {scope} continues the loop, not rebuilt");
            return None;
        }
        if jumps_to_loop(spliced, true) {
            debug!("loops: exit path in {scope} jumps to the loop, not rebuilt");
            return None;
        }
        // spliced statements must only run on the rebuilt exit
        if !spliced.is_empty() && (jumps_to_loop(head, true) || jumps_to_loop(retained_tail, true)) {
            debug!("loops: body in {scope} has another exit, not rebuilt");
            return None;
        }
        Some(exit)
    }

    /// Rewrites a loop accepted by `classify` in place and returns the statements to
    /// splice after it.
    fn rebuild(stmt: &mut Statement, exit: Exit) -> Option<Vec<Statement>> {
        let Statement::While { test, body } = stmt else {
            return None;
        };
        let Statement::Block { body: stmts } = body.as_mut() else {
            return None;
        };
        if !matches!(stmts.last(), Some(Statement::If { .. })) {
            return None;
        }
        let Some(Statement::If {
            test: exit_test,
            consequent,
            alternate,
        }) = stmts.pop()
        else {
            return None;
        };

        let mut spliced = match alternate {
            Some(alternate) if exit == Exit::Else => {
                stmts.extend(into_branch(*consequent));
                *test = exit_test;
                into_branch(*alternate)
            }
            _ => {
                *test = builders::negate(exit_test);
                into_branch(*consequent)
            }
        };
        spliced.pop();
        Some(spliced)
    }
}

impl VisitMut for Rebuilder<'_> {
    fn enter_function(&mut self, _params: &[Expression], _body: Option<&mut Vec<Statement>>) {
        self.scopes.enter();
    }

    fn leave_function(&mut self) {
        self.scopes.leave();
    }

    fn leave_statements(&mut self, stmts: &mut Vec<Statement>) {
        let mut i = 0;
        while i < stmts.len() {
            if let Some(exit) = self.classify(&stmts[i], i) {
                if let Some(spliced) = Self::rebuild(&mut stmts[i], exit) {
                    let count = spliced.len();
                    let tail = stmts.split_off(i + 1);
                    stmts.extend(spliced);
                    stmts.extend(tail);

                    self.rebuilt += 1;
                    self.events
                        .record(EventKind::LoopReconstructed)
                        .at(self.scopes.label(), i)
                        .pass(self.pass)
                        .message(match exit {
                            Exit::Then => "exit in then-branch",
                            Exit::Else => "exit in else-branch",
                        });
                    i += count;
                }
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn id(name: &str) -> Value {
        json!({"type": "Identifier", "name": name})
    }

    fn call_stmt(name: &str) -> Value {
        json!({"type": "ExpressionStatement", "expression": {
            "type": "CallExpression", "callee": id(name), "arguments": []
        }})
    }

    fn brk() -> Value {
        json!({"type": "BreakStatement", "label": null})
    }

    fn block(body: Vec<Value>) -> Value {
        json!({"type": "BlockStatement", "body": body})
    }

    fn lt(l: &str, r: &str) -> Value {
        json!({"type": "BinaryExpression", "operator": "<", "left": id(l), "right": id(r)})
    }

    fn if_stmt(test: Value, then: Value, otherwise: Option<Value>) -> Value {
        json!({"type": "IfStatement", "test": test, "consequent": then, "alternate": otherwise})
    }

    fn while_stmt(test: Value, body: Vec<Value>) -> Value {
        json!({"type": "WhileStatement", "test": test, "body": block(body)})
    }

    fn truthy() -> Value {
        json!({"type": "Literal", "value": true, "raw": "true"})
    }

    fn program(body: Vec<Value>) -> Program {
        Program::from_value(json!({"type": "Program", "sourceType": "script", "body": body})).unwrap()
    }

    fn run(program: &mut Program) -> EventLog {
        let events = EventLog::new();
        LoopReconstructor::new().run(program, &events).unwrap();
        events
    }

    #[test]
    fn test_break_without_else() {
        let mut actual = program(vec![while_stmt(truthy(), vec![
            call_stmt("step"),
            if_stmt(lt("n", "i"), block(vec![call_stmt("done"), brk()]), None),
        ])]);
        let events = run(&mut actual);

        let negated = json!({"type": "UnaryExpression", "operator": "!", "prefix": true, "argument": lt("n", "i")});
        let expected = program(vec![while_stmt(negated, vec![call_stmt("step")]), call_stmt("done")]);
        assert_eq!(actual, expected);
        let event = events.filter_kind(EventKind::LoopReconstructed).next().unwrap();
        assert_eq!(event.scope.as_deref(), Some("program"));
        assert_eq!(event.location, Some(0));
    }

    #[test]
    fn test_negated_test_is_unwrapped() {
        let not_ok = json!({"type": "UnaryExpression", "operator": "!", "prefix": true, "argument": id("ok")});
        let numeric_true = json!({"type": "Literal", "value": 1, "raw": "1"});
        let mut actual = program(vec![while_stmt(numeric_true, vec![
            call_stmt("step"),
            if_stmt(not_ok, brk(), None),
        ])]);
        run(&mut actual);
        assert_eq!(actual, program(vec![while_stmt(id("ok"), vec![call_stmt("step")])]));
    }

    #[test]
    fn test_break_in_else() {
        let mut actual = program(vec![
            call_stmt("before"),
            while_stmt(truthy(), vec![
                call_stmt("step"),
                if_stmt(
                    lt("i", "n"),
                    block(vec![call_stmt("advance")]),
                    Some(block(vec![call_stmt("finish"), brk()])),
                ),
            ]),
            call_stmt("after"),
        ]);
        run(&mut actual);

        let expected = program(vec![
            call_stmt("before"),
            while_stmt(lt("i", "n"), vec![call_stmt("step"), call_stmt("advance")]),
            call_stmt("finish"),
            call_stmt("after"),
        ]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_break_in_then_with_else_is_declined() {
        let original = program(vec![while_stmt(truthy(), vec![if_stmt(
            lt("i", "n"),
            block(vec![brk()]),
            Some(block(vec![call_stmt("step")])),
        )])]);
        let mut actual = original.clone();
        let events = run(&mut actual);

        assert_eq!(actual, original);
        assert_eq!(events.warnings().count(), 1);
    }

    #[test]
    fn test_continue_in_body_is_declined() {
        let original = program(vec![while_stmt(truthy(), vec![
            if_stmt(id("skip"), json!({"type": "ContinueStatement", "label": null}), None),
            if_stmt(id("done"), brk(), None),
        ])]);
        let mut actual = original.clone();
        run(&mut actual);
        assert_eq!(actual, original);
    }

    #[test]
    fn test_earlier_break_keeps_exit_statements_in_loop() {
        let original = program(vec![while_stmt(truthy(), vec![
            if_stmt(id("a"), brk(), None),
            call_stmt("step"),
            if_stmt(id("c"), block(vec![call_stmt("done"), brk()]), None),
        ])]);
        let mut actual = original.clone();
        let events = run(&mut actual);

        assert_eq!(actual, original);
        assert_eq!(events.count_kind(EventKind::LoopReconstructed), 0);
    }

    #[test]
    fn test_nested_break_in_then_keeps_else_statements_in_loop() {
        let original = program(vec![while_stmt(truthy(), vec![if_stmt(
            id("c"),
            block(vec![if_stmt(id("a"), brk(), None), call_stmt("step")]),
            Some(block(vec![call_stmt("done"), brk()])),
        )])]);
        let mut actual = original.clone();
        run(&mut actual);
        assert_eq!(actual, original);
    }

    #[test]
    fn test_earlier_break_allowed_without_exit_statements() {
        let mut actual = program(vec![while_stmt(truthy(), vec![
            if_stmt(id("a"), brk(), None),
            call_stmt("step"),
            if_stmt(id("c"), brk(), None),
        ])]);
        run(&mut actual);

        let negated = json!({"type": "UnaryExpression", "operator": "!", "prefix": true, "argument": id("c")});
        let expected = program(vec![while_stmt(negated, vec![
            if_stmt(id("a"), brk(), None),
            call_stmt("step"),
        ])]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_continue_of_inner_loop_is_allowed() {
        let inner = while_stmt(id("more"), vec![json!({"type": "ContinueStatement", "label": null})]);
        let mut actual = program(vec![while_stmt(truthy(), vec![
            inner.clone(),
            if_stmt(id("done"), brk(), None),
        ])]);
        run(&mut actual);

        let negated = json!({"type": "UnaryExpression", "operator": "!", "prefix": true, "argument": id("done")});
        assert_eq!(actual, program(vec![while_stmt(negated, vec![inner])]));
    }

    #[test]
    fn test_non_constant_loop_is_untouched() {
        let original = program(vec![while_stmt(id("running"), vec![if_stmt(id("done"), brk(), None)])]);
        let mut actual = original.clone();
        run(&mut actual);
        assert_eq!(actual, original);
    }

    #[test]
    fn test_constant_true_loop_detection() {
        let p = program(vec![
            while_stmt(truthy(), vec![]),
            while_stmt(id("x"), vec![]),
        ]);
        assert!(is_constant_true_loop(&p.body[0]));
        assert!(!is_constant_true_loop(&p.body[1]));
    }
}
