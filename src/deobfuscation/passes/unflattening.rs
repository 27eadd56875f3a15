//! Control-flow unflattening.
//!
//! Flattened code moves each statement of a block into a `case` of one `switch`
//! inside an endless loop. The execution order is a pipe-delimited string split at
//! the top of the block:
//!
//! ```text
//! var _0x5c = "2|0|1".split("|"), _0x3e = 0;
//! while (true) {
//!     switch (_0x5c[_0x3e++]) {
//!         case "0": b(); continue;
//!         case "1": c(); continue;
//!         case "2": a(); continue;
//!     }
//!     break;
//! }
//! ```
//!
//! The pass replaces the whole block with the case bodies concatenated in that order
//! (`a(); b(); c();`), dropping the `continue` statements. Cases are selected by
//! position in the `switch`, not by their test value. A rewritten block is not
//! re-entered, so dispatchers nested inside case bodies are reached by the next run.

use log::{debug, info};

use crate::{
    ast::{
        visit::{walk_program, Flow, VisitMut},
        Expression, Program, Statement, SwitchCase,
    },
    deobfuscation::{passes::utils::ScopeTracker, AstPass, EventKind, EventLog},
    Result,
};

/// Execution order of a dispatcher's cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSequence(Vec<usize>);

impl CaseSequence {
    /// Parses `"2|0|1"`. Returns `None` if any token is not a non-negative integer.
    #[must_use]
    pub fn parse(text: &str) -> Option<CaseSequence> {
        text.split('|')
            .map(|token| token.trim().parse::<usize>().ok())
            .collect::<Option<Vec<_>>>()
            .map(CaseSequence)
    }

    /// Reads the sequence from the first statement of a block.
    ///
    /// The statement must be a variable declaration whose first declarator is
    /// initialized by a method call on a string literal, as in `"2|0|1".split("|")`.
    #[must_use]
    pub fn source(stmts: &[Statement]) -> Option<&str> {
        let decl = stmts.first()?.as_variable_declaration()?;
        let Some(Expression::Call(call)) = &decl.declarations.first()?.init else {
            return None;
        };
        let Expression::Member(member) = call.callee.as_ref() else {
            return None;
        };
        member.object.as_str_literal()
    }

    /// The case indices in execution order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Concatenates the selected cases' statements, dropping `continue`.
    ///
    /// Returns `None` if an index is out of range of `cases`.
    #[must_use]
    pub fn merge(&self, cases: &[SwitchCase]) -> Option<Vec<Statement>> {
        let mut body = Vec::new();
        for &index in &self.0 {
            let case = cases.get(index)?;
            body.extend(
                case.consequent
                    .iter()
                    .filter(|s| !matches!(s, Statement::Continue { .. }))
                    .cloned(),
            );
        }
        Some(body)
    }
}

/// Returns the `switch` cases of a dispatcher loop: a `while` whose body starts
/// with a `switch`.
#[must_use]
pub fn dispatcher_cases(stmt: &Statement) -> Option<&[SwitchCase]> {
    let Statement::While { body, .. } = stmt else {
        return None;
    };
    let first = match body.as_ref() {
        Statement::Block { body } => body.first()?,
        other => other,
    };
    match first {
        Statement::Switch { cases, .. } => Some(cases),
        _ => None,
    }
}

/// Reassembles dispatcher loops into straight-line code.
#[derive(Debug, Default)]
pub struct ControlFlowUnflattener;

impl ControlFlowUnflattener {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AstPass for ControlFlowUnflattener {
    fn name(&self) -> &'static str {
        "unflatten"
    }

    fn description(&self) -> &'static str {
        "Replaces while/switch dispatchers with their cases in execution order"
    }

    fn run(&mut self, program: &mut Program, events: &EventLog) -> Result<bool> {
        let mut unflattener = Unflattener {
            scopes: ScopeTracker::new(),
            events,
            pass: self.name(),
            restructured: 0,
        };
        walk_program(&mut unflattener, program);

        if unflattener.restructured > 0 {
            info!("unflatten: {} dispatchers restructured", unflattener.restructured);
        }
        Ok(unflattener.restructured > 0)
    }
}

struct Unflattener<'a> {
    scopes: ScopeTracker,
    events: &'a EventLog,
    pass: &'static str,
    restructured: usize,
}

impl VisitMut for Unflattener<'_> {
    fn enter_function(&mut self, _params: &[Expression], _body: Option<&mut Vec<Statement>>) {
        self.scopes.enter();
    }

    fn leave_function(&mut self) {
        self.scopes.leave();
    }

    fn enter_statements(&mut self, stmts: &mut Vec<Statement>) -> Flow {
        let Some((location, cases)) = stmts
            .iter()
            .enumerate()
            .find_map(|(i, s)| dispatcher_cases(s).map(|cases| (i, cases)))
        else {
            return Flow::Continue;
        };

        let scope = self.scopes.label();
        let Some(text) = CaseSequence::source(stmts) else {
            debug!("unflatten: dispatcher in {scope} without a sequence string");
            return Flow::Continue;
        };
        let Some(sequence) = CaseSequence::parse(text) else {
            debug!("unflatten: sequence {text:?} in {scope} is not a list of integers");
            return Flow::Continue;
        };
        let Some(merged) = sequence.merge(cases) else {
            debug!(
                "unflatten: sequence {text:?} in {scope} exceeds {} cases",
                cases.len()
            );
            return Flow::Continue;
        };

        self.events
            .record(EventKind::DispatcherIdentified)
            .at(scope.clone(), location)
            .pass(self.pass)
            .message(format!("{} cases, order {text}", cases.len()));
        self.events
            .record(EventKind::ControlFlowRestructured)
            .at(scope, location)
            .pass(self.pass)
            .message(format!("{} statements -> {}", stmts.len(), merged.len()));

        *stmts = merged;
        self.restructured += 1;
        Flow::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn call_stmt(name: &str) -> Value {
        json!({"type": "ExpressionStatement", "expression": {
            "type": "CallExpression", "callee": {"type": "Identifier", "name": name}, "arguments": []
        }})
    }

    fn case(test: &str, body: Vec<Value>) -> Value {
        json!({"type": "SwitchCase", "test": {"type": "Literal", "value": test, "raw": format!("'{test}'")},
               "consequent": body})
    }

    fn sequence_decl(order: &str) -> Value {
        json!({"type": "VariableDeclaration", "kind": "var", "declarations": [
            {"type": "VariableDeclarator", "id": {"type": "Identifier", "name": "_0x5c"},
             "init": {"type": "CallExpression", "arguments": [{"type": "Literal", "value": "|", "raw": "'|'"}],
                      "callee": {"type": "MemberExpression", "computed": false,
                                 "object": {"type": "Literal", "value": order, "raw": format!("'{order}'")},
                                 "property": {"type": "Identifier", "name": "split"}}}},
            {"type": "VariableDeclarator", "id": {"type": "Identifier", "name": "_0x3e"},
             "init": {"type": "Literal", "value": 0, "raw": "0"}}
        ]})
    }

    fn dispatcher(cases: Vec<Value>) -> Value {
        json!({"type": "WhileStatement", "test": {"type": "Literal", "value": true, "raw": "true"},
               "body": {"type": "BlockStatement", "body": [
                   {"type": "SwitchStatement",
                    "discriminant": {"type": "MemberExpression", "computed": true,
                        "object": {"type": "Identifier", "name": "_0x5c"},
                        "property": {"type": "UpdateExpression", "operator": "++", "prefix": false,
                                     "argument": {"type": "Identifier", "name": "_0x3e"}}},
                    "cases": cases},
                   {"type": "BreakStatement", "label": null}
               ]}})
    }

    fn three_cases() -> Vec<Value> {
        let cont = json!({"type": "ContinueStatement", "label": null});
        vec![
            case("0", vec![call_stmt("a"), cont.clone()]),
            case("1", vec![call_stmt("b"), cont.clone()]),
            case("2", vec![call_stmt("c"), cont]),
        ]
    }

    fn program(body: Vec<Value>) -> Program {
        Program::from_value(json!({"type": "Program", "sourceType": "script", "body": body})).unwrap()
    }

    fn run(program: &mut Program) -> (bool, EventLog) {
        let events = EventLog::new();
        let changed = ControlFlowUnflattener::new().run(program, &events).unwrap();
        (changed, events)
    }

    #[test]
    fn test_sequence_parsing() {
        assert_eq!(CaseSequence::parse("2|0|1").unwrap().indices(), &[2, 0, 1]);
        assert_eq!(CaseSequence::parse("3").unwrap().indices(), &[3]);
        assert!(CaseSequence::parse("1|x").is_none());
        assert!(CaseSequence::parse("1||2").is_none());
        assert!(CaseSequence::parse("-1").is_none());
    }

    #[test]
    fn test_identity_order() {
        let mut actual = program(vec![sequence_decl("0|1|2"), dispatcher(three_cases())]);
        let (changed, events) = run(&mut actual);

        assert!(changed);
        assert_eq!(actual, program(vec![call_stmt("a"), call_stmt("b"), call_stmt("c")]));
        assert_eq!(events.count_kind(EventKind::ControlFlowRestructured), 1);
    }

    #[test]
    fn test_reordering() {
        let mut actual = program(vec![sequence_decl("2|0|1"), dispatcher(three_cases())]);
        run(&mut actual);
        assert_eq!(actual, program(vec![call_stmt("c"), call_stmt("a"), call_stmt("b")]));
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let mut actual = program(vec![sequence_decl("2|0|1"), dispatcher(three_cases())]);
        run(&mut actual);
        let once = actual.clone();

        let (changed, events) = run(&mut actual);
        assert!(!changed);
        assert!(events.is_empty());
        assert_eq!(actual, once);
    }

    #[test]
    fn test_out_of_range_index_aborts() {
        let original = program(vec![sequence_decl("0|3"), dispatcher(three_cases())]);
        let mut actual = original.clone();
        let (changed, _) = run(&mut actual);
        assert!(!changed);
        assert_eq!(actual, original);
    }

    #[test]
    fn test_missing_sequence_is_skipped() {
        let original = program(vec![call_stmt("setup"), dispatcher(three_cases())]);
        let mut actual = original.clone();
        run(&mut actual);
        assert_eq!(actual, original);
    }

    #[test]
    fn test_nested_dispatcher_needs_second_round() {
        let inner_block = json!({"type": "BlockStatement", "body": [
            sequence_decl("1|0"),
            dispatcher(vec![case("0", vec![call_stmt("x")]), case("1", vec![call_stmt("y")])])
        ]});
        let outer_cases = vec![
            case("0", vec![call_stmt("a")]),
            case("1", vec![inner_block]),
        ];
        let mut actual = program(vec![sequence_decl("1|0"), dispatcher(outer_cases)]);

        let (changed, _) = run(&mut actual);
        assert!(changed);
        assert_eq!(actual.body.len(), 2);
        assert!(matches!(&actual.body[0], Statement::Block { body } if body.len() == 2));

        run(&mut actual);
        let expected_inner = json!({"type": "BlockStatement", "body": [call_stmt("y"), call_stmt("x")]});
        assert_eq!(actual, program(vec![expected_inner, call_stmt("a")]));
    }

    #[test]
    fn test_function_body_dispatcher() {
        let func = |body: Vec<Value>| json!({
            "type": "FunctionDeclaration", "id": {"type": "Identifier", "name": "f"},
            "params": [], "body": {"type": "BlockStatement", "body": body}
        });
        let mut actual = program(vec![func(vec![sequence_decl("1|2|0"), dispatcher(three_cases())])]);
        let (_, events) = run(&mut actual);

        assert_eq!(
            actual,
            program(vec![func(vec![call_stmt("b"), call_stmt("c"), call_stmt("a")])])
        );
        let event = events.filter_kind(EventKind::ControlFlowRestructured).next().unwrap();
        assert_eq!(event.scope.as_deref(), Some("function#1"));
        assert_eq!(event.location, Some(1));
    }
}
