//! Dictionary inlining.
//!
//! The obfuscator hoists constants and tiny wrapper functions of a function body into
//! an object literal declared as the body's first statement, and rewrites every use as
//! a lookup:
//!
//! ```text
//! function f(a, b) {                        function f(a, b) {
//!     var _0x9e = {                             if (a === 5) {
//!         "x1": 5,                                  g(b);
//!         "x2": function (p, q) {          =>   }
//!             return p === q;                   return a + b;
//!         },                                }
//!         "x3": function (p, q) { return p(q); },
//!         "x4": function (p, q) { return p + q; }
//!     };
//!     if (_0x9e.x2(a, _0x9e.x1)) { _0x9e.x3(g, b); }
//!     return _0x9e.x4(a, b);
//! }
//! ```
//!
//! On entering a function the dictionary is captured and its declaration removed;
//! on leaving each expression, lookups are replaced by the captured literal or by a
//! copy of the template's return expression with parameters bound to the call's
//! arguments. Dictionaries are scoped: inner functions see the dictionaries of every
//! enclosing function unless a parameter of the same name shadows them.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::{
    ast::{
        builders,
        visit::{walk_program, VisitMut},
        BinaryExpression, CallExpression, Expression, Literal, MemberExpression, ObjectMember,
        Program, PropertyKind, Statement,
    },
    deobfuscation::{passes::utils::ScopeTracker, AstPass, EventKind, EventLog},
    Result,
};

/// Value recorded for one dictionary property.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryEntry {
    /// `"key": 5`
    Literal(Literal),
    /// `"key": function (p, q) { return <body>; }`
    Template(FunctionTemplate),
}

/// A single-return function captured from a dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTemplate {
    /// Formal parameter names in order.
    pub params: Vec<String>,
    /// The returned expression.
    pub body: Expression,
}

impl FunctionTemplate {
    /// Binds the parameters to `args` and returns a copy of the body.
    ///
    /// Only call and binary bodies are supported; their direct operands are
    /// substituted. Identifiers that are not parameters stay as they are, and a
    /// parameter without an argument becomes `undefined`. Returns `None` for any
    /// other body shape.
    #[must_use]
    pub fn instantiate(&self, args: &[Expression]) -> Option<Expression> {
        match &self.body {
            Expression::Call(call) => Some(Expression::Call(CallExpression {
                callee: Box::new(self.bind(&call.callee, args)),
                arguments: call.arguments.iter().map(|a| self.bind(a, args)).collect(),
                optional: call.optional,
            })),
            Expression::Binary(binary) => Some(Expression::Binary(BinaryExpression {
                operator: binary.operator,
                left: Box::new(self.bind(&binary.left, args)),
                right: Box::new(self.bind(&binary.right, args)),
            })),
            _ => None,
        }
    }

    fn bind(&self, operand: &Expression, args: &[Expression]) -> Expression {
        let position = operand
            .as_identifier()
            .and_then(|name| self.params.iter().position(|p| p == name));
        match position {
            Some(i) => args.get(i).cloned().unwrap_or_else(builders::undefined),
            None => operand.clone(),
        }
    }
}

/// Property name to entry for one dictionary variable.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDictionary {
    /// Name of the dictionary variable.
    pub name: String,
    /// Entries keyed by property name.
    pub entries: HashMap<String, DictionaryEntry>,
}

impl FunctionDictionary {
    /// Captures the dictionary declared by the first statement of a function body.
    ///
    /// The body must hold more than one statement and start with a single-declarator
    /// declaration initialized by a non-empty object literal whose values are all
    /// literals or functions consisting of one `return`.
    #[must_use]
    pub fn capture(body: &[Statement]) -> Option<FunctionDictionary> {
        if body.len() <= 1 {
            return None;
        }
        let (name, init) = body[0].as_variable_declaration()?.single()?;
        let Some(Expression::Object { properties }) = init else {
            return None;
        };
        if properties.is_empty() {
            return None;
        }

        let mut entries = HashMap::with_capacity(properties.len());
        for member in properties {
            let ObjectMember::Property(prop) = member else {
                return None;
            };
            if prop.kind != PropertyKind::Init || prop.method {
                return None;
            }
            let entry = match &prop.value {
                Expression::Literal(lit) if lit.regex.is_none() => {
                    DictionaryEntry::Literal(lit.clone())
                }
                Expression::FunctionExpression(func) => {
                    let [Statement::Return {
                        argument: Some(returned),
                    }] = func.body.body.as_slice()
                    else {
                        return None;
                    };
                    let params = func
                        .param_names()
                        .into_iter()
                        .map(|p| p.map(str::to_string))
                        .collect::<Option<Vec<_>>>()?;
                    DictionaryEntry::Template(FunctionTemplate {
                        params,
                        body: returned.clone(),
                    })
                }
                _ => return None,
            };
            entries.insert(prop.key_name()?.to_string(), entry);
        }

        Some(FunctionDictionary {
            name: name.to_string(),
            entries,
        })
    }

    /// Returns the entry recorded for `property`.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&DictionaryEntry> {
        self.entries.get(property)
    }
}

/// Inlines dictionary constants and function templates.
#[derive(Debug, Default)]
pub struct FunctionDictionaryInliner;

impl FunctionDictionaryInliner {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AstPass for FunctionDictionaryInliner {
    fn name(&self) -> &'static str {
        "dictionaries"
    }

    fn description(&self) -> &'static str {
        "Inlines object-literal dictionaries of constants and wrapper functions"
    }

    fn run(&mut self, program: &mut Program, events: &EventLog) -> Result<bool> {
        let mut inliner = Inliner {
            frames: vec![Frame::default()],
            scopes: ScopeTracker::new(),
            events,
            pass: self.name(),
            removed: 0,
            inlined: 0,
        };
        walk_program(&mut inliner, program);

        if inliner.removed == 0 {
            debug!("dictionaries: no dictionary declarations found");
        } else {
            info!(
                "dictionaries: {} dictionaries removed, {} lookups inlined",
                inliner.removed, inliner.inlined
            );
        }
        Ok(inliner.removed + inliner.inlined > 0)
    }
}

struct Tracked {
    dictionary: FunctionDictionary,
    references: usize,
    inlined: usize,
}

#[derive(Default)]
struct Frame {
    dictionary: Option<Tracked>,
    params: HashSet<String>,
}

struct Inliner<'a> {
    frames: Vec<Frame>,
    scopes: ScopeTracker,
    events: &'a EventLog,
    pass: &'static str,
    removed: usize,
    inlined: usize,
}

impl Inliner<'_> {
    /// Finds the dictionary `name` refers to, innermost scope first.
    fn resolve(&mut self, name: &str) -> Option<&mut Tracked> {
        for frame in self.frames.iter_mut().rev() {
            let declared = frame
                .dictionary
                .as_ref()
                .is_some_and(|t| t.dictionary.name == name);
            if declared {
                return frame.dictionary.as_mut();
            }
            if frame.params.contains(name) {
                return None;
            }
        }
        None
    }

    fn inline_constant(&mut self, member: &MemberExpression) -> Option<Expression> {
        let object = member.object.as_identifier()?;
        let property = member.static_property()?;
        let scope = self.scopes.label();
        let events = self.events;
        let pass = self.pass;

        let tracked = self.resolve(object)?;
        let literal = match tracked.dictionary.get(property) {
            Some(DictionaryEntry::Literal(lit)) => lit.clone(),
            Some(DictionaryEntry::Template(_)) => return None,
            None => {
                debug!("dictionaries: {object}.{property} has no entry in {scope}");
                return None;
            }
        };
        tracked.inlined += 1;
        self.inlined += 1;

        events
            .record(EventKind::ConstantInlined)
            .scope(scope)
            .pass(pass)
            .message(format!("{object}.{property}"));
        Some(Expression::Literal(literal))
    }

    fn inline_call(&mut self, call: &CallExpression) -> Option<Expression> {
        let Expression::Member(member) = call.callee.as_ref() else {
            return None;
        };
        let object = member.object.as_identifier()?;
        let property = member.static_property()?;
        let scope = self.scopes.label();
        let events = self.events;
        let pass = self.pass;

        let tracked = self.resolve(object)?;
        let Some(DictionaryEntry::Template(template)) = tracked.dictionary.get(property) else {
            return None;
        };

        if call
            .arguments
            .iter()
            .any(|a| matches!(a, Expression::Spread { .. }))
        {
            warn!("dictionaries: spread arguments in call to {object}.{property}");
            events
                .record(EventKind::Warning)
                .scope(scope)
                .pass(pass)
                .message(format!("{object}.{property}: spread arguments not inlined"));
            return None;
        }

        let Some(replacement) = template.instantiate(&call.arguments) else {
            let shape = template.body.kind().to_string();
            warn!("dictionaries: {object}.{property} returns unsupported {shape}");
            events
                .record(EventKind::Warning)
                .scope(scope)
                .pass(pass)
                .message(format!("{object}.{property}: unsupported template {shape}"));
            return None;
        };
        tracked.inlined += 1;
        self.inlined += 1;

        events
            .record(EventKind::CallInlined)
            .scope(scope)
            .pass(pass)
            .message(format!("{object}.{property}(..)"));
        Some(replacement)
    }
}

impl VisitMut for Inliner<'_> {
    fn enter_function(&mut self, params: &[Expression], body: Option<&mut Vec<Statement>>) {
        self.scopes.enter();
        let mut frame = Frame {
            dictionary: None,
            params: params
                .iter()
                .filter_map(Expression::as_identifier)
                .map(str::to_string)
                .collect(),
        };

        if let Some(body) = body {
            if let Some(dictionary) = FunctionDictionary::capture(body) {
                body.remove(0);
                self.removed += 1;
                let scope = self.scopes.label();
                self.events
                    .record(EventKind::DictionaryIdentified)
                    .scope(scope.clone())
                    .pass(self.pass)
                    .message(format!(
                        "{} ({} entries)",
                        dictionary.name,
                        dictionary.entries.len()
                    ));
                self.events
                    .record(EventKind::DictionaryRemoved)
                    .at(scope, 0)
                    .pass(self.pass)
                    .message(dictionary.name.clone());
                frame.dictionary = Some(Tracked {
                    dictionary,
                    references: 0,
                    inlined: 0,
                });
            }
        }

        self.frames.push(frame);
    }

    fn leave_function(&mut self) {
        let scope = self.scopes.label();
        self.scopes.leave();
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let Some(tracked) = frame.dictionary else {
            return;
        };
        if tracked.references > tracked.inlined {
            let left = tracked.references - tracked.inlined;
            warn!(
                "dictionaries: {} still referenced {left} times in {scope}",
                tracked.dictionary.name
            );
            self.events
                .record(EventKind::Warning)
                .scope(scope)
                .pass(self.pass)
                .message(format!(
                    "{} removed but still referenced {left} times",
                    tracked.dictionary.name
                ));
        }
    }

    fn leave_expression(&mut self, expr: &mut Expression) -> Option<Expression> {
        match expr {
            Expression::Identifier { name } => {
                if let Some(tracked) = self.resolve(name) {
                    tracked.references += 1;
                }
                None
            }
            Expression::Member(member) => self.inline_constant(member),
            Expression::Call(call) => self.inline_call(call),
            _ => None,
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

    fn num(n: i64) -> Value {
        json!({"type": "Literal", "value": n, "raw": n.to_string()})
    }

    fn dot(object: &str, property: &str) -> Value {
        json!({"type": "MemberExpression", "computed": false, "object": id(object), "property": id(property)})
    }

    fn call(callee: Value, args: Vec<Value>) -> Value {
        json!({"type": "CallExpression", "callee": callee, "arguments": args})
    }

    fn ret(argument: Value) -> Value {
        json!({"type": "ReturnStatement", "argument": argument})
    }

    fn func_expr(params: &[&str], body: Vec<Value>) -> Value {
        json!({
            "type": "FunctionExpression", "id": null,
            "params": params.iter().map(|p| id(p)).collect::<Vec<_>>(),
            "body": {"type": "BlockStatement", "body": body}
        })
    }

    fn func_decl(name: &str, params: &[&str], body: Vec<Value>) -> Value {
        let mut f = func_expr(params, body);
        f["type"] = json!("FunctionDeclaration");
        f["id"] = id(name);
        f
    }

    fn dict(name: &str, props: Vec<(&str, Value)>) -> Value {
        let properties: Vec<Value> = props
            .into_iter()
            .map(|(k, v)| json!({
                "type": "Property", "kind": "init", "computed": false, "method": false,
                "shorthand": false, "key": {"type": "Literal", "value": k, "raw": format!("'{k}'")},
                "value": v
            }))
            .collect();
        json!({"type": "VariableDeclaration", "kind": "var", "declarations": [{
            "type": "VariableDeclarator", "id": id(name),
            "init": {"type": "ObjectExpression", "properties": properties}
        }]})
    }

    fn program(body: Vec<Value>) -> Program {
        Program::from_value(json!({"type": "Program", "sourceType": "script", "body": body})).unwrap()
    }

    fn run(program: &mut Program) -> EventLog {
        let events = EventLog::new();
        FunctionDictionaryInliner::new().run(program, &events).unwrap();
        events
    }

    fn binary(op: &str, left: Value, right: Value) -> Value {
        json!({"type": "BinaryExpression", "operator": op, "left": left, "right": right})
    }

    #[test]
    fn test_constant_is_inlined() {
        let mut actual = program(vec![func_decl("f", &[], vec![
            dict("obj", vec![("a", num(5))]),
            ret(dot("obj", "a")),
        ])]);
        let events = run(&mut actual);

        assert_eq!(actual, program(vec![func_decl("f", &[], vec![ret(num(5))])]));
        assert_eq!(events.count_kind(EventKind::ConstantInlined), 1);
        assert_eq!(events.count_kind(EventKind::DictionaryRemoved), 1);
        assert!(events.warnings().next().is_none());
    }

    #[test]
    fn test_binary_template_is_inlined() {
        let mut actual = program(vec![func_decl("f", &["p", "q"], vec![
            dict("obj", vec![("f", func_expr(&["x", "y"], vec![ret(binary("+", id("x"), id("y")))]))]),
            ret(call(dot("obj", "f"), vec![id("p"), id("q")])),
        ])]);
        run(&mut actual);

        let expected = program(vec![func_decl("f", &["p", "q"], vec![
            ret(binary("+", id("p"), id("q"))),
        ])]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_call_template_binds_callee_and_keeps_free_identifiers() {
        let template = func_expr(&["fn", "a"], vec![ret(call(id("fn"), vec![id("a"), id("console")]))]);
        let mut actual = program(vec![func_decl("f", &[], vec![
            dict("d", vec![("c", template)]),
            json!({"type": "ExpressionStatement", "expression": call(dot("d", "c"), vec![id("g")])}),
        ])]);
        run(&mut actual);

        let expected = program(vec![func_decl("f", &[], vec![json!({
            "type": "ExpressionStatement",
            "expression": call(id("g"), vec![id("undefined"), id("console")])
        })])]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_computed_string_key_lookup() {
        let lookup = json!({"type": "MemberExpression", "computed": true,
            "object": id("obj"), "property": {"type": "Literal", "value": "a", "raw": "'a'"}});
        let mut actual = program(vec![func_decl("f", &[], vec![
            dict("obj", vec![("a", num(7))]),
            ret(lookup),
        ])]);
        run(&mut actual);
        assert_eq!(actual, program(vec![func_decl("f", &[], vec![ret(num(7))])]));
    }

    #[test]
    fn test_inner_function_sees_outer_dictionary() {
        let inner = func_decl("g", &[], vec![ret(dot("obj", "a"))]);
        let mut actual = program(vec![func_decl("f", &[], vec![
            dict("obj", vec![("a", num(1))]),
            inner,
        ])]);
        run(&mut actual);

        let expected = program(vec![func_decl("f", &[], vec![func_decl("g", &[], vec![ret(num(1))])])]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_parameter_shadows_outer_dictionary() {
        let inner = func_decl("g", &["obj"], vec![ret(dot("obj", "a"))]);
        let mut actual = program(vec![func_decl("f", &[], vec![
            dict("obj", vec![("a", num(1))]),
            inner.clone(),
        ])]);
        let events = run(&mut actual);

        assert_eq!(actual, program(vec![func_decl("f", &[], vec![inner])]));
        assert_eq!(events.count_kind(EventKind::ConstantInlined), 0);
    }

    #[test]
    fn test_unsupported_template_is_warned_and_kept() {
        let template = func_expr(&["x"], vec![ret(json!({
            "type": "ConditionalExpression", "test": id("x"), "consequent": num(1), "alternate": num(2)
        }))]);
        let use_site = json!({"type": "ExpressionStatement", "expression": call(dot("d", "t"), vec![id("v")])});
        let mut actual = program(vec![func_decl("f", &[], vec![
            dict("d", vec![("t", template)]),
            use_site.clone(),
        ])]);
        let events = run(&mut actual);

        assert_eq!(actual, program(vec![func_decl("f", &[], vec![use_site])]));
        // one for the template, one for the dangling reference
        assert_eq!(events.warnings().count(), 2);
    }

    #[test]
    fn test_single_statement_body_is_not_a_dictionary() {
        let body = vec![dict("obj", vec![("a", num(5))])];
        let mut actual = program(vec![func_decl("f", &[], body.clone())]);
        run(&mut actual);
        assert_eq!(actual, program(vec![func_decl("f", &[], body)]));
    }

    #[test]
    fn test_non_qualifying_values_reject_dictionary() {
        let body = vec![
            dict("obj", vec![("a", num(5)), ("b", id("window"))]),
            ret(dot("obj", "a")),
        ];
        let mut actual = program(vec![func_decl("f", &[], body.clone())]);
        let events = run(&mut actual);
        assert_eq!(actual, program(vec![func_decl("f", &[], body)]));
        assert!(events.is_empty());
    }

    #[test]
    fn test_missing_entry_is_left_alone() {
        let mut actual = program(vec![func_decl("f", &[], vec![
            dict("obj", vec![("a", num(5))]),
            ret(dot("obj", "zz")),
        ])]);
        run(&mut actual);
        assert_eq!(actual, program(vec![func_decl("f", &[], vec![ret(dot("obj", "zz"))])]));
    }
}
