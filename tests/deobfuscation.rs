//! End-to-end pipeline tests.
//!
//! All tests follow the same pattern:
//! 1. Build an ESTree program as JSON, shaped the way `acorn` emits it
//! 2. Run `DeobfuscationEngine::process_json()` with a pipeline configuration
//! 3. Print the result with the code generator
//! 4. Verify the **exact** JavaScript output and the recorded events

use jsdeob::{
    ast::{Program, Statement},
    codegen::{generate, GeneratorConfig},
    deobfuscation::{DeobfuscationEngine, EngineConfig, EventKind},
    Result,
};
use serde_json::{json, Value};

fn id(name: &str) -> Value {
    json!({"type": "Identifier", "name": name})
}

fn str_lit(value: &str) -> Value {
    json!({"type": "Literal", "value": value, "raw": format!("'{value}'")})
}

fn num(value: i64) -> Value {
    json!({"type": "Literal", "value": value, "raw": value.to_string()})
}

fn member(object: Value, property: Value, computed: bool) -> Value {
    json!({"type": "MemberExpression", "object": object, "property": property, "computed": computed})
}

fn call(callee: Value, args: Vec<Value>) -> Value {
    json!({"type": "CallExpression", "callee": callee, "arguments": args})
}

fn stmt(expression: Value) -> Value {
    json!({"type": "ExpressionStatement", "expression": expression})
}

fn var(name: &str, init: Value) -> Value {
    json!({"type": "VariableDeclaration", "kind": "var", "declarations": [
        {"type": "VariableDeclarator", "id": id(name), "init": init}
    ]})
}

fn func_expr(params: &[&str], body: Vec<Value>) -> Value {
    json!({"type": "FunctionExpression", "id": null,
           "params": params.iter().map(|p| id(p)).collect::<Vec<_>>(),
           "body": {"type": "BlockStatement", "body": body}})
}

fn func_decl(name: &str, params: &[&str], body: Vec<Value>) -> Value {
    json!({"type": "FunctionDeclaration", "id": id(name),
           "params": params.iter().map(|p| id(p)).collect::<Vec<_>>(),
           "body": {"type": "BlockStatement", "body": body}})
}

fn ret(argument: Value) -> Value {
    json!({"type": "ReturnStatement", "argument": argument})
}

fn binary(op: &str, left: Value, right: Value) -> Value {
    json!({"type": "BinaryExpression", "operator": op, "left": left, "right": right})
}

fn prop(key: &str, value: Value) -> Value {
    json!({"type": "Property", "kind": "init", "key": str_lit(key), "value": value,
           "computed": false, "method": false, "shorthand": false})
}

fn object(props: Vec<Value>) -> Value {
    json!({"type": "ObjectExpression", "properties": props})
}

fn case(test: &str, body: Vec<Value>) -> Value {
    json!({"type": "SwitchCase", "test": str_lit(test), "consequent": body})
}

/// `var s = "<order>".split("|"), i = 0; while (true) { switch (s[i++]) {...} break; }`
fn dispatcher(order: &str, cases: Vec<Value>) -> Vec<Value> {
    let split = call(member(str_lit(order), id("split"), false), vec![str_lit("|")]);
    let counter = json!({"type": "UpdateExpression", "operator": "++", "prefix": false, "argument": id("i")});
    vec![
        json!({"type": "VariableDeclaration", "kind": "var", "declarations": [
            {"type": "VariableDeclarator", "id": id("s"), "init": split},
            {"type": "VariableDeclarator", "id": id("i"), "init": num(0)}
        ]}),
        json!({"type": "WhileStatement", "test": {"type": "Literal", "value": true, "raw": "true"},
               "body": {"type": "BlockStatement", "body": [
                   {"type": "SwitchStatement", "discriminant": member(id("s"), counter, true), "cases": cases},
                   {"type": "BreakStatement", "label": null}
               ]}}),
    ]
}

fn cont() -> Value {
    json!({"type": "ContinueStatement", "label": null})
}

/// Table `["bG9n", "d29ybGQ=", "aGVsbG8="]` (`log`, `world`, `hello`) rotated once.
fn prologue() -> Vec<Value> {
    let shift = call(member(id("a"), id("shift"), false), vec![]);
    let rotate = func_expr(
        &["a", "n"],
        vec![stmt(call(member(id("a"), id("push"), false), vec![shift]))],
    );
    vec![
        var(
            "_0xa",
            json!({"type": "ArrayExpression", "elements": [
                str_lit("bG9n"), str_lit("d29ybGQ="), str_lit("aGVsbG8=")
            ]}),
        ),
        stmt(call(rotate, vec![id("_0xa"), num(1)])),
        var(
            "_0xb",
            func_expr(&["i"], vec![ret(member(id("_0xa"), id("i"), true))]),
        ),
    ]
}

fn program(body: Vec<Value>) -> String {
    json!({"type": "Program", "sourceType": "script", "body": body}).to_string()
}

fn print(statements: &[Statement]) -> String {
    generate(&Program::new(statements.to_vec()), &GeneratorConfig::default()).unwrap()
}

/// Obfuscated `main` using every pattern the default pipeline handles.
fn sample() -> String {
    let dictionary = var(
        "_0xd",
        object(vec![
            prop("aBc", func_expr(&["p", "q"], vec![ret(binary("+", id("p"), id("q")))])),
            prop("kLm", func_expr(&["f", "v"], vec![ret(call(id("f"), vec![id("v")]))])),
        ]),
    );
    let log = member(id("console"), call(id("_0xb"), vec![str_lit("0x2")]), true);
    let add = call(member(id("_0xd"), str_lit("aBc"), true), vec![id("x"), num(1)]);
    let assign = json!({"type": "AssignmentExpression", "operator": "=", "left": id("x"), "right": add});

    let mut body = vec![dictionary];
    body.extend(dispatcher(
        "1|0|2",
        vec![
            case("0", vec![stmt(call(log, vec![id("x")])), cont()]),
            case("1", vec![stmt(assign), cont()]),
            case(
                "2",
                vec![ret(call(
                    member(id("_0xd"), id("kLm"), false),
                    vec![id("g"), id("x")],
                ))],
            ),
        ],
    ));

    let mut program_body = prologue();
    program_body.push(func_decl("main", &["x"], body));
    program(program_body)
}

#[test]
fn test_full_pipeline() -> Result<()> {
    let mut engine = DeobfuscationEngine::default();
    let (program, result) = engine.process_json(&sample())?;

    assert_eq!(program.body.len(), 4);
    assert_eq!(
        print(&program.body[3..]),
        "function main(x) {\n  x = x + 1;\n  console.log(x);\n  return g(x);\n}\n"
    );

    let stats = result.stats();
    assert_eq!(stats.strings_decoded, 1);
    assert_eq!(stats.members_normalized, 2);
    assert_eq!(stats.dictionaries, 1);
    assert_eq!(stats.calls_inlined, 2);
    assert_eq!(stats.dispatchers, 1);
    assert_eq!(stats.warnings, 0);
    assert!(result.detection.has_string_table());
    assert!(result.detection.is_obfuscated());
    Ok(())
}

#[test]
fn test_prologue_survives_dictionary_pass() -> Result<()> {
    let mut engine = DeobfuscationEngine::default();
    let (program, _) = engine.process_json(&sample())?;

    let original = Program::from_json(&sample())?;
    assert_eq!(program.body[..3], original.body[..3]);
    Ok(())
}

#[test]
fn test_second_run_is_a_no_op() -> Result<()> {
    let mut engine = DeobfuscationEngine::default();
    let (mut program, _) = engine.process_json(&sample())?;
    let once = program.clone();

    let result = engine.process_program(&mut program)?;
    assert_eq!(program, once);
    assert!(!result.changed());
    Ok(())
}

#[test]
fn test_table_lookup_after_rotation() -> Result<()> {
    let mut body = prologue();
    body.push(stmt(call(
        id("print"),
        vec![member(id("_0xa"), num(0), true), member(id("_0xa"), num(2), true)],
    )));

    let mut engine = DeobfuscationEngine::new(EngineConfig::minimal());
    let (program, result) = engine.process_json(&program(body))?;

    assert_eq!(print(&program.body[3..]), "print(\"world\", \"log\");\n");
    assert_eq!(result.events.count_kind(EventKind::StringDecoded), 2);
    assert_eq!(result.events.count_kind(EventKind::StringTableIdentified), 1);
    Ok(())
}

#[test]
fn test_nested_dispatchers_need_two_rounds() -> Result<()> {
    let inner = dispatcher(
        "1|0",
        vec![
            case("0", vec![stmt(call(id("b"), vec![])), cont()]),
            case("1", vec![stmt(call(id("a"), vec![])), cont()]),
        ],
    );
    let inner_block = json!({"type": "BlockStatement", "body": inner});
    let outer = dispatcher(
        "1|0",
        vec![
            case("0", vec![stmt(call(id("c"), vec![])), cont()]),
            case("1", vec![inner_block, cont()]),
        ],
    );
    let source = program(vec![func_decl("f", &[], outer)]);

    let mut engine = DeobfuscationEngine::new(EngineConfig::new().with_unflatten_rounds(1));
    let (once, _) = engine.process_json(&source)?;
    assert!(print(&once.body).contains("switch"));

    let mut engine = DeobfuscationEngine::default();
    let (twice, result) = engine.process_json(&source)?;
    assert_eq!(
        print(&twice.body),
        "function f() {\n  {\n    a();\n    b();\n  }\n  c();\n}\n"
    );
    assert_eq!(result.stats().dispatchers, 2);
    assert_eq!(result.iterations, 4);
    Ok(())
}

#[test]
fn test_loop_reconstruction_is_opt_in() -> Result<()> {
    let body = vec![json!({"type": "WhileStatement",
        "test": {"type": "Literal", "value": true, "raw": "true"},
        "body": {"type": "BlockStatement", "body": [
            stmt(call(id("step"), vec![])),
            {"type": "IfStatement", "test": call(id("done"), vec![]),
             "consequent": {"type": "BlockStatement", "body": [{"type": "BreakStatement", "label": null}]},
             "alternate": null}
        ]}})];
    let source = program(body);

    let mut engine = DeobfuscationEngine::default();
    let (kept, _) = engine.process_json(&source)?;
    assert!(print(&kept.body).starts_with("while (true)"));

    let mut engine = DeobfuscationEngine::new(EngineConfig::aggressive());
    let (rebuilt, result) = engine.process_json(&source)?;
    assert_eq!(
        print(&rebuilt.body),
        "while (!done()) {\n  step();\n}\n"
    );
    assert_eq!(result.stats().loops_reconstructed, 1);
    Ok(())
}

#[test]
fn test_unknown_nodes_round_trip() -> Result<()> {
    let class = json!({"type": "ClassDeclaration", "id": id("A"), "superClass": null,
                       "body": {"type": "ClassBody", "body": []}});
    let mut body = prologue();
    body.push(class.clone());

    let mut engine = DeobfuscationEngine::default();
    let (program, _) = engine.process_json(&program(body))?;

    let value: Value = serde_json::from_str(&program.to_json()?).unwrap();
    assert_eq!(value["body"][3], class);
    assert!(generate(&program, &GeneratorConfig::default()).is_err());
    Ok(())
}

#[test]
fn test_process_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("jsdeob-{}.json", std::process::id()));
    std::fs::write(&path, sample())?;

    let mut engine = DeobfuscationEngine::default();
    let outcome = engine.process_file(&path);
    std::fs::remove_file(&path)?;

    let (program, result) = outcome?;
    assert_eq!(program.body.len(), 4);
    assert!(result.changed());
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let mut engine = DeobfuscationEngine::default();
    assert!(engine.process_file("does/not/exist.json").is_err());
}
