#![allow(unused)]
extern crate jsdeob;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use jsdeob::{
    ast::Program,
    codegen::{generate, GeneratorConfig},
    deobfuscation::{detect, DeobfuscationEngine, EngineConfig},
};
use serde_json::{json, Value};
use std::hint::black_box;

const FUNCTIONS: usize = 200;
const TABLE_SIZE: usize = 64;

fn id(name: &str) -> Value {
    json!({"type": "Identifier", "name": name})
}

fn lit(value: Value) -> Value {
    json!({"type": "Literal", "value": value})
}

fn call(callee: Value, args: Vec<Value>) -> Value {
    json!({"type": "CallExpression", "callee": callee, "arguments": args})
}

fn member(object: Value, property: Value, computed: bool) -> Value {
    json!({"type": "MemberExpression", "object": object, "property": property, "computed": computed})
}

fn stmt(expression: Value) -> Value {
    json!({"type": "ExpressionStatement", "expression": expression})
}

fn var(name: &str, init: Value) -> Value {
    json!({"type": "VariableDeclaration", "kind": "var", "declarations": [
        {"type": "VariableDeclarator", "id": id(name), "init": init}
    ]})
}

fn function(params: &[&str], body: Vec<Value>) -> Value {
    json!({"type": "FunctionExpression", "params": params.iter().map(|p| id(p)).collect::<Vec<_>>(),
           "body": {"type": "BlockStatement", "body": body}})
}

/// Builds a program in the shape the obfuscator emits: a string table prologue
/// followed by `FUNCTIONS` functions that each carry a dictionary and a dispatcher.
fn synthetic_program() -> String {
    let encoded: Vec<Value> = (0..TABLE_SIZE)
        .map(|i| lit(json!(data_encoding::BASE64.encode(format!("prop{i}").as_bytes()))))
        .collect();

    let mut body = vec![
        var("_0xa", json!({"type": "ArrayExpression", "elements": encoded})),
        stmt(call(function(&["a", "n"], vec![]), vec![id("_0xa"), lit(json!(7))])),
        var(
            "_0xb",
            function(&["i"], vec![json!({"type": "ReturnStatement", "argument": member(id("_0xa"), id("i"), true)})]),
        ),
    ];

    for f in 0..FUNCTIONS {
        let dictionary = var(
            "_0xd",
            json!({"type": "ObjectExpression", "properties": [
                {"type": "Property", "kind": "init", "key": lit(json!("aBc")), "value": function(&["p", "q"], vec![
                    json!({"type": "ReturnStatement", "argument": {
                        "type": "BinaryExpression", "operator": "+", "left": id("p"), "right": id("q")}})
                ])},
                {"type": "Property", "kind": "init", "key": lit(json!("kLm")), "value": lit(json!(f))}
            ]}),
        );
        let lookup = member(id("o"), call(id("_0xb"), vec![lit(json!(format!("0x{:x}", f % TABLE_SIZE)))]), true);
        let sum = call(member(id("_0xd"), lit(json!("aBc")), true), vec![lookup, member(id("_0xd"), id("kLm"), false)]);
        let cases: Vec<Value> = (0..4)
            .map(|c| {
                json!({"type": "SwitchCase", "test": lit(json!(c.to_string())), "consequent": [
                    stmt(call(id("use"), vec![sum.clone()])),
                    {"type": "ContinueStatement", "label": null}
                ]})
            })
            .collect();
        let split = call(member(lit(json!("3|1|0|2")), id("split"), false), vec![lit(json!("|"))]);
        let counter = json!({"type": "UpdateExpression", "operator": "++", "prefix": false, "argument": id("i")});

        body.push(json!({"type": "FunctionDeclaration", "id": id(&format!("f{f}")), "params": [id("o")],
            "body": {"type": "BlockStatement", "body": [
                dictionary,
                {"type": "VariableDeclaration", "kind": "var", "declarations": [
                    {"type": "VariableDeclarator", "id": id("s"), "init": split},
                    {"type": "VariableDeclarator", "id": id("i"), "init": lit(json!(0))}
                ]},
                {"type": "WhileStatement", "test": lit(json!(true)), "body": {"type": "BlockStatement", "body": [
                    {"type": "SwitchStatement", "discriminant": member(id("s"), counter, true), "cases": cases},
                    {"type": "BreakStatement", "label": null}
                ]}}
            ]}}));
    }

    json!({"type": "Program", "sourceType": "script", "body": body}).to_string()
}

/// Benchmark the full pipeline on a synthetic obfuscated bundle
///
/// Parsing is measured separately so the pass cost can be read from the difference.
fn bench_pipeline(c: &mut Criterion) {
    let source = synthetic_program();
    let program = Program::from_json(&source).expect("Failed to parse synthetic program");

    println!(
        "Benchmarking synthetic bundle: {} bytes ({:.2} KB), {} functions",
        source.len(),
        source.len() as f64 / 1024.0,
        FUNCTIONS
    );

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("parse", |b| {
        b.iter(|| black_box(Program::from_json(black_box(&source)).unwrap()));
    });
    group.bench_function("detect", |b| {
        b.iter(|| black_box(detect(black_box(&program))));
    });
    group.bench_function("deobfuscate", |b| {
        let mut engine = DeobfuscationEngine::new(EngineConfig::aggressive());
        b.iter(|| {
            let mut program = program.clone();
            let result = engine.process_program(&mut program).unwrap();
            black_box((program, result))
        });
    });
    group.finish();

    let mut engine = DeobfuscationEngine::default();
    let mut clean = program.clone();
    engine.process_program(&mut clean).unwrap();

    let mut group = c.benchmark_group("codegen");
    group.bench_function("generate", |b| {
        let config = GeneratorConfig::default();
        b.iter(|| black_box(generate(black_box(&clean), &config).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
