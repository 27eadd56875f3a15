//! String table decoding.
//!
//! The obfuscator moves every string literal into one array of base64 strings at the
//! top of the program, rotates that array at startup, and replaces each literal with a
//! call to an index-based decoder. The first three top-level statements form the
//! prologue:
//!
//! ```text
//! var _0x4f2a = ["aGVsbG8=", "d29ybGQ="];        // encoded table
//! (function (t, n) { ... })(_0x4f2a, 0x1);       // rotation
//! var _0x1b3c = function (i, k) { ... };         // decoder
//! ```
//!
//! This pass decodes the table, applies the rotation, and folds `_0x4f2a[0]` and
//! `_0x1b3c("0x0")` back into literals. It also rewrites `obj["name"]` to `obj.name`
//! wherever `name` is a legal identifier name.

use std::sync::OnceLock;

use data_encoding::{Encoding, BASE64, BASE64_NOPAD};
use log::{debug, info};

use crate::{
    ast::{
        builders::{self, index_from_f64, literal_index},
        visit::{walk_program, VisitMut},
        Expression, Program, Statement,
    },
    deobfuscation::{
        events::truncate_string,
        passes::utils::{is_identifier_name, ScopeTracker},
        AstPass, EventKind, EventLog,
    },
    Result,
};

/// Standard-alphabet base64 without padding that ignores non-zero trailing bits.
fn lenient_base64() -> &'static Encoding {
    static ENCODING: OnceLock<Encoding> = OnceLock::new();
    ENCODING.get_or_init(|| {
        let mut spec = BASE64.specification();
        spec.padding = None;
        spec.check_trailing_bits = false;
        spec.encoding().unwrap_or_else(|_| BASE64_NOPAD.clone())
    })
}

/// Decodes standard-alphabet base64.
///
/// Characters outside the alphabet (including `=` and line breaks) are dropped
/// before decoding, so both padded and unpadded input is accepted. A dangling
/// sixth-bit group that cannot form a byte is ignored.
#[must_use]
pub fn base64_decode(input: &str) -> Vec<u8> {
    let mut symbols: Vec<u8> = input
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/'))
        .collect();
    if symbols.len() % 4 == 1 {
        symbols.pop();
    }
    lenient_base64().decode(&symbols).unwrap_or_default()
}

/// Turns decoded bytes into text: UTF-8 when valid, Latin-1 otherwise.
#[must_use]
pub fn bytes_to_string(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

/// The three prologue statements, as read from the program body.
#[derive(Debug, Clone, PartialEq)]
pub struct Prologue {
    /// Name of the array variable.
    pub table_name: String,
    /// Encoded elements in declaration order.
    pub encoded: Vec<String>,
    /// Rotation count passed to the rotation call.
    pub rotation: usize,
    /// Name of the decode-by-index function.
    pub decoder: String,
}

impl Prologue {
    /// Recognizes the prologue in the first three statements of `body`.
    ///
    /// Returns `None` unless statement 0 declares an array of string literals,
    /// statement 1 calls something with that array and a numeric count, and
    /// statement 2 declares the decoder.
    #[must_use]
    pub fn find(body: &[Statement]) -> Option<Prologue> {
        let [table_stmt, rotate_stmt, decoder_stmt, ..] = body else {
            return None;
        };

        let (table_name, init) = first_declarator(table_stmt)?;
        let Some(Expression::Array { elements }) = init else {
            return None;
        };
        let encoded = elements
            .iter()
            .map(|e| e.as_ref()?.as_str_literal().map(str::to_string))
            .collect::<Option<Vec<_>>>()?;

        let Some(Expression::Call(call)) = rotate_stmt.as_expression() else {
            return None;
        };
        let [array, count, ..] = call.arguments.as_slice() else {
            return None;
        };
        if array.as_identifier() != Some(table_name) {
            return None;
        }
        let rotation = literal_index(count)?;

        let (decoder, _) = first_declarator(decoder_stmt)?;

        Some(Prologue {
            table_name: table_name.to_string(),
            encoded,
            rotation,
            decoder: decoder.to_string(),
        })
    }

    /// Decodes and derotates the table.
    #[must_use]
    pub fn decode(&self) -> StringTable {
        let mut table = StringTable {
            name: self.table_name.clone(),
            entries: self
                .encoded
                .iter()
                .map(|e| bytes_to_string(base64_decode(e)))
                .collect(),
        };
        table.rotate(self.rotation);
        table
    }
}

fn first_declarator(stmt: &Statement) -> Option<(&str, Option<&Expression>)> {
    let decl = stmt.as_variable_declaration()?.declarations.first()?;
    Some((decl.id.as_identifier()?, decl.init.as_ref()))
}

/// Decoded strings keyed by the array variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTable {
    /// Name of the array variable.
    pub name: String,
    /// Decoded strings in runtime order.
    pub entries: Vec<String>,
}

impl StringTable {
    /// Applies `count` shift-then-push rotations.
    pub fn rotate(&mut self, count: usize) {
        if !self.entries.is_empty() {
            let n = count % self.entries.len();
            self.entries.rotate_left(n);
        }
    }

    /// Returns the string at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no strings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decodes the string table and inlines its entries.
pub struct StringTableDecoder {
    normalize_members: bool,
    table: Option<StringTable>,
}

impl StringTableDecoder {
    /// Creates the pass. `normalize_members` enables `obj["name"]` to `obj.name`.
    #[must_use]
    pub fn new(normalize_members: bool) -> Self {
        Self {
            normalize_members,
            table: None,
        }
    }

    /// The table decoded by the last run, if a prologue was found.
    #[must_use]
    pub fn table(&self) -> Option<&StringTable> {
        self.table.as_ref()
    }
}

impl Default for StringTableDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AstPass for StringTableDecoder {
    fn name(&self) -> &'static str {
        "strings"
    }

    fn description(&self) -> &'static str {
        "Decodes the rotated base64 string table and inlines its entries"
    }

    fn initialize(&mut self, _events: &EventLog) -> Result<()> {
        self.table = None;
        Ok(())
    }

    fn run(&mut self, program: &mut Program, events: &EventLog) -> Result<bool> {
        let Some(prologue) = Prologue::find(&program.body) else {
            debug!("strings: no string table prologue, skipping");
            return Ok(false);
        };

        let table = prologue.decode();
        events
            .record(EventKind::StringTableIdentified)
            .at("program", 0)
            .pass(self.name())
            .message(format!(
                "{} ({} entries, rotated by {}), decoder {}",
                table.name,
                table.len(),
                prologue.rotation,
                prologue.decoder
            ));

        let mut rewriter = StringRewriter {
            table: &table,
            decoder: &prologue.decoder,
            normalize_members: self.normalize_members,
            events,
            pass: self.name(),
            scopes: ScopeTracker::new(),
            decoded: 0,
            normalized: 0,
        };
        walk_program(&mut rewriter, program);
        let (decoded, normalized) = (rewriter.decoded, rewriter.normalized);

        info!(
            "strings: table {} decoded, {} literals restored, {} members normalized",
            table.name, decoded, normalized
        );
        self.table = Some(table);
        Ok(decoded + normalized > 0)
    }
}

struct StringRewriter<'a> {
    table: &'a StringTable,
    decoder: &'a str,
    normalize_members: bool,
    events: &'a EventLog,
    pass: &'static str,
    scopes: ScopeTracker,
    decoded: usize,
    normalized: usize,
}

impl StringRewriter<'_> {
    fn lookup(&mut self, index: Option<usize>, site: &str) -> Option<Expression> {
        let index = index?;
        let Some(value) = self.table.get(index) else {
            debug!("strings: {site} index {index} out of range ({} entries)", self.table.len());
            return None;
        };
        self.decoded += 1;
        self.events
            .record(EventKind::StringDecoded)
            .scope(self.scopes.label())
            .pass(self.pass)
            .message(format!("{site}[{index}] -> {:?}", truncate_string(value, 40)));
        Some(builders::string(value))
    }
}

impl VisitMut for StringRewriter<'_> {
    fn enter_function(&mut self, _params: &[Expression], _body: Option<&mut Vec<Statement>>) {
        self.scopes.enter();
    }

    fn leave_function(&mut self) {
        self.scopes.leave();
    }

    fn leave_expression(&mut self, expr: &mut Expression) -> Option<Expression> {
        match expr {
            Expression::Member(member) if member.computed => {
                if member.object.as_identifier() == Some(self.table.name.as_str()) {
                    let index = member.property.as_number_literal().and_then(index_from_f64);
                    let table = self.table;
                    if let Some(replacement) = self.lookup(index, &table.name) {
                        return Some(replacement);
                    }
                }

                if !self.normalize_members {
                    return None;
                }
                let name = member.property.as_str_literal()?;
                if !is_identifier_name(name) {
                    return None;
                }
                let name = name.to_string();
                self.normalized += 1;
                self.events
                    .record(EventKind::MemberNormalized)
                    .scope(self.scopes.label())
                    .pass(self.pass)
                    .message(format!("[{name:?}] -> .{name}"));
                member.property = Box::new(builders::ident(name));
                member.computed = false;
                None
            }
            Expression::Call(call) if call.callee.as_identifier() == Some(self.decoder) => {
                let [argument] = call.arguments.as_slice() else {
                    return None;
                };
                let index = literal_index(argument);
                let decoder = self.decoder;
                self.lookup(index, decoder)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::{
        call, computed_member, dot_member, expression_statement, ident, number, string,
    };
    use serde_json::json;

    fn prologue_program(extra: serde_json::Value) -> Program {
        let mut body = vec![
            json!({"type": "VariableDeclaration", "kind": "var", "declarations": [{
                "type": "VariableDeclarator",
                "id": {"type": "Identifier", "name": "_0x4f2a"},
                "init": {"type": "ArrayExpression", "elements": [
                    {"type": "Literal", "value": "aGVsbG8=", "raw": "'aGVsbG8='"},
                    {"type": "Literal", "value": "d29ybGQ=", "raw": "'d29ybGQ='"},
                    {"type": "Literal", "value": "cHVzaA==", "raw": "'cHVzaA=='"}
                ]}
            }]}),
            json!({"type": "ExpressionStatement", "expression": {
                "type": "CallExpression",
                "callee": {"type": "FunctionExpression", "id": null, "params": [],
                           "body": {"type": "BlockStatement", "body": []}},
                "arguments": [
                    {"type": "Identifier", "name": "_0x4f2a"},
                    {"type": "Literal", "value": 1, "raw": "0x1"}
                ]
            }}),
            json!({"type": "VariableDeclaration", "kind": "var", "declarations": [{
                "type": "VariableDeclarator",
                "id": {"type": "Identifier", "name": "_0x1b3c"},
                "init": {"type": "FunctionExpression", "id": null, "params": [],
                         "body": {"type": "BlockStatement", "body": []}}
            }]}),
        ];
        body.push(extra);
        Program::from_value(json!({"type": "Program", "sourceType": "script", "body": body})).unwrap()
    }

    fn run(program: &mut Program) -> (bool, EventLog) {
        let events = EventLog::new();
        let mut pass = StringTableDecoder::default();
        let changed = pass.run(program, &events).unwrap();
        (changed, events)
    }

    #[test]
    fn test_base64_round_trip_with_all_paddings() {
        for len in 0..8u8 {
            let bytes: Vec<u8> = (0..len).map(|b| b.wrapping_mul(97).wrapping_add(200)).collect();
            let padded = BASE64.encode(&bytes);
            assert_eq!(base64_decode(&padded), bytes, "padded, len {len}");
            let bare = padded.trim_end_matches('=');
            assert_eq!(base64_decode(bare), bytes, "unpadded, len {len}");
        }
    }

    #[test]
    fn test_base64_ignores_foreign_characters() {
        assert_eq!(base64_decode("aGVs\nbG8="), b"hello");
        assert_eq!(base64_decode("aG Vs-bG8"), b"hello");
        // non-canonical trailing bits
        assert_eq!(base64_decode("aGVsbG9="), b"hello");
    }

    #[test]
    fn test_bytes_to_string_falls_back_to_latin1() {
        assert_eq!(bytes_to_string("héllo".as_bytes().to_vec()), "héllo");
        assert_eq!(bytes_to_string(vec![0x68, 0xE9]), "h\u{e9}");
    }

    #[test]
    fn test_rotation_restores_after_full_cycle() {
        let original: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        for k in 0..=5 {
            let mut table = StringTable {
                name: "t".into(),
                entries: original.clone(),
            };
            table.rotate(k);
            table.rotate(original.len() - k % original.len());
            assert_eq!(table.entries, original, "k = {k}");
        }
    }

    #[test]
    fn test_rotation_count_is_shift_then_push() {
        let prologue = Prologue {
            table_name: "t".into(),
            encoded: vec!["aGVsbG8=".into(), "d29ybGQ=".into()],
            rotation: 1,
            decoder: "d".into(),
        };
        assert_eq!(prologue.decode().entries, vec!["world", "hello"]);

        let empty = StringTable {
            name: "t".into(),
            entries: Vec::new(),
        };
        let mut rotated = empty.clone();
        rotated.rotate(3);
        assert_eq!(rotated, empty);
    }

    #[test]
    fn test_table_access_is_inlined() {
        let stmt = expression_statement(computed_member(ident("_0x4f2a"), number(0.0)));
        let mut program = prologue_program(serde_json::to_value(&stmt).unwrap());
        let (changed, events) = run(&mut program);

        assert!(changed);
        assert_eq!(program.body[3], expression_statement(string("world")));
        assert!(events.has(EventKind::StringTableIdentified));
        assert_eq!(events.count_kind(EventKind::StringDecoded), 1);
    }

    #[test]
    fn test_decoder_call_accepts_numeric_strings() {
        let stmt = expression_statement(call(ident("_0x1b3c"), vec![string("0x2")]));
        let mut program = prologue_program(serde_json::to_value(&stmt).unwrap());
        run(&mut program);
        assert_eq!(program.body[3], expression_statement(string("hello")));
    }

    #[test]
    fn test_out_of_range_is_left_alone() {
        let stmt = expression_statement(call(ident("_0x1b3c"), vec![number(9.0)]));
        let mut program = prologue_program(serde_json::to_value(&stmt).unwrap());
        let before = program.body[3].clone();
        run(&mut program);
        assert_eq!(program.body[3], before);
    }

    #[test]
    fn test_decoded_name_becomes_dot_access() {
        // arr[_0x4f2a[1]](x) -> arr.push(x)
        let stmt = expression_statement(call(
            computed_member(ident("arr"), computed_member(ident("_0x4f2a"), number(1.0))),
            vec![ident("x")],
        ));
        let mut program = prologue_program(serde_json::to_value(&stmt).unwrap());
        let (_, events) = run(&mut program);

        assert_eq!(
            program.body[3],
            expression_statement(call(dot_member(ident("arr"), "push"), vec![ident("x")]))
        );
        assert_eq!(events.count_kind(EventKind::MemberNormalized), 1);
    }

    #[test]
    fn test_only_identifier_names_are_normalized() {
        let stmt = expression_statement(computed_member(ident("o"), string("data-id")));
        let mut program = prologue_program(serde_json::to_value(&stmt).unwrap());
        run(&mut program);
        assert_eq!(
            program.body[3],
            expression_statement(computed_member(ident("o"), string("data-id")))
        );
    }

    #[test]
    fn test_normalization_can_be_disabled() {
        let stmt = expression_statement(computed_member(ident("o"), string("name")));
        let mut program = prologue_program(serde_json::to_value(&stmt).unwrap());
        let mut pass = StringTableDecoder::new(false);
        pass.run(&mut program, &EventLog::new()).unwrap();
        assert_eq!(
            program.body[3],
            expression_statement(computed_member(ident("o"), string("name")))
        );
    }

    #[test]
    fn test_missing_prologue_is_a_no_op() {
        let mut program = Program::new(vec![expression_statement(computed_member(
            ident("o"),
            string("name"),
        ))]);
        let before = program.clone();
        let (changed, events) = run(&mut program);
        assert!(!changed);
        assert!(events.is_empty());
        assert_eq!(program, before);
    }
}
