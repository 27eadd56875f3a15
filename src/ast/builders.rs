//! Constructors for the nodes the passes synthesize.
//!
//! Synthesized nodes carry no `raw` text or position information.

use crate::ast::{
    BinaryExpression, BinaryOperator, BlockStatement, CallExpression, Expression, Literal, LiteralValue,
    MemberExpression, Statement, UnaryExpression, UnaryOperator,
};

/// `name`
pub fn ident(name: impl Into<String>) -> Expression {
    Expression::Identifier { name: name.into() }
}

/// A literal node holding `value`.
#[must_use]
pub fn literal(value: LiteralValue) -> Expression {
    Expression::Literal(Literal {
        value,
        raw: None,
        regex: None,
        bigint: None,
    })
}

/// `"value"`
pub fn string(value: impl Into<String>) -> Expression {
    literal(LiteralValue::String(value.into()))
}

/// Numeric literal.
#[must_use]
pub fn number(value: f64) -> Expression {
    literal(LiteralValue::Number(value))
}

/// `true` / `false`
#[must_use]
pub fn boolean(value: bool) -> Expression {
    literal(LiteralValue::Boolean(value))
}

/// `undefined`
#[must_use]
pub fn undefined() -> Expression {
    ident("undefined")
}

/// `!argument`
#[must_use]
pub fn not(argument: Expression) -> Expression {
    Expression::Unary(UnaryExpression {
        operator: UnaryOperator::Not,
        prefix: true,
        argument: Box::new(argument),
    })
}

/// Logical negation that unwraps an existing `!` instead of doubling it.
#[must_use]
pub fn negate(test: Expression) -> Expression {
    match test {
        Expression::Unary(UnaryExpression {
            operator: UnaryOperator::Not,
            argument,
            ..
        }) => *argument,
        other => not(other),
    }
}

/// `object.property`
pub fn dot_member(object: Expression, property: impl Into<String>) -> Expression {
    Expression::Member(MemberExpression {
        object: Box::new(object),
        property: Box::new(ident(property)),
        computed: false,
        optional: false,
    })
}

/// `object[property]`
#[must_use]
pub fn computed_member(object: Expression, property: Expression) -> Expression {
    Expression::Member(MemberExpression {
        object: Box::new(object),
        property: Box::new(property),
        computed: true,
        optional: false,
    })
}

/// `callee(arguments)`
#[must_use]
pub fn call(callee: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::Call(CallExpression {
        callee: Box::new(callee),
        arguments,
        optional: false,
    })
}

/// `left op right`
#[must_use]
pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// `expression;`
#[must_use]
pub fn expression_statement(expression: Expression) -> Statement {
    Statement::Expression {
        expression,
        directive: None,
    }
}

/// `{ body }` as a statement.
#[must_use]
pub fn block(body: Vec<Statement>) -> Statement {
    Statement::Block { body }
}

/// `{ body }` as a function body.
#[must_use]
pub fn block_body(body: Vec<Statement>) -> BlockStatement {
    BlockStatement { body }
}

/// Parses the text of a JavaScript numeric literal into an array index.
///
/// Accepts decimal, `0x`/`0o`/`0b` prefixed, and exponent forms as long as the value
/// is a non-negative integer. Surrounding whitespace is ignored, like `Number()`.
#[must_use]
pub fn parse_index(text: &str) -> Option<usize> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return usize::from_str_radix(&text[2..], radix).ok();
    }

    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+'))
    {
        return None;
    }
    let value: f64 = text.parse().ok()?;
    index_from_f64(value)
}

/// Converts a numeric literal value into an index when it is a non-negative integer.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn index_from_f64(value: f64) -> Option<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as usize)
    } else {
        None
    }
}

/// Reads an index from a literal that is a number or a numeric string.
#[must_use]
pub fn literal_index(expr: &Expression) -> Option<usize> {
    match expr.as_literal()?.value {
        LiteralValue::Number(n) => index_from_f64(n),
        LiteralValue::String(ref s) => parse_index(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_forms() {
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("0x1f"), Some(31));
        assert_eq!(parse_index("0b11"), Some(3));
        assert_eq!(parse_index(" 7 "), Some(7));
        assert_eq!(parse_index("1e1"), Some(10));
        assert_eq!(parse_index("1.5"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("abc"), None);
        assert_eq!(parse_index(""), None);
    }

    #[test]
    fn test_negate_unwraps() {
        let x = ident("x");
        assert_eq!(negate(not(x.clone())), x);
        assert_eq!(negate(x.clone()), not(x));
    }

    #[test]
    fn test_literal_index() {
        assert_eq!(literal_index(&number(3.0)), Some(3));
        assert_eq!(literal_index(&string("0x2")), Some(2));
        assert_eq!(literal_index(&boolean(true)), None);
        assert_eq!(literal_index(&ident("i")), None);
    }
}
