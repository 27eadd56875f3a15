//! Operator enums for unary, update, binary, logical and assignment expressions.
//!
//! Every operator serializes to its JavaScript token, which is also what ESTree
//! stores in the `operator` field. The same token is exposed through [`Into<&str>`]
//! and [`std::fmt::Display`] for the code generator.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Operator of a `UnaryExpression`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum UnaryOperator {
    /// `-x`
    #[serde(rename = "-")]
    #[strum(serialize = "-")]
    Minus,
    /// `+x`
    #[serde(rename = "+")]
    #[strum(serialize = "+")]
    Plus,
    /// `!x`
    #[serde(rename = "!")]
    #[strum(serialize = "!")]
    Not,
    /// `~x`
    #[serde(rename = "~")]
    #[strum(serialize = "~")]
    BitNot,
    /// `typeof x`
    #[serde(rename = "typeof")]
    #[strum(serialize = "typeof")]
    TypeOf,
    /// `void x`
    #[serde(rename = "void")]
    #[strum(serialize = "void")]
    Void,
    /// `delete x`
    #[serde(rename = "delete")]
    #[strum(serialize = "delete")]
    Delete,
}

impl UnaryOperator {
    /// Returns true for the keyword operators, which need a space before their operand.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(self, Self::TypeOf | Self::Void | Self::Delete)
    }
}

/// Operator of an `UpdateExpression`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
pub enum UpdateOperator {
    /// `++`
    #[serde(rename = "++")]
    #[strum(serialize = "++")]
    Increment,
    /// `--`
    #[serde(rename = "--")]
    #[strum(serialize = "--")]
    Decrement,
}

/// Operator of a `BinaryExpression`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[allow(missing_docs)]
pub enum BinaryOperator {
    #[serde(rename = "==")]
    #[strum(serialize = "==")]
    Eq,
    #[serde(rename = "!=")]
    #[strum(serialize = "!=")]
    NotEq,
    #[serde(rename = "===")]
    #[strum(serialize = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    #[strum(serialize = "!==")]
    StrictNotEq,
    #[serde(rename = "<")]
    #[strum(serialize = "<")]
    Lt,
    #[serde(rename = "<=")]
    #[strum(serialize = "<=")]
    LtEq,
    #[serde(rename = ">")]
    #[strum(serialize = ">")]
    Gt,
    #[serde(rename = ">=")]
    #[strum(serialize = ">=")]
    GtEq,
    #[serde(rename = "<<")]
    #[strum(serialize = "<<")]
    Shl,
    #[serde(rename = ">>")]
    #[strum(serialize = ">>")]
    Shr,
    #[serde(rename = ">>>")]
    #[strum(serialize = ">>>")]
    UShr,
    #[serde(rename = "+")]
    #[strum(serialize = "+")]
    Add,
    #[serde(rename = "-")]
    #[strum(serialize = "-")]
    Sub,
    #[serde(rename = "*")]
    #[strum(serialize = "*")]
    Mul,
    #[serde(rename = "/")]
    #[strum(serialize = "/")]
    Div,
    #[serde(rename = "%")]
    #[strum(serialize = "%")]
    Mod,
    #[serde(rename = "**")]
    #[strum(serialize = "**")]
    Exp,
    #[serde(rename = "|")]
    #[strum(serialize = "|")]
    BitOr,
    #[serde(rename = "^")]
    #[strum(serialize = "^")]
    BitXor,
    #[serde(rename = "&")]
    #[strum(serialize = "&")]
    BitAnd,
    #[serde(rename = "in")]
    #[strum(serialize = "in")]
    In,
    #[serde(rename = "instanceof")]
    #[strum(serialize = "instanceof")]
    InstanceOf,
}

impl BinaryOperator {
    /// Binding power of the operator; higher binds tighter.
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::BitOr => 6,
            Self::BitXor => 7,
            Self::BitAnd => 8,
            Self::Eq | Self::NotEq | Self::StrictEq | Self::StrictNotEq => 9,
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq | Self::In | Self::InstanceOf => 10,
            Self::Shl | Self::Shr | Self::UShr => 11,
            Self::Add | Self::Sub => 12,
            Self::Mul | Self::Div | Self::Mod => 13,
            Self::Exp => 14,
        }
    }

    /// Returns true for the keyword operators `in` and `instanceof`.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(self, Self::In | Self::InstanceOf)
    }
}

/// Operator of a `LogicalExpression`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[allow(missing_docs)]
pub enum LogicalOperator {
    #[serde(rename = "||")]
    #[strum(serialize = "||")]
    Or,
    #[serde(rename = "&&")]
    #[strum(serialize = "&&")]
    And,
    #[serde(rename = "??")]
    #[strum(serialize = "??")]
    Coalesce,
}

impl LogicalOperator {
    /// Binding power of the operator; higher binds tighter.
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Coalesce => 3,
            Self::Or => 4,
            Self::And => 5,
        }
    }
}

/// Operator of an `AssignmentExpression`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[allow(missing_docs)]
pub enum AssignmentOperator {
    #[serde(rename = "=")]
    #[strum(serialize = "=")]
    Assign,
    #[serde(rename = "+=")]
    #[strum(serialize = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    #[strum(serialize = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    #[strum(serialize = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    #[strum(serialize = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    #[strum(serialize = "%=")]
    ModAssign,
    #[serde(rename = "**=")]
    #[strum(serialize = "**=")]
    ExpAssign,
    #[serde(rename = "<<=")]
    #[strum(serialize = "<<=")]
    ShlAssign,
    #[serde(rename = ">>=")]
    #[strum(serialize = ">>=")]
    ShrAssign,
    #[serde(rename = ">>>=")]
    #[strum(serialize = ">>>=")]
    UShrAssign,
    #[serde(rename = "|=")]
    #[strum(serialize = "|=")]
    BitOrAssign,
    #[serde(rename = "^=")]
    #[strum(serialize = "^=")]
    BitXorAssign,
    #[serde(rename = "&=")]
    #[strum(serialize = "&=")]
    BitAndAssign,
    #[serde(rename = "||=")]
    #[strum(serialize = "||=")]
    OrAssign,
    #[serde(rename = "&&=")]
    #[strum(serialize = "&&=")]
    AndAssign,
    #[serde(rename = "??=")]
    #[strum(serialize = "??=")]
    CoalesceAssign,
}
