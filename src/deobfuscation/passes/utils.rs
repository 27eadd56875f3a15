//! Shared utilities for deobfuscation passes.
//!
//! This module contains common functionality used by multiple passes to avoid
//! code duplication and ensure consistent behavior.

use unicode_xid::UnicodeXID;

/// Checks whether `name` can be written after a dot: `obj.name`.
///
/// Follows the ECMAScript IdentifierName grammar: the first character is
/// `ID_Start`, `$` or `_`; the rest are `ID_Continue`, `$`, ZWNJ or ZWJ. Reserved
/// words are legal here because property names may be keywords (`obj.default`).
///
/// # Example
///
/// ```ignore
/// assert!(is_identifier_name("push"));
/// assert!(!is_identifier_name("data-id"));
/// ```
#[must_use]
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_xid_start() || first == '$' || first == '_') {
        return false;
    }
    chars.all(|c| c.is_xid_continue() || matches!(c, '$' | '\u{200C}' | '\u{200D}'))
}

/// Labels the function scope a traversal is currently in.
///
/// Functions are numbered in the order they are entered, so labels are stable for a
/// given tree and can be matched across passes and runs.
#[derive(Debug, Default)]
pub struct ScopeTracker {
    stack: Vec<usize>,
    entered: usize,
}

impl ScopeTracker {
    /// Creates a tracker positioned at the program scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the next function scope.
    pub fn enter(&mut self) {
        self.entered += 1;
        self.stack.push(self.entered);
    }

    /// Leaves the innermost function scope.
    pub fn leave(&mut self) {
        self.stack.pop();
    }

    /// Label of the innermost scope: `program` or `function#N`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.stack.last() {
            Some(n) => format!("function#{n}"),
            None => "program".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_names() {
        assert!(is_identifier_name("push"));
        assert!(is_identifier_name("_0x4f2a"));
        assert!(is_identifier_name("$el"));
        assert!(is_identifier_name("default"));
        assert!(is_identifier_name("größe"));
        assert!(is_identifier_name("a\u{200D}b"));
    }

    #[test]
    fn test_rejects_non_identifier_names() {
        assert!(!is_identifier_name(""));
        assert!(!is_identifier_name("0abc"));
        assert!(!is_identifier_name("data-id"));
        assert!(!is_identifier_name("a b"));
        assert!(!is_identifier_name("\u{200D}a"));
    }

    #[test]
    fn test_scope_labels() {
        let mut scopes = ScopeTracker::new();
        assert_eq!(scopes.label(), "program");

        scopes.enter();
        scopes.enter();
        assert_eq!(scopes.label(), "function#2");

        scopes.leave();
        assert_eq!(scopes.label(), "function#1");
        scopes.enter();
        // numbering continues rather than reusing 2
        assert_eq!(scopes.label(), "function#3");
    }
}
