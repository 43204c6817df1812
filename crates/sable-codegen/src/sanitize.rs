//! Identifier sanitizing for the generated outputs.
//!
//! Source identifiers and compiler-generated names (which may contain
//! `<`, `>` or `:`) are mapped to names that are legal in the target.

use lazy_static::lazy_static;
use rustc_hash::FxHashSet;
use std::borrow::Cow;

lazy_static! {
    /// Reserved words of the textual target. These are escaped with `@`.
    static ref RESERVED_WORDS: FxHashSet<&'static str> = [
        "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
        "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
        "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
        "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
        "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
        "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed",
        "short", "sizeof", "stackalloc", "static", "string", "struct", "switch", "this",
        "throw", "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort",
        "using", "virtual", "void", "volatile", "while",
    ]
    .into_iter()
    .collect();
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_part(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Whether `name` is a reserved word of the textual target.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(name)
}

/// Map `name` to a legal target identifier.
///
/// Legal names come back borrowed. Reserved words get an `@` prefix;
/// illegal characters become `_`, and a leading digit is prefixed with `_`.
///
/// ```
/// use sable_codegen::sanitize::sanitize;
///
/// assert_eq!(sanitize("count"), "count");
/// assert_eq!(sanitize("class"), "@class");
/// assert_eq!(sanitize("<>temp:1"), "__temp_1");
/// ```
pub fn sanitize(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let legal = match chars.next() {
        Some(first) => is_identifier_start(first) && chars.all(is_identifier_part),
        None => false,
    };
    if legal {
        if is_reserved(name) {
            return Cow::Owned(format!("@{name}"));
        }
        return Cow::Borrowed(name);
    }

    let mut out = String::with_capacity(name.len() + 1);
    for (i, c) in name.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            out.push('_');
        }
        out.push(if is_identifier_part(c) { c } else { '_' });
    }
    if out.is_empty() {
        out.push('_');
    }
    Cow::Owned(out)
}

/// Quote `text` as a string literal of the textual target.
pub fn quote_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_names_are_borrowed() {
        assert!(matches!(sanitize("value_2"), Cow::Borrowed("value_2")));
        assert!(matches!(sanitize("_x"), Cow::Borrowed("_x")));
    }

    #[test]
    fn reserved_words_are_escaped() {
        assert_eq!(sanitize("string"), "@string");
        assert_eq!(sanitize("params"), "@params");
        assert_eq!(sanitize("print"), "print");
    }

    #[test]
    fn generated_names_are_cleaned() {
        assert_eq!(sanitize("<Main>$"), "_Main__");
        assert_eq!(sanitize("Point::x"), "Point__x");
        assert_eq!(sanitize("1st"), "_1st");
        assert_eq!(sanitize(""), "_");
    }

    #[test]
    fn string_literals() {
        assert_eq!(quote_string("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(quote_string("a\\b"), "\"a\\\\b\"");
        assert_eq!(quote_string("\u{1}"), "\"\\u0001\"");
    }
}
