//! Finding `{name}` placeholders in text and resolving them against bindings.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::bindings::Bindings;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]+\}").expect("placeholder pattern is valid"));

/// A `{name}` occurrence inside a text span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'t> {
    /// Byte offset of the opening brace in the scanned text
    pub start: usize,
    /// Byte length of the whole `{name}` span, braces included
    pub len: usize,
    /// Text strictly between the braces, untrimmed
    pub name: &'t str,
}

impl Placeholder<'_> {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Lazily yield the non-overlapping placeholders in `text`, left to right.
///
/// The first `}` after a `{` closes the placeholder, so `{a{b}` is a single
/// match named `a{b`.
pub fn scan(text: &str) -> impl Iterator<Item = Placeholder<'_>> + '_ {
    PLACEHOLDER.find_iter(text).map(move |m| Placeholder {
        start: m.start(),
        len: m.len(),
        name: &text[m.start() + 1..m.end() - 1],
    })
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// `name` itself was bound
    Direct,
    /// Only `name + suffix` was bound
    Suffixed,
    /// Nothing was bound; the placeholder text is kept verbatim
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub value: Cow<'a, str>,
    pub source: Source,
}

fn verbatim(name: &str) -> Cow<'static, str> {
    Cow::Owned(format!("{{{name}}}"))
}

/// Value bound to `name`, or the placeholder itself when unbound.
pub fn lookup<'a>(name: &str, bindings: &'a Bindings) -> Cow<'a, str> {
    match bindings.get(name) {
        Some(value) => Cow::Borrowed(value),
        None => verbatim(name),
    }
}

/// Like [`lookup`], falling back to `name + suffix` before giving up.
///
/// An unsuffixed binding always wins, which lets a template row mix constant
/// columns (`{col}`) with per-row ones (`{col1}`, `{col2}`, ...).
pub fn lookup_with_suffix<'a>(name: &str, suffix: &str, bindings: &'a Bindings) -> Resolved<'a> {
    if let Some(value) = bindings.get(name) {
        return Resolved {
            value: Cow::Borrowed(value),
            source: Source::Direct,
        };
    }
    match bindings.get(&format!("{name}{suffix}")) {
        Some(value) => Resolved {
            value: Cow::Borrowed(value),
            source: Source::Suffixed,
        },
        None => Resolved {
            value: verbatim(name),
            source: Source::Missing,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<&str> {
        scan(text).map(|p| p.name).collect()
    }

    #[test]
    fn scan_finds_offsets_and_names() {
        let found: Vec<_> = scan("a {x} b {yy}").collect();
        assert_eq!(
            found,
            vec![
                Placeholder { start: 2, len: 3, name: "x" },
                Placeholder { start: 8, len: 4, name: "yy" },
            ]
        );
        assert_eq!(found[1].end(), 12);
    }

    #[test]
    fn scan_ignores_empty_and_unterminated() {
        assert!(names("{} and {open").is_empty());
        assert!(names("no braces here").is_empty());
    }

    #[test]
    fn first_closing_brace_wins() {
        assert_eq!(names("{a{b}c}"), vec!["a{b"]);
        assert_eq!(names("{ spaced name }"), vec![" spaced name "]);
    }

    #[test]
    fn scan_offsets_are_bytes() {
        let found: Vec<_> = scan("é{x}").collect();
        assert_eq!(found[0].start, 2);
    }

    #[test]
    fn lookup_passes_missing_through() {
        let bindings = Bindings::from_iter([("x", "V")]);
        assert_eq!(lookup("x", &bindings), "V");
        assert_eq!(lookup("y", &bindings), "{y}");
    }

    #[test]
    fn suffix_fallback() {
        let bindings = Bindings::from_iter([("x3", "V")]);
        let resolved = lookup_with_suffix("x", "3", &bindings);
        assert_eq!(resolved.value, "V");
        assert_eq!(resolved.source, Source::Suffixed);

        let missing = lookup_with_suffix("x", "4", &bindings);
        assert_eq!(missing.value, "{x}");
        assert_eq!(missing.source, Source::Missing);
    }

    #[test]
    fn unsuffixed_binding_wins() {
        let bindings = Bindings::from_iter([("x", "V2"), ("x3", "V")]);
        let resolved = lookup_with_suffix("x", "3", &bindings);
        assert_eq!(resolved.value, "V2");
        assert_eq!(resolved.source, Source::Direct);
    }
}
