//! Splicing resolved values into text and link targets.

use crate::bindings::Bindings;
use crate::placeholder::{self, Placeholder, Source};

/// Replace every placeholder in `text` with its bound value.
///
/// Unbound placeholders are left as literal `{name}` text.
pub fn substitute(text: &str, bindings: &Bindings) -> String {
    splice(text, |name| placeholder::lookup(name, bindings).into_owned())
}

/// Like [`substitute`], resolving through [`placeholder::lookup_with_suffix`].
///
/// The flag reports whether any placeholder resolved only via `name + suffix`.
pub fn substitute_with_suffix(text: &str, suffix: &str, bindings: &Bindings) -> (String, bool) {
    let mut suffixed = false;
    let out = splice(text, |name| {
        let resolved = placeholder::lookup_with_suffix(name, suffix, bindings);
        suffixed |= resolved.source == Source::Suffixed;
        resolved.value.into_owned()
    });
    (out, suffixed)
}

/// Substitute inside a link target where `{`/`}` may appear as `%7B`/`%7D`.
pub fn substitute_url(url: &str, bindings: &Bindings) -> String {
    encode_braces(&substitute(&decode_braces(url), bindings))
}

pub fn substitute_url_with_suffix(url: &str, suffix: &str, bindings: &Bindings) -> (String, bool) {
    let (out, suffixed) = substitute_with_suffix(&decode_braces(url), suffix, bindings);
    (encode_braces(&out), suffixed)
}

// Matches are spliced right to left so earlier offsets stay valid.
fn splice(text: &str, mut resolve: impl FnMut(&str) -> String) -> String {
    let matches: Vec<Placeholder<'_>> = placeholder::scan(text).collect();
    if matches.is_empty() {
        return text.to_string();
    }
    let mut out = text.to_string();
    for m in matches.iter().rev() {
        out.replace_range(m.start..m.end(), &resolve(m.name));
    }
    out
}

pub(crate) fn decode_braces(url: &str) -> String {
    url.replace("%7B", "{").replace("%7D", "}")
}

fn encode_braces(url: &str) -> String {
    url.replace('{', "%7B").replace('}', "%7D")
}

/// Substitution state shared across one block, or one attempted table row.
///
/// With a suffix set, lookups fall back to `name + suffix` and the context
/// remembers whether any such fallback hit.
#[derive(Debug)]
pub struct Substitution<'a> {
    bindings: &'a Bindings,
    suffix: Option<String>,
    suffixed_hit: bool,
}

impl<'a> Substitution<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        Self {
            bindings,
            suffix: None,
            suffixed_hit: false,
        }
    }

    pub fn with_suffix(bindings: &'a Bindings, n: usize) -> Self {
        Self {
            bindings,
            suffix: Some(n.to_string()),
            suffixed_hit: false,
        }
    }

    pub fn text(&mut self, text: &str) -> String {
        match &self.suffix {
            None => substitute(text, self.bindings),
            Some(suffix) => {
                let (out, hit) = substitute_with_suffix(text, suffix, self.bindings);
                self.suffixed_hit |= hit;
                out
            }
        }
    }

    pub fn url(&mut self, url: &str) -> String {
        match &self.suffix {
            None => substitute_url(url, self.bindings),
            Some(suffix) => {
                let (out, hit) = substitute_url_with_suffix(url, suffix, self.bindings);
                self.suffixed_hit |= hit;
                out
            }
        }
    }

    pub fn suffixed_hit(&self) -> bool {
        self.suffixed_hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vars(pairs: &[(&str, &str)]) -> Bindings {
        pairs.iter().copied().collect()
    }

    #[test]
    fn exact_match() {
        assert_eq!(substitute("{x}", &vars(&[("x", "V")])), "V");
    }

    #[test]
    fn missing_passthrough() {
        assert_eq!(substitute("{x}", &Bindings::new()), "{x}");
        assert_eq!(
            substitute("{a} and {b}", &vars(&[("b", "B")])),
            "{a} and B"
        );
    }

    #[test]
    fn multiple_placeholders_with_longer_values() {
        let bindings = vars(&[("a", "0123456789"), ("b", "2")]);
        assert_eq!(substitute("{a}-{b}", &bindings), "0123456789-2");
        assert_eq!(substitute("{a}-{b}", &vars(&[("a", "1"), ("b", "2")])), "1-2");
    }

    #[test]
    fn empty_value_collapses() {
        assert_eq!(substitute("[{x}]", &vars(&[("x", "")])), "[]");
    }

    #[test]
    fn values_are_not_rescanned() {
        let bindings = vars(&[("a", "{b}"), ("b", "nope")]);
        assert_eq!(substitute("{a}", &bindings), "{b}");
    }

    #[test]
    fn multibyte_text_around_placeholders() {
        let bindings = vars(&[("city", "Zürich")]);
        assert_eq!(substitute("→ {city} ←", &bindings), "→ Zürich ←");
    }

    #[test]
    fn suffix_flag_tracks_fallback_only() {
        let bindings = vars(&[("state", "TN"), ("city2", "Memphis")]);
        assert_eq!(
            substitute_with_suffix("{state} {city}", "2", &bindings),
            ("TN Memphis".to_string(), true)
        );
        assert_eq!(
            substitute_with_suffix("{state} {city}", "3", &bindings),
            ("TN {city}".to_string(), false)
        );
    }

    #[test]
    fn url_with_escaped_placeholder() {
        let bindings = vars(&[("slug", "page")]);
        assert_eq!(substitute_url("http://a/%7Bslug%7D", &bindings), "http://a/page");
        assert_eq!(substitute_url("http://a/{slug}", &bindings), "http://a/page");
    }

    #[test]
    fn url_reencodes_braces() {
        let bindings = vars(&[("q", "{raw}")]);
        assert_eq!(substitute_url("/search?q=%7Bq%7D", &bindings), "/search?q=%7Braw%7D");
        assert_eq!(substitute_url("/%7Bmissing%7D", &bindings), "/%7Bmissing%7D");
    }

    #[test]
    fn url_with_suffix() {
        let bindings = vars(&[("slug1", "first")]);
        assert_eq!(
            substitute_url_with_suffix("/p/%7Bslug%7D", "1", &bindings),
            ("/p/first".to_string(), true)
        );
    }

    #[test]
    fn substitution_context_accumulates_hits() {
        let bindings = vars(&[("city1", "Knoxville")]);
        let mut subst = Substitution::with_suffix(&bindings, 1);
        assert_eq!(subst.text("plain"), "plain");
        assert!(!subst.suffixed_hit());
        assert_eq!(subst.text("{city}"), "Knoxville");
        assert_eq!(subst.text("{other}"), "{other}");
        assert!(subst.suffixed_hit());

        let mut plain = Substitution::new(&bindings);
        assert_eq!(plain.text("{city}"), "{city}");
        assert!(!plain.suffixed_hit());
    }

    proptest! {
        #[test]
        fn prop_text_without_placeholders_is_identity(
            text in "[^{}]*",
            value in ".*",
        ) {
            let bindings = vars(&[("x", value.as_str())]);
            prop_assert_eq!(substitute(&text, &bindings), text);
        }

        #[test]
        fn prop_url_without_placeholders_is_identity(url in "[a-zA-Z0-9:/?&=.%_-]*") {
            prop_assume!(!url.contains("%7B") && !url.contains("%7D"));
            prop_assert_eq!(substitute_url(&url, &vars(&[("x", "y")])), url);
        }
    }
}
