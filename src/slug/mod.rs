use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub(crate) const FALLBACK_SLUG: &str = "section";

/// Turn heading text into a DOM-safe anchor id.
///
/// Rules:
/// - lowercase, then canonical decomposition with combining marks dropped
///   (`é` -> `e`);
/// - anything outside `[a-z0-9]`, whitespace and `-` is removed;
/// - whitespace runs become a single `-`, `-` runs collapse, and edge `-` are trimmed;
/// - an empty result becomes `"section"`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for ch in lowered.nfd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        }
        // Everything else is dropped without breaking the current word.
    }

    if out.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        out
    }
}

/// Identifiers handed out during one collection run.
#[derive(Clone, Debug, Default)]
pub struct IdRegistry {
    used: HashSet<String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `candidate`, or the first free `candidate-2`, `candidate-3`, ...
    pub fn claim(&mut self, candidate: &str) -> String {
        if self.used.insert(candidate.to_string()) {
            return candidate.to_string();
        }

        let mut n: u32 = 2;
        loop {
            let next = format!("{candidate}-{n}");
            if self.used.insert(next.clone()) {
                return next;
            }
            n = n.saturating_add(1);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_strips_diacritics_and_punctuation() {
        assert_eq!(slugify("Café Résumé!!"), "cafe-resume");
    }

    #[test]
    fn test_slugify_collapses_whitespace_and_dashes() {
        assert_eq!(slugify("  Getting   started -- fast  "), "getting-started-fast");
        assert_eq!(slugify("a\t\nb"), "a-b");
        assert_eq!(slugify("---edge---"), "edge");
    }

    #[test]
    fn test_slugify_removes_without_splitting_words() {
        assert_eq!(slugify("Don't panic"), "dont-panic");
        assert_eq!(slugify("C++ & Rust"), "c-rust");
        assert_eq!(slugify("v1.2 Release"), "v12-release");
    }

    #[test]
    fn test_slugify_fallback_for_empty_results() {
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
        assert_eq!(slugify("日本語"), FALLBACK_SLUG);
    }

    #[test]
    fn test_slugify_is_deterministic_and_idempotent() {
        for text in ["Overview", "Café Résumé!!", "  Mixed CASE 42 ", "ÅNGSTRÖM"] {
            let once = slugify(text);
            assert_eq!(once, slugify(text));
            assert_eq!(once, slugify(&once));
        }
        assert_eq!(slugify("ÅNGSTRÖM"), "angstrom");
    }

    #[test]
    fn test_registry_suffixes_in_order() {
        let mut reg = IdRegistry::new();
        assert_eq!(reg.claim("overview"), "overview");
        assert_eq!(reg.claim("overview"), "overview-2");
        assert_eq!(reg.claim("overview"), "overview-3");
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_registry_skips_taken_suffix() {
        let mut reg = IdRegistry::new();
        reg.claim("intro-2");
        assert_eq!(reg.claim("intro"), "intro");
        assert_eq!(reg.claim("intro"), "intro-3");
        assert!(reg.contains("intro-2"));
        assert!(!reg.contains("intro-4"));
    }
}
