//! Single-pass resource reference rewriter for markup and stylesheets.
//!
//! The same scanner serves two callers:
//! 1. The site mirror, which discovers references to crawl and later rewrites
//!    them to canonical storage paths (ingest time).
//! 2. The serve-time resolver, which rewrites stored pages so references point
//!    at the asset and page serving endpoints (serve time).
//!
//! Scanning is regex based over a narrow grammar (`src=`, `href=`, `srcset=`,
//! `url()`, `@import`). Every byte outside a substituted reference is copied
//! through untouched, and substituted text is never scanned again.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static HTML_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?P<attr>srcset|src|href)\s*=\s*(?:"(?P<adq>[^"]*)"|'(?P<asq>[^']*)')|url\(\s*(?:"(?P<udq>[^"]*)"|'(?P<usq>[^']*)'|(?P<ubare>[^)"'\s]*))\s*\)"#,
    )
    .expect("Invalid HTML reference regex")
});

static CSS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)@import\s+(?:"(?P<idq>[^"]*)"|'(?P<isq>[^']*)')|url\(\s*(?:"(?P<udq>[^"]*)"|'(?P<usq>[^']*)'|(?P<ubare>[^)"'\s]*))\s*\)"#,
    )
    .expect("Invalid CSS reference regex")
});

/// Which grammar to scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    /// `src`/`href`/`srcset` attributes plus inline `url()`
    Html,
    /// `@import` statements and `url()`
    Css,
}

/// How absolute and protocol-relative URLs are treated before resolving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Hand absolute URLs to the resolver (ingest time needs them as crawl targets)
    #[default]
    ResolveAbsolute,
    /// Leave absolute URLs untouched (serve time)
    PassThroughAbsolute,
}

/// Syntactic position a reference was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `src="..."`
    Src,
    /// `href="..."`
    Href,
    /// One URL token of a `srcset` list
    Srcset,
    /// `url(...)` in a stylesheet or inline style
    CssUrl,
    /// `@import "..."`
    Import,
}

/// A reference handed to the resolver, with surrounding whitespace removed
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    pub raw: &'a str,
    pub kind: ReferenceKind,
}

impl<'a> Reference<'a> {
    /// Reference text before any `?query` or `#fragment`
    #[must_use]
    pub fn path(&self) -> &'a str {
        &self.raw[..self.query_start()]
    }

    fn query_start(&self) -> usize {
        self.raw.find(['?', '#']).unwrap_or(self.raw.len())
    }

    fn fragment_start(&self) -> usize {
        self.raw.find('#').unwrap_or(self.raw.len())
    }
}

/// How much of the original reference a replacement stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    /// The whole reference, query and fragment included
    All,
    /// Everything before `#`; the fragment is kept
    ThroughQuery,
    /// Only the path; `?query#fragment` is kept
    Path,
}

/// Text substituted for a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub value: String,
    pub consumed: Consumed,
}

impl Replacement {
    pub fn whole(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            consumed: Consumed::All,
        }
    }

    pub fn keep_fragment(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            consumed: Consumed::ThroughQuery,
        }
    }

    pub fn keep_query(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            consumed: Consumed::Path,
        }
    }

    fn tail<'a>(&self, reference: &Reference<'a>) -> &'a str {
        match self.consumed {
            Consumed::All => "",
            Consumed::ThroughQuery => &reference.raw[reference.fragment_start()..],
            Consumed::Path => &reference.raw[reference.query_start()..],
        }
    }
}

/// Whether a reference is never offered to the resolver under `policy`
#[must_use]
pub fn is_skippable(raw: &str, policy: SkipPolicy) -> bool {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return true;
    }

    let lower = raw.to_ascii_lowercase();
    if ["data:", "mailto:", "tel:", "javascript:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return true;
    }

    policy == SkipPolicy::PassThroughAbsolute
        && (lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//"))
}

/// Reference scanner configured with a grammar and a skip policy.
#[derive(Debug, Clone, Copy)]
pub struct LinkRewriter {
    mode: RewriteMode,
    policy: SkipPolicy,
}

impl LinkRewriter {
    #[must_use]
    pub fn new(mode: RewriteMode) -> Self {
        Self {
            mode,
            policy: SkipPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SkipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Rewrite every reference `resolve` has a replacement for.
    ///
    /// Returns the rewritten text and the number of substitutions made.
    pub fn rewrite<F>(&self, text: &str, mut resolve: F) -> (String, usize)
    where
        F: FnMut(&Reference<'_>) -> Option<Replacement>,
    {
        let pattern = match self.mode {
            RewriteMode::Html => &*HTML_PATTERN,
            RewriteMode::Css => &*CSS_PATTERN,
        };

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        let mut count = 0;

        for caps in pattern.captures_iter(text) {
            if !at_attribute_boundary(text, &caps) {
                continue;
            }
            let Some((value, kind)) = reference_value(&caps) else {
                continue;
            };

            output.push_str(&text[last..value.start()]);
            if kind == ReferenceKind::Srcset {
                self.rewrite_srcset(value.as_str(), &mut resolve, &mut output, &mut count);
            } else {
                self.rewrite_one(value.as_str(), kind, &mut resolve, &mut output, &mut count);
            }
            last = value.end();
        }

        output.push_str(&text[last..]);
        (output, count)
    }

    /// Raw references in document order, first occurrence only, skippable ones excluded.
    #[must_use]
    pub fn discover(&self, text: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut found = Vec::new();
        let _ = self.rewrite(text, |reference| {
            if seen.insert(reference.raw.to_string()) {
                found.push(reference.raw.to_string());
            }
            None
        });
        found
    }

    fn rewrite_one<F>(
        &self,
        value: &str,
        kind: ReferenceKind,
        resolve: &mut F,
        output: &mut String,
        count: &mut usize,
    ) where
        F: FnMut(&Reference<'_>) -> Option<Replacement>,
    {
        let core = value.trim();
        if is_skippable(core, self.policy) {
            output.push_str(value);
            return;
        }

        let reference = Reference { raw: core, kind };
        match resolve(&reference) {
            Some(replacement) => {
                let lead = value.len() - value.trim_start().len();
                let trail_start = value.trim_end().len();
                output.push_str(&value[..lead]);
                output.push_str(&replacement.value);
                output.push_str(replacement.tail(&reference));
                output.push_str(&value[trail_start..]);
                *count += 1;
            }
            None => output.push_str(value),
        }
    }

    /// Each comma-separated candidate is `<url> [descriptor]`; only the URL is touched.
    fn rewrite_srcset<F>(
        &self,
        value: &str,
        resolve: &mut F,
        output: &mut String,
        count: &mut usize,
    ) where
        F: FnMut(&Reference<'_>) -> Option<Replacement>,
    {
        for (idx, candidate) in value.split(',').enumerate() {
            if idx > 0 {
                output.push(',');
            }
            let url_start = candidate.len() - candidate.trim_start().len();
            let url_end = candidate[url_start..]
                .find(char::is_whitespace)
                .map_or(candidate.len(), |offset| url_start + offset);

            output.push_str(&candidate[..url_start]);
            self.rewrite_one(
                &candidate[url_start..url_end],
                ReferenceKind::Srcset,
                resolve,
                output,
                count,
            );
            output.push_str(&candidate[url_end..]);
        }
    }
}

/// Shorthand for a one-off rewrite that offers absolute URLs to the resolver.
pub fn rewrite<F>(text: &str, mode: RewriteMode, resolve: F) -> String
where
    F: FnMut(&Reference<'_>) -> Option<Replacement>,
{
    LinkRewriter::new(mode).rewrite(text, resolve).0
}

/// An attribute name must follow whitespace, a quote or `/`, so `data-src` is not `src`.
/// The delimiter may be the closing quote of the previous match.
fn at_attribute_boundary(text: &str, caps: &Captures<'_>) -> bool {
    let Some(attr) = caps.name("attr") else {
        return true;
    };
    text[..attr.start()]
        .chars()
        .next_back()
        .is_none_or(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '/'))
}

fn reference_value<'t>(caps: &Captures<'t>) -> Option<(regex::Match<'t>, ReferenceKind)> {
    if let Some(value) = caps.name("adq").or_else(|| caps.name("asq")) {
        let attr = caps.name("attr")?.as_str().to_ascii_lowercase();
        let kind = match attr.as_str() {
            "srcset" => ReferenceKind::Srcset,
            "src" => ReferenceKind::Src,
            _ => ReferenceKind::Href,
        };
        return Some((value, kind));
    }
    if let Some(value) = caps.name("idq").or_else(|| caps.name("isq")) {
        return Some((value, ReferenceKind::Import));
    }
    caps.name("udq")
        .or_else(|| caps.name("usq"))
        .or_else(|| caps.name("ubare"))
        .map(|value| (value, ReferenceKind::CssUrl))
}
