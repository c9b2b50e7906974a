use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use ahash::AHashMap;
use nohash_hasher::IntSet;
use rustc_hash::FxHashMap;

use super::Parser;
use super::segments::base::{ErasedSegment, Tables};
use crate::dialects::base::Dialect;

/// Per-parse mutable state, created at the start of a top-level parse and
/// destroyed at its end. One context flows by reference through the whole
/// recursion; independent parses share nothing mutable.
#[derive(Debug)]
pub struct ParseContext<'a> {
    dialect: &'a Dialect,
    tables: Tables,
    pub(crate) indentation_config: &'a AHashMap<String, bool>,
    match_depth: usize,
    match_stack: Vec<Cow<'static, str>>,
    blacklist: ParseBlacklist,
}

impl<'a> From<&'a Parser<'a>> for ParseContext<'a> {
    fn from(parser: &'a Parser) -> Self {
        Self::new(parser.dialect(), parser.indentation_config())
    }
}

impl<'a> ParseContext<'a> {
    pub fn new(dialect: &'a Dialect, indentation_config: &'a AHashMap<String, bool>) -> Self {
        Self {
            dialect,
            tables: Tables::default(),
            indentation_config,
            match_depth: 0,
            match_stack: Vec::new(),
            blacklist: ParseBlacklist::default(),
        }
    }

    pub fn dialect(&self) -> &Dialect {
        self.dialect
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn match_depth(&self) -> usize {
        self.match_depth
    }

    /// The name of the innermost reference currently being matched, for
    /// logging only.
    pub fn current_match_name(&self) -> Option<&str> {
        self.match_stack.last().map(|name| name.as_ref())
    }

    pub fn blacklist(&mut self) -> &mut ParseBlacklist {
        &mut self.blacklist
    }

    /// Run `f` one match level deeper. The depth is restored on exit.
    pub fn deeper_match<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.match_depth += 1;
        let ret = f(self);
        self.match_depth -= 1;
        ret
    }

    /// Run `f` with `name` recorded as the segment being matched. Unlike
    /// `deeper_match` this does not increase the depth: references don't
    /// really count as a level of match.
    pub fn matching_segment<T>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.match_stack.push(name.into());
        let ret = f(self);
        self.match_stack.pop();
        ret
    }
}

/// Per-parse negative memoization for `Ref` matchers.
///
/// Keyed on the reference name and a fingerprint of the identities of the
/// input slice. Entries are added only when a reference fails to match, and
/// are never invalidated within a parse; segments are not mutated during a
/// match cycle so the identities stay meaningful.
#[derive(Debug, Default)]
pub struct ParseBlacklist {
    entries: FxHashMap<Cow<'static, str>, IntSet<u64>>,
}

impl ParseBlacklist {
    /// Fingerprint a segment slice by the addresses of its members. The
    /// length is folded in as well, so a prefix never collides with the
    /// full slice.
    pub fn fingerprint(segments: &[ErasedSegment]) -> u64 {
        let mut hasher = ahash::AHasher::default();
        segments.len().hash(&mut hasher);
        for seg in segments {
            seg.addr().hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn check(&self, name: &str, fingerprint: u64) -> bool {
        self.entries
            .get(name)
            .is_some_and(|seen| seen.contains(&fingerprint))
    }

    pub fn mark(&mut self, name: &Cow<'static, str>, fingerprint: u64) {
        self.entries
            .entry(name.clone())
            .or_default()
            .insert(fingerprint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::segments::test_functions::{generate_test_segments, test_dialect};

    #[test]
    fn test_context_deeper_match_restores_depth() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        assert_eq!(ctx.match_depth(), 0);
        let inner_depth = ctx.deeper_match(|ctx| {
            ctx.deeper_match(|ctx| ctx.match_depth())
        });
        assert_eq!(inner_depth, 2);
        assert_eq!(ctx.match_depth(), 0);
    }

    #[test]
    fn test_context_matching_segment_restores_stack() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let (name, depth) = ctx.matching_segment("ExpressionSegment", |ctx| {
            (ctx.current_match_name().map(str::to_string), ctx.match_depth())
        });
        assert_eq!(name.as_deref(), Some("ExpressionSegment"));
        assert_eq!(depth, 0);
        assert_eq!(ctx.current_match_name(), None);
    }

    #[test]
    fn test_blacklist_check_and_mark() {
        let segments = generate_test_segments(vec!["foo", " ", "bar"]);
        let mut blacklist = ParseBlacklist::default();

        let fingerprint = ParseBlacklist::fingerprint(&segments);
        assert!(!blacklist.check("FooSegment", fingerprint));

        blacklist.mark(&Cow::Borrowed("FooSegment"), fingerprint);
        assert!(blacklist.check("FooSegment", fingerprint));
        // Other names and other slices are unaffected.
        assert!(!blacklist.check("BarSegment", fingerprint));
        assert!(!blacklist.check(
            "FooSegment",
            ParseBlacklist::fingerprint(&segments[..1])
        ));
    }

    #[test]
    fn test_blacklist_fingerprint_includes_length() {
        let segments = generate_test_segments(vec!["foo", " ", "bar"]);
        let prefix = ParseBlacklist::fingerprint(&segments[..1]);
        let full = ParseBlacklist::fingerprint(&segments);
        assert_ne!(prefix, full);
    }
}
