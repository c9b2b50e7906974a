use std::borrow::Cow;
use std::sync::OnceLock;

use ahash::AHashSet;

use crate::errors::SQLParseError;
use crate::helpers::capitalize;
use crate::parser::context::{ParseBlacklist, ParseContext};
use crate::parser::match_result::MatchResult;
use crate::parser::matchable::{MatchableTrait, parse_match_logging};
use crate::parser::segments::base::ErasedSegment;

/// A meta-grammar that references another matcher by name, resolved through
/// the dialect at match time. This late binding is what allows cyclic
/// grammar graphs.
#[derive(Clone)]
pub struct Ref {
    reference: Cow<'static, str>,
    optional: bool,
    simple_cache: OnceLock<Option<AHashSet<String>>>,
}

impl std::fmt::Debug for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Ref: {}{}>",
            self.reference,
            if self.is_optional() { " [opt]" } else { "" }
        )
    }
}

impl Ref {
    pub fn new(reference: impl Into<Cow<'static, str>>) -> Self {
        Ref {
            reference: reference.into(),
            optional: false,
            simple_cache: OnceLock::new(),
        }
    }

    /// A reference to a keyword by name:
    /// `Ref::keyword("select")` == `Ref::new("SelectKeywordSegment")`.
    pub fn keyword(keyword: &str) -> Self {
        let name = capitalize(keyword) + "KeywordSegment";
        Ref::new(name)
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference && self.optional == other.optional
    }
}

impl Eq for Ref {}

impl MatchableTrait for Ref {
    fn name(&self) -> &'static str {
        "Ref"
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    // A ref is simple if the thing it references is simple.
    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<AHashSet<String>> {
        self.simple_cache
            .get_or_init(|| {
                if let Some(ref c) = crumbs {
                    if c.contains(&&*self.reference) {
                        let loop_string = c.join(" -> ");
                        panic!("Self referential grammar detected: {}", loop_string);
                    }
                }

                let mut new_crumbs = crumbs.unwrap_or_default();
                new_crumbs.push(&self.reference);

                parse_context
                    .dialect()
                    .r#ref(&self.reference)
                    .simple(parse_context, Some(new_crumbs))
            })
            .clone()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        let elem = parse_context.dialect().r#ref(&self.reference);

        // Check the efficiency cache first. Segments aren't mutated within
        // a match cycle, so their identities are a sound key.
        let fingerprint = ParseBlacklist::fingerprint(segments);
        if parse_context.blacklist().check(&self.reference, fingerprint) {
            parse_match_logging(self.name(), "match", "SKIP", parse_context, segments);
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }

        // NB: we're not incrementing the depth here. References shouldn't
        // really count as a level of match.
        let resp = parse_context.matching_segment(self.reference.clone(), |ctx| {
            elem.match_segments(segments, ctx)
        })?;

        if !resp.has_match() {
            parse_context.blacklist().mark(&self.reference, fingerprint);
        }

        Ok(resp)
    }
}

/// Matches anything. Most useful in match grammars, where a later parse
/// grammar will work out what's inside.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Anything {}

impl Anything {
    pub fn new() -> Self {
        Self {}
    }
}

impl MatchableTrait for Anything {
    fn name(&self) -> &'static str {
        "Anything"
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        _parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        Ok(MatchResult::from_matched(segments.to_vec()))
    }
}

/// Matches nothing. Useful for placeholders which might be overwritten by
/// other dialects.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Nothing {}

impl Nothing {
    pub fn new() -> Self {
        Self {}
    }
}

impl MatchableTrait for Nothing {
    fn name(&self) -> &'static str {
        "Nothing"
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        _parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        Ok(MatchResult::from_unmatched(segments.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;

    use super::*;
    use crate::helpers::ToMatchable;
    use crate::parser::grammar::sequence::Sequence;
    use crate::parser::segments::test_functions::{generate_test_segments, test_dialect};

    #[test]
    fn test_ref_keyword_naming() {
        let reference = Ref::keyword("select");
        assert_eq!(reference.reference(), "SelectKeywordSegment");
    }

    #[test]
    fn test_ref_match_resolves_through_dialect() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["select", " ", "foo"]);
        let reference = Ref::keyword("select");

        let result = reference.match_segments(&segments, &mut ctx).unwrap();
        assert!(result.has_match());
        assert_eq!(result.matched_segments[0].raw(), "select");
    }

    #[test]
    fn test_ref_simple_delegates_to_referent() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let ctx = ParseContext::new(&dialect, &config);

        let reference = Ref::keyword("select");
        let simple = MatchableTrait::simple(&reference, &ctx, None).unwrap();
        assert!(simple.contains("SELECT"));
    }

    #[test]
    fn test_ref_failure_is_blacklisted() {
        let mut dialect = test_dialect();
        // A self-referential rule. It fails on its first element, so the
        // failure is recorded and the second attempt must short-circuit
        // through the blacklist rather than re-entering the rule.
        dialect.add([(
            "RecursiveSegment".into(),
            Sequence::new(vec![
                Ref::keyword("select").to_matchable(),
                Ref::new("RecursiveSegment").to_matchable(),
            ])
            .to_matchable(),
        )]);

        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);
        let segments = generate_test_segments(vec!["foo"]);
        let reference = Ref::new("RecursiveSegment");

        let result = reference.match_segments(&segments, &mut ctx).unwrap();
        assert!(!result.has_match());

        let fingerprint = ParseBlacklist::fingerprint(&segments);
        assert!(ctx.blacklist().check("RecursiveSegment", fingerprint));

        // Second attempt hits the cache and returns unmatched untouched.
        let result = reference.match_segments(&segments, &mut ctx).unwrap();
        assert_eq!(result, MatchResult::from_unmatched(segments));
    }

    #[test]
    fn test_anything_and_nothing() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["foo", " ", "bar"]);

        let anything = Anything::new().match_segments(&segments, &mut ctx).unwrap();
        assert!(anything.is_complete());
        assert_eq!(anything.matched_segments, segments);

        let nothing = Nothing::new().match_segments(&segments, &mut ctx).unwrap();
        assert!(!nothing.has_match());
        assert_eq!(nothing.unmatched_segments, segments);
    }
}
