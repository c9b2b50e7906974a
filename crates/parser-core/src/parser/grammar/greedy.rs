use ahash::AHashSet;

use crate::errors::SQLParseError;
use crate::parser::context::ParseContext;
use crate::parser::match_algorithms::greedy_match;
use crate::parser::match_result::MatchResult;
use crate::parser::matchable::{Matchable, MatchableTrait};
use crate::parser::segments::base::ErasedSegment;

/// Consume input up to (but not including) the first bracket-balanced
/// occurrence of any of the terminators in the element list. With no
/// terminators at all, or none found, the entire input matches.
#[derive(Debug, Clone)]
pub struct GreedyUntil {
    elements: Vec<Matchable>,
    pub enforce_whitespace_preceding_terminator: bool,
    pub allow_gaps: bool,
    optional: bool,
}

impl GreedyUntil {
    pub fn new(elements: Vec<Matchable>) -> Self {
        Self {
            elements,
            enforce_whitespace_preceding_terminator: false,
            allow_gaps: true,
            optional: false,
        }
    }

    /// Only accept a terminator if whitespace comes before it. Useful for
    /// keywords which have false alarms on some accessors.
    pub fn enforce_whitespace_preceding_terminator(&mut self) {
        self.enforce_whitespace_preceding_terminator = true;
    }

    pub fn optional(&mut self) {
        self.optional = true;
    }
}

impl PartialEq for GreedyUntil {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| a == b)
    }
}

impl MatchableTrait for GreedyUntil {
    fn name(&self) -> &'static str {
        "GreedyUntil"
    }

    fn elements(&self) -> &[Matchable] {
        &self.elements
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        greedy_match(
            segments,
            parse_context,
            &self.elements,
            self.allow_gaps,
            self.enforce_whitespace_preceding_terminator,
            false,
        )
    }
}

/// Match if the sequence starts with a match of the target, then greedily
/// consume up to the configured terminator.
#[derive(Debug, Clone)]
pub struct StartsWith {
    target: Matchable,
    terminator: Option<Matchable>,
    pub include_terminator: bool,
    pub enforce_whitespace_preceding_terminator: bool,
    optional: bool,
}

impl StartsWith {
    pub fn new(target: Matchable) -> Self {
        Self {
            target,
            terminator: None,
            include_terminator: false,
            enforce_whitespace_preceding_terminator: false,
            optional: false,
        }
    }

    pub fn terminator(&mut self, terminator: Matchable) {
        self.terminator = terminator.into();
    }

    pub fn include_terminator(&mut self) {
        self.include_terminator = true;
    }

    pub fn enforce_whitespace_preceding_terminator(&mut self) {
        self.enforce_whitespace_preceding_terminator = true;
    }

    pub fn optional(&mut self) {
        self.optional = true;
    }
}

impl PartialEq for StartsWith {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.terminator == other.terminator
    }
}

impl MatchableTrait for StartsWith {
    fn name(&self) -> &'static str {
        "StartsWith"
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    // StartsWith is simple if the thing it starts with is.
    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<AHashSet<String>> {
        self.target.simple(parse_context, crumbs)
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        // A sequence with no code can't start with anything.
        let Some(first_code_idx) = segments.iter().position(|seg| seg.is_code()) else {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        };

        let target_match = parse_context
            .deeper_match(|ctx| self.target.match_segments(&segments[first_code_idx..], ctx))?;

        if !target_match.has_match() {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }

        // The target match may be partial; since we only care what the
        // input STARTS with, the rest is handed to the greedy scan.
        let terminators: Vec<Matchable> = self.terminator.iter().cloned().collect();
        let greedy = greedy_match(
            &target_match.unmatched_segments,
            parse_context,
            &terminators,
            true,
            self.enforce_whitespace_preceding_terminator,
            self.include_terminator,
        )?;

        let mut matched = segments[..first_code_idx].to_vec();
        matched.extend(target_match.matched_segments);
        matched.extend(greedy.matched_segments);

        Ok(MatchResult {
            matched_segments: matched,
            unmatched_segments: greedy.unmatched_segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;

    use super::*;
    use crate::helpers::{Config, ToMatchable};
    use crate::parser::grammar::base::Ref;
    use crate::parser::segments::test_functions::{generate_test_segments, test_dialect};

    #[test]
    fn test_greedy_until_stops_at_terminator() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", " ", "y", ";", "z"]);
        let grammar = GreedyUntil::new(vec![Ref::new("SemicolonSegment").to_matchable()]);

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        let matched: String = result
            .matched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(matched, "x y");
        let unmatched: String = result
            .unmatched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(unmatched, ";z");
    }

    #[test]
    fn test_greedy_until_no_terminator_found_matches_everything() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", " ", "y"]);
        let grammar = GreedyUntil::new(vec![Ref::new("SemicolonSegment").to_matchable()]);

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.matched_segments, segments);
    }

    #[test]
    fn test_greedy_until_enforce_whitespace() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        // The first "from" follows "x" with no whitespace in between, so
        // with enforcement on it's consumed as content; the second one
        // properly terminates.
        let segments = generate_test_segments(vec!["x", "from", " ", "y", " ", "from", " ", "z"]);
        let grammar = GreedyUntil::new(vec![Ref::keyword("from").to_matchable()])
            .config(|this| this.enforce_whitespace_preceding_terminator());

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        let matched: String = result
            .matched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(matched, "xfrom y");

        // Without enforcement the first occurrence terminates immediately.
        let plain = GreedyUntil::new(vec![Ref::keyword("from").to_matchable()]);
        let result = plain.match_segments(&segments, &mut ctx).unwrap();
        let matched: String = result
            .matched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(matched, "x");
    }

    #[test]
    fn test_starts_with_target_then_greedy() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["select", " ", "x", " ", "y", ";", "z"]);
        let grammar = StartsWith::new(Ref::keyword("select").to_matchable())
            .config(|this| this.terminator(Ref::new("SemicolonSegment").to_matchable()));

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        let matched: String = result
            .matched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(matched, "select x y");
        let unmatched: String = result
            .unmatched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(unmatched, ";z");
    }

    #[test]
    fn test_starts_with_include_terminator() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["select", " ", "x", ";", "z"]);
        let grammar = StartsWith::new(Ref::keyword("select").to_matchable()).config(|this| {
            this.terminator(Ref::new("SemicolonSegment").to_matchable());
            this.include_terminator();
        });

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        let matched: String = result
            .matched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(matched, "select x;");
        assert_eq!(result.unmatched_segments.len(), 1);
    }

    #[test]
    fn test_starts_with_wrong_start_unmatched() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", " ", "select"]);
        let grammar = StartsWith::new(Ref::keyword("select").to_matchable());

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        assert!(!result.has_match());
        assert_eq!(result.unmatched_segments, segments);
    }

    #[test]
    fn test_starts_with_preserves_leading_non_code() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec![" ", "select", " ", "x"]);
        let grammar = StartsWith::new(Ref::keyword("select").to_matchable());

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        assert!(result.is_complete());
        let raw: String = result
            .matched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(raw, " select x");
    }

    #[test]
    fn test_greedy_until_no_terminators_matches_everything() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", " ", "y"]);
        let grammar = GreedyUntil::new(vec![]);

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        assert!(result.is_complete());
        assert_eq!(result.matched_segments, segments);
    }
}
