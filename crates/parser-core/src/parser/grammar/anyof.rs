use ahash::AHashSet;

use crate::errors::SQLParseError;
use crate::helpers::ToMatchable;
use crate::parser::context::ParseContext;
use crate::parser::match_algorithms::{prune_options, trim_non_code};
use crate::parser::match_result::MatchResult;
use crate::parser::matchable::{Ephemeral, Matchable, MatchableTrait};
use crate::parser::segments::base::ErasedSegment;

/// The union of the simple options of `elements`, or None as soon as any
/// element is not simple. Shared by the grammars whose elements are
/// alternatives of each other.
pub fn simple(
    elements: &[Matchable],
    parse_context: &ParseContext,
    crumbs: Option<Vec<&str>>,
) -> Option<AHashSet<String>> {
    let mut simple_buff = AHashSet::new();

    for opt in elements {
        let simple = opt.simple(parse_context, crumbs.clone())?;
        simple_buff.extend(simple);
    }

    Some(simple_buff)
}

/// Match any of the elements, a configurable number of times.
#[derive(Debug, Clone)]
pub struct AnyNumberOf {
    pub(crate) elements: Vec<Matchable>,
    pub exclude: Option<Matchable>,
    pub max_times: Option<usize>,
    pub min_times: usize,
    pub allow_gaps: bool,
    pub(crate) optional: bool,
    ephemeral: Option<Ephemeral>,
}

impl PartialEq for AnyNumberOf {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(lhs, rhs)| lhs == rhs)
    }
}

impl AnyNumberOf {
    pub fn new(elements: Vec<Matchable>) -> Self {
        Self {
            elements,
            exclude: None,
            max_times: None,
            min_times: 0,
            allow_gaps: true,
            optional: false,
            ephemeral: None,
        }
    }

    pub fn optional(&mut self) {
        self.optional = true;
    }

    pub fn disallow_gaps(&mut self) {
        self.allow_gaps = false;
    }

    pub fn max_times(&mut self, max_times: usize) {
        self.max_times = max_times.into();
    }

    pub fn min_times(&mut self, min_times: usize) {
        self.min_times = min_times;
    }

    pub fn exclude(&mut self, exclude: impl ToMatchable) {
        self.exclude = exclude.to_matchable().into();
    }

    /// Replace this grammar's matched output with a single ephemeral
    /// segment. The clone is taken before the wrapping is attached.
    pub fn ephemeral_name(&mut self, name: &'static str) {
        let parse_grammar = self.clone().to_matchable();
        self.ephemeral = Some(Ephemeral {
            name,
            parse_grammar,
        });
    }

    /// Match the forward segments against the options once. This is the
    /// main body of OneOf, and a building block of the repetition loop.
    fn match_once(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        let available_options = prune_options(&self.elements, segments, parse_context);
        if available_options.is_empty() {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }

        let mut best_match: Option<MatchResult> = None;
        for opt in &available_options {
            let m = parse_context.deeper_match(|ctx| opt.match_segments(segments, ctx))?;

            if m.is_complete() {
                // Return on the *first* complete match.
                return Ok(m);
            } else if m.has_match() {
                match &best_match {
                    Some(best) if m.raw_matched() <= best.raw_matched() => {}
                    _ => best_match = Some(m),
                }
            }
        }

        // No complete match, so take the longest partial if there is one.
        Ok(best_match.unwrap_or_else(|| MatchResult::from_unmatched(segments.to_vec())))
    }
}

impl MatchableTrait for AnyNumberOf {
    fn name(&self) -> &'static str {
        "AnyNumberOf"
    }

    fn elements(&self) -> &[Matchable] {
        &self.elements
    }

    fn is_optional(&self) -> bool {
        self.optional || self.min_times == 0
    }

    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<AHashSet<String>> {
        simple(&self.elements, parse_context, crumbs)
    }

    fn ephemeral(&self) -> Option<&Ephemeral> {
        self.ephemeral.as_ref()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        if let Some(exclude) = &self.exclude {
            let excluded = parse_context
                .deeper_match(|ctx| exclude.match_segments(segments, ctx))?;
            if excluded.has_match() {
                return Ok(MatchResult::from_unmatched(segments.to_vec()));
            }
        }

        let mut matched_segments: Vec<ErasedSegment> = Vec::new();
        let mut unmatched_segments: Vec<ErasedSegment> = segments.to_vec();
        let mut n_matches = 0;

        loop {
            if let Some(max_times) = self.max_times {
                if n_matches >= max_times {
                    // We've matched as many times as we can.
                    return Ok(MatchResult {
                        matched_segments,
                        unmatched_segments,
                    });
                }
            }

            if unmatched_segments.is_empty() {
                return Ok(if n_matches >= self.min_times {
                    MatchResult {
                        matched_segments,
                        unmatched_segments,
                    }
                } else {
                    // We didn't meet the hurdle.
                    MatchResult::from_unmatched(segments.to_vec())
                });
            }

            // After the first match, consume any non-code between matches.
            let pre_seg: Vec<ErasedSegment> = if n_matches > 0 && self.allow_gaps {
                let (pre, mid, post) = trim_non_code(&unmatched_segments);
                let pre = pre.to_vec();
                let rest = [mid, post].concat();
                unmatched_segments = rest;
                pre
            } else {
                Vec::new()
            };

            let mat = self.match_once(&unmatched_segments, parse_context)?;
            if mat.has_match() {
                matched_segments.extend(pre_seg);
                matched_segments.extend(mat.matched_segments);
                unmatched_segments = mat.unmatched_segments;
                n_matches += 1;
            } else {
                return Ok(if n_matches >= self.min_times {
                    // The trimmed non-code goes back on the unmatched side.
                    let mut unmatched = pre_seg;
                    unmatched.extend(unmatched_segments);
                    MatchResult {
                        matched_segments,
                        unmatched_segments: unmatched,
                    }
                } else {
                    MatchResult::from_unmatched(segments.to_vec())
                });
            }
        }
    }
}

/// Match any single one of the elements: `AnyNumberOf` pinned to exactly
/// one time.
pub fn one_of(elements: Vec<Matchable>) -> AnyNumberOf {
    let mut matcher = AnyNumberOf::new(elements);
    matcher.max_times(1);
    matcher.min_times(1);
    matcher
}
