use std::ops::{Deref, DerefMut};

use ahash::AHashSet;
use itertools::enumerate;

use crate::errors::SQLParseError;
use crate::helpers::ToMatchable;
use crate::parser::context::ParseContext;
use crate::parser::grammar::base::Ref;
use crate::parser::match_algorithms::{
    bracket_sensitive_look_ahead_match, check_still_complete, code_only_sensitive_match,
    trim_non_code,
};
use crate::parser::match_result::MatchResult;
use crate::parser::matchable::{Ephemeral, Matchable, MatchableTrait};
use crate::parser::segments::base::ErasedSegment;
use crate::parser::segments::meta::MetaSegment;

/// Match a specific sequence of elements.
#[derive(Debug, Clone)]
pub struct Sequence {
    elements: Vec<Matchable>,
    pub allow_gaps: bool,
    is_optional: bool,
    ephemeral: Option<Ephemeral>,
}

impl Sequence {
    pub fn new(elements: Vec<Matchable>) -> Self {
        Self {
            elements,
            allow_gaps: true,
            is_optional: false,
            ephemeral: None,
        }
    }

    pub fn optional(&mut self) {
        self.is_optional = true;
    }

    pub fn disallow_gaps(&mut self) {
        self.allow_gaps = false;
    }

    pub fn allow_gaps(mut self, allow_gaps: bool) -> Self {
        self.allow_gaps = allow_gaps;
        self
    }

    pub fn ephemeral_name(&mut self, name: &'static str) {
        let parse_grammar = self.clone().to_matchable();
        self.ephemeral = Some(Ephemeral {
            name,
            parse_grammar,
        });
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| a == b)
    }
}

impl MatchableTrait for Sequence {
    fn name(&self) -> &'static str {
        "Sequence"
    }

    fn elements(&self) -> &[Matchable] {
        &self.elements
    }

    fn is_optional(&self) -> bool {
        self.is_optional
    }

    // Sequence is simple if the elements up to and including the first
    // non-optional one all are.
    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<AHashSet<String>> {
        let mut simple_buff = AHashSet::new();

        for opt in &self.elements {
            let simple = opt.simple(parse_context, crumbs.clone())?;
            simple_buff.extend(simple);

            if !opt.is_optional() {
                return Some(simple_buff);
            }
        }

        Some(simple_buff)
    }

    fn ephemeral(&self) -> Option<&Ephemeral> {
        self.ephemeral.as_ref()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        let mut matched_segments: Vec<ErasedSegment> = Vec::new();
        let mut unmatched_segments: Vec<ErasedSegment> = segments.to_vec();

        for (idx, elem) in enumerate(&self.elements) {
            // Meta placeholders don't consume input, they generate it.
            if let Some(meta) = elem.as_meta() {
                if !meta.is_enabled(parse_context) {
                    continue;
                }

                let position = if let Some(last) = matched_segments.last() {
                    Some(last.get_end_position_marker())
                } else {
                    unmatched_segments
                        .first()
                        .map(|next| next.get_start_position_marker())
                };

                if let Some(position) = position {
                    matched_segments
                        .push(meta.instantiate(parse_context.tables().next_id(), position));
                }
                continue;
            }

            let (pre_nc, mid_seg, post_nc) = if self.allow_gaps {
                trim_non_code(&unmatched_segments)
            } else {
                (&[][..], &unmatched_segments[..], &[][..])
            };

            if pre_nc.is_empty() && mid_seg.is_empty() && post_nc.is_empty() {
                // We've run out of input without matching everything.
                // That's fine as long as only optional or meta elements
                // remain: emit any enabled metas and return what we have.
                if self.elements[idx..]
                    .iter()
                    .all(|e| e.is_optional() || e.is_meta())
                {
                    if let Some(last) = matched_segments.last() {
                        let position = last.get_end_position_marker();
                        let trailing: Vec<ErasedSegment> = self.elements[idx..]
                            .iter()
                            .filter_map(|e| e.as_meta())
                            .filter(|meta| meta.is_enabled(parse_context))
                            .map(|meta| {
                                meta.instantiate(
                                    parse_context.tables().next_id(),
                                    position.clone(),
                                )
                            })
                            .collect();
                        matched_segments.extend(trailing);
                    }

                    return Ok(MatchResult::from_matched(matched_segments));
                }

                return Ok(MatchResult::from_unmatched(segments.to_vec()));
            }

            let pre_nc = pre_nc.to_vec();
            let mid_seg = mid_seg.to_vec();
            let post_nc = post_nc.to_vec();

            let elem_match =
                parse_context.deeper_match(|ctx| elem.match_segments(&mid_seg, ctx))?;

            if elem_match.has_match() {
                // Mostly partial matches are expected here; don't be greedy
                // with the trailing whitespace.
                matched_segments.extend(pre_nc);
                matched_segments.extend(elem_match.matched_segments);
                unmatched_segments = elem_match.unmatched_segments;
                unmatched_segments.extend(post_nc);

                // Sense check that nothing got dropped on the way through.
                check_still_complete(segments, &matched_segments, &unmatched_segments);
            } else if elem.is_optional() {
                // An optional element which didn't match just gets skipped.
                continue;
            } else {
                return Ok(MatchResult::from_unmatched(segments.to_vec()));
            }
        }

        // All elements matched or were skipped; anything left over stays
        // unmatched for the caller to deal with.
        Ok(MatchResult {
            matched_segments,
            unmatched_segments,
        })
    }
}

/// Match a bracketed sequence: the brackets themselves, then the elements
/// as a sequence between them.
#[derive(Debug, Clone)]
pub struct Bracketed {
    pub(crate) this: Sequence,
    start_bracket: Matchable,
    end_bracket: Matchable,
}

impl Bracketed {
    pub fn new(elements: Vec<Matchable>) -> Self {
        Self {
            this: Sequence::new(elements),
            start_bracket: Ref::new("StartBracketSegment").to_matchable(),
            end_bracket: Ref::new("EndBracketSegment").to_matchable(),
        }
    }

    /// Use square brackets instead of round ones.
    pub fn square(mut self) -> Self {
        self.start_bracket = Ref::new("StartSquareBracketSegment").to_matchable();
        self.end_bracket = Ref::new("EndSquareBracketSegment").to_matchable();
        self
    }
}

impl Deref for Bracketed {
    type Target = Sequence;

    fn deref(&self) -> &Self::Target {
        &self.this
    }
}

impl DerefMut for Bracketed {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.this
    }
}

impl MatchableTrait for Bracketed {
    fn name(&self) -> &'static str {
        "Bracketed"
    }

    fn elements(&self) -> &[Matchable] {
        &self.this.elements
    }

    fn is_optional(&self) -> bool {
        self.this.is_optional()
    }

    // Bracketed is always simple: we just look for the bracket.
    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<AHashSet<String>> {
        self.start_bracket.simple(parse_context, crumbs)
    }

    fn ephemeral(&self) -> Option<&Ephemeral> {
        self.this.ephemeral()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        // 1. Work forwards to find the first bracket.
        let start_match = parse_context.deeper_match(|ctx| {
            code_only_sensitive_match(segments, &self.start_bracket, ctx, self.allow_gaps)
        })?;
        if !start_match.has_match() {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }

        // 2. Bracket count forward to find its partner.
        let seg_buff = start_match.unmatched_segments.clone();
        let (content_segs, end_match, _) = bracket_sensitive_look_ahead_match(
            &seg_buff,
            std::slice::from_ref(&self.end_bracket),
            parse_context,
            self.allow_gaps,
        )?;
        if !end_match.has_match() {
            return Err(SQLParseError {
                description: "Couldn't find closing bracket for opening bracket.".into(),
                segment: start_match
                    .matched_segments
                    .iter()
                    .rev()
                    .find(|seg| seg.is_code())
                    .cloned(),
            });
        }

        let all_optional = self.this.elements.is_empty()
            || self.this.elements.iter().all(|e| e.is_optional());

        // 3. Totally empty brackets, e.g. "()".
        if content_segs.is_empty() {
            return Ok(if all_optional {
                let mut matched = start_match.matched_segments;
                matched.extend(end_match.matched_segments);
                MatchResult {
                    matched_segments: matched,
                    unmatched_segments: end_match.unmatched_segments,
                }
            } else {
                MatchResult::from_unmatched(segments.to_vec())
            });
        }

        // 4. Brackets with nothing but non-code, e.g. "(   )".
        let (pre_nc, content_segs, post_nc) = if self.allow_gaps {
            trim_non_code(&content_segs)
        } else {
            (&[][..], &content_segs[..], &[][..])
        };

        if content_segs.is_empty() {
            return Ok(if all_optional && self.allow_gaps {
                let mut matched = start_match.matched_segments;
                matched.extend(pre_nc.iter().cloned());
                matched.extend(post_nc.iter().cloned());
                matched.extend(end_match.matched_segments);
                MatchResult {
                    matched_segments: matched,
                    unmatched_segments: end_match.unmatched_segments,
                }
            } else {
                MatchResult::from_unmatched(segments.to_vec())
            });
        }

        let pre_nc = pre_nc.to_vec();
        let content_segs = content_segs.to_vec();
        let post_nc = post_nc.to_vec();

        // 5. Match the interior as a sequence; nothing less than a complete
        //    match will do.
        let content_match = parse_context
            .deeper_match(|ctx| MatchableTrait::match_segments(&self.this, &content_segs, ctx))?;

        if !content_match.is_complete() {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }

        // 6. Wrap the content with indent/dedent metas. The non-code bands
        //    stay *outside* the indents.
        let pre_meta = MetaSegment::indent().instantiate(
            parse_context.tables().next_id(),
            content_match.matched_segments[0].get_start_position_marker(),
        );
        let post_meta = MetaSegment::dedent().instantiate(
            parse_context.tables().next_id(),
            content_match
                .matched_segments
                .last()
                .unwrap()
                .get_end_position_marker(),
        );

        let mut matched = start_match.matched_segments;
        matched.extend(pre_nc);
        matched.push(pre_meta);
        matched.extend(content_match.matched_segments);
        matched.push(post_meta);
        matched.extend(post_nc);
        matched.extend(end_match.matched_segments);

        Ok(MatchResult {
            matched_segments: matched,
            unmatched_segments: end_match.unmatched_segments,
        })
    }
}
