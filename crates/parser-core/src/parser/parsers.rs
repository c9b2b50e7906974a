use ahash::AHashSet;
use smol_str::SmolStr;

use super::context::ParseContext;
use super::match_result::MatchResult;
use super::matchable::MatchableTrait;
use super::segments::base::{ErasedSegment, SegmentBuilder};
use crate::dialects::syntax::SyntaxKind;
use crate::errors::SQLParseError;

fn retype(segment: &ErasedSegment, kind: SyntaxKind, parse_context: &ParseContext) -> ErasedSegment {
    SegmentBuilder::token(parse_context.tables().next_id(), segment.raw(), kind)
        .with_position(segment.get_position_marker().unwrap().clone())
        .finish()
}

/// Matches a single token by its uppercase raw text and retypes it. This is
/// the matcher behind every `<Keyword>KeywordSegment` reference, and the
/// canonical "simple" matcher: it can advertise exactly the string that has
/// to appear for it to match.
#[derive(Clone, Debug, PartialEq)]
pub struct StringParser {
    template: SmolStr,
    simple: AHashSet<String>,
    kind: SyntaxKind,
    optional: bool,
}

impl StringParser {
    pub fn new(template: &str, kind: SyntaxKind) -> StringParser {
        let template_upper = template.to_uppercase();
        let simple_set = [template_upper.clone()].into();

        StringParser {
            template: template_upper.into(),
            simple: simple_set,
            kind,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }
}

impl MatchableTrait for StringParser {
    fn name(&self) -> &'static str {
        "StringParser"
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn simple(
        &self,
        _parse_context: &ParseContext,
        _crumbs: Option<Vec<&str>>,
    ) -> Option<AHashSet<String>> {
        Some(self.simple.clone())
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        let Some(first) = segments.first() else {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        };

        if first.segments().is_empty() && first.raw_upper() == &self.template {
            let mut matched = Vec::with_capacity(1);
            matched.push(retype(first, self.kind, parse_context));

            return Ok(MatchResult {
                matched_segments: matched,
                unmatched_segments: segments[1..].to_vec(),
            });
        }

        Ok(MatchResult::from_unmatched(segments.to_vec()))
    }
}

/// Matches a single token by its syntax kind. Deliberately *not* simple:
/// there is no raw string which has to be present, so the lookahead fast
/// path cannot shortcut it.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedParser {
    template: SyntaxKind,
    kind: SyntaxKind,
    optional: bool,
}

impl TypedParser {
    pub fn new(template: SyntaxKind, kind: SyntaxKind) -> Self {
        Self {
            template,
            kind,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn template(&self) -> SyntaxKind {
        self.template
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }
}

impl MatchableTrait for TypedParser {
    fn name(&self) -> &'static str {
        "TypedParser"
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        let Some(first) = segments.first() else {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        };

        if first.is_type(self.template) {
            let mut matched = Vec::with_capacity(1);
            matched.push(retype(first, self.kind, parse_context));

            return Ok(MatchResult {
                matched_segments: matched,
                unmatched_segments: segments[1..].to_vec(),
            });
        }

        Ok(MatchResult::from_unmatched(segments.to_vec()))
    }
}
