use std::ops::Deref;
use std::sync::Arc;

use ahash::AHashSet;
use enum_dispatch::enum_dispatch;

use super::context::ParseContext;
use super::grammar::anyof::AnyNumberOf;
use super::grammar::base::{Anything, Nothing, Ref};
use super::grammar::delimited::Delimited;
use super::grammar::greedy::{GreedyUntil, StartsWith};
use super::grammar::sequence::{Bracketed, Sequence};
use super::match_result::MatchResult;
use super::parsers::{StringParser, TypedParser};
use super::segments::base::{ErasedSegment, SegmentBuilder};
use super::segments::meta::MetaSegment;
use crate::errors::SQLParseError;
use crate::helpers::curtail_string;

#[macro_export]
macro_rules! vec_of_erased {
    ($($elem:expr),* $(,)?) => {{
        vec![$(ToMatchable::to_matchable($elem)),*]
    }};
}

/// A cheap shared handle over any matcher.
#[derive(Clone, Debug)]
pub struct Matchable {
    inner: Arc<MatchableTraitImpl>,
}

impl Deref for Matchable {
    type Target = MatchableTraitImpl;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl PartialEq for Matchable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || *self.inner == *other.inner
    }
}

impl Matchable {
    pub fn new(matchable: MatchableTraitImpl) -> Self {
        Self {
            inner: Arc::new(matchable),
        }
    }

    pub fn as_meta(&self) -> Option<&MetaSegment> {
        match self.inner.as_ref() {
            MatchableTraitImpl::MetaSegment(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn as_ref_grammar(&self) -> Option<&Ref> {
        match self.inner.as_ref() {
            MatchableTraitImpl::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    /// Match, with the cross-cutting concerns applied: the match events are
    /// logged, and grammars configured with an ephemeral name have their
    /// matched output replaced by a single ephemeral segment carrying the
    /// grammar to parse it with later.
    pub fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        parse_match_logging(self.inner.name(), "match", "IN", parse_context, segments);

        let result = MatchableTrait::match_segments(self.inner.as_ref(), segments, parse_context)?;

        let result = match self.inner.ephemeral() {
            Some(ephemeral) if result.has_match() => {
                let wrapped = SegmentBuilder::ephemeral(
                    parse_context.tables().next_id(),
                    result.matched_segments,
                    ephemeral.parse_grammar.clone(),
                )
                .position_from_segments()
                .finish();

                MatchResult {
                    matched_segments: vec![wrapped],
                    unmatched_segments: result.unmatched_segments,
                }
            }
            _ => result,
        };

        parse_match_logging(
            self.inner.name(),
            "match",
            if result.has_match() { "OUT" } else { "NM" },
            parse_context,
            &result.matched_segments,
        );

        Ok(result)
    }
}

/// The deferred wrapping configured by `ephemeral_name`: a clone of the
/// grammar captured *before* the wrapping was attached, so the ephemeral
/// segment can be parsed without recursing into itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Ephemeral {
    pub name: &'static str,
    pub parse_grammar: Matchable,
}

#[enum_dispatch(MatchableTrait)]
#[derive(Clone, Debug)]
pub enum MatchableTraitImpl {
    Ref(Ref),
    Anything(Anything),
    Nothing(Nothing),
    AnyNumberOf(AnyNumberOf),
    Sequence(Sequence),
    Bracketed(Bracketed),
    Delimited(Delimited),
    GreedyUntil(GreedyUntil),
    StartsWith(StartsWith),
    StringParser(StringParser),
    TypedParser(TypedParser),
    MetaSegment(MetaSegment),
}

impl PartialEq for MatchableTraitImpl {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ref(a), Self::Ref(b)) => a == b,
            (Self::StringParser(a), Self::StringParser(b)) => a == b,
            (Self::TypedParser(a), Self::TypedParser(b)) => a == b,
            (Self::MetaSegment(a), Self::MetaSegment(b)) => a == b,
            _ => {
                std::mem::discriminant(self) == std::mem::discriminant(other)
                    && self.is_optional() == other.is_optional()
                    && self.elements() == other.elements()
            }
        }
    }
}

#[enum_dispatch]
pub trait MatchableTrait {
    /// A static name for logging.
    fn name(&self) -> &'static str;

    fn elements(&self) -> &[Matchable] {
        &[]
    }

    // Return whether this element is optional in the context of a sequence.
    fn is_optional(&self) -> bool {
        false
    }

    // True only for the indent/dedent placeholders.
    fn is_meta(&self) -> bool {
        false
    }

    // Try to obtain a simple response from the matcher: the set of uppercase
    // raw strings one of which must appear for any match. Returns None if
    // the matcher is not simple. The crumbs argument detects recursion
    // through references.
    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<AHashSet<String>> {
        let _ = (parse_context, crumbs);
        None
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError>;

    fn ephemeral(&self) -> Option<&Ephemeral> {
        None
    }
}

pub(crate) fn parse_match_logging(
    grammar: &str,
    func: &str,
    msg: &str,
    parse_context: &ParseContext,
    segments: &[ErasedSegment],
) {
    if !log::log_enabled!(log::Level::Trace) {
        return;
    }

    let raw: String = segments.iter().map(|seg| seg.raw().as_str()).collect();
    log::trace!(
        "[L{:02} | {}] {}.{}: {} {:?}",
        parse_context.match_depth(),
        parse_context.current_match_name().unwrap_or("-"),
        grammar,
        func,
        msg,
        curtail_string(&raw, 40),
    );
}
