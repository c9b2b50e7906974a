use ahash::AHashSet;

use crate::errors::SQLParseError;
use crate::helpers::ToMatchable;
use crate::parser::context::ParseContext;
use crate::parser::grammar::base::Ref;
use crate::parser::match_algorithms::{
    bracket_sensitive_look_ahead_match, code_only_sensitive_match,
    longest_code_only_sensitive_match, trim_non_code,
};
use crate::parser::match_result::MatchResult;
use crate::parser::matchable::{Ephemeral, Matchable, MatchableTrait};
use crate::parser::segments::base::ErasedSegment;

/// Match an arbitrary number of elements separated by a delimiter.
///
/// Note that if there are multiple elements passed in that they will be
/// treated as different options of what can be delimited, rather than a
/// sequence.
#[derive(Debug, Clone)]
pub struct Delimited {
    elements: Vec<Matchable>,
    delimiter: Matchable,
    pub allow_trailing: bool,
    terminator: Option<Matchable>,
    pub min_delimiters: Option<usize>,
    pub allow_gaps: bool,
    optional: bool,
    ephemeral: Option<Ephemeral>,
}

impl Delimited {
    pub fn new(elements: Vec<Matchable>) -> Self {
        Self {
            elements,
            delimiter: Ref::new("CommaSegment").to_matchable(),
            allow_trailing: false,
            terminator: None,
            min_delimiters: None,
            allow_gaps: true,
            optional: false,
            ephemeral: None,
        }
    }

    pub fn delimiter(&mut self, delimiter: impl ToMatchable) {
        self.delimiter = delimiter.to_matchable();
    }

    pub fn terminator(&mut self, terminator: impl ToMatchable) {
        self.terminator = terminator.to_matchable().into();
    }

    pub fn allow_trailing(&mut self) {
        self.allow_trailing = true;
    }

    pub fn min_delimiters(&mut self, min_delimiters: usize) {
        self.min_delimiters = min_delimiters.into();
    }

    pub fn optional(&mut self) {
        self.optional = true;
    }

    pub fn disallow_gaps(&mut self) {
        self.allow_gaps = false;
    }

    pub fn ephemeral_name(&mut self, name: &'static str) {
        let parse_grammar = self.clone().to_matchable();
        self.ephemeral = Some(Ephemeral {
            name,
            parse_grammar,
        });
    }

    fn min_delimiters_met(&self, n_delimiters: usize) -> bool {
        self.min_delimiters
            .is_none_or(|min| n_delimiters >= min)
    }
}

impl PartialEq for Delimited {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| a == b)
            && self.delimiter == other.delimiter
            && self.allow_trailing == other.allow_trailing
    }
}

impl MatchableTrait for Delimited {
    fn name(&self) -> &'static str {
        "Delimited"
    }

    fn elements(&self) -> &[Matchable] {
        &self.elements
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn simple(
        &self,
        parse_context: &ParseContext,
        crumbs: Option<Vec<&str>>,
    ) -> Option<AHashSet<String>> {
        super::anyof::simple(&self.elements, parse_context, crumbs)
    }

    fn ephemeral(&self) -> Option<&Ephemeral> {
        self.ephemeral.as_ref()
    }

    fn match_segments(
        &self,
        segments: &[ErasedSegment],
        parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        if segments.is_empty() {
            return Ok(MatchResult::from_empty());
        }

        let mut matchers = vec![self.delimiter.clone()];
        if let Some(terminator) = &self.terminator {
            matchers.push(terminator.clone());
        }

        let mut seg_buff = segments.to_vec();
        let mut matched_segments: Vec<ErasedSegment> = Vec::new();
        let mut n_delimiters = 0;

        // Scan for the next delimiter or terminator, then require the
        // content before it to match one of the elements completely.
        loop {
            if seg_buff.is_empty() {
                // The last delimiter consumed everything behind it, so this
                // is a trailing case.
                return Ok(
                    if self.allow_trailing && self.min_delimiters_met(n_delimiters) {
                        MatchResult::from_matched(matched_segments)
                    } else {
                        MatchResult::from_unmatched(segments.to_vec())
                    },
                );
            }

            // Gaps are dealt with around each content slice, not in the
            // scan itself.
            let (pre_content, delimiter_match, matcher) = parse_context.deeper_match(|ctx| {
                bracket_sensitive_look_ahead_match(&seg_buff, &matchers, ctx, false)
            })?;
            let pre_content_len = pre_content.len();

            if !delimiter_match.has_match() {
                // No delimiter or terminator ahead: we're at the end. Try a
                // final (possibly partial) content match.
                if !self.min_delimiters_met(n_delimiters) {
                    return Ok(MatchResult::from_unmatched(segments.to_vec()));
                }

                let (pre_term_nc, mid, post_term_nc) = if self.allow_gaps {
                    trim_non_code(&seg_buff)
                } else {
                    (&[][..], &seg_buff[..], &[][..])
                };
                let pre_term_nc = pre_term_nc.to_vec();
                let mid = mid.to_vec();
                let post_term_nc = post_term_nc.to_vec();

                let (mat, _) = parse_context.deeper_match(|ctx| {
                    longest_code_only_sensitive_match(
                        &mid,
                        &self.elements,
                        ctx,
                        self.allow_gaps,
                    )
                })?;

                return Ok(if mat.has_match() {
                    if mat.is_complete() {
                        // Nothing unmatched, so the trailing non-code can
                        // be consumed as well.
                        matched_segments.extend(pre_term_nc);
                        matched_segments.extend(mat.matched_segments);
                        matched_segments.extend(post_term_nc);
                        MatchResult::from_matched(matched_segments)
                    } else {
                        matched_segments.extend(pre_term_nc);
                        matched_segments.extend(mat.matched_segments);
                        let mut unmatched = mat.unmatched_segments;
                        unmatched.extend(post_term_nc);
                        MatchResult {
                            matched_segments,
                            unmatched_segments: unmatched,
                        }
                    }
                } else if self.allow_trailing {
                    let mut unmatched = pre_term_nc;
                    unmatched.extend(mid);
                    unmatched.extend(post_term_nc);
                    MatchResult {
                        matched_segments,
                        unmatched_segments: unmatched,
                    }
                } else {
                    MatchResult::from_unmatched(segments.to_vec())
                });
            }

            let is_delimiter = matcher
                .as_ref()
                .is_some_and(|matcher| matcher == &self.delimiter);
            if is_delimiter {
                n_delimiters += 1;
            }

            let (pre_nc, content, post_nc) = if self.allow_gaps {
                trim_non_code(&pre_content)
            } else {
                (&[][..], &pre_content[..], &[][..])
            };

            if content.is_empty() {
                // Zero length content between delimiters. No good.
                return Ok(MatchResult::from_unmatched(segments.to_vec()));
            }

            let pre_nc = pre_nc.to_vec();
            let content = content.to_vec();
            let post_nc = post_nc.to_vec();

            let mut matched_element = false;
            for elem in &self.elements {
                let elem_match = parse_context.deeper_match(|ctx| {
                    code_only_sensitive_match(&content, elem, ctx, self.allow_gaps)
                })?;

                // Between delimiters (or up to a terminator) nothing less
                // than a complete match will do.
                if !elem_match.is_complete() {
                    continue;
                }

                matched_segments.extend(pre_nc);
                matched_segments.extend(elem_match.matched_segments);
                matched_segments.extend(post_nc);

                if is_delimiter {
                    matched_segments.extend(delimiter_match.matched_segments);
                    seg_buff = delimiter_match.unmatched_segments;
                    matched_element = true;
                    break;
                }

                // A terminator: it stays with the unmatched side, along
                // with everything after it.
                if !self.min_delimiters_met(n_delimiters) {
                    return Ok(MatchResult::from_unmatched(segments.to_vec()));
                }

                return Ok(MatchResult {
                    matched_segments,
                    unmatched_segments: seg_buff[pre_content_len..].to_vec(),
                });
            }

            if !matched_element {
                return Ok(MatchResult::from_unmatched(segments.to_vec()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;

    use super::*;
    use crate::helpers::Config;
    use crate::parser::segments::test_functions::{generate_test_segments, test_dialect};

    fn identifiers_by_comma() -> Delimited {
        Delimited::new(vec![Ref::new("NakedIdentifierSegment").to_matchable()])
    }

    #[test]
    fn test_delimited_complete_match() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", ",", "y", ",", "z"]);
        let result = identifiers_by_comma()
            .match_segments(&segments, &mut ctx)
            .unwrap();

        assert!(result.is_complete());
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_delimited_with_whitespace() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", ",", " ", "y", " ", ",", "z"]);
        let result = identifiers_by_comma()
            .match_segments(&segments, &mut ctx)
            .unwrap();

        assert!(result.is_complete());
        let raw: String = result
            .matched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(raw, "x, y ,z");
    }

    #[test]
    fn test_delimited_trailing_delimiter_disallowed() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", ",", "y", ","]);
        let result = identifiers_by_comma()
            .match_segments(&segments, &mut ctx)
            .unwrap();

        assert!(!result.has_match());
        assert_eq!(result.unmatched_segments, segments);
    }

    #[test]
    fn test_delimited_trailing_delimiter_allowed() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", ",", "y", ","]);
        let result = identifiers_by_comma()
            .config(|this| this.allow_trailing())
            .match_segments(&segments, &mut ctx)
            .unwrap();

        assert!(result.is_complete());
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_delimited_terminator() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", ",", "y", ";", "z"]);
        let result = identifiers_by_comma()
            .config(|this| this.terminator(Ref::new("SemicolonSegment")))
            .match_segments(&segments, &mut ctx)
            .unwrap();

        assert!(result.has_match());
        let matched: String = result
            .matched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(matched, "x,y");
        let unmatched: String = result
            .unmatched_segments
            .iter()
            .map(|s| s.raw().as_str())
            .collect();
        assert_eq!(unmatched, ";z");
    }

    #[test]
    fn test_delimited_min_delimiters() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        let segments = generate_test_segments(vec!["x", ",", "y"]);

        let result = identifiers_by_comma()
            .config(|this| this.min_delimiters(2))
            .match_segments(&segments, &mut ctx)
            .unwrap();
        assert!(!result.has_match());

        let result = identifiers_by_comma()
            .config(|this| this.min_delimiters(1))
            .match_segments(&segments, &mut ctx)
            .unwrap();
        assert!(result.is_complete());
    }

    #[test]
    fn test_delimited_content_must_match_completely() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        // "x 1" between delimiters is more than a single identifier.
        let segments = generate_test_segments(vec!["x", " ", "1", ",", "y"]);
        let result = identifiers_by_comma()
            .match_segments(&segments, &mut ctx)
            .unwrap();

        assert!(!result.has_match());
    }

    #[test]
    fn test_delimited_brackets_hide_delimiters() {
        let dialect = test_dialect();
        let config = AHashMap::new();
        let mut ctx = ParseContext::new(&dialect, &config);

        // The comma inside the brackets must not split the content.
        let segments = generate_test_segments(vec!["x", ",", "(", "y", ",", "z", ")"]);
        let mut grammar = Delimited::new(vec![
            Ref::new("NakedIdentifierSegment").to_matchable(),
            Ref::new("AnythingBracketedSegment").to_matchable(),
        ]);
        grammar.delimiter(Ref::new("CommaSegment"));

        let result = grammar.match_segments(&segments, &mut ctx).unwrap();
        assert!(result.is_complete());
    }
}
