pub mod context;
pub mod grammar;
pub mod markers;
pub mod match_algorithms;
pub mod match_result;
pub mod matchable;
pub mod parsers;
pub mod segments;

use ahash::AHashMap;

use crate::dialects::base::Dialect;
use crate::errors::SQLParseError;
use crate::parser::context::ParseContext;
use crate::parser::match_algorithms::check_still_complete;
use crate::parser::match_result::MatchResult;
use crate::parser::segments::base::ErasedSegment;

/// The top-level parse driver. Owns the context lifecycle: one
/// `ParseContext` is created per `parse` call and destroyed at its end.
#[derive(Clone)]
pub struct Parser<'a> {
    indentation_config: AHashMap<String, bool>,
    dialect: &'a Dialect,
}

impl<'a> Parser<'a> {
    /// Override the indentation flags consulted by conditional meta
    /// placeholders. The default is everything off.
    pub fn with_indentation_config(
        mut self,
        indentation_config: AHashMap<String, bool>,
    ) -> Self {
        self.indentation_config = indentation_config;
        self
    }

    pub fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    pub fn indentation_config(&self) -> &AHashMap<String, bool> {
        &self.indentation_config
    }

    /// Run the named grammar over the segments. Match failure comes back as
    /// an unmatched result; structural errors (bracket problems) propagate.
    pub fn parse(
        &self,
        segments: &[ErasedSegment],
        grammar_name: &str,
    ) -> Result<MatchResult, SQLParseError> {
        if segments.is_empty() {
            // This should normally never happen because there will usually
            // be an end-of-file segment. It can come up in api use cases.
            return Ok(MatchResult::from_empty());
        }

        let matcher = self.dialect.r#ref(grammar_name);
        let mut parse_context = ParseContext::from(self);
        let result = matcher.match_segments(segments, &mut parse_context)?;

        check_still_complete(
            segments,
            &result.matched_segments,
            &result.unmatched_segments,
        );

        Ok(result)
    }
}

impl<'a> From<&'a Dialect> for Parser<'a> {
    fn from(dialect: &'a Dialect) -> Self {
        Parser {
            indentation_config: AHashMap::new(),
            dialect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::ToMatchable;
    use crate::parser::grammar::base::Ref;
    use crate::parser::grammar::delimited::Delimited;
    use crate::parser::grammar::sequence::Sequence;
    use crate::parser::segments::meta::MetaSegment;
    use crate::parser::segments::test_functions::{generate_test_segments, test_dialect};

    #[test]
    fn test_parser_runs_named_grammar() {
        let mut dialect = test_dialect();
        dialect.add([(
            "IdentifierListSegment".into(),
            Delimited::new(vec![Ref::new("NakedIdentifierSegment").to_matchable()])
                .to_matchable(),
        )]);

        let parser = Parser::from(&dialect);
        let segments = generate_test_segments(vec!["x", ",", " ", "y"]);

        let result = parser.parse(&segments, "IdentifierListSegment").unwrap();
        assert!(result.is_complete());
    }

    #[test]
    fn test_parser_empty_input() {
        let dialect = test_dialect();
        let parser = Parser::from(&dialect);

        let result = parser.parse(&[], "NakedIdentifierSegment").unwrap();
        assert_eq!(result, MatchResult::from_empty());
    }

    #[test]
    fn test_parser_indentation_config_reaches_conditional_metas() {
        let mut dialect = test_dialect();
        dialect.add([(
            "IndentedSelectSegment".into(),
            Sequence::new(vec![
                Ref::keyword("select").to_matchable(),
                MetaSegment::indent().when("indented_selects").to_matchable(),
            ])
            .to_matchable(),
        )]);

        let segments = generate_test_segments(vec!["select"]);

        let parser = Parser::from(&dialect);
        let result = parser.parse(&segments, "IndentedSelectSegment").unwrap();
        assert_eq!(result.len(), 1);

        let parser = Parser::from(&dialect).with_indentation_config(AHashMap::from_iter([(
            "indented_selects".to_string(),
            true,
        )]));
        let result = parser.parse(&segments, "IndentedSelectSegment").unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_parser_match_failure_is_a_value() {
        let dialect = test_dialect();
        let parser = Parser::from(&dialect);
        let segments = generate_test_segments(vec![",", ","]);

        let result = parser.parse(&segments, "NakedIdentifierSegment").unwrap();
        assert!(!result.has_match());
        assert_eq!(result.unmatched_segments, segments);
    }
}
