use super::base::{ErasedSegment, SegmentBuilder, Tables};
use crate::dialects::base::Dialect;
use crate::dialects::syntax::SyntaxKind;
use crate::helpers::ToMatchable;
use crate::parser::grammar::base::Anything;
use crate::parser::grammar::sequence::Bracketed;
use crate::parser::markers::PositionMarker;
use crate::parser::parsers::{StringParser, TypedParser};

/// Roughly lex a list of raw strings into test segments, classifying each
/// by shape. `<indent>` and `<dedent>` produce meta segments.
pub fn generate_test_segments(elems: Vec<&str>) -> Vec<ErasedSegment> {
    let tables = Tables::default();
    let mut buff: Vec<ErasedSegment> = Vec::new();
    let mut idx = 0;
    let mut line_no = 1;
    let mut line_start = 0;

    for elem in elems {
        if elem == "<indent>" || elem == "<dedent>" {
            let kind = if elem == "<indent>" {
                SyntaxKind::Indent
            } else {
                SyntaxKind::Dedent
            };
            buff.push(
                SegmentBuilder::token(tables.next_id(), "", kind)
                    .with_position(PositionMarker::new(
                        idx..idx,
                        line_no,
                        idx - line_start + 1,
                    ))
                    .finish(),
            );
            continue;
        }

        let position_marker =
            PositionMarker::new(idx..idx + elem.len(), line_no, idx - line_start + 1);

        let kind = if elem.chars().all(|c| c == ' ' || c == '\t') {
            SyntaxKind::Whitespace
        } else if elem.chars().all(|c| c == '\n') {
            SyntaxKind::Newline
        } else if elem.starts_with("--") {
            SyntaxKind::InlineComment
        } else if elem.chars().all(|c| c.is_ascii_digit()) {
            SyntaxKind::NumericLiteral
        } else if matches!(elem, "(" | ")" | "[" | "]" | "," | ";") {
            SyntaxKind::Symbol
        } else {
            SyntaxKind::Word
        };

        buff.push(
            SegmentBuilder::token(tables.next_id(), elem, kind)
                .with_position(position_marker)
                .finish(),
        );

        if kind == SyntaxKind::Newline {
            line_no += elem.len();
            line_start = idx + elem.len();
        }
        idx += elem.len();
    }

    buff
}

/// A segment fixture with a bracketed section in the middle.
pub fn bracket_segments() -> Vec<ErasedSegment> {
    generate_test_segments(vec![
        "bar", " \t ", "(", "foo", "    ", ")", "baar", " \t ", "foo",
    ])
}

pub fn test_segments() -> Vec<ErasedSegment> {
    generate_test_segments(vec!["bar", " \t ", "foo", "baar", " \t "])
}

/// A small dialect with enough in it to exercise every grammar: keywords,
/// identifiers, literals, separators and both bracket pairs.
pub fn test_dialect() -> Dialect {
    let mut dialect = Dialect::new("test");

    dialect.update_keywords_set_from_multiline_string(
        "unreserved_keywords",
        "SELECT
         FROM
         WHERE
         LIMIT
         BAR
         FOO
         BAAR",
    );

    dialect.add([
        (
            "CommaSegment".into(),
            StringParser::new(",", SyntaxKind::Comma).to_matchable(),
        ),
        (
            "SemicolonSegment".into(),
            StringParser::new(";", SyntaxKind::Semicolon).to_matchable(),
        ),
        (
            "StartBracketSegment".into(),
            StringParser::new("(", SyntaxKind::StartBracket).to_matchable(),
        ),
        (
            "EndBracketSegment".into(),
            StringParser::new(")", SyntaxKind::EndBracket).to_matchable(),
        ),
        (
            "StartSquareBracketSegment".into(),
            StringParser::new("[", SyntaxKind::StartSquareBracket).to_matchable(),
        ),
        (
            "EndSquareBracketSegment".into(),
            StringParser::new("]", SyntaxKind::EndSquareBracket).to_matchable(),
        ),
        (
            "NumericLiteralSegment".into(),
            TypedParser::new(SyntaxKind::NumericLiteral, SyntaxKind::NumericLiteral)
                .to_matchable(),
        ),
        (
            "NakedIdentifierSegment".into(),
            TypedParser::new(SyntaxKind::Word, SyntaxKind::Identifier).to_matchable(),
        ),
        (
            "AnythingBracketedSegment".into(),
            Bracketed::new(vec![Anything::new().to_matchable()]).to_matchable(),
        ),
    ]);

    dialect.expand();
    dialect
}
