#[derive(
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    strum_macros::IntoStaticStr,
    strum_macros::EnumString,
    Hash,
    PartialOrd,
    Ord,
    Default,
)]
#[strum(serialize_all = "snake_case")]
pub enum SyntaxKind {
    #[default]
    Unparsable,
    File,
    Word,
    Identifier,
    Keyword,
    NumericLiteral,
    Symbol,
    Comma,
    Semicolon,
    StartBracket,
    EndBracket,
    StartSquareBracket,
    EndSquareBracket,
    Whitespace,
    Newline,
    InlineComment,
    BlockComment,
    Indent,
    Dedent,
    Ephemeral,
    Bracketed,
}

impl SyntaxKind {
    pub fn indent_val(self) -> i8 {
        match self {
            SyntaxKind::Indent => 1,
            SyntaxKind::Dedent => -1,
            _ => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}
