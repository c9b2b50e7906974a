use super::base::{ErasedSegment, SegmentBuilder};
use crate::dialects::syntax::SyntaxKind;
use crate::errors::SQLParseError;
use crate::parser::context::ParseContext;
use crate::parser::markers::PositionMarker;
use crate::parser::match_result::MatchResult;
use crate::parser::matchable::MatchableTrait;

pub type Indent = MetaSegment;

/// The indent/dedent placeholder usable as an element of a `Sequence`.
///
/// A meta placeholder never consumes input: when a sequence reaches one, it
/// emits a zero-width positioned token instead. Placeholders can be made
/// conditional on an indentation config key, in which case a disabled one
/// emits nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaSegment {
    kind: SyntaxKind,
    if_config: Option<&'static str>,
}

impl MetaSegment {
    pub fn indent() -> Self {
        Self {
            kind: SyntaxKind::Indent,
            if_config: None,
        }
    }

    pub fn dedent() -> Self {
        Self {
            kind: SyntaxKind::Dedent,
            if_config: None,
        }
    }

    /// Only emit this placeholder when the named indentation config key is
    /// set to true.
    pub fn when(mut self, config_key: &'static str) -> Self {
        self.if_config = Some(config_key);
        self
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn is_enabled(&self, parse_context: &ParseContext) -> bool {
        match self.if_config {
            None => true,
            Some(key) => parse_context
                .indentation_config
                .get(key)
                .copied()
                .unwrap_or(false),
        }
    }

    /// A positioned zero-width token for this placeholder.
    pub fn instantiate(&self, id: u32, position: PositionMarker) -> ErasedSegment {
        SegmentBuilder::token(id, "", self.kind)
            .with_position(position)
            .finish()
    }
}

impl MatchableTrait for MetaSegment {
    fn name(&self) -> &'static str {
        "MetaSegment"
    }

    fn is_meta(&self) -> bool {
        true
    }

    fn match_segments(
        &self,
        _segments: &[ErasedSegment],
        _parse_context: &mut ParseContext,
    ) -> Result<MatchResult, SQLParseError> {
        panic!(
            "{} has no match method, it should only be used in a Sequence!",
            std::any::type_name::<Self>()
        );
    }
}

/// Strip meta segments out of a sequence, e.g. to compare raw content in
/// round-trip checks.
pub fn filter_meta(segments: &[ErasedSegment]) -> Vec<ErasedSegment> {
    segments
        .iter()
        .filter(|seg| !seg.is_meta())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;

    use super::*;
    use crate::parser::segments::test_functions::test_dialect;

    #[test]
    fn test_meta_enablement() {
        let dialect = test_dialect();
        let mut config = AHashMap::new();
        config.insert("indented_joins".to_string(), true);
        let ctx = ParseContext::new(&dialect, &config);

        assert!(MetaSegment::indent().is_enabled(&ctx));
        assert!(MetaSegment::indent().when("indented_joins").is_enabled(&ctx));
        assert!(!MetaSegment::indent().when("indented_ctes").is_enabled(&ctx));
    }

    #[test]
    fn test_meta_instantiate() {
        let seg = MetaSegment::dedent().instantiate(0, PositionMarker::new(3..3, 1, 4));
        assert_eq!(seg.raw(), "");
        assert!(seg.is_meta());
        assert_eq!(seg.get_type(), SyntaxKind::Dedent);
        assert_eq!(seg.get_position_marker().unwrap().source_slice, 3..3);
    }
}
