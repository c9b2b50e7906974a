use std::cell::{Cell, OnceCell};
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use smol_str::{SmolStr, StrExt};

use crate::dialects::syntax::SyntaxKind;
use crate::parser::markers::PositionMarker;
use crate::parser::matchable::Matchable;

pub struct SegmentBuilder {
    node_or_token: NodeOrToken,
}

impl SegmentBuilder {
    pub fn whitespace(id: u32, raw: &str) -> ErasedSegment {
        SegmentBuilder::token(id, raw, SyntaxKind::Whitespace).finish()
    }

    pub fn newline(id: u32, raw: &str) -> ErasedSegment {
        SegmentBuilder::token(id, raw, SyntaxKind::Newline).finish()
    }

    pub fn keyword(id: u32, raw: &str) -> ErasedSegment {
        SegmentBuilder::token(id, raw, SyntaxKind::Keyword).finish()
    }

    pub fn comma(id: u32) -> ErasedSegment {
        SegmentBuilder::token(id, ",", SyntaxKind::Comma).finish()
    }

    pub fn symbol(id: u32, raw: &str) -> ErasedSegment {
        SegmentBuilder::token(id, raw, SyntaxKind::Symbol).finish()
    }

    pub fn token(id: u32, raw: &str, syntax_kind: SyntaxKind) -> Self {
        SegmentBuilder {
            node_or_token: NodeOrToken {
                id,
                syntax_kind,
                position_marker: None,
                raw_upper: OnceCell::new(),
                kind: NodeOrTokenKind::Token(TokenData { raw: raw.into() }),
            },
        }
    }

    pub fn node(id: u32, syntax_kind: SyntaxKind, segments: Vec<ErasedSegment>) -> Self {
        SegmentBuilder {
            node_or_token: NodeOrToken {
                id,
                syntax_kind,
                position_marker: None,
                raw_upper: OnceCell::new(),
                kind: NodeOrTokenKind::Node(NodeData {
                    segments,
                    raw: OnceCell::new(),
                    parse_grammar: None,
                }),
            },
        }
    }

    /// An ephemeral node: wraps matched content and defers the real parse
    /// to the grammar it carries.
    pub fn ephemeral(id: u32, segments: Vec<ErasedSegment>, parse_grammar: Matchable) -> Self {
        SegmentBuilder {
            node_or_token: NodeOrToken {
                id,
                syntax_kind: SyntaxKind::Ephemeral,
                position_marker: None,
                raw_upper: OnceCell::new(),
                kind: NodeOrTokenKind::Node(NodeData {
                    segments,
                    raw: OnceCell::new(),
                    parse_grammar: Some(parse_grammar),
                }),
            },
        }
    }

    pub fn position_from_segments(mut self) -> Self {
        let segments = match &self.node_or_token.kind {
            NodeOrTokenKind::Node(node) => &node.segments[..],
            NodeOrTokenKind::Token(_) => &[],
        };

        self.node_or_token.position_marker = PositionMarker::from_child_markers(
            segments.iter().filter_map(|seg| seg.get_position_marker()),
        )
        .into();

        self
    }

    pub fn with_position(mut self, position: PositionMarker) -> Self {
        self.node_or_token.position_marker = Some(position);
        self
    }

    pub fn finish(self) -> ErasedSegment {
        ErasedSegment {
            value: Rc::new(self.node_or_token),
        }
    }
}

#[derive(Debug, Default)]
pub struct Tables {
    counter: Cell<u32>,
}

impl Tables {
    pub fn next_id(&self) -> u32 {
        let id = self.counter.get();
        self.counter.set(id + 1);
        id
    }
}

#[derive(Clone)]
pub struct ErasedSegment {
    value: Rc<NodeOrToken>,
}

impl Debug for ErasedSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}: {:?}>", self.get_type().as_str(), self.raw())
    }
}

impl PartialEq for ErasedSegment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
            || (self.get_type() == other.get_type()
                && self.raw() == other.raw()
                && self.get_position_marker() == other.get_position_marker())
    }
}

impl Eq for ErasedSegment {}

impl Hash for ErasedSegment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get_type().hash(state);
        self.raw().hash(state);
    }
}

impl ErasedSegment {
    pub fn raw(&self) -> &SmolStr {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => node.raw.get_or_init(|| {
                SmolStr::from_iter(node.segments.iter().map(|segment| segment.raw().as_str()))
            }),
            NodeOrTokenKind::Token(token) => &token.raw,
        }
    }

    pub fn raw_upper(&self) -> &SmolStr {
        self.value
            .raw_upper
            .get_or_init(|| self.raw().to_uppercase_smolstr())
    }

    pub fn segments(&self) -> &[ErasedSegment] {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => &node.segments,
            NodeOrTokenKind::Token(_) => &[],
        }
    }

    pub fn id(&self) -> u32 {
        self.value.id
    }

    /// Object identity, stable for the duration of a parse. This is the
    /// ingredient of the blacklist fingerprints.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.value) as usize
    }

    pub fn get_type(&self) -> SyntaxKind {
        self.value.syntax_kind
    }

    pub fn is_type(&self, kind: SyntaxKind) -> bool {
        self.get_type() == kind
    }

    pub fn is_meta(&self) -> bool {
        matches!(
            self.value.syntax_kind,
            SyntaxKind::Indent | SyntaxKind::Dedent | SyntaxKind::Ephemeral
        )
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(
            self.value.syntax_kind,
            SyntaxKind::Whitespace | SyntaxKind::Newline
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self.value.syntax_kind,
            SyntaxKind::InlineComment | SyntaxKind::BlockComment
        )
    }

    pub fn is_code(&self) -> bool {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => node.segments.iter().any(|s| s.is_code()),
            NodeOrTokenKind::Token(_) => {
                !self.is_comment() && !self.is_whitespace() && !self.is_meta()
            }
        }
    }

    /// The leaf segments beneath this one, depth first. A token is its own
    /// only leaf.
    pub fn get_raw_segments(&self) -> Vec<ErasedSegment> {
        match &self.value.kind {
            NodeOrTokenKind::Token(_) => vec![self.clone()],
            NodeOrTokenKind::Node(node) => node
                .segments
                .iter()
                .flat_map(|seg| seg.get_raw_segments())
                .collect(),
        }
    }

    pub fn get_position_marker(&self) -> Option<&PositionMarker> {
        self.value.position_marker.as_ref()
    }

    pub fn get_start_position_marker(&self) -> PositionMarker {
        self.get_position_marker().unwrap().start_point_marker()
    }

    pub fn get_end_position_marker(&self) -> PositionMarker {
        self.get_position_marker().unwrap().end_point_marker()
    }

    /// The deferred grammar carried by an ephemeral segment.
    pub fn parse_grammar(&self) -> Option<Matchable> {
        match &self.value.kind {
            NodeOrTokenKind::Node(node) => node.parse_grammar.clone(),
            NodeOrTokenKind::Token(_) => None,
        }
    }
}

#[derive(Debug)]
struct NodeOrToken {
    id: u32,
    syntax_kind: SyntaxKind,
    position_marker: Option<PositionMarker>,
    raw_upper: OnceCell<SmolStr>,
    kind: NodeOrTokenKind,
}

#[derive(Debug)]
enum NodeOrTokenKind {
    Node(NodeData),
    Token(TokenData),
}

#[derive(Debug)]
struct NodeData {
    segments: Vec<ErasedSegment>,
    raw: OnceCell<SmolStr>,
    parse_grammar: Option<Matchable>,
}

#[derive(Debug)]
struct TokenData {
    raw: SmolStr,
}
