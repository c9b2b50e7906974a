use std::borrow::Cow;
use std::collections::hash_map::Entry;

use ahash::{AHashMap, AHashSet};

use crate::dialects::syntax::SyntaxKind;
use crate::helpers::{ToMatchable, capitalize};
use crate::parser::matchable::Matchable;
use crate::parser::parsers::StringParser;

/// A read-only registry mapping names to matchers.
///
/// References between grammars always go through a dialect at match time,
/// never through direct links. That late binding is what permits cyclic
/// grammar graphs (expressions containing expressions): the whole map is
/// constructed first and a shared handle is passed to every matcher.
#[derive(Debug, Clone, Default)]
pub struct Dialect {
    name: &'static str,
    library: AHashMap<Cow<'static, str>, Matchable>,
    sets: AHashMap<&'static str, AHashSet<&'static str>>,
}

impl PartialEq for Dialect {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Dialect {
    pub fn new(name: &'static str) -> Self {
        Dialect {
            name,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn add(
        &mut self,
        iter: impl IntoIterator<Item = (Cow<'static, str>, Matchable)>,
    ) {
        self.library.extend(iter);
    }

    pub fn get(&self, name: &str) -> Option<Matchable> {
        self.library.get(name).cloned()
    }

    /// Fetch a named matcher. Unknown names are a programmer error in the
    /// dialect definition, not a parse failure.
    pub fn r#ref(&self, name: &str) -> Matchable {
        match self.library.get(name) {
            Some(matchable) => matchable.clone(),
            None => {
                if let Some(keyword) = name.strip_suffix("KeywordSegment") {
                    panic!(
                        "Grammar refers to the '{keyword}' keyword which was not found in the \
                         {} dialect. Add it to one of the keyword sets before expanding.",
                        self.name,
                    );
                } else {
                    panic!(
                        "Grammar refers to '{name}' which was not found in the {} dialect.",
                        self.name,
                    );
                }
            }
        }
    }

    pub fn sets(&self, label: &str) -> AHashSet<&'static str> {
        self.sets.get(label).cloned().unwrap_or_default()
    }

    pub fn sets_mut(&mut self, label: &'static str) -> &mut AHashSet<&'static str> {
        match self.sets.entry(label) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(<_>::default()),
        }
    }

    pub fn update_keywords_set_from_multiline_string(
        &mut self,
        set_label: &'static str,
        values: &'static str,
    ) {
        let keywords = values.lines().map(str::trim).filter(|line| !line.is_empty());
        self.sets_mut(set_label).extend(keywords);
    }

    pub fn add_keyword_to_set(&mut self, set_label: &'static str, value: &'static str) {
        self.sets_mut(set_label).insert(value);
    }

    /// Materialize the keyword sets: every keyword gets a
    /// `<Capitalized>KeywordSegment` string parser unless one was already
    /// registered explicitly.
    pub fn expand(&mut self) {
        for keyword_set in ["unreserved_keywords", "reserved_keywords"] {
            if let Some(keywords) = self.sets.get(keyword_set) {
                for kw in keywords {
                    let n = format!("{}KeywordSegment", capitalize(kw));
                    if !self.library.contains_key(n.as_str()) {
                        let parser = StringParser::new(kw, SyntaxKind::Keyword);

                        self.library.insert(n.into(), parser.to_matchable());
                    }
                }
            }
        }
    }
}
