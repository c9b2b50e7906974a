use fancy_regex::Regex;
use thiserror::Error;

use crate::parser::segments::base::ErasedSegment;

/// A structural parse error: unclosed or unexpected brackets found by the
/// bracket-sensitive scanner. Ordinary match failure is never an error; it
/// is a `MatchResult` with nothing matched.
#[derive(Debug, Clone, Error)]
#[error("{description}")]
pub struct SQLParseError {
    pub description: String,
    pub segment: Option<ErasedSegment>,
}

impl SQLParseError {
    /// Assert-style check that the description matches `pattern`, for use
    /// in tests. Panics with both strings on a miss so the failure reads
    /// without a debugger.
    pub fn matches(&self, pattern: &str) -> bool {
        let regex =
            Regex::new(pattern).unwrap_or_else(|err| panic!("bad pattern {pattern:?}: {err}"));

        if regex.is_match(&self.description).unwrap_or(false) {
            return true;
        }

        panic!(
            "parse error {:?} does not match pattern {:?}",
            self.description, pattern
        );
    }
}
