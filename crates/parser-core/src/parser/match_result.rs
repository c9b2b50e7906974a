use super::segments::base::ErasedSegment;

/// The outcome of a matcher over a segment sequence.
///
/// Every matcher returns one of these. The two sides partition the input the
/// matcher was called with: concatenating `matched_segments` and
/// `unmatched_segments` reproduces it (modulo inserted meta segments, which
/// carry no raw text). Match *failure* is simply a result with nothing
/// matched; it is never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub matched_segments: Vec<ErasedSegment>,
    pub unmatched_segments: Vec<ErasedSegment>,
}

impl MatchResult {
    pub fn from_matched(matched: Vec<ErasedSegment>) -> Self {
        Self {
            matched_segments: matched,
            unmatched_segments: Vec::new(),
        }
    }

    pub fn from_unmatched(unmatched: Vec<ErasedSegment>) -> Self {
        Self {
            matched_segments: Vec::new(),
            unmatched_segments: unmatched,
        }
    }

    pub fn from_empty() -> Self {
        Self::default()
    }

    /// A match is complete when nothing is left over.
    pub fn is_complete(&self) -> bool {
        self.unmatched_segments.is_empty()
    }

    pub fn has_match(&self) -> bool {
        !self.matched_segments.is_empty()
    }

    /// The number of matched segments.
    pub fn len(&self) -> usize {
        self.matched_segments.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_match()
    }

    /// Total character length of the matched side. Used as the tie-break
    /// when picking the longest of several partial matches.
    pub fn raw_matched(&self) -> usize {
        self.matched_segments
            .iter()
            .map(|seg| seg.raw().len())
            .sum()
    }

    /// Both sides, in order.
    pub fn all_segments(&self) -> Vec<ErasedSegment> {
        let mut segments = self.matched_segments.clone();
        segments.extend(self.unmatched_segments.iter().cloned());
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::segments::test_functions::generate_test_segments;

    #[test]
    fn test_match_result_constructors() {
        let segments = generate_test_segments(vec!["foo", " ", "bar"]);

        let matched = MatchResult::from_matched(segments.clone());
        assert!(matched.has_match());
        assert!(matched.is_complete());
        assert_eq!(matched.len(), 3);

        let unmatched = MatchResult::from_unmatched(segments);
        assert!(!unmatched.has_match());
        assert!(!unmatched.is_complete());

        let empty = MatchResult::from_empty();
        assert!(!empty.has_match());
        assert!(empty.is_complete());
    }

    #[test]
    fn test_match_result_raw_matched() {
        let segments = generate_test_segments(vec!["foo", " ", "bar"]);
        let result = MatchResult {
            matched_segments: segments[..2].to_vec(),
            unmatched_segments: segments[2..].to_vec(),
        };

        assert_eq!(result.raw_matched(), 4);
        assert_eq!(result.all_segments(), segments);
    }
}
