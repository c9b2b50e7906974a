use itertools::Itertools as _;

use super::context::ParseContext;
use super::match_result::MatchResult;
use super::matchable::{Matchable, MatchableTrait};
use super::segments::base::ErasedSegment;
use crate::dialects::syntax::SyntaxKind;
use crate::errors::SQLParseError;

/// Split a sequence into (leading non-code, middle, trailing non-code).
pub fn trim_non_code(
    segments: &[ErasedSegment],
) -> (&[ErasedSegment], &[ErasedSegment], &[ErasedSegment]) {
    let Some(first_code) = segments.iter().position(|seg| seg.is_code()) else {
        return (segments, &[], &[]);
    };
    let last_code = segments.iter().rposition(|seg| seg.is_code()).unwrap();

    (
        &segments[..first_code],
        &segments[first_code..=last_code],
        &segments[last_code + 1..],
    )
}

/// Sense check that a match partition hasn't dropped raw content. Debug
/// builds only.
pub fn check_still_complete(
    segments: &[ErasedSegment],
    matched_segments: &[ErasedSegment],
    unmatched_segments: &[ErasedSegment],
) {
    if cfg!(debug_assertions) {
        let join = |segs: &[ErasedSegment]| -> String {
            segs.iter().map(|seg| seg.raw().as_str()).collect()
        };

        let mut recombined = join(matched_segments);
        recombined.push_str(&join(unmatched_segments));
        pretty_assertions::assert_eq!(join(segments), recombined);
    }
}

/// Use the simple matchers to prune which options could possibly match the
/// front of the input. Non-simple options always survive.
pub fn prune_options(
    options: &[Matchable],
    segments: &[ErasedSegment],
    parse_context: &ParseContext,
) -> Vec<Matchable> {
    let str_buff = segments
        .iter()
        .flat_map(|seg| seg.get_raw_segments())
        .map(|leaf| leaf.raw_upper().clone())
        .collect_vec();
    let first_elem = str_buff.iter().find(|raw| !raw.trim().is_empty());

    let mut available_options = Vec::new();
    let mut pruned = 0;

    for opt in options {
        let Some(simple) = opt.simple(parse_context, None) else {
            // Not simple, we have to do a full match with it.
            available_options.push(opt.clone());
            continue;
        };

        let mut matched = false;
        for simple_opt in &simple {
            if str_buff.iter().any(|raw| raw.as_str() == simple_opt.as_str()) {
                // A non-whitespace option additionally has to match the
                // FIRST meaningful element of the buffer.
                if !simple_opt.trim().is_empty()
                    && first_elem.map(|raw| raw.as_str()) != Some(simple_opt.as_str())
                {
                    continue;
                }
                available_options.push(opt.clone());
                matched = true;
                break;
            }
        }

        if !matched {
            pruned += 1;
        }
    }

    if pruned > 0 {
        log::trace!(
            "[L{:02}] prune_options: dropped {pruned} of {} options",
            parse_context.match_depth(),
            options.len(),
        );
    }

    available_options
}

/// Match, but also deal with leading and trailing non-code.
pub fn code_only_sensitive_match(
    segments: &[ErasedSegment],
    matcher: &Matchable,
    parse_context: &mut ParseContext,
    allow_gaps: bool,
) -> Result<MatchResult, SQLParseError> {
    if !allow_gaps {
        return matcher.match_segments(segments, parse_context);
    }

    let (pre_ws, seg_buff, post_ws) = trim_non_code(segments);
    if seg_buff.is_empty() {
        return Ok(MatchResult::from_unmatched(segments.to_vec()));
    }

    let m = matcher.match_segments(seg_buff, parse_context)?;
    if m.is_complete() {
        // Complete matches pick the trimmed bands back up as matched.
        let mut matched = pre_ws.to_vec();
        matched.extend(m.matched_segments);
        matched.extend(post_ws.iter().cloned());
        Ok(MatchResult::from_matched(matched))
    } else if m.has_match() {
        // Incomplete matches give the trailing band back as unmatched.
        let mut matched = pre_ws.to_vec();
        matched.extend(m.matched_segments);
        let mut unmatched = m.unmatched_segments;
        unmatched.extend(post_ws.iter().cloned());
        Ok(MatchResult {
            matched_segments: matched,
            unmatched_segments: unmatched,
        })
    } else {
        Ok(MatchResult::from_unmatched(segments.to_vec()))
    }
}

/// Like `code_only_sensitive_match` but over a selection of matchers at the
/// same starting position. The first complete match returns immediately;
/// otherwise the longest partial wins, with ties going to the earlier
/// matcher.
pub fn longest_code_only_sensitive_match(
    segments: &[ErasedSegment],
    matchers: &[Matchable],
    parse_context: &mut ParseContext,
    allow_gaps: bool,
) -> Result<(MatchResult, Option<Matchable>), SQLParseError> {
    if segments.is_empty() {
        return Ok((MatchResult::from_empty(), None));
    }

    let mut longest: Option<(MatchResult, Matchable)> = None;
    for matcher in matchers {
        let res_match = code_only_sensitive_match(segments, matcher, parse_context, allow_gaps)?;

        if res_match.is_complete() {
            return Ok((res_match, Some(matcher.clone())));
        } else if res_match.has_match() {
            match &longest {
                Some((best, _)) if res_match.len() <= best.len() => {}
                _ => longest = Some((res_match, matcher.clone())),
            }
        }
    }

    Ok(match longest {
        Some((mat, matcher)) => (mat, Some(matcher)),
        None => (MatchResult::from_unmatched(segments.to_vec()), None),
    })
}

/// Look ahead for matches beyond the first element of the segment list.
///
/// Returns `(pre_segments, match, matcher)` where `pre_segments` are the
/// segments skipped before the match begins. Simple matchers take a fast
/// route: their advertised strings are looked up in a buffer of the
/// uppercase raws and candidates are tried in position order. Anything
/// non-simple falls back to a position-by-position scan, with an early exit
/// once the scan has passed the best simple candidate.
#[allow(clippy::type_complexity)]
pub fn look_ahead_match(
    segments: &[ErasedSegment],
    matchers: &[Matchable],
    parse_context: &mut ParseContext,
    allow_gaps: bool,
) -> Result<(Vec<ErasedSegment>, MatchResult, Option<Matchable>), SQLParseError> {
    if segments.is_empty() {
        return Ok((Vec::new(), MatchResult::from_empty(), None));
    }

    let mut simple_matchers: Vec<(&Matchable, ahash::AHashSet<String>)> = Vec::new();
    let mut non_simple_matchers: Vec<Matchable> = Vec::new();
    for matcher in matchers {
        match matcher.simple(parse_context, None) {
            Some(options) => simple_matchers.push((matcher, options)),
            None => non_simple_matchers.push(matcher.clone()),
        }
    }

    let mut best_simple_match: Option<(Vec<ErasedSegment>, MatchResult, Matchable)> = None;

    if !simple_matchers.is_empty() {
        // For compound segments we assume internal consistency and compare
        // against the whole uppercase raw rather than the leaves.
        let mut match_queue: Vec<(&Matchable, usize)> = Vec::new();
        for (matcher, options) in &simple_matchers {
            for option in options {
                if let Some(buff_pos) = segments
                    .iter()
                    .position(|seg| seg.raw_upper().as_str() == option.as_str())
                {
                    match_queue.push((*matcher, buff_pos));
                }
            }
        }
        // Earliest occurrence first; the sort is stable so ties keep the
        // matcher order.
        match_queue.sort_by_key(|(_, buff_pos)| *buff_pos);

        for (matcher, buff_pos) in match_queue {
            let mut mat = matcher.match_segments(&segments[buff_pos..], parse_context)?;
            if !mat.has_match() {
                // Hashed in simple matching, but excluded on the real
                // match. Move on to the next candidate.
                continue;
            }

            let mut pre_idx = buff_pos;
            if allow_gaps {
                // Pick up any non-code segments immediately before the
                // match...
                while pre_idx > 0 && !segments[pre_idx - 1].is_code() {
                    pre_idx -= 1;
                }
                // ...and if the whole of the rest is non-code, absorb that
                // too (otherwise the next matcher will pick it up).
                if mat.unmatched_segments.iter().all(|seg| !seg.is_code()) {
                    mat = MatchResult::from_matched(mat.all_segments());
                }
            }

            let mut matched_segments = segments[pre_idx..buff_pos].to_vec();
            matched_segments.extend(mat.matched_segments);
            let mat = MatchResult {
                matched_segments,
                unmatched_segments: mat.unmatched_segments,
            };

            best_simple_match = Some((segments[..pre_idx].to_vec(), mat, matcher.clone()));
            break;
        }
    }

    if non_simple_matchers.is_empty() {
        // There are no other matchers, we can just shortcut now.
        return Ok(match best_simple_match {
            Some((pre, mat, matcher)) => (pre, mat, Some(matcher)),
            None => (
                Vec::new(),
                MatchResult::from_unmatched(segments.to_vec()),
                None,
            ),
        });
    }

    let mut pos = 0;
    loop {
        if pos >= segments.len() {
            return Ok((
                Vec::new(),
                MatchResult::from_unmatched(segments.to_vec()),
                None,
            ));
        }

        // We only check the non-simple matchers here; the hash lookup has
        // already dealt with the rest.
        let (mat, matcher) = longest_code_only_sensitive_match(
            &segments[pos..],
            &non_simple_matchers,
            parse_context,
            allow_gaps,
        )?;

        if mat.has_match() {
            return Ok(match best_simple_match {
                None => (segments[..pos].to_vec(), mat, matcher),
                Some((best_pre, best_mat, best_matcher)) => {
                    let matcher = matcher.unwrap();
                    let index_of = |needle: &Matchable| {
                        matchers
                            .iter()
                            .position(|m| m == needle)
                            .unwrap_or(usize::MAX)
                    };

                    // Earlier start wins, then longer, then original
                    // element order.
                    let wins = pos < best_pre.len()
                        || (pos == best_pre.len() && mat.len() > best_mat.len())
                        || (pos == best_pre.len()
                            && mat.len() == best_mat.len()
                            && index_of(&matcher) < index_of(&best_matcher));

                    if wins {
                        (segments[..pos].to_vec(), mat, Some(matcher))
                    } else {
                        (best_pre, best_mat, Some(best_matcher))
                    }
                }
            });
        }

        // No match at this position. If we've got as far as the best simple
        // candidate, that's the winner.
        if best_simple_match
            .as_ref()
            .is_some_and(|(best_pre, _, _)| pos >= best_pre.len())
        {
            let (pre, mat, matcher) = best_simple_match.unwrap();
            return Ok((pre, mat, Some(matcher)));
        }

        pos += 1;
        if allow_gaps {
            while pos < segments.len() && !segments[pos].is_code() {
                pos += 1;
            }
        }
    }
}

/// Same as `look_ahead_match` but with bracket counting: matches inside an
/// open bracket pair are invisible, an unbalanced close bracket is an error,
/// and so is running out of input with brackets still open.
#[allow(clippy::type_complexity)]
pub fn bracket_sensitive_look_ahead_match(
    segments: &[ErasedSegment],
    matchers: &[Matchable],
    parse_context: &mut ParseContext,
    allow_gaps: bool,
) -> Result<(Vec<ErasedSegment>, MatchResult, Option<Matchable>), SQLParseError> {
    if segments.is_empty() {
        return Ok((Vec::new(), MatchResult::from_unmatched(Vec::new()), None));
    }

    let start_brackets = vec![
        parse_context.dialect().r#ref("StartBracketSegment"),
        parse_context.dialect().r#ref("StartSquareBracketSegment"),
    ];
    let end_brackets = vec![
        parse_context.dialect().r#ref("EndBracketSegment"),
        parse_context.dialect().r#ref("EndSquareBracketSegment"),
    ];
    let bracket_matchers = [start_brackets.clone(), end_brackets.clone()].concat();

    let mut all_matchers = matchers.to_vec();
    all_matchers.extend(bracket_matchers.iter().cloned());

    let mut seg_buff = segments.to_vec();
    let mut pre_seg_buff: Vec<ErasedSegment> = Vec::new();
    let mut bracket_stack: Vec<ErasedSegment> = Vec::new();

    loop {
        if seg_buff.is_empty() {
            if let Some(bracket) = bracket_stack.pop() {
                return Err(SQLParseError {
                    description: "Couldn't find closing bracket for opening bracket.".into(),
                    segment: Some(bracket),
                });
            }

            // At the end without a bracket left open. This is a friendly
            // unmatched return.
            return Ok((
                Vec::new(),
                MatchResult::from_unmatched(segments.to_vec()),
                None,
            ));
        }

        if !bracket_stack.is_empty() {
            // Inside brackets we're only looking for the closing bracket,
            // or another opening one.
            let (pre, mat, matcher) =
                look_ahead_match(&seg_buff, &bracket_matchers, parse_context, allow_gaps)?;

            if !mat.has_match() {
                return Err(SQLParseError {
                    description: "Couldn't find closing bracket for opening bracket.".into(),
                    segment: bracket_stack.pop(),
                });
            }

            let matcher = matcher.unwrap();
            if start_brackets.contains(&matcher) {
                bracket_stack.push(bracket_segment(&mat));
            } else {
                bracket_stack.pop();
            }

            pre_seg_buff.extend(pre);
            pre_seg_buff.extend(mat.matched_segments);
            seg_buff = mat.unmatched_segments;
            continue;
        }

        // Open to more opening brackets or the thing(s) we're otherwise
        // looking for.
        let (pre, mat, matcher) =
            look_ahead_match(&seg_buff, &all_matchers, parse_context, allow_gaps)?;

        if !mat.has_match() {
            return Ok((
                Vec::new(),
                MatchResult::from_unmatched(segments.to_vec()),
                None,
            ));
        }

        let matcher = matcher.unwrap();
        if start_brackets.contains(&matcher) {
            bracket_stack.push(bracket_segment(&mat));
            pre_seg_buff.extend(pre);
            pre_seg_buff.extend(mat.matched_segments);
            seg_buff = mat.unmatched_segments;
        } else if end_brackets.contains(&matcher) {
            return Err(SQLParseError {
                description: "Found unexpected end bracket!".into(),
                segment: Some(bracket_segment(&mat)),
            });
        } else {
            // It's one of the things we were looking for!
            pre_seg_buff.extend(pre);
            return Ok((pre_seg_buff, mat, Some(matcher)));
        }
    }
}

/// The bracket token within a bracket matcher's result. With gaps allowed
/// the match may have absorbed leading non-code.
fn bracket_segment(mat: &MatchResult) -> ErasedSegment {
    mat.matched_segments
        .iter()
        .find(|seg| seg.is_code())
        .unwrap_or(&mat.matched_segments[0])
        .clone()
}

/// Scan up to (but not including) the first bracket-balanced occurrence of
/// any of the terminators. This is the engine of `GreedyUntil` and
/// `StartsWith`.
pub fn greedy_match(
    segments: &[ErasedSegment],
    parse_context: &mut ParseContext,
    matchers: &[Matchable],
    allow_gaps: bool,
    enforce_whitespace_preceding_terminator: bool,
    include_terminator: bool,
) -> Result<MatchResult, SQLParseError> {
    // No terminators, so the whole thing matches.
    if matchers.is_empty() {
        return Ok(MatchResult::from_matched(segments.to_vec()));
    }

    let mut seg_buff = segments.to_vec();
    let mut seg_bank: Vec<ErasedSegment> = Vec::new();

    loop {
        let (pre, mat, _) = parse_context.deeper_match(|ctx| {
            bracket_sensitive_look_ahead_match(&seg_buff, matchers, ctx, allow_gaps)
        })?;

        if !mat.has_match() {
            // Terminator not found: the whole input matches.
            return Ok(MatchResult::from_matched(segments.to_vec()));
        }

        if enforce_whitespace_preceding_terminator && !terminator_is_preceded_by_whitespace(&pre, &mat)
        {
            // Not a real terminator here: consume it as content and keep
            // scanning.
            seg_bank.extend(pre);
            seg_bank.extend(mat.matched_segments);
            seg_buff = mat.unmatched_segments;
            continue;
        }

        if include_terminator {
            let mut matched = seg_bank;
            matched.extend(pre);
            matched.extend(mat.matched_segments);
            return Ok(MatchResult {
                matched_segments: matched,
                unmatched_segments: mat.unmatched_segments,
            });
        }

        // We can't claim any non-code segments, so trailing ones move over
        // to the unmatched side.
        let mut full_pre = seg_bank;
        full_pre.extend(pre);
        let (leading_nc, pre_seg_mid, trailing_nc) = trim_non_code(&full_pre);

        let mut matched = leading_nc.to_vec();
        matched.extend(pre_seg_mid.iter().cloned());
        let mut unmatched = trailing_nc.to_vec();
        unmatched.extend(mat.all_segments());

        return Ok(MatchResult {
            matched_segments: matched,
            unmatched_segments: unmatched,
        });
    }
}

/// Whether the terminator match either contains leading whitespace itself,
/// or follows whitespace in the scanned-past content. Meta segments are
/// tolerated on the way; an entirely meta (or empty) pre-buffer counts as
/// preceded.
fn terminator_is_preceded_by_whitespace(pre: &[ErasedSegment], mat: &MatchResult) -> bool {
    for elem in &mat.matched_segments {
        if elem.is_meta() {
            continue;
        }
        if matches!(elem.get_type(), SyntaxKind::Whitespace | SyntaxKind::Newline) {
            return true;
        }
        break;
    }

    for elem in pre.iter().rev() {
        if elem.is_meta() {
            continue;
        }
        return matches!(elem.get_type(), SyntaxKind::Whitespace | SyntaxKind::Newline);
    }

    true
}
