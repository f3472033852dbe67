//! Brace expansion.
//!
//! Expands `a{b,c}d` into `abd` and `acd` and numeric sets such as `{1..3}`
//! into one pattern per integer. Expansion is closed over pattern strings
//! and never fails: an unmatched `{` is escaped and the pattern is expanded
//! again.

use itertools::Itertools as _;
use regex::Regex;
use std::sync::LazyLock;

use crate::MatchOptions;

static NUMERIC_SET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{(-?\d+)\.\.(-?\d+)\}").expect("invalid numeric set grammar"));

/// Expands a pattern into its alternation cases.
///
/// The result is non-empty; a pattern without braces (or expansion disabled
/// via [`MatchOptions::no_brace`]) expands to itself.
pub fn expand(pattern: &str, options: &MatchOptions) -> Vec<String> {
    if options.no_brace || !pattern.contains('{') {
        return vec![pattern.to_owned()];
    }
    expand_set(pattern)
}

fn expand_set(pattern: &str) -> Vec<String> {
    let Some(open) = unescaped_brace(pattern) else {
        return vec![pattern.to_owned()];
    };
    let prefix = &pattern[..open];
    if let Some(captures) = NUMERIC_SET.captures(&pattern[open..]) {
        let set = captures.get(0).expect("numeric set without match").as_str();
        if let (Ok(start), Ok(end)) = (captures[1].parse::<i64>(), captures[2].parse::<i64>()) {
            let numbers: Vec<i64> = if start <= end {
                (start..=end).collect()
            }
            else {
                (end..=start).rev().collect()
            };
            let suffixes = expand_set(&pattern[open + set.len()..]);
            return numbers
                .iter()
                .cartesian_product(suffixes.iter())
                .map(|(number, suffix)| format!("{}{}{}", prefix, number, suffix))
                .collect();
        }
    }
    // Choice set: split members on commas at depth one.
    let mut depth = 1usize;
    let mut escaped = false;
    let mut member_start = open + 1;
    let mut members: Vec<&str> = Vec::new();
    let mut close = None;
    for (offset, character) in pattern[open + 1..].char_indices() {
        let at = open + 1 + offset;
        if escaped {
            escaped = false;
            continue;
        }
        match character {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(at);
                    break;
                }
            },
            ',' if depth == 1 => {
                members.push(&pattern[member_start..at]);
                member_start = at + 1;
            },
            _ => {},
        }
    }
    let Some(close) = close else {
        // No closing brace: the stray `{` becomes a literal.
        let mut literal = String::with_capacity(pattern.len() + 1);
        literal.push_str(prefix);
        literal.push('\\');
        literal.push_str(&pattern[open..]);
        return expand_set(&literal);
    };
    members.push(&pattern[member_start..close]);
    let suffixes = expand_set(&pattern[close + 1..]);
    if members.len() == 1 {
        // A single-member set such as `{x}` keeps its braces.
        return expand_set(members[0])
            .iter()
            .cartesian_product(suffixes.iter())
            .map(|(member, suffix)| format!("{}{{{}}}{}", prefix, member, suffix))
            .collect();
    }
    let members: Vec<String> = members.into_iter().flat_map(expand_set).collect();
    members
        .iter()
        .cartesian_product(suffixes.iter())
        .map(|(member, suffix)| format!("{}{}{}", prefix, member, suffix))
        .collect()
}

fn unescaped_brace(pattern: &str) -> Option<usize> {
    let mut escaped = false;
    for (at, character) in pattern.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match character {
            '\\' => escaped = true,
            '{' => return Some(at),
            _ => {},
        }
    }
    None
}
