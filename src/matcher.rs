//! The match engine.
//!
//! Matching runs in two sweeps over a window into the input: a backward
//! sweep that discharges the fixed elements trailing the last wildcard, then
//! a forward sweep that discharges the prefix and hands each wildcard its
//! span. Wildcard spans are found by fast-forwarding to the anchor recorded
//! at compile time; a mismatch in the fixed elements after a wildcard
//! retries that wildcard at its next candidate position.

use crate::token::{Case, Token, Wildcard, WildcardKind};
use crate::MatchOptions;

pub fn is_separator(character: char, options: &MatchOptions) -> bool {
    character == '/' || (options.allow_windows_paths && character == '\\')
}

/// Matches one compiled case against the input.
pub fn is_match(case: &Case, input: &[char], options: &MatchOptions) -> bool {
    if attempt(case, input, options) {
        return true;
    }
    // Trailing separators are forgiven: `a/*` matches `a/b/`.
    let mut end = input.len();
    while end > 0 && is_separator(input[end - 1], options) {
        end -= 1;
    }
    end < input.len() && attempt(case, &input[..end], options)
}

fn attempt(case: &Case, input: &[char], options: &MatchOptions) -> bool {
    let mut start = 0;
    let mut end = input.len();
    if options.match_base && !case.has_separators() {
        // A separator-free pattern matches against the basename.
        while end > start && is_separator(input[end - 1], options) {
            end -= 1;
        }
        if let Some(at) = input[..end].iter().rposition(|&c| is_separator(c, options)) {
            start = at + 1;
        }
    }
    let matcher = Matcher {
        tokens: case.tokens(),
        input,
        options,
        base: start,
        total_end: end,
    };
    matcher.matched(start, end)
}

struct Matcher<'m> {
    tokens: &'m [Token],
    input: &'m [char],
    options: &'m MatchOptions,
    /// Window start; acts as start-of-string for the dot policy.
    base: usize,
    /// Window end before the backward sweep, for budget pruning.
    total_end: usize,
}

impl Matcher<'_> {
    fn sep(&self, character: char) -> bool {
        is_separator(character, self.options)
    }

    fn matched(&self, start: usize, end: usize) -> bool {
        let mut end = end;
        let mut index = self.tokens.len();
        // Backward sweep: discharge everything after the last wildcard.
        let (cursor, tree_boundary) = loop {
            if index == 0 {
                // No wildcard: the fixed elements must have consumed the
                // whole window.
                return end == start;
            }
            index -= 1;
            match &self.tokens[index] {
                Token::Wildcard(_) => break (index, false),
                Token::Literal(text) => match self.strip_suffix(start, end, text) {
                    Some(at) => end = at,
                    None => return false,
                },
                Token::Class(class) => {
                    if end == start {
                        return false;
                    }
                    let character = self.input[end - 1];
                    if self.sep(character) || !class.matches(character, self.options.ignore_case) {
                        return false;
                    }
                    end -= 1;
                },
                Token::Separator => {
                    if index > 0
                        && matches!(
                            &self.tokens[index - 1],
                            Token::Wildcard(wildcard) if wildcard.kind() == WildcardKind::Tree
                        )
                    {
                        // `**` may absorb zero segments; the remaining tail
                        // belongs to it, bounded at a component boundary.
                        break (index - 1, true);
                    }
                    if end == start || !self.sep(self.input[end - 1]) {
                        return false;
                    }
                    end -= 1;
                    while end > start && self.sep(self.input[end - 1]) {
                        end -= 1;
                    }
                },
            }
        };
        match self.fixed_run(0, start, cursor, end) {
            Some((item, off)) => self.wildcard(item, off, cursor, end, tree_boundary),
            None => false,
        }
    }

    /// Discharges fixed elements from `item` forward until a wildcard is
    /// reached. `last` is the final wildcard; a run never walks past it.
    fn fixed_run(
        &self,
        mut item: usize,
        mut off: usize,
        last: usize,
        end: usize,
    ) -> Option<(usize, usize)> {
        while item <= last {
            match &self.tokens[item] {
                Token::Wildcard(_) => return Some((item, off)),
                Token::Literal(text) => {
                    off = self.strip_prefix(off, end, text)?;
                },
                Token::Class(class) => {
                    if off == end {
                        return None;
                    }
                    let character = self.input[off];
                    if self.sep(character)
                        || (character == '.' && !self.dot_allowed(off))
                        || !class.matches(character, self.options.ignore_case)
                    {
                        return None;
                    }
                    off += 1;
                },
                Token::Separator => {
                    if off == end || !self.sep(self.input[off]) {
                        return None;
                    }
                    off += 1;
                    while off < end && self.sep(self.input[off]) {
                        off += 1;
                    }
                },
            }
            item += 1;
        }
        // The caller always stops at `last`, which is a wildcard.
        unreachable!("fixed run walked past the final wildcard")
    }

    fn wildcard(&self, item: usize, off: usize, last: usize, end: usize, boundary: bool) -> bool {
        let wildcard = match &self.tokens[item] {
            Token::Wildcard(wildcard) => wildcard,
            _ => unreachable!("cursor is not a wildcard"),
        };
        if item == last {
            return self.absorb(wildcard, off, end, boundary);
        }
        match wildcard.kind() {
            WildcardKind::ZeroOrMore => self.advance_zero_or_more(wildcard, item, off, last, end, boundary),
            WildcardKind::Tree => self.advance_tree(wildcard, item, off, last, end, boundary),
        }
    }

    /// Advances an intermediate `*` over its candidate spans.
    fn advance_zero_or_more(
        &self,
        wildcard: &Wildcard,
        item: usize,
        off: usize,
        last: usize,
        end: usize,
        boundary: bool,
    ) -> bool {
        // A `*` never leaves its component.
        let mut limit = off;
        while limit < end && !self.sep(self.input[limit]) {
            limit += 1;
        }
        // A span may not begin with a rejected dot.
        if limit > off && self.input[off] == '.' && !self.dot_allowed(off) {
            limit = off;
        }
        match self.total_end.checked_sub(wildcard.fixed_len()) {
            Some(budget) => limit = limit.min(budget),
            None => return false,
        }
        let anchor_text = wildcard.anchor().and_then(|at| match &self.tokens[at] {
            Token::Literal(text) => Some(text.as_str()),
            _ => None,
        });
        let mut candidate = off;
        loop {
            if candidate > limit {
                return false;
            }
            let at = match anchor_text {
                Some(text) => match self.find(text, candidate + wildcard.anchor_gap(), end) {
                    Some(found) if found - wildcard.anchor_gap() <= limit => {
                        found - wildcard.anchor_gap()
                    },
                    _ => return false,
                },
                None => candidate,
            };
            if let Some((next, next_off)) = self.fixed_run(item + 1, at, last, end) {
                // Text absorbed here redistributes freely into the next
                // wildcard, so the first fit decides.
                return self.wildcard(next, next_off, last, end, boundary);
            }
            candidate = at + 1;
        }
    }

    /// Advances an intermediate `**` over its candidate spans.
    fn advance_tree(
        &self,
        wildcard: &Wildcard,
        item: usize,
        off: usize,
        last: usize,
        end: usize,
        boundary: bool,
    ) -> bool {
        // A later `*` cannot re-absorb separators swallowed here, so every
        // candidate must be tried; any other follower takes the first fit.
        let committed = !matches!(
            wildcard.next_wildcard().map(|at| &self.tokens[at]),
            Some(Token::Wildcard(next)) if next.kind() == WildcardKind::ZeroOrMore
        );
        let budget = match self.total_end.checked_sub(wildcard.fixed_len()) {
            Some(budget) => budget.min(end),
            None => return false,
        };
        let forbidden = self.forbidden_dot(off, end);
        if matches!(self.tokens.get(item + 1), Some(Token::Separator)) {
            // Zero segments: skip the wildcard and its separator.
            if let Some((next, next_off)) = self.fixed_run(item + 2, off, last, end) {
                if self.wildcard(next, next_off, last, end, boundary) {
                    return true;
                }
                if committed {
                    return false;
                }
            }
            // Otherwise the span ends at a component boundary.
            let mut candidate = off;
            while candidate < budget {
                if let Some(dot) = forbidden {
                    if dot < candidate {
                        return false;
                    }
                }
                if self.sep(self.input[candidate]) {
                    if let Some((next, next_off)) = self.fixed_run(item + 1, candidate, last, end) {
                        if self.wildcard(next, next_off, last, end, boundary) {
                            return true;
                        }
                        if committed {
                            return false;
                        }
                    }
                }
                candidate += 1;
            }
            false
        }
        else {
            // `**` stopping inside a component behaves like `*` there: the
            // dot check covers one character past the span.
            let anchor_text = wildcard.anchor().and_then(|at| match &self.tokens[at] {
                Token::Literal(text) => Some(text.as_str()),
                _ => None,
            });
            let mut candidate = off;
            loop {
                if candidate > budget {
                    return false;
                }
                let at = match anchor_text {
                    Some(text) => match self.find(text, candidate + wildcard.anchor_gap(), end) {
                        Some(found) if found - wildcard.anchor_gap() <= budget => {
                            found - wildcard.anchor_gap()
                        },
                        _ => return false,
                    },
                    None => candidate,
                };
                if let Some(dot) = forbidden {
                    if dot <= at {
                        return false;
                    }
                }
                if let Some((next, next_off)) = self.fixed_run(item + 1, at, last, end) {
                    if self.wildcard(next, next_off, last, end, boundary) {
                        return true;
                    }
                    if committed {
                        return false;
                    }
                }
                candidate = at + 1;
            }
        }
    }

    /// Discharges the final wildcard against the rest of the window.
    fn absorb(&self, wildcard: &Wildcard, off: usize, end: usize, boundary: bool) -> bool {
        match wildcard.kind() {
            WildcardKind::ZeroOrMore => {
                if self.input[off..end].iter().any(|&c| self.sep(c)) {
                    return false;
                }
                if off < end && self.input[off] == '.' && !self.dot_allowed(off) {
                    return false;
                }
                if off == end {
                    // An empty trailing `*` flanked by component boundaries
                    // matches nothing: `a/b/*` does not match `a/b/`.
                    let left = off == self.base || self.sep(self.input[off - 1]);
                    let right = off == self.input.len() || self.sep(self.input[off]);
                    if left && right {
                        return false;
                    }
                }
                true
            },
            WildcardKind::Tree => {
                if boundary {
                    // The separator after this `**` was discharged with zero
                    // segments, so the span must end at a boundary.
                    if off < end {
                        if !self.sep(self.input[end - 1]) {
                            return false;
                        }
                        if self.forbidden_dot(off, end - 1).is_some() {
                            return false;
                        }
                    }
                    true
                }
                else {
                    self.forbidden_dot(off, end).is_none()
                }
            },
        }
    }

    /// Position of the first component-leading dot at or after `from` that
    /// the dot policy rejects, scanning through `until` inclusive.
    fn forbidden_dot(&self, from: usize, until: usize) -> Option<usize> {
        for at in from..=until {
            if at >= self.input.len() {
                break;
            }
            if self.input[at] != '.' {
                continue;
            }
            if at > self.base && !self.sep(self.input[at - 1]) {
                continue;
            }
            // Only the first component-leading dot is policed.
            return if self.dot_allowed(at) { None } else { Some(at) };
        }
        None
    }

    /// Whether a wildcard may consume the dot at `at`.
    fn dot_allowed(&self, at: usize) -> bool {
        // A dot in the middle of a component always matches.
        if at > self.base && !self.sep(self.input[at - 1]) {
            return true;
        }
        if !self.options.dot {
            return false;
        }
        // The `.` and `..` components never match a wildcard.
        let lone = match self.input.get(at + 1) {
            None => true,
            Some(&c) if self.sep(c) => true,
            Some(&'.') => match self.input.get(at + 2) {
                None => true,
                Some(&c) if self.sep(c) => true,
                _ => false,
            },
            _ => false,
        };
        !lone
    }

    fn strip_suffix(&self, start: usize, end: usize, text: &str) -> Option<usize> {
        let mut at = end;
        for character in text.chars().rev() {
            if at == start
                || !crate::chars_eq(self.input[at - 1], character, self.options.ignore_case)
            {
                return None;
            }
            at -= 1;
        }
        Some(at)
    }

    fn strip_prefix(&self, off: usize, end: usize, text: &str) -> Option<usize> {
        let mut at = off;
        for character in text.chars() {
            if at == end || !crate::chars_eq(self.input[at], character, self.options.ignore_case) {
                return None;
            }
            at += 1;
        }
        Some(at)
    }

    /// First occurrence of `text` at or after `from` that fits before `end`.
    fn find(&self, text: &str, from: usize, end: usize) -> Option<usize> {
        let width = text.chars().count();
        let mut at = from;
        while at + width <= end {
            if self.strip_prefix(at, end, text).is_some() {
                return Some(at);
            }
            at += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::token::{compile, expand};
    use crate::MatchOptions;

    fn matches_with(pattern: &str, input: &str, options: &MatchOptions) -> bool {
        let chars: Vec<char> = input.chars().collect();
        expand(pattern, options)
            .iter()
            .any(|case| super::is_match(&compile(case, options), &chars, options))
    }

    fn matches(pattern: &str, input: &str) -> bool {
        matches_with(pattern, input, &MatchOptions::default())
    }

    #[test]
    fn literal_tail_is_anchored() {
        assert!(matches("*.cs", "Foo.cs"));
        assert!(!matches("*.cs", "Foo.cs.bak"));
        assert!(!matches("*.cs", "Foo.rs"));
    }

    #[test]
    fn zero_or_more_stays_in_component() {
        assert!(!matches("*.cs", "sub/Foo.cs"));
        assert!(matches("a/*", "a/b"));
        assert!(!matches("a/*", "a/b/c"));
    }

    #[test]
    fn match_base_uses_basename() {
        let options = MatchOptions {
            match_base: true,
            ..Default::default()
        };
        assert!(matches_with("*.cs", "sub/Foo.cs", &options));
        assert!(matches_with("*.cs", "Foo.cs", &options));
        // A pattern with separators is unaffected.
        assert!(!matches_with("x/*.cs", "sub/Foo.cs", &options));
    }

    #[test]
    fn tree_spans_zero_or_more_components() {
        assert!(matches("a/**/b", "a/b"));
        assert!(matches("a/**/b", "a/x/b"));
        assert!(matches("a/**/b", "a/x/y/b"));
        assert!(!matches("a/**/b", "a/xb"));
        assert!(!matches("a/**/b", "axb"));
    }

    #[test]
    fn tree_within_component_collapses_to_star() {
        assert!(matches("a**b", "axyb"));
        assert!(matches("**/b", "b"));
        assert!(matches("**/b", "x/y/b"));
        assert!(!matches("**/b", "xb"));
    }

    #[test]
    fn dot_policy() {
        assert!(!matches("*", ".hidden"));
        assert!(matches("*", "visible"));
        assert!(!matches("a/**/b", "a/.d/b"));
        let dot = MatchOptions {
            dot: true,
            ..Default::default()
        };
        assert!(matches_with("*", ".hidden", &dot));
        assert!(matches_with("a/**/b", "a/.d/b", &dot));
        // `.` and `..` components never match, opted in or not.
        assert!(!matches_with("*", ".", &dot));
        assert!(!matches_with("*", "..", &dot));
        assert!(!matches_with("a/*", "a/.", &dot));
    }

    #[test]
    fn explicit_dots_are_literal() {
        assert!(matches(".*", ".hidden"));
        assert!(matches("**/.b", ".b"));
        assert!(matches("**/.b", "x/.b"));
        // `**` stopping mid-component polices the next character.
        assert!(!matches("**.hidden", "foo/.hidden"));
        assert!(!matches("**.hidden", ".hidden"));
        assert!(matches("**.hidden", "foo.hidden"));
    }

    #[test]
    fn trailing_empty_star_rejected_at_boundaries() {
        assert!(!matches("a/b/*", "a/b/"));
        assert!(!matches("*", ""));
        assert!(matches("a*", "a"));
        assert!(matches("a/*b", "a/b"));
    }

    #[test]
    fn trailing_slash_forgiveness() {
        assert!(matches("a/*", "a/b/"));
        assert!(matches("a/b", "a/b/"));
        assert!(matches("a/b", "a/b//"));
        assert!(!matches("a/b/*", "a/b/"));
    }

    #[test]
    fn question_mark() {
        assert!(matches("?oo", "foo"));
        assert!(!matches("?oo", "/oo"));
        assert!(!matches("f?o", "fo"));
        // The backward sweep does not police dots.
        assert!(matches("?foo", ".foo"));
    }

    #[test]
    fn classes() {
        assert!(matches("[!abc]", "d"));
        assert!(!matches("[!abc]", "a"));
        assert!(matches("[a-c]x", "bx"));
        assert!(!matches("[a-c]x", "dx"));
        // A class never matches a separator.
        assert!(!matches("a[/]b", "a/b"));
    }

    #[test]
    fn case_folding() {
        let options = MatchOptions {
            ignore_case: true,
            ..Default::default()
        };
        assert!(matches_with("*.CS", "foo.cs", &options));
        assert!(matches_with("[A-Z]x", "bX", &options));
        assert!(!matches("*.CS", "foo.cs"));
    }

    #[test]
    fn windows_separators_in_input() {
        let options = MatchOptions {
            allow_windows_paths: true,
            ..Default::default()
        };
        assert!(matches_with("a/b", r"a\b", &options));
        assert!(matches_with("a/**/b", r"a\x\b", &options));
        assert!(!matches("a/b", r"a\b"));
    }

    #[test]
    fn multiple_wildcards() {
        assert!(matches("*a*b", "xaYb"));
        assert!(matches("**/x/*.cs", "p/q/x/y.cs"));
        assert!(!matches("**/x/*.cs", "p/q/x/y/z.cs"));
        // `**` followed by a later `*` requires retrying candidates.
        assert!(matches("**/*.cs", "a/b.cs"));
        assert!(matches("**/*.cs", "b.cs"));
        assert!(!matches("**/*.cs", "a/b.rs"));
    }

    #[test]
    fn deterministic_and_stateless() {
        let options = MatchOptions::default();
        let case = compile("a/**/b", &options);
        let hit: Vec<char> = "a/x/b".chars().collect();
        let miss: Vec<char> = "a/xb".chars().collect();
        for _ in 0..3 {
            assert!(super::is_match(&case, &hit, &options));
            assert!(!super::is_match(&case, &miss, &options));
        }
    }
}
