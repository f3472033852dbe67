//! Pattern tokens and compilation.
//!
//! A brace-expanded pattern string is compiled into a flat sequence of
//! [`Token`]s. Compilation never fails: malformed input such as an
//! unterminated character class is literalised by rewinding the scanner and
//! re-emitting the offending character as plain text.

pub mod expand;

use std::mem;

pub use crate::token::expand::expand;

use crate::MatchOptions;

/// One element of a compiled pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    /// Verbatim text. Never contains a separator.
    Literal(String),
    /// Matches exactly one non-separator character.
    Class(Class),
    /// A component boundary. Adjacent separators in the pattern collapse
    /// into one.
    Separator,
    Wildcard(Wildcard),
}

impl Token {
    fn is_separator(&self) -> bool {
        matches!(self, Token::Separator)
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, Token::Wildcard(_))
    }

    /// The number of input characters the token consumes when it is not a
    /// wildcard. Wildcards contribute nothing to the fixed budget.
    fn fixed_width(&self, previous: &Token) -> usize {
        match self {
            Token::Literal(text) => text.chars().count(),
            Token::Class(_) => 1,
            // A separator directly following `**` is discharged by the
            // zero-segments rule and may consume nothing.
            Token::Separator => match previous {
                Token::Wildcard(wildcard) if wildcard.kind == WildcardKind::Tree => 0,
                _ => 1,
            },
            Token::Wildcard(_) => 0,
        }
    }
}

/// A single-character matcher: `?` or a `[...]` class.
///
/// Ranges are expanded into their member characters at compile time, so
/// matching is a membership test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Class {
    chars: Option<Vec<char>>,
    is_negated: bool,
}

impl Class {
    pub fn any() -> Self {
        Class {
            chars: None,
            is_negated: false,
        }
    }

    pub fn is_negated(&self) -> bool {
        self.is_negated
    }

    /// Tests membership. Separator exclusion is the caller's concern; a
    /// class never sees separator characters.
    pub fn matches(&self, target: char, ignore_case: bool) -> bool {
        let is_member = match self.chars {
            None => return true,
            Some(ref chars) => chars
                .iter()
                .any(|&member| crate::chars_eq(member, target, ignore_case)),
        };
        is_member != self.is_negated
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WildcardKind {
    /// `*`: zero or more characters within one component.
    ZeroOrMore,
    /// `**`: zero or more characters across components.
    Tree,
}

/// A wildcard together with the fast-forward data derived by [`annotate`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Wildcard {
    kind: WildcardKind,
    anchor: Option<usize>,
    anchor_gap: usize,
    fixed_len: usize,
    next_wildcard: Option<usize>,
}

impl Wildcard {
    fn new(kind: WildcardKind) -> Self {
        Wildcard {
            kind,
            anchor: None,
            anchor_gap: 0,
            fixed_len: 0,
            next_wildcard: None,
        }
    }

    pub fn kind(&self) -> WildcardKind {
        self.kind
    }

    /// Index of the nearest following literal or separator with only
    /// single-character elements in between, if any.
    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// The number of single-character elements between the wildcard and its
    /// anchor.
    pub fn anchor_gap(&self) -> usize {
        self.anchor_gap
    }

    /// Total width of the fixed elements that follow the wildcard. Input
    /// shorter than this cannot complete the pattern.
    pub fn fixed_len(&self) -> usize {
        self.fixed_len
    }

    pub fn next_wildcard(&self) -> Option<usize> {
        self.next_wildcard
    }
}

/// One compiled alternation case of a glob.
#[derive(Clone, Debug)]
pub struct Case {
    tokens: Vec<Token>,
    has_separators: bool,
}

impl Case {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// `true` if any separator or tree wildcard appears, in which case
    /// `match_base` does not apply.
    pub fn has_separators(&self) -> bool {
        self.has_separators
    }
}

/// Compiles one brace-expanded pattern string.
pub fn compile(pattern: &str, options: &MatchOptions) -> Case {
    let text: Vec<char> = pattern.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut literal = String::new();
    let mut class: Vec<char> = Vec::new();
    let mut escaping = false;
    let mut in_class = false;
    let mut range = false;
    let mut is_negated = false;
    let mut class_start = 0usize;
    let mut index = 0usize;

    fn flush(tokens: &mut Vec<Token>, literal: &mut String) {
        if !literal.is_empty() {
            tokens.push(Token::Literal(mem::take(literal)));
        }
    }

    // A `-` flagged by `range` has its start already in the buffer; the
    // closing character fills in the rest of the interval.
    fn push_class(class: &mut Vec<char>, range: &mut bool, character: char) {
        if mem::take(range) {
            if let Some(&start) = class.last() {
                for code in (start as u32 + 1)..=(character as u32) {
                    if let Some(member) = char::from_u32(code) {
                        class.push(member);
                    }
                }
                return;
            }
        }
        class.push(character);
    }

    'scan: loop {
        while index < text.len() {
            let character = text[index];
            if escaping {
                escaping = false;
                // An escaped separator is still a separator; anything else
                // is plain text.
                if character != '/' {
                    if in_class {
                        push_class(&mut class, &mut range, character);
                    }
                    else {
                        literal.push(character);
                    }
                    index += 1;
                    continue;
                }
            }
            match character {
                '\\' => {
                    escaping = true;
                },
                '/' => {
                    if in_class {
                        // A class cannot span components: the `[` becomes
                        // plain text and scanning restarts after it.
                        class.clear();
                        range = false;
                        is_negated = false;
                        in_class = false;
                        literal.push('[');
                        index = class_start + 1;
                        continue;
                    }
                    flush(&mut tokens, &mut literal);
                    if !tokens.last().map_or(false, Token::is_separator) {
                        tokens.push(Token::Separator);
                    }
                },
                '?' => {
                    if in_class {
                        push_class(&mut class, &mut range, character);
                    }
                    else {
                        flush(&mut tokens, &mut literal);
                        tokens.push(Token::Class(Class::any()));
                    }
                },
                '*' => {
                    if in_class {
                        push_class(&mut class, &mut range, character);
                    }
                    else {
                        flush(&mut tokens, &mut literal);
                        // Adjacent asterisks collapse; at most one wildcard
                        // token ever results.
                        if matches!(tokens.last(), Some(Token::Wildcard(_))) {
                            if let Some(Token::Wildcard(wildcard)) = tokens.last_mut() {
                                if wildcard.kind == WildcardKind::ZeroOrMore
                                    && !options.no_globstar
                                {
                                    wildcard.kind = WildcardKind::Tree;
                                }
                            }
                        }
                        else {
                            tokens.push(Token::Wildcard(Wildcard::new(WildcardKind::ZeroOrMore)));
                        }
                    }
                },
                '[' => {
                    if in_class {
                        push_class(&mut class, &mut range, character);
                    }
                    else {
                        flush(&mut tokens, &mut literal);
                        in_class = true;
                        is_negated = false;
                        range = false;
                        class_start = index;
                        class.clear();
                    }
                },
                ']' => {
                    if in_class {
                        let body = class_start + if is_negated { 2 } else { 1 };
                        if index == body {
                            // The first character of a class body is a
                            // member, so `[]]` matches `]`.
                            push_class(&mut class, &mut range, character);
                        }
                        else {
                            tokens.push(Token::Class(Class {
                                chars: Some(mem::take(&mut class)),
                                is_negated,
                            }));
                            in_class = false;
                            is_negated = false;
                            range = false;
                        }
                    }
                    else {
                        literal.push(character);
                    }
                },
                '!' | '^' => {
                    if in_class && index == class_start + 1 {
                        is_negated = true;
                    }
                    else if in_class {
                        push_class(&mut class, &mut range, character);
                    }
                    else {
                        literal.push(character);
                    }
                },
                '-' => {
                    if in_class {
                        let body = class_start + if is_negated { 2 } else { 1 };
                        let at_start = index == body || class.is_empty();
                        let at_end = text.get(index + 1) == Some(&']');
                        if range || at_start || at_end {
                            // Edge and repeated hyphens are members.
                            range = false;
                            class.push('-');
                        }
                        else {
                            range = true;
                        }
                    }
                    else {
                        literal.push(character);
                    }
                },
                _ => {
                    if in_class {
                        push_class(&mut class, &mut range, character);
                    }
                    else {
                        literal.push(character);
                    }
                },
            }
            index += 1;
        }
        if in_class {
            // Unterminated class: recover exactly as for a separator.
            class.clear();
            range = false;
            is_negated = false;
            in_class = false;
            escaping = false;
            literal.push('[');
            index = class_start + 1;
            continue 'scan;
        }
        break;
    }
    if escaping {
        literal.push('\\');
    }
    flush(&mut tokens, &mut literal);
    annotate(tokens)
}

/// Derives the per-wildcard fast-forward data and the case-level separator
/// flag. Tokens are immutable afterwards.
fn annotate(mut tokens: Vec<Token>) -> Case {
    let mut annotations = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        if !token.is_wildcard() {
            continue;
        }
        let mut anchor = None;
        let mut anchor_gap = 0;
        for (offset, follower) in tokens[index + 1..].iter().enumerate() {
            match follower {
                Token::Class(_) => anchor_gap += 1,
                Token::Literal(_) | Token::Separator => {
                    anchor = Some(index + 1 + offset);
                    break;
                },
                Token::Wildcard(_) => break,
            }
        }
        if anchor.is_none() {
            anchor_gap = 0;
        }
        let fixed_len = tokens[index + 1..]
            .iter()
            .enumerate()
            .map(|(offset, follower)| follower.fixed_width(&tokens[index + offset]))
            .sum::<usize>();
        let next_wildcard = tokens[index + 1..]
            .iter()
            .position(Token::is_wildcard)
            .map(|offset| index + 1 + offset);
        annotations.push((index, anchor, anchor_gap, fixed_len, next_wildcard));
    }
    for (index, anchor, anchor_gap, fixed_len, next_wildcard) in annotations {
        if let Token::Wildcard(wildcard) = &mut tokens[index] {
            wildcard.anchor = anchor;
            wildcard.anchor_gap = anchor_gap;
            wildcard.fixed_len = fixed_len;
            wildcard.next_wildcard = next_wildcard;
        }
    }
    let has_separators = tokens.iter().any(|token| {
        token.is_separator()
            || matches!(token, Token::Wildcard(wildcard) if wildcard.kind == WildcardKind::Tree)
    });
    Case {
        tokens,
        has_separators,
    }
}

#[cfg(test)]
mod tests {
    use crate::token::{compile, Token, WildcardKind};
    use crate::MatchOptions;

    fn tokens(pattern: &str) -> Vec<Token> {
        compile(pattern, &MatchOptions::default()).tokens
    }

    fn literal(text: &str) -> Token {
        Token::Literal(text.into())
    }

    fn kinds(pattern: &str, options: &MatchOptions) -> Vec<WildcardKind> {
        compile(pattern, options)
            .tokens
            .iter()
            .filter_map(|token| match token {
                Token::Wildcard(wildcard) => Some(wildcard.kind()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn adjacent_asterisks_collapse() {
        assert_eq!(
            kinds("a**b", &MatchOptions::default()),
            vec![WildcardKind::Tree],
        );
        assert_eq!(
            kinds("a***b", &MatchOptions::default()),
            vec![WildcardKind::Tree],
        );
        // No sequence ever compiles to adjacent wildcards.
        for pattern in ["**", "*?*", "a**/*b", "x***y"] {
            let case = compile(pattern, &MatchOptions::default());
            let mut previous_wildcard = false;
            for token in case.tokens() {
                let wildcard = matches!(token, Token::Wildcard(_));
                assert!(!(wildcard && previous_wildcard), "pattern {:?}", pattern);
                previous_wildcard = wildcard;
            }
        }
    }

    #[test]
    fn no_globstar_downgrades_tree() {
        let options = MatchOptions {
            no_globstar: true,
            ..Default::default()
        };
        assert_eq!(kinds("a/**/b", &options), vec![WildcardKind::ZeroOrMore]);
        assert_eq!(kinds("**", &options), vec![WildcardKind::ZeroOrMore]);
    }

    #[test]
    fn separators_collapse() {
        assert_eq!(
            tokens("a//b"),
            vec![literal("a"), Token::Separator, literal("b")],
        );
    }

    #[test]
    fn escapes_are_plain_text() {
        assert_eq!(tokens(r"a\*b"), vec![literal("a*b")]);
        assert_eq!(tokens(r"a\[b"), vec![literal("a[b")]);
        // A trailing backslash is itself.
        assert_eq!(tokens(r"a\"), vec![literal(r"a\")]);
        // An escaped separator is still a separator.
        assert_eq!(
            tokens(r"a\/b"),
            vec![literal("a"), Token::Separator, literal("b")],
        );
    }

    #[test]
    fn class_ranges_expand() {
        let case = compile("[a-d]", &MatchOptions::default());
        match &case.tokens()[0] {
            Token::Class(class) => {
                for member in ['a', 'b', 'c', 'd'] {
                    assert!(class.matches(member, false));
                }
                assert!(!class.matches('e', false));
            },
            other => panic!("unexpected token: {:?}", other),
        }
    }

    #[test]
    fn negated_class() {
        let case = compile("[!abc]", &MatchOptions::default());
        match &case.tokens()[0] {
            Token::Class(class) => {
                assert!(class.is_negated());
                assert!(class.matches('d', false));
                assert!(!class.matches('a', false));
            },
            other => panic!("unexpected token: {:?}", other),
        }
    }

    #[test]
    fn leading_bracket_member() {
        // `]` first in the body is a member, not the terminator.
        let case = compile("[]a]", &MatchOptions::default());
        match &case.tokens()[0] {
            Token::Class(class) => {
                assert!(class.matches(']', false));
                assert!(class.matches('a', false));
            },
            other => panic!("unexpected token: {:?}", other),
        }
    }

    #[test]
    fn edge_hyphens_are_members() {
        let case = compile("[-a-]", &MatchOptions::default());
        match &case.tokens()[0] {
            Token::Class(class) => {
                assert!(class.matches('-', false));
                assert!(class.matches('a', false));
                assert!(!class.matches('b', false));
            },
            other => panic!("unexpected token: {:?}", other),
        }
    }

    #[test]
    fn open_class_rescans_input() {
        // An unterminated class re-emits `[` as text and rescans the input
        // from the following character, so inner pattern characters regain
        // their meaning.
        assert_eq!(
            tokens("a[b/c"),
            vec![
                literal("a"),
                literal("[b"),
                Token::Separator,
                literal("c"),
            ],
        );
        assert_eq!(tokens("[ab"), vec![literal("[ab")]);
        let case = compile("[a*", &MatchOptions::default());
        assert!(
            case.tokens()
                .iter()
                .any(|token| matches!(token, Token::Wildcard(_))),
            "a wildcard inside a recovered class is a wildcard again",
        );
    }

    #[test]
    fn fast_forward_annotations() {
        // `*`, `?`, `?`, `.rs`
        let case = compile("*??.rs", &MatchOptions::default());
        match &case.tokens()[0] {
            Token::Wildcard(wildcard) => {
                assert_eq!(wildcard.anchor(), Some(3));
                assert_eq!(wildcard.anchor_gap(), 2);
                assert_eq!(wildcard.fixed_len(), 5);
                assert_eq!(wildcard.next_wildcard(), None);
            },
            other => panic!("unexpected token: {:?}", other),
        }
    }

    #[test]
    fn skippable_separator_has_no_width() {
        // The separator directly after `**` is free; the trailing literal
        // still counts.
        let case = compile("a/**/b", &MatchOptions::default());
        match &case.tokens()[2] {
            Token::Wildcard(wildcard) => {
                assert_eq!(wildcard.kind(), WildcardKind::Tree);
                assert_eq!(wildcard.fixed_len(), 1);
                assert_eq!(wildcard.anchor(), Some(3));
            },
            other => panic!("unexpected token: {:?}", other),
        }
    }

    #[test]
    fn has_separators_flag() {
        assert!(!compile("*.cs", &MatchOptions::default()).has_separators());
        assert!(compile("a/b", &MatchOptions::default()).has_separators());
        // A tree wildcard is a component boundary even without `/`.
        assert!(compile("**", &MatchOptions::default()).has_separators());
    }
}
