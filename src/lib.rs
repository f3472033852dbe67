//! `ecfg` resolves EditorConfig properties for file paths.
//!
//! Given a target path, the resolver walks the directory hierarchy
//! collecting `.editorconfig` files, matches each section's glob pattern
//! against the target, and folds the matching sections into a normalized
//! property map. The pattern language is implemented from scratch: brace
//! alternation with numeric sets, character classes, `*`, `?`, and the
//! component-spanning `**`, with the EditorConfig rules for dotfiles and
//! trailing separators.
//!
//! Matching is a logical operation over path text and does **not** interact
//! with a file system; only [`resolve`] reads configuration files.
//!
//! ```rust
//! use ecfg::{Glob, MatchOptions};
//!
//! let glob = Glob::new("*.{rs,toml}", MatchOptions::default());
//! assert!(glob.is_match("Cargo.toml"));
//! assert!(!glob.is_match(".hidden.rs"));
//! ```
//!
//! ```rust,no_run
//! let properties = ecfg::resolve("src/main.rs", &ecfg::ResolveOptions::default()).unwrap();
//! if let Some(style) = properties.indent_style() { /* ... */ }
//! ```

mod ini;
mod matcher;
mod properties;
mod resolve;
mod token;

use bstr::ByteVec;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt::{self, Debug, Display, Formatter};
use std::path::Path;
use std::str;

pub use crate::ini::{IniFile, IniLine, IniSection};
pub use crate::properties::{
    Charset, EndOfLine, IndentSize, IndentStyle, MaxLineLength, Properties,
};
pub use crate::resolve::{resolve, ResolveError, ResolveOptions, CONFIG_FILE_NAME};
pub use crate::token::expand::expand;

use crate::token::Case;

trait ResultExt<T, E> {
    fn expect_encoding(self) -> T;
}

impl<T, E> ResultExt<T, E> for Result<T, E>
where
    E: Debug,
{
    fn expect_encoding(self) -> T {
        self.expect("unexpected encoding")
    }
}

/// Ordinal character comparison, optionally case-folded.
///
/// Folding operates on characters rather than bytes, so non-ASCII input is
/// compared safely.
pub(crate) fn chars_eq(left: char, right: char, ignore_case: bool) -> bool {
    left == right || (ignore_case && left.to_lowercase().eq(right.to_lowercase()))
}

/// Toggles recognized by the matcher.
///
/// Options are immutable inputs: a [`Glob`] records the options it was
/// compiled under and consults them for every match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MatchOptions {
    /// Treat `\` as a separator in matched paths.
    pub allow_windows_paths: bool,
    /// Replace `\` with `/` in patterns before parsing. This disables
    /// pattern escaping.
    pub allow_windows_paths_in_patterns: bool,
    /// Let `*`, `?`, and `**` match a leading `.` in a component. The `.`
    /// and `..` components never match regardless.
    pub dot: bool,
    /// Report a hit as a match even for negated patterns.
    pub flip_negate: bool,
    /// Case-fold all comparisons.
    pub ignore_case: bool,
    /// Match a separator-free pattern against the basename of the input.
    pub match_base: bool,
    /// Disable brace expansion.
    pub no_brace: bool,
    /// Disable `#`-comment patterns.
    pub no_comment: bool,
    /// Compile `**` as `*`.
    pub no_globstar: bool,
    /// Disable leading-`!` negation.
    pub no_negate: bool,
    /// Make [`Glob::filter`] return the pattern itself instead of an empty
    /// list when nothing matches.
    pub no_null: bool,
}

/// Path text that can be matched against a [`Glob`].
///
/// `CandidatePath`s are always UTF-8 encoded. On some platforms this
/// requires a lossy conversion that uses Unicode replacement codepoints `�`
/// whenever a part of a path cannot be represented as valid UTF-8 (such as
/// Windows). This means that some byte sequences cannot be matched.
#[derive(Clone)]
pub struct CandidatePath<'b> {
    text: Cow<'b, str>,
}

impl<'b> CandidatePath<'b> {
    /// Clones any borrowed data into an owning instance.
    pub fn into_owned(self) -> CandidatePath<'static> {
        CandidatePath {
            text: self.text.into_owned().into(),
        }
    }
}

impl AsRef<str> for CandidatePath<'_> {
    fn as_ref(&self) -> &str {
        self.text.as_ref()
    }
}

impl Debug for CandidatePath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text)
    }
}

impl Display for CandidatePath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl<'b> From<&'b OsStr> for CandidatePath<'b> {
    fn from(text: &'b OsStr) -> Self {
        CandidatePath {
            text: match Vec::from_os_str_lossy(text) {
                Cow::Borrowed(bytes) => str::from_utf8(bytes).expect_encoding().into(),
                Cow::Owned(bytes) => String::from_utf8(bytes).expect_encoding().into(),
            },
        }
    }
}

impl<'b> From<&'b Path> for CandidatePath<'b> {
    fn from(path: &'b Path) -> Self {
        CandidatePath::from(path.as_os_str())
    }
}

impl<'b> From<&'b str> for CandidatePath<'b> {
    fn from(text: &'b str) -> Self {
        CandidatePath { text: text.into() }
    }
}

/// A pattern compiled for matching against path text.
///
/// Construction never fails: malformed groups and classes are literalised
/// rather than rejected, so every string is a pattern.
///
/// # Examples
///
/// ```rust
/// use ecfg::{Glob, MatchOptions};
///
/// let glob = Glob::new("src/**/*.rs", MatchOptions::default());
/// assert!(glob.is_match("src/token/mod.rs"));
/// ```
#[derive(Clone, Debug)]
pub struct Glob {
    pattern: String,
    negate: bool,
    comment: bool,
    empty: bool,
    cases: Vec<Case>,
    options: MatchOptions,
}

impl Glob {
    /// Compiles a glob expression under the given options.
    pub fn new(expression: &str, options: MatchOptions) -> Self {
        let text = if options.allow_windows_paths_in_patterns {
            Cow::Owned(expression.replace('\\', "/"))
        }
        else {
            Cow::Borrowed(expression)
        };
        let comment = !options.no_comment && text.starts_with('#');
        let mut negate = false;
        let mut rest = text.as_ref();
        if !options.no_negate {
            while let Some(stripped) = rest.strip_prefix('!') {
                negate = !negate;
                rest = stripped;
            }
        }
        let empty = rest.is_empty();
        let cases = token::expand(rest, &options)
            .iter()
            .map(|case| token::compile(case, &options))
            .collect();
        Glob {
            pattern: expression.to_owned(),
            negate,
            comment,
            empty,
            cases,
            options,
        }
    }

    /// The expression the glob was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn is_comment(&self) -> bool {
        self.comment
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Returns `true` if the path matches the pattern.
    ///
    /// Comment patterns never match; an empty pattern matches only empty
    /// input. Negation inverts the result unless `flip_negate` is set.
    pub fn is_match<'p>(&self, path: impl Into<CandidatePath<'p>>) -> bool {
        let path = path.into();
        if self.comment {
            return false;
        }
        let input: Vec<char> = path.as_ref().chars().collect();
        let hit = if self.empty {
            input.is_empty()
        }
        else {
            self.cases
                .iter()
                .any(|case| matcher::is_match(case, &input, &self.options))
        };
        if hit {
            self.options.flip_negate || !self.negate
        }
        else {
            !self.options.flip_negate && self.negate
        }
    }

    /// Keeps the paths that match.
    ///
    /// When nothing matches and `no_null` is set, the result is the pattern
    /// itself.
    pub fn filter<'p, I, P>(&self, paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = P>,
        P: Into<CandidatePath<'p>>,
    {
        let mut matched = Vec::new();
        for path in paths {
            let path = path.into();
            if self.is_match(path.clone()) {
                matched.push(path.as_ref().to_owned());
            }
        }
        if matched.is_empty() && self.options.no_null {
            matched.push(self.pattern.clone());
        }
        matched
    }
}

/// Returns `true` if a path matches a glob expression.
///
/// This function directly matches an expression without exposing an
/// intermediate [`Glob`]. Prefer [`Glob::is_match`] if an expression is
/// matched more than once.
pub fn is_match<'p>(
    expression: &str,
    path: impl Into<CandidatePath<'p>>,
    options: MatchOptions,
) -> bool {
    Glob::new(expression, options).is_match(path)
}
