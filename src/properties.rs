//! The resolved property map and its strongly-typed projections.
//!
//! The resolver accumulates raw key-value pairs; normalization lower-cases
//! keys (and the values of recognized keys), strips the `root` marker,
//! drops empty entries, applies the `indent_style = tab` inference, and
//! computes one typed projection per recognized key. A recognized key whose
//! value does not parse is reported as bogus; the raw pair survives.

use indexmap::IndexMap;
use semver::Version;
use std::fmt::{self, Display, Formatter};

/// Keys with lower-cased values and typed projections.
const RECOGNIZED_KEYS: &[&str] = &[
    "root",
    "indent_style",
    "indent_size",
    "tab_width",
    "end_of_line",
    "charset",
    "trim_trailing_whitespace",
    "insert_final_newline",
    "max_line_length",
];

/// The `indent_size = tab` inference applies from this specification
/// version on.
fn infers_indent_size(develop_version: Option<&Version>) -> bool {
    develop_version.map_or(true, |version| *version >= Version::new(0, 9, 0))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndentStyle {
    Tab,
    Space,
}

impl Display for IndentStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndentStyle::Tab => "tab",
            IndentStyle::Space => "space",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndentSize {
    /// The literal value `tab`: indentation is one tab, sized by
    /// `tab_width`.
    UseTabWidth,
    Columns(u32),
}

impl Display for IndentSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IndentSize::UseTabWidth => f.write_str("tab"),
            IndentSize::Columns(columns) => write!(f, "{}", columns),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndOfLine {
    Lf,
    Cr,
    CrLf,
}

impl Display for EndOfLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EndOfLine::Lf => "lf",
            EndOfLine::Cr => "cr",
            EndOfLine::CrLf => "crlf",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Charset {
    Latin1,
    Utf8,
    Utf8Bom,
    Utf16Be,
    Utf16Le,
}

impl Display for Charset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Charset::Latin1 => "latin1",
            Charset::Utf8 => "utf-8",
            Charset::Utf8Bom => "utf-8-bom",
            Charset::Utf16Be => "utf-16be",
            Charset::Utf16Le => "utf-16le",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MaxLineLength {
    Off,
    Columns(u32),
}

impl Display for MaxLineLength {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MaxLineLength::Off => f.write_str("off"),
            MaxLineLength::Columns(columns) => write!(f, "{}", columns),
        }
    }
}

fn parse_indent_style(value: &str) -> Option<IndentStyle> {
    match value {
        "tab" => Some(IndentStyle::Tab),
        "space" => Some(IndentStyle::Space),
        _ => None,
    }
}

fn parse_indent_size(value: &str) -> Option<IndentSize> {
    if value == "tab" {
        return Some(IndentSize::UseTabWidth);
    }
    positive(value).map(IndentSize::Columns)
}

fn parse_end_of_line(value: &str) -> Option<EndOfLine> {
    match value {
        "lf" => Some(EndOfLine::Lf),
        "cr" => Some(EndOfLine::Cr),
        "crlf" => Some(EndOfLine::CrLf),
        _ => None,
    }
}

fn parse_charset(value: &str) -> Option<Charset> {
    match value {
        "latin1" => Some(Charset::Latin1),
        "utf-8" => Some(Charset::Utf8),
        "utf-8-bom" => Some(Charset::Utf8Bom),
        "utf-16be" => Some(Charset::Utf16Be),
        "utf-16le" => Some(Charset::Utf16Le),
        _ => None,
    }
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_max_line_length(value: &str) -> Option<MaxLineLength> {
    if value == "off" {
        return Some(MaxLineLength::Off);
    }
    positive(value).map(MaxLineLength::Columns)
}

fn positive(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|&columns| columns > 0)
}

/// The normalized result of a resolve call. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    map: IndexMap<String, String>,
    bogus: Vec<String>,
    indent_style: Option<IndentStyle>,
    indent_size: Option<IndentSize>,
    tab_width: Option<u32>,
    end_of_line: Option<EndOfLine>,
    charset: Option<Charset>,
    trim_trailing_whitespace: Option<bool>,
    insert_final_newline: Option<bool>,
    max_line_length: Option<MaxLineLength>,
}

impl Properties {
    /// Normalizes the accumulated raw pairs.
    pub(crate) fn from_raw(
        raw: IndexMap<String, String>,
        develop_version: Option<&Version>,
    ) -> Self {
        let mut map = IndexMap::with_capacity(raw.len());
        for (key, value) in raw {
            let key = key.to_lowercase();
            if key.is_empty() || value.is_empty() || key == "root" {
                continue;
            }
            let value = if RECOGNIZED_KEYS.contains(&key.as_str()) {
                value.to_lowercase()
            }
            else {
                value
            };
            map.insert(key, value);
        }
        if map.get("indent_style").map(String::as_str) == Some("tab")
            && !map.contains_key("indent_size")
            && infers_indent_size(develop_version)
        {
            map.insert("indent_size".to_owned(), "tab".to_owned());
        }
        let mut properties = Properties {
            map,
            ..Default::default()
        };
        properties.project();
        properties
    }

    fn project(&mut self) {
        let entries: Vec<(String, String)> = self
            .map
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, value) in entries {
            let parsed = match key.as_str() {
                "indent_style" => {
                    self.indent_style = parse_indent_style(&value);
                    self.indent_style.is_some()
                },
                "indent_size" => {
                    self.indent_size = parse_indent_size(&value);
                    self.indent_size.is_some()
                },
                "tab_width" => {
                    self.tab_width = positive(&value);
                    self.tab_width.is_some()
                },
                "end_of_line" => {
                    self.end_of_line = parse_end_of_line(&value);
                    self.end_of_line.is_some()
                },
                "charset" => {
                    self.charset = parse_charset(&value);
                    self.charset.is_some()
                },
                "trim_trailing_whitespace" => {
                    self.trim_trailing_whitespace = parse_boolean(&value);
                    self.trim_trailing_whitespace.is_some()
                },
                "insert_final_newline" => {
                    self.insert_final_newline = parse_boolean(&value);
                    self.insert_final_newline.is_some()
                },
                "max_line_length" => {
                    self.max_line_length = parse_max_line_length(&value);
                    self.max_line_length.is_some()
                },
                // Unrecognized keys pass through verbatim.
                _ => true,
            };
            if !parsed {
                self.bogus.push(key);
            }
        }
    }

    /// The normalized key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Recognized keys whose values failed to parse. The raw pairs are
    /// still present in the map.
    pub fn bogus_keys(&self) -> &[String] {
        &self.bogus
    }

    pub fn indent_style(&self) -> Option<IndentStyle> {
        self.indent_style
    }

    pub fn indent_size(&self) -> Option<IndentSize> {
        self.indent_size
    }

    pub fn tab_width(&self) -> Option<u32> {
        self.tab_width
    }

    pub fn end_of_line(&self) -> Option<EndOfLine> {
        self.end_of_line
    }

    pub fn charset(&self) -> Option<Charset> {
        self.charset
    }

    pub fn trim_trailing_whitespace(&self) -> Option<bool> {
        self.trim_trailing_whitespace
    }

    pub fn insert_final_newline(&self) -> Option<bool> {
        self.insert_final_newline
    }

    pub fn max_line_length(&self) -> Option<MaxLineLength> {
        self.max_line_length
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use semver::Version;

    use crate::properties::{Charset, EndOfLine, IndentSize, IndentStyle, Properties};

    fn raw(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|&(key, value)| (key.to_owned(), value.to_owned()))
            .collect()
    }

    #[test]
    fn keys_and_recognized_values_are_lowercased() {
        let properties = Properties::from_raw(
            raw(&[("Indent_Style", "SPACE"), ("custom_Key", "KeepCase")]),
            None,
        );
        assert_eq!(properties.get("indent_style"), Some("space"));
        assert_eq!(properties.indent_style(), Some(IndentStyle::Space));
        // Unrecognized values pass through verbatim.
        assert_eq!(properties.get("custom_key"), Some("KeepCase"));
    }

    #[test]
    fn root_and_empty_values_are_stripped() {
        let properties = Properties::from_raw(raw(&[("root", "true"), ("charset", "")]), None);
        assert!(properties.is_empty());
    }

    #[test]
    fn tab_indent_infers_indent_size() {
        let properties = Properties::from_raw(raw(&[("indent_style", "tab")]), None);
        assert_eq!(properties.get("indent_size"), Some("tab"));
        assert_eq!(properties.indent_size(), Some(IndentSize::UseTabWidth));
        // An explicit size is left alone.
        let explicit =
            Properties::from_raw(raw(&[("indent_style", "tab"), ("indent_size", "8")]), None);
        assert_eq!(explicit.indent_size(), Some(IndentSize::Columns(8)));
    }

    #[test]
    fn inference_is_version_gated() {
        let old = Version::new(0, 8, 0);
        let properties = Properties::from_raw(raw(&[("indent_style", "tab")]), Some(&old));
        assert_eq!(properties.get("indent_size"), None);
        let new = Version::new(0, 9, 0);
        let properties = Properties::from_raw(raw(&[("indent_style", "tab")]), Some(&new));
        assert_eq!(properties.get("indent_size"), Some("tab"));
    }

    #[test]
    fn tab_width_is_not_derived() {
        let properties = Properties::from_raw(raw(&[("indent_size", "4")]), None);
        assert_eq!(properties.indent_size(), Some(IndentSize::Columns(4)));
        assert_eq!(properties.tab_width(), None);
        assert_eq!(properties.get("tab_width"), None);
    }

    #[test]
    fn bogus_values_are_reported_and_preserved() {
        let properties = Properties::from_raw(
            raw(&[("indent_size", "banana"), ("end_of_line", "lfcr")]),
            None,
        );
        assert_eq!(properties.indent_size(), None);
        assert_eq!(properties.end_of_line(), None);
        assert_eq!(properties.bogus_keys(), ["indent_size", "end_of_line"]);
        assert_eq!(properties.get("indent_size"), Some("banana"));
    }

    #[test]
    fn projections() {
        let properties = Properties::from_raw(
            raw(&[
                ("end_of_line", "crlf"),
                ("charset", "utf-8-bom"),
                ("trim_trailing_whitespace", "true"),
                ("insert_final_newline", "false"),
                ("tab_width", "3"),
                ("max_line_length", "off"),
            ]),
            None,
        );
        assert_eq!(properties.end_of_line(), Some(EndOfLine::CrLf));
        assert_eq!(properties.charset(), Some(Charset::Utf8Bom));
        assert_eq!(properties.trim_trailing_whitespace(), Some(true));
        assert_eq!(properties.insert_final_newline(), Some(false));
        assert_eq!(properties.tab_width(), Some(3));
        assert_eq!(
            properties.max_line_length(),
            Some(crate::properties::MaxLineLength::Off),
        );
    }

    #[test]
    fn zero_sizes_are_bogus() {
        let properties =
            Properties::from_raw(raw(&[("indent_size", "0"), ("tab_width", "0")]), None);
        assert_eq!(properties.indent_size(), None);
        assert_eq!(properties.tab_width(), None);
        assert_eq!(properties.bogus_keys().len(), 2);
    }
}
