//! The configuration file model and parser.
//!
//! Files parse line by line into a pseudo-section named `Global` for
//! preamble lines followed by the named sections in declaration order.
//! Parsing never fails: unrecognizable lines are skipped, though the line
//! counter still advances. Comments are preserved so a consumer can
//! re-render a file.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static COMMENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[#;](.*)$").expect("invalid comment grammar"));
static PROPERTY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9._-]+)\s*[=:]\s*(.*?)\s*(?:[#;].*)?$")
        .expect("invalid property grammar")
});
static SECTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[((?:[^#;]|\\#|\\;)+)\]\s*(?:[#;].*)?$").expect("invalid section grammar")
});

/// The name of the pseudo-section holding lines before the first header.
pub const GLOBAL_SECTION: &str = "Global";

/// One recognized line of a configuration file, with its 1-based number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IniLine {
    SectionHeader { name: String, number: usize },
    Property {
        key: String,
        value: String,
        number: usize,
    },
    Comment { text: String, number: usize },
}

impl IniLine {
    pub fn number(&self) -> usize {
        match *self {
            IniLine::SectionHeader { number, .. }
            | IniLine::Property { number, .. }
            | IniLine::Comment { number, .. } => number,
        }
    }
}

/// A named group of lines.
///
/// Lines are kept in declaration order; property lookup scans them, with
/// the last write to a key winning.
#[derive(Clone, Debug)]
pub struct IniSection {
    name: String,
    lines: Vec<IniLine>,
}

impl IniSection {
    fn new(name: impl Into<String>) -> Self {
        IniSection {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[IniLine] {
        &self.lines
    }

    /// The section's properties in declaration order.
    pub fn properties(&self) -> impl DoubleEndedIterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            IniLine::Property { key, value, .. } => Some((key.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// The value of a key, compared case-insensitively. The last write
    /// wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties()
            .filter(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
            .next_back()
    }
}

/// A parsed configuration file.
#[derive(Clone, Debug)]
pub struct IniFile {
    path: PathBuf,
    directory: PathBuf,
    global: IniSection,
    sections: Vec<IniSection>,
    is_root: bool,
}

impl IniFile {
    /// Parses file contents. Parsing never fails; see the module
    /// documentation for the recovery rules.
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Self {
        let path = path.into();
        let directory = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        let mut global = IniSection::new(GLOBAL_SECTION);
        let mut sections: Vec<IniSection> = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let number = index + 1;
            // The three grammars are disjoint on the first significant
            // character, so headers can be recognized up front.
            if let Some(captures) = SECTION_LINE.captures(line) {
                let mut section = IniSection::new(&captures[1]);
                section.lines.push(IniLine::SectionHeader {
                    name: captures[1].to_owned(),
                    number,
                });
                sections.push(section);
                continue;
            }
            let section = sections.last_mut().unwrap_or(&mut global);
            if let Some(captures) = COMMENT_LINE.captures(line) {
                section.lines.push(IniLine::Comment {
                    text: captures[1].to_owned(),
                    number,
                });
            }
            else if let Some(captures) = PROPERTY_LINE.captures(line) {
                section.lines.push(IniLine::Property {
                    key: captures[1].to_owned(),
                    value: captures[2].to_owned(),
                    number,
                });
            }
            // Anything else is skipped; the line number still advances.
        }
        let is_root = global
            .get("root")
            .and_then(|value| value.to_lowercase().parse::<bool>().ok())
            .unwrap_or(false);
        IniFile {
            path,
            directory,
            global,
            sections,
            is_root,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory the file lives in; section patterns are anchored here.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn global(&self) -> &IniSection {
        &self.global
    }

    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    /// `true` if the preamble sets `root = true`; the directory walk stops
    /// after such a file.
    pub fn is_root(&self) -> bool {
        self.is_root
    }
}
