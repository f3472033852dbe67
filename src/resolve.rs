//! The configuration resolver.
//!
//! Resolution walks from the target's directory to the filesystem root
//! collecting configuration files, stops after a file marked `root = true`,
//! then folds the sections of the outermost file first and the innermost
//! last, so deeper files and later sections win per key.

use indexmap::IndexMap;
use semver::Version;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::ini::IniFile;
use crate::properties::Properties;
use crate::{CandidatePath, Glob, MatchOptions};

/// The file name searched for during the walk.
pub const CONFIG_FILE_NAME: &str = ".editorconfig";

/// Inputs of a resolve call other than the target itself.
#[derive(Clone, Debug, Default)]
pub struct ResolveOptions {
    /// Searches for this file name instead of [`CONFIG_FILE_NAME`].
    pub config_file_name: Option<String>,
    /// Behave as this specification version; behaviors introduced later
    /// are suppressed.
    pub develop_version: Option<Version>,
}

/// Describes failures while reading configuration files.
///
/// Resolution itself cannot fail: patterns are literalised rather than
/// rejected and unrecognizable lines are skipped. Only the filesystem can
/// object.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("target `{}` has no parent directory", .path.display())]
    InvalidTarget { path: PathBuf },
}

/// Resolves the properties that apply to a target path.
///
/// The target need not exist; resolution is lexical over its absolute
/// path. Missing configuration files are skipped, unreadable ones are
/// reported.
pub fn resolve(
    target: impl AsRef<Path>,
    options: &ResolveOptions,
) -> Result<Properties, ResolveError> {
    let target = absolute(target.as_ref())?;
    let directory = target
        .parent()
        .ok_or_else(|| ResolveError::InvalidTarget {
            path: target.clone(),
        })?
        .to_path_buf();
    let file_name = options
        .config_file_name
        .as_deref()
        .unwrap_or(CONFIG_FILE_NAME);
    let mut files = Vec::new();
    for ancestor in directory.ancestors() {
        let path = ancestor.join(file_name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => return Err(ResolveError::Io { path, source }),
        };
        let file = IniFile::parse(path, &contents);
        debug!(
            path = %file.path().display(),
            is_root = file.is_root(),
            sections = file.sections().len(),
            "collected configuration file",
        );
        let is_root = file.is_root();
        files.push(file);
        if is_root {
            break;
        }
    }
    // Outermost first: later contributions overwrite earlier ones.
    files.reverse();
    let candidate = CandidatePath::from(target.as_path()).into_owned();
    let glob_options = MatchOptions {
        dot: true,
        allow_windows_paths: true,
        ..Default::default()
    };
    let mut raw: IndexMap<String, String> = IndexMap::new();
    for file in &files {
        let directory = forward_slashes(file.directory());
        for section in file.sections() {
            let pattern = qualify(&directory, section.name());
            if Glob::new(&pattern, glob_options).is_match(candidate.clone()) {
                debug!(
                    section = section.name(),
                    path = %file.path().display(),
                    "section applies",
                );
                for (key, value) in section.properties() {
                    raw.insert(key.to_lowercase(), value.to_owned());
                }
            }
        }
    }
    Ok(Properties::from_raw(raw, options.develop_version.as_ref()))
}

fn absolute(target: &Path) -> Result<PathBuf, ResolveError> {
    if target.is_absolute() {
        Ok(target.to_path_buf())
    }
    else {
        let current = env::current_dir().map_err(|source| ResolveError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(current.join(target))
    }
}

/// Anchors a section pattern: a pattern containing a separator is relative
/// to the file's directory; a bare pattern matches at any depth below it.
fn qualify(directory: &str, pattern: &str) -> String {
    let directory = directory.trim_end_matches('/');
    if pattern.contains('/') {
        format!("{}/{}", directory, pattern.trim_start_matches('/'))
    }
    else {
        format!("{}/**/{}", directory, pattern)
    }
}

fn forward_slashes(path: &Path) -> String {
    let text = CandidatePath::from(path);
    if cfg!(windows) {
        text.as_ref().replace('\\', "/")
    }
    else {
        text.as_ref().to_owned()
    }
}
