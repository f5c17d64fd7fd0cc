use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::Split;

pub const PATH_DELIMITER: char = ':';

/// Directories of a search path variable, in order. Empty segments are skipped.
///
/// Built on every lookup; nothing is cached between commands.
pub struct SearchPath<'a> {
    segments: Split<'a, char>,
}

impl<'a> SearchPath<'a> {
    pub fn new(path_variable: &'a str) -> Self {
        Self {
            segments: path_variable.split(PATH_DELIMITER),
        }
    }
}

impl<'a> Iterator for SearchPath<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.segments.by_ref().find(|segment| !segment.is_empty())
    }
}

/// Finds the first `dir/command` that exists, walking `path_variable` left to right.
///
/// Existence is all that is checked: a file without execute permission still resolves
/// and fails later when the child tries to run it.
pub fn resolve(command: &str, path_variable: Option<&str>) -> Option<PathBuf> {
    resolve_from(Path::new(""), command, path_variable)
}

/// Like [`resolve`], with relative search path entries taken relative to `base`.
pub fn resolve_from(base: &Path, command: &str, path_variable: Option<&str>) -> Option<PathBuf> {
    let path_variable = path_variable.filter(|path| !path.is_empty())?;
    if command.is_empty() {
        return None;
    }

    for dir in SearchPath::new(path_variable) {
        let candidate = base.join(dir).join(command);
        match fs::metadata(&candidate) {
            Ok(_) => {
                log::debug!("{command}: found {}", candidate.display());
                return Some(candidate);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                log::debug!("{command}: skipping {}: {err}", candidate.display());
            }
        }
    }

    None
}
