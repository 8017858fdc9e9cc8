//! `@include "pattern"` expansion at the token level.
//!
//! Each included file is tokenized on its own and its tokens are spliced
//! in place of the directive, recursively, before parsing starts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::error::{ConfigError, Result};
use crate::tokenizer::{Token, TokenKind, Tokenizer};

/// Deepest `@include` nesting accepted before the chain is assumed to be a cycle.
pub const MAX_INCLUDE_DEPTH: usize = 10;

const DIRECTIVE: &str = "@include";

pub struct IncludeResolver<'a> {
    include_dir: &'a Path,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(include_dir: &'a Path) -> Self {
        IncludeResolver { include_dir }
    }

    /// Read a file and return its fully expanded token stream.
    pub fn read_file(&self, path: &Path, depth: usize) -> Result<Vec<Token>> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::file_io(path, e))?;
        debug!(file = %path.display(), depth, "reading config file");
        self.expand_source(&text, Some(Arc::from(path)), depth)
    }

    /// Tokenize `text`, replacing every include directive by the tokens of
    /// the files it names.
    pub fn expand_source(
        &self,
        text: &str,
        file: Option<Arc<Path>>,
        depth: usize,
    ) -> Result<Vec<Token>> {
        let mut tokens = Tokenizer::new(text, file);
        let mut out = Vec::new();
        while let Some(token) = tokens.next() {
            let token = token?;
            if !token.is_word(DIRECTIVE) {
                out.push(token);
                continue;
            }
            let target = match tokens.next() {
                Some(target) => target?,
                None => return Err(token.error_after("unexpected end of file")),
            };
            if target.kind != TokenKind::Str {
                return Err(target.error(format!(
                    "expected a quoted file name after {}, found {}",
                    DIRECTIVE,
                    target.display()
                )));
            }
            if depth >= MAX_INCLUDE_DEPTH {
                return Err(token.error(format!(
                    "includes nested deeper than {} levels",
                    MAX_INCLUDE_DEPTH
                )));
            }
            for path in self.matching_files(&target)? {
                out.extend(self.read_file(&path, depth + 1)?);
            }
        }
        trace!(tokens = out.len(), depth, "expanded token stream");
        Ok(out)
    }

    /// Files named by an include target. The last path segment is a
    /// pattern matched against the entries of its directory.
    fn matching_files(&self, target: &Token) -> Result<Vec<PathBuf>> {
        if target.text.is_empty() {
            return Err(target.error("empty include file name"));
        }
        let full = construct_path(&target.text, self.include_dir);
        let full = full.to_string_lossy().into_owned();

        let Some((dir, name)) = full.rsplit_once('/') else {
            return Ok(vec![PathBuf::from(full)]);
        };
        if name.is_empty() {
            return Err(ConfigError::file_io(
                &full,
                io::Error::new(io::ErrorKind::NotFound, "include names a directory"),
            ));
        }
        let dir = if dir.is_empty() { "/" } else { dir };
        let pattern = FilePattern::new(name);

        let entries = fs::read_dir(dir).map_err(|e| ConfigError::file_io(dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::file_io(dir, e))?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if path.is_file() && pattern.matches(&file_name) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            warn!(pattern = %full, "include matched no files");
        } else {
            debug!(pattern = %full, count = files.len(), "include matched files");
        }
        Ok(files)
    }
}

/// Absolute names are used as given, relative ones are joined to `include_dir`.
pub fn construct_path(name: &str, include_dir: &Path) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        include_dir.join(path)
    }
}

/// A file name pattern. A name matches when it equals the pattern, matches
/// it as an anchored regex, or matches it as a shell glob (`*.cfg`, `[ab].cfg`).
struct FilePattern {
    literal: String,
    regex: Option<Regex>,
    glob: Option<glob::Pattern>,
}

impl FilePattern {
    fn new(name: &str) -> Self {
        FilePattern {
            literal: name.to_string(),
            regex: Regex::new(&format!("^{}$", name)).ok(),
            glob: glob::Pattern::new(name).ok(),
        }
    }

    fn matches(&self, file_name: &str) -> bool {
        file_name == self.literal
            || self.glob.as_ref().is_some_and(|g| g.matches(file_name))
            || self.regex.as_ref().is_some_and(|r| r.is_match(file_name))
    }
}
