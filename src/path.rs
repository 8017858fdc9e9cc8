//! Dotted setting paths: `a.b.c`, with `[N]` segments for positions.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ConfigError, Result};

/// One step of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Name(&'a str),
    Index(usize),
}

fn index_regex() -> &'static Regex {
    static INDEX: OnceLock<Regex> = OnceLock::new();
    INDEX.get_or_init(|| Regex::new(r"^\[([0-9]+)\]$").expect("index pattern is valid"))
}

/// Reject paths that are empty or start or end with a dot.
pub fn check_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ConfigError::InvalidArgument("path is empty".to_string()));
    }
    if path.starts_with('.') || path.ends_with('.') {
        return Err(ConfigError::InvalidArgument(format!(
            "path '{}' can not begin or end with a dot",
            path
        )));
    }
    Ok(())
}

/// Classify a single segment: `[N]` is positional, anything else a name.
pub fn segment(text: &str) -> Segment<'_> {
    index_regex()
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .map(Segment::Index)
        .unwrap_or(Segment::Name(text))
}

/// Split at the first dot: `("a", Some("b.c"))` for `a.b.c`.
pub fn split_first(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((local, remote)) => (local, Some(remote)),
        None => (path, None),
    }
}

/// Split at the last dot: `(Some("a.b"), "c")` for `a.b.c`.
pub fn split_last(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    }
}

/// Render a position as a path segment.
pub fn index_segment(index: usize) -> String {
    format!("[{}]", index)
}
