//! The document: one setting tree plus the directory `@include` names
//! are resolved against.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::convert::FromScalar;
use crate::error::{ConfigError, Result};
use crate::include::{construct_path, IncludeResolver};
use crate::parser;
use crate::setting::{Setting, SettingMut};
use crate::tree::Tree;

#[derive(Debug, Clone)]
pub struct Config {
    tree: Tree,
    include_dir: PathBuf,
}

impl Config {
    /// An empty document resolving includes against the working directory.
    pub fn new() -> Self {
        Config::with_include_dir(".")
    }

    pub fn with_include_dir(include_dir: impl Into<PathBuf>) -> Self {
        Config {
            tree: Tree::new(),
            include_dir: include_dir.into(),
        }
    }

    pub fn include_dir(&self) -> &Path {
        &self.include_dir
    }

    pub fn set_include_dir(&mut self, include_dir: impl Into<PathBuf>) {
        self.include_dir = include_dir.into();
    }

    // ── Reading & Writing ───────────────────────────────────────────

    /// Parse a file into this document, replacing its settings.
    ///
    /// Relative paths are resolved against the include directory. On error
    /// the previous settings are left untouched.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let full = self.resolve_file(path.as_ref())?;
        let tokens = IncludeResolver::new(&self.include_dir).read_file(&full, 0)?;
        self.tree = parser::parse(tokens)?;
        debug!(file = %full.display(), settings = self.tree.node_count(), "parsed config");
        Ok(())
    }

    /// Parse configuration text into this document, replacing its settings.
    pub fn read_str(&mut self, source: &str) -> Result<()> {
        let tokens = IncludeResolver::new(&self.include_dir).expand_source(source, None, 0)?;
        self.tree = parser::parse(tokens)?;
        Ok(())
    }

    /// Write the printed form of the document to `path`, resolved like
    /// [`Config::read_file`] does.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let full = self.resolve_file(path.as_ref())?;
        fs::write(&full, self.to_string()).map_err(|e| ConfigError::file_io(&full, e))?;
        debug!(file = %full.display(), "wrote config");
        Ok(())
    }

    fn resolve_file(&self, path: &Path) -> Result<PathBuf> {
        let name = path.to_string_lossy();
        if name.is_empty() {
            return Err(ConfigError::InvalidArgument("file name is empty".to_string()));
        }
        Ok(construct_path(&name, &self.include_dir))
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// The anonymous top-level group.
    pub fn root(&self) -> Setting<'_> {
        Setting::new(&self.tree, self.tree.root())
    }

    pub fn root_mut(&mut self) -> SettingMut<'_> {
        let root = self.tree.root();
        SettingMut::new(&mut self.tree, root)
    }

    pub fn lookup(&self, path: &str) -> Result<Setting<'_>> {
        self.root().lookup(path)
    }

    pub fn lookup_mut(&mut self, path: &str) -> Result<SettingMut<'_>> {
        self.root_mut().lookup_mut(path)
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        self.root().exists(path)
    }

    pub fn lookup_value<T: FromScalar>(&self, path: &str) -> Option<T> {
        self.root().lookup_value(path)
    }

    pub fn remove(&mut self, path: &str) -> Result<()> {
        self.root_mut().remove(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl PartialEq for Config {
    /// Documents are equal when their settings are; the include directory
    /// is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

/// Parse a file, resolving includes against `include_dir`.
pub fn parse_file(path: impl AsRef<Path>, include_dir: impl Into<PathBuf>) -> Result<Config> {
    let mut config = Config::with_include_dir(include_dir);
    config.read_file(path)?;
    Ok(config)
}

/// Parse configuration text, resolving includes against `include_dir`.
pub fn parse_str(source: &str, include_dir: impl Into<PathBuf>) -> Result<Config> {
    let mut config = Config::with_include_dir(include_dir);
    config.read_str(source)?;
    Ok(config)
}
