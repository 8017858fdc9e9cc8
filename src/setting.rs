//! Handles onto settings of a [`Tree`]: navigation, typed reads, mutation.

use std::fmt;
use std::path::Path;

use crate::convert::{convert, FromScalar, UNSUPPORTED};
use crate::error::{ConfigError, Result};
use crate::path::{self, Segment};
use crate::tree::{Format, NodeId, NodeKind, Scalar, SettingType, Tree};

// ── Tree-level accessors ───────────────────────────────────────────

impl Tree {
    /// Dotted path of a node from the root; `[N]` for anonymous elements.
    pub(crate) fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let segment = match self.node(parent).kind {
                NodeKind::Group(_) => self.node(current).name.clone(),
                _ => path::index_segment(self.index_of(parent, current).unwrap_or(0)),
            };
            segments.push(segment);
            current = parent;
        }
        segments.reverse();
        segments.join(".")
    }

    fn join_path(&self, parent: NodeId, leaf: &str) -> String {
        let base = self.path_of(parent);
        if base.is_empty() {
            leaf.to_string()
        } else {
            format!("{}.{}", base, leaf)
        }
    }

    /// Not-found error for a positional miss, carrying the full path.
    fn index_miss(&self, id: NodeId, index: usize) -> ConfigError {
        ConfigError::not_found(self.join_path(id, &path::index_segment(index)))
    }

    /// One navigation step; `[N]` on a group picks the N-th key.
    fn step(&self, id: NodeId, segment: Segment<'_>) -> Option<NodeId> {
        match (segment, &self.node(id).kind) {
            (Segment::Name(name), NodeKind::Group(map)) => map.get(name).copied(),
            (Segment::Name(_), _) => None,
            (Segment::Index(index), _) => self.node(id).children().get(index).copied(),
        }
    }

    /// Resolve `path` relative to `id`. A miss reports the whole path.
    pub(crate) fn resolve(&self, id: NodeId, path: &str) -> Result<NodeId> {
        path::check_path(path)?;
        self.try_resolve(id, path)
            .ok_or_else(|| ConfigError::not_found(path))
    }

    fn try_resolve(&self, id: NodeId, path: &str) -> Option<NodeId> {
        let (local, remote) = path::split_first(path);
        let next = self.step(id, path::segment(local))?;
        match remote {
            Some(rest) => self.try_resolve(next, rest),
            None => Some(next),
        }
    }

    /// Validate an insertion into `parent` and return the name the child
    /// will be stored under. Nothing is mutated.
    pub(crate) fn check_insert(
        &self,
        parent: NodeId,
        name: &str,
        ty: SettingType,
    ) -> Result<String> {
        match &self.node(parent).kind {
            NodeKind::Group(map) => {
                if name.is_empty() {
                    return Err(ConfigError::InvalidArgument(
                        "settings in a group need a name".to_string(),
                    ));
                }
                if map.contains_key(name) {
                    return Err(ConfigError::SettingNameConflict {
                        path: self.join_path(parent, name),
                    });
                }
                Ok(name.to_string())
            }
            NodeKind::List(_) => Ok(String::new()),
            NodeKind::Array(items) => {
                if !ty.is_scalar() {
                    return Err(ConfigError::type_error(
                        self.path_of(parent),
                        "array elements must be scalar values",
                    ));
                }
                if let Some(first) = items.first() {
                    if self.node(*first).setting_type() != ty {
                        return Err(ConfigError::type_error(
                            self.path_of(parent),
                            "array elements must have the same type",
                        ));
                    }
                }
                Ok(String::new())
            }
            NodeKind::Scalar { .. } => Err(ConfigError::OperationNotSupported {
                operation: "add",
                path: self.path_of(parent),
            }),
        }
    }

    /// Checked insert of a fresh child of type `ty`.
    pub(crate) fn insert(&mut self, parent: NodeId, name: &str, ty: SettingType) -> Result<NodeId> {
        let name = self.check_insert(parent, name, ty)?;
        let child = self.alloc(name, ty);
        self.attach(parent, child);
        Ok(child)
    }

    /// Checked insert of a scalar child.
    pub(crate) fn insert_scalar(
        &mut self,
        parent: NodeId,
        name: &str,
        value: Scalar,
        format: Format,
    ) -> Result<NodeId> {
        let name = self.check_insert(parent, name, value.setting_type())?;
        let child = self.alloc_scalar(name, value, format);
        self.attach(parent, child);
        Ok(child)
    }

    fn subtree_eq(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let (left, right) = (self.node(a), other.node(b));
        if left.name != right.name || left.setting_type() != right.setting_type() {
            return false;
        }
        match (&left.kind, &right.kind) {
            (NodeKind::Scalar { value: l, .. }, NodeKind::Scalar { value: r, .. }) => l == r,
            _ => {
                let (lc, rc) = (left.children(), right.children());
                lc.len() == rc.len()
                    && lc
                        .iter()
                        .zip(rc.iter())
                        .all(|(l, r)| self.subtree_eq(*l, other, *r))
            }
        }
    }
}

// ── Read-only handle ────────────────────────────────────────────────

/// A borrowed view of one setting.
#[derive(Clone, Copy)]
pub struct Setting<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> Setting<'a> {
    pub(crate) fn new(tree: &'a Tree, id: NodeId) -> Self {
        Setting { tree, id }
    }

    pub(crate) fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    fn at(&self, id: NodeId) -> Setting<'a> {
        Setting::new(self.tree, id)
    }

    pub fn name(&self) -> &'a str {
        &self.tree.node(self.id).name
    }

    pub fn setting_type(&self) -> SettingType {
        self.tree.node(self.id).setting_type()
    }

    pub fn is_group(&self) -> bool {
        self.setting_type() == SettingType::Group
    }

    pub fn is_list(&self) -> bool {
        self.setting_type() == SettingType::List
    }

    pub fn is_array(&self) -> bool {
        self.setting_type() == SettingType::Array
    }

    pub fn is_aggregate(&self) -> bool {
        self.setting_type().is_aggregate()
    }

    pub fn is_scalar(&self) -> bool {
        self.setting_type().is_scalar()
    }

    pub fn is_number(&self) -> bool {
        self.setting_type().is_number()
    }

    pub fn is_root(&self) -> bool {
        self.tree.node(self.id).parent.is_none()
    }

    /// Number of children; 0 for scalars.
    pub fn len(&self) -> usize {
        match &self.tree.node(self.id).kind {
            NodeKind::Group(map) => map.len(),
            NodeKind::List(items) | NodeKind::Array(items) => items.len(),
            NodeKind::Scalar { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Printing hint; always `Default` for non-integer settings.
    pub fn format(&self) -> Format {
        match &self.tree.node(self.id).kind {
            NodeKind::Scalar { format, .. } => *format,
            _ => Format::Default,
        }
    }

    /// The raw scalar, if this is a scalar setting.
    pub fn scalar(&self) -> Option<&'a Scalar> {
        match &self.tree.node(self.id).kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// File the parser read this setting from.
    pub fn source_file(&self) -> Option<&'a Path> {
        self.tree.node(self.id).source.as_ref()?.file.as_deref()
    }

    /// 1-based line the parser read this setting from.
    pub fn source_line(&self) -> Option<usize> {
        self.tree.node(self.id).source.as_ref().map(|s| s.line)
    }

    /// The enclosing container. The root has none.
    pub fn parent(&self) -> Result<Setting<'a>> {
        self.tree
            .node(self.id)
            .parent
            .map(|id| self.at(id))
            .ok_or_else(|| ConfigError::not_found("parent"))
    }

    /// Position within the parent container, `None` for the root.
    pub fn index(&self) -> Option<usize> {
        let parent = self.tree.node(self.id).parent?;
        self.tree.index_of(parent, self.id)
    }

    /// Dotted path from the root.
    pub fn path(&self) -> String {
        self.tree.path_of(self.id)
    }

    /// Children in container order (key order for groups).
    pub fn children(&self) -> impl Iterator<Item = Setting<'a>> + 'a {
        let tree = self.tree;
        tree.node(self.id)
            .children()
            .into_iter()
            .map(move |id| Setting::new(tree, id))
    }

    /// Child at a position.
    pub fn get(&self, index: usize) -> Result<Setting<'a>> {
        self.tree
            .step(self.id, Segment::Index(index))
            .map(|id| self.at(id))
            .ok_or_else(|| self.tree.index_miss(self.id, index))
    }

    /// Setting addressed by a dotted path relative to this one.
    pub fn lookup(&self, path: &str) -> Result<Setting<'a>> {
        self.tree.resolve(self.id, path).map(|id| self.at(id))
    }

    /// Whether `path` resolves. Malformed paths are still an error.
    pub fn exists(&self, path: &str) -> Result<bool> {
        path::check_path(path)?;
        Ok(self.tree.try_resolve(self.id, path).is_some())
    }

    /// Read this setting as `T` under the scalar conversion rules.
    pub fn value<T: FromScalar>(&self) -> Result<T> {
        let scalar = self
            .scalar()
            .ok_or_else(|| ConfigError::type_error(self.path(), UNSUPPORTED))?;
        T::from_scalar(scalar).map_err(|message| ConfigError::type_error(self.path(), message))
    }

    /// Look up `path` and read it as `T`, swallowing any failure.
    pub fn lookup_value<T: FromScalar>(&self, path: &str) -> Option<T> {
        self.lookup(path).and_then(|s| s.value()).ok()
    }
}

impl PartialEq for Setting<'_> {
    /// Deep comparison of names, types and values; parents are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.tree.subtree_eq(self.id, other.tree, other.id)
    }
}

impl fmt::Debug for Setting<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("path", &self.path())
            .field("type", &self.setting_type())
            .field("value", &self.scalar())
            .field("len", &self.len())
            .finish()
    }
}

// ── Mutable handle ──────────────────────────────────────────────────

/// A mutable borrow of one setting and, through it, its subtree.
pub struct SettingMut<'a> {
    tree: &'a mut Tree,
    id: NodeId,
}

impl<'a> SettingMut<'a> {
    pub(crate) fn new(tree: &'a mut Tree, id: NodeId) -> Self {
        SettingMut { tree, id }
    }

    /// Read-only view of this setting.
    pub fn as_setting(&self) -> Setting<'_> {
        Setting::new(self.tree, self.id)
    }

    pub fn into_setting(self) -> Setting<'a> {
        Setting::new(self.tree, self.id)
    }

    /// Navigate further down, keeping the mutable borrow.
    pub fn lookup_mut(self, path: &str) -> Result<SettingMut<'a>> {
        let id = self.tree.resolve(self.id, path)?;
        Ok(SettingMut::new(self.tree, id))
    }

    pub fn get_mut(self, index: usize) -> Result<SettingMut<'a>> {
        let id = self
            .tree
            .step(self.id, Segment::Index(index))
            .ok_or_else(|| self.tree.index_miss(self.id, index))?;
        Ok(SettingMut::new(self.tree, id))
    }

    pub fn parent_mut(self) -> Result<SettingMut<'a>> {
        let id = self
            .tree
            .node(self.id)
            .parent
            .ok_or_else(|| ConfigError::not_found("parent"))?;
        Ok(SettingMut::new(self.tree, id))
    }

    /// Add a child of type `ty` holding that type's zero value.
    /// List and array children are anonymous, so `name` is ignored there.
    pub fn add(&mut self, name: &str, ty: SettingType) -> Result<SettingMut<'_>> {
        let id = self.tree.insert(self.id, name, ty)?;
        Ok(SettingMut::new(self.tree, id))
    }

    /// Add a scalar child holding `value`. Non-finite floats are rejected.
    pub fn add_value(&mut self, name: &str, value: impl Into<Scalar>) -> Result<SettingMut<'_>> {
        let value = value.into();
        let value = convert(&value, value.setting_type())
            .map_err(|message| ConfigError::type_error(self.tree.path_of(self.id), message))?;
        let id = self
            .tree
            .insert_scalar(self.id, name, value, Format::Default)?;
        Ok(SettingMut::new(self.tree, id))
    }

    /// Deep-copy `other` (usually from another document) in as a child.
    pub fn add_copy(&mut self, other: Setting<'_>) -> Result<SettingMut<'_>> {
        let name = self
            .tree
            .check_insert(self.id, other.name(), other.setting_type())?;
        let id = self.tree.copy_from(other.tree(), other.id());
        self.tree.node_mut(id).name = name;
        self.tree.attach(self.id, id);
        Ok(SettingMut::new(self.tree, id))
    }

    /// Remove the setting at `path` (relative to this one) with its subtree.
    pub fn remove(&mut self, path: &str) -> Result<()> {
        path::check_path(path)?;
        let (parent_path, leaf) = path::split_last(path);
        let parent = match parent_path {
            Some(p) => self
                .tree
                .try_resolve(self.id, p)
                .ok_or_else(|| ConfigError::not_found(path))?,
            None => self.id,
        };
        let child = self
            .tree
            .step(parent, path::segment(leaf))
            .ok_or_else(|| ConfigError::not_found(path))?;
        self.tree.detach_and_free(parent, child);
        Ok(())
    }

    /// Remove the child at `index`; later children shift down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        let child = self
            .tree
            .step(self.id, Segment::Index(index))
            .ok_or_else(|| self.tree.index_miss(self.id, index))?;
        self.tree.detach_and_free(self.id, child);
        Ok(())
    }

    /// Assign a value, converted into this setting's fixed scalar type.
    pub fn set(&mut self, value: impl Into<Scalar>) -> Result<()> {
        let path = self.tree.path_of(self.id);
        match &mut self.tree.node_mut(self.id).kind {
            NodeKind::Scalar { value: current, .. } => {
                *current = convert(&value.into(), current.setting_type())
                    .map_err(|message| ConfigError::type_error(path, message))?;
                Ok(())
            }
            _ => Err(ConfigError::OperationNotSupported {
                operation: "set",
                path,
            }),
        }
    }

    /// Set the printing hint. Only integer settings keep it.
    pub fn set_format(&mut self, new_format: Format) {
        if let NodeKind::Scalar { value, format } = &mut self.tree.node_mut(self.id).kind {
            if matches!(value, Scalar::Int(_) | Scalar::Int64(_)) {
                *format = new_format;
            }
        }
    }
}

impl fmt::Debug for SettingMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_setting(), f)
    }
}
