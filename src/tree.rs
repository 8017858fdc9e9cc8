use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A scalar value held by a leaf setting.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f32),
    String(String),
}

impl Scalar {
    pub fn setting_type(&self) -> SettingType {
        match self {
            Scalar::Bool(_) => SettingType::Bool,
            Scalar::Int(_) => SettingType::Int,
            Scalar::Int64(_) => SettingType::Int64,
            Scalar::Float(_) => SettingType::Float,
            Scalar::String(_) => SettingType::String,
        }
    }

    /// The zero value of a scalar type, `None` for container types.
    pub fn default_for(ty: SettingType) -> Option<Scalar> {
        match ty {
            SettingType::Bool => Some(Scalar::Bool(false)),
            SettingType::Int => Some(Scalar::Int(0)),
            SettingType::Int64 => Some(Scalar::Int64(0)),
            SettingType::Float => Some(Scalar::Float(0.0)),
            SettingType::String => Some(Scalar::String(String::new())),
            SettingType::Array | SettingType::List | SettingType::Group => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int64(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v)
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

/// The fixed kind of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingType {
    Int,
    Int64,
    Float,
    String,
    Bool,
    Array,
    List,
    Group,
}

impl SettingType {
    pub fn is_scalar(self) -> bool {
        !self.is_aggregate()
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, SettingType::Array | SettingType::List | SettingType::Group)
    }

    pub fn is_number(self) -> bool {
        matches!(self, SettingType::Int | SettingType::Int64 | SettingType::Float)
    }
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingType::Int => "int",
            SettingType::Int64 => "int64",
            SettingType::Float => "float",
            SettingType::String => "string",
            SettingType::Bool => "bool",
            SettingType::Array => "array",
            SettingType::List => "list",
            SettingType::Group => "group",
        };
        f.write_str(name)
    }
}

/// Printing hint for integer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Default,
    Hex,
}

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Where the parser found a setting.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub file: Option<Arc<Path>>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// Children keyed by name, iterated in key order.
    Group(BTreeMap<String, NodeId>),
    List(Vec<NodeId>),
    /// Children are scalars of one shared type.
    Array(Vec<NodeId>),
    Scalar { value: Scalar, format: Format },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub name: String,
    /// Non-owning back-reference; the parent's container owns this node.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub source: Option<SourceLocation>,
}

impl Node {
    pub fn setting_type(&self) -> SettingType {
        match &self.kind {
            NodeKind::Group(_) => SettingType::Group,
            NodeKind::List(_) => SettingType::List,
            NodeKind::Array(_) => SettingType::Array,
            NodeKind::Scalar { value, .. } => value.setting_type(),
        }
    }

    /// Children in container order (key order for groups).
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Group(map) => map.values().copied().collect(),
            NodeKind::List(items) | NodeKind::Array(items) => items.clone(),
            NodeKind::Scalar { .. } => Vec::new(),
        }
    }
}

/// Arena holding every node of one document. Slot 0 is the root group.
///
/// Containers own their children through the ids they store; removing a
/// child frees its whole subtree. Cloning the arena clones the document
/// with all parent links intact, since links are plain indices.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
}

impl Tree {
    pub fn new() -> Self {
        Tree {
            nodes: vec![Some(Node {
                name: String::new(),
                parent: None,
                kind: NodeKind::Group(BTreeMap::new()),
                source: None,
            })],
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => unreachable!("stale node id {:?}", id),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => unreachable!("stale node id {:?}", id),
        }
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Allocate a detached node of the given type with its zero value.
    pub(crate) fn alloc(&mut self, name: String, ty: SettingType) -> NodeId {
        let kind = match ty {
            SettingType::Group => NodeKind::Group(BTreeMap::new()),
            SettingType::List => NodeKind::List(Vec::new()),
            SettingType::Array => NodeKind::Array(Vec::new()),
            scalar => NodeKind::Scalar {
                value: Scalar::default_for(scalar).unwrap_or(Scalar::Int(0)),
                format: Format::Default,
            },
        };
        self.alloc_node(Node {
            name,
            parent: None,
            kind,
            source: None,
        })
    }

    pub(crate) fn alloc_scalar(&mut self, name: String, value: Scalar, format: Format) -> NodeId {
        self.alloc_node(Node {
            name,
            parent: None,
            kind: NodeKind::Scalar { value, format },
            source: None,
        })
    }

    fn alloc_node(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Release a detached node and everything below it.
    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes[current.0].take() {
                stack.extend(node.children());
                self.free.push(current.0);
            }
        }
    }

    /// Attach a detached node to `parent`. The caller has already checked
    /// that the container accepts it; this only links.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        let name = self.node(child).name.clone();
        match &mut self.node_mut(parent).kind {
            NodeKind::Group(map) => {
                map.insert(name, child);
            }
            NodeKind::List(items) | NodeKind::Array(items) => items.push(child),
            NodeKind::Scalar { .. } => unreachable!("attach to scalar"),
        }
        self.node_mut(child).parent = Some(parent);
    }

    /// Unlink a child from its parent and free it.
    pub(crate) fn detach_and_free(&mut self, parent: NodeId, child: NodeId) {
        match &mut self.node_mut(parent).kind {
            NodeKind::Group(map) => map.retain(|_, id| *id != child),
            NodeKind::List(items) | NodeKind::Array(items) => items.retain(|id| *id != child),
            NodeKind::Scalar { .. } => {}
        }
        self.free_subtree(child);
    }

    /// Deep-copy the subtree at `src` in `other` into this arena as a
    /// detached node. Parent links of the copy point at the new nodes.
    pub(crate) fn copy_from(&mut self, other: &Tree, src: NodeId) -> NodeId {
        let source = other.node(src);
        let id = self.alloc_node(Node {
            name: source.name.clone(),
            parent: None,
            kind: match &source.kind {
                NodeKind::Group(_) => NodeKind::Group(BTreeMap::new()),
                NodeKind::List(_) => NodeKind::List(Vec::new()),
                NodeKind::Array(_) => NodeKind::Array(Vec::new()),
                NodeKind::Scalar { value, format } => NodeKind::Scalar {
                    value: value.clone(),
                    format: *format,
                },
            },
            source: source.source.clone(),
        });
        for child in source.children() {
            let copy = self.copy_from(other, child);
            self.attach(id, copy);
        }
        id
    }

    /// Position of `child` within `parent`'s container.
    pub(crate) fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.node(parent).children().iter().position(|id| *id == child)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
