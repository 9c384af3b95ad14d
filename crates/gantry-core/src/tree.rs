//! Hierarchical module path tree
//!
//! Organizes repository modules by their filesystem-like paths. Inserting a
//! path nests it under its closest registered ancestor, re-parenting any
//! existing siblings that the new module is itself an ancestor of. Layers are
//! kept sorted so traversal order is deterministic.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TreeError};

/// Attribute marking a module that was tagged historically but no longer
/// exists in the working tree.
pub const TOMBSTONE_ATTRIBUTE: &str = "tombstone";

/// A tree of repository modules keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleTree {
    root_path: Option<PathBuf>,
    nodes: Vec<ModuleNode>,
}

impl ModuleTree {
    /// Create an empty tree with no configured root. Paths are inserted and
    /// looked up verbatim.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree rooted at the given directory. Every inserted
    /// module path must be nested within the root, and node paths are
    /// reported relative to it.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: Some(root.into()),
            nodes: Vec::new(),
        }
    }

    /// The configured root directory, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    /// Insert a module given its path relative to the tree root.
    pub fn insert_rel(&mut self, rel_path: &str, attributes: &[&str]) -> Result<&ModuleNode> {
        let abs = match &self.root_path {
            Some(root) if rel_path == "." || rel_path.is_empty() => root.clone(),
            Some(root) => root.join(rel_path),
            None => PathBuf::from(rel_path),
        };
        self.insert(abs, attributes)
    }

    /// Insert a module into the tree, nesting it within its parent module if
    /// one is registered.
    ///
    /// Returns [`TreeError::OutsideRoot`] if the path is not nested under the
    /// configured root, and [`TreeError::DuplicateModule`] if a node with the
    /// same relative path already exists.
    pub fn insert(&mut self, module_path: impl Into<PathBuf>, attributes: &[&str]) -> Result<&ModuleNode> {
        let abs_path = module_path.into();
        let rel_path = self.relativize(&abs_path)?;

        if self.get(&rel_path).is_some() {
            return Err(TreeError::DuplicateModule(rel_path).into());
        }

        debug!(path = %rel_path, "inserting module");

        // Walk down a layer at a time while some sibling is an ancestor of
        // the new path. The first layer without an ancestor is the insertion
        // layer.
        let mut nodes = &mut self.nodes;
        loop {
            let ancestor = nodes.iter().position(|n| n.ancestor_of(&rel_path));
            match ancestor {
                Some(i) => nodes = &mut nodes[i].children,
                None => break,
            }
        }

        let mut node = ModuleNode {
            abs_path,
            rel_path: rel_path.clone(),
            children: Vec::new(),
            attributes: attributes.iter().map(|a| (*a).to_string()).collect(),
        };

        // Existing siblings that the new node is an ancestor of become its
        // children.
        let mut i = 0;
        while i < nodes.len() {
            if node.ancestor_of(nodes[i].path()) {
                node.children.push(nodes.remove(i));
            } else {
                i += 1;
            }
        }
        node.children.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

        nodes.push(node);
        nodes.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

        match nodes.binary_search_by(|n| n.rel_path.as_str().cmp(&rel_path)) {
            Ok(i) => Ok(&nodes[i]),
            Err(_) => unreachable!("inserted node not found in layer"),
        }
    }

    /// Returns the nearest registered ancestor module for the path, or `None`
    /// if no module is an ancestor of it.
    pub fn search(&self, path: &str) -> Option<&ModuleNode> {
        search_nodes(path, &self.nodes)
    }

    /// Exact-match lookup by relative path.
    pub fn get(&self, path: &str) -> Option<&ModuleNode> {
        search_nodes(path, &self.nodes).filter(|n| n.path() == path)
    }

    /// Depth-first iterator over every node in the tree, each layer visited
    /// in sorted order.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter::new(&self.nodes)
    }

    /// All nodes in depth-first sorted order.
    pub fn list(&self) -> Vec<&ModuleNode> {
        self.iter().collect()
    }

    /// All node paths in depth-first sorted order.
    pub fn list_paths(&self) -> Vec<&str> {
        self.iter().map(ModuleNode::path).collect()
    }

    fn relativize(&self, abs_path: &Path) -> Result<String> {
        let Some(root) = &self.root_path else {
            return Ok(normalize(abs_path));
        };

        let rel = abs_path
            .strip_prefix(root)
            .map_err(|_| TreeError::OutsideRoot {
                path: abs_path.to_path_buf(),
                root: root.clone(),
            })?;
        Ok(normalize(rel))
    }
}

/// Join path components with `/`, mapping an empty path to `.`.
fn normalize(path: &Path) -> String {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(p) => p.to_str(),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// A module node of a [`ModuleTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleNode {
    abs_path: PathBuf,
    rel_path: String,
    children: Vec<ModuleNode>,
    attributes: Vec<String>,
}

impl ModuleNode {
    /// The module path relative to the tree root. When the tree has no
    /// configured root, this is the path the node was inserted with.
    pub fn path(&self) -> &str {
        &self.rel_path
    }

    /// The path the module was inserted into the tree with.
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// Returns whether the node carries the requested attribute.
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }

    /// The attributes associated with this node.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Returns true if this module is an ancestor of the path. Siblings
    /// sharing a common name prefix that is not a directory boundary do not
    /// match.
    pub fn ancestor_of(&self, path: &str) -> bool {
        if self.rel_path == "." || self.rel_path == path {
            return true;
        }
        path.strip_prefix(self.rel_path.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Returns true if this module directly owns the path: it is an ancestor
    /// and no registered sub-module is a closer ancestor.
    pub fn parent_of(&self, path: &str) -> bool {
        self.ancestor_of(path) && self.search(path).is_none()
    }

    /// Returns the sub-module that is the closest ancestor of the path, or
    /// `None` if no sub-module is an ancestor.
    pub fn search(&self, path: &str) -> Option<&ModuleNode> {
        search_nodes(path, &self.children)
    }

    /// Exact-match lookup within this node's subtree, including the node
    /// itself.
    pub fn get(&self, path: &str) -> Option<&ModuleNode> {
        if self.rel_path == path {
            return Some(self);
        }
        search_nodes(path, &self.children).filter(|n| n.path() == path)
    }

    /// Depth-first iterator over the sub-modules of this node. Does not
    /// include the node itself.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter::new(&self.children)
    }

    /// Depth-first list of all sub-modules of this node.
    pub fn list(&self) -> Vec<&ModuleNode> {
        self.iter().collect()
    }
}

/// Walk down the layers, following whichever sibling is an ancestor of the
/// path, returning the deepest match.
fn search_nodes<'a>(path: &str, mut nodes: &'a [ModuleNode]) -> Option<&'a ModuleNode> {
    let mut found = None;

    loop {
        let next = nodes.iter().find(|n| n.ancestor_of(path));
        match next {
            Some(n) => {
                found = Some(n);
                nodes = &n.children;
            }
            None => return found,
        }
    }
}

/// Depth-first iterator over module nodes. Each layer is visited in sorted
/// order; the iterator is finite and bounded by the node count.
#[derive(Debug)]
pub struct TreeIter<'a> {
    stack: Vec<&'a ModuleNode>,
}

impl<'a> TreeIter<'a> {
    fn new(nodes: &'a [ModuleNode]) -> Self {
        // Reverse push ordering keeps the depth-first order intact while
        // popping from the back of the stack.
        Self {
            stack: nodes.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = &'a ModuleNode;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}
