//! Tree data structures for reference visualization
//!
//! Provides `TreeNode`, built from a [`ReferenceGraph`], and `FlattenedNode`
//! for rendering the tree as a scrollable list in the TUI.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::asset::AssetIdentifier;
use crate::graph::{LinkKind, NodeKind, ReferenceGraph};

/// A node in the reference tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Asset the node stands for
    pub id: AssetIdentifier,
    /// Display title
    pub title: String,
    /// Type line
    pub type_name: String,
    /// Kind of node
    pub kind: NodeKind,
    /// Link from the parent (None for the root)
    pub link: Option<LinkKind>,
    /// Names of fields that point back at the root
    pub back_references: Vec<String>,
    /// Child referencers
    pub children: Vec<TreeNode>,
    /// Whether this node is expanded in the UI
    pub expanded: bool,
    /// Depth in the tree (0 = root)
    pub depth: usize,
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(id: AssetIdentifier, title: String, kind: NodeKind) -> Self {
        Self {
            id,
            title,
            type_name: String::new(),
            kind,
            link: None,
            back_references: Vec::new(),
            children: Vec::new(),
            expanded: false,
            depth: 0,
        }
    }

    /// Builds the tree of a built graph, with the root expanded.
    ///
    /// Nodes reached a second time (self references, cycles) appear as
    /// leaves.
    pub fn from_graph(graph: &ReferenceGraph) -> Option<TreeNode> {
        let root = graph.root_index()?;
        let mut visited = HashSet::new();
        let mut tree = Self::build(graph, root, None, &mut visited)?;
        tree.expanded = true;
        Some(tree)
    }

    fn build(
        graph: &ReferenceGraph,
        index: NodeIndex,
        link: Option<LinkKind>,
        visited: &mut HashSet<NodeIndex>,
    ) -> Option<TreeNode> {
        let node = graph.node(index)?;
        let mut tree = TreeNode::new(node.id.clone(), node.display.title.clone(), node.display.kind);
        tree.type_name = node.display.type_name.clone();
        tree.link = link;
        tree.back_references = node.back_references.iter().map(|r| r.field.clone()).collect();

        if visited.insert(index) {
            for (child, category) in graph.visual_children(index) {
                if let Some(child_tree) = Self::build(graph, child, Some(category.kind()), visited) {
                    tree.add_child(child_tree);
                }
            }
        }
        Some(tree)
    }

    /// Add a child node
    pub fn add_child(&mut self, mut child: TreeNode) {
        child.set_depth(self.depth + 1);
        self.children.push(child);
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            child.set_depth(depth + 1);
        }
    }

    /// Toggle the expanded state
    pub fn toggle_expanded(&mut self) {
        if !self.children.is_empty() {
            self.expanded = !self.expanded;
        }
    }

    /// Check if this node has children
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Flatten the tree into a list for rendering
    ///
    /// Only includes nodes that are visible (i.e., all ancestors are expanded)
    pub fn flatten(&self) -> Vec<FlattenedNode> {
        let mut result = Vec::new();
        self.flatten_recursive(&mut result, true);
        result
    }

    fn flatten_recursive(&self, result: &mut Vec<FlattenedNode>, is_last: bool) {
        result.push(FlattenedNode {
            id: self.id.clone(),
            title: self.title.clone(),
            type_name: self.type_name.clone(),
            kind: self.kind,
            link: self.link,
            back_reference_count: self.back_references.len(),
            depth: self.depth,
            is_expanded: self.expanded,
            has_children: self.has_children(),
            is_last_child: is_last,
        });

        if self.expanded {
            let child_count = self.children.len();
            for (i, child) in self.children.iter().enumerate() {
                child.flatten_recursive(result, i == child_count - 1);
            }
        }
    }

    /// Find a node at a given flattened index and toggle its expansion
    ///
    /// Returns true if the toggle was successful
    pub fn toggle_at_index(&mut self, target_index: usize) -> bool {
        let mut current_index = 0;
        self.toggle_at_index_recursive(target_index, &mut current_index)
    }

    fn toggle_at_index_recursive(&mut self, target_index: usize, current_index: &mut usize) -> bool {
        if *current_index == target_index {
            self.toggle_expanded();
            return true;
        }
        *current_index += 1;

        if self.expanded {
            for child in &mut self.children {
                if child.toggle_at_index_recursive(target_index, current_index) {
                    return true;
                }
            }
        }
        false
    }
}

/// A flattened representation of a tree node for rendering
#[derive(Debug, Clone)]
pub struct FlattenedNode {
    /// Asset the row stands for
    pub id: AssetIdentifier,
    /// Display title
    pub title: String,
    /// Type line
    pub type_name: String,
    /// Kind of node
    pub kind: NodeKind,
    /// Link from the parent
    pub link: Option<LinkKind>,
    /// Number of fields pointing back at the root
    pub back_reference_count: usize,
    /// Depth in the tree
    pub depth: usize,
    /// Whether this node is currently expanded
    pub is_expanded: bool,
    /// Whether this node has children
    pub has_children: bool,
    /// Whether this is the last child of its parent
    pub is_last_child: bool,
}

impl FlattenedNode {
    /// Get the expansion indicator character
    pub fn expansion_indicator(&self) -> &'static str {
        if !self.has_children {
            "  "
        } else if self.is_expanded {
            "▼ "
        } else {
            "▶ "
        }
    }

    /// Text searched by the filter: title and identifier.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.id)
    }
}
