//! Reference graph implementation using petgraph.
//!
//! Holds the node table built from the classified referencer links of a
//! root asset, and the visual graph laid out radially around that root.

use log::{debug, info};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use super::backrefs::{BackReference, BackReferenceProvider};
use super::category::EdgeCategory;
use super::classifier::{sorted_links, Link};
use super::display::NodeDisplay;
use super::layout::{layout_children, LayoutConfig, Point};
use crate::asset::{AssetData, AssetIdentifier, AssetIndex, IndexError, IndexResult, QueryAdapter};

/// Everything known about one identifier visited during a build.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Identifier this entry describes
    pub id: AssetIdentifier,
    /// Metadata resolved from the index; invalid when unresolvable
    pub asset_data: AssetData,
    /// Child links in classifier order
    pub children: Vec<Link>,
    /// Identifiers that list this node as a child
    pub parents: HashSet<AssetIdentifier>,
}

impl NodeInfo {
    /// Creates an entry with no metadata and no links.
    pub fn new(id: AssetIdentifier) -> Self {
        Self {
            id,
            asset_data: AssetData::default(),
            children: Vec::new(),
            parents: HashSet::new(),
        }
    }
}

/// A positioned node of the displayed tree.
#[derive(Debug, Clone)]
pub struct VisualNode {
    /// Identifier the node stands for
    pub id: AssetIdentifier,
    /// Position in graph space
    pub position: Point,
    /// Whether this is the root of the build
    pub is_root: bool,
    /// Title, type line and comment
    pub display: NodeDisplay,
    /// Fields of this node's asset that point back at the root
    pub back_references: Vec<BackReference>,
}

/// The referencer graph of one root asset.
///
/// Every [`rebuild`](ReferenceGraph::rebuild) starts from scratch: the node
/// table and the visual graph from a previous build are discarded.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    root: Option<AssetIdentifier>,
    node_infos: HashMap<AssetIdentifier, NodeInfo>,
    /// Visual nodes, edges point parent -> child
    graph: DiGraph<VisualNode, EdgeCategory>,
    visual_indices: HashMap<AssetIdentifier, NodeIndex>,
}

impl ReferenceGraph {
    /// Creates an empty graph.
    ///
    /// # Example
    ///
    /// ```rust
    /// use refscope::graph::ReferenceGraph;
    ///
    /// let graph = ReferenceGraph::new();
    /// assert!(graph.is_empty());
    /// assert_eq!(graph.node_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the graph around `root`.
    ///
    /// Queries the root's referencers, classifies them, resolves metadata for
    /// every node in one batched call and lays the children out around
    /// `origin`.
    ///
    /// # Arguments
    ///
    /// * `adapter` - Query adapter over the asset index
    /// * `root` - Identifier to explore
    /// * `origin` - Position of the root node
    /// * `layout` - Layout settings
    ///
    /// # Returns
    ///
    /// The index of the root visual node, or [`IndexError::NotReady`] while
    /// the index is still loading. In that case the previous build is left
    /// untouched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use refscope::asset::{AssetIdentifier, DependencyCategory, DependencyProperty, QueryAdapter, SnapshotIndex};
    /// use refscope::graph::{LayoutConfig, Point, ReferenceGraph};
    ///
    /// let mut index = SnapshotIndex::new();
    /// index.add_package("/Game/Crate", Some(10));
    /// index.add_package("/Game/Level", Some(10));
    /// index.add_dependency(
    ///     AssetIdentifier::package("/Game/Level"),
    ///     AssetIdentifier::package("/Game/Crate"),
    ///     DependencyCategory::Package,
    ///     DependencyProperty::HARD | DependencyProperty::GAME,
    /// );
    ///
    /// let mut graph = ReferenceGraph::new();
    /// let adapter = QueryAdapter::new(&index);
    /// graph
    ///     .rebuild(&adapter, &AssetIdentifier::package("/Game/Crate"), Point::default(), &LayoutConfig::default())
    ///     .unwrap();
    ///
    /// assert_eq!(graph.node_count(), 2);
    /// assert_eq!(graph.edge_count(), 1);
    /// ```
    pub fn rebuild<I: AssetIndex + ?Sized>(
        &mut self,
        adapter: &QueryAdapter<'_, I>,
        root: &AssetIdentifier,
        origin: Point,
        layout: &LayoutConfig,
    ) -> IndexResult<NodeIndex> {
        if !adapter.is_ready() {
            return Err(IndexError::NotReady);
        }
        let links = sorted_links(adapter, root)?;

        self.clear();
        self.root = Some(root.clone());
        self.node_infos.insert(root.clone(), NodeInfo::new(root.clone()));

        for (target, category) in links.into_links() {
            self.link(root, target, category);
        }

        self.gather_asset_data(adapter.index());

        let mut path = Vec::new();
        let root_index = self.create_visual_node(root, origin, None, layout, &mut path);

        info!(
            "rebuilt reference graph for {}: {} nodes, {} links",
            root,
            self.graph.node_count(),
            self.graph.edge_count()
        );
        Ok(root_index)
    }

    /// Records `parent -> child` once, creating the child entry if needed.
    fn link(&mut self, parent: &AssetIdentifier, child: AssetIdentifier, category: EdgeCategory) {
        let entry = self
            .node_infos
            .entry(child.clone())
            .or_insert_with(|| NodeInfo::new(child.clone()));

        if !entry.parents.insert(parent.clone()) {
            debug!("skipping duplicate link {} -> {}", parent, child);
            return;
        }
        if let Some(parent_info) = self.node_infos.get_mut(parent) {
            parent_info.children.push((child, category));
        }
    }

    fn gather_asset_data<I: AssetIndex + ?Sized>(&mut self, index: &I) {
        let mut package_names: Vec<String> = self
            .node_infos
            .keys()
            .filter_map(|id| id.resolvable_package().map(str::to_string))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        package_names.sort();

        let resolved = index.assets_for_packages(&package_names);
        for info in self.node_infos.values_mut() {
            info.asset_data = resolved
                .get(&info.id.package_name)
                .cloned()
                .unwrap_or_default();
        }
    }

    fn create_visual_node(
        &mut self,
        id: &AssetIdentifier,
        position: Point,
        parent: Option<(NodeIndex, EdgeCategory)>,
        layout: &LayoutConfig,
        path: &mut Vec<AssetIdentifier>,
    ) -> NodeIndex {
        let existing = self.visual_indices.get(id).copied();
        let index = match existing {
            Some(index) => index,
            None => {
                let info = self.node_infos.get(id);
                let asset_data = info.map(|i| i.asset_data.clone()).unwrap_or_default();
                let node = VisualNode {
                    id: id.clone(),
                    position,
                    is_root: parent.is_none(),
                    display: NodeDisplay::derive(id, &asset_data),
                    back_references: Vec::new(),
                };
                let index = self.graph.add_node(node);
                self.visual_indices.insert(id.clone(), index);
                index
            }
        };

        if let Some((parent_index, category)) = parent {
            self.graph.add_edge(parent_index, index, category);
        }

        // Already placed, or a cycle back into the current path
        if existing.is_some() || path.contains(id) {
            return index;
        }

        let children = self
            .node_infos
            .get(id)
            .map(|info| info.children.clone())
            .unwrap_or_default();
        let positions = layout_children(position, children.len(), layout.fixed_step);

        path.push(id.clone());
        for ((child, category), child_position) in children.into_iter().zip(positions) {
            self.create_visual_node(&child, child_position, Some((index, category)), layout, path);
        }
        path.pop();

        index
    }

    /// Attaches back references towards the root to every non-root node.
    ///
    /// # Returns
    ///
    /// The number of nodes that received at least one back reference.
    pub fn annotate_back_references(&mut self, provider: &dyn BackReferenceProvider) -> usize {
        let Some(root) = self.root.clone() else {
            return 0;
        };

        let mut annotated = 0;
        for node in self.graph.node_weights_mut() {
            if node.is_root {
                continue;
            }
            node.back_references = provider.find_back_references(&node.id, &root);
            if !node.back_references.is_empty() {
                annotated += 1;
            }
        }
        annotated
    }

    /// Discards the node table and the visual graph.
    pub fn clear(&mut self) {
        self.root = None;
        self.node_infos.clear();
        self.graph.clear();
        self.visual_indices.clear();
    }

    /// Root of the last build.
    pub fn root(&self) -> Option<&AssetIdentifier> {
        self.root.as_ref()
    }

    /// Looks up a node table entry.
    pub fn node_info(&self, id: &AssetIdentifier) -> Option<&NodeInfo> {
        self.node_infos.get(id)
    }

    /// Node table entry of the root.
    pub fn root_info(&self) -> Option<&NodeInfo> {
        self.root.as_ref().and_then(|root| self.node_infos.get(root))
    }

    /// Visual index of the root.
    pub fn root_index(&self) -> Option<NodeIndex> {
        self.root.as_ref().and_then(|root| self.visual_indices.get(root).copied())
    }

    /// Looks up the visual node of an identifier.
    pub fn visual_node(&self, id: &AssetIdentifier) -> Option<&VisualNode> {
        self.visual_indices
            .get(id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    /// Visual node at `index`.
    pub fn node(&self, index: NodeIndex) -> Option<&VisualNode> {
        self.graph.node_weight(index)
    }

    /// Visual children of a node with their link categories, in layout order.
    pub fn visual_children(&self, index: NodeIndex) -> Vec<(NodeIndex, EdgeCategory)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (edge.id(), edge.target(), *edge.weight()))
            .collect();
        edges.sort_by_key(|(edge, _, _)| edge.index());
        edges
            .into_iter()
            .map(|(_, target, category)| (target, category))
            .collect()
    }

    /// All visual edges as `(parent, child, category)`, in insertion order.
    pub fn edges(&self) -> Vec<(NodeIndex, NodeIndex, EdgeCategory)> {
        self.graph
            .edge_references()
            .map(|edge| (edge.source(), edge.target(), *edge.weight()))
            .collect()
    }

    /// Visual nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &VisualNode)> {
        self.graph
            .node_indices()
            .filter_map(|index| self.graph.node_weight(index).map(|node| (index, node)))
    }

    /// Number of visual nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of visual edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if nothing has been built.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{DependencyCategory, DependencyProperty, SnapshotIndex};
    use crate::graph::backrefs::{FieldRecord, FieldRegistry, ObjectFields};
    use crate::graph::display::NodeKind;

    fn pkg(name: &str) -> AssetIdentifier {
        AssetIdentifier::package(name)
    }

    fn create_test_index() -> SnapshotIndex {
        let mut index = SnapshotIndex::new();
        for (name, class) in [
            ("/Game/Props/Crate", "StaticMesh"),
            ("/Game/Maps/Arena", "World"),
            ("/Game/Maps/Dock", "World"),
            ("/Game/BP/Spawner", "Blueprint"),
        ] {
            index.add_package(name, Some(1024));
            let asset_name = crate::asset::types::long_package_asset_name(name);
            index.add_asset(AssetData::new(name, asset_name, class));
        }

        let crate_id = pkg("/Game/Props/Crate");
        index.add_dependency(
            pkg("/Game/Maps/Arena"),
            crate_id.clone(),
            DependencyCategory::Package,
            DependencyProperty::HARD | DependencyProperty::GAME,
        );
        index.add_dependency(
            pkg("/Game/BP/Spawner"),
            crate_id.clone(),
            DependencyCategory::Package,
            DependencyProperty::GAME,
        );
        index.add_dependency(
            pkg("/Game/Maps/Dock"),
            crate_id,
            DependencyCategory::Package,
            DependencyProperty::HARD,
        );
        index
    }

    fn build(index: &SnapshotIndex, root: &AssetIdentifier) -> ReferenceGraph {
        let mut graph = ReferenceGraph::new();
        graph
            .rebuild(&QueryAdapter::new(index), root, Point::default(), &LayoutConfig::default())
            .unwrap();
        graph
    }

    #[test]
    fn test_rebuild_links_referencers_in_order() {
        let index = create_test_index();
        let graph = build(&index, &pkg("/Game/Props/Crate"));

        let root = graph.root_info().unwrap();
        let children: Vec<_> = root
            .children
            .iter()
            .map(|(id, category)| (id.package_name.as_str(), category.kind()))
            .collect();
        assert_eq!(
            children,
            vec![
                ("/Game/Maps/Arena", crate::graph::LinkKind::Hard),
                ("/Game/Maps/Dock", crate::graph::LinkKind::HardEditorOnly),
                ("/Game/BP/Spawner", crate::graph::LinkKind::Soft),
            ]
        );

        let root_index = graph.root_index().unwrap();
        let visual: Vec<_> = graph
            .visual_children(root_index)
            .into_iter()
            .map(|(index, _)| graph.node(index).unwrap().id.package_name.clone())
            .collect();
        assert_eq!(visual, vec!["/Game/Maps/Arena", "/Game/Maps/Dock", "/Game/BP/Spawner"]);
    }

    #[test]
    fn test_duplicate_records_yield_one_edge() {
        let mut index = create_test_index();
        for _ in 0..4 {
            index.add_dependency(
                pkg("/Game/Maps/Arena"),
                pkg("/Game/Props/Crate"),
                DependencyCategory::Package,
                DependencyProperty::HARD | DependencyProperty::GAME,
            );
        }
        let graph = build(&index, &pkg("/Game/Props/Crate"));

        let arena = pkg("/Game/Maps/Arena");
        let root = graph.root_info().unwrap();
        assert_eq!(root.children.iter().filter(|(id, _)| *id == arena).count(), 1);
        assert_eq!(graph.node_info(&arena).unwrap().parents.len(), 1);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_positions_follow_layout() {
        let index = create_test_index();
        let mut graph = ReferenceGraph::new();
        let origin = Point::new(50.0, 80.0);
        graph
            .rebuild(
                &QueryAdapter::new(&index),
                &pkg("/Game/Props/Crate"),
                origin,
                &LayoutConfig::default(),
            )
            .unwrap();

        let root = graph.visual_node(&pkg("/Game/Props/Crate")).unwrap();
        assert!(root.is_root);
        assert_eq!(root.position, origin);

        let expected = layout_children(origin, 3, LayoutConfig::default().fixed_step);
        let actual: Vec<Point> = graph
            .visual_children(graph.root_index().unwrap())
            .into_iter()
            .map(|(index, _)| graph.node(index).unwrap().position)
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_asset_data_attached() {
        let index = create_test_index();
        let graph = build(&index, &pkg("/Game/Props/Crate"));

        let arena = graph.visual_node(&pkg("/Game/Maps/Arena")).unwrap();
        assert_eq!(arena.display.title, "Arena");
        assert_eq!(arena.display.type_name, "World");
        assert!(!arena.is_root);
        assert_eq!(
            graph.node_info(&pkg("/Game/Props/Crate")).unwrap().asset_data.asset_class,
            "StaticMesh"
        );
    }

    #[test]
    fn test_rebuild_discards_previous_root() {
        let mut index = create_test_index();
        index.add_package("/Game/Audio/Hit", Some(10));
        index.add_dependency(
            pkg("/Game/Props/Crate"),
            pkg("/Game/Audio/Hit"),
            DependencyCategory::Package,
            DependencyProperty::HARD,
        );

        let adapter = QueryAdapter::new(&index);
        let mut graph = ReferenceGraph::new();
        let layout = LayoutConfig::default();
        graph
            .rebuild(&adapter, &pkg("/Game/Props/Crate"), Point::default(), &layout)
            .unwrap();
        assert!(graph.node_info(&pkg("/Game/Maps/Arena")).is_some());

        graph
            .rebuild(&adapter, &pkg("/Game/Audio/Hit"), Point::default(), &layout)
            .unwrap();
        assert!(graph.node_info(&pkg("/Game/Maps/Arena")).is_none());
        assert!(graph.visual_node(&pkg("/Game/Maps/Arena")).is_none());
        assert!(graph.node_info(&pkg("/Game/Props/Crate")).is_some());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.root(), Some(&pkg("/Game/Audio/Hit")));
    }

    #[test]
    fn test_not_ready_leaves_state_untouched() {
        let mut index = create_test_index();
        let mut graph = build(&index, &pkg("/Game/Props/Crate"));
        assert_eq!(graph.node_count(), 4);

        index.set_loading(true);
        let result = graph.rebuild(
            &QueryAdapter::new(&index),
            &pkg("/Game/Maps/Arena"),
            Point::default(),
            &LayoutConfig::default(),
        );
        assert_eq!(result, Err(IndexError::NotReady));
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.root(), Some(&pkg("/Game/Props/Crate")));
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut index = create_test_index();
        index.add_dependency(
            pkg("/Game/Props/Crate"),
            pkg("/Game/Props/Crate"),
            DependencyCategory::Package,
            DependencyProperty::HARD,
        );
        let graph = build(&index, &pkg("/Game/Props/Crate"));

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        let root = graph.root_info().unwrap();
        assert!(root.parents.contains(&pkg("/Game/Props/Crate")));
    }

    #[test]
    fn test_empty_root_still_builds() {
        let index = SnapshotIndex::new();
        let graph = build(&index, &pkg("/Game/Nowhere"));

        assert_eq!(graph.node_count(), 1);
        let root = graph.visual_node(&pkg("/Game/Nowhere")).unwrap();
        assert!(!root.display.uses_thumbnail);
        assert_eq!(root.display.title, "/Game/Nowhere");
        assert!(graph.root_info().unwrap().children.is_empty());
    }

    #[test]
    fn test_primary_asset_and_value_children() {
        let mut index = create_test_index();
        let tag = AssetIdentifier::value("/Script/GameplayTags", "GameplayTag", "Prop.Breakable");
        index.add_package("/Script/GameplayTags", Some(0));
        index.add_dependency(
            tag.clone(),
            pkg("/Game/Props/Crate"),
            DependencyCategory::SearchableName,
            DependencyProperty::empty(),
        );
        let primary = AssetIdentifier::primary_asset("Map", "Arena");
        index.add_dependency(
            primary.clone(),
            pkg("/Game/Props/Crate"),
            DependencyCategory::Manage,
            DependencyProperty::DIRECT,
        );

        let adapter = QueryAdapter::with_categories(
            &index,
            &[
                DependencyCategory::Package,
                DependencyCategory::Manage,
                DependencyCategory::SearchableName,
            ],
        );
        let mut graph = ReferenceGraph::new();
        graph
            .rebuild(&adapter, &pkg("/Game/Props/Crate"), Point::default(), &LayoutConfig::default())
            .unwrap();

        assert_eq!(graph.visual_node(&primary).unwrap().display.kind, NodeKind::PrimaryAsset);
        assert_eq!(graph.visual_node(&tag).unwrap().display.kind, NodeKind::SearchableName);
        assert_eq!(graph.node_count(), 6);
    }

    #[test]
    fn test_annotate_back_references() {
        let index = create_test_index();
        let mut graph = build(&index, &pkg("/Game/Props/Crate"));
        let registry = FieldRegistry::from_objects(vec![ObjectFields {
            object: pkg("/Game/BP/Spawner"),
            generated_class: None,
            fields: vec![FieldRecord::reference("SpawnedActor", Some(pkg("/Game/Props/Crate")))],
        }]);

        assert_eq!(graph.annotate_back_references(&registry), 1);
        let spawner = graph.visual_node(&pkg("/Game/BP/Spawner")).unwrap();
        assert_eq!(spawner.back_references[0].field, "SpawnedActor");
        assert!(graph
            .visual_node(&pkg("/Game/Maps/Arena"))
            .unwrap()
            .back_references
            .is_empty());
    }

    #[test]
    fn test_clear() {
        let index = create_test_index();
        let mut graph = build(&index, &pkg("/Game/Props/Crate"));
        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.root_info().is_none());
        assert!(graph.root_index().is_none());
    }
}
