//! Explorer state machine.
//!
//! [`Explorer`] owns the [`ReferenceGraph`] of the current root and decides
//! when it gets rebuilt. Rebuild requests made while the asset index is still
//! loading are deferred to a single registered retry, and asset changes after
//! a build only mark the results as stale.

use log::{debug, info, warn};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

use crate::asset::types::long_package_asset_name;
use crate::asset::{AssetIdentifier, AssetIndex, IndexError, QueryAdapter};
use crate::config::ExplorerConfig;
use crate::graph::{BackReferenceProvider, Point, ReferenceGraph};

/// Status shown when saved references changed after the last build.
pub const STALE_STATUS: &str = "Saved references changed, refresh for update";

/// Status shown while a rebuild waits for the index.
pub const LOADING_STATUS: &str = "Asset index is still loading, the graph will build once it is ready";

/// Lifecycle of the explored graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplorerState {
    /// Nothing built yet
    #[default]
    Empty,
    /// A rebuild is waiting for the index to finish loading
    Loading,
    /// The graph reflects the index
    Built,
    /// The index changed since the last build
    Stale,
}

/// What a rebuild request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The graph was rebuilt; holds the root visual node
    Built(NodeIndex),
    /// The index is loading; a retry is registered
    Deferred,
    /// No root has been set
    NoRoot,
}

/// Reference explorer for one root at a time.
pub struct Explorer {
    config: ExplorerConfig,
    graph: ReferenceGraph,
    state: ExplorerState,
    root: Option<AssetIdentifier>,
    origin: Point,
    retry_registered: bool,
    edited_packages: HashSet<String>,
    back_references: Option<Box<dyn BackReferenceProvider>>,
}

impl Explorer {
    /// Creates an explorer with no root.
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            graph: ReferenceGraph::new(),
            state: ExplorerState::Empty,
            root: None,
            origin: Point::default(),
            retry_registered: false,
            edited_packages: HashSet::new(),
            back_references: None,
        }
    }

    /// Sets the provider used to annotate nodes with back references.
    pub fn with_back_references(mut self, provider: Box<dyn BackReferenceProvider>) -> Self {
        self.back_references = Some(provider);
        self
    }

    /// Sets the position of the root node for the following builds.
    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Explores `root`, replacing the current graph.
    pub fn set_root<I: AssetIndex + ?Sized>(&mut self, index: &I, root: AssetIdentifier) -> RebuildOutcome {
        info!("exploring references of {}", root);
        self.root = Some(root);
        self.rebuild(index)
    }

    /// Re-roots the graph on a node of the current graph.
    pub fn navigate<I: AssetIndex + ?Sized>(&mut self, index: &I, id: &AssetIdentifier) -> RebuildOutcome {
        self.set_root(index, id.clone())
    }

    /// Rebuilds the graph of the current root from scratch.
    pub fn refresh<I: AssetIndex + ?Sized>(&mut self, index: &I) -> RebuildOutcome {
        self.rebuild(index)
    }

    /// Runs the registered retry, if any.
    ///
    /// Returns `None` when no rebuild was waiting for the index.
    pub fn on_index_loaded<I: AssetIndex + ?Sized>(&mut self, index: &I) -> Option<RebuildOutcome> {
        if !self.retry_registered {
            return None;
        }
        self.retry_registered = false;
        debug!("index finished loading, running deferred rebuild");
        Some(self.rebuild(index))
    }

    /// Notes that an asset was added, updated or removed in the index.
    ///
    /// Returns true if the built graph became stale.
    pub fn on_asset_changed(&mut self) -> bool {
        if self.state == ExplorerState::Built {
            self.state = ExplorerState::Stale;
            return true;
        }
        false
    }

    /// Marks a package as having unsaved edits (or clears the mark).
    pub fn set_package_edited(&mut self, package_name: &str, edited: bool) {
        if edited {
            self.edited_packages.insert(package_name.to_string());
        } else {
            self.edited_packages.remove(package_name);
        }
    }

    /// Status line for the current state. Empty when there is nothing to report.
    pub fn status_text(&self) -> String {
        if let Some(root) = self.root.as_ref().filter(|root| root.is_package()) {
            if self.edited_packages.contains(&root.package_name) {
                return format!(
                    "Showing old saved references for edited asset {}",
                    long_package_asset_name(&root.package_name)
                );
            }
        }

        match self.state {
            ExplorerState::Stale => STALE_STATUS.to_string(),
            ExplorerState::Loading => LOADING_STATUS.to_string(),
            ExplorerState::Empty | ExplorerState::Built => String::new(),
        }
    }

    fn rebuild<I: AssetIndex + ?Sized>(&mut self, index: &I) -> RebuildOutcome {
        let Some(root) = self.root.clone() else {
            return RebuildOutcome::NoRoot;
        };

        let adapter = QueryAdapter::with_categories(index, &self.config.query.categories);
        match self.graph.rebuild(&adapter, &root, self.origin, &self.config.layout) {
            Ok(root_index) => {
                if let Some(provider) = self.back_references.as_deref() {
                    let annotated = self.graph.annotate_back_references(provider);
                    debug!("{} nodes reference {} through fields", annotated, root);
                }
                self.state = ExplorerState::Built;
                RebuildOutcome::Built(root_index)
            }
            Err(IndexError::NotReady) => {
                if self.retry_registered {
                    debug!("rebuild of {} already waiting for the index", root);
                } else {
                    warn!("asset index is loading, deferring rebuild of {}", root);
                    self.retry_registered = true;
                }
                self.state = ExplorerState::Loading;
                RebuildOutcome::Deferred
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> ExplorerState {
        self.state
    }

    /// Current root, if one was set.
    pub fn root(&self) -> Option<&AssetIdentifier> {
        self.root.as_ref()
    }

    /// The graph of the last successful build.
    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    /// Active configuration.
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Returns true if a rebuild is waiting for the index.
    pub fn has_pending_retry(&self) -> bool {
        self.retry_registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{DependencyCategory, DependencyProperty, SnapshotIndex};
    use crate::graph::backrefs::{FieldRecord, FieldRegistry, ObjectFields};

    fn pkg(name: &str) -> AssetIdentifier {
        AssetIdentifier::package(name)
    }

    fn create_test_index() -> SnapshotIndex {
        let mut index = SnapshotIndex::new();
        index.add_package("/Game/Props/Crate", Some(10));
        index.add_package("/Game/Maps/Arena", Some(10));
        index.add_dependency(
            pkg("/Game/Maps/Arena"),
            pkg("/Game/Props/Crate"),
            DependencyCategory::Package,
            DependencyProperty::HARD | DependencyProperty::GAME,
        );
        index
    }

    #[test]
    fn test_build_when_ready() {
        let index = create_test_index();
        let mut explorer = Explorer::new(ExplorerConfig::default());
        assert_eq!(explorer.state(), ExplorerState::Empty);
        assert_eq!(explorer.refresh(&index), RebuildOutcome::NoRoot);

        let outcome = explorer.set_root(&index, pkg("/Game/Props/Crate"));
        assert!(matches!(outcome, RebuildOutcome::Built(_)));
        assert_eq!(explorer.state(), ExplorerState::Built);
        assert_eq!(explorer.graph().node_count(), 2);
        assert_eq!(explorer.status_text(), "");
    }

    #[test]
    fn test_deferred_until_loaded() {
        let mut index = create_test_index();
        index.set_loading(true);

        let mut explorer = Explorer::new(ExplorerConfig::default());
        assert_eq!(explorer.set_root(&index, pkg("/Game/Props/Crate")), RebuildOutcome::Deferred);
        assert_eq!(explorer.state(), ExplorerState::Loading);
        assert!(explorer.has_pending_retry());
        assert!(explorer.graph().is_empty());
        assert_eq!(explorer.status_text(), LOADING_STATUS);

        // A second request while loading does not register another retry
        assert_eq!(explorer.refresh(&index), RebuildOutcome::Deferred);
        assert!(explorer.has_pending_retry());

        index.set_loading(false);
        assert!(matches!(explorer.on_index_loaded(&index), Some(RebuildOutcome::Built(_))));
        assert_eq!(explorer.state(), ExplorerState::Built);
        assert!(!explorer.has_pending_retry());

        // The retry runs once
        assert_eq!(explorer.on_index_loaded(&index), None);
    }

    #[test]
    fn test_retry_while_still_loading_registers_again() {
        let mut index = create_test_index();
        index.set_loading(true);
        let mut explorer = Explorer::new(ExplorerConfig::default());
        explorer.set_root(&index, pkg("/Game/Props/Crate"));

        assert_eq!(explorer.on_index_loaded(&index), Some(RebuildOutcome::Deferred));
        assert!(explorer.has_pending_retry());
    }

    #[test]
    fn test_stale_then_refresh() {
        let index = create_test_index();
        let mut explorer = Explorer::new(ExplorerConfig::default());

        // Nothing built yet, so nothing can go stale
        assert!(!explorer.on_asset_changed());

        explorer.set_root(&index, pkg("/Game/Props/Crate"));
        assert!(explorer.on_asset_changed());
        assert_eq!(explorer.state(), ExplorerState::Stale);
        assert_eq!(explorer.status_text(), STALE_STATUS);
        assert!(!explorer.on_asset_changed());

        explorer.refresh(&index);
        assert_eq!(explorer.state(), ExplorerState::Built);
        assert_eq!(explorer.status_text(), "");
    }

    #[test]
    fn test_navigate_rebuilds_from_new_root() {
        let index = create_test_index();
        let mut explorer = Explorer::new(ExplorerConfig::default());
        explorer.set_root(&index, pkg("/Game/Props/Crate"));

        explorer.navigate(&index, &pkg("/Game/Maps/Arena"));
        assert_eq!(explorer.state(), ExplorerState::Built);
        assert_eq!(explorer.root(), Some(&pkg("/Game/Maps/Arena")));
        assert_eq!(explorer.graph().node_count(), 1);
        assert!(explorer.graph().node_info(&pkg("/Game/Props/Crate")).is_none());
    }

    #[test]
    fn test_edited_root_status() {
        let index = create_test_index();
        let mut explorer = Explorer::new(ExplorerConfig::default());
        explorer.set_root(&index, pkg("/Game/Props/Crate"));
        explorer.on_asset_changed();

        explorer.set_package_edited("/Game/Props/Crate", true);
        assert_eq!(
            explorer.status_text(),
            "Showing old saved references for edited asset Crate"
        );

        explorer.set_package_edited("/Game/Props/Crate", false);
        assert_eq!(explorer.status_text(), STALE_STATUS);
    }

    #[test]
    fn test_back_references_attached_after_build() {
        let index = create_test_index();
        let registry = FieldRegistry::from_objects(vec![ObjectFields {
            object: pkg("/Game/Maps/Arena"),
            generated_class: None,
            fields: vec![FieldRecord::reference("CrateActor", Some(pkg("/Game/Props/Crate")))],
        }]);

        let mut explorer = Explorer::new(ExplorerConfig::default()).with_back_references(Box::new(registry));
        explorer.set_root(&index, pkg("/Game/Props/Crate"));

        let arena = explorer.graph().visual_node(&pkg("/Game/Maps/Arena")).unwrap();
        assert_eq!(arena.back_references.len(), 1);
        assert_eq!(arena.back_references[0].field, "CrateActor");
    }
}
