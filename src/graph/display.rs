//! Display metadata for graph nodes.
//!
//! Derives the title, type line and comment a renderer shows for a node
//! from its identifier and the asset data the index resolved for it.

use serde::Serialize;

use crate::asset::types::SCRIPT_PACKAGE_PREFIX;
use crate::asset::{AssetData, AssetIdentifier};

/// Tag whose value replaces the title when present.
const ACTOR_LABEL_TAG: &str = "ActorLabel";

/// What kind of thing a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// An on-disk package
    Package,
    /// A primary asset (management reference)
    PrimaryAsset,
    /// A searchable name such as a gameplay tag or data table row
    SearchableName,
    /// A native code package that has no asset data
    Script,
}

impl NodeKind {
    /// Returns a short label for the kind.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Package => "package",
            NodeKind::PrimaryAsset => "primary_asset",
            NodeKind::SearchableName => "searchable_name",
            NodeKind::Script => "script",
        }
    }
}

/// Everything a renderer needs to label a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDisplay {
    /// Main line of the node title
    pub title: String,
    /// Second line of the node title (class or kind)
    pub type_name: String,
    /// Comment bubble text (the package name for packages)
    pub comment: Option<String>,
    /// Kind of node
    pub kind: NodeKind,
    /// Whether the renderer can show an asset thumbnail
    pub uses_thumbnail: bool,
}

impl NodeDisplay {
    /// Derives display metadata for a node.
    ///
    /// # Example
    ///
    /// ```
    /// use refscope::asset::{AssetData, AssetIdentifier};
    /// use refscope::graph::{NodeDisplay, NodeKind};
    ///
    /// let id = AssetIdentifier::package("/Game/Props/Crate");
    /// let display = NodeDisplay::derive(&id, &AssetData::new("/Game/Props/Crate", "Crate", "StaticMesh"));
    /// assert_eq!(display.title, "Crate");
    /// assert_eq!(display.type_name, "StaticMesh");
    /// assert_eq!(display.kind, NodeKind::Package);
    /// ```
    pub fn derive(id: &AssetIdentifier, asset: &AssetData) -> Self {
        let mut title = asset.asset_name.clone();
        let mut type_name = asset.asset_class.clone();
        let mut kind = NodeKind::Package;

        if id.is_primary_asset() {
            title = format!("{}:{}", id.object_name, id.value_name);
            type_name = "Manager".to_string();
            kind = NodeKind::PrimaryAsset;
        } else if id.is_value() {
            title = id.value_name.clone();
            type_name = if asset.asset_class == "DataTable" {
                format!("In DataTable {}", id.object_name)
            } else {
                id.object_name.clone()
            };
            kind = NodeKind::SearchableName;
        } else if id.is_package() && !asset.is_valid() {
            if let Some(script_name) = id.package_name.strip_prefix(SCRIPT_PACKAGE_PREFIX) {
                title = script_name.to_string();
                type_name = "Script".to_string();
                kind = NodeKind::Script;
            }
        }

        if let Some(label) = asset.tag(ACTOR_LABEL_TAG) {
            title = label.to_string();
        }

        // Unresolved packages still need something to show
        if title.is_empty() {
            title = id.to_string();
        }

        // Script packages are still packages and keep their name as comment
        let has_package_comment = matches!(kind, NodeKind::Package | NodeKind::Script);
        Self {
            title,
            type_name,
            comment: has_package_comment.then(|| id.package_name.clone()),
            kind,
            uses_thumbnail: kind == NodeKind::Package && asset.is_valid(),
        }
    }

    /// Two-line title as shown on a node.
    pub fn full_title(&self) -> String {
        if self.type_name.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.type_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_display() {
        let id = AssetIdentifier::package("/Game/Props/Crate");
        let display = NodeDisplay::derive(&id, &AssetData::new("/Game/Props/Crate", "Crate", "StaticMesh"));

        assert_eq!(display.kind, NodeKind::Package);
        assert_eq!(display.comment.as_deref(), Some("/Game/Props/Crate"));
        assert!(display.uses_thumbnail);
        assert_eq!(display.full_title(), "Crate\nStaticMesh");
    }

    #[test]
    fn test_primary_asset_display() {
        let id = AssetIdentifier::primary_asset("Map", "Arena");
        let display = NodeDisplay::derive(&id, &AssetData::default());

        assert_eq!(display.title, "Map:Arena");
        assert_eq!(display.type_name, "Manager");
        assert_eq!(display.kind, NodeKind::PrimaryAsset);
        assert!(display.comment.is_none());
        assert!(!display.uses_thumbnail);
    }

    #[test]
    fn test_searchable_name_display() {
        let id = AssetIdentifier::value("/Game/Data/Weapons", "Weapons", "Rifle");
        let plain = NodeDisplay::derive(&id, &AssetData::default());
        assert_eq!(plain.title, "Rifle");
        assert_eq!(plain.type_name, "Weapons");
        assert_eq!(plain.kind, NodeKind::SearchableName);

        let table = NodeDisplay::derive(&id, &AssetData::new("/Game/Data/Weapons", "Weapons", "DataTable"));
        assert_eq!(table.type_name, "In DataTable Weapons");
    }

    #[test]
    fn test_script_package_display() {
        let id = AssetIdentifier::package("/Script/Engine");
        let display = NodeDisplay::derive(&id, &AssetData::default());

        assert_eq!(display.title, "Engine");
        assert_eq!(display.type_name, "Script");
        assert_eq!(display.kind, NodeKind::Script);
        assert_eq!(display.comment.as_deref(), Some("/Script/Engine"));
        assert!(!display.uses_thumbnail);
    }

    #[test]
    fn test_unresolved_package_falls_back_to_identifier() {
        let id = AssetIdentifier::package("/Game/Missing");
        let display = NodeDisplay::derive(&id, &AssetData::default());

        assert_eq!(display.title, "/Game/Missing");
        assert_eq!(display.kind, NodeKind::Package);
        assert!(!display.uses_thumbnail);
        assert_eq!(display.full_title(), "/Game/Missing");
    }

    #[test]
    fn test_actor_label_overrides_title() {
        let id = AssetIdentifier::package("/Game/__External/ABC123");
        let asset = AssetData::new("/Game/__External/ABC123", "ABC123", "Actor").with_tag("ActorLabel", "Door_01");
        assert_eq!(NodeDisplay::derive(&id, &asset).title, "Door_01");
    }
}
