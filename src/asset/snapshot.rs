//! In-memory asset index loaded from a JSON snapshot.
//!
//! A snapshot lists packages (with their on-disk size and assets), the
//! dependency records between identifiers, and optional per-object field
//! records used for back-reference lookups.
//!
//! # Format
//!
//! ```json
//! {
//!   "loading": false,
//!   "packages": [
//!     { "name": "/Game/Props/Crate", "disk_size": 2048,
//!       "assets": [{ "asset_name": "Crate", "asset_class": "StaticMesh" }] }
//!   ],
//!   "dependencies": [
//!     { "referencer": "/Game/Maps/Arena", "target": "/Game/Props/Crate",
//!       "category": "package", "properties": "HARD | GAME" }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::index::AssetIndex;
use super::types::{
    long_package_asset_name, AssetData, AssetIdentifier, DependencyCategory, DependencyProperty,
    PackageData, RawDependency,
};
use crate::graph::backrefs::{FieldRegistry, ObjectFields};

/// Errors that can occur while loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content (including unknown dependency categories).
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The snapshot structure is inconsistent.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type alias for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// A package entry of the snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Long package name
    pub name: String,
    /// On-disk size; absent when the index has no package data
    #[serde(default)]
    pub disk_size: Option<i64>,
    /// Assets stored in the package
    #[serde(default)]
    pub assets: Vec<AssetData>,
}

/// A dependency entry of the snapshot file: `referencer` depends on `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// The asset holding the reference
    pub referencer: AssetIdentifier,
    /// The referenced asset
    pub target: AssetIdentifier,
    /// Kind of link
    pub category: DependencyCategory,
    /// Link properties
    #[serde(default)]
    pub properties: DependencyProperty,
}

/// The on-disk structure of a snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Whether the index was still scanning when the snapshot was taken
    #[serde(default)]
    pub loading: bool,
    /// Known packages
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
    /// Dependency records
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    /// Field records for back-reference lookups
    #[serde(default)]
    pub objects: Vec<ObjectFields>,
}

/// Parses a snapshot file from a path.
pub fn parse_file(path: &Path) -> SnapshotResult<IndexSnapshot> {
    let content = fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parses a snapshot from a JSON string.
///
/// # Example
///
/// ```
/// use refscope::asset::snapshot::parse_str;
///
/// let snapshot = parse_str(r#"{"packages": [{"name": "/Game/A", "disk_size": 10}]}"#).unwrap();
/// assert_eq!(snapshot.packages.len(), 1);
/// assert!(!snapshot.loading);
/// ```
pub fn parse_str(content: &str) -> SnapshotResult<IndexSnapshot> {
    let snapshot: IndexSnapshot = serde_json::from_str(content)?;
    Ok(snapshot)
}

/// Validates a parsed snapshot.
///
/// Package names must be non-empty and unique.
pub fn validate(snapshot: &IndexSnapshot) -> SnapshotResult<()> {
    let mut names = HashSet::new();
    for package in &snapshot.packages {
        if package.name.is_empty() {
            return Err(SnapshotError::InvalidSnapshot(
                "package entry with an empty name".to_string(),
            ));
        }
        if !names.insert(package.name.as_str()) {
            return Err(SnapshotError::InvalidSnapshot(format!(
                "package '{}' is listed more than once",
                package.name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct PackageRecord {
    data: Option<PackageData>,
    assets: Vec<AssetData>,
}

/// An [`AssetIndex`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct SnapshotIndex {
    loading: bool,
    packages: HashMap<String, PackageRecord>,
    /// target -> records naming its referencers
    referencers: HashMap<AssetIdentifier, Vec<RawDependency>>,
    /// referencer -> records naming its targets
    dependencies: HashMap<AssetIdentifier, Vec<RawDependency>>,
    registry: FieldRegistry,
}

impl SnapshotIndex {
    /// Creates an empty, fully loaded index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates a snapshot file.
    pub fn load(path: &Path) -> SnapshotResult<Self> {
        let snapshot = parse_file(path)?;
        validate(&snapshot)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Builds an index from a parsed snapshot.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Self {
        let mut index = Self::new();
        index.loading = snapshot.loading;

        for package in snapshot.packages {
            index.add_package(&package.name, package.disk_size);
            for mut asset in package.assets {
                if asset.package_name.is_empty() {
                    asset.package_name = package.name.clone();
                }
                index.add_asset(asset);
            }
        }

        for dep in snapshot.dependencies {
            index.add_dependency(dep.referencer, dep.target, dep.category, dep.properties);
        }

        index.registry = FieldRegistry::from_objects(snapshot.objects);

        debug!(
            "loaded snapshot index: {} packages, {} referenced identifiers",
            index.packages.len(),
            index.referencers.len()
        );
        index
    }

    /// Marks the index as scanning (or done scanning).
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Registers a package. `None` means the index has no package data for it.
    pub fn add_package(&mut self, package_name: &str, disk_size: Option<i64>) {
        let record = self.packages.entry(package_name.to_string()).or_default();
        record.data = disk_size.map(|disk_size| PackageData { disk_size });
    }

    /// Adds an asset to its package, creating the package record if needed.
    pub fn add_asset(&mut self, asset: AssetData) {
        self.packages
            .entry(asset.package_name.clone())
            .or_default()
            .assets
            .push(asset);
    }

    /// Records that `referencer` depends on `target`.
    pub fn add_dependency(
        &mut self,
        referencer: AssetIdentifier,
        target: AssetIdentifier,
        category: DependencyCategory,
        properties: DependencyProperty,
    ) {
        self.referencers
            .entry(target.clone())
            .or_default()
            .push(RawDependency::new(referencer.clone(), category, properties));
        self.dependencies
            .entry(referencer)
            .or_default()
            .push(RawDependency::new(target, category, properties));
    }

    /// Field records loaded with the snapshot.
    pub fn field_registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Number of known packages.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

fn filter_categories(records: Option<&Vec<RawDependency>>, categories: &[DependencyCategory]) -> Vec<RawDependency> {
    records
        .map(|records| {
            records
                .iter()
                .filter(|r| categories.contains(&r.category))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

impl AssetIndex for SnapshotIndex {
    fn is_loading(&self) -> bool {
        self.loading
    }

    fn referencers(&self, id: &AssetIdentifier, categories: &[DependencyCategory]) -> Vec<RawDependency> {
        filter_categories(self.referencers.get(id), categories)
    }

    fn dependencies(&self, id: &AssetIdentifier, categories: &[DependencyCategory]) -> Vec<RawDependency> {
        filter_categories(self.dependencies.get(id), categories)
    }

    fn package_data(&self, package_name: &str) -> Option<PackageData> {
        self.packages.get(package_name).and_then(|p| p.data)
    }

    fn assets_by_package(&self, package_name: &str) -> Vec<AssetData> {
        self.packages
            .get(package_name)
            .map(|p| p.assets.clone())
            .unwrap_or_default()
    }

    fn assets_for_packages(&self, package_names: &[String]) -> HashMap<String, AssetData> {
        package_names
            .iter()
            .filter_map(|name| {
                let record = self.packages.get(name)?;
                // The main asset shares the package's short name
                let short_name = long_package_asset_name(name);
                let main = record
                    .assets
                    .iter()
                    .find(|a| a.asset_name == short_name)
                    .or_else(|| record.assets.first())?;
                Some((name.clone(), main.clone()))
            })
            .collect()
    }
}
