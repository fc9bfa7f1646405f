//! Dependency query adapter.
//!
//! Wraps an [`AssetIndex`] and turns "index still loading" into an explicit
//! [`IndexError::NotReady`] instead of an empty answer.

use std::collections::HashSet;
use std::fmt;

use super::index::{AssetIndex, IndexError, IndexResult};
use super::types::{AssetIdentifier, DependencyCategory, DependencyQuery, RawDependency};

/// Categories queried when none are configured.
pub const DEFAULT_QUERY_CATEGORIES: [DependencyCategory; 2] =
    [DependencyCategory::Package, DependencyCategory::Manage];

/// Which side of a package's links to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// Packages the selected package references
    Dependencies,
    /// Packages that reference the selected package
    Referencers,
}

impl fmt::Display for LinkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkDirection::Dependencies => write!(f, "Dependencies"),
            LinkDirection::Referencers => write!(f, "Referencers"),
        }
    }
}

/// Pass-through adapter over an asset index.
///
/// The adapter performs no caching and no filtering beyond the category set
/// it was configured with.
///
/// # Example
///
/// ```
/// use refscope::asset::{AssetIdentifier, QueryAdapter, SnapshotIndex};
///
/// let index = SnapshotIndex::new();
/// let adapter = QueryAdapter::new(&index);
/// let referencers = adapter.referencers(&AssetIdentifier::package("/Game/A")).unwrap();
/// assert!(referencers.is_empty());
/// ```
pub struct QueryAdapter<'a, I: AssetIndex + ?Sized> {
    index: &'a I,
    categories: Vec<DependencyCategory>,
}

impl<'a, I: AssetIndex + ?Sized> QueryAdapter<'a, I> {
    /// Creates an adapter querying package and management links.
    pub fn new(index: &'a I) -> Self {
        Self::with_categories(index, &DEFAULT_QUERY_CATEGORIES)
    }

    /// Creates an adapter querying the given categories.
    pub fn with_categories(index: &'a I, categories: &[DependencyCategory]) -> Self {
        Self {
            index,
            categories: categories.to_vec(),
        }
    }

    /// The wrapped index.
    pub fn index(&self) -> &'a I {
        self.index
    }

    /// The categories passed to every referencer query.
    pub fn categories(&self) -> &[DependencyCategory] {
        &self.categories
    }

    /// Returns true once the index has finished its initial scan.
    pub fn is_ready(&self) -> bool {
        !self.index.is_loading()
    }

    /// Returns the raw referencer records of `id`.
    pub fn referencers(&self, id: &AssetIdentifier) -> IndexResult<Vec<RawDependency>> {
        if self.index.is_loading() {
            return Err(IndexError::NotReady);
        }
        Ok(self.index.referencers(id, &self.categories))
    }

    /// Returns the package names on one side (hard or soft) of a package's links.
    ///
    /// Only package-category links are considered. Names are deduplicated and
    /// keep the order the index reported them in.
    pub fn package_links(
        &self,
        package_name: &str,
        direction: LinkDirection,
        query: DependencyQuery,
    ) -> IndexResult<Vec<String>> {
        if self.index.is_loading() {
            return Err(IndexError::NotReady);
        }

        let id = AssetIdentifier::package(package_name);
        let categories = [DependencyCategory::Package];
        let records = match direction {
            LinkDirection::Dependencies => self.index.dependencies(&id, &categories),
            LinkDirection::Referencers => self.index.referencers(&id, &categories),
        };

        let mut seen = HashSet::new();
        Ok(records
            .into_iter()
            .filter(|record| query.matches(record))
            .map(|record| record.asset_id.package_name)
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::snapshot::SnapshotIndex;
    use crate::asset::types::DependencyProperty;

    fn create_test_index() -> SnapshotIndex {
        let mut index = SnapshotIndex::new();
        let target = AssetIdentifier::package("/Game/Target");
        index.add_dependency(
            AssetIdentifier::package("/Game/HardUser"),
            target.clone(),
            DependencyCategory::Package,
            DependencyProperty::HARD | DependencyProperty::GAME,
        );
        index.add_dependency(
            AssetIdentifier::package("/Game/SoftUser"),
            target.clone(),
            DependencyCategory::Package,
            DependencyProperty::GAME,
        );
        index.add_dependency(
            AssetIdentifier::primary_asset("Map", "Arena"),
            target,
            DependencyCategory::Manage,
            DependencyProperty::DIRECT,
        );
        index
    }

    #[test]
    fn test_referencers_pass_through() {
        let index = create_test_index();
        let adapter = QueryAdapter::new(&index);

        let records = adapter
            .referencers(&AssetIdentifier::package("/Game/Target"))
            .unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_referencers_respect_categories() {
        let index = create_test_index();
        let adapter = QueryAdapter::with_categories(&index, &[DependencyCategory::Package]);

        let records = adapter
            .referencers(&AssetIdentifier::package("/Game/Target"))
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.category == DependencyCategory::Package));
    }

    #[test]
    fn test_not_ready_while_loading() {
        let mut index = create_test_index();
        index.set_loading(true);
        let adapter = QueryAdapter::new(&index);

        assert!(!adapter.is_ready());
        assert_eq!(
            adapter.referencers(&AssetIdentifier::package("/Game/Target")),
            Err(IndexError::NotReady)
        );
    }

    #[test]
    fn test_package_links_hard_and_soft() {
        let index = create_test_index();
        let adapter = QueryAdapter::new(&index);

        let hard = adapter
            .package_links("/Game/Target", LinkDirection::Referencers, DependencyQuery::Hard)
            .unwrap();
        assert_eq!(hard, vec!["/Game/HardUser".to_string()]);

        let soft = adapter
            .package_links("/Game/Target", LinkDirection::Referencers, DependencyQuery::Soft)
            .unwrap();
        assert_eq!(soft, vec!["/Game/SoftUser".to_string()]);

        let deps = adapter
            .package_links("/Game/HardUser", LinkDirection::Dependencies, DependencyQuery::Hard)
            .unwrap();
        assert_eq!(deps, vec!["/Game/Target".to_string()]);
    }

    #[test]
    fn test_link_direction_display() {
        assert_eq!(LinkDirection::Dependencies.to_string(), "Dependencies");
        assert_eq!(LinkDirection::Referencers.to_string(), "Referencers");
    }
}
