//! Edge classifier.
//!
//! Turns the raw referencer records of one root into an ordered,
//! deduplicated list of `(target, EdgeCategory)` links, then drops targets
//! whose packages cannot be resolved (substituting redirectors by their own
//! referencers).

use std::cmp::Ordering;
use std::collections::HashMap;

use log::{debug, warn};

use super::category::EdgeCategory;
use crate::asset::{AssetIdentifier, AssetIndex, IndexResult, QueryAdapter, RawDependency};

/// One classified link: the target and the union of its properties.
pub type Link = (AssetIdentifier, EdgeCategory);

/// Orders two raw records from most to least informative.
///
/// Category order first, then hard before soft, then package name.
pub fn compare_raw(a: &RawDependency, b: &RawDependency) -> Ordering {
    a.category
        .order()
        .cmp(&b.category.order())
        .then_with(|| b.is_hard().cmp(&a.is_hard()))
        .then_with(|| a.asset_id.package_name.cmp(&b.asset_id.package_name))
}

/// Stable-sorts raw records with [`compare_raw`].
pub fn sort_raw(records: &mut [RawDependency]) {
    records.sort_by(compare_raw);
}

/// An insertion-ordered map of target to accumulated category.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    links: Vec<Link>,
    positions: HashMap<AssetIdentifier, usize>,
}

impl LinkSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// ORs `category` into the entry of `target`, appending it if new.
    pub fn merge(&mut self, target: AssetIdentifier, category: EdgeCategory) {
        match self.positions.get(&target) {
            Some(&pos) => self.links[pos].1 |= category,
            None => {
                self.positions.insert(target.clone(), self.links.len());
                self.links.push((target, category));
            }
        }
    }

    /// Returns the accumulated category of `target`.
    pub fn get(&self, target: &AssetIdentifier) -> Option<EdgeCategory> {
        self.positions.get(target).map(|&pos| self.links[pos].1)
    }

    /// Returns true if the set holds `target`.
    pub fn contains(&self, target: &AssetIdentifier) -> bool {
        self.positions.contains_key(target)
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Consumes the set, returning links in insertion order.
    pub fn into_links(self) -> Vec<Link> {
        self.links
    }

    fn from_links(links: Vec<Link>) -> Self {
        let mut set = Self::new();
        for (target, category) in links {
            set.merge(target, category);
        }
        set
    }
}

/// Sorts raw records and accumulates one active category per target.
///
/// # Example
///
/// ```
/// use refscope::asset::{AssetIdentifier, DependencyCategory, DependencyProperty, RawDependency};
/// use refscope::graph::{classify, EdgeCategory};
///
/// let id = AssetIdentifier::package("/Game/A");
/// let links = classify(vec![
///     RawDependency::new(id.clone(), DependencyCategory::Package, DependencyProperty::GAME),
///     RawDependency::new(id.clone(), DependencyCategory::Package, DependencyProperty::HARD),
/// ]);
/// assert_eq!(links.len(), 1);
/// assert_eq!(
///     links.get(&id),
///     Some(EdgeCategory::END_ACTIVE | EdgeCategory::HARD | EdgeCategory::USED_IN_GAME)
/// );
/// ```
pub fn classify(mut records: Vec<RawDependency>) -> LinkSet {
    sort_raw(&mut records);

    let mut links = LinkSet::new();
    for record in records {
        let mut category = EdgeCategory::END_ACTIVE;
        if record.is_hard() {
            category |= EdgeCategory::HARD;
        }
        if record.is_used_in_game() {
            category |= EdgeCategory::USED_IN_GAME;
        }
        links.merge(record.asset_id, category);
    }
    links
}

/// Returns true if the target's package has usable on-disk data.
///
/// Identifiers without a package name and primary assets are always kept.
/// Values are checked against the package they live in.
fn is_resolvable<I: AssetIndex + ?Sized>(index: &I, target: &AssetIdentifier) -> bool {
    if target.package_name.is_empty() || target.is_primary_asset() {
        return true;
    }
    index
        .package_data(&target.package_name)
        .is_some_and(|data| data.is_valid())
}

/// Drops unresolvable targets, substituting redirectors by their referencers.
///
/// A substitute takes the redirector's position and inherits its category.
/// Substitutes are checked once and never substituted again.
pub fn filter_unresolvable<I: AssetIndex + ?Sized>(
    links: LinkSet,
    adapter: &QueryAdapter<'_, I>,
) -> LinkSet {
    let index = adapter.index();
    let mut kept: Vec<Link> = Vec::with_capacity(links.len());

    for (target, category) in links.into_links() {
        if is_resolvable(index, &target) {
            kept.push((target, category));
            continue;
        }

        let package = target.package_name.clone();
        let is_redirector = index
            .assets_by_package(&package)
            .iter()
            .any(|asset| asset.is_redirector);

        if !is_redirector {
            debug!("dropping unresolvable reference {}", target);
            continue;
        }

        let substitutes = index.referencers(&AssetIdentifier::package(&package), adapter.categories());
        debug!(
            "substituting redirector {} with {} referencer(s)",
            target,
            substitutes.len()
        );
        for substitute in substitutes {
            if is_resolvable(index, &substitute.asset_id) {
                kept.push((substitute.asset_id, category));
            } else {
                warn!(
                    "redirector {} is referenced by unresolvable {}",
                    target, substitute.asset_id
                );
            }
        }
    }

    LinkSet::from_links(kept)
}

/// Queries, classifies and filters the referencer links of `root`.
pub fn sorted_links<I: AssetIndex + ?Sized>(
    adapter: &QueryAdapter<'_, I>,
    root: &AssetIdentifier,
) -> IndexResult<LinkSet> {
    let records = adapter.referencers(root)?;
    let links = classify(records);
    Ok(filter_unresolvable(links, adapter))
}
