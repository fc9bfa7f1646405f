//! Reference graph construction and layout.
//!
//! This module turns the raw referencer records of a root asset into the
//! [`ReferenceGraph`]: classified, deduplicated links, a node table with
//! resolved metadata, and visual nodes laid out on half-circle arcs.
//!
//! # Example
//!
//! ```rust
//! use refscope::asset::{AssetIdentifier, DependencyCategory, DependencyProperty, RawDependency};
//! use refscope::graph::{classify, EdgeCategory};
//!
//! let target = AssetIdentifier::package("/Game/Maps/Arena");
//! let links = classify(vec![
//!     RawDependency::new(target.clone(), DependencyCategory::Package, DependencyProperty::HARD),
//!     RawDependency::new(target.clone(), DependencyCategory::Package, DependencyProperty::GAME),
//! ]);
//!
//! assert_eq!(links.len(), 1);
//! assert_eq!(
//!     links.get(&target),
//!     Some(EdgeCategory::END_ACTIVE | EdgeCategory::HARD | EdgeCategory::USED_IN_GAME)
//! );
//! ```

pub mod backrefs;
pub mod category;
pub mod classifier;
pub mod display;
pub mod layout;
mod reference_graph;

pub use backrefs::{BackReference, BackReferenceProvider, FieldRegistry};
pub use category::{EdgeCategory, LinkKind};
pub use classifier::{classify, filter_unresolvable, sorted_links, Link, LinkSet};
pub use display::{NodeDisplay, NodeKind};
pub use layout::{layout_children, LayoutConfig, Point, DEFAULT_FIXED_STEP};
pub use reference_graph::{NodeInfo, ReferenceGraph, VisualNode};
