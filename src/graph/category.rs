//! Edge categories of the reference graph.
//!
//! An [`EdgeCategory`] is the union of everything observed about one
//! referencer link. [`LinkKind`] names the five classes a category falls
//! into, strongest first.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Bitset describing a link between two nodes.
    ///
    /// The empty set is a passive link.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EdgeCategory: u8 {
        /// The link end is active (a real reference, not a placeholder pin)
        const END_ACTIVE = 1;
        /// The referenced asset matters in the running game
        const USED_IN_GAME = 2;
        /// The reference is required at load time
        const HARD = 4;
    }
}

impl EdgeCategory {
    /// A passive link with no active properties.
    pub const PASSIVE: EdgeCategory = EdgeCategory::empty();

    /// Returns true if the link end is active.
    pub fn is_active(&self) -> bool {
        self.contains(EdgeCategory::END_ACTIVE)
    }

    /// Classifies this category.
    pub fn kind(&self) -> LinkKind {
        if !self.is_active() {
            return LinkKind::Passive;
        }
        let hard = self.contains(EdgeCategory::HARD);
        let in_game = self.contains(EdgeCategory::USED_IN_GAME);
        match (hard, in_game) {
            (true, true) => LinkKind::Hard,
            (true, false) => LinkKind::HardEditorOnly,
            (false, true) => LinkKind::Soft,
            (false, false) => LinkKind::SoftEditorOnly,
        }
    }
}

impl Default for EdgeCategory {
    fn default() -> Self {
        Self::PASSIVE
    }
}

impl fmt::Display for EdgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind().name())
    }
}

/// The named class of an edge category.
///
/// Variants are declared strongest first, so the derived ordering is the
/// priority ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkKind {
    /// Hard and used in game
    Hard,
    /// Hard, editor only
    HardEditorOnly,
    /// Soft and used in game
    Soft,
    /// Soft, editor only
    SoftEditorOnly,
    /// No active properties
    Passive,
}

impl LinkKind {
    /// All kinds, strongest first.
    pub const ALL: [LinkKind; 5] = [
        LinkKind::Hard,
        LinkKind::HardEditorOnly,
        LinkKind::Soft,
        LinkKind::SoftEditorOnly,
        LinkKind::Passive,
    ];

    /// Stable name used in exports and wire styling.
    pub fn name(&self) -> &'static str {
        match self {
            LinkKind::Hard => "Hard",
            LinkKind::HardEditorOnly => "HardEditorOnly",
            LinkKind::Soft => "Soft",
            LinkKind::SoftEditorOnly => "SoftEditorOnly",
            LinkKind::Passive => "Passive",
        }
    }

    /// Short label shown next to tree entries.
    pub fn short_label(&self) -> &'static str {
        match self {
            LinkKind::Hard => "[H]",
            LinkKind::HardEditorOnly => "[He]",
            LinkKind::Soft => "[S]",
            LinkKind::SoftEditorOnly => "[Se]",
            LinkKind::Passive => "[-]",
        }
    }

    /// Looks a kind up by its [`name`](LinkKind::name).
    pub fn from_name(name: &str) -> Option<LinkKind> {
        LinkKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_category() {
        assert_eq!(EdgeCategory::PASSIVE.kind(), LinkKind::Passive);
        assert_eq!(EdgeCategory::END_ACTIVE.kind(), LinkKind::SoftEditorOnly);
        assert_eq!(
            (EdgeCategory::END_ACTIVE | EdgeCategory::USED_IN_GAME).kind(),
            LinkKind::Soft
        );
        assert_eq!(
            (EdgeCategory::END_ACTIVE | EdgeCategory::HARD).kind(),
            LinkKind::HardEditorOnly
        );
        assert_eq!(
            (EdgeCategory::END_ACTIVE | EdgeCategory::HARD | EdgeCategory::USED_IN_GAME).kind(),
            LinkKind::Hard
        );
    }

    #[test]
    fn test_type_bits_without_active_end_are_passive() {
        let category = EdgeCategory::HARD | EdgeCategory::USED_IN_GAME;
        assert!(!category.is_active());
        assert_eq!(category.kind(), LinkKind::Passive);
    }

    #[test]
    fn test_priority_ordering() {
        let mut kinds = vec![
            LinkKind::Passive,
            LinkKind::Soft,
            LinkKind::Hard,
            LinkKind::SoftEditorOnly,
            LinkKind::HardEditorOnly,
        ];
        kinds.sort();
        assert_eq!(kinds, LinkKind::ALL.to_vec());
    }

    #[test]
    fn test_name_round_trip_and_unknown() {
        for kind in LinkKind::ALL {
            assert_eq!(LinkKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(LinkKind::from_name("Bogus"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(EdgeCategory::END_ACTIVE.to_string(), "SoftEditorOnly");
        assert_eq!(LinkKind::HardEditorOnly.to_string(), "HardEditorOnly");
    }
}
