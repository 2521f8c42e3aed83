//! Actor kinds and kind sets used for zone filtering and target queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an actor taking part in combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// The player character.
    Player,
    /// A regular enemy.
    Enemy,
    /// A boss adversary. Filters treat it as an enemy.
    Boss,
    /// An allied summon fighting for the player.
    Summon,
}

impl ActorKind {
    /// All actor kinds, in registry order.
    pub const ALL: [Self; 4] = [Self::Player, Self::Enemy, Self::Boss, Self::Summon];

    /// Bit used for this kind inside a [`KindSet`].
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Player => 1 << 0,
            Self::Enemy => 1 << 1,
            Self::Boss => 1 << 2,
            Self::Summon => 1 << 3,
        }
    }

    /// The class a damage zone's target filter sees for this kind.
    ///
    /// Filters are expressed over {Player, Enemy, Summon}; bosses are enemies.
    #[must_use]
    pub const fn filter_class(self) -> Self {
        match self {
            Self::Boss => Self::Enemy,
            other => other,
        }
    }

    /// Whether this kind fights on the player's side.
    #[must_use]
    pub const fn is_allied(self) -> bool {
        matches!(self, Self::Player | Self::Summon)
    }

    /// Display name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
            Self::Boss => "boss",
            Self::Summon => "summon",
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of actor kinds, stored as bit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KindSet(u8);

impl KindSet {
    /// No kinds.
    pub const NONE: Self = Self(0);
    /// Player only.
    pub const PLAYER: Self = Self(ActorKind::Player.bit());
    /// Regular enemies only.
    pub const ENEMY: Self = Self(ActorKind::Enemy.bit());
    /// Bosses only.
    pub const BOSS: Self = Self(ActorKind::Boss.bit());
    /// Summons only.
    pub const SUMMON: Self = Self(ActorKind::Summon.bit());
    /// Everything that fights on the player's side.
    pub const ALLIES: Self = Self(ActorKind::Player.bit() | ActorKind::Summon.bit());
    /// Everything hostile to the player.
    pub const HOSTILES: Self = Self(ActorKind::Enemy.bit() | ActorKind::Boss.bit());
    /// All kinds.
    pub const ALL: Self = Self(0b1111);

    /// Builds a set from a list of kinds.
    #[must_use]
    pub fn from_kinds(kinds: &[ActorKind]) -> Self {
        kinds.iter().fold(Self::NONE, |set, kind| set.with(*kind))
    }

    /// Returns this set with `kind` added.
    #[must_use]
    pub const fn with(self, kind: ActorKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Returns this set with `kind` removed.
    #[must_use]
    pub const fn without(self, kind: ActorKind) -> Self {
        Self(self.0 & !kind.bit())
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Checks whether `kind` is a member.
    #[must_use]
    pub const fn contains(self, kind: ActorKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Checks whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the member kinds in registry order.
    pub fn iter(self) -> impl Iterator<Item = ActorKind> {
        ActorKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl From<ActorKind> for KindSet {
    fn from(kind: ActorKind) -> Self {
        Self::NONE.with(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boss_filters_as_enemy() {
        assert_eq!(ActorKind::Boss.filter_class(), ActorKind::Enemy);
        assert_eq!(ActorKind::Summon.filter_class(), ActorKind::Summon);
    }

    #[test]
    fn test_kind_set_membership() {
        let set = KindSet::from_kinds(&[ActorKind::Player, ActorKind::Summon]);
        assert_eq!(set, KindSet::ALLIES);
        assert!(set.contains(ActorKind::Summon));
        assert!(!set.contains(ActorKind::Boss));
        assert!(set.without(ActorKind::Player).contains(ActorKind::Summon));
        assert!(!set.without(ActorKind::Player).contains(ActorKind::Player));
        assert_eq!(KindSet::ALL.iter().count(), 4);
        assert!(KindSet::NONE.is_empty());
    }
}
