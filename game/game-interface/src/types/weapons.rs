use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoStaticStr};

#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    FromPrimitive,
    EnumCount,
    EnumIter,
    IntoStaticStr,
)]
pub enum WeaponType {
    #[default]
    Hammer = 0,
    Gun,
    Shotgun,
    Grenade,
    Laser,
    /// Only obtainable through freezing in this mod.
    Ninja,
}

pub const NUM_WEAPONS: usize = WeaponType::COUNT;

impl WeaponType {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Weapons that have an upgrade stat, all but ninja.
    pub fn is_upgradable(self) -> bool {
        !matches!(self, WeaponType::Ninja)
    }
}

/// What a kill is attributed to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillWeapon {
    Weapon(WeaponType),
    /// death tiles, leaving the game layer
    World,
    /// forced by the game (team change, disconnect)
    Game,
}

impl KillWeapon {
    /// Kills by world or game never reward anyone.
    pub fn is_weapon(&self) -> bool {
        matches!(self, KillWeapon::Weapon(_))
    }
}
