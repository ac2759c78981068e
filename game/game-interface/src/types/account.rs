use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter};

use super::{emoticons::EmoteType, weapons::WeaponType};

/// The upgradable stats of a player, in the order they are persisted.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromPrimitive,
    EnumCount,
    EnumIter,
)]
pub enum UpgradeStat {
    Hammer = 0,
    Gun,
    Shotgun,
    Grenade,
    Laser,
    /// max health/armor and drop amounts
    Life,
    /// fire rate
    Handling,
}

impl UpgradeStat {
    pub fn of_weapon(weapon: WeaponType) -> Option<Self> {
        match weapon {
            WeaponType::Hammer => Some(UpgradeStat::Hammer),
            WeaponType::Gun => Some(UpgradeStat::Gun),
            WeaponType::Shotgun => Some(UpgradeStat::Shotgun),
            WeaponType::Grenade => Some(UpgradeStat::Grenade),
            WeaponType::Laser => Some(UpgradeStat::Laser),
            WeaponType::Ninja => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeStats(pub [i32; UpgradeStat::COUNT]);

impl UpgradeStats {
    pub fn get(&self, stat: UpgradeStat) -> i32 {
        self.0[stat as usize]
    }

    pub fn set(&mut self, stat: UpgradeStat, val: i32) {
        self.0[stat as usize] = val;
    }

    /// Stat of a weapon, ninja has none and counts as 0.
    pub fn weapon(&self, weapon: WeaponType) -> i32 {
        UpgradeStat::of_weapon(weapon)
            .map(|stat| self.get(stat))
            .unwrap_or_default()
    }

    pub fn total(&self) -> i32 {
        self.0.iter().sum()
    }

    /// Shotgun, grenade and laser have to be upgraded once to be owned.
    pub fn owns_weapon(&self, weapon: WeaponType) -> bool {
        match weapon {
            WeaponType::Hammer | WeaponType::Gun => true,
            WeaponType::Ninja => false,
            weapon => self.weapon(weapon) > 0,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRank {
    #[default]
    User,
    /// cheaters spawn frozen
    Frozen,
    Moderator,
    Admin,
}

impl PlayerRank {
    /// Amount of orbiting rank markers shown above the character.
    pub fn marker_count(&self) -> usize {
        match self {
            PlayerRank::User | PlayerRank::Frozen => 0,
            PlayerRank::Moderator => 2,
            PlayerRank::Admin => 3,
        }
    }
}

/// Everything the persistence layer hands to the simulation at spawn
/// and reads back on its own schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub name: String,
    pub level: i32,
    pub experience: i32,
    pub money: i32,
    pub stats: UpgradeStats,
    /// switches every weapon into its secondary firing variant
    pub alt_mode: bool,
    pub rank: PlayerRank,
    /// hides rank markers
    pub undercover: bool,
    /// the emote shown when no other emote is active
    pub default_emote: EmoteType,
    /// the favourite weapon, the character spawns with it
    pub last_weapon: WeaponType,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: 1,
            experience: 0,
            money: 0,
            // hammer and gun are always owned, the rest is bought
            stats: UpgradeStats([1, 1, 0, 0, 0, 1, 0]),
            alt_mode: false,
            rank: PlayerRank::User,
            undercover: false,
            default_emote: EmoteType::Normal,
            last_weapon: WeaponType::Gun,
        }
    }
}
