//! Fixed-layout network records. Every field is an integer so that two
//! records can be compared bitwise, which the dead reckoning relies on.

use serde::{Deserialize, Serialize};

/// The part of a character that the physics core produces.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetCharacterCore {
    /// `0` means raw state, no extrapolation allowed
    pub tick: i32,
    pub x: i32,
    pub y: i32,
    /// velocity * 256
    pub vel_x: i32,
    pub vel_y: i32,
    /// angle * 256
    pub angle: i32,
    pub direction: i32,
    pub jumped: i32,
    pub hook_state: i32,
    pub hook_tick: i32,
    pub hook_x: i32,
    pub hook_y: i32,
    /// hook direction * 256
    pub hook_dx: i32,
    pub hook_dy: i32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapCharacter {
    pub core: NetCharacterCore,
    /// only filled for the owner and its spectators
    pub health: i32,
    pub armor: i32,
    pub ammo_count: i32,
    pub weapon: i32,
    pub emote: i32,
    pub attack_tick: i32,
    pub triggered_events: i32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapProjectile {
    pub x: i32,
    pub y: i32,
    /// direction * 100
    pub vel_x: i32,
    pub vel_y: i32,
    pub ty: i32,
    pub start_tick: i32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapLaser {
    pub x: i32,
    pub y: i32,
    pub from_x: i32,
    pub from_y: i32,
    pub start_tick: i32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapPickup {
    pub x: i32,
    pub y: i32,
    pub ty: i32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapItem {
    Character(SnapCharacter),
    Projectile(SnapProjectile),
    Laser(SnapLaser),
    Pickup(SnapPickup),
}

/// One snapshot record, tagged with the stable id of its entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapObject {
    pub id: u32,
    pub item: SnapItem,
}
