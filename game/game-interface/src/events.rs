use bitflags::bitflags;
use math::math::vector::vec2;
use serde::{Deserialize, Serialize};

use crate::types::{
    id_types::{CharacterId, PlayerId},
    snapshot::SnapProjectile,
    weapons::{KillWeapon, WeaponType},
};

/// Sounds that a ninja spawns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameBuffNinjaEventSound {
    /// user used attack
    Attack,
    /// hits an object/character
    Hit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameBuffSoundEvent {
    Ninja(GameBuffNinjaEventSound),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameCharacterEventSound {
    WeaponSwitch {
        new_weapon: WeaponType,
    },
    NoAmmo {
        weapon: WeaponType,
    },
    HammerFire,
    GunFire,
    GrenadeFire,
    LaserFire,
    ShotgunFire,
    GroundJump,
    AirJump,
    HookHitHookable {
        /// Where the hook was when it attached.
        hook_pos: Option<vec2>,
    },
    Spawn,
    Death,
    Pain {
        long: bool,
    },
    /// played to the attacker
    Hit,
    HammerHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameCharacterEventEffect {
    Spawn,
    Death,
    /// the amounts are capped at 9, like the damage stars
    DamageIndicator {
        health: i32,
        armor: i32,
        self_damage: bool,
    },
    HammerHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameCharacterSoundEvent {
    Sound(GameCharacterEventSound),
    Buff(GameBuffSoundEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameCharacterEffectEvent {
    Effect(GameCharacterEventEffect),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameGrenadeEventSound {
    Explosion,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameGrenadeEventEffect {
    Explosion,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameLaserEventSound {
    Bounce,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePickupHeartEventSound {
    /// a pickup was collected by a character
    Collect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePickupArmorEventSound {
    /// a pickup was collected by a character
    Collect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePickupSoundEvent {
    Heart(GamePickupHeartEventSound),
    Armor(GamePickupArmorEventSound),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameWorldEntitySoundEvent {
    Character(GameCharacterSoundEvent),
    Grenade(GameGrenadeEventSound),
    Laser(GameLaserEventSound),
    Pickup(GamePickupSoundEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameWorldEntityEffectEvent {
    Character(GameCharacterEffectEvent),
    Grenade(GameGrenadeEventEffect),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameWorldSoundEvent {
    /// world units
    ///
    /// A value of `None` means that the sound will be
    /// played globally.
    pub pos: Option<vec2>,
    /// A value of `None` here means that
    /// the event is a "global"/world event.
    /// An owner is a character.
    pub owner_id: Option<CharacterId>,
    pub ev: GameWorldEntitySoundEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameWorldEffectEvent {
    /// world units
    pub pos: vec2,
    pub owner_id: Option<CharacterId>,
    pub ev: GameWorldEntityEffectEvent,
}

/// Messages produced by the system, usually shown in the chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameWorldSystemMessage {
    Custom(String),
    /// Every n-th kill of a streak.
    Killstreak { id: PlayerId, kills: i32 },
    /// A player ended the streak of another one.
    KillstreakEnded {
        killer: PlayerId,
        victim: PlayerId,
        bonus_exp: i32,
    },
    LevelUp {
        id: PlayerId,
        level: i32,
        money: i32,
    },
    /// The player outgrew the allowed level range of this server.
    LevelCapReached { id: PlayerId },
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct KillFlags(u32);
bitflags! {
    impl KillFlags: u32 {
        /// the victim was on a killstreak
        const STREAK_ENDED = (1 << 0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameWorldAction {
    Kill {
        killer: Option<CharacterId>,
        victim: CharacterId,
        weapon: KillWeapon,
        flags: KillFlags,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameWorldNotificationEvent {
    /// A system message
    System(GameWorldSystemMessage),
    /// A action that is displayed in an action feed, e.g. kill messages
    Action(GameWorldAction),
}

/// Messages that bypass the snapshot and go to exactly one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameWorldDirectMessage {
    /// A projectile the client should know about right away, so it does not
    /// wait for the next snapshot to discover it. Used for bouncing grenades.
    ExtraProjectile { id: u32, proj: SnapProjectile },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameWorldEvent {
    Sound(GameWorldSoundEvent),
    Effect(GameWorldEffectEvent),
    Notification(GameWorldNotificationEvent),
    Direct {
        to: CharacterId,
        msg: GameWorldDirectMessage,
    },
}
