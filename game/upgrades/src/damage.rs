pub mod damage {
    use game_interface::{
        events::{
            GameGrenadeEventEffect, GameGrenadeEventSound, GameWorldEntityEffectEvent,
            GameWorldEntitySoundEvent,
        },
        types::{
            id_types::CharacterId,
            weapons::{KillWeapon, WeaponType},
        },
    };
    use math::math::{length, normalize, vector::vec2};
    use serde::{Deserialize, Serialize};

    use crate::{
        entities::character::{
            character::{Character, CharactersViewMut},
            core::character_core::PHYSICAL_SIZE,
        },
        simulation_pipe::simulation_pipe::SimulationPipe,
    };

    pub const EXPLOSION_RADIUS: f32 = 135.0;
    /// everything closer than this gets the full damage
    pub const EXPLOSION_INNER_RADIUS: f32 = 48.0;
    const EXPLOSION_KNOCKBACK: f32 = 6.0;

    /// Who an explosion affects.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum DamageLevel {
        #[default]
        All,
        ExemptOwner,
        None,
    }

    impl DamageLevel {
        /// `0` all, `1` everyone but the owner, everything else nobody.
        pub fn from_level(level: i32) -> Self {
            match level {
                0 => Self::All,
                1 => Self::ExemptOwner,
                _ => Self::None,
            }
        }

        pub fn affects(&self, target: &CharacterId, owner: &CharacterId) -> bool {
            match self {
                DamageLevel::All => true,
                DamageLevel::ExemptOwner => target != owner,
                DamageLevel::None => false,
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Explosion {
        pub pos: vec2,
        pub owner: CharacterId,
        pub weapon: WeaponType,
        pub damage: f32,
        pub knockback: DamageLevel,
        pub damage_level: DamageLevel,
        pub sound: bool,
    }

    /// Share of the damage at `dist` from the center of an explosion.
    pub fn explosion_falloff(dist: f32) -> f32 {
        1.0 - ((dist - EXPLOSION_INNER_RADIUS) / (EXPLOSION_RADIUS - EXPLOSION_INNER_RADIUS))
            .clamp(0.0, 1.0)
    }

    fn explode_on(character: &mut Character, sim: &mut SimulationPipe, explosion: &Explosion) {
        let diff = character.pos() - explosion.pos;
        let dist = length(&diff);
        if dist >= EXPLOSION_RADIUS + PHYSICAL_SIZE {
            return;
        }
        let force_dir = normalize(&diff);
        let l = explosion_falloff(dist);
        let damage = (explosion.damage * l) as i32;
        if damage == 0 {
            return;
        }

        let id = character.id();
        if explosion.knockback.affects(&id, &explosion.owner) {
            character.impulse_add(&(force_dir * (EXPLOSION_KNOCKBACK * l) * 2.0));
        }
        if explosion.damage_level.affects(&id, &explosion.owner) {
            character.take_damage(
                damage as f32,
                Some(explosion.owner),
                KillWeapon::Weapon(explosion.weapon),
                sim,
            );
        }
    }

    /// Radial damage and knockback around a point, the visual effect is always emitted.
    pub fn create_explosion(
        characters: &mut CharactersViewMut,
        sim: &mut SimulationPipe,
        explosion: &Explosion,
    ) {
        sim.events.push_effect(
            Some(explosion.owner),
            explosion.pos,
            GameWorldEntityEffectEvent::Grenade(GameGrenadeEventEffect::Explosion),
        );
        if explosion.sound {
            sim.events.push_sound(
                Some(explosion.owner),
                Some(explosion.pos),
                GameWorldEntitySoundEvent::Grenade(GameGrenadeEventSound::Explosion),
            );
        }

        characters.for_each_alive_mut(|character| explode_on(character, sim, explosion));
    }

}
