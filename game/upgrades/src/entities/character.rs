pub mod core;
pub mod player;

pub mod character {
    use std::f32::consts::PI;

    use game_interface::{
        events::{
            GameBuffNinjaEventSound, GameBuffSoundEvent, GameCharacterEffectEvent,
            GameCharacterEventEffect, GameCharacterEventSound, GameCharacterSoundEvent,
            GameWorldEntityEffectEvent, GameWorldEntitySoundEvent,
        },
        types::{
            account::{PlayerRank, UpgradeStat, UpgradeStats},
            emoticons::EmoteType,
            id_types::CharacterId,
            input::{CharacterInput, InputCount},
            pickup::PickupType,
            snapshot::{SnapCharacter, SnapItem},
            weapons::{KillWeapon, WeaponType, NUM_WEAPONS},
        },
    };
    use hashlink::LinkedHashMap;
    use math::math::{
        angle, distance, length, normalize, round_to_int,
        vector::{ivec2, vec2},
    };
    use num_traits::FromPrimitive;
    use rustc_hash::FxBuildHasher;

    use super::{
        core::character_core::{physical_size_vec2, Core, CoreEvents, PHYSICAL_SIZE},
        player::player::Player,
    };
    use crate::{
        bot::bot::{BotBrain, BotView, BOT_VISION_RANGE},
        collision::collision::{Collision, CollisionTile},
        config::config::{
            weapon_damage_scale, EventModifiers, ModTunables, Tunings, BASE_DAMAGE,
            HANDLING_GAIN_PER_TEN, LASER_RANGE_GAIN, NINJA_DAMAGE, NINJA_DURATION_MS,
            NINJA_MOVE_TIME_MS, NINJA_VELOCITY, SHOTGUN_BULLET_CAP,
        },
        damage::damage::{create_explosion, DamageLevel, Explosion},
        entities::{
            drop_life::drop_life::DropLife,
            entity::entity::{Entity, EntityInterface, EntityTickResult, SnapView},
            laser::laser::Laser,
            marker::marker::Marker,
            mine::mine::Mine,
            projectile::projectile::Projectile,
        },
        events::events::SimulationWorldEvent,
        simulation_pipe::simulation_pipe::{EntityPipe, SimulationPipe},
        state::state::TICKS_PER_SECOND,
        world::world::GameWorld,
    };

    /// Ammo of every bought weapon at spawn, `-1` is unlimited.
    pub const SPAWN_AMMO: i32 = 10;
    /// A baseline is sent at least this often, even if the prediction matches.
    pub const RECKONING_REFRESH_TICKS: i32 = TICKS_PER_SECOND as i32 * 3;
    /// Delay after an empty click.
    const NO_AMMO_RELOAD_MS: i32 = 125;
    /// Shots that can be fired in one tick when the reload timer lags far behind.
    const MAX_SHOTS_PER_TICK: usize = 16;
    const NINJA_HIT_CAP: usize = 10;
    /// Mouse wheel spins beyond this are treated as garbage.
    const MAX_SWITCH_PRESSES: i32 = 128;
    const PAIN_EMOTE_MS: i32 = 500;
    const BLINK_INTERVAL: i32 = 250;
    const MARKER_ORBIT_SPEED: f32 = 5.0;
    /// Distance of projectile spawns from the character center.
    const PROJ_START_OFFSET: f32 = PHYSICAL_SIZE * 0.75;

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct WeaponSlot {
        pub got: bool,
        pub ammo: i32,
    }

    #[derive(Debug, Default, Clone)]
    pub struct NinjaState {
        pub activation_dir: vec2,
        pub activation_tick: i32,
        pub current_move_time: i32,
        pub old_vel_amount: f32,
        hit_objects: Vec<CharacterId>,
    }

    /// One resolved trigger pull.
    #[derive(Debug, Clone, Copy)]
    pub struct WeaponFireEvent {
        pub weapon: WeaponType,
        pub direction: vec2,
        pub proj_start: vec2,
        pub damage: f32,
        /// the upgrade level of the weapon
        pub level: i32,
        pub alt_mode: bool,
    }

    /// Damage of a shot before falloff, scaled by the weapon's upgrade level.
    pub fn weapon_damage(
        weapon: WeaponType,
        stats: &UpgradeStats,
        alt_mode: bool,
        tunables: &ModTunables,
    ) -> f32 {
        let Some(base) = BASE_DAMAGE.get(weapon.index()).copied() else {
            return 0.0;
        };
        let level = stats.weapon(weapon);
        let mut damage =
            base + base * (tunables.damage_scaling as f32 / 100.0) * (level - 1) as f32;
        if weapon != WeaponType::Hammer || (!alt_mode && level >= tunables.req_hammer_fly) {
            damage *= weapon_damage_scale(weapon);
        }
        damage
    }

    /// Reload ticks after a shot.
    pub fn fire_rate(
        weapon: WeaponType,
        stats: &UpgradeStats,
        alt_mode: bool,
        tunings: &Tunings,
        tunables: &ModTunables,
        modifiers: &EventModifiers,
    ) -> f32 {
        let handling = (stats.get(UpgradeStat::Handling) + modifiers.bonus_handling()) as f32;
        let level = stats.weapon(weapon);
        let mut rate = tunings.fire_delay(weapon)
            / (1.0 + (handling / 10.0) * (HANDLING_GAIN_PER_TEN / 100.0))
            * TICKS_PER_SECOND as f32
            / 1000.0;

        match weapon {
            WeaponType::Hammer if level >= tunables.req_hammer_fly => {
                rate *= if alt_mode { 2.0 } else { 0.8 };
            }
            WeaponType::Gun if alt_mode && level >= tunables.req_gun_spread => {
                rate *= 4.0 / 3.0;
            }
            WeaponType::Laser if alt_mode => {
                if level >= tunables.req_rifle_dual {
                    rate /= 2.0;
                }
                if level >= tunables.req_rifle_triple {
                    rate /= 2.0;
                }
            }
            _ => {}
        }
        rate
    }

    /// Count of shotgun bullets, every level adds less than the one before.
    pub fn shotgun_bullets(level: i32) -> f32 {
        let mut num = 0.0_f32;
        for _ in 0..level {
            num += (1.5 / num).min(1.0);
        }
        num.min(SHOTGUN_BULLET_CAP as f32)
    }

    /// Direction of shot `index` out of a fan of `num` shots that are `spread`
    /// degrees apart.
    fn fan_direction(dir: &vec2, num: i32, spread: i32, index: i32) -> vec2 {
        let a = angle(dir) - (((num - 1) * spread / 2) as f32) * PI / 180.0
            + (index * spread) as f32 * PI / 180.0;
        vec2::new(a.cos(), a.sin())
    }

    #[derive(Debug)]
    pub struct Character {
        pub(crate) base: Entity<CharacterId>,
        pub core: Core,
        /// the last baseline that was sent
        send_core: Core,
        /// what clients extrapolate from the baseline
        reckoning_core: Core,
        reckoning_tick: i32,
        alive: bool,

        weapons: [WeaponSlot; NUM_WEAPONS],
        active_weapon: WeaponType,
        last_weapon: WeaponType,
        queued_weapon: Option<WeaponType>,
        /// ticks until the next shot, fractional rates accumulate
        reload_timer: f32,
        attack_tick: i32,

        emote: EmoteType,
        emote_stop: i32,
        last_action: i32,

        input: CharacterInput,
        latest_prev_input: CharacterInput,
        latest_input: CharacterInput,
        num_inputs: i32,

        /// can leave the displayed range, see [`Character::health`]
        vhealth: f32,
        varmor: f32,

        /// weapon origin of the previous tick, shots are spread along the way
        prev_pos: vec2,
        move_dir: vec2,
        move_dist: f32,

        triggered_events: CoreEvents,
        ninja: NinjaState,
        frozen: bool,
        spawn_protection: i32,

        pub(crate) mark_angle: f32,
        pub(crate) markers_spawned: bool,

        bot: Option<BotBrain>,
        bot_aim: Option<vec2>,
    }

    impl Character {
        pub fn new(
            id: &CharacterId,
            pos: vec2,
            player: &Player,
            tunables: &ModTunables,
            cur_tick: i32,
        ) -> Self {
            let stats = &player.account.stats;
            let mut weapons = [WeaponSlot::default(); NUM_WEAPONS];
            for (index, slot) in weapons.iter_mut().enumerate() {
                let Some(weapon) = WeaponType::from_usize(index) else {
                    continue;
                };
                if stats.owns_weapon(weapon) {
                    slot.got = true;
                    slot.ammo = match weapon {
                        WeaponType::Hammer | WeaponType::Gun => -1,
                        _ => SPAWN_AMMO,
                    };
                }
            }

            let owned_or_gun = |weapon: WeaponType| {
                if stats.owns_weapon(weapon) {
                    weapon
                } else {
                    WeaponType::Gun
                }
            };
            let (active_weapon, last_weapon) = match &player.bot {
                Some(prefs) => (owned_or_gun(prefs.primary), owned_or_gun(prefs.secondary)),
                None => {
                    let active = owned_or_gun(player.account.last_weapon);
                    let last = if active != WeaponType::Hammer {
                        WeaponType::Hammer
                    } else {
                        WeaponType::Gun
                    };
                    (active, last)
                }
            };

            let life = stats.get(UpgradeStat::Life) as f32;
            let mut res = Self {
                base: Entity::new(id),
                core: Core::new(pos),
                send_core: Core::default(),
                reckoning_core: Core::default(),
                reckoning_tick: 0,
                alive: true,

                weapons,
                active_weapon,
                last_weapon,
                queued_weapon: None,
                reload_timer: 0.0,
                attack_tick: 0,

                emote: player.account.default_emote,
                // a week
                emote_stop: cur_tick + TICKS_PER_SECOND as i32 * 604800,
                last_action: -1,

                input: CharacterInput::default(),
                latest_prev_input: CharacterInput::default(),
                latest_input: CharacterInput::default(),
                num_inputs: 0,

                vhealth: life * tunables.health_per_point,
                varmor: life * tunables.armor_per_point,

                prev_pos: pos,
                move_dir: vec2::new(0.0, 1.0),
                move_dist: 0.0,

                triggered_events: CoreEvents::empty(),
                ninja: NinjaState::default(),
                frozen: false,
                spawn_protection: tunables.spawn_protection_ticks(),

                mark_angle: 0.0,
                markers_spawned: false,

                bot: player.bot.map(|_| BotBrain::default()),
                bot_aim: None,
            };
            if player.account.rank == PlayerRank::Frozen {
                res.freeze();
            }
            res
        }

        pub fn id(&self) -> CharacterId {
            self.base.game_element_id
        }

        pub fn pos(&self) -> vec2 {
            self.core.pos
        }

        pub fn is_alive(&self) -> bool {
            self.alive
        }

        pub fn is_frozen(&self) -> bool {
            self.frozen
        }

        pub fn is_spawn_protected(&self) -> bool {
            self.spawn_protection > 0
        }

        pub fn active_weapon(&self) -> WeaponType {
            self.active_weapon
        }

        pub fn last_weapon(&self) -> WeaponType {
            self.last_weapon
        }

        pub fn weapon_slot(&self, weapon: WeaponType) -> &WeaponSlot {
            &self.weapons[weapon.index()]
        }

        pub fn reload_timer(&self) -> f32 {
            self.reload_timer
        }

        pub fn attack_tick(&self) -> i32 {
            self.attack_tick
        }

        pub fn emote(&self) -> EmoteType {
            self.emote
        }

        pub fn reckoning_tick(&self) -> i32 {
            self.reckoning_tick
        }

        pub fn send_core(&self) -> &Core {
            &self.send_core
        }

        pub fn virtual_health(&self) -> f32 {
            self.vhealth
        }

        pub fn virtual_armor(&self) -> f32 {
            self.varmor
        }

        /// Displayed health, the virtual health clamped to `[0, 10]`.
        pub fn health(&self) -> i32 {
            self.vhealth.clamp(0.0, 10.0) as i32
        }

        pub fn armor(&self) -> i32 {
            self.varmor.clamp(0.0, 10.0) as i32
        }

        pub fn set_emote(&mut self, emote: EmoteType, stop_tick: i32) {
            self.emote = emote;
            self.emote_stop = stop_tick;
        }

        fn push_sound(&self, sim: &SimulationPipe, ev: GameWorldEntitySoundEvent) {
            sim.events.push_sound(Some(self.id()), Some(self.core.pos), ev);
        }

        fn push_character_sound(&self, sim: &SimulationPipe, ev: GameCharacterEventSound) {
            self.push_sound(
                sim,
                GameWorldEntitySoundEvent::Character(GameCharacterSoundEvent::Sound(ev)),
            );
        }

        fn push_effect(&self, sim: &SimulationPipe, pos: vec2, ev: GameCharacterEventEffect) {
            sim.events.push_effect(
                Some(self.id()),
                pos,
                GameWorldEntityEffectEvent::Character(GameCharacterEffectEvent::Effect(ev)),
            );
        }

        /// Spawn protection also shields from knockback.
        pub fn impulse_add(&mut self, force: &vec2) {
            if self.is_spawn_protected() {
                return;
            }
            self.core.vel += *force;
        }

        pub fn increase_health(&mut self, amount: f32) {
            self.vhealth += amount;
        }

        pub fn increase_armor(&mut self, amount: f32) {
            self.varmor += amount;
        }

        /// Hammer and gun have unlimited ammo and gain nothing.
        pub fn gain_ammo_back(&mut self, amount: i32) {
            if self.active_weapon > WeaponType::Gun {
                self.weapons[self.active_weapon.index()].ammo += amount;
            }
        }

        /// Locks the character into a ninja that can not act.
        pub fn freeze(&mut self) {
            let ninja = &mut self.weapons[WeaponType::Ninja.index()];
            ninja.got = true;
            ninja.ammo = 0;
            if self.active_weapon != WeaponType::Ninja {
                self.last_weapon = self.active_weapon;
            }
            self.active_weapon = WeaponType::Ninja;
            self.queued_weapon = None;
            self.vhealth = 1.0;
            self.varmor = 0.0;
            self.input.reset();
            self.latest_input.reset();
            self.latest_prev_input = self.latest_input;
            self.frozen = true;
        }

        pub fn unfreeze(&mut self) {
            if !self.frozen {
                return;
            }
            self.frozen = false;
            self.weapons[WeaponType::Ninja.index()].got = false;
            self.active_weapon = if self.last_weapon != WeaponType::Ninja {
                self.last_weapon
            } else {
                WeaponType::Hammer
            };
        }

        /// A ninja that dashes on fire and runs out after a while.
        pub fn give_ninja(&mut self, cur_tick: i32) {
            if self.frozen {
                return;
            }
            let ninja = &mut self.weapons[WeaponType::Ninja.index()];
            ninja.got = true;
            ninja.ammo = -1;
            self.ninja.activation_tick = cur_tick;
            if self.active_weapon != WeaponType::Ninja {
                self.last_weapon = self.active_weapon;
            }
            self.active_weapon = WeaponType::Ninja;
        }

        fn set_weapon(&mut self, sim: &mut SimulationPipe, new_weapon: WeaponType) {
            if self.active_weapon == new_weapon {
                return;
            }
            self.last_weapon = self.active_weapon;
            self.queued_weapon = None;
            self.active_weapon = new_weapon;
            self.push_character_sound(sim, GameCharacterEventSound::WeaponSwitch { new_weapon });

            if new_weapon != WeaponType::Ninja {
                if let Some(player) = sim.players.get_mut(&self.id()) {
                    player.account.last_weapon = new_weapon;
                }
            }
        }

        fn do_weapon_switch(&mut self, sim: &mut SimulationPipe) {
            if self.reload_timer > 0.0 || self.weapons[WeaponType::Ninja.index()].got {
                return;
            }
            if let Some(weapon) = self.queued_weapon {
                self.set_weapon(sim, weapon);
            }
        }

        fn handle_weapon_switch(&mut self, sim: &mut SimulationPipe) {
            let mut wanted = self.queued_weapon.unwrap_or(self.active_weapon).index();
            let owns_any = self.weapons.iter().any(|w| w.got);

            let next = InputCount::count(
                self.latest_prev_input.next_weapon,
                self.latest_input.next_weapon,
            )
            .presses;
            let prev = InputCount::count(
                self.latest_prev_input.prev_weapon,
                self.latest_input.prev_weapon,
            )
            .presses;

            if owns_any && next < MAX_SWITCH_PRESSES {
                let mut next = next;
                while next > 0 {
                    wanted = (wanted + 1) % NUM_WEAPONS;
                    if self.weapons[wanted].got {
                        next -= 1;
                    }
                }
            }
            if owns_any && prev < MAX_SWITCH_PRESSES {
                let mut prev = prev;
                while prev > 0 {
                    wanted = (wanted + NUM_WEAPONS - 1) % NUM_WEAPONS;
                    if self.weapons[wanted].got {
                        prev -= 1;
                    }
                }
            }

            // direct selection overrides the wheel
            let mut wanted = WeaponType::from_usize(wanted);
            if self.input.wanted_weapon != 0 {
                wanted = self
                    .input
                    .wanted_weapon
                    .checked_sub(1)
                    .and_then(WeaponType::from_i32);
            }

            if let Some(wanted) = wanted {
                if wanted != self.active_weapon && self.weapons[wanted.index()].got {
                    self.queued_weapon = Some(wanted);
                }
            }

            self.do_weapon_switch(sim);
        }

        /// Fires the active weapon if the reload allows it. Bots pass where
        /// they aim at, they always pull the trigger.
        fn fire_weapon(&mut self, pipe: &mut EntityPipe, bot_aim: Option<vec2>) {
            if self.reload_timer > 0.0 {
                return;
            }

            self.do_weapon_switch(pipe.sim);

            let Some(player) = pipe.sim.players.get(&self.id()) else {
                return;
            };
            let stats = player.account.stats;
            let alt_mode = player.account.alt_mode;
            let bot_prefs = player.bot;
            let tunables = pipe.sim.mod_tunables;

            let mut direction = normalize(&vec2::new(
                self.latest_input.target_x as f32,
                self.latest_input.target_y as f32,
            ));

            let full_auto = match self.active_weapon {
                WeaponType::Hammer => {
                    stats.get(UpgradeStat::Hammer) >= tunables.req_hammer_auto
                }
                WeaponType::Gun => stats.get(UpgradeStat::Gun) >= tunables.req_gun_auto,
                _ => true,
            };

            let mut will_fire = InputCount::count(
                self.latest_prev_input.fire,
                self.latest_input.fire,
            )
            .presses
                > 0
                || (full_auto
                    && self.latest_input.fire_held()
                    && (self.weapons[self.active_weapon.index()].ammo != 0
                        || self.active_weapon == WeaponType::Gun));

            if let Some(aim) = bot_aim {
                if !matches!(self.active_weapon, WeaponType::Gun | WeaponType::Hammer)
                    && self.weapons[self.active_weapon.index()].ammo <= 0
                {
                    if let Some(prefs) =
                        bot_prefs.filter(|p| self.weapons[p.secondary.index()].got)
                    {
                        self.active_weapon = prefs.secondary;
                    }
                }
                direction = normalize(&aim);
                self.move_dist = 0.0;
                will_fire = true;
            }

            if !will_fire {
                self.reload_timer = 0.0;
                return;
            }

            if self.weapons[self.active_weapon.index()].ammo == 0
                && self.active_weapon != WeaponType::Gun
            {
                self.push_character_sound(
                    pipe.sim,
                    GameCharacterEventSound::NoAmmo {
                        weapon: self.active_weapon,
                    },
                );
                self.reload_timer =
                    (NO_AMMO_RELOAD_MS * TICKS_PER_SECOND as i32 / 1000) as f32;
                return;
            }

            self.spawn_protection = 0;

            let fire = WeaponFireEvent {
                weapon: self.active_weapon,
                direction,
                proj_start: self.core.pos + direction * PROJ_START_OFFSET,
                damage: weapon_damage(self.active_weapon, &stats, alt_mode, tunables),
                level: stats.weapon(self.active_weapon),
                alt_mode,
            };

            match fire.weapon {
                WeaponType::Hammer => self.fire_hammer(&fire, pipe),
                WeaponType::Gun => self.fire_gun(&fire, pipe.sim),
                WeaponType::Shotgun => self.fire_shotgun(&fire, pipe.sim),
                WeaponType::Grenade => self.fire_grenade(&fire, pipe.sim),
                WeaponType::Laser => self.fire_laser(&fire, pipe),
                WeaponType::Ninja => self.fire_ninja(&fire, pipe.sim),
            }

            self.attack_tick = pipe.sim.cur_tick;

            let slot = &mut self.weapons[self.active_weapon.index()];
            if slot.ammo > 0
                && self.active_weapon != WeaponType::Gun
                && pipe.sim.modifiers.uses_ammo()
            {
                slot.ammo -= 1;
            }

            self.reload_timer += fire_rate(
                self.active_weapon,
                &stats,
                alt_mode,
                pipe.sim.tunings,
                tunables,
                &pipe.sim.modifiers,
            );
            if !full_auto && matches!(self.active_weapon, WeaponType::Gun | WeaponType::Hammer)
            {
                self.reload_timer /= 2.0;
            }
        }

        /// Start of a shot that is fired late within a tick, moved along the
        /// path the character took since the last tick.
        fn lag_offset(&self) -> vec2 {
            self.move_dir * self.move_dist * self.reload_timer.abs()
        }

        fn fire_hammer(&mut self, fire: &WeaponFireEvent, pipe: &mut EntityPipe) {
            let id = self.id();
            let pos = self.core.pos;
            let tunables = pipe.sim.mod_tunables;
            let collision = pipe.sim.collision;
            let flying = fire.level >= tunables.req_hammer_fly;

            self.push_character_sound(pipe.sim, GameCharacterEventSound::HammerFire);

            for target in pipe.characters.values_mut().filter(|c| c.is_alive()) {
                let target_pos = target.pos();
                if distance(&target_pos, &fire.proj_start) >= PHYSICAL_SIZE * 0.5 + PHYSICAL_SIZE
                {
                    continue;
                }
                let mut hit = vec2::default();
                let mut before = vec2::default();
                if collision.intersect_line(&fire.proj_start, &target_pos, &mut hit, &mut before)
                    != CollisionTile::None
                {
                    continue;
                }

                let hit_pos = if length(&(target_pos - fire.proj_start)) > 0.0 {
                    target_pos - normalize(&(target_pos - fire.proj_start)) * PHYSICAL_SIZE * 0.5
                } else {
                    fire.proj_start
                };
                self.push_effect(pipe.sim, hit_pos, GameCharacterEventEffect::HammerHit);
                pipe.sim.events.push_sound(
                    Some(id),
                    Some(hit_pos),
                    GameWorldEntitySoundEvent::Character(GameCharacterSoundEvent::Sound(
                        GameCharacterEventSound::HammerHit,
                    )),
                );

                let dir = if length(&(target_pos - pos)) > 0.0 {
                    normalize(&(target_pos - pos))
                } else {
                    vec2::new(0.0, -1.0)
                };
                target.impulse_add(
                    &(vec2::new(0.0, -1.0) + normalize(&(dir + vec2::new(0.0, -1.1))) * 10.0),
                );
                if !flying || fire.alt_mode {
                    target.take_damage(
                        fire.damage,
                        Some(id),
                        KillWeapon::Weapon(WeaponType::Hammer),
                        pipe.sim,
                    );
                }
            }

            if !flying {
                return;
            }
            if !fire.alt_mode {
                let start = pos + self.lag_offset();
                self.impulse_add(&(fire.direction * 10.0));
                let explosion = Explosion {
                    pos: start,
                    owner: id,
                    weapon: WeaponType::Hammer,
                    damage: fire.damage,
                    knockback: DamageLevel::ExemptOwner,
                    damage_level: DamageLevel::ExemptOwner,
                    sound: false,
                };
                let mut characters = CharactersViewMut {
                    others: &mut *pipe.characters,
                    current: Some(&mut *self),
                };
                create_explosion(&mut characters, pipe.sim, &explosion);
            } else {
                let start = fire.proj_start + self.lag_offset();
                let mine_id = pipe.sim.next_id();
                let life_span = (TICKS_PER_SECOND as f32 * tunables.mine_lifetime_secs) as i32;
                pipe.sim.spawns.mines.push(Mine::new(
                    &mine_id,
                    id,
                    start,
                    life_span,
                    fire.damage,
                    true,
                    0.0,
                    pipe.sim.cur_tick,
                ));
            }
        }

        fn spawn_projectile(
            &self,
            sim: &mut SimulationPipe,
            weapon: WeaponType,
            start_pos: vec2,
            direction: vec2,
            life_span: i32,
            fire: &WeaponFireEvent,
            explosive: bool,
            force: f32,
            bounces: i32,
        ) {
            let proj_id = sim.next_id();
            sim.spawns.projectiles.push(Projectile::new(
                &proj_id,
                self.id(),
                weapon,
                start_pos,
                direction,
                sim.cur_tick,
                life_span,
                fire.damage,
                explosive,
                force,
                bounces,
            ));
        }

        fn fire_gun(&mut self, fire: &WeaponFireEvent, sim: &mut SimulationPipe) {
            const SPREAD: i32 = 7;
            let mut num = 1;
            if fire.level >= sim.mod_tunables.req_gun_spread {
                num += 1;
                if fire.alt_mode {
                    num += 1;
                }
            }
            let speed = sim.tunings.gun_speed / TICKS_PER_SECOND as f32;
            let life_span = (TICKS_PER_SECOND as f32 * sim.tunings.gun_lifetime) as i32;
            for i in 0..num {
                let d = fan_direction(&fire.direction, num, SPREAD, i);
                let start = self.core.pos
                    + d * PROJ_START_OFFSET
                    + d * speed * self.reload_timer.abs();
                self.spawn_projectile(sim, WeaponType::Gun, start, d, life_span, fire, false, 0.0, 0);
            }
            self.push_character_sound(sim, GameCharacterEventSound::GunFire);
        }

        fn fire_shotgun(&mut self, fire: &WeaponFireEvent, sim: &mut SimulationPipe) {
            let tunables = sim.mod_tunables;
            let tunings = sim.tunings;
            let spread = tunables.shotgun_spread_base * if fire.alt_mode { 2.0 } else { 1.0 };
            let num = shotgun_bullets(fire.level);
            let whole = num.floor() as i32;

            let lifetime_add = (fire.level as f32 * (tunables.shotgun_range_gain / 100.0)) as i32;
            let lifetime_penalty = (TICKS_PER_SECOND as f32
                * tunings.shotgun_lifetime
                * if fire.alt_mode { 0.5 } else { 0.0 }) as i32;
            let life_span = (TICKS_PER_SECOND as f32 * tunings.shotgun_lifetime
                + lifetime_add as f32
                - lifetime_penalty as f32) as i32;

            let base_angle = angle(&fire.direction);
            for i in 0..whole {
                let a = base_angle - ((whole - 1) as f32 / 2.0 * spread) * PI / 180.0
                    + i as f32 * spread * PI / 180.0;
                let speed_diff = (2.0 * ((-(num - 1.0) / 2.0 + i as f32) / whole as f32)).abs()
                    * (tunables.shotgun_speed_diff / 100.0);
                let d = vec2::new(a.cos(), a.sin());
                let start = self.core.pos
                    + fire.direction * 15.0
                    + d * PROJ_START_OFFSET
                    + d * (tunings.shotgun_speed * (1.0 - speed_diff) / TICKS_PER_SECOND as f32)
                        * self.reload_timer.abs();
                self.spawn_projectile(
                    sim,
                    WeaponType::Shotgun,
                    start,
                    d * (1.0 - speed_diff),
                    life_span,
                    fire,
                    false,
                    0.0,
                    0,
                );
            }
            self.push_character_sound(sim, GameCharacterEventSound::ShotgunFire);
        }

        fn fire_grenade(&mut self, fire: &WeaponFireEvent, sim: &mut SimulationPipe) {
            const SPREAD: i32 = 5;
            let tunables = sim.mod_tunables;
            let mut bounces = 0;
            let mut num = 1;
            for req in [tunables.req_grenade_bounce, tunables.req_grenade_bounce2] {
                if fire.level >= req {
                    if fire.alt_mode {
                        num += 1;
                    } else {
                        bounces += 1;
                    }
                }
            }

            let speed = sim.tunings.grenade_speed / TICKS_PER_SECOND as f32;
            let life_span = (TICKS_PER_SECOND as f32 * sim.tunings.grenade_lifetime) as i32;
            for i in 0..num {
                let d = fan_direction(&fire.direction, num, SPREAD, i);
                let start = self.core.pos
                    + d * PROJ_START_OFFSET
                    + d * speed * self.reload_timer.abs();
                // the outer grenades of a fan do not push the owner
                let force = if fire.alt_mode && i != 1 { 1.0 } else { 0.0 };
                self.spawn_projectile(
                    sim,
                    WeaponType::Grenade,
                    start,
                    d,
                    life_span,
                    fire,
                    true,
                    force,
                    bounces,
                );
            }
            self.push_character_sound(sim, GameCharacterEventSound::GrenadeFire);
        }

        fn fire_laser(&mut self, fire: &WeaponFireEvent, pipe: &mut EntityPipe) {
            let tunables = pipe.sim.mod_tunables;
            let mut num = 1;
            let mut spread = 5;
            let mut range_up = false;
            let mut explode = false;
            if fire.level >= tunables.req_rifle_dual {
                num = 2;
                spread = 3;
                explode = true;
            }
            if fire.level >= tunables.req_rifle_range {
                range_up = true;
            }
            if fire.level >= tunables.req_rifle_triple {
                num = 3;
                spread = 5;
            }
            if fire.alt_mode {
                num = 1;
                spread = 0;
            }

            let energy =
                pipe.sim.tunings.laser_reach + if range_up { LASER_RANGE_GAIN } else { 0.0 };
            for i in 0..num {
                let knockback = fire.alt_mode
                    || if fire.level < tunables.req_rifle_triple {
                        i == 0
                    } else {
                        i == 1
                    };
                let d = fan_direction(&fire.direction, num, spread, i);
                let laser_id = pipe.sim.next_id();
                let mut laser = Laser::new(
                    &laser_id,
                    self.id(),
                    self.core.pos,
                    d,
                    energy,
                    fire.damage,
                    explode,
                    knockback,
                    pipe.sim.cur_tick,
                );
                laser.do_bounce(pipe);
                pipe.sim.spawns.lasers.push(laser);
            }
            self.push_character_sound(pipe.sim, GameCharacterEventSound::LaserFire);
        }

        fn fire_ninja(&mut self, fire: &WeaponFireEvent, sim: &mut SimulationPipe) {
            if self.frozen {
                return;
            }
            self.ninja.hit_objects.clear();
            self.ninja.activation_dir = fire.direction;
            self.ninja.current_move_time = NINJA_MOVE_TIME_MS * TICKS_PER_SECOND as i32 / 1000;
            self.ninja.old_vel_amount = length(&self.core.vel);
            self.push_sound(
                sim,
                GameWorldEntitySoundEvent::Character(GameCharacterSoundEvent::Buff(
                    GameBuffSoundEvent::Ninja(GameBuffNinjaEventSound::Attack),
                )),
            );
        }

        fn handle_ninja(&mut self, pipe: &mut EntityPipe) {
            let duration = NINJA_DURATION_MS * TICKS_PER_SECOND as i32 / 1000;
            if pipe.sim.cur_tick - self.ninja.activation_tick > duration {
                self.weapons[WeaponType::Ninja.index()].got = false;
                self.active_weapon = self.last_weapon;
                if self.ninja.current_move_time > 0 {
                    self.core.vel = self.ninja.activation_dir * self.ninja.old_vel_amount;
                }
                return;
            }

            self.set_weapon(pipe.sim, WeaponType::Ninja);

            self.ninja.current_move_time -= 1;
            if self.ninja.current_move_time == 0 {
                self.core.vel = self.ninja.activation_dir * self.ninja.old_vel_amount;
            }
            if self.ninja.current_move_time <= 0 {
                return;
            }

            let old_pos = self.core.pos;
            let mut vel = self.ninja.activation_dir * NINJA_VELOCITY;
            pipe.sim
                .collision
                .move_box(&mut self.core.pos, &mut vel, &physical_size_vec2(), 0.0);
            // clients must not predict the dash
            self.core.vel = vec2::default();

            let center = old_pos + (self.core.pos - old_pos) * 0.5;
            let id = self.id();
            for target in pipe.characters.values_mut().filter(|c| c.is_alive()) {
                let target_id = target.id();
                if self.ninja.hit_objects.contains(&target_id) {
                    continue;
                }
                if distance(&target.pos(), &center) >= PHYSICAL_SIZE * 3.0
                    || distance(&target.pos(), &self.core.pos) > PHYSICAL_SIZE * 2.0
                {
                    continue;
                }
                if self.ninja.hit_objects.len() >= NINJA_HIT_CAP {
                    break;
                }
                pipe.sim.events.push_sound(
                    Some(id),
                    Some(target.pos()),
                    GameWorldEntitySoundEvent::Character(GameCharacterSoundEvent::Buff(
                        GameBuffSoundEvent::Ninja(GameBuffNinjaEventSound::Hit),
                    )),
                );
                self.ninja.hit_objects.push(target_id);
                target.take_damage(
                    NINJA_DAMAGE,
                    Some(id),
                    KillWeapon::Weapon(WeaponType::Ninja),
                    pipe.sim,
                );
            }
        }

        fn handle_weapons(&mut self, pipe: &mut EntityPipe) {
            let mut pos_trans = self.core.pos;
            if self.active_weapon == WeaponType::Hammer {
                pos_trans += normalize(&vec2::new(
                    self.latest_input.target_x as f32,
                    self.latest_input.target_y as f32,
                )) * PROJ_START_OFFSET;
            }
            let diff = self.prev_pos - pos_trans;
            self.move_dist = length(&diff);
            self.move_dir = if self.move_dist == 0.0 {
                vec2::new(0.0, 1.0)
            } else {
                normalize(&diff)
            };
            self.prev_pos = pos_trans;

            if self.reload_timer != 0.0 {
                self.reload_timer -= 1.0;
            }

            let mut shots = 0;
            while self.reload_timer < 0.0 && self.alive {
                if shots == MAX_SHOTS_PER_TICK {
                    self.reload_timer = 0.0;
                    break;
                }
                self.fire_weapon(pipe, None);
                shots += 1;
            }
        }

        fn on_predicted_input(&mut self, new_input: &CharacterInput, cur_tick: i32) {
            if self.frozen {
                return;
            }
            if self.input != *new_input {
                self.last_action = cur_tick;
            }
            self.input = *new_input;
            self.num_inputs += 1;
            self.input.sanitize_target();
        }

        fn on_direct_input(&mut self, new_input: &CharacterInput, pipe: &mut EntityPipe) {
            if self.frozen {
                return;
            }
            self.latest_prev_input = self.latest_input;
            self.latest_input = *new_input;
            self.latest_input.sanitize_target();

            if self.num_inputs > 2 {
                self.handle_weapon_switch(pipe.sim);
                self.fire_weapon(pipe, None);
            }

            self.latest_prev_input = self.latest_input;
        }

        /// Input as it arrives from the network.
        pub fn on_input(&mut self, new_input: &CharacterInput, pipe: &mut EntityPipe) {
            self.on_predicted_input(new_input, pipe.sim.cur_tick);
            self.on_direct_input(new_input, pipe);
        }

        /// Applies damage, armor first. Returns `false` if nothing was taken
        /// or the character died.
        pub fn take_damage(
            &mut self,
            mut dmg: f32,
            from: Option<CharacterId>,
            weapon: KillWeapon,
            sim: &mut SimulationPipe,
        ) -> bool {
            if !self.alive || self.is_spawn_protected() {
                return false;
            }

            let id = self.id();
            let self_damage = from == Some(id);
            if self_damage {
                dmg = (dmg / 2.0).max(1.0);
            }

            let old_health = self.vhealth;
            let old_armor = self.varmor;
            if dmg != 0.0 {
                if self.varmor != 0.0 {
                    if dmg > 1.0 {
                        self.vhealth -= 1.0;
                        dmg -= 1.0;
                    }
                    if dmg > self.varmor {
                        dmg -= self.varmor;
                        self.varmor = 0.0;
                    } else {
                        self.varmor -= dmg;
                        dmg = 0.0;
                    }
                }
                self.vhealth -= dmg;
            }

            self.push_effect(
                sim,
                self.core.pos,
                GameCharacterEventEffect::DamageIndicator {
                    health: ((old_health - self.vhealth).floor() as i32).min(9),
                    armor: ((old_armor - self.varmor).floor() as i32).min(9),
                    self_damage,
                },
            );

            if let Some(attacker) = from.filter(|attacker| *attacker != id) {
                if let Some(player) = sim.players.get(&attacker) {
                    sim.events.push_sound(
                        Some(attacker),
                        Some(player.view_pos),
                        GameWorldEntitySoundEvent::Character(GameCharacterSoundEvent::Sound(
                            GameCharacterEventSound::Hit,
                        )),
                    );
                }
            }

            if self.vhealth <= 0.0 {
                self.die(from, weapon, sim);
                return false;
            }

            self.push_character_sound(sim, GameCharacterEventSound::Pain { long: dmg > 2.0 });
            self.set_emote(
                EmoteType::Pain,
                sim.cur_tick + PAIN_EMOTE_MS * TICKS_PER_SECOND as i32 / 1000,
            );
            true
        }

        /// Kills the character. It stays in the world until the end of the tick,
        /// kill rewards are handled there too.
        pub fn die(
            &mut self,
            killer: Option<CharacterId>,
            weapon: KillWeapon,
            sim: &mut SimulationPipe,
        ) {
            if !self.alive {
                return;
            }
            let id = self.id();
            let pos = self.core.pos;

            if weapon.is_weapon() {
                let life = sim
                    .players
                    .get(&id)
                    .map(|p| p.account.stats.get(UpgradeStat::Life))
                    .unwrap_or(1) as f32;
                let tunables = sim.mod_tunables;
                let ratio = tunables.drop_life_ratio;
                let health_amount = (life * tunables.health_per_point * ratio / 100.0).max(1.0);
                let armor_amount = (life * tunables.armor_per_point * ratio / 100.0).max(1.0);

                let a = 2.0 * PI * sim.rng.random_float();
                for (offset, ty, amount) in [
                    (0.0, PickupType::PowerupHealth, health_amount),
                    (PI, PickupType::PowerupArmor, armor_amount),
                ] {
                    let dir = vec2::new((a + offset).cos(), (a + offset).sin());
                    let drop_id = sim.next_id();
                    sim.spawns.drops.push(DropLife::new(
                        &drop_id,
                        pos + dir * 35.0,
                        -dir,
                        amount,
                        ty,
                        tunables,
                    ));
                }
            }

            self.alive = false;
            self.base.marked_for_destroy = true;
            self.push_character_sound(sim, GameCharacterEventSound::Death);
            self.push_effect(sim, pos, GameCharacterEventEffect::Death);
            sim.sim_events.push(SimulationWorldEvent::CharacterDeath {
                victim: id,
                killer,
                weapon,
                pos,
            });
        }

        fn touches_death(&self, collision: &Collision) -> bool {
            let r = PHYSICAL_SIZE / 3.0;
            let p = self.core.pos;
            collision.is_death(p.x + r, p.y - r)
                || collision.is_death(p.x + r, p.y + r)
                || collision.is_death(p.x - r, p.y - r)
                || collision.is_death(p.x - r, p.y + r)
        }

        fn tick_bot(&mut self, pipe: &mut EntityPipe) {
            self.bot_aim = None;
            if self.bot.is_none() {
                return;
            }
            let info = pipe.sim.bot_info;
            if !info.has_humans {
                self.input.direction = 0;
                return;
            }
            if !info.has_active_humans {
                self.vhealth = self.vhealth.min(1.0);
                self.varmor = self.varmor.min(1.0);
            }

            let Some(player) = pipe.sim.players.get(&self.id()) else {
                return;
            };
            let stats = player.account.stats;
            let tunables = pipe.sim.mod_tunables;
            let pos = self.core.pos;
            let target = GameWorld::closest_character(pipe.characters, &pos, BOT_VISION_RANGE, None)
                .and_then(|id| pipe.characters.get(&id).map(|c| (id, c.pos())));

            let view = BotView {
                collision: pipe.sim.collision,
                pos,
                grounded: self.core.is_grounded(pipe.sim.collision),
                weapon: self.active_weapon,
                hammer_fly: stats.get(UpgradeStat::Hammer) >= tunables.req_hammer_fly,
                hammer_auto: stats.get(UpgradeStat::Hammer) >= tunables.req_hammer_auto,
                gun_auto: stats.get(UpgradeStat::Gun) >= tunables.req_gun_auto,
                alt_mode: player.account.alt_mode,
                laser_reach: pipe.sim.tunings.laser_reach,
                target,
            };
            let Some(brain) = self.bot.as_mut() else {
                return;
            };
            let out = brain.tick(&view, pipe.sim.rng);

            self.input.direction = out.direction;
            self.input.target_x = out.target_x;
            self.input.target_y = out.target_y;
            self.input.jump = out.jump;
            self.input.hook = out.hook;
            self.input.sanitize_target();
            self.bot_aim = out.shoot.then_some(out.aim);
        }

        fn spawn_rank_markers(&mut self, sim: &mut SimulationPipe) {
            let Some(account) = sim.players.get(&self.id()).map(|p| &p.account) else {
                return;
            };
            let count = account.rank.marker_count();
            if count == 0 || account.undercover {
                return;
            }
            for slot in 0..count {
                let marker_id = sim.next_id();
                sim.spawns.markers.push(Marker::new_rank(
                    &marker_id,
                    self.id(),
                    slot,
                    count,
                    self.core.pos,
                    sim.cur_tick,
                ));
            }
            self.markers_spawned = true;
        }

        /// Current weapon ammo as shown to the owner.
        fn snap_ammo(&self) -> i32 {
            if self.active_weapon == WeaponType::Ninja {
                self.ninja.activation_tick + NINJA_DURATION_MS * TICKS_PER_SECOND as i32 / 1000
            } else {
                self.weapons[self.active_weapon.index()].ammo.max(0)
            }
        }

        pub fn post_snap(&mut self) {
            self.triggered_events = CoreEvents::empty();
        }
    }

    impl EntityInterface for Character {
        fn tick(&mut self, pipe: &mut EntityPipe) -> EntityTickResult {
            if !self.alive {
                return EntityTickResult::None;
            }

            let id = self.id();
            if let Some(input) = pipe
                .sim
                .players
                .get_mut(&id)
                .and_then(|p| p.pending_input.take())
            {
                self.on_input(&input, pipe);
            }

            self.tick_bot(pipe);

            self.core.input = self.input;
            self.core
                .physics_tick(true, pipe.sim.collision, pipe.sim.tunings);

            if self.alive
                && (self.touches_death(pipe.sim.collision)
                    || Entity::<CharacterId>::outside_of_playfield(
                        &self.core.pos,
                        pipe.sim.collision,
                    ))
            {
                self.die(Some(id), KillWeapon::World, pipe.sim);
            }
            if !self.alive {
                return EntityTickResult::None;
            }

            if self.active_weapon == WeaponType::Ninja && !self.frozen {
                self.handle_ninja(pipe);
            }
            self.handle_weapons(pipe);

            if let Some(aim) = self.bot_aim.filter(|_| self.alive) {
                self.handle_weapon_switch(pipe.sim);
                self.fire_weapon(pipe, Some(aim));
            }
            if !self.alive {
                return EntityTickResult::None;
            }

            self.mark_angle += MARKER_ORBIT_SPEED;
            if !self.markers_spawned {
                self.spawn_rank_markers(pipe.sim);
            }

            if self.spawn_protection > 0 {
                self.spawn_protection -= 1;
            }

            EntityTickResult::None
        }

        fn tick_deferred(&mut self, pipe: &mut EntityPipe) -> EntityTickResult {
            let sim = &mut *pipe.sim;
            let collision = sim.collision;
            let cur_tick = sim.cur_tick;

            self.reckoning_core = self.reckoning_core.predict(collision, sim.tunings);

            let start_pos = self.core.pos;
            let start_vel = self.core.vel;
            let stuck_before = collision.test_box(
                &ivec2::new(round_to_int(start_pos.x), round_to_int(start_pos.y)),
                &physical_size_vec2(),
            );
            self.core.physics_move(collision, sim.tunings);
            let stuck_after = collision.test_box(
                &ivec2::new(round_to_int(self.core.pos.x), round_to_int(self.core.pos.y)),
                &physical_size_vec2(),
            );
            if !stuck_before && stuck_after {
                log::debug!(
                    target: "character",
                    "{} got stuck moving from {:?} with {:?} to {:?}",
                    self.id(),
                    start_pos,
                    start_vel,
                    self.core.pos
                );
            }
            self.core.physics_quantize();

            let events = self.core.triggered_events;
            self.triggered_events |= events;
            if events.contains(CoreEvents::GROUND_JUMP) {
                self.push_character_sound(sim, GameCharacterEventSound::GroundJump);
            }
            if events.contains(CoreEvents::AIR_JUMP) {
                self.push_character_sound(sim, GameCharacterEventSound::AirJump);
            }
            if events.contains(CoreEvents::HOOK_ATTACH_GROUND) {
                self.push_character_sound(
                    sim,
                    GameCharacterEventSound::HookHitHookable {
                        hook_pos: Some(self.core.hook_pos),
                    },
                );
            }

            if self.reckoning_tick + RECKONING_REFRESH_TICKS < cur_tick
                || self.reckoning_core.write(0) != self.core.write(0)
            {
                self.reckoning_tick = cur_tick;
                self.send_core = self.core;
                self.reckoning_core = self.core;
            }

            if let Some(player) = sim.players.get_mut(&self.id()) {
                player.view_pos = self.core.pos;
                if self.emote_stop < cur_tick {
                    self.emote = player.account.default_emote;
                    self.emote_stop = -1;
                }
            }

            EntityTickResult::None
        }

        fn tick_paused(&mut self) {
            self.attack_tick += 1;
            self.ninja.activation_tick += 1;
            self.reckoning_tick += 1;
            if self.last_action != -1 {
                self.last_action += 1;
            }
            if self.emote_stop > -1 {
                self.emote_stop += 1;
            }
        }

        fn snap(&self, view: &SnapView) -> Option<SnapItem> {
            if !self.alive || view.network_clipped(&self.core.pos) {
                return None;
            }

            let mut core = if self.reckoning_tick == 0 || view.paused {
                self.core.write(0)
            } else {
                self.send_core.write(self.reckoning_tick)
            };
            core.direction = self.input.direction;

            let owner_view = view.observer.is_none() || view.observer == Some(self.id());
            let (health, armor, ammo_count) = if owner_view {
                (self.health(), self.armor(), self.snap_ammo())
            } else {
                (0, 0, 0)
            };

            let mut emote = self.emote;
            if emote == EmoteType::Normal
                && BLINK_INTERVAL
                    - (view.cur_tick - self.last_action).rem_euclid(BLINK_INTERVAL)
                    < 5
            {
                emote = EmoteType::Blink;
            }

            Some(SnapItem::Character(SnapCharacter {
                core,
                health,
                armor,
                ammo_count,
                weapon: self.active_weapon as i32,
                emote: emote as i32,
                attack_tick: self.attack_tick,
                triggered_events: self.triggered_events.bits(),
            }))
        }
    }

    pub type Characters = LinkedHashMap<CharacterId, Character, FxBuildHasher>;

    /// All characters an area effect can reach. While a character ticks it
    /// is taken out of the map, `current` gives access to it anyway.
    pub struct CharactersViewMut<'a> {
        pub others: &'a mut Characters,
        pub current: Option<&'a mut Character>,
    }

    impl<'a> CharactersViewMut<'a> {
        pub fn all(characters: &'a mut Characters) -> Self {
            Self {
                others: characters,
                current: None,
            }
        }

        pub fn for_each_alive_mut(&mut self, mut f: impl FnMut(&mut Character)) {
            for character in self.others.values_mut().filter(|c| c.is_alive()) {
                f(character);
            }
            if let Some(character) = self.current.as_deref_mut().filter(|c| c.is_alive()) {
                f(character);
            }
        }
    }

    #[cfg(test)]
    mod test {
        use game_interface::types::{
            account::{AccountInfo, UpgradeStat, UpgradeStats},
            id_types::CharacterId,
            input::CharacterInput,
            snapshot::SnapItem,
            weapons::{KillWeapon, WeaponType},
        };
        use math::math::vector::vec2;

        use super::{fire_rate, shotgun_bullets, weapon_damage, Character, RECKONING_REFRESH_TICKS};
        use crate::{
            config::config::{EventModifiers, ModTunables, Tunings},
            entities::{
                character::player::player::{BotPreferences, Player},
                entity::entity::{EntityInterface, SnapView},
            },
            simulation_pipe::simulation_pipe::EntityPipe,
            test_util::test_util::TestSim,
        };

        fn spawn(sim: &mut TestSim, slot: u32, pos: vec2) -> Character {
            let id = CharacterId::new(slot);
            let player = sim.players.get(&id).cloned().unwrap_or_else(|| {
                let player = Player::new(id, AccountInfo::default(), None);
                sim.players.insert(id, player.clone());
                player
            });
            Character::new(&id, pos, &player, &sim.tunables, 0)
        }

        #[test]
        fn armor_takes_damage_before_health() {
            let mut sim = TestSim::new("#####\n#...#\n#####\n");
            let mut tunables = ModTunables::default();
            tunables.spawn_protection_secs = 0.0;
            sim.tunables = tunables;
            let mut c = spawn(&mut sim, 0, vec2::new(48.0, 48.0));
            c.vhealth = 10.0;
            c.varmor = 3.0;
            let mut pipe = sim.pipe();
            assert!(c.take_damage(5.0, Some(CharacterId::new(1)), KillWeapon::World, &mut pipe));
            // one bonus health point, the rest from armor, the remainder to health
            assert_eq!(c.virtual_armor(), 0.0);
            assert_eq!(c.virtual_health(), 8.0);

            c.varmor = 5.0;
            assert!(c.take_damage(1.0, Some(CharacterId::new(1)), KillWeapon::World, &mut pipe));
            assert_eq!(c.virtual_armor(), 4.0);
            assert_eq!(c.virtual_health(), 8.0);
        }

        #[test]
        fn self_damage_is_halved() {
            let mut sim = TestSim::new("#####\n#...#\n#####\n");
            sim.tunables.spawn_protection_secs = 0.0;
            let mut c = spawn(&mut sim, 0, vec2::new(48.0, 48.0));
            c.vhealth = 10.0;
            c.varmor = 0.0;
            let mut pipe = sim.pipe();
            assert!(c.take_damage(1.0, Some(CharacterId::new(0)), KillWeapon::World, &mut pipe));
            assert_eq!(c.virtual_health(), 9.0);
            assert!(c.take_damage(6.0, Some(CharacterId::new(0)), KillWeapon::World, &mut pipe));
            assert_eq!(c.virtual_health(), 6.0);
        }

        #[test]
        fn displayed_values_are_clamped() {
            let mut sim = TestSim::new("#####\n#...#\n#####\n");
            let mut c = spawn(&mut sim, 0, vec2::new(48.0, 48.0));
            c.increase_health(40.0);
            c.varmor = -3.0;
            assert_eq!(c.health(), 10);
            assert_eq!(c.armor(), 0);
        }

        #[test]
        fn spawn_protection_blocks_damage_and_knockback() {
            let mut sim = TestSim::new("#####\n#...#\n#####\n");
            sim.tunables.spawn_protection_secs = 1.0;
            let mut c = spawn(&mut sim, 0, vec2::new(48.0, 48.0));
            assert!(c.is_spawn_protected());
            let health = c.virtual_health();
            let mut pipe = sim.pipe();
            assert!(!c.take_damage(5.0, Some(CharacterId::new(1)), KillWeapon::World, &mut pipe));
            assert_eq!(c.virtual_health(), health);
            c.impulse_add(&vec2::new(10.0, -10.0));
            assert_eq!(c.core.vel, vec2::default());
        }

        #[test]
        fn lethal_weapon_damage_drops_life() {
            let mut sim = TestSim::new("#######\n#.....#\n#######\n");
            sim.tunables.spawn_protection_secs = 0.0;
            let mut c = spawn(&mut sim, 0, vec2::new(80.0, 48.0));
            c.vhealth = 10.0;
            c.varmor = 0.0;
            let mut pipe = sim.pipe();
            assert!(!c.take_damage(
                15.0,
                Some(CharacterId::new(1)),
                KillWeapon::Weapon(WeaponType::Gun),
                &mut pipe
            ));
            assert!(!c.is_alive());
            assert_eq!(pipe.spawns.drops.len(), 2);
            assert_eq!(pipe.sim_events.len(), 1);
        }

        #[test]
        fn world_deaths_drop_nothing() {
            let mut sim = TestSim::new("#######\n#.....#\n#######\n");
            let mut c = spawn(&mut sim, 0, vec2::new(80.0, 48.0));
            let mut pipe = sim.pipe();
            c.die(Some(CharacterId::new(0)), KillWeapon::World, &mut pipe);
            assert!(pipe.spawns.drops.is_empty());
            // dying twice is a no-op
            c.die(Some(CharacterId::new(0)), KillWeapon::World, &mut pipe);
            assert_eq!(pipe.sim_events.len(), 1);
        }

        #[test]
        fn damage_formula() {
            let tunables = ModTunables::default();
            let mut stats = UpgradeStats::default();
            stats.set(UpgradeStat::Gun, 5);
            // 1 + 1 * 0.25 * 4, times the gun scale
            let gun = weapon_damage(WeaponType::Gun, &stats, false, &tunables);
            assert!((gun - 2.0 * 1.65).abs() < 0.0001);

            stats.set(UpgradeStat::Hammer, tunables.req_hammer_fly);
            let hammer = weapon_damage(WeaponType::Hammer, &stats, false, &tunables);
            let base = 3.0 + 3.0 * 0.25 * (tunables.req_hammer_fly - 1) as f32;
            assert!((hammer - base * 3.0).abs() < 0.0001);
            let hammer_alt = weapon_damage(WeaponType::Hammer, &stats, true, &tunables);
            assert!((hammer_alt - base).abs() < 0.0001);
            assert_eq!(weapon_damage(WeaponType::Ninja, &stats, false, &tunables), 0.0);
        }

        #[test]
        fn fire_rate_formula() {
            let tunings = Tunings::default();
            let tunables = ModTunables::default();
            let modifiers = EventModifiers::default();
            let mut stats = UpgradeStats::default();
            let base = fire_rate(
                WeaponType::Grenade,
                &stats,
                false,
                &tunings,
                &tunables,
                &modifiers,
            );
            assert!((base - 25.0).abs() < 0.0001);

            stats.set(UpgradeStat::Handling, 20);
            let fast = fire_rate(
                WeaponType::Grenade,
                &stats,
                false,
                &tunings,
                &tunables,
                &modifiers,
            );
            assert!((fast - 12.5).abs() < 0.0001);

            let rapid = EventModifiers {
                rapid_fire: true,
                ..Default::default()
            };
            let rapid_rate = fire_rate(
                WeaponType::Grenade,
                &UpgradeStats::default(),
                false,
                &tunings,
                &tunables,
                &rapid,
            );
            assert!(rapid_rate < fast);

            stats.set(UpgradeStat::Laser, tunables.req_rifle_triple);
            let laser = fire_rate(WeaponType::Laser, &stats, false, &tunings, &tunables, &modifiers);
            let laser_alt =
                fire_rate(WeaponType::Laser, &stats, true, &tunings, &tunables, &modifiers);
            assert!((laser / 4.0 - laser_alt).abs() < 0.0001);
        }

        #[test]
        fn shotgun_bullet_growth() {
            assert_eq!(shotgun_bullets(0), 0.0);
            assert_eq!(shotgun_bullets(1), 1.0);
            assert_eq!(shotgun_bullets(2), 2.0);
            assert!((shotgun_bullets(3) - 2.75).abs() < 0.0001);
            assert_eq!(shotgun_bullets(10_000), 30.0);
        }

        #[test]
        fn spawn_loadout() {
            let mut sim = TestSim::new("#####\n#...#\n#####\n");
            let id = CharacterId::new(0);
            let mut account = AccountInfo::default();
            account.stats.set(UpgradeStat::Grenade, 1);
            account.last_weapon = WeaponType::Grenade;
            sim.players.insert(id, Player::new(id, account, None));
            let c = spawn(&mut sim, 0, vec2::new(48.0, 48.0));
            assert_eq!(c.active_weapon(), WeaponType::Grenade);
            assert_eq!(c.last_weapon(), WeaponType::Hammer);
            assert_eq!(c.weapon_slot(WeaponType::Grenade).ammo, 10);
            assert_eq!(c.weapon_slot(WeaponType::Hammer).ammo, -1);
            assert!(!c.weapon_slot(WeaponType::Laser).got);
            // life 1 with 6 per point
            assert_eq!(c.virtual_health(), 6.0);
            assert_eq!(c.health(), 6);
        }

        #[test]
        fn freeze_gates_input() {
            let mut sim = TestSim::new("#######\n#.....#\n#.....#\n#######\n");
            let mut c = spawn(&mut sim, 0, vec2::new(80.0, 48.0));
            c.freeze();
            assert!(c.is_frozen());
            assert_eq!(c.active_weapon(), WeaponType::Ninja);
            assert_eq!(c.virtual_health(), 1.0);
            assert_eq!(c.armor(), 0);

            let input = CharacterInput {
                direction: 1,
                fire: 1,
                ..Default::default()
            };
            let mut pipe = sim.pipe();
            let mut others = Default::default();
            let mut entity_pipe = EntityPipe {
                sim: &mut pipe,
                characters: &mut others,
            };
            c.on_input(&input, &mut entity_pipe);
            assert_eq!(c.input.direction, 0);

            c.unfreeze();
            assert!(!c.is_frozen());
            assert_eq!(c.active_weapon(), WeaponType::Gun);
        }

        #[test]
        fn reckoning_refreshes_on_divergence_and_timeout() {
            let mut sim = TestSim::new(
                "##########\n#........#\n#........#\n#........#\n##########\n",
            );
            let mut c = spawn(&mut sim, 0, vec2::new(144.0, 112.0));
            let mut others = Default::default();

            let mut last_refresh = 0;
            for tick in 1..=400 {
                sim.cur_tick = tick;
                let mut pipe = sim.pipe();
                let mut entity_pipe = EntityPipe {
                    sim: &mut pipe,
                    characters: &mut others,
                };
                let _ = c.tick(&mut entity_pipe);
                let _ = c.tick_deferred(&mut entity_pipe);
                if c.reckoning_tick() == tick {
                    assert!(tick - last_refresh <= RECKONING_REFRESH_TICKS + 1);
                    last_refresh = tick;
                }
                assert!(tick - c.reckoning_tick() <= RECKONING_REFRESH_TICKS + 1);
            }

            // standing still, the prediction holds until the baseline times out
            let idle_since = c.reckoning_tick();
            assert!(idle_since > 0);

            // a push diverges from the prediction right away
            let tick = sim.cur_tick + 1;
            sim.cur_tick = tick;
            c.core.vel = vec2::new(0.0, -8.0);
            let mut pipe = sim.pipe();
            let mut entity_pipe = EntityPipe {
                sim: &mut pipe,
                characters: &mut others,
            };
            let _ = c.tick(&mut entity_pipe);
            let _ = c.tick_deferred(&mut entity_pipe);
            assert_eq!(c.reckoning_tick(), tick);
        }

        #[test]
        fn snapshot_hides_stats_from_others() {
            let mut sim = TestSim::new("#####\n#...#\n#####\n");
            let c = spawn(&mut sim, 0, vec2::new(48.0, 48.0));
            let mut view = SnapView {
                observer: Some(CharacterId::new(1)),
                view_pos: Some(vec2::new(48.0, 48.0)),
                cur_tick: 0,
                paused: false,
            };
            let Some(SnapItem::Character(other)) = c.snap(&view) else {
                panic!("character not snapped");
            };
            assert_eq!(other.health, 0);
            view.observer = Some(CharacterId::new(0));
            let Some(SnapItem::Character(own)) = c.snap(&view) else {
                panic!("character not snapped");
            };
            assert_eq!(own.health, 6);
            assert_eq!(own.core.tick, 0);
            view.view_pos = Some(vec2::new(2000.0, 48.0));
            assert!(c.snap(&view).is_none());
        }

        #[test]
        fn out_of_range_weapon_selection_is_ignored() {
            let mut sim = TestSim::new("#######\n#.....#\n#.....#\n#######\n");
            let mut c = spawn(&mut sim, 0, vec2::new(80.0, 48.0));
            let start_weapon = c.active_weapon();
            let mut others = Default::default();

            for (i, wanted_weapon) in [i32::MIN, i32::MAX, -1, 7, 4]
                .into_iter()
                .enumerate()
            {
                sim.cur_tick = i as i32 + 1;
                let input = CharacterInput {
                    wanted_weapon,
                    fire: if i % 2 == 0 { i32::MAX } else { i32::MIN },
                    next_weapon: i32::MIN,
                    prev_weapon: i32::MAX,
                    ..Default::default()
                };
                let mut pipe = sim.pipe();
                let mut entity_pipe = EntityPipe {
                    sim: &mut pipe,
                    characters: &mut others,
                };
                c.on_input(&input, &mut entity_pipe);
                let _ = c.tick(&mut entity_pipe);
                let _ = c.tick_deferred(&mut entity_pipe);
                // 4 selects the grenade, which is not owned
                assert_eq!(c.active_weapon(), start_weapon);
            }
        }

        #[test]
        fn bots_only_fall_back_to_owned_weapons() {
            let mut sim = TestSim::new("#######\n#.....#\n#.....#\n#######\n");
            let id = CharacterId::new(0);
            let prefs = BotPreferences {
                primary: WeaponType::Shotgun,
                secondary: WeaponType::Grenade,
            };
            sim.players
                .insert(id, Player::new(id, AccountInfo::default(), Some(prefs)));
            let mut c = spawn(&mut sim, 0, vec2::new(80.0, 48.0));
            c.weapons[WeaponType::Shotgun.index()] = super::WeaponSlot { got: true, ammo: 0 };
            c.active_weapon = WeaponType::Shotgun;

            let mut others = Default::default();
            let mut pipe = sim.pipe();
            let mut entity_pipe = EntityPipe {
                sim: &mut pipe,
                characters: &mut others,
            };
            c.fire_weapon(&mut entity_pipe, Some(vec2::new(1.0, 0.0)));
            assert_ne!(c.active_weapon(), WeaponType::Grenade);

            c.weapons[WeaponType::Grenade.index()] = super::WeaponSlot { got: true, ammo: 10 };
            c.reload_timer = 0.0;
            c.fire_weapon(&mut entity_pipe, Some(vec2::new(1.0, 0.0)));
            assert_eq!(c.active_weapon(), WeaponType::Grenade);
        }
    }
}
