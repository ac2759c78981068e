pub mod world {
    use std::hash::Hash;

    use game_interface::{
        events::{
            GameCharacterEffectEvent, GameCharacterEventEffect, GameCharacterEventSound,
            GameCharacterSoundEvent, GameWorldAction, GameWorldEntityEffectEvent,
            GameWorldEntitySoundEvent, GameWorldEvent, GameWorldNotificationEvent,
            GameWorldSystemMessage, KillFlags,
        },
        types::{
            account::PlayerRank,
            emoticons::EmoteType,
            id_gen::{IdGenerator, IdGeneratorIdType},
            id_types::{CharacterId, LaserId, MarkerId, PickupId, PlayerId, ProjectileId},
            snapshot::SnapObject,
            weapons::{KillWeapon, WeaponType},
        },
    };
    use hashlink::LinkedHashMap;
    use math::math::{closest_point_on_line, distance, vector::vec2};
    use rustc_hash::FxBuildHasher;

    use crate::{
        collision::collision::Collision,
        damage::damage::{create_explosion, DamageLevel, Explosion},
        entities::{
            character::{
                character::{Character, Characters, CharactersViewMut},
                core::character_core::PHYSICAL_SIZE,
                player::player::{Player, Players},
            },
            drop_life::drop_life::DropLife,
            entity::entity::{Entity, EntityInterface, EntityTickResult, SnapView},
            laser::laser::Laser,
            marker::marker::Marker,
            mine::mine::Mine,
            projectile::projectile::Projectile,
        },
        events::events::SimulationWorldEvent,
        simulation_pipe::simulation_pipe::{
            BotWorldInfo, EntityPipe, GameWorldPendingEvents, PendingSpawns, SimulationPipe,
            SimulationPipeWorld,
        },
        state::state::TICKS_PER_SECOND,
    };

    pub type Projectiles = LinkedHashMap<ProjectileId, Projectile, FxBuildHasher>;
    pub type Mines = LinkedHashMap<ProjectileId, Mine, FxBuildHasher>;
    pub type Lasers = LinkedHashMap<LaserId, Laser, FxBuildHasher>;
    pub type DropLifes = LinkedHashMap<PickupId, DropLife, FxBuildHasher>;
    pub type Markers = LinkedHashMap<MarkerId, Marker, FxBuildHasher>;

    /// Delay between a death and the respawn.
    pub const RESPAWN_DELAY_TICKS: i32 = TICKS_PER_SECOND as i32 / 2;
    const KILLER_EMOTE_TICKS: i32 = TICKS_PER_SECOND as i32;
    /// Levels a victim must be above the killer per bonus step.
    const LEVEL_DIFF_STEP: i32 = 50;
    const LEVEL_UP_MONEY: i32 = 5;

    /// Entities the world keeps in id keyed maps.
    trait WorldEntity: EntityInterface {
        type Id: Copy + Eq + Hash + Into<IdGeneratorIdType>;
        fn base(&self) -> &Entity<Self::Id>;
        fn base_mut(&mut self) -> &mut Entity<Self::Id>;
    }

    macro_rules! world_entity {
        ($ty:ty, $id:ty) => {
            impl WorldEntity for $ty {
                type Id = $id;
                fn base(&self) -> &Entity<$id> {
                    &self.base
                }
                fn base_mut(&mut self) -> &mut Entity<$id> {
                    &mut self.base
                }
            }
        };
    }

    world_entity!(Projectile, ProjectileId);
    world_entity!(Mine, ProjectileId);
    world_entity!(Laser, LaserId);
    world_entity!(DropLife, PickupId);
    world_entity!(Marker, MarkerId);

    fn tick_entities<E: WorldEntity>(
        entities: &mut LinkedHashMap<E::Id, E, FxBuildHasher>,
        pipe: &mut EntityPipe,
        deferred: bool,
    ) {
        for entity in entities.values_mut() {
            if entity.base().marked_for_destroy {
                continue;
            }
            let res = if deferred {
                entity.tick_deferred(pipe)
            } else {
                entity.tick(pipe)
            };
            if res == EntityTickResult::RemoveEntity {
                entity.base_mut().marked_for_destroy = true;
            }
        }
    }

    /// Drops every entity marked for destruction and releases its id.
    fn remove_marked<E: WorldEntity>(
        entities: &mut LinkedHashMap<E::Id, E, FxBuildHasher>,
        id_gen: &mut IdGenerator,
        cur_tick: i32,
    ) -> usize {
        let before = entities.len();
        entities.retain(|id, entity| {
            if entity.base().marked_for_destroy {
                id_gen.free_id((*id).into(), cur_tick.max(0) as u64);
                false
            } else {
                true
            }
        });
        before - entities.len()
    }

    fn snap_entities<'a, E: WorldEntity + 'a>(
        entities: impl Iterator<Item = &'a E>,
        view: &SnapView,
        out: &mut Vec<SnapObject>,
    ) {
        out.extend(entities.filter_map(|entity| {
            let id: IdGeneratorIdType = entity.base().game_element_id.into();
            entity.snap(view).map(|item| SnapObject { id: id.get(), item })
        }));
    }

    /// The entity registry. It owns every entity and the player table,
    /// ticks them in a fixed order and applies everything they requested
    /// once the tick is over.
    #[derive(Debug, Default)]
    pub struct GameWorld {
        pub(crate) characters: Characters,
        pub(crate) projectiles: Projectiles,
        pub(crate) mines: Mines,
        pub(crate) lasers: Lasers,
        pub(crate) drops: DropLifes,
        pub(crate) markers: Markers,

        pub(crate) players: Players,

        id_gen: IdGenerator,
        events: GameWorldPendingEvents,
        spawns: PendingSpawns,
        sim_events: Vec<SimulationWorldEvent>,
    }

    impl GameWorld {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn characters(&self) -> &Characters {
            &self.characters
        }

        pub fn projectiles(&self) -> &Projectiles {
            &self.projectiles
        }

        pub fn mines(&self) -> &Mines {
            &self.mines
        }

        pub fn lasers(&self) -> &Lasers {
            &self.lasers
        }

        pub fn drops(&self) -> &DropLifes {
            &self.drops
        }

        pub fn markers(&self) -> &Markers {
            &self.markers
        }

        pub fn players(&self) -> &Players {
            &self.players
        }

        pub fn players_mut(&mut self) -> &mut Players {
            &mut self.players
        }

        pub fn character_mut(&mut self, id: &CharacterId) -> Option<&mut Character> {
            self.characters.get_mut(id)
        }

        pub fn events(&self) -> &GameWorldPendingEvents {
            &self.events
        }

        /// The character that a line from `pos0` to `pos1` touches first.
        /// `new_pos` is the closest point on the line to it.
        pub fn intersect_character_on_line(
            characters: &Characters,
            pos0: &vec2,
            pos1: &vec2,
            radius: f32,
            new_pos: &mut vec2,
            ignore: Option<CharacterId>,
        ) -> Option<CharacterId> {
            Self::intersect_character_on_line_filtered(
                characters,
                pos0,
                pos1,
                radius,
                new_pos,
                |c| Some(c.id()) != ignore,
            )
        }

        pub fn intersect_character_on_line_filtered(
            characters: &Characters,
            pos0: &vec2,
            pos1: &vec2,
            radius: f32,
            new_pos: &mut vec2,
            filter: impl Fn(&Character) -> bool,
        ) -> Option<CharacterId> {
            let mut closest_len = distance(pos0, pos1) * 100.0;
            let mut closest = None;

            for character in characters
                .values()
                .filter(|c| c.is_alive() && filter(c))
            {
                let char_pos = character.pos();
                let mut intersect_pos = vec2::default();
                if !closest_point_on_line(pos0, pos1, &char_pos, &mut intersect_pos) {
                    continue;
                }
                if distance(&char_pos, &intersect_pos) >= PHYSICAL_SIZE + radius {
                    continue;
                }
                let len = distance(pos0, &intersect_pos);
                if len < closest_len {
                    *new_pos = intersect_pos;
                    closest_len = len;
                    closest = Some(character.id());
                }
            }
            closest
        }

        /// The closest alive character that touches a circle of `radius`.
        pub fn closest_character(
            characters: &Characters,
            pos: &vec2,
            radius: f32,
            ignore: Option<CharacterId>,
        ) -> Option<CharacterId> {
            characters
                .values()
                .filter(|c| c.is_alive() && Some(c.id()) != ignore)
                .map(|c| (c.id(), distance(pos, &c.pos())))
                .filter(|(_, d)| *d < radius + PHYSICAL_SIZE)
                .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
                .map(|(id, _)| id)
        }


        fn bot_info(&self) -> BotWorldInfo {
            let mut info = BotWorldInfo::default();
            for player in self.players.values().filter(|p| !p.is_bot()) {
                info.has_humans = true;
                if self
                    .characters
                    .get(&player.id)
                    .is_some_and(|c| c.is_alive() && !c.is_frozen())
                {
                    info.has_active_humans = true;
                }
            }
            info
        }

        pub fn add_player(&mut self, player: Player) {
            log::debug!(target: "world", "player {} joined, bot: {}", player.id, player.is_bot());
            self.players.insert(player.id, player);
        }

        /// Removes the player and its character right away. Leaving is not
        /// a death, nobody is credited.
        pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
            self.characters.remove(id);
            self.sim_events.retain(|ev| match ev {
                SimulationWorldEvent::CharacterDeath { victim, .. } => victim != id,
            });
            let player = self.players.remove(id);
            if player.is_some() {
                log::debug!(target: "world", "player {id} left");
            }
            player
        }

        /// How crowded a spawn point is, close characters count more.
        fn spawn_score(&self, spawn: &vec2) -> f32 {
            self.characters
                .values()
                .filter(|c| c.is_alive())
                .map(|c| {
                    let d = distance(spawn, &c.pos());
                    if d < 1.0 {
                        1.0
                    } else {
                        1.0 / d
                    }
                })
                .sum()
        }

        pub(crate) fn spawn_pos(&self, collision: &Collision) -> vec2 {
            let mut best: Option<(vec2, f32)> = None;
            for spawn in collision.spawn_points() {
                let score = self.spawn_score(spawn);
                // the first of equally good spawns wins
                if best.map_or(true, |(_, best_score)| score < best_score) {
                    best = Some((*spawn, score));
                }
            }
            best.map(|(spawn, _)| spawn).unwrap_or_else(|| {
                vec2::new(
                    collision.get_playfield_width() as f32 * 16.0,
                    collision.get_playfield_height() as f32 * 16.0,
                )
            })
        }

        fn spawn_character(&mut self, id: PlayerId, pipe: &SimulationPipeWorld) {
            let Some(player) = self.players.get(&id) else {
                return;
            };
            let pos = self.spawn_pos(pipe.collision);
            let character = Character::new(&id, pos, player, pipe.mod_tunables, pipe.cur_tick);

            self.events.push_sound(
                Some(id),
                Some(pos),
                GameWorldEntitySoundEvent::Character(GameCharacterSoundEvent::Sound(
                    GameCharacterEventSound::Spawn,
                )),
            );
            self.events.push_effect(
                Some(id),
                pos,
                GameWorldEntityEffectEvent::Character(GameCharacterEffectEvent::Effect(
                    GameCharacterEventEffect::Spawn,
                )),
            );
            if character.is_spawn_protected() {
                let marker_id: MarkerId = self.id_gen.next_id(pipe.cur_tick.max(0) as u64);
                self.markers
                    .insert(marker_id, Marker::new_protection(&marker_id, id, pos));
            }

            log::debug!(target: "world", "character {id} spawned at {pos:?}");
            self.characters.insert(id, character);
        }

        fn check_character_respawn(&mut self, pipe: &SimulationPipeWorld) {
            let ready: Vec<PlayerId> = self
                .players
                .values()
                .filter(|p| {
                    !self.characters.contains_key(&p.id) && p.respawn_tick <= pipe.cur_tick
                })
                .map(|p| p.id)
                .collect();
            for id in ready {
                self.spawn_character(id, pipe);
            }
        }

        /// Advances the world by one tick. Every entity gets its tick before
        /// any entity gets its deferred tick, removals wait until both are done.
        pub fn tick(&mut self, pipe: &mut SimulationPipeWorld) {
            self.check_character_respawn(pipe);
            let bot_info = self.bot_info();

            let Self {
                characters,
                projectiles,
                mines,
                lasers,
                drops,
                markers,
                players,
                id_gen,
                events,
                spawns,
                sim_events,
            } = self;
            let mut sim = SimulationPipe {
                collision: pipe.collision,
                tunings: pipe.tunings,
                mod_tunables: pipe.mod_tunables,
                modifiers: pipe.modifiers,
                cur_tick: pipe.cur_tick,
                rng: &mut *pipe.rng,
                id_gen,
                events: &*events,
                spawns,
                sim_events,
                players,
                bot_info,
            };
            for deferred in [false, true] {
                tick_characters(characters, &mut sim, deferred);

                let mut entity_pipe = EntityPipe {
                    sim: &mut sim,
                    characters: &mut *characters,
                };
                tick_entities(projectiles, &mut entity_pipe, deferred);
                tick_entities(mines, &mut entity_pipe, deferred);
                tick_entities(lasers, &mut entity_pipe, deferred);
                tick_entities(drops, &mut entity_pipe, deferred);
                tick_entities(markers, &mut entity_pipe, deferred);
            }

            self.flush(pipe);
        }

        /// While paused nothing moves, the timers of every entity are shifted.
        pub fn tick_paused(&mut self) {
            self.characters.values_mut().for_each(|c| c.tick_paused());
            self.projectiles.values_mut().for_each(|e| e.tick_paused());
            self.mines.values_mut().for_each(|e| e.tick_paused());
            self.lasers.values_mut().for_each(|e| e.tick_paused());
            self.drops.values_mut().for_each(|e| e.tick_paused());
            self.markers.values_mut().for_each(|e| e.tick_paused());
            for player in self.players.values_mut() {
                player.respawn_tick += 1;
            }
        }

        fn flush(&mut self, pipe: &mut SimulationPipeWorld) {
            self.handle_simulation_events(pipe);
            self.remove_marked_entities(pipe.cur_tick);
            self.insert_spawns();
        }

        fn handle_simulation_events(&mut self, pipe: &mut SimulationPipeWorld) {
            let pending = std::mem::take(&mut self.sim_events);
            if pending.is_empty() {
                return;
            }
            let bot_info = self.bot_info();

            let Self {
                characters,
                players,
                id_gen,
                events,
                spawns,
                sim_events,
                ..
            } = self;
            let mut sim = SimulationPipe {
                collision: pipe.collision,
                tunings: pipe.tunings,
                mod_tunables: pipe.mod_tunables,
                modifiers: pipe.modifiers,
                cur_tick: pipe.cur_tick,
                rng: &mut *pipe.rng,
                id_gen,
                events: &*events,
                spawns,
                sim_events,
                players,
                bot_info,
            };

            for ev in pending {
                let SimulationWorldEvent::CharacterDeath {
                    victim,
                    killer,
                    weapon,
                    pos,
                } = ev;

                let mut flags = KillFlags::empty();
                if let Some(killer) = killer.filter(|k| *k != victim && weapon.is_weapon()) {
                    flags = handle_kill(characters, &mut sim, killer, victim);
                    if let Some(c) = characters.get_mut(&killer).filter(|c| c.is_alive()) {
                        c.set_emote(EmoteType::Happy, sim.cur_tick + KILLER_EMOTE_TICKS);
                    }
                }
                handle_death(characters, &mut sim, victim, weapon, pos);

                sim.events.push_notification(GameWorldNotificationEvent::Action(
                    GameWorldAction::Kill {
                        killer,
                        victim,
                        weapon,
                        flags,
                    },
                ));
                if let Some(player) = sim.players.get_mut(&victim) {
                    player.respawn_tick = sim.cur_tick + RESPAWN_DELAY_TICKS;
                }
                log::debug!(
                    target: "world",
                    "{victim} was killed by {killer:?} with {weapon:?}"
                );
            }
        }

        fn remove_marked_entities(&mut self, cur_tick: i32) {
            let characters_before = self.characters.len();
            self.characters.retain(|_, c| !c.base.marked_for_destroy);

            let removed = characters_before - self.characters.len()
                + remove_marked(&mut self.projectiles, &mut self.id_gen, cur_tick)
                + remove_marked(&mut self.mines, &mut self.id_gen, cur_tick)
                + remove_marked(&mut self.lasers, &mut self.id_gen, cur_tick)
                + remove_marked(&mut self.drops, &mut self.id_gen, cur_tick)
                + remove_marked(&mut self.markers, &mut self.id_gen, cur_tick);
            if removed > 0 {
                log::trace!(target: "world", "removed {removed} entities at tick {cur_tick}");
            }
        }

        /// Entities created during the tick join at its end, after everything
        /// that exists already.
        fn insert_spawns(&mut self) {
            let spawns = std::mem::take(&mut self.spawns);
            self.projectiles.extend(
                spawns
                    .projectiles
                    .into_iter()
                    .map(|e| (e.base.game_element_id, e)),
            );
            self.mines
                .extend(spawns.mines.into_iter().map(|e| (e.base.game_element_id, e)));
            self.lasers
                .extend(spawns.lasers.into_iter().map(|e| (e.base.game_element_id, e)));
            self.drops
                .extend(spawns.drops.into_iter().map(|e| (e.base.game_element_id, e)));
            self.markers
                .extend(spawns.markers.into_iter().map(|e| (e.base.game_element_id, e)));
        }

        /// Everything `view` is allowed to see, characters first.
        pub fn snap(&self, view: &SnapView) -> Vec<SnapObject> {
            let mut res: Vec<SnapObject> = self
                .characters
                .values()
                .filter_map(|c| {
                    c.snap(view).map(|item| SnapObject {
                        id: c.id().slot(),
                        item,
                    })
                })
                .collect();
            snap_entities(self.projectiles.values(), view, &mut res);
            snap_entities(self.mines.values(), view, &mut res);
            snap_entities(self.lasers.values(), view, &mut res);
            snap_entities(self.drops.values(), view, &mut res);
            snap_entities(self.markers.values(), view, &mut res);
            res
        }

        pub fn post_snap(&mut self) {
            self.characters.values_mut().for_each(|c| c.post_snap());
        }

        pub fn take_events(&self) -> Vec<GameWorldEvent> {
            self.events.take()
        }
    }

    /// Characters tick one after another. The ticking one is taken out of
    /// the map, so the pipe hands it every other character. Since each one is
    /// taken out and put back once, the order stays the same.
    fn tick_characters(characters: &mut Characters, sim: &mut SimulationPipe, deferred: bool) {
        let ids: Vec<CharacterId> = characters.keys().copied().collect();
        for id in ids {
            let Some(mut character) = characters.remove(&id) else {
                continue;
            };
            if !character.base.marked_for_destroy {
                let mut pipe = EntityPipe {
                    sim: &mut *sim,
                    characters: &mut *characters,
                };
                let res = if deferred {
                    character.tick_deferred(&mut pipe)
                } else {
                    character.tick(&mut pipe)
                };
                if res == EntityTickResult::RemoveEntity {
                    character.base.marked_for_destroy = true;
                }
            }
            characters.insert(id, character);
        }
    }

    /// Progression of the killer, returns the flags of the kill message.
    fn handle_kill(
        characters: &mut Characters,
        sim: &mut SimulationPipe,
        killer: PlayerId,
        victim: PlayerId,
    ) -> KillFlags {
        let mut flags = KillFlags::empty();
        let tunables = sim.mod_tunables;
        let step = tunables.kills_for_streak.max(1);
        let exp_ratio = sim.modifiers.exp_ratio();

        let Some((victim_level, victim_kills)) = sim
            .players
            .get(&victim)
            .map(|p| (p.account.level, p.kills))
        else {
            return flags;
        };
        let Some(player) = sim.players.get_mut(&killer) else {
            return flags;
        };
        let events = sim.events;

        player.kills += 1;
        if player.kills % step == 0 {
            events.push_notification(GameWorldNotificationEvent::System(
                GameWorldSystemMessage::Killstreak {
                    id: killer,
                    kills: player.kills,
                },
            ));
        }

        let killer_pos = characters
            .get_mut(&killer)
            .filter(|c| c.is_alive())
            .map(|c| {
                c.gain_ammo_back(tunables.ammo_reward);
                c.pos()
            });

        let is_bot = player.is_bot();
        let account = &mut player.account;
        account.experience += exp_ratio;

        let level_diff = (victim_level - account.level) / LEVEL_DIFF_STEP;
        if level_diff > 0 {
            account.experience += level_diff * tunables.bonus_per_level_diff;
        }

        let victim_steps = victim_kills / step;
        if victim_steps > 0 {
            let bonus_exp = exp_ratio * victim_steps * tunables.bonus_per_streak;
            account.experience += bonus_exp;
            flags |= KillFlags::STREAK_ENDED;
            events.push_notification(GameWorldNotificationEvent::System(
                GameWorldSystemMessage::KillstreakEnded {
                    killer,
                    victim,
                    bonus_exp,
                },
            ));
        }

        // bots never level
        if is_bot {
            return flags;
        }

        if account.level > 0 && account.experience >= account.level {
            if let Some(pos) = killer_pos {
                for _ in 0..3 {
                    events.push_effect(
                        Some(killer),
                        pos,
                        GameWorldEntityEffectEvent::Character(GameCharacterEffectEvent::Effect(
                            GameCharacterEventEffect::Death,
                        )),
                    );
                }
            }
        }
        while account.level > 0 && account.experience >= account.level {
            account.experience -= account.level;
            account.level += 1;
            account.money += LEVEL_UP_MONEY;
            log::info!(target: "world", "{} reached level {}", account.name, account.level);
            events.push_notification(GameWorldNotificationEvent::System(
                GameWorldSystemMessage::LevelUp {
                    id: killer,
                    level: account.level,
                    money: account.money,
                },
            ));
        }

        if tunables.level_max != -1
            && account.level > tunables.level_max
            && !matches!(account.rank, PlayerRank::Moderator | PlayerRank::Admin)
        {
            events.push_notification(GameWorldNotificationEvent::System(
                GameWorldSystemMessage::LevelCapReached { id: killer },
            ));
        }
        flags
    }

    /// Ends the streak of the victim, a long one goes out with a bang.
    fn handle_death(
        characters: &mut Characters,
        sim: &mut SimulationPipe,
        victim: PlayerId,
        weapon: KillWeapon,
        pos: vec2,
    ) {
        let Some(player) = sim.players.get_mut(&victim) else {
            return;
        };
        let kills = std::mem::take(&mut player.kills);
        if kills < sim.mod_tunables.kills_for_streak.max(1) {
            return;
        }
        let explosion = Explosion {
            pos,
            owner: victim,
            weapon: match weapon {
                KillWeapon::Weapon(weapon) => weapon,
                KillWeapon::World | KillWeapon::Game => WeaponType::Hammer,
            },
            damage: 0.0,
            knockback: DamageLevel::None,
            damage_level: DamageLevel::None,
            sound: true,
        };
        create_explosion(&mut CharactersViewMut::all(characters), sim, &explosion);
    }

}
