pub mod laser {
    use game_interface::{
        events::{GameLaserEventSound, GameWorldEntitySoundEvent},
        types::{
            id_types::{CharacterId, LaserId},
            snapshot::{SnapItem, SnapLaser},
            weapons::{KillWeapon, WeaponType},
        },
    };
    use math::math::{distance, normalize, vector::vec2};

    use crate::{
        collision::collision::CollisionTile,
        damage::damage::{create_explosion, DamageLevel, Explosion},
        entities::{
            character::character::CharactersViewMut,
            entity::entity::{Entity, EntityInterface, EntityTickResult, SnapView},
        },
        simulation_pipe::simulation_pipe::EntityPipe,
        state::state::TICKS_PER_SECOND,
        world::world::GameWorld,
    };

    const KNOCKBACK: f32 = 10.0;

    /// A rifle beam. It advances one segment per evaluation, pierces
    /// characters and reflects off walls.
    #[derive(Debug)]
    pub struct Laser {
        pub(crate) base: Entity<LaserId>,
        owner: CharacterId,

        pos: vec2,
        from: vec2,
        dir: vec2,
        energy: f32,
        bounces: i32,
        /// tick of the last evaluation, clients draw the fade from it
        eval_tick: i32,
        next_eval_tick: i32,

        damage: f32,
        explode: bool,
        knockback: bool,
        /// characters this beam already went through
        hits: Vec<CharacterId>,
    }

    impl Laser {
        pub fn new(
            id: &LaserId,
            owner: CharacterId,
            pos: vec2,
            dir: vec2,
            start_energy: f32,
            damage: f32,
            explode: bool,
            knockback: bool,
            cur_tick: i32,
        ) -> Self {
            Self {
                base: Entity::new(id),
                owner,
                pos,
                from: pos,
                dir,
                energy: start_energy,
                bounces: 0,
                eval_tick: cur_tick,
                next_eval_tick: cur_tick,
                damage,
                explode,
                knockback,
                hits: Vec::new(),
            }
        }

        pub fn pos(&self) -> vec2 {
            self.pos
        }

        pub fn pos_from(&self) -> vec2 {
            self.from
        }

        pub fn energy(&self) -> f32 {
            self.energy
        }

        pub fn bounces(&self) -> i32 {
            self.bounces
        }

        pub fn hits(&self) -> &[CharacterId] {
            &self.hits
        }

        fn hit_character(&mut self, from: &vec2, to: &vec2, pipe: &mut EntityPipe) -> bool {
            let mut hit_pos = vec2::default();
            let owner = self.owner;
            let hits = &self.hits;
            let Some(target_id) = GameWorld::intersect_character_on_line_filtered(
                pipe.characters,
                &self.pos,
                to,
                0.0,
                &mut hit_pos,
                |c| c.id() != owner && !hits.contains(&c.id()),
            ) else {
                return false;
            };

            self.hits.push(target_id);
            self.from = *from;
            self.pos = hit_pos;
            self.energy -= distance(&self.from, &self.pos);

            if let Some(target) = pipe.characters.get_mut(&target_id) {
                if self.knockback {
                    target.impulse_add(&(self.dir * KNOCKBACK));
                }
                target.take_damage(
                    self.damage,
                    Some(owner),
                    KillWeapon::Weapon(WeaponType::Laser),
                    pipe.sim,
                );
            }

            if self.explode {
                let explosion = Explosion {
                    pos: hit_pos,
                    owner,
                    weapon: WeaponType::Laser,
                    damage: self.damage,
                    knockback: DamageLevel::ExemptOwner,
                    damage_level: DamageLevel::None,
                    sound: true,
                };
                create_explosion(
                    &mut CharactersViewMut::all(pipe.characters),
                    pipe.sim,
                    &explosion,
                );
            }
            true
        }

        /// Advances the beam by one segment. Returns `false` once the energy
        /// is used up.
        pub fn do_bounce(&mut self, pipe: &mut EntityPipe) -> bool {
            let tunings = pipe.sim.tunings;
            self.eval_tick = pipe.sim.cur_tick;
            self.next_eval_tick = pipe.sim.cur_tick
                + (TICKS_PER_SECOND as f32 * tunings.laser_bounce_delay / 1000.0).ceil() as i32;

            if self.energy < 0.0 {
                return false;
            }

            let collision = pipe.sim.collision;
            let mut col_pos = vec2::default();
            let mut to = self.pos + self.dir * self.energy;
            let res = collision.intersect_line(&self.pos, &to.clone(), &mut col_pos, &mut to);

            let cur_pos = self.pos;
            if self.hit_character(&cur_pos, &to, pipe) {
                return true;
            }

            if res != CollisionTile::None {
                self.from = self.pos;
                self.pos = to;

                let mut tmp_pos = self.pos;
                let mut tmp_dir = self.dir * 4.0;
                collision.move_point(&mut tmp_pos, &mut tmp_dir, 1.0, &mut 0);
                self.pos = tmp_pos;
                self.dir = normalize(&tmp_dir);

                let d = distance(&self.from, &self.pos);
                // stuck in a corner
                if self.bounces > 0 && d == 0.0 {
                    self.energy = -1.0;
                } else {
                    self.energy -= d + tunings.laser_bounce_cost;
                }

                self.bounces += 1;
                if self.bounces as f32 > tunings.laser_bounce_num {
                    self.energy = -1.0;
                }

                pipe.sim.events.push_sound(
                    Some(self.owner),
                    Some(self.pos),
                    GameWorldEntitySoundEvent::Laser(GameLaserEventSound::Bounce),
                );
            } else {
                self.from = self.pos;
                self.pos = to;
                self.energy = -1.0;
            }

            true
        }
    }

    impl EntityInterface for Laser {
        fn tick(&mut self, pipe: &mut EntityPipe) -> EntityTickResult {
            if pipe.sim.cur_tick < self.next_eval_tick || self.do_bounce(pipe) {
                EntityTickResult::None
            } else {
                EntityTickResult::RemoveEntity
            }
        }

        fn tick_deferred(&mut self, _pipe: &mut EntityPipe) -> EntityTickResult {
            EntityTickResult::None
        }

        fn tick_paused(&mut self) {
            self.eval_tick += 1;
            self.next_eval_tick += 1;
        }

        fn snap(&self, view: &SnapView) -> Option<SnapItem> {
            if view.network_clipped(&self.pos) && view.network_clipped(&self.from) {
                return None;
            }
            Some(SnapItem::Laser(SnapLaser {
                x: self.pos.x as i32,
                y: self.pos.y as i32,
                from_x: self.from.x as i32,
                from_y: self.from.y as i32,
                start_tick: self.eval_tick,
            }))
        }
    }

    #[cfg(test)]
    mod test {
        use game_interface::types::{
            account::AccountInfo,
            id_types::{CharacterId, LaserId},
        };
        use math::math::vector::vec2;

        use super::Laser;
        use crate::{
            entities::{
                character::{
                    character::{Character, Characters},
                    player::player::Player,
                },
                entity::entity::{EntityInterface, EntityTickResult},
            },
            simulation_pipe::simulation_pipe::EntityPipe,
            test_util::test_util::TestSim,
        };

        const ARENA: &str = "\
            ##################################\n\
            #................................#\n\
            #................................#\n\
            #................................#\n\
            ##################################\n";

        fn spawn(sim: &mut TestSim, characters: &mut Characters, slot: u32, pos: vec2) {
            let id = CharacterId::new(slot);
            let player = Player::new(id, AccountInfo::default(), None);
            let character = Character::new(&id, pos, &player, &sim.tunables, 0);
            sim.players.insert(id, player);
            characters.insert(id, character);
        }

        #[test]
        fn pierces_and_skips_owner() {
            let mut sim = TestSim::new(ARENA);
            sim.tunables.spawn_protection_secs = 0.0;
            let mut characters = Characters::default();
            spawn(&mut sim, &mut characters, 0, vec2::new(100.0, 80.0));
            spawn(&mut sim, &mut characters, 1, vec2::new(300.0, 80.0));
            spawn(&mut sim, &mut characters, 2, vec2::new(500.0, 80.0));

            let id: LaserId = sim.id_gen.next_id(0);
            let mut laser = Laser::new(
                &id,
                CharacterId::new(0),
                vec2::new(100.0, 80.0),
                vec2::new(1.0, 0.0),
                800.0,
                3.0,
                false,
                false,
                0,
            );

            let mut pipe = sim.pipe();
            let mut entity_pipe = EntityPipe {
                sim: &mut pipe,
                characters: &mut characters,
            };
            assert!(laser.do_bounce(&mut entity_pipe));
            assert_eq!(laser.hits(), &[CharacterId::new(1)]);
            assert!(laser.do_bounce(&mut entity_pipe));
            assert_eq!(laser.hits(), &[CharacterId::new(1), CharacterId::new(2)]);
            drop(pipe);

            let owner = &characters[&CharacterId::new(0)];
            assert_eq!(owner.virtual_health(), 6.0);
            assert!(characters[&CharacterId::new(1)].virtual_health() < 6.0);
            assert!(characters[&CharacterId::new(2)].virtual_health() < 6.0);
        }

        #[test]
        fn reflects_and_runs_out() {
            let mut sim = TestSim::new(ARENA);
            let mut characters = Characters::default();
            let id: LaserId = sim.id_gen.next_id(0);
            let mut laser = Laser::new(
                &id,
                CharacterId::new(0),
                vec2::new(900.0, 80.0),
                vec2::new(1.0, 0.0),
                800.0,
                3.0,
                false,
                false,
                0,
            );

            let mut pipe = sim.pipe();
            let mut entity_pipe = EntityPipe {
                sim: &mut pipe,
                characters: &mut characters,
            };
            assert!(laser.do_bounce(&mut entity_pipe));
            assert_eq!(laser.bounces(), 1);
            assert!(laser.dir.x < 0.0);
            assert!(laser.energy() > 0.0);

            // one bounce is allowed, the next segment ends in the open
            assert!(laser.do_bounce(&mut entity_pipe));
            assert!(laser.energy() < 0.0);

            entity_pipe.sim.cur_tick = 100;
            assert_eq!(laser.tick(&mut entity_pipe), EntityTickResult::RemoveEntity);
        }
    }
}
