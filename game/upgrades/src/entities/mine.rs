pub mod mine {
    use game_interface::types::{
        id_types::{CharacterId, ProjectileId},
        snapshot::{SnapItem, SnapProjectile},
        weapons::{KillWeapon, WeaponType},
    };
    use math::math::{normalize, vector::vec2};

    use crate::{
        collision::collision::TileNum,
        damage::damage::{create_explosion, DamageLevel, Explosion},
        entities::{
            character::character::CharactersViewMut,
            entity::entity::{Entity, EntityInterface, EntityTickResult, SnapView},
        },
        simulation_pipe::simulation_pipe::EntityPipe,
        world::world::GameWorld,
    };

    /// A hammer mine. It sits still and goes off when someone comes close.
    #[derive(Debug)]
    pub struct Mine {
        pub(crate) base: Entity<ProjectileId>,
        owner: CharacterId,
        pos: vec2,
        life_span: i32,
        damage: f32,
        explosive: bool,
        force: f32,
        start_tick: i32,
    }

    impl Mine {
        pub fn new(
            id: &ProjectileId,
            owner: CharacterId,
            pos: vec2,
            life_span: i32,
            damage: f32,
            explosive: bool,
            force: f32,
            start_tick: i32,
        ) -> Self {
            Self {
                base: Entity::new(id),
                owner,
                pos,
                life_span,
                damage,
                explosive,
                force,
                start_tick,
            }
        }

        pub fn pos(&self) -> vec2 {
            self.pos
        }
    }

    impl EntityInterface for Mine {
        fn tick(&mut self, pipe: &mut EntityPipe) -> EntityTickResult {
            let collision = pipe.sim.collision;
            let collide = collision.get_collision_at(self.pos.x, self.pos.y) != TileNum::Air;
            let target = GameWorld::closest_character(
                pipe.characters,
                &self.pos,
                pipe.sim.mod_tunables.mine_radius,
                Some(self.owner),
            );

            self.life_span -= 1;

            if target.is_none()
                && !collide
                && self.life_span >= 0
                && !Entity::<ProjectileId>::outside_of_playfield(&self.pos, collision)
            {
                return EntityTickResult::None;
            }

            if self.explosive {
                let explosion = Explosion {
                    pos: self.pos,
                    owner: self.owner,
                    weapon: WeaponType::Hammer,
                    damage: self.damage,
                    knockback: DamageLevel::All,
                    damage_level: DamageLevel::ExemptOwner,
                    sound: true,
                };
                create_explosion(
                    &mut CharactersViewMut::all(pipe.characters),
                    pipe.sim,
                    &explosion,
                );
            } else if let Some(target) = target.and_then(|id| pipe.characters.get_mut(&id)) {
                let dir = normalize(&(target.pos() - self.pos));
                target.impulse_add(&(dir * self.force.max(0.001)));
                target.take_damage(
                    self.damage,
                    Some(self.owner),
                    KillWeapon::Weapon(WeaponType::Hammer),
                    pipe.sim,
                );
            }

            EntityTickResult::RemoveEntity
        }

        fn tick_deferred(&mut self, _pipe: &mut EntityPipe) -> EntityTickResult {
            EntityTickResult::None
        }

        fn tick_paused(&mut self) {
            self.start_tick += 1;
        }

        fn snap(&self, view: &SnapView) -> Option<SnapItem> {
            if view.network_clipped(&self.pos) {
                return None;
            }
            // shown as a resting laser bullet
            Some(SnapItem::Projectile(SnapProjectile {
                x: self.pos.x as i32,
                y: self.pos.y as i32,
                vel_x: 0,
                vel_y: 0,
                ty: WeaponType::Laser as i32,
                start_tick: self.start_tick,
            }))
        }
    }

    #[cfg(test)]
    mod test {
        use game_interface::types::{
            account::AccountInfo,
            id_types::{CharacterId, ProjectileId},
        };
        use math::math::vector::vec2;

        use super::Mine;
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

        const OPEN: &str = "\
............
............
............
............
............
............
";

        fn sim() -> TestSim {
            let mut sim = TestSim::new(OPEN);
            sim.tunables.spawn_protection_secs = 0.0;
            sim
        }

        fn add_character(sim: &mut TestSim, characters: &mut Characters, slot: u32, pos: vec2) {
            let id = CharacterId::new(slot);
            let player = Player::new(id, AccountInfo::default(), None);
            sim.players.insert(id, player.clone());
            characters.insert(id, Character::new(&id, pos, &player, &sim.tunables, 0));
        }

        fn mine(sim: &mut TestSim, life_span: i32, explosive: bool) -> Mine {
            let id: ProjectileId = sim.pipe().next_id();
            Mine::new(
                &id,
                CharacterId::new(0),
                vec2::new(64.0, 80.0),
                life_span,
                3.0,
                explosive,
                5.0,
                0,
            )
        }

        fn tick(
            sim: &mut TestSim,
            characters: &mut Characters,
            mine: &mut Mine,
        ) -> EntityTickResult {
            sim.cur_tick += 1;
            let mut pipe = sim.pipe();
            mine.tick(&mut EntityPipe {
                sim: &mut pipe,
                characters,
            })
        }

        #[test]
        fn goes_off_when_someone_comes_close() {
            let mut sim = sim();
            let mut characters = Characters::default();
            let target = CharacterId::new(1);
            add_character(&mut sim, &mut characters, 1, vec2::new(200.0, 80.0));
            let health = characters.get(&target).unwrap().virtual_health();

            let mut mine = mine(&mut sim, 100, false);
            assert_eq!(tick(&mut sim, &mut characters, &mut mine), EntityTickResult::None);

            characters.get_mut(&target).unwrap().core.pos = vec2::new(94.0, 80.0);
            assert_eq!(
                tick(&mut sim, &mut characters, &mut mine),
                EntityTickResult::RemoveEntity
            );
            let c = characters.get(&target).unwrap();
            assert!(c.virtual_health() < health);
            // pushed away from the mine
            assert!(c.core.vel.x > 0.0);
        }

        #[test]
        fn owner_can_stand_on_it() {
            let mut sim = sim();
            let mut characters = Characters::default();
            let owner = CharacterId::new(0);
            add_character(&mut sim, &mut characters, 0, vec2::new(70.0, 80.0));
            let health = characters.get(&owner).unwrap().virtual_health();

            let mut mine = mine(&mut sim, 100, false);
            for _ in 0..10 {
                assert_eq!(tick(&mut sim, &mut characters, &mut mine), EntityTickResult::None);
            }
            assert_eq!(characters.get(&owner).unwrap().virtual_health(), health);
        }

        #[test]
        fn explosion_spares_the_owner() {
            let mut sim = sim();
            let mut characters = Characters::default();
            let owner = CharacterId::new(0);
            let target = CharacterId::new(1);
            add_character(&mut sim, &mut characters, 0, vec2::new(64.0, 110.0));
            add_character(&mut sim, &mut characters, 1, vec2::new(100.0, 80.0));
            let owner_health = characters.get(&owner).unwrap().virtual_health();
            let target_health = characters.get(&target).unwrap().virtual_health();

            let mut mine = mine(&mut sim, 100, true);
            assert_eq!(
                tick(&mut sim, &mut characters, &mut mine),
                EntityTickResult::RemoveEntity
            );
            assert!(characters.get(&target).unwrap().virtual_health() < target_health);
            let owner = characters.get(&owner).unwrap();
            assert_eq!(owner.virtual_health(), owner_health);
            // knockback still reaches everyone
            assert!(owner.core.vel.y > 0.0);
        }

        #[test]
        fn expires_unnoticed() {
            let mut sim = sim();
            let mut characters = Characters::default();
            let mut mine = mine(&mut sim, 1, true);
            assert_eq!(tick(&mut sim, &mut characters, &mut mine), EntityTickResult::None);
            assert_eq!(
                tick(&mut sim, &mut characters, &mut mine),
                EntityTickResult::RemoveEntity
            );
            // the explosion is shown even with nobody around
            assert!(!sim.events.is_empty());
        }
    }
}
