pub mod drop_life {
    use game_interface::{
        events::{
            GamePickupArmorEventSound, GamePickupHeartEventSound, GamePickupSoundEvent,
            GameWorldEntitySoundEvent,
        },
        types::{
            id_types::PickupId,
            pickup::PickupType,
            snapshot::{SnapItem, SnapPickup},
        },
    };
    use math::math::{normalize, sign, vector::vec2};

    use crate::{
        collision::collision::{Collision, TileNum},
        config::config::ModTunables,
        entities::entity::entity::{Entity, EntityInterface, EntityTickResult, SnapView},
        simulation_pipe::simulation_pipe::EntityPipe,
        state::state::TICKS_PER_SECOND,
        world::world::GameWorld,
    };

    const PICKUP_RADIUS: f32 = 20.0;
    /// distance of the resting pickup above the floor
    const FLOOR_TOLERANCE: f32 = 15.0;
    const MAX_PUSH_STEPS: usize = 64;
    const MAX_SETTLE_STEPS: usize = 50;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FallState {
        Falling,
        /// touched the floor, pushed out of it once more
        Settling,
        Resting,
    }

    /// Health or armor that drops out of a dead character.
    #[derive(Debug)]
    pub struct DropLife {
        pub(crate) base: Entity<PickupId>,
        ty: PickupType,
        pos: vec2,
        vel: vec2,
        push_dir: vec2,
        amount: f32,
        state: FallState,
        gravity: f32,
        /// percent of the velocity kept on a floor bounce
        bounce: f32,
        lifetime: i32,
    }

    impl DropLife {
        pub fn new(
            id: &PickupId,
            pos: vec2,
            push_dir: vec2,
            amount: f32,
            ty: PickupType,
            tunables: &ModTunables,
        ) -> Self {
            Self {
                base: Entity::new(id),
                ty,
                pos,
                vel: vec2::default(),
                push_dir,
                amount,
                state: FallState::Falling,
                gravity: tunables.drop_life_gravity,
                bounce: tunables.drop_life_bounce,
                lifetime: (TICKS_PER_SECOND as f32 * tunables.drop_life_lifetime_secs) as i32,
            }
        }

        pub fn pos(&self) -> vec2 {
            self.pos
        }

        pub fn ty(&self) -> PickupType {
            self.ty
        }

        pub fn amount(&self) -> f32 {
            self.amount
        }

        pub fn state(&self) -> FallState {
            self.state
        }

        fn fall(&mut self, collision: &Collision) {
            let solid = |x: f32, y: f32| collision.get_collision_at(x, y) != TileNum::Air;

            // out of walls it was pushed into
            let push = normalize(&self.push_dir) * FLOOR_TOLERANCE;
            for _ in 0..MAX_PUSH_STEPS {
                if !solid(self.pos.x - push.x, self.pos.y - push.y) {
                    break;
                }
                self.pos += self.push_dir;
            }

            let collide = sign(self.vel.y) != -1.0
                && solid(self.pos.x, self.pos.y + FLOOR_TOLERANCE + self.vel.y);
            if !collide {
                self.pos += self.vel;
                self.vel.y += self.gravity;
                return;
            }

            // feel for the surface
            let steps = (self.vel.y + 1.0).ceil().max(0.0) as i32;
            for i in 0..steps {
                if solid(self.pos.x, self.pos.y + FLOOR_TOLERANCE + i as f32) {
                    self.pos.y += i as f32;
                    break;
                }
            }

            self.vel.y = -self.vel.y * (self.bounce / 100.0);
            if self.vel.y.abs() <= 1.0 {
                self.state = FallState::Settling;
            }
        }

        fn settle(&mut self, collision: &Collision) {
            for _ in 0..MAX_SETTLE_STEPS {
                if collision.get_collision_at(self.pos.x, self.pos.y + FLOOR_TOLERANCE)
                    == TileNum::Air
                {
                    break;
                }
                self.pos.y -= 1.0;
            }
            self.state = FallState::Resting;
        }
    }

    impl EntityInterface for DropLife {
        fn tick(&mut self, pipe: &mut EntityPipe) -> EntityTickResult {
            let collision = pipe.sim.collision;

            if let Some(character) =
                GameWorld::closest_character(pipe.characters, &self.pos, PICKUP_RADIUS, None)
                    .and_then(|id| pipe.characters.get_mut(&id))
            {
                let sound = match self.ty {
                    PickupType::PowerupHealth => {
                        character.increase_health(self.amount);
                        GamePickupSoundEvent::Heart(GamePickupHeartEventSound::Collect)
                    }
                    PickupType::PowerupArmor => {
                        character.increase_armor(self.amount);
                        GamePickupSoundEvent::Armor(GamePickupArmorEventSound::Collect)
                    }
                };
                pipe.sim.events.push_sound(
                    Some(character.id()),
                    Some(self.pos),
                    GameWorldEntitySoundEvent::Pickup(sound),
                );
                return EntityTickResult::RemoveEntity;
            }

            if self.state == FallState::Falling {
                self.fall(collision);
            }
            if self.state == FallState::Settling {
                self.settle(collision);
            }

            self.lifetime -= 1;
            if self.lifetime <= 0
                || Entity::<PickupId>::outside_of_playfield(&self.pos, collision)
                || collision.is_death(self.pos.x, self.pos.y + FLOOR_TOLERANCE + 1.0)
            {
                return EntityTickResult::RemoveEntity;
            }
            EntityTickResult::None
        }

        fn tick_deferred(&mut self, _pipe: &mut EntityPipe) -> EntityTickResult {
            EntityTickResult::None
        }

        fn tick_paused(&mut self) {
            self.lifetime += 1;
        }

        fn snap(&self, view: &SnapView) -> Option<SnapItem> {
            if view.network_clipped(&self.pos) {
                return None;
            }
            Some(SnapItem::Pickup(SnapPickup {
                x: self.pos.x as i32,
                y: self.pos.y as i32,
                ty: self.ty.net_type(),
            }))
        }
    }

    #[cfg(test)]
    mod test {
        use game_interface::types::{id_types::PickupId, pickup::PickupType};
        use math::math::vector::vec2;

        use super::{DropLife, FallState, FLOOR_TOLERANCE};
        use crate::{
            entities::{
                character::character::Characters,
                entity::entity::{EntityInterface, EntityTickResult},
            },
            simulation_pipe::simulation_pipe::EntityPipe,
            test_util::test_util::TestSim,
        };

        const ROOM: &str = "\
            ######\n\
            #....#\n\
            #....#\n\
            #....#\n\
            #....#\n\
            ######\n";

        #[test]
        fn falls_and_comes_to_rest() {
            let mut sim = TestSim::new(ROOM);
            let mut characters = Characters::default();
            let id: PickupId = sim.id_gen.next_id(0);
            let mut drop = DropLife::new(
                &id,
                vec2::new(80.0, 48.0),
                vec2::new(0.0, -1.0),
                2.0,
                PickupType::PowerupArmor,
                &sim.tunables,
            );

            let mut pipe = sim.pipe();
            let mut entity_pipe = EntityPipe {
                sim: &mut pipe,
                characters: &mut characters,
            };
            for _ in 0..200 {
                assert_eq!(drop.tick(&mut entity_pipe), EntityTickResult::None);
            }
            assert_eq!(drop.state(), FallState::Resting);
            // the floor starts at 160
            let bottom = drop.pos().y + FLOOR_TOLERANCE;
            assert!(bottom < 160.0 && bottom > 140.0, "{bottom}");
        }

        #[test]
        fn expires() {
            let mut sim = TestSim::new(ROOM);
            sim.tunables.drop_life_lifetime_secs = 1.0;
            let mut characters = Characters::default();
            let id: PickupId = sim.id_gen.next_id(0);
            let mut drop = DropLife::new(
                &id,
                vec2::new(80.0, 48.0),
                vec2::new(0.0, -1.0),
                2.0,
                PickupType::PowerupHealth,
                &sim.tunables,
            );

            let mut pipe = sim.pipe();
            let mut entity_pipe = EntityPipe {
                sim: &mut pipe,
                characters: &mut characters,
            };
            let mut ticks = 0;
            while drop.tick(&mut entity_pipe) == EntityTickResult::None {
                ticks += 1;
                assert!(ticks < 100);
            }
            assert_eq!(ticks, 49);
        }
    }
}
