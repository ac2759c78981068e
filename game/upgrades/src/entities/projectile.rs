pub mod projectile {
    use game_interface::{
        events::GameWorldDirectMessage,
        types::{
            id_types::{CharacterId, ProjectileId},
            snapshot::{SnapItem, SnapProjectile},
            weapons::{KillWeapon, WeaponType},
        },
    };
    use math::math::{normalize, sign, vector::vec2};

    use crate::{
        collision::collision::{CollisionTile, TileNum},
        damage::damage::{create_explosion, DamageLevel, Explosion},
        entities::{
            character::character::CharactersViewMut,
            entity::entity::{calc_pos, Entity, EntityInterface, EntityTickResult, SnapView},
        },
        simulation_pipe::simulation_pipe::EntityPipe,
        state::state::TICKS_PER_SECOND,
        world::world::GameWorld,
    };

    /// Radius around the flight path in which characters are hit.
    const HIT_RADIUS: f32 = 6.0;
    /// Steps to leave a solid before giving up.
    const MAX_PUSH_OUT_STEPS: usize = 64;

    /// A bullet on a curved path. Gun, shotgun and grenade share it, grenades
    /// may bounce off walls.
    #[derive(Debug)]
    pub struct Projectile {
        pub(crate) base: Entity<ProjectileId>,
        owner: CharacterId,
        ty: WeaponType,

        start_pos: vec2,
        direction: vec2,
        start_tick: i32,
        life_span: i32,
        /// where the last tick ended, snapshots are clipped by it
        cur_pos: vec2,

        damage: f32,
        explosive: bool,
        force: f32,
        bounces: i32,
    }

    impl Projectile {
        pub fn new(
            id: &ProjectileId,
            owner: CharacterId,
            ty: WeaponType,
            start_pos: vec2,
            direction: vec2,
            start_tick: i32,
            life_span: i32,
            damage: f32,
            explosive: bool,
            force: f32,
            bounces: i32,
        ) -> Self {
            Self {
                base: Entity::new(id),
                owner,
                ty,
                start_pos,
                direction,
                start_tick,
                life_span,
                cur_pos: start_pos,
                damage,
                explosive,
                force,
                bounces,
            }
        }

        pub fn owner(&self) -> CharacterId {
            self.owner
        }

        pub fn ty(&self) -> WeaponType {
            self.ty
        }

        pub fn bounces(&self) -> i32 {
            self.bounces
        }

        pub fn life_span(&self) -> i32 {
            self.life_span
        }

        fn pos_at(&self, time: f32, pipe: &EntityPipe) -> vec2 {
            let (curvature, speed) = pipe.sim.tunings.projectile_params(self.ty);
            calc_pos(&self.start_pos, &self.direction, curvature, speed, time)
        }

        pub fn to_snap(&self) -> SnapProjectile {
            SnapProjectile {
                x: self.start_pos.x as i32,
                y: self.start_pos.y as i32,
                vel_x: (self.direction.x * 100.0) as i32,
                vel_y: (self.direction.y * 100.0) as i32,
                ty: self.ty as i32,
                start_tick: self.start_tick,
            }
        }

        /// Spawns the grenade that continues after a bounce and tells the
        /// owner about it right away.
        fn bounce(&mut self, pos: vec2, vel: vec2, hit_character: bool, pipe: &mut EntityPipe) {
            let collision = pipe.sim.collision;
            let solid = |x: f32, y: f32| collision.get_collision_at(x, y) != TileNum::Air;

            self.bounces -= 1;
            let mut vel = vel;
            if solid(pos.x + 2.0 * sign(vel.x), pos.y) {
                vel.x *= -1.0;
            }
            if solid(pos.x, pos.y + 2.0 * sign(vel.y)) {
                vel.y *= -1.0;
            }
            if solid(pos.x + 2.0 * sign(vel.x), pos.y + 2.0 * sign(vel.y)) || hit_character {
                vel.x *= -1.0;
                vel.y *= -1.0;
            }

            let id = pipe.sim.next_id();
            let proj = Projectile::new(
                &id,
                self.owner,
                WeaponType::Grenade,
                pos,
                normalize(&vel),
                pipe.sim.cur_tick,
                (TICKS_PER_SECOND as f32 * pipe.sim.tunings.grenade_lifetime) as i32,
                self.damage,
                true,
                0.0,
                self.bounces,
            );
            pipe.sim.events.push_direct(
                self.owner,
                GameWorldDirectMessage::ExtraProjectile {
                    id: id.snap_id(),
                    proj: proj.to_snap(),
                },
            );
            pipe.sim.spawns.projectiles.push(proj);
        }
    }

    impl EntityInterface for Projectile {
        fn tick(&mut self, pipe: &mut EntityPipe) -> EntityTickResult {
            let cur_tick = pipe.sim.cur_tick;
            let prev_time = (cur_tick - self.start_tick - 1) as f32 / TICKS_PER_SECOND as f32;
            let cur_time = (cur_tick - self.start_tick) as f32 / TICKS_PER_SECOND as f32;
            let prev_pos = self.pos_at(prev_time, pipe);
            let mut cur_pos = self.pos_at(cur_time, pipe);
            let cur_vel = cur_pos - prev_pos;

            let collision = pipe.sim.collision;
            let mut before = cur_pos;
            let line_end = cur_pos;
            let collide = collision.intersect_line(&prev_pos, &line_end, &mut cur_pos, &mut before)
                != CollisionTile::None;

            let line_end = cur_pos;
            let target = GameWorld::intersect_character_on_line(
                pipe.characters,
                &prev_pos,
                &line_end,
                HIT_RADIUS,
                &mut cur_pos,
                Some(self.owner),
            );

            self.life_span -= 1;
            self.cur_pos = cur_pos;

            if target.is_none()
                && !collide
                && self.life_span >= 0
                && !Entity::<ProjectileId>::outside_of_playfield(&cur_pos, collision)
            {
                return EntityTickResult::None;
            }

            // push out of the wall
            let mut bounce_pos = cur_pos;
            let step = normalize(&cur_vel);
            for _ in 0..MAX_PUSH_OUT_STEPS {
                if collision.get_collision_at(bounce_pos.x, bounce_pos.y) == TileNum::Air {
                    break;
                }
                bounce_pos -= step;
            }

            if self.bounces > 0 && self.life_span >= 0 {
                self.bounce(bounce_pos, cur_vel, target.is_some(), pipe);
            }

            if self.explosive {
                let explosion = Explosion {
                    pos: bounce_pos,
                    owner: self.owner,
                    weapon: self.ty,
                    damage: self.damage,
                    knockback: DamageLevel::from_level(self.force as i32),
                    damage_level: DamageLevel::ExemptOwner,
                    sound: true,
                };
                create_explosion(
                    &mut CharactersViewMut::all(pipe.characters),
                    pipe.sim,
                    &explosion,
                );
            } else if let Some(target) = target.and_then(|id| pipe.characters.get_mut(&id)) {
                target.impulse_add(&(self.direction * self.force.max(0.001)));
                target.take_damage(
                    self.damage,
                    Some(self.owner),
                    KillWeapon::Weapon(self.ty),
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
            // clipped at the current position, but the record carries the start
            if view.network_clipped(&self.cur_pos) {
                return None;
            }
            Some(SnapItem::Projectile(self.to_snap()))
        }
    }

}
