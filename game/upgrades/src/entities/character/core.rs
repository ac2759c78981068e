pub mod character_core {
    use std::ops::AddAssign;

    use bitflags::bitflags;
    use num_derive::FromPrimitive;
    use num_traits::FromPrimitive;
    use serde::{Deserialize, Serialize};

    use game_interface::types::{input::CharacterInput, snapshot::NetCharacterCore};
    use math::math::{
        distance, length, normalize, round_to_int,
        vector::{ivec2, vec2},
    };

    use crate::{
        collision::collision::{Collision, CollisionTile, TileNum},
        config::config::Tunings,
        state::state::TICKS_PER_SECOND,
    };

    pub const PHYSICAL_SIZE: f32 = 28.0;
    pub const fn physical_size_vec2() -> ivec2 {
        ivec2 {
            x: PHYSICAL_SIZE as i32,
            y: PHYSICAL_SIZE as i32,
        }
    }

    /// Velocities above this are clamped.
    const MAX_VELOCITY: f32 = 6000.0;
    /// Below this distance the hook stops dragging.
    const HOOK_DRAG_MIN_DISTANCE: f32 = 46.0;

    #[derive(
        Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromPrimitive,
    )]
    pub enum HookState {
        Retracted = -1,
        #[default]
        Idle = 0,
        RetractStart = 1,
        Retract1 = 2,
        Retract2 = 3,
        RetractEnd = 4,
        Flying = 5,
        Grabbed = 6,
    }

    #[derive(
        Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    pub struct CoreEvents(i32);
    bitflags! {
        impl CoreEvents: i32 {
            const GROUND_JUMP = (1 << 0);
            const AIR_JUMP = (1 << 1);
            const HOOK_LAUNCH = (1 << 2);
            const HOOK_ATTACH_GROUND = (1 << 4);
            const HOOK_HIT_NOHOOK = (1 << 5);
            const HOOK_RETRACT = (1 << 6);
        }
    }

    /// The movement state of a character. It is a plain value without any
    /// reference to the world, so copies can be simulated ahead freely.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Core {
        pub pos: vec2,
        pub vel: vec2,

        pub hook_pos: vec2,
        pub hook_dir: vec2,
        pub hook_tick: i32,
        pub hook_state: HookState,

        /// bit 1: the jump of the current press happened,
        /// bit 2: the air jump was used
        pub jumped: i32,
        pub direction: i32,
        pub angle: i32,
        pub input: CharacterInput,

        pub triggered_events: CoreEvents,
    }

    fn saturated_add<T: AddAssign + PartialOrd + num_traits::Zero>(
        min_val: T,
        max_val: T,
        current: T,
        modifier: T,
    ) -> T {
        let mut cur = current;
        if modifier < T::zero() {
            if cur < min_val {
                return cur;
            }
            cur += modifier;
            if cur < min_val {
                cur = min_val;
            }
            cur
        } else {
            if cur > max_val {
                return cur;
            }
            cur += modifier;
            if cur > max_val {
                cur = max_val;
            }
            cur
        }
    }

    fn velocity_ramp(value: f32, start: f32, range: f32, curvature: f32) -> f32 {
        if value < start {
            return 1.0;
        }
        1.0 / curvature.powf((value - start) / range)
    }

    impl Core {
        pub fn new(pos: vec2) -> Self {
            Self {
                pos,
                hook_pos: pos,
                ..Default::default()
            }
        }

        pub fn is_grounded(&self, collision: &Collision) -> bool {
            let half = PHYSICAL_SIZE / 2.0;
            collision.check_pointf(self.pos.x + half, self.pos.y + half + 5.0)
                || collision.check_pointf(self.pos.x - half, self.pos.y + half + 5.0)
        }

        /// Input handling, gravity, friction and the hook. Does not move the
        /// character, see [`Core::physics_move`].
        pub fn physics_tick(&mut self, use_input: bool, collision: &Collision, tuning: &Tunings) {
            self.triggered_events = CoreEvents::empty();

            let grounded = self.is_grounded(collision);
            let target_direction = normalize(&vec2::new(
                self.input.target_x as f32,
                self.input.target_y as f32,
            ));

            self.vel.y += tuning.gravity;

            let (max_speed, accel, friction) = if grounded {
                (
                    tuning.ground_control_speed,
                    tuning.ground_control_accel,
                    tuning.ground_friction,
                )
            } else {
                (
                    tuning.air_control_speed,
                    tuning.air_control_accel,
                    tuning.air_friction,
                )
            };

            if use_input {
                self.direction = self.input.direction;

                let tx = self.input.target_x as f32;
                let ty = self.input.target_y as f32;
                let mut a = if self.input.target_x == 0 {
                    ty.atan()
                } else {
                    (ty / tx).atan()
                };
                if self.input.target_x < 0 {
                    a += std::f32::consts::PI;
                }
                self.angle = (a * 256.0) as i32;

                if self.input.jump {
                    if self.jumped & 1 == 0 {
                        if grounded {
                            self.triggered_events |= CoreEvents::GROUND_JUMP;
                            self.vel.y = -tuning.ground_jump_impulse;
                            self.jumped |= 1;
                        } else if self.jumped & 2 == 0 {
                            self.triggered_events |= CoreEvents::AIR_JUMP;
                            self.vel.y = -tuning.air_jump_impulse;
                            self.jumped |= 3;
                        }
                    }
                } else {
                    self.jumped &= !1;
                }

                if self.input.hook {
                    if self.hook_state == HookState::Idle {
                        self.hook_state = HookState::Flying;
                        self.hook_pos = self.pos + target_direction * PHYSICAL_SIZE * 1.5;
                        self.hook_dir = target_direction;
                        self.hook_tick = 0;
                        self.triggered_events |= CoreEvents::HOOK_LAUNCH;
                    }
                } else {
                    self.hook_state = HookState::Idle;
                    self.hook_pos = self.pos;
                }
            }

            if self.direction < 0 {
                self.vel.x = saturated_add(-max_speed, max_speed, self.vel.x, -accel);
            } else if self.direction > 0 {
                self.vel.x = saturated_add(-max_speed, max_speed, self.vel.x, accel);
            } else {
                self.vel.x *= friction;
            }

            if grounded {
                self.jumped &= !2;
            }

            match self.hook_state {
                HookState::Idle => {
                    self.hook_pos = self.pos;
                }
                HookState::RetractStart | HookState::Retract1 | HookState::Retract2 => {
                    self.hook_state =
                        HookState::from_i32(self.hook_state as i32 + 1).unwrap_or_default();
                }
                HookState::RetractEnd => {
                    self.hook_state = HookState::Retracted;
                    self.triggered_events |= CoreEvents::HOOK_RETRACT;
                }
                HookState::Flying => {
                    let mut new_pos = self.hook_pos + self.hook_dir * tuning.hook_fire_speed;
                    if distance(&self.pos, &new_pos) > tuning.hook_length {
                        self.hook_state = HookState::RetractStart;
                        new_pos = self.pos + normalize(&(new_pos - self.pos)) * tuning.hook_length;
                    }

                    let mut hit_pos = new_pos;
                    let mut before = new_pos;
                    let hit = collision.intersect_line(&self.hook_pos, &new_pos, &mut hit_pos, &mut before);
                    if self.hook_state == HookState::Flying {
                        match hit {
                            CollisionTile::Solid(TileNum::NoHook) => {
                                self.triggered_events |= CoreEvents::HOOK_HIT_NOHOOK;
                                self.hook_state = HookState::RetractStart;
                            }
                            CollisionTile::Solid(_) => {
                                self.triggered_events |= CoreEvents::HOOK_ATTACH_GROUND;
                                self.hook_state = HookState::Grabbed;
                            }
                            CollisionTile::None => {}
                        }
                        self.hook_pos = hit_pos;
                    }
                }
                HookState::Grabbed | HookState::Retracted => {}
            }

            if self.hook_state == HookState::Grabbed {
                if distance(&self.hook_pos, &self.pos) > HOOK_DRAG_MIN_DISTANCE {
                    let mut hook_vel =
                        normalize(&(self.hook_pos - self.pos)) * tuning.hook_drag_accel;
                    // dragging up is stronger than dragging down
                    if hook_vel.y > 0.0 {
                        hook_vel.y *= 0.3;
                    }
                    if (hook_vel.x < 0.0 && self.direction < 0)
                        || (hook_vel.x > 0.0 && self.direction > 0)
                    {
                        hook_vel.x *= 0.95;
                    } else {
                        hook_vel.x *= 0.75;
                    }

                    let new_vel = self.vel + hook_vel;
                    if length(&new_vel) < tuning.hook_drag_speed
                        || length(&new_vel) < length(&self.vel)
                    {
                        self.vel = new_vel;
                    }
                }
                self.hook_tick += 1;
            }

            if length(&self.vel) > MAX_VELOCITY {
                self.vel = normalize(&self.vel) * MAX_VELOCITY;
            }
        }

        pub fn physics_move(&mut self, collision: &Collision, tuning: &Tunings) {
            let ramp_value = velocity_ramp(
                length(&self.vel) * TICKS_PER_SECOND as f32,
                tuning.velramp_start,
                tuning.velramp_range,
                tuning.velramp_curvature,
            );

            self.vel.x *= ramp_value;
            let mut new_pos = self.pos;
            collision.move_box(&mut new_pos, &mut self.vel, &physical_size_vec2(), 0.0);
            self.vel.x *= 1.0 / ramp_value;

            self.pos = new_pos;
        }

        /// Snaps the state to what the network can represent.
        pub fn physics_quantize(&mut self) {
            let net = self.write(0);
            self.read(&net);
        }

        /// One full step of a copy that only extrapolates the last input.
        #[must_use]
        pub fn predict(&self, collision: &Collision, tuning: &Tunings) -> Self {
            let mut core = *self;
            core.physics_tick(false, collision, tuning);
            core.physics_move(collision, tuning);
            core.physics_quantize();
            core
        }

        pub fn write(&self, tick: i32) -> NetCharacterCore {
            NetCharacterCore {
                tick,
                x: round_to_int(self.pos.x),
                y: round_to_int(self.pos.y),
                vel_x: round_to_int(self.vel.x * 256.0),
                vel_y: round_to_int(self.vel.y * 256.0),
                angle: self.angle,
                direction: self.direction,
                jumped: self.jumped,
                hook_state: self.hook_state as i32,
                hook_tick: self.hook_tick,
                hook_x: round_to_int(self.hook_pos.x),
                hook_y: round_to_int(self.hook_pos.y),
                hook_dx: round_to_int(self.hook_dir.x * 256.0),
                hook_dy: round_to_int(self.hook_dir.y * 256.0),
            }
        }

        pub fn read(&mut self, net: &NetCharacterCore) {
            self.pos = vec2::new(net.x as f32, net.y as f32);
            self.vel = vec2::new(net.vel_x as f32 / 256.0, net.vel_y as f32 / 256.0);
            self.hook_state = HookState::from_i32(net.hook_state).unwrap_or_default();
            self.hook_tick = net.hook_tick;
            self.hook_pos = vec2::new(net.hook_x as f32, net.hook_y as f32);
            self.hook_dir = vec2::new(net.hook_dx as f32 / 256.0, net.hook_dy as f32 / 256.0);
            self.jumped = net.jumped;
            self.direction = net.direction;
            self.angle = net.angle;
        }
    }

    #[cfg(test)]
    mod test {
        use game_interface::types::input::CharacterInput;
        use math::math::vector::vec2;

        use crate::{collision::collision::Collision, config::config::Tunings};

        use super::{Core, CoreEvents, HookState};

        const ROOM: &str = "\
            ##########\n\
            #........#\n\
            #........#\n\
            #........#\n\
            ##########\n";

        fn floor_core(col: &Collision) -> Core {
            // resting on the floor that starts at y = 128
            let mut core = Core::new(vec2::new(100.0, 113.0));
            assert!(core.is_grounded(col));
            core.physics_quantize();
            core
        }

        #[test]
        fn gravity_and_floor() {
            let col = Collision::from_ascii(ROOM).unwrap();
            let tuning = Tunings::default();
            let mut core = Core::new(vec2::new(100.0, 60.0));
            for _ in 0..100 {
                core.physics_tick(true, &col, &tuning);
                core.physics_move(&col, &tuning);
                core.physics_quantize();
            }
            assert!(core.is_grounded(&col));
            assert_eq!(core.vel.y, 0.0);
        }

        #[test]
        fn ground_and_air_jump() {
            let col = Collision::from_ascii(ROOM).unwrap();
            let tuning = Tunings::default();
            let mut core = floor_core(&col);
            core.input = CharacterInput {
                jump: true,
                ..Default::default()
            };
            core.physics_tick(true, &col, &tuning);
            assert!(core.triggered_events.contains(CoreEvents::GROUND_JUMP));
            assert_eq!(core.vel.y, -tuning.ground_jump_impulse);
            core.physics_move(&col, &tuning);

            // holding jump does not jump again
            core.physics_tick(true, &col, &tuning);
            assert!(core.triggered_events.is_empty());

            core.input.jump = false;
            core.physics_tick(true, &col, &tuning);
            core.physics_move(&col, &tuning);
            core.input.jump = true;
            core.physics_tick(true, &col, &tuning);
            assert!(core.triggered_events.contains(CoreEvents::AIR_JUMP));
            assert_eq!(core.jumped, 3);
        }

        #[test]
        fn hook_attaches_to_wall() {
            let col = Collision::from_ascii(ROOM).unwrap();
            let tuning = Tunings::default();
            let mut core = floor_core(&col);
            core.input = CharacterInput {
                hook: true,
                target_x: 1,
                target_y: 0,
                ..Default::default()
            };
            core.physics_tick(true, &col, &tuning);
            assert!(core.triggered_events.contains(CoreEvents::HOOK_LAUNCH));
            let mut grabbed = false;
            for _ in 0..10 {
                core.physics_tick(true, &col, &tuning);
                if core.hook_state == HookState::Grabbed {
                    grabbed = true;
                    break;
                }
            }
            assert!(grabbed);
            assert!(core.hook_pos.x >= 288.0);
        }

        #[test]
        fn predict_is_pure() {
            let col = Collision::from_ascii(ROOM).unwrap();
            let tuning = Tunings::default();
            let mut core = Core::new(vec2::new(100.0, 60.0));
            core.vel = vec2::new(3.0, 0.0);
            let before = core;
            let predicted = core.predict(&col, &tuning);
            assert_eq!(core, before);

            core.physics_tick(false, &col, &tuning);
            core.physics_move(&col, &tuning);
            core.physics_quantize();
            assert_eq!(core.write(0), predicted.write(0));
        }
    }
}
