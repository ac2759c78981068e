pub mod bot {
    use game_interface::types::{id_types::CharacterId, weapons::WeaponType};
    use math::math::{distance, normalize, sign, vector::vec2, Rng};

    use crate::{
        collision::collision::{Collision, CollisionTile, TileNum},
        entities::character::core::character_core::PHYSICAL_SIZE,
        state::state::TICKS_PER_SECOND,
    };

    /// Bots only care about characters closer than this.
    pub const BOT_VISION_RANGE: f32 = 800.0;
    pub const BOT_HOOK_RANGE: f32 = 400.0;
    const JUMP_LOOKAHEAD: f32 = 300.0;
    const TURN_LOOKAHEAD: f32 = PHYSICAL_SIZE + 10.0;
    /// Half the box the idle aim wanders in, in aim units.
    const SCAN_RANGE: f32 = 50.0;
    /// Aim raise per unit of horizontal distance, so curved shots land.
    const BULLET_DROP: [f32; 5] = [0.0, 0.0016, 0.0, 0.00627, 0.0];

    fn secs(s: f32) -> i32 {
        (TICKS_PER_SECOND as f32 * s).round() as i32
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub enum BotState {
        /// nobody around, stroll and look around
        #[default]
        Wander,
        /// a visible target out of weapon range, walk towards it
        Seek,
        /// a visible target in weapon range, shoot it
        Engage,
        /// a target behind a wall, get around it
        Reposition,
    }

    /// What a bot knows about itself and the world this tick.
    #[derive(Debug, Clone, Copy)]
    pub struct BotView<'a> {
        pub collision: &'a Collision,
        pub pos: vec2,
        pub grounded: bool,
        pub weapon: WeaponType,
        pub hammer_fly: bool,
        pub hammer_auto: bool,
        pub gun_auto: bool,
        pub alt_mode: bool,
        pub laser_reach: f32,
        /// the closest other character in vision range
        pub target: Option<(CharacterId, vec2)>,
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct BotOutput {
        pub direction: i32,
        pub target_x: i32,
        pub target_y: i32,
        pub jump: bool,
        pub hook: bool,
        pub shoot: bool,
        /// where a shot goes, relative to the bot
        pub aim: vec2,
    }

    /// Input synthesis for server controlled characters.
    #[derive(Debug, Default, Clone)]
    pub struct BotBrain {
        state: BotState,
        last_target: Option<CharacterId>,

        direction: vec2,
        aim_offset: vec2,
        aim_offset_delay: i32,
        scan_pos: vec2,
        scan_delay: i32,

        shoot_reaction: i32,
        gun_delay: i32,
        hammer_delay: i32,
        hook_timer: i32,

        walk_dir: i32,
        walk_timer: i32,
        jump_delay: i32,
        has_jumped: bool,
    }

    impl BotBrain {
        pub fn state(&self) -> BotState {
            self.state
        }

        fn trigger_range(view: &BotView) -> f32 {
            match view.weapon {
                WeaponType::Hammer if !view.hammer_fly => BOT_HOOK_RANGE + 100.0,
                WeaponType::Hammer => 2000.0,
                WeaponType::Gun | WeaponType::Grenade => 600.0,
                WeaponType::Shotgun => 400.0,
                WeaponType::Laser => view.laser_reach - 300.0,
                WeaponType::Ninja => 0.0,
            }
        }

        fn next_state(view: &BotView) -> BotState {
            let Some((_, target_pos)) = view.target else {
                return BotState::Wander;
            };
            let mut col = vec2::default();
            let mut before = vec2::default();
            if view
                .collision
                .intersect_line(&view.pos, &target_pos, &mut col, &mut before)
                != CollisionTile::None
            {
                BotState::Reposition
            } else if distance(&view.pos, &target_pos) <= Self::trigger_range(view) {
                BotState::Engage
            } else {
                BotState::Seek
            }
        }

        fn choose_new_stroll(&mut self, rng: &mut Rng) {
            self.walk_timer = secs(0.5).max(secs(2.0 * rng.random_float()));
            self.walk_dir = if rng.random_float() > 0.5 { -1 } else { 1 };
        }

        /// Semi automatic weapons need the trigger released between shots.
        fn gate_semi_auto(&mut self, view: &BotView) -> bool {
            match view.weapon {
                WeaponType::Gun if !view.gun_auto => {
                    if self.gun_delay != 0 {
                        return false;
                    }
                    self.gun_delay = secs(0.2);
                    true
                }
                WeaponType::Hammer if !view.hammer_auto => {
                    if self.hammer_delay != 0 {
                        return false;
                    }
                    self.hammer_delay = secs(0.15);
                    true
                }
                _ => true,
            }
        }

        fn engage(&mut self, view: &BotView, target_pos: vec2, rng: &mut Rng) -> (bool, bool) {
            let mut shoot = false;
            self.direction = normalize(&(target_pos - view.pos + self.aim_offset));

            if self.state == BotState::Engage {
                if self.shoot_reaction >= secs(0.5) {
                    self.scan_pos = self.direction;
                    shoot = self.gate_semi_auto(view);
                } else {
                    self.shoot_reaction += 1;
                }
            } else {
                self.shoot_reaction = 0;
            }

            // flying hammers have no use for the hook
            let mut hook =
                view.weapon == WeaponType::Hammer && (!view.hammer_fly || view.alt_mode);
            if distance(&target_pos, &view.pos) <= BOT_HOOK_RANGE {
                if self.hook_timer == 0 {
                    self.hook_timer = secs(0.2).max(secs(1.5 * rng.random_float()));
                    hook = false;
                }
            } else {
                hook = false;
            }
            (shoot, hook)
        }

        fn update_aim_offset(&mut self, view: &BotView, rng: &mut Rng) {
            if self.aim_offset_delay != 0 {
                self.aim_offset_delay -= 1;
                return;
            }
            let mut max = view
                .target
                .map(|(_, target_pos)| distance(&view.pos, &target_pos) / 3.0)
                .unwrap_or(0.0);
            if view.weapon == WeaponType::Laser {
                max *= 1.8;
            }
            self.aim_offset_delay = secs(0.2);
            self.aim_offset = vec2::new(
                -max / 2.0 + max * rng.random_float(),
                -max / 2.0 + max * rng.random_float(),
            );
        }

        fn walk_and_jump(&mut self, view: &BotView, rng: &mut Rng) -> bool {
            match (self.state, view.target) {
                (BotState::Wander, _) | (_, None) => {
                    if self.walk_timer == 0 {
                        self.choose_new_stroll(rng);
                    } else {
                        self.walk_timer -= 1;
                    }
                }
                (_, Some((_, target_pos))) => {
                    self.walk_timer = 0;
                    self.walk_dir = sign(target_pos.x - view.pos.x) as i32;
                }
            }

            if view.grounded {
                self.has_jumped = false;
            }

            let solid = |dist: f32| {
                view.collision
                    .get_collision_at(view.pos.x + self.walk_dir as f32 * dist, view.pos.y)
                    != TileNum::Air
            };
            let mut jump = false;
            let wall_ahead = solid(TURN_LOOKAHEAD);
            if solid(JUMP_LOOKAHEAD) || wall_ahead {
                if wall_ahead && view.grounded && self.state == BotState::Wander {
                    self.choose_new_stroll(rng);
                }
                // only jump again mid air if the first jump was from the ground,
                // so they still fall down openings
                if self.jump_delay == 0 && (view.grounded || self.has_jumped) {
                    if view.grounded {
                        self.has_jumped = true;
                    }
                    self.jump_delay = secs(0.3).max(secs(0.5 * rng.random_float()));
                    jump = true;
                }
            }
            if self.jump_delay != 0 {
                self.jump_delay -= 1;
            }
            jump
        }

        fn scan(&mut self, rng: &mut Rng) {
            const DIV: f32 = 10.0;
            if self.scan_delay == 0 {
                self.scan_delay = secs(1.0).max(secs(1.5 * rng.random_float()));
                self.scan_pos = vec2::new(
                    -SCAN_RANGE + SCAN_RANGE * 2.0 * rng.random_float(),
                    -SCAN_RANGE + SCAN_RANGE * 2.0 * rng.random_float(),
                );
            } else {
                self.scan_delay -= 1;
            }

            let x_speed = if self.scan_pos.x > self.direction.x - 1.0 {
                ((self.scan_pos.x - self.direction.x) / DIV).trunc()
            } else {
                -1.0
            };
            let y_speed = if self.scan_pos.y > self.direction.y - 1.0 {
                1.0
            } else {
                -1.0
            };
            self.direction.x = (self.direction.x + x_speed).clamp(-SCAN_RANGE, SCAN_RANGE);
            self.direction.y = (self.direction.y + y_speed).clamp(-SCAN_RANGE, SCAN_RANGE);
        }

        pub fn tick(&mut self, view: &BotView, rng: &mut Rng) -> BotOutput {
            let target_id = view.target.map(|(id, _)| id);
            if target_id != self.last_target {
                self.last_target = target_id;
                self.shoot_reaction = 0;
            }

            let state = Self::next_state(view);
            if state != self.state {
                log::trace!(target: "character", "bot {:?} -> {:?}", self.state, state);
            }
            self.state = state;

            let mut bullet_drop = 0.0;
            let (shoot, hook) = match (state, view.target) {
                (BotState::Seek | BotState::Engage, Some((_, target_pos))) => {
                    bullet_drop = (view.pos.x - target_pos.x).abs()
                        * BULLET_DROP.get(view.weapon.index()).copied().unwrap_or(0.0);
                    self.engage(view, target_pos, rng)
                }
                _ => {
                    self.shoot_reaction = 0;
                    (false, false)
                }
            };

            self.hook_timer = (self.hook_timer - 1).max(0);
            self.gun_delay = (self.gun_delay - 1).max(0);
            self.hammer_delay = (self.hammer_delay - 1).max(0);

            self.update_aim_offset(view, rng);
            let jump = self.walk_and_jump(view, rng);

            if matches!(state, BotState::Wander | BotState::Reposition) {
                self.scan(rng);
            }

            let target_x = (self.direction.x * 10.0) as i32;
            let target_y = (self.direction.y * 10.0 - bullet_drop) as i32;
            self.direction.y -= bullet_drop / 10.0;

            BotOutput {
                direction: self.walk_dir,
                target_x,
                target_y,
                jump,
                hook,
                shoot,
                aim: vec2::new(target_x as f32, target_y as f32),
            }
        }
    }

    #[cfg(test)]
    mod test {
        use game_interface::types::{id_types::CharacterId, weapons::WeaponType};
        use math::math::{vector::vec2, Rng};

        use super::{BotBrain, BotState, BotView};
        use crate::collision::collision::Collision;

        const ARENA: &str = "\
            ##############################\n\
            #............................#\n\
            #............................#\n\
            #.............#..............#\n\
            #.............#..............#\n\
            ##############################\n";

        fn view(col: &Collision, pos: vec2, target: Option<vec2>) -> BotView<'_> {
            BotView {
                collision: col,
                pos,
                grounded: true,
                weapon: WeaponType::Gun,
                hammer_fly: false,
                hammer_auto: false,
                gun_auto: true,
                alt_mode: false,
                laser_reach: 800.0,
                target: target.map(|pos| (CharacterId::new(1), pos)),
            }
        }

        #[test]
        fn wanders_without_target() {
            let col = Collision::from_ascii(ARENA).unwrap();
            let mut rng = Rng::new(7);
            let mut brain = BotBrain::default();
            for _ in 0..100 {
                let out = brain.tick(&view(&col, vec2::new(200.0, 144.0), None), &mut rng);
                assert_eq!(brain.state(), BotState::Wander);
                assert!(!out.shoot);
                assert!(out.direction == 1 || out.direction == -1);
            }
        }

        #[test]
        fn engages_after_reaction_time() {
            let col = Collision::from_ascii(ARENA).unwrap();
            let mut rng = Rng::new(7);
            let mut brain = BotBrain::default();
            let v = view(&col, vec2::new(100.0, 48.0), Some(vec2::new(400.0, 48.0)));

            let mut first_shot = None;
            for tick in 0..60 {
                let out = brain.tick(&v, &mut rng);
                assert_eq!(brain.state(), BotState::Engage);
                assert_eq!(out.direction, 1);
                if out.shoot && first_shot.is_none() {
                    first_shot = Some(tick);
                    assert!(out.aim.x > 0.0);
                }
            }
            assert_eq!(first_shot, Some(25));
        }

        #[test]
        fn seeks_far_targets() {
            let col = Collision::from_ascii(ARENA).unwrap();
            let mut rng = Rng::new(7);
            let mut brain = BotBrain::default();
            let v = view(&col, vec2::new(850.0, 48.0), Some(vec2::new(100.0, 48.0)));
            for _ in 0..60 {
                let out = brain.tick(&v, &mut rng);
                assert_eq!(brain.state(), BotState::Seek);
                assert!(!out.shoot);
                assert_eq!(out.direction, -1);
            }
        }

        #[test]
        fn walls_block_the_view() {
            let col = Collision::from_ascii(ARENA).unwrap();
            let mut rng = Rng::new(7);
            let mut brain = BotBrain::default();
            let v = view(&col, vec2::new(300.0, 144.0), Some(vec2::new(600.0, 144.0)));
            for _ in 0..60 {
                let out = brain.tick(&v, &mut rng);
                assert_eq!(brain.state(), BotState::Reposition);
                assert!(!out.shoot);
                assert_eq!(out.direction, 1);
            }
        }
    }
}
