pub mod entity {
    use game_interface::types::{id_types::CharacterId, snapshot::SnapItem};
    use math::math::{round_to_int, vector::vec2};

    use crate::{collision::collision::Collision, simulation_pipe::simulation_pipe::EntityPipe};

    #[derive(Debug, PartialEq, Eq)]
    pub enum EntityTickResult {
        None,
        RemoveEntity,
    }

    /// Who a snapshot is built for.
    #[derive(Debug, Clone, Copy)]
    pub struct SnapView {
        /// `None` for recorders, they see everything
        pub observer: Option<CharacterId>,
        pub view_pos: Option<vec2>,
        pub cur_tick: i32,
        pub paused: bool,
    }

    impl SnapView {
        /// Entities too far away from the observer are not sent.
        pub fn network_clipped(&self, check_pos: &vec2) -> bool {
            let Some(view_pos) = self.view_pos else {
                return false;
            };
            let dx = view_pos.x - check_pos.x;
            let dy = view_pos.y - check_pos.y;
            dx.abs() > 1000.0 || dy.abs() > 800.0
        }
    }

    pub trait EntityInterface {
        #[must_use]
        fn tick(&mut self, pipe: &mut EntityPipe) -> EntityTickResult;
        #[must_use]
        fn tick_deferred(&mut self, pipe: &mut EntityPipe) -> EntityTickResult;
        /// While the game is paused every timer of the entity is shifted.
        fn tick_paused(&mut self);
        fn snap(&self, view: &SnapView) -> Option<SnapItem>;
    }

    #[derive(Debug)]
    pub struct Entity<I> {
        pub game_element_id: I,

        /// removed at the end of the tick, the deferred tick is skipped
        pub marked_for_destroy: bool,
    }

    impl<I> Entity<I> {
        pub fn new(game_el_id: &I) -> Self
        where
            I: Copy,
        {
            Self {
                game_element_id: *game_el_id,

                marked_for_destroy: false,
            }
        }

        pub fn outside_of_playfield(check_pos: &vec2, collision: &Collision) -> bool {
            let rx = round_to_int(check_pos.x) / 32;
            let ry = round_to_int(check_pos.y) / 32;
            (rx < -200 || rx >= collision.get_playfield_width() as i32 + 200)
                || (ry < -200 || ry >= collision.get_playfield_height() as i32 + 200)
        }
    }

    /// Position of a projectile `time` seconds after it was fired.
    pub fn calc_pos(pos: &vec2, dir: &vec2, curvature: f32, speed: f32, mut time: f32) -> vec2 {
        time *= speed;
        let curvature = curvature / 10000.0;
        vec2::new(
            pos.x + dir.x * time,
            pos.y + dir.y * time + curvature * (time * time),
        )
    }

    #[cfg(test)]
    mod test {
        use game_interface::types::id_types::CharacterId;
        use math::math::vector::vec2;

        use crate::collision::collision::Collision;

        use super::{calc_pos, Entity, SnapView};

        #[test]
        fn curved_flight() {
            let start = vec2::new(0.0, 0.0);
            let dir = vec2::new(1.0, 0.0);
            assert_eq!(calc_pos(&start, &dir, 0.0, 100.0, 1.0), vec2::new(100.0, 0.0));
            let p = calc_pos(&start, &dir, 10000.0, 10.0, 1.0);
            assert_eq!(p, vec2::new(10.0, 100.0));
        }

        #[test]
        fn clipping() {
            let view = SnapView {
                observer: Some(CharacterId::new(0)),
                view_pos: Some(vec2::new(0.0, 0.0)),
                cur_tick: 0,
                paused: false,
            };
            assert!(!view.network_clipped(&vec2::new(1000.0, -800.0)));
            assert!(view.network_clipped(&vec2::new(1001.0, 0.0)));
            assert!(view.network_clipped(&vec2::new(0.0, 801.0)));
            let recorder = SnapView {
                observer: None,
                view_pos: None,
                ..view
            };
            assert!(!recorder.network_clipped(&vec2::new(5000.0, 5000.0)));
        }

        #[test]
        fn playfield_border() {
            let col = Collision::from_ascii("###\n#.#\n###\n").unwrap();
            assert!(!Entity::<u32>::outside_of_playfield(&vec2::new(-6000.0, 0.0), &col));
            assert!(Entity::<u32>::outside_of_playfield(&vec2::new(-6432.0, 0.0), &col));
            assert!(Entity::<u32>::outside_of_playfield(&vec2::new(0.0, 32.0 * 203.0), &col));
        }
    }
}
