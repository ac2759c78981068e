pub mod collision {
    use num_derive::FromPrimitive;
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use math::math::{
        distance, dot, mix, round_to_int,
        vector::{ivec2, vec2},
    };

    /// Size of one tile in world units.
    pub const TILE_SIZE: i32 = 32;

    #[derive(
        Debug,
        Default,
        Copy,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        FromPrimitive,
    )]
    pub enum TileNum {
        #[default]
        Air = 0,
        Solid = 1,
        Death = 2,
        /// solid, but the hook does not attach
        NoHook = 3,
    }

    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub enum CollisionTile {
        None,
        Solid(TileNum),
    }

    #[derive(Error, Debug, PartialEq, Eq)]
    pub enum CollisionError {
        #[error("the map has no rows")]
        Empty,
        #[error("row {row} has width {width}, expected {expected}")]
        RaggedRow {
            row: usize,
            width: usize,
            expected: usize,
        },
        #[error("unknown tile '{tile}' at {x}:{y}")]
        UnknownTile { tile: char, x: usize, y: usize },
    }

    /// The static level geometry, one game layer of tiles.
    #[derive(Debug, Default, Clone)]
    pub struct Collision {
        tiles: Vec<TileNum>,
        width: u32,
        height: u32,
        spawns: Vec<vec2>,
    }

    impl Collision {
        /// Builds the level from an ascii drawing, one char per tile:
        /// `.` or space air, `#` solid, `D` death, `N` unhookable, `S` a spawn point.
        pub fn from_ascii(map: &str) -> Result<Self, CollisionError> {
            let rows: Vec<&str> = map
                .lines()
                .map(|l| l.trim_end_matches('\r'))
                .filter(|l| !l.is_empty())
                .collect();
            let expected = rows.first().ok_or(CollisionError::Empty)?.chars().count();

            let mut tiles = Vec::with_capacity(expected * rows.len());
            let mut spawns = Vec::new();
            for (y, row) in rows.iter().enumerate() {
                let width = row.chars().count();
                if width != expected {
                    return Err(CollisionError::RaggedRow {
                        row: y,
                        width,
                        expected,
                    });
                }
                for (x, c) in row.chars().enumerate() {
                    let tile = match c {
                        '.' | ' ' => TileNum::Air,
                        '#' => TileNum::Solid,
                        'D' => TileNum::Death,
                        'N' => TileNum::NoHook,
                        'S' => {
                            spawns.push(vec2::new(
                                (x as i32 * TILE_SIZE + TILE_SIZE / 2) as f32,
                                (y as i32 * TILE_SIZE + TILE_SIZE / 2) as f32,
                            ));
                            TileNum::Air
                        }
                        tile => return Err(CollisionError::UnknownTile { tile, x, y }),
                    };
                    tiles.push(tile);
                }
            }

            Ok(Self {
                tiles,
                width: expected as u32,
                height: rows.len() as u32,
                spawns,
            })
        }

        pub fn get_playfield_width(&self) -> u32 {
            self.width
        }

        pub fn get_playfield_height(&self) -> u32 {
            self.height
        }

        pub fn spawn_points(&self) -> &[vec2] {
            &self.spawns
        }

        #[inline(always)]
        pub fn get_tile(&self, x: i32, y: i32) -> TileNum {
            self.tiles[self.tile_index(x, y)]
        }

        #[inline(always)]
        pub fn is_solid(&self, x: i32, y: i32) -> bool {
            matches!(self.get_tile(x, y), TileNum::Solid | TileNum::NoHook)
        }

        pub fn is_death(&self, x: f32, y: f32) -> bool {
            self.get_collision_at(x, y) == TileNum::Death
        }

        #[inline(always)]
        pub fn check_point(&self, x: i32, y: i32) -> bool {
            self.is_solid(x, y)
        }

        pub fn check_pointf(&self, x: f32, y: f32) -> bool {
            self.is_solid(round_to_int(x), round_to_int(y))
        }

        #[inline(always)]
        pub fn test_box(&self, pos: &ivec2, size_param: &ivec2) -> bool {
            let mut size = *size_param;
            size /= 2;
            self.check_point(pos.x - size.x, pos.y + size.y)
                || self.check_point(pos.x + size.x, pos.y + size.y)
                || self.check_point(pos.x - size.x, pos.y - size.y)
                || self.check_point(pos.x + size.x, pos.y - size.y)
        }

        /// Moves a point by its velocity, reflecting the velocity on the axes
        /// that would end up inside a solid.
        pub fn move_point(
            &self,
            inout_pos: &mut vec2,
            inout_vel: &mut vec2,
            elasticity: f32,
            bounces: &mut i32,
        ) {
            *bounces = 0;

            let pos = *inout_pos;
            let vel = *inout_vel;
            let pos_vel = pos + vel;
            if self.check_pointf(pos_vel.x, pos_vel.y) {
                let mut affected = 0;
                if self.check_pointf(pos.x + vel.x, pos.y) {
                    inout_vel.x *= -elasticity;
                    *bounces += 1;
                    affected += 1;
                }

                if self.check_pointf(pos.x, pos.y + vel.y) {
                    inout_vel.y *= -elasticity;
                    *bounces += 1;
                    affected += 1;
                }

                if affected == 0 {
                    inout_vel.x *= -elasticity;
                    inout_vel.y *= -elasticity;
                }
            } else {
                *inout_pos = pos + vel;
            }
        }

        pub fn move_box(
            &self,
            in_out_pos: &mut vec2,
            in_out_vel: &mut vec2,
            size: &ivec2,
            elasticity: f32,
        ) {
            let mut pos = *in_out_pos;
            let mut vel = *in_out_vel;

            let vel_distance = dot(&vel, &vel);
            let max = vel_distance as i32;

            enum CollisionCoords {
                X,
                Y,
                XY,
                None,
                /// not tested since the position changed
                Unknown,
            }
            let mut last_collision_coords = CollisionCoords::Unknown;

            if vel_distance > 0.00001 {
                let mut last_pos_x = round_to_int(pos.x);
                let mut last_pos_y = round_to_int(pos.y);

                let mut prev_last_pos_x = last_pos_x;
                let mut prev_last_pos_y = last_pos_y;

                let fraction = 1.0 / (max + 1) as f32;
                for _ in 0..=max {
                    if vel == vec2::new(0.0, 0.0) {
                        break;
                    }

                    let mut new_pos = pos + vel * fraction;
                    if new_pos == pos {
                        break;
                    }

                    let mut new_pos_x = round_to_int(new_pos.x);
                    let mut new_pos_y = round_to_int(new_pos.y);

                    // the same grid cell twice in a row has the same collision result
                    if !((new_pos_x == last_pos_x && new_pos_y == last_pos_y)
                        && (last_pos_x == prev_last_pos_x && last_pos_y == prev_last_pos_y))
                    {
                        last_collision_coords = CollisionCoords::Unknown;
                    }

                    if matches!(last_collision_coords, CollisionCoords::Unknown) {
                        if self.test_box(&ivec2::new(new_pos_x, new_pos_y), size) {
                            let mut hits = 0;

                            if self.test_box(&ivec2::new(last_pos_x, new_pos_y), size) {
                                last_collision_coords = CollisionCoords::X;
                                hits += 1;
                            }

                            if self.test_box(&ivec2::new(new_pos_x, last_pos_y), size) {
                                if matches!(last_collision_coords, CollisionCoords::X) {
                                    last_collision_coords = CollisionCoords::XY;
                                } else {
                                    last_collision_coords = CollisionCoords::Y;
                                }
                                hits += 1;
                            }

                            // corner
                            if hits == 0 {
                                last_collision_coords = CollisionCoords::XY;
                            }
                        } else {
                            last_collision_coords = CollisionCoords::None;
                        }
                    }

                    match last_collision_coords {
                        CollisionCoords::X => {
                            new_pos.y = pos.y;
                            new_pos_y = last_pos_y;
                            vel.y *= -elasticity;
                        }
                        CollisionCoords::Y => {
                            new_pos.x = pos.x;
                            new_pos_x = last_pos_x;
                            vel.x *= -elasticity;
                        }
                        CollisionCoords::XY => {
                            new_pos.y = pos.y;
                            new_pos_y = last_pos_y;
                            vel.y *= -elasticity;
                            new_pos.x = pos.x;
                            new_pos_x = last_pos_x;
                            vel.x *= -elasticity;
                        }
                        CollisionCoords::None | CollisionCoords::Unknown => {}
                    }

                    prev_last_pos_x = last_pos_x;
                    prev_last_pos_y = last_pos_y;
                    last_pos_x = new_pos_x;
                    last_pos_y = new_pos_y;
                    pos = new_pos;
                }
            }

            *in_out_pos = pos;
            *in_out_vel = vel;
        }

        pub fn get_collision_at(&self, x: f32, y: f32) -> TileNum {
            self.get_tile(round_to_int(x), round_to_int(y))
        }

        #[inline(always)]
        fn tile_index(&self, x: i32, y: i32) -> usize {
            let nx = (x / TILE_SIZE).clamp(0, self.width as i32 - 1);
            let ny = (y / TILE_SIZE).clamp(0, self.height as i32 - 1);
            ny as usize * self.width as usize + nx as usize
        }

        /// Walks the line in world unit steps and reports the first solid tile.
        /// `out_before_collision` is the last free position on the line.
        pub fn intersect_line(
            &self,
            pos_0: &vec2,
            pos_1: &vec2,
            out_collision: &mut vec2,
            out_before_collision: &mut vec2,
        ) -> CollisionTile {
            let d = distance(pos_0, pos_1);
            let end = (d + 1.0) as i32;
            let mut last_pos = *pos_0;
            for i in 0..=end {
                let a = i as f32 / end as f32;
                let pos = mix(pos_0, pos_1, a);
                let ix = round_to_int(pos.x);
                let iy = round_to_int(pos.y);

                if self.check_point(ix, iy) {
                    *out_collision = pos;
                    *out_before_collision = last_pos;
                    return CollisionTile::Solid(self.get_tile(ix, iy));
                }

                last_pos = pos;
            }
            *out_collision = *pos_1;
            *out_before_collision = *pos_1;
            CollisionTile::None
        }
    }

    #[cfg(test)]
    mod test {
        use math::math::vector::{ivec2, vec2};

        use super::{Collision, CollisionError, CollisionTile, TileNum};

        const MAP: &str = "\
            #####\n\
            #S..#\n\
            #..N#\n\
            #DDD#\n";

        #[test]
        fn parses_ascii() {
            let col = Collision::from_ascii(MAP).unwrap();
            assert_eq!(col.get_playfield_width(), 5);
            assert_eq!(col.get_playfield_height(), 4);
            assert_eq!(col.spawn_points(), &[vec2::new(48.0, 48.0)]);
            assert!(col.check_pointf(5.0, 5.0));
            assert!(!col.check_pointf(40.0, 40.0));
            assert_eq!(col.get_collision_at(100.0, 70.0), TileNum::NoHook);
            assert!(col.is_death(40.0, 100.0));
            // clamped to the border
            assert!(col.check_pointf(-500.0, 40.0));
        }

        #[test]
        fn bad_ascii() {
            assert_eq!(Collision::from_ascii("").unwrap_err(), CollisionError::Empty);
            assert!(matches!(
                Collision::from_ascii("##\n#").unwrap_err(),
                CollisionError::RaggedRow { row: 1, .. }
            ));
            assert!(matches!(
                Collision::from_ascii("#?").unwrap_err(),
                CollisionError::UnknownTile { tile: '?', .. }
            ));
        }

        #[test]
        fn intersect_line_stops_before_wall() {
            let col = Collision::from_ascii(MAP).unwrap();
            let mut hit = vec2::default();
            let mut before = vec2::default();
            let res =
                col.intersect_line(&vec2::new(40.0, 40.0), &vec2::new(200.0, 40.0), &mut hit, &mut before);
            assert_eq!(res, CollisionTile::Solid(TileNum::Solid));
            assert!(hit.x >= 128.0 && before.x < 128.0);

            let res = col.intersect_line(&vec2::new(40.0, 40.0), &vec2::new(90.0, 40.0), &mut hit, &mut before);
            assert_eq!(res, CollisionTile::None);
            assert_eq!(hit, vec2::new(90.0, 40.0));
        }

        #[test]
        fn move_box_lands_on_floor() {
            let col = Collision::from_ascii(MAP).unwrap();
            let mut pos = vec2::new(48.0, 60.0);
            let mut vel = vec2::new(0.0, 20.0);
            col.move_box(&mut pos, &mut vel, &ivec2::new(28, 28), 0.0);
            // the death row is not solid, the box falls into it
            assert_eq!(vel.y, 20.0);

            let col = Collision::from_ascii("#####\n#...#\n#...#\n#####\n").unwrap();
            let mut pos = vec2::new(48.0, 70.0);
            let mut vel = vec2::new(0.0, 30.0);
            col.move_box(&mut pos, &mut vel, &ivec2::new(28, 28), 0.0);
            assert_eq!(vel.y, 0.0);
            assert!(pos.y > 75.0 && pos.y + 14.0 < 96.0);
        }

        #[test]
        fn move_point_reflects() {
            let col = Collision::from_ascii("#####\n#...#\n#####\n").unwrap();
            let mut pos = vec2::new(80.0, 40.0);
            let mut vel = vec2::new(60.0, 0.0);
            let mut bounces = 0;
            col.move_point(&mut pos, &mut vel, 1.0, &mut bounces);
            assert_eq!(bounces, 1);
            assert_eq!(vel, vec2::new(-60.0, 0.0));
            assert_eq!(pos, vec2::new(80.0, 40.0));
        }

        #[test]
        fn any_hit_ranks_above_none() {
            assert!(CollisionTile::None < CollisionTile::Solid(TileNum::Air));
            assert!(CollisionTile::Solid(TileNum::Solid) < CollisionTile::Solid(TileNum::NoHook));
            assert!(TileNum::Air < TileNum::Death);
        }
    }
}
