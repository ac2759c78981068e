pub mod marker {
    use game_interface::types::{
        id_types::{CharacterId, MarkerId},
        pickup::PickupType,
        snapshot::{SnapItem, SnapLaser, SnapPickup},
    };
    use math::math::vector::vec2;

    use crate::{
        entities::{
            character::character::Character,
            entity::entity::{Entity, EntityInterface, EntityTickResult, SnapView},
        },
        simulation_pipe::simulation_pipe::EntityPipe,
    };

    const RANK_HEIGHT: f32 = 80.0;
    const RANK_ORBIT_RADIUS: f32 = 30.0;
    const PROTECTION_HEIGHT: f32 = 70.0;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MarkerKind {
        /// One of the dots circling above a moderator or admin.
        Rank {
            slot: usize,
            /// how many markers the rank had when this one spawned
            count: usize,
        },
        SpawnProtection,
    }

    /// Decoration that follows a character around.
    #[derive(Debug)]
    pub struct Marker {
        pub(crate) base: Entity<MarkerId>,
        owner: CharacterId,
        kind: MarkerKind,
        pos: vec2,
        eval_tick: i32,
    }

    /// Angle offset of a rank marker in degrees, the markers are spread
    /// evenly around the circle.
    fn slot_offset(slot: usize, count: usize) -> f32 {
        match (slot, count) {
            (0, _) => 0.0,
            (1, 2) => 180.0,
            (1, _) => 120.0,
            _ => 240.0,
        }
    }

    impl Marker {
        pub fn new_rank(
            id: &MarkerId,
            owner: CharacterId,
            slot: usize,
            count: usize,
            pos: vec2,
            cur_tick: i32,
        ) -> Self {
            Self {
                base: Entity::new(id),
                owner,
                kind: MarkerKind::Rank { slot, count },
                pos,
                eval_tick: cur_tick,
            }
        }

        pub fn new_protection(id: &MarkerId, owner: CharacterId, owner_pos: vec2) -> Self {
            Self {
                base: Entity::new(id),
                owner,
                kind: MarkerKind::SpawnProtection,
                pos: owner_pos - vec2::new(0.0, PROTECTION_HEIGHT),
                eval_tick: 0,
            }
        }

        pub fn owner(&self) -> CharacterId {
            self.owner
        }

        pub fn kind(&self) -> MarkerKind {
            self.kind
        }

        pub fn pos(&self) -> vec2 {
            self.pos
        }

        fn follow(&mut self, owner: &Character) {
            self.pos = match self.kind {
                MarkerKind::Rank { slot, count } => {
                    let a = (owner.mark_angle + slot_offset(slot, count)).to_radians();
                    owner.pos()
                        - vec2::new(0.0, RANK_HEIGHT)
                        - vec2::new(a.cos(), a.sin() / 3.0) * RANK_ORBIT_RADIUS
                }
                MarkerKind::SpawnProtection => owner.pos() - vec2::new(0.0, PROTECTION_HEIGHT),
            };
        }
    }

    impl EntityInterface for Marker {
        fn tick(&mut self, pipe: &mut EntityPipe) -> EntityTickResult {
            let Some(owner) = pipe
                .characters
                .get_mut(&self.owner)
                .filter(|c| c.is_alive())
            else {
                return EntityTickResult::RemoveEntity;
            };

            match self.kind {
                MarkerKind::Rank { count, .. } => {
                    let visible_count = pipe
                        .sim
                        .players
                        .get(&self.owner)
                        .filter(|p| !p.account.undercover)
                        .map(|p| p.account.rank.marker_count())
                        .unwrap_or(0);
                    if visible_count != count {
                        // the owner respawns a fitting set
                        owner.markers_spawned = false;
                        return EntityTickResult::RemoveEntity;
                    }
                }
                MarkerKind::SpawnProtection => {
                    if !owner.is_spawn_protected() {
                        return EntityTickResult::RemoveEntity;
                    }
                }
            }

            self.follow(owner);
            EntityTickResult::None
        }

        fn tick_deferred(&mut self, _pipe: &mut EntityPipe) -> EntityTickResult {
            EntityTickResult::None
        }

        fn tick_paused(&mut self) {
            self.eval_tick += 1;
        }

        fn snap(&self, view: &SnapView) -> Option<SnapItem> {
            if view.network_clipped(&self.pos) {
                return None;
            }
            Some(match self.kind {
                MarkerKind::Rank { .. } => SnapItem::Laser(SnapLaser {
                    x: self.pos.x as i32,
                    y: self.pos.y as i32,
                    from_x: self.pos.x as i32,
                    from_y: self.pos.y as i32,
                    start_tick: self.eval_tick,
                }),
                MarkerKind::SpawnProtection => SnapItem::Pickup(SnapPickup {
                    x: self.pos.x as i32,
                    y: self.pos.y as i32,
                    ty: PickupType::PowerupArmor.net_type(),
                }),
            })
        }
    }

}
