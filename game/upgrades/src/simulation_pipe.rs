pub mod simulation_pipe {
    use std::{cell::RefCell, rc::Rc};

    use game_interface::{
        events::{
            GameWorldDirectMessage, GameWorldEffectEvent, GameWorldEntityEffectEvent,
            GameWorldEntitySoundEvent, GameWorldEvent, GameWorldNotificationEvent,
            GameWorldSoundEvent,
        },
        types::{
            id_gen::{IdGenerator, IdGeneratorIdType},
            id_types::CharacterId,
        },
    };
    use math::math::{vector::vec2, Rng};

    use crate::{
        collision::collision::Collision,
        config::config::{EventModifiers, ModTunables, Tunings},
        entities::{
            character::{character::Characters, player::player::Players},
            drop_life::drop_life::DropLife,
            laser::laser::Laser,
            marker::marker::Marker,
            mine::mine::Mine,
            projectile::projectile::Projectile,
        },
        events::events::SimulationWorldEvent,
    };

    /// The events of the current tick that are sent to the clients.
    /// Shared by everything that can produce events.
    #[derive(Debug, Default, Clone)]
    pub struct GameWorldPendingEvents(Rc<RefCell<Vec<GameWorldEvent>>>);

    impl GameWorldPendingEvents {
        pub fn push(&self, ev: GameWorldEvent) {
            self.0.borrow_mut().push(ev);
        }

        pub fn push_sound(
            &self,
            owner_id: Option<CharacterId>,
            pos: Option<vec2>,
            ev: GameWorldEntitySoundEvent,
        ) {
            self.push(GameWorldEvent::Sound(GameWorldSoundEvent { pos, owner_id, ev }));
        }

        pub fn push_effect(
            &self,
            owner_id: Option<CharacterId>,
            pos: vec2,
            ev: GameWorldEntityEffectEvent,
        ) {
            self.push(GameWorldEvent::Effect(GameWorldEffectEvent { pos, owner_id, ev }));
        }

        pub fn push_notification(&self, ev: GameWorldNotificationEvent) {
            self.push(GameWorldEvent::Notification(ev));
        }

        pub fn push_direct(&self, to: CharacterId, msg: GameWorldDirectMessage) {
            self.push(GameWorldEvent::Direct { to, msg });
        }

        pub fn take(&self) -> Vec<GameWorldEvent> {
            std::mem::take(&mut *self.0.borrow_mut())
        }

        pub fn clear(&self) {
            self.0.borrow_mut().clear();
        }

        pub fn len(&self) -> usize {
            self.0.borrow().len()
        }

        pub fn is_empty(&self) -> bool {
            self.0.borrow().is_empty()
        }

        pub fn for_each<F: FnMut(&GameWorldEvent)>(&self, f: F) {
            self.0.borrow().iter().for_each(f)
        }
    }

    /// Entities created during a tick. They join the world after both
    /// tick phases, their ids are already allocated.
    #[derive(Debug, Default)]
    pub struct PendingSpawns {
        pub projectiles: Vec<Projectile>,
        pub mines: Vec<Mine>,
        pub lasers: Vec<Laser>,
        pub drops: Vec<DropLife>,
        pub markers: Vec<Marker>,
    }

    impl PendingSpawns {
        pub fn is_empty(&self) -> bool {
            self.projectiles.is_empty()
                && self.mines.is_empty()
                && self.lasers.is_empty()
                && self.drops.is_empty()
                && self.markers.is_empty()
        }
    }

    /// What bots need to know about the humans on the server.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct BotWorldInfo {
        pub has_humans: bool,
        /// humans that are not frozen
        pub has_active_humans: bool,
    }

    /// What the game state lends the world for one tick.
    pub struct SimulationPipeWorld<'a> {
        pub collision: &'a Collision,
        pub tunings: &'a Tunings,
        pub mod_tunables: &'a ModTunables,
        pub modifiers: EventModifiers,
        pub cur_tick: i32,
        pub rng: &'a mut Rng,
    }

    /// Everything of the world an entity may touch during its tick,
    /// except the characters.
    pub struct SimulationPipe<'a> {
        pub collision: &'a Collision,
        /// the tunings with the active world events applied
        pub tunings: &'a Tunings,
        pub mod_tunables: &'a ModTunables,
        pub modifiers: EventModifiers,
        pub cur_tick: i32,
        pub rng: &'a mut Rng,
        pub id_gen: &'a mut IdGenerator,
        pub events: &'a GameWorldPendingEvents,
        pub spawns: &'a mut PendingSpawns,
        pub sim_events: &'a mut Vec<SimulationWorldEvent>,
        pub players: &'a mut Players,
        pub bot_info: BotWorldInfo,
    }

    impl SimulationPipe<'_> {
        pub fn next_id<T: From<IdGeneratorIdType>>(&mut self) -> T {
            self.id_gen.next_id(self.cur_tick.max(0) as u64)
        }
    }

    /// The pipe an entity ticks with. For a ticking character `characters`
    /// holds every other character, for all other entities all of them.
    pub struct EntityPipe<'a, 'p> {
        pub sim: &'a mut SimulationPipe<'p>,
        pub characters: &'a mut Characters,
    }
}
