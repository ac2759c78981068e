pub mod test_util {
    use game_interface::types::id_gen::IdGenerator;
    use math::math::Rng;

    use crate::{
        collision::collision::Collision,
        config::config::{EventModifiers, ModTunables, Tunings},
        entities::character::player::player::Players,
        events::events::SimulationWorldEvent,
        simulation_pipe::simulation_pipe::{
            BotWorldInfo, GameWorldPendingEvents, PendingSpawns, SimulationPipe,
        },
    };

    /// Owns everything a [`SimulationPipe`] borrows, for testing single entities.
    pub struct TestSim {
        pub collision: Collision,
        pub tunings: Tunings,
        pub tunables: ModTunables,
        pub modifiers: EventModifiers,
        pub cur_tick: i32,
        pub rng: Rng,
        pub id_gen: IdGenerator,
        pub events: GameWorldPendingEvents,
        pub spawns: PendingSpawns,
        pub sim_events: Vec<SimulationWorldEvent>,
        pub players: Players,
        pub bot_info: BotWorldInfo,
    }

    impl TestSim {
        pub fn new(map: &str) -> Self {
            Self {
                collision: Collision::from_ascii(map).unwrap(),
                tunings: Tunings::default(),
                tunables: ModTunables::default(),
                modifiers: EventModifiers::default(),
                cur_tick: 0,
                rng: Rng::new(0),
                id_gen: IdGenerator::new(),
                events: GameWorldPendingEvents::default(),
                spawns: PendingSpawns::default(),
                sim_events: Vec::new(),
                players: Players::default(),
                bot_info: BotWorldInfo::default(),
            }
        }

        pub fn pipe(&mut self) -> SimulationPipe<'_> {
            SimulationPipe {
                collision: &self.collision,
                tunings: &self.tunings,
                mod_tunables: &self.tunables,
                modifiers: self.modifiers,
                cur_tick: self.cur_tick,
                rng: &mut self.rng,
                id_gen: &mut self.id_gen,
                events: &self.events,
                spawns: &mut self.spawns,
                sim_events: &mut self.sim_events,
                players: &mut self.players,
                bot_info: self.bot_info,
            }
        }
    }
}
